//! Rough timing of password validation.
//!
//! Run with: `cargo bench --bench timing`
//!
//! A match, a mismatch in the first hash byte and a mismatch in the last
//! should take indistinguishable time; the PBKDF2 run dominates all three.

use std::hint::black_box;
use std::time::{Duration, Instant};

use citadel_cipher::{Cipher, CipherConfig};

const ROUNDS: usize = 9;
const CALLS_PER_ROUND: u32 = 200;

/// Median per-call time of `check` over [`ROUNDS`] batches.
fn median_per_call(mut check: impl FnMut() -> bool) -> Duration {
    for _ in 0..CALLS_PER_ROUND / 10 {
        black_box(check());
    }

    let mut rounds: Vec<Duration> = (0..ROUNDS)
        .map(|_| {
            let start = Instant::now();
            for _ in 0..CALLS_PER_ROUND {
                black_box(check());
            }
            start.elapsed() / CALLS_PER_ROUND
        })
        .collect();
    rounds.sort();
    rounds[ROUNDS / 2]
}

/// Flip one hex digit of `stored` at `index`.
fn corrupt(stored: &str, index: usize) -> String {
    let mut bytes = stored.as_bytes().to_vec();
    bytes[index] = if bytes[index] == b'0' { b'1' } else { b'0' };
    String::from_utf8(bytes).unwrap()
}

fn main() {
    let config = CipherConfig::builder()
        .with_kdf_iterations(1_000)
        .build()
        .unwrap();
    let cipher = Cipher::new(config).unwrap();

    let stored = cipher.hash_password("correct horse", None).unwrap();
    let first_byte_wrong = corrupt(&stored, stored.len() / 2);
    let last_byte_wrong = corrupt(&stored, stored.len() - 1);

    let cases: [(&str, &str, &str); 5] = [
        ("match", "correct horse", stored.as_str()),
        ("wrong password", "battery staple", stored.as_str()),
        ("first hash byte", "correct horse", first_byte_wrong.as_str()),
        ("last hash byte", "correct horse", last_byte_wrong.as_str()),
        ("short input", "correct horse", "abcd"),
    ];

    let mut baseline = None;
    for (case, password, against) in cases {
        let median = median_per_call(|| {
            cipher.validate_password(black_box(password), black_box(against))
        });
        let base = *baseline.get_or_insert(median);
        println!(
            "validate_password/{:<16} median={:?}  vs match={:.2}x",
            case,
            median,
            median.as_secs_f64() / base.as_secs_f64()
        );
    }
}
