#![no_main]

use citadel_cipher::{base_convert, Alphabet};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let from = 2 + (data[0] as u32) % 94;
    let to = 2 + (data[1] as u32) % 94;
    let text = String::from_utf8_lossy(&data[2..]);

    // arbitrary text: must error cleanly or convert
    let _ = base_convert(&text, from, to);

    // text restricted to valid digits: must round-trip exactly
    let digits = Alphabet::master().symbols();
    let valid: String = data[2..]
        .iter()
        .map(|&b| digits[(b as u32 % from) as usize])
        .collect();
    let there = base_convert(&valid, from, to).unwrap();
    assert_eq!(base_convert(&there, to, from).unwrap(), valid);
});
