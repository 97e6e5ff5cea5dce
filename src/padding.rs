//! Null-byte-safe padding.
//!
//! Zero-padding block modes cannot tell cipher padding from trailing `0x00`
//! bytes of the message, so decryption strips every trailing null. To keep
//! them, the plaintext is framed as
//!
//! ```text
//! "{N}" 0x01 plaintext        N = count of trailing 0x00 bytes, in decimal
//! ```
//!
//! and `unpad` re-appends `N` nulls after stripping.

const DELIMITER: u8 = 0x01;

/// Frame `plaintext` for encryption. Empty input is never framed.
pub fn pad(plaintext: &[u8], null_safe: bool) -> Vec<u8> {
    if !null_safe || plaintext.is_empty() {
        return plaintext.to_vec();
    }

    let nulls = trailing_nulls(plaintext);
    let header = nulls.to_string();
    let mut out = Vec::with_capacity(header.len() + 1 + plaintext.len());
    out.extend_from_slice(header.as_bytes());
    out.push(DELIMITER);
    out.extend_from_slice(plaintext);
    out
}

/// Reverse [`pad`] on decrypted bytes.
///
/// Trailing nulls are always stripped. With `null_safe`, a leading
/// `digits 0x01` header is consumed (even for a count of zero) and that
/// many nulls are restored. Bytes without such a header are returned as
/// stripped, so output of a producer that never framed stays readable.
pub fn unpad(decrypted: &[u8], null_safe: bool) -> Vec<u8> {
    let body = &decrypted[..decrypted.len() - trailing_nulls(decrypted)];
    if !null_safe {
        return body.to_vec();
    }

    match header(body, decrypted.len()) {
        Some((nulls, rest)) => {
            let mut out = Vec::with_capacity(rest.len() + nulls);
            out.extend_from_slice(rest);
            out.resize(rest.len() + nulls, 0);
            out
        }
        None => body.to_vec(),
    }
}

/// Split `digits 0x01 rest` into the null count and `rest`.
///
/// A count above `limit`, the decrypted length, cannot come from [`pad`]
/// and is read as no header at all.
fn header(body: &[u8], limit: usize) -> Option<(usize, &[u8])> {
    let split = body.iter().position(|&b| b == DELIMITER)?;
    let digits = &body[..split];
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let nulls: usize = std::str::from_utf8(digits).ok()?.parse().ok()?;
    if nulls > limit {
        return None;
    }
    Some((nulls, &body[split + 1..]))
}

fn trailing_nulls(bytes: &[u8]) -> usize {
    bytes.iter().rev().take_while(|&&b| b == 0).count()
}
