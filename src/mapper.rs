//! Digit mapper: exact radix conversion over digit sequences of any length.
//!
//! Conversion is schoolbook long division. Each pass divides the working
//! number (held in the source radix) by the target radix and emits the
//! remainder as the next least-significant output digit. Cost is
//! O(input length × output length) digit operations.
//!
//! Leading zero symbols carry meaning (they are padding, e.g. leading zero
//! bytes of ciphertext) so the length of the leading-zero run is carried over
//! verbatim: `k` source zeros become `k` target zeros.

use crate::alphabet::Alphabet;
use crate::error::CipherError;

/// Convert `number`, written in `from`, into the same value written in `to`.
///
/// ```
/// use citadel_cipher::{mapper, Alphabet};
///
/// let octal = Alphabet::new("01234567").unwrap();
/// let letters = Alphabet::new("abcdefghij").unwrap();
/// assert_eq!(mapper::convert("0010", &octal, &letters).unwrap(), "aai");
/// ```
pub fn convert(number: &str, from: &Alphabet, to: &Alphabet) -> Result<String, CipherError> {
    let digits = parse_digits(number, from)?;

    let zeros = digits.iter().take_while(|&&d| d == 0).count();
    let converted = convert_digits(&digits[zeros..], from.radix(), to.radix());

    let mut out = String::with_capacity(zeros + converted.len());
    out.extend(std::iter::repeat(to.zero()).take(zeros));
    for digit in converted {
        // convert_digits only emits values below the target radix
        out.push(to.symbol(digit).ok_or(CipherError::InvalidRadix(to.radix()))?);
    }
    Ok(out)
}

/// Map each symbol to its digit value in `alphabet`.
pub fn parse_digits(number: &str, alphabet: &Alphabet) -> Result<Vec<u32>, CipherError> {
    number
        .chars()
        .enumerate()
        .map(|(position, symbol)| {
            alphabet
                .digit(symbol)
                .ok_or(CipherError::InvalidDigit { symbol, position })
        })
        .collect()
}

/// Convert digit values (most significant first) between radices.
///
/// Leading zeros are not preserved here; the result is the minimal
/// representation. An empty or all-zero input yields an empty result.
pub fn convert_digits(digits: &[u32], from_radix: u32, to_radix: u32) -> Vec<u32> {
    let from = u64::from(from_radix);
    let to = u64::from(to_radix);

    let start = digits.iter().take_while(|&&d| d == 0).count();
    let mut work: Vec<u32> = digits[start..].to_vec();
    let mut len = work.len();

    // Emitted least-significant first; reversed at the end.
    let mut out = Vec::new();

    while len > 0 {
        let mut remainder: u64 = 0;
        let mut quotient_len = 0;

        for i in 0..len {
            // remainder < to, so this stays below to * from
            remainder = remainder * from + u64::from(work[i]);
            if remainder >= to {
                // quotient digit < from, fits the source radix
                work[quotient_len] = (remainder / to) as u32;
                quotient_len += 1;
                remainder %= to;
            } else if quotient_len > 0 {
                work[quotient_len] = 0;
                quotient_len += 1;
            }
        }

        len = quotient_len;
        out.push(remainder as u32);
    }

    out.reverse();
    out
}
