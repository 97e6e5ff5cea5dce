//! Radix conversion over prefixes of the master alphabet.

use crate::alphabet::{Alphabet, MAX_RADIX, MIN_RADIX};
use crate::error::CipherError;
use crate::mapper;

/// Check that `radix` lies in `[2, 95]`.
pub fn check_radix(radix: u32) -> Result<u32, CipherError> {
    if (MIN_RADIX..=MAX_RADIX).contains(&radix) {
        Ok(radix)
    } else {
        Err(CipherError::InvalidRadix(radix))
    }
}

/// Convert `text` from radix `from_radix` to radix `to_radix`.
///
/// Digits are the first `radix` symbols of the master alphabet, so base 16
/// uses `0-9a-f`, base 62 uses `0-9a-zA-Z` and base 95 uses every printable
/// ASCII character.
///
/// ```
/// use citadel_cipher::base_convert;
///
/// assert_eq!(base_convert("255", 10, 16).unwrap(), "ff");
/// assert_eq!(base_convert("ff", 16, 2).unwrap(), "11111111");
/// ```
pub fn base_convert(text: &str, from_radix: u32, to_radix: u32) -> Result<String, CipherError> {
    check_radix(from_radix)?;
    check_radix(to_radix)?;

    if from_radix == to_radix {
        return Ok(text.to_owned());
    }

    let master = Alphabet::master();
    let from = master.prefix(from_radix)?;
    let to = master.prefix(to_radix)?;
    mapper::convert(text, &from, &to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_radix() {
        assert_eq!(base_convert("1", 1, 10), Err(CipherError::InvalidRadix(1)));
        assert_eq!(base_convert("1", 10, 96), Err(CipherError::InvalidRadix(96)));
        assert_eq!(base_convert("1", 0, 0), Err(CipherError::InvalidRadix(0)));
    }

    #[test]
    fn same_radix_is_identity() {
        // not even validated against the alphabet
        assert_eq!(base_convert("not digits!", 10, 10).unwrap(), "not digits!");
    }

    #[test]
    fn binary_to_decimal() {
        assert_eq!(base_convert("1010", 2, 10).unwrap(), "10");
    }

    #[test]
    fn base95_round_trip() {
        let text = "Hello, World ~ {ok}";
        let binary = base_convert(text, 95, 2).unwrap();
        assert!(binary.chars().all(|c| c == '0' || c == '1'));
        assert_eq!(base_convert(&binary, 2, 95).unwrap(), text);
    }

    #[test]
    fn digit_outside_radix_is_rejected() {
        assert!(matches!(
            base_convert("12", 2, 10),
            Err(CipherError::InvalidDigit { symbol: '2', position: 1 })
        ));
    }
}
