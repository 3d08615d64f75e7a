//! Account address validation.

use regex::Regex;
use std::sync::OnceLock;

/// Returns true iff `s` is a 0x-prefixed 20-byte hex address.
pub fn is_valid_address(s: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").unwrap());
    re.is_match(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_lowercase() {
        assert!(is_valid_address("0x7f90122bf0700f9e7e1f688fe926940e8839f353"));
    }

    #[test]
    fn test_valid_mixed_case() {
        assert!(is_valid_address("0x7F90122BF0700F9e7e1F688fe926940E8839F353"));
    }

    #[test]
    fn test_missing_prefix() {
        assert!(!is_valid_address("7f90122bf0700f9e7e1f688fe926940e8839f353"));
    }

    #[test]
    fn test_wrong_length() {
        assert!(!is_valid_address("0x7f90122bf0700f9e7e1f688fe926940e8839f35"));
        assert!(!is_valid_address("0x7f90122bf0700f9e7e1f688fe926940e8839f3533"));
    }

    #[test]
    fn test_non_hex_characters() {
        assert!(!is_valid_address("0x7f90122bf0700f9e7e1f688fe926940e8839f35g"));
    }

    #[test]
    fn test_empty_and_garbage() {
        assert!(!is_valid_address(""));
        assert!(!is_valid_address("0x"));
        assert!(!is_valid_address("hello"));
    }

    #[test]
    fn test_no_trailing_content() {
        assert!(!is_valid_address("0x7f90122bf0700f9e7e1f688fe926940e8839f353 "));
        assert!(!is_valid_address(" 0x7f90122bf0700f9e7e1f688fe926940e8839f353"));
    }
}
