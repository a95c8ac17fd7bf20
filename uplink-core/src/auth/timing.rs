//! Constant-time comparisons for tag verification

use subtle::ConstantTimeEq;

/// Constant-time byte comparison. Length mismatch returns early.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.ct_eq(b).into()
}

/// Exact, case-sensitive tag comparison.
pub fn compare_tags(expected: &str, received: &str) -> bool {
    constant_time_eq(expected.as_bytes(), received.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_tags_match() {
        assert!(compare_tags("ABCDEF0123", "ABCDEF0123"));
    }

    #[test]
    fn comparison_is_case_sensitive() {
        assert!(!compare_tags("ABCDEF0123", "abcdef0123"));
    }

    #[test]
    fn length_mismatch_does_not_match() {
        assert!(!compare_tags("ABCDEF0123", "ABCDEF012"));
        assert!(!constant_time_eq(b"", b"A"));
    }
}
