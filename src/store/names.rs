//! Database, table and row key names

use std::ffi::OsStr;

use rand::distributions::Alphanumeric;
use rand::Rng;

use super::errors::{StoreError, StoreResult};

/// Lock file kept in every database and table directory
pub const LOCK_FILE: &str = ".lock";

/// Reject names that could escape their directory or collide with
/// `.lock` and temporary files.
pub(crate) fn validate(name: &str) -> StoreResult<()> {
    let reason = if name.is_empty() {
        "must not be empty"
    } else if name.starts_with('.') {
        "must not start with '.'"
    } else if name.contains(['/', '\\', '\0']) {
        "must not contain path separators"
    } else {
        return Ok(());
    };
    Err(StoreError::InvalidName {
        name: name.to_string(),
        reason,
    })
}

/// Random ASCII-alphanumeric key of `length` characters
pub fn random_key(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Directory entries that are user data (not `.lock` or temp files)
pub(crate) fn visible(name: &OsStr) -> Option<String> {
    let name = name.to_str()?;
    if name.starts_with('.') {
        return None;
    }
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(validate("users").is_ok());
        assert!(validate("r1").is_ok());
        assert!(validate("a.b-c_d").is_ok());
    }

    #[test]
    fn test_invalid_names() {
        for bad in ["", ".lock", ".hidden", "a/b", "..", "a\\b", "a\0b"] {
            assert!(
                matches!(validate(bad), Err(StoreError::InvalidName { .. })),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_random_key_shape() {
        let key = random_key(12);
        assert_eq!(key.len(), 12);
        assert!(key.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(validate(&key).is_ok());
    }

    #[test]
    fn test_visible_skips_dot_files() {
        assert_eq!(visible(OsStr::new("r1")), Some("r1".to_string()));
        assert_eq!(visible(OsStr::new(LOCK_FILE)), None);
        assert_eq!(visible(OsStr::new(".row-Ab12.tmp")), None);
    }
}
