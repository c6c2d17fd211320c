//! Document identifier utilities
//!
//! Ids are canonical lowercase hyphenated UUIDs. Anything else (simple form,
//! braces, urn prefix, uppercase hex) is rejected so that a syntactically
//! valid id always matches the stored string byte for byte.

use uuid::Uuid;

/// Length of a canonical hyphenated id
pub const ID_LEN: usize = 36;

/// Generate a new document id (UUIDv4, hyphenated)
pub fn generate() -> String {
    Uuid::new_v4().hyphenated().to_string()
}

/// Check whether `s` is a canonical document id
pub fn is_valid(s: &str) -> bool {
    s.len() == ID_LEN
        && !s.bytes().any(|b| b.is_ascii_uppercase())
        && Uuid::try_parse(s).is_ok()
}
