//! Email normalization

/// Normalize an email address for storage and lookup.
///
/// Surrounding whitespace is dropped and the whole address is lowercased, so
/// the result is idempotent and two spellings that differ only in case map
/// to the same account.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
