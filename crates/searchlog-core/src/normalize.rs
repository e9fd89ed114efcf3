//! Query text normalization

/// Normalize raw query text: trim surrounding whitespace and fold case.
///
/// Applied to every query text before it is compared, cached, looked up or
/// persisted. Client keys are never normalized.
pub fn normalize_query(raw: &str) -> String {
    raw.trim().to_lowercase()
}
