//! Shared utility functions used across multiple modules.

use chrono::{SecondsFormat, Utc};

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Check if a string starts with `http://` or `https://`.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Truncate text to at most 180 characters for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Current time as an ISO-8601 UTC timestamp with millisecond precision.
pub fn iso_timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Whether a file name has an extension accepted for upload.
pub fn is_uploadable_document(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    [".pdf", ".docx", ".doc"]
        .iter()
        .any(|extension| lower.ends_with(extension))
}

/// Extract the file name from a `Content-Disposition` header value.
///
/// Prefers the RFC 5987 `filename*` parameter and falls back to `filename`.
pub fn content_disposition_filename(header: &str) -> Option<String> {
    let mut plain = None;
    for part in header.split(';').map(str::trim) {
        if let Some(value) = part.strip_prefix("filename*=") {
            let encoded = value
                .split_once("''")
                .map_or(value, |(_, rest)| rest)
                .trim_matches('"');
            if let Ok(decoded) = urlencoding::decode(encoded) {
                return normalize_text_option(Some(decoded.into_owned()));
            }
        } else if let Some(value) = part.strip_prefix("filename=") {
            plain = normalize_text_option(Some(value.trim_matches('"').to_string()));
        }
    }
    plain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_option_rejects_empty() {
        assert_eq!(normalize_text_option(None), None);
        assert_eq!(normalize_text_option(Some("   ".to_string())), None);
    }

    #[test]
    fn normalize_text_option_trims_value() {
        assert_eq!(
            normalize_text_option(Some(" http://localhost:5000 ".to_string())),
            Some("http://localhost:5000".to_string())
        );
    }

    #[test]
    fn is_http_url_accepts_valid_schemes() {
        assert!(is_http_url("http://localhost"));
        assert!(is_http_url("https://example.com"));
        assert!(!is_http_url("ftp://example.com"));
        assert!(!is_http_url("example.com"));
    }

    #[test]
    fn uploadable_documents_are_case_insensitive() {
        assert!(is_uploadable_document("Paper.PDF"));
        assert!(is_uploadable_document("draft.docx"));
        assert!(is_uploadable_document("old.doc"));
        assert!(!is_uploadable_document("notes.txt"));
        assert!(!is_uploadable_document("pdf"));
    }

    #[test]
    fn iso_timestamp_has_millis_and_zulu_suffix() {
        let stamp = iso_timestamp_now();
        assert!(stamp.ends_with('Z'));
        assert_eq!(stamp.len(), "2025-07-27T10:00:00.000Z".len());
    }

    #[test]
    fn content_disposition_prefers_extended_filename() {
        assert_eq!(
            content_disposition_filename(
                "attachment; filename=paper.pdf; filename*=UTF-8''%E8%AE%BA%E6%96%87.pdf"
            )
            .as_deref(),
            Some("论文.pdf")
        );
        assert_eq!(
            content_disposition_filename("attachment; filename=\"paper.pdf\"").as_deref(),
            Some("paper.pdf")
        );
        assert_eq!(content_disposition_filename("inline"), None);
    }
}
