//! Invoice attachment rules.

use crate::error::CoreError;

/// File extensions accepted for invoice copies.
pub const ALLOWED_ATTACHMENT_EXTENSIONS: &[&str] = &["pdf", "jpg", "jpeg", "png", "gif"];

/// Upper bound on an attachment's size (10 MB).
pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

/// Check an uploaded attachment against the type and size limits.
///
/// Returns the lowercase extension on success.
pub fn validate_attachment(original_name: &str, size: usize) -> Result<String, CoreError> {
    let base = base_name(original_name);
    let ext = match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_lowercase(),
        _ => String::new(),
    };
    if !ALLOWED_ATTACHMENT_EXTENSIONS.contains(&ext.as_str()) {
        return Err(CoreError::field(
            "attachment",
            format!(
                "The attachment must be a file of type: {}.",
                ALLOWED_ATTACHMENT_EXTENSIONS.join(", ")
            ),
        ));
    }
    if size > MAX_ATTACHMENT_BYTES {
        return Err(CoreError::field(
            "attachment",
            "The attachment may not be greater than 10240 kilobytes.",
        ));
    }
    Ok(ext)
}

/// Stored filename for an attachment: `<unix-timestamp>_<original-name>`.
///
/// Only the final path component of the client-supplied name is kept, so a
/// name like `../../etc/passwd` cannot escape the upload directory.
pub fn stored_attachment_name(unix_timestamp: i64, original_name: &str) -> String {
    format!("{unix_timestamp}_{}", base_name(original_name))
}

fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name).trim()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn accepts_allowed_types_case_insensitively() {
        assert_eq!(validate_attachment("scan.PDF", 10).unwrap(), "pdf");
        assert_eq!(validate_attachment("photo.jpeg", 10).unwrap(), "jpeg");
    }

    #[test]
    fn rejects_other_types_and_bare_names() {
        assert_matches!(
            validate_attachment("payload.exe", 10),
            Err(CoreError::InvalidFields(_))
        );
        assert_matches!(validate_attachment("pdf", 10), Err(CoreError::InvalidFields(_)));
        assert_matches!(validate_attachment(".png", 10), Err(CoreError::InvalidFields(_)));
    }

    #[test]
    fn size_limit_is_inclusive() {
        assert!(validate_attachment("a.png", MAX_ATTACHMENT_BYTES).is_ok());
        assert_matches!(
            validate_attachment("a.png", MAX_ATTACHMENT_BYTES + 1),
            Err(CoreError::InvalidFields(fields)) if fields["attachment"][0].contains("10240")
        );
    }

    #[test]
    fn stored_name_is_timestamp_prefixed_base_name() {
        assert_eq!(
            stored_attachment_name(1_700_000_000, "invoice 12.pdf"),
            "1700000000_invoice 12.pdf"
        );
        assert_eq!(
            stored_attachment_name(5, "../../etc/passwd.pdf"),
            "5_passwd.pdf"
        );
        assert_eq!(stored_attachment_name(5, r"C:\docs\inv.png"), "5_inv.png");
    }
}
