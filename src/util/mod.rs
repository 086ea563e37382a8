use crate::models::FileCategory;

/// Advisory client-side category sniff from a MIME type. The backend assigns
/// the authoritative category in the returned `FileRecord`.
pub(crate) fn sniff_category(mime: &str) -> FileCategory {
    let mime = mime.to_ascii_lowercase();
    if mime.starts_with("image/") {
        FileCategory::Image
    } else if mime.starts_with("video/") {
        FileCategory::Video
    } else if mime.starts_with("audio/") {
        FileCategory::Audio
    } else if mime.contains("pdf") || mime.contains("document") {
        FileCategory::Document
    } else {
        FileCategory::Other
    }
}

pub(crate) fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Render the date part of a backend ISO-8601 timestamp (`2025-01-02T10:00:00`).
pub(crate) fn format_date(timestamp: &str) -> String {
    timestamp
        .split('T')
        .next()
        .unwrap_or(timestamp)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_category_by_mime_prefix() {
        assert_eq!(sniff_category("image/png"), FileCategory::Image);
        assert_eq!(sniff_category("video/mp4"), FileCategory::Video);
        assert_eq!(sniff_category("audio/mpeg"), FileCategory::Audio);
    }

    #[test]
    fn sniff_category_documents_by_substring() {
        assert_eq!(sniff_category("application/pdf"), FileCategory::Document);
        assert_eq!(
            sniff_category("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
            FileCategory::Document
        );
    }

    #[test]
    fn sniff_category_falls_back_to_other() {
        assert_eq!(sniff_category("application/zip"), FileCategory::Other);
        assert_eq!(sniff_category(""), FileCategory::Other);
    }

    #[test]
    fn format_file_size_units() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(2048), "2.00 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn format_date_takes_date_part() {
        assert_eq!(format_date("2025-01-02T10:00:00"), "2025-01-02");
        assert_eq!(format_date("not-a-timestamp"), "not-a-timestamp");
    }
}
