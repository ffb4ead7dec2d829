use std::path::Path;

/// MIME type reported for extensions we don't recognise.
pub const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// Detects the MIME type from a file extension (case-insensitive).
pub fn detect_media_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("m4v") => "video/x-m4v",
        Some("webm") => "video/webm",
        Some("srt") => "application/x-subrip",
        _ => DEFAULT_MEDIA_TYPE,
    }
}
