//! Remote file metadata obtained from a HEAD probe.

/// Filename and size hints for a remote file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteMetadata {
    /// Quoted filename from the `Content-Disposition` header.
    pub filename: Option<String>,
    /// Size from the `Content-Length` header.
    pub size: Option<u64>,
}

impl RemoteMetadata {
    /// Build metadata from raw header values.
    pub fn from_headers(content_disposition: Option<&str>, content_length: Option<&str>) -> Self {
        Self {
            filename: content_disposition.and_then(quoted_filename),
            size: content_length.and_then(|v| v.trim().parse::<u64>().ok()),
        }
    }
}

/// Extract the quoted filename from a `Content-Disposition` value.
///
/// Takes everything between the first and the last double quote and keeps
/// only the final path component. The result never names a directory.
pub fn quoted_filename(header: &str) -> Option<String> {
    let start = header.find('"')?;
    let end = header.rfind('"')?;
    if end <= start {
        return None;
    }

    let raw = &header[start + 1..end];
    let name = raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim();

    match name {
        "" | "." | ".." => None,
        _ => Some(name.to_string()),
    }
}
