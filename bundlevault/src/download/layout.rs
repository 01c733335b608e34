//! Local folder and file naming for downloaded bundles.

/// Fallback folder name when nothing usable is left after cleaning.
const UNNAMED: &str = "unnamed";

/// Turn a bundle display name into a folder name.
///
/// Drops characters that are not allowed in file names on common
/// filesystems (colons included) and control characters, then trims
/// whitespace and trailing dots.
pub fn entry_folder_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, ':' | '<' | '>' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .filter(|c| !c.is_control())
        .collect();

    let trimmed = cleaned.trim().trim_end_matches(['.', ' ']);
    if trimmed.is_empty() {
        UNNAMED.to_string()
    } else {
        trimmed.to_string()
    }
}

/// The `n`th variant of a file name: `album.zip` becomes `album (n).zip`.
pub fn numbered_filename(filename: &str, n: usize) -> String {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{} ({}).{}", stem, n, ext),
        _ => format!("{} ({})", filename, n),
    }
}
