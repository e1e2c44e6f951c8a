use super::FavouriteKind;
use std::path::Path;

const MAX_NAME_CHARS: usize = 25;
const HALF_NAME_CHARS: usize = MAX_NAME_CHARS / 2;
const APP_EXTENSION: &str = ".app";

pub fn classify(path: &Path) -> (FavouriteKind, String) {
    let ext = extension(path);
    let kind = if ext == APP_EXTENSION {
        FavouriteKind::App
    } else if is_dir(path) {
        FavouriteKind::Dir
    } else {
        FavouriteKind::File
    };
    (kind, display_name(path, kind))
}

/// Does not follow symlinks, and treats unreadable or missing paths as "not a directory".
pub fn is_dir(path: &Path) -> bool {
    std::fs::symlink_metadata(path)
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

pub fn display_name(path: &Path, kind: FavouriteKind) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    let ext = match kind {
        FavouriteKind::App => String::new(),
        _ => extension(path),
    };
    truncate_name(&stem, &ext)
}

/// Collapses long base names to `first…last` so both ends stay readable.
pub fn truncate_name(stem: &str, ext: &str) -> String {
    let chars: Vec<char> = stem.chars().collect();
    if chars.len() <= MAX_NAME_CHARS {
        return format!("{}{}", stem, ext);
    }

    let start: String = chars[..HALF_NAME_CHARS].iter().collect();
    let end: String = chars[chars.len() - HALF_NAME_CHARS..].iter().collect();
    format!("{}…{}{}", start.trim(), end.trim(), ext)
}

fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}
