//! Path utilities for naming entries in the backup tree.

/// Characters that are stripped from titles before they become folder names.
const UNSAFE_CHARS: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Image extensions recognised as backup files, in lookup order.
pub const BACKUP_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Strip characters that are not allowed in folder names on common
/// filesystems.
///
/// Names that would not be a folder of their own (empty, `.`, `..`) become
/// `_`.
///
/// # Examples
///
/// ```
/// use artwork_healer_common::paths::safe_filename;
///
/// assert_eq!(safe_filename("Mission: Impossible"), "Mission Impossible");
/// assert_eq!(safe_filename("What If...?"), "What If...");
/// assert_eq!(safe_filename(".."), "_");
/// ```
pub fn safe_filename(name: &str) -> String {
    let cleaned: String = name.chars().filter(|c| !UNSAFE_CHARS.contains(c)).collect();
    match cleaned.trim() {
        "" | "." | ".." => PLACEHOLDER.to_string(),
        _ => cleaned,
    }
}

const PLACEHOLDER: &str = "_";
