//! Pre-start validation of the measurement output target.
//!
//! Six rules, applied in a fixed order before any worker process is spawned;
//! the first failing rule determines the reported error. All rules are pure
//! functions of the input strings plus directory metadata, so they are unit
//! tested independently of process spawning.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Legacy path-length ceiling for the computed output path.
const MAX_OUTPUT_PATH: usize = 260;

/// Extensions the output base name must not end with. Guards against
/// overwriting the measurement script or packaged controller artifacts
/// sitting next to the output folder.
const RESERVED_EXTENSIONS: [&str; 3] = [".py", ".exe", ".jar"];

/// Character set allowed in output base names. Space is allowed here and
/// rejected separately so that whitespace gets its own diagnostic.
static ALLOWED_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._() \-]+$").unwrap()
});

/// A failed output-target rule, reported before anything is spawned.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Rule 1: the folder field is empty.
    #[error("Output folder is not set")]
    FolderMissing,
    /// Rule 1: the folder path does not exist.
    #[error("Output folder not found: {0}")]
    FolderNotFound(String),
    /// Rule 1: the path exists but is not a directory.
    #[error("Output path is not a folder: {0}")]
    NotAFolder(String),
    /// Rule 1: the directory has no write access.
    #[error("No write access to output folder: {0}")]
    FolderNotWritable(String),
    /// Rule 2: the base name field is empty.
    #[error("Output file name is not set")]
    NameMissing,
    /// Rule 3: the base name is outside the allowed character set.
    #[error("Output file name contains invalid characters: {0}")]
    InvalidCharacters(String),
    /// Rule 4: the base name contains whitespace (distinct diagnostic; the
    /// worker receives the name as a positional argument).
    #[error("Output file name contains whitespace: {0}")]
    ContainsWhitespace(String),
    /// Rule 5: the base name ends with a reserved extension.
    #[error("Output file name ends with reserved extension {0}")]
    ReservedExtension(String),
    /// Rule 6: the computed path exceeds the legacy ceiling.
    #[error("Full output path exceeds {MAX_OUTPUT_PATH} characters")]
    PathTooLong,
}

/// Validates the output folder and base name, returning the computed output
/// path (`<folder>/<base>.csv`) the worker will write to.
///
/// Both inputs are trimmed before validation, matching what operators paste
/// into entry fields.
///
/// # Errors
///
/// The first failing rule, as a [`ValidationError`].
pub fn validate_output_target(
    folder: &str,
    base_name: &str,
) -> Result<PathBuf, ValidationError> {
    let folder = folder.trim();
    let base_name = base_name.trim();

    if folder.is_empty() {
        return Err(ValidationError::FolderMissing);
    }
    let dir = Path::new(folder);
    if !dir.exists() {
        return Err(ValidationError::FolderNotFound(folder.to_string()));
    }
    if !dir.is_dir() {
        return Err(ValidationError::NotAFolder(folder.to_string()));
    }
    let writable = std::fs::metadata(dir)
        .map(|meta| !meta.permissions().readonly())
        .unwrap_or(false);
    if !writable {
        return Err(ValidationError::FolderNotWritable(folder.to_string()));
    }

    if base_name.is_empty() {
        return Err(ValidationError::NameMissing);
    }
    let has_forbidden = base_name
        .chars()
        .any(|c| matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|'));
    if !ALLOWED_NAME.is_match(base_name) || has_forbidden {
        return Err(ValidationError::InvalidCharacters(base_name.to_string()));
    }
    if base_name.chars().any(char::is_whitespace) {
        return Err(ValidationError::ContainsWhitespace(base_name.to_string()));
    }
    let lower = base_name.to_ascii_lowercase();
    if let Some(ext) = RESERVED_EXTENSIONS.iter().find(|ext| lower.ends_with(*ext)) {
        return Err(ValidationError::ReservedExtension((*ext).to_string()));
    }

    let full = dir.join(format!("{base_name}.csv"));
    if full.as_os_str().len() > MAX_OUTPUT_PATH {
        return Err(ValidationError::PathTooLong);
    }
    Ok(full)
}
