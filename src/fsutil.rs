//! Storage-area helpers: directory resolution, filename sanitization,
//! collision-resistant paths, and Content-Disposition encoding.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Maximum filename length after sanitization
const MAX_FILENAME_LEN: usize = 200;

/// Maximum number of rename attempts when resolving file collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Characters that are invalid in filenames on common filesystems
const INVALID_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Environment markers set by serverless platforms where only a temp-style
/// directory is writable
const SERVERLESS_MARKERS: [&str; 3] = ["VERCEL", "AWS_LAMBDA_FUNCTION_NAME", "NETLIFY"];

/// Whether the process appears to run on a serverless platform
pub fn detect_serverless() -> bool {
    SERVERLESS_MARKERS
        .iter()
        .any(|marker| std::env::var_os(marker).is_some())
}

/// Resolve the storage directory for downloaded artifacts
///
/// Precedence: an explicit configured directory, then the platform temp
/// directory on serverless hosts, then a project-relative directory. The
/// directory is not created here; see [`ensure_dir`].
pub fn resolve_storage_dir(explicit: Option<&Path>, serverless: bool) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    if serverless {
        std::env::temp_dir().join("vidfetch_downloads")
    } else {
        PathBuf::from("temp_downloads")
    }
}

/// Create the storage directory if it does not exist
pub async fn ensure_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        Error::Storage(format!(
            "failed to create storage directory '{}': {}",
            dir.display(),
            e
        ))
    })
}

/// Sanitize a filename for safe storage and serving
///
/// Replaces characters invalid for filesystem names with `_`, drops control
/// characters, trims leading/trailing dots and spaces (which defeats both
/// filesystem quirks and `..` traversal), and caps the length on a char
/// boundary. Returns `download` if nothing usable remains.
pub fn sanitize_filename(name: &str) -> String {
    let mut sanitized: String = name
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if INVALID_CHARS.contains(&c) { '_' } else { c })
        .collect();

    sanitized = sanitized.trim_matches(['.', ' ']).to_string();

    if sanitized.chars().count() > MAX_FILENAME_LEN {
        sanitized = sanitized.chars().take(MAX_FILENAME_LEN).collect();
        // Truncation can expose trailing dots/spaces again
        sanitized = sanitized.trim_matches(['.', ' ']).to_string();
    }

    if sanitized.is_empty() {
        "download".to_string()
    } else {
        sanitized
    }
}

/// Reserve a collision-free variant of `path` by appending ` (1)`, ` (2)`, ...
///
/// The returned path is created as an empty file (`create_new`, atomic), so
/// two concurrent callers can never be handed the same name. The caller is
/// expected to rename its payload over the reservation. Errors when the path
/// has no usable stem/parent or every candidate is taken.
pub fn unique_path(path: &Path) -> Result<PathBuf> {
    if try_reserve(path)? {
        return Ok(path.to_path_buf());
    }

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::Storage(format!("cannot extract file stem from '{}'", path.display())))?;
    let extension = path.extension().and_then(|e| e.to_str());
    let parent = path
        .parent()
        .ok_or_else(|| Error::Storage(format!("cannot extract parent of '{}'", path.display())))?;

    for i in 1..=MAX_RENAME_ATTEMPTS {
        let candidate = match extension {
            Some(ext) => format!("{stem} ({i}).{ext}"),
            None => format!("{stem} ({i})"),
        };
        let candidate_path = parent.join(candidate);
        if try_reserve(&candidate_path)? {
            return Ok(candidate_path);
        }
    }

    Err(Error::Storage(format!(
        "could not find unique filename for '{}' after {} attempts",
        path.display(),
        MAX_RENAME_ATTEMPTS
    )))
}

/// Atomically create `candidate` empty; `false` when something already owns it
fn try_reserve(candidate: &Path) -> Result<bool> {
    match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(candidate)
    {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(Error::Storage(format!(
            "cannot reserve '{}': {}",
            candidate.display(),
            e
        ))),
    }
}

/// Build a `Content-Disposition` attachment header value for a filename
///
/// Emits an ASCII-safe fallback (non-ASCII runs collapsed to `_`) plus the
/// RFC 5987 `filename*` parameter carrying the percent-encoded UTF-8 name,
/// so every client gets a usable name.
pub fn content_disposition(filename: &str) -> String {
    let mut ascii = String::with_capacity(filename.len());
    let mut in_non_ascii = false;
    for c in filename.chars() {
        if c.is_ascii() && c != '"' {
            ascii.push(c);
            in_non_ascii = false;
        } else if !in_non_ascii {
            ascii.push('_');
            in_non_ascii = true;
        }
    }

    let encoded = urlencoding::encode(filename);
    format!("attachment; filename=\"{ascii}\"; filename*=UTF-8''{encoded}")
}
