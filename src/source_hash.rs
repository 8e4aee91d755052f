//! Deterministic content digest of a component source tree
//!
//! The digest covers file names, file contents and directory nesting. Version
//! control metadata (`.git`) and entries ignored by the `.gitignore` of the
//! directory being listed are skipped. Each level only honours its own
//! `.gitignore`; patterns are not carried into subdirectories.
//!
//! Children are visited in case-insensitive name order, ties broken by the raw
//! name bytes, so the order never depends on directory enumeration. For every
//! child its name is fed into one running SHA-512 state, followed by the file
//! bytes for a regular file, or by the same procedure applied to a
//! subdirectory. The state is moved into each recursive call and handed back,
//! so the whole tree is folded into a single digest.

use std::ffi::OsString;
use std::fmt;
use std::fs::{self, File};
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use sha2::{Digest, Sha512};
use tracing::{debug, warn};

use crate::error::{ComponentError, Result};

/// Directory never included in a digest
pub const VCS_DIR: &str = ".git";

/// Per-directory exclude file
pub const IGNORE_FILE: &str = ".gitignore";

const CHUNK_SIZE: usize = 4096;

/// Lowercase hex SHA-512 digest of a source tree (128 characters)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentDigest(pub String);

impl ContentDigest {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compute the content digest of `dir`.
///
/// # Errors
///
/// * [`ComponentError::MissingDirectory`] if `dir` does not exist or is not a
///   directory
/// * [`ComponentError::Io`] naming the path that could not be listed or read
/// * [`ComponentError::InvalidIgnoreFile`] for an unparsable `.gitignore`
/// * [`ComponentError::SymlinkLoop`] if a directory symlink points back into
///   the directories being walked
///
/// # Example
///
/// ```ignore
/// let digest = hash_directory(Path::new("sources/core-admin"))?;
/// assert_eq!(digest.as_str().len(), 128);
/// ```
pub fn hash_directory(dir: &Path) -> Result<ContentDigest> {
    let mut ancestors = Vec::new();
    let hasher = update_from_dir(dir, Sha512::new(), &mut ancestors)?;
    Ok(ContentDigest(hex::encode(hasher.finalize())))
}

struct Child {
    name: OsString,
    path: PathBuf,
}

fn update_from_dir(dir: &Path, mut hasher: Sha512, ancestors: &mut Vec<PathBuf>) -> Result<Sha512> {
    if !dir.is_dir() {
        return Err(ComponentError::MissingDirectory(dir.to_path_buf()));
    }

    let canonical = fs::canonicalize(dir).map_err(|e| ComponentError::io(dir, e))?;
    if ancestors.contains(&canonical) {
        return Err(ComponentError::SymlinkLoop(dir.to_path_buf()));
    }
    ancestors.push(canonical);

    for child in sorted_children(dir)? {
        hasher.update(child.name.as_encoded_bytes());
        if child.path.is_file() {
            hasher = update_from_file(&child.path, hasher)?;
        } else if child.path.is_dir() {
            hasher = update_from_dir(&child.path, hasher, ancestors)?;
        } else {
            warn!(path = %child.path.display(), "hashing name only of special entry");
        }
    }

    ancestors.pop();
    Ok(hasher)
}

fn update_from_file(path: &Path, mut hasher: Sha512) -> Result<Sha512> {
    let mut file = File::open(path).map_err(|e| ComponentError::io(path, e))?;
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
        let bytes_read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(ComponentError::io(path, e)),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher)
}

/// Children of `dir` that take part in the digest, in hashing order
fn sorted_children(dir: &Path) -> Result<Vec<Child>> {
    let ignore = local_ignore(dir)?;

    let mut children = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| ComponentError::io(dir, e))? {
        let entry = entry.map_err(|e| ComponentError::io(dir, e))?;
        let name = entry.file_name();
        if name == VCS_DIR {
            continue;
        }
        let path = entry.path();
        if let Some(ignore) = &ignore {
            if ignore.matched(&path, path.is_dir()).is_ignore() {
                debug!(path = %path.display(), "excluded by {}", IGNORE_FILE);
                continue;
            }
        }
        children.push(Child { name, path });
    }

    // raw bytes break ties between names that fold or decode to the same key
    children.sort_by_cached_key(|child| {
        (
            child.name.to_string_lossy().to_lowercase(),
            child.name.as_encoded_bytes().to_vec(),
        )
    });
    Ok(children)
}

fn local_ignore(dir: &Path) -> Result<Option<Gitignore>> {
    let path = dir.join(IGNORE_FILE);
    if !path.is_file() {
        return Ok(None);
    }

    let mut builder = GitignoreBuilder::new(dir);
    if let Some(err) = builder.add(&path) {
        return Err(ComponentError::InvalidIgnoreFile {
            path,
            message: err.to_string(),
        });
    }
    builder
        .build()
        .map(Some)
        .map_err(|err| ComponentError::InvalidIgnoreFile {
            path,
            message: err.to_string(),
        })
}
