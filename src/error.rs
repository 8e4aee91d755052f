use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::InvalidVersion;

/// Unified error type for component identity operations
#[derive(Error, Debug)]
pub enum ComponentError {
    #[error("Cannot find source directory {}", .0.display())]
    MissingSourceDir(PathBuf),

    #[error("Cannot find '{}'", .0.display())]
    MissingDirectory(PathBuf),

    #[error("Invalid version for {component}: {source}")]
    InvalidVersion {
        component: String,
        #[source]
        source: InvalidVersion,
    },

    #[error("Invalid release for {component}: {source}")]
    InvalidRelease {
        component: String,
        #[source]
        source: InvalidVersion,
    },

    #[error("Invalid version description for {component}: '{description}'")]
    InvalidDescription {
        component: String,
        description: String,
    },

    #[error("Invalid devel version for {component}: '{value}'")]
    InvalidDevel { component: String, value: String },

    #[error("Devel path not provided for {0}")]
    MissingDevelPath(String),

    #[error("Cannot determine version for {0}")]
    UnresolvedVersion(String),

    #[error("Cannot determine version and release for {0}")]
    VersionRelease(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Version control operation failed for {component}: {message}")]
    Git { component: String, message: String },

    #[error("Invalid ignore file {}: {message}", path.display())]
    InvalidIgnoreFile { path: PathBuf, message: String },

    #[error("Symlink loop detected at {}", .0.display())]
    SymlinkLoop(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience type alias for Results in component-ident
pub type Result<T> = std::result::Result<T, ComponentError>;

impl ComponentError {
    /// Create an I/O error bound to the offending path
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        ComponentError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a version control error with context
    pub fn git(component: impl Into<String>, message: impl Into<String>) -> Self {
        ComponentError::Git {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ComponentError::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Version;

    #[test]
    fn test_error_display() {
        let err = ComponentError::config("missing table");
        assert_eq!(err.to_string(), "Configuration error: missing table");
    }

    #[test]
    fn test_io_error_names_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ComponentError::io("/srv/src/core-admin/version", io_err);
        let msg = err.to_string();
        assert!(msg.contains("/srv/src/core-admin/version"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_invalid_version_wraps_source() {
        let source = Version::parse("not-a-version").unwrap_err();
        let err = ComponentError::InvalidVersion {
            component: "core-admin".to_string(),
            source,
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Invalid version for core-admin"));
        assert!(msg.contains("not-a-version"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let error_pairs = vec![
            (
                ComponentError::MissingDevelPath("linux-utils".to_string()),
                "Devel path not provided for linux-utils",
            ),
            (
                ComponentError::UnresolvedVersion("linux-utils".to_string()),
                "Cannot determine version for linux-utils",
            ),
            (
                ComponentError::VersionRelease("linux-utils".to_string()),
                "Cannot determine version and release for linux-utils",
            ),
            (
                ComponentError::git("linux-utils", "bad HEAD"),
                "Version control operation failed for linux-utils: bad HEAD",
            ),
        ];

        for (err, expected) in error_pairs {
            assert_eq!(err.to_string(), expected);
        }
    }

    #[test]
    fn test_invalid_devel_quotes_value() {
        let err = ComponentError::InvalidDevel {
            component: "vmm-xen".to_string(),
            value: "12a".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid devel version for vmm-xen: '12a'");
    }
}
