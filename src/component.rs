//! Component identity: version, release and devel counter of one component
//!
//! Values are read from files at the root of the component source tree:
//! - `version`: first line, must be a valid [Version]
//! - `rel`: first line, `"{version}-{rel}"` must be a valid [Version]; `1` when absent
//! - devel counter (outside the tree, optional): first line, digits only
//!
//! Without a `version` file the most recent `v*` tag is used instead; a tag
//! such as `v4.2.1-3` supplies both version (`4.2.1`) and release (`3`).
//! Every resolved value is cached for the lifetime of the [Component].

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info};

use crate::domain::Version;
use crate::error::{ComponentError, Result};
use crate::git::{Git2Repository, Repository};
use crate::source_hash::{self, ContentDigest};

/// Identifier of components that do not produce versioned packages
pub const NO_VERSION: &str = "noversion";

/// Release used when the source tree has no `rel` file
pub const DEFAULT_RELEASE: &str = "1";

pub const VERSION_FILE: &str = "version";
pub const RELEASE_FILE: &str = "rel";
pub const FORMULA_FILE: &str = "FORMULA";

pub const VERSION_PLACEHOLDER: &str = "@VERSION@";
pub const RELEASE_PLACEHOLDER: &str = "@REL@";

const MAX_DESCRIPTION_LEN: usize = 255;

fn description_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^v?([0-9]+(?:\.[0-9]+)*)-([0-9]+.*)").expect("description pattern is valid")
    })
}

fn devel_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]+$").expect("devel pattern is valid"))
}

/// One build component and its lazily resolved identity
pub struct Component {
    name: String,
    source_dir: PathBuf,
    is_plugin: bool,
    has_packages: bool,
    devel_path: Option<PathBuf>,
    repository: Box<dyn Repository>,
    version: Option<String>,
    release: Option<String>,
    devel: Option<String>,
    source_hash: Option<ContentDigest>,
}

impl Component {
    /// Create a component for `source_dir`, named after its last path element
    ///
    /// Version control lookups go to a [Git2Repository] at `source_dir`.
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        let source_dir = source_dir.into();
        let name = source_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let repository = Box::new(Git2Repository::new(&source_dir));

        Component {
            name,
            source_dir,
            is_plugin: false,
            has_packages: true,
            devel_path: None,
            repository,
            version: None,
            release: None,
            devel: None,
            source_hash: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_plugin(mut self, is_plugin: bool) -> Self {
        self.is_plugin = is_plugin;
        self
    }

    pub fn with_packages(mut self, has_packages: bool) -> Self {
        self.has_packages = has_packages;
        self
    }

    pub fn with_devel_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.devel_path = Some(path.into());
        self
    }

    /// Replace the version control backend
    pub fn with_repository(mut self, repository: Box<dyn Repository>) -> Self {
        self.repository = repository;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn is_plugin(&self) -> bool {
        self.is_plugin
    }

    pub fn has_packages(&self) -> bool {
        self.has_packages
    }

    pub fn devel_path(&self) -> Option<&Path> {
        self.devel_path.as_deref()
    }

    /// True for configuration-management components (`FORMULA` at the root)
    pub fn has_formula(&self) -> bool {
        self.source_dir.join(FORMULA_FILE).exists()
    }

    /// Drop every cached value; the next call resolves from disk again
    pub fn invalidate(&mut self) {
        self.version = None;
        self.release = None;
        self.devel = None;
        self.source_hash = None;
    }

    /// Resolve the component version.
    ///
    /// The raw first line of the `version` file is returned, not its
    /// canonical rendering. Plugins and components without packages never
    /// touch disk and get the cached value or an empty string.
    ///
    /// # Errors
    /// * [`ComponentError::InvalidVersion`] - the version file or tag does not parse
    /// * [`ComponentError::InvalidDescription`] - the tag does not look like `v<version>-<release>`
    /// * [`ComponentError::UnresolvedVersion`] - neither a version file nor a tag exists
    pub fn resolve_version(&mut self) -> Result<String> {
        if let Some(version) = &self.version {
            return Ok(version.clone());
        }
        if self.is_plugin || !self.has_packages {
            return Ok(String::new());
        }

        let version_file = self.source_dir.join(VERSION_FILE);
        let version = if version_file.exists() {
            let raw = read_first_line(&version_file)?;
            Version::parse(&raw).map_err(|source| ComponentError::InvalidVersion {
                component: self.name.clone(),
                source,
            })?;
            debug!(component = %self.name, version = %raw, "version read from file");
            raw
        } else {
            let (version, release) = self.describe_version()?;
            debug!(
                component = %self.name,
                version = %version,
                release = %release,
                "version derived from tag"
            );
            if self.release.is_none() {
                self.release = Some(release);
            }
            version
        };

        self.version = Some(version.clone());
        Ok(version)
    }

    fn describe_version(&self) -> Result<(String, String)> {
        let description = self
            .repository
            .describe_version_tag()
            .map_err(|e| ComponentError::git(&self.name, e.message()))?
            .ok_or_else(|| ComponentError::UnresolvedVersion(self.name.clone()))?;

        let description = sanitize_line(&description);
        let invalid = || ComponentError::InvalidDescription {
            component: self.name.clone(),
            description: description.clone(),
        };
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(invalid());
        }
        let caps = description_regex().captures(&description).ok_or_else(invalid)?;
        let version = caps[1].to_string();
        let release = caps[2].to_string();

        Version::parse(&version).map_err(|source| ComponentError::InvalidVersion {
            component: self.name.clone(),
            source,
        })?;
        Ok((version, release))
    }

    /// Resolve the package release.
    ///
    /// The version is resolved first: a tag-derived version also fixes the
    /// release. Otherwise the `rel` file is read, defaulting to `1`.
    pub fn resolve_release(&mut self) -> Result<String> {
        if let Some(release) = &self.release {
            return Ok(release.clone());
        }
        let version = self.resolve_version()?;
        if let Some(release) = &self.release {
            return Ok(release.clone());
        }

        let release_file = self.source_dir.join(RELEASE_FILE);
        let release = if release_file.exists() {
            let raw = read_first_line(&release_file)?;
            Version::parse(&format!("{}-{}", version, raw)).map_err(|source| {
                ComponentError::InvalidRelease {
                    component: self.name.clone(),
                    source,
                }
            })?;
            debug!(component = %self.name, release = %raw, "release read from file");
            raw
        } else {
            DEFAULT_RELEASE.to_string()
        };

        self.release = Some(release.clone());
        Ok(release)
    }

    /// Resolve the devel counter, `None` when no counter has been persisted
    pub fn resolve_devel(&mut self) -> Result<Option<String>> {
        if let Some(devel) = &self.devel {
            return Ok(Some(devel.clone()));
        }
        let Some(path) = self.devel_path.as_deref() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }

        let devel = self.read_devel(path)?;
        self.devel = Some(devel.clone());
        Ok(Some(devel))
    }

    /// Bump the persisted devel counter (`1` for a fresh counter).
    ///
    /// Not idempotent: call once per build of the component. Components
    /// without packages are left untouched.
    pub fn increment_devel(&mut self) -> Result<()> {
        if !self.has_packages {
            return Ok(());
        }
        let path = self
            .devel_path
            .clone()
            .ok_or_else(|| ComponentError::MissingDevelPath(self.name.clone()))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ComponentError::io(parent, e))?;
        }

        let devel = if path.exists() {
            let current = self.read_devel(&path)?;
            current
                .parse::<u64>()
                .ok()
                .and_then(|n| n.checked_add(1))
                .ok_or_else(|| ComponentError::InvalidDevel {
                    component: self.name.clone(),
                    value: current.clone(),
                })?
                .to_string()
        } else {
            "1".to_string()
        };

        fs::write(&path, &devel).map_err(|e| ComponentError::io(&path, e))?;
        info!(component = %self.name, devel = %devel, "devel counter incremented");
        self.devel = Some(devel);
        Ok(())
    }

    fn read_devel(&self, path: &Path) -> Result<String> {
        let devel = read_first_line(path)?;
        if !devel_regex().is_match(&devel) {
            return Err(ComponentError::InvalidDevel {
                component: self.name.clone(),
                value: devel,
            });
        }
        Ok(devel)
    }

    /// `"{version}-{release}"`, suffixed with `".{devel}"` when a devel
    /// counter exists; [`NO_VERSION`] for plugins and components without
    /// packages.
    pub fn version_release(&mut self) -> Result<String> {
        if self.is_plugin || !self.has_packages {
            return Ok(NO_VERSION.to_string());
        }

        let version = self.resolve_version()?;
        let release = self.resolve_release()?;
        if version.is_empty() || release.is_empty() {
            return Err(ComponentError::VersionRelease(self.name.clone()));
        }

        let mut identifier = format!("{}-{}", version, release);
        if let Some(devel) = self.resolve_devel()? {
            identifier.push('.');
            identifier.push_str(&devel);
        }
        Ok(identifier)
    }

    /// Content digest of the source tree, cached unless `force_update`
    pub fn source_hash(&mut self, force_update: bool) -> Result<ContentDigest> {
        if let Some(digest) = &self.source_hash {
            if !force_update {
                return Ok(digest.clone());
            }
        }

        let digest = source_hash::hash_directory(&self.source_dir)?;
        info!(component = %self.name, digest = %digest, "source tree hashed");
        self.source_hash = Some(digest.clone());
        Ok(digest)
    }

    /// Commit id of the checked out source
    pub fn source_commit_hash(&self) -> Result<String> {
        self.repository.head_commit_id().map_err(|e| {
            ComponentError::git(
                &self.name,
                format!(
                    "cannot determine source commit hash for {}: {}",
                    self.source_dir.display(),
                    e.message()
                ),
            )
        })
    }

    /// Placeholder values for build recipe templating
    ///
    /// Empty for plugins and components without packages.
    pub fn placeholders(&mut self) -> Result<BTreeMap<String, String>> {
        if !self.source_dir.exists() {
            return Err(ComponentError::MissingSourceDir(self.source_dir.clone()));
        }

        let mut placeholders = BTreeMap::new();
        if self.is_plugin || !self.has_packages {
            return Ok(placeholders);
        }
        placeholders.insert(VERSION_PLACEHOLDER.to_string(), self.resolve_version()?);
        placeholders.insert(RELEASE_PLACEHOLDER.to_string(), self.resolve_release()?);
        Ok(placeholders)
    }
}

/// Replace every placeholder key found in `text` by its value
pub fn substitute_placeholders(text: &str, placeholders: &BTreeMap<String, String>) -> String {
    placeholders
        .iter()
        .fold(text.to_string(), |acc, (key, value)| acc.replace(key.as_str(), value))
}

fn read_first_line(path: &Path) -> Result<String> {
    let content = fs::read_to_string(path).map_err(|e| ComponentError::io(path, e))?;
    Ok(content.split('\n').next().unwrap_or_default().to_string())
}

/// Strip control characters and surrounding whitespace from untrusted output
fn sanitize_line(untrusted: &str) -> String {
    let cleaned: String = untrusted.chars().filter(|c| !c.is_control()).collect();
    cleaned.trim().to_string()
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source_dir.file_name() {
            Some(name) => write!(f, "{}", name.to_string_lossy()),
            None => write!(f, "{}", self.name),
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("source_dir", &self.source_dir)
            .field("is_plugin", &self.is_plugin)
            .field("has_packages", &self.has_packages)
            .field("devel_path", &self.devel_path)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockRepository;
    use std::sync::atomic::Ordering;
    use tempfile::tempdir;

    fn component(dir: &Path) -> Component {
        Component::new(dir).with_repository(Box::new(MockRepository::new()))
    }

    #[test]
    fn test_sanitize_line() {
        assert_eq!(sanitize_line("  v1.0-1\u{1b}[0m\r\n"), "v1.0-1[0m");
        assert_eq!(sanitize_line("\tv2.0-3 "), "v2.0-3");
    }

    #[test]
    fn test_read_first_line_ignores_rest() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("version");
        fs::write(&path, "4.2.1\ntrailing garbage\n").unwrap();
        assert_eq!(read_first_line(&path).unwrap(), "4.2.1");
    }

    #[test]
    fn test_version_keeps_raw_text() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join(VERSION_FILE), "4.2.0-rc1\n").unwrap();
        let mut comp = component(temp.path());
        assert_eq!(comp.resolve_version().unwrap(), "4.2.0-rc1");
    }

    #[test]
    fn test_version_is_cached() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join(VERSION_FILE), "1.0\n").unwrap();
        let mut comp = component(temp.path());
        assert_eq!(comp.resolve_version().unwrap(), "1.0");

        fs::write(temp.path().join(VERSION_FILE), "2.0\n").unwrap();
        assert_eq!(comp.resolve_version().unwrap(), "1.0");

        comp.invalidate();
        assert_eq!(comp.resolve_version().unwrap(), "2.0");
    }

    #[test]
    fn test_tag_lookup_happens_once() {
        let temp = tempdir().unwrap();
        let repo = MockRepository::new().with_description("v3.1.4-2");
        let calls = repo.describe_calls();
        let mut comp = Component::new(temp.path()).with_repository(Box::new(repo));

        assert_eq!(comp.resolve_version().unwrap(), "3.1.4");
        assert_eq!(comp.resolve_version().unwrap(), "3.1.4");
        assert_eq!(comp.resolve_release().unwrap(), "2");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_release_before_version_uses_tag_release() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join(RELEASE_FILE), "9\n").unwrap();
        let repo = MockRepository::new().with_description("v3.1.4-2");
        let mut comp = Component::new(temp.path()).with_repository(Box::new(repo));

        assert_eq!(comp.resolve_release().unwrap(), "2");
        assert_eq!(comp.version_release().unwrap(), "3.1.4-2");
    }

    #[test]
    fn test_description_too_long() {
        let temp = tempdir().unwrap();
        let long = format!("v1.0-{}", "1".repeat(300));
        let repo = MockRepository::new().with_description(long);
        let mut comp = Component::new(temp.path()).with_repository(Box::new(repo));

        assert!(matches!(
            comp.resolve_version().unwrap_err(),
            ComponentError::InvalidDescription { .. }
        ));
    }

    #[test]
    fn test_description_without_release_rejected() {
        let temp = tempdir().unwrap();
        let repo = MockRepository::new().with_description("v1.0");
        let mut comp = Component::new(temp.path()).with_repository(Box::new(repo));

        assert!(matches!(
            comp.resolve_version().unwrap_err(),
            ComponentError::InvalidDescription { .. }
        ));
    }

    #[test]
    fn test_devel_must_be_digits() {
        let temp = tempdir().unwrap();
        let devel = temp.path().join("devel");
        fs::write(&devel, "12a\n").unwrap();
        let mut comp = component(temp.path()).with_devel_path(&devel);

        assert!(matches!(
            comp.resolve_devel().unwrap_err(),
            ComponentError::InvalidDevel { .. }
        ));
        assert!(comp.increment_devel().is_err());
        assert_eq!(fs::read_to_string(&devel).unwrap(), "12a\n");
    }

    #[test]
    fn test_devel_overflow_rejected() {
        let temp = tempdir().unwrap();
        let devel = temp.path().join("devel");
        fs::write(&devel, u64::MAX.to_string()).unwrap();
        let mut comp = component(temp.path()).with_devel_path(&devel);

        assert!(matches!(
            comp.increment_devel().unwrap_err(),
            ComponentError::InvalidDevel { .. }
        ));
    }

    #[test]
    fn test_substitute_placeholders() {
        let mut placeholders = BTreeMap::new();
        placeholders.insert(VERSION_PLACEHOLDER.to_string(), "4.2.1".to_string());
        placeholders.insert(RELEASE_PLACEHOLDER.to_string(), "3".to_string());

        let text = "source: pkg-@VERSION@.tar.gz\nrelease: @REL@\nagain: @VERSION@";
        assert_eq!(
            substitute_placeholders(text, &placeholders),
            "source: pkg-4.2.1.tar.gz\nrelease: 3\nagain: 4.2.1"
        );
    }

    #[test]
    fn test_display_and_equality_use_directory_name() {
        let a = Component::new("/srv/sources/core-admin").with_name("admin");
        let b = Component::new("/tmp/other/core-admin");
        assert_eq!(a.to_string(), "core-admin");
        assert_eq!(a, b);
        assert_eq!(a.name(), "admin");
        assert_eq!(b.name(), "core-admin");
    }
}
