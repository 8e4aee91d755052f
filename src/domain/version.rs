//! Component version model
//!
//! Versions follow the usual epoch / release / pre / post / dev / local
//! grammar with two extensions used by component version files:
//! - a hyphenated release candidate (`4.2.0-rc1`), kept as `-rc` for display
//! - a fractional post-release (`1.0-0.1`), kept as post-release `0.1`

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use thiserror::Error;

use crate::domain::prerelease::{PreRelease, PreReleaseTag};

const VERSION_PATTERN: &str = r"(?xi)
    ^\s*
    v?
    (?:(?P<epoch>[0-9]+)!)?
    (?P<release>[0-9]+(?:\.[0-9]+)*)
    (?P<pre>
        [-_.]?
        (?P<pre_l>alpha|a|beta|b|preview|pre|c|rc)
        [-_.]?
        (?P<pre_n>[0-9]+)?
    )?
    (?P<post>
        (?:-(?P<post_n1>[0-9]+))
        |
        (?:
            [-_.]?
            (?P<post_l>post|rev|r)
            [-_.]?
            (?P<post_n2>[0-9]+)?
        )
    )?
    (?P<dev>
        [-_.]?
        (?P<dev_l>dev)
        [-_.]?
        (?P<dev_n>[0-9]+)?
    )?
    (?:\+(?P<local>[a-z0-9]+(?:[-_.][a-z0-9]+)*))?
    (?:\.(?P<post_frac>[0-9]+))?
    \s*$
";

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(VERSION_PATTERN).expect("version pattern is valid"))
}

/// A string that is not a valid component version
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid version '{raw}': {reason}")]
pub struct InvalidVersion {
    raw: String,
    reason: String,
}

impl InvalidVersion {
    pub(crate) fn new(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        InvalidVersion {
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    /// The rejected input
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// Post-release value: a number with an optional fractional suffix
///
/// `1.0-3` carries `3`, `1.0-0.1` carries `0` with fraction `1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRelease {
    pub number: u64,
    pub fraction: Option<String>,
}

impl PartialOrd for PostRelease {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PostRelease {
    fn cmp(&self, other: &Self) -> Ordering {
        self.number
            .cmp(&other.number)
            .then_with(|| match (&self.fraction, &other.fraction) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(a), Some(b)) => cmp_digits(a, b),
            })
    }
}

impl fmt::Display for PostRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number)?;
        if let Some(fraction) = &self.fraction {
            write!(f, ".{}", fraction)?;
        }
        Ok(())
    }
}

/// One segment of a local version label (`+ubuntu.2`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalSegment {
    /// All-digit segment, stored without leading zeros
    Number(String),
    /// Alphanumeric segment, lower-cased
    Text(String),
}

impl LocalSegment {
    fn parse(segment: &str) -> Self {
        if segment.bytes().all(|b| b.is_ascii_digit()) {
            LocalSegment::Number(strip_leading_zeros(segment).to_string())
        } else {
            LocalSegment::Text(segment.to_lowercase())
        }
    }
}

impl PartialOrd for LocalSegment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LocalSegment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (LocalSegment::Number(a), LocalSegment::Number(b)) => cmp_digits(a, b),
            (LocalSegment::Text(a), LocalSegment::Text(b)) => a.cmp(b),
            (LocalSegment::Number(_), LocalSegment::Text(_)) => Ordering::Greater,
            (LocalSegment::Text(_), LocalSegment::Number(_)) => Ordering::Less,
        }
    }
}

impl fmt::Display for LocalSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalSegment::Number(n) => write!(f, "{}", n),
            LocalSegment::Text(s) => write!(f, "{}", s),
        }
    }
}

fn strip_leading_zeros(digits: &str) -> &str {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0"
    } else {
        trimmed
    }
}

/// Numeric comparison of arbitrarily long digit strings
fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a = strip_leading_zeros(a);
    let b = strip_leading_zeros(b);
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Parsed component version
///
/// Immutable once parsed. Equality and ordering follow version precedence:
/// `1.0 == 1.0.0` and `4.2-rc1 == 4.2rc1`, while `Display` keeps the `-rc`
/// spelling and the fractional post-release.
#[derive(Debug, Clone)]
pub struct Version {
    epoch: u64,
    release: Vec<u64>,
    pre: Option<PreRelease>,
    post: Option<PostRelease>,
    dev: Option<u64>,
    local: Option<Vec<LocalSegment>>,
}

impl Version {
    /// Parse a version string
    ///
    /// # Examples
    /// ```
    /// use component_ident::domain::Version;
    ///
    /// let v = Version::parse("4.2.0-rc1").unwrap();
    /// assert_eq!(v.to_string(), "4.2.0-rc1");
    /// assert_eq!(v, Version::parse("4.2.0rc1").unwrap());
    ///
    /// let frac = Version::parse("1.0-0.1").unwrap();
    /// assert_eq!(frac.post().unwrap().to_string(), "0.1");
    /// ```
    pub fn parse(raw: &str) -> Result<Self, InvalidVersion> {
        let caps = version_regex()
            .captures(raw)
            .ok_or_else(|| InvalidVersion::new(raw, "does not match the version grammar"))?;

        let epoch = match caps.name("epoch") {
            Some(m) => parse_number(raw, m.as_str())?,
            None => 0,
        };

        let release = caps["release"]
            .split('.')
            .map(|part| parse_number(raw, part))
            .collect::<Result<Vec<_>, _>>()?;

        let mut pre = match caps.name("pre_l") {
            Some(label) => Some(PreRelease::new(
                PreReleaseTag::parse(label.as_str())?,
                optional_number(raw, &caps, "pre_n")?,
            )),
            None => None,
        };

        let mut post = if let Some(n) = caps.name("post_n1") {
            Some(PostRelease {
                number: parse_number(raw, n.as_str())?,
                fraction: None,
            })
        } else if caps.name("post_l").is_some() {
            Some(PostRelease {
                number: optional_number(raw, &caps, "post_n2")?,
                fraction: None,
            })
        } else {
            None
        };

        let dev = match caps.name("dev_l") {
            Some(_) => Some(optional_number(raw, &caps, "dev_n")?),
            None => None,
        };

        let local = caps.name("local").map(|m| {
            m.as_str()
                .split(|c| c == '-' || c == '_' || c == '.')
                .map(LocalSegment::parse)
                .collect()
        });

        if raw.contains("-rc") {
            pre = Some(
                pre.ok_or_else(|| {
                    InvalidVersion::new(raw, "'-rc' spelling without a pre-release segment")
                })?
                .with_hyphen_rc(),
            );
        }

        if let Some(fraction) = caps.name("post_frac") {
            let mut value = post.ok_or_else(|| {
                InvalidVersion::new(raw, "fractional suffix without a post-release segment")
            })?;
            value.fraction = Some(fraction.as_str().to_string());
            post = Some(value);
        }

        Ok(Version {
            epoch,
            release,
            pre,
            post,
            dev,
            local,
        })
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn release(&self) -> &[u64] {
        &self.release
    }

    pub fn pre(&self) -> Option<&PreRelease> {
        self.pre.as_ref()
    }

    pub fn post(&self) -> Option<&PostRelease> {
        self.post.as_ref()
    }

    pub fn dev(&self) -> Option<u64> {
        self.dev
    }

    pub fn local(&self) -> Option<&[LocalSegment]> {
        self.local.as_deref()
    }

    fn release_key(&self) -> &[u64] {
        let end = self
            .release
            .iter()
            .rposition(|&segment| segment != 0)
            .map_or(0, |i| i + 1);
        &self.release[..end]
    }

    fn pre_key(&self) -> PreKey {
        match (&self.pre, &self.post, self.dev) {
            (None, None, Some(_)) => PreKey::BeforeAll,
            (None, _, _) => PreKey::Final,
            (Some(pre), _, _) => PreKey::Pre(*pre),
        }
    }

    fn dev_key(&self) -> DevKey {
        match self.dev {
            Some(n) => DevKey::Dev(n),
            None => DevKey::Final,
        }
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum PreKey {
    BeforeAll,
    Pre(PreRelease),
    Final,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum DevKey {
    Dev(u64),
    Final,
}

fn parse_number(raw: &str, digits: &str) -> Result<u64, InvalidVersion> {
    digits
        .parse::<u64>()
        .map_err(|_| InvalidVersion::new(raw, format!("number '{}' out of range", digits)))
}

fn optional_number(raw: &str, caps: &Captures<'_>, group: &str) -> Result<u64, InvalidVersion> {
    match caps.name(group) {
        Some(m) => parse_number(raw, m.as_str()),
        None => Ok(0),
    }
}

impl FromStr for Version {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| self.release_key().cmp(other.release_key()))
            .then_with(|| self.pre_key().cmp(&other.pre_key()))
            .then_with(|| self.post.cmp(&other.post))
            .then_with(|| self.dev_key().cmp(&other.dev_key()))
            .then_with(|| self.local().cmp(&other.local()))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }
        let release: Vec<String> = self.release.iter().map(|n| n.to_string()).collect();
        write!(f, "{}", release.join("."))?;
        if let Some(pre) = &self.pre {
            write!(f, "{}", pre)?;
        }
        if let Some(post) = &self.post {
            write!(f, ".post{}", post)?;
        }
        if let Some(dev) = self.dev {
            write!(f, ".dev{}", dev)?;
        }
        if let Some(local) = &self.local {
            let segments: Vec<String> = local.iter().map(|s| s.to_string()).collect();
            write!(f, "+{}", segments.join("."))?;
        }
        Ok(())
    }
}
