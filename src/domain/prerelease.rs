//! Pre-release tags and segments of a component version
//!
//! The standard tags are alpha (`a`), beta (`b`) and release candidate (`rc`).
//! Component versions additionally spell release candidates as `-rc`
//! (`4.2.0-rc1`); that spelling is kept for display but ranks exactly like `rc`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::domain::version::InvalidVersion;

/// Pre-release identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreReleaseTag {
    /// Alpha pre-release (`a`, `alpha`)
    Alpha,
    /// Beta pre-release (`b`, `beta`)
    Beta,
    /// Release candidate (`rc`, `c`, `pre`, `preview`)
    ReleaseCandidate,
    /// Release candidate written with a leading hyphen (`-rc`)
    HyphenReleaseCandidate,
}

impl PreReleaseTag {
    /// Parse a pre-release tag from its spelling
    ///
    /// Accepts the long and short standard forms case-insensitively, plus the
    /// literal `-rc`.
    pub fn parse(s: &str) -> Result<Self, InvalidVersion> {
        s.parse()
    }

    /// Precedence rank; both release candidate spellings share one rank
    pub fn rank(&self) -> u8 {
        match self {
            PreReleaseTag::Alpha => 0,
            PreReleaseTag::Beta => 1,
            PreReleaseTag::ReleaseCandidate | PreReleaseTag::HyphenReleaseCandidate => 2,
        }
    }
}

impl FromStr for PreReleaseTag {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "-rc" {
            return Ok(PreReleaseTag::HyphenReleaseCandidate);
        }
        match s.to_lowercase().as_str() {
            "alpha" | "a" => Ok(PreReleaseTag::Alpha),
            "beta" | "b" => Ok(PreReleaseTag::Beta),
            "rc" | "c" | "pre" | "preview" => Ok(PreReleaseTag::ReleaseCandidate),
            _ => Err(InvalidVersion::new(s, "unknown pre-release tag")),
        }
    }
}

impl fmt::Display for PreReleaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreReleaseTag::Alpha => write!(f, "a"),
            PreReleaseTag::Beta => write!(f, "b"),
            PreReleaseTag::ReleaseCandidate => write!(f, "rc"),
            PreReleaseTag::HyphenReleaseCandidate => write!(f, "-rc"),
        }
    }
}

/// Pre-release segment: tag plus number (`rc1`, `-rc2`, `a0`)
///
/// Equality follows precedence, so `rc1` and `-rc1` compare equal while their
/// `Display` output differs.
#[derive(Debug, Clone, Copy)]
pub struct PreRelease {
    pub tag: PreReleaseTag,
    pub number: u64,
}

impl PreRelease {
    pub fn new(tag: PreReleaseTag, number: u64) -> Self {
        PreRelease { tag, number }
    }

    /// Same number, tag respelled as `-rc`
    pub(crate) fn with_hyphen_rc(self) -> Self {
        PreRelease {
            tag: PreReleaseTag::HyphenReleaseCandidate,
            number: self.number,
        }
    }
}

impl PartialEq for PreRelease {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PreRelease {}

impl PartialOrd for PreRelease {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PreRelease {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tag
            .rank()
            .cmp(&other.tag.rank())
            .then(self.number.cmp(&other.number))
    }
}

impl fmt::Display for PreRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.tag, self.number)
    }
}
