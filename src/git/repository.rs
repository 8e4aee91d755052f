use std::path::{Path, PathBuf};

use git2::{DescribeFormatOptions, DescribeOptions, ErrorClass, ErrorCode, Repository as Git2Repo};
use tracing::debug;

use crate::git::GitResult;

/// `git2` backed repository rooted at a component source directory
///
/// The repository is discovered for each call, searching upward from the
/// component directory, so a component may live in a subdirectory of a
/// larger checkout. Constructing one for a directory that is not (yet) a
/// checkout is not an error.
pub struct Git2Repository {
    path: PathBuf,
}

impl Git2Repository {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Git2Repository {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn open(&self) -> GitResult<Git2Repo> {
        Git2Repo::discover(&self.path)
    }
}

impl super::Repository for Git2Repository {
    fn describe_version_tag(&self) -> GitResult<Option<String>> {
        let repo = match self.open() {
            Ok(repo) => repo,
            Err(e) if e.code() == ErrorCode::NotFound => {
                debug!(path = %self.path.display(), "not a git repository");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let mut options = DescribeOptions::new();
        options.pattern("v*");
        let describe = match repo.describe(&options) {
            Ok(describe) => describe,
            // libgit2 reports "no tags" either as NotFound or as a describe-class error
            Err(e) if e.code() == ErrorCode::NotFound || e.class() == ErrorClass::Describe => {
                debug!(path = %self.path.display(), "no matching tag to describe");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let mut format = DescribeFormatOptions::new();
        format.abbreviated_size(0);
        Ok(Some(describe.format(Some(&format))?))
    }

    fn head_commit_id(&self) -> GitResult<String> {
        let repo = self.open()?;
        let commit = repo.head()?.peel_to_commit()?;
        Ok(commit.id().to_string())
    }
}
