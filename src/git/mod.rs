//! Version control abstraction layer
//!
//! Component identity only needs two answers from version control: the most
//! recent `v*` tag reachable from the checkout, and the commit the checkout
//! points at. The [Repository] trait captures exactly that so that
//! resolution can run against a real repository or a test double.
//!
//! - [repository::Git2Repository]: implementation on top of the `git2` crate
//! - [mock::MockRepository]: canned answers for tests

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

/// Result type of version control calls
pub type GitResult<T> = std::result::Result<T, git2::Error>;

/// Version control operations needed to identify a component
///
/// ## Thread Safety
///
/// Implementors must be `Send + Sync` so that a component can be resolved on a
/// worker thread.
pub trait Repository: Send + Sync {
    /// Describe the checkout by its most recent annotated `v*` tag
    ///
    /// Equivalent to `git describe --match='v*' --abbrev=0`.
    ///
    /// # Returns
    /// * `Ok(Some(String))` - The tag name, e.g. `v4.2.1-1`
    /// * `Ok(None)` - No repository or no matching tag
    /// * `Err` - Any other version control failure
    fn describe_version_tag(&self) -> GitResult<Option<String>>;

    /// Full commit id of the checked out `HEAD`, peeled through tags
    fn head_commit_id(&self) -> GitResult<String>;
}
