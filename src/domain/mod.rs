//! Domain logic - version model independent of files and version control

pub mod prerelease;
pub mod version;

pub use prerelease::{PreRelease, PreReleaseTag};
pub use version::{InvalidVersion, LocalSegment, PostRelease, Version};
