pub mod component;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod source_hash;
pub mod ui;

pub use component::{substitute_placeholders, Component};
pub use error::{ComponentError, Result};
pub use source_hash::{hash_directory, ContentDigest};
