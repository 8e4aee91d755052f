use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::git::{GitResult, Repository};

/// Mock repository for testing without a real checkout
pub struct MockRepository {
    description: Option<String>,
    head: Option<String>,
    describe_calls: Arc<AtomicUsize>,
}

impl MockRepository {
    /// Create a mock with no tags and no `HEAD`
    pub fn new() -> Self {
        MockRepository {
            description: None,
            head: None,
            describe_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Answer describe calls with the given description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Answer `HEAD` lookups with the given commit id
    pub fn with_head(mut self, commit_id: impl Into<String>) -> Self {
        self.head = Some(commit_id.into());
        self
    }

    /// Shared counter of describe calls, readable after the mock is moved
    pub fn describe_calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.describe_calls)
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn describe_version_tag(&self) -> GitResult<Option<String>> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.description.clone())
    }

    fn head_commit_id(&self) -> GitResult<String> {
        self.head
            .clone()
            .ok_or_else(|| git2::Error::from_str("reference 'refs/heads/main' not found"))
    }
}
