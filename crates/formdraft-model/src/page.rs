//! Page identity
//!
//! Drafts are keyed by the logical path of the page that owns the form, so
//! repeated visits to one page converge on one record.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Logical identity of a page (its path)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageIdentity(String);

impl PageIdentity {
    /// Create from a path, normalised to start with `/`
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        if path.starts_with('/') {
            Self(path)
        } else {
            Self(format!("/{path}"))
        }
    }

    /// Path as a string slice
    #[inline]
    #[must_use]
    pub fn path(&self) -> &str {
        &self.0
    }

    /// Resolve a path relative to this page
    ///
    /// `/admin/story/1/change/` joined with `last-modified/` yields
    /// `/admin/story/1/change/last-modified/`.
    #[must_use]
    pub fn join(&self, relative: &str) -> String {
        let base = match self.0.rfind('/') {
            Some(idx) => &self.0[..=idx],
            None => "/",
        };
        format!("{base}{}", relative.trim_start_matches('/'))
    }
}

impl Display for PageIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageIdentity {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}
