//! Node identifiers

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::error::{DomainError, DomainResult};

/// Identifier of the implicit root node.
pub const ROOT_IDENTIFIER: &str = "root";

static IDENTIFIER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]*$").expect("identifier pattern compiles"));

/// Path segment naming one node among its siblings.
///
/// Restricted to `[A-Za-z0-9_-]` so that `/` is free to act as the path delimiter.
/// The empty identifier is rejected: two id-less siblings would be indistinguishable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(id: impl Into<String>) -> DomainResult<Self> {
        let id = id.into();
        if id.is_empty() || !IDENTIFIER_PATTERN.is_match(&id) {
            return Err(DomainError::InvalidIdentifier(id));
        }
        Ok(Self(id))
    }

    pub fn root() -> Self {
        Self(ROOT_IDENTIFIER.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl TryFrom<&str> for Identifier {
    type Error = DomainError;

    fn try_from(value: &str) -> DomainResult<Self> {
        Self::new(value)
    }
}
