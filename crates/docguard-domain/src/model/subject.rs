//! Subjects (principals) whose access is evaluated.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// A principal: a user, a group of subjects, or the anonymous principal.
///
/// Textual form is "user:<id>", "group:<id>" or "anonymous".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Subject {
    /// Unauthenticated request.
    Anonymous,
    User(String),
    Group(String),
}

impl Subject {
    pub const ANONYMOUS: &'static str = "anonymous";

    pub fn user(id: impl Into<String>) -> Self {
        Self::User(id.into())
    }

    pub fn group(id: impl Into<String>) -> Self {
        Self::Group(id.into())
    }

    /// Parses a subject from "user:<id>", "group:<id>" or "anonymous".
    pub fn parse(value: &str) -> DomainResult<Self> {
        if value == Self::ANONYMOUS {
            return Ok(Self::Anonymous);
        }
        let invalid = || DomainError::InvalidSubjectFormat {
            value: value.to_string(),
        };
        let (kind, id) = value.split_once(':').ok_or_else(invalid)?;
        if id.is_empty() {
            return Err(invalid());
        }
        match kind {
            "user" => Ok(Self::User(id.to_string())),
            "group" => Ok(Self::Group(id.to_string())),
            _ => Err(invalid()),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str(Self::ANONYMOUS),
            Self::User(id) => write!(f, "user:{id}"),
            Self::Group(id) => write!(f, "group:{id}"),
        }
    }
}
