//! References into the document resource graph.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// The kinds of entity that participate in the object graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Document,
    DocumentType,
    DocumentVersion,
    DocumentPage,
    Index,
    IndexTemplateNode,
    IndexInstanceNode,
    SmartLink,
    SmartLinkCondition,
    OcrEntry,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 10] = [
        ObjectKind::Document,
        ObjectKind::DocumentType,
        ObjectKind::DocumentVersion,
        ObjectKind::DocumentPage,
        ObjectKind::Index,
        ObjectKind::IndexTemplateNode,
        ObjectKind::IndexInstanceNode,
        ObjectKind::SmartLink,
        ObjectKind::SmartLinkCondition,
        ObjectKind::OcrEntry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::DocumentType => "document_type",
            Self::DocumentVersion => "document_version",
            Self::DocumentPage => "document_page",
            Self::Index => "index",
            Self::IndexTemplateNode => "index_template_node",
            Self::IndexInstanceNode => "index_instance_node",
            Self::SmartLink => "smart_link",
            Self::SmartLinkCondition => "smart_link_condition",
            Self::OcrEntry => "ocr_entry",
        }
    }

    /// Whether access control entries may target objects of this kind.
    ///
    /// Index instance nodes are generated from templates and are always
    /// checked against their owning index.
    pub fn accepts_aces(&self) -> bool {
        !matches!(self, Self::IndexInstanceNode)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| DomainError::InvalidObjectFormat {
                value: value.to_string(),
            })
    }
}

/// A reference to a concrete object (e.g., "document:7").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    pub kind: ObjectKind,
    pub id: String,
}

impl ObjectRef {
    pub fn new(kind: ObjectKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn document(id: impl Into<String>) -> Self {
        Self::new(ObjectKind::Document, id)
    }

    pub fn document_type(id: impl Into<String>) -> Self {
        Self::new(ObjectKind::DocumentType, id)
    }

    pub fn index(id: impl Into<String>) -> Self {
        Self::new(ObjectKind::Index, id)
    }

    pub fn index_instance_node(id: impl Into<String>) -> Self {
        Self::new(ObjectKind::IndexInstanceNode, id)
    }

    pub fn smart_link(id: impl Into<String>) -> Self {
        Self::new(ObjectKind::SmartLink, id)
    }

    /// Parses an object reference from "kind:id" format.
    pub fn parse(value: &str) -> DomainResult<Self> {
        let invalid = || DomainError::InvalidObjectFormat {
            value: value.to_string(),
        };
        let (kind, id) = value.split_once(':').ok_or_else(invalid)?;
        if id.is_empty() {
            return Err(invalid());
        }
        let kind = kind.parse::<ObjectKind>().map_err(|_| invalid())?;
        Ok(Self::new(kind, id))
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}
