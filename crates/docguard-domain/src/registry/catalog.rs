//! Built-in permission catalog.
//!
//! Namespaces and permissions of the document manager's applications.
//! Each application registers its namespace once at startup through
//! [`register_builtin`]; the constants below are used wherever code needs
//! to name a specific permission.

use crate::error::DomainResult;
use crate::model::PermissionKey;

use super::PermissionRegistry;

/// A compile-time reference to a catalog permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BuiltinPermission {
    pub namespace: &'static str,
    pub name: &'static str,
}

impl BuiltinPermission {
    pub const fn new(namespace: &'static str, name: &'static str) -> Self {
        Self { namespace, name }
    }

    pub fn key(&self) -> PermissionKey {
        PermissionKey::new(self.namespace, self.name)
    }
}

impl From<BuiltinPermission> for PermissionKey {
    fn from(permission: BuiltinPermission) -> Self {
        permission.key()
    }
}

pub const DOCUMENTS: &str = "documents";
pub const DOCUMENT_INDEXING: &str = "document_indexing";
pub const OCR: &str = "ocr";
pub const LINKING: &str = "linking";
pub const ACLS: &str = "acls";

pub const DOCUMENT_CREATE: BuiltinPermission = BuiltinPermission::new(DOCUMENTS, "document_create");
pub const DOCUMENT_DELETE: BuiltinPermission = BuiltinPermission::new(DOCUMENTS, "document_delete");
pub const DOCUMENT_EDIT: BuiltinPermission = BuiltinPermission::new(DOCUMENTS, "document_edit");
pub const DOCUMENT_NEW_VERSION: BuiltinPermission =
    BuiltinPermission::new(DOCUMENTS, "document_new_version");
pub const DOCUMENT_PROPERTIES_EDIT: BuiltinPermission =
    BuiltinPermission::new(DOCUMENTS, "document_properties_edit");
pub const DOCUMENT_VIEW: BuiltinPermission = BuiltinPermission::new(DOCUMENTS, "document_view");
pub const DOCUMENT_TYPE_CREATE: BuiltinPermission =
    BuiltinPermission::new(DOCUMENTS, "document_type_create");
pub const DOCUMENT_TYPE_DELETE: BuiltinPermission =
    BuiltinPermission::new(DOCUMENTS, "document_type_delete");
pub const DOCUMENT_TYPE_EDIT: BuiltinPermission =
    BuiltinPermission::new(DOCUMENTS, "document_type_edit");
pub const DOCUMENT_TYPE_VIEW: BuiltinPermission =
    BuiltinPermission::new(DOCUMENTS, "document_type_view");

pub const DOCUMENT_INDEXING_CREATE: BuiltinPermission =
    BuiltinPermission::new(DOCUMENT_INDEXING, "document_index_create");
pub const DOCUMENT_INDEXING_DELETE: BuiltinPermission =
    BuiltinPermission::new(DOCUMENT_INDEXING, "document_index_delete");
pub const DOCUMENT_INDEXING_EDIT: BuiltinPermission =
    BuiltinPermission::new(DOCUMENT_INDEXING, "document_index_edit");
pub const DOCUMENT_INDEXING_VIEW: BuiltinPermission =
    BuiltinPermission::new(DOCUMENT_INDEXING, "document_index_view");

pub const OCR_DOCUMENT: BuiltinPermission = BuiltinPermission::new(OCR, "ocr_document");
pub const OCR_DOCUMENT_DELETE: BuiltinPermission =
    BuiltinPermission::new(OCR, "ocr_document_delete");
pub const OCR_CONTENT_VIEW: BuiltinPermission = BuiltinPermission::new(OCR, "ocr_content_view");
pub const OCR_DOCUMENT_TYPE_SETUP: BuiltinPermission =
    BuiltinPermission::new(OCR, "ocr_document_type_setup");

pub const SMART_LINK_CREATE: BuiltinPermission =
    BuiltinPermission::new(LINKING, "smart_link_create");
pub const SMART_LINK_DELETE: BuiltinPermission =
    BuiltinPermission::new(LINKING, "smart_link_delete");
pub const SMART_LINK_EDIT: BuiltinPermission = BuiltinPermission::new(LINKING, "smart_link_edit");
pub const SMART_LINK_VIEW: BuiltinPermission = BuiltinPermission::new(LINKING, "smart_link_view");

pub const ACL_VIEW: BuiltinPermission = BuiltinPermission::new(ACLS, "acl_view");
pub const ACL_EDIT: BuiltinPermission = BuiltinPermission::new(ACLS, "acl_edit");

struct NamespaceSpec {
    id: &'static str,
    label: &'static str,
    permissions: &'static [(BuiltinPermission, &'static str)],
}

const CATALOG: &[NamespaceSpec] = &[
    NamespaceSpec {
        id: DOCUMENTS,
        label: "Documents",
        permissions: &[
            (DOCUMENT_CREATE, "Create documents"),
            (DOCUMENT_DELETE, "Delete documents"),
            (DOCUMENT_EDIT, "Edit documents"),
            (DOCUMENT_NEW_VERSION, "Create new document versions"),
            (DOCUMENT_PROPERTIES_EDIT, "Edit document properties"),
            (DOCUMENT_VIEW, "View documents"),
            (DOCUMENT_TYPE_CREATE, "Create document types"),
            (DOCUMENT_TYPE_DELETE, "Delete document types"),
            (DOCUMENT_TYPE_EDIT, "Edit document types"),
            (DOCUMENT_TYPE_VIEW, "View document types"),
        ],
    },
    NamespaceSpec {
        id: DOCUMENT_INDEXING,
        label: "Indexing",
        permissions: &[
            (DOCUMENT_INDEXING_CREATE, "Create new document indexes"),
            (DOCUMENT_INDEXING_DELETE, "Delete document indexes"),
            (DOCUMENT_INDEXING_EDIT, "Edit document indexes"),
            (DOCUMENT_INDEXING_VIEW, "View document indexes"),
        ],
    },
    NamespaceSpec {
        id: OCR,
        label: "OCR",
        permissions: &[
            (OCR_DOCUMENT, "Submit documents for OCR"),
            (OCR_DOCUMENT_DELETE, "Delete documents from OCR queue"),
            (OCR_CONTENT_VIEW, "Can view the transcribed text from document"),
            (OCR_DOCUMENT_TYPE_SETUP, "Change document type OCR settings"),
        ],
    },
    NamespaceSpec {
        id: LINKING,
        label: "Smart links",
        permissions: &[
            (SMART_LINK_CREATE, "Create new smart links"),
            (SMART_LINK_DELETE, "Delete smart links"),
            (SMART_LINK_EDIT, "Edit smart links"),
            (SMART_LINK_VIEW, "View existing smart links"),
        ],
    },
    NamespaceSpec {
        id: ACLS,
        label: "Access control lists",
        permissions: &[(ACL_VIEW, "View ACLs"), (ACL_EDIT, "Edit ACLs")],
    },
];

/// Registers every built-in namespace and permission.
///
/// Safe to call repeatedly on the same registry.
pub fn register_builtin(registry: &mut PermissionRegistry) -> DomainResult<()> {
    for namespace in CATALOG {
        for (permission, label) in namespace.permissions {
            registry.register(namespace.id, namespace.label, permission.name, label)?;
        }
    }
    Ok(())
}
