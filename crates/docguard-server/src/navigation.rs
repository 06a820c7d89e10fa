//! Permission-gated navigation links.
//!
//! A link is shown when the subject passes any of its permissions: on the
//! object the link is rendered for, or globally for collection links.
//! Links without permissions are always shown.

use docguard_domain::registry::catalog::{self, BuiltinPermission};
use docguard_domain::{ObjectRef, PermissionKey, Subject};
use docguard_storage::PolicyStore;

use crate::errors::AccessResult;
use crate::service::AccessControl;

/// What a link's permissions are checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTarget {
    /// The object the page is about (global grant or ACE on it).
    Object,
    /// No object; only global grants count.
    Collection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub name: &'static str,
    pub text: &'static str,
    pub permissions: Vec<PermissionKey>,
    pub target: LinkTarget,
}

impl Link {
    pub fn object(name: &'static str, text: &'static str, permissions: &[BuiltinPermission]) -> Self {
        Self::new(name, text, permissions, LinkTarget::Object)
    }

    pub fn collection(
        name: &'static str,
        text: &'static str,
        permissions: &[BuiltinPermission],
    ) -> Self {
        Self::new(name, text, permissions, LinkTarget::Collection)
    }

    fn new(
        name: &'static str,
        text: &'static str,
        permissions: &[BuiltinPermission],
        target: LinkTarget,
    ) -> Self {
        Self {
            name,
            text,
            permissions: permissions.iter().map(BuiltinPermission::key).collect(),
            target,
        }
    }
}

/// Keeps the links `subject` may follow from a page about `object`.
///
/// Object links on a page without an object are checked globally.
pub async fn visible_links<'a, S: PolicyStore>(
    access: &AccessControl<S>,
    subject: &Subject,
    object: Option<&ObjectRef>,
    links: &'a [Link],
) -> AccessResult<Vec<&'a Link>> {
    let mut visible = Vec::with_capacity(links.len());
    for link in links {
        if link.permissions.is_empty() {
            visible.push(link);
            continue;
        }
        let scope = match link.target {
            LinkTarget::Object => object,
            LinkTarget::Collection => None,
        };
        if access
            .check_any(subject, &link.permissions, scope)
            .await?
            .is_allowed()
        {
            visible.push(link);
        }
    }
    Ok(visible)
}

/// Links of the OCR application.
pub fn ocr_links() -> Vec<Link> {
    vec![
        Link::object("ocr:document_content", "content", &[catalog::OCR_CONTENT_VIEW]),
        Link::object("ocr:document_submit", "submit to ocr queue", &[catalog::OCR_DOCUMENT]),
        Link::collection("ocr:document_submit_multiple", "Submit to OCR queue", &[]),
        Link::object(
            "ocr:document_type_ocr_settings",
            "setup ocr",
            &[catalog::OCR_DOCUMENT_TYPE_SETUP],
        ),
        Link::object("ocr:entry_delete", "delete", &[catalog::OCR_DOCUMENT_DELETE]),
        Link::collection("ocr:entry_delete_multiple", "Delete", &[]),
        Link::collection("ocr:entry_list", "ocr errors", &[catalog::OCR_DOCUMENT]),
        Link::object("ocr:entry_re_queue", "re-queue", &[catalog::OCR_DOCUMENT]),
        Link::collection("ocr:entry_re_queue_multiple", "Re-queue", &[]),
    ]
}

/// Links of the smart link application.
pub fn smart_link_links() -> Vec<Link> {
    vec![
        Link::object("linking:smart_link_acl_list", "ACLs", &[catalog::ACL_VIEW]),
        Link::object(
            "linking:smart_link_condition_create",
            "create condition",
            &[catalog::SMART_LINK_EDIT],
        ),
        Link::object(
            "linking:smart_link_condition_delete",
            "delete",
            &[catalog::SMART_LINK_EDIT],
        ),
        Link::object(
            "linking:smart_link_condition_edit",
            "edit",
            &[catalog::SMART_LINK_EDIT],
        ),
        Link::object(
            "linking:smart_link_condition_list",
            "conditions",
            &[catalog::SMART_LINK_EDIT],
        ),
        Link::collection(
            "linking:smart_link_create",
            "create new smart link",
            &[catalog::SMART_LINK_CREATE],
        ),
        Link::object("linking:smart_link_delete", "delete", &[catalog::SMART_LINK_DELETE]),
        Link::object(
            "linking:smart_link_document_types",
            "document types",
            &[catalog::SMART_LINK_EDIT],
        ),
        Link::object("linking:smart_link_edit", "edit", &[catalog::SMART_LINK_EDIT]),
        Link::object(
            "linking:smart_link_instance_view",
            "documents",
            &[catalog::SMART_LINK_VIEW],
        ),
        Link::object(
            "linking:smart_link_instances_for_document",
            "smart links",
            &[catalog::DOCUMENT_VIEW],
        ),
        Link::collection("linking:smart_link_list", "smart links", &[catalog::SMART_LINK_CREATE]),
    ]
}
