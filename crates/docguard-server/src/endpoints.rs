//! Per-endpoint permission maps.
//!
//! Each API endpoint declares, per HTTP method:
//! - view permissions, checked globally before anything else
//! - object permissions, checked on the addressed object with ACE fallback,
//!   or used to filter the items of a listing
//! - parent permissions, checked on the object a listing is scoped to
//!   (e.g. the document type whose documents are listed)
//!
//! A method with no declared permissions is unrestricted. When several
//! permissions are declared for one method, any of them suffices.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use docguard_domain::registry::catalog::{self, BuiltinPermission};
use docguard_domain::{ObjectRef, PermissionKey, Subject};
use docguard_storage::PolicyStore;
use tracing::debug;

use crate::errors::AccessResult;
use crate::service::AccessControl;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for methods no endpoint can declare.
#[derive(Debug, thiserror::Error)]
#[error("unsupported HTTP method: {0}")]
pub struct UnsupportedMethod(pub String);

impl FromStr for HttpMethod {
    type Err = UnsupportedMethod;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            _ => Err(UnsupportedMethod(value.to_string())),
        }
    }
}

type MethodPermissions = BTreeMap<HttpMethod, Vec<PermissionKey>>;

/// Permission requirements of one endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointPolicy {
    name: String,
    view: MethodPermissions,
    object: MethodPermissions,
    parent: MethodPermissions,
}

impl EndpointPolicy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn view(mut self, method: HttpMethod, permissions: &[BuiltinPermission]) -> Self {
        self.view.insert(method, keys(permissions));
        self
    }

    pub fn object(mut self, method: HttpMethod, permissions: &[BuiltinPermission]) -> Self {
        self.object.insert(method, keys(permissions));
        self
    }

    pub fn parent(mut self, method: HttpMethod, permissions: &[BuiltinPermission]) -> Self {
        self.parent.insert(method, keys(permissions));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn view_permissions(&self, method: HttpMethod) -> &[PermissionKey] {
        lookup(&self.view, method)
    }

    pub fn object_permissions(&self, method: HttpMethod) -> &[PermissionKey] {
        lookup(&self.object, method)
    }

    pub fn parent_permissions(&self, method: HttpMethod) -> &[PermissionKey] {
        lookup(&self.parent, method)
    }

    /// Authorizes a request addressing `object` (or a collection when
    /// `object` is `None`).
    pub async fn authorize<S: PolicyStore>(
        &self,
        access: &AccessControl<S>,
        method: HttpMethod,
        subject: &Subject,
        object: Option<&ObjectRef>,
    ) -> AccessResult<()> {
        debug!(endpoint = %self.name, %method, %subject, "authorizing request");
        let view = self.view_permissions(method);
        if !view.is_empty() {
            access.require_any(subject, view, None).await?;
        }

        let permissions = self.object_permissions(method);
        if let Some(object) = object {
            if !permissions.is_empty() {
                access.require_any(subject, permissions, Some(object)).await?;
            }
        }
        Ok(())
    }

    /// Authorizes a listing scoped to `parent` and keeps the items the
    /// subject may see.
    pub async fn authorize_listing<S: PolicyStore>(
        &self,
        access: &AccessControl<S>,
        method: HttpMethod,
        subject: &Subject,
        parent: Option<&ObjectRef>,
        items: Vec<ObjectRef>,
    ) -> AccessResult<Vec<ObjectRef>> {
        self.authorize(access, method, subject, None).await?;

        let parent_permissions = self.parent_permissions(method);
        if let Some(parent) = parent {
            if !parent_permissions.is_empty() {
                access
                    .require_any(subject, parent_permissions, Some(parent))
                    .await?;
            }
        }

        let permissions = self.object_permissions(method);
        match permissions {
            [] => Ok(items),
            [permission] => access.filter_accessible(subject, permission, items).await,
            _ => {
                let mut kept = Vec::with_capacity(items.len());
                for item in items {
                    let decision = access.check_any(subject, permissions, Some(&item)).await?;
                    if decision.is_allowed() {
                        kept.push(item);
                    }
                }
                Ok(kept)
            }
        }
    }
}

fn keys(permissions: &[BuiltinPermission]) -> Vec<PermissionKey> {
    permissions.iter().map(BuiltinPermission::key).collect()
}

fn lookup(map: &MethodPermissions, method: HttpMethod) -> &[PermissionKey] {
    map.get(&method).map(Vec::as_slice).unwrap_or(&[])
}

/// Endpoint policies by name.
#[derive(Debug, Clone, Default)]
pub struct EndpointPolicies {
    policies: BTreeMap<String, EndpointPolicy>,
}

impl EndpointPolicies {
    pub fn new() -> Self {
        Self::default()
    }

    /// The document, document type and indexing API endpoints.
    pub fn builtin() -> Self {
        use HttpMethod::*;

        let mut policies = Self::new();
        policies.insert(
            EndpointPolicy::new("document_list")
                .object(Get, &[catalog::DOCUMENT_VIEW])
                .view(Post, &[catalog::DOCUMENT_CREATE]),
        );
        policies.insert(
            EndpointPolicy::new("document")
                .object(Get, &[catalog::DOCUMENT_VIEW])
                .object(Put, &[catalog::DOCUMENT_PROPERTIES_EDIT])
                .object(Patch, &[catalog::DOCUMENT_PROPERTIES_EDIT])
                .object(Delete, &[catalog::DOCUMENT_DELETE]),
        );
        policies.insert(
            EndpointPolicy::new("document_version_create")
                .view(Post, &[catalog::DOCUMENT_NEW_VERSION]),
        );
        policies.insert(
            EndpointPolicy::new("document_version").object(Get, &[catalog::DOCUMENT_VIEW]),
        );
        policies.insert(
            EndpointPolicy::new("document_page")
                .object(Get, &[catalog::DOCUMENT_VIEW])
                .object(Put, &[catalog::DOCUMENT_EDIT])
                .object(Patch, &[catalog::DOCUMENT_EDIT]),
        );
        policies.insert(
            EndpointPolicy::new("document_type_list")
                .object(Get, &[catalog::DOCUMENT_TYPE_VIEW])
                .view(Post, &[catalog::DOCUMENT_TYPE_CREATE]),
        );
        policies.insert(
            EndpointPolicy::new("document_type")
                .object(Get, &[catalog::DOCUMENT_TYPE_VIEW])
                .object(Put, &[catalog::DOCUMENT_TYPE_EDIT])
                .object(Patch, &[catalog::DOCUMENT_TYPE_EDIT])
                .object(Delete, &[catalog::DOCUMENT_TYPE_DELETE]),
        );
        policies.insert(
            EndpointPolicy::new("document_type_documents")
                .parent(Get, &[catalog::DOCUMENT_TYPE_VIEW])
                .object(Get, &[catalog::DOCUMENT_VIEW]),
        );
        policies.insert(
            EndpointPolicy::new("index_list")
                .object(Get, &[catalog::DOCUMENT_INDEXING_VIEW])
                .view(Post, &[catalog::DOCUMENT_INDEXING_CREATE]),
        );
        policies.insert(
            EndpointPolicy::new("index")
                .object(Get, &[catalog::DOCUMENT_INDEXING_VIEW])
                .object(Put, &[catalog::DOCUMENT_INDEXING_EDIT])
                .object(Patch, &[catalog::DOCUMENT_INDEXING_EDIT])
                .object(Delete, &[catalog::DOCUMENT_INDEXING_DELETE]),
        );
        policies.insert(
            EndpointPolicy::new("index_node_documents")
                .parent(Get, &[catalog::DOCUMENT_INDEXING_VIEW])
                .object(Get, &[catalog::DOCUMENT_VIEW]),
        );
        policies.insert(
            EndpointPolicy::new("index_template_list")
                .object(Get, &[catalog::DOCUMENT_INDEXING_VIEW]),
        );
        // Deleting a template node only edits its index.
        policies.insert(
            EndpointPolicy::new("index_template")
                .object(Get, &[catalog::DOCUMENT_INDEXING_VIEW])
                .object(Put, &[catalog::DOCUMENT_INDEXING_EDIT])
                .object(Patch, &[catalog::DOCUMENT_INDEXING_EDIT])
                .object(Delete, &[catalog::DOCUMENT_INDEXING_EDIT]),
        );
        policies.insert(
            EndpointPolicy::new("document_indexes")
                .parent(Get, &[catalog::DOCUMENT_VIEW])
                .object(Get, &[catalog::DOCUMENT_INDEXING_VIEW]),
        );
        policies
    }

    pub fn insert(&mut self, policy: EndpointPolicy) {
        self.policies.insert(policy.name.clone(), policy);
    }

    pub fn get(&self, name: &str) -> Option<&EndpointPolicy> {
        self.policies.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EndpointPolicy> {
        self.policies.values()
    }
}
