//! Benchmark for check operations.
//!
//! Run with: cargo bench -p docguard-domain

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use docguard_domain::registry::catalog::{DOCUMENT_INDEXING_VIEW, DOCUMENT_VIEW};
use docguard_domain::{
    AuthorizationEngine, DomainResult, ObjectRef, PermissionKey, PermissionRegistry,
    PolicyReader, PolicySnapshot, Subject,
};

/// A user nested `depth` groups deep, with ACEs on every index.
struct NestedGroups {
    depth: usize,
    indexes: usize,
    aces: HashMap<(PermissionKey, ObjectRef), Vec<String>>,
}

impl NestedGroups {
    fn new(depth: usize, indexes: usize) -> Self {
        let mut aces = HashMap::new();
        for i in 0..indexes {
            aces.insert(
                (DOCUMENT_INDEXING_VIEW.key(), ObjectRef::index(i.to_string())),
                vec!["indexers".to_string()],
            );
        }
        Self {
            depth,
            indexes,
            aces,
        }
    }
}

impl PolicySnapshot for NestedGroups {
    fn revision(&self) -> u64 {
        0
    }

    fn role_permissions(&self, _role: &str) -> Vec<PermissionKey> {
        Vec::new()
    }

    fn direct_roles(&self, subject: &Subject) -> Vec<String> {
        match subject {
            Subject::Group(id) if *id == format!("g{}", self.depth) => {
                vec!["indexers".to_string()]
            }
            _ => Vec::new(),
        }
    }

    fn direct_groups(&self, subject: &Subject) -> Vec<String> {
        match subject {
            Subject::User(_) => vec!["g1".to_string()],
            Subject::Group(id) => {
                let level: usize = id[1..].parse().unwrap_or(self.depth);
                if level < self.depth {
                    vec![format!("g{}", level + 1)]
                } else {
                    Vec::new()
                }
            }
            Subject::Anonymous => Vec::new(),
        }
    }

    fn ace_roles(&self, permission: &PermissionKey, target: &ObjectRef) -> Vec<String> {
        self.aces
            .get(&(permission.clone(), target.clone()))
            .cloned()
            .unwrap_or_default()
    }

    fn ace_entries(&self, _target: &ObjectRef) -> Vec<(PermissionKey, String)> {
        Vec::new()
    }

    fn object_exists(&self, object: &ObjectRef) -> bool {
        object
            .id
            .parse::<usize>()
            .map_or(false, |i| i < self.indexes)
    }

    fn owner_of(&self, _object: &ObjectRef) -> Option<ObjectRef> {
        None
    }
}

struct StaticReader(Arc<NestedGroups>);

#[async_trait]
impl PolicyReader for StaticReader {
    async fn snapshot(&self) -> DomainResult<Arc<dyn PolicySnapshot>> {
        let snapshot: Arc<dyn PolicySnapshot> = self.0.clone();
        Ok(snapshot)
    }
}

fn check_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let registry = Arc::new(PermissionRegistry::with_builtin().unwrap());
    let reader = Arc::new(StaticReader(Arc::new(NestedGroups::new(10, 1_000))));
    let engine = AuthorizationEngine::new(registry, reader);
    let alice = Subject::user("alice");

    c.bench_function("check_ace_through_nested_groups", |b| {
        b.to_async(&runtime).iter(|| async {
            let decision = engine
                .check(
                    &alice,
                    &DOCUMENT_INDEXING_VIEW.key(),
                    black_box(&ObjectRef::index("500")),
                )
                .await
                .unwrap();
            black_box(decision)
        })
    });

    c.bench_function("check_denied_without_grants", |b| {
        b.to_async(&runtime).iter(|| async {
            let decision = engine
                .check(
                    &alice,
                    &DOCUMENT_VIEW.key(),
                    black_box(&ObjectRef::document("1")),
                )
                .await
                .unwrap();
            black_box(decision)
        })
    });
}

criterion_group!(benches, check_benchmark);
criterion_main!(benches);
