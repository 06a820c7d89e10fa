//! Property-based tests for identifier types.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::model::{ObjectKind, ObjectRef, PermissionKey, Subject};

    fn object_kind_strategy() -> impl Strategy<Value = ObjectKind> {
        prop::sample::select(ObjectKind::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn test_object_parse_roundtrip(kind in object_kind_strategy(), id in "[a-z0-9-]{1,20}") {
            let input = format!("{kind}:{id}");
            let parsed = ObjectRef::parse(&input);
            prop_assert!(parsed.is_ok(), "Failed for object: {}", input);
            prop_assert_eq!(parsed.unwrap().to_string(), input);
        }

        #[test]
        fn test_permission_parse_roundtrip(ns in "[a-z_]{1,12}", name in "[a-z_]{1,20}") {
            let input = format!("{ns}.{name}");
            let key = PermissionKey::parse(&input);
            prop_assert!(key.is_ok(), "Failed for permission: {}", input);
            prop_assert_eq!(key.unwrap().to_string(), input);
        }

        #[test]
        fn test_permission_without_dot_is_invalid(s in "[a-z_]{1,20}") {
            prop_assert!(PermissionKey::parse(&s).is_err());
        }

        #[test]
        fn test_user_subject_roundtrip(id in "[a-z0-9]{1,20}") {
            let input = format!("user:{id}");
            let subject = Subject::parse(&input);
            prop_assert!(subject.is_ok());
            prop_assert_eq!(subject.unwrap().to_string(), input);
        }
    }
}
