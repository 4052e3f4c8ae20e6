//! Drift detection between desired parameters and the API representation.

use std::collections::BTreeMap;

use metakube_client::Project as ApiProject;

use crate::types::ProjectParameters;

/// Whether the observed project matches the desired parameters.
///
/// Only the mutable fields are compared: `name` (exact) and `labels`
/// (structural, unspecified equals empty). Identifier, timestamps, status,
/// annotations and users never cause drift.
pub fn is_up_to_date(desired: &ProjectParameters, observed: &ApiProject) -> bool {
    is_equal_string(Some(desired.name.as_str()), Some(observed.name.as_str()))
        && is_equal_map(desired.labels.as_ref(), Some(&observed.labels))
}

/// String equality where an absent value equals the empty string.
pub fn is_equal_string(a: Option<&str>, b: Option<&str>) -> bool {
    a.unwrap_or_default() == b.unwrap_or_default()
}

/// Map equality where an absent map equals the empty map.
pub fn is_equal_map(
    a: Option<&BTreeMap<String, String>>,
    b: Option<&BTreeMap<String, String>>,
) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b,
        (Some(m), None) | (None, Some(m)) => m.is_empty(),
        (None, None) => true,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use proptest::prelude::*;

    use super::*;

    fn desired(name: &str, labels: Option<BTreeMap<String, String>>) -> ProjectParameters {
        ProjectParameters {
            name: name.to_string(),
            labels,
            ..Default::default()
        }
    }

    fn observed(name: &str, labels: BTreeMap<String, String>) -> ApiProject {
        ApiProject {
            id: "p-123".to_string(),
            name: name.to_string(),
            labels,
            ..Default::default()
        }
    }

    fn env(value: &str) -> BTreeMap<String, String> {
        BTreeMap::from([("env".to_string(), value.to_string())])
    }

    #[test]
    fn test_matching_project_is_up_to_date() {
        assert!(is_up_to_date(
            &desired("proj-a", Some(env("prod"))),
            &observed("proj-a", env("prod"))
        ));
    }

    #[test]
    fn test_name_drift() {
        assert!(!is_up_to_date(
            &desired("proj-a", Some(env("prod"))),
            &observed("proj-b", env("prod"))
        ));
    }

    #[test]
    fn test_label_value_drift() {
        assert!(!is_up_to_date(
            &desired("proj-a", Some(env("stage"))),
            &observed("proj-a", env("prod"))
        ));
    }

    #[test]
    fn test_extra_remote_label_is_drift() {
        let mut remote = env("prod");
        remote.insert("tier".to_string(), "gold".to_string());

        assert!(!is_up_to_date(
            &desired("proj-a", Some(env("prod"))),
            &observed("proj-a", remote)
        ));
    }

    #[test]
    fn test_unspecified_labels_equal_empty() {
        assert!(is_up_to_date(
            &desired("proj-a", None),
            &observed("proj-a", BTreeMap::new())
        ));
        assert!(!is_up_to_date(
            &desired("proj-a", None),
            &observed("proj-a", env("prod"))
        ));
    }

    #[test]
    fn test_is_equal_string_absent_is_empty() {
        assert!(is_equal_string(None, Some("")));
        assert!(is_equal_string(None, None));
        assert!(!is_equal_string(None, Some("a")));
    }

    fn label_map() -> impl Strategy<Value = BTreeMap<String, String>> {
        prop::collection::btree_map("[a-z]{1,8}", "[a-z0-9]{0,8}", 0..5)
    }

    proptest! {
        /// Read-only fields never flip the comparison.
        #[test]
        fn prop_read_only_fields_ignored(
            name in "[a-z0-9-]{0,20}",
            labels in label_map(),
            id in "[a-z0-9-]{0,20}",
            status in "[A-Za-z]{0,10}",
            annotations in label_map(),
            clusters in 0u32..100,
        ) {
            let desired = desired(&name, Some(labels.clone()));
            let base = observed(&name, labels);
            let noisy = ApiProject {
                id,
                status,
                annotations,
                clusters_number: clusters,
                creation_timestamp: Some(Utc::now()),
                ..base.clone()
            };

            prop_assert!(is_up_to_date(&desired, &base));
            prop_assert_eq!(is_up_to_date(&desired, &base), is_up_to_date(&desired, &noisy));
        }

        /// Up to date exactly when name and labels agree.
        #[test]
        fn prop_up_to_date_iff_mutable_fields_equal(
            desired_name in "[a-c]{0,2}",
            observed_name in "[a-c]{0,2}",
            desired_labels in label_map(),
            observed_labels in label_map(),
        ) {
            let expected = desired_name == observed_name && desired_labels == observed_labels;
            let result = is_up_to_date(
                &desired(&desired_name, Some(desired_labels)),
                &observed(&observed_name, observed_labels),
            );

            prop_assert_eq!(result, expected);
        }
    }
}
