//! Status conditions reported on Project records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionType {
    /// Whether the external resource is usable.
    Ready,
    /// Whether the last pass succeeded.
    Synced,
}

/// Truth value of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// Machine-readable reason for a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionReason {
    Available,
    Creating,
    Deleting,
    ReconcileSuccess,
    ReconcileError,
}

/// One status condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    pub status: ConditionStatus,
    pub reason: ConditionReason,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    fn new(
        condition_type: ConditionType,
        status: ConditionStatus,
        reason: ConditionReason,
    ) -> Self {
        Self {
            condition_type,
            status,
            reason,
            message: String::new(),
            last_transition_time: Utc::now(),
        }
    }

    /// The external resource exists and is usable.
    pub fn available() -> Self {
        Self::new(
            ConditionType::Ready,
            ConditionStatus::True,
            ConditionReason::Available,
        )
    }

    /// The external resource is being created.
    pub fn creating() -> Self {
        Self::new(
            ConditionType::Ready,
            ConditionStatus::False,
            ConditionReason::Creating,
        )
    }

    /// The external resource is being deleted.
    pub fn deleting() -> Self {
        Self::new(
            ConditionType::Ready,
            ConditionStatus::False,
            ConditionReason::Deleting,
        )
    }

    /// The last pass completed.
    pub fn reconcile_success() -> Self {
        Self::new(
            ConditionType::Synced,
            ConditionStatus::True,
            ConditionReason::ReconcileSuccess,
        )
    }

    /// The last pass failed with `message`.
    pub fn reconcile_error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::new(
                ConditionType::Synced,
                ConditionStatus::False,
                ConditionReason::ReconcileError,
            )
        }
    }

    /// Same type, status and reason; message and time are ignored.
    pub fn same_state(&self, other: &Self) -> bool {
        self.condition_type == other.condition_type
            && self.status == other.status
            && self.reason == other.reason
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_constructors() {
        assert_eq!(Condition::available().status, ConditionStatus::True);
        assert_eq!(Condition::creating().condition_type, ConditionType::Ready);
        assert_eq!(Condition::deleting().reason, ConditionReason::Deleting);
        assert_eq!(
            Condition::reconcile_error("boom").message,
            "boom".to_string()
        );
    }

    #[test]
    fn test_same_state_ignores_message() {
        let a = Condition::reconcile_error("a");
        let b = Condition::reconcile_error("b");

        assert!(a.same_state(&b));
        assert!(!a.same_state(&Condition::reconcile_success()));
    }

    #[test]
    fn test_serializes_type_field() {
        let json = serde_json::to_value(Condition::available()).unwrap();

        assert_eq!(json["type"], "Ready");
        assert_eq!(json["status"], "True");
        assert_eq!(json["reason"], "Available");
        assert!(json.get("message").is_none());
        assert!(json.get("lastTransitionTime").is_some());
    }
}
