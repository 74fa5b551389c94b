//! # Audit Entries
//!
//! The record handed to the audit sink after every mutation, successful or
//! not. Storage of these entries lives outside this workspace; the service
//! layer only emits them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::dto::Actor;

/// Kind of mutation being audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

/// Outcome of the audited mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    #[default]
    Success,
    Failure,
}

/// Before/after values of the audited entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

/// One audit log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: Uuid,
    pub user_id: i64,
    pub username: Option<String>,
    pub action_type: AuditAction,
    pub entity_type: String,
    pub entity_id: Option<i64>,
    pub changes: Option<AuditChanges>,
    pub status: AuditStatus,
    pub error_message: Option<String>,
    pub ip_address: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    /// A SUCCESS entry attributed to `actor`.
    pub fn new(actor: &Actor, action: AuditAction, entity_type: impl Into<String>) -> Self {
        AuditEntry {
            id: Uuid::new_v4(),
            user_id: actor.user_id,
            username: actor.username.clone(),
            action_type: action,
            entity_type: entity_type.into(),
            entity_id: None,
            changes: None,
            status: AuditStatus::Success,
            error_message: None,
            ip_address: actor.ip_address.clone(),
            recorded_at: Utc::now(),
        }
    }

    pub fn entity_id(mut self, id: i64) -> Self {
        self.entity_id = Some(id);
        self
    }

    pub fn changes(mut self, old_value: Option<Value>, new_value: Option<Value>) -> Self {
        self.changes = Some(AuditChanges {
            old_value,
            new_value,
        });
        self
    }

    /// Marks the entry FAILURE with the error message of the failed call.
    pub fn failed(mut self, message: impl Into<String>) -> Self {
        self.status = AuditStatus::Failure;
        self.error_message = Some(message.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_defaults_to_success() {
        let actor = Actor::new(3).with_username("maria").with_ip_address("10.0.0.4");
        let entry = AuditEntry::new(&actor, AuditAction::Create, "sale").entity_id(12);

        assert_eq!(entry.status, AuditStatus::Success);
        assert_eq!(entry.user_id, 3);
        assert_eq!(entry.username.as_deref(), Some("maria"));
        assert_eq!(entry.ip_address.as_deref(), Some("10.0.0.4"));
        assert_eq!(entry.entity_id, Some(12));
    }

    #[test]
    fn test_failed_entry_serializes() {
        let entry = AuditEntry::new(&Actor::new(1), AuditAction::Update, "sale")
            .changes(Some(json!({ "payment_status_id": 1 })), None)
            .failed("Sale not found: 9");

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["status"], "FAILURE");
        assert_eq!(value["actionType"], "UPDATE");
        assert_eq!(value["errorMessage"], "Sale not found: 9");
        assert_eq!(value["changes"], json!({ "oldValue": { "payment_status_id": 1 } }));
    }
}
