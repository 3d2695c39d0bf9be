//! Field-level audit records.
//!
//! Each write path builds its records explicitly from the values it changed;
//! there is no reflection over update maps. Records are handed to an
//! [`AuditSink`] only after the surrounding transaction commits.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use neraca_shared::types::UserId;

/// What happened to the audited entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// Entity created.
    Create,
    /// Fields updated.
    Update,
    /// Journal entry posted.
    Post,
    /// Accounting period closed.
    Close,
    /// Document number issued.
    Issue,
}

/// One changed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Field name.
    pub field: String,
    /// Value before the change. `None` on creation.
    pub old_value: Option<String>,
    /// Value after the change.
    pub new_value: Option<String>,
}

impl FieldChange {
    /// A field that changed from `old` to `new`.
    pub fn new(field: impl Into<String>, old: impl ToString, new: impl ToString) -> Self {
        Self {
            field: field.into(),
            old_value: Some(old.to_string()),
            new_value: Some(new.to_string()),
        }
    }

    /// A field set on a newly created entity.
    pub fn created(field: impl Into<String>, new: impl ToString) -> Self {
        Self {
            field: field.into(),
            old_value: None,
            new_value: Some(new.to_string()),
        }
    }

    /// Returns true if the value actually changed.
    #[must_use]
    pub fn is_effective(&self) -> bool {
        self.old_value != self.new_value
    }
}

/// An audit record for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Entity kind, e.g. `account` or `journal_entry`.
    pub entity: String,
    /// Entity identifier.
    pub entity_id: String,
    /// Action performed.
    pub action: AuditAction,
    /// Changed fields.
    pub changes: Vec<FieldChange>,
    /// Who performed the action, if known.
    pub actor: Option<UserId>,
    /// When the action was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Starts a record stamped with the current time.
    pub fn new(entity: impl Into<String>, entity_id: impl ToString, action: AuditAction) -> Self {
        Self {
            entity: entity.into(),
            entity_id: entity_id.to_string(),
            action,
            changes: Vec::new(),
            actor: None,
            recorded_at: Utc::now(),
        }
    }

    /// Sets the actor.
    #[must_use]
    pub fn by(mut self, actor: Option<UserId>) -> Self {
        self.actor = actor;
        self
    }

    /// Adds a field change. No-op changes are dropped.
    #[must_use]
    pub fn change(mut self, change: FieldChange) -> Self {
        if change.is_effective() {
            self.changes.push(change);
        }
        self
    }
}

/// Destination for audit records.
pub trait AuditSink: Send + Sync {
    /// Records one entry.
    fn record(&self, record: AuditRecord);

    /// Records a batch, in order.
    fn record_all(&self, records: Vec<AuditRecord>) {
        for record in records {
            self.record(record);
        }
    }
}

/// In-memory sink, useful for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far.
    #[must_use]
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, record: AuditRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }
}
