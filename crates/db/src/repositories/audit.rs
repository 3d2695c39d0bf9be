//! Audit sink that writes records to the structured log.

use tracing::info;

use neraca_core::audit::{AuditRecord, AuditSink};

/// Emits every audit record as an `info` event on the `neraca::audit` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, record: AuditRecord) {
        let changes = serde_json::to_string(&record.changes).unwrap_or_default();
        info!(
            target: "neraca::audit",
            entity = %record.entity,
            entity_id = %record.entity_id,
            action = ?record.action,
            actor = ?record.actor.map(|a| a.into_inner()),
            recorded_at = %record.recorded_at,
            changes = %changes,
            "audit"
        );
    }
}
