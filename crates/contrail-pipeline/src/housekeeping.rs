//! Archival housekeeping.
//!
//! Before each pass, completed records older than the retention window are
//! moved to an archived status. Failures are logged and never block the
//! pass.

use std::sync::Arc;

use chrono::{DateTime, Days, SecondsFormat, Utc};
use contrail_core::{ArchivalRule, RecordType, Result, Row, TypeConfig};
use contrail_store::{DomainStore, Filter, RowQuery};
use serde_json::Value;

/// Default retention for completed records.
pub const DEFAULT_ARCHIVE_AFTER_DAYS: u64 = 90;

/// Archives aged-out completed records.
pub struct Archiver {
    store: Arc<dyn DomainStore>,
    archive_after: Days,
    dry_run: bool,
}

impl Archiver {
    /// Archive records completed more than `archive_after_days` ago.
    pub fn new(store: Arc<dyn DomainStore>, archive_after_days: u64, dry_run: bool) -> Self {
        Self {
            store,
            archive_after: Days::new(archive_after_days),
            dry_run,
        }
    }

    /// Cutoff for `now`; rows dated strictly before it are archived.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_days(self.archive_after)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Run every archival rule. Returns rows archived (or, in a dry run,
    /// rows that would be).
    pub async fn run(&self, now: DateTime<Utc>) -> usize {
        let cutoff = self.cutoff(now);
        let mut total = 0;
        for record_type in RecordType::by_priority() {
            let config = record_type.config();
            let Some(rule) = config.archival else {
                continue;
            };
            match self.archive(config, &rule, cutoff).await {
                Ok(0) => {}
                Ok(count) => {
                    tracing::info!(
                        table = config.table,
                        count,
                        dry_run = self.dry_run,
                        "archived completed records"
                    );
                    total += count;
                }
                Err(e) => tracing::error!(table = config.table, error = %e, "archival failed"),
            }
        }
        total
    }

    async fn archive(
        &self,
        config: &TypeConfig,
        rule: &ArchivalRule,
        cutoff: DateTime<Utc>,
    ) -> Result<usize> {
        let filters = [
            Filter::eq(rule.status_column, rule.completed_status),
            Filter::lt(
                rule.date_column,
                cutoff.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
        ];

        if self.dry_run {
            let query = RowQuery {
                columns: Some(vec![config.key_column.to_string()]),
                filters: filters.to_vec(),
                limit: None,
            };
            return Ok(self.store.select(config.table, &query).await?.len());
        }

        let mut patch = Row::new();
        patch.insert(
            rule.status_column.to_string(),
            Value::from(rule.archived_status),
        );
        self.store.update(config.table, &filters, &patch).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use contrail_store::{MemoryStore, StoreCall};
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => Row::new(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_rows(
                "offers",
                vec![
                    row(json!({
                        "id": "old", "status": "completed", "departure_date": "2026-06-01"
                    })),
                    row(json!({
                        "id": "recent", "status": "completed", "departure_date": "2026-09-30"
                    })),
                    row(json!({"id": "open", "status": "open", "departure_date": "2025-01-01"})),
                ],
            )
            .with_rows(
                "flights",
                vec![row(json!({
                    "id": "f1",
                    "status": "completed",
                    "departure_time": "2026-01-05T09:30:00Z"
                }))],
            )
    }

    #[test]
    fn test_cutoff_is_ninety_days_back() {
        let archiver = Archiver::new(Arc::new(MemoryStore::new()), 90, false);
        assert_eq!(
            archiver.cutoff(now()),
            Utc.with_ymd_and_hms(2026, 7, 18, 12, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_archives_only_old_completed_rows() {
        let store = Arc::new(store());
        let archiver = Archiver::new(store.clone(), DEFAULT_ARCHIVE_AFTER_DAYS, false);
        assert_eq!(archiver.run(now()).await, 2);

        let status = |rows: &[Row], id: &str| {
            rows.iter()
                .find(|r| r.get("id") == Some(&json!(id)))
                .and_then(|r| r.get("status").cloned())
        };
        let offers = store.rows("offers").await;
        assert_eq!(status(&offers, "old"), Some(json!("archived")));
        assert_eq!(status(&offers, "recent"), Some(json!("completed")));
        assert_eq!(status(&offers, "open"), Some(json!("open")));
        let flights = store.rows("flights").await;
        assert_eq!(status(&flights, "f1"), Some(json!("archived")));
    }

    #[tokio::test]
    async fn test_dry_run_counts_without_writing() {
        let store = Arc::new(store());
        let archiver = Archiver::new(store.clone(), DEFAULT_ARCHIVE_AFTER_DAYS, true);
        assert_eq!(archiver.run(now()).await, 2);
        assert!(
            !store
                .calls()
                .await
                .iter()
                .any(|c| matches!(c, StoreCall::Update { .. }))
        );
    }

    #[tokio::test]
    async fn test_failure_is_logged_not_raised() {
        let store = Arc::new(store().with_failing_table("offers"));
        let archiver = Archiver::new(store.clone(), DEFAULT_ARCHIVE_AFTER_DAYS, true);
        // Offers fail; flights still run.
        assert_eq!(archiver.run(now()).await, 1);
    }
}
