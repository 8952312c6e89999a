//! Flight simulation logs.

use async_trait::async_trait;
use contrail_core::{RecordType, Result, Row, TypeConfig};
use contrail_store::DomainStore;

use super::TypeHandler;
use super::fields::{aircraft_label, airport_label, related, text};

/// Handler for [`RecordType::SimulationLog`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulationLogHandler;

fn results(row: &Row) -> [String; 4] {
    [
        format!("Duration: {} min", text(row, "duration_minutes")),
        format!("Fuel used: {}", text(row, "fuel_used")),
        format!("Outcome: {}", text(row, "outcome")),
        format!("Notes: {}", text(row, "notes")),
    ]
}

#[async_trait]
impl TypeHandler for SimulationLogHandler {
    fn config(&self) -> &'static TypeConfig {
        RecordType::SimulationLog.config()
    }

    async fn render_rich(&self, store: &dyn DomainStore, row: &Row) -> Result<String> {
        let aircraft = related(store, row, "aircraft_id", "aircraft", "id").await?;
        let origin = related(store, row, "origin", "airports", "icao").await?;
        let destination = related(store, row, "destination", "airports", "icao").await?;

        let mut lines = vec![
            format!("Simulation {}", text(row, "id")),
            format!("Recorded: {}", text(row, "created_at")),
            format!(
                "Route: {} -> {}",
                airport_label(&text(row, "origin"), origin.as_ref()),
                airport_label(&text(row, "destination"), destination.as_ref()),
            ),
            format!("Aircraft: {}", aircraft_label(aircraft.as_ref())),
        ];
        lines.extend(results(row));
        Ok(lines.join("\n"))
    }

    fn render_basic(&self, row: &Row) -> String {
        let mut lines = vec![
            format!("Simulation {}", text(row, "id")),
            format!("Recorded: {}", text(row, "created_at")),
            format!(
                "Route: {} -> {}",
                text(row, "origin"),
                text(row, "destination")
            ),
        ];
        lines.extend(results(row));
        lines.join("\n")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use contrail_store::MemoryStore;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_rich_with_no_joins_set() {
        let row = match json!({"id": "s1", "outcome": "success", "duration_minutes": 95}) {
            Value::Object(map) => map,
            _ => Row::new(),
        };
        let text = SimulationLogHandler
            .render_rich(&MemoryStore::new(), &row)
            .await
            .unwrap();
        assert!(text.contains("Route: Unknown -> Unknown"));
        assert!(text.contains("Aircraft: Unknown"));
        assert!(text.contains("Duration: 95 min"));
        assert!(text.contains("Outcome: success"));
    }
}
