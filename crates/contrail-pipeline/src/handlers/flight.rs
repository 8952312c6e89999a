//! Scheduled and completed flights.

use async_trait::async_trait;
use contrail_core::{RecordType, Result, Row, TypeConfig};
use contrail_store::DomainStore;

use super::TypeHandler;
use super::fields::{aircraft_label, airport_label, related, text};

/// Handler for [`RecordType::Flight`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FlightHandler;

fn schedule(row: &Row) -> [String; 4] {
    [
        format!("Departure: {}", text(row, "departure_time")),
        format!("Arrival: {}", text(row, "arrival_time")),
        format!("Passengers: {}", text(row, "passengers")),
        format!("Notes: {}", text(row, "notes")),
    ]
}

#[async_trait]
impl TypeHandler for FlightHandler {
    fn config(&self) -> &'static TypeConfig {
        RecordType::Flight.config()
    }

    async fn render_rich(&self, store: &dyn DomainStore, row: &Row) -> Result<String> {
        let origin = related(store, row, "origin", "airports", "icao").await?;
        let destination = related(store, row, "destination", "airports", "icao").await?;
        let aircraft = related(store, row, "aircraft_id", "aircraft", "id").await?;

        let mut lines = vec![
            format!("Flight {}", text(row, "flight_number")),
            format!("Status: {}", text(row, "status")),
            format!(
                "Route: {} -> {}",
                airport_label(&text(row, "origin"), origin.as_ref()),
                airport_label(&text(row, "destination"), destination.as_ref()),
            ),
            format!("Aircraft: {}", aircraft_label(aircraft.as_ref())),
        ];
        lines.extend(schedule(row));
        Ok(lines.join("\n"))
    }

    fn render_basic(&self, row: &Row) -> String {
        let mut lines = vec![
            format!("Flight {}", text(row, "flight_number")),
            format!("Status: {}", text(row, "status")),
            format!(
                "Route: {} -> {}",
                text(row, "origin"),
                text(row, "destination")
            ),
        ];
        lines.extend(schedule(row));
        lines.join("\n")
    }
}
