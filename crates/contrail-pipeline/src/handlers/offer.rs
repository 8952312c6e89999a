//! Marketplace offers.

use async_trait::async_trait;
use contrail_core::{RecordType, Result, Row, TypeConfig};
use contrail_store::DomainStore;

use super::TypeHandler;
use super::fields::{aircraft_label, airport_label, joined, money, related, text};

/// Handler for [`RecordType::Offer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OfferHandler;

impl OfferHandler {
    fn header(row: &Row) -> Vec<String> {
        vec![
            format!("Offer {}", text(row, "id")),
            format!("Status: {}", text(row, "status")),
        ]
    }

    fn trailer(row: &Row) -> Vec<String> {
        vec![
            format!("Departure date: {}", text(row, "departure_date")),
            format!("Price: {}", money(row, "price", "currency")),
            format!("Available seats: {}", text(row, "available_seats")),
        ]
    }
}

#[async_trait]
impl TypeHandler for OfferHandler {
    fn config(&self) -> &'static TypeConfig {
        RecordType::Offer.config()
    }

    async fn render_rich(&self, store: &dyn DomainStore, row: &Row) -> Result<String> {
        let departure = related(store, row, "departure_airport", "airports", "icao").await?;
        let arrival = related(store, row, "arrival_airport", "airports", "icao").await?;
        let aircraft = related(store, row, "aircraft_id", "aircraft", "id").await?;
        let operator = related(store, row, "operator_id", "profiles", "id").await?;

        let mut lines = Self::header(row);
        lines.push(format!(
            "Route: {} -> {}",
            airport_label(&text(row, "departure_airport"), departure.as_ref()),
            airport_label(&text(row, "arrival_airport"), arrival.as_ref()),
        ));
        lines.extend(Self::trailer(row));
        lines.push(format!("Aircraft: {}", aircraft_label(aircraft.as_ref())));
        lines.push(format!(
            "Capacity: {} seats, range {} nm",
            joined(aircraft.as_ref(), "seats"),
            joined(aircraft.as_ref(), "range_nm"),
        ));
        lines.push(format!(
            "Operator: {} ({})",
            joined(operator.as_ref(), "company_name"),
            joined(operator.as_ref(), "full_name"),
        ));
        lines.push(format!("Description: {}", text(row, "description")));
        Ok(lines.join("\n"))
    }

    fn render_basic(&self, row: &Row) -> String {
        let mut lines = Self::header(row);
        lines.push(format!(
            "Route: {} -> {}",
            text(row, "departure_airport"),
            text(row, "arrival_airport"),
        ));
        lines.extend(Self::trailer(row));
        lines.push(format!("Description: {}", text(row, "description")));
        lines.join("\n")
    }
}
