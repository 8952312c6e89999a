//! Airport reference data.

use async_trait::async_trait;
use contrail_core::{RecordType, Result, Row, TypeConfig};
use contrail_store::DomainStore;

use super::TypeHandler;
use super::fields::text;

/// Handler for [`RecordType::Airport`]. Airports have no joins.
#[derive(Debug, Clone, Copy, Default)]
pub struct AirportHandler;

#[async_trait]
impl TypeHandler for AirportHandler {
    fn config(&self) -> &'static TypeConfig {
        RecordType::Airport.config()
    }

    async fn render_rich(&self, _store: &dyn DomainStore, row: &Row) -> Result<String> {
        Ok(self.render_basic(row))
    }

    fn render_basic(&self, row: &Row) -> String {
        [
            format!("Airport {} / {}", text(row, "icao"), text(row, "iata")),
            format!("Name: {}", text(row, "name")),
            format!("Location: {}, {}", text(row, "city"), text(row, "country")),
            format!("Elevation: {} ft", text(row, "elevation_ft")),
            format!("Longest runway: {} ft", text(row, "longest_runway_ft")),
            format!("Customs: {}", text(row, "customs")),
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_render() {
        let row = match json!({
            "icao": "LFMN",
            "iata": "NCE",
            "name": "Nice Cote d'Azur",
            "city": "Nice",
            "country": "France",
            "customs": true
        }) {
            Value::Object(map) => map,
            _ => Row::new(),
        };
        let text = AirportHandler.render_basic(&row);
        assert!(
            text.starts_with("Airport LFMN / NCE\nName: Nice Cote d'Azur\nLocation: Nice, France")
        );
        assert!(text.contains("Elevation: Unknown ft"));
        assert!(text.ends_with("Customs: yes"));
    }
}
