//! Fleet registry.

use async_trait::async_trait;
use contrail_core::{RecordType, Result, Row, TypeConfig};
use contrail_store::DomainStore;

use super::TypeHandler;
use super::fields::{joined, related, text};

/// Handler for [`RecordType::Aircraft`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AircraftHandler;

fn specs(row: &Row) -> [String; 5] {
    [
        format!("Category: {}", text(row, "category")),
        format!("Seats: {}", text(row, "seats")),
        format!("Range: {} nm", text(row, "range_nm")),
        format!("Year: {}", text(row, "year")),
        format!("Home base: {}", text(row, "home_base")),
    ]
}

fn title(row: &Row) -> String {
    format!(
        "Aircraft {} {} ({})",
        text(row, "manufacturer"),
        text(row, "model"),
        text(row, "registration")
    )
}

#[async_trait]
impl TypeHandler for AircraftHandler {
    fn config(&self) -> &'static TypeConfig {
        RecordType::Aircraft.config()
    }

    async fn render_rich(&self, store: &dyn DomainStore, row: &Row) -> Result<String> {
        let operator = related(store, row, "operator_id", "profiles", "id").await?;
        let mut lines = vec![title(row)];
        lines.extend(specs(row));
        lines.push(format!(
            "Operator: {}",
            joined(operator.as_ref(), "company_name")
        ));
        Ok(lines.join("\n"))
    }

    fn render_basic(&self, row: &Row) -> String {
        let mut lines = vec![title(row)];
        lines.extend(specs(row));
        lines.join("\n")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use contrail_store::MemoryStore;
    use serde_json::{Value, json};

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => Row::new(),
        }
    }

    #[tokio::test]
    async fn test_rich_appends_operator() {
        let store = MemoryStore::new().with_rows(
            "profiles",
            vec![row(json!({"id": "p9", "company_name": "Northwind Aviation"}))],
        );
        let aircraft = row(json!({
            "id": "a1",
            "manufacturer": "Bombardier",
            "model": "Challenger 350",
            "registration": "N350NW",
            "seats": 10,
            "operator_id": "p9"
        }));
        let rich = AircraftHandler.render_rich(&store, &aircraft).await.unwrap();
        let basic = AircraftHandler.render_basic(&aircraft);
        assert!(rich.starts_with(&basic));
        assert!(rich.ends_with("Operator: Northwind Aviation"));
        assert!(basic.starts_with(
            "Aircraft Bombardier Challenger 350 (N350NW)\nCategory: Unknown\nSeats: 10"
        ));
    }
}
