//! Crew rosters.

use async_trait::async_trait;
use contrail_core::{RecordType, Result, Row, TypeConfig};
use contrail_store::DomainStore;

use super::TypeHandler;
use super::fields::{joined, related, text};

/// Handler for [`RecordType::Crew`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CrewHandler;

fn details(row: &Row) -> [String; 4] {
    [
        format!("Base: {}", text(row, "base_airport")),
        format!("Members: {}", text(row, "members")),
        format!("Certifications: {}", text(row, "certifications")),
        format!("Availability: {}", text(row, "availability")),
    ]
}

#[async_trait]
impl TypeHandler for CrewHandler {
    fn config(&self) -> &'static TypeConfig {
        RecordType::Crew.config()
    }

    async fn render_rich(&self, store: &dyn DomainStore, row: &Row) -> Result<String> {
        let captain = related(store, row, "captain_id", "profiles", "id").await?;

        let mut lines = vec![
            format!("Crew {}", text(row, "name")),
            format!("Status: {}", text(row, "status")),
            format!(
                "Captain: {} ({})",
                joined(captain.as_ref(), "full_name"),
                joined(captain.as_ref(), "role"),
            ),
        ];
        lines.extend(details(row));
        Ok(lines.join("\n"))
    }

    fn render_basic(&self, row: &Row) -> String {
        let mut lines = vec![
            format!("Crew {}", text(row, "name")),
            format!("Status: {}", text(row, "status")),
        ];
        lines.extend(details(row));
        lines.join("\n")
    }
}
