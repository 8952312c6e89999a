//! User profiles.
//!
//! Only the role and company are embedded; names and contact details stay
//! out of the index.

use async_trait::async_trait;
use contrail_core::{RecordType, Result, Row, TypeConfig};
use contrail_store::DomainStore;

use super::TypeHandler;
use super::fields::text;

/// Handler for [`RecordType::UserProfile`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UserProfileHandler;

#[async_trait]
impl TypeHandler for UserProfileHandler {
    fn config(&self) -> &'static TypeConfig {
        RecordType::UserProfile.config()
    }

    async fn render_rich(&self, _store: &dyn DomainStore, row: &Row) -> Result<String> {
        Ok(self.render_basic(row))
    }

    fn render_basic(&self, row: &Row) -> String {
        [
            format!("User profile {}", text(row, "id")),
            format!("Role: {}", text(row, "role")),
            format!("Company: {}", text(row, "company_name")),
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_excludes_personal_fields() {
        let row = match json!({
            "id": "u1",
            "role": "broker",
            "company_name": "Skyline Charter",
            "email": "someone@example.com",
            "full_name": "Private Person"
        }) {
            Value::Object(map) => map,
            _ => Row::new(),
        };
        let text = UserProfileHandler.render_basic(&row);
        assert_eq!(text, "User profile u1\nRole: broker\nCompany: Skyline Charter");
    }
}
