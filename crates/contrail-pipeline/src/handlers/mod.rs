//! Per-type record handlers.
//!
//! Every [`RecordType`] has exactly one [`TypeHandler`]. A handler knows how
//! to find records of its type that need an embedding, how to describe a
//! record as text, and what bookkeeping follows a successful embed.
//!
//! # Text Composition
//!
//! Each handler renders two forms of text:
//!
//! 1. **Rich** - the record plus joined context (airports, aircraft,
//!    profiles). Absent joined fields render as `Unknown`.
//! 2. **Basic** - the record's own fields only, in the same order.
//!
//! [`TypeHandler::render`] tries rich first and falls back to basic when a
//! join fails. Both forms are multi-line with a fixed field order, so the
//! same row state always produces the same text.

mod aircraft;
mod airport;
mod crew;
pub mod fields;
mod flight;
mod offer;
mod simulation_log;
mod user_profile;

use async_trait::async_trait;
use contrail_core::{Bookkeeping, Error, RecordType, Result, Row, TypeConfig};
use contrail_store::{DomainStore, Filter};
use serde_json::Value;

use crate::fallback::Fallback;
use crate::selector;

pub use aircraft::AircraftHandler;
pub use airport::AirportHandler;
pub use crew::CrewHandler;
pub use flight::FlightHandler;
pub use offer::OfferHandler;
pub use simulation_log::SimulationLogHandler;
pub use user_profile::UserProfileHandler;

/// Text rendered for one record, with the row it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    /// Record key.
    pub id: String,
    /// Text to embed.
    pub text: String,
    /// The record's own row.
    pub source: Row,
    /// Which rendering produced the text (`rich` or `basic`).
    pub strategy: &'static str,
}

/// Capabilities every record type provides to the batch processor.
///
/// Implementors supply [`config`](Self::config) and the two renderers; the
/// selection, generation and bookkeeping steps have defaults driven by the
/// type's [`TypeConfig`].
#[async_trait]
pub trait TypeHandler: Send + Sync {
    /// Static configuration for this type.
    fn config(&self) -> &'static TypeConfig;

    /// Render the record with joined context.
    async fn render_rich(&self, store: &dyn DomainStore, row: &Row) -> Result<String>;

    /// Render the record from its own fields.
    fn render_basic(&self, row: &Row) -> String;

    /// Ids of up to `limit` records of this type lacking an embedding.
    async fn select_batch(&self, store: &dyn DomainStore, limit: usize) -> Result<Vec<String>> {
        selector::select_batch(store, self.config(), limit).await
    }

    /// Fetch the record and render its text, rich path first.
    ///
    /// A missing record or a failed fetch is an error; a failed join is
    /// not.
    async fn render(&self, store: &dyn DomainStore, id: &str) -> Result<Rendered> {
        let config = self.config();
        let row = store
            .fetch_one(config.table, config.key_column, id)
            .await?
            .ok_or_else(|| Error::not_found(format!("{} {id}", config.record_type.as_str())))?;

        let source = &row;
        let outcome = Fallback::new("text")
            .then("rich", move || self.render_rich(store, source))
            .then("basic", move || async move { Ok(self.render_basic(source)) })
            .run()
            .await?;
        if outcome.strategy != "rich" {
            tracing::debug!(
                record_type = config.record_type.as_str(),
                id,
                strategy = outcome.strategy,
                "enrichment failed, using basic text"
            );
        }

        Ok(Rendered {
            id: id.to_string(),
            text: outcome.value,
            strategy: outcome.strategy,
            source: row,
        })
    }

    /// Text to embed for record `id`.
    async fn generate_text(&self, store: &dyn DomainStore, id: &str) -> Result<String> {
        Ok(self.render(store, id).await?.text)
    }

    /// Apply this type's bookkeeping to an embedded record.
    async fn after_embed(&self, store: &dyn DomainStore, id: &str) -> Result<()> {
        let config = self.config();
        let Some(Bookkeeping::MarkFlag { column }) = config.bookkeeping else {
            return Ok(());
        };
        let mut patch = Row::new();
        patch.insert(column.to_string(), Value::Bool(true));
        let updated = store
            .update(config.table, &[Filter::eq(config.key_column, id)], &patch)
            .await?;
        if updated == 0 {
            return Err(Error::not_found(format!("{} {id}", config.table)));
        }
        Ok(())
    }
}

static OFFER: OfferHandler = OfferHandler;
static FLIGHT: FlightHandler = FlightHandler;
static CREW: CrewHandler = CrewHandler;
static USER_PROFILE: UserProfileHandler = UserProfileHandler;
static SIMULATION_LOG: SimulationLogHandler = SimulationLogHandler;
static AIRPORT: AirportHandler = AirportHandler;
static AIRCRAFT: AircraftHandler = AircraftHandler;

/// The handler for `record_type`.
pub fn handler_for(record_type: RecordType) -> &'static dyn TypeHandler {
    match record_type {
        RecordType::Offer => &OFFER,
        RecordType::Flight => &FLIGHT,
        RecordType::Crew => &CREW,
        RecordType::UserProfile => &USER_PROFILE,
        RecordType::SimulationLog => &SIMULATION_LOG,
        RecordType::Airport => &AIRPORT,
        RecordType::Aircraft => &AIRCRAFT,
    }
}
