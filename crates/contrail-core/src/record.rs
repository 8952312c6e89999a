//! Record types and their static per-type configuration.
//!
//! The set of embeddable record types is closed. Each variant owns one
//! [`TypeConfig`] describing where its rows live, how "needs an embedding"
//! is expressed for it, what bookkeeping follows a successful embed, and
//! where it sits in the processing order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A domain row as returned by the store.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// The closed set of record types the worker embeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    /// Marketplace offer (empty leg, charter listing).
    Offer,
    /// Scheduled or completed flight.
    Flight,
    /// Crew roster.
    Crew,
    /// User profile.
    UserProfile,
    /// Flight simulation log.
    SimulationLog,
    /// Airport reference data.
    Airport,
    /// Aircraft in the fleet registry.
    Aircraft,
}

impl RecordType {
    /// Every record type, in declaration order.
    pub const ALL: [RecordType; 7] = [
        RecordType::Offer,
        RecordType::Flight,
        RecordType::Crew,
        RecordType::UserProfile,
        RecordType::SimulationLog,
        RecordType::Airport,
        RecordType::Aircraft,
    ];

    /// Type tag written alongside vectors.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Offer => "offer",
            RecordType::Flight => "flight",
            RecordType::Crew => "crew",
            RecordType::UserProfile => "user_profile",
            RecordType::SimulationLog => "simulation_log",
            RecordType::Airport => "airport",
            RecordType::Aircraft => "aircraft",
        }
    }

    /// Plural name used on the command line and in summaries.
    pub fn cli_name(&self) -> &'static str {
        match self {
            RecordType::Offer => "offers",
            RecordType::Flight => "flights",
            RecordType::Crew => "crews",
            RecordType::UserProfile => "users",
            RecordType::SimulationLog => "simulations",
            RecordType::Airport => "airports",
            RecordType::Aircraft => "aircraft",
        }
    }

    /// Whether `--only` may select this type on its own.
    pub fn is_selectable(&self) -> bool {
        !matches!(self, RecordType::Airport | RecordType::Aircraft)
    }

    /// Static configuration for this type.
    pub fn config(&self) -> &'static TypeConfig {
        match self {
            RecordType::Offer => &OFFER,
            RecordType::Flight => &FLIGHT,
            RecordType::Crew => &CREW,
            RecordType::UserProfile => &USER_PROFILE,
            RecordType::SimulationLog => &SIMULATION_LOG,
            RecordType::Airport => &AIRPORT,
            RecordType::Aircraft => &AIRCRAFT,
        }
    }

    /// All record types sorted by ascending priority.
    pub fn by_priority() -> Vec<RecordType> {
        let mut types = Self::ALL.to_vec();
        types.sort_by_key(|t| t.config().priority);
        types
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cli_name())
    }
}

impl FromStr for RecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.cli_name() == needle || t.as_str() == needle)
            .ok_or_else(|| Error::config(format!("unknown record type: {s}")))
    }
}

/// Which record types a pass covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeSelection {
    /// Every configured type.
    #[default]
    All,
    /// A single type.
    Only(RecordType),
}

impl TypeSelection {
    /// The selected types, ordered by priority.
    pub fn types(&self) -> Vec<RecordType> {
        match self {
            TypeSelection::All => RecordType::by_priority(),
            TypeSelection::Only(t) => vec![*t],
        }
    }
}

impl FromStr for TypeSelection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(TypeSelection::All);
        }
        let record_type: RecordType = s.parse()?;
        if !record_type.is_selectable() {
            return Err(Error::config(format!(
                "{record_type} can only run as part of 'all'"
            )));
        }
        Ok(TypeSelection::Only(record_type))
    }
}

/// Post-embedding bookkeeping for a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bookkeeping {
    /// Set a boolean column to `true` on the embedded row.
    MarkFlag {
        /// Flag column.
        column: &'static str,
    },
}

/// Housekeeping rule: completed rows older than the retention window are
/// moved to an archived status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchivalRule {
    /// Lifecycle status column.
    pub status_column: &'static str,
    /// Status value meaning "completed".
    pub completed_status: &'static str,
    /// Status value written on archival.
    pub archived_status: &'static str,
    /// Date column compared against the cutoff.
    pub date_column: &'static str,
}

/// Immutable per-type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeConfig {
    /// Record type this entry describes.
    pub record_type: RecordType,
    /// Table holding the rows.
    pub table: &'static str,
    /// Identity column (uuid or natural key).
    pub key_column: &'static str,
    /// Store function returning rows that need an embedding, if deployed.
    pub pending_function: Option<&'static str>,
    /// Column holding the vector.
    pub vector_column: &'static str,
    /// Optional last-embedded timestamp column.
    pub embedded_at_column: Option<&'static str>,
    /// Bookkeeping applied after a successful embed.
    pub bookkeeping: Option<Bookkeeping>,
    /// Archival rule run during housekeeping.
    pub archival: Option<ArchivalRule>,
    /// Processing order; lower runs first.
    pub priority: u8,
}

const OFFER: TypeConfig = TypeConfig {
    record_type: RecordType::Offer,
    table: "offers",
    key_column: "id",
    pending_function: Some("offers_needing_embedding"),
    vector_column: "embedding",
    embedded_at_column: Some("embedded_at"),
    bookkeeping: Some(Bookkeeping::MarkFlag {
        column: "is_embedded",
    }),
    archival: Some(ArchivalRule {
        status_column: "status",
        completed_status: "completed",
        archived_status: "archived",
        date_column: "departure_date",
    }),
    priority: 1,
};

const FLIGHT: TypeConfig = TypeConfig {
    record_type: RecordType::Flight,
    table: "flights",
    key_column: "id",
    pending_function: Some("flights_needing_embedding"),
    vector_column: "embedding",
    embedded_at_column: Some("embedded_at"),
    bookkeeping: None,
    archival: Some(ArchivalRule {
        status_column: "status",
        completed_status: "completed",
        archived_status: "archived",
        date_column: "departure_time",
    }),
    priority: 2,
};

const CREW: TypeConfig = TypeConfig {
    record_type: RecordType::Crew,
    table: "crews",
    key_column: "id",
    pending_function: Some("crews_needing_embedding"),
    vector_column: "embedding",
    embedded_at_column: Some("embedded_at"),
    bookkeeping: None,
    archival: None,
    priority: 3,
};

const USER_PROFILE: TypeConfig = TypeConfig {
    record_type: RecordType::UserProfile,
    table: "profiles",
    key_column: "id",
    pending_function: Some("profiles_needing_embedding"),
    vector_column: "embedding",
    embedded_at_column: Some("embedded_at"),
    bookkeeping: None,
    archival: None,
    priority: 4,
};

const SIMULATION_LOG: TypeConfig = TypeConfig {
    record_type: RecordType::SimulationLog,
    table: "simulation_logs",
    key_column: "id",
    pending_function: None,
    vector_column: "embedding",
    embedded_at_column: Some("embedded_at"),
    bookkeeping: None,
    archival: None,
    priority: 5,
};

const AIRPORT: TypeConfig = TypeConfig {
    record_type: RecordType::Airport,
    table: "airports",
    key_column: "icao",
    pending_function: None,
    vector_column: "embedding",
    embedded_at_column: None,
    bookkeeping: None,
    archival: None,
    priority: 6,
};

const AIRCRAFT: TypeConfig = TypeConfig {
    record_type: RecordType::Aircraft,
    table: "aircraft",
    key_column: "id",
    pending_function: None,
    vector_column: "embedding",
    embedded_at_column: None,
    bookkeeping: None,
    archival: None,
    priority: 7,
};
