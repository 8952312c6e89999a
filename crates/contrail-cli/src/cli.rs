//! CLI argument parsing.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use contrail_core::TypeSelection;

use crate::config::CONFIG_ENV;

/// Where embedded vectors are written.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Target {
    /// Vector column on the domain rows.
    #[default]
    Domain,
    /// External vector index (Qdrant).
    VectorStore,
}

/// Keeps marketplace record embeddings in sync.
///
/// Selects records lacking an embedding, renders a description for each,
/// embeds it under the provider's rate limit, and persists the vector.
#[derive(Parser, Debug)]
#[command(name = "contrail", author, version, about, long_about = None)]
pub struct CliArgs {
    /// Keep running passes until interrupted.
    #[arg(long)]
    pub continuous: bool,

    /// Seconds between idle passes in continuous mode [default: 300].
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// Records selected per type per pass [default: 50].
    #[arg(long = "batch-size", visible_alias = "limit", value_name = "N")]
    pub batch_size: Option<usize>,

    /// Restrict the pass to one type: all, offers, flights, crews, users,
    /// simulations.
    #[arg(long, value_name = "TYPE", default_value = "all")]
    pub only: TypeSelection,

    /// Run everything except persistence, bookkeeping, and archival writes.
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose per-record logging.
    #[arg(long)]
    pub debug: bool,

    /// Persistence target.
    #[arg(long, value_enum, default_value_t = Target::Domain)]
    pub target: Target,

    /// Path to configuration file.
    #[arg(short, long, env = CONFIG_ENV)]
    pub config: Option<String>,

    /// Directory for session and error logs (overrides config).
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use contrail_core::RecordType;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("contrail").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert!(!args.continuous);
        assert!(!args.dry_run);
        assert!(!args.debug);
        assert_eq!(args.interval, None);
        assert_eq!(args.batch_size, None);
        assert_eq!(args.only, TypeSelection::All);
        assert_eq!(args.target, Target::Domain);
    }

    #[test]
    fn test_full_flag_set() {
        let args = parse(&[
            "--continuous",
            "--interval=120",
            "--batch-size=10",
            "--only=offers",
            "--dry-run",
            "--debug",
            "--target=vector-store",
            "--log-dir=/tmp/logs",
        ]);
        assert!(args.continuous);
        assert_eq!(args.interval, Some(120));
        assert_eq!(args.batch_size, Some(10));
        assert_eq!(args.only, TypeSelection::Only(RecordType::Offer));
        assert!(args.dry_run);
        assert!(args.debug);
        assert_eq!(args.target, Target::VectorStore);
        assert_eq!(args.log_dir, Some(PathBuf::from("/tmp/logs")));
    }

    #[test]
    fn test_limit_alias() {
        assert_eq!(parse(&["--limit", "7"]).batch_size, Some(7));
    }

    #[test]
    fn test_only_accepts_each_selectable_type() {
        for (name, record_type) in [
            ("flights", RecordType::Flight),
            ("crews", RecordType::Crew),
            ("users", RecordType::UserProfile),
            ("simulations", RecordType::SimulationLog),
        ] {
            assert_eq!(
                parse(&["--only", name]).only,
                TypeSelection::Only(record_type)
            );
        }
    }

    #[test]
    fn test_rejects_bad_values() {
        for args in [
            vec!["contrail", "--only=yachts"],
            vec!["contrail", "--only=airports"],
            vec!["contrail", "--interval=0"],
            vec!["contrail", "--batch-size=-1"],
            vec!["contrail", "--target=s3"],
        ] {
            assert!(CliArgs::try_parse_from(args).is_err());
        }
    }

    #[test]
    fn test_help_flag() {
        let err = CliArgs::try_parse_from(["contrail", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
