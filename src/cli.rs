use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::hedge::FieldTag;

/// pubhedge - build PubMed hedges from term files and retrieve every query variant
///
/// With no arguments, runs a search from `mesh-terms/` and `keywords/` into `target/`.
#[derive(Parser, Debug)]
#[command(name = "pubhedge", version, about, long_about = None)]
pub struct Cli {
    /// Contact email sent to E-utilities and OpenAlex
    #[arg(long, global = true)]
    pub email: Option<String>,

    /// Directory of MeSH term files, one block per file
    #[arg(long, global = true)]
    pub mesh_dir: Option<PathBuf>,

    /// Directory of keyword term files, one block per file
    #[arg(long, global = true)]
    pub keyword_dir: Option<PathBuf>,

    /// Output root for csv/, hedges/, pmid/ and queries/
    #[arg(long, global = true)]
    pub target: Option<PathBuf>,

    /// PubMed field tag for keyword hedges; repeat for several (default: [tw] [tiab])
    #[arg(long = "field-tag", global = true)]
    pub field_tags: Vec<FieldTag>,

    /// Maximum records retrieved per query
    #[arg(long, global = true)]
    pub max_results: Option<usize>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Count and retrieve every hedge and query variant (default)
    Search,
    /// Map the pmids of a result table to MAG ids through OpenAlex
    Enrich {
        /// A table written to csv/ by a previous search
        csv: PathBuf,
    },
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Search)
    }

    /// Defaults with every given override applied.
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        if let Some(email) = &self.email {
            config.email = email.clone();
        }
        if let Some(dir) = &self.mesh_dir {
            config.mesh_dir = dir.clone();
        }
        if let Some(dir) = &self.keyword_dir {
            config.keyword_dir = dir.clone();
        }
        if let Some(dir) = &self.target {
            config.target_dir = dir.clone();
        }
        if !self.field_tags.is_empty() {
            config.field_tags = self.field_tags.clone();
        }
        if let Some(max) = self.max_results {
            config.max_results = max;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_runs_search_with_defaults() {
        let cli = Cli::try_parse_from(["pubhedge"]).unwrap();
        assert_eq!(cli.command(), Command::Search);

        let config = cli.config();
        assert_eq!(config.email, crate::config::DEFAULT_EMAIL);
        assert_eq!(config.mesh_dir, PathBuf::from("mesh-terms"));
        assert_eq!(config.field_tags.len(), 2);
    }

    #[test]
    fn overrides_apply() {
        let cli = Cli::try_parse_from([
            "pubhedge",
            "--email",
            "me@example.org",
            "--field-tag",
            "[tiab]",
            "--max-results",
            "500",
            "--target",
            "out",
            "search",
        ])
        .unwrap();

        let config = cli.config();
        assert_eq!(config.email, "me@example.org");
        assert_eq!(config.max_results, 500);
        assert_eq!(config.target_dir, PathBuf::from("out"));
        let tags: Vec<&str> = config.field_tags.iter().map(FieldTag::as_str).collect();
        assert_eq!(tags, ["[tiab]"]);
    }

    #[test]
    fn enrich_takes_a_table_path() {
        let cli = Cli::try_parse_from(["pubhedge", "enrich", "target/csv/20240307-12-mesh.csv"])
            .unwrap();
        assert_eq!(
            cli.command(),
            Command::Enrich {
                csv: PathBuf::from("target/csv/20240307-12-mesh.csv")
            }
        );
    }

    #[test]
    fn malformed_field_tag_is_rejected() {
        assert!(Cli::try_parse_from(["pubhedge", "--field-tag", "tiab"]).is_err());
        assert!(Cli::try_parse_from(["pubhedge", "--field-tag", "[t w]"]).is_err());
    }
}
