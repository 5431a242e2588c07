//! CLI argument parsing for the `atlas` binary.
//!
//! CLI flags override every other configuration source.

use clap::{Parser, Subcommand, ValueEnum};

use atlas_pipeline::Step;

/// Podcast Atlas
///
/// Generates versioned analytics artifacts offline and inspects published ones.
#[derive(Parser, Debug)]
#[command(name = "atlas")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/podcast-atlas/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Base directory for relative input and output paths
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Derive artifacts from the input files and publish the manifest
    Generate {
        /// What to generate
        #[arg(value_enum, default_value = "all")]
        target: Target,

        /// Variant to generate (defaults to the configured variant)
        #[arg(long)]
        variant: Option<String>,

        /// Seed for the projection random source
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print the fetch path of an artifact
    Resolve {
        /// Artifact file name
        file: String,

        /// Variant (ignored when a variant is locked)
        #[arg(long, conflicts_with = "podcast")]
        variant: Option<String>,

        /// Resolve as podcast-scoped raw data for this podcast
        #[arg(long)]
        podcast: Option<String>,
    },

    /// Fetch and print the variant manifest
    Manifest {
        /// Origin for same-origin paths (e.g. http://localhost:8080)
        #[arg(long)]
        origin: Option<String>,
    },

    /// Fetch one or more variant-scoped artifacts
    Fetch {
        /// Artifact file names
        #[arg(required = true)]
        files: Vec<String>,

        #[arg(long)]
        variant: Option<String>,

        /// Origin for same-origin paths (e.g. http://localhost:8080)
        #[arg(long)]
        origin: Option<String>,
    },
}

/// Artifact families selectable on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    All,
    Clusters,
    Speakers,
    Projection,
    Timelines,
}

impl Target {
    pub fn steps(self) -> Vec<Step> {
        match self {
            Target::All => Step::ALL.to_vec(),
            Target::Clusters => vec![Step::ClusterCooccurrence],
            Target::Speakers => vec![Step::SpeakerCooccurrence],
            Target::Projection => vec![Step::Projection],
            Target::Timelines => vec![Step::Timelines],
        }
    }
}
