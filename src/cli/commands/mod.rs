use clap::Subcommand;
use std::path::PathBuf;

pub mod check;
pub mod inspect;
pub mod textures;

#[derive(Subcommand)]
pub enum Commands {
    /// Check whether a file is an RSL container
    Check {
        /// File to check
        source: PathBuf,
    },

    /// Print a container's directory tree
    Inspect {
        /// RSL container file
        source: PathBuf,

        /// Emit the tree as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Scan a file for GCT0 texture records
    Textures {
        /// File to scan (any file, not just RSL containers)
        source: PathBuf,

        /// Write each found texture as PNG into this directory
        #[arg(long, value_name = "DIR")]
        dump: Option<PathBuf>,
    },
}

impl Commands {
    /// Execute the selected command.
    ///
    /// # Errors
    /// Returns an error if the underlying command fails.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Check { source } => check::execute(source),
            Commands::Inspect { source, json } => inspect::execute(source, *json),
            Commands::Textures { source, dump } => textures::execute(source, dump.as_deref()),
        }
    }
}
