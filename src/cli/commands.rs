use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "spooldex")]
#[command(version, about = "Filament spool inventory tracker")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the inventory web UI
    Serve {
        /// YAML config file
        #[arg(long, short = 'c', value_name = "FILE")]
        config: Option<PathBuf>,

        /// CSV file holding the inventory (overrides config and environment)
        #[arg(long, value_name = "PATH")]
        data_file: Option<PathBuf>,

        /// Address to listen on, e.g. 0.0.0.0:8501
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Print the SHA-256 digest to use as `password_hash`
    HashPassword {
        /// Password to hash
        #[arg(conflicts_with = "stdin")]
        password: Option<String>,

        /// Read the password from stdin
        #[arg(long)]
        stdin: bool,
    },
}
