//! Command-line and environment configuration.

use std::path::PathBuf;

use carmod_core::DEFAULT_API_BASE;
use clap::{Parser, Subcommand};

use crate::store::FileTokenStore;

#[derive(Parser, Debug)]
#[command(name = "carmod", version, about = "Vehicle photo studio client")]
pub struct Cli {
    /// Backend base URL.
    #[arg(long, env = "CARMOD_API_BASE", default_value = DEFAULT_API_BASE)]
    pub base_url: String,

    /// JSON file the auth token is kept in.
    #[arg(long, env = "CARMOD_TOKEN_FILE")]
    pub token_file: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive session (the default).
    Shell,
    /// Upload a photo, segment it, recolor the body and print the result URL.
    Recolor {
        file: PathBuf,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        dh: i32,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        ds: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        dv: f64,
    },
}

impl Cli {
    pub fn token_path(&self) -> PathBuf {
        self.token_file
            .clone()
            .unwrap_or_else(FileTokenStore::default_path)
    }

    /// Default tracing directive when `RUST_LOG` is unset.
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}
