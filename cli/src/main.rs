use std::io;

use anyhow::{Context, Result};
use carmod_cli::{recolor_file, Cli, Command, FileTokenStore, Shell, UreqTransport};
use carmod_core::{CarmodClient, Studio};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.default_log_filter())),
        )
        .with_writer(io::stderr)
        .init();

    let token_path = cli.token_path();
    info!(base_url = %cli.base_url, token_file = %token_path.display(), "starting");

    let mut studio = Studio::new(
        CarmodClient::new(&cli.base_url),
        UreqTransport::new(),
        FileTokenStore::new(token_path),
    );
    studio.bootstrap();

    match cli.command {
        None | Some(Command::Shell) => {
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            Shell::new(studio)
                .run(stdin.lock(), &mut stdout)
                .context("shell I/O failed")?;
        }
        Some(Command::Recolor { file, dh, ds, dv }) => {
            let url = recolor_file(&mut studio, &file, dh, ds, dv)
                .with_context(|| format!("recoloring {}", file.display()))?;
            println!("{url}");
        }
    }

    Ok(())
}
