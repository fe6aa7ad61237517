mod commands;
mod config;
mod logging;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use fixture_pics::ProvisionRequest;
use fixture_pics::layout::{DEFAULT_COUNT, DEFAULT_FOLDER};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "fixture-pics", version)]
#[command(about = "Download placeholder pictures for fixture data")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replace a folder's pictures with freshly downloaded avatars
    #[command(alias = "download-fixture-pictures")]
    Download {
        /// How many images will be downloaded
        #[arg(default_value_t = DEFAULT_COUNT)]
        how_many: u32,
        /// Folder under the assets root
        #[arg(default_value = DEFAULT_FOLDER)]
        folder_name: String,
    },
    /// Remove every picture except the defaults from a folder
    Clean {
        /// Folder under the assets root
        #[arg(default_value = DEFAULT_FOLDER)]
        folder_name: String,
    },
    /// Validate an image and store it in the upload directory
    Upload {
        /// Image file to upload
        file: PathBuf,
    },
}

/// Cancel `token` on the first Ctrl-C.
fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!();
            eprintln!("Interrupt received, finishing up...");
            token.cancel();
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_tracing();
    let cli = Cli::parse();
    let config = config::load_config();

    match cli.command {
        Command::Download {
            how_many,
            folder_name,
        } => {
            let request = ProvisionRequest::new(how_many, folder_name)?;
            let cancel = CancellationToken::new();
            cancel_on_interrupt(cancel.clone());
            commands::download::run(&config, &request, &cancel).await
        }
        Command::Clean { folder_name } => commands::clean::run(&config, &folder_name),
        Command::Upload { file } => commands::upload::run(&config, &file),
    }
}
