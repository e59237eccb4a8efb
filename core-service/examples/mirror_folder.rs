//! # Mirror Folder Example
//!
//! Mirrors the files of one Google Drive folder into a local directory and
//! prints every status record as it arrives.
//!
//! Run with:
//!
//! ```text
//! DRIVE_ACCESS_TOKEN=ya29... cargo run --example mirror_folder --package core-service -- \
//!     "project/2024" ./out [--delete]
//! ```

use bridge_desktop::{EnvTokenProvider, PacedLimiter};
use bridge_traits::log::LogLevel;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_service::{MirrorConfig, MirrorService, TransferStatus};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Info),
    )?;

    let mut args = std::env::args().skip(1);
    let (Some(path), Some(destination)) = (args.next(), args.next()) else {
        eprintln!("usage: mirror_folder <drive/path> <destination> [--delete]");
        std::process::exit(2);
    };
    let delete_after = args.any(|arg| arg == "--delete");

    // Drive allows roughly ten requests per second per user
    let config = MirrorConfig::builder()
        .token_provider(Arc::new(EnvTokenProvider::default()))
        .admission_limiter(Arc::new(PacedLimiter::new(8, Duration::from_millis(100))))
        .build()?;
    let service = MirrorService::new(config)?;

    let options = service
        .default_download_options()
        .with_delete_after(delete_after);
    let mut transfer = service.download_folder(&path, &destination, options).await?;

    while let Some(status) = transfer.next().await {
        let message = status.status_message();
        match status {
            TransferStatus::Progress(_) => println!("{}", message.default_message),
            TransferStatus::Completed { cleanup } => {
                println!("{} ({:?})", message.default_message, cleanup);
            }
            TransferStatus::Failed(_) => {
                eprintln!("{}", message.default_message);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
