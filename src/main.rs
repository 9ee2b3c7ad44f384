use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use sonami_import::{ImportProgress, ImporterConfig, PlaylistImporter, ProgressCallback};

/// Import a Spotify, Apple Music or YouTube Music playlist into the local library
#[derive(Parser, Debug)]
#[clap(name = "sonami-import")]
struct Args {
    /// Playlist share URL
    url: String,

    /// Importer config file (defaults to the user config dir)
    #[clap(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// SQLite database to save the playlist into
    #[clap(long, value_name = "FILE")]
    db: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ImporterConfig::load_from(path),
        None => ImporterConfig::load(),
    };
    if let Some(db) = args.db {
        config.database_path = Some(db);
    }

    let importer = match PlaylistImporter::from_config(&config).await {
        Ok(importer) => importer,
        Err(e) => {
            log::error!("Failed to set up importer: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let print_progress: &ProgressCallback = &|p: ImportProgress| {
        if p.total > 0 {
            eprintln!("[{}/{}] {}", p.current, p.total, p.message);
        } else {
            eprintln!("{}", p.message);
        }
    };

    let result = match importer.import_playlist(&args.url, Some(print_progress)).await {
        Ok(result) => result,
        Err(e) => {
            log::error!("Failed to save imported playlist: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&result) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Failed to serialize result: {}", e),
    }

    if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
