use anyhow::Result;
use clap::{Arg, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use lecture_catalog::api;
use lecture_catalog::catalog::Catalog;
use lecture_catalog::config::Config;
use lecture_catalog::probe::FfprobeDurationProbe;
use lecture_catalog::scanner::LibraryScanner;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("lecture_catalog=info,tower_http=info,warn")
        .init();

    let matches = Command::new("Lecture Catalog")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Catalogs local video lectures and serves them for playback")
        .arg(
            Arg::new("lectures-dir")
                .short('d')
                .long("lectures-dir")
                .value_name("DIR")
                .help("Override the lecture library root"),
        )
        .arg(
            Arg::new("database-url")
                .long("database-url")
                .value_name("URL")
                .help("Override the catalog connection string"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Override the HTTP port"),
        )
        .arg(
            Arg::new("skip-scan")
                .long("skip-scan")
                .help("Serve the existing catalog without rescanning the library")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let mut config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });

    if let Some(dir) = matches.get_one::<String>("lectures-dir") {
        config.library.root_dir = PathBuf::from(dir);
    }
    if let Some(url) = matches.get_one::<String>("database-url") {
        config.database.url = url.clone();
    }
    if let Some(port) = matches.get_one::<String>("port") {
        config.server.port = port.parse()?;
    }
    let skip_scan = matches.get_flag("skip-scan");

    config.validate()?;

    info!("🚀 Lecture catalog starting...");
    info!("📁 Library root: {}", config.library.root_dir.display());

    let catalog = Catalog::connect(&config.database.url, config.database.max_connections).await?;

    if skip_scan {
        info!("Skipping library scan");
    } else {
        let scanner = LibraryScanner::new(
            catalog.clone(),
            Arc::new(FfprobeDurationProbe::new()),
            config.library.video_extensions.clone(),
        );

        let start_time = std::time::Instant::now();
        let summary = scanner.scan(&config.library.root_dir).await;
        info!(
            "🎉 Scan finished in {:.2}s: {} lectures ({} new, {} failures)",
            start_time.elapsed().as_secs_f64(),
            summary.lectures,
            summary.new_lectures,
            summary.failures
        );
    }

    let result = api::start_http_server(catalog.clone(), Arc::new(config)).await;

    catalog.close().await;
    result
}
