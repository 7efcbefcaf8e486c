use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "pad-lecture-names")]
#[command(about = "Zero-pads leading lecture numbers so filename order matches lecture order")]
struct Cli {
    /// Chapter directory whose .mp4 files should be renamed
    directory: PathBuf,

    /// Digits to pad the leading number to
    #[arg(long, default_value_t = 3)]
    width: usize,

    /// Print the renames without performing them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("pad_lecture_names=info,warn")
        .init();

    let cli = Cli::parse();

    let mut entries = tokio::fs::read_dir(&cli.directory).await?;
    let mut renamed = 0usize;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(new_name) = padded_name(&name, cli.width) else {
            continue;
        };
        if new_name == name {
            continue;
        }

        info!("Renaming: {} -> {}", name, new_name);
        if !cli.dry_run {
            tokio::fs::rename(&path, cli.directory.join(&new_name)).await?;
        }
        renamed += 1;
    }

    if cli.dry_run {
        info!("Dry run: {} files would be renamed", renamed);
    } else {
        info!("✅ {} files renamed", renamed);
    }

    Ok(())
}

/// "12 Limits.mp4" -> "012 Limits.mp4". None for files without a leading
/// number or without the .mp4 extension.
fn padded_name(name: &str, width: usize) -> Option<String> {
    let stem = name.strip_suffix(".mp4")?;
    let digits: String = stem.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }

    let rest = &stem[digits.len()..];
    let number: u64 = digits.parse().ok()?;
    Some(format!("{:0width$}{}.mp4", number, rest, width = width))
}
