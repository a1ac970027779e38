use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::Result;

/// Installs the global fmt subscriber; `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Logs go to stderr so stdout stays free for event lines.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn save_json<T: Serialize + ?Sized>(data: &T, filename: impl AsRef<Path>) -> Result<()> {
    let filename = filename.as_ref();
    let mut file = File::create(filename)?;
    file.write_all(serde_json::to_string_pretty(data)?.as_bytes())?;
    info!(file = %filename.display(), "written");
    Ok(())
}

pub fn save_text(content: &str, filename: impl AsRef<Path>) -> Result<()> {
    let filename = filename.as_ref();
    let mut file = File::create(filename)?;
    file.write_all(content.as_bytes())?;
    info!(file = %filename.display(), "written");
    Ok(())
}
