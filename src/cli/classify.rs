//! Classify command implementation

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;

use promptline::config::Config;
use promptline::session::strip_ansi_codes;

/// Classify captured terminal text from a file, or stdin when no file is given
pub async fn classify_command(
    config: &Config,
    tool: Option<&str>,
    file: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let raw = match &file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read stdin")?;
            buf
        }
    };

    let lines: Vec<String> = raw.lines().map(strip_ansi_codes).collect();

    let (_, profile) = config.get_tool(tool)?;
    let output = config.session_options(&profile).classifier.classify(&lines);

    if json {
        super::print_json(&output)?;
    } else {
        println!("{}", output);
        for (i, choice) in output.choices().iter().enumerate() {
            println!("  [{}] {}", i + 1, choice);
        }
    }
    Ok(())
}
