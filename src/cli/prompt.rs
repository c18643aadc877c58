//! Prompt command implementation

use std::time::Duration;

use anyhow::Result;

use promptline::config::Config;

/// Options for a single prompt
pub struct PromptArgs {
    pub text: String,
    pub tool: Option<String>,
    pub timeout_ms: Option<u64>,
    pub fallback: Option<String>,
    pub json: bool,
}

/// Run one turn and print the classified output
pub async fn prompt_command(config: &Config, args: PromptArgs) -> Result<()> {
    let session = super::open_session(config, args.tool.as_deref())?;

    let result = match (args.timeout_ms, args.fallback.as_deref()) {
        (Some(ms), Some(fallback)) => {
            session
                .send_with_fallback(&args.text, Duration::from_millis(ms), fallback)
                .await
        }
        (Some(ms), None) => {
            session
                .send_prompt_with_timeout(&args.text, Duration::from_millis(ms))
                .await
        }
        (None, fallback) => {
            if fallback.is_some() {
                tracing::warn!("--fallback has no effect without --timeout-ms");
            }
            session.send_prompt(&args.text).await
        }
    };
    session.close().await;

    let output = result?;
    if args.json {
        super::print_json(&output)?;
    } else {
        super::print_output(&output);
    }
    Ok(())
}
