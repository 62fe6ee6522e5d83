pub mod action;
pub mod records;
pub mod request;
pub mod settings;

use anyhow::{Context, Result};
use colored::*;
use dynamics_webapi::api::{
    ApiVersion, CallOptions, ExecutionResult, NotificationSink, RequestClient, WebApi, select_sink,
};
use dynamics_webapi::config::Config;
use log::{debug, warn};

use super::Cli;

/// Build a client from config and global flags, discovering the API version if enabled
pub async fn connect(config: &Config, cli: &Cli) -> Result<WebApi> {
    let mut config = config.clone();
    if let Some(host) = &cli.host {
        config.host = Some(host.clone());
    }

    let client = RequestClient::new(config.client_settings()?)
        .context("Failed to create Web API client")?
        .with_identity(config.caller_identity());

    let sink = select_sink(&config.settings.notification_prefix);
    if config.settings.discover_version && !cli.no_discover {
        discover_or_keep(&client, sink.as_ref()).await;
    }

    Ok(WebApi::new(client, sink))
}

/// Discover the server version, falling back to the configured one on failure.
/// The failure is shown on the sink so it is visible without debug logging.
pub async fn discover_or_keep(client: &RequestClient, sink: &dyn NotificationSink) -> ApiVersion {
    match client.discover_version().await {
        Ok(version) => {
            debug!("Discovered Web API version {}", version);
            version
        }
        // Keep going with the configured version; the request itself will report real problems
        Err(e) => {
            let version = client.version();
            warn!("{}; using v{}", e, version);
            sink.show(&format!("{}; using v{}", e, version));
            version
        }
    }
}

pub fn call_options(cli: &Cli) -> CallOptions {
    CallOptions {
        hide_error: cli.quiet,
        elevated: cli.elevated,
    }
}

/// Print a result as pretty JSON and turn a failed execution into an error exit
pub fn print_result(label: &str, result: &ExecutionResult) -> Result<()> {
    let output = serde_json::to_string_pretty(result).context("Failed to format result")?;
    println!("{}", output);

    if result.is_success() {
        if let Some(id) = &result.entity_id {
            eprintln!("{} {} {}", "✓".bright_green(), label, id.cyan());
        }
        Ok(())
    } else {
        anyhow::bail!("{} failed: {}", label, result.error_message().unwrap_or("unknown error"))
    }
}

pub async fn handle_version(config: &Config, cli: &Cli) -> Result<()> {
    let mut config = config.clone();
    if let Some(host) = &cli.host {
        config.host = Some(host.clone());
    }

    let client = RequestClient::new(config.client_settings()?)
        .context("Failed to create Web API client")?;
    let version = client.discover_version().await?;

    println!("{} v{}", "Web API version:".bold(), version.to_string().bright_green());
    println!("{} {}{}", "Endpoint:".bold(), client.base_url(), client.versions().path_prefix());
    Ok(())
}
