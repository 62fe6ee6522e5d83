//! Raw request command, sending exactly what the user asked for

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use dynamics_webapi::api::{RequestDescriptor, SdkError};
use dynamics_webapi::config::Config;

use super::connect;
use crate::cli::Cli;
use crate::cli::input::{parse_header, read_json_arg};

#[derive(Args)]
pub struct RequestCommand {
    /// One of GET, POST, PATCH, PUT, DELETE
    pub verb: String,
    /// Absolute URL, or a path starting with '/' under the versioned API root
    pub uri: String,
    /// JSON body, inline or as @file
    #[arg(long)]
    pub data: Option<String>,
    /// Extra header as 'Name: value'
    #[arg(long)]
    pub header: Option<String>,
}

pub async fn handle_request(args: &RequestCommand, config: &Config, cli: &Cli) -> Result<()> {
    let mut descriptor = RequestDescriptor::parse(&args.verb, args.uri.clone())?.elevated(cli.elevated);
    if let Some(data) = &args.data {
        descriptor = descriptor.payload(read_json_arg(data)?);
    }
    if let Some(header) = &args.header {
        let (name, value) = parse_header(header)?;
        descriptor = descriptor.header(name, value);
    }
    descriptor.validate()?;

    let api = connect(config, cli).await?;
    match api.client().send(&descriptor).await {
        Ok(response) => {
            eprintln!("{} {}", "HTTP".dimmed(), response.status.to_string().bright_green());
            match response.json() {
                Ok(Some(json)) => println!(
                    "{}",
                    serde_json::to_string_pretty(&json).context("Failed to format response")?
                ),
                Ok(None) => {}
                Err(_) => println!("{}", response.body),
            }
            Ok(())
        }
        Err(SdkError::Api(error)) => {
            println!("{}", serde_json::to_string_pretty(&error).context("Failed to format error")?);
            anyhow::bail!("Request failed: {}", error)
        }
        Err(other) => Err(other.into()),
    }
}
