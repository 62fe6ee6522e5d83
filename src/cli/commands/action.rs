use anyhow::Result;
use clap::Args;
use dynamics_webapi::config::Config;

use super::{call_options, connect, print_result};
use crate::cli::Cli;
use crate::cli::input::read_json_arg;

#[derive(Args)]
pub struct ActionCommand {
    /// Action name (e.g., WinOpportunity, or a custom action's unique name)
    pub name: String,
    /// Entity set of the record the action is bound to
    #[arg(long, requires = "id")]
    pub entity: Option<String>,
    /// Id of the record the action is bound to
    #[arg(long, requires = "entity")]
    pub id: Option<String>,
    /// Action parameters as JSON, inline or as @file
    #[arg(long)]
    pub data: Option<String>,
}

pub async fn handle_action(args: &ActionCommand, config: &Config, cli: &Cli) -> Result<()> {
    let data = args.data.as_deref().map(read_json_arg).transpose()?;
    let api = connect(config, cli).await?;

    let result = match (&args.entity, &args.id) {
        (Some(entity), Some(id)) => {
            api.bound_action(entity, id, &args.name, data, call_options(cli)).await?
        }
        _ => api.unbound_action(&args.name, data, call_options(cli)).await?,
    };

    print_result(&args.name, &result)
}
