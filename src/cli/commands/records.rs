//! Record commands: get, list, fetch, create, update, delete, associate, disassociate

use anyhow::Result;
use clap::Args;
use dynamics_webapi::config::Config;

use super::{call_options, connect, print_result};
use crate::cli::Cli;
use crate::cli::input::{read_json_arg, read_text_arg};

#[derive(Args)]
pub struct GetCommand {
    /// Entity set name (e.g., accounts)
    pub entity: String,
    /// Record id, with or without braces
    pub id: String,
    /// Raw query string appended to the record URL (e.g., '?$select=name')
    #[arg(long, default_value = "")]
    pub options: String,
}

#[derive(Args)]
pub struct ListCommand {
    /// Entity set name (e.g., contacts)
    pub entity: String,
    /// Raw OData query string (e.g., '?$select=fullname&$top=10')
    #[arg(long, default_value = "")]
    pub options: String,
}

#[derive(Args)]
pub struct FetchCommand {
    /// Entity set name to query
    pub entity: String,
    /// FetchXML inline or as @file
    pub fetch_xml: String,
}

#[derive(Args)]
pub struct CreateCommand {
    /// Entity set name
    pub entity: String,
    /// JSON record inline or as @file
    pub data: String,
}

#[derive(Args)]
pub struct UpdateCommand {
    /// Entity set name
    pub entity: String,
    /// Record id
    pub id: String,
    /// JSON fields inline or as @file
    pub data: String,
}

#[derive(Args)]
pub struct DeleteCommand {
    /// Entity set name
    pub entity: String,
    /// Record id
    pub id: String,
}

#[derive(Args)]
pub struct AssociateCommand {
    /// Entity set of the source record
    pub entity: String,
    /// Source record id
    pub id: String,
    /// Collection-valued navigation property
    pub relationship: String,
    /// Entity set of the target record
    pub target_entity: String,
    /// Target record id
    pub target_id: String,
}

#[derive(Args)]
pub struct DisassociateCommand {
    /// Entity set of the source record
    pub entity: String,
    /// Source record id
    pub id: String,
    /// Navigation property
    pub relationship: String,
    /// Target record id
    pub target_id: String,
}

pub async fn handle_get(args: &GetCommand, config: &Config, cli: &Cli) -> Result<()> {
    let api = connect(config, cli).await?;
    let result = api.retrieve(&args.entity, &args.id, &args.options, call_options(cli)).await?;
    print_result("Retrieve", &result)
}

pub async fn handle_list(args: &ListCommand, config: &Config, cli: &Cli) -> Result<()> {
    let api = connect(config, cli).await?;
    let result = api.retrieve_multiple(&args.entity, &args.options, call_options(cli)).await?;
    print_result("Retrieve multiple", &result)
}

pub async fn handle_fetch(args: &FetchCommand, config: &Config, cli: &Cli) -> Result<()> {
    let fetch_xml = read_text_arg(&args.fetch_xml)?;
    let api = connect(config, cli).await?;
    let result = api.fetch(&args.entity, &fetch_xml, call_options(cli)).await?;
    print_result("Fetch", &result)
}

pub async fn handle_create(args: &CreateCommand, config: &Config, cli: &Cli) -> Result<()> {
    let data = read_json_arg(&args.data)?;
    let api = connect(config, cli).await?;
    let result = api.create(&args.entity, data, call_options(cli)).await?;
    print_result("Create", &result)
}

pub async fn handle_update(args: &UpdateCommand, config: &Config, cli: &Cli) -> Result<()> {
    let data = read_json_arg(&args.data)?;
    let api = connect(config, cli).await?;
    let result = api.update(&args.entity, &args.id, data, call_options(cli)).await?;
    print_result("Update", &result)
}

pub async fn handle_delete(args: &DeleteCommand, config: &Config, cli: &Cli) -> Result<()> {
    let api = connect(config, cli).await?;
    let result = api.delete(&args.entity, &args.id, call_options(cli)).await?;
    print_result("Delete", &result)
}

pub async fn handle_associate(args: &AssociateCommand, config: &Config, cli: &Cli) -> Result<()> {
    let api = connect(config, cli).await?;
    let result = api
        .associate(
            &args.entity,
            &args.id,
            &args.relationship,
            &args.target_entity,
            &args.target_id,
            call_options(cli),
        )
        .await?;
    print_result("Associate", &result)
}

pub async fn handle_disassociate(args: &DisassociateCommand, config: &Config, cli: &Cli) -> Result<()> {
    let api = connect(config, cli).await?;
    let result = api
        .disassociate(&args.entity, &args.id, &args.relationship, &args.target_id, call_options(cli))
        .await?;
    print_result("Disassociate", &result)
}
