use super::commands::action::ActionCommand;
use super::commands::records::{
    AssociateCommand, CreateCommand, DeleteCommand, DisassociateCommand, FetchCommand, GetCommand,
    ListCommand, UpdateCommand,
};
use super::commands::request::RequestCommand;
use super::commands::settings::ConfigCommands;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dynamics-webapi")]
#[command(about = "Issue requests against the Microsoft Dynamics 365 Web API")]
#[command(version)]
pub struct Cli {
    /// Log requests and responses to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Organization URL, overriding the config file and DYNAMICS_HOST
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Keep the configured API version instead of asking the server
    #[arg(long, global = true)]
    pub no_discover: bool,

    /// Impersonate the configured caller id
    #[arg(long, global = true)]
    pub elevated: bool,

    /// Do not print failure notifications
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ask the server for its Web API version
    Version,
    /// Retrieve one record by id
    Get(GetCommand),
    /// Retrieve records with an OData query string
    List(ListCommand),
    /// Run a FetchXML query
    Fetch(FetchCommand),
    /// Create a record
    Create(CreateCommand),
    /// Update a record
    Update(UpdateCommand),
    /// Delete a record
    Delete(DeleteCommand),
    /// Link two records through a navigation property
    Associate(AssociateCommand),
    /// Remove a link between two records
    Disassociate(DisassociateCommand),
    /// Invoke a bound or unbound action
    Action(ActionCommand),
    /// Send a raw request
    Request(RequestCommand),
    /// Configuration management
    Config(ConfigCommands),
}
