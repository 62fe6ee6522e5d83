use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, debug};

mod cli;

use cli::commands::{action, records, request, settings};
use cli::{Cli, Commands};
use dynamics_webapi::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if cli.verbose {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    debug!("Starting dynamics-webapi");

    let config = Config::load()?;

    match &cli.command {
        Commands::Version => cli::commands::handle_version(&config, &cli).await,
        Commands::Get(args) => records::handle_get(args, &config, &cli).await,
        Commands::List(args) => records::handle_list(args, &config, &cli).await,
        Commands::Fetch(args) => records::handle_fetch(args, &config, &cli).await,
        Commands::Create(args) => records::handle_create(args, &config, &cli).await,
        Commands::Update(args) => records::handle_update(args, &config, &cli).await,
        Commands::Delete(args) => records::handle_delete(args, &config, &cli).await,
        Commands::Associate(args) => records::handle_associate(args, &config, &cli).await,
        Commands::Disassociate(args) => records::handle_disassociate(args, &config, &cli).await,
        Commands::Action(args) => action::handle_action(args, &config, &cli).await,
        Commands::Request(args) => request::handle_request(args, &config, &cli).await,
        Commands::Config(args) => {
            // Edit the file as written, without environment overrides
            let mut file_config = Config::load_from(&Config::get_config_path()?)?;
            settings::handle_config_command(args, &mut file_config)
        }
    }
}
