use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;
use dynamics_webapi::config::Config;

#[derive(Args)]
pub struct ConfigCommands {
    #[command(subcommand)]
    pub command: ConfigSubcommands,
}

#[derive(Subcommand)]
pub enum ConfigSubcommands {
    /// Show current settings
    Show,
    /// Get the value of a specific setting
    Get {
        /// Setting name
        name: String,
    },
    /// Set the value of a specific setting
    Set {
        /// Setting name
        name: String,
        /// Setting value
        value: String,
    },
    /// Print the config file location
    Path,
}

pub fn handle_config_command(args: &ConfigCommands, config: &mut Config) -> Result<()> {
    match &args.command {
        ConfigSubcommands::Show => {
            for name in Config::setting_names() {
                let value = config.get(name)?;
                let shown = if value.is_empty() { "(not set)".dimmed().to_string() } else { value };
                println!("{:<22} {}", name.bold(), shown);
            }
        }
        ConfigSubcommands::Get { name } => println!("{}", config.get(name)?),
        ConfigSubcommands::Set { name, value } => {
            config.set(name, value)?;
            config.save()?;
            println!("{} {} updated", "✓".bright_green(), name.cyan());
        }
        ConfigSubcommands::Path => println!("{}", Config::get_config_path()?.display()),
    }
    Ok(())
}
