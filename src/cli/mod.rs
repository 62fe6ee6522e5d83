pub mod app;
pub mod commands;
pub mod input;

pub use app::{Cli, Commands};
