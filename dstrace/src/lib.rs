pub mod cli;
pub mod confluence;
pub mod load_config;

pub use cli::{run, Cli, Commands};
