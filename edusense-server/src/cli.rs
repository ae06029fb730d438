use clap::{Parser, Subcommand};

const HELP_EPILOG: &str = "Environment variables:
  CONFIG_PATH  Path to the YAML config file (default: config.yaml)
  PORT         Listen port; overrides listen_port from the config
  RUST_LOG     Tracing filter, e.g. info or edusense_server=debug
";

#[derive(Parser, Debug)]
#[command(version, about = "EduSense school portal server", after_help = HELP_EPILOG)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Hash a password for use in the config file
    HashPassword {
        /// Plaintext password to hash
        password: String,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
