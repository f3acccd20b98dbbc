use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the blogengine binary.
#[derive(Debug, Parser)]
#[command(name = "blogengine", version, about = "Blogengine blog server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "BLOGENGINE_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath
    )]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP server.
    Serve(Box<ServeArgs>),
    /// Manage author access keys.
    Keys(KeysArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Send the session cookie only over HTTPS.
    #[arg(
        long = "secure-cookies",
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub secure_cookies: Option<bool>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Emit logs as JSON.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    #[command(flatten)]
    pub database: DatabaseOverride,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Override how many posts the index shows per page.
    #[arg(long = "posts-per-page", value_name = "COUNT")]
    pub posts_per_page: Option<u32>,
}

#[derive(Debug, Args, Clone)]
pub struct KeysArgs {
    #[command(subcommand)]
    pub command: KeysCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum KeysCommand {
    /// Issue a new author key and print its token once.
    Issue(IssueKeyArgs),
    /// Revoke an author key by its prefix.
    Revoke(RevokeKeyArgs),
}

#[derive(Debug, Args, Clone)]
pub struct IssueKeyArgs {
    /// Display name of the author holding the key.
    #[arg(long, value_name = "NAME")]
    pub name: String,

    #[command(flatten)]
    pub database: DatabaseOverride,
}

#[derive(Debug, Args, Clone)]
pub struct RevokeKeyArgs {
    /// Key prefix, as printed when the key was issued.
    #[arg(value_name = "PREFIX")]
    pub prefix: String,

    #[command(flatten)]
    pub database: DatabaseOverride,
}

impl KeysCommand {
    pub fn database(&self) -> &DatabaseOverride {
        match self {
            Self::Issue(args) => &args.database,
            Self::Revoke(args) => &args.database,
        }
    }
}
