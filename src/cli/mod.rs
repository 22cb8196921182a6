//! Command-line interface definitions using clap
//!
//! 运维命令：迁移、创建/删除链接、解析、打标签、签发与校验 API Key。

mod commands;

use clap::{Parser, Subcommand};

pub use commands::run_command;

/// linkpulse - short-link resolution and click analytics
#[derive(Parser)]
#[command(name = "linkpulse")]
#[command(version)]
#[command(about = "Short-link resolution and click analytics", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short = 'c', global = true, default_value = "config.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run database migrations
    Migrate,

    /// Create a short link
    CreateLink {
        /// Destination URL (http/https)
        url: String,

        /// Short code (random if omitted)
        #[arg(long)]
        code: Option<String>,

        /// Password protection
        #[arg(long)]
        password: Option<String>,

        /// Expiration time (RFC3339 or relative like "1d", "2h30m")
        #[arg(long)]
        expire: Option<String>,

        /// Owning user id
        #[arg(long)]
        owner: Option<String>,

        /// QR code image URL
        #[arg(long)]
        qr: Option<String>,
    },

    /// Resolve a short code to its destination
    Resolve {
        short_code: String,

        #[arg(long)]
        password: Option<String>,

        /// Record a click after successful resolution
        #[arg(long)]
        record: bool,

        /// User-Agent stored with the recorded click
        #[arg(long, requires = "record")]
        user_agent: Option<String>,

        /// Client IP stored with the recorded click
        #[arg(long, requires = "record")]
        ip: Option<String>,
    },

    /// Delete a short link with its click events and tags
    DeleteLink {
        short_code: String,

        /// Act as this user (required for owned links)
        #[arg(long = "as")]
        as_user: Option<String>,
    },

    /// Attach tags to a link
    Tag {
        short_code: String,

        /// Link owner
        #[arg(long)]
        owner: String,

        #[arg(required = true)]
        tags: Vec<String>,
    },

    /// Issue a new API key for a user
    IssueKey {
        user: String,

        #[arg(long)]
        name: Option<String>,

        /// Expiration time (RFC3339 or relative)
        #[arg(long)]
        expire: Option<String>,
    },

    /// Validate an API key
    ValidateKey { key: String },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
