//! Command-line argument definitions.

use clap::{Parser, Subcommand};

use crate::blob::BlobEncoding;
use crate::config::OutputFormat;

/// Inspect and build encoded access-control objects
#[derive(Parser, Debug)]
#[command(name = "secacl", version)]
#[command(about = "Inspect and build encoded access-control objects", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SECACL_CONFIG", global = true)]
    pub config: Option<String>,

    /// Text encoding of blob arguments and output [default: from config]
    #[arg(short, long, value_enum, global = true)]
    pub encoding: Option<BlobEncoding>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a blob and print the object
    Decode {
        /// Encoded object, or `-` to read from stdin
        blob: String,

        /// Output format [default: from config]
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Print a human-readable summary of a blob
    Describe {
        /// Encoded object, or `-` to read from stdin
        blob: String,
    },

    /// Print the constraint attached to one operation
    Constraint {
        /// Encoded object, or `-` to read from stdin
        blob: String,

        /// Operation identifier, e.g. `od` or `osgn`
        #[arg(short, long)]
        operation: String,

        /// Print the constraint summary instead of its encoding
        #[arg(long)]
        describe: bool,
    },

    /// Build an object from access-control flags and print its encoding
    Create {
        /// Accessibility class (tag, constant name, or kebab-case name)
        #[arg(short, long)]
        protection: String,

        /// Flag name, repeatable (e.g. `biometryAny`, `or`, `devicePasscode`)
        #[arg(short = 'F', long = "flag")]
        flags: Vec<String>,

        /// Biometric enrollment group, as hex
        #[arg(long)]
        biometric_group: Option<String>,

        /// Biometric enrollment state hash, as hex
        #[arg(long)]
        biometric_hash: Option<String>,

        /// Mark the object as bound to this device's authentication context
        #[arg(long)]
        bound: bool,
    },

    /// Show or rewrite the header of a blob
    Envelope {
        /// Encoded object, or `-` to read from stdin
        blob: String,

        /// New accessibility class
        #[arg(short, long)]
        protection: Option<String>,

        /// New application-password flag
        #[arg(long)]
        require_password: Option<bool>,

        /// New bound flag
        #[arg(long)]
        bound: Option<bool>,
    },

    /// Configuration file management
    Config {
        /// Config operation
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path
    Path,
    /// Print the effective configuration as TOML
    Show,
    /// Create a default configuration file
    Init {
        /// Where to write the file [default: platform config dir]
        #[arg(long)]
        file: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
