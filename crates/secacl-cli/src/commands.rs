//! Handlers for each `secacl` subcommand.
//!
//! Handlers write their results to the supplied writer so the binary can
//! target stdout while tests capture output in memory.

use std::io::Write;

use secacl_core::{AccessControl, AccessControlFlags, BiometricEnrollment, Envelope, Protection};

use crate::blob::{BlobEncoding, decode_blob, encode_blob};
use crate::cli::{Cli, Command, ConfigAction};
use crate::config::{OutputFormat, SecaclConfig};
use crate::error::{Error, Result};

/// Runs the parsed command line against the effective configuration.
pub fn run<W: Write>(cli: &Cli, config: &SecaclConfig, out: &mut W) -> Result<()> {
    let encoding = cli.encoding.unwrap_or(config.encoding);
    match &cli.command {
        Command::Decode { blob, format } => {
            let acl = load_object(blob, encoding)?;
            cmd_decode(&acl, format.unwrap_or(config.format), out)
        }
        Command::Describe { blob } => {
            let acl = load_object(blob, encoding)?;
            write!(out, "{}", acl.describe())?;
            Ok(())
        }
        Command::Constraint {
            blob,
            operation,
            describe,
        } => {
            let acl = load_object(blob, encoding)?;
            cmd_constraint(&acl, operation, *describe, encoding, out)
        }
        Command::Create {
            protection,
            flags,
            biometric_group,
            biometric_hash,
            bound,
        } => {
            let acl = build_object(
                protection,
                flags,
                biometric_group.as_deref(),
                biometric_hash.as_deref(),
                *bound,
            )?;
            writeln!(out, "{}", encode_blob(&acl.to_bytes(), encoding))?;
            Ok(())
        }
        Command::Envelope {
            blob,
            protection,
            require_password,
            bound,
        } => {
            let bytes = read_blob(blob, encoding)?;
            cmd_envelope(
                &bytes,
                protection.as_deref(),
                *require_password,
                *bound,
                encoding,
                out,
            )
        }
        Command::Config { action } => cmd_config(cli.config.as_deref(), config, action, out),
    }
}

/// Reads blob text from the argument, or from stdin when it is `-`.
fn read_blob(arg: &str, encoding: BlobEncoding) -> Result<Vec<u8>> {
    if arg == "-" {
        let text = std::io::read_to_string(std::io::stdin())?;
        decode_blob(&text, encoding)
    } else {
        decode_blob(arg, encoding)
    }
}

fn load_object(arg: &str, encoding: BlobEncoding) -> Result<AccessControl> {
    let bytes = read_blob(arg, encoding)?;
    Ok(AccessControl::from_bytes(&bytes)?)
}

fn cmd_decode<W: Write>(acl: &AccessControl, format: OutputFormat, out: &mut W) -> Result<()> {
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(acl)?)?,
        OutputFormat::Text => write!(out, "{}", acl.describe())?,
    }
    Ok(())
}

fn cmd_constraint<W: Write>(
    acl: &AccessControl,
    operation: &str,
    describe: bool,
    encoding: BlobEncoding,
    out: &mut W,
) -> Result<()> {
    let constraint = acl.require_constraint(operation)?;
    if describe {
        writeln!(out, "{constraint}")?;
    } else {
        writeln!(out, "{}", encode_blob(&constraint.to_bytes(), encoding))?;
    }
    Ok(())
}

/// Builds an object from flag names the way `create` does.
pub fn build_object(
    protection: &str,
    flag_names: &[String],
    biometric_group: Option<&str>,
    biometric_hash: Option<&str>,
    bound: bool,
) -> Result<AccessControl> {
    let protection: Protection = protection.parse()?;
    let mut flags = AccessControlFlags::NONE;
    for name in flag_names {
        flags |= name.parse::<AccessControlFlags>()?;
    }

    let enrollment = match biometric_group {
        Some(group) => {
            let group = decode_blob(group, BlobEncoding::Hex)?;
            let hash = match biometric_hash {
                Some(hash) => decode_blob(hash, BlobEncoding::Hex)?,
                None => Vec::new(),
            };
            Some(BiometricEnrollment::new(group, hash))
        }
        None if biometric_hash.is_some() => {
            return Err(Error::Blob(
                "--biometric-hash needs --biometric-group".to_string(),
            ));
        }
        None => None,
    };

    let mut acl = AccessControl::with_flags(protection, flags, enrollment.as_ref())?;
    acl.set_bound(bound);
    Ok(acl)
}

fn cmd_envelope<W: Write>(
    bytes: &[u8],
    protection: Option<&str>,
    require_password: Option<bool>,
    bound: Option<bool>,
    encoding: BlobEncoding,
    out: &mut W,
) -> Result<()> {
    let mut envelope = Envelope::peek(bytes)?;
    if protection.is_none() && require_password.is_none() && bound.is_none() {
        writeln!(out, "{}", serde_json::to_string_pretty(&envelope)?)?;
        return Ok(());
    }

    if let Some(tag) = protection {
        envelope.protection = Some(tag.parse()?);
    }
    if let Some(require_password) = require_password {
        envelope.require_password = require_password;
    }
    if let Some(bound) = bound {
        envelope.bound = bound;
    }
    let rewritten = envelope.apply(bytes)?;
    tracing::debug!(?envelope, "rewrote envelope");
    writeln!(out, "{}", encode_blob(&rewritten, encoding))?;
    Ok(())
}

fn cmd_config<W: Write>(
    config_path: Option<&str>,
    config: &SecaclConfig,
    action: &ConfigAction,
    out: &mut W,
) -> Result<()> {
    match action {
        ConfigAction::Path => {
            let path = SecaclConfig::resolve_config_path(config_path).ok_or_else(|| {
                Error::config("Could not determine config directory for this platform")
            })?;
            writeln!(out, "{}", path.display())?;
            if !path.exists() {
                eprintln!(
                    "(file does not exist, run `{} config init` to create it)",
                    SecaclConfig::project_name()
                );
            }
        }
        ConfigAction::Show => write!(out, "{}", config.to_toml_string()?)?,
        ConfigAction::Init { file, force } => {
            let path = match file.as_deref().or(config_path) {
                Some(path) => std::path::PathBuf::from(path),
                None => SecaclConfig::default_config_path()
                    .ok_or_else(|| Error::config("Could not determine config directory"))?,
            };
            SecaclConfig::write_default(&path, *force)?;
            writeln!(out, "Config file created at {}", path.display())?;
        }
    }
    Ok(())
}
