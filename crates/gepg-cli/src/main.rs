//! gepg: diagnostics for GePG key material and envelopes.
//!
//! Keys and endpoints come from the `GEPG_*` environment variables read by
//! [`GepgConfig::from_env`].

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use gepg_protocol::domain::{envelope, status};
use gepg_protocol::{check_key_pair, sign, verify, GepgConfig, KeyMaterial};
use gepg_telemetry::{init_telemetry, TelemetryConfig};

/// GePG client diagnostics
#[derive(Parser, Debug)]
#[command(name = "gepg")]
#[command(about = "Inspect GePG key material, status codes and signed envelopes")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load both keys and check they form a working pair
    CheckKeys,

    /// Print the meaning of a status code
    Status {
        /// Status code, e.g. 7101
        code: u16,
    },

    /// Sign a canonical payload file and print the envelope
    Sign {
        /// File holding the canonical payload element
        file: PathBuf,
    },

    /// Verify an envelope file and print its payload
    Verify {
        /// File holding a `<Gepg>` envelope
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut telemetry = TelemetryConfig::from_env();
    if cli.verbose {
        telemetry = telemetry.with_log_level("debug");
    }
    let _guard = init_telemetry(telemetry).context("Failed to initialize telemetry")?;

    let stdout = io::stdout();
    run(cli.command, &mut stdout.lock())
}

fn run(command: Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Status { code } => {
            let meaning = status::lookup(code)?;
            writeln!(out, "{code} {meaning}")?;
        }
        Command::CheckKeys => {
            let keys = load_keys()?;
            if !check_key_pair(keys.private_key(), keys.public_key(), keys.algorithm()) {
                bail!(
                    "Private and public keys do not form a pair under {}",
                    keys.algorithm()
                );
            }
            writeln!(out, "Key pair OK ({})", keys.algorithm())?;
        }
        Command::Sign { file } => {
            let keys = load_keys()?;
            let envelope = sign_file(&file, &keys)?;
            out.write_all(&envelope)?;
            writeln!(out)?;
        }
        Command::Verify { file } => {
            let keys = load_keys()?;
            let payload = verify_file(&file, &keys)?;
            out.write_all(&payload)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn load_keys() -> Result<KeyMaterial> {
    let config = GepgConfig::from_env().context("Incomplete GEPG_* configuration")?;
    let keys = config
        .load_key_material()
        .context("Failed to load key material")?;
    tracing::debug!(algorithm = %keys.algorithm(), "Key material ready");
    Ok(keys)
}

fn sign_file(path: &Path, keys: &KeyMaterial) -> Result<Vec<u8>> {
    let raw = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let payload = raw.trim_ascii();
    let signature = sign(payload, keys.private_key(), keys.algorithm())?;
    Ok(envelope::wrap(payload, &signature)?)
}

fn verify_file(path: &Path, keys: &KeyMaterial) -> Result<Vec<u8>> {
    let raw = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let (payload, signature) = envelope::unwrap(&raw)?.into_parts();
    if !verify(&payload, &signature, keys.public_key(), keys.algorithm()) {
        bail!("Signature verification failed for {}", path.display());
    }
    Ok(payload)
}
