//! voice-seal - seal RTP packets for a voice relay
//!
//! Reads one hex-encoded RTP packet per line from stdin and writes the
//! sealed packet as hex to stdout. Logs go to stderr.
//!
//! ```text
//! voice-seal --config voice.toml < packets.hex
//! voice-seal --scheme suffix --key-hex <64 hex chars> < packets.hex
//! voice-seal --generate-key
//! ```

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use voice_crypto::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "voice-seal")]
#[command(about = "Seal RTP packets with XSalsa20-Poly1305", long_about = None)]
struct Args {
    /// TOML configuration file (encryption mode and key)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Encryption mode, overrides the config file
    #[arg(short, long)]
    scheme: Option<Scheme>,

    /// Secret key as 64 hex characters, overrides the config file
    #[arg(short, long)]
    key_hex: Option<String>,

    /// Print a random key as hex and exit
    #[arg(long)]
    generate_key: bool,
}

fn load_config(args: &Args) -> anyhow::Result<EncryptorConfig> {
    let mut config = match &args.config {
        Some(path) => EncryptorConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => EncryptorConfig::default(),
    };

    if let Some(scheme) = args.scheme {
        config.encryption = scheme;
    }
    if let Some(key_hex) = &args.key_hex {
        config.key = hex::decode(key_hex.trim()).context("decoding --key-hex")?;
    }
    if config.key.is_empty() {
        bail!("no key given, use --config or --key-hex");
    }

    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    if args.generate_key {
        println!("{}", hex::encode(SecretKey::generate().as_bytes()));
        return Ok(());
    }

    let config = load_config(&args)?;
    tracing::info!(encryption = %config.encryption, "voice-seal starting");

    let mut encryptor = config.build()?;
    encryptor.start()?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut sealed_count = 0u64;
    let mut dropped_count = 0u64;

    for (line_no, line) in stdin.lock().lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let packet = match hex::decode(line) {
            Ok(packet) => packet,
            Err(e) => {
                tracing::warn!(line = line_no + 1, error = %e, "skipping malformed hex");
                dropped_count += 1;
                continue;
            }
        };

        match encryptor.encrypt_to_vec(&packet) {
            Ok(sealed) => {
                writeln!(out, "{}", hex::encode(sealed))?;
                sealed_count += 1;
            }
            Err(e) if !e.is_fatal() => {
                tracing::warn!(line = line_no + 1, error = %e, "dropping packet");
                dropped_count += 1;
            }
            Err(e) => return Err(e).context("encryption failed, aborting stream"),
        }
    }

    out.flush()?;
    encryptor.stop();
    tracing::info!(sealed = sealed_count, dropped = dropped_count, "voice-seal finished");
    Ok(())
}
