mod args;
mod csv;

use std::{io, process::ExitCode};

use anyhow::{Context as _, Result, bail};
use args::{Args, Command};
use chrono::Utc;
use clair_uplink::{
    device::{Device, Protocol, parse_device_eui},
    downlink::ers_configuration,
    mcs::LoRaWanMcs,
    measurement::Timestamp,
    uplink::{UplinkMessage, decode_uplink},
};
use clap::Parser as _;
use macaddr::MacAddr8;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::csv::write_samples;

fn main() -> ExitCode {
    let args = Args::parse();

    init_tracing(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::from(0)
}

fn run(args: Args) -> Result<()> {
    let payload = hex::decode(args.payload.replace([' ', '-', ':'], ""))
        .with_context(|| format!("failed to parse payload hex: {}", args.payload))?;

    let received_at = match args.received_at {
        Some(dt) => Timestamp::from(dt),
        None => Timestamp::from(Utc::now()),
    };

    let mcs = match args.data_rate_index {
        Some(index) => LoRaWanMcs::from_data_rate_index(index).unwrap_or_else(|| {
            warn!(
                "unknown data rate index {index}, assuming {}",
                LoRaWanMcs::FALLBACK
            );
            LoRaWanMcs::FALLBACK
        }),
        None => LoRaWanMcs::resolve(args.data_rate.as_deref()),
    };
    info!("MCS: {mcs}");

    let device = args
        .device_eui
        .as_deref()
        .map(parse_device_eui)
        .transpose()
        .context("failed to parse device EUI")?
        .map(|eui| Device {
            eui,
            protocol: args.protocol,
        });

    let message = UplinkMessage {
        payload,
        device_eui: device.map(|d| d.eui).unwrap_or_else(MacAddr8::nil),
        received_at,
        port: args.port,
        mcs,
    };

    match args.command {
        Command::Decode => {
            let samples = decode_uplink(args.protocol, &message)
                .with_context(|| format!("failed to decode {} uplink", args.protocol))?;
            info!("decoded {} samples", samples.len());

            let node = device.map(|d| d.uuid());
            write_samples(io::stdout().lock(), node, &samples, args.timezone)
                .context("failed to write samples")?;
        }
        Command::Configure => {
            if args.protocol != Protocol::Ers {
                bail!(
                    "configuration downlinks are only supported for {} devices, got {}",
                    Protocol::Ers,
                    args.protocol
                );
            }

            match ers_configuration(&message).context("failed to check ERS uplink")? {
                Some(downlink) => println!(
                    "port={} hex={} base64={}",
                    downlink.port,
                    downlink.to_hex(),
                    downlink.to_base64()
                ),
                None => println!("no configuration change needed"),
            }
        }
    }

    Ok(())
}

/// `RUST_LOG` wins over `--verbose` when set.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_level(verbose)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).without_time())
        .try_init();
}

fn default_log_level(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "warn" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_level() {
        assert_eq!(default_log_level(true), "debug");
        assert_eq!(default_log_level(false), "warn");
    }
}
