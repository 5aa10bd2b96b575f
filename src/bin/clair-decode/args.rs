use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use clair_uplink::{device::Protocol, uplink::DEFAULT_UPLINK_PORT};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
pub struct Args {
    #[arg(long, env = "CLAIR_PROTOCOL")]
    pub protocol: Protocol,

    /// Application payload as hex
    #[arg(long)]
    pub payload: String,

    /// Reception time as RFC 3339, defaults to now
    #[arg(long)]
    pub received_at: Option<DateTime<FixedOffset>>,

    /// Data rate name such as SF9BW125
    #[arg(long, conflicts_with = "data_rate_index")]
    pub data_rate: Option<String>,

    /// TTN v3 EU-868 data rate index
    #[arg(long)]
    pub data_rate_index: Option<u8>,

    #[arg(long, default_value_t = DEFAULT_UPLINK_PORT)]
    pub port: u8,

    #[arg(long)]
    pub device_eui: Option<String>,

    #[arg(long, env = "TZ", default_value = "UTC")]
    pub timezone: Tz,

    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the decoded samples as CSV
    Decode,

    /// Print the ERS configuration downlink for the uplink, if one is due
    Configure,
}
