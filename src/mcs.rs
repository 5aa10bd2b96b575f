use std::{fmt, str::FromStr};

use anyhow::{Error, bail};

/// LoRaWAN EU-868 modulation and coding schemes, ordered by increasing
/// airtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LoRaWanMcs {
    Sf7Bw250,
    Sf7Bw125,
    Sf8Bw125,
    Sf9Bw125,
    Sf10Bw125,
    Sf11Bw125,
    Sf12Bw125,
}

impl LoRaWanMcs {
    pub const ALL: [LoRaWanMcs; 7] = [
        LoRaWanMcs::Sf7Bw250,
        LoRaWanMcs::Sf7Bw125,
        LoRaWanMcs::Sf8Bw125,
        LoRaWanMcs::Sf9Bw125,
        LoRaWanMcs::Sf10Bw125,
        LoRaWanMcs::Sf11Bw125,
        LoRaWanMcs::Sf12Bw125,
    ];

    /// Assumed when an uplink carries no radio metadata, e.g. a simulated
    /// uplink.
    pub const FALLBACK: LoRaWanMcs = LoRaWanMcs::Sf9Bw125;

    pub fn as_str(&self) -> &'static str {
        match self {
            LoRaWanMcs::Sf7Bw250 => "SF7BW250",
            LoRaWanMcs::Sf7Bw125 => "SF7BW125",
            LoRaWanMcs::Sf8Bw125 => "SF8BW125",
            LoRaWanMcs::Sf9Bw125 => "SF9BW125",
            LoRaWanMcs::Sf10Bw125 => "SF10BW125",
            LoRaWanMcs::Sf11Bw125 => "SF11BW125",
            LoRaWanMcs::Sf12Bw125 => "SF12BW125",
        }
    }

    pub fn spreading_factor(&self) -> u8 {
        match self {
            LoRaWanMcs::Sf7Bw250 | LoRaWanMcs::Sf7Bw125 => 7,
            LoRaWanMcs::Sf8Bw125 => 8,
            LoRaWanMcs::Sf9Bw125 => 9,
            LoRaWanMcs::Sf10Bw125 => 10,
            LoRaWanMcs::Sf11Bw125 => 11,
            LoRaWanMcs::Sf12Bw125 => 12,
        }
    }

    /// Maps a TTN v3 EU-868 data rate index (DR0..DR6).
    pub fn from_data_rate_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(LoRaWanMcs::Sf12Bw125),
            1 => Some(LoRaWanMcs::Sf11Bw125),
            2 => Some(LoRaWanMcs::Sf10Bw125),
            3 => Some(LoRaWanMcs::Sf9Bw125),
            4 => Some(LoRaWanMcs::Sf8Bw125),
            5 => Some(LoRaWanMcs::Sf7Bw125),
            6 => Some(LoRaWanMcs::Sf7Bw250),
            _ => None,
        }
    }

    /// Resolves the MCS from an uplink's data rate name, falling back to
    /// [`LoRaWanMcs::FALLBACK`] when it is missing or unknown.
    pub fn resolve(data_rate: Option<&str>) -> Self {
        match data_rate.map(str::parse::<LoRaWanMcs>) {
            Some(Ok(mcs)) => mcs,
            Some(Err(err)) => {
                tracing::warn!(
                    "{err:#}, assuming {}",
                    LoRaWanMcs::FALLBACK.as_str()
                );
                LoRaWanMcs::FALLBACK
            }
            None => {
                tracing::warn!(
                    "uplink without data rate, assuming simulated uplink on {}",
                    LoRaWanMcs::FALLBACK.as_str()
                );
                LoRaWanMcs::FALLBACK
            }
        }
    }
}

impl fmt::Display for LoRaWanMcs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoRaWanMcs {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SF7BW250" => Ok(LoRaWanMcs::Sf7Bw250),
            "SF7BW125" => Ok(LoRaWanMcs::Sf7Bw125),
            "SF8BW125" => Ok(LoRaWanMcs::Sf8Bw125),
            "SF9BW125" => Ok(LoRaWanMcs::Sf9Bw125),
            "SF10BW125" => Ok(LoRaWanMcs::Sf10Bw125),
            "SF11BW125" => Ok(LoRaWanMcs::Sf11Bw125),
            "SF12BW125" => Ok(LoRaWanMcs::Sf12Bw125),
            _ => bail!("unknown data rate: {}", s),
        }
    }
}

/// Radio and firmware timing of one protocol at one MCS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayloadInfo {
    /// Airtime of one uplink in seconds.
    pub airtime: f64,

    /// Samples carried per uplink.
    pub measurement_count: usize,

    /// Seconds between two consecutive samples.
    pub measurement_interval: i64,
}

/// A protocol's static MCS timing table, one entry per MCS in
/// [`LoRaWanMcs::ALL`] order.
#[derive(Debug)]
pub struct PayloadSpecification([PayloadInfo; 7]);

impl PayloadSpecification {
    pub const fn new(entries: [PayloadInfo; 7]) -> Self {
        Self(entries)
    }

    pub fn get(&self, mcs: LoRaWanMcs) -> &PayloadInfo {
        &self.0[mcs as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (LoRaWanMcs, &PayloadInfo)> {
        LoRaWanMcs::ALL.into_iter().zip(self.0.iter())
    }

    /// The first entry, in MCS order, that carries `measurement_count`
    /// samples per uplink.
    pub fn by_measurement_count(&self, measurement_count: usize) -> Option<&PayloadInfo> {
        self.0
            .iter()
            .find(|info| info.measurement_count == measurement_count)
    }
}
