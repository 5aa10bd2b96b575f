use std::{fmt, str::FromStr};

use anyhow::{Context as _, Error, Result, bail};
use macaddr::MacAddr8;
use uuid::Uuid;

/// Sensor device families with their own uplink codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Clairchen,
    Ers,
    Oy1012,
}

impl Protocol {
    /// Name mixed into the device UUID derivation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Clairchen => "CLAIRCHEN",
            Protocol::Ers => "ERS",
            Protocol::Oy1012 => "TALKPOOLOY1012",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "clairchen" => Ok(Protocol::Clairchen),
            "ers" => Ok(Protocol::Ers),
            "oy1012" | "talkpool" | "talkpooloy1012" => Ok(Protocol::Oy1012),
            _ => bail!("unknown protocol: {}", s),
        }
    }
}

/// A LoRaWAN end device, identified by its EUI-64.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Device {
    pub eui: MacAddr8,

    pub protocol: Protocol,
}

impl Device {
    /// Stable identifier of this device in the ingestion backend.
    ///
    /// Name-based (v5) UUID over the protocol name followed by the raw EUI.
    pub fn uuid(&self) -> Uuid {
        let mut name = Vec::with_capacity(self.protocol.as_str().len() + 8);
        name.extend_from_slice(self.protocol.as_str().as_bytes());
        name.extend_from_slice(self.eui.as_bytes());

        Uuid::new_v5(&Uuid::NAMESPACE_OID, &name)
    }
}

/// Parses a device EUI given either as plain hex (`a81758fffe052b0f`) or in
/// separated notation (`A8:17:58:FF:FE:05:2B:0F`).
pub fn parse_device_eui(s: &str) -> Result<MacAddr8> {
    if let Ok(eui) = s.parse::<MacAddr8>() {
        return Ok(eui);
    }

    let bytes = hex::decode(s).with_context(|| format!("invalid device EUI: {s}"))?;
    let bytes: [u8; 8] = bytes.try_into().map_err(|b: Vec<u8>| {
        anyhow::anyhow!("invalid device EUI: expected 8 bytes, got {}", b.len())
    })?;

    Ok(MacAddr8::from(bytes))
}
