use macaddr::MacAddr8;

use crate::device::Protocol;
use crate::error::Result;
use crate::mcs::LoRaWanMcs;
use crate::measurement::{Sample, Timestamp};
use crate::{clairchen, ers, oy1012};

/// Uplink port ERS sensors send on unless configured otherwise.
pub const DEFAULT_UPLINK_PORT: u8 = 5;

/// The parts of a network server uplink the codecs care about.
#[derive(Debug, Clone)]
pub struct UplinkMessage {
    /// Application payload, base64-decoded and stripped of MAC framing.
    pub payload: Vec<u8>,

    pub device_eui: MacAddr8,

    pub received_at: Timestamp,

    pub port: u8,

    pub mcs: LoRaWanMcs,
}

/// Decodes an uplink with the codec of `protocol`, returning its samples
/// oldest first.
pub fn decode_uplink(protocol: Protocol, message: &UplinkMessage) -> Result<Vec<Sample>> {
    decode_payload(protocol, &message.payload, message.received_at, message.mcs)
}

pub fn decode_payload(
    protocol: Protocol,
    payload: &[u8],
    received_at: Timestamp,
    mcs: LoRaWanMcs,
) -> Result<Vec<Sample>> {
    match protocol {
        Protocol::Clairchen => clairchen::decode_payload(payload, received_at, mcs),
        Protocol::Ers => ers::decode_payload(payload, received_at),
        Protocol::Oy1012 => oy1012::decode_payload(payload, received_at),
    }
}
