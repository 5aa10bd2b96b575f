use base64::{Engine, engine::general_purpose::STANDARD};
use tracing::debug;

use crate::error::{PayloadError, Result};
use crate::ers::{self, ErsParameterSet};
use crate::uplink::UplinkMessage;

/// A payload to transmit to a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downlink {
    pub port: u8,

    pub payload: Vec<u8>,
}

impl Downlink {
    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.payload)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.payload)
    }
}

/// Builds the parameter downlink for an ERS device whose uplink does not
/// carry the sample count its MCS calls for. Returns `None` when the device
/// is already configured correctly.
///
/// ERS devices listen for configuration on their uplink port + 1, so an
/// uplink on port 255 has no configuration port.
pub fn ers_configuration(message: &UplinkMessage) -> Result<Option<Downlink>> {
    if ers::is_conforming(&message.payload, message.mcs)? {
        debug!("no change in uplink transmission parameters needed");
        return Ok(None);
    }

    let port = message.port.checked_add(1).ok_or_else(|| {
        PayloadError::content(format!("no downlink port after uplink port {}", message.port))
    })?;

    let parameter_set = ErsParameterSet::for_mcs(message.mcs);
    debug!("new parameter set for {}: {parameter_set:?}", message.mcs);

    let downlink = Downlink {
        port,
        payload: ers::encode_parameter_set(&parameter_set),
    };
    debug!(
        "downlink payload {} ({}) on port {}",
        downlink.to_hex(),
        downlink.to_base64(),
        downlink.port
    );

    Ok(Some(downlink))
}

#[cfg(test)]
mod tests {
    use macaddr::MacAddr8;

    use super::*;
    use crate::mcs::LoRaWanMcs;
    use crate::measurement::Timestamp;

    fn message(payload: &str, mcs: LoRaWanMcs) -> UplinkMessage {
        UplinkMessage {
            payload: hex::decode(payload).unwrap(),
            device_eui: MacAddr8::from([0xa8, 0x17, 0x58, 0xff, 0xfe, 0x05, 0x2b, 0x0f]),
            received_at: Timestamp::from_secs(1_600_000_000),
            port: 5,
            mcs,
        }
    }

    #[test]
    fn test_conforming_uplink_needs_no_downlink() {
        let message = message("0600CD0600CE", LoRaWanMcs::Sf9Bw125);
        assert_eq!(ers_configuration(&message).unwrap(), None);
    }

    #[test]
    fn test_non_conforming_uplink_gets_parameter_set() {
        let message = message("0600CD0600CE", LoRaWanMcs::Sf12Bw125);
        let downlink = ers_configuration(&message).unwrap().unwrap();
        assert_eq!(downlink.port, 6);
        assert_eq!(downlink.to_hex(), "3E0F14000003B415000000001F00000005");
        assert_eq!(downlink.to_base64(), "Pg8UAAADtBUAAAAAHwAAAAU=");
    }

    #[test]
    fn test_last_uplink_port_has_no_downlink_port() {
        let mut message = message("0600CD0600CE", LoRaWanMcs::Sf12Bw125);
        message.port = u8::MAX;
        assert!(matches!(
            ers_configuration(&message),
            Err(PayloadError::Content(_))
        ));
    }

    #[test]
    fn test_malformed_uplink_is_an_error() {
        let message = message("06", LoRaWanMcs::Sf9Bw125);
        assert!(ers_configuration(&message).is_err());
    }
}
