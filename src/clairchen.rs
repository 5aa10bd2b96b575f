//! Clairchen uplink decoding.
//!
//! An uplink is one header byte followed by 2-byte sample records, oldest
//! first:
//!
//! ```text
//! header:  vv iii hhh   version (0), message id (0), sample count - 1
//! record:  cccccccc tttttrrr
//!          CO2 = c * 20 ppm, temperature = t °C, humidity = r * 10 + 10 %
//! ```

use tracing::debug;

use crate::error::{PayloadError, Result};
use crate::mcs::{LoRaWanMcs, PayloadInfo, PayloadSpecification};
use crate::measurement::{Co2, RelativeHumidity, Sample, Temperature, Timestamp};

// Only the SF9BW125 row is observed from deployed devices.
pub static PROTOCOL_PAYLOAD_SPECIFICATION: PayloadSpecification = PayloadSpecification::new([
    // SF7BW250
    PayloadInfo {
        airtime: 0.030976,
        measurement_count: 1,
        measurement_interval: 60,
    },
    // SF7BW125
    PayloadInfo {
        airtime: 0.061952,
        measurement_count: 1,
        measurement_interval: 120,
    },
    // SF8BW125
    PayloadInfo {
        airtime: 0.113152,
        measurement_count: 2,
        measurement_interval: 154,
    },
    // SF9BW125
    PayloadInfo {
        airtime: 0.205824,
        measurement_count: 3,
        measurement_interval: 178,
    },
    // SF10BW125
    PayloadInfo {
        airtime: 0.370688,
        measurement_count: 4,
        measurement_interval: 247,
    },
    // SF11BW125
    PayloadInfo {
        airtime: 0.823296,
        measurement_count: 6,
        measurement_interval: 296,
    },
    // SF12BW125
    PayloadInfo {
        airtime: 1.482752,
        measurement_count: 8,
        measurement_interval: 329,
    },
]);

const SUPPORTED_VERSION: u8 = 0;
const MEASUREMENT_MESSAGE_ID: u8 = 0;
const RECORD_SIZE: usize = 2;
const CO2_SCALE: u16 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    pub message_id: u8,
    pub message_header: u8,
}

impl Header {
    /// Number of sample records announced by the header.
    pub fn sample_count(&self) -> usize {
        self.message_header as usize + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedRecord {
    pub co2: Co2,
    pub temperature: Temperature,
    pub relative_humidity: RelativeHumidity,
}

/// Decodes a Clairchen uplink received at `rx_time` over `mcs`.
///
/// The most recent sample is stamped with `rx_time`; earlier samples are
/// spaced by the MCS's measurement interval.
pub fn decode_payload(
    payload: &[u8],
    rx_time: Timestamp,
    mcs: LoRaWanMcs,
) -> Result<Vec<Sample>> {
    let records = decode_measurements(payload)?;

    let interval = PROTOCOL_PAYLOAD_SPECIFICATION
        .get(mcs)
        .measurement_interval;
    debug!(
        "Clairchen: {} samples at {} s interval ({mcs})",
        records.len(),
        interval
    );

    let last = records.len() as i64 - 1;
    records
        .into_iter()
        .enumerate()
        .map(|(i, r)| {
            let timestamp = rx_time
                .checked_before((last - i as i64) * interval)
                .ok_or_else(|| {
                    PayloadError::content(format!("receive time out of range: {rx_time}"))
                })?;
            Ok(Sample::new(
                timestamp,
                r.co2,
                r.temperature,
                r.relative_humidity,
            ))
        })
        .collect()
}

pub fn decode_header(v: u8) -> Header {
    Header {
        version: (v & 0b1100_0000) >> 6,
        message_id: (v & 0b0011_1000) >> 3,
        message_header: v & 0b0000_0111,
    }
}

/// Validates the header and decodes every sample record, in transmission
/// order.
pub fn decode_measurements(payload: &[u8]) -> Result<Vec<DecodedRecord>> {
    let Some((&header_raw, mut data)) = payload.split_first() else {
        return Err(PayloadError::format("no header byte"));
    };

    let header = decode_header(header_raw);
    debug!(
        "Clairchen header: version {}, message id {}, message header {}",
        header.version, header.message_id, header.message_header
    );

    if header.version != SUPPORTED_VERSION {
        return Err(PayloadError::content(format!(
            "unsupported protocol version: {}",
            header.version
        )));
    }
    if header.message_id != MEASUREMENT_MESSAGE_ID {
        return Err(PayloadError::content(format!(
            "unsupported message id: {}",
            header.message_id
        )));
    }

    let mut records = Vec::with_capacity(header.sample_count());
    while !data.is_empty() {
        let (record, rest) = decode_sample(data)?;
        records.push(record);
        data = rest;
    }

    if records.len() != header.sample_count() {
        return Err(PayloadError::content(format!(
            "sample count mismatch: header announces {}, payload carries {}",
            header.sample_count(),
            records.len()
        )));
    }

    Ok(records)
}

/// Decodes one 2-byte record and returns the unconsumed rest of `data`.
pub fn decode_sample(data: &[u8]) -> Result<(DecodedRecord, &[u8])> {
    let Some((record, rest)) = data.split_first_chunk::<RECORD_SIZE>() else {
        return Err(PayloadError::format(format!(
            "fewer than {RECORD_SIZE} bytes remaining: {}",
            data.len()
        )));
    };

    let co2 = Co2(record[0] as u16 * CO2_SCALE);
    let temperature = Temperature(((record[1] & 0b1111_1000) >> 3) as f32);
    let relative_humidity = RelativeHumidity(((record[1] & 0b0000_0111) * 10 + 10) as f32);

    Ok((
        DecodedRecord {
            co2,
            temperature,
            relative_humidity,
        },
        rest,
    ))
}
