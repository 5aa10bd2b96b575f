//! Talkpool OY1012 uplink decoding.
//!
//! Each uplink is a single 5-byte measurement report. Temperature and
//! humidity are 12-bit fields spread over nibbles of the first three bytes,
//! CO2 is a big-endian u16 in the last two:
//!
//! ```text
//! byte 0   byte 1   byte 2   byte 3-4
//! TTTTtttt HHHHhhhh ttttHHHH CO2
//! ```

use crate::error::{PayloadError, Result};
use crate::measurement::{Co2, RelativeHumidity, Sample, Temperature, Timestamp};

const REPORT_SIZE: usize = 5;
const TEMPERATURE_OFFSET: i32 = 800;
const HUMIDITY_OFFSET: i32 = 250;

/// Decodes an OY1012 uplink into its single sample, stamped with `rx_time`.
pub fn decode_payload(payload: &[u8], rx_time: Timestamp) -> Result<Vec<Sample>> {
    let (co2, temperature, relative_humidity) = decode_measurement_report(payload)?;

    Ok(vec![Sample::new(rx_time, co2, temperature, relative_humidity)])
}

pub fn decode_measurement_report(data: &[u8]) -> Result<(Co2, Temperature, RelativeHumidity)> {
    let Ok(report) = <&[u8; REPORT_SIZE]>::try_from(data) else {
        return Err(PayloadError::format(format!(
            "OY1012 measurement report: expected {REPORT_SIZE} bytes, got {}",
            data.len()
        )));
    };

    let temperature_raw = u16::from_be_bytes([
        report[0] >> 4,
        ((report[0] << 4) & 0xf0) | ((report[2] & 0xf0) >> 4),
    ]);
    let humidity_raw = u16::from_be_bytes([
        report[1] >> 4,
        ((report[1] << 4) & 0xf0) | (report[2] & 0x0f),
    ]);
    let co2 = u16::from_be_bytes([report[3], report[4]]);

    Ok((
        Co2(co2),
        Temperature((temperature_raw as i32 - TEMPERATURE_OFFSET) as f32 / 10f32),
        RelativeHumidity((humidity_raw as i32 - HUMIDITY_OFFSET) as f32 / 10f32),
    ))
}
