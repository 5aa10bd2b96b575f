//! Elsys ERS CO2 uplink decoding and configuration downlink encoding.
//!
//! An uplink is a sequence of type-tagged sensor records, most recent
//! first. Each record starts with a type byte whose top two bits (number
//! of offset bytes) must be zero and whose low six bits select the sensor:
//!
//! - `0x01` temperature, 2 bytes signed big-endian, 0.1 °C
//! - `0x02` relative humidity, 1 byte, %
//! - `0x06` CO2, 2 bytes unsigned big-endian, ppm

use tracing::debug;

use crate::error::{PayloadError, Result};
use crate::mcs::{LoRaWanMcs, PayloadInfo, PayloadSpecification};
use crate::measurement::{Co2, RelativeHumidity, Sample, Temperature, Timestamp};

pub static PROTOCOL_PAYLOAD_SPECIFICATION: PayloadSpecification = PayloadSpecification::new([
    // SF7BW250
    PayloadInfo {
        airtime: 0.033408,
        measurement_count: 2,
        measurement_interval: 326,
    },
    // SF7BW125
    PayloadInfo {
        airtime: 0.066816,
        measurement_count: 2,
        measurement_interval: 326,
    },
    // SF8BW125
    PayloadInfo {
        airtime: 0.123392,
        measurement_count: 2,
        measurement_interval: 326,
    },
    // SF9BW125
    PayloadInfo {
        airtime: 0.226304,
        measurement_count: 2,
        measurement_interval: 326,
    },
    // SF10BW125
    PayloadInfo {
        airtime: 0.370688,
        measurement_count: 3,
        measurement_interval: 356,
    },
    // SF11BW125
    PayloadInfo {
        airtime: 0.823296,
        measurement_count: 4,
        measurement_interval: 593,
    },
    // SF12BW125
    PayloadInfo {
        airtime: 1.646592,
        measurement_count: 5,
        measurement_interval: 948,
    },
]);

const SENSOR_TYPE_TEMPERATURE: u8 = 0x01;
const SENSOR_TYPE_HUMIDITY: u8 = 0x02;
const SENSOR_TYPE_CO2: u8 = 0x06;

const TEMPERATURE_LIMIT_DECI_CELSIUS: i16 = 32765;
const HUMIDITY_MAX_PERCENT: u8 = 100;
const CO2_MAX_PPM: u16 = 10000;

const DOWNLINK_HEADER: u8 = 0x3E;
const TAG_SAMPLING_PERIOD: u8 = 0x14;
const TAG_TEMPERATURE_PERIOD: u8 = 0x15;
const TAG_SEND_PERIOD: u8 = 0x1F;

/// A single decoded sensor record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    Temperature(Temperature),
    RelativeHumidity(RelativeHumidity),
    Co2(Co2),
}

/// Device settings that make an ERS sensor match its MCS's timing table
/// entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErsParameterSet {
    /// Seconds between two CO2 samples.
    pub sampling_period: u32,

    /// 1 if temperature and humidity are sampled along with CO2, else 0.
    pub temperature_period: u32,

    /// Samples batched per uplink.
    pub send_period: u32,
}

impl ErsParameterSet {
    pub fn for_mcs(mcs: LoRaWanMcs) -> Self {
        let info = PROTOCOL_PAYLOAD_SPECIFICATION.get(mcs);
        Self {
            sampling_period: info.measurement_interval as u32,
            temperature_period: if mcs < LoRaWanMcs::Sf10Bw125 { 1 } else { 0 },
            send_period: info.measurement_count as u32,
        }
    }
}

/// Decodes an ERS uplink received at `rx_time` into samples, oldest first.
pub fn decode_payload(payload: &[u8], rx_time: Timestamp) -> Result<Vec<Sample>> {
    let measurements = decode_measurements(payload)?;
    to_samples(&measurements, rx_time)
}

/// Whether an uplink carries as many samples as `mcs` calls for.
pub fn is_conforming(payload: &[u8], mcs: LoRaWanMcs) -> Result<bool> {
    let sample_count = decode_payload(payload, Timestamp::from_secs(0))?.len();
    let expected = PROTOCOL_PAYLOAD_SPECIFICATION.get(mcs).measurement_count;
    debug!("ERS: {sample_count} samples, {expected} expected at {mcs}");

    Ok(sample_count == expected)
}

pub fn encode_parameter_set(parameter_set: &ErsParameterSet) -> Vec<u8> {
    let entries = [
        encode_entry(TAG_SAMPLING_PERIOD, parameter_set.sampling_period),
        encode_entry(TAG_TEMPERATURE_PERIOD, parameter_set.temperature_period),
        encode_entry(TAG_SEND_PERIOD, parameter_set.send_period),
    ];
    let length: usize = entries.iter().map(|e| e.len()).sum();

    let mut payload = Vec::with_capacity(2 + length);
    payload.push(DOWNLINK_HEADER);
    payload.push(length as u8);
    for entry in entries {
        payload.extend_from_slice(&entry);
    }

    payload
}

fn encode_entry(tag: u8, value: u32) -> [u8; 5] {
    let [a, b, c, d] = value.to_be_bytes();
    [tag, a, b, c, d]
}

/// Decodes every sensor record in `data`, in transmission order.
pub fn decode_measurements(mut data: &[u8]) -> Result<Vec<Measurement>> {
    let mut measurements = Vec::new();

    while !data.is_empty() {
        let (measurement, rest) = decode_sensor_data(data)?;
        measurements.push(measurement);
        data = rest;
    }

    Ok(measurements)
}

/// Groups a reverse-chronological measurement list into samples and stamps
/// them, returning the samples oldest first.
///
/// Each group holds one CO2 record and, uniformly across the uplink, either
/// one temperature and one humidity record or neither. The order inside a
/// group does not matter: `[C, T, H, H, T, C]` is admissible,
/// `[C, C, T, T, H, H]` is not.
pub fn to_samples(measurements: &[Measurement], rx_time: Timestamp) -> Result<Vec<Sample>> {
    let co2_count = measurements
        .iter()
        .filter(|m| matches!(m, Measurement::Co2(_)))
        .count();

    let Some(info) = PROTOCOL_PAYLOAD_SPECIFICATION.by_measurement_count(co2_count) else {
        return Err(PayloadError::content(format!(
            "invalid number of measurement samples: {co2_count}"
        )));
    };

    let group_size = measurements.len() / co2_count;
    if group_size != 1 && group_size != 3 {
        return Err(PayloadError::content(format!(
            "invalid number of measurements: {}",
            measurements.len()
        )));
    }

    let groups: Vec<SampleGroup> = measurements
        .chunks(group_size)
        .map(SampleGroup::collect)
        .collect();

    if !groups.iter().all(|g| g.co2.len() == 1) {
        return Err(PayloadError::content("invalid order of measurements"));
    }

    let all_climate = groups
        .iter()
        .all(|g| g.temperature.len() == 1 && g.humidity.len() == 1);
    let no_climate = groups
        .iter()
        .all(|g| g.temperature.is_empty() && g.humidity.is_empty());
    if !all_climate && !no_climate {
        return Err(PayloadError::content("invalid combination of measurements"));
    }

    debug!(
        "ERS: {co2_count} samples of {group_size} measurements at {} s interval",
        info.measurement_interval
    );

    let mut samples = groups
        .into_iter()
        .enumerate()
        .map(|(i, g)| {
            let timestamp = rx_time
                .checked_before(i as i64 * info.measurement_interval)
                .ok_or_else(|| {
                    PayloadError::content(format!("receive time out of range: {rx_time}"))
                })?;
            Ok(match (g.temperature.first(), g.humidity.first()) {
                (Some(&t), Some(&h)) => Sample::new(timestamp, g.co2[0], t, h),
                _ => Sample::co2_only(timestamp, g.co2[0]),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    samples.reverse();

    Ok(samples)
}

#[derive(Debug, Default)]
struct SampleGroup {
    co2: Vec<Co2>,
    temperature: Vec<Temperature>,
    humidity: Vec<RelativeHumidity>,
}

impl SampleGroup {
    fn collect(measurements: &[Measurement]) -> Self {
        let mut group = Self::default();
        for m in measurements {
            match *m {
                Measurement::Co2(v) => group.co2.push(v),
                Measurement::Temperature(v) => group.temperature.push(v),
                Measurement::RelativeHumidity(v) => group.humidity.push(v),
            }
        }
        group
    }
}

fn decode_sensor_data(data: &[u8]) -> Result<(Measurement, &[u8])> {
    let (sensor_type, data) = decode_sensor_type(data)?;

    match sensor_type {
        SENSOR_TYPE_TEMPERATURE => decode_temperature(data)
            .map(|(v, rest)| (Measurement::Temperature(v), rest)),
        SENSOR_TYPE_HUMIDITY => {
            decode_humidity(data).map(|(v, rest)| (Measurement::RelativeHumidity(v), rest))
        }
        SENSOR_TYPE_CO2 => decode_co2(data).map(|(v, rest)| (Measurement::Co2(v), rest)),
        _ => Err(PayloadError::content(format!(
            "unsupported sensor type: 0x{sensor_type:02x}"
        ))),
    }
}

fn decode_sensor_type(data: &[u8]) -> Result<(u8, &[u8])> {
    let Some((&header, rest)) = data.split_first() else {
        return Err(PayloadError::format("no byte to decode sensor type"));
    };

    let offset_bytes = (header & 0b1100_0000) >> 6;
    if offset_bytes != 0 {
        return Err(PayloadError::content(format!(
            "offset bytes {offset_bytes} != 0 not allowed for these sensors"
        )));
    }

    Ok((header & 0b0011_1111, rest))
}

pub fn decode_temperature(data: &[u8]) -> Result<(Temperature, &[u8])> {
    let Some((&bytes, rest)) = data.split_first_chunk::<2>() else {
        return Err(PayloadError::format(
            "less than two bytes to decode temperature",
        ));
    };

    let deci_celsius = i16::from_be_bytes(bytes);
    if !(-TEMPERATURE_LIMIT_DECI_CELSIUS..=TEMPERATURE_LIMIT_DECI_CELSIUS).contains(&deci_celsius) {
        return Err(PayloadError::content(format!(
            "temperature {} not in admissible range",
            deci_celsius as f32 / 10f32
        )));
    }

    Ok((Temperature(deci_celsius as f32 / 10f32), rest))
}

pub fn decode_humidity(data: &[u8]) -> Result<(RelativeHumidity, &[u8])> {
    let Some((&humidity, rest)) = data.split_first() else {
        return Err(PayloadError::format(
            "no byte to decode relative humidity",
        ));
    };

    if humidity > HUMIDITY_MAX_PERCENT {
        return Err(PayloadError::content(format!(
            "relative humidity {humidity} > {HUMIDITY_MAX_PERCENT}"
        )));
    }

    Ok((RelativeHumidity(humidity as f32), rest))
}

pub fn decode_co2(data: &[u8]) -> Result<(Co2, &[u8])> {
    let Some((&bytes, rest)) = data.split_first_chunk::<2>() else {
        return Err(PayloadError::format("less than two bytes to decode co2"));
    };

    let co2 = u16::from_be_bytes(bytes);
    if co2 > CO2_MAX_PPM {
        return Err(PayloadError::content(format!(
            "co2 {co2} > {CO2_MAX_PPM}"
        )));
    }

    Ok((Co2(co2), rest))
}
