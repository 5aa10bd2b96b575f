use std::io::Write;

use anyhow::{Context as _, Result, anyhow};
use chrono::DateTime;
use chrono_tz::Tz;
use clair_uplink::measurement::Sample;
use csv::Writer;
use uuid::Uuid;

const HEADER: [&str; 6] = [
    "node",
    "timestamp_s",
    "measured_at",
    "co2_ppm",
    "temperature_celsius",
    "rel_humidity_percent",
];

pub fn write_samples<W: Write>(
    writer: W,
    node: Option<Uuid>,
    samples: &[Sample],
    timezone: Tz,
) -> Result<()> {
    let mut writer = Writer::from_writer(writer);

    writer
        .write_record(HEADER)
        .context("failed to write CSV header")?;

    let node = node.map(|n| n.to_string()).unwrap_or_default();
    for sample in samples {
        let secs = sample.timestamp().secs();
        let measured_at = DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| anyhow!("timestamp out of range: {secs}"))?
            .with_timezone(&timezone);

        writer
            .write_record([
                node.clone(),
                secs.to_string(),
                measured_at.to_rfc3339(),
                sample.co2().0.to_string(),
                sample
                    .temperature()
                    .map(|t| t.0.to_string())
                    .unwrap_or_default(),
                sample
                    .rel_humidity_percent()
                    .map(|h| h.to_string())
                    .unwrap_or_default(),
            ])
            .with_context(|| format!("failed to write CSV record: {sample}"))?;
    }

    writer.flush().context("failed to flush CSV output")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use clair_uplink::measurement::{Co2, RelativeHumidity, Temperature, Timestamp};

    use super::*;

    #[test]
    fn test_write_samples() {
        let samples = [
            Sample::co2_only(Timestamp::from_secs(1598966251), Co2(450)),
            Sample::new(
                Timestamp::from_secs(1598966251),
                Co2(539),
                Temperature(19.3),
                RelativeHumidity(85.1),
            ),
        ];

        let mut out = Vec::new();
        write_samples(&mut out, None, &samples, chrono_tz::Europe::Berlin).unwrap();

        let out = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[0],
            "node,timestamp_s,measured_at,co2_ppm,temperature_celsius,rel_humidity_percent"
        );
        assert_eq!(lines[1], ",1598966251,2020-09-01T15:17:31+02:00,450,,");
        assert_eq!(lines[2], ",1598966251,2020-09-01T15:17:31+02:00,539,19.3,85");
    }
}
