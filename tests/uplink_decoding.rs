//! End-to-end decoding of uplinks through the protocol dispatch.

use clair_uplink::{
    PayloadError, clairchen,
    device::Protocol,
    ers,
    mcs::LoRaWanMcs,
    measurement::{Co2, Timestamp},
    uplink::{UplinkMessage, decode_payload, decode_uplink},
};
use macaddr::MacAddr8;
use proptest::prelude::*;

const RX_TIME: Timestamp = Timestamp::from_secs(1598966251);

fn uplink(payload: &str, mcs: LoRaWanMcs) -> UplinkMessage {
    UplinkMessage {
        payload: hex::decode(payload).unwrap(),
        device_eui: MacAddr8::nil(),
        received_at: RX_TIME,
        port: 5,
        mcs,
    }
}

#[test]
fn test_dispatch_clairchen() {
    let samples = decode_uplink(
        Protocol::Clairchen,
        &uplink("021BE41AE419E3", LoRaWanMcs::Sf9Bw125),
    )
    .unwrap();

    assert_eq!(samples.len(), 3);
    assert_eq!(samples[2].timestamp(), RX_TIME);
    assert!(samples.iter().all(|s| s.temperature().is_some()));
}

#[test]
fn test_dispatch_ers_ignores_mcs() {
    let payload = "0100C40234060354";
    let sf7 = decode_uplink(Protocol::Ers, &uplink(payload, LoRaWanMcs::Sf7Bw125));
    let sf12 = decode_uplink(Protocol::Ers, &uplink(payload, LoRaWanMcs::Sf12Bw125));

    // a single CO2 record matches no table entry
    assert!(matches!(sf7, Err(PayloadError::Content(_))));
    assert_eq!(sf7, sf12);
}

#[test]
fn test_dispatch_oy1012() {
    let samples =
        decode_uplink(Protocol::Oy1012, &uplink("3E441D021B", LoRaWanMcs::Sf9Bw125)).unwrap();

    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].timestamp(), RX_TIME);
    assert_eq!(samples[0].co2(), Co2(539));
    assert_eq!(samples[0].rel_humidity_percent(), Some(85));
}

#[test]
fn test_wrong_codec_is_rejected() {
    // an OY1012 report read as Clairchen has header version 0, message id 7
    let result = decode_payload(
        Protocol::Clairchen,
        &hex::decode("3E441D021B").unwrap(),
        RX_TIME,
        LoRaWanMcs::Sf9Bw125,
    );
    assert!(matches!(result, Err(PayloadError::Content(_))));
}

fn ers_payload(co2: &[u16], climate: Option<&[(i16, u8)]>) -> Vec<u8> {
    let mut payload = Vec::new();
    for (i, &c) in co2.iter().enumerate() {
        if let Some(climate) = climate {
            let (t, h) = climate[i];
            payload.push(0x01);
            payload.extend_from_slice(&t.to_be_bytes());
            payload.push(0x02);
            payload.push(h);
        }
        payload.push(0x06);
        payload.extend_from_slice(&c.to_be_bytes());
    }
    payload
}

proptest! {
    #[test]
    fn clairchen_samples_end_at_rx_time(
        records in prop::collection::vec(any::<[u8; 2]>(), 1..=8),
        mcs in prop::sample::select(LoRaWanMcs::ALL.to_vec()),
    ) {
        let mut payload = vec![(records.len() - 1) as u8];
        for record in &records {
            payload.extend_from_slice(record);
        }

        let samples = clairchen::decode_payload(&payload, RX_TIME, mcs).unwrap();
        let interval = clairchen::PROTOCOL_PAYLOAD_SPECIFICATION
            .get(mcs)
            .measurement_interval;

        prop_assert_eq!(samples.len(), records.len());
        prop_assert_eq!(samples.last().unwrap().timestamp(), RX_TIME);
        for pair in samples.windows(2) {
            prop_assert_eq!(
                pair[1].timestamp().secs() - pair[0].timestamp().secs(),
                interval
            );
        }
    }

    #[test]
    fn ers_emits_one_sample_per_co2_record(
        co2 in prop::collection::vec(0u16..=10000, 2..=5),
        climate in prop::collection::vec((-32765i16..=32765, 0u8..=100), 5),
        with_climate in any::<bool>(),
    ) {
        let climate = with_climate.then(|| &climate[..co2.len()]);
        let payload = ers_payload(&co2, climate);

        let samples = ers::decode_payload(&payload, RX_TIME).unwrap();
        let interval = ers::PROTOCOL_PAYLOAD_SPECIFICATION
            .by_measurement_count(co2.len())
            .unwrap()
            .measurement_interval;

        prop_assert_eq!(samples.len(), co2.len());
        prop_assert_eq!(samples.last().unwrap().timestamp(), RX_TIME);
        prop_assert_eq!(samples.last().unwrap().co2(), Co2(co2[0]));
        prop_assert_eq!(samples[0].co2(), Co2(co2[co2.len() - 1]));
        for pair in samples.windows(2) {
            prop_assert_eq!(
                pair[1].timestamp().secs() - pair[0].timestamp().secs(),
                interval
            );
        }
        prop_assert!(samples.iter().all(|s| s.temperature().is_some() == with_climate));
    }
}
