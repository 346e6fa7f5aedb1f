//! Filling frames from a DVB-S2 table.

use bytes::Bytes;
use satsim_frame::{BbFrame, BbFrameConf, BbFrameType, FrameError, ModCod};

#[test]
fn test_capacity_grows_with_modcod() {
    let conf = BbFrameConf::dvb_s2(25e6, true).unwrap();
    let capacity = |m| BbFrame::new(m, BbFrameType::Normal, &conf).unwrap().max_space_bytes();
    assert!(capacity(ModCod::Qpsk1_4) < capacity(ModCod::Qpsk3_4));
    assert!(capacity(ModCod::Qpsk3_4) < capacity(ModCod::Apsk32_9_10));
    assert_eq!(capacity(ModCod::Qpsk1_4), (16_008 - 80) / 8);
}

#[test]
fn test_higher_order_modulation_shortens_frames() {
    let conf = BbFrameConf::dvb_s2(25e6, false).unwrap();
    let qpsk = BbFrame::new(ModCod::Qpsk3_4, BbFrameType::Normal, &conf).unwrap();
    let apsk = BbFrame::new(ModCod::Apsk16_3_4, BbFrameType::Normal, &conf).unwrap();
    assert_eq!(qpsk.max_space_bytes(), apsk.max_space_bytes());
    assert!(apsk.duration() < qpsk.duration());
}

#[test]
fn test_fill_until_full() {
    let conf = BbFrameConf::dvb_s2(25e6, true).unwrap();
    let mut frames = Vec::new();
    let mut current = BbFrame::new(ModCod::Psk8_2_3, BbFrameType::Short, &conf).unwrap();

    for _ in 0..40 {
        let packet = Bytes::from(vec![0u8; 188]);
        match current.add_payload(packet.clone()) {
            Ok(_) => {}
            Err(FrameError::CapacityExceeded { requested, available }) => {
                assert_eq!(requested, 188);
                assert!(available < 188);
                let full = std::mem::replace(
                    &mut current,
                    BbFrame::new(ModCod::Psk8_2_3, BbFrameType::Short, &conf).unwrap(),
                );
                frames.push(full);
                current.add_payload(packet).unwrap();
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    frames.push(current);

    let units: usize = frames.iter().map(BbFrame::unit_count).sum();
    assert_eq!(units, 40);
    // 8PSK 2/3 short carries (10632 - 80) / 8 = 1319 bytes: 7 packets of 188.
    assert!(frames[..frames.len() - 1].iter().all(|f| f.unit_count() == 7));
}

#[test]
fn test_dummy_frame_for_missing_short_modcod() {
    let conf = BbFrameConf::dvb_s2(25e6, true).unwrap();
    assert!(matches!(
        BbFrame::new(ModCod::Qpsk9_10, BbFrameType::Dummy, &conf),
        Err(FrameError::MissingEntry { frame_type: BbFrameType::Short, .. })
    ));
}
