//! Frame filling report: how many fixed-size packets each MODCOD carries.

use crate::{Result, RunnerError};
use bytes::Bytes;
use satsim_frame::{BbFrame, BbFrameConf, BbFrameType, FrameError, ModCod};
use serde::Serialize;
use tracing::{debug, info};

/// Outcome of filling one frame with identical packets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameFill {
    /// MODCOD the frame is sized for.
    pub modcod: ModCod,
    /// Frame type.
    pub frame_type: BbFrameType,
    /// Payload capacity in bytes.
    pub capacity_bytes: u32,
    /// Packets accepted before the first rejection.
    pub packets: usize,
    /// Bytes in use.
    pub used_bytes: u32,
    /// Bytes left unused.
    pub space_left_bytes: u32,
    /// Used fraction of the capacity.
    pub fill_ratio: f64,
    /// On-air duration in microseconds.
    pub duration_us: u64,
    /// Carried payload bit rate over the frame duration.
    pub goodput_bps: f64,
}

/// Fill one frame per (MODCOD, frame type) in the table with `packet_bytes`
/// sized packets until the next packet no longer fits.
///
/// Pairs without a table entry are skipped.
pub fn fill_frames(
    conf: &BbFrameConf,
    packet_bytes: usize,
    frame_types: &[BbFrameType],
) -> Result<Vec<FrameFill>> {
    if packet_bytes == 0 {
        return Err(RunnerError::Scenario("packet size must be at least one byte".into()));
    }
    let packet = Bytes::from(vec![0u8; packet_bytes]);

    let mut fills = Vec::new();
    for modcod in ModCod::ALL {
        for &frame_type in frame_types {
            let frame = match BbFrame::new(modcod, frame_type, conf) {
                Ok(frame) => frame,
                Err(FrameError::MissingEntry { .. }) => {
                    debug!(%modcod, %frame_type, "No table entry");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            fills.push(fill_one(frame, &packet)?);
        }
    }

    info!(packet_bytes, frames = fills.len(), "Frame fill complete");
    Ok(fills)
}

fn fill_one(mut frame: BbFrame, packet: &Bytes) -> Result<FrameFill> {
    loop {
        match frame.add_payload(packet.clone()) {
            Ok(_) => {}
            Err(FrameError::CapacityExceeded { .. }) => break,
            Err(e) => return Err(e.into()),
        }
    }

    let duration = frame.duration();
    let fill = FrameFill {
        modcod: frame.modcod(),
        frame_type: frame.frame_type(),
        capacity_bytes: frame.max_space_bytes(),
        packets: frame.unit_count(),
        used_bytes: frame.used_bytes(),
        space_left_bytes: frame.space_left_bytes(),
        fill_ratio: frame.occupancy_ratio(),
        duration_us: duration.as_micros() as u64,
        goodput_bps: if duration.is_zero() {
            0.0
        } else {
            f64::from(frame.used_bytes()) * 8.0 / duration.as_secs_f64()
        },
    };
    // Hands the frame off so the fill ratio is recorded.
    let sent = frame.into_transmit_data();
    debug_assert_eq!(sent.len(), fill.packets);
    Ok(fill)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use satsim_frame::FrameEntry;
    use std::time::Duration;

    fn single_entry_conf() -> BbFrameConf {
        BbFrameConf::from_entries(
            [(
                ModCod::Qpsk3_4,
                BbFrameType::Short,
                FrameEntry {
                    payload_bits: 8_000,
                    duration: Duration::from_millis(1),
                },
            )],
            Duration::from_micros(500),
        )
        .unwrap()
    }

    #[test]
    fn test_fill_stops_at_first_rejection() {
        let fills = fill_frames(&single_entry_conf(), 300, &[BbFrameType::Short]).unwrap();
        assert_eq!(fills.len(), 1);
        let fill = &fills[0];
        assert_eq!(fill.capacity_bytes, 1000);
        assert_eq!(fill.packets, 3);
        assert_eq!(fill.used_bytes, 900);
        assert_eq!(fill.space_left_bytes, 100);
        assert_eq!(fill.duration_us, 1000);
        assert_relative_eq!(fill.goodput_bps, 7_200_000.0);
    }

    #[test]
    fn test_missing_entries_skipped_and_dummy_uses_short_capacity() {
        let types = [BbFrameType::Short, BbFrameType::Normal, BbFrameType::Dummy];
        let fills = fill_frames(&single_entry_conf(), 250, &types).unwrap();
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[1].frame_type, BbFrameType::Dummy);
        assert_eq!(fills[1].packets, 4);
        assert_eq!(fills[1].duration_us, 500);
    }

    #[test]
    fn test_oversized_packet_leaves_frame_empty() {
        let fills = fill_frames(&single_entry_conf(), 1001, &[BbFrameType::Short]).unwrap();
        assert_eq!(fills[0].packets, 0);
        assert_eq!(fills[0].fill_ratio, 0.0);
    }

    #[test]
    fn test_zero_packet_size_rejected() {
        assert!(matches!(
            fill_frames(&single_entry_conf(), 0, &[BbFrameType::Short]),
            Err(RunnerError::Scenario(_))
        ));
    }
}
