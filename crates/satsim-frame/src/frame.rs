//! A single BBFrame being filled with payload units.

use crate::{BbFrameConf, BbFrameType, FrameError, ModCod, Result};
use bytes::Bytes;
use satsim_metrics::{metric_defs, metrics};
use std::time::Duration;
use tracing::{debug, trace};

/// Fixed-capacity frame that accepts whole payload units until full.
///
/// Capacity comes from the (MODCOD, frame type) table; units are never split.
/// Accepted units are transmitted in the order they were added.
///
/// ```
/// use bytes::Bytes;
/// use satsim_frame::{BbFrame, BbFrameConf, BbFrameType, ModCod};
///
/// let conf = BbFrameConf::dvb_s2(1e6, true).unwrap();
/// let mut frame = BbFrame::new(ModCod::Qpsk3_4, BbFrameType::Short, &conf).unwrap();
/// let left = frame.add_payload(Bytes::from(vec![0u8; 1000])).unwrap();
/// assert_eq!(left, frame.max_space_bytes() - 1000);
/// ```
#[derive(Debug, Clone)]
pub struct BbFrame {
    modcod: ModCod,
    frame_type: BbFrameType,
    max_space_bytes: u32,
    space_left_bytes: u32,
    duration: Duration,
    payload: Vec<Bytes>,
    contains_control_pdu: bool,
}

impl BbFrame {
    /// Create an empty frame sized for `modcod` and `frame_type`.
    ///
    /// Dummy frames take the capacity of the MODCOD's short frame and the
    /// table's dummy duration.
    pub fn new(modcod: ModCod, frame_type: BbFrameType, conf: &BbFrameConf) -> Result<Self> {
        let max_space_bytes = conf.payload_bits(modcod, frame_type)? / 8;
        let duration = conf.frame_duration(modcod, frame_type)?;
        trace!(%modcod, %frame_type, max_space_bytes, ?duration, "New BBFrame");
        Ok(Self {
            modcod,
            frame_type,
            max_space_bytes,
            space_left_bytes: max_space_bytes,
            duration,
            payload: Vec::new(),
            contains_control_pdu: false,
        })
    }

    /// Append a payload unit and return the bytes left.
    ///
    /// A unit larger than the remaining space is rejected whole and the frame
    /// is left unchanged.
    pub fn add_payload(&mut self, unit: Bytes) -> Result<u32> {
        let requested = unit.len();
        let size = match u32::try_from(requested) {
            Ok(size) if size <= self.space_left_bytes => size,
            _ => {
                debug!(
                    modcod = %self.modcod,
                    frame_type = %self.frame_type,
                    requested,
                    available = self.space_left_bytes,
                    "Payload does not fit BBFrame"
                );
                metrics::counter!(metric_defs::FRAME_CAPACITY_EXCEEDED.name, &self.labels()).increment(1);
                return Err(FrameError::CapacityExceeded {
                    requested,
                    available: self.space_left_bytes,
                });
            }
        };
        self.payload.push(unit);
        self.space_left_bytes -= size;
        Ok(self.space_left_bytes)
    }

    /// Append a control PDU; the frame is then flagged as carrying control data.
    pub fn add_control_payload(&mut self, unit: Bytes) -> Result<u32> {
        let left = self.add_payload(unit)?;
        self.contains_control_pdu = true;
        Ok(left)
    }

    /// Accepted units in transmit order.
    pub fn transmit_data(&self) -> &[Bytes] {
        &self.payload
    }

    /// Consume the frame for transmission, returning its units in order.
    pub fn into_transmit_data(self) -> Vec<Bytes> {
        metrics::histogram!(metric_defs::FRAME_FILL_RATIO.name, &self.labels())
            .record(self.occupancy_ratio() * 100.0);
        self.payload
    }

    /// Bytes still free.
    pub fn space_left_bytes(&self) -> u32 {
        self.space_left_bytes
    }

    /// Total payload capacity in bytes.
    pub fn max_space_bytes(&self) -> u32 {
        self.max_space_bytes
    }

    /// Bytes already accepted.
    pub fn used_bytes(&self) -> u32 {
        self.max_space_bytes - self.space_left_bytes
    }

    /// Fraction of the capacity in use, in `[0, 1]`.
    pub fn occupancy_ratio(&self) -> f64 {
        if self.max_space_bytes == 0 {
            return 0.0;
        }
        f64::from(self.used_bytes()) / f64::from(self.max_space_bytes)
    }

    /// On-air duration.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// MODCOD the frame is sized for.
    pub fn modcod(&self) -> ModCod {
        self.modcod
    }

    /// Frame type.
    pub fn frame_type(&self) -> BbFrameType {
        self.frame_type
    }

    /// Whether any control PDU was added.
    pub fn contains_control_pdu(&self) -> bool {
        self.contains_control_pdu
    }

    /// Number of accepted units.
    pub fn unit_count(&self) -> usize {
        self.payload.len()
    }

    /// Whether no unit has been accepted.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    fn labels(&self) -> Vec<(&'static str, String)> {
        vec![
            ("modcod", self.modcod.name()),
            ("frame_type", self.frame_type.name().to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FrameEntry;
    use approx::assert_relative_eq;

    fn thousand_byte_conf() -> BbFrameConf {
        BbFrameConf::from_entries(
            [(
                ModCod::Qpsk3_4,
                BbFrameType::Short,
                FrameEntry {
                    payload_bits: 8_000,
                    duration: Duration::from_micros(8_370),
                },
            )],
            Duration::from_micros(3_330),
        )
        .unwrap()
    }

    fn unit(len: usize) -> Bytes {
        Bytes::from(vec![0xa5; len])
    }

    #[test]
    fn test_capacity_bookkeeping() {
        let mut frame = BbFrame::new(ModCod::Qpsk3_4, BbFrameType::Short, &thousand_byte_conf()).unwrap();
        assert_eq!(frame.max_space_bytes(), 1000);

        assert_eq!(frame.add_payload(unit(600)), Ok(400));
        assert_eq!(
            frame.add_payload(unit(500)),
            Err(FrameError::CapacityExceeded {
                requested: 500,
                available: 400
            })
        );
        assert_eq!(frame.space_left_bytes(), 400);
        assert_eq!(frame.unit_count(), 1);

        assert_eq!(frame.add_payload(unit(400)), Ok(0));
        assert_eq!(frame.used_bytes(), 1000);
        assert_relative_eq!(frame.occupancy_ratio(), 1.0);
        assert!(frame.add_payload(unit(1)).is_err());
        // Empty units always fit.
        assert_eq!(frame.add_payload(Bytes::new()), Ok(0));
    }

    #[test]
    fn test_transmit_order_is_acceptance_order() {
        let mut frame = BbFrame::new(ModCod::Qpsk3_4, BbFrameType::Short, &thousand_byte_conf()).unwrap();
        frame.add_payload(Bytes::from_static(b"first")).unwrap();
        frame.add_payload(unit(2000)).unwrap_err();
        frame.add_payload(Bytes::from_static(b"second")).unwrap();
        let data = frame.into_transmit_data();
        assert_eq!(data, vec![Bytes::from_static(b"first"), Bytes::from_static(b"second")]);
    }

    #[test]
    fn test_dummy_frame_asymmetry() {
        let conf = thousand_byte_conf();
        let short = BbFrame::new(ModCod::Qpsk3_4, BbFrameType::Short, &conf).unwrap();
        let dummy = BbFrame::new(ModCod::Qpsk3_4, BbFrameType::Dummy, &conf).unwrap();
        assert_eq!(dummy.max_space_bytes(), short.max_space_bytes());
        assert_ne!(dummy.duration(), short.duration());
        assert_eq!(dummy.duration(), Duration::from_micros(3_330));
    }

    #[test]
    fn test_missing_entry() {
        let conf = thousand_byte_conf();
        assert_eq!(
            BbFrame::new(ModCod::Qpsk3_4, BbFrameType::Normal, &conf).unwrap_err(),
            FrameError::MissingEntry {
                modcod: ModCod::Qpsk3_4,
                frame_type: BbFrameType::Normal
            }
        );
    }

    #[test]
    fn test_control_flag() {
        let mut frame = BbFrame::new(ModCod::Qpsk3_4, BbFrameType::Short, &thousand_byte_conf()).unwrap();
        frame.add_payload(unit(10)).unwrap();
        assert!(!frame.contains_control_pdu());
        // A rejected control PDU does not set the flag.
        frame.add_control_payload(unit(5000)).unwrap_err();
        assert!(!frame.contains_control_pdu());
        frame.add_control_payload(unit(10)).unwrap();
        assert!(frame.contains_control_pdu());
    }
}
