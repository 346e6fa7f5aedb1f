//! Frame capacity and duration table.

use crate::{BbFrameType, FrameError, ModCod, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// BBHEADER length in bits, taken out of every BCH payload.
pub const BBHEADER_BITS: u32 = 80;
/// PLHEADER length in symbols.
pub const PLHEADER_SYMBOLS: u32 = 90;
/// Symbols per PL slot.
pub const SLOT_SYMBOLS: u32 = 90;
/// Symbols per pilot block.
pub const PILOT_BLOCK_SYMBOLS: u32 = 36;
/// A pilot block follows every this many slots.
pub const PILOT_PERIOD_SLOTS: u32 = 16;
/// Length of a dummy PLFRAME in symbols.
pub const DUMMY_PLFRAME_SYMBOLS: u32 = 3330;

/// Capacity and on-air time of one (MODCOD, frame type) combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameEntry {
    /// Payload capacity in bits.
    pub payload_bits: u32,
    /// Time the frame occupies the channel.
    pub duration: Duration,
}

/// Lookup table from (MODCOD, frame type) to capacity and duration.
///
/// Only short and normal frames have entries. A dummy frame borrows the
/// capacity of the MODCOD's short entry and uses its own fixed duration.
#[derive(Debug, Clone, PartialEq)]
pub struct BbFrameConf {
    entries: BTreeMap<(ModCod, BbFrameType), FrameEntry>,
    dummy_duration: Duration,
}

impl BbFrameConf {
    /// Table derived from the DVB-S2 BCH payload sizes at `symbol_rate_baud`.
    ///
    /// 9/10 has no short frame, so those entries are absent.
    pub fn dvb_s2(symbol_rate_baud: f64, pilots: bool) -> Result<Self> {
        if !(symbol_rate_baud.is_finite() && symbol_rate_baud > 0.0) {
            return Err(FrameError::Configuration(format!(
                "symbol rate {} must be positive",
                symbol_rate_baud
            )));
        }

        let mut entries = BTreeMap::new();
        for modcod in ModCod::ALL {
            for frame_type in [BbFrameType::Short, BbFrameType::Normal] {
                let Some(k_bch) = k_bch(modcod.code_rate(), frame_type) else {
                    continue;
                };
                let symbols = plframe_symbols(modcod, frame_type, pilots);
                entries.insert(
                    (modcod, frame_type),
                    FrameEntry {
                        payload_bits: k_bch - BBHEADER_BITS,
                        duration: Duration::from_secs_f64(symbols as f64 / symbol_rate_baud),
                    },
                );
            }
        }

        Ok(Self {
            entries,
            dummy_duration: Duration::from_secs_f64(DUMMY_PLFRAME_SYMBOLS as f64 / symbol_rate_baud),
        })
    }

    /// Table from explicit entries.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (ModCod, BbFrameType, FrameEntry)>,
        dummy_duration: Duration,
    ) -> Result<Self> {
        if dummy_duration.is_zero() {
            return Err(FrameError::Configuration("dummy frame duration must be positive".into()));
        }

        let mut table = BTreeMap::new();
        for (modcod, frame_type, entry) in entries {
            if frame_type == BbFrameType::Dummy {
                return Err(FrameError::Configuration(format!(
                    "{}: dummy frames take their capacity from the short entry",
                    modcod
                )));
            }
            if entry.payload_bits < 8 || entry.duration.is_zero() {
                return Err(FrameError::Configuration(format!(
                    "{} {}: payload and duration must be positive",
                    modcod, frame_type
                )));
            }
            if table.insert((modcod, frame_type), entry).is_some() {
                return Err(FrameError::Configuration(format!(
                    "duplicate entry for {} {}",
                    modcod, frame_type
                )));
            }
        }

        Ok(Self {
            entries: table,
            dummy_duration,
        })
    }

    /// Payload capacity in bits; dummy frames use the short entry.
    pub fn payload_bits(&self, modcod: ModCod, frame_type: BbFrameType) -> Result<u32> {
        let lookup = match frame_type {
            BbFrameType::Dummy => BbFrameType::Short,
            other => other,
        };
        self.entries
            .get(&(modcod, lookup))
            .map(|e| e.payload_bits)
            .ok_or(FrameError::MissingEntry {
                modcod,
                frame_type: lookup,
            })
    }

    /// On-air duration of a frame.
    pub fn frame_duration(&self, modcod: ModCod, frame_type: BbFrameType) -> Result<Duration> {
        match frame_type {
            BbFrameType::Dummy => Ok(self.dummy_duration),
            _ => self
                .entries
                .get(&(modcod, frame_type))
                .map(|e| e.duration)
                .ok_or(FrameError::MissingEntry { modcod, frame_type }),
        }
    }

    /// Duration of a dummy frame.
    pub fn dummy_frame_duration(&self) -> Duration {
        self.dummy_duration
    }

    /// All entries in (MODCOD, frame type) order.
    pub fn entries(&self) -> impl Iterator<Item = (ModCod, BbFrameType, FrameEntry)> + '_ {
        self.entries.iter().map(|(&(m, t), &e)| (m, t, e))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// BCH uncoded block size for a code rate and frame size.
fn k_bch(code_rate: (u32, u32), frame_type: BbFrameType) -> Option<u32> {
    let normal = frame_type == BbFrameType::Normal;
    let (n, s) = match code_rate {
        (1, 4) => (16_008, 3_072),
        (1, 3) => (21_408, 5_232),
        (2, 5) => (25_728, 6_312),
        (1, 2) => (32_208, 7_032),
        (3, 5) => (38_688, 9_552),
        (2, 3) => (43_040, 10_632),
        (3, 4) => (48_408, 11_712),
        (4, 5) => (51_648, 12_432),
        (5, 6) => (53_840, 13_152),
        (8, 9) => (57_472, 14_232),
        (9, 10) if normal => (58_192, 0),
        _ => return None,
    };
    match frame_type {
        BbFrameType::Normal => Some(n),
        BbFrameType::Short => Some(s),
        BbFrameType::Dummy => None,
    }
}

/// PLFRAME length in symbols, header and pilots included.
fn plframe_symbols(modcod: ModCod, frame_type: BbFrameType, pilots: bool) -> u32 {
    let Some(ldpc_bits) = frame_type.ldpc_bits() else {
        return DUMMY_PLFRAME_SYMBOLS;
    };
    let slots = ldpc_bits / (modcod.modulation().bits_per_symbol() * SLOT_SYMBOLS);
    let pilot_blocks = if pilots { (slots - 1) / PILOT_PERIOD_SLOTS } else { 0 };
    PLHEADER_SYMBOLS + slots * SLOT_SYMBOLS + pilot_blocks * PILOT_BLOCK_SYMBOLS
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_plframe_lengths() {
        assert_eq!(plframe_symbols(ModCod::Qpsk3_4, BbFrameType::Normal, false), 32_490);
        assert_eq!(plframe_symbols(ModCod::Qpsk3_4, BbFrameType::Normal, true), 33_282);
        assert_eq!(plframe_symbols(ModCod::Qpsk3_4, BbFrameType::Short, true), 8_370);
        assert_eq!(plframe_symbols(ModCod::Apsk32_9_10, BbFrameType::Normal, false), 13_050);
    }

    #[test]
    fn test_dvb_s2_table() {
        let conf = BbFrameConf::dvb_s2(1e6, true).unwrap();
        // 28 normal + 24 short (no 9/10 short frames).
        assert_eq!(conf.len(), 52);
        assert_eq!(conf.payload_bits(ModCod::Qpsk3_4, BbFrameType::Short).unwrap(), 11_632);
        assert_eq!(conf.payload_bits(ModCod::Qpsk3_4, BbFrameType::Normal).unwrap(), 48_328);
        assert_relative_eq!(
            conf.frame_duration(ModCod::Qpsk3_4, BbFrameType::Short).unwrap().as_secs_f64(),
            8.37e-3,
            epsilon = 1e-9
        );
        assert_relative_eq!(conf.dummy_frame_duration().as_secs_f64(), 3.33e-3, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_short_nine_tenths() {
        let conf = BbFrameConf::dvb_s2(1e6, false).unwrap();
        assert_eq!(
            conf.payload_bits(ModCod::Qpsk9_10, BbFrameType::Short),
            Err(FrameError::MissingEntry {
                modcod: ModCod::Qpsk9_10,
                frame_type: BbFrameType::Short
            })
        );
        // Dummy frames inherit the gap.
        assert!(conf.payload_bits(ModCod::Qpsk9_10, BbFrameType::Dummy).is_err());
        assert!(conf.payload_bits(ModCod::Qpsk9_10, BbFrameType::Normal).is_ok());
    }

    #[test]
    fn test_from_entries_validation() {
        let entry = FrameEntry {
            payload_bits: 8_000,
            duration: Duration::from_millis(5),
        };
        assert!(BbFrameConf::from_entries(
            [(ModCod::Qpsk3_4, BbFrameType::Dummy, entry)],
            Duration::from_millis(1)
        )
        .is_err());
        assert!(BbFrameConf::from_entries(
            [
                (ModCod::Qpsk3_4, BbFrameType::Short, entry),
                (ModCod::Qpsk3_4, BbFrameType::Short, entry)
            ],
            Duration::from_millis(1)
        )
        .is_err());
        assert!(BbFrameConf::from_entries([], Duration::ZERO).is_err());

        let conf = BbFrameConf::from_entries(
            [(ModCod::Qpsk3_4, BbFrameType::Short, entry)],
            Duration::from_millis(1),
        )
        .unwrap();
        assert_eq!(conf.frame_duration(ModCod::Qpsk3_4, BbFrameType::Dummy).unwrap(), Duration::from_millis(1));
    }

    #[test]
    fn test_rejects_bad_symbol_rate() {
        assert!(BbFrameConf::dvb_s2(0.0, true).is_err());
        assert!(BbFrameConf::dvb_s2(f64::NAN, true).is_err());
    }
}
