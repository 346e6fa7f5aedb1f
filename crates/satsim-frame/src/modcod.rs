//! Modulation and coding schemes and frame types.

use crate::FrameError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Modulation
// ============================================================================

/// DVB-S2 constellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Modulation {
    /// QPSK, 2 bits per symbol.
    Qpsk,
    /// 8PSK, 3 bits per symbol.
    Psk8,
    /// 16APSK, 4 bits per symbol.
    Apsk16,
    /// 32APSK, 5 bits per symbol.
    Apsk32,
}

impl Modulation {
    /// Bits carried per symbol.
    pub const fn bits_per_symbol(&self) -> u32 {
        match self {
            Modulation::Qpsk => 2,
            Modulation::Psk8 => 3,
            Modulation::Apsk16 => 4,
            Modulation::Apsk32 => 5,
        }
    }

    /// Name as used in MODCOD identifiers.
    pub const fn name(&self) -> &'static str {
        match self {
            Modulation::Qpsk => "QPSK",
            Modulation::Psk8 => "8PSK",
            Modulation::Apsk16 => "16APSK",
            Modulation::Apsk32 => "32APSK",
        }
    }
}

// ============================================================================
// MODCOD
// ============================================================================

/// DVB-S2 modulation and coding scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ModCod {
    Qpsk1_4,
    Qpsk1_3,
    Qpsk2_5,
    Qpsk1_2,
    Qpsk3_5,
    Qpsk2_3,
    Qpsk3_4,
    Qpsk4_5,
    Qpsk5_6,
    Qpsk8_9,
    Qpsk9_10,
    Psk8_3_5,
    Psk8_2_3,
    Psk8_3_4,
    Psk8_5_6,
    Psk8_8_9,
    Psk8_9_10,
    Apsk16_2_3,
    Apsk16_3_4,
    Apsk16_4_5,
    Apsk16_5_6,
    Apsk16_8_9,
    Apsk16_9_10,
    Apsk32_3_4,
    Apsk32_4_5,
    Apsk32_5_6,
    Apsk32_8_9,
    Apsk32_9_10,
}

impl ModCod {
    /// Every MODCOD, most robust first within each constellation.
    pub const ALL: [ModCod; 28] = [
        ModCod::Qpsk1_4,
        ModCod::Qpsk1_3,
        ModCod::Qpsk2_5,
        ModCod::Qpsk1_2,
        ModCod::Qpsk3_5,
        ModCod::Qpsk2_3,
        ModCod::Qpsk3_4,
        ModCod::Qpsk4_5,
        ModCod::Qpsk5_6,
        ModCod::Qpsk8_9,
        ModCod::Qpsk9_10,
        ModCod::Psk8_3_5,
        ModCod::Psk8_2_3,
        ModCod::Psk8_3_4,
        ModCod::Psk8_5_6,
        ModCod::Psk8_8_9,
        ModCod::Psk8_9_10,
        ModCod::Apsk16_2_3,
        ModCod::Apsk16_3_4,
        ModCod::Apsk16_4_5,
        ModCod::Apsk16_5_6,
        ModCod::Apsk16_8_9,
        ModCod::Apsk16_9_10,
        ModCod::Apsk32_3_4,
        ModCod::Apsk32_4_5,
        ModCod::Apsk32_5_6,
        ModCod::Apsk32_8_9,
        ModCod::Apsk32_9_10,
    ];

    /// Constellation.
    pub const fn modulation(&self) -> Modulation {
        use ModCod::*;
        match self {
            Qpsk1_4 | Qpsk1_3 | Qpsk2_5 | Qpsk1_2 | Qpsk3_5 | Qpsk2_3 | Qpsk3_4 | Qpsk4_5
            | Qpsk5_6 | Qpsk8_9 | Qpsk9_10 => Modulation::Qpsk,
            Psk8_3_5 | Psk8_2_3 | Psk8_3_4 | Psk8_5_6 | Psk8_8_9 | Psk8_9_10 => Modulation::Psk8,
            Apsk16_2_3 | Apsk16_3_4 | Apsk16_4_5 | Apsk16_5_6 | Apsk16_8_9 | Apsk16_9_10 => {
                Modulation::Apsk16
            }
            Apsk32_3_4 | Apsk32_4_5 | Apsk32_5_6 | Apsk32_8_9 | Apsk32_9_10 => Modulation::Apsk32,
        }
    }

    /// LDPC code rate as `(numerator, denominator)`.
    pub const fn code_rate(&self) -> (u32, u32) {
        use ModCod::*;
        match self {
            Qpsk1_4 => (1, 4),
            Qpsk1_3 => (1, 3),
            Qpsk2_5 => (2, 5),
            Qpsk1_2 => (1, 2),
            Qpsk3_5 | Psk8_3_5 => (3, 5),
            Qpsk2_3 | Psk8_2_3 | Apsk16_2_3 => (2, 3),
            Qpsk3_4 | Psk8_3_4 | Apsk16_3_4 | Apsk32_3_4 => (3, 4),
            Qpsk4_5 | Apsk16_4_5 | Apsk32_4_5 => (4, 5),
            Qpsk5_6 | Psk8_5_6 | Apsk16_5_6 | Apsk32_5_6 => (5, 6),
            Qpsk8_9 | Psk8_8_9 | Apsk16_8_9 | Apsk32_8_9 => (8, 9),
            Qpsk9_10 | Psk8_9_10 | Apsk16_9_10 | Apsk32_9_10 => (9, 10),
        }
    }

    /// Stable name, e.g. `QPSK_3_TO_4`.
    pub fn name(&self) -> String {
        let (num, den) = self.code_rate();
        format!("{}_{}_TO_{}", self.modulation().name(), num, den)
    }
}

impl fmt::Display for ModCod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for ModCod {
    type Err = FrameError;

    /// Accepts `QPSK_3_TO_4`, `qpsk-3/4` and similar spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        ModCod::ALL
            .iter()
            .copied()
            .find(|m| normalize(&m.name()) == wanted)
            .ok_or_else(|| FrameError::UnknownModCod(s.to_string()))
    }
}

fn normalize(s: &str) -> String {
    s.trim()
        .to_ascii_uppercase()
        .replace("_TO_", "/")
        .replace(['_', '-', ' '], "")
}

impl TryFrom<String> for ModCod {
    type Error = FrameError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ModCod> for String {
    fn from(m: ModCod) -> Self {
        m.name()
    }
}

// ============================================================================
// Frame type
// ============================================================================

/// BBFrame length class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BbFrameType {
    /// 16200-bit LDPC codeword.
    Short,
    /// 64800-bit LDPC codeword.
    Normal,
    /// Padding frame carrying no user data.
    Dummy,
}

impl BbFrameType {
    /// Every frame type.
    pub const ALL: [BbFrameType; 3] = [BbFrameType::Short, BbFrameType::Normal, BbFrameType::Dummy];

    /// Stable name, e.g. `SHORT_FRAME`.
    pub const fn name(&self) -> &'static str {
        match self {
            BbFrameType::Short => "SHORT_FRAME",
            BbFrameType::Normal => "NORMAL_FRAME",
            BbFrameType::Dummy => "DUMMY_FRAME",
        }
    }

    /// LDPC codeword length in bits; dummy frames have none.
    pub const fn ldpc_bits(&self) -> Option<u32> {
        match self {
            BbFrameType::Short => Some(16_200),
            BbFrameType::Normal => Some(64_800),
            BbFrameType::Dummy => None,
        }
    }
}

impl fmt::Display for BbFrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BbFrameType {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SHORT" | "SHORT_FRAME" => Ok(BbFrameType::Short),
            "NORMAL" | "NORMAL_FRAME" => Ok(BbFrameType::Normal),
            "DUMMY" | "DUMMY_FRAME" => Ok(BbFrameType::Dummy),
            _ => Err(FrameError::InvalidFrameType(s.to_string())),
        }
    }
}

impl TryFrom<u8> for BbFrameType {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(BbFrameType::Short),
            1 => Ok(BbFrameType::Normal),
            2 => Ok(BbFrameType::Dummy),
            other => Err(FrameError::InvalidFrameType(other.to_string())),
        }
    }
}

impl TryFrom<String> for BbFrameType {
    type Error = FrameError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<BbFrameType> for String {
    fn from(t: BbFrameType) -> Self {
        t.name().to_string()
    }
}
