//! Link identity: terminal address plus channel type.

use crate::CommonError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use xxhash_rust::xxh64::xxh64;

// ============================================================================
// MAC Address
// ============================================================================

/// 48-bit link-layer address of a terminal or gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// Build an address from the low 48 bits of `index`.
    ///
    /// Handy for allocating sequential terminal addresses in scenarios.
    pub fn from_index(index: u64) -> Self {
        let b = index.to_be_bytes();
        MacAddress([b[2], b[3], b[4], b[5], b[6], b[7]])
    }

    /// The raw address octets.
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Lower-case hex without separators, e.g. `000000000001`.
    ///
    /// Used when deriving file names from a link key.
    pub fn to_hex_string(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", a, b, c, d, e, g)
    }
}

impl FromStr for MacAddress {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut octets = [0u8; 6];
        let mut parts = s.split(':');
        for octet in octets.iter_mut() {
            let part = parts
                .next()
                .ok_or_else(|| CommonError::InvalidMacAddress(s.to_string()))?;
            if part.len() != 2 {
                return Err(CommonError::InvalidMacAddress(s.to_string()));
            }
            *octet = u8::from_str_radix(part, 16)
                .map_err(|_| CommonError::InvalidMacAddress(s.to_string()))?;
        }
        if parts.next().is_some() {
            return Err(CommonError::InvalidMacAddress(s.to_string()));
        }
        Ok(MacAddress(octets))
    }
}

impl Serialize for MacAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Channel Type
// ============================================================================

/// Satellite channel on which a link carries traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChannelType {
    /// Gateway to satellite.
    #[serde(rename = "FORWARD_FEEDER_CH")]
    ForwardFeeder,
    /// Satellite to user terminal.
    #[serde(rename = "FORWARD_USER_CH")]
    ForwardUser,
    /// User terminal to satellite.
    #[serde(rename = "RETURN_USER_CH")]
    ReturnUser,
    /// Satellite to gateway.
    #[serde(rename = "RETURN_FEEDER_CH")]
    ReturnFeeder,
}

impl ChannelType {
    /// All channel types, in declaration order.
    pub const ALL: [ChannelType; 4] = [
        ChannelType::ForwardFeeder,
        ChannelType::ForwardUser,
        ChannelType::ReturnUser,
        ChannelType::ReturnFeeder,
    ];

    /// Stable upper-case name used in file names and logs.
    pub const fn name(&self) -> &'static str {
        match self {
            ChannelType::ForwardFeeder => "FORWARD_FEEDER_CH",
            ChannelType::ForwardUser => "FORWARD_USER_CH",
            ChannelType::ReturnUser => "RETURN_USER_CH",
            ChannelType::ReturnFeeder => "RETURN_FEEDER_CH",
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChannelType {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChannelType::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CommonError::UnknownChannelType(s.to_string()))
    }
}

// ============================================================================
// Link Key
// ============================================================================

/// Composite identifier of one link and channel.
///
/// Indexes both per-link fading state and trace data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LinkKey {
    /// Terminal or gateway address.
    pub address: MacAddress,
    /// Channel the link operates on.
    pub channel: ChannelType,
}

impl LinkKey {
    /// Create a new link key.
    pub const fn new(address: MacAddress, channel: ChannelType) -> Self {
        LinkKey { address, channel }
    }

    /// Derive a per-link RNG seed from a base seed.
    ///
    /// Stable across runs and platforms, so the same base seed always gives
    /// each link the same random stream regardless of creation order.
    pub fn derive_seed(&self, base_seed: u64) -> u64 {
        let mut bytes = [0u8; 7];
        bytes[..6].copy_from_slice(&self.address.0);
        bytes[6] = self.channel as u8;
        xxh64(&bytes, base_seed)
    }
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.channel)
    }
}
