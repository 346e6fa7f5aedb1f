//! Trace kinds and their file layout.

use satsim_common::LinkKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of input trace, which fixes the directory and column layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    /// Columns: time (s), interference density, rx power density.
    Interference,
    /// Columns: time (s), fading (dB).
    Fading,
}

impl TraceKind {
    /// Column holding the sample time in seconds.
    pub const TIME_COLUMN: usize = 0;
    /// Interference density column of an interference trace.
    pub const INTERFERENCE_DENSITY_COLUMN: usize = 1;
    /// Rx power density column of an interference trace.
    pub const RX_POWER_DENSITY_COLUMN: usize = 2;
    /// Fading value column of a fading trace.
    pub const FADING_COLUMN: usize = 1;

    /// Number of columns every row must have.
    pub const fn column_count(&self) -> usize {
        match self {
            TraceKind::Interference => 3,
            TraceKind::Fading => 2,
        }
    }

    /// Subdirectory of the trace root holding files of this kind.
    pub const fn dir_name(&self) -> &'static str {
        match self {
            TraceKind::Interference => "interference",
            TraceKind::Fading => "fading",
        }
    }

    /// File name for a link, e.g. `addr_000000000001_ch_FORWARD_USER_CH.dat`.
    pub fn file_name(key: &LinkKey) -> String {
        format!(
            "addr_{}_ch_{}.dat",
            key.address.to_hex_string(),
            key.channel.name()
        )
    }

    /// Full path of the trace file for `key` under `root`.
    pub fn file_path(&self, root: &Path, key: &LinkKey) -> PathBuf {
        root.join(self.dir_name()).join(Self::file_name(key))
    }
}

impl fmt::Display for TraceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use satsim_common::{ChannelType, MacAddress};

    #[test]
    fn test_file_path_layout() {
        let key = LinkKey::new(MacAddress::from_index(0x2a), ChannelType::ReturnUser);
        let path = TraceKind::Fading.file_path(Path::new("/sim"), &key);
        assert_eq!(
            path,
            PathBuf::from("/sim/fading/addr_00000000002a_ch_RETURN_USER_CH.dat")
        );
    }

    #[test]
    fn test_column_layouts() {
        assert_eq!(TraceKind::Interference.column_count(), 3);
        assert_eq!(TraceKind::Fading.column_count(), 2);
        assert!(TraceKind::RX_POWER_DENSITY_COLUMN < TraceKind::Interference.column_count());
    }
}
