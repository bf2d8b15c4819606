use serde::{Deserialize, Serialize};

use crate::domain::sector::SectorPosition;

/// Informational grouping of a configuration interval; does not affect
/// which sectors are required, only how the per-slot label is rendered
/// (spec §4.3, §6 "TX:<codes> | LU:<codes>" labels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Cluster {
    Tx,
    Lu,
    All,
}

impl std::fmt::Display for Cluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Cluster::Tx => "TX",
            Cluster::Lu => "LU",
            Cluster::All => "ALL",
        };
        write!(f, "{s}")
    }
}

/// A half-open `[from, to)` range over which a named configuration is
/// active, carrying the list of sector positions it demands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationInterval {
    pub from: i64,
    pub to: i64,
    pub cluster: Cluster,
    pub config_code: String,
    pub sectors: Vec<SectorPosition>,
    pub ordering: i64,
}

impl ConfigurationInterval {
    pub fn covers(&self, t: i64) -> bool {
        self.from <= t && t < self.to
    }
}
