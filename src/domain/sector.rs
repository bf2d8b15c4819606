use serde::{Deserialize, Serialize};

/// A named working position: usually a two-letter sector code plus an
/// 'E' (executive) or 'P' (planner) suffix; specials include FMP, SS
/// (shift leader), SUP (supervisor), BRF, SBY. Represented as an opaque
/// string since the catalogue of positions is configuration-driven, not
/// fixed by this crate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectorPosition(pub String);

impl SectorPosition {
    pub fn new(label: impl Into<String>) -> Self {
        SectorPosition(label.into())
    }

    /// The base sector prefix used by the continuity constraint (C5.4):
    /// the leading two characters, e.g. "LU" for "LU E" / "LUE".
    pub fn base_prefix(&self) -> &str {
        let trimmed = self.0.trim();
        let bytes = trimmed.as_bytes();
        if bytes.len() >= 2 { &trimmed[..2] } else { trimmed }
    }

    pub fn is_fmp(&self) -> bool {
        self.0.contains("FMP")
    }
}

impl std::fmt::Display for SectorPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a controller is doing in a given slot: occupying a sector, or
/// resting. Mirrors the `x[c,t,s]` sum type from spec §3 — replaces the
/// source's "empty string means break" convention with a real enum
/// (Design Note 1).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectorOrBreak {
    Sector(SectorPosition),
    Break,
}

impl SectorOrBreak {
    pub fn sector(&self) -> Option<&SectorPosition> {
        match self {
            SectorOrBreak::Sector(s) => Some(s),
            SectorOrBreak::Break => None,
        }
    }

    pub fn is_break(&self) -> bool {
        matches!(self, SectorOrBreak::Break)
    }

    /// Parses the raw, possibly-empty sector string from a shift row.
    /// A manual pin is only extracted when this is non-empty (spec
    /// §4.2); an empty/whitespace value or missing field yields `None`
    /// rather than an explicit `Break` pin.
    pub fn from_raw(raw: Option<&str>) -> Option<Self> {
        match raw {
            None => None,
            Some(s) if s.trim().is_empty() => None,
            Some(s) => Some(SectorOrBreak::Sector(SectorPosition::new(s.trim()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_prefix_takes_the_leading_two_characters() {
        assert_eq!(SectorPosition::new("LU E").base_prefix(), "LU");
        assert_eq!(SectorPosition::new("TX1E").base_prefix(), "TX");
        assert_eq!(SectorPosition::new("A").base_prefix(), "A");
    }

    #[test]
    fn is_fmp_matches_the_substring_anywhere() {
        assert!(SectorPosition::new("FMP").is_fmp());
        assert!(SectorPosition::new("TX-FMP-1").is_fmp());
        assert!(!SectorPosition::new("LU E").is_fmp());
    }

    #[test]
    fn from_raw_treats_blank_and_missing_as_no_pin() {
        assert_eq!(SectorOrBreak::from_raw(None), None);
        assert_eq!(SectorOrBreak::from_raw(Some("")), None);
        assert_eq!(SectorOrBreak::from_raw(Some("   ")), None);
    }

    #[test]
    fn from_raw_trims_and_wraps_a_sector_label() {
        assert_eq!(SectorOrBreak::from_raw(Some(" TX1P ")), Some(SectorOrBreak::Sector(SectorPosition::new("TX1P"))));
    }
}
