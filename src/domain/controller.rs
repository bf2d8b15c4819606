use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::ids::ControllerId;

/// A controller's functional role, drives C5's role-exclusivity and
/// licensed-FMP constraints and C6's role-usage penalties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Regular,
    ShiftLeader,
    Supervisor,
    FlowManagement,
}

/// Single-letter shift pattern tag from the source rows. `Morning`
/// shifts get their last two slots trimmed to out-of-shift unless a
/// manual pin forces them back in (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftCode {
    Morning,
    Day,
    Afternoon,
    Night,
}

impl FromStr for ShiftCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M" => Ok(ShiftCode::Morning),
            "J" => Ok(ShiftCode::Day),
            "P" => Ok(ShiftCode::Afternoon),
            "N" => Ok(ShiftCode::Night),
            other => Err(format!("unknown shift code: {other}")),
        }
    }
}

impl ShiftCode {
    pub fn as_letter(&self) -> &'static str {
        match self {
            ShiftCode::Morning => "M",
            ShiftCode::Day => "J",
            ShiftCode::Afternoon => "P",
            ShiftCode::Night => "N",
        }
    }
}

/// A controller as known to the optimizer for one (date, shift) request.
///
/// `shift_start`/`shift_end` and `vreme_start` are unix seconds, matching
/// the epoch used throughout the slot model so no timezone handling
/// leaks into the optimization core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Controller {
    pub id: ControllerId,
    pub display_name: String,
    pub role: Role,
    pub shift_code: ShiftCode,
    pub has_license: bool,
    pub shift_start: i64,
    pub shift_end: i64,
    pub vreme_start: i64,
    pub ordering_index: i64,
    pub partner_code: Option<String>,
}

impl Controller {
    pub fn is_shift_leader_or_supervisor(&self) -> bool {
        matches!(self.role, Role::ShiftLeader | Role::Supervisor)
    }

    pub fn is_licensed_fmp(&self) -> bool {
        self.role == Role::FlowManagement && self.has_license
    }
}
