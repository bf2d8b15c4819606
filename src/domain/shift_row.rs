use serde::{Deserialize, Serialize};

use crate::domain::controller::ShiftCode;
use crate::domain::ids::ControllerId;
use crate::domain::sector::SectorOrBreak;

/// A release window: the controller is treated as a forced break for
/// every slot whose start falls in `[from, to)` (spec §3 "flag S").
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReleaseWindow {
    pub from: i64,
    pub to: i64,
}

impl ReleaseWindow {
    pub fn contains(&self, t: i64) -> bool {
        self.from <= t && t < self.to
    }
}

/// One row of the raw shift table for a controller on a date, as
/// returned by the `initial_schedule` external data operation (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftRow {
    pub controller_id: ControllerId,
    pub date: String,
    pub shift_start: i64,
    pub shift_end: i64,
    pub shift_code: ShiftCode,

    /// Non-empty sector field on this row; becomes a manual pin once
    /// staged (spec §4.2), unless pins are disabled for the request.
    pub pinned_sector: Option<SectorOrBreak>,

    /// Present when this row carries flag "S" over a sub-range.
    pub release_window: Option<ReleaseWindow>,
}
