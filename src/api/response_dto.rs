use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::controller::{Role, ShiftCode};
use crate::domain::ids::{ControllerId, SessionId};
use crate::domain::run::{SolutionStatus, Statistics};
use crate::domain::sector::SectorPosition;
use crate::domain::session::NavigationInfo;

/// Echo of one input row, rendered for the UI alongside the optimized
/// grid so an operator can compare before/after (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialAssignmentRow {
    pub controller_id: ControllerId,
    pub display_name: String,
    pub shift_code: ShiftCode,
    pub date: String,
    pub slot_from: i64,
    pub slot_to: i64,
    pub sector: Option<SectorPosition>,
    pub role: Role,
    pub flag: Option<String>,
    pub ordering_index: i64,
    pub partner_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedResultRow {
    pub controller_id: ControllerId,
    pub display_name: String,
    pub shift_code: ShiftCode,
    pub date: String,
    pub slot_from: i64,
    pub slot_to: i64,
    pub sector: Option<SectorPosition>,
    pub role: Role,
    pub flag: Option<String>,
    pub ordering_index: i64,
    pub partner_code: Option<String>,
    pub vreme_start: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub navigation: NavigationInfo,
}

/// The full response for both the plain and session-scoped requests
/// (spec §6); `session` is `None` for a plain, non-session-scoped call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeResponse {
    pub optimized_results: Vec<OptimizedResultRow>,
    pub initial_assignments: Vec<InitialAssignmentRow>,
    /// Keyed by `"{from}|{to}"`, e.g. `"TX:A1,A2 | LU:B1"`.
    pub configuration_labels: BTreeMap<String, String>,
    /// Keyed by the same `"{from}|{to}"`.
    pub shortage_by_slot: BTreeMap<String, u32>,
    pub statistics: Statistics,
    pub status: SolutionStatus,
    pub session: Option<SessionInfo>,
}
