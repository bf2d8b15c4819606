use serde::{Deserialize, Serialize};

use crate::domain::controller::{Role, ShiftCode};
use crate::domain::ids::ControllerId;
use crate::domain::sector::SectorPosition;

/// The solver's verdict on one run, mirrors §4.7's four-way status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolutionStatus {
    Optimal,
    Feasible,
    Infeasible,
    Unknown,
}

impl SolutionStatus {
    pub fn is_usable(&self) -> bool {
        matches!(self, SolutionStatus::Optimal | SolutionStatus::Feasible)
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            SolutionStatus::Optimal => "optimal",
            SolutionStatus::Feasible => "feasible",
            SolutionStatus::Infeasible => "infeasible - see diagnostics",
            SolutionStatus::Unknown => "unknown",
        }
    }
}

/// The solver parameters that produced a run, stored by value on the
/// run itself rather than referenced back to the originating request
/// (Design Note 6 — no cyclic run/session/parameters references).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunParameters {
    pub max_execution_seconds: u64,
    pub max_optimal_solutions: Option<u32>,
    pub max_zero_shortage: Option<u32>,
    pub use_lns: bool,
    pub use_manual_assignments: bool,
    pub use_randomization: bool,
    pub seed: Option<u64>,
}

/// One resolved `(controller, slot)` cell in the output grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedCell {
    pub controller_id: ControllerId,
    pub display_name: String,
    pub shift_code: ShiftCode,
    pub date: String,
    pub slot_from: i64,
    pub slot_to: i64,
    /// `None` means break; a marker-tagged empty cell is used instead
    /// for M-coded controllers in their trimmed tail (spec §4.7).
    pub sector: Option<SectorPosition>,
    pub role: Role,
    pub flag: Option<String>,
    pub ordering_index: i64,
    pub partner_code: Option<String>,
    pub vreme_start: i64,
    /// Set for an M-coded controller's trimmed-tail slot with no pin.
    pub trimmed_tail_marker: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub success_rate: f64,
    pub slots_with_shortage: u32,
    pub slots_with_excess: u32,
    pub missing_executors: u32,
    pub max_work_hour_difference: f64,
    pub break_compliance: f64,
    pub rotation_compliance: f64,
    pub employees_with_shortage: u32,
    pub solution_status: SolutionStatus,
}

/// One completed optimization attempt, owned by its session (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationRun {
    pub run_id: u64,
    pub status: SolutionStatus,
    pub objective_value: Option<f64>,
    pub wall_time_seconds: f64,
    pub results: Vec<OptimizedCell>,
    /// Keyed by `"{from}|{to}"` (spec §6).
    pub shortage_by_slot: std::collections::BTreeMap<String, u32>,
    pub statistics: Statistics,
    pub description: String,
    pub parameters: RunParameters,
}

impl OptimizationRun {
    pub fn success_rate(&self) -> f64 {
        self.statistics.success_rate
    }

    pub fn shortage_count(&self) -> u32 {
        self.shortage_by_slot.values().sum()
    }
}
