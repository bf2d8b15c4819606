use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Weights for every soft objective term in §4.6. All defaults mirror the
/// spec's default table; callers may override any subset through the
/// request or a config file without touching the objective builder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectiveWeights {
    pub uncovered_sector: f64,
    pub shift_leader_working: f64,
    pub supervisor_working: f64,
    pub last_hour_work: f64,
    pub short_break: f64,
    pub rotation_violation: f64,
    pub position_rotation_bonus: f64,
    pub sector_continuity_bonus: f64,
    pub excess_controller: f64,
    pub night_break_regular: f64,
    pub night_work_regular: f64,
    pub night_long_break: f64,
    pub night_long_work: f64,
    pub night_workload_spread: f64,
    pub fmp_on_fmp_sector: f64,
    pub fmp_elsewhere: f64,
    pub unlicensed_fmp_working: f64,
    pub non_fmp_on_fmp_sector: f64,
    pub preferred_four_slot_block: f64,
    pub fragmented_work: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            uncovered_sector: 50_000_000.0,
            shift_leader_working: 50.0,
            supervisor_working: 30.0,
            last_hour_work: 500.0,
            short_break: 300.0,
            rotation_violation: 200.0,
            position_rotation_bonus: -100.0,
            sector_continuity_bonus: -200.0,
            excess_controller: 100_000.0,
            night_break_regular: -1_000.0,
            night_work_regular: 800.0,
            night_long_break: -2_000.0,
            night_long_work: 3_000.0,
            night_workload_spread: 1_000.0,
            fmp_on_fmp_sector: -500.0,
            fmp_elsewhere: 200.0,
            unlicensed_fmp_working: 5_000.0,
            non_fmp_on_fmp_sector: 2_000.0,
            preferred_four_slot_block: -20.0,
            fragmented_work: 30.0,
        }
    }
}

/// Default solver knobs, overridable per request (spec §4.7 / §6).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SolverDefaults {
    pub max_execution_seconds: u64,
    pub workers: u32,
    pub relative_gap: f64,
}

impl Default for SolverDefaults {
    fn default() -> Self {
        Self { max_execution_seconds: 30, workers: 8, relative_gap: 0.02 }
    }
}

/// Top-level, layered configuration for the engine. In a deployed service
/// this is assembled from defaults, a config file, and environment
/// overrides (the common three-layer shape used across the example
/// pack); here it is constructed directly, since config-file/env loading
/// is an outer-surface concern this crate does not own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RosterEngineConfig {
    /// Width of one discretized time slot, in seconds. Default 30 minutes.
    pub slot_width_seconds: i64,

    pub weights: ObjectiveWeights,
    pub solver: SolverDefaults,

    /// Sessions idle this long are swept by the expiry task (spec §4.9, §5).
    pub session_idle_seconds: u64,

    /// How often the expiry task wakes up to sweep idle sessions.
    pub session_expiry_sweep_seconds: u64,
}

impl Default for RosterEngineConfig {
    fn default() -> Self {
        Self {
            slot_width_seconds: 1_800,
            weights: ObjectiveWeights::default(),
            solver: SolverDefaults::default(),
            session_idle_seconds: 12 * 3_600,
            session_expiry_sweep_seconds: 2 * 3_600,
        }
    }
}

impl RosterEngineConfig {
    pub fn session_idle_duration(&self) -> Duration {
        Duration::from_secs(self.session_idle_seconds)
    }

    pub fn session_expiry_sweep_duration(&self) -> Duration {
        Duration::from_secs(self.session_expiry_sweep_seconds)
    }
}
