use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::controller::Role;
use crate::domain::ids::{ControllerId, SessionId};

/// A new-optimization request (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeRequest {
    pub date: String,
    pub shift: String,
    pub max_execution_seconds: u64,
    pub max_optimal_solutions: Option<u32>,
    pub max_zero_shortage: Option<u32>,
    #[serde(default)]
    pub use_lns: bool,
    #[serde(default)]
    pub workplace_whitelist: Option<HashSet<Role>>,
    #[serde(default)]
    pub controller_whitelist: Option<HashSet<ControllerId>>,
    #[serde(default)]
    pub use_manual_assignments: bool,
    pub seed: Option<u64>,
    #[serde(default)]
    pub use_randomization: bool,
}

/// Same request, scoped to an existing session (spec §6): the new run
/// is appended to `session_id` instead of starting a fresh one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeInSessionRequest {
    pub session_id: SessionId,
    #[serde(flatten)]
    pub request: OptimizeRequest,
    pub description: Option<String>,
}
