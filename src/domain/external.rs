use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::config_interval::ConfigurationInterval;
use crate::domain::controller::{Role, ShiftCode};
use crate::domain::ids::ControllerId;
use crate::domain::sector::SectorOrBreak;
use crate::domain::shift_row::ReleaseWindow;
use crate::error::Result;

/// One row of `initial_schedule`'s flattened table (spec §6): controller
/// identity/role metadata and this slot's pin/flag, all in one record
/// the way the upstream system actually returns it. C2 splits this into
/// the distinct `Controller` and `ShiftRow` entities spec §3 describes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialScheduleRow {
    pub controller_id: ControllerId,
    pub display_name: String,
    pub date: String,
    pub role: Role,
    pub shift_code: ShiftCode,
    pub vreme_start: i64,
    pub shift_start: i64,
    pub shift_end: i64,
    pub pinned_sector: Option<SectorOrBreak>,
    pub release_window: Option<ReleaseWindow>,
    pub ordering_index: i64,
    pub partner_code: Option<String>,
}

/// The four external data operations C2 consumes (spec §6), abstracted
/// so the engine crate depends on none of a real persistence backend's
/// machinery. A production adapter implements this against whatever
/// store backs it; `StaticDataSource` below stands in for that adapter
/// in tests, mirroring the teacher's `MockSimulator`.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn shift_duration(&self, date: &str, shift: &str) -> Result<Option<(i64, i64)>>;
    async fn initial_schedule(&self, from: i64, to: i64) -> Result<Vec<InitialScheduleRow>>;
    async fn configuration_timeline(&self, from: i64, to: i64) -> Result<Vec<ConfigurationInterval>>;
    async fn licensed_controllers(&self) -> Result<Vec<ControllerId>>;
}

/// An in-memory `DataSource` backed by fixed fixtures, used by the
/// integration tests under `tests/` for the end-to-end scenarios in
/// spec §8.
#[derive(Debug, Clone, Default)]
pub struct StaticDataSource {
    pub shift_durations: std::collections::HashMap<(String, String), (i64, i64)>,
    pub rows: Vec<InitialScheduleRow>,
    pub configurations: Vec<ConfigurationInterval>,
    pub licensed: Vec<ControllerId>,
}

impl StaticDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shift_duration(mut self, date: impl Into<String>, shift: impl Into<String>, start: i64, end: i64) -> Self {
        self.shift_durations.insert((date.into(), shift.into()), (start, end));
        self
    }

    pub fn with_rows(mut self, rows: Vec<InitialScheduleRow>) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_configurations(mut self, configs: Vec<ConfigurationInterval>) -> Self {
        self.configurations = configs;
        self
    }

    pub fn with_licensed(mut self, ids: Vec<ControllerId>) -> Self {
        self.licensed = ids;
        self
    }
}

#[async_trait]
impl DataSource for StaticDataSource {
    async fn shift_duration(&self, date: &str, shift: &str) -> Result<Option<(i64, i64)>> {
        Ok(self.shift_durations.get(&(date.to_string(), shift.to_string())).copied())
    }

    async fn initial_schedule(&self, from: i64, to: i64) -> Result<Vec<InitialScheduleRow>> {
        Ok(self.rows.iter().filter(|r| r.shift_start < to && r.shift_end > from).cloned().collect())
    }

    async fn configuration_timeline(&self, from: i64, to: i64) -> Result<Vec<ConfigurationInterval>> {
        Ok(self.configurations.iter().filter(|c| c.from < to && c.to > from).cloned().collect())
    }

    async fn licensed_controllers(&self) -> Result<Vec<ControllerId>> {
        Ok(self.licensed.clone())
    }
}
