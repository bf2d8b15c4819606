use std::collections::{HashMap, HashSet};

use crate::domain::controller::Role;
use crate::domain::ids::ControllerId;
use crate::domain::required_sectors::RequiredSectorMap;
use crate::domain::sector::{SectorOrBreak, SectorPosition};
use crate::domain::shift_row::{ReleaseWindow, ShiftRow};
use crate::domain::time_slot::TimeSlot;

/// Caller-supplied filters applied before modeling (spec §4.2).
#[derive(Debug, Clone, Default)]
pub struct StagingFilters {
    pub role_whitelist: Option<HashSet<Role>>,
    pub controller_whitelist: Option<HashSet<ControllerId>>,
    pub use_manual_assignments: bool,
}

/// The output of input staging: the filtered rows plus the two lookup
/// tables every downstream component (C3–C6) consults.
#[derive(Debug, Clone, Default)]
pub struct StagedInput {
    pub rows: Vec<ShiftRow>,

    /// `pin[c][t] = sector-or-break`, keyed by `(ControllerId, slot index)`.
    pub pin_by_controller_slot: HashMap<(ControllerId, usize), SectorOrBreak>,

    /// `pinned_sector_at[t][s] = c`, only for sectors in `required_sectors[t]`.
    pub pinned_controller_by_slot_sector: HashMap<(usize, SectorPosition), ControllerId>,

    /// Release ("flag S") windows per controller.
    pub release_windows: HashMap<ControllerId, Vec<ReleaseWindow>>,

    /// Pins whose sector was not required at that slot — logged and
    /// skipped (spec §4.5.3), kept here so callers/tests can assert on
    /// what was dropped without scraping log output.
    pub skipped_pins: Vec<(ControllerId, usize, SectorPosition)>,
}

/// Applies the role/controller whitelists and the manual-pin toggle,
/// then builds the pin lookup tables used by C3–C6.
pub fn stage_input(mut rows: Vec<ShiftRow>, controllers: &HashMap<ControllerId, Role>, filters: &StagingFilters, slots: &[TimeSlot], required: &RequiredSectorMap) -> StagedInput {
    if let Some(roles) = &filters.role_whitelist {
        rows.retain(|r| controllers.get(&r.controller_id).map(|role| roles.contains(role)).unwrap_or(false));
    }
    if let Some(ids) = &filters.controller_whitelist {
        rows.retain(|r| ids.contains(&r.controller_id));
    }
    if !filters.use_manual_assignments {
        for row in &mut rows {
            row.pinned_sector = None;
        }
    }

    let mut pin_by_controller_slot = HashMap::new();
    let mut pinned_controller_by_slot_sector = HashMap::new();
    let mut release_windows: HashMap<ControllerId, Vec<ReleaseWindow>> = HashMap::new();
    let mut skipped_pins = Vec::new();

    for row in &rows {
        if let Some(window) = row.release_window {
            release_windows.entry(row.controller_id.clone()).or_default().push(window);
        }

        let Some(pin) = &row.pinned_sector else { continue };

        for slot in slots {
            if slot.start < row.shift_start || slot.start >= row.shift_end {
                continue;
            }

            match pin {
                SectorOrBreak::Break => {
                    pin_by_controller_slot.insert((row.controller_id.clone(), slot.index), SectorOrBreak::Break);
                }
                SectorOrBreak::Sector(sector) => {
                    if required.at(slot.index).contains(sector) {
                        pin_by_controller_slot.insert((row.controller_id.clone(), slot.index), pin.clone());
                        pinned_controller_by_slot_sector.insert((slot.index, sector.clone()), row.controller_id.clone());
                    } else {
                        tracing::warn!("manual pin skipped: controller {} pinned to sector '{}' at slot {}, which is not required at that slot", row.controller_id, sector, slot.index);
                        skipped_pins.push((row.controller_id.clone(), slot.index, sector.clone()));
                    }
                }
            }
        }
    }

    StagedInput { rows, pin_by_controller_slot, pinned_controller_by_slot_sector, release_windows, skipped_pins }
}

impl StagedInput {
    pub fn pin_at(&self, controller_id: &ControllerId, slot_index: usize) -> Option<&SectorOrBreak> {
        self.pin_by_controller_slot.get(&(controller_id.clone(), slot_index))
    }

    pub fn is_released(&self, controller_id: &ControllerId, slot: &TimeSlot) -> bool {
        self.release_windows.get(controller_id).map(|windows| crate::domain::time_slot::has_flag_s(windows, slot)).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config_interval::{Cluster, ConfigurationInterval};
    use crate::domain::controller::ShiftCode;
    use tracing_test::traced_test;

    fn row(controller: &str, pinned: Option<&str>) -> ShiftRow {
        ShiftRow {
            controller_id: ControllerId::new(controller),
            date: "2026-07-27".into(),
            shift_start: 0,
            shift_end: 3600,
            shift_code: ShiftCode::Day,
            pinned_sector: pinned.map(|s| SectorOrBreak::Sector(SectorPosition::new(s))),
            release_window: None,
        }
    }

    fn required_map() -> RequiredSectorMap {
        let slots = crate::domain::time_slot::build_slots(0, 3600, 1800);
        let configs = vec![ConfigurationInterval { from: 0, to: 3600, cluster: Cluster::Lu, config_code: "LU1".into(), sectors: vec![SectorPosition::new("LU E")], ordering: 0 }];
        RequiredSectorMap::build(&slots, &configs)
    }

    #[test]
    fn a_pin_on_a_required_sector_is_kept() {
        let slots = crate::domain::time_slot::build_slots(0, 3600, 1800);
        let required = required_map();
        let rows = vec![row("c1", Some("LU E"))];
        let roles = HashMap::from([(ControllerId::new("c1"), Role::Regular)]);
        let staged = stage_input(rows, &roles, &StagingFilters { use_manual_assignments: true, ..Default::default() }, &slots, &required);

        assert_eq!(staged.pin_at(&ControllerId::new("c1"), 0), Some(&SectorOrBreak::Sector(SectorPosition::new("LU E"))));
        assert!(staged.skipped_pins.is_empty());
    }

    #[test]
    fn a_pin_on_a_sector_not_required_at_that_slot_is_skipped_not_hard_failed() {
        let slots = crate::domain::time_slot::build_slots(0, 3600, 1800);
        let required = required_map();
        let rows = vec![row("c1", Some("TX1P"))];
        let roles = HashMap::from([(ControllerId::new("c1"), Role::Regular)]);
        let staged = stage_input(rows, &roles, &StagingFilters { use_manual_assignments: true, ..Default::default() }, &slots, &required);

        assert_eq!(staged.pin_at(&ControllerId::new("c1"), 0), None);
        assert_eq!(staged.skipped_pins.len(), 2, "one skip per slot the pinned row spans");
    }

    #[traced_test]
    #[test]
    fn a_skipped_pin_is_logged_as_a_warning() {
        let slots = crate::domain::time_slot::build_slots(0, 3600, 1800);
        let required = required_map();
        let rows = vec![row("c1", Some("TX1P"))];
        let roles = HashMap::from([(ControllerId::new("c1"), Role::Regular)]);
        stage_input(rows, &roles, &StagingFilters { use_manual_assignments: true, ..Default::default() }, &slots, &required);

        assert!(logs_contain("manual pin skipped"));
    }

    #[test]
    fn disabling_manual_assignments_nulls_every_pin_before_staging() {
        let slots = crate::domain::time_slot::build_slots(0, 3600, 1800);
        let required = required_map();
        let rows = vec![row("c1", Some("LU E"))];
        let roles = HashMap::from([(ControllerId::new("c1"), Role::Regular)]);
        let staged = stage_input(rows, &roles, &StagingFilters { use_manual_assignments: false, ..Default::default() }, &slots, &required);

        assert_eq!(staged.pin_at(&ControllerId::new("c1"), 0), None);
    }

    #[test]
    fn role_whitelist_filters_rows_before_pins_are_built() {
        let slots = crate::domain::time_slot::build_slots(0, 3600, 1800);
        let required = required_map();
        let rows = vec![row("c1", Some("LU E")), row("c2", Some("LU E"))];
        let roles = HashMap::from([(ControllerId::new("c1"), Role::Regular), (ControllerId::new("c2"), Role::Supervisor)]);
        let filters = StagingFilters { role_whitelist: Some(HashSet::from([Role::Supervisor])), use_manual_assignments: true, ..Default::default() };
        let staged = stage_input(rows, &roles, &filters, &slots, &required);

        assert_eq!(staged.rows.len(), 1);
        assert_eq!(staged.rows[0].controller_id, ControllerId::new("c2"));
    }
}
