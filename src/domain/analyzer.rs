use std::collections::HashMap;

use crate::domain::constraints::ModelContext;
use crate::domain::controller::Role;
use crate::domain::ids::ControllerId;
use crate::domain::run::SolutionStatus;
use crate::domain::sector::SectorPosition;

/// One slot whose on-duty headcount can't cover its required sectors,
/// emitted before the solve is even attempted (spec §4.8).
#[derive(Debug, Clone)]
pub struct CapacityWarning {
    pub slot_index: usize,
    pub available: usize,
    pub required: usize,
    pub available_by_role: HashMap<Role, Vec<ControllerId>>,
    pub required_sectors: Vec<SectorPosition>,
}

/// Scans every slot for `available < required` and logs + collects a
/// warning for each. Never aborts the solve — purely diagnostic.
pub fn pre_solve_check(ctx: &ModelContext) -> Vec<CapacityWarning> {
    let mut warnings = Vec::new();

    for slot in ctx.slots {
        let required_sectors = ctx.required.at(slot.index);
        let required = required_sectors.len();

        let mut available_by_role: HashMap<Role, Vec<ControllerId>> = HashMap::new();
        for (controller_idx, controller) in ctx.controllers.iter().enumerate() {
            if ctx.on_duty(controller_idx, slot.index) {
                available_by_role.entry(controller.role).or_default().push(controller.id.clone());
            }
        }
        let available: usize = available_by_role.values().map(Vec::len).sum();

        if available < required {
            log::warn!(
                "slot {} [{}, {}): available {} < required {} ({:?})",
                slot.index,
                slot.start,
                slot.end,
                available,
                required,
                required_sectors.iter().map(ToString::to_string).collect::<Vec<_>>()
            );
            warnings.push(CapacityWarning { slot_index: slot.index, available, required, available_by_role, required_sectors: required_sectors.to_vec() });
        }
    }

    warnings
}

/// Post-mortem classification once the solver reports a non-usable
/// status (spec §4.8).
#[derive(Debug, Clone)]
pub enum InfeasibilityClass {
    /// Total controller headcount can never cover the busiest slot.
    GlobalCapacity { max_required: usize, total_controllers: usize },
    /// Specific slots are short on eligible controllers.
    PerSlotCapacity { slots: Vec<CapacityWarning> },
    /// The deficit is attributable to controllers released (flag S).
    FlagSExcess { slots: Vec<CapacityWarning> },
    /// The solver exhausted its time budget without reaching a verdict.
    TimeLimitExhausted,
}

pub fn classify_infeasibility(ctx: &ModelContext, status: SolutionStatus, warnings: &[CapacityWarning]) -> InfeasibilityClass {
    if status == SolutionStatus::Unknown {
        return InfeasibilityClass::TimeLimitExhausted;
    }

    let max_required = ctx.slots.iter().map(|s| ctx.required.at(s.index).len()).max().unwrap_or(0);
    if ctx.controllers.len() < max_required {
        return InfeasibilityClass::GlobalCapacity { max_required, total_controllers: ctx.controllers.len() };
    }

    let released_is_deficit = warnings.iter().any(|w| {
        let released_count = (0..ctx.controllers.len()).filter(|&c| ctx.in_shift[c][w.slot_index] && ctx.released[c][w.slot_index]).count();
        released_count > 0 && w.available + released_count >= w.required
    });

    if released_is_deficit {
        InfeasibilityClass::FlagSExcess { slots: warnings.to_vec() }
    } else if !warnings.is_empty() {
        InfeasibilityClass::PerSlotCapacity { slots: warnings.to_vec() }
    } else {
        InfeasibilityClass::TimeLimitExhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::constraints::test_support::{build_fixture, controller};
    use crate::domain::controller::{Role, ShiftCode};

    #[test]
    fn pre_solve_check_flags_every_undercapacity_slot() {
        let c1 = controller("c1", Role::Regular, ShiftCode::Day, 0, 1800);
        // Two sectors required, one controller available.
        let fixture = build_fixture(vec![c1], 1, &["LU E", "TX1P"]);
        let ctx = fixture.context();
        let warnings = pre_solve_check(&ctx);

        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].available, 1);
        assert_eq!(warnings[0].required, 2);
    }

    #[test]
    fn pre_solve_check_is_silent_when_capacity_suffices() {
        let c1 = controller("c1", Role::Regular, ShiftCode::Day, 0, 1800);
        let c2 = controller("c2", Role::Regular, ShiftCode::Day, 0, 1800);
        let fixture = build_fixture(vec![c1, c2], 1, &["LU E"]);
        let ctx = fixture.context();
        assert!(pre_solve_check(&ctx).is_empty());
    }

    #[test]
    fn classify_infeasibility_reports_global_capacity_when_nobody_could_ever_cover_peak_demand() {
        let c1 = controller("c1", Role::Regular, ShiftCode::Day, 0, 1800);
        let fixture = build_fixture(vec![c1], 1, &["LU E", "TX1P", "TX2E"]);
        let ctx = fixture.context();
        let warnings = pre_solve_check(&ctx);
        let class = classify_infeasibility(&ctx, SolutionStatus::Infeasible, &warnings);
        assert!(matches!(class, InfeasibilityClass::GlobalCapacity { total_controllers: 1, max_required: 3 }));
    }

    #[test]
    fn classify_infeasibility_reports_time_limit_exhausted_for_unknown_status() {
        let c1 = controller("c1", Role::Regular, ShiftCode::Day, 0, 1800);
        let fixture = build_fixture(vec![c1], 1, &["LU E"]);
        let ctx = fixture.context();
        let class = classify_infeasibility(&ctx, SolutionStatus::Unknown, &[]);
        assert!(matches!(class, InfeasibilityClass::TimeLimitExhausted));
    }
}
