use std::collections::HashMap;

use good_lp::{Variable, variable, ProblemVariables};

use crate::domain::controller::Controller;
use crate::domain::ids::ControllerId;
use crate::domain::required_sectors::RequiredSectorMap;
use crate::domain::sector::SectorPosition;

/// Flat, index-addressed storage for every `x[c,t,s]` decision variable
/// (Design Note 3): one vector per `(slot, sector)` holding the
/// per-controller occupancy variable, plus a separate per-`(controller,
/// slot)` break variable. Lookup is array indexing, not a hash lookup
/// keyed by `(usize, usize, String)`.
#[derive(Debug)]
pub struct VariableIndex {
    controller_order: Vec<ControllerId>,
    controller_slot: HashMap<ControllerId, usize>,

    /// `break_vars[controller_idx][slot_idx]`.
    break_vars: Vec<Vec<Variable>>,

    /// `sector_vars[slot_idx][sector_idx][controller_idx]`.
    sector_vars: Vec<Vec<Vec<Variable>>>,

    /// Per slot: sector -> index into `sector_vars[slot_idx]`, matching
    /// `RequiredSectorMap::at(slot_idx)`'s order.
    sector_slot: Vec<HashMap<SectorPosition, usize>>,
}

impl VariableIndex {
    /// Builds every variable required by C4: a break bit for each
    /// `(controller, slot)` and a sector bit for each `(controller,
    /// slot, s)` with `s` in `required_sectors[slot]`. No variables are
    /// created for sectors outside that set — those assignments are
    /// implicitly excluded from the model.
    pub fn build(vars: &mut ProblemVariables, controllers: &[Controller], num_slots: usize, required: &RequiredSectorMap) -> Self {
        let controller_order: Vec<ControllerId> = controllers.iter().map(|c| c.id.clone()).collect();
        let controller_slot: HashMap<ControllerId, usize> = controller_order.iter().enumerate().map(|(i, id)| (id.clone(), i)).collect();

        let break_vars: Vec<Vec<Variable>> = (0..controllers.len())
            .map(|_| (0..num_slots).map(|_| vars.add(variable().binary())).collect())
            .collect();

        let mut sector_slot: Vec<HashMap<SectorPosition, usize>> = Vec::with_capacity(num_slots);
        let sector_vars: Vec<Vec<Vec<Variable>>> = (0..num_slots)
            .map(|slot_idx| {
                let sectors = required.at(slot_idx);
                let mut index = HashMap::with_capacity(sectors.len());
                let per_sector = sectors
                    .iter()
                    .enumerate()
                    .map(|(sector_idx, sector)| {
                        index.insert(sector.clone(), sector_idx);
                        (0..controllers.len()).map(|_| vars.add(variable().binary())).collect()
                    })
                    .collect();
                sector_slot.push(index);
                per_sector
            })
            .collect();

        VariableIndex { controller_order, controller_slot, break_vars, sector_vars, sector_slot }
    }

    pub fn controller_index(&self, controller_id: &ControllerId) -> usize {
        *self.controller_slot.get(controller_id).unwrap_or_else(|| panic!("unknown controller in variable index: {controller_id}"))
    }

    pub fn controllers(&self) -> &[ControllerId] {
        &self.controller_order
    }

    pub fn num_controllers(&self) -> usize {
        self.controller_order.len()
    }

    pub fn num_slots(&self) -> usize {
        self.break_vars.first().map(Vec::len).unwrap_or(0)
    }

    pub fn break_var(&self, controller_idx: usize, slot_idx: usize) -> Variable {
        self.break_vars[controller_idx][slot_idx]
    }

    pub fn sector_index(&self, slot_idx: usize, sector: &SectorPosition) -> Option<usize> {
        self.sector_slot[slot_idx].get(sector).copied()
    }

    pub fn sector_var(&self, slot_idx: usize, sector_idx: usize, controller_idx: usize) -> Variable {
        self.sector_vars[slot_idx][sector_idx][controller_idx]
    }

    pub fn sector_var_for(&self, slot_idx: usize, sector: &SectorPosition, controller_idx: usize) -> Option<Variable> {
        self.sector_index(slot_idx, sector).map(|sector_idx| self.sector_var(slot_idx, sector_idx, controller_idx))
    }

    /// All sector variables for `(controller_idx, slot_idx)`, in the
    /// same order as `RequiredSectorMap::at(slot_idx)`.
    pub fn sector_vars_for_controller_slot(&self, slot_idx: usize, controller_idx: usize) -> Vec<Variable> {
        self.sector_vars[slot_idx].iter().map(|per_controller| per_controller[controller_idx]).collect()
    }

    /// All controller variables occupying `(slot_idx, sector_idx)`.
    pub fn controllers_at_sector(&self, slot_idx: usize, sector_idx: usize) -> &[Variable] {
        &self.sector_vars[slot_idx][sector_idx]
    }
}
