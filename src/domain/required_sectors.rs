use std::collections::BTreeSet;

use crate::domain::config_interval::ConfigurationInterval;
use crate::domain::sector::SectorPosition;
use crate::domain::time_slot::TimeSlot;

/// The deduplicated, sorted set of sector positions required at every
/// slot, derived from the configuration timeline (spec §4.3).
#[derive(Debug, Clone)]
pub struct RequiredSectorMap {
    per_slot: Vec<Vec<SectorPosition>>,
}

impl RequiredSectorMap {
    pub fn build(slots: &[TimeSlot], configs: &[ConfigurationInterval]) -> Self {
        let per_slot = slots
            .iter()
            .map(|slot| {
                let mut set: BTreeSet<SectorPosition> = BTreeSet::new();
                for cfg in configs {
                    if cfg.covers(slot.start) {
                        set.extend(cfg.sectors.iter().cloned());
                    }
                }
                set.into_iter().collect()
            })
            .collect();

        RequiredSectorMap { per_slot }
    }

    pub fn at(&self, slot_index: usize) -> &[SectorPosition] {
        self.per_slot.get(slot_index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.per_slot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.per_slot.is_empty()
    }

    /// Active configuration clusters/codes active at a slot, used to
    /// build the "TX:<codes> | LU:<codes>" response labels (spec §6).
    /// Kept here rather than in the response layer since the label and
    /// the demand set are derived from the same interval scan.
    pub fn labels_at(slots_configs: &[ConfigurationInterval], t: i64) -> Vec<(crate::domain::config_interval::Cluster, String)> {
        slots_configs.iter().filter(|c| c.covers(t)).map(|c| (c.cluster, c.config_code.clone())).collect()
    }
}
