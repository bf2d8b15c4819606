//! Scenario S2 (spec §8): a shift-leader and a supervisor can never
//! both be working the same slot, and only the licensed FMP controller
//! may occupy the FMP sector.

use atc_roster_engine::api::request_dto::OptimizeRequest;
use atc_roster_engine::config::RosterEngineConfig;
use atc_roster_engine::domain::config_interval::{Cluster, ConfigurationInterval};
use atc_roster_engine::domain::controller::{Role, ShiftCode};
use atc_roster_engine::domain::engine;
use atc_roster_engine::domain::external::{InitialScheduleRow, StaticDataSource};
use atc_roster_engine::domain::ids::ControllerId;
use atc_roster_engine::domain::sector::SectorPosition;

const SLOT: i64 = 1800;
const SHIFT_END: i64 = 3 * SLOT;

fn row(id: &str, role: Role) -> InitialScheduleRow {
    InitialScheduleRow {
        controller_id: ControllerId::new(id),
        display_name: id.to_string(),
        date: "2026-07-27".into(),
        role,
        shift_code: ShiftCode::Day,
        vreme_start: 0,
        shift_start: 0,
        shift_end: SHIFT_END,
        pinned_sector: None,
        release_window: None,
        ordering_index: 0,
        partner_code: None,
    }
}

fn fixture() -> StaticDataSource {
    StaticDataSource::new()
        .with_shift_duration("2026-07-27", "J", 0, SHIFT_END)
        .with_rows(vec![row("c1", Role::ShiftLeader), row("c2", Role::Supervisor), row("c3", Role::FlowManagement)])
        .with_licensed(vec![ControllerId::new("c3")])
        .with_configurations(vec![ConfigurationInterval {
            from: 0,
            to: SHIFT_END,
            cluster: Cluster::All,
            config_code: "MIX".into(),
            sectors: vec![SectorPosition::new("TX1E"), SectorPosition::new("FMP")],
            ordering: 0,
        }])
}

#[tokio::test]
async fn shift_leader_and_supervisor_never_both_work_and_only_c3_covers_fmp() {
    let data_source = fixture();
    let config = RosterEngineConfig::default();

    let request = OptimizeRequest {
        date: "2026-07-27".into(),
        shift: "J".into(),
        max_execution_seconds: 10,
        max_optimal_solutions: None,
        max_zero_shortage: None,
        use_lns: false,
        workplace_whitelist: None,
        controller_whitelist: None,
        use_manual_assignments: true,
        seed: Some(7),
        use_randomization: false,
    };

    let response = engine::optimize(&data_source, &config, request).await.expect("model should solve");

    let mut working_leaders_supervisors_by_slot: std::collections::HashMap<(i64, i64), usize> = std::collections::HashMap::new();
    let mut fmp_occupant_by_slot: std::collections::HashMap<(i64, i64), String> = std::collections::HashMap::new();

    for cell in &response.optimized_results {
        let Some(sector) = &cell.sector else { continue };
        let key = (cell.slot_from, cell.slot_to);

        if matches!(cell.role, Role::ShiftLeader | Role::Supervisor) {
            *working_leaders_supervisors_by_slot.entry(key).or_default() += 1;
        }
        if sector.is_fmp() {
            fmp_occupant_by_slot.insert(key, cell.controller_id.to_string());
            assert_eq!(cell.controller_id.to_string(), "c3", "only the licensed FMP controller may occupy an FMP sector");
        }
    }

    for (_slot, working) in working_leaders_supervisors_by_slot {
        assert!(working <= 1, "a shift-leader and a supervisor must never both be working the same slot");
    }

    assert_eq!(fmp_occupant_by_slot.len(), 3, "c3 should cover FMP in every slot to avoid the uncovered-sector penalty");
}
