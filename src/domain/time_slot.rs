use crate::domain::controller::{Controller, ShiftCode};
use crate::domain::sector::SectorOrBreak;
use crate::domain::shift_row::ReleaseWindow;

/// One half-open `[start, end)` unit of the discretized shift timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub index: usize,
    pub start: i64,
    pub end: i64,
}

/// Builds the ordered, contiguous slot vector covering `[window_start,
/// window_end)` at the given width (spec §4.1). The caller is
/// responsible for widening the window beyond the raw shift bounds to
/// cover any manual pins on neighboring shifts before calling this.
pub fn build_slots(window_start: i64, window_end: i64, slot_width_seconds: i64) -> Vec<TimeSlot> {
    assert!(slot_width_seconds > 0, "slot width must be positive");

    let mut slots = Vec::new();
    let mut t = window_start;
    let mut index = 0usize;
    while t < window_end {
        let end = (t + slot_width_seconds).min(window_end);
        slots.push(TimeSlot { index, start: t, end });
        t += slot_width_seconds;
        index += 1;
    }
    slots
}

/// The number of trailing slots a "Morning" shift trims to out-of-shift
/// absent a manual pin (spec §4.1).
pub const MORNING_TAIL_TRIM_SLOTS: usize = 2;

/// True iff controller `c` is in-shift at `slot`, applying the
/// morning-shift tail trim and its manual-pin override.
///
/// `pinned_at_slot` is the controller's manual pin for this slot, if
/// any (from the C2 staging pass) — a pin onto a working sector keeps a
/// trimmed-tail Morning controller in-shift; a break pin or no pin does
/// not.
pub fn is_in_shift(controller: &Controller, slot: &TimeSlot, total_slots: usize, pinned_at_slot: Option<&SectorOrBreak>) -> bool {
    let within_bounds = slot.start >= controller.shift_start && slot.start < controller.shift_end;
    if !within_bounds {
        return false;
    }

    if controller.shift_code != ShiftCode::Morning {
        return true;
    }

    let in_trimmed_tail = total_slots >= MORNING_TAIL_TRIM_SLOTS && slot.index + MORNING_TAIL_TRIM_SLOTS >= total_slots;
    if !in_trimmed_tail {
        return true;
    }

    matches!(pinned_at_slot, Some(SectorOrBreak::Sector(_)))
}

/// True iff controller `c` is released (flag "S") at `slot` under any
/// of their shift rows.
pub fn has_flag_s(windows: &[ReleaseWindow], slot: &TimeSlot) -> bool {
    windows.iter().any(|w| w.contains(slot.start))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::controller::Role;
    use crate::domain::ids::ControllerId;

    fn controller(shift_code: ShiftCode, shift_start: i64, shift_end: i64) -> Controller {
        Controller {
            id: ControllerId::new("c1"),
            display_name: "Test".into(),
            role: Role::Regular,
            shift_code,
            has_license: false,
            shift_start,
            shift_end,
            vreme_start: shift_start,
            ordering_index: 0,
            partner_code: None,
        }
    }

    #[test]
    fn build_slots_is_contiguous_and_half_open() {
        let slots = build_slots(0, 7200, 1800);
        assert_eq!(slots.len(), 4);
        assert_eq!(slots[0], TimeSlot { index: 0, start: 0, end: 1800 });
        assert_eq!(slots[3], TimeSlot { index: 3, start: 5400, end: 7200 });
    }

    #[test]
    fn build_slots_clamps_a_partial_final_slot() {
        let slots = build_slots(0, 2500, 1800);
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[1].end, 2500);
    }

    #[test]
    fn non_morning_controller_ignores_tail_trim() {
        let c = controller(ShiftCode::Day, 0, 7200);
        let slots = build_slots(0, 7200, 1800);
        for slot in &slots {
            assert!(is_in_shift(&c, slot, slots.len(), None));
        }
    }

    #[test]
    fn morning_controller_is_trimmed_in_last_two_slots_absent_a_pin() {
        let c = controller(ShiftCode::Morning, 0, 7200);
        let slots = build_slots(0, 7200, 1800);
        assert!(is_in_shift(&c, &slots[0], slots.len(), None));
        assert!(is_in_shift(&c, &slots[1], slots.len(), None));
        assert!(!is_in_shift(&c, &slots[2], slots.len(), None));
        assert!(!is_in_shift(&c, &slots[3], slots.len(), None));
    }

    #[test]
    fn a_working_pin_on_the_trimmed_tail_restores_in_shift_status() {
        let c = controller(ShiftCode::Morning, 0, 7200);
        let slots = build_slots(0, 7200, 1800);
        let pin = SectorOrBreak::Sector(crate::domain::sector::SectorPosition::new("LU E"));
        assert!(is_in_shift(&c, &slots[3], slots.len(), Some(&pin)));
    }

    #[test]
    fn a_break_pin_on_the_trimmed_tail_does_not_restore_in_shift_status() {
        let c = controller(ShiftCode::Morning, 0, 7200);
        let slots = build_slots(0, 7200, 1800);
        let pin = SectorOrBreak::Break;
        assert!(!is_in_shift(&c, &slots[3], slots.len(), Some(&pin)));
    }

    #[test]
    fn flag_s_matches_only_within_the_release_window() {
        let windows = vec![ReleaseWindow { from: 1800, to: 3600 }];
        let slots = build_slots(0, 7200, 1800);
        assert!(!has_flag_s(&windows, &slots[0]));
        assert!(has_flag_s(&windows, &slots[1]));
        assert!(!has_flag_s(&windows, &slots[2]));
    }
}
