use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};

use crate::domain::ids::SessionId;
use crate::domain::run::{OptimizationRun, SolutionStatus};
use crate::error::{Error, Result};

new_key_type! {
    struct SessionKey;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationInfo {
    pub current_index: isize,
    pub total: usize,
    pub can_go_prev: bool,
    pub can_go_next: bool,
    pub description: Option<String>,
    pub status: Option<SolutionStatus>,
    pub objective_value: Option<f64>,
    pub success_rate: Option<f64>,
    pub shortage_count: Option<u32>,
}

#[derive(Debug)]
struct Session {
    id: SessionId,
    date: String,
    shift: String,
    created_at: Instant,
    last_accessed: Instant,
    runs: Vec<OptimizationRun>,
    /// Invariant: `-1 <= current_index < runs.len() as isize`.
    current_index: isize,
    next_run_id: u64,
}

impl Session {
    fn current(&self) -> Option<&OptimizationRun> {
        usize::try_from(self.current_index).ok().and_then(|i| self.runs.get(i))
    }

    fn navigation_info(&self) -> NavigationInfo {
        let total = self.runs.len();
        NavigationInfo {
            current_index: self.current_index,
            total,
            can_go_prev: self.current_index > 0,
            can_go_next: (self.current_index + 1) < total as isize,
            description: self.current().map(|r| r.description.clone()),
            status: self.current().map(|r| r.status),
            objective_value: self.current().and_then(|r| r.objective_value),
            success_rate: self.current().map(OptimizationRun::success_rate),
            shortage_count: self.current().map(OptimizationRun::shortage_count),
        }
    }
}

#[derive(Debug)]
struct StoreInner {
    slots: SlotMap<SessionKey, Session>,
    id_index: HashMap<SessionId, SessionKey>,
}

/// Thread-safe map from session id to session (spec §4.9, §5). Grounded
/// on the teacher's `ReservationStore`: a single `RwLock` guarding both
/// the slot map and its name index, rather than one lock per entry.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore { inner: Arc::new(RwLock::new(StoreInner { slots: SlotMap::with_key(), id_index: HashMap::new() })) }
    }

    pub fn create(&self, date: String, shift: String) -> SessionId {
        let id = SessionId::new(uuid::Uuid::new_v4().to_string());
        let now = Instant::now();
        let session = Session { id: id.clone(), date, shift, created_at: now, last_accessed: now, runs: Vec::new(), current_index: -1, next_run_id: 1 };

        let mut guard = self.inner.write().expect("session store lock poisoned");
        let key = guard.slots.insert(session);
        guard.id_index.insert(id.clone(), key);
        id
    }

    pub fn add_run(&self, id: &SessionId, mut run: OptimizationRun, description: Option<String>) -> Result<u64> {
        let mut guard = self.inner.write().expect("session store lock poisoned");
        let key = *guard.id_index.get(id).ok_or_else(|| Error::SessionNotFound(id.to_string()))?;
        let session = guard.slots.get_mut(key).ok_or_else(|| Error::SessionNotFound(id.to_string()))?;

        run.run_id = session.next_run_id;
        session.next_run_id += 1;
        if description.as_deref().is_some_and(|d| !d.is_empty()) {
            run.description = description.unwrap();
        } else if run.description.is_empty() {
            run.description = format!("{} {} run #{}", session.date, session.shift, run.run_id);
        }

        session.runs.push(run);
        session.current_index = session.runs.len() as isize - 1;
        session.last_accessed = Instant::now();
        Ok(session.runs[session.current_index as usize].run_id)
    }

    pub fn navigate_next(&self, id: &SessionId) -> Result<NavigationInfo> {
        self.with_session_mut(id, |session| {
            let max = session.runs.len() as isize - 1;
            session.current_index = (session.current_index + 1).min(max);
            session.navigation_info()
        })
    }

    pub fn navigate_prev(&self, id: &SessionId) -> Result<NavigationInfo> {
        self.with_session_mut(id, |session| {
            if !session.runs.is_empty() {
                session.current_index = (session.current_index - 1).max(0);
            }
            session.navigation_info()
        })
    }

    pub fn navigation_info(&self, id: &SessionId) -> Result<NavigationInfo> {
        self.with_session_mut(id, Session::navigation_info)
    }

    pub fn load_run(&self, id: &SessionId, run_id: u64) -> Result<NavigationInfo> {
        self.with_session_mut(id, |session| -> Result<NavigationInfo> {
            let index = session.runs.iter().position(|r| r.run_id == run_id).ok_or_else(|| Error::RunNotFound { session_id: session.id.to_string(), run_id })?;
            session.current_index = index as isize;
            Ok(session.navigation_info())
        })?
    }

    pub fn best_run(&self, id: &SessionId) -> Result<Option<OptimizationRun>> {
        let guard = self.inner.read().expect("session store lock poisoned");
        let key = *guard.id_index.get(id).ok_or_else(|| Error::SessionNotFound(id.to_string()))?;
        let session = guard.slots.get(key).ok_or_else(|| Error::SessionNotFound(id.to_string()))?;

        let best = session
            .runs
            .iter()
            .filter(|r| r.status.is_usable())
            .max_by(|a, b| {
                a.success_rate()
                    .partial_cmp(&b.success_rate())
                    .unwrap()
                    .then(b.shortage_count().cmp(&a.shortage_count()))
                    .then_with(|| b.objective_value.unwrap_or(f64::INFINITY).partial_cmp(&a.objective_value.unwrap_or(f64::INFINITY)).unwrap())
            })
            .cloned();
        Ok(best)
    }

    /// Removes every session whose last access predates `idle_for`.
    /// Invoked by the background expiry task (spec §4.9, §5).
    pub fn sweep_expired(&self, idle_for: Duration) -> usize {
        let mut guard = self.inner.write().expect("session store lock poisoned");
        let now = Instant::now();
        let expired: Vec<SessionKey> = guard.slots.iter().filter(|(_, s)| now.duration_since(s.last_accessed) > idle_for).map(|(k, _)| k).collect();

        for key in &expired {
            if let Some(session) = guard.slots.remove(*key) {
                guard.id_index.remove(&session.id);
            }
        }
        expired.len()
    }

    fn with_session_mut<T>(&self, id: &SessionId, f: impl FnOnce(&mut Session) -> T) -> Result<T> {
        let mut guard = self.inner.write().expect("session store lock poisoned");
        let key = *guard.id_index.get(id).ok_or_else(|| Error::SessionNotFound(id.to_string()))?;
        let session = guard.slots.get_mut(key).ok_or_else(|| Error::SessionNotFound(id.to_string()))?;
        session.last_accessed = Instant::now();
        Ok(f(session))
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to the background expiry sweep (spec §5, §9 Design Note 7):
/// signal `token` and await `handle` to shut the task down cleanly.
pub struct ExpirySweepHandle {
    pub token: tokio_util::sync::CancellationToken,
    pub handle: tokio::task::JoinHandle<()>,
}

impl ExpirySweepHandle {
    pub async fn shutdown(self) {
        self.token.cancel();
        let _ = self.handle.await;
    }
}

impl SessionStore {
    /// Spawns the idle-session sweep on the current Tokio runtime. Wakes
    /// up every `sweep_every` and removes sessions idle longer than
    /// `idle_for` (default 2h / 12h per spec §4.9). Cancellable via the
    /// returned handle rather than left to run until process exit.
    pub fn spawn_expiry_sweep(&self, idle_for: Duration, sweep_every: Duration) -> ExpirySweepHandle {
        let token = tokio_util::sync::CancellationToken::new();
        let store = self.clone();
        let child_token = token.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_every);
            loop {
                tokio::select! {
                    _ = child_token.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = store.sweep_expired(idle_for);
                        if removed > 0 {
                            log::info!("expiry sweep removed {removed} idle session(s)");
                        }
                    }
                }
            }
        });

        ExpirySweepHandle { token, handle }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::run::{OptimizationRun, RunParameters, Statistics};

    fn dummy_run(success_rate: f64, shortage: u32, objective: f64) -> OptimizationRun {
        let mut shortage_by_slot = std::collections::BTreeMap::new();
        if shortage > 0 {
            shortage_by_slot.insert("0|1800".to_string(), shortage);
        }
        OptimizationRun {
            run_id: 0,
            status: SolutionStatus::Feasible,
            objective_value: Some(objective),
            wall_time_seconds: 0.1,
            results: Vec::new(),
            shortage_by_slot,
            statistics: Statistics {
                success_rate,
                slots_with_shortage: shortage,
                slots_with_excess: 0,
                missing_executors: 0,
                max_work_hour_difference: 0.0,
                break_compliance: 0.0,
                rotation_compliance: 0.0,
                employees_with_shortage: 0,
                solution_status: SolutionStatus::Feasible,
            },
            description: String::new(),
            parameters: RunParameters {
                max_execution_seconds: 30,
                max_optimal_solutions: None,
                max_zero_shortage: None,
                use_lns: false,
                use_manual_assignments: false,
                use_randomization: false,
                seed: None,
            },
        }
    }

    #[test]
    fn create_starts_with_no_current_run() {
        let store = SessionStore::new();
        let id = store.create("2026-07-27".into(), "J".into());
        let info = store.navigation_info(&id).unwrap();
        assert_eq!(info.current_index, -1);
        assert_eq!(info.total, 0);
        assert!(!info.can_go_prev);
        assert!(!info.can_go_next);
    }

    #[test]
    fn add_run_advances_cursor_to_tail() {
        let store = SessionStore::new();
        let id = store.create("2026-07-27".into(), "J".into());
        store.add_run(&id, dummy_run(80.0, 3, 10.0), None).unwrap();
        let run_id = store.add_run(&id, dummy_run(95.0, 1, 5.0), None).unwrap();

        let info = store.navigation_info(&id).unwrap();
        assert_eq!(info.current_index, 1);
        assert_eq!(info.total, 2);
        assert_eq!(run_id, 2);
    }

    #[test]
    fn navigation_round_trips() {
        let store = SessionStore::new();
        let id = store.create("2026-07-27".into(), "J".into());
        store.add_run(&id, dummy_run(80.0, 3, 10.0), None).unwrap();
        store.add_run(&id, dummy_run(95.0, 1, 5.0), None).unwrap();

        let prev = store.navigate_prev(&id).unwrap();
        assert_eq!(prev.current_index, 0);
        let next = store.navigate_next(&id).unwrap();
        assert_eq!(next.current_index, 1);

        // Navigating past either end clamps rather than wrapping.
        store.navigate_next(&id).unwrap();
        let clamped = store.navigate_next(&id).unwrap();
        assert_eq!(clamped.current_index, 1);
    }

    #[test]
    fn best_run_prefers_success_then_shortage_then_objective() {
        let store = SessionStore::new();
        let id = store.create("2026-07-27".into(), "J".into());
        store.add_run(&id, dummy_run(80.0, 3, 10.0), None).unwrap(); // A
        store.add_run(&id, dummy_run(95.0, 1, 20.0), None).unwrap(); // B
        store.add_run(&id, dummy_run(95.0, 0, 50.0), None).unwrap(); // C

        let best = store.best_run(&id).unwrap().expect("a best run exists");
        assert_eq!(best.run_id, 3, "C has equal success to B's tie but fewer shortages");
    }

    #[test]
    fn unknown_session_is_not_found_not_a_panic() {
        let store = SessionStore::new();
        let bogus = SessionId::new("does-not-exist");
        assert!(matches!(store.navigation_info(&bogus), Err(Error::SessionNotFound(_))));
        assert!(matches!(store.navigate_next(&bogus), Err(Error::SessionNotFound(_))));
    }

    #[test]
    fn load_run_out_of_range_errors() {
        let store = SessionStore::new();
        let id = store.create("2026-07-27".into(), "J".into());
        store.add_run(&id, dummy_run(80.0, 3, 10.0), None).unwrap();
        assert!(matches!(store.load_run(&id, 999), Err(Error::RunNotFound { .. })));
    }

    #[test]
    fn sweep_expired_removes_only_idle_sessions() {
        let store = SessionStore::new();
        let fresh = store.create("2026-07-27".into(), "J".into());
        let removed = store.sweep_expired(Duration::from_secs(3600));
        assert_eq!(removed, 0);
        assert!(store.navigation_info(&fresh).is_ok());

        let removed_all = store.sweep_expired(Duration::from_secs(0));
        assert_eq!(removed_all, 1);
        assert!(matches!(store.navigation_info(&fresh), Err(Error::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn spawned_sweep_removes_idle_sessions_and_shuts_down_cleanly() {
        let store = SessionStore::new();
        let id = store.create("2026-07-27".into(), "J".into());

        let sweep = store.spawn_expiry_sweep(Duration::from_millis(0), Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(30)).await;
        sweep.shutdown().await;

        assert!(matches!(store.navigation_info(&id), Err(Error::SessionNotFound(_))));
    }
}
