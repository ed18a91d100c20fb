//! Shared state of the steering daemon.

use std::sync::{Arc, Mutex, PoisonError};

/// State shared between the polling loop and the update path. One mutex guards
/// the whole structure; it is held only to snapshot or replace fields, never
/// across I/O.
#[derive(Copy, Clone, Debug)]
pub struct SteeringState {
    /// State of charge observed at daemon startup, percent.
    pub init_soc: u8,

    /// Local hour at which cheap charging begins, if one was selected.
    /// `None` means the selector failed and the daemon stays in the
    /// protective mode.
    pub charge_start_hour: Option<u32>,

    /// Extra waiting hours granted by a sunny PV forecast.
    pub forecast_offset: u32,
}

#[derive(Clone)]
pub struct SharedSteeringState(Arc<Mutex<SteeringState>>);

impl SharedSteeringState {
    #[must_use]
    pub fn new(state: SteeringState) -> Self {
        Self(Arc::new(Mutex::new(state)))
    }

    /// One consistent copy of the whole state.
    #[must_use]
    pub fn snapshot(&self) -> SteeringState {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn update(&self, update: impl FnOnce(&mut SteeringState)) {
        update(&mut self.0.lock().unwrap_or_else(PoisonError::into_inner));
    }
}
