//! Observable display state.
//!
//! Subscribers are woken on every change and can read the latest value at any
//! time. Each update replaces all fields in one step, so a reader never sees
//! a new temperature next to the old forecast.

use tokio::sync::watch;

use crate::model::DisplayState;

#[derive(Debug)]
pub struct DisplayStore {
    tx: watch::Sender<DisplayState>,
}

impl DisplayStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(DisplayState::default());
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<DisplayState> {
        self.tx.subscribe()
    }

    /// Copy of the latest published state.
    pub fn current(&self) -> DisplayState {
        self.tx.borrow().clone()
    }

    pub(crate) fn publish(&self, state: DisplayState) {
        self.tx.send_modify(|slot| *slot = state);
    }
}

impl Default for DisplayStore {
    fn default() -> Self {
        Self::new()
    }
}
