//! Device-location plumbing. The hardware side lives outside this crate; what
//! it sees is a source that can be asked for a fix and a stream of updates.

use std::fmt::Debug;
use tokio::sync::broadcast;

use crate::{error::LocationError, model::Coordinates};

const UPDATE_CAPACITY: usize = 16;

pub trait CoordinateSource: Send + Sync + Debug {
    /// Ask for a one-shot fix; the answer arrives on the update stream.
    fn request_location(&self);

    fn subscribe(&self) -> broadcast::Receiver<Coordinates>;
}

/// Fan-out channel that location back ends push fixes into.
#[derive(Debug, Clone)]
pub struct LocationFeed {
    tx: broadcast::Sender<Coordinates>,
}

impl LocationFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(UPDATE_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, coordinates: Coordinates) {
        if self.tx.send(coordinates).is_err() {
            tracing::debug!("location update dropped, nobody is listening");
        }
    }

    /// Location failures are logged only; they never reach the display.
    pub fn report_error(&self, error: &LocationError) {
        tracing::warn!(error = %error, "location error");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Coordinates> {
        self.tx.subscribe()
    }
}

impl Default for LocationFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Answers every request with the same configured position.
#[derive(Debug, Clone)]
pub struct FixedLocation {
    coordinates: Coordinates,
    feed: LocationFeed,
}

impl FixedLocation {
    pub fn new(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            feed: LocationFeed::new(),
        }
    }

    pub fn feed(&self) -> &LocationFeed {
        &self.feed
    }
}

impl CoordinateSource for FixedLocation {
    fn request_location(&self) {
        if self.coordinates.is_valid() {
            self.feed.publish(self.coordinates);
        } else {
            self.feed.report_error(&LocationError::OutOfRange(self.coordinates));
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<Coordinates> {
        self.feed.subscribe()
    }
}
