//! In-process fakes for exercising the console without real controllers.

use std::sync::Mutex;

use sdwan_common::ImpairmentParams;

use crate::client::{Dispatch, Transport, TransportError};
use crate::display::{DisplaySnapshot, StateObserver};

/// Transport that records every dispatch and completes it immediately.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<(String, ImpairmentParams)>>,
    fail: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every dispatch completes with an HTTP 502 error.
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<(String, ImpairmentParams)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Recorded parameters sent to `endpoint`, in dispatch order.
    pub fn sent_to(&self, endpoint: &str) -> Vec<ImpairmentParams> {
        self.calls()
            .into_iter()
            .filter(|(e, _)| e == endpoint)
            .map(|(_, p)| p)
            .collect()
    }
}

impl Transport for RecordingTransport {
    fn dispatch(&self, endpoint: &str, params: ImpairmentParams) -> Dispatch {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((endpoint.to_string(), params));
        }
        if self.fail {
            Dispatch::ready(Err(TransportError::Status(502)))
        } else {
            Dispatch::ready(Ok(()))
        }
    }
}

/// Observer that keeps every snapshot it is shown.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    seen: Mutex<Vec<DisplaySnapshot>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<DisplaySnapshot> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl StateObserver for RecordingObserver {
    fn on_state_change(&self, snapshot: &DisplaySnapshot) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(snapshot.clone());
        }
    }
}
