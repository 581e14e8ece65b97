//! Impairment parameters exchanged between the console and a controller.
//!
//! The console posts these as `application/x-www-form-urlencoded` fields
//! (`download`, `upload`, `jitter`, `latency`, `packetLoss`); rates are in
//! Mbps, delays in milliseconds, loss in percent.

use serde::{Deserialize, Serialize};

/// One link's impairment five-tuple.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpairmentParams {
    pub download: f64,
    pub upload: f64,
    pub jitter: f64,
    pub latency: f64,
    pub packet_loss: f64,
}

impl ImpairmentParams {
    pub const fn new(
        packet_loss: f64,
        latency: f64,
        jitter: f64,
        download: f64,
        upload: f64,
    ) -> Self {
        Self {
            download,
            upload,
            jitter,
            latency,
            packet_loss,
        }
    }

    /// True when every field is a finite, non-negative number.
    pub fn is_non_negative(&self) -> bool {
        [
            self.download,
            self.upload,
            self.jitter,
            self.latency,
            self.packet_loss,
        ]
        .iter()
        .all(|v| v.is_finite() && *v >= 0.0)
    }

    /// Same loss/latency/jitter with different rate caps.
    pub fn with_rates(self, download: f64, upload: f64) -> Self {
        Self {
            download,
            upload,
            ..self
        }
    }
}

/// The two links driven by one demo session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkPair {
    pub primary: ImpairmentParams,
    pub secondary: ImpairmentParams,
}

impl LinkPair {
    pub const fn new(primary: ImpairmentParams, secondary: ImpairmentParams) -> Self {
        Self { primary, secondary }
    }
}
