//! Inbound impairment request parsing.
//!
//! The form is decoded with every field optional so that a missing field is
//! reported by name rather than as a generic decode failure. Parsing is
//! complete before anything is applied.

use sdwan_common::ImpairmentParams;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawImpairmentForm {
    pub download: Option<String>,
    pub upload: Option<String>,
    #[serde(rename = "packetLoss")]
    pub packet_loss: Option<String>,
    pub latency: Option<String>,
    pub jitter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("invalid value for {name}: {value:?} (expected a non-negative number)")]
    InvalidParameter { name: &'static str, value: String },
}

/// A fully parsed request. Transient: built per call and consumed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpairmentRequest {
    pub download: f64,
    pub upload: f64,
    pub packet_loss: f64,
    pub latency: f64,
    pub jitter: f64,
}

impl ImpairmentRequest {
    pub fn from_form(form: RawImpairmentForm) -> Result<Self, RequestError> {
        Ok(Self {
            download: field("download", form.download)?,
            upload: field("upload", form.upload)?,
            packet_loss: field("packetLoss", form.packet_loss)?,
            latency: field("latency", form.latency)?,
            jitter: field("jitter", form.jitter)?,
        })
    }

    pub fn params(&self) -> ImpairmentParams {
        ImpairmentParams::new(
            self.packet_loss,
            self.latency,
            self.jitter,
            self.download,
            self.upload,
        )
    }
}

impl From<ImpairmentParams> for ImpairmentRequest {
    fn from(p: ImpairmentParams) -> Self {
        Self {
            download: p.download,
            upload: p.upload,
            packet_loss: p.packet_loss,
            latency: p.latency,
            jitter: p.jitter,
        }
    }
}

impl TryFrom<RawImpairmentForm> for ImpairmentRequest {
    type Error = RequestError;

    fn try_from(form: RawImpairmentForm) -> Result<Self, Self::Error> {
        Self::from_form(form)
    }
}

fn field(name: &'static str, raw: Option<String>) -> Result<f64, RequestError> {
    let raw = raw.ok_or(RequestError::MissingParameter(name))?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RequestError::MissingParameter(name));
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(RequestError::InvalidParameter { name, value: raw }),
    }
}
