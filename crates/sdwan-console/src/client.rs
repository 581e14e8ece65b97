//! Impairment client: pushes one profile to one traffic controller.
//!
//! `send()` validates first and never touches the network for an invalid
//! profile. A valid send is dispatched without waiting: the caller gets a
//! [`Dispatch`] handle it may await for the outcome or simply drop.
//! Exactly one attempt is made per send; there is no retry.

use std::sync::Arc;
use std::time::Duration;

use sdwan_common::{ImpairmentParams, ImpairmentProfile, Logger};
use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("controller responded with HTTP {0}")]
    Status(u16),
    #[error("no async runtime available to dispatch the request")]
    NoRuntime,
    #[error("dispatch dropped before completing")]
    Dropped,
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError::Request(e.to_string())
    }
}

/// Handle to an in-flight controller update.
///
/// Dropping it does not cancel the request.
#[derive(Debug)]
pub struct Dispatch {
    rx: oneshot::Receiver<Result<(), TransportError>>,
}

impl Dispatch {
    /// A dispatch plus the sender its transport completes it through.
    pub fn pending() -> (oneshot::Sender<Result<(), TransportError>>, Dispatch) {
        let (tx, rx) = oneshot::channel();
        (tx, Dispatch { rx })
    }

    /// An already-completed dispatch.
    pub fn ready(result: Result<(), TransportError>) -> Self {
        let (tx, dispatch) = Self::pending();
        let _ = tx.send(result);
        dispatch
    }

    pub async fn outcome(self) -> Result<(), TransportError> {
        self.rx.await.unwrap_or(Err(TransportError::Dropped))
    }
}

/// Carries impairment parameters to a controller endpoint.
pub trait Transport: Send + Sync {
    fn dispatch(&self, endpoint: &str, params: ImpairmentParams) -> Dispatch;
}

/// Form-encoded HTTP POST transport.
pub struct HttpTransport {
    client: reqwest::Client,
    logger: Logger,
}

impl HttpTransport {
    pub fn new(timeout: Duration, logger: Logger) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, logger })
    }
}

impl Transport for HttpTransport {
    fn dispatch(&self, endpoint: &str, params: ImpairmentParams) -> Dispatch {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return Dispatch::ready(Err(TransportError::NoRuntime));
        };

        let (tx, dispatch) = Dispatch::pending();
        let client = self.client.clone();
        let logger = self.logger.clone();
        let url = endpoint.to_string();

        handle.spawn(async move {
            let result = post_params(&client, &url, &params).await;
            match &result {
                Ok(()) => logger.info(format!(
                    "ImpairmentClient - send(): {url} updated successfully"
                )),
                Err(e) => logger.info(format!("ImpairmentClient - send(): {url} update failed: {e}")),
            };
            let _ = tx.send(result);
        });

        dispatch
    }
}

async fn post_params(
    client: &reqwest::Client,
    url: &str,
    params: &ImpairmentParams,
) -> Result<(), TransportError> {
    let resp = client.post(url).form(params).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(TransportError::Status(status.as_u16()));
    }
    Ok(())
}

/// Result of [`ImpairmentClient::send`]. `Sent` means dispatched, not
/// acknowledged.
#[derive(Debug)]
pub enum SendOutcome {
    Sent(Dispatch),
    Rejected,
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, SendOutcome::Sent(_))
    }

    /// Wire code: 0 sent, 1 rejected.
    pub fn code(&self) -> u8 {
        match self {
            SendOutcome::Sent(_) => 0,
            SendOutcome::Rejected => 1,
        }
    }
}

pub struct ImpairmentClient {
    label: String,
    profile: ImpairmentProfile,
    transport: Arc<dyn Transport>,
    logger: Logger,
}

impl ImpairmentClient {
    pub fn new(label: impl Into<String>, transport: Arc<dyn Transport>, logger: Logger) -> Self {
        Self {
            label: label.into(),
            profile: ImpairmentProfile::new(),
            transport,
            logger,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn profile(&self) -> &ImpairmentProfile {
        &self.profile
    }

    /// Replace the held profile wholesale.
    pub fn configure(&mut self, profile: ImpairmentProfile) {
        self.profile = profile;
    }

    /// Replace the numeric fields, keeping the endpoint.
    pub fn set_params(&mut self, params: ImpairmentParams) {
        self.profile.set_params(params);
    }

    pub fn send(&self) -> SendOutcome {
        if !self.profile.validate().is_valid() {
            self.logger.error(format!(
                "ImpairmentClient({}) - send(): profile not valid, unable to send update",
                self.label
            ));
            return SendOutcome::Rejected;
        }

        let params = self.profile.params();
        self.logger.info(format!(
            "ImpairmentClient({}) - send(): sending updated configuration to {}",
            self.label,
            self.profile.endpoint()
        ));
        self.logger.info(format!(
            "ImpairmentClient({}) - send(): parameters used: Download: {}, Upload: {}, Jitter: {}, Latency: {}, Packet Loss: {}",
            self.label,
            params.download,
            params.upload,
            params.jitter,
            params.latency,
            params.packet_loss
        ));

        SendOutcome::Sent(self.transport.dispatch(self.profile.endpoint(), params))
    }
}
