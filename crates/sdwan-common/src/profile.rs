//! Impairment profile: one controller's parameters plus its endpoint.

use serde::{Deserialize, Serialize};

use crate::params::ImpairmentParams;

/// Result of [`ImpairmentProfile::validate`].
///
/// The wire contract encodes this as `0` (valid) / `1` (invalid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Validation {
    Valid,
    Invalid,
}

impl Validation {
    pub fn code(self) -> u8 {
        match self {
            Validation::Valid => 0,
            Validation::Invalid => 1,
        }
    }

    pub fn is_valid(self) -> bool {
        self == Validation::Valid
    }
}

/// Impairment values bound to a controller endpoint.
///
/// Starts empty (all zero, no endpoint) and is mutated in place for the
/// lifetime of a session. No upper bound is enforced on any value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpairmentProfile {
    params: ImpairmentParams,
    endpoint: String,
}

impl ImpairmentProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            params: ImpairmentParams::default(),
            endpoint: endpoint.into(),
        }
    }

    pub fn download(&self) -> f64 {
        self.params.download
    }

    pub fn set_download(&mut self, download: f64) {
        self.params.download = download;
    }

    pub fn upload(&self) -> f64 {
        self.params.upload
    }

    pub fn set_upload(&mut self, upload: f64) {
        self.params.upload = upload;
    }

    pub fn jitter(&self) -> f64 {
        self.params.jitter
    }

    pub fn set_jitter(&mut self, jitter: f64) {
        self.params.jitter = jitter;
    }

    pub fn latency(&self) -> f64 {
        self.params.latency
    }

    pub fn set_latency(&mut self, latency: f64) {
        self.params.latency = latency;
    }

    pub fn packet_loss(&self) -> f64 {
        self.params.packet_loss
    }

    pub fn set_packet_loss(&mut self, packet_loss: f64) {
        self.params.packet_loss = packet_loss;
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) {
        self.endpoint = endpoint.into();
    }

    pub fn params(&self) -> ImpairmentParams {
        self.params
    }

    /// Replace all five numeric fields, keeping the endpoint.
    pub fn set_params(&mut self, params: ImpairmentParams) {
        self.params = params;
    }

    /// Invalid iff any numeric field is negative (or not a number) or the
    /// endpoint is empty. An endpoint of only whitespace counts as empty,
    /// since it cannot address a controller.
    pub fn validate(&self) -> Validation {
        if self.endpoint.trim().is_empty() || !self.params.is_non_negative() {
            return Validation::Invalid;
        }
        Validation::Valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fresh_profile_is_zeroed_and_invalid() {
        let profile = ImpairmentProfile::new();
        assert_eq!(profile.download(), 0.0);
        assert_eq!(profile.upload(), 0.0);
        assert_eq!(profile.jitter(), 0.0);
        assert_eq!(profile.latency(), 0.0);
        assert_eq!(profile.packet_loss(), 0.0);
        assert_eq!(profile.endpoint(), "");
        assert_eq!(profile.validate(), Validation::Invalid);
        assert_eq!(profile.validate().code(), 1);
    }

    #[test]
    fn accessors_round_trip() {
        let mut profile = ImpairmentProfile::new();
        profile.set_download(100.0);
        profile.set_upload(100.0);
        profile.set_jitter(100.0);
        profile.set_latency(100.0);
        profile.set_packet_loss(100.0);
        profile.set_endpoint("testUrl");
        assert_eq!(profile.download(), 100.0);
        assert_eq!(profile.upload(), 100.0);
        assert_eq!(profile.jitter(), 100.0);
        assert_eq!(profile.latency(), 100.0);
        assert_eq!(profile.packet_loss(), 100.0);
        assert_eq!(profile.endpoint(), "testUrl");
    }

    #[test]
    fn each_negative_field_flips_validation() {
        let mut profile = ImpairmentProfile::with_endpoint("testUrl");
        assert_eq!(profile.validate(), Validation::Valid);
        assert_eq!(profile.validate().code(), 0);

        profile.set_download(-1.0);
        assert_eq!(profile.validate(), Validation::Invalid);
        profile.set_download(1.0);

        profile.set_upload(-1.0);
        assert_eq!(profile.validate(), Validation::Invalid);
        profile.set_upload(1.0);

        profile.set_jitter(-1.0);
        assert_eq!(profile.validate(), Validation::Invalid);
        profile.set_jitter(1.0);

        profile.set_latency(-1.0);
        assert_eq!(profile.validate(), Validation::Invalid);
        profile.set_latency(1.0);

        profile.set_packet_loss(-1.0);
        assert_eq!(profile.validate(), Validation::Invalid);
        profile.set_packet_loss(1.0);
        assert_eq!(profile.validate(), Validation::Valid);

        profile.set_endpoint("");
        assert_eq!(profile.validate(), Validation::Invalid);
    }

    #[test]
    fn whitespace_endpoint_counts_as_empty() {
        let mut profile = ImpairmentProfile::with_endpoint("   ");
        assert_eq!(profile.validate(), Validation::Invalid);
        profile.set_endpoint("\t\n");
        assert_eq!(profile.validate().code(), 1);
        profile.set_endpoint(" http://tc1/ ");
        assert!(profile.validate().is_valid());
    }

    #[test]
    fn unbounded_values_are_accepted() {
        let mut profile = ImpairmentProfile::with_endpoint("http://tc1/");
        profile.set_packet_loss(250.0);
        profile.set_latency(1.0e9);
        assert!(profile.validate().is_valid());
    }

    proptest! {
        #[test]
        fn validity_matches_sign_of_fields(
            download in -1000.0f64..1000.0,
            upload in -1000.0f64..1000.0,
            jitter in -1000.0f64..1000.0,
            latency in -1000.0f64..1000.0,
            packet_loss in -1000.0f64..1000.0,
            endpoint in "[a-z:/.0-9]{0,12}",
        ) {
            let mut profile = ImpairmentProfile::with_endpoint(endpoint.clone());
            profile.set_params(ImpairmentParams { download, upload, jitter, latency, packet_loss });
            let expected = !endpoint.trim().is_empty()
                && [download, upload, jitter, latency, packet_loss].iter().all(|v| *v >= 0.0);
            prop_assert_eq!(profile.validate().is_valid(), expected);
        }
    }
}
