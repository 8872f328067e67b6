//! HTTP transport for SOAP requests.
//!
//! [`SoapClient::send_request`] builds the envelope, POSTs it with
//! `Content-Type: application/soap+xml`, decodes the response and classifies
//! the outcome:
//!
//! | Outcome                                      | Result                         |
//! |----------------------------------------------|--------------------------------|
//! | Response parses, no fault, HTTP 2xx          | `Ok(ParsedEnvelope)`           |
//! | Response carries `Fault.Reason.Text`         | [`SoapError::Fault`]           |
//! | Timeout elapsed                              | [`SoapError::Timeout`]         |
//! | Connection / DNS / I/O failure               | [`SoapError::Transport`]       |
//! | Non-2xx without a parseable fault            | [`SoapError::HttpStatus`]      |
//! | 2xx with undecodable XML                     | [`SoapError::MalformedResponse`] |
//!
//! Nothing is retried.  With credentials, two mechanisms are applied side by
//! side (each can be switched off in [`TransportConfig`]): HTTP basic
//! credentials in the URL authority and the WS-Security header in the
//! envelope.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use thiserror::Error;
use tracing::{debug, warn};

use super::envelope::{EnvelopeBuilder, SoapRequest};
use crate::domain::{ParsedEnvelope, XmlError};
use crate::security::TokenGenerationError;

/// Path of the fault reason in a SOAP 1.2 response.
pub const FAULT_REASON_PATH: &str = "Envelope.Body.Fault.Reason.Text";

const SOAP_CONTENT_TYPE: &str = "application/soap+xml";

/// Transport settings, fixed for the lifetime of a [`SoapClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Ceiling for the whole HTTP exchange.
    pub timeout: Duration,
    /// Put `username:secret` in the URL authority (HTTP basic auth).
    pub http_basic_auth: bool,
    /// Add the WS-Security `UsernameToken` header to the envelope.
    pub ws_security: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            http_basic_auth: true,
            ws_security: true,
        }
    }
}

/// Coarse classification of [`SoapError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoapErrorKind {
    /// The request could not be prepared (token, address, client).
    Setup,
    /// The fixed transport timeout elapsed.
    Timeout,
    /// Network failure or an unusable HTTP response.
    Transport,
    /// The device answered with a SOAP fault.
    Fault,
}

/// Errors returned by [`SoapClient::send_request`].
#[derive(Debug, Error)]
pub enum SoapError {
    #[error("failed to generate security token: {0}")]
    Token(#[from] TokenGenerationError),

    #[error("invalid service address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {address} timed out after {timeout:?}")]
    Timeout { address: String, timeout: Duration },

    #[error("HTTP exchange with {address} failed: {source}")]
    Transport {
        address: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{address} answered HTTP {status} without a SOAP fault")]
    HttpStatus { address: String, status: u16 },

    #[error("response from {address} is not valid XML: {source}")]
    MalformedResponse {
        address: String,
        #[source]
        source: XmlError,
    },

    /// The device rejected the operation.  Carries the reason text verbatim.
    #[error("SOAP fault: {reason}")]
    Fault { reason: String },
}

impl SoapError {
    pub fn kind(&self) -> SoapErrorKind {
        match self {
            Self::Token(_) | Self::InvalidAddress { .. } | Self::Client(_) => SoapErrorKind::Setup,
            Self::Timeout { .. } => SoapErrorKind::Timeout,
            Self::Transport { .. } | Self::HttpStatus { .. } | Self::MalformedResponse { .. } => {
                SoapErrorKind::Transport
            }
            Self::Fault { .. } => SoapErrorKind::Fault,
        }
    }
}

/// Sends SOAP requests to device service addresses.
///
/// Construct once and reuse; the underlying connection pool is shared by all
/// requests and holds no per-request state.
#[derive(Clone)]
pub struct SoapClient {
    http: reqwest::Client,
    builder: EnvelopeBuilder,
    config: TransportConfig,
}

impl SoapClient {
    /// Creates a client with the OS random source and system clock.
    ///
    /// # Errors
    ///
    /// Returns [`SoapError::Client`] if the HTTP client cannot be initialised.
    pub fn new(config: TransportConfig) -> Result<Self, SoapError> {
        Self::with_builder(config, EnvelopeBuilder::new())
    }

    /// Creates a client around a caller-supplied envelope builder.
    ///
    /// The builder's WS-Security switch is overridden by `config.ws_security`.
    ///
    /// # Errors
    ///
    /// Returns [`SoapError::Client`] if the HTTP client cannot be initialised.
    pub fn with_builder(config: TransportConfig, builder: EnvelopeBuilder) -> Result<Self, SoapError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(SoapError::Client)?;
        Ok(Self {
            http,
            builder: builder.with_ws_security(config.ws_security),
            config,
        })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Sends `request` to `service_address` and returns the decoded response.
    ///
    /// # Errors
    ///
    /// See the module table; [`SoapError::kind`] groups the variants.
    pub async fn send_request(
        &self,
        service_address: &str,
        request: &SoapRequest,
    ) -> Result<ParsedEnvelope, SoapError> {
        let document = self.builder.build(request)?;
        let url = self.target_url(service_address, request)?;

        debug!("POST {service_address} ({} bytes)", document.len());
        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .header("Charset", "utf-8")
            .body(document)
            .send()
            .await
            .map_err(|e| self.classify(service_address, e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.classify(service_address, e))?;
        debug!("{service_address} answered HTTP {status} ({} bytes)", body.len());

        let envelope = match ParsedEnvelope::parse(&body) {
            Ok(envelope) => envelope,
            Err(source) if status.is_success() => {
                return Err(SoapError::MalformedResponse {
                    address: service_address.to_string(),
                    source,
                })
            }
            Err(_) => {
                return Err(SoapError::HttpStatus {
                    address: service_address.to_string(),
                    status: status.as_u16(),
                })
            }
        };

        if let Some(reason) = envelope
            .value_for_path(FAULT_REASON_PATH)
            .filter(|r| !r.is_empty())
        {
            warn!("SOAP fault from {service_address}: {reason}");
            return Err(SoapError::Fault {
                reason: reason.to_string(),
            });
        }

        if !status.is_success() {
            return Err(SoapError::HttpStatus {
                address: service_address.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(envelope)
    }

    /// Parses the address and, when enabled, embeds basic credentials.
    fn target_url(&self, service_address: &str, request: &SoapRequest) -> Result<Url, SoapError> {
        let invalid = |reason: String| SoapError::InvalidAddress {
            address: service_address.to_string(),
            reason,
        };

        let mut url = Url::parse(service_address).map_err(|e| invalid(e.to_string()))?;
        if self.config.http_basic_auth && !request.username.is_empty() {
            url.set_username(&request.username)
                .and_then(|()| url.set_password(Some(&request.secret)))
                .map_err(|()| invalid("address cannot carry credentials".to_string()))?;
        }
        Ok(url)
    }

    fn classify(&self, address: &str, e: reqwest::Error) -> SoapError {
        if e.is_timeout() {
            SoapError::Timeout {
                address: address.to_string(),
                timeout: self.config.timeout,
            }
        } else {
            SoapError::Transport {
                address: address.to_string(),
                source: e,
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
