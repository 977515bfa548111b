//! Cloudflare API v4 response envelope
//!
//! Every v4 response has the same shape:
//!
//! ```json
//! { "success": true, "errors": [], "messages": [], "result": { ... } }
//! ```
//!
//! Responses are decoded once, here, into an [`ApiOutcome`]. Callers match on
//! the outcome and never look at raw JSON.

use cfip_core::{Error, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Decoded result of one API call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiOutcome<T> {
    /// `success: true` with a 2xx status and a `result` payload
    Success(T),
    /// The API answered but reported failure
    ApiError {
        /// HTTP status code
        status: u16,
        /// `errors[0].message`, or `HTTP <status>` when the API sent none
        message: String,
    },
    /// The request never produced a response
    TransportError(String),
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    message: String,
}

impl<T: DeserializeOwned> ApiOutcome<T> {
    /// Decode a response body
    ///
    /// A failure status with an unreadable body still yields an `ApiError`
    /// (message `HTTP <status>`). A success status with an unreadable body, or
    /// without a `result`, is a `Parse` error.
    pub fn decode(status: u16, body: &str) -> Result<Self> {
        let ok_status = (200..300).contains(&status);

        let envelope: Envelope<T> = match serde_json::from_str(body) {
            Ok(envelope) => envelope,
            Err(e) if ok_status => {
                return Err(Error::parse(format!("Invalid Cloudflare response: {}", e)));
            }
            Err(_) => {
                return Ok(Self::ApiError {
                    status,
                    message: format!("HTTP {}", status),
                });
            }
        };

        if !ok_status || !envelope.success {
            let message = envelope
                .errors
                .into_iter()
                .map(|e| e.message)
                .find(|m| !m.is_empty())
                .unwrap_or_else(|| format!("HTTP {}", status));
            return Ok(Self::ApiError { status, message });
        }

        match envelope.result {
            Some(result) => Ok(Self::Success(result)),
            None => Err(Error::parse("Cloudflare response has no result")),
        }
    }
}

impl<T> ApiOutcome<T> {
    /// Convert to a `Result`
    ///
    /// Transport failures and non-2xx answers become `Network` errors; a 2xx
    /// answer with `success: false` becomes a `Provider` error. Either way the
    /// API's own message is kept.
    pub fn into_result(self) -> Result<T> {
        match self {
            Self::Success(result) => Ok(result),
            Self::ApiError { status, message } if (200..300).contains(&status) => {
                Err(Error::provider("cloudflare", message))
            }
            Self::ApiError { message, .. } => Err(Error::network(message)),
            Self::TransportError(message) => Err(Error::network(message)),
        }
    }
}
