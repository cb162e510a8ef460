//! Response interpretation.
//!
//! Every endpoint funnels its [`HttpResponse`] through [`ResponsePolicy`]:
//! 2xx is success, 502 is a fixed gateway error whose body is never read,
//! and anything else is decoded into a typed error. Data store endpoints use
//! the structured policy; topic publishing keeps the plain-text one.

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::codec;
use crate::error::{DataStoreReason, Error, ErrorBodyKind, Result};
use crate::models::EntryMetadata;
use crate::transport::HttpResponse;

const BAD_GATEWAY: u16 = 502;

/// How a non-2xx response is turned into an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponsePolicy {
    /// JSON body with `message`, `error` and `errorDetails`; yields `Error::DataStore`
    Structured,
    /// Body read as raw text; yields `Error::OpenCloud`
    PlainText,
}

impl ResponsePolicy {
    /// Return `Ok` for 2xx responses, otherwise the error this policy maps to
    pub fn check(self, response: &HttpResponse) -> Result<()> {
        if response.is_success() {
            return Ok(());
        }

        match self {
            ResponsePolicy::Structured => Err(structured_error(response)),
            ResponsePolicy::PlainText => Err(plain_text_error(response)),
        }
    }
}

/// Standard error body of the data store API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    message: String,
    error: String,
    #[serde(default)]
    error_details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDetail {
    datastore_error_code: String,
}

fn structured_error(response: &HttpResponse) -> Error {
    if response.status == BAD_GATEWAY {
        return Error::bad_gateway();
    }

    let body: ErrorBody = match response.json() {
        Ok(body) => body,
        Err(e) => {
            return Error::ErrorBody {
                status: response.status,
                kind: ErrorBodyKind::Malformed(e.to_string()),
            }
        }
    };

    match body.error_details.into_iter().next() {
        Some(detail) => Error::DataStore {
            message: body.message,
            status: response.status,
            reason: DataStoreReason::parse(&body.error, &detail.datastore_error_code),
        },
        None => {
            tracing::warn!(
                status = response.status,
                error = %body.error,
                "error response without errorDetails"
            );
            Error::ErrorBody {
                status: response.status,
                kind: ErrorBodyKind::MissingErrorDetails,
            }
        }
    }
}

fn plain_text_error(response: &HttpResponse) -> Error {
    let message = if response.status == BAD_GATEWAY {
        "Bad Gateway".to_string()
    } else {
        format!("HTTP {}: {}", response.status, response.text())
    };

    Error::OpenCloud {
        message,
        status: response.status,
    }
}

/// Success envelope returned by data store endpoints
#[derive(Debug, Clone)]
pub struct DataStoreResponse<T> {
    pub value: T,
    pub headers: HeaderMap,
    pub status_code: u16,
}

impl<T> DataStoreResponse<T> {
    /// Interpret `response` with the structured policy and decode its body
    pub fn decode(response: HttpResponse) -> Result<Self>
    where
        T: DeserializeOwned,
    {
        ResponsePolicy::Structured.check(&response)?;
        let value = codec::decode(&response.text())?;
        Ok(DataStoreResponse {
            value,
            headers: response.headers,
            status_code: response.status,
        })
    }

    /// Get a response header as text
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Entry metadata carried in the `roblox-entry-*` headers
    pub fn entry_metadata(&self) -> EntryMetadata {
        EntryMetadata::from_headers(&self.headers)
    }

    /// Replace the value, keeping headers and status
    pub fn map<U, F>(self, f: F) -> DataStoreResponse<U>
    where
        F: FnOnce(T) -> U,
    {
        DataStoreResponse {
            value: f(self.value),
            headers: self.headers,
            status_code: self.status_code,
        }
    }
}

impl DataStoreResponse<()> {
    /// Interpret `response` with the structured policy, ignoring its body
    pub fn empty(response: HttpResponse) -> Result<Self> {
        ResponsePolicy::Structured.check(&response)?;
        Ok(DataStoreResponse {
            value: (),
            headers: response.headers,
            status_code: response.status,
        })
    }
}

/// Success envelope returned by topic publishing
#[derive(Debug, Clone)]
pub struct PublishResponse {
    pub success: bool,
    pub headers: HeaderMap,
    pub status_code: u16,
}

impl PublishResponse {
    /// Interpret `response` with the plain-text policy
    pub fn from_response(response: HttpResponse) -> Result<Self> {
        ResponsePolicy::PlainText.check(&response)?;
        Ok(PublishResponse {
            success: true,
            headers: response.headers,
            status_code: response.status,
        })
    }
}
