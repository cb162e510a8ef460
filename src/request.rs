use indexmap::IndexMap;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

use crate::apikey::{ApiKey, API_KEY_HEADER};
use crate::client::Config;
use crate::error::{Error, Result};
use crate::transport::{HttpRequest, HttpResponse, Transport};

/// Ordered query parameters. Only truthy values reach the query string:
/// `null`, `false`, `0`, and `""` are dropped, so a caller cannot send
/// those literals as parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams(Vec<(String, Value)>);

impl QueryParams {
    /// Create an empty parameter list
    pub fn new() -> Self {
        QueryParams(Vec::new())
    }

    /// Append a parameter; duplicate keys are kept
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.push((key.into(), value.into()));
    }

    /// Builder form of `push`
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(key, value);
        self
    }

    /// Merge `overrides` over `self`: a key already present takes the new value
    /// in place, new keys are appended in order
    pub fn merged(mut self, overrides: QueryParams) -> Self {
        for (key, value) in overrides.0 {
            match self.0.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => self.0.push((key, value)),
            }
        }
        self
    }

    /// Iterate over every parameter, falsy ones included
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The pairs that will be written to the query string
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .filter(|(_, v)| is_truthy(v))
            .map(|(k, v)| (k.clone(), stringify(v)))
            .collect()
    }
}

/// JavaScript-style truthiness of a parameter value
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

/// Method, headers and body of a request. Header names are stored
/// lowercased so merging is case-insensitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub method: Option<Method>,
    pub headers: IndexMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl RequestOptions {
    /// Options with the given method and nothing else set
    pub fn new(method: Method) -> Self {
        RequestOptions {
            method: Some(method),
            ..Default::default()
        }
    }

    /// Set a header; the name is lowercased
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Set the raw request body
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Merge `overrides` over `self`. Set leaves in `overrides` win; headers
    /// merge key by key so defaults that are not overridden survive.
    pub fn merge(mut self, overrides: RequestOptions) -> RequestOptions {
        if overrides.method.is_some() {
            self.method = overrides.method;
        }
        for (name, value) in overrides.headers {
            self.headers.insert(name.to_ascii_lowercase(), value);
        }
        if overrides.body.is_some() {
            self.body = overrides.body;
        }
        self
    }

    fn header_map(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::RequestBuild(format!("Invalid header name: {}", name)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| Error::RequestBuild(format!("Invalid value for header {}", name)))?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

/// Authenticated request issuer shared by every endpoint.
///
/// Holds the credential, transport and configuration; cloning is cheap and
/// the clones share the same key and transport.
#[derive(Clone)]
pub struct ApiRequest {
    api_key: ApiKey,
    transport: Arc<dyn Transport>,
    config: Config,
}

impl ApiRequest {
    /// Create a request issuer from its parts
    pub fn new(api_key: ApiKey, transport: Arc<dyn Transport>, config: Config) -> Self {
        ApiRequest {
            api_key,
            transport,
            config,
        }
    }

    /// Credential sent with every request
    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    pub(crate) fn set_transport(&mut self, transport: Arc<dyn Transport>) {
        self.transport = transport;
    }

    /// Build the outbound request without sending it
    ///
    /// # Arguments
    /// * `location` - Absolute endpoint URL
    /// * `params` - Query parameters; falsy values are skipped
    /// * `options` - Caller options merged over the auth header default
    pub fn build_request(
        &self,
        location: &str,
        params: &QueryParams,
        options: RequestOptions,
    ) -> Result<HttpRequest> {
        let mut url = Url::parse(location)?;
        let pairs = params.to_pairs();
        if !pairs.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in &pairs {
                query.append_pair(key, value);
            }
        }

        let defaults = RequestOptions::default().header(API_KEY_HEADER, self.api_key.expose());
        let options = defaults.merge(options);

        Ok(HttpRequest {
            method: options.method.clone().unwrap_or(Method::GET),
            url,
            headers: options.header_map()?,
            body: options.body,
        })
    }

    /// Build and send a request, returning the response uninterpreted.
    /// Status codes are never inspected here.
    pub async fn make_request(
        &self,
        location: &str,
        params: &QueryParams,
        options: RequestOptions,
    ) -> Result<HttpResponse> {
        let request = self.build_request(location, params, options)?;
        let method = request.method.clone();
        let path = request.url.path().to_string();

        let start = Instant::now();
        let result = self.transport.send(request).await;

        if self.config.debug {
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(response) => tracing::debug!(
                    %method,
                    %path,
                    status = response.status,
                    elapsed_ms,
                    "open cloud request"
                ),
                Err(err) => tracing::debug!(
                    %method,
                    %path,
                    elapsed_ms,
                    error = %err,
                    "open cloud request failed"
                ),
            }
        }

        result
    }
}

impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("api_key", &self.api_key)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
