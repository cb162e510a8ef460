use reqwest::Method;
use serde_json::json;
use std::sync::Arc;
use url::Url;

use crate::apikey::ApiKey;
use crate::client::Config;
use crate::datastore::DataStore;
use crate::error::{Error, Result};
use crate::models::DataStoreList;
use crate::request::{ApiRequest, QueryParams, RequestOptions};
use crate::response::{DataStoreResponse, PublishResponse};
use crate::transport::{ReqwestTransport, Transport};

/// Options for data store listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDataStoresOptions {
    pub limit: u32,
    pub cursor: Option<String>,
    pub prefix: Option<String>,
}

impl Default for ListDataStoresOptions {
    fn default() -> Self {
        ListDataStoresOptions {
            limit: 50,
            cursor: None,
            prefix: None,
        }
    }
}

impl ListDataStoresOptions {
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

/// Client for one universe
#[derive(Debug, Clone)]
pub struct OpenCloud {
    api: ApiRequest,
    universe_id: u64,
}

impl OpenCloud {
    /// Create a client with the default configuration and HTTP transport
    pub fn new(api_key: impl Into<ApiKey>, universe_id: u64) -> Self {
        OpenCloud {
            api: ApiRequest::new(
                api_key.into(),
                Arc::new(ReqwestTransport::default()),
                Config::default(),
            ),
            universe_id,
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: Config) -> Self {
        self.api.set_config(config);
        self
    }

    /// Replace the transport requests are sent through
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.api.set_transport(transport);
        self
    }

    /// Enable debug mode
    pub fn with_debug(mut self, debug: bool) -> Self {
        let config = self.api.config().clone().with_debug(debug);
        self.api.set_config(config);
        self
    }

    /// Universe every request is scoped to
    pub fn universe_id(&self) -> u64 {
        self.universe_id
    }

    /// Current configuration
    pub fn config(&self) -> &Config {
        self.api.config()
    }

    /// Client scoped to the named data store, sharing this client's key
    pub fn get_data_store(&self, name: &str) -> DataStore {
        DataStore::new(self.api.clone(), self.universe_id, name)
    }

    /// List the data stores of the universe, one page at a time
    pub async fn list_data_stores(
        &self,
        options: ListDataStoresOptions,
    ) -> Result<DataStoreResponse<DataStoreList>> {
        let params = QueryParams::new()
            .with("cursor", options.cursor)
            .with("prefix", options.prefix)
            .with("limit", options.limit);

        let location = self.api.config().datastores_url(self.universe_id);
        let response = self
            .api
            .make_request(&location, &params, RequestOptions::new(Method::GET))
            .await?;
        DataStoreResponse::decode(response)
    }

    /// Publish a message to every server subscribed to `topic`
    pub async fn publish_topic(&self, topic: &str, message: &str) -> Result<PublishResponse> {
        let root = self.api.config().topics_url(self.universe_id);
        let mut url = Url::parse(&root)?;
        url.path_segments_mut()
            .map_err(|_| Error::RequestBuild(format!("Cannot append topic to {}", root)))?
            .push(topic);

        let body = serde_json::to_vec(&json!({ "message": message }))?;
        let options = RequestOptions::new(Method::POST)
            .header("content-type", "application/json")
            .body(body);

        let response = self
            .api
            .make_request(url.as_str(), &QueryParams::new(), options)
            .await?;
        PublishResponse::from_response(response)
    }
}
