use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec;
use crate::error::Result;
use crate::models::{EntryList, EntryVersionInfo, SortOrder, VersionList};
use crate::request::{ApiRequest, QueryParams, RequestOptions};
use crate::response::DataStoreResponse;
use crate::time::Time;
use crate::transport::HttpResponse;

const DEFAULT_LIMIT: u32 = 50;

/// Options for entry listing
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntriesOptions {
    pub limit: u32,
    pub prefix: Option<String>,
    pub cursor: Option<String>,
    pub scope: Option<String>,
    /// List keys of every scope (the default)
    pub all_scopes: bool,
}

impl Default for ListEntriesOptions {
    fn default() -> Self {
        ListEntriesOptions {
            limit: DEFAULT_LIMIT,
            prefix: None,
            cursor: None,
            scope: None,
            all_scopes: true,
        }
    }
}

impl ListEntriesOptions {
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    /// Restrict listing to one scope; turns off `all_scopes`
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self.all_scopes = false;
        self
    }
}

/// User ids and attributes attached to a written entry
#[derive(Debug, Clone, PartialEq)]
pub struct EntryWriteOptions {
    pub user_ids: Vec<u64>,
    pub attributes: Value,
}

impl Default for EntryWriteOptions {
    fn default() -> Self {
        EntryWriteOptions {
            user_ids: Vec::new(),
            attributes: Value::Object(Default::default()),
        }
    }
}

impl EntryWriteOptions {
    fn apply(&self, options: RequestOptions) -> Result<RequestOptions> {
        let user_ids = self
            .user_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");

        Ok(options
            .header("content-type", "application/json")
            .header("roblox-entry-userids", format!("[{}]", user_ids))
            .header("roblox-entry-attributes", serde_json::to_string(&self.attributes)?))
    }
}

/// Options for `DataStore::set`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetOptions {
    pub entry: EntryWriteOptions,
    /// Only write if the current version matches
    pub match_version: Option<String>,
    /// Only write if the entry does not exist yet
    pub exclusive_create: bool,
}

impl SetOptions {
    pub fn user_ids(mut self, user_ids: Vec<u64>) -> Self {
        self.entry.user_ids = user_ids;
        self
    }

    pub fn attributes(mut self, attributes: Value) -> Self {
        self.entry.attributes = attributes;
        self
    }

    pub fn match_version(mut self, version: impl Into<String>) -> Self {
        self.match_version = Some(version.into());
        self
    }

    pub fn exclusive_create(mut self, exclusive: bool) -> Self {
        self.exclusive_create = exclusive;
        self
    }
}

/// Options for version listing
#[derive(Debug, Clone, PartialEq)]
pub struct ListVersionsOptions {
    pub limit: u32,
    pub sort_order: SortOrder,
    pub start_time: Option<Time>,
    pub end_time: Option<Time>,
    pub cursor: Option<String>,
}

impl Default for ListVersionsOptions {
    fn default() -> Self {
        ListVersionsOptions {
            limit: DEFAULT_LIMIT,
            sort_order: SortOrder::default(),
            start_time: None,
            end_time: None,
            cursor: None,
        }
    }
}

impl ListVersionsOptions {
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn sort_order(mut self, order: SortOrder) -> Self {
        self.sort_order = order;
        self
    }

    pub fn between(mut self, start: Option<Time>, end: Option<Time>) -> Self {
        self.start_time = start;
        self.end_time = end;
        self
    }

    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }
}

#[derive(Deserialize)]
#[serde(transparent)]
struct Counter(#[serde(with = "codec::float")] f64);

/// Client scoped to one named data store.
///
/// Built by `OpenCloud::get_data_store`; holds a clone of the parent's
/// credential and transport.
#[derive(Debug, Clone)]
pub struct DataStore {
    api: ApiRequest,
    base_url: String,
    name: String,
}

impl DataStore {
    pub(crate) fn new(api: ApiRequest, universe_id: u64, name: &str) -> Self {
        let base_url = format!("{}/datastore", api.config().datastores_url(universe_id));
        DataStore {
            api,
            base_url,
            name: name.to_string(),
        }
    }

    /// Name of the data store
    pub fn name(&self) -> &str {
        &self.name
    }

    async fn request(
        &self,
        endpoint: &str,
        params: QueryParams,
        options: RequestOptions,
    ) -> Result<HttpResponse> {
        let params = QueryParams::new()
            .with("datastoreName", self.name.as_str())
            .merged(params);
        let location = format!("{}/{}", self.base_url, endpoint);
        self.api.make_request(&location, &params, options).await
    }

    /// List entry keys, one page at a time
    pub async fn list_entries(&self, options: ListEntriesOptions) -> Result<DataStoreResponse<EntryList>> {
        let params = QueryParams::new()
            .with("limit", options.limit)
            .with("prefix", options.prefix)
            .with("cursor", options.cursor)
            .with("scope", options.scope)
            .with("AllScopes", options.all_scopes);

        let response = self
            .request("entries", params, RequestOptions::new(Method::GET))
            .await?;
        DataStoreResponse::decode(response)
    }

    /// Get the value of an entry
    pub async fn get<T>(&self, key: &str) -> Result<DataStoreResponse<T>>
    where
        T: DeserializeOwned,
    {
        let params = QueryParams::new().with("entryKey", key);
        let response = self
            .request("entries/entry", params, RequestOptions::new(Method::GET))
            .await?;
        DataStoreResponse::decode(response)
    }

    /// Write the value of an entry, creating a new version
    ///
    /// # Arguments
    /// * `key` - Entry key
    /// * `value` - Value, encoded with the infinity-aware codec
    /// * `options` - User ids, attributes and write preconditions
    pub async fn set<V>(
        &self,
        key: &str,
        value: &V,
        options: SetOptions,
    ) -> Result<DataStoreResponse<EntryVersionInfo>>
    where
        V: Serialize + ?Sized,
    {
        let body = codec::encode(value)?;
        let digest = codec::compute_digest(body.as_bytes());

        let params = QueryParams::new()
            .with("entryKey", key)
            .with("matchVersion", options.match_version.clone())
            .with("exclusiveCreate", options.exclusive_create);
        let request_options = options
            .entry
            .apply(RequestOptions::new(Method::POST).header("content-md5", digest))?
            .body(body);

        let response = self.request("entries/entry", params, request_options).await?;
        DataStoreResponse::decode(response)
    }

    /// Add `increment_by` to a numeric entry and return the new value.
    /// An increment of 0 is dropped from the query like any falsy parameter.
    pub async fn increment(
        &self,
        key: &str,
        increment_by: i64,
        options: EntryWriteOptions,
    ) -> Result<DataStoreResponse<f64>> {
        let params = QueryParams::new()
            .with("entryKey", key)
            .with("incrementBy", increment_by);
        let request_options = options.apply(RequestOptions::new(Method::POST))?;

        let response = self
            .request("entries/entry/increment", params, request_options)
            .await?;
        let counter: DataStoreResponse<Counter> = DataStoreResponse::decode(response)?;
        Ok(counter.map(|c| c.0))
    }

    /// Delete an entry
    pub async fn delete(&self, key: &str) -> Result<DataStoreResponse<()>> {
        let params = QueryParams::new().with("entryKey", key);
        let response = self
            .request("entries/entry", params, RequestOptions::new(Method::DELETE))
            .await?;
        DataStoreResponse::empty(response)
    }

    /// Get the value of an entry as of a given version
    pub async fn get_version<T>(&self, key: &str, version_id: &str) -> Result<DataStoreResponse<T>>
    where
        T: DeserializeOwned,
    {
        let params = QueryParams::new()
            .with("entryKey", key)
            .with("versionId", version_id);
        let response = self
            .request(
                "entries/entry/versions/version",
                params,
                RequestOptions::new(Method::GET),
            )
            .await?;
        DataStoreResponse::decode(response)
    }

    /// List version records of an entry, one page at a time
    pub async fn list_versions(
        &self,
        key: &str,
        options: ListVersionsOptions,
    ) -> Result<DataStoreResponse<VersionList>> {
        let params = QueryParams::new()
            .with("limit", options.limit)
            .with("cursor", options.cursor)
            .with("sortOrder", options.sort_order.as_str())
            .with("entryKey", key)
            .with("startDate", options.start_time.map(|t| t.iso()))
            .with("endDate", options.end_time.map(|t| t.iso()));

        let response = self
            .request("entries/entry/versions", params, RequestOptions::new(Method::GET))
            .await?;
        DataStoreResponse::decode(response)
    }
}
