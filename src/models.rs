//! Payload types of the data store endpoints.

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::time::Time;

/// A key returned by entry listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryKeyInfo {
    pub key: String,
    #[serde(default)]
    pub scope: String,
}

/// A version record of an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryVersionInfo {
    pub version: String,
    pub deleted: bool,
    pub created_time: Time,
    pub content_length: u64,
    pub object_created_time: Time,
}

/// One page of entry keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryList {
    pub keys: Vec<EntryKeyInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_cursor: Option<String>,
}

/// One page of version records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionList {
    pub versions: Vec<EntryVersionInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_cursor: Option<String>,
}

/// A data store of the universe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataStoreInfo {
    pub name: String,
    pub created_time: Time,
}

/// One page of data stores
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataStoreList {
    pub datastores: Vec<DataStoreInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_cursor: Option<String>,
}

/// Version ordering for version listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "Ascending",
            SortOrder::Descending => "Descending",
        }
    }
}

/// Entry metadata the service returns in response headers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryMetadata {
    pub content_md5: Option<String>,
    pub version: Option<String>,
    pub created_time: Option<Time>,
    pub version_created_time: Option<Time>,
    pub user_ids: Vec<u64>,
    pub attributes: Option<Value>,
}

impl EntryMetadata {
    /// Read the `content-md5` and `roblox-entry-*` headers; missing or
    /// unparsable headers are left empty
    pub fn from_headers(headers: &HeaderMap) -> Self {
        fn get<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
            headers.get(name).and_then(|v| v.to_str().ok())
        }

        EntryMetadata {
            content_md5: get(headers, "content-md5").map(str::to_string),
            version: get(headers, "roblox-entry-version").map(str::to_string),
            created_time: get(headers, "roblox-entry-created-time").and_then(Time::parse),
            version_created_time: get(headers, "roblox-entry-version-created-time").and_then(Time::parse),
            user_ids: get(headers, "roblox-entry-userids")
                .and_then(|s| serde_json::from_str(s).ok())
                .unwrap_or_default(),
            attributes: get(headers, "roblox-entry-attributes").and_then(|s| serde_json::from_str(s).ok()),
        }
    }
}
