//! # opencloud - Open Cloud DataStore and messaging client for Rust
//!
//! An async client for the Open Cloud standard data store and messaging
//! APIs. Each typed method becomes an authenticated HTTP request; responses
//! are decoded through a JSON codec that tolerates the service's bare `inf`
//! numbers, and failures are mapped onto a typed error taxonomy.
//!
//! ## Features
//!
//! - Entry get/set/increment/delete, entry and version listing, data store
//!   listing and topic publishing
//! - `x-api-key` authentication and `content-md5` integrity digests on writes
//! - Structured errors carrying the coarse reason and the data store code
//! - Pluggable [`Transport`] so requests can be served by any HTTP stack
//!
//! ## Basic Usage
//!
//! ```no_run
//! use opencloud::{OpenCloud, SetOptions};
//!
//! # async fn run() -> opencloud::Result<()> {
//! let cloud = OpenCloud::new("api-key", 3407804942);
//! let store = cloud.get_data_store("Players");
//!
//! store.set("coins", &42, SetOptions::default()).await?;
//! let coins = store.get::<i64>("coins").await?;
//! println!("coins: {}", coins.value);
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! ```no_run
//! use opencloud::{Error, ErrorReason, OpenCloud};
//!
//! # async fn run(cloud: OpenCloud) {
//! match cloud.get_data_store("Players").get::<i64>("missing").await {
//!     Err(err) if err.reason() == Some(ErrorReason::NotFound) => println!("no entry"),
//!     Err(err) if err.is_service_error() => println!("service said no: {}", err),
//!     Err(Error::Transport(e)) => println!("network failure: {}", e),
//!     Err(err) => println!("other failure: {}", err),
//!     Ok(entry) => println!("{}", entry.value),
//! }
//! # }
//! ```

pub mod apikey;
pub mod client;
pub mod codec;
pub mod datastore;
pub mod error;
pub mod models;
pub mod opencloud;
pub mod request;
pub mod response;
pub mod time;
pub mod transport;

// Re-export main types for convenience
pub use apikey::ApiKey;
pub use client::Config;
pub use datastore::{DataStore, EntryWriteOptions, ListEntriesOptions, ListVersionsOptions, SetOptions};
pub use error::{DataStoreReason, Error, ErrorBodyKind, ErrorReason, Result};
pub use models::{
    DataStoreInfo, DataStoreList, EntryKeyInfo, EntryList, EntryMetadata, EntryVersionInfo,
    SortOrder, VersionList,
};
pub use opencloud::{ListDataStoresOptions, OpenCloud};
pub use request::{QueryParams, RequestOptions};
pub use response::{DataStoreResponse, PublishResponse, ResponsePolicy};
pub use time::Time;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

// Re-export serde_json for convenience
pub use serde_json::json;
