//! `SessionKit` manages a client-side session against a remote authentication service and the
//! authenticated account's named values.
//!
//! A [`SessionManager`] turns a one-time landing credential into a durable session and lazily
//! resolves the account identifier; an [`AccountDataClient`] stores JSON values under named
//! keys for that account, caching them locally and shipping them hex-encoded through
//! [`codec`].
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use sessionkit_core::{
//!     CredentialStore, Environment, MemoryStorage, Request, ServiceConfig, SessionManager,
//!     StaticNavigation,
//! };
//!
//! # async fn run() -> sessionkit_core::SessionResult<()> {
//! let config = ServiceConfig::from_environment(Environment::Staging)?;
//! let store = CredentialStore::with_durable(Arc::new(MemoryStorage::new()));
//! let session = SessionManager::new(Request::new(config), store);
//!
//! session.capture_landing(&StaticNavigation::new("https://app.example/?key=abc"), None)?;
//! let _account = session.ensure_authenticated().await?;
//!
//! let data = session.data_client();
//! data.set("theme", "dark").await?;
//! # Ok(())
//! # }
//! ```

pub mod codec;

mod config;
pub use config::*;

mod error;
pub use error::*;

/// Bridges the library's `log` records to a host-provided logger.
pub mod logger;

mod request;
pub use request::{into_service_result, Request};

mod session;
pub use session::*;

mod account;
pub use account::*;

pub mod storage;
pub use storage::{
    CredentialStore, FileStorage, MemoryStorage, SessionStorage, StorageError, StoragePaths,
};

mod types;
pub use types::*;

#[cfg(feature = "ffi")]
pub mod ffi;

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!("sessionkit_core");
