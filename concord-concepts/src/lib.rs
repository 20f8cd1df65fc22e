//! Reference concepts for Concord
//!
//! Six independent concepts (authentication, sessions, posts, wishlists,
//! friendships and the request boundary) composed only through sync
//! rules, plus an [`App`] that turns `(path, body)` calls into responses.
//!
//! ```
//! use concord_concepts::{App, RequestSettings};
//! use concord_engine::EngineSettings;
//! use serde_json::json;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let app = App::new(EngineSettings::default(), RequestSettings::default()).unwrap();
//! let body = json!({ "username": "alice", "password": "pw1" });
//! let response = app
//!     .handle("/UserAuthentication/register", body.as_object().unwrap().clone())
//!     .await
//!     .unwrap();
//! assert!(response.contains_key("user"));
//! # });
//! ```

pub mod app;
pub mod concepts;
pub mod store;
pub mod syncs;

pub use app::{App, AppError, Handled, RequestSettings};
pub use concepts::Concepts;
pub use store::{Collection, StoreError};
