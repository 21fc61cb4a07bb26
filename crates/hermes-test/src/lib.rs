//! # Hermes Test
//!
//! In-memory HTTP testing for Hermes applications: no sockets, no ports.
//!
//! [`TestClient`] builds a [`DispatchEngine`](hermes_server::DispatchEngine)
//! from an [`AppConfig`](hermes_server::AppConfig) and feeds it requests
//! assembled with [`TestRequestBuilder`]. Responses come back fully
//! buffered as [`TestResponse`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use hermes_test::TestClient;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_create_user() {
//!     let client = TestClient::new(app_config()).unwrap();
//!
//!     let response = client
//!         .post("/users")
//!         .json(&json!({ "name": "Alice" }))
//!         .send()
//!         .await;
//!
//!     response.assert_status(201);
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::TestClient;
pub use error::TestError;
pub use request::TestRequestBuilder;
pub use response::TestResponse;
