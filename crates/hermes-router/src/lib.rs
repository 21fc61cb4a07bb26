//! Radix tree path matcher for Hermes.
//!
//! This crate provides the path matcher used by the Hermes dispatch engine.
//! Routes are stored in one radix tree per method key, so looking up
//! `(method, path)` behaves like looking up the key `method|path`.
//!
//! # Features
//!
//! - **Radix Tree Matching**: O(k) path lookup vs O(n) linear scan
//! - **Path Parameters**: Single-segment parameters (`/users/:id`)
//! - **Wildcards**: Catch-all routes (`/files/*path`)
//! - **Strict Mode**: Optional trailing-slash sensitivity
//!
//! # Example
//!
//! ```rust
//! use hermes_router::Router;
//!
//! let mut router = Router::with_strict(false);
//! router.insert("GET", "/users/:id", "getUser").unwrap();
//! router.insert("GET", "/files/*path", "serveFile").unwrap();
//!
//! let found = router.lookup("GET", "/users/123/").unwrap();
//! assert_eq!(*found.value, "getUser");
//! assert_eq!(found.params.get("id"), Some("123"));
//! ```
//!
//! # Architecture
//!
//! ```text
//!          GET tree                 POST tree
//!           (root)                   (root)
//!             │                         │
//!      ┌──────┴──────┐               "users"
//!   "users"       "files"               │
//!      │             │               (leaf)
//!   (leaf)        "*path"
//!      │
//!    ":id"
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod node;
mod params;
mod router;

use thiserror::Error;

pub use node::{Node, SegmentKind};
pub use params::Params;
pub use router::Router;

/// A matched route with its value and bound parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a, T> {
    /// The value registered for the route
    pub value: &'a T,
    /// Bound path parameters
    pub params: Params,
}

impl<'a, T> RouteMatch<'a, T> {
    /// Creates a new route match.
    #[must_use]
    pub fn new(value: &'a T, params: Params) -> Self {
        Self { value, params }
    }
}

/// Errors raised while inserting routes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// A value is already registered at this path.
    #[error("route already registered: {path}")]
    Conflict {
        /// The conflicting route key.
        path: String,
    },

    /// Two routes name the same parameter position differently.
    #[error("parameter ':{new}' in {path} conflicts with existing ':{existing}'")]
    ParamConflict {
        /// The route key being inserted.
        path: String,
        /// Name already registered at this position.
        existing: String,
        /// Name requested by the new route.
        new: String,
    },

    /// A `*wildcard` segment was followed by more segments.
    #[error("wildcard must be the last segment: {path}")]
    WildcardNotLast {
        /// The offending route key.
        path: String,
    },

    /// The path does not start with `/`.
    #[error("route path must start with '/': {path}")]
    InvalidPath {
        /// The offending path.
        path: String,
    },
}

impl RouterError {
    /// Prefixes the reported path with its method, yielding a `method|path` key.
    #[must_use]
    pub(crate) fn with_method(self, method: &str) -> Self {
        let key = |path: String| format!("{method}|{path}");
        match self {
            Self::Conflict { path } => Self::Conflict { path: key(path) },
            Self::ParamConflict {
                path,
                existing,
                new,
            } => Self::ParamConflict {
                path: key(path),
                existing,
                new,
            },
            Self::WildcardNotLast { path } => Self::WildcardNotLast { path: key(path) },
            Self::InvalidPath { path } => Self::InvalidPath { path: key(path) },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_match_new() {
        let value = "handler";
        let found = RouteMatch::new(&value, Params::new());
        assert_eq!(*found.value, "handler");
        assert!(found.params.is_empty());
    }

    #[test]
    fn test_router_error_display() {
        let err = RouterError::Conflict {
            path: "GET|/x".to_string(),
        };
        assert_eq!(err.to_string(), "route already registered: GET|/x");
    }
}
