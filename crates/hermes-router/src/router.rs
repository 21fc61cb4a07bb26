//! Method-keyed router.
//!
//! This module provides [`Router`], which keeps one radix tree per method
//! key. A key is any method token, including synthetic ones such as `ALL`,
//! so a `(method, path)` pair behaves like the single lookup key
//! `method|path`.

use std::collections::HashMap;

use crate::node::Node;
use crate::params::Params;
use crate::{RouteMatch, RouterError};

/// A radix tree router keyed by method.
///
/// # Example
///
/// ```rust
/// use hermes_router::Router;
///
/// let mut router = Router::new();
/// router.insert("GET", "/users", "listUsers").unwrap();
/// router.insert("GET", "/users/:id", "getUser").unwrap();
///
/// let found = router.lookup("GET", "/users/123").unwrap();
/// assert_eq!(*found.value, "getUser");
/// assert_eq!(found.params.get("id"), Some("123"));
/// assert!(router.lookup("POST", "/users").is_none());
/// ```
///
/// # Route Priority
///
/// 1. **Static segments** (e.g., `/users/me`)
/// 2. **Parameter segments** (e.g., `/users/:id`)
/// 3. **Wildcard segments** (e.g., `/files/*path`)
///
/// # Trailing Slashes
///
/// A strict router treats `/x` and `/x/` as different paths. The default
/// (non-strict) router ignores a single trailing slash.
#[derive(Debug, Clone)]
pub struct Router<T> {
    trees: HashMap<String, Node<T>>,
    strict: bool,
    route_count: usize,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    /// Creates a new empty, non-strict router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            trees: HashMap::new(),
            strict: false,
            route_count: 0,
        }
    }

    /// Creates a new empty router with the given trailing-slash strictness.
    #[must_use]
    pub fn with_strict(strict: bool) -> Self {
        Self {
            strict,
            ..Self::new()
        }
    }

    /// Returns true if trailing slashes are significant.
    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Inserts `value` under `method` at `path`.
    ///
    /// Method keys are matched case-sensitively, as HTTP method tokens are.
    pub fn insert(&mut self, method: &str, path: &str, value: T) -> Result<(), RouterError> {
        if !path.starts_with('/') {
            return Err(RouterError::InvalidPath {
                path: path.to_string(),
            });
        }
        self.trees
            .entry(method.to_string())
            .or_insert_with(Node::root)
            .insert(path, value, self.strict)
            .map_err(|err| err.with_method(method))?;
        self.route_count += 1;
        Ok(())
    }

    /// Looks up the value registered under `method` for `path`.
    #[must_use]
    pub fn lookup(&self, method: &str, path: &str) -> Option<RouteMatch<'_, T>> {
        let tree = self.trees.get(method)?;
        let mut params = Params::new();
        let value = tree.lookup(path, self.strict, &mut params)?;
        Some(RouteMatch::new(value, params))
    }

    /// Returns true if `method` has a route matching `path`.
    #[must_use]
    pub fn contains(&self, method: &str, path: &str) -> bool {
        self.lookup(method, path).is_some()
    }

    /// Returns the sorted method keys whose tree resolves `path`.
    ///
    /// ```rust
    /// use hermes_router::Router;
    ///
    /// let mut router = Router::new();
    /// router.insert("POST", "/x", 2).unwrap();
    /// router.insert("GET", "/x", 1).unwrap();
    /// assert_eq!(router.methods_for("/x"), vec!["GET", "POST"]);
    /// ```
    #[must_use]
    pub fn methods_for(&self, path: &str) -> Vec<&str> {
        let mut found: Vec<&str> = self
            .trees
            .iter()
            .filter(|(_, tree)| tree.lookup(path, self.strict, &mut Params::new()).is_some())
            .map(|(method, _)| method.as_str())
            .collect();
        found.sort_unstable();
        found
    }

    /// Returns the number of routes registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}
