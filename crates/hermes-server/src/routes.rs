//! The immutable route table.
//!
//! Built once from an [`AppConfig`]: prefixes are composed, group
//! middlewares are merged into each route's `before` list, each route's
//! chain is precomputed, and every route is inserted into the matcher under
//! its `method|path` key.

use std::fmt;
use std::sync::Arc;

use hermes_config::{ConfigError, ConfigResult};
use hermes_core::BoxedHandler;
use hermes_router::{RouteMatch, Router, RouterError};

use crate::app::AppConfig;
use crate::controller::{ControllerId, RouteDef, RouteMethod};

/// A fully composed route.
pub struct Route {
    method: RouteMethod,
    path: String,
    path_has_params: bool,
    controller: &'static str,
    fn_name: String,
    before: Vec<BoxedHandler>,
    handler: BoxedHandler,
    after: Vec<BoxedHandler>,
    chain: Arc<[BoxedHandler]>,
}

impl Route {
    fn new(
        controller: ControllerId,
        def: &RouteDef,
        path: String,
        group_middlewares: &[BoxedHandler],
    ) -> Self {
        let before: Vec<BoxedHandler> = group_middlewares
            .iter()
            .chain(def.before.iter())
            .cloned()
            .collect();
        let chain: Arc<[BoxedHandler]> = before
            .iter()
            .chain(std::iter::once(&def.handler))
            .chain(def.after.iter())
            .cloned()
            .collect();

        Self {
            method: def.method,
            path_has_params: path.split('/').any(|segment| segment.starts_with(':')),
            path,
            controller: controller.name(),
            fn_name: def.fn_name.clone(),
            before,
            handler: Arc::clone(&def.handler),
            after: def.after.clone(),
            chain,
        }
    }

    /// Returns the route method.
    #[must_use]
    pub fn method(&self) -> RouteMethod {
        self.method
    }

    /// Returns the composed path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the `method|path` identity key.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}|{}", self.method, self.path)
    }

    /// Returns true if the path has `:param` segments.
    #[must_use]
    pub fn path_has_params(&self) -> bool {
        self.path_has_params
    }

    /// Returns the type name of the declaring controller.
    #[must_use]
    pub fn controller(&self) -> &'static str {
        self.controller
    }

    /// Returns the controller function name.
    #[must_use]
    pub fn fn_name(&self) -> &str {
        &self.fn_name
    }

    /// Returns group middlewares followed by the route's own `before` handlers.
    #[must_use]
    pub fn before(&self) -> &[BoxedHandler] {
        &self.before
    }

    /// Returns the route handler.
    #[must_use]
    pub fn handler(&self) -> &BoxedHandler {
        &self.handler
    }

    /// Returns the route's `after` handlers.
    #[must_use]
    pub fn after(&self) -> &[BoxedHandler] {
        &self.after
    }

    /// Returns `before ++ [handler] ++ after`.
    #[must_use]
    pub fn chain(&self) -> Arc<[BoxedHandler]> {
        Arc::clone(&self.chain)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("path_has_params", &self.path_has_params)
            .field("controller", &self.controller)
            .field("fn_name", &self.fn_name)
            .field("chain", &self.chain.len())
            .finish()
    }
}

/// Read-only `(method, path) -> Route` table shared by all requests.
pub struct RouteTable {
    router: Router<Arc<Route>>,
    routes: Vec<Arc<Route>>,
}

impl RouteTable {
    /// Builds the table.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NoControllers`] if neither controllers nor groups are set
    /// - [`ConfigError::UnregisteredController`] for a controller that was never registered
    /// - [`ConfigError::DuplicateRoute`] if two routes share a `method|path` key
    /// - [`ConfigError::InvalidRoute`] if the matcher rejects a path
    pub fn build(config: &AppConfig) -> ConfigResult<Self> {
        if config.controllers.is_empty() && config.groups.is_empty() {
            return Err(ConfigError::NoControllers);
        }

        let prefix = config.prefix.as_deref().unwrap_or("");
        let mut table = Self {
            router: Router::with_strict(config.strict),
            routes: Vec::new(),
        };

        for &id in &config.controllers {
            table.add_controller(config, id, &[prefix], &[])?;
        }

        for group in &config.groups {
            let group_prefix = group.prefix.as_deref().unwrap_or("");
            for &id in &group.controllers {
                table.add_controller(config, id, &[prefix, group_prefix], &group.middlewares)?;
            }
        }

        Ok(table)
    }

    fn add_controller(
        &mut self,
        config: &AppConfig,
        id: ControllerId,
        prefixes: &[&str],
        group_middlewares: &[BoxedHandler],
    ) -> ConfigResult<()> {
        let declared = config
            .registry
            .get(id)
            .ok_or_else(|| ConfigError::UnregisteredController {
                name: id.name().to_string(),
            })?;

        let mut fragments = prefixes.to_vec();
        fragments.push(declared.prefix());

        for def in declared.routes() {
            let path = compose_path(&fragments, &def.path);
            let route = Arc::new(Route::new(id, def, path, group_middlewares));
            self.router
                .insert(route.method.as_str(), &route.path, Arc::clone(&route))
                .map_err(route_error)?;
            tracing::debug!(
                method = %route.method,
                path = %route.path,
                controller = route.controller,
                handler = %route.fn_name,
                "Registered route"
            );
            self.routes.push(route);
        }

        Ok(())
    }

    /// Looks up a route by method key and path.
    #[must_use]
    pub fn lookup(&self, method: &str, path: &str) -> Option<RouteMatch<'_, Arc<Route>>> {
        self.router.lookup(method, path)
    }

    /// Returns the standard methods with a route at `path`, sorted.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<&str> {
        let known: Vec<&str> = RouteMethod::KNOWN.iter().map(|m| m.as_str()).collect();
        self.router
            .methods_for(path)
            .into_iter()
            .filter(|method| known.contains(method))
            .collect()
    }

    /// Returns every route in registration order.
    #[must_use]
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    /// Returns true if trailing slashes are significant.
    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.router.is_strict()
    }

    /// Returns the number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if the table has no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("strict", &self.router.is_strict())
            .field("routes", &self.routes)
            .finish()
    }
}

fn route_error(err: RouterError) -> ConfigError {
    let reason = err.to_string();
    match err {
        RouterError::Conflict { path } => ConfigError::DuplicateRoute { key: path },
        RouterError::ParamConflict { path, .. }
        | RouterError::WildcardNotLast { path }
        | RouterError::InvalidPath { path } => ConfigError::InvalidRoute { key: path, reason },
    }
}

/// Joins prefix fragments and a route path.
///
/// Each prefix loses its trailing slashes and gains a single leading one.
/// The route path keeps a trailing slash unless it is just `/`. Doubled
/// slashes are collapsed.
///
/// ```rust
/// use hermes_server::compose_path;
///
/// assert_eq!(compose_path(&["/api", "g/", "/c"], "/r"), "/api/g/c/r");
/// assert_eq!(compose_path(&["/api"], "/"), "/api");
/// assert_eq!(compose_path(&[], "/"), "/");
/// ```
#[must_use]
pub fn compose_path(prefixes: &[&str], route_path: &str) -> String {
    let mut path = String::new();

    for fragment in prefixes {
        let trimmed = fragment.trim_end_matches('/');
        if trimmed.is_empty() {
            continue;
        }
        if !trimmed.starts_with('/') {
            path.push('/');
        }
        path.push_str(trimmed);
    }

    if !(route_path.is_empty() || (route_path == "/" && !path.is_empty())) {
        if !route_path.starts_with('/') {
            path.push('/');
        }
        path.push_str(route_path);
    }

    while path.contains("//") {
        path = path.replace("//", "/");
    }

    if path.is_empty() {
        path.push('/');
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Group;
    use crate::controller::{Controller, ControllerRoutes};
    use hermes_core::{handler_fn, named_handler};
    use proptest::prelude::*;

    fn noop() -> BoxedHandler {
        handler_fn(|_ctx| Box::pin(async { Ok(()) }))
    }

    fn marker(name: &'static str) -> BoxedHandler {
        named_handler(name, |_ctx| Box::pin(async { Ok(()) }))
    }

    struct Things;

    impl Controller for Things {
        fn routes(&self) -> ControllerRoutes {
            ControllerRoutes::new("/c")
                .get("/r", "read", marker("target"))
                .with_before([marker("route_before")])
                .with_after([marker("route_after")])
                .post("/items/:id", "update", noop())
        }
    }

    struct Clash;

    impl Controller for Clash {
        fn routes(&self) -> ControllerRoutes {
            ControllerRoutes::new("/c").get("/r", "again", noop())
        }
    }

    struct BadWildcard;

    impl Controller for BadWildcard {
        fn routes(&self) -> ControllerRoutes {
            ControllerRoutes::new("/w").get("/*rest/more", "bad", noop())
        }
    }

    fn names(handlers: &[BoxedHandler]) -> Vec<&'static str> {
        handlers.iter().map(|h| h.name()).collect()
    }

    #[test]
    fn test_compose_path() {
        assert_eq!(compose_path(&["/api", "/g", "/c"], "/r"), "/api/g/c/r");
        assert_eq!(compose_path(&["/api/", "g", "c//"], "r"), "/api/g/c/r");
        assert_eq!(compose_path(&["", "", "/c"], "/r/"), "/c/r/");
        assert_eq!(compose_path(&["/", "/"], "/"), "/");
        assert_eq!(compose_path(&["/c"], ""), "/c");
        assert_eq!(compose_path(&["/c"], "//x"), "/c/x");
    }

    #[test]
    fn test_build_requires_controllers() {
        let config = AppConfig::builder().build();
        assert!(matches!(RouteTable::build(&config), Err(ConfigError::NoControllers)));
    }

    #[test]
    fn test_build_rejects_unregistered_controller() {
        let config = AppConfig::builder().controller::<Things>().build();
        match RouteTable::build(&config) {
            Err(ConfigError::UnregisteredController { name }) => assert!(name.ends_with("Things")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_build_composes_prefixes_and_middlewares() {
        let config = AppConfig::builder()
            .prefix("/api")
            .register(&Things)
            .group(
                Group::new()
                    .prefix("/g")
                    .middleware(marker("group_mw"))
                    .controller::<Things>(),
            )
            .build();
        let table = RouteTable::build(&config).unwrap();
        assert_eq!(table.len(), 2);

        let found = table.lookup("GET", "/api/g/c/r").unwrap();
        let route = found.value;
        assert_eq!(route.key(), "GET|/api/g/c/r");
        assert_eq!(route.fn_name(), "read");
        assert!(!route.path_has_params());
        assert_eq!(names(route.before()), vec!["group_mw", "route_before"]);
        assert_eq!(names(route.after()), vec!["route_after"]);
        assert_eq!(route.handler().name(), "target");
        assert_eq!(
            names(&route.chain()),
            vec!["group_mw", "route_before", "target", "route_after"]
        );

        let found = table.lookup("POST", "/api/g/c/items/9").unwrap();
        assert!(found.value.path_has_params());
        assert_eq!(found.params.get("id"), Some("9"));
    }

    #[test]
    fn test_build_top_level_controller_has_no_group_middleware() {
        let config = AppConfig::builder().mount(&Things).build();
        let table = RouteTable::build(&config).unwrap();
        let route = table.lookup("GET", "/c/r").unwrap().value;
        assert_eq!(names(route.before()), vec!["route_before"]);
    }

    #[test]
    fn test_build_rejects_duplicate_route() {
        let config = AppConfig::builder().mount(&Things).mount(&Clash).build();
        match RouteTable::build(&config) {
            Err(ConfigError::DuplicateRoute { key }) => assert_eq!(key, "GET|/c/r"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_build_reports_invalid_route() {
        let config = AppConfig::builder().mount(&BadWildcard).build();
        assert!(matches!(
            RouteTable::build(&config),
            Err(ConfigError::InvalidRoute { .. })
        ));
    }

    #[test]
    fn test_strict_flag_reaches_matcher() {
        let strict =
            RouteTable::build(&AppConfig::builder().mount(&Things).strict(true).build()).unwrap();
        assert!(strict.is_strict());
        assert!(strict.lookup("GET", "/c/r").is_some());
        assert!(strict.lookup("GET", "/c/r/").is_none());

        let loose = RouteTable::build(&AppConfig::builder().mount(&Things).build()).unwrap();
        assert!(loose.lookup("GET", "/c/r/").is_some());
    }

    #[test]
    fn test_allowed_methods() {
        let table = RouteTable::build(&AppConfig::builder().mount(&Things).build()).unwrap();
        assert_eq!(table.allowed_methods("/c/r"), vec!["GET"]);
        assert_eq!(table.allowed_methods("/c/items/1"), vec!["POST"]);
        assert!(table.allowed_methods("/nope").is_empty());
    }

    proptest! {
        #[test]
        fn prop_compose_path_is_normalised(
            prefixes in proptest::collection::vec("/{0,2}[a-z]{0,4}/{0,2}", 0..4),
            route in "/{0,2}[a-z:]{0,6}",
        ) {
            let refs: Vec<&str> = prefixes.iter().map(String::as_str).collect();
            let path = compose_path(&refs, &route);
            prop_assert!(path.starts_with('/'));
            prop_assert!(!path.contains("//"));
        }
    }
}
