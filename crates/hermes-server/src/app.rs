//! Application configuration.
//!
//! [`AppConfig`] is what the route table and dispatch engine are built
//! from: controllers and groups, global middlewares, the error handler and
//! routing flags, plus where the host server should listen.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use hermes_config::ServerSettings;
use hermes_core::BoxedHandler;

use crate::controller::{Controller, ControllerId, RouteRegistry};
use crate::error_handler::{BoxedErrorHandler, DefaultErrorHandler};

/// Controllers mounted under a shared prefix and middleware list.
///
/// Group middlewares run before each route's own `before` handlers.
#[derive(Clone, Default)]
pub struct Group {
    pub(crate) prefix: Option<String>,
    pub(crate) middlewares: Vec<BoxedHandler>,
    pub(crate) controllers: Vec<ControllerId>,
}

impl Group {
    /// Creates an empty group.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the group prefix.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Adds a group middleware.
    #[must_use]
    pub fn middleware(mut self, handler: BoxedHandler) -> Self {
        self.middlewares.push(handler);
        self
    }

    /// Adds a controller to the group.
    #[must_use]
    pub fn controller<C: Controller>(mut self) -> Self {
        self.controllers.push(ControllerId::of::<C>());
        self
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("prefix", &self.prefix)
            .field("middlewares", &self.middlewares.len())
            .field("controllers", &self.controllers)
            .finish()
    }
}

/// Complete application configuration.
///
/// # Example
///
/// ```rust
/// use hermes_core::handler_fn;
/// use hermes_server::{AppConfig, Controller, ControllerRoutes, Group};
///
/// struct Health;
///
/// impl Controller for Health {
///     fn routes(&self) -> ControllerRoutes {
///         ControllerRoutes::new("/health").get("/", "check", handler_fn(|ctx| {
///             Box::pin(async move {
///                 ctx.string("ok", None, None)?;
///                 Ok(())
///             })
///         }))
///     }
/// }
///
/// let config = AppConfig::builder()
///     .prefix("/api")
///     .register(&Health)
///     .group(Group::new().prefix("/v1").controller::<Health>())
///     .port(8080)
///     .build();
///
/// assert_eq!(config.port(), 8080);
/// ```
pub struct AppConfig {
    pub(crate) prefix: Option<String>,
    pub(crate) controllers: Vec<ControllerId>,
    pub(crate) groups: Vec<Group>,
    pub(crate) middlewares: Vec<BoxedHandler>,
    pub(crate) error_handler: BoxedErrorHandler,
    pub(crate) registry: RouteRegistry,
    pub(crate) strict: bool,
    pub(crate) disable_startup_message: bool,
    pub(crate) hostname: String,
    pub(crate) port: u16,
    pub(crate) shutdown_timeout: Duration,
}

impl AppConfig {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::new()
    }

    /// Creates a builder seeded from loaded server settings.
    #[must_use]
    pub fn from_settings(settings: &ServerSettings) -> AppConfigBuilder {
        let mut builder = AppConfigBuilder::new()
            .hostname(settings.hostname.clone())
            .port(settings.port)
            .strict(settings.strict)
            .disable_startup_message(settings.disable_startup_message)
            .shutdown_timeout(Duration::from_secs(settings.shutdown_timeout_secs));
        if let Some(prefix) = &settings.prefix {
            builder = builder.prefix(prefix.clone());
        }
        builder
    }

    /// Returns the global prefix.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Returns true if trailing slashes are significant.
    #[must_use]
    pub fn strict(&self) -> bool {
        self.strict
    }

    /// Returns true if the startup banner is suppressed.
    #[must_use]
    pub fn disable_startup_message(&self) -> bool {
        self.disable_startup_message
    }

    /// Returns the interface to bind.
    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Returns the port to bind.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the graceful shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// Returns the route declarations collected so far.
    #[must_use]
    pub fn registry(&self) -> &RouteRegistry {
        &self.registry
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("prefix", &self.prefix)
            .field("controllers", &self.controllers)
            .field("groups", &self.groups)
            .field("middlewares", &self.middlewares.len())
            .field("strict", &self.strict)
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

/// Builder for [`AppConfig`].
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl Default for AppConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfigBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        let defaults = ServerSettings::default();
        Self {
            config: AppConfig {
                prefix: None,
                controllers: Vec::new(),
                groups: Vec::new(),
                middlewares: Vec::new(),
                error_handler: Arc::new(DefaultErrorHandler),
                registry: RouteRegistry::new(),
                strict: defaults.strict,
                disable_startup_message: defaults.disable_startup_message,
                hostname: defaults.hostname,
                port: defaults.port,
                shutdown_timeout: Duration::from_secs(defaults.shutdown_timeout_secs),
            },
        }
    }

    /// Sets the global prefix.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.prefix = Some(prefix.into());
        self
    }

    /// Collects the routes of `controller` without mounting it.
    #[must_use]
    pub fn register<C: Controller>(mut self, controller: &C) -> Self {
        self.config.registry.register(controller);
        self
    }

    /// Replaces the route registry.
    #[must_use]
    pub fn registry(mut self, registry: RouteRegistry) -> Self {
        self.config.registry = registry;
        self
    }

    /// Mounts controller type `C` at the top level.
    ///
    /// `C` must be registered before the route table is built.
    #[must_use]
    pub fn controller<C: Controller>(mut self) -> Self {
        self.config.controllers.push(ControllerId::of::<C>());
        self
    }

    /// Registers and mounts `controller` at the top level.
    #[must_use]
    pub fn mount<C: Controller>(self, controller: &C) -> Self {
        self.register(controller).controller::<C>()
    }

    /// Adds a group.
    #[must_use]
    pub fn group(mut self, group: Group) -> Self {
        self.config.groups.push(group);
        self
    }

    /// Adds a global middleware.
    #[must_use]
    pub fn middleware(mut self, handler: BoxedHandler) -> Self {
        self.config.middlewares.push(handler);
        self
    }

    /// Sets the error handler.
    #[must_use]
    pub fn error_handler(mut self, handler: BoxedErrorHandler) -> Self {
        self.config.error_handler = handler;
        self
    }

    /// Sets trailing-slash strictness.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.config.strict = strict;
        self
    }

    /// Suppresses the startup banner.
    #[must_use]
    pub fn disable_startup_message(mut self, disable: bool) -> Self {
        self.config.disable_startup_message = disable;
        self
    }

    /// Sets the interface to bind.
    #[must_use]
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.config.hostname = hostname.into();
        self
    }

    /// Sets the port to bind. `0` picks an ephemeral port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets the graceful shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout = timeout;
        self
    }

    /// Finishes the configuration.
    ///
    /// Structural checks happen when the route table is built.
    #[must_use]
    pub fn build(self) -> AppConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ControllerRoutes;
    use hermes_core::handler_fn;

    struct Ping;

    impl Controller for Ping {
        fn routes(&self) -> ControllerRoutes {
            ControllerRoutes::new("/ping").get(
                "/",
                "ping",
                handler_fn(|_ctx| Box::pin(async { Ok(()) })),
            )
        }
    }

    #[test]
    fn test_builder_defaults() {
        let config = AppConfig::builder().build();
        assert_eq!(config.hostname(), "0.0.0.0");
        assert_eq!(config.port(), 3000);
        assert!(!config.strict());
        assert!(!config.disable_startup_message());
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(30));
        assert!(config.prefix().is_none());
    }

    #[test]
    fn test_builder_mount_registers_and_references() {
        let config = AppConfig::builder().mount(&Ping).build();
        assert_eq!(config.controllers, vec![ControllerId::of::<Ping>()]);
        assert!(config.registry().contains(ControllerId::of::<Ping>()));
    }

    #[test]
    fn test_builder_controller_without_register() {
        let config = AppConfig::builder().controller::<Ping>().build();
        assert_eq!(config.controllers.len(), 1);
        assert!(config.registry().is_empty());
    }

    #[test]
    fn test_group_builder() {
        let group = Group::new()
            .prefix("/admin")
            .middleware(handler_fn(|ctx| {
                Box::pin(async move {
                    ctx.next();
                    Ok(())
                })
            }))
            .controller::<Ping>();
        assert_eq!(group.prefix.as_deref(), Some("/admin"));
        assert_eq!(group.middlewares.len(), 1);
        assert_eq!(group.controllers.len(), 1);
    }

    #[test]
    fn test_from_settings() {
        let settings = ServerSettings {
            hostname: "127.0.0.1".to_string(),
            port: 8080,
            prefix: Some("/api".to_string()),
            strict: true,
            disable_startup_message: true,
            shutdown_timeout_secs: 5,
        };
        let config = AppConfig::from_settings(&settings).build();
        assert_eq!(config.hostname(), "127.0.0.1");
        assert_eq!(config.port(), 8080);
        assert_eq!(config.prefix(), Some("/api"));
        assert!(config.strict());
        assert!(config.disable_startup_message());
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(5));
    }
}
