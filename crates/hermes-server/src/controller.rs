//! Controller registration.
//!
//! A [`Controller`] declares its routes through plain builder calls on
//! [`ControllerRoutes`]. Registering a controller with a [`RouteRegistry`]
//! captures those declarations once per controller type; the application
//! config then refers to the controller by [`ControllerId`].
//!
//! # Example
//!
//! ```rust
//! use hermes_core::handler_fn;
//! use hermes_server::{Controller, ControllerId, ControllerRoutes, RouteRegistry};
//!
//! struct Users;
//!
//! impl Controller for Users {
//!     fn routes(&self) -> ControllerRoutes {
//!         ControllerRoutes::new("/users")
//!             .get("/", "list", handler_fn(|ctx| {
//!                 Box::pin(async move {
//!                     ctx.json(&["ada", "grace"], None)?;
//!                     Ok(())
//!                 })
//!             }))
//!             .get("/:id", "show", handler_fn(|ctx| {
//!                 Box::pin(async move {
//!                     let id = ctx.param("id").unwrap_or_default().to_string();
//!                     ctx.string(id, None, None)?;
//!                     Ok(())
//!                 })
//!             }))
//!     }
//! }
//!
//! let mut registry = RouteRegistry::new();
//! registry.register(&Users);
//! assert_eq!(registry.get(ControllerId::of::<Users>()).unwrap().routes().len(), 2);
//! ```

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;

use hermes_core::BoxedHandler;

/// Method a route answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteMethod {
    /// `GET`
    Get,
    /// `HEAD`
    Head,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
    /// `CONNECT`
    Connect,
    /// `OPTIONS`
    Options,
    /// `TRACE`
    Trace,
    /// `PATCH`
    Patch,
    /// Matches every method that has no route of its own.
    All,
}

impl RouteMethod {
    /// The standard HTTP methods, in the order they are probed for `Allow`.
    pub const KNOWN: [Self; 9] = [
        Self::Connect,
        Self::Delete,
        Self::Get,
        Self::Head,
        Self::Options,
        Self::Patch,
        Self::Post,
        Self::Put,
        Self::Trace,
    ];

    /// Returns the method key used in the route table.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Connect => "CONNECT",
            Self::Options => "OPTIONS",
            Self::Trace => "TRACE",
            Self::Patch => "PATCH",
            Self::All => "ALL",
        }
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A route as declared by a controller, before any prefix is applied.
#[derive(Clone)]
pub struct RouteDef {
    /// Method the route answers to.
    pub method: RouteMethod,
    /// Path relative to the controller prefix.
    pub path: String,
    /// Name of the controller function, used in logs.
    pub fn_name: String,
    /// Handlers run before the route handler.
    pub before: Vec<BoxedHandler>,
    /// The route handler.
    pub handler: BoxedHandler,
    /// Handlers run after the route handler.
    pub after: Vec<BoxedHandler>,
}

impl fmt::Debug for RouteDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDef")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("fn_name", &self.fn_name)
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .finish()
    }
}

/// Route declarations of one controller.
#[derive(Debug, Clone, Default)]
pub struct ControllerRoutes {
    prefix: String,
    routes: Vec<RouteDef>,
}

impl ControllerRoutes {
    /// Starts a declaration list under `prefix`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            routes: Vec::new(),
        }
    }

    /// Declares a route.
    #[must_use]
    pub fn route(
        mut self,
        method: RouteMethod,
        path: impl Into<String>,
        fn_name: impl Into<String>,
        handler: BoxedHandler,
    ) -> Self {
        self.routes.push(RouteDef {
            method,
            path: path.into(),
            fn_name: fn_name.into(),
            before: Vec::new(),
            handler,
            after: Vec::new(),
        });
        self
    }

    /// Declares a `GET` route.
    #[must_use]
    pub fn get(
        self,
        path: impl Into<String>,
        fn_name: impl Into<String>,
        handler: BoxedHandler,
    ) -> Self {
        self.route(RouteMethod::Get, path, fn_name, handler)
    }

    /// Declares a `POST` route.
    #[must_use]
    pub fn post(
        self,
        path: impl Into<String>,
        fn_name: impl Into<String>,
        handler: BoxedHandler,
    ) -> Self {
        self.route(RouteMethod::Post, path, fn_name, handler)
    }

    /// Declares a `PUT` route.
    #[must_use]
    pub fn put(
        self,
        path: impl Into<String>,
        fn_name: impl Into<String>,
        handler: BoxedHandler,
    ) -> Self {
        self.route(RouteMethod::Put, path, fn_name, handler)
    }

    /// Declares a `PATCH` route.
    #[must_use]
    pub fn patch(
        self,
        path: impl Into<String>,
        fn_name: impl Into<String>,
        handler: BoxedHandler,
    ) -> Self {
        self.route(RouteMethod::Patch, path, fn_name, handler)
    }

    /// Declares a `DELETE` route.
    #[must_use]
    pub fn delete(
        self,
        path: impl Into<String>,
        fn_name: impl Into<String>,
        handler: BoxedHandler,
    ) -> Self {
        self.route(RouteMethod::Delete, path, fn_name, handler)
    }

    /// Declares a `HEAD` route.
    #[must_use]
    pub fn head(
        self,
        path: impl Into<String>,
        fn_name: impl Into<String>,
        handler: BoxedHandler,
    ) -> Self {
        self.route(RouteMethod::Head, path, fn_name, handler)
    }

    /// Declares an `OPTIONS` route.
    #[must_use]
    pub fn options(
        self,
        path: impl Into<String>,
        fn_name: impl Into<String>,
        handler: BoxedHandler,
    ) -> Self {
        self.route(RouteMethod::Options, path, fn_name, handler)
    }

    /// Declares a route matching every method.
    #[must_use]
    pub fn all(
        self,
        path: impl Into<String>,
        fn_name: impl Into<String>,
        handler: BoxedHandler,
    ) -> Self {
        self.route(RouteMethod::All, path, fn_name, handler)
    }

    /// Appends `before` handlers to the most recently declared route.
    #[must_use]
    pub fn with_before(mut self, handlers: impl IntoIterator<Item = BoxedHandler>) -> Self {
        if let Some(route) = self.routes.last_mut() {
            route.before.extend(handlers);
        }
        self
    }

    /// Appends `after` handlers to the most recently declared route.
    #[must_use]
    pub fn with_after(mut self, handlers: impl IntoIterator<Item = BoxedHandler>) -> Self {
        if let Some(route) = self.routes.last_mut() {
            route.after.extend(handlers);
        }
        self
    }

    /// Returns the controller prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the declared routes in declaration order.
    #[must_use]
    pub fn routes(&self) -> &[RouteDef] {
        &self.routes
    }
}

/// A type that declares routes.
pub trait Controller: Send + Sync + 'static {
    /// Returns the controller's route declarations.
    fn routes(&self) -> ControllerRoutes;
}

/// Stable identity of a controller type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControllerId {
    type_id: TypeId,
    name: &'static str,
}

impl ControllerId {
    /// Returns the id of controller type `C`.
    #[must_use]
    pub fn of<C: Controller>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            name: type_name::<C>(),
        }
    }

    /// Returns the controller's type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Route declarations collected per controller type.
#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    controllers: HashMap<TypeId, ControllerRoutes>,
}

impl RouteRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the routes of `controller`.
    ///
    /// A controller type is collected once; later calls for the same type
    /// keep the first declarations.
    pub fn register<C: Controller>(&mut self, controller: &C) -> &mut Self {
        self.controllers
            .entry(TypeId::of::<C>())
            .or_insert_with(|| controller.routes());
        self
    }

    /// Returns the routes collected for `id`.
    #[must_use]
    pub fn get(&self, id: ControllerId) -> Option<&ControllerRoutes> {
        self.controllers.get(&id.type_id)
    }

    /// Returns true if `id` has been registered.
    #[must_use]
    pub fn contains(&self, id: ControllerId) -> bool {
        self.controllers.contains_key(&id.type_id)
    }

    /// Returns the number of registered controllers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// Returns true if nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}
