//! Steppable handler sequence.
//!
//! A [`HandlerChain`] is an ordered list of handlers plus a cursor. It does
//! not drive itself: the dispatch engine invokes [`HandlerChain::current`],
//! awaits it, and stops as soon as a handler leaves the cursor where it was.

use std::sync::Arc;

use crate::handler::BoxedHandler;

/// An ordered list of handlers with an explicit cursor.
#[derive(Clone)]
pub struct HandlerChain {
    handlers: Arc<[BoxedHandler]>,
    cursor: usize,
}

impl HandlerChain {
    /// Creates a chain positioned at its first handler.
    pub fn new(handlers: impl Into<Arc<[BoxedHandler]>>) -> Self {
        Self {
            handlers: handlers.into(),
            cursor: 0,
        }
    }

    /// Creates an empty, already exhausted chain.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::<BoxedHandler>::new())
    }

    /// Returns true while the cursor points at a handler.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.cursor < self.handlers.len()
    }

    /// Returns the handler at the cursor, or `None` when exhausted.
    #[must_use]
    pub fn current(&self) -> Option<BoxedHandler> {
        self.handlers.get(self.cursor).cloned()
    }

    /// Moves the cursor forward by one. A no-op once exhausted.
    pub fn advance(&mut self) {
        if self.cursor < self.handlers.len() {
            self.cursor += 1;
        }
    }

    /// Returns the cursor position.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns true once every handler has been stepped over.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        !self.has_next()
    }

    /// Returns the number of handlers in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if the chain has no handlers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for HandlerChain {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for HandlerChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.handlers.iter().map(|h| h.name()).collect();
        f.debug_struct("HandlerChain")
            .field("handlers", &names)
            .field("cursor", &self.cursor)
            .finish()
    }
}
