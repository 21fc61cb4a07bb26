//! Radix tree node.
//!
//! Each node owns one path segment. Lookup tries static children first
//! (binary search), then the single `:param` child, then the `*wildcard`
//! child, backtracking when a deeper branch fails.

use std::borrow::Cow;

use crate::params::Params;
use crate::RouterError;

/// Type of path segment in the radix tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Static path segment (e.g., "users", "api")
    Static,
    /// Named single-segment parameter (e.g., ":id")
    Param(String),
    /// Catch-all wildcard (e.g., "*path")
    Wildcard(String),
}

/// A node in the radix tree, holding the value registered at its path.
#[derive(Debug, Clone)]
pub struct Node<T> {
    segment: String,
    kind: SegmentKind,
    value: Option<T>,
    /// Sorted by segment for binary search.
    static_children: Vec<Node<T>>,
    param_child: Option<Box<Node<T>>>,
    wildcard_child: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    fn with_kind(segment: impl Into<String>, kind: SegmentKind) -> Self {
        Self {
            segment: segment.into(),
            kind,
            value: None,
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    /// Creates a root node for the tree.
    #[must_use]
    pub fn root() -> Self {
        Self::with_kind("", SegmentKind::Static)
    }

    /// Returns the segment text of this node.
    #[must_use]
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Returns the segment kind of this node.
    #[must_use]
    pub fn kind(&self) -> &SegmentKind {
        &self.kind
    }

    /// Inserts `value` at `path`.
    ///
    /// Fails if the path already holds a value, if a parameter name clashes
    /// with a sibling registered earlier, or if a wildcard is not last.
    pub fn insert(&mut self, path: &str, value: T, strict: bool) -> Result<(), RouterError> {
        let segments = split_path(path, strict);
        let parsed: Vec<(&str, SegmentKind)> = segments
            .iter()
            .map(|s| {
                if let Some(name) = s.strip_prefix(':').filter(|n| !n.is_empty()) {
                    (*s, SegmentKind::Param(name.to_string()))
                } else if let Some(name) = s.strip_prefix('*') {
                    (*s, SegmentKind::Wildcard(name.to_string()))
                } else {
                    (*s, SegmentKind::Static)
                }
            })
            .collect();
        self.insert_segments(path, &parsed, value)
    }

    fn insert_segments(
        &mut self,
        path: &str,
        segments: &[(&str, SegmentKind)],
        value: T,
    ) -> Result<(), RouterError> {
        let Some(((segment, kind), remaining)) = segments.split_first() else {
            if self.value.is_some() {
                return Err(RouterError::Conflict {
                    path: path.to_string(),
                });
            }
            self.value = Some(value);
            return Ok(());
        };

        match kind {
            SegmentKind::Static => {
                match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(segment))
                {
                    Ok(i) => self.static_children[i].insert_segments(path, remaining, value),
                    Err(i) => {
                        let mut child = Node::with_kind(*segment, SegmentKind::Static);
                        child.insert_segments(path, remaining, value)?;
                        self.static_children.insert(i, child);
                        Ok(())
                    }
                }
            }
            SegmentKind::Param(name) => {
                let child = self.param_child.get_or_insert_with(|| {
                    Box::new(Node::with_kind(*segment, SegmentKind::Param(name.clone())))
                });
                if let SegmentKind::Param(existing) = &child.kind {
                    if existing != name {
                        return Err(RouterError::ParamConflict {
                            path: path.to_string(),
                            existing: existing.clone(),
                            new: name.clone(),
                        });
                    }
                }
                child.insert_segments(path, remaining, value)
            }
            SegmentKind::Wildcard(name) => {
                if !remaining.is_empty() {
                    return Err(RouterError::WildcardNotLast {
                        path: path.to_string(),
                    });
                }
                let child = self.wildcard_child.get_or_insert_with(|| {
                    Box::new(Node::with_kind(
                        *segment,
                        SegmentKind::Wildcard(name.clone()),
                    ))
                });
                child.insert_segments(path, remaining, value)
            }
        }
    }

    /// Looks up `path`, binding parameters into `params`.
    #[must_use]
    pub fn lookup(&self, path: &str, strict: bool, params: &mut Params) -> Option<&T> {
        let segments = split_path(path, strict);
        self.match_segments(&segments, params)
    }

    fn match_segments<'a>(&'a self, segments: &[&str], params: &mut Params) -> Option<&'a T> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self.value.as_ref();
        };

        if let Some(child) = self.find_static_child(segment) {
            if let Some(found) = child.match_segments(remaining, params) {
                return Some(found);
            }
        }

        if !segment.is_empty() {
            if let Some(child) = &self.param_child {
                if let SegmentKind::Param(name) = &child.kind {
                    let mark = params.len();
                    params.push(name.clone(), decode(segment));
                    if let Some(found) = child.match_segments(remaining, params) {
                        return Some(found);
                    }
                    params.truncate(mark);
                }
            }
        }

        if let Some(child) = &self.wildcard_child {
            if let (SegmentKind::Wildcard(name), Some(found)) = (&child.kind, child.value.as_ref())
            {
                params.push(name.clone(), decode(&segments.join("/")));
                return Some(found);
            }
        }

        None
    }

    fn find_static_child(&self, segment: &str) -> Option<&Node<T>> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}

/// Splits a path into segments.
///
/// The root path yields no segments. In strict mode a trailing slash
/// survives as an empty final segment, so `/x` and `/x/` differ.
pub(crate) fn split_path(path: &str, strict: bool) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        return Vec::new();
    }
    let mut segments: Vec<&str> = trimmed.split('/').collect();
    if !strict && segments.last().is_some_and(|s| s.is_empty()) {
        segments.pop();
    }
    segments
}

fn decode(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_string(), Cow::into_owned)
}
