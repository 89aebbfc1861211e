//! Radix tree node implementation.
//!
//! Each node represents one `/`-separated path segment. Nodes that terminate
//! a route carry a [`MethodRouter`] pointing back into the router's route list.

use crate::error::RouteError;
use crate::method_router::MethodRouter;
use crate::params::Params;

/// Type of path segment in the radix tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Static path segment (e.g., "admin", "index")
    Static,
    /// Named parameter (e.g., "{id}")
    Param(String),
    /// Catch-all wildcard (e.g., "*path")
    Wildcard(String),
}

/// A node in the radix tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// The path segment this node represents
    pub segment: String,

    /// The kind of segment (static, param, or wildcard)
    pub kind: SegmentKind,

    /// Method table for this node (if it's a route endpoint)
    pub methods: Option<MethodRouter>,

    /// Static children, sorted by segment for binary search
    pub static_children: Vec<Node>,

    /// Parameter child (at most one per node)
    pub param_child: Option<Box<Node>>,

    /// Wildcard child (at most one per node, always a leaf)
    pub wildcard_child: Option<Box<Node>>,
}

impl Node {
    fn with_kind(segment: String, kind: SegmentKind) -> Self {
        Self {
            segment,
            kind,
            methods: None,
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    /// Creates a root node for the tree.
    #[must_use]
    pub fn root() -> Self {
        Self::with_kind(String::new(), SegmentKind::Static)
    }

    /// Parses a path pattern into segments.
    pub(crate) fn parse_path(path: &str) -> Result<Vec<(String, SegmentKind)>, RouteError> {
        let raw: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut segments = Vec::with_capacity(raw.len());

        for (idx, s) in raw.iter().enumerate() {
            let kind = if let Some(inner) = s.strip_prefix('{') {
                let name = inner
                    .strip_suffix('}')
                    .filter(|n| !n.is_empty())
                    .ok_or_else(|| RouteError::InvalidPattern(path.to_string()))?;
                SegmentKind::Param(name.to_string())
            } else if let Some(name) = s.strip_prefix('*') {
                if idx + 1 != raw.len() {
                    return Err(RouteError::WildcardNotLast(path.to_string()));
                }
                SegmentKind::Wildcard(name.to_string())
            } else {
                SegmentKind::Static
            };
            segments.push(((*s).to_string(), kind));
        }

        Ok(segments)
    }

    /// Returns the method table for `segments`, creating nodes as needed.
    pub(crate) fn entry(&mut self, segments: &[(String, SegmentKind)]) -> &mut MethodRouter {
        let Some(((segment, kind), remaining)) = segments.split_first() else {
            return self.methods.get_or_insert_with(MethodRouter::new);
        };

        let child = match kind {
            SegmentKind::Static => {
                let pos = match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(segment))
                {
                    Ok(pos) => pos,
                    Err(pos) => {
                        self.static_children
                            .insert(pos, Node::with_kind(segment.clone(), SegmentKind::Static));
                        pos
                    }
                };
                &mut self.static_children[pos]
            }
            SegmentKind::Param(_) => self
                .param_child
                .get_or_insert_with(|| Box::new(Node::with_kind(segment.clone(), kind.clone())))
                .as_mut(),
            SegmentKind::Wildcard(_) => self
                .wildcard_child
                .get_or_insert_with(|| Box::new(Node::with_kind(segment.clone(), kind.clone())))
                .as_mut(),
        };

        child.entry(remaining)
    }

    /// Matches a concrete request path against the tree.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter, Params)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        let methods = self.match_segments(&segments, &mut params)?;
        Some((methods, params))
    }

    fn match_segments<'a>(&'a self, segments: &[&str], params: &mut Params) -> Option<&'a MethodRouter> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self.methods.as_ref();
        };

        if let Some(child) = self.find_static_child(segment) {
            if let Some(found) = child.match_segments(remaining, params) {
                return Some(found);
            }
        }

        if let Some(child) = &self.param_child {
            if let SegmentKind::Param(name) = &child.kind {
                let mark = params.len();
                params.push(name.clone(), (*segment).to_string());
                if let Some(found) = child.match_segments(remaining, params) {
                    return Some(found);
                }
                params.truncate(mark);
            }
        }

        if let Some(child) = &self.wildcard_child {
            if let SegmentKind::Wildcard(name) = &child.kind {
                if let Some(methods) = child.methods.as_ref() {
                    params.push(name.clone(), segments.join("/"));
                    return Some(methods);
                }
            }
        }

        None
    }

    fn find_static_child(&self, segment: &str) -> Option<&Node> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    fn insert(root: &mut Node, path: &str, method: Method, route: usize) {
        let segments = Node::parse_path(path).unwrap();
        root.entry(&segments).insert(method, route);
    }

    #[test]
    fn test_parse_path_kinds() {
        let segments = Node::parse_path("/files/{id}/*rest").unwrap();
        assert_eq!(segments[0].1, SegmentKind::Static);
        assert_eq!(segments[1].1, SegmentKind::Param("id".to_string()));
        assert_eq!(segments[2].1, SegmentKind::Wildcard("rest".to_string()));
    }

    #[test]
    fn test_parse_path_rejects_wildcard_in_middle() {
        let err = Node::parse_path("/files/*rest/more").unwrap_err();
        assert!(matches!(err, RouteError::WildcardNotLast(_)));
    }

    #[test]
    fn test_parse_path_rejects_unclosed_param() {
        let err = Node::parse_path("/users/{id").unwrap_err();
        assert!(matches!(err, RouteError::InvalidPattern(_)));
    }

    #[test]
    fn test_static_priority_over_param() {
        let mut root = Node::root();
        insert(&mut root, "/users/me", Method::GET, 0);
        insert(&mut root, "/users/{id}", Method::GET, 1);

        let (methods, params) = root.match_path("/users/me").unwrap();
        assert_eq!(methods.route_for(&Method::GET), Some(0));
        assert!(params.is_empty());

        let (methods, params) = root.match_path("/users/7").unwrap();
        assert_eq!(methods.route_for(&Method::GET), Some(1));
        assert_eq!(params.get("id"), Some("7"));
    }

    #[test]
    fn test_param_backtracking_drops_stale_captures() {
        let mut root = Node::root();
        insert(&mut root, "/{section}/edit", Method::GET, 0);
        insert(&mut root, "/*path", Method::GET, 1);

        let (methods, params) = root.match_path("/docs/view").unwrap();
        assert_eq!(methods.route_for(&Method::GET), Some(1));
        assert_eq!(params.get("section"), None);
        assert_eq!(params.get("path"), Some("docs/view"));
    }

    #[test]
    fn test_wildcard_collects_remaining_segments() {
        let mut root = Node::root();
        insert(&mut root, "/files/*path", Method::GET, 0);

        let (_, params) = root.match_path("/files/images/logo.png").unwrap();
        assert_eq!(params.get("path"), Some("images/logo.png"));
    }

    #[test]
    fn test_no_match() {
        let mut root = Node::root();
        insert(&mut root, "/users", Method::GET, 0);

        assert!(root.match_path("/posts").is_none());
    }
}
