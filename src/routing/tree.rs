//! Per-method segment trie.
//!
//! # Responsibilities
//! - Store one node per path segment, keyed by literal or canonical token
//! - Reject conflicting registrations
//! - Find the leaf for a request path in priority order
//!
//! # Design Decisions
//! - Nodes live in an arena (`Vec<Node>`) and refer to children by index
//! - Literal children sit in a map; the parameter and wildcard children
//!   each get a dedicated slot, so a node has at most one of each
//! - A node is a leaf because it carries a route, not because it has no
//!   children: `/user` and `/user/:id` share the `user` node
//! - Lookup is greedy: literal, then parameter, then wildcard, no
//!   backtracking once a child is chosen

use std::collections::HashMap;

use crate::handler::Endpoint;
use crate::routing::error::{RouteError, RouteResult};
use crate::routing::matcher;
use crate::routing::segment::{self, SegmentKind, PARAM_TOKEN, ROOT_SEGMENT, WILDCARD_TOKEN};

type NodeId = usize;

const ROOT: NodeId = 0;

/// The route stored on a terminating node.
#[derive(Debug)]
pub(crate) struct Leaf {
    /// Pattern exactly as registered.
    pub(crate) pattern: String,
    /// Normalized pattern segments, root first.
    segments: Vec<String>,
    pub(crate) endpoint: Endpoint,
}

#[derive(Debug)]
struct Node {
    key: String,
    leaf: Option<Leaf>,
    literals: HashMap<String, NodeId>,
    param: Option<NodeId>,
    wildcard: Option<NodeId>,
}

impl Node {
    fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            leaf: None,
            literals: HashMap::new(),
            param: None,
            wildcard: None,
        }
    }

    fn child(&self, key: &str) -> Option<NodeId> {
        match key {
            PARAM_TOKEN => self.param,
            WILDCARD_TOKEN => self.wildcard,
            literal => self.literals.get(literal).copied(),
        }
    }

    /// Child for a request segment: exact literal, then parameter, then wildcard.
    fn next(&self, segment: &str) -> Option<NodeId> {
        self.literals
            .get(segment)
            .copied()
            .or(if segment.is_empty() { None } else { self.param })
            .or(self.wildcard)
    }
}

/// Segment trie holding every route of one HTTP method.
#[derive(Debug)]
pub struct RouteTree {
    nodes: Vec<Node>,
}

impl Default for RouteTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTree {
    /// Create a tree holding only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(ROOT_SEGMENT)],
        }
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.leaf.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register `pattern`, failing if it conflicts with an existing route.
    pub fn insert(&mut self, pattern: &str, endpoint: Endpoint) -> RouteResult<()> {
        let segments = segment::pattern_segments(pattern)?;

        // A wildcard consumes the rest of the path, so nothing may follow it.
        if let Some(pos) = segments
            .iter()
            .position(|s| segment::classify(s) == SegmentKind::Wildcard)
        {
            if pos + 1 != segments.len() {
                return Err(RouteError::AlreadyWildcardPathRegistered(pattern.to_string()));
            }
        }

        let mut current = ROOT;
        for seg in segments.iter().skip(1) {
            let key = segment::canonical(seg);
            current = match self.nodes[current].child(key) {
                Some(next) => next,
                None => self.attach(current, key),
            };
        }

        let node = &mut self.nodes[current];
        if node.leaf.is_some() {
            return Err(RouteError::AlreadyPathRegistered(pattern.to_string()));
        }
        node.leaf = Some(Leaf {
            pattern: pattern.to_string(),
            segments: segments.iter().map(ToString::to_string).collect(),
            endpoint,
        });
        Ok(())
    }

    /// Create a child of `parent` under `key` and return its index.
    fn attach(&mut self, parent: NodeId, key: &str) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node::new(key));

        let parent = &mut self.nodes[parent];
        match key {
            PARAM_TOKEN => parent.param = Some(id),
            WILDCARD_TOKEN => parent.wildcard = Some(id),
            literal => {
                parent.literals.insert(literal.to_string(), id);
            }
        }
        id
    }

    /// Find the leaf matching an already split request path.
    ///
    /// After every descent the current node's pattern is checked against the
    /// whole path; the first structural match wins.
    pub(crate) fn find(&self, path: &[&str]) -> Option<(&Leaf, Vec<String>)> {
        let mut current = ROOT;
        if let Some(found) = self.capture_at(current, path) {
            return Some(found);
        }

        for seg in path.iter().skip(1) {
            current = self.nodes[current].next(seg)?;
            if let Some(found) = self.capture_at(current, path) {
                return Some(found);
            }
        }
        None
    }

    fn capture_at(&self, id: NodeId, path: &[&str]) -> Option<(&Leaf, Vec<String>)> {
        let leaf = self.nodes[id].leaf.as_ref()?;
        matcher::capture(&leaf.segments, path).map(|values| (leaf, values))
    }

    /// Key of every node on the path to the given pattern, for diagnostics.
    pub fn keys_for(&self, pattern: &str) -> RouteResult<Vec<&str>> {
        let segments = segment::pattern_segments(pattern)?;
        let mut current = ROOT;
        let mut keys = vec![self.nodes[ROOT].key.as_str()];
        for seg in segments.iter().skip(1) {
            match self.nodes[current].child(segment::canonical(seg)) {
                Some(next) => {
                    current = next;
                    keys.push(self.nodes[current].key.as_str());
                }
                None => return Err(RouteError::PathNotFound(pattern.to_string())),
            }
        }
        Ok(keys)
    }
}
