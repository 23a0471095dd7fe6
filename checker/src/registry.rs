// registry.rs — Stream graph registry
//
// Owns every stream node and edge of one build session. Nodes are interned
// by name: asking for a name that already exists returns the existing node.
// Edges are registered on both endpoints' adjacency lists at construction.
//
// Preconditions: none.
// Postconditions: names are unique; every edge endpoint is a registered node.
// Failure modes: none (ids are only minted here, so lookups by id succeed).
// Side effects: none.

use std::collections::HashMap;

use tracing::debug;

use crate::descriptor::{Descriptor, Locator, TypeInfo};
use crate::operator::OperatorKind;

// ── Identifiers ─────────────────────────────────────────────────────────────

/// Identifier of a stream node, in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(pub u32);

/// Identifier of an edge, in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u32);

// ── Nodes and edges ─────────────────────────────────────────────────────────

/// A named point in the stream graph.
///
/// `inputs` holds every type ever attributed to data entering the stream;
/// `outputs` holds the types the stream is known to emit to its children.
#[derive(Debug, Clone)]
pub struct Stream {
    pub id: StreamId,
    pub name: String,
    /// Where the stream was first mentioned.
    pub locator: Option<Locator>,
    pub inputs: Vec<TypeInfo>,
    pub outputs: Vec<TypeInfo>,
    pub parents: Vec<EdgeId>,
    pub children: Vec<EdgeId>,
}

impl Stream {
    /// True if a structurally-equal descriptor is already among the inputs.
    pub fn has_input(&self, descriptor: &Descriptor) -> bool {
        self.inputs.iter().any(|t| &t.descriptor == descriptor)
    }
}

/// Attributes of an edge beyond its endpoints.
#[derive(Debug, Clone)]
pub struct EdgeAttrs {
    pub kind: OperatorKind,
    /// A weak edge is topology only: types never flow along it.
    pub weak: bool,
    /// Numeric literal of the invocation, if any.
    pub literal: Option<f64>,
    pub locator: Option<Locator>,
}

impl EdgeAttrs {
    pub fn strong(kind: OperatorKind) -> Self {
        EdgeAttrs {
            kind,
            weak: false,
            literal: None,
            locator: None,
        }
    }

    pub fn weak(kind: OperatorKind) -> Self {
        EdgeAttrs {
            weak: true,
            ..EdgeAttrs::strong(kind)
        }
    }
}

/// A directed edge between two registered streams.
#[derive(Debug, Clone)]
pub struct Edge {
    pub id: EdgeId,
    pub source: StreamId,
    pub target: StreamId,
    pub kind: OperatorKind,
    pub weak: bool,
    pub literal: Option<f64>,
    pub locator: Option<Locator>,
}

// ── Registry ────────────────────────────────────────────────────────────────

/// Arena of streams and edges for one build session.
#[derive(Debug, Clone, Default)]
pub struct StreamGraph {
    streams: Vec<Stream>,
    edges: Vec<Edge>,
    by_name: HashMap<String, StreamId>,
}

impl StreamGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the stream named `name`, registering it first if unknown.
    pub fn get_or_create(&mut self, name: &str, locator: Option<&Locator>) -> StreamId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = StreamId(self.streams.len() as u32);
        self.streams.push(Stream {
            id,
            name: name.to_string(),
            locator: locator.cloned(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            parents: Vec::new(),
            children: Vec::new(),
        });
        self.by_name.insert(name.to_string(), id);
        debug!(stream = name, id = id.0, "registered stream");
        id
    }

    /// Draw `source → target` and register it on both adjacency lists.
    pub fn connect(&mut self, source: StreamId, target: StreamId, attrs: EdgeAttrs) -> EdgeId {
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(Edge {
            id,
            source,
            target,
            kind: attrs.kind,
            weak: attrs.weak,
            literal: attrs.literal,
            locator: attrs.locator,
        });
        self.streams[source.0 as usize].children.push(id);
        self.streams[target.0 as usize].parents.push(id);
        debug!(
            source = %self.streams[source.0 as usize].name,
            target = %self.streams[target.0 as usize].name,
            kind = %attrs.kind,
            weak = attrs.weak,
            "connected streams"
        );
        id
    }

    pub fn lookup(&self, name: &str) -> Option<StreamId> {
        self.by_name.get(name).copied()
    }

    pub fn stream(&self, id: StreamId) -> &Stream {
        &self.streams[id.0 as usize]
    }

    pub fn by_name(&self, name: &str) -> Option<&Stream> {
        self.lookup(name).map(|id| self.stream(id))
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0 as usize]
    }

    /// Streams in registration order.
    pub fn streams(&self) -> impl Iterator<Item = &Stream> {
        self.streams.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Outgoing edges of `id`, in creation order.
    pub fn children(&self, id: StreamId) -> impl Iterator<Item = &Edge> {
        self.stream(id).children.iter().map(|&e| self.edge(e))
    }

    /// Incoming edges of `id`, in creation order.
    pub fn parents(&self, id: StreamId) -> impl Iterator<Item = &Edge> {
        self.stream(id).parents.iter().map(|&e| self.edge(e))
    }

    pub fn add_input(&mut self, id: StreamId, info: TypeInfo) {
        self.streams[id.0 as usize].inputs.push(info);
    }

    pub fn add_output(&mut self, id: StreamId, info: TypeInfo) {
        self.streams[id.0 as usize].outputs.push(info);
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
