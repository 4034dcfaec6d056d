//! # Graph Data Model
//!
//! Nodes, typed sockets and links, plus the structural operations the
//! compiler relies on: link normalization, pass-through-safe link
//! resolution and idempotent socket reconciliation.

use std::cell::Cell;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::nodes::NodeKind;

/// Stable node identity, assigned on insertion and never reused.
///
/// Generated source identifiers are mangled from this id rather than from
/// the user-facing display name, so renaming a node (or giving two nodes
/// the same name) can never alias symbols in the generated source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a type can be declared as an ordinary local variable.
///
/// Opaque types (texture samplers and similar handle types) are never
/// copied into locals; references to them are forwarded instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeCategory {
    Value,
    Opaque,
}

/// A socket/parameter data type. Compared by name and category; an empty
/// name means untyped/unresolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataType {
    pub name: String,
    pub category: TypeCategory,
}

impl DataType {
    pub fn value(name: impl Into<String>) -> Self {
        Self { name: name.into(), category: TypeCategory::Value }
    }

    pub fn opaque(name: impl Into<String>) -> Self {
        Self { name: name.into(), category: TypeCategory::Opaque }
    }

    pub fn untyped() -> Self {
        Self::value("")
    }

    pub fn is_untyped(&self) -> bool {
        self.name.is_empty()
    }
}

/// A typed connection point on a node. `array_size == 0` means scalar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Socket {
    pub name: String,
    pub ty: DataType,
    pub array_size: u32,
}

impl Socket {
    pub fn new(name: impl Into<String>, ty: DataType, array_size: u32) -> Self {
        Self { name: name.into(), ty, array_size }
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self::new(name, DataType::untyped(), 0)
    }
}

/// Addresses one socket of one node. Whether it names an input or an
/// output is determined by context (links always run output to input).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SocketRef {
    pub node: NodeId,
    pub socket: String,
}

impl SocketRef {
    pub fn new(node: NodeId, socket: impl Into<String>) -> Self {
        Self { node, socket: socket.into() }
    }
}

/// A directed edge from an output socket to an input socket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub from: SocketRef,
    pub to: SocketRef,
}

/// One compilation unit in the graph.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub inputs: Vec<Socket>,
    pub outputs: Vec<Socket>,
}

impl Node {
    pub fn input(&self, name: &str) -> Option<&Socket> {
        self.inputs.iter().find(|s| s.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&Socket> {
        self.outputs.iter().find(|s| s.name == name)
    }

    /// Identifier seed for everything this node emits.
    ///
    /// The display name is sanitized to alphanumerics/underscores and the
    /// stable node id is appended, which makes the result injective: the
    /// id is always the final underscore-separated token.
    pub fn source_name(&self) -> String {
        let clean: String = self
            .name
            .replace('.', "_")
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        let mut name = format!("_{}_{}", clean, self.id.0);
        while name.contains("__") {
            name = name.replace("__", "_");
        }
        name
    }

    /// Reconciles the socket lists against a new schema. Sockets are kept
    /// by name with their type and size updated in place; ordering follows
    /// the schema. Returns the names of removed (input, output) sockets so
    /// the graph can drop their links.
    fn apply_schema(
        &mut self,
        inputs: Vec<Socket>,
        outputs: Vec<Socket>,
    ) -> (Vec<String>, Vec<String>) {
        fn reconcile(current: &mut Vec<Socket>, schema: Vec<Socket>) -> Vec<String> {
            let removed = current
                .iter()
                .filter(|s| !schema.iter().any(|n| n.name == s.name))
                .map(|s| s.name.clone())
                .collect();
            *current = schema;
            removed
        }
        let removed_inputs = reconcile(&mut self.inputs, inputs);
        let removed_outputs = reconcile(&mut self.outputs, outputs);
        (removed_inputs, removed_outputs)
    }
}

/// The user-authored node network.
///
/// Owns nodes in insertion order plus the links between their sockets.
/// The `updates_disabled` flag suppresses re-entrant recompilation while
/// one pass is in flight; see [`crate::compiler::update_graph`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Graph {
    pub name: String,
    /// External shader library this graph references, if any.
    pub library_source: Option<PathBuf>,
    nodes: Vec<Node>,
    links: Vec<Link>,
    next_id: u32,
    #[serde(skip)]
    updates_disabled: Rc<Cell<bool>>,
}

impl Graph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            library_source: None,
            nodes: Vec::new(),
            links: Vec::new(),
            next_id: 0,
            updates_disabled: Rc::default(),
        }
    }

    /// Adds a node with empty sockets. The socket schema and display name
    /// are filled in by [`crate::nodes::configure_node`].
    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.push(Node {
            id,
            name: String::new(),
            kind,
            inputs: Vec::new(),
            outputs: Vec::new(),
        });
        id
    }

    pub fn remove_node(&mut self, id: NodeId) {
        self.nodes.retain(|n| n.id != id);
        self.links.retain(|l| l.from.node != id && l.to.node != id);
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.iter()
    }

    pub fn input_socket(&self, r: &SocketRef) -> Option<&Socket> {
        self.node(r.node)?.input(&r.socket)
    }

    pub fn output_socket(&self, r: &SocketRef) -> Option<&Socket> {
        self.node(r.node)?.output(&r.socket)
    }

    /// Connects an output socket to an input socket. Inputs accept a
    /// single incoming link, so any existing link into `to` is replaced;
    /// output fan-out is unrestricted. Type mismatches are allowed here
    /// and pruned later by [`Graph::normalize`].
    pub fn connect(&mut self, from: SocketRef, to: SocketRef) {
        self.links.retain(|l| l.to != to);
        self.links.push(Link { from, to });
    }

    pub fn disconnect(&mut self, to: &SocketRef) {
        self.links.retain(|l| &l.to != to);
    }

    pub(crate) fn link_into(&self, input: &SocketRef) -> Option<&Link> {
        self.links.iter().find(|l| &l.to == input)
    }

    pub(crate) fn links_from<'a>(
        &'a self,
        output: &'a SocketRef,
    ) -> impl Iterator<Item = &'a Link> + 'a {
        self.links.iter().filter(move |l| &l.from == output)
    }

    /// Drops structurally invalid links: dangling endpoints and links
    /// whose sockets disagree on data type or array size. Idempotent.
    pub fn normalize(&mut self) {
        let nodes = &self.nodes;
        self.links.retain(|link| {
            let from = nodes
                .iter()
                .find(|n| n.id == link.from.node)
                .and_then(|n| n.output(&link.from.socket));
            let to = nodes
                .iter()
                .find(|n| n.id == link.to.node)
                .and_then(|n| n.input(&link.to.socket));
            let keep = match (from, to) {
                (Some(from), Some(to)) => from.ty == to.ty && from.array_size == to.array_size,
                _ => false,
            };
            if !keep {
                tracing::warn!(
                    from = ?link.from,
                    to = ?link.to,
                    "dropping invalid link"
                );
            }
            keep
        });
    }

    /// Resolves the effective upstream endpoint of an input socket,
    /// following pass-through (reroute) chains. Returns `None` when
    /// unlinked, when a reroute chain dead-ends, or when it cycles.
    pub fn resolve_linked(&self, input: &SocketRef) -> Option<SocketRef> {
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut current = input.clone();
        loop {
            let link = self.link_into(&current)?;
            let from = link.from.clone();
            let node = self.node(from.node)?;
            if matches!(node.kind, NodeKind::Reroute) {
                if !visited.insert(node.id) {
                    return None;
                }
                let first = node.inputs.first()?;
                current = SocketRef::new(node.id, &first.name);
            } else {
                return Some(from);
            }
        }
    }

    /// Downstream counterpart of [`Graph::resolve_linked`]: follows the
    /// first outgoing link of an output socket through reroute chains.
    /// Used for schema inference from what a socket feeds into.
    pub fn resolve_linked_output(&self, output: &SocketRef) -> Option<SocketRef> {
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut current = output.clone();
        loop {
            let link = self.links_from(&current).next()?;
            let to = link.to.clone();
            let node = self.node(to.node)?;
            if matches!(node.kind, NodeKind::Reroute) {
                if !visited.insert(node.id) {
                    return None;
                }
                let first = node.outputs.first()?;
                current = SocketRef::new(node.id, &first.name);
            } else {
                return Some(to);
            }
        }
    }

    /// Applies a freshly computed socket schema to a node and drops links
    /// attached to sockets the schema no longer contains. Linked sockets
    /// that survive keep their identity, so reconfiguration with unchanged
    /// upstream state never destroys live links.
    pub(crate) fn set_node_schema(
        &mut self,
        id: NodeId,
        inputs: Vec<Socket>,
        outputs: Vec<Socket>,
    ) {
        let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) else {
            return;
        };
        let (removed_inputs, removed_outputs) = node.apply_schema(inputs, outputs);
        self.links.retain(|l| {
            !(l.to.node == id && removed_inputs.contains(&l.to.socket))
                && !(l.from.node == id && removed_outputs.contains(&l.from.socket))
        });
    }

    pub(crate) fn update_flag(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.updates_disabled)
    }

    pub fn updates_disabled(&self) -> bool {
        self.updates_disabled.get()
    }
}
