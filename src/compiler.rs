//! # Graph Compiler
//!
//! Main entry points for compiling node graphs to target-language source.
//!
//! Every exit graph-IO node is a compilation root. The compiler walks the
//! reachable dependency subgraph of each root, emits the nodes in
//! dependency order, hoists externally supplied parameters of the union of
//! all touched nodes into a shared global block, and hands the per-boundary
//! source map to the pipeline descriptor for final assembly.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use crate::codegen::{transpiler_for, Transpiler};
use crate::error::Result;
use crate::graph::{Graph, NodeId, SocketRef};
use crate::library::LibraryEntry;
use crate::nodes::{configure_node, emit_node_code, emit_node_globals, NodeKind};
use crate::pipeline::{GraphIoSlot, PipelineDescriptor, StructDecl};

/// Lookup context for one compilation: the active pipeline descriptor plus
/// the graph's reflected external library (empty when none is referenced).
pub struct CompileContext<'a> {
    pub pipeline: &'a dyn PipelineDescriptor,
    pub library: &'a LibraryEntry,
}

impl<'a> CompileContext<'a> {
    pub fn new(pipeline: &'a dyn PipelineDescriptor, library: &'a LibraryEntry) -> Self {
        Self { pipeline, library }
    }

    /// Struct lookup, pipeline catalogue first, then the library.
    pub fn find_struct(&self, name: &str) -> Option<&'a StructDecl> {
        self.pipeline
            .struct_decl(name)
            .or_else(|| self.library.struct_decl(name))
    }

    /// Function lookup, pipeline catalogue first, then the library.
    pub fn find_function(&self, name: &str) -> Option<&'a crate::pipeline::FunctionDecl> {
        self.pipeline
            .function_decl(name)
            .or_else(|| self.library.function_decl(name))
    }

    pub fn graph_io(&self, name: &str) -> Option<&'a GraphIoSlot> {
        self.pipeline.graph_io(name)
    }
}

/// Compiled output of one graph: one source section per exit boundary
/// (keyed by IO slot name) plus the shared global parameter block.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompiledSource {
    pub sections: BTreeMap<String, String>,
    pub global: String,
}

/// Compile a graph to per-boundary source text.
///
/// Per-node failures are isolated: a node that cannot emit is replaced by
/// a commented placeholder statement and reported through the diagnostic
/// trace, and the rest of the graph still compiles.
pub fn compile_graph(
    graph: &Graph,
    ctx: &CompileContext,
    transpiler: &dyn Transpiler,
) -> Result<CompiledSource> {
    tracing::info!(
        "[shadegraph] compiling graph '{}' ({} nodes, {} links)",
        graph.name,
        graph.nodes().count(),
        graph.links().count()
    );

    let roots: Vec<(NodeId, String)> = graph
        .nodes()
        .filter_map(|node| match &node.kind {
            NodeKind::GraphIo { io_type, is_output: true } => {
                Some((node.id, io_type.clone()))
            }
            _ => None,
        })
        .collect();
    tracing::debug!("[shadegraph] {} compilation roots", roots.len());

    // Nodes reachable from any root, roots included, in first-visit
    // order; globals are emitted once per node no matter how many roots
    // reach it. Exit nodes belong in the union: their unlinked typed
    // inputs are referenced as externally supplied defaults.
    let mut touched: Vec<NodeId> = Vec::new();
    let mut touched_set: HashSet<NodeId> = HashSet::new();

    let mut sections = BTreeMap::new();
    for (root_id, io_type) in roots {
        let mut code = String::new();
        let order = emission_order(graph, root_id);
        for id in order.iter().chain(std::iter::once(&root_id)) {
            let Some(node) = graph.node(*id) else { continue };
            if touched_set.insert(*id) {
                touched.push(*id);
            }
            let node_code = match emit_node_code(graph, node, ctx, transpiler) {
                Ok(code) => code,
                Err(error) => {
                    tracing::warn!(
                        "[shadegraph] node '{}' failed to compile: {}",
                        node.name,
                        error
                    );
                    transpiler.comment(&format!("{} not implemented", node.name))
                }
            };
            code += &node_code;
            if *id != root_id {
                code += "\n";
            }
        }
        sections.insert(io_type, code);
    }

    let mut global = String::new();
    if let Some(library_path) = &graph.library_source {
        global += &format!("#include \"{}\"\n", library_path.display());
    }
    for id in &touched {
        if let Some(node) = graph.node(*id) {
            global += &emit_node_globals(graph, node, transpiler);
        }
    }

    tracing::info!("[shadegraph] compiled {} boundary section(s)", sections.len());
    Ok(CompiledSource { sections, global })
}

/// Dependency-respecting emission order for one root's reachable
/// subgraph, root excluded. Iterative post-order with an explicit stack,
/// so arbitrarily deep graphs cannot overflow the call stack.
fn emission_order(graph: &Graph, root: NodeId) -> Vec<NodeId> {
    fn upstream(graph: &Graph, id: NodeId) -> Vec<NodeId> {
        let Some(node) = graph.node(id) else { return Vec::new() };
        node.inputs
            .iter()
            .filter_map(|socket| {
                graph
                    .resolve_linked(&SocketRef::new(id, &socket.name))
                    .map(|linked| linked.node)
            })
            .collect()
    }

    let mut order = Vec::new();
    let mut visited: HashSet<NodeId> = HashSet::from([root]);
    let mut stack: Vec<(NodeId, Vec<NodeId>, usize)> = vec![(root, upstream(graph, root), 0)];

    while let Some((id, deps, next)) = stack.last_mut() {
        if let Some(dep) = deps.get(*next).copied() {
            *next += 1;
            if visited.insert(dep) {
                let dep_upstream = upstream(graph, dep);
                stack.push((dep, dep_upstream, 0));
            }
        } else {
            let finished = *id;
            stack.pop();
            if finished != root {
                order.push(finished);
            }
        }
    }
    order
}

/// Reconfigures every node's socket schema against the current catalogues
/// and upstream topology. Failures are isolated per node: a node that no
/// longer resolves keeps its previous sockets and is reported through the
/// diagnostic trace.
pub fn configure_graph(graph: &mut Graph, ctx: &CompileContext) {
    let ids: Vec<NodeId> = graph.nodes().map(|node| node.id).collect();
    for id in ids {
        if let Err(error) = configure_node(graph, id, ctx) {
            tracing::warn!("[shadegraph] node {} configuration failed: {}", id, error);
        }
    }
}

/// Suppresses re-entrant recompilation while one pass is in flight.
/// Drop-based so the flag is released on every exit path, including
/// error returns.
struct UpdateGuard {
    flag: std::rc::Rc<std::cell::Cell<bool>>,
}

impl UpdateGuard {
    fn acquire(flag: std::rc::Rc<std::cell::Cell<bool>>) -> Option<Self> {
        if flag.get() {
            return None;
        }
        flag.set(true);
        Some(Self { flag })
    }
}

impl Drop for UpdateGuard {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// Full recompilation pass for one graph: reconfigure, normalize, compile,
/// assemble through the pipeline descriptor and write the generated source
/// artifact.
///
/// Returns the artifact path, or `None` when the pass was suppressed
/// because another update of the same graph is already in flight. I/O
/// failures abort this graph's pass only; callers iterating multiple
/// graphs log and continue.
pub fn update_graph(
    graph: &mut Graph,
    ctx: &CompileContext,
    output_dir: &Path,
    project: &str,
) -> Result<Option<PathBuf>> {
    let Some(_guard) = UpdateGuard::acquire(graph.update_flag()) else {
        tracing::debug!("[shadegraph] update of '{}' suppressed (already in flight)", graph.name);
        return Ok(None);
    };

    configure_graph(graph, ctx);
    graph.normalize();

    let transpiler = transpiler_for(ctx.pipeline.language());
    let compiled = compile_graph(graph, ctx, transpiler)?;
    let text = ctx.pipeline.generate_source(&compiled);

    let path =
        generated_source_path(output_dir, project, &graph.name, ctx.pipeline.file_extension());
    write_generated_source(&path, &text)?;
    tracing::info!("[shadegraph] wrote {} bytes to {}", text.len(), path.display());
    Ok(Some(path))
}

/// Deterministic artifact path for a (project, graph, target) triple.
pub fn generated_source_path(
    dir: &Path,
    project: &str,
    graph_name: &str,
    extension: &str,
) -> PathBuf {
    dir.join(format!("{project}-{graph_name}{extension}"))
}

/// Overwrites the generated source artifact, creating the directory if
/// absent.
pub fn write_generated_source(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, text)?;
    Ok(())
}
