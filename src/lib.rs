//! # Shadegraph
//!
//! Compiler for transforming visual shader/material node graphs into
//! executable source code for a rendering pipeline's target language.
//!
//! Shadegraph is pipeline-agnostic: the embedding application supplies a
//! [`PipelineDescriptor`] (reflected struct/function catalogues, graph-IO
//! boundaries and the target language) and gets back one source artifact
//! per graph, with every compilation boundary emitted as its own section.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shadegraph::{
//!     update_graph, CompileContext, Graph, LibraryEntry, PipelineGraph, SourceLanguage,
//! };
//!
//! let pipeline = PipelineGraph::new(SourceLanguage::Glsl, ".glsl");
//! let library = LibraryEntry::default();
//! let ctx = CompileContext::new(&pipeline, &library);
//!
//! let mut graph = Graph::new("my_material");
//! // ... add nodes and links
//!
//! match update_graph(&mut graph, &ctx, "generated".as_ref(), "my_project") {
//!     Ok(Some(path)) => println!("wrote {}", path.display()),
//!     Ok(None) => {} // an update of this graph was already in flight
//!     Err(e) => eprintln!("compilation failed: {}", e),
//! }
//! ```
//!
//! ## Architecture
//!
//! Compilation runs as a multi-phase pipeline:
//!
//! 1. **Configuration** - Reconcile every node's sockets against the
//!    current catalogues and upstream topology
//! 2. **Normalization** - Drop links made invalid by reconfiguration
//! 3. **Emission** - Walk each boundary's reachable subgraph in
//!    dependency order and transpile node by node
//! 4. **Assembly** - Hoist shared globals and hand the per-boundary
//!    source map to the pipeline descriptor for final layout

pub mod codegen;
pub mod compiler;
pub mod error;
pub mod graph;
pub mod library;
pub mod nodes;
pub mod pipeline;

// Re-export the main compilation API
pub use compiler::{
    compile_graph, configure_graph, generated_source_path, update_graph, CompileContext,
    CompiledSource,
};

// Graph model
pub use graph::{DataType, Graph, Link, Node, NodeId, Socket, SocketRef, TypeCategory};
pub use nodes::NodeKind;

// Pipeline descriptors and catalogues
pub use pipeline::{
    node_catalogue, CatalogueEntry, CatalogueKind, FunctionDecl, GraphIoSlot, ParameterDecl,
    ParameterIo, PipelineDescriptor, PipelineGraph, SourceLanguage, StructDecl, StructMember,
    TypeColorCache,
};

// Target-language backends
pub use codegen::{transpiler_for, GlslTranspiler, PythonTranspiler, Transpiler};

// Library reflection
pub use library::{LibraryCache, LibraryEntry, ReflectionProvider};

pub use error::{CompileError, Result};
