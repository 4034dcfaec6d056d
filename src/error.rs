//! # Compiler Errors
//!
//! Error taxonomy for graph compilation.

use thiserror::Error;

/// Errors produced while configuring nodes or compiling a graph.
///
/// Node-level failures (unknown struct/function references, missing
/// sockets) are isolated by the compiler and never abort a whole-graph
/// pass; I/O failures abort only the graph whose artifact could not be
/// written.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("socket '{socket}' not found on node '{node}'")]
    SocketNotFound { node: String, socket: String },

    #[error("unknown struct type: {0}")]
    UnknownStruct(String),

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("unknown graph IO slot: {0}")]
    UnknownGraphIo(String),

    #[error("code generation failed: {0}")]
    CodeGeneration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CompileError>;
