//! # Code Generation Backends
//!
//! Target-language emission for compiled graphs.

mod glsl;
mod python;

pub use glsl::GlslTranspiler;
pub use python::PythonTranspiler;

use crate::graph::DataType;
use crate::pipeline::{FunctionDecl, SourceLanguage};

/// Stateless code-emission strategy for one target language.
///
/// Every method is a pure function of its arguments: identical inputs
/// must produce identical output text, so compiled graphs can be cached
/// and diffed. Backends hold no state (`&self` receivers only).
pub trait Transpiler {
    /// Local variable declaration. `size > 0` renders a fixed-size array;
    /// no initializer means default-initialized.
    fn declaration(&self, ty: &DataType, size: u32, name: &str, init: Option<&str>) -> String;

    fn assignment(&self, name: &str, value: &str) -> String;

    /// Declaration of an externally supplied (uniform/parameter-table)
    /// symbol. Backends that resolve parameters dynamically at call time
    /// may emit nothing.
    fn global_declaration(&self, ty: &DataType, size: u32, name: &str, init: Option<&str>)
        -> String;

    /// Mangles a (node, socket) pair into a flat local identifier.
    fn parameter_reference(&self, node_name: &str, parameter: &str) -> String;

    /// Mangles a (node, socket) pair into a reference to an externally
    /// supplied value.
    fn global_reference(&self, node_name: &str, parameter: &str) -> String;

    /// Reference to a graph-boundary (entry/exit) parameter.
    fn io_parameter_reference(&self, parameter: &str) -> String {
        parameter.to_string()
    }

    /// Whether values of this type can be declared as ordinary locals.
    fn is_instantiable_type(&self, ty: &DataType) -> bool;

    /// Expands a function call. `arguments` follows the declared parameter
    /// order; `None` marks pure `out` parameters that have no caller
    /// expression. Out/inout parameters are routed through declared locals
    /// and a non-void instantiable result is captured into
    /// `parameter_reference(node_name, "result")`.
    fn call(&self, function: &FunctionDecl, node_name: &str, arguments: &[Option<String>])
        -> String;

    /// Return statement.
    fn result(&self, value: &str) -> String;

    /// Wraps a fragment in an explicit lexical scope.
    fn scoped(&self, code: &str) -> String;

    /// A comment statement, used for placeholder emission when a node
    /// fails to generate code.
    fn comment(&self, text: &str) -> String;
}

/// The backend for a pipeline's source language.
pub fn transpiler_for(language: SourceLanguage) -> &'static dyn Transpiler {
    match language {
        SourceLanguage::Glsl => &GlslTranspiler,
        SourceLanguage::Python => &PythonTranspiler,
    }
}

/// Indents every line of `code` with one tab. Shared by the backends'
/// scoped-block rendering.
pub(crate) fn indent(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    for line in code.lines() {
        out.push('\t');
        out.push_str(line);
        out.push('\n');
    }
    out
}
