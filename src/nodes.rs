//! # Node Variants
//!
//! The five code-contributing node kinds plus the pass-through reroute.
//! Each variant supplies a socket schema (a function of its configuration
//! and of what is linked upstream) and per-node source emission. All
//! target-language syntax is delegated to the [`Transpiler`] backend; the
//! compiler only ever goes through [`configure_node`], [`emit_node_code`],
//! [`emit_node_globals`] and [`source_reference`].

use serde::{Deserialize, Serialize};

use crate::codegen::Transpiler;
use crate::compiler::CompileContext;
use crate::error::{CompileError, Result};
use crate::graph::{DataType, Graph, Node, NodeId, Socket, SocketRef};
use crate::pipeline::FunctionDecl;

/// Variant-specific node configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Constructs a named aggregate type, either from a whole upstream
    /// value, from per-member values, or a mix of both.
    Struct { struct_type: String },
    /// Calls a reflected function.
    Function { function_type: String },
    /// Marks a compilation boundary. Entry nodes (`is_output == false`)
    /// expose the boundary's inputs as outputs; exit nodes expose its
    /// outputs as inputs and are the compiler's roots.
    GraphIo { io_type: String, is_output: bool },
    /// User-authored expression with an inferred signature.
    Inline { code: String },
    /// Indexes into a linked array value.
    ArrayIndex,
    /// Forwards a connection without contributing code.
    Reroute,
}

const INLINE_INPUTS: &[&str] = &["a", "b", "c", "d", "e", "f", "g", "h"];

/// (Re)builds a node's display name and socket schema.
///
/// Idempotent: re-running with unchanged upstream state yields the same
/// schema, and the graph-side reconciliation keeps surviving sockets and
/// their links intact. Lookup failures (unknown struct/function/IO slot)
/// are returned for the caller to isolate.
pub fn configure_node(graph: &mut Graph, id: NodeId, ctx: &CompileContext) -> Result<()> {
    let node = graph
        .node(id)
        .ok_or_else(|| CompileError::NodeNotFound(id.to_string()))?;

    let (name, inputs, outputs) = match &node.kind {
        NodeKind::Struct { struct_type } => {
            let decl = ctx
                .find_struct(struct_type)
                .ok_or_else(|| CompileError::UnknownStruct(struct_type.clone()))?;
            let mut inputs = vec![Socket::new(&decl.name, DataType::value(&decl.name), 0)];
            for member in &decl.members {
                inputs.push(Socket::new(&member.name, member.ty.clone(), member.array_size));
            }
            let outputs = inputs.clone();
            (decl.name.clone(), inputs, outputs)
        }
        NodeKind::Function { function_type } => {
            let decl = ctx
                .find_function(function_type)
                .ok_or_else(|| CompileError::UnknownFunction(function_type.clone()))?;
            let mut inputs = Vec::new();
            let mut outputs = Vec::new();
            if let Some(ret) = &decl.ret {
                outputs.push(Socket::new("result", ret.clone(), 0));
            }
            for parameter in &decl.parameters {
                if parameter.io.is_output() {
                    outputs.push(Socket::new(&parameter.name, parameter.ty.clone(), parameter.array_size));
                }
                if parameter.io.is_input() {
                    inputs.push(Socket::new(&parameter.name, parameter.ty.clone(), parameter.array_size));
                }
            }
            (decl.name.clone(), inputs, outputs)
        }
        NodeKind::GraphIo { io_type, is_output } => {
            let slot = ctx
                .graph_io(io_type)
                .ok_or_else(|| CompileError::UnknownGraphIo(io_type.clone()))?;
            let signature = &slot.signature;
            let mut inputs = Vec::new();
            let mut outputs = Vec::new();
            if *is_output {
                if let Some(ret) = &signature.ret {
                    inputs.push(Socket::new("result", ret.clone(), 0));
                }
                for parameter in &signature.parameters {
                    if parameter.io.is_output() {
                        inputs.push(Socket::new(&parameter.name, parameter.ty.clone(), parameter.array_size));
                    }
                }
            } else {
                for parameter in &signature.parameters {
                    if parameter.io.is_input() {
                        outputs.push(Socket::new(&parameter.name, parameter.ty.clone(), parameter.array_size));
                    }
                }
            }
            let suffix = if *is_output { "Output" } else { "Input" };
            (format!("{io_type} {suffix}"), inputs, outputs)
        }
        NodeKind::Inline { .. } => inline_schema(graph, node),
        NodeKind::ArrayIndex => array_index_schema(graph, node),
        NodeKind::Reroute => (
            "Reroute".to_string(),
            vec![Socket::untyped("input")],
            vec![Socket::untyped("output")],
        ),
    };

    if let Some(node) = graph.node_mut(id) {
        node.name = name;
    }
    graph.set_node_schema(id, inputs, outputs);
    Ok(())
}

/// Inline nodes grow one fixed-alphabet input at a time: the next slot is
/// revealed once the current last slot is typed or linked, capped at
/// eight. Each input mirrors its link's type when linked; the sole result
/// output mirrors whatever it feeds into.
fn inline_schema(graph: &Graph, node: &Node) -> (String, Vec<Socket>, Vec<Socket>) {
    let mut last = 0;
    for (i, input) in node.inputs.iter().enumerate() {
        let linked = graph.resolve_linked(&SocketRef::new(node.id, &input.name)).is_some();
        if !input.ty.is_untyped() || linked {
            last = i + 1;
        }
    }
    let count = (last + 1).min(INLINE_INPUTS.len());

    let mut inputs = Vec::with_capacity(count);
    for var in &INLINE_INPUTS[..count] {
        let mut socket = Socket::untyped(*var);
        if let Some(existing) = node.input(var) {
            socket.ty = existing.ty.clone();
            socket.array_size = existing.array_size;
            if let Some(linked) = graph.resolve_linked(&SocketRef::new(node.id, *var)) {
                if let Some(upstream) = graph.output_socket(&linked) {
                    if !upstream.ty.is_untyped() {
                        socket.ty = upstream.ty.clone();
                        socket.array_size = upstream.array_size;
                    }
                }
            }
        }
        inputs.push(socket);
    }

    let mut result = Socket::untyped("result");
    if node.output("result").is_some() {
        if let Some(downstream) = graph.resolve_linked_output(&SocketRef::new(node.id, "result")) {
            if let Some(socket) = graph.input_socket(&downstream) {
                result.ty = socket.ty.clone();
                result.array_size = socket.array_size;
            }
        }
    }
    ("Inline Code".to_string(), inputs, vec![result])
}

/// Mirrors the linked array's element type, or falls back to the untyped
/// placeholder schema while nothing array-typed is connected.
fn array_index_schema(graph: &Graph, node: &Node) -> (String, Vec<Socket>, Vec<Socket>) {
    let mut array = Socket::new("array", DataType::untyped(), 1);
    let mut element = Socket::untyped("element");
    if let Some(linked) = graph.resolve_linked(&SocketRef::new(node.id, "array")) {
        if let Some(upstream) = graph.output_socket(&linked) {
            if upstream.array_size > 0 {
                array = Socket::new("array", upstream.ty.clone(), upstream.array_size);
                element = Socket::new("element", upstream.ty.clone(), 0);
            }
        }
    }
    let index = Socket::new("index", DataType::value("int"), 0);
    ("Array Index".to_string(), vec![array, index], vec![element])
}

/// The source expression standing for one socket.
///
/// Opaque-typed inputs that are linked forward the linked socket's
/// reference (opaque values are never copied into locals); everything
/// else resolves to a node-specific identifier.
pub fn source_reference(
    graph: &Graph,
    ctx: &CompileContext,
    t: &dyn Transpiler,
    socket: &SocketRef,
    is_output: bool,
) -> Result<String> {
    let node = graph
        .node(socket.node)
        .ok_or_else(|| CompileError::NodeNotFound(socket.node.to_string()))?;
    if !is_output {
        let input = node.input(&socket.socket).ok_or_else(|| CompileError::SocketNotFound {
            node: node.name.clone(),
            socket: socket.socket.clone(),
        })?;
        if !t.is_instantiable_type(&input.ty) {
            if let Some(linked) = graph.resolve_linked(socket) {
                return source_reference(graph, ctx, t, &linked, true);
            }
        }
    }
    node_socket_reference(graph, ctx, t, node, &socket.socket)
}

fn node_socket_reference(
    graph: &Graph,
    ctx: &CompileContext,
    t: &dyn Transpiler,
    node: &Node,
    socket_name: &str,
) -> Result<String> {
    let source_name = node.source_name();
    match &node.kind {
        NodeKind::Struct { struct_type } => {
            if socket_name == struct_type {
                Ok(source_name)
            } else {
                Ok(format!("{source_name}.{socket_name}"))
            }
        }
        NodeKind::Function { function_type } => {
            let socket = node
                .output(socket_name)
                .or_else(|| node.input(socket_name))
                .ok_or_else(|| CompileError::SocketNotFound {
                    node: node.name.clone(),
                    socket: socket_name.to_string(),
                })?;
            if t.is_instantiable_type(&socket.ty) {
                Ok(t.parameter_reference(&source_name, socket_name))
            } else {
                // Opaque results are never captured into locals, so the
                // reference is the call expression itself.
                function_call_expression(graph, ctx, t, node, function_type)
            }
        }
        NodeKind::GraphIo { .. } => Ok(t.io_parameter_reference(socket_name)),
        // Inline and array-index nodes assign into plain declared locals,
        // so the reference shape is fixed across backends (the Python
        // parameter-table form only exists for dispatched calls).
        NodeKind::Inline { .. } | NodeKind::ArrayIndex => {
            Ok(format!("{source_name}_0_{socket_name}"))
        }
        NodeKind::Reroute => Err(CompileError::CodeGeneration(
            "reroute sockets have no source reference".to_string(),
        )),
    }
}

/// The initializer expression for an input socket: its resolved upstream
/// reference when linked, its externally supplied global otherwise.
fn input_initializer(
    graph: &Graph,
    ctx: &CompileContext,
    t: &dyn Transpiler,
    node: &Node,
    socket_name: &str,
) -> Result<String> {
    match graph.resolve_linked(&SocketRef::new(node.id, socket_name)) {
        Some(linked) => source_reference(graph, ctx, t, &linked, true),
        None => Ok(t.global_reference(&node.source_name(), socket_name)),
    }
}

fn function_arguments(
    graph: &Graph,
    ctx: &CompileContext,
    t: &dyn Transpiler,
    node: &Node,
    decl: &FunctionDecl,
) -> Result<Vec<Option<String>>> {
    let mut arguments = Vec::with_capacity(decl.parameters.len());
    for parameter in &decl.parameters {
        if parameter.io.is_input() {
            node.input(&parameter.name).ok_or_else(|| CompileError::SocketNotFound {
                node: node.name.clone(),
                socket: parameter.name.clone(),
            })?;
            arguments.push(Some(input_initializer(graph, ctx, t, node, &parameter.name)?));
        } else {
            arguments.push(None);
        }
    }
    Ok(arguments)
}

fn function_call_expression(
    graph: &Graph,
    ctx: &CompileContext,
    t: &dyn Transpiler,
    node: &Node,
    function_type: &str,
) -> Result<String> {
    let decl = ctx
        .find_function(function_type)
        .ok_or_else(|| CompileError::UnknownFunction(function_type.to_string()))?;
    let arguments = function_arguments(graph, ctx, t, node, decl)?;
    let rendered: Vec<String> = decl
        .parameters
        .iter()
        .zip(&arguments)
        .map(|(parameter, argument)| match argument {
            Some(expr) => expr.clone(),
            None => t.parameter_reference(&node.source_name(), &parameter.name),
        })
        .collect();
    Ok(format!("{}({})", decl.name, rendered.join(", ")))
}

/// Emits one node's local statements.
pub fn emit_node_code(
    graph: &Graph,
    node: &Node,
    ctx: &CompileContext,
    t: &dyn Transpiler,
) -> Result<String> {
    match &node.kind {
        NodeKind::Struct { struct_type } => emit_struct(graph, node, ctx, t, struct_type),
        NodeKind::Function { function_type } => {
            let decl = ctx
                .find_function(function_type)
                .ok_or_else(|| CompileError::UnknownFunction(function_type.clone()))?;
            let arguments = function_arguments(graph, ctx, t, node, decl)?;
            Ok(t.call(decl, &node.source_name(), &arguments))
        }
        NodeKind::GraphIo { io_type, is_output } => {
            emit_graph_io(graph, node, ctx, t, io_type, *is_output)
        }
        NodeKind::Inline { code } => emit_inline(graph, node, ctx, t, code),
        NodeKind::ArrayIndex => emit_array_index(graph, node, ctx, t),
        NodeKind::Reroute => Ok(String::new()),
    }
}

fn emit_struct(
    graph: &Graph,
    node: &Node,
    ctx: &CompileContext,
    t: &dyn Transpiler,
    struct_type: &str,
) -> Result<String> {
    let source_name = node.source_name();
    let aggregate = node.input(struct_type).ok_or_else(|| CompileError::SocketNotFound {
        node: node.name.clone(),
        socket: struct_type.to_string(),
    })?;

    let linked_aggregate = graph.resolve_linked(&SocketRef::new(node.id, struct_type));
    let init = match &linked_aggregate {
        Some(linked) => Some(source_reference(graph, ctx, t, linked, true)?),
        None => None,
    };
    let mut code = t.declaration(&aggregate.ty, aggregate.array_size, &source_name, init.as_deref());

    // Members override the copied aggregate when linked; without an
    // aggregate every member is filled in, linked or not.
    for input in &node.inputs {
        if input.name == struct_type {
            continue;
        }
        let linked = graph.resolve_linked(&SocketRef::new(node.id, &input.name));
        if linked.is_some() || linked_aggregate.is_none() {
            let value = match &linked {
                Some(linked) => source_reference(graph, ctx, t, linked, true)?,
                None => t.global_reference(&source_name, &input.name),
            };
            let target =
                source_reference(graph, ctx, t, &SocketRef::new(node.id, &input.name), false)?;
            code += &t.assignment(&target, &value);
        }
    }
    Ok(code)
}

fn emit_graph_io(
    graph: &Graph,
    node: &Node,
    ctx: &CompileContext,
    t: &dyn Transpiler,
    io_type: &str,
    is_output: bool,
) -> Result<String> {
    // Entry nodes contribute no statements; their sockets resolve straight
    // to boundary parameter references.
    if !is_output {
        return Ok(String::new());
    }
    let slot = ctx
        .graph_io(io_type)
        .ok_or_else(|| CompileError::UnknownGraphIo(io_type.to_string()))?;

    let mut code = String::new();
    for socket in &node.inputs {
        if socket.name == "result" {
            continue;
        }
        let value = input_initializer(graph, ctx, t, node, &socket.name)?;
        let target = source_reference(graph, ctx, t, &SocketRef::new(node.id, &socket.name), false)?;
        code += &t.assignment(&target, &value);
    }
    if slot.signature.ret.is_some() {
        let value = input_initializer(graph, ctx, t, node, "result")?;
        code += &t.result(&value);
    }
    Ok(code)
}

fn emit_inline(
    graph: &Graph,
    node: &Node,
    ctx: &CompileContext,
    t: &dyn Transpiler,
    code_text: &str,
) -> Result<String> {
    let result = node.output("result").ok_or_else(|| CompileError::SocketNotFound {
        node: node.name.clone(),
        socket: "result".to_string(),
    })?;
    let result_ref = node_socket_reference(graph, ctx, t, node, "result")?;
    let code = t.declaration(&result.ty, result.array_size, &result_ref, None);

    let mut scoped = String::new();
    for input in &node.inputs {
        if input.ty.is_untyped() {
            continue;
        }
        let init = input_initializer(graph, ctx, t, node, &input.name)?;
        scoped += &t.declaration(&input.ty, input.array_size, &input.name, Some(&init));
    }
    if !code_text.is_empty() {
        // The authored snippet is opaque user text, substituted verbatim.
        scoped += &t.assignment(&result_ref, code_text);
    }
    Ok(code + &t.scoped(&scoped))
}

fn emit_array_index(
    graph: &Graph,
    node: &Node,
    ctx: &CompileContext,
    t: &dyn Transpiler,
) -> Result<String> {
    let element = node.output("element").ok_or_else(|| CompileError::SocketNotFound {
        node: node.name.clone(),
        socket: "element".to_string(),
    })?;
    let element_ref = node_socket_reference(graph, ctx, t, node, "element")?;
    match graph.resolve_linked(&SocketRef::new(node.id, "array")) {
        Some(array) => {
            let array_ref = source_reference(graph, ctx, t, &array, true)?;
            let index_ref = input_initializer(graph, ctx, t, node, "index")?;
            let init = format!("{array_ref}[{index_ref}]");
            Ok(t.declaration(&element.ty, element.array_size, &element_ref, Some(&init)))
        }
        // Placeholder schema: declare the untyped element so the unit
        // stays syntactically complete.
        None => Ok(t.declaration(&element.ty, element.array_size, &element_ref, None)),
    }
}

/// Uniform declarations for every unlinked, typed input of a node.
pub fn emit_node_globals(graph: &Graph, node: &Node, t: &dyn Transpiler) -> String {
    match &node.kind {
        NodeKind::Struct { struct_type } => {
            let aggregate_linked = graph
                .resolve_linked(&SocketRef::new(node.id, struct_type.as_str()))
                .is_some();
            if aggregate_linked {
                String::new()
            } else {
                sockets_to_globals(graph, node, t, Some(struct_type))
            }
        }
        NodeKind::Reroute => String::new(),
        _ => sockets_to_globals(graph, node, t, None),
    }
}

fn sockets_to_globals(graph: &Graph, node: &Node, t: &dyn Transpiler, skip: Option<&str>) -> String {
    let mut code = String::new();
    let source_name = node.source_name();
    for input in &node.inputs {
        if Some(input.name.as_str()) == skip || input.ty.is_untyped() {
            continue;
        }
        if graph.resolve_linked(&SocketRef::new(node.id, &input.name)).is_some() {
            continue;
        }
        let reference = t.global_reference(&source_name, &input.name);
        code += &t.global_declaration(&input.ty, input.array_size, &reference, None);
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::{GlslTranspiler, PythonTranspiler};
    use crate::compiler::CompileContext;
    use crate::library::LibraryEntry;
    use crate::pipeline::test_utils::{test_pipeline, vec4};
    use crate::pipeline::PipelineGraph;

    fn ctx<'a>(pipeline: &'a PipelineGraph, library: &'a LibraryEntry) -> CompileContext<'a> {
        CompileContext { pipeline, library }
    }

    #[test]
    fn function_node_schema_follows_signature() {
        let pipeline = test_pipeline();
        let library = LibraryEntry::default();
        let ctx = ctx(&pipeline, &library);
        let mut graph = Graph::new("test");
        let id = graph.add_node(NodeKind::Function { function_type: "filter".to_string() });
        configure_node(&mut graph, id, &ctx).unwrap();

        let node = graph.node(id).unwrap();
        assert_eq!(node.name, "filter");
        let input_names: Vec<_> = node.inputs.iter().map(|s| s.name.as_str()).collect();
        let output_names: Vec<_> = node.outputs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(input_names, ["base", "strength"]);
        assert_eq!(output_names, ["result", "alpha"]);
    }

    #[test]
    fn unknown_function_is_a_configuration_error() {
        let pipeline = test_pipeline();
        let library = LibraryEntry::default();
        let ctx = ctx(&pipeline, &library);
        let mut graph = Graph::new("test");
        let id = graph.add_node(NodeKind::Function { function_type: "missing".to_string() });
        assert!(matches!(
            configure_node(&mut graph, id, &ctx),
            Err(CompileError::UnknownFunction(_))
        ));
    }

    #[test]
    fn struct_node_without_links_builds_from_globals() {
        let pipeline = test_pipeline();
        let library = LibraryEntry::default();
        let ctx = ctx(&pipeline, &library);
        let mut graph = Graph::new("test");
        let id = graph.add_node(NodeKind::Struct { struct_type: "Material".to_string() });
        configure_node(&mut graph, id, &ctx).unwrap();

        let node = graph.node(id).unwrap();
        let name = node.source_name();
        let code = emit_node_code(&graph, node, &ctx, &GlslTranspiler).unwrap();
        assert_eq!(
            code,
            format!(
                "Material {name};\n\
                 {name}.color = U_0{name}_0_color;\n\
                 {name}.roughness = U_0{name}_0_roughness;\n"
            )
        );

        let globals = emit_node_globals(&graph, node, &GlslTranspiler);
        assert_eq!(
            globals,
            format!(
                "uniform vec4 U_0{name}_0_color;\n\
                 uniform float U_0{name}_0_roughness;\n"
            )
        );
    }

    #[test]
    fn struct_node_with_aggregate_link_only_overrides_linked_members() {
        let pipeline = test_pipeline();
        let library = LibraryEntry::default();
        let ctx = ctx(&pipeline, &library);
        let mut graph = Graph::new("test");
        let upstream = graph.add_node(NodeKind::Struct { struct_type: "Material".to_string() });
        let downstream = graph.add_node(NodeKind::Struct { struct_type: "Material".to_string() });
        configure_node(&mut graph, upstream, &ctx).unwrap();
        configure_node(&mut graph, downstream, &ctx).unwrap();

        graph.connect(
            SocketRef::new(upstream, "Material"),
            SocketRef::new(downstream, "Material"),
        );
        graph.connect(SocketRef::new(upstream, "color"), SocketRef::new(downstream, "color"));

        let up_name = graph.node(upstream).unwrap().source_name();
        let down = graph.node(downstream).unwrap();
        let down_name = down.source_name();
        let code = emit_node_code(&graph, down, &ctx, &GlslTranspiler).unwrap();
        assert_eq!(
            code,
            format!(
                "Material {down_name} = {up_name};\n\
                 {down_name}.color = {up_name}.color;\n"
            )
        );
        // Aggregate is linked, so nothing is externally supplied.
        assert_eq!(emit_node_globals(&graph, down, &GlslTranspiler), "");
    }

    #[test]
    fn inline_schema_reveals_next_slot_once_last_is_used() {
        let pipeline = test_pipeline();
        let library = LibraryEntry::default();
        let ctx = ctx(&pipeline, &library);
        let mut graph = Graph::new("test");
        let io = graph.add_node(NodeKind::GraphIo { io_type: "Pixel".to_string(), is_output: false });
        let inline = graph.add_node(NodeKind::Inline { code: "a + b".to_string() });
        configure_node(&mut graph, io, &ctx).unwrap();
        configure_node(&mut graph, inline, &ctx).unwrap();

        assert_eq!(graph.node(inline).unwrap().inputs.len(), 1);

        graph.connect(SocketRef::new(io, "UV"), SocketRef::new(inline, "a"));
        configure_node(&mut graph, inline, &ctx).unwrap();

        let node = graph.node(inline).unwrap();
        assert_eq!(node.inputs.len(), 2);
        assert_eq!(node.inputs[0].ty, crate::pipeline::test_utils::float());
        assert!(node.inputs[1].ty.is_untyped());
    }

    #[test]
    fn inline_emission_declares_linked_inputs_and_assigns_code() {
        // Scenario: code "a + b", input a linked to a float, b unconnected.
        let pipeline = test_pipeline();
        let library = LibraryEntry::default();
        let ctx = ctx(&pipeline, &library);
        let mut graph = Graph::new("test");
        let io = graph.add_node(NodeKind::GraphIo { io_type: "Pixel".to_string(), is_output: false });
        let inline = graph.add_node(NodeKind::Inline { code: "a + b".to_string() });
        configure_node(&mut graph, io, &ctx).unwrap();
        configure_node(&mut graph, inline, &ctx).unwrap();
        graph.connect(SocketRef::new(io, "UV"), SocketRef::new(inline, "a"));
        configure_node(&mut graph, inline, &ctx).unwrap();

        let node = graph.node(inline).unwrap();
        let name = node.source_name();
        let code = emit_node_code(&graph, node, &ctx, &GlslTranspiler).unwrap();
        assert_eq!(
            code,
            format!(
                " {name}_0_result;\n\
                 {{\n\
                 \tfloat a = UV;\n\
                 \t{name}_0_result = a + b;\n\
                 }}\n"
            )
        );
        // b is untyped and therefore not externally supplied either.
        assert_eq!(emit_node_globals(&graph, node, &GlslTranspiler), "");
    }

    #[test]
    fn python_inline_emission_assigns_a_plain_local() {
        let pipeline = test_pipeline();
        let library = LibraryEntry::default();
        let ctx = ctx(&pipeline, &library);
        let mut graph = Graph::new("test");
        let inline = graph.add_node(NodeKind::Inline { code: "1 + 2".to_string() });
        configure_node(&mut graph, inline, &ctx).unwrap();

        let node = graph.node(inline).unwrap();
        let name = node.source_name();
        let code = emit_node_code(&graph, node, &ctx, &PythonTranspiler).unwrap();
        // The result lives in an ordinary variable, not a parameter table.
        assert_eq!(
            code,
            format!(
                "{name}_0_result = None\n\
                 if True:\n\
                 \t{name}_0_result = 1 + 2\n"
            )
        );
    }

    #[test]
    fn array_index_falls_back_to_placeholder_schema() {
        // Scenario: unlinked array input.
        let pipeline = test_pipeline();
        let library = LibraryEntry::default();
        let ctx = ctx(&pipeline, &library);
        let mut graph = Graph::new("test");
        let id = graph.add_node(NodeKind::ArrayIndex);
        configure_node(&mut graph, id, &ctx).unwrap();

        let node = graph.node(id).unwrap();
        let element = node.output("element").unwrap();
        assert!(element.ty.is_untyped());
        assert_eq!(element.array_size, 0);

        let name = node.source_name();
        let code = emit_node_code(&graph, node, &ctx, &GlslTranspiler).unwrap();
        assert_eq!(code, format!(" {name}_0_element;\n"));
    }

    #[test]
    fn array_index_mirrors_linked_array_element_type() {
        let pipeline = test_pipeline();
        let library = LibraryEntry::default();
        let ctx = ctx(&pipeline, &library);
        let mut graph = Graph::new("test");
        let src = graph.add_node(NodeKind::Inline { code: String::new() });
        let index = graph.add_node(NodeKind::ArrayIndex);
        configure_node(&mut graph, src, &ctx).unwrap();
        configure_node(&mut graph, index, &ctx).unwrap();

        // Hand the inline node an array-typed result.
        graph.node_mut(src).unwrap().outputs[0] = Socket::new("result", vec4(), 4);
        graph.connect(SocketRef::new(src, "result"), SocketRef::new(index, "array"));
        configure_node(&mut graph, index, &ctx).unwrap();

        let node = graph.node(index).unwrap();
        assert_eq!(node.input("array").unwrap().array_size, 4);
        assert_eq!(node.output("element").unwrap().ty, vec4());

        let src_name = graph.node(src).unwrap().source_name();
        let name = node.source_name();
        let code = emit_node_code(&graph, node, &ctx, &GlslTranspiler).unwrap();
        assert_eq!(
            code,
            format!("vec4 {name}_0_element = {src_name}_0_result[U_0{name}_0_index];\n")
        );
    }

    #[test]
    fn exit_node_assigns_boundary_outputs_and_returns_result() {
        let pipeline = test_pipeline();
        let library = LibraryEntry::default();
        let ctx = ctx(&pipeline, &library);
        let mut graph = Graph::new("test");
        let exit = graph.add_node(NodeKind::GraphIo { io_type: "Pixel".to_string(), is_output: true });
        configure_node(&mut graph, exit, &ctx).unwrap();

        let node = graph.node(exit).unwrap();
        let name = node.source_name();
        let code = emit_node_code(&graph, node, &ctx, &GlslTranspiler).unwrap();
        assert_eq!(
            code,
            format!(
                "COLOR = U_0{name}_0_COLOR;\n\
                 return U_0{name}_0_result;\n"
            )
        );
    }

    #[test]
    fn opaque_inputs_forward_the_linked_reference() {
        let pipeline = test_pipeline();
        let library = LibraryEntry::default();
        let ctx = ctx(&pipeline, &library);
        let mut graph = Graph::new("test");
        // A struct with a sampler member feeding blur's sampler input.
        let tex_src = graph.add_node(NodeKind::Inline { code: String::new() });
        let blur = graph.add_node(NodeKind::Function { function_type: "blur".to_string() });
        configure_node(&mut graph, tex_src, &ctx).unwrap();
        configure_node(&mut graph, blur, &ctx).unwrap();
        graph.node_mut(tex_src).unwrap().outputs[0] =
            Socket::new("result", DataType::opaque("sampler2D"), 0);
        graph.connect(SocketRef::new(tex_src, "result"), SocketRef::new(blur, "tex"));

        let reference =
            source_reference(&graph, &ctx, &GlslTranspiler, &SocketRef::new(blur, "tex"), false)
                .unwrap();
        let src_name = graph.node(tex_src).unwrap().source_name();
        assert_eq!(reference, format!("{src_name}_0_result"));
    }

    #[test]
    fn reconfiguration_with_unchanged_upstream_preserves_links() {
        let pipeline = test_pipeline();
        let library = LibraryEntry::default();
        let ctx = ctx(&pipeline, &library);
        let mut graph = Graph::new("test");
        let a = graph.add_node(NodeKind::Function { function_type: "filter".to_string() });
        let b = graph.add_node(NodeKind::Function { function_type: "filter".to_string() });
        configure_node(&mut graph, a, &ctx).unwrap();
        configure_node(&mut graph, b, &ctx).unwrap();
        graph.connect(SocketRef::new(a, "result"), SocketRef::new(b, "base"));

        let sockets_before = graph.node(b).unwrap().inputs.clone();
        configure_node(&mut graph, a, &ctx).unwrap();
        configure_node(&mut graph, b, &ctx).unwrap();

        assert_eq!(graph.node(b).unwrap().inputs, sockets_before);
        assert_eq!(graph.links().count(), 1);
        assert!(graph.resolve_linked(&SocketRef::new(b, "base")).is_some());
    }
}
