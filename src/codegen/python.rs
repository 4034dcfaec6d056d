//! Python backend.
//!
//! The target runtime resolves node parameters by name lookup at call
//! time, so "declarations" are plain assignments, globals emit nothing
//! and calls become a parameter-table build plus a `run_node` dispatch.

use super::{indent, Transpiler};
use crate::graph::DataType;
use crate::pipeline::FunctionDecl;

pub struct PythonTranspiler;

impl Transpiler for PythonTranspiler {
    fn declaration(&self, _ty: &DataType, _size: u32, name: &str, init: Option<&str>) -> String {
        self.assignment(name, init.unwrap_or("None"))
    }

    fn assignment(&self, name: &str, value: &str) -> String {
        format!("{name} = {value}\n")
    }

    fn global_declaration(
        &self,
        _ty: &DataType,
        _size: u32,
        _name: &str,
        _init: Option<&str>,
    ) -> String {
        // Globals are looked up in the runtime parameter table instead.
        String::new()
    }

    fn parameter_reference(&self, node_name: &str, parameter: &str) -> String {
        format!("{node_name}_parameters[\"{parameter}\"]")
    }

    fn global_reference(&self, node_name: &str, parameter: &str) -> String {
        format!("PARAMETERS[\"{node_name}\"][\"{parameter}\"]")
    }

    fn io_parameter_reference(&self, parameter: &str) -> String {
        format!("IO[\"{parameter}\"]")
    }

    fn is_instantiable_type(&self, _ty: &DataType) -> bool {
        // Everything is a runtime value; opacity is a typed-target concern.
        true
    }

    fn call(&self, function: &FunctionDecl, node_name: &str, arguments: &[Option<String>]) -> String {
        let mut src = format!("{node_name}_parameters = {{}}\n");
        for (parameter, argument) in function.parameters.iter().zip(arguments) {
            let reference = self.parameter_reference(node_name, &parameter.name);
            src += &self.assignment(&reference, argument.as_deref().unwrap_or("None"));
        }
        src += &format!(
            "run_node(\"{}\", \"{}\", {}_parameters)\n",
            node_name, function.name, node_name
        );
        src
    }

    fn result(&self, value: &str) -> String {
        format!("return {value}\n")
    }

    fn scoped(&self, code: &str) -> String {
        // Python has no bare lexical-scope construct.
        format!("if True:\n{}", indent(code))
    }

    fn comment(&self, text: &str) -> String {
        format!("# {text}\n")
    }
}
