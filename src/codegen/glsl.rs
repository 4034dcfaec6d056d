//! GLSL backend.
//!
//! Declarations, uniforms and brace-scoped blocks; (node, socket) pairs
//! mangle to `{node}_0_{socket}` locals and `U_0{node}_0_{socket}`
//! uniforms.

use super::{indent, Transpiler};
use crate::graph::{DataType, TypeCategory};
use crate::pipeline::{FunctionDecl, ParameterIo};

pub struct GlslTranspiler;

impl Transpiler for GlslTranspiler {
    fn declaration(&self, ty: &DataType, size: u32, name: &str, init: Option<&str>) -> String {
        let array = if size == 0 { String::new() } else { format!("[{size}]") };
        let assignment = match init {
            Some(init) => format!(" = {init}"),
            None => String::new(),
        };
        format!("{} {}{}{};\n", ty.name, name, array, assignment)
    }

    fn assignment(&self, name: &str, value: &str) -> String {
        format!("{name} = {value};\n")
    }

    fn global_declaration(
        &self,
        ty: &DataType,
        size: u32,
        name: &str,
        init: Option<&str>,
    ) -> String {
        format!("uniform {}", self.declaration(ty, size, name, init))
    }

    fn parameter_reference(&self, node_name: &str, parameter: &str) -> String {
        format!("{node_name}_0_{parameter}")
    }

    fn global_reference(&self, node_name: &str, parameter: &str) -> String {
        format!("U_0{node_name}_0_{parameter}")
    }

    fn is_instantiable_type(&self, ty: &DataType) -> bool {
        ty.category == TypeCategory::Value
    }

    fn call(&self, function: &FunctionDecl, node_name: &str, arguments: &[Option<String>]) -> String {
        let mut src = String::new();
        let mut args: Vec<String> = Vec::with_capacity(function.parameters.len());

        for (parameter, argument) in function.parameters.iter().zip(arguments) {
            match parameter.io {
                ParameterIo::Out | ParameterIo::InOut => {
                    // Out values live in locals so they stay referenceable
                    // after the call.
                    let local = self.parameter_reference(node_name, &parameter.name);
                    src += &self.declaration(
                        &parameter.ty,
                        parameter.array_size,
                        &local,
                        argument.as_deref(),
                    );
                    args.push(local);
                }
                ParameterIo::In => {
                    args.push(argument.clone().unwrap_or_default());
                }
            }
        }

        let call_expr = format!("{}({})", function.name, args.join(", "));
        match &function.ret {
            Some(ret) if self.is_instantiable_type(ret) => {
                let result = self.parameter_reference(node_name, "result");
                src += &self.declaration(ret, 0, &result, Some(&call_expr));
            }
            _ => {
                src += &call_expr;
                src += ";\n";
            }
        }
        src
    }

    fn result(&self, value: &str) -> String {
        format!("return {value};\n")
    }

    fn scoped(&self, code: &str) -> String {
        format!("{{\n{}}}\n", indent(code))
    }

    fn comment(&self, text: &str) -> String {
        format!("/* {text} */\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ParameterDecl;

    fn vec4() -> DataType {
        DataType::value("vec4")
    }

    #[test]
    fn declarations() {
        let t = GlslTranspiler;
        assert_eq!(t.declaration(&vec4(), 0, "color", None), "vec4 color;\n");
        assert_eq!(
            t.declaration(&DataType::value("float"), 4, "weights", None),
            "float weights[4];\n"
        );
        assert_eq!(
            t.declaration(&vec4(), 0, "color", Some("vec4(1.0)")),
            "vec4 color = vec4(1.0);\n"
        );
        assert_eq!(
            t.global_declaration(&vec4(), 0, "U_0_tint_1_0_color", None),
            "uniform vec4 U_0_tint_1_0_color;\n"
        );
    }

    #[test]
    fn references_are_injective_for_distinct_pairs() {
        let t = GlslTranspiler;
        let pairs = [("_a_1", "b"), ("_a_2", "b"), ("_a_1", "c"), ("_b_3", "result")];
        let mut seen = std::collections::HashSet::new();
        for (node, socket) in pairs {
            assert!(seen.insert(t.parameter_reference(node, socket)));
            assert!(seen.insert(t.global_reference(node, socket)));
        }
    }

    #[test]
    fn call_routes_out_parameters_through_locals_and_captures_result() {
        let t = GlslTranspiler;
        let function = FunctionDecl {
            name: "filter".to_string(),
            ret: Some(vec4()),
            parameters: vec![
                ParameterDecl::new("base", vec4(), 0, ParameterIo::In),
                ParameterDecl::new("alpha", DataType::value("float"), 0, ParameterIo::Out),
            ],
            file: None,
        };
        let code = t.call(&function, "_f_7", &[Some("U_0_f_7_0_base".to_string()), None]);
        assert_eq!(
            code,
            "float _f_7_0_alpha;\n\
             vec4 _f_7_0_result = filter(U_0_f_7_0_base, _f_7_0_alpha);\n"
        );
    }

    #[test]
    fn call_with_opaque_return_is_a_bare_statement() {
        let t = GlslTranspiler;
        let function = FunctionDecl {
            name: "pick_sampler".to_string(),
            ret: Some(DataType::opaque("sampler2D")),
            parameters: vec![ParameterDecl::new(
                "index",
                DataType::value("int"),
                0,
                ParameterIo::In,
            )],
            file: None,
        };
        let code = t.call(&function, "_p_2", &[Some("0".to_string())]);
        assert_eq!(code, "pick_sampler(0);\n");
    }

    #[test]
    fn call_void_emits_bare_statement_with_inout_local() {
        let t = GlslTranspiler;
        let function = FunctionDecl {
            name: "accumulate".to_string(),
            ret: None,
            parameters: vec![ParameterDecl::new("value", vec4(), 0, ParameterIo::InOut)],
            file: None,
        };
        let code = t.call(&function, "_acc_4", &[Some("upstream".to_string())]);
        assert_eq!(
            code,
            "vec4 _acc_4_0_value = upstream;\naccumulate(_acc_4_0_value);\n"
        );
    }

    #[test]
    fn scoped_indents_with_tabs() {
        let t = GlslTranspiler;
        assert_eq!(t.scoped("float a = 1.0;\n"), "{\n\tfloat a = 1.0;\n}\n");
    }
}
