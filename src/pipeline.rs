//! # Pipeline Descriptors
//!
//! Read-only metadata describing one compilation target: source language,
//! reflected struct/function catalogues and the graph-IO slots that mark
//! compilation boundaries. Also provides the node type catalogue consumed
//! by host menus and the per-type display color cache.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::compiler::CompiledSource;
use crate::graph::DataType;
use crate::library::LibraryEntry;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceLanguage {
    Glsl,
    Python,
}

/// Parameter direction in a reflected function signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterIo {
    In,
    Out,
    InOut,
}

impl ParameterIo {
    pub fn is_input(self) -> bool {
        matches!(self, ParameterIo::In | ParameterIo::InOut)
    }

    pub fn is_output(self) -> bool {
        matches!(self, ParameterIo::Out | ParameterIo::InOut)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterDecl {
    pub name: String,
    pub ty: DataType,
    pub array_size: u32,
    pub io: ParameterIo,
}

impl ParameterDecl {
    pub fn new(name: impl Into<String>, ty: DataType, array_size: u32, io: ParameterIo) -> Self {
        Self { name: name.into(), ty, array_size, io }
    }
}

/// A reflected function. `ret == None` means void; `file` is the source
/// file that declared it, used for catalogue grouping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    pub ret: Option<DataType>,
    pub parameters: Vec<ParameterDecl>,
    pub file: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructMember {
    pub name: String,
    pub ty: DataType,
    pub array_size: u32,
}

impl StructMember {
    pub fn new(name: impl Into<String>, ty: DataType, array_size: u32) -> Self {
        Self { name: name.into(), ty, array_size }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructDecl {
    pub name: String,
    pub members: Vec<StructMember>,
    pub file: Option<String>,
}

/// A named compilation boundary: its synthetic function signature and the
/// shader/compilation stage it feeds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphIoSlot {
    pub name: String,
    pub signature: FunctionDecl,
    pub stage: String,
}

/// One compilation target, as offered by the external rendering pipeline.
///
/// The compiler only reads catalogues from it and hands the finished
/// per-boundary source map back through
/// [`PipelineDescriptor::generate_source`]; everything past that point is
/// the pipeline's own business.
pub trait PipelineDescriptor {
    fn language(&self) -> SourceLanguage;
    fn file_extension(&self) -> &str;
    fn struct_decl(&self, name: &str) -> Option<&StructDecl>;
    fn function_decl(&self, name: &str) -> Option<&FunctionDecl>;
    fn graph_io(&self, name: &str) -> Option<&GraphIoSlot>;
    fn structs(&self) -> &[StructDecl];
    fn functions(&self) -> &[FunctionDecl];
    fn graph_io_slots(&self) -> &[GraphIoSlot];

    /// Assembles the final compilation unit from the per-boundary source
    /// map and the shared global block. The default marks each boundary
    /// section with a comment in the target language.
    fn generate_source(&self, source: &CompiledSource) -> String {
        let mut text = source.global.clone();
        for (name, code) in &source.sections {
            match self.language() {
                SourceLanguage::Glsl => text += &format!("\n/* {name} */\n"),
                SourceLanguage::Python => text += &format!("\n# {name}\n"),
            }
            text += code;
        }
        text
    }
}

/// Plain data-driven [`PipelineDescriptor`] implementation, typically
/// deserialized from the rendering pipeline's reflection output.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineGraph {
    pub language: SourceLanguage,
    pub file_extension: String,
    pub structs: Vec<StructDecl>,
    pub functions: Vec<FunctionDecl>,
    pub graph_io: Vec<GraphIoSlot>,
}

impl PipelineGraph {
    pub fn new(language: SourceLanguage, file_extension: impl Into<String>) -> Self {
        Self {
            language,
            file_extension: file_extension.into(),
            structs: Vec::new(),
            functions: Vec::new(),
            graph_io: Vec::new(),
        }
    }

    /// Parses a descriptor from the pipeline's JSON reflection dump.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

impl PipelineDescriptor for PipelineGraph {
    fn language(&self) -> SourceLanguage {
        self.language
    }

    fn file_extension(&self) -> &str {
        &self.file_extension
    }

    fn struct_decl(&self, name: &str) -> Option<&StructDecl> {
        self.structs.iter().find(|s| s.name == name)
    }

    fn function_decl(&self, name: &str) -> Option<&FunctionDecl> {
        self.functions.iter().find(|f| f.name == name)
    }

    fn graph_io(&self, name: &str) -> Option<&GraphIoSlot> {
        self.graph_io.iter().find(|io| io.name == name)
    }

    fn structs(&self) -> &[StructDecl] {
        &self.structs
    }

    fn functions(&self) -> &[FunctionDecl] {
        &self.functions
    }

    fn graph_io_slots(&self) -> &[GraphIoSlot] {
        &self.graph_io
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CatalogueKind {
    Struct,
    Function,
}

/// A constructor token for host menu population: instantiating a node of
/// `kind` configured with `token` yields a node for this entry.
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogueEntry {
    pub token: String,
    pub kind: CatalogueKind,
    pub file: Option<String>,
}

/// Lists every struct and function a graph can reference, from the
/// pipeline's built-in catalogue plus the reflected library. Entries
/// carry their declaring file so callers can group menus per file.
pub fn node_catalogue(
    pipeline: &dyn PipelineDescriptor,
    library: &LibraryEntry,
) -> Vec<CatalogueEntry> {
    let mut entries = Vec::new();
    for decl in pipeline.structs().iter().chain(&library.structs) {
        entries.push(CatalogueEntry {
            token: decl.name.clone(),
            kind: CatalogueKind::Struct,
            file: decl.file.clone(),
        });
    }
    for decl in pipeline.functions().iter().chain(&library.functions) {
        entries.push(CatalogueEntry {
            token: decl.name.clone(),
            kind: CatalogueKind::Function,
            file: decl.file.clone(),
        });
    }
    entries
}

/// Deterministic per-type display colors for host socket drawing.
///
/// Colors are derived from a stable hash of the type name, so the same
/// type renders identically across sessions and machines.
#[derive(Debug, Default)]
pub struct TypeColorCache {
    colors: HashMap<String, [f32; 4]>,
}

impl TypeColorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color(&mut self, type_name: &str) -> [f32; 4] {
        *self
            .colors
            .entry(type_name.to_string())
            .or_insert_with(|| type_color(type_name))
    }
}

fn type_color(type_name: &str) -> [f32; 4] {
    // FNV-1a, stable across platforms and releases.
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in type_name.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    let channel = |shift: u32| ((hash >> shift) & 0xff) as f32 / 255.0;
    [channel(0), channel(16), channel(32), 1.0]
}
