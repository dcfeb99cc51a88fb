//! Declaration-tree input model
//!
//! The C++ front-end is an external collaborator. It hands us one JSON dump per
//! compiled unit; this module is the typed view of that dump. Each [`Decl`]
//! carries the attributes shared by every declaration plus a [`DeclKind`]
//! payload, so the walker can pattern-match over a closed set of kinds.

use crate::meta::Access;
use eyre::{Result, WrapErr};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// One compiled unit's declaration tree.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeclTree {
    /// The main source file of the unit, informational only.
    #[serde(default)]
    pub unit: Option<String>,
    /// Directory relative source locations are resolved against.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    /// Top-level declarations of the translation unit.
    #[serde(default)]
    pub decls: Vec<Decl>,
}

impl DeclTree {
    /// Parse a declaration tree from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).wrap_err("Failed to parse declaration tree JSON")
    }

    /// Load a declaration tree from a local file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read declaration tree from {}", path.display()))?;
        Self::from_json(&content)
            .wrap_err_with(|| format!("Failed to parse declaration tree from {}", path.display()))
    }
}

impl AsRef<DeclTree> for DeclTree {
    fn as_ref(&self) -> &DeclTree {
        self
    }
}

/// Physical location of a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceLocation {
    /// Source file, absolute or relative to the tree's `directory`
    #[serde(default)]
    pub file: PathBuf,
    /// 1-indexed line
    #[serde(default)]
    pub line: u32,
}

/// A declaration node.
#[derive(Debug, Clone, Deserialize)]
pub struct Decl {
    /// Simple (unqualified) name
    #[serde(default)]
    pub name: String,
    /// Fully scope-qualified name
    #[serde(default)]
    pub qualified_name: String,
    #[serde(default)]
    pub access: Access,
    /// Brief documentation comment
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub location: Option<SourceLocation>,
    /// Set by the front-end for declarations it failed to make sense of
    #[serde(default)]
    pub invalid: bool,
    #[serde(flatten)]
    pub kind: DeclKind,
}

/// Kind-specific payload of a [`Decl`].
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeclKind {
    Namespace {
        #[serde(default)]
        decls: Vec<Decl>,
    },
    Record(RecordDecl),
    TemplateSpecialization(RecordDecl),
    Field(FieldDecl),
    /// Namespace-scope variable or static data member
    Variable(ValueDecl),
    Function(FunctionDecl),
    Method(MethodDecl),
    Enum(EnumDecl),
    /// A member reached through an anonymous union or struct
    IndirectMember { target: Box<Decl> },
    /// Anything the walker has no rule for (typedefs, using-declarations, ...)
    #[serde(other)]
    Other,
}

impl DeclKind {
    /// Short label used in outlines
    pub fn label(&self) -> &'static str {
        match self {
            DeclKind::Namespace { .. } => "namespace",
            DeclKind::Record(record) => record.tag.as_str(),
            DeclKind::TemplateSpecialization(_) => "specialization",
            DeclKind::Field(_) => "field",
            DeclKind::Variable(_) => "variable",
            DeclKind::Function(_) => "function",
            DeclKind::Method(m) if m.is_static => "static method",
            DeclKind::Method(_) => "method",
            DeclKind::Enum(_) => "enum",
            DeclKind::IndirectMember { .. } => "indirect",
            DeclKind::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordTag {
    #[default]
    Class,
    Struct,
    Union,
}

impl RecordTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordTag::Class => "class",
            RecordTag::Struct => "struct",
            RecordTag::Union => "union",
        }
    }
}

fn default_true() -> bool {
    true
}

/// Payload of records and class template specializations.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordDecl {
    #[serde(default)]
    pub tag: RecordTag,
    /// False for forward declarations
    #[serde(default = "default_true")]
    pub is_definition: bool,
    #[serde(default)]
    pub is_anonymous: bool,
    /// Qualified names of the base classes, in declaration order
    #[serde(default)]
    pub bases: Vec<String>,
    #[serde(default)]
    pub decls: Vec<Decl>,
    /// Only meaningful for specializations
    #[serde(default)]
    pub template_args: Vec<TemplateArg>,
}

impl Default for RecordDecl {
    fn default() -> Self {
        Self {
            tag: RecordTag::default(),
            is_definition: true,
            is_anonymous: false,
            bases: Vec::new(),
            decls: Vec::new(),
            template_args: Vec::new(),
        }
    }
}

impl RecordDecl {
    /// Unions, forward declarations and anonymous aggregates are never reflected.
    pub fn is_reflectable(&self) -> bool {
        self.tag != RecordTag::Union && self.is_definition && !self.is_anonymous
    }
}

/// A template argument of a class template specialization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TemplateArg {
    Type { spelling: String },
    Integral { value: IntegralValue },
    /// Template-template arguments, packs, expressions, ...
    #[serde(other)]
    Unsupported,
}

/// Value of an integral template argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum IntegralValue {
    Signed(i64),
    Unsigned(u64),
}

impl IntegralValue {
    /// The value's 64-bit two's-complement bit pattern, so `-1` becomes
    /// `u64::MAX`
    pub fn to_bits(self) -> u64 {
        match self {
            IntegralValue::Signed(v) => v as u64,
            IntegralValue::Unsigned(v) => v,
        }
    }
}

impl Default for IntegralValue {
    fn default() -> Self {
        IntegralValue::Unsigned(0)
    }
}

impl fmt::Display for IntegralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegralValue::Signed(v) => write!(f, "{v}"),
            IntegralValue::Unsigned(v) => write!(f, "{v}"),
        }
    }
}

/// Spelled and canonical type of a value declaration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValueDecl {
    #[serde(rename = "type", default)]
    pub ty: String,
    #[serde(default)]
    pub canonical_type: Option<String>,
}

impl ValueDecl {
    /// Canonical type, falling back to the spelled one
    pub fn raw_type(&self) -> &str {
        self.canonical_type.as_deref().unwrap_or(&self.ty)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldDecl {
    #[serde(flatten)]
    pub value: ValueDecl,
    #[serde(default)]
    pub is_mutable: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FunctionDecl {
    #[serde(default)]
    pub return_type: String,
    #[serde(default)]
    pub canonical_return_type: Option<String>,
    #[serde(default)]
    pub params: Vec<Param>,
}

impl FunctionDecl {
    pub fn raw_return_type(&self) -> &str {
        self.canonical_return_type
            .as_deref()
            .unwrap_or(&self.return_type)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MethodDecl {
    #[serde(flatten)]
    pub signature: FunctionDecl,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_virtual: bool,
    #[serde(default)]
    pub is_pure_virtual: bool,
    #[serde(default)]
    pub is_override: bool,
}

/// A function or method parameter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Param {
    /// Empty when the parameter has no identifier
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub value: ValueDecl,
    /// Pretty-printed default argument expression
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnumDecl {
    #[serde(default)]
    pub constants: Vec<EnumConstant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnumConstant {
    pub name: String,
    #[serde(default)]
    pub qualified_name: String,
    /// Signed or unsigned, as the enum's underlying type dictates
    #[serde(default)]
    pub value: IntegralValue,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub access: Access,
}
