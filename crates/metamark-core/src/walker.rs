//! Declaration-tree traversal
//!
//! The walker descends a [`DeclTree`] and decides, node by node, what ends up
//! in the [`ProjectMetaInfo`]:
//!
//! - namespaces are never emitted themselves, their children always visited
//! - records, fields, variables, functions, methods and enums are emitted only
//!   if their own normalized qualified name is marked
//! - parameters and enum constants follow their owner unconditionally
//! - unions, forward declarations and anonymous aggregates are never emitted
//!
//! Marking is independent per node: an unmarked member does not reject its
//! record, and a marked member of an unmarked record is never reached.

use crate::decl::{
    Decl, DeclKind, DeclTree, EnumDecl, FieldDecl, FunctionDecl, MethodDecl, Param, RecordDecl,
    ValueDecl,
};
use crate::location::FileResolver;
use crate::marks::MarkDatabase;
use crate::meta::{
    Access, EnumConstantMetaInfo, EnumMetaInfo, FieldMetaInfo, FunctionMetaInfo, MetaInfo,
    MethodMetaInfo, ParamMetaInfo, RecordMetaInfo, ValueMetaInfo,
};
use crate::name::{
    anonymous_param_key, member_key, normalize, specialization_key, template_suffix,
};
use crate::project::ProjectMetaInfo;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, info};

/// Counters and name sets collected during traversal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraversalReport {
    pub records: usize,
    pub variables: usize,
    pub functions: usize,
    pub enums: usize,
    /// Entities dropped because their location could not be resolved
    pub skipped_unresolved: usize,
    /// Mark keys that selected or annotated something
    pub matched: BTreeSet<String>,
    /// Every key the walker looked up
    pub considered: BTreeSet<String>,
}

impl TraversalReport {
    /// Total number of top-level entities emitted
    pub fn entities(&self) -> usize {
        self.records + self.variables + self.functions + self.enums
    }

    pub fn merge(&mut self, other: TraversalReport) {
        self.records += other.records;
        self.variables += other.variables;
        self.functions += other.functions;
        self.enums += other.enums;
        self.skipped_unresolved += other.skipped_unresolved;
        self.matched.extend(other.matched);
        self.considered.extend(other.considered);
    }

    /// Mark keys that matched no declaration, sorted
    pub fn unmatched<'m>(&self, marks: &'m MarkDatabase) -> Vec<&'m str> {
        let mut unmatched: Vec<&str> = marks
            .keys()
            .filter(|key| !self.matched.contains(*key))
            .collect();
        unmatched.sort_unstable();
        unmatched
    }
}

/// Run one traversal pass over `tree`, appending into `project`.
///
/// No de-duplication happens here: running the same tree twice appends every
/// entity twice.
pub fn extract_tree(
    tree: &DeclTree,
    marks: &MarkDatabase,
    resolver: &FileResolver,
    project: &mut ProjectMetaInfo,
) -> TraversalReport {
    let mut walker = DeclarationWalker::new(marks, resolver, project);
    walker.walk_tree(tree);
    walker.finish()
}

/// Recursive visitor applying the marking rules.
pub struct DeclarationWalker<'a> {
    marks: &'a MarkDatabase,
    resolver: &'a FileResolver,
    project: &'a mut ProjectMetaInfo,
    base_dir: Option<PathBuf>,
    report: TraversalReport,
}

impl<'a> DeclarationWalker<'a> {
    pub fn new(
        marks: &'a MarkDatabase,
        resolver: &'a FileResolver,
        project: &'a mut ProjectMetaInfo,
    ) -> Self {
        Self {
            marks,
            resolver,
            project,
            base_dir: None,
            report: TraversalReport::default(),
        }
    }

    /// Walk every top-level declaration of `tree`
    pub fn walk_tree(&mut self, tree: &DeclTree) {
        self.base_dir = tree.directory.clone();
        for decl in &tree.decls {
            self.visit_scope(decl);
        }
    }

    pub fn finish(self) -> TraversalReport {
        self.report
    }

    /// Namespace-scope dispatch
    fn visit_scope(&mut self, decl: &Decl) {
        if decl.invalid {
            debug!("Skipping invalid declaration {}", decl.qualified_name);
            return;
        }

        match &decl.kind {
            DeclKind::Namespace { decls } => {
                for child in decls {
                    self.visit_scope(child);
                }
            }
            DeclKind::Record(record) => self.handle_record(decl, record),
            DeclKind::TemplateSpecialization(record) => self.handle_specialization(decl, record),
            DeclKind::Enum(decl_enum) => self.handle_enum(decl, decl_enum),
            DeclKind::Variable(value) => self.handle_variable(decl, value),
            DeclKind::Function(function) => self.handle_function(decl, function),
            DeclKind::IndirectMember { target } => self.visit_scope(&redirect(decl, target)),
            DeclKind::Field(_) | DeclKind::Method(_) | DeclKind::Other => {}
        }
    }

    /// Record-scope dispatch
    fn visit_member(&mut self, decl: &Decl, owner: &mut RecordMetaInfo) {
        if decl.invalid {
            debug!("Skipping invalid member {}", decl.qualified_name);
            return;
        }

        match &decl.kind {
            DeclKind::Field(field) => self.handle_field(decl, field, owner),
            // Static data members live in the file's variable list
            DeclKind::Variable(value) => self.handle_variable(decl, value),
            DeclKind::Method(method) if method.is_static => {
                self.handle_function(decl, &method.signature)
            }
            DeclKind::Method(method) => self.handle_method(decl, method, owner),
            DeclKind::Record(record) => self.handle_record(decl, record),
            DeclKind::TemplateSpecialization(record) => self.handle_specialization(decl, record),
            DeclKind::Enum(decl_enum) => self.handle_enum(decl, decl_enum),
            DeclKind::IndirectMember { target } => {
                self.visit_member(&redirect(decl, target), owner)
            }
            DeclKind::Namespace { .. } | DeclKind::Function(_) | DeclKind::Other => {}
        }
    }

    fn handle_record(&mut self, decl: &Decl, record: &RecordDecl) {
        if !record.is_reflectable() {
            debug!(
                "Skipping unsupported {} {}",
                record.tag.as_str(),
                decl.qualified_name
            );
            return;
        }
        let key = normalize(&decl.qualified_name);
        self.emit_record(decl, record, key, decl.name.clone());
    }

    fn handle_specialization(&mut self, decl: &Decl, record: &RecordDecl) {
        if !record.is_reflectable() {
            debug!("Skipping unsupported specialization {}", decl.qualified_name);
            return;
        }
        let (Some(key), Some(suffix)) = (
            specialization_key(&decl.qualified_name, &record.template_args),
            template_suffix(&record.template_args),
        ) else {
            debug!(
                "Skipping specialization of {} with an unsupported template argument kind",
                decl.qualified_name
            );
            return;
        };
        let name = format!("{}{}", decl.name, suffix);
        self.emit_record(decl, record, key, name);
    }

    fn emit_record(&mut self, decl: &Decl, record: &RecordDecl, key: String, name: String) {
        let Some(attrs) = self.lookup(&key) else {
            return;
        };

        let mut info = RecordMetaInfo {
            base: MetaInfo {
                name,
                ..self.meta(decl, key, attrs)
            },
            bases: record.bases.clone(),
            fields: Vec::new(),
            methods: Vec::new(),
        };

        for member in &record.decls {
            self.visit_member(member, &mut info);
        }

        // Appended after its children
        if let Some(path) = self.bucket(decl) {
            info!(
                "Handled record {} ({} fields, {} methods) in {}",
                info.base.full_name,
                info.fields.len(),
                info.methods.len(),
                path
            );
            self.project.file_mut(&path).records.push(info);
            self.report.records += 1;
        }
    }

    fn handle_field(&mut self, decl: &Decl, field: &FieldDecl, owner: &mut RecordMetaInfo) {
        let key = normalize(&decl.qualified_name);
        let Some(attrs) = self.lookup(&key) else {
            return;
        };
        owner.fields.push(FieldMetaInfo {
            value: self.value(decl, &field.value, key, attrs),
            is_mutable: field.is_mutable,
        });
    }

    fn handle_method(&mut self, decl: &Decl, method: &MethodDecl, owner: &mut RecordMetaInfo) {
        let key = normalize(&decl.qualified_name);
        let Some(attrs) = self.lookup(&key) else {
            return;
        };
        let function = self.function(decl, &method.signature, key, attrs);
        owner.methods.push(MethodMetaInfo {
            function,
            is_virtual: method.is_virtual,
            is_pure_virtual: method.is_pure_virtual,
            is_override: method.is_override,
        });
    }

    fn handle_variable(&mut self, decl: &Decl, value: &ValueDecl) {
        let key = normalize(&decl.qualified_name);
        let Some(attrs) = self.lookup(&key) else {
            return;
        };
        let info = self.value(decl, value, key, attrs);
        if let Some(path) = self.bucket(decl) {
            info!("Handled variable {} in {}", info.base.full_name, path);
            self.project.file_mut(&path).variables.push(info);
            self.report.variables += 1;
        }
    }

    /// Free functions and static methods
    fn handle_function(&mut self, decl: &Decl, function: &FunctionDecl) {
        let key = normalize(&decl.qualified_name);
        let Some(attrs) = self.lookup(&key) else {
            return;
        };
        let info = self.function(decl, function, key, attrs);
        if let Some(path) = self.bucket(decl) {
            info!("Handled function {} in {}", info.base.full_name, path);
            self.project.file_mut(&path).functions.push(info);
            self.report.functions += 1;
        }
    }

    fn handle_enum(&mut self, decl: &Decl, decl_enum: &EnumDecl) {
        let key = normalize(&decl.qualified_name);
        let Some(attrs) = self.lookup(&key) else {
            return;
        };

        let mut constants = Vec::with_capacity(decl_enum.constants.len());
        for constant in &decl_enum.constants {
            let full_name = if constant.qualified_name.is_empty() {
                member_key(&key, &constant.name)
            } else {
                normalize(&constant.qualified_name)
            };
            let attrs = self.lookup(&full_name).unwrap_or_default();
            constants.push(EnumConstantMetaInfo {
                base: MetaInfo {
                    name: constant.name.clone(),
                    full_name,
                    attrs,
                    comment: constant.comment.clone().unwrap_or_default(),
                    access: constant.access,
                },
                value: constant.value.to_bits(),
            });
        }

        let info = EnumMetaInfo {
            base: self.meta(decl, key, attrs),
            constants,
        };
        if let Some(path) = self.bucket(decl) {
            info!(
                "Handled enum {} ({} constants) in {}",
                info.base.full_name,
                info.constants.len(),
                path
            );
            self.project.file_mut(&path).enums.push(info);
            self.report.enums += 1;
        }
    }

    fn function(
        &mut self,
        decl: &Decl,
        function: &FunctionDecl,
        key: String,
        attrs: Vec<String>,
    ) -> FunctionMetaInfo {
        let params: Vec<ParamMetaInfo> = function
            .params
            .iter()
            .enumerate()
            .map(|(index, param)| self.param(&key, index, param))
            .collect();
        FunctionMetaInfo {
            base: self.meta(decl, key, attrs),
            ret_type: function.return_type.clone(),
            ret_raw_type: function.raw_return_type().to_string(),
            params,
        }
    }

    /// Parameters are never filtered; their key only selects attributes.
    fn param(&mut self, function_key: &str, index: usize, param: &Param) -> ParamMetaInfo {
        let full_name = if param.name.is_empty() {
            anonymous_param_key(function_key, index)
        } else {
            member_key(function_key, &param.name)
        };
        let attrs = self.lookup(&full_name).unwrap_or_default();
        ParamMetaInfo {
            value: ValueMetaInfo {
                base: MetaInfo {
                    name: param.name.clone(),
                    full_name,
                    attrs,
                    comment: param.comment.clone().unwrap_or_default(),
                    access: Access::None,
                },
                ty: param.value.ty.clone(),
                raw_type: param.value.raw_type().to_string(),
            },
            index,
            is_default: param.default_value.is_some(),
            default_value: param.default_value.clone().unwrap_or_default(),
        }
    }

    fn value(
        &self,
        decl: &Decl,
        value: &ValueDecl,
        key: String,
        attrs: Vec<String>,
    ) -> ValueMetaInfo {
        ValueMetaInfo {
            base: self.meta(decl, key, attrs),
            ty: value.ty.clone(),
            raw_type: value.raw_type().to_string(),
        }
    }

    fn meta(&self, decl: &Decl, full_name: String, attrs: Vec<String>) -> MetaInfo {
        MetaInfo {
            name: decl.name.clone(),
            full_name,
            attrs,
            comment: decl.comment.clone().unwrap_or_default(),
            access: decl.access,
        }
    }

    /// Attributes of `key` if it is marked, recording the lookup
    fn lookup(&mut self, key: &str) -> Option<Vec<String>> {
        self.report.considered.insert(key.to_string());
        if !self.marks.is_marked(key) {
            return None;
        }
        self.report.matched.insert(key.to_string());
        Some(self.marks.attributes_of(key).to_vec())
    }

    fn bucket(&mut self, decl: &Decl) -> Option<String> {
        let bucket = self
            .resolver
            .bucket_for(decl.location.as_ref(), self.base_dir.as_deref());
        if bucket.is_none() {
            self.report.skipped_unresolved += 1;
        }
        bucket
    }
}

/// View an indirect member as its underlying field or variable, under the
/// indirect member's own name.
fn redirect(indirect: &Decl, target: &Decl) -> Decl {
    Decl {
        name: indirect.name.clone(),
        qualified_name: indirect.qualified_name.clone(),
        access: indirect.access,
        comment: target.comment.clone().or_else(|| indirect.comment.clone()),
        location: target
            .location
            .clone()
            .or_else(|| indirect.location.clone()),
        invalid: indirect.invalid || target.invalid,
        kind: target.kind.clone(),
    }
}
