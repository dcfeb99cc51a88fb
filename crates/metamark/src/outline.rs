//! Indented outline of a declaration tree, showing what a mark set selects

use metamark_core::name::{normalize, template_suffix};
use metamark_core::{Decl, DeclKind, DeclTree, MarkDatabase};
use std::fmt::Write;

/// Render `tree` one declaration per line.
///
/// Selected declarations are prefixed with `*` and followed by their
/// attributes; declarations that can never be selected are tagged.
pub fn render(tree: &DeclTree, marks: &MarkDatabase) -> String {
    let mut out = String::new();
    if let Some(unit) = &tree.unit {
        let _ = writeln!(out, "unit {unit}");
    }
    for decl in &tree.decls {
        render_decl(&mut out, decl, 0, marks);
    }
    out
}

fn render_decl(out: &mut String, decl: &Decl, depth: usize, marks: &MarkDatabase) {
    let indent = "  ".repeat(depth);
    let (key, note) = selection_key(decl);
    let attrs = key.as_deref().and_then(|k| marks.get(k));

    let marker = if attrs.is_some() { "*" } else { " " };
    let name = key.unwrap_or_else(|| decl.qualified_name.clone());
    let _ = write!(out, "{marker} {indent}{} {name}", decl.kind.label());
    if let Some(attrs) = attrs {
        let _ = write!(out, " [{}]", attrs.join(", "));
    }
    if let Some(note) = note {
        let _ = write!(out, " ({note})");
    }
    if decl.invalid {
        out.push_str(" (invalid)");
    }
    out.push('\n');

    match &decl.kind {
        DeclKind::Namespace { decls } => {
            for child in decls {
                render_decl(out, child, depth + 1, marks);
            }
        }
        DeclKind::Record(record) | DeclKind::TemplateSpecialization(record) => {
            for child in &record.decls {
                render_decl(out, child, depth + 1, marks);
            }
        }
        DeclKind::Enum(decl_enum) => {
            let indent = "  ".repeat(depth + 1);
            for constant in &decl_enum.constants {
                let _ = writeln!(out, "  {indent}constant {} = {}", constant.name, constant.value);
            }
        }
        DeclKind::IndirectMember { target } => {
            render_decl(out, target, depth + 1, marks);
        }
        _ => {}
    }
}

/// The key a declaration is looked up by, and a note if it cannot be selected
fn selection_key(decl: &Decl) -> (Option<String>, Option<&'static str>) {
    match &decl.kind {
        DeclKind::Namespace { .. } | DeclKind::Other => (None, None),
        DeclKind::Record(record) if !record.is_reflectable() => (None, Some("unsupported")),
        DeclKind::TemplateSpecialization(record) => {
            if !record.is_reflectable() {
                return (None, Some("unsupported"));
            }
            match template_suffix(&record.template_args) {
                Some(suffix) => (
                    Some(normalize(&format!("{}{}", decl.qualified_name, suffix))),
                    None,
                ),
                None => (None, Some("unsupported template argument")),
            }
        }
        _ => (Some(normalize(&decl.qualified_name)), None),
    }
}
