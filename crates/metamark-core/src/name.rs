//! Name normalization and lookup-key synthesis
//!
//! Every mark lookup goes through [`normalize`], so compiler spellings such as
//! `Foo< int, 3 >` and `Foo<int,3>` resolve to the same key.

use crate::decl::TemplateArg;

/// Canonical lookup key for a qualified name: all whitespace removed.
///
/// Idempotent: `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Render a template argument list as `<a,b,...>`.
///
/// Returns `None` if any argument is neither a type nor an integral value;
/// such specializations have no defined key.
pub fn template_suffix(args: &[TemplateArg]) -> Option<String> {
    let mut rendered = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            TemplateArg::Type { spelling } => rendered.push(normalize(spelling)),
            TemplateArg::Integral { value } => rendered.push(value.to_string()),
            TemplateArg::Unsupported => return None,
        }
    }
    Some(format!("<{}>", rendered.join(",")))
}

/// Lookup key of a class template specialization, e.g. `Ns::Tmpl<int,3>`.
pub fn specialization_key(qualified_name: &str, args: &[TemplateArg]) -> Option<String> {
    let suffix = template_suffix(args)?;
    Some(normalize(&format!("{qualified_name}{suffix}")))
}

/// Key for a parameter without an identifier: `<function>::<index>`.
pub fn anonymous_param_key(function: &str, index: usize) -> String {
    format!("{}::{}", normalize(function), index)
}

/// Key for a named child of a scope, e.g. a parameter: `<scope>::<name>`.
pub fn member_key(scope: &str, name: &str) -> String {
    normalize(&format!("{scope}::{name}"))
}
