//! Extracted metadata entities
//!
//! Every entity embeds a [`MetaInfo`] and adds its kind-specific fields on top.
//! Composition is flattened on the wire, so a serialized field reads
//! `name, full_name, attrs, comment, access, type, raw_type, is_mutable`.

use serde::{Deserialize, Serialize};

/// C++ access specifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Public,
    Protected,
    Private,
    #[default]
    None,
}

/// Base information shared by every entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaInfo {
    /// Simple name (specializations carry their argument suffix)
    pub name: String,
    /// Fully qualified name, the mark lookup key
    pub full_name: String,
    /// Attributes copied from the mark map, empty if the key is unmarked
    #[serde(default)]
    pub attrs: Vec<String>,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub access: Access,
}

/// Variables, and the value part of fields and parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueMetaInfo {
    #[serde(flatten)]
    pub base: MetaInfo,
    /// Type as spelled in source
    #[serde(rename = "type")]
    pub ty: String,
    /// Canonical type
    pub raw_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMetaInfo {
    #[serde(flatten)]
    pub value: ValueMetaInfo,
    pub is_mutable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamMetaInfo {
    #[serde(flatten)]
    pub value: ValueMetaInfo,
    /// Zero-based position in the parameter list
    pub index: usize,
    pub is_default: bool,
    /// Default argument text, empty unless `is_default`
    #[serde(default)]
    pub default_value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionMetaInfo {
    #[serde(flatten)]
    pub base: MetaInfo,
    pub ret_type: String,
    pub ret_raw_type: String,
    #[serde(default)]
    pub params: Vec<ParamMetaInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodMetaInfo {
    #[serde(flatten)]
    pub function: FunctionMetaInfo,
    pub is_virtual: bool,
    pub is_pure_virtual: bool,
    pub is_override: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetaInfo {
    #[serde(flatten)]
    pub base: MetaInfo,
    /// Qualified names of the base classes
    #[serde(default)]
    pub bases: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldMetaInfo>,
    #[serde(default)]
    pub methods: Vec<MethodMetaInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumConstantMetaInfo {
    #[serde(flatten)]
    pub base: MetaInfo,
    pub value: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumMetaInfo {
    #[serde(flatten)]
    pub base: MetaInfo,
    #[serde(default)]
    pub constants: Vec<EnumConstantMetaInfo>,
}

/// Everything extracted for one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetaInfo {
    #[serde(default)]
    pub records: Vec<RecordMetaInfo>,
    /// Namespace-scope variables and static data members
    #[serde(default)]
    pub variables: Vec<ValueMetaInfo>,
    /// Free functions and static methods
    #[serde(default)]
    pub functions: Vec<FunctionMetaInfo>,
    #[serde(default)]
    pub enums: Vec<EnumMetaInfo>,
}

impl FileMetaInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when all four lists are empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
            && self.variables.is_empty()
            && self.functions.is_empty()
            && self.enums.is_empty()
    }

    /// Total number of top-level entities in this file
    pub fn len(&self) -> usize {
        self.records.len() + self.variables.len() + self.functions.len() + self.enums.len()
    }
}

/// Access to the embedded [`MetaInfo`] of an entity.
pub trait HasMeta {
    fn meta(&self) -> &MetaInfo;

    fn full_name(&self) -> &str {
        &self.meta().full_name
    }

    /// Key telling distinct declarations apart. Overloads share a
    /// `full_name`, so callables add their parameter types.
    fn identity(&self) -> String {
        self.full_name().to_string()
    }
}

impl HasMeta for MetaInfo {
    fn meta(&self) -> &MetaInfo {
        self
    }
}

impl HasMeta for ValueMetaInfo {
    fn meta(&self) -> &MetaInfo {
        &self.base
    }
}

impl HasMeta for FieldMetaInfo {
    fn meta(&self) -> &MetaInfo {
        &self.value.base
    }
}

impl HasMeta for ParamMetaInfo {
    fn meta(&self) -> &MetaInfo {
        &self.value.base
    }
}

impl HasMeta for FunctionMetaInfo {
    fn meta(&self) -> &MetaInfo {
        &self.base
    }

    fn identity(&self) -> String {
        let params: Vec<&str> = self
            .params
            .iter()
            .map(|param| param.value.raw_type.as_str())
            .collect();
        format!("{}({})", self.base.full_name, params.join(","))
    }
}

impl HasMeta for MethodMetaInfo {
    fn meta(&self) -> &MetaInfo {
        &self.function.base
    }

    fn identity(&self) -> String {
        self.function.identity()
    }
}

impl HasMeta for RecordMetaInfo {
    fn meta(&self) -> &MetaInfo {
        &self.base
    }
}

impl HasMeta for EnumConstantMetaInfo {
    fn meta(&self) -> &MetaInfo {
        &self.base
    }
}

impl HasMeta for EnumMetaInfo {
    fn meta(&self) -> &MetaInfo {
        &self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file() {
        let mut file = FileMetaInfo::new();
        assert!(file.is_empty());
        file.enums.push(EnumMetaInfo::default());
        assert!(!file.is_empty());
        assert_eq!(file.len(), 1);
    }

    #[test]
    fn test_access_wire_names() {
        assert_eq!(serde_json::to_string(&Access::Protected).unwrap(), "\"protected\"");
        assert_eq!(serde_json::to_string(&Access::None).unwrap(), "\"none\"");
    }

    #[test]
    fn test_has_meta_reaches_base() {
        let method = MethodMetaInfo {
            function: FunctionMetaInfo {
                base: MetaInfo {
                    name: "run".into(),
                    full_name: "App::Job::run".into(),
                    ..MetaInfo::default()
                },
                ..FunctionMetaInfo::default()
            },
            is_virtual: true,
            ..MethodMetaInfo::default()
        };
        assert_eq!(method.full_name(), "App::Job::run");
        assert_eq!(method.meta().name, "run");
        assert_eq!(method.identity(), "App::Job::run()");
    }

    #[test]
    fn test_overloads_have_distinct_identities() {
        let overload = |raw_type: &str| FunctionMetaInfo {
            base: MetaInfo {
                full_name: "f".into(),
                ..MetaInfo::default()
            },
            params: vec![ParamMetaInfo {
                value: ValueMetaInfo {
                    raw_type: raw_type.into(),
                    ..ValueMetaInfo::default()
                },
                ..ParamMetaInfo::default()
            }],
            ..FunctionMetaInfo::default()
        };
        assert_eq!(overload("int").identity(), "f(int)");
        assert_ne!(overload("int").identity(), overload("double").identity());

        let variable = ValueMetaInfo {
            base: MetaInfo {
                full_name: "g".into(),
                ..MetaInfo::default()
            },
            ..ValueMetaInfo::default()
        };
        assert_eq!(variable.identity(), "g");
    }
}
