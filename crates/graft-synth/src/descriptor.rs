//! Descriptions of base types.
//!
//! A [`TypeDescriptor`] lists what a base class declares, in the order it
//! declares it. Class names inside type hints are fully qualified with a
//! leading backslash (`?\craft\base\Model`), so a descriptor can be used
//! from any namespace. Descriptors are either loaded from JSON or built from
//! parsed source by [`describe`].

use crate::error::{SynthError, SynthResult};
use graft_ast::names::{class_name, is_builtin_type, map_type_parts, resolve_class_name};
use graft_ast::syntax::{ClassDecl, Member, Modifiers, Param, Visibility};
use graft_ast::{expr_to_code, ClassKind, ImportTable, SourceFile};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberVisibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl MemberVisibility {
    pub fn to_modifiers(self) -> Modifiers {
        Modifiers::with_visibility(match self {
            MemberVisibility::Public => Visibility::Public,
            MemberVisibility::Protected => Visibility::Protected,
            MemberVisibility::Private => Visibility::Private,
        })
    }
}

impl From<Option<Visibility>> for MemberVisibility {
    fn from(visibility: Option<Visibility>) -> Self {
        match visibility {
            Some(Visibility::Protected) => MemberVisibility::Protected,
            Some(Visibility::Private) => MemberVisibility::Private,
            Some(Visibility::Public) | None => MemberVisibility::Public,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstantInfo {
    /// Value expression as PHP source
    pub value: String,
    #[serde(default)]
    pub visibility: MemberVisibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<String>,
    /// Default value as PHP source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default)]
    pub visibility: MemberVisibility,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_readonly: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default)]
    pub by_ref: bool,
    #[serde(default)]
    pub variadic: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodInfo {
    #[serde(default)]
    pub visibility: MemberVisibility,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub by_ref: bool,
    #[serde(default)]
    pub params: Vec<ParamInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDescriptor {
    /// Fully qualified name, without a leading backslash
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub constants: IndexMap<String, ConstantInfo>,
    #[serde(default)]
    pub properties: IndexMap<String, PropertyInfo>,
    #[serde(default)]
    pub methods: IndexMap<String, MethodInfo>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim_start_matches('\\').to_string(),
            parent: None,
            constants: IndexMap::new(),
            properties: IndexMap::new(),
            methods: IndexMap::new(),
        }
    }

    pub fn short_name(&self) -> &str {
        class_name(&self.name)
    }

    pub fn from_json(json: &str) -> SynthResult<Self> {
        let mut descriptor: Self = serde_json::from_str(json)?;
        descriptor.name = descriptor.name.trim_start_matches('\\').to_string();
        if !graft_ast::names::validate_class(&descriptor.name) {
            return Err(SynthError::invalid_descriptor(format!(
                "`{}` is not a valid class name",
                descriptor.name
            )));
        }
        Ok(descriptor)
    }

    pub fn load(path: &Path) -> SynthResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| SynthError::io(path, e))?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> SynthResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Methods are case-insensitive in PHP; an exact match wins
    pub fn method(&self, name: &str) -> Option<(&str, &MethodInfo)> {
        self.methods
            .get_key_value(name)
            .or_else(|| {
                self.methods
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
            })
            .map(|(key, info)| (key.as_str(), info))
    }
}

/// Build a descriptor for `class` (short or fully qualified name) as
/// declared in `file`
pub fn describe(file: &SourceFile, class: &str) -> SynthResult<TypeDescriptor> {
    let class = class.trim_start_matches('\\');
    let decl = find_class(file, class)
        .ok_or_else(|| SynthError::lookup("class", class, file.namespace().unwrap_or("\\")))?;

    let imports = ImportTable::from_file(file);
    let namespace = file.namespace();
    let resolve = |name: &str| {
        resolve_class_name(name, namespace, |alias| {
            imports.resolve_alias(alias).map(str::to_string)
        })
    };

    let fqn = resolve(format!("namespace\\{}", decl.name).as_str());
    let parent = decl.extends.first().map(|parent| resolve(parent.as_str()));
    let mut descriptor = TypeDescriptor::new(fqn.clone());
    descriptor.parent = parent.clone();

    let qualify_type = |hint: &str| {
        map_type_parts(hint, |part| match part.to_ascii_lowercase().as_str() {
            "self" => format!("\\{}", fqn),
            "parent" => match &parent {
                Some(parent) => format!("\\{}", parent),
                None => part.to_string(),
            },
            _ if is_builtin_type(part) => part.to_string(),
            _ => format!("\\{}", resolve(part)),
        })
    };

    for member in &decl.members {
        match member {
            Member::Constant(constant) => {
                for entry in &constant.entries {
                    descriptor.constants.insert(
                        entry.name.clone(),
                        ConstantInfo {
                            value: expr_to_code(&entry.value),
                            visibility: constant.modifiers.visibility.into(),
                            type_hint: constant.type_hint.as_deref().map(&qualify_type),
                        },
                    );
                }
            }
            Member::Property(property) => {
                for entry in &property.entries {
                    descriptor.properties.insert(
                        entry.name.clone(),
                        PropertyInfo {
                            type_hint: property.type_hint.as_deref().map(&qualify_type),
                            default: entry.default.as_ref().map(expr_to_code),
                            visibility: property.modifiers.visibility.into(),
                            is_static: property.modifiers.is_static,
                            is_readonly: property.modifiers.is_readonly,
                        },
                    );
                }
            }
            Member::Method(method) => {
                descriptor.methods.insert(
                    method.name.clone(),
                    MethodInfo {
                        visibility: method.modifiers.visibility.into(),
                        is_static: method.modifiers.is_static,
                        by_ref: method.by_ref,
                        params: method
                            .params
                            .iter()
                            .map(|param| param_info(param, &qualify_type))
                            .collect(),
                        return_type: method.return_type.as_deref().map(&qualify_type),
                    },
                );
            }
            Member::Raw(_) => {}
        }
    }

    debug!(
        class = %descriptor.name,
        constants = descriptor.constants.len(),
        properties = descriptor.properties.len(),
        methods = descriptor.methods.len(),
        "Described base type"
    );
    Ok(descriptor)
}

fn find_class<'a>(file: &'a SourceFile, class: &str) -> Option<&'a ClassDecl> {
    let short = class_name(class);
    let wanted_ns = graft_ast::names::namespace_of(class);
    file.classes().find(|decl| {
        decl.kind != ClassKind::Enum
            && decl.name.eq_ignore_ascii_case(short)
            && match wanted_ns {
                Some(ns) => file
                    .namespace()
                    .is_some_and(|file_ns| file_ns.eq_ignore_ascii_case(ns)),
                None => true,
            }
    })
}

fn param_info<F: Fn(&str) -> String>(param: &Param, qualify_type: &F) -> ParamInfo {
    ParamInfo {
        name: param.name.trim_start_matches('$').to_string(),
        type_hint: param.type_hint.as_deref().map(qualify_type),
        default: param.default.as_ref().map(expr_to_code),
        by_ref: param.by_ref,
        variadic: param.variadic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_ast::parse;
    use pretty_assertions::assert_eq;

    const BASE: &str = r#"<?php
namespace craft\base;

use craft\models\Settings as SettingsModel;
use yii\base\Module;

abstract class Plugin extends Module implements PluginInterface
{
    public const EDITION_LITE = 'lite';
    protected const HIDDEN = [1, 2];

    public string $schemaVersion = '1.0.0';
    public static ?self $instance = null;
    protected ?SettingsModel $settings;

    public function init(): void
    {
        parent::init();
    }

    protected function createSettingsModel(): ?Model
    {
        return null;
    }

    public static function find(string $handle, bool &$found = false, ...$rest): static|parent
    {
        return new static();
    }
}
"#;

    #[test]
    fn test_describe_plugin() {
        let file = parse(BASE).unwrap();
        let descriptor = describe(&file, "craft\\base\\Plugin").unwrap();

        assert_eq!(descriptor.name, "craft\\base\\Plugin");
        assert_eq!(descriptor.parent.as_deref(), Some("yii\\base\\Module"));
        assert_eq!(
            descriptor.constants.keys().collect::<Vec<_>>(),
            vec!["EDITION_LITE", "HIDDEN"]
        );
        assert_eq!(descriptor.constants["EDITION_LITE"].value, "'lite'");
        assert_eq!(
            descriptor.constants["HIDDEN"].visibility,
            MemberVisibility::Protected
        );

        let instance = &descriptor.properties["instance"];
        assert_eq!(instance.type_hint.as_deref(), Some("?\\craft\\base\\Plugin"));
        assert!(instance.is_static);
        assert_eq!(
            descriptor.properties["settings"].type_hint.as_deref(),
            Some("?\\craft\\models\\Settings")
        );

        let create = &descriptor.methods["createSettingsModel"];
        assert_eq!(create.return_type.as_deref(), Some("?\\craft\\base\\Model"));
        assert_eq!(create.visibility, MemberVisibility::Protected);

        let find = &descriptor.methods["find"];
        assert!(find.is_static);
        assert_eq!(find.return_type.as_deref(), Some("static|\\yii\\base\\Module"));
        assert_eq!(find.params[1].name, "found");
        assert!(find.params[1].by_ref);
        assert_eq!(find.params[1].default.as_deref(), Some("false"));
        assert!(find.params[2].variadic);
    }

    #[test]
    fn test_describe_unknown_class() {
        let file = parse(BASE).unwrap();
        assert!(matches!(
            describe(&file, "Widget"),
            Err(SynthError::Lookup { kind: "class", .. })
        ));
        assert!(describe(&file, "other\\Plugin").is_err());
    }

    #[test]
    fn test_method_lookup_is_case_insensitive() {
        let file = parse(BASE).unwrap();
        let descriptor = describe(&file, "Plugin").unwrap();
        assert_eq!(descriptor.method("INIT").map(|(name, _)| name), Some("init"));
    }

    #[test]
    fn test_json_round_trip_and_validation() {
        let json = r#"{"name": "\\craft\\base\\Plugin", "methods": {"init": {"returnType": "void"}}}"#;
        let descriptor = TypeDescriptor::from_json(json).unwrap();
        assert_eq!(descriptor.name, "craft\\base\\Plugin");
        assert_eq!(descriptor.methods["init"].visibility, MemberVisibility::Public);
        let again = TypeDescriptor::from_json(&descriptor.to_json().unwrap()).unwrap();
        assert_eq!(again, descriptor);

        assert!(TypeDescriptor::from_json(r#"{"name": "1bad"}"#).is_err());
    }
}
