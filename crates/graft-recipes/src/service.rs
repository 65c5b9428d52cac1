//! Registering a service as a module component.

use crate::{validate_class, validate_identifier, Recipe, RecipeResult};
use graft_ast::edits::{
    append_doc_line, first_return_value, has_doc_line, merge_into_array_literal, MergeEntries,
};
use graft_ast::names::class_name;
use graft_ast::{AstResult, Draft, Expr};
use graft_foundation::{EditOutcome, FollowUp};
use tracing::debug;

/// Adds `components => [id => Service::class]` to the array returned by the
/// module's `config()` method and documents the component on the class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceComponent {
    service_class: String,
    component_id: String,
}

impl ServiceComponent {
    pub fn new(service_class: &str, component_id: &str) -> RecipeResult<Self> {
        Ok(Self {
            service_class: validate_class("service class", service_class)?,
            component_id: validate_identifier("component ID", component_id)?,
        })
    }

    /// Component ID derived from the class name: `LogService` -> `logService`
    pub fn for_class(service_class: &str) -> RecipeResult<Self> {
        let class = validate_class("service class", service_class)?;
        let short = class_name(&class);
        let mut chars = short.chars();
        let id = match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect::<String>(),
            None => String::new(),
        };
        Self::new(&class, &id)
    }

    pub fn service_class(&self) -> &str {
        &self.service_class
    }

    pub fn component_id(&self) -> &str {
        &self.component_id
    }
}

impl Recipe for ServiceComponent {
    fn id(&self) -> &'static str {
        "service-component"
    }

    fn apply(&self, draft: &mut Draft) -> AstResult<EditOutcome> {
        let alias = draft.ensure_import(&self.service_class, None)?;
        let entries = MergeEntries::new().nested(
            "components",
            MergeEntries::new().entry(self.component_id.as_str(), Expr::class_ref(alias.as_str())),
        );
        let merged = draft.edit_method("config", |method| {
            let Some(body) = method.body.as_mut() else {
                return EditOutcome::not_applicable("`config()` has no body");
            };
            match first_return_value(&mut body.stmts) {
                Some(value) => merge_into_array_literal(value, &entries),
                None => EditOutcome::not_applicable("`config()` does not return a value"),
            }
        })?;
        if !merged.is_applied() {
            return Ok(merged);
        }

        let Some(class) = draft.primary_class_mut() else {
            return Ok(EditOutcome::not_applicable("no class declaration found"));
        };
        let tag = format!("@property-read {} ${}", alias, self.component_id);
        if has_doc_line(class, &tag) {
            debug!(tag = %tag, "Doc tag already present");
            return Ok(EditOutcome::Applied);
        }
        Ok(append_doc_line(class, &tag))
    }

    fn follow_up(&self, target: &str, reason: &str) -> FollowUp {
        let short = class_name(&self.service_class);
        let id = &self.component_id;
        FollowUp::new(format!("Register the `{}` service manually ({})", id, reason))
            .code_step(
                format!("Add the following code to `{}` to register the service:", target),
                format!(
                    "use {};\n\npublic static function config(): array\n{{\n    return [\n        'components' => [\n            '{}' => {}::class,\n        ],\n    ];\n}}",
                    self.service_class, id, short
                ),
            )
            .code_step(
                "You should also add a `@property-read` tag to the class's DocBlock comment, to help with IDE autocompletion:",
                format!("/**\n * @property-read {} ${}\n */", short, id),
            )
    }
}
