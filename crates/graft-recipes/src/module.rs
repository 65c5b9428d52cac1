//! Registering a module in `config/app.php`.

use crate::{validate_class, Recipe, RecipeError, RecipeResult};
use graft_ast::edits::{first_return_value, merge_into_array_literal, MergeEntries};
use graft_ast::{AstResult, Draft, Expr};
use graft_foundation::{EditOutcome, FollowUp};

/// Adds `modules => [id => \Module::class]`, and optionally the ID to
/// `bootstrap`, in the array returned at the top level of an app config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRegistration {
    module_id: String,
    module_class: String,
    bootstrap: bool,
}

impl ModuleRegistration {
    pub fn new(module_id: &str, module_class: &str) -> RecipeResult<Self> {
        Ok(Self {
            module_id: validate_module_id(module_id)?,
            module_class: validate_class("module class", module_class)?,
            bootstrap: false,
        })
    }

    /// Also load the module on every request
    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    pub fn module_id(&self) -> &str {
        &self.module_id
    }

    fn class_reference(&self) -> String {
        format!("\\{}", self.module_class)
    }
}

/// Module IDs are used in routes, so dashes are allowed
fn validate_module_id(id: &str) -> RecipeResult<String> {
    let valid = id.chars().next().is_some_and(|c| c.is_ascii_lowercase())
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if valid {
        Ok(id.to_string())
    } else {
        Err(RecipeError::invalid_input(
            "module ID",
            format!("`{}` must be lowercase letters, digits, dashes or underscores", id),
        ))
    }
}

impl Recipe for ModuleRegistration {
    fn id(&self) -> &'static str {
        "module-registration"
    }

    fn apply(&self, draft: &mut Draft) -> AstResult<EditOutcome> {
        let mut entries = MergeEntries::new().nested(
            "modules",
            MergeEntries::new().entry(self.module_id.as_str(), Expr::class_ref(self.class_reference())),
        );
        if self.bootstrap {
            entries = entries.nested(
                "bootstrap",
                MergeEntries::new().push(Expr::string(&self.module_id)),
            );
        }

        match first_return_value(draft.file_mut().scope_stmts_mut()) {
            Some(value) => Ok(merge_into_array_literal(value, &entries)),
            None => Ok(EditOutcome::not_applicable(
                "the file has no top-level return statement",
            )),
        }
    }

    fn follow_up(&self, target: &str, reason: &str) -> FollowUp {
        let id = &self.module_id;
        let follow_up = FollowUp::new(format!("Install the `{}` module manually ({})", id, reason))
            .code_step(
                format!("To install the module, open `{}` and add the following to the `return` array:", target),
                format!("'modules' => [\n    '{}' => {}::class,\n],", id, self.class_reference()),
            );
        let bootstrap = format!("'bootstrap' => [\n    '{}',\n],", id);
        if self.bootstrap {
            follow_up.code_step(
                format!("Include `'{}'` in the `bootstrap` array so it is loaded on every request:", id),
                bootstrap,
            )
        } else {
            follow_up.code_step(
                format!("If you want your module to be loaded during application initialization on every request, also include `'{}'` in the `bootstrap` array:", id),
                bootstrap,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run;
    use graft_ast::Workspace;
    use pretty_assertions::assert_eq;

    const APP_CONFIG: &str = r#"<?php
/**
 * Yii Application Config
 */

use craft\helpers\App;

return [
    'id' => App::env('CRAFT_APP_ID') ?: 'CraftCMS',
];
"#;

    #[test]
    fn test_registers_module_and_bootstrap() {
        let recipe = ModuleRegistration::new("shop", "acme\\shop\\Module")
            .unwrap()
            .with_bootstrap(true);
        let mut workspace = Workspace::from_source(APP_CONFIG).unwrap();
        let outcome = run(&recipe, &mut workspace, "config/app.php").unwrap();

        assert!(outcome.patched);
        assert_eq!(
            outcome.preview.unwrap(),
            r#"<?php
/**
 * Yii Application Config
 */

use craft\helpers\App;

return [
    'id' => App::env('CRAFT_APP_ID') ?: 'CraftCMS',
    'modules' => ['shop' => \acme\shop\Module::class],
    'bootstrap' => ['shop'],
];
"#
        );
    }

    #[test]
    fn test_existing_module_entry_is_kept() {
        let source = "<?php\nreturn [\n    'modules' => [\n        'shop' => \\legacy\\Shop::class,\n    ],\n    'bootstrap' => ['shop'],\n];\n";
        let recipe = ModuleRegistration::new("shop", "acme\\shop\\Module")
            .unwrap()
            .with_bootstrap(true);
        let mut workspace = Workspace::from_source(source).unwrap();
        let outcome = run(&recipe, &mut workspace, "config/app.php").unwrap();
        assert!(outcome.patched);
        assert_eq!(outcome.preview.unwrap(), source);
    }

    #[test]
    fn test_config_without_array_gets_follow_up() {
        let source = "<?php\nreturn require __DIR__ . '/shared.php';\n";
        let recipe = ModuleRegistration::new("shop", "acme\\shop\\Module").unwrap();
        let mut workspace = Workspace::from_source(source).unwrap();
        let outcome = run(&recipe, &mut workspace, "config/app.php").unwrap();

        assert!(!outcome.patched);
        let follow_up = outcome.follow_up.unwrap();
        assert_eq!(follow_up.steps.len(), 2);
        assert_eq!(
            follow_up.steps[0].code.as_deref(),
            Some("'modules' => [\n    'shop' => \\acme\\shop\\Module::class,\n],")
        );
        assert!(follow_up.steps[1].instruction.starts_with("If you want your module"));
    }

    #[test]
    fn test_module_id_validation() {
        assert!(ModuleRegistration::new("my-shop_2", "acme\\Module").is_ok());
        assert!(ModuleRegistration::new("Shop", "acme\\Module").is_err());
        assert!(ModuleRegistration::new("", "acme\\Module").is_err());
    }
}
