//! Registering a new component type through an event handler.

use crate::{validate_class, validate_identifier, Recipe, RecipeResult};
use graft_ast::edits::{append_statement_to_method, body_contains};
use graft_ast::names::class_name;
use graft_ast::{AstResult, Draft};
use graft_foundation::{EditOutcome, FollowUp};
use tracing::debug;

pub const EVENT_CLASS: &str = "yii\\base\\Event";
pub const HANDLER_METHOD: &str = "attachEventHandlers";

/// Appends an `Event::on()` call that adds a class to an event's type list
/// at the end of the module's `attachEventHandlers()` method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventHandlerRegistration {
    owner_class: String,
    event_name: String,
    event_class: String,
    type_class: String,
    collection: String,
}

impl EventHandlerRegistration {
    /// `owner_class::event_name` is raised with an `event_class` whose
    /// `$types` list receives `type_class`
    pub fn new(
        owner_class: &str,
        event_name: &str,
        event_class: &str,
        type_class: &str,
    ) -> RecipeResult<Self> {
        Ok(Self {
            owner_class: validate_class("event owner class", owner_class)?,
            event_name: validate_identifier("event name", event_name)?,
            event_class: validate_class("event class", event_class)?,
            type_class: validate_class("type class", type_class)?,
            collection: "types".to_string(),
        })
    }

    /// Event property the type is appended to, `types` by default
    pub fn with_collection(mut self, collection: &str) -> RecipeResult<Self> {
        self.collection = validate_identifier("event property", collection)?;
        Ok(self)
    }

    /// Handler code using the given references to the owner, event and new type
    fn handler(&self, owner: &str, event: &str, new_type: &str) -> String {
        format!(
            "Event::on({owner}::class, {owner}::{name}, function({event} $event) {{\n    $event->{collection}[] = {new_type}::class;\n}});",
            owner = owner,
            name = self.event_name,
            event = event,
            collection = self.collection,
            new_type = new_type,
        )
    }
}

impl Recipe for EventHandlerRegistration {
    fn id(&self) -> &'static str {
        "event-handler"
    }

    fn apply(&self, draft: &mut Draft) -> AstResult<EditOutcome> {
        let event_alias = draft.ensure_import(EVENT_CLASS, None)?;
        let owner = draft.ensure_import(&self.owner_class, None)?;
        let event = draft.ensure_import(&self.event_class, None)?;
        let new_type = draft.ensure_import(&self.type_class, None)?;
        let mut code = self.handler(&owner, &event, &new_type);
        if event_alias != "Event" {
            code = code.replacen("Event::on(", &format!("{}::on(", event_alias), 1);
        }

        draft.edit_method(HANDLER_METHOD, |method| {
            if body_contains(method, &code) {
                debug!(method = HANDLER_METHOD, "Handler already registered");
                return EditOutcome::Applied;
            }
            append_statement_to_method(method, &code)
        })
    }

    fn follow_up(&self, target: &str, reason: &str) -> FollowUp {
        let imports = [
            EVENT_CLASS,
            self.owner_class.as_str(),
            self.event_class.as_str(),
            self.type_class.as_str(),
        ]
        .iter()
        .map(|fqn| format!("use {};", fqn))
        .collect::<Vec<_>>()
        .join("\n");
        let handler = self.handler(
            class_name(&self.owner_class),
            class_name(&self.event_class),
            class_name(&self.type_class),
        );
        FollowUp::new(format!(
            "Register `{}` manually ({})",
            class_name(&self.type_class),
            reason
        ))
        .code_step(
            format!("Register it by adding the following code to `{}`:", target),
            format!("{}\n\n{}", imports, handler),
        )
        .step(format!(
            "Place the `Event::on()` call in `{}()`, or wherever the module attaches its event handlers.",
            HANDLER_METHOD
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run;
    use graft_ast::Workspace;
    use pretty_assertions::assert_eq;

    const PLUGIN: &str = r#"<?php

namespace acme\shop;

use Craft;
use craft\base\Plugin as BasePlugin;

class Plugin extends BasePlugin
{
    private function attachEventHandlers(): void
    {
        // Register event handlers here ...
        // (see https://craftcms.com/docs/5.x/extend/events.html to get started)
    }
}
"#;

    fn registration() -> EventHandlerRegistration {
        EventHandlerRegistration::new(
            "craft\\console\\controllers\\MakeController",
            "EVENT_REGISTER_GENERATOR_TYPES",
            "craft\\events\\RegisterComponentTypesEvent",
            "acme\\shop\\generators\\Widget",
        )
        .unwrap()
    }

    #[test]
    fn test_appends_handler_with_imports() {
        let mut workspace = Workspace::from_source(PLUGIN).unwrap();
        let outcome = run(&registration(), &mut workspace, "src/Plugin.php").unwrap();

        assert!(outcome.patched);
        assert_eq!(
            outcome.preview.unwrap(),
            r#"<?php

namespace acme\shop;

use Craft;
use craft\base\Plugin as BasePlugin;
use yii\base\Event;
use craft\console\controllers\MakeController;
use craft\events\RegisterComponentTypesEvent;
use acme\shop\generators\Widget;

class Plugin extends BasePlugin
{
    private function attachEventHandlers(): void
    {
        // Register event handlers here ...
        // (see https://craftcms.com/docs/5.x/extend/events.html to get started)
        Event::on(MakeController::class, MakeController::EVENT_REGISTER_GENERATOR_TYPES, function(RegisterComponentTypesEvent $event) {
            $event->types[] = Widget::class;
        });
    }
}
"#
        );
    }

    #[test]
    fn test_handler_is_not_added_twice() {
        let mut workspace = Workspace::from_source(PLUGIN).unwrap();
        let first = run(&registration(), &mut workspace, "src/Plugin.php")
            .unwrap()
            .preview
            .unwrap();

        let mut again = Workspace::from_source(first.as_str()).unwrap();
        let second = run(&registration(), &mut again, "src/Plugin.php").unwrap();
        assert_eq!(second.preview.unwrap(), first);
    }

    #[test]
    fn test_missing_handler_method_gets_follow_up() {
        let source = "<?php\nnamespace acme;\n\nclass Module extends BaseModule\n{\n}\n";
        let mut workspace = Workspace::from_source(source).unwrap();
        let outcome = run(&registration(), &mut workspace, "src/Module.php").unwrap();

        assert!(!outcome.patched);
        assert_eq!(workspace.render(), source);
        let code = outcome.follow_up.unwrap().steps[0].code.clone().unwrap();
        assert!(code.starts_with("use yii\\base\\Event;\nuse craft\\console\\controllers\\MakeController;"));
        assert!(code.ends_with("    $event->types[] = Widget::class;\n});"));
    }

    #[test]
    fn test_custom_collection() {
        let custom = registration().with_collection("generators").unwrap();
        assert!(custom
            .handler("A", "B", "C")
            .contains("$event->generators[] = C::class;"));
        assert!(registration().with_collection("not valid").is_err());
    }
}
