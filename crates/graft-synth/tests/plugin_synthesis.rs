//! Synthesizing plugin classes from a described base

use graft_ast::{parse, SourceFile};
use graft_synth::{describe, synthesize, MemberSelection, MemberSpec, TypeDescriptor};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

const BASE_PLUGIN: &str = r#"<?php
namespace craft\base;

use Craft;
use yii\base\Module;

class Plugin extends Module implements PluginInterface
{
    public string $schemaVersion = '1.0.0';
    public bool $hasCpSettings = false;

    public static function config(): array
    {
        return [];
    }

    public function init(): void
    {
        parent::init();
        Craft::info('init');
    }

    protected function createSettingsModel(): ?Model
    {
        return null;
    }

    protected function settingsHtml(): ?string
    {
        return null;
    }
}
"#;

fn base() -> TypeDescriptor {
    describe(&parse(BASE_PLUGIN).unwrap(), "craft\\base\\Plugin").unwrap()
}

fn plugin_selection() -> MemberSelection {
    MemberSelection::new()
        .property("schemaVersion", MemberSpec::Copy)
        .property("hasCpSettings", MemberSpec::Replace("true".into()))
        .replace_method(
            "config",
            "return [\n    'components' => [\n        // Define component configs here...\n    ],\n];",
        )
        .replace_method(
            "init",
            "parent::init();\n\n// Defer most setup tasks until Craft is fully initialized\nCraft::$app->onInit(function() {\n    $this->attachEventHandlers();\n    // ...\n});",
        )
        .copy_method("createSettingsModel")
}

#[test]
fn test_plugin_named_plugin_extends_aliased_base() {
    let mut generated = synthesize("acme\\shop\\Plugin", &base(), plugin_selection()).unwrap();
    generated.import("Craft", None).unwrap();
    generated
        .set_doc("Shop plugin\n\n@method static Plugin getInstance()")
        .add_doc_line("@author Acme");
    let mut attach = graft_ast::MethodDecl::new(
        graft_ast::syntax::Modifiers::with_visibility(graft_ast::Visibility::Private),
        "attachEventHandlers",
    );
    attach.return_type = Some("void".into());
    generated.add_method(attach);

    let rendered = generated.render();
    assert_eq!(
        rendered,
        r#"<?php

namespace acme\shop;

use craft\base\Plugin as BasePlugin;
use craft\base\Model;
use Craft;

/**
 * Shop plugin
 *
 * @method static Plugin getInstance()
 * @author Acme
 */
class Plugin extends BasePlugin
{
    public string $schemaVersion = '1.0.0';

    public bool $hasCpSettings = true;

    public static function config(): array
    {
        return [
            'components' => [
                // Define component configs here...
            ],
        ];
    }

    public function init(): void
    {
        parent::init();

        // Defer most setup tasks until Craft is fully initialized
        Craft::$app->onInit(function() {
            $this->attachEventHandlers();
            // ...
        });
    }

    protected function createSettingsModel(): ?Model
    {
    }

    private function attachEventHandlers(): void
    {
    }
}
"#
    );

    // the base is only ever referenced through its alias
    let file: SourceFile = parse(&rendered).unwrap();
    let class = file.classes().next().unwrap();
    assert_eq!(class.extends, vec!["BasePlugin"]);
    assert!(!rendered.contains("use craft\\base\\Plugin;"));
    assert!(!rendered.contains("extends Plugin"));
}

#[test]
fn test_descriptor_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plugin.json");
    fs::write(&path, base().to_json().unwrap()).unwrap();

    let loaded = TypeDescriptor::load(&path).unwrap();
    assert_eq!(loaded, base());

    let selection_path = dir.path().join("selection.toml");
    fs::write(&selection_path, "[methods]\ninit = \"copy\"\n").unwrap();
    let selection = MemberSelection::load(&selection_path).unwrap();
    let generated = synthesize("acme\\Shop", &loaded, selection).unwrap();
    assert_eq!(generated.base_reference(), "Plugin");
    assert!(generated
        .render()
        .contains("class Shop extends Plugin\n{\n    public function init(): void\n    {\n    }\n}"));
}
