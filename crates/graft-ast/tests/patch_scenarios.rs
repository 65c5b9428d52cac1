//! End-to-end patch scenarios against realistic plugin sources

use graft_ast::edits::{
    append_doc_line, first_return_value, merge_into_array_literal, MergeEntries,
};
use graft_ast::{parse, EditOutcome, Expr, PatchResult, Workspace};
use pretty_assertions::assert_eq;

fn components_log() -> MergeEntries {
    MergeEntries::new().nested(
        "components",
        MergeEntries::new().entry("log", Expr::class_ref("LogService")),
    )
}

#[test]
fn test_merge_into_inline_components_array() {
    let source = "<?php\nreturn ['components' => ['cache' => CacheService::class]];\n";
    let mut workspace = Workspace::from_source(source).unwrap();
    let result = workspace
        .apply(|draft| {
            let value = first_return_value(&mut draft.file_mut().stmts);
            Ok(value.map_or(EditOutcome::not_applicable("no return"), |value| {
                merge_into_array_literal(value, &components_log())
            }))
        })
        .unwrap();

    assert_eq!(
        result,
        PatchResult::Applied(
            "<?php\nreturn ['components' => ['cache' => CacheService::class, 'log' => LogService::class]];\n"
                .to_string()
        )
    );
}

#[test]
fn test_merge_into_call_is_not_applicable() {
    let source = "<?php\nreturn $this->buildConfig();\n";
    let mut workspace = Workspace::from_source(source).unwrap();
    let result = workspace
        .apply(|draft| {
            let value = first_return_value(&mut draft.file_mut().stmts);
            Ok(value.map_or(EditOutcome::not_applicable("no return"), |value| {
                merge_into_array_literal(value, &components_log())
            }))
        })
        .unwrap();

    assert!(!result.is_applied());
    assert_eq!(workspace.render(), source);
}

#[test]
fn test_module_config_method_patch() {
    let source = r#"<?php
/**
 * @link      https://example.com
 */

namespace acme\shop;

use Craft;
use craft\base\Plugin as BasePlugin;

/**
 * Shop plugin
 *
 * @method static Shop getInstance()
 */
class Shop extends BasePlugin
{
    public string $schemaVersion = '1.0.0';

    public static function config(): array
    {
        // keep this comment
        return [
            'components' => [
                'cart'=>CartService::class, // trailing note
            ],
        ];
    }

    public function init(): void
    {
        parent::init();
    }
}
"#;
    let mut workspace = Workspace::from_source(source).unwrap();
    let result = workspace
        .apply(|draft| {
            let alias = draft.ensure_import("acme\\shop\\services\\Payments", None)?;
            let entries = MergeEntries::new().nested(
                "components",
                MergeEntries::new().entry("payments", Expr::class_ref(alias.clone())),
            );
            let merged = draft.edit_method("config", |method| {
                let Some(body) = method.body.as_mut() else {
                    return EditOutcome::not_applicable("abstract config()");
                };
                match first_return_value(&mut body.stmts) {
                    Some(value) => merge_into_array_literal(value, &entries),
                    None => EditOutcome::not_applicable("config() has no return"),
                }
            })?;
            if !merged.is_applied() {
                return Ok(merged);
            }
            let class = draft.primary_class_mut().ok_or_else(|| {
                graft_ast::AstError::transformation("no class")
            })?;
            Ok(append_doc_line(class, &format!("@property-read {} $payments", alias)))
        })
        .unwrap();

    assert_eq!(
        result.source().unwrap(),
        r#"<?php
/**
 * @link      https://example.com
 */

namespace acme\shop;

use Craft;
use craft\base\Plugin as BasePlugin;
use acme\shop\services\Payments;

/**
 * Shop plugin
 *
 * @method static Shop getInstance()
 * @property-read Payments $payments
 */
class Shop extends BasePlugin
{
    public string $schemaVersion = '1.0.0';

    public static function config(): array
    {
        // keep this comment
        return [
            'components' => [
                'cart'=>CartService::class, // trailing note
                'payments' => Payments::class,
            ],
        ];
    }

    public function init(): void
    {
        parent::init();
    }
}
"#
    );
}

#[test]
fn test_only_first_method_named_run_is_edited() {
    let source = "<?php\nclass Jobs\n{\n    public function run(): void\n    {\n    }\n\n    public function runOther(): void\n    {\n    }\n}\n";
    let mut workspace = Workspace::from_source(source).unwrap();
    let mut calls = 0;
    workspace
        .apply(|draft| {
            draft.edit_method("run", |method| {
                calls += 1;
                graft_ast::edits::append_statement_to_method(method, "$this->step();")
            })
        })
        .unwrap();

    assert_eq!(calls, 1);
    assert_eq!(
        workspace.render(),
        "<?php\nclass Jobs\n{\n    public function run(): void\n    {\n        $this->step();\n    }\n\n    public function runOther(): void\n    {\n    }\n}\n"
    );
}

#[test]
fn test_untouched_regions_survive_odd_formatting() {
    let source = "<?php\r\n\r\nnamespace  app ;\r\n\r\nreturn array(\r\n\t'modules'   =>   array( ),\r\n\t'bootstrap' => ['debug'],\r\n);\r\n";
    let mut file = parse(source).unwrap();
    assert_eq!(file.render(), source);

    let value = first_return_value(file.scope_stmts_mut()).unwrap();
    let entries = MergeEntries::new()
        .nested("bootstrap", MergeEntries::new().push(Expr::string("shop")));
    assert!(merge_into_array_literal(value, &entries).is_applied());
    assert_eq!(
        file.render(),
        "<?php\r\n\r\nnamespace  app ;\r\n\r\nreturn array(\r\n\t'modules'   =>   array( ),\r\n\t'bootstrap' => ['debug', 'shop'],\r\n);\r\n"
    );
}

#[test]
fn test_crlf_file_keeps_its_line_endings() {
    let source = "<?php\r\nnamespace app;\r\n\r\nuse Craft;\r\n\r\nclass Module\r\n{\r\n    public static function config(): array\r\n    {\r\n        return [\r\n            'components' => [\r\n                'cache' => C::class,\r\n            ],\r\n        ];\r\n    }\r\n\r\n    public function init(): void\r\n    {\r\n        parent::init();\r\n    }\r\n}\r\n";
    let mut workspace = Workspace::from_source(source).unwrap();
    let result = workspace
        .apply(|draft| {
            let alias = draft.ensure_import("app\\services\\Log", None)?;
            let entries = MergeEntries::new().nested(
                "components",
                MergeEntries::new().entry("log", Expr::class_ref(alias)),
            );
            let merged = draft.edit_method("config", |method| {
                match method.body.as_mut().and_then(|body| first_return_value(&mut body.stmts)) {
                    Some(value) => merge_into_array_literal(value, &entries),
                    None => EditOutcome::not_applicable("config() has no return"),
                }
            })?;
            if !merged.is_applied() {
                return Ok(merged);
            }
            draft.edit_method("init", |method| {
                graft_ast::edits::append_statement_to_method(method, "if ($x) {\n    $y();\n}")
            })
        })
        .unwrap();

    let patched = result.source().unwrap();
    assert_eq!(
        patched,
        "<?php\r\nnamespace app;\r\n\r\nuse Craft;\r\nuse app\\services\\Log;\r\n\r\nclass Module\r\n{\r\n    public static function config(): array\r\n    {\r\n        return [\r\n            'components' => [\r\n                'cache' => C::class,\r\n                'log' => Log::class,\r\n            ],\r\n        ];\r\n    }\r\n\r\n    public function init(): void\r\n    {\r\n        parent::init();\r\n        if ($x) {\r\n            $y();\r\n        }\r\n    }\r\n}\r\n"
    );
    assert_eq!(patched.matches('\n').count(), patched.matches("\r\n").count());
}
