//! Deriving a new class from a base type descriptor.

use crate::descriptor::{MethodInfo, ParamInfo, TypeDescriptor};
use crate::error::{SynthError, SynthResult};
use crate::generated::GeneratedType;
use crate::selection::{MemberSelection, MemberSpec};
use graft_ast::names::{class_name, map_type_parts, namespace_of, normalize_class};
use graft_ast::syntax::{
    Block, ClassDecl, ConstantDecl, Member, MethodDecl, Param, PropertyDecl, Stmt,
};
use graft_ast::{ClassKind, Expr, ImportTable, MAX_ALIAS_ATTEMPTS};
use tracing::debug;

/// Prefix for the base alias when the new type shares the base's short name
pub const DEFAULT_BASE_ALIAS_PREFIX: &str = "Base";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthOptions {
    pub base_alias_prefix: String,
    pub max_alias_attempts: usize,
}

impl Default for SynthOptions {
    fn default() -> Self {
        Self {
            base_alias_prefix: DEFAULT_BASE_ALIAS_PREFIX.to_string(),
            max_alias_attempts: MAX_ALIAS_ATTEMPTS,
        }
    }
}

/// Build `new_name` (fully qualified) as a subclass of `base` with the
/// selected members, using default options
pub fn synthesize(
    new_name: &str,
    base: &TypeDescriptor,
    selection: MemberSelection,
) -> SynthResult<GeneratedType> {
    Synthesizer::default().synthesize(new_name, base, selection)
}

#[derive(Debug, Clone, Default)]
pub struct Synthesizer {
    options: SynthOptions,
}

impl Synthesizer {
    pub fn new(options: SynthOptions) -> Self {
        Self { options }
    }

    pub fn synthesize(
        &self,
        new_name: &str,
        base: &TypeDescriptor,
        selection: MemberSelection,
    ) -> SynthResult<GeneratedType> {
        let fqn = normalize_class(new_name)?;
        let short = class_name(&fqn).to_string();
        let mut imports =
            ImportTable::new(namespace_of(&fqn)).with_max_attempts(self.options.max_alias_attempts);
        imports.declare(&fqn);

        // `Plugin extends Plugin` must import the base under another name
        let preferred = short
            .eq_ignore_ascii_case(base.short_name())
            .then(|| format!("{}{}", self.options.base_alias_prefix, base.short_name()));
        let base_alias = imports.ensure(&base.name, preferred.as_deref())?.alias;
        debug!(class = %fqn, base = %base.name, alias = %base_alias, "Resolved base reference");

        let mut class = ClassDecl::new(ClassKind::Class, short);
        class.extends.push(base_alias.clone());

        let mut ctx = Context {
            imports: &mut imports,
            base,
        };
        for (name, spec) in &selection.constants {
            class.members.push(ctx.constant(name, spec)?);
        }
        for (name, spec) in &selection.properties {
            class.members.push(ctx.property(name, spec)?);
        }
        for (name, spec) in &selection.methods {
            class.members.push(ctx.method(name, spec)?);
        }

        debug!(
            class = %fqn,
            members = class.members.len(),
            imports = imports.imports().count(),
            "Synthesized class"
        );
        Ok(GeneratedType::new(fqn, class, imports, base_alias))
    }
}

struct Context<'a> {
    imports: &'a mut ImportTable,
    base: &'a TypeDescriptor,
}

impl Context<'_> {
    fn constant(&mut self, name: &str, spec: &MemberSpec) -> SynthResult<Member> {
        let base = self.base;
        let info = base
            .constants
            .get(name)
            .ok_or_else(|| SynthError::lookup("constant", name, &base.name))?;
        let value = match spec {
            MemberSpec::Copy => info.value.clone(),
            MemberSpec::Replace(text) => text.clone(),
        };
        let mut decl = ConstantDecl::new(info.visibility.to_modifiers(), name, Expr::raw(value));
        decl.type_hint = self.type_hint(info.type_hint.as_deref())?;
        Ok(Member::Constant(decl))
    }

    fn property(&mut self, name: &str, spec: &MemberSpec) -> SynthResult<Member> {
        let name = name.trim_start_matches('$');
        let base = self.base;
        let info = base
            .properties
            .get(name)
            .ok_or_else(|| SynthError::lookup("property", name, &base.name))?;
        let default = match spec {
            MemberSpec::Copy => info.default.clone(),
            MemberSpec::Replace(text) => Some(text.clone()),
        };
        let mut modifiers = info.visibility.to_modifiers();
        modifiers.is_static = info.is_static;
        modifiers.is_readonly = info.is_readonly;
        let type_hint = self.type_hint(info.type_hint.as_deref())?;
        Ok(Member::Property(PropertyDecl::new(
            modifiers,
            type_hint,
            name,
            default.map(Expr::raw),
        )))
    }

    fn method(&mut self, name: &str, spec: &MemberSpec) -> SynthResult<Member> {
        let base = self.base;
        let (declared, info) = base
            .method(name)
            .ok_or_else(|| SynthError::lookup("method", name, &base.name))?;
        let mut method = self.signature(declared, info)?;
        if let MemberSpec::Replace(body) = spec {
            let body = body.trim_matches('\n').trim_end();
            if !body.trim().is_empty() {
                method.body = Some(Block::new(vec![Stmt::raw(body)]));
            }
        }
        Ok(Member::Method(method))
    }

    /// Copied signature with an empty body
    fn signature(&mut self, name: &str, info: &MethodInfo) -> SynthResult<MethodDecl> {
        let mut modifiers = info.visibility.to_modifiers();
        modifiers.is_static = info.is_static;
        let mut method = MethodDecl::new(modifiers, name);
        method.by_ref = info.by_ref;
        method.return_type = self.type_hint(info.return_type.as_deref())?;
        method.params = info
            .params
            .iter()
            .map(|param| self.param(param))
            .collect::<SynthResult<_>>()?;
        Ok(method)
    }

    fn param(&mut self, info: &ParamInfo) -> SynthResult<Param> {
        let mut param = Param::new(self.type_hint(info.type_hint.as_deref())?, &info.name);
        param.by_ref = info.by_ref;
        param.variadic = info.variadic;
        param.default = info.default.clone().map(Expr::raw);
        Ok(param)
    }

    /// Fully qualified class names in the hint are imported and replaced by
    /// their alias
    fn type_hint(&mut self, hint: Option<&str>) -> SynthResult<Option<String>> {
        let Some(hint) = hint else { return Ok(None) };
        let mut failure = None;
        let mapped = map_type_parts(hint, |part| match part.strip_prefix('\\') {
            Some(fqn) if failure.is_none() => match self.imports.ensure(fqn, None) {
                Ok(ensured) => ensured.alias,
                Err(e) => {
                    failure = Some(e);
                    part.to_string()
                }
            },
            _ => part.to_string(),
        });
        match failure {
            Some(e) => Err(e.into()),
            None => Ok(Some(mapped)),
        }
    }
}
