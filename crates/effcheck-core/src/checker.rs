//! Scoped effect checking pass
//!
//! [`EffectChecker`] walks one [`CompilationUnit`] at a time:
//! - Entering a type pushes the lattice bottom with no enclosing method, so
//!   static context is checked against the most restrictive effect
//! - Entering a method pushes its declared effect, computing and caching a
//!   default when nothing is written on the method
//! - Calls and constructions are always checked against the callee's declared
//!   effect; every other construct kind only when the extension activates it
//! - Outside any method the ambient effect is the enclosing type's default
//!
//! Violations become diagnostics and never stop the walk. An [`EffectError`]
//! (a tag outside the lattice) aborts the pass, and the scope guards still
//! leave the stacks empty.

use crate::config::CheckerConfig;
use crate::diagnostics::{
    Diagnostic, DiagnosticSink, Severity, CALL_INVALID, CONSTRUCTOR_CALL_INVALID, OVERRIDE_INVALID,
};
use crate::error::EffectError;
use crate::extension::{CheckKind, EffectExtension};
use crate::lattice::{EffectLattice, EffectTag};
use crate::scope::{ScopeFrame, ScopeGuard, ScopeStack};
use crate::symbols::SymbolResolver;
use crate::tree::{
    walk_expr, walk_method, walk_type, CompilationUnit, Expr, ExprKind, MethodDecl, MethodId,
    NodeId, Span, TypeDecl, Visitor,
};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Summary of one checking pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CheckStats {
    pub errors: usize,
    pub warnings: usize,
    /// Diagnostics dropped by the suppression configuration
    pub suppressed: usize,
    pub methods: usize,
    pub types: usize,
    /// Deepest nesting of type and method scopes reached
    pub max_depth: usize,
}

/// Effect checker bound to one lattice, extension and configuration
///
/// The declared-effect cache outlives individual passes, so a method's
/// effect is settled the first time it is asked for and never changes.
pub struct EffectChecker<'a, X: ?Sized> {
    lattice: &'a EffectLattice,
    extension: &'a X,
    config: CheckerConfig,
    declared: HashMap<MethodId, EffectTag>,
}

impl<'a, X: EffectExtension + ?Sized> EffectChecker<'a, X> {
    pub fn new(lattice: &'a EffectLattice, extension: &'a X, config: CheckerConfig) -> Self {
        Self {
            lattice,
            extension,
            config,
            declared: HashMap::new(),
        }
    }

    pub fn lattice(&self) -> &EffectLattice {
        self.lattice
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Check one unit, reporting violations to `sink`
    pub fn check<R, D>(
        &mut self,
        unit: &CompilationUnit,
        resolver: &R,
        sink: &mut D,
    ) -> Result<CheckStats, EffectError>
    where
        R: SymbolResolver + ?Sized,
        D: DiagnosticSink + ?Sized,
    {
        let stats = {
            let mut pass = CheckPass {
                checker: &mut *self,
                resolver,
                sink,
                scopes: ScopeStack::default(),
                stats: CheckStats::default(),
            };
            pass.visit_unit(unit)?;
            debug_assert_eq!(pass.scopes.depth(), 0);
            CheckStats { max_depth: pass.scopes.max_depth(), ..pass.stats }
        };

        if self.config.debug_spew {
            debug!(
                unit = %unit.name,
                errors = stats.errors,
                warnings = stats.warnings,
                suppressed = stats.suppressed,
                "finished effect check"
            );
        }
        Ok(stats)
    }

    /// Declared effect of a method, assigning its default on first use
    pub fn declared_effect<R>(
        &mut self,
        method: MethodId,
        resolver: &R,
    ) -> Result<EffectTag, EffectError>
    where
        R: SymbolResolver + ?Sized,
    {
        if let Some(&effect) = self.declared.get(&method) {
            return Ok(effect);
        }
        let effect = resolver
            .explicit_effect(method)
            .unwrap_or_else(|| resolver.default_method_effect(method));
        if !self.lattice.contains(effect) {
            return Err(EffectError::InvalidMethodEffect { method, tag: effect.raw() });
        }
        self.declared.insert(method, effect);
        Ok(effect)
    }
}

struct CheckPass<'p, 'a, X: ?Sized, R: ?Sized, D: ?Sized> {
    checker: &'p mut EffectChecker<'a, X>,
    resolver: &'p R,
    sink: &'p mut D,
    scopes: ScopeStack,
    stats: CheckStats,
}

impl<X: ?Sized, R: ?Sized, D: ?Sized> AsMut<ScopeStack> for CheckPass<'_, '_, X, R, D> {
    fn as_mut(&mut self) -> &mut ScopeStack {
        &mut self.scopes
    }
}

impl<X, R, D> CheckPass<'_, '_, X, R, D>
where
    X: EffectExtension + ?Sized,
    R: SymbolResolver + ?Sized,
    D: DiagnosticSink + ?Sized,
{
    fn effect_name(&self, effect: EffectTag) -> &str {
        self.checker.lattice.name(effect).unwrap_or("?")
    }

    /// Effect permitted at the current position
    fn ambient_effect(&self, node: NodeId) -> Result<EffectTag, EffectError> {
        if let (Some(_), Some(effect)) =
            (self.scopes.enclosing_method(), self.scopes.top_effect())
        {
            return Ok(effect);
        }
        let ty = self.scopes.enclosing_type().ok_or(EffectError::DetachedConstruct(node))?;
        let effect = self.resolver.type_default_effect(ty);
        if !self.checker.lattice.contains(effect) {
            return Err(EffectError::InvalidTypeEffect { ty, tag: effect.raw() });
        }
        Ok(effect)
    }

    fn is_invalid(&self, target: EffectTag, ambient: EffectTag) -> bool {
        let lattice = self.checker.lattice;
        let target = match &self.checker.config.suppression.ignore_effects {
            Some(ignored) => self.checker.extension.check_ignored_effects(ignored, target, lattice),
            None => target,
        };
        !lattice.le(target, ambient)
    }

    fn emit(
        &mut self,
        severity: Severity,
        message: String,
        target: EffectTag,
        ambient: EffectTag,
        span: Span,
        node: Option<NodeId>,
    ) {
        let suppression = &self.checker.config.suppression;
        let ignored = match severity {
            Severity::Error => suppression.ignore_errors.as_deref(),
            Severity::Warning => suppression.ignore_warnings.as_deref(),
        };
        if let Some(ignored) = ignored {
            if self.checker.extension.is_ignored(ignored, &message) {
                self.stats.suppressed += 1;
                trace!(%severity, message = %message, "suppressed diagnostic");
                return;
            }
        }

        match severity {
            Severity::Error => self.stats.errors += 1,
            Severity::Warning => self.stats.warnings += 1,
        }
        self.sink.report(Diagnostic { severity, message, target, ambient, span, node });
    }

    fn check_invocation(
        &mut self,
        node: &Expr,
        callee: MethodId,
        message: &str,
    ) -> Result<(), EffectError> {
        let target = self.checker.declared_effect(callee, self.resolver)?;
        let ambient = self.ambient_effect(node.id)?;
        if self.is_invalid(target, ambient) {
            self.emit(
                Severity::Error,
                message.to_string(),
                target,
                ambient,
                node.span,
                Some(node.id),
            );
        }
        Ok(())
    }

    fn check_construct(&mut self, node: &Expr, kind: CheckKind) -> Result<(), EffectError> {
        let extension = self.checker.extension;
        if !kind.is_active(extension) {
            return Ok(());
        }
        let target = kind.required_effect(extension, node, self.checker.lattice);
        if !self.checker.lattice.contains(target) {
            return Err(EffectError::InvalidConstructEffect { node: node.id, tag: target.raw() });
        }
        let ambient = self.ambient_effect(node.id)?;

        // A construct gets an error or a warning, never both
        if self.is_invalid(target, ambient) {
            let message = extension.report_error(node);
            self.emit(Severity::Error, message, target, ambient, node.span, Some(node.id));
        } else if let Some(message) = extension.report_warning(node) {
            self.emit(Severity::Warning, message, target, ambient, node.span, Some(node.id));
        }
        Ok(())
    }

    fn check_overrides(
        &mut self,
        method: &MethodDecl,
        effect: EffectTag,
    ) -> Result<(), EffectError> {
        for overridden in self.resolver.overridden_methods(method.id) {
            let overridden_effect = self.checker.declared_effect(overridden, self.resolver)?;
            if !self.checker.lattice.le(effect, overridden_effect) {
                self.emit(
                    Severity::Error,
                    OVERRIDE_INVALID.to_string(),
                    effect,
                    overridden_effect,
                    method.span,
                    None,
                );
            }
        }
        Ok(())
    }
}

impl<X, R, D> Visitor for CheckPass<'_, '_, X, R, D>
where
    X: EffectExtension + ?Sized,
    R: SymbolResolver + ?Sized,
    D: DiagnosticSink + ?Sized,
{
    type Error = EffectError;

    fn visit_type(&mut self, ty: &TypeDecl) -> Result<(), EffectError> {
        let bottom = self.checker.lattice.bottom_most_effect();
        self.stats.types += 1;
        let mut scope = ScopeGuard::enter(self, ScopeFrame::Type { ty: ty.id, bottom });
        walk_type(&mut *scope, ty)
    }

    fn visit_method(&mut self, method: &MethodDecl) -> Result<(), EffectError> {
        let effect = self.checker.declared_effect(method.id, self.resolver)?;
        self.check_overrides(method, effect)?;
        self.stats.methods += 1;

        if self.checker.config.debug_spew {
            debug!(
                method = %method.name,
                effect = self.effect_name(effect),
                "pushing method effect"
            );
        }
        let mut scope = ScopeGuard::enter(self, ScopeFrame::Method { method: method.id, effect });
        walk_method(&mut *scope, method)
    }

    fn visit_expr(&mut self, expr: &Expr) -> Result<(), EffectError> {
        match &expr.kind {
            ExprKind::Call { callee, .. } => self.check_invocation(expr, *callee, CALL_INVALID)?,
            ExprKind::New { constructor, .. } => {
                self.check_invocation(expr, *constructor, CONSTRUCTOR_CALL_INVALID)?
            }
            // Lambdas, member references and member selects have no check kind and are only walked
            _ => {
                if let Some(kind) = CheckKind::of(expr) {
                    self.check_construct(expr, kind)?;
                }
            }
        }
        walk_expr(self, expr)
    }
}
