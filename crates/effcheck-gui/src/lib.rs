//! # Effcheck GUI
//!
//! The GUI effect system on top of `effcheck-core`: code that touches the
//! user interface must run on the UI thread, so it carries `UIEffect`, and
//! everything else carries `SafeEffect`.
//!
//! - Methods default to their type's effect: `UIEffect` in `@UIType` types,
//!   `SafeEffect` elsewhere. Explicit annotations win.
//! - With `flagUIfields`, touching a UI field also needs `UIEffect`
//!   and is reported as [`FIELD_ACCESS_INVALID_UI`].
//!
//! ```rust
//! use effcheck_core::prelude::*;
//! use effcheck_gui::{GuiEffectChecker, GuiOptions};
//!
//! let checker = GuiEffectChecker::new(GuiOptions::default()).unwrap();
//! let ui = checker.effects().ui;
//!
//! let mut table = checker.effects().declarations();
//! table.declare_type(TypeId(0), None).declare_method(MethodId(0), TypeId(0), None);
//! table.declare_external(MethodId(1), Some(ui));
//!
//! let mut b = TreeBuilder::new();
//! let call = b.call(MethodId(1), vec![]);
//! let method = MethodDecl::new(MethodId(0), "onClick", vec![Stmt::Expr(call)]);
//! let unit = CompilationUnit {
//!     name: "Handler".into(),
//!     types: vec![TypeDecl::new(TypeId(0), "Handler", vec![Member::Method(method)])],
//! };
//!
//! let diagnostics = checker.check(&unit, &table).unwrap();
//! assert_eq!(diagnostics[0].message, CALL_INVALID);
//! ```

mod extension;
mod options;

pub use extension::{GuiEffectExtension, UiFields, FIELD_ACCESS_INVALID_UI};
pub use options::GuiOptions;

use effcheck_core::tree::CompilationUnit;
use effcheck_core::{
    DeclarationTable, Diagnostic, EffectChecker, EffectError, EffectLattice, EffectTag,
    LatticeError, SymbolResolver,
};
use tracing::debug;

/// The two-point GUI lattice, `SafeEffect ≤ UIEffect`
#[derive(Debug, Clone)]
pub struct GuiEffects {
    pub lattice: EffectLattice,
    pub safe: EffectTag,
    pub ui: EffectTag,
}

impl GuiEffects {
    pub fn new() -> Result<Self, LatticeError> {
        let lattice = EffectLattice::chain(["SafeEffect", "UIEffect"])?;
        let safe = lattice.lookup("SafeEffect")?;
        let ui = lattice.lookup("UIEffect")?;
        Ok(Self { lattice, safe, ui })
    }

    /// Declaration table whose undeclared types and methods are safe
    ///
    /// Declare `@UIType` types with `Some(self.ui)` as their default.
    pub fn declarations(&self) -> DeclarationTable {
        DeclarationTable::new(self.safe)
    }
}

pub struct GuiEffectChecker {
    effects: GuiEffects,
    fields: UiFields,
    options: GuiOptions,
}

impl GuiEffectChecker {
    pub fn new(options: GuiOptions) -> Result<Self, LatticeError> {
        Ok(Self {
            effects: GuiEffects::new()?,
            fields: UiFields::new(),
            options,
        })
    }

    pub fn effects(&self) -> &GuiEffects {
        &self.effects
    }

    pub fn options(&self) -> &GuiOptions {
        &self.options
    }

    /// UI fields consulted when `flagUIfields` is on
    pub fn fields_mut(&mut self) -> &mut UiFields {
        &mut self.fields
    }

    pub fn check<R>(
        &self,
        unit: &CompilationUnit,
        resolver: &R,
    ) -> Result<Vec<Diagnostic>, EffectError>
    where
        R: SymbolResolver + ?Sized,
    {
        self.check_units(std::slice::from_ref(unit), resolver)
    }

    /// Check several units with one declared-effect cache
    pub fn check_units<R>(
        &self,
        units: &[CompilationUnit],
        resolver: &R,
    ) -> Result<Vec<Diagnostic>, EffectError>
    where
        R: SymbolResolver + ?Sized,
    {
        let extension =
            GuiEffectExtension::new(&self.effects, &self.fields, self.options.flag_ui_fields);
        let config = self.options.checker.clone();
        let mut checker = EffectChecker::new(&self.effects.lattice, &extension, config);
        let mut diagnostics = Vec::new();
        for unit in units {
            let stats = checker.check(unit, resolver, &mut diagnostics)?;
            debug!(
                unit = %unit.name,
                errors = stats.errors,
                suppressed = stats.suppressed,
                "checked GUI effects"
            );
        }
        Ok(diagnostics)
    }
}
