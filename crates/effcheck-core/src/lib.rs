//! # Effcheck Core
//!
//! Extensible effect checking over a small object-oriented syntax model.
//!
//! Methods and types carry effects drawn from a partially ordered
//! [`EffectLattice`]. The [`EffectChecker`] walks a [`CompilationUnit`],
//! keeps the effect permitted at each point on a scoped stack, and reports a
//! [`Diagnostic`] whenever a call, constructor invocation or extension-checked
//! construct requires an effect that is not below the permitted one.
//!
//! ## Modules
//!
//! - **[`lattice`]** - Effect tags and their precomputed order
//! - **[`tree`]** - Syntax model, [`Visitor`] and [`TreeBuilder`]
//! - **[`symbols`]** - Declared effects of methods and types
//! - **[`extension`]** - Per-construct hooks a type system plugs in
//! - **[`checker`]** - The scoped traversal engine
//! - **[`config`]** - Suppression lists and checker options
//! - **[`dataflow`]** - Control-flow blocks, flow rules and a fixpoint solver
//!
//! ## Quick Start
//!
//! ```rust
//! use effcheck_core::prelude::*;
//!
//! let lattice = EffectLattice::chain(["SafeEffect", "UIEffect"]).unwrap();
//! let safe = lattice.lookup("SafeEffect").unwrap();
//! let ui = lattice.lookup("UIEffect").unwrap();
//!
//! let mut b = TreeBuilder::new();
//! let call = b.call(MethodId(1), vec![]);
//! let method = MethodDecl::new(MethodId(0), "run", vec![Stmt::Expr(call)]);
//! let unit = CompilationUnit {
//!     name: "Main".into(),
//!     types: vec![TypeDecl::new(TypeId(0), "Main", vec![Member::Method(method)])],
//! };
//!
//! let mut table = DeclarationTable::new(safe);
//! table.declare_type(TypeId(0), None);
//! table.declare_method(MethodId(0), TypeId(0), None);
//! table.declare_external(MethodId(1), Some(ui));
//!
//! let mut checker = EffectChecker::new(&lattice, &NoChecks, CheckerConfig::default());
//! let mut diagnostics = Vec::new();
//! checker.check(&unit, &table, &mut diagnostics).unwrap();
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].message, CALL_INVALID);
//! ```

pub mod checker;
pub mod config;
pub mod dataflow;
pub mod diagnostics;
pub mod error;
pub mod extension;
pub mod lattice;
mod scope;
pub mod symbols;
pub mod tree;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::checker::{CheckStats, EffectChecker};
    pub use crate::config::{CheckerConfig, SuppressionConfig};
    pub use crate::diagnostics::{
        Diagnostic, DiagnosticSink, Severity, CALL_INVALID, CONSTRUCTOR_CALL_INVALID,
        OVERRIDE_INVALID,
    };
    pub use crate::error::{CfgError, ConfigError, EffectError, LatticeError};
    pub use crate::extension::{CheckKind, EffectExtension, NoChecks, DEFAULT_ERROR_KEY};
    pub use crate::lattice::{EffectLattice, EffectLatticeBuilder, EffectTag};
    pub use crate::symbols::{DeclarationTable, SymbolResolver};
    pub use crate::tree::{
        CompilationUnit, Expr, ExprKind, FieldDecl, FieldId, Member, MethodDecl, MethodId, NodeId,
        Span, Stmt, TreeBuilder, TypeDecl, TypeId, Visitor,
    };
}

// Re-export main types at crate root for convenience
pub use checker::{CheckStats, EffectChecker};
pub use config::{CheckerConfig, SuppressionConfig};
pub use diagnostics::{Diagnostic, DiagnosticSink, Severity};
pub use error::{CfgError, ConfigError, EffectError, LatticeError};
pub use extension::{CheckKind, EffectExtension, NoChecks};
pub use lattice::{EffectLattice, EffectTag};
pub use symbols::{DeclarationTable, SymbolResolver};
