//! Per-construct policy supplied by a concrete effect system
//!
//! Every hook has a no-op default: checks are inactive, required effects are
//! the lattice bottom, there are no warnings and suppression lists match
//! message keys and effect names literally. A concrete system overrides only
//! the construct kinds it cares about.
//!
//! Calls and object construction have no hooks here; the checker always
//! checks them against the callee's declared effect.

use crate::lattice::{EffectLattice, EffectTag};
use crate::tree::{Expr, ExprKind};

/// Message key used when an extension does not name its own
pub const DEFAULT_ERROR_KEY: &str = "effect.invalid";

/// Construct kinds gated by an extension activation flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckKind {
    ArrayAccess,
    Assignment,
    Binary,
    CompoundAssignment,
    ConditionalExpression,
    InstanceOf,
    Literal,
    NewArray,
    TypeCast,
    Unary,
}

impl CheckKind {
    /// Kind of the gated check for an expression, if it has one
    pub fn of(expr: &Expr) -> Option<Self> {
        match &expr.kind {
            ExprKind::ArrayAccess { .. } => Some(CheckKind::ArrayAccess),
            ExprKind::Assign { .. } => Some(CheckKind::Assignment),
            ExprKind::Binary { .. } => Some(CheckKind::Binary),
            ExprKind::CompoundAssign { .. } => Some(CheckKind::CompoundAssignment),
            ExprKind::Conditional { .. } => Some(CheckKind::ConditionalExpression),
            ExprKind::InstanceOf { .. } => Some(CheckKind::InstanceOf),
            ExprKind::Literal(_) => Some(CheckKind::Literal),
            ExprKind::NewArray { .. } => Some(CheckKind::NewArray),
            ExprKind::TypeCast { .. } => Some(CheckKind::TypeCast),
            ExprKind::Unary { .. } => Some(CheckKind::Unary),
            ExprKind::Call { .. }
            | ExprKind::New { .. }
            | ExprKind::Lambda { .. }
            | ExprKind::MemberReference { .. }
            | ExprKind::MemberSelect { .. }
            | ExprKind::Ident { .. } => None,
        }
    }

    pub fn is_active<X: EffectExtension + ?Sized>(self, extension: &X) -> bool {
        match self {
            CheckKind::ArrayAccess => extension.does_array_access_check(),
            CheckKind::Assignment => extension.does_assignment_check(),
            CheckKind::Binary => extension.does_binary_check(),
            CheckKind::CompoundAssignment => extension.does_compound_assignment_check(),
            CheckKind::ConditionalExpression => extension.does_conditional_expression_check(),
            CheckKind::InstanceOf => extension.does_instance_of_check(),
            CheckKind::Literal => extension.does_literal_check(),
            CheckKind::NewArray => extension.does_new_array_check(),
            CheckKind::TypeCast => extension.does_type_cast_check(),
            CheckKind::Unary => extension.does_unary_check(),
        }
    }

    pub fn required_effect<X: EffectExtension + ?Sized>(
        self,
        extension: &X,
        node: &Expr,
        lattice: &EffectLattice,
    ) -> EffectTag {
        match self {
            CheckKind::ArrayAccess => extension.check_array_access(node, lattice),
            CheckKind::Assignment => extension.check_assignment(node, lattice),
            CheckKind::Binary => extension.check_binary(node, lattice),
            CheckKind::CompoundAssignment => extension.check_compound_assignment(node, lattice),
            CheckKind::ConditionalExpression => {
                extension.check_conditional_expression(node, lattice)
            }
            CheckKind::InstanceOf => extension.check_instance_of(node, lattice),
            CheckKind::Literal => extension.check_literal(node, lattice),
            CheckKind::NewArray => extension.check_new_array(node, lattice),
            CheckKind::TypeCast => extension.check_type_cast(node, lattice),
            CheckKind::Unary => extension.check_unary(node, lattice),
        }
    }
}

/// Capability interface of a concrete effect system
pub trait EffectExtension {
    fn does_array_access_check(&self) -> bool {
        false
    }

    fn does_assignment_check(&self) -> bool {
        false
    }

    fn does_binary_check(&self) -> bool {
        false
    }

    fn does_compound_assignment_check(&self) -> bool {
        false
    }

    fn does_conditional_expression_check(&self) -> bool {
        false
    }

    fn does_instance_of_check(&self) -> bool {
        false
    }

    fn does_literal_check(&self) -> bool {
        false
    }

    fn does_new_array_check(&self) -> bool {
        false
    }

    fn does_type_cast_check(&self) -> bool {
        false
    }

    fn does_unary_check(&self) -> bool {
        false
    }

    fn check_array_access(&self, _node: &Expr, lattice: &EffectLattice) -> EffectTag {
        lattice.bottom_most_effect()
    }

    fn check_assignment(&self, _node: &Expr, lattice: &EffectLattice) -> EffectTag {
        lattice.bottom_most_effect()
    }

    fn check_binary(&self, _node: &Expr, lattice: &EffectLattice) -> EffectTag {
        lattice.bottom_most_effect()
    }

    fn check_compound_assignment(&self, _node: &Expr, lattice: &EffectLattice) -> EffectTag {
        lattice.bottom_most_effect()
    }

    fn check_conditional_expression(&self, _node: &Expr, lattice: &EffectLattice) -> EffectTag {
        lattice.bottom_most_effect()
    }

    fn check_instance_of(&self, _node: &Expr, lattice: &EffectLattice) -> EffectTag {
        lattice.bottom_most_effect()
    }

    fn check_literal(&self, _node: &Expr, lattice: &EffectLattice) -> EffectTag {
        lattice.bottom_most_effect()
    }

    fn check_new_array(&self, _node: &Expr, lattice: &EffectLattice) -> EffectTag {
        lattice.bottom_most_effect()
    }

    fn check_type_cast(&self, _node: &Expr, lattice: &EffectLattice) -> EffectTag {
        lattice.bottom_most_effect()
    }

    fn check_unary(&self, _node: &Expr, lattice: &EffectLattice) -> EffectTag {
        lattice.bottom_most_effect()
    }

    /// Message key reported when `node` violates the ambient effect
    fn report_error(&self, _node: &Expr) -> String {
        DEFAULT_ERROR_KEY.to_string()
    }

    /// Message key of a caution for a permitted `node`, if any
    fn report_warning(&self, _node: &Expr) -> Option<String> {
        None
    }

    /// Rewrite a required effect before comparison while effects are ignored
    ///
    /// By default an effect whose name is listed is treated as the bottom,
    /// which every ambient effect permits.
    fn check_ignored_effects(
        &self,
        ignored: &[String],
        effect: EffectTag,
        lattice: &EffectLattice,
    ) -> EffectTag {
        match lattice.name(effect) {
            Some(name) if ignored.iter().any(|entry| entry == name) => lattice.bottom_most_effect(),
            _ => effect,
        }
    }

    /// Whether a message key is listed for suppression
    fn is_ignored(&self, ignored: &[String], message: &str) -> bool {
        ignored.iter().any(|entry| entry == message)
    }
}

/// Extension with every hook left at its default
#[derive(Debug, Default, Clone, Copy)]
pub struct NoChecks;

impl EffectExtension for NoChecks {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{BinaryOp, TreeBuilder};

    struct BinaryOnly;

    impl EffectExtension for BinaryOnly {
        fn does_binary_check(&self) -> bool {
            true
        }

        fn check_binary(&self, _node: &Expr, lattice: &EffectLattice) -> EffectTag {
            lattice.lookup("Top").unwrap_or(lattice.bottom_most_effect())
        }
    }

    #[test]
    fn test_defaults_are_inert() {
        let lattice = EffectLattice::chain(["Bottom", "Top"]).unwrap();
        let mut b = TreeBuilder::new();
        let lit = b.int(1);

        assert!(!CheckKind::Literal.is_active(&NoChecks));
        let required = CheckKind::Literal.required_effect(&NoChecks, &lit, &lattice);
        assert_eq!(required, lattice.bottom_most_effect());
        assert_eq!(NoChecks.report_error(&lit), DEFAULT_ERROR_KEY);
        assert_eq!(NoChecks.report_warning(&lit), None);
    }

    #[test]
    fn test_dispatch_reaches_override() {
        let lattice = EffectLattice::chain(["Bottom", "Top"]).unwrap();
        let mut b = TreeBuilder::new();
        let one = b.int(1);
        let two = b.int(2);
        let sum = b.binary(BinaryOp::Add, one, two);

        let kind = CheckKind::of(&sum).unwrap();
        assert_eq!(kind, CheckKind::Binary);
        assert!(kind.is_active(&BinaryOnly));
        let required = kind.required_effect(&BinaryOnly, &sum, &lattice);
        assert_eq!(required, lattice.lookup("Top").unwrap());
    }

    #[test]
    fn test_calls_have_no_gated_kind() {
        let mut b = TreeBuilder::new();
        let call = b.call(crate::tree::MethodId(0), vec![]);
        assert_eq!(CheckKind::of(&call), None);
    }

    #[test]
    fn test_default_ignore_rewrites_listed_effects_to_bottom() {
        let lattice = EffectLattice::chain(["Bottom", "Mid", "Top"]).unwrap();
        let top = lattice.lookup("Top").unwrap();
        let mid = lattice.lookup("Mid").unwrap();
        let ignored = vec!["Top".to_string()];

        let substituted = NoChecks.check_ignored_effects(&ignored, top, &lattice);
        assert_eq!(substituted, lattice.bottom_most_effect());
        assert_eq!(NoChecks.check_ignored_effects(&ignored, mid, &lattice), mid);
        assert!(NoChecks.is_ignored(&["call.invalid.effect".to_string()], "call.invalid.effect"));
        assert!(!NoChecks.is_ignored(&[], "call.invalid.effect"));
    }
}
