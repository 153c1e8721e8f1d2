//! Field-access rules of the GUI effect system

use crate::GuiEffects;
use effcheck_core::lattice::{EffectLattice, EffectTag};
use effcheck_core::tree::{Expr, ExprKind, FieldId, Member, TypeDecl};
use effcheck_core::EffectExtension;
use std::collections::HashSet;

/// Message key for touching a UI field outside UI context
pub const FIELD_ACCESS_INVALID_UI: &str = "fieldaccess.invalid.ui";

/// Fields that may only be touched from UI context
#[derive(Debug, Clone, Default)]
pub struct UiFields {
    fields: HashSet<FieldId>,
}

impl UiFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a field annotated `@UIEffect`
    pub fn field(&mut self, field: FieldId) -> &mut Self {
        self.fields.insert(field);
        self
    }

    /// Mark every field declared directly in a `@UIType` type
    pub fn ui_type(&mut self, ty: &TypeDecl) -> &mut Self {
        self.fields.extend(ty.members.iter().filter_map(|member| match member {
            Member::Field(field) => Some(field.id),
            _ => None,
        }));
        self
    }

    pub fn contains(&self, field: FieldId) -> bool {
        self.fields.contains(&field)
    }

    fn is_ui(&self, expr: &Expr) -> bool {
        expr.referenced_field().is_some_and(|field| self.contains(field))
    }
}

/// [`EffectExtension`] of the GUI effect system
///
/// With `flagUIfields` off only calls and constructions are checked. With it
/// on, assignments, compound assignments and increments or decrements
/// require `UIEffect` when they write a UI field or directly read one as
/// their value.
pub struct GuiEffectExtension<'a> {
    effects: &'a GuiEffects,
    fields: &'a UiFields,
    flag_ui_fields: bool,
}

impl<'a> GuiEffectExtension<'a> {
    pub fn new(effects: &'a GuiEffects, fields: &'a UiFields, flag_ui_fields: bool) -> Self {
        Self { effects, fields, flag_ui_fields }
    }

    fn touches_ui_field(&self, node: &Expr) -> bool {
        match &node.kind {
            ExprKind::Assign { target, value } | ExprKind::CompoundAssign { target, value, .. } => {
                self.fields.is_ui(target) || self.fields.is_ui(value)
            }
            ExprKind::Unary { op, operand } => op.is_update() && self.fields.is_ui(operand),
            _ => false,
        }
    }

    fn field_effect(&self, node: &Expr, lattice: &EffectLattice) -> EffectTag {
        if self.touches_ui_field(node) {
            self.effects.ui
        } else {
            lattice.bottom_most_effect()
        }
    }
}

impl EffectExtension for GuiEffectExtension<'_> {
    fn does_assignment_check(&self) -> bool {
        self.flag_ui_fields
    }

    fn does_compound_assignment_check(&self) -> bool {
        self.flag_ui_fields
    }

    fn does_unary_check(&self) -> bool {
        self.flag_ui_fields
    }

    fn check_assignment(&self, node: &Expr, lattice: &EffectLattice) -> EffectTag {
        self.field_effect(node, lattice)
    }

    fn check_compound_assignment(&self, node: &Expr, lattice: &EffectLattice) -> EffectTag {
        self.field_effect(node, lattice)
    }

    fn check_unary(&self, node: &Expr, lattice: &EffectLattice) -> EffectTag {
        self.field_effect(node, lattice)
    }

    fn report_error(&self, _node: &Expr) -> String {
        FIELD_ACCESS_INVALID_UI.to_string()
    }
}
