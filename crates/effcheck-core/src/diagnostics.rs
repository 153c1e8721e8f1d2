//! Diagnostic records and the sink they are reported to

use crate::lattice::{EffectLattice, EffectTag};
use crate::tree::{NodeId, Span};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Message key for a call whose callee needs more than the ambient effect
pub const CALL_INVALID: &str = "call.invalid.effect";
/// Message key for a constructor call whose constructor needs more than the ambient effect
pub const CONSTRUCTOR_CALL_INVALID: &str = "constructor.call.invalid";
/// Message key for an override whose effect is not below the overridden method's
pub const OVERRIDE_INVALID: &str = "override.effect.invalid";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Message key, e.g. [`CALL_INVALID`]
    pub message: String,
    /// Effect the construct requires
    pub target: EffectTag,
    /// Effect permitted where the construct appears
    pub ambient: EffectTag,
    pub span: Span,
    /// Offending expression; `None` for declaration-level diagnostics
    pub node: Option<NodeId>,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Render with effect names taken from `lattice`
    pub fn display<'a>(&'a self, lattice: &'a EffectLattice) -> DiagnosticDisplay<'a> {
        DiagnosticDisplay { diagnostic: self, lattice }
    }
}

pub struct DiagnosticDisplay<'a> {
    diagnostic: &'a Diagnostic,
    lattice: &'a EffectLattice,
}

impl fmt::Display for DiagnosticDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = self.diagnostic;
        write!(
            f,
            "{}: {} (found {}, permitted {}) at {}..{}",
            d.severity,
            d.message,
            self.lattice.name(d.target).unwrap_or("?"),
            self.lattice.name(d.ambient).unwrap_or("?"),
            d.span.start,
            d.span.end
        )
    }
}

/// Receiver of the diagnostics a checking pass produces
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_uses_effect_names() {
        let lattice = EffectLattice::chain(["SafeEffect", "UIEffect"]).unwrap();
        let diagnostic = Diagnostic {
            severity: Severity::Error,
            message: CALL_INVALID.to_string(),
            target: lattice.lookup("UIEffect").unwrap(),
            ambient: lattice.lookup("SafeEffect").unwrap(),
            span: Span::new(10, 24),
            node: Some(NodeId(3)),
        };

        insta::assert_snapshot!(
            diagnostic.display(&lattice).to_string(),
            @"error: call.invalid.effect (found UIEffect, permitted SafeEffect) at 10..24"
        );
        assert!(diagnostic.is_error());
    }

    #[test]
    fn test_serializes_severity_lowercase() {
        let lattice = EffectLattice::chain(["Bottom", "Top"]).unwrap();
        let diagnostic = Diagnostic {
            severity: Severity::Warning,
            message: "cast.unchecked".to_string(),
            target: lattice.bottom_most_effect(),
            ambient: lattice.bottom_most_effect(),
            span: Span::default(),
            node: None,
        };

        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["target"], 0);
    }
}
