//! Suppression lists applied during a pass

use effcheck_core::prelude::*;

struct Fixture {
    lattice: EffectLattice,
    table: DeclarationTable,
    unit: CompilationUnit,
}

/// A Safe method calling a UI callee and constructing a UI object
fn fixture() -> Fixture {
    let lattice = EffectLattice::chain(["SafeEffect", "UIEffect"]).unwrap();
    let safe = lattice.lookup("SafeEffect").unwrap();
    let ui = lattice.lookup("UIEffect").unwrap();

    let mut table = DeclarationTable::new(safe);
    table
        .declare_type(TypeId(0), None)
        .declare_method(MethodId(0), TypeId(0), None)
        .declare_external(MethodId(1), Some(ui))
        .declare_external(MethodId(2), Some(ui));

    let mut b = TreeBuilder::new();
    let call = b.call(MethodId(1), vec![]);
    let construct = b.new_object(MethodId(2), vec![]);
    let body = vec![Stmt::Expr(call), Stmt::Expr(construct)];
    let method = MethodDecl::new(MethodId(0), "refresh", body);
    let unit = CompilationUnit {
        name: "Panel".to_string(),
        types: vec![TypeDecl::new(TypeId(0), "Panel", vec![Member::Method(method)])],
    };
    Fixture { lattice, table, unit }
}

fn check(fixture: &Fixture, config: CheckerConfig) -> (Vec<Diagnostic>, CheckStats) {
    let mut checker = EffectChecker::new(&fixture.lattice, &NoChecks, config);
    let mut diagnostics = Vec::new();
    let stats = checker.check(&fixture.unit, &fixture.table, &mut diagnostics).unwrap();
    (diagnostics, stats)
}

fn messages(diagnostics: &[Diagnostic]) -> Vec<&str> {
    diagnostics.iter().map(|d| d.message.as_str()).collect()
}

#[test]
fn test_without_suppression_both_violations_reported() {
    let fixture = fixture();
    let (diagnostics, stats) = check(&fixture, CheckerConfig::default());
    assert_eq!(messages(&diagnostics), vec![CALL_INVALID, CONSTRUCTOR_CALL_INVALID]);
    assert_eq!(stats.suppressed, 0);
}

#[test]
fn test_ignored_error_key_is_dropped_and_others_remain() {
    let fixture = fixture();
    let config = CheckerConfig::from_options(["-AignoreErrors=call.invalid.effect"]).unwrap();
    let (diagnostics, stats) = check(&fixture, config);

    assert_eq!(messages(&diagnostics), vec![CONSTRUCTOR_CALL_INVALID]);
    assert_eq!(stats.suppressed, 1);
    assert_eq!(stats.errors, 1);
}

#[test]
fn test_empty_ignore_list_suppresses_nothing() {
    let fixture = fixture();
    let config = CheckerConfig::from_options(["ignoreErrors"]).unwrap();
    assert!(config.suppression.ignoring_errors());

    let (diagnostics, _) = check(&fixture, config);
    assert_eq!(diagnostics.len(), 2);
}

#[test]
fn test_ignore_warnings_does_not_touch_errors() {
    let fixture = fixture();
    let config = CheckerConfig::from_options(["ignoreWarnings=call.invalid.effect"]).unwrap();
    let (diagnostics, _) = check(&fixture, config);
    assert_eq!(diagnostics.len(), 2);
}

#[test]
fn test_ignored_effect_is_treated_as_bottom() {
    let fixture = fixture();
    let config = CheckerConfig::from_json_str(r#"{ "ignoreEffects": ["UIEffect"] }"#).unwrap();
    let (diagnostics, stats) = check(&fixture, config);

    assert!(diagnostics.is_empty());
    // substitution is not suppression
    assert_eq!(stats.suppressed, 0);
}

#[test]
fn test_ignoring_unrelated_effect_changes_nothing() {
    let fixture = fixture();
    let config = CheckerConfig::from_json_str(r#"{ "ignoreEffects": ["SafeEffect"] }"#).unwrap();
    let (diagnostics, _) = check(&fixture, config);
    assert_eq!(diagnostics.len(), 2);
}

/// Ignores effects whose name starts with a listed prefix and messages in a listed family
struct PrefixMatching;

impl EffectExtension for PrefixMatching {
    fn check_ignored_effects(
        &self,
        ignored: &[String],
        effect: EffectTag,
        lattice: &EffectLattice,
    ) -> EffectTag {
        match lattice.name(effect) {
            Some(name) if ignored.iter().any(|prefix| name.starts_with(prefix.as_str())) => {
                lattice.bottom_most_effect()
            }
            _ => effect,
        }
    }

    fn is_ignored(&self, ignored: &[String], message: &str) -> bool {
        ignored.iter().any(|family| message.starts_with(family.as_str()))
    }
}

#[test]
fn test_extension_may_redefine_matching() {
    let fixture = fixture();

    let config = CheckerConfig::from_options(["ignoreErrors=constructor"]).unwrap();
    let mut checker = EffectChecker::new(&fixture.lattice, &PrefixMatching, config);
    let mut diagnostics = Vec::new();
    checker.check(&fixture.unit, &fixture.table, &mut diagnostics).unwrap();
    assert_eq!(messages(&diagnostics), vec![CALL_INVALID]);

    let config = CheckerConfig::from_options(["ignoreEffects=UI"]).unwrap();
    let mut checker = EffectChecker::new(&fixture.lattice, &PrefixMatching, config);
    let mut diagnostics = Vec::new();
    checker.check(&fixture.unit, &fixture.table, &mut diagnostics).unwrap();
    assert!(diagnostics.is_empty());
}

#[test]
fn test_reported_target_is_the_declared_effect() {
    let fixture = fixture();
    let ui = fixture.lattice.lookup("UIEffect").unwrap();
    let config = CheckerConfig::from_options(["ignoreEffects=SafeEffect"]).unwrap();
    let (diagnostics, _) = check(&fixture, config);
    assert!(diagnostics.iter().all(|d| d.target == ui));
}
