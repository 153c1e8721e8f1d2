//! Stores and the flow rules that move them across edges

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use std::fmt;

/// Abstract state a dataflow client threads along CFG edges
pub trait Store: Clone + PartialEq + fmt::Debug {
    /// Merge two stores arriving at the same program point
    fn least_upper_bound(&self, other: &Self) -> Self;
}

/// Which component of a successor's incoming stores a value lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
    Both,
    Then,
    Else,
}

/// How the stores at a block's exit map onto its successor's entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowRule {
    /// Each store flows to the identically named store of the successor
    #[default]
    EachToEach,
    /// The then store flows to both stores of the successor
    ThenToBoth,
    /// The else store flows to both stores of the successor
    ElseToBoth,
    /// The then store flows to the successor's then store only
    ThenToThen,
    /// The else store flows to the successor's else store only
    ElseToElse,
}

impl FlowRule {
    /// Stores delivered to the successor, tagged with the component they land in
    pub fn propagate<S: Store>(self, exit: &TransferInput<S>) -> SmallVec<[(StoreKind, S); 2]> {
        match self {
            FlowRule::EachToEach => match exit {
                TransferInput::Regular(store) => smallvec![(StoreKind::Both, store.clone())],
                TransferInput::Conditional { then_store, else_store } => smallvec![
                    (StoreKind::Then, then_store.clone()),
                    (StoreKind::Else, else_store.clone()),
                ],
            },
            FlowRule::ThenToBoth => smallvec![(StoreKind::Both, exit.then_store().clone())],
            FlowRule::ElseToBoth => smallvec![(StoreKind::Both, exit.else_store().clone())],
            FlowRule::ThenToThen => smallvec![(StoreKind::Then, exit.then_store().clone())],
            FlowRule::ElseToElse => smallvec![(StoreKind::Else, exit.else_store().clone())],
        }
    }
}

/// Stores at a program point: one regular store, or a then/else pair after a condition
#[derive(Debug, Clone, PartialEq)]
pub enum TransferInput<S> {
    Regular(S),
    Conditional { then_store: S, else_store: S },
}

impl<S: Store> TransferInput<S> {
    /// Single store for the point, merging a then/else pair
    pub fn regular_store(&self) -> S {
        match self {
            TransferInput::Regular(store) => store.clone(),
            TransferInput::Conditional { then_store, else_store } => {
                then_store.least_upper_bound(else_store)
            }
        }
    }

    pub fn then_store(&self) -> &S {
        match self {
            TransferInput::Regular(store) => store,
            TransferInput::Conditional { then_store, .. } => then_store,
        }
    }

    pub fn else_store(&self) -> &S {
        match self {
            TransferInput::Regular(store) => store,
            TransferInput::Conditional { else_store, .. } => else_store,
        }
    }

    pub fn is_conditional(&self) -> bool {
        matches!(self, TransferInput::Conditional { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    /// Facts known to hold; merging keeps facts from either side
    #[derive(Debug, Clone, PartialEq, Default)]
    struct Facts(BTreeSet<&'static str>);

    impl Store for Facts {
        fn least_upper_bound(&self, other: &Self) -> Self {
            Facts(self.0.union(&other.0).copied().collect())
        }
    }

    fn facts(items: &[&'static str]) -> Facts {
        Facts(items.iter().copied().collect())
    }

    #[test]
    fn test_default_rule_is_each_to_each() {
        assert_eq!(FlowRule::default(), FlowRule::EachToEach);
    }

    #[test]
    fn test_each_to_each_keeps_components_apart() {
        let regular = TransferInput::Regular(facts(&["x"]));
        let delivered = FlowRule::EachToEach.propagate(&regular);
        assert_eq!(delivered.as_slice(), &[(StoreKind::Both, facts(&["x"]))]);

        let split = TransferInput::Conditional {
            then_store: facts(&["x > 0"]),
            else_store: facts(&["x <= 0"]),
        };
        let delivered = FlowRule::EachToEach.propagate(&split);
        assert_eq!(
            delivered.as_slice(),
            &[(StoreKind::Then, facts(&["x > 0"])), (StoreKind::Else, facts(&["x <= 0"]))]
        );
    }

    #[test]
    fn test_branch_rules_select_one_component() {
        let split = TransferInput::Conditional {
            then_store: facts(&["t"]),
            else_store: facts(&["e"]),
        };
        let delivered = |rule: FlowRule| rule.propagate(&split).into_vec();

        assert_eq!(delivered(FlowRule::ThenToBoth), [(StoreKind::Both, facts(&["t"]))]);
        assert_eq!(delivered(FlowRule::ElseToBoth), [(StoreKind::Both, facts(&["e"]))]);
        assert_eq!(delivered(FlowRule::ThenToThen), [(StoreKind::Then, facts(&["t"]))]);
        assert_eq!(delivered(FlowRule::ElseToElse), [(StoreKind::Else, facts(&["e"]))]);
    }

    #[test]
    fn test_regular_store_merges_pair() {
        let split = TransferInput::Conditional {
            then_store: facts(&["a"]),
            else_store: facts(&["b"]),
        };
        assert!(split.is_conditional());
        assert_eq!(split.regular_store(), facts(&["a", "b"]));

        let regular = TransferInput::Regular(facts(&["a"]));
        assert_eq!(regular.then_store(), regular.else_store());
    }
}
