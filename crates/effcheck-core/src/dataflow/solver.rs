//! Worklist fixpoint solver for forward analyses

use super::block::{Block, BlockId};
use super::graph::ControlFlowGraph;
use super::store::{Store, StoreKind, TransferInput};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, warn};

/// A forward dataflow analysis over [`ControlFlowGraph`] blocks
pub trait ForwardAnalysis {
    type Store: Store;

    /// Store at the entry block
    fn initial_store(&self) -> Self::Store;

    /// Stores at the exit of `block` given the stores at its entry
    fn transfer(
        &self,
        block: &Block,
        input: &TransferInput<Self::Store>,
    ) -> TransferInput<Self::Store>;

    /// Store sent along the exceptional edges for `cause`
    ///
    /// `None` sends the block's entry store, since the raising node did not complete.
    fn exceptional_store(
        &self,
        _block: &Block,
        _cause: &str,
        _input: &TransferInput<Self::Store>,
    ) -> Option<Self::Store> {
        None
    }
}

/// Result of fixpoint computation
#[derive(Debug)]
pub struct AnalysisResult<S> {
    /// Stores at entry of each reached block
    pub inputs: HashMap<BlockId, TransferInput<S>>,
    /// Stores at exit of each reached block
    pub outputs: HashMap<BlockId, TransferInput<S>>,
    pub iterations: usize,
    /// False when the iteration bound stopped the solver
    pub converged: bool,
}

impl<S> AnalysisResult<S> {
    pub fn input(&self, block: BlockId) -> Option<&TransferInput<S>> {
        self.inputs.get(&block)
    }

    pub fn output(&self, block: BlockId) -> Option<&TransferInput<S>> {
        self.outputs.get(&block)
    }
}

/// Then/else stores accumulated at a block's entry
#[derive(Debug)]
struct EntryStores<S> {
    then_store: Option<S>,
    else_store: Option<S>,
}

impl<S> Default for EntryStores<S> {
    fn default() -> Self {
        Self { then_store: None, else_store: None }
    }
}

impl<S: Store> EntryStores<S> {
    fn merge(&mut self, kind: StoreKind, store: S) -> bool {
        match kind {
            StoreKind::Both => {
                let then_changed = merge_slot(&mut self.then_store, store.clone());
                let else_changed = merge_slot(&mut self.else_store, store);
                then_changed || else_changed
            }
            StoreKind::Then => merge_slot(&mut self.then_store, store),
            StoreKind::Else => merge_slot(&mut self.else_store, store),
        }
    }

    /// A single arrived component stands in for both
    fn to_input(&self) -> Option<TransferInput<S>> {
        match (&self.then_store, &self.else_store) {
            (Some(then_store), Some(else_store)) if then_store == else_store => {
                Some(TransferInput::Regular(then_store.clone()))
            }
            (Some(then_store), Some(else_store)) => Some(TransferInput::Conditional {
                then_store: then_store.clone(),
                else_store: else_store.clone(),
            }),
            (Some(store), None) | (None, Some(store)) => {
                Some(TransferInput::Regular(store.clone()))
            }
            (None, None) => None,
        }
    }
}

fn merge_slot<S: Store>(slot: &mut Option<S>, store: S) -> bool {
    let merged = match slot.as_ref() {
        Some(existing) => existing.least_upper_bound(&store),
        None => store,
    };
    if slot.as_ref() == Some(&merged) {
        return false;
    }
    *slot = Some(merged);
    true
}

/// Worklist-based fixpoint solver
pub struct FixpointSolver;

impl FixpointSolver {
    const MAX_ITERATIONS: usize = 10_000;

    /// Propagate stores from the entry block until no entry store changes
    ///
    /// Blocks are visited in reverse postorder first. Non-exceptional edges
    /// apply their [`FlowRule`](super::FlowRule); exceptional edges carry
    /// [`ForwardAnalysis::exceptional_store`], falling back to the merged
    /// entry store of the raising block. Blocks never reached from the entry
    /// have no inputs or outputs in the result.
    pub fn solve<A: ForwardAnalysis>(
        analysis: &A,
        cfg: &ControlFlowGraph,
    ) -> AnalysisResult<A::Store> {
        let mut entries: HashMap<BlockId, EntryStores<A::Store>> = HashMap::new();
        entries
            .entry(cfg.entry())
            .or_default()
            .merge(StoreKind::Both, analysis.initial_store());

        let mut inputs = HashMap::new();
        let mut outputs: HashMap<BlockId, TransferInput<A::Store>> = HashMap::new();
        let mut worklist: VecDeque<BlockId> = cfg.reverse_postorder().into_iter().collect();
        let mut in_worklist: HashSet<BlockId> = worklist.iter().copied().collect();
        let mut iterations = 0;
        let mut converged = true;

        while let Some(block_id) = worklist.pop_front() {
            in_worklist.remove(&block_id);
            iterations += 1;

            if iterations > Self::MAX_ITERATIONS {
                warn!(
                    iterations,
                    "dataflow solver hit its iteration bound before reaching a fixpoint"
                );
                converged = false;
                break;
            }

            let Some(block) = cfg.block(block_id) else {
                continue;
            };
            let Some(input) = entries.get(&block_id).and_then(EntryStores::to_input) else {
                continue;
            };

            let output = analysis.transfer(block, &input);

            let mut deliveries: Vec<(BlockId, StoreKind, A::Store)> = Vec::new();
            for (succ, rule) in block.successor_edges() {
                deliveries.extend(
                    rule.propagate(&output)
                        .into_iter()
                        .map(|(kind, store)| (succ, kind, store)),
                );
            }
            for (cause, succ) in block.exceptional_successors() {
                let store = analysis
                    .exceptional_store(block, cause, &input)
                    .unwrap_or_else(|| input.regular_store());
                deliveries.push((succ, StoreKind::Both, store));
            }
            inputs.insert(block_id, input);

            for (succ, kind, store) in deliveries {
                let changed = entries.entry(succ).or_default().merge(kind, store);
                if changed && in_worklist.insert(succ) {
                    worklist.push_back(succ);
                }
            }
            outputs.insert(block_id, output);
        }

        debug!(iterations, blocks = outputs.len(), converged, "dataflow fixpoint computed");
        AnalysisResult { inputs, outputs, iterations, converged }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataflow::{BlockKind, FlowRule};
    use crate::tree::NodeId;
    use std::collections::BTreeSet;

    /// Nodes executed on every path so far; merging keeps the common ones
    #[derive(Debug, Clone, PartialEq)]
    struct Executed(BTreeSet<NodeId>);

    impl Store for Executed {
        fn least_upper_bound(&self, other: &Self) -> Self {
            Executed(self.0.intersection(&other.0).copied().collect())
        }
    }

    struct MustExecute;

    impl ForwardAnalysis for MustExecute {
        type Store = Executed;

        fn initial_store(&self) -> Executed {
            Executed(BTreeSet::new())
        }

        fn transfer(
            &self,
            block: &Block,
            input: &TransferInput<Executed>,
        ) -> TransferInput<Executed> {
            let mut store = input.regular_store();
            store.0.extend(block.nodes().iter().copied());
            TransferInput::Regular(store)
        }
    }

    fn diamond() -> (ControlFlowGraph, [BlockId; 4]) {
        let mut cfg = ControlFlowGraph::new();
        let head = cfg.add_block(BlockKind::Regular);
        let branch = cfg.add_block(BlockKind::Conditional);
        let left = cfg.add_block(BlockKind::Regular);
        let right = cfg.add_block(BlockKind::Regular);
        cfg.add_node(head, NodeId(1)).unwrap();
        cfg.add_node(left, NodeId(2)).unwrap();
        cfg.add_node(right, NodeId(3)).unwrap();
        cfg.set_successor(cfg.entry(), head).unwrap();
        cfg.set_successor(head, branch).unwrap();
        cfg.set_then_successor(branch, left).unwrap();
        cfg.set_else_successor(branch, right).unwrap();
        cfg.set_successor(left, cfg.exit()).unwrap();
        cfg.set_successor(right, cfg.exit()).unwrap();
        (cfg, [head, branch, left, right])
    }

    #[test]
    fn test_must_execute_over_diamond() {
        let (cfg, [_, _, left, _]) = diamond();
        let result = FixpointSolver::solve(&MustExecute, &cfg);

        assert!(result.converged);
        let at_exit = result.input(cfg.exit()).unwrap().regular_store();
        assert_eq!(at_exit.0, BTreeSet::from([NodeId(1)]));
        let leaving_left = result.output(left).unwrap().regular_store();
        assert_eq!(leaving_left.0, BTreeSet::from([NodeId(1), NodeId(2)]));
    }

    #[test]
    fn test_unreached_blocks_have_no_stores() {
        let (mut cfg, _) = diamond();
        let orphan = cfg.add_block(BlockKind::Regular);
        let result = FixpointSolver::solve(&MustExecute, &cfg);
        assert!(result.input(orphan).is_none());
        assert!(result.input(cfg.exceptional_exit()).is_none());
    }

    #[test]
    fn test_loop_reaches_fixpoint() {
        let mut cfg = ControlFlowGraph::new();
        let header = cfg.add_block(BlockKind::Conditional);
        let body = cfg.add_block(BlockKind::Regular);
        cfg.add_node(body, NodeId(7)).unwrap();
        cfg.set_successor(cfg.entry(), header).unwrap();
        cfg.set_then_successor(header, body).unwrap();
        cfg.set_else_successor(header, cfg.exit()).unwrap();
        cfg.set_successor(body, header).unwrap();

        let result = FixpointSolver::solve(&MustExecute, &cfg);
        assert!(result.converged);
        // the loop body may run zero times
        assert!(result.input(cfg.exit()).unwrap().regular_store().0.is_empty());
    }

    /// Splits the store at conditional blocks so flow rules have something to route
    struct Branches;

    #[derive(Debug, Clone, PartialEq)]
    struct Seen(BTreeSet<&'static str>);

    impl Store for Seen {
        fn least_upper_bound(&self, other: &Self) -> Self {
            Seen(self.0.union(&other.0).copied().collect())
        }
    }

    fn regular(facts: &[&'static str]) -> TransferInput<Seen> {
        TransferInput::Regular(Seen(facts.iter().copied().collect()))
    }

    impl ForwardAnalysis for Branches {
        type Store = Seen;

        fn initial_store(&self) -> Seen {
            Seen(BTreeSet::new())
        }

        fn transfer(&self, block: &Block, input: &TransferInput<Seen>) -> TransferInput<Seen> {
            match block.kind() {
                BlockKind::Conditional => {
                    let store = input.regular_store();
                    let mut then_store = store.clone();
                    let mut else_store = store;
                    then_store.0.insert("then");
                    else_store.0.insert("else");
                    TransferInput::Conditional { then_store, else_store }
                }
                _ => input.clone(),
            }
        }
    }

    #[test]
    fn test_then_to_both_drops_else_store() {
        let mut cfg = ControlFlowGraph::new();
        let branch = cfg.add_block(BlockKind::Conditional);
        let relay = cfg.add_block(BlockKind::Regular);
        let target = cfg.add_block(BlockKind::Regular);
        cfg.set_successor(cfg.entry(), branch).unwrap();
        cfg.set_then_successor(branch, relay).unwrap();
        cfg.set_else_successor(branch, relay).unwrap();
        cfg.set_then_flow_rule(branch, FlowRule::ThenToThen).unwrap();
        cfg.set_else_flow_rule(branch, FlowRule::ElseToElse).unwrap();
        cfg.set_successor(relay, target).unwrap();
        cfg.set_flow_rule(relay, FlowRule::ThenToBoth).unwrap();

        let result = FixpointSolver::solve(&Branches, &cfg);
        let at_relay = result.input(relay).unwrap();
        assert!(at_relay.is_conditional());
        assert_eq!(result.input(target).unwrap(), &regular(&["then"]));
    }

    #[test]
    fn test_branches_receive_only_their_own_store() {
        let (cfg, [_, _, left, right]) = diamond();
        let result = FixpointSolver::solve(&Branches, &cfg);

        assert_eq!(result.input(left).unwrap(), &regular(&["then"]));
        assert_eq!(result.input(right).unwrap(), &regular(&["else"]));
        let at_exit = result.input(cfg.exit()).unwrap().regular_store();
        assert_eq!(at_exit, Seen(BTreeSet::from(["else", "then"])));
    }

    fn raising_call() -> (ControlFlowGraph, BlockId) {
        let mut cfg = ControlFlowGraph::new();
        let head = cfg.add_block(BlockKind::Regular);
        let call = cfg.add_block(BlockKind::Exception);
        let handler = cfg.add_block(BlockKind::Regular);
        cfg.add_node(head, NodeId(3)).unwrap();
        cfg.add_node(call, NodeId(4)).unwrap();
        cfg.set_successor(cfg.entry(), head).unwrap();
        cfg.set_successor(head, call).unwrap();
        cfg.set_successor(call, cfg.exit()).unwrap();
        cfg.add_exceptional_successor(call, "IOException", handler).unwrap();
        cfg.set_successor(handler, cfg.exit()).unwrap();
        (cfg, handler)
    }

    #[test]
    fn test_exceptional_edge_carries_store_before_raising_node() {
        let (cfg, handler) = raising_call();
        let result = FixpointSolver::solve(&MustExecute, &cfg);

        assert_eq!(result.input(handler).unwrap().regular_store().0, BTreeSet::from([NodeId(3)]));
        let at_exit = result.input(cfg.exit()).unwrap().regular_store();
        assert_eq!(at_exit.0, BTreeSet::from([NodeId(3)]));
    }

    /// Records the cause of every exceptional edge taken
    struct Causes;

    impl ForwardAnalysis for Causes {
        type Store = Seen;

        fn initial_store(&self) -> Seen {
            Seen(BTreeSet::new())
        }

        fn transfer(&self, _block: &Block, input: &TransferInput<Seen>) -> TransferInput<Seen> {
            input.clone()
        }

        fn exceptional_store(
            &self,
            _block: &Block,
            cause: &str,
            input: &TransferInput<Seen>,
        ) -> Option<Seen> {
            let mut store = input.regular_store();
            store.0.insert(if cause == "IOException" { "io" } else { "other" });
            Some(store)
        }
    }

    #[test]
    fn test_analysis_may_supply_exceptional_store() {
        let (cfg, handler) = raising_call();
        let result = FixpointSolver::solve(&Causes, &cfg);
        assert_eq!(result.input(handler).unwrap(), &regular(&["io"]));
    }
}
