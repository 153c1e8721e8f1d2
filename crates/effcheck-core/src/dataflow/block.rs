//! Basic blocks of a control-flow graph

use super::store::FlowRule;
use crate::tree::NodeId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

/// Unique identifier for a basic block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    /// Special block every subroutine starts in
    Entry,
    /// Special block reached by normal completion
    Exit,
    /// Special block reached by an uncaught exception
    ExceptionalExit,
    /// Straight-line sequence of nodes
    Regular,
    /// A single node that may raise, with exceptional successors per cause
    Exception,
    /// Two-way branch on the preceding condition
    Conditional,
}

impl BlockKind {
    /// Kinds with exactly one non-exceptional outgoing edge
    pub fn is_single_successor(self) -> bool {
        matches!(self, BlockKind::Entry | BlockKind::Regular | BlockKind::Exception)
    }
}

/// Non-exceptional outgoing edges of a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Successors {
    None,
    Single {
        successor: Option<BlockId>,
        flow_rule: FlowRule,
    },
    /// Rules default to `ThenToBoth` on the then edge and `ElseToBoth` on the else edge
    Conditional {
        then_successor: Option<BlockId>,
        else_successor: Option<BlockId>,
        then_flow_rule: FlowRule,
        else_flow_rule: FlowRule,
    },
}

#[derive(Debug, Clone)]
pub struct Block {
    id: BlockId,
    kind: BlockKind,
    nodes: Vec<NodeId>,
    pub(super) predecessors: SmallVec<[BlockId; 4]>,
    pub(super) successors: Successors,
    pub(super) exceptional: IndexMap<String, SmallVec<[BlockId; 1]>>,
}

impl Block {
    pub(super) fn new(id: BlockId, kind: BlockKind) -> Self {
        let successors = match kind {
            BlockKind::Entry | BlockKind::Regular | BlockKind::Exception => Successors::Single {
                successor: None,
                flow_rule: FlowRule::default(),
            },
            BlockKind::Conditional => Successors::Conditional {
                then_successor: None,
                else_successor: None,
                then_flow_rule: FlowRule::ThenToBoth,
                else_flow_rule: FlowRule::ElseToBoth,
            },
            BlockKind::Exit | BlockKind::ExceptionalExit => Successors::None,
        };
        Self {
            id,
            kind,
            nodes: Vec::new(),
            predecessors: SmallVec::new(),
            successors,
            exceptional: IndexMap::new(),
        }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub(super) fn push_node(&mut self, node: NodeId) {
        self.nodes.push(node);
    }

    /// Blocks with an edge into this one; bookkeeping only, never ownership
    pub fn predecessors(&self) -> &[BlockId] {
        &self.predecessors
    }

    pub fn successors(&self) -> &Successors {
        &self.successors
    }

    /// The single non-exceptional successor of a single-successor block, if set
    pub fn successor(&self) -> Option<BlockId> {
        match self.successors {
            Successors::Single { successor, .. } => successor,
            _ => None,
        }
    }

    pub fn flow_rule(&self) -> Option<FlowRule> {
        match self.successors {
            Successors::Single { flow_rule, .. } => Some(flow_rule),
            _ => None,
        }
    }

    pub fn exceptional_successors(&self) -> impl Iterator<Item = (&str, BlockId)> + '_ {
        self.exceptional
            .iter()
            .flat_map(|(cause, targets)| {
                targets.iter().map(move |&target| (cause.as_str(), target))
            })
    }

    /// Non-exceptional edges with the flow rule governing each
    pub fn successor_edges(&self) -> SmallVec<[(BlockId, FlowRule); 2]> {
        match self.successors {
            Successors::None => SmallVec::new(),
            Successors::Single { successor, flow_rule } => {
                successor.map(|s| smallvec![(s, flow_rule)]).unwrap_or_default()
            }
            Successors::Conditional {
                then_successor,
                else_successor,
                then_flow_rule,
                else_flow_rule,
            } => {
                let mut edges = SmallVec::new();
                if let Some(then_successor) = then_successor {
                    edges.push((then_successor, then_flow_rule));
                }
                if let Some(else_successor) = else_successor {
                    edges.push((else_successor, else_flow_rule));
                }
                edges
            }
        }
    }

    /// Whether any edge, exceptional or not, leads to `target`
    pub fn links_to(&self, target: BlockId) -> bool {
        self.successor_edges().iter().any(|&(s, _)| s == target)
            || self.exceptional.values().any(|targets| targets.contains(&target))
    }
}
