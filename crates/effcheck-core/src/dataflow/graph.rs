//! Control-flow graph arena
//!
//! Blocks live in a single arena and refer to each other by [`BlockId`].
//! Successor edges are owned by the source block; predecessor lists are
//! derived bookkeeping kept in step by every edge mutation here.

use super::block::{Block, BlockId, BlockKind, Successors};
use super::store::FlowRule;
use crate::error::CfgError;
use crate::tree::NodeId;
use smallvec::SmallVec;
use std::collections::HashSet;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct ControlFlowGraph {
    blocks: Vec<Block>,
    entry: BlockId,
    exit: BlockId,
    exceptional_exit: BlockId,
}

impl Default for ControlFlowGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlFlowGraph {
    /// Graph holding only the entry, exit and exceptional-exit blocks
    pub fn new() -> Self {
        let mut graph = Self {
            blocks: Vec::new(),
            entry: BlockId(0),
            exit: BlockId(0),
            exceptional_exit: BlockId(0),
        };
        graph.entry = graph.push_block(BlockKind::Entry);
        graph.exit = graph.push_block(BlockKind::Exit);
        graph.exceptional_exit = graph.push_block(BlockKind::ExceptionalExit);
        graph
    }

    fn push_block(&mut self, kind: BlockKind) -> BlockId {
        let id = BlockId(self.blocks.len());
        self.blocks.push(Block::new(id, kind));
        id
    }

    pub fn entry(&self) -> BlockId {
        self.entry
    }

    pub fn exit(&self) -> BlockId {
        self.exit
    }

    pub fn exceptional_exit(&self) -> BlockId {
        self.exceptional_exit
    }

    /// Add a regular, exception or conditional block
    ///
    /// The special kinds exist exactly once per graph; asking for another
    /// entry or exit block yields a regular block instead.
    pub fn add_block(&mut self, kind: BlockKind) -> BlockId {
        let kind = match kind {
            BlockKind::Entry | BlockKind::Exit | BlockKind::ExceptionalExit => BlockKind::Regular,
            other => other,
        };
        self.push_block(kind)
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.0)
    }

    fn block_mut(&mut self, id: BlockId) -> Result<&mut Block, CfgError> {
        self.blocks.get_mut(id.0).ok_or(CfgError::UnknownBlock(id))
    }

    fn ensure(&self, id: BlockId) -> Result<(), CfgError> {
        self.block(id).map(|_| ()).ok_or(CfgError::UnknownBlock(id))
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn add_node(&mut self, block: BlockId, node: NodeId) -> Result<(), CfgError> {
        self.block_mut(block)?.push_node(node);
        Ok(())
    }

    /// Set the successor of a single-successor block, registering `block` as its predecessor
    pub fn set_successor(&mut self, block: BlockId, successor: BlockId) -> Result<(), CfgError> {
        self.ensure(successor)?;
        let source = self.block_mut(block)?;
        let kind = source.kind();
        let previous = match &mut source.successors {
            Successors::Single { successor: slot, .. } => slot.replace(successor),
            _ => return Err(CfgError::NotSingleSuccessor { block, kind }),
        };
        self.relink(block, previous, successor);
        Ok(())
    }

    pub fn successor(&self, block: BlockId) -> Option<BlockId> {
        self.block(block).and_then(Block::successor)
    }

    pub fn set_flow_rule(&mut self, block: BlockId, rule: FlowRule) -> Result<(), CfgError> {
        let source = self.block_mut(block)?;
        let kind = source.kind();
        match &mut source.successors {
            Successors::Single { flow_rule, .. } => {
                *flow_rule = rule;
                Ok(())
            }
            _ => Err(CfgError::NotSingleSuccessor { block, kind }),
        }
    }

    pub fn flow_rule(&self, block: BlockId) -> Option<FlowRule> {
        self.block(block).and_then(Block::flow_rule)
    }

    pub fn set_then_successor(
        &mut self,
        block: BlockId,
        successor: BlockId,
    ) -> Result<(), CfgError> {
        self.set_branch(block, successor, true)
    }

    pub fn set_else_successor(
        &mut self,
        block: BlockId,
        successor: BlockId,
    ) -> Result<(), CfgError> {
        self.set_branch(block, successor, false)
    }

    fn set_branch(
        &mut self,
        block: BlockId,
        successor: BlockId,
        then_branch: bool,
    ) -> Result<(), CfgError> {
        self.ensure(successor)?;
        let source = self.block_mut(block)?;
        let kind = source.kind();
        let previous = match &mut source.successors {
            Successors::Conditional { then_successor, .. } if then_branch => {
                then_successor.replace(successor)
            }
            Successors::Conditional { else_successor, .. } => else_successor.replace(successor),
            _ => return Err(CfgError::NotConditional { block, kind }),
        };
        self.relink(block, previous, successor);
        Ok(())
    }

    pub fn set_then_flow_rule(&mut self, block: BlockId, rule: FlowRule) -> Result<(), CfgError> {
        self.set_branch_rule(block, rule, true)
    }

    pub fn set_else_flow_rule(&mut self, block: BlockId, rule: FlowRule) -> Result<(), CfgError> {
        self.set_branch_rule(block, rule, false)
    }

    fn set_branch_rule(
        &mut self,
        block: BlockId,
        rule: FlowRule,
        then_branch: bool,
    ) -> Result<(), CfgError> {
        let source = self.block_mut(block)?;
        let kind = source.kind();
        match &mut source.successors {
            Successors::Conditional { then_flow_rule, .. } if then_branch => *then_flow_rule = rule,
            Successors::Conditional { else_flow_rule, .. } => *else_flow_rule = rule,
            _ => return Err(CfgError::NotConditional { block, kind }),
        }
        Ok(())
    }

    /// Add an edge taken when the node of an exception block raises `cause`
    pub fn add_exceptional_successor(
        &mut self,
        block: BlockId,
        cause: &str,
        successor: BlockId,
    ) -> Result<(), CfgError> {
        self.ensure(successor)?;
        let source = self.block_mut(block)?;
        let kind = source.kind();
        if kind != BlockKind::Exception {
            return Err(CfgError::NotExceptional { block, kind });
        }
        let targets = source.exceptional.entry(cause.to_string()).or_default();
        if !targets.contains(&successor) {
            targets.push(successor);
        }
        self.relink(block, None, successor);
        Ok(())
    }

    pub fn predecessors(&self, block: BlockId) -> &[BlockId] {
        self.block(block).map(Block::predecessors).unwrap_or(&[])
    }

    /// All outgoing edges of `block`, exceptional ones included
    pub fn all_successors(&self, block: BlockId) -> SmallVec<[BlockId; 4]> {
        let Some(source) = self.block(block) else {
            return SmallVec::new();
        };
        let mut targets: SmallVec<[BlockId; 4]> =
            source.successor_edges().iter().map(|&(s, _)| s).collect();
        targets.extend(source.exceptional_successors().map(|(_, s)| s));
        targets
    }

    /// Blocks reachable from the entry, each before its successors except along back edges
    pub fn reverse_postorder(&self) -> Vec<BlockId> {
        let mut visited = HashSet::from([self.entry]);
        let mut postorder = Vec::with_capacity(self.blocks.len());
        let mut stack = vec![(self.entry, self.all_successors(self.entry).into_iter())];

        while let Some((block, successors)) = stack.last_mut() {
            match successors.find(|&succ| visited.insert(succ)) {
                Some(succ) => {
                    let next = self.all_successors(succ).into_iter();
                    stack.push((succ, next));
                }
                None => {
                    postorder.push(*block);
                    stack.pop();
                }
            }
        }

        postorder.reverse();
        postorder
    }

    fn relink(&mut self, block: BlockId, previous: Option<BlockId>, successor: BlockId) {
        if let Some(old) = previous.filter(|&old| old != successor) {
            let still_linked = self.blocks[block.0].links_to(old);
            if !still_linked {
                self.blocks[old.0].predecessors.retain(|p| *p != block);
            }
        }
        let preds = &mut self.blocks[successor.0].predecessors;
        if !preds.contains(&block) {
            preds.push(block);
        }
        trace!(from = block.0, to = successor.0, "linked blocks");
    }
}
