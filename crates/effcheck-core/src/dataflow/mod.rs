//! Control-flow blocks and store propagation
//!
//! This module provides the pieces a flow-sensitive client builds on:
//! - A block arena with entry, exit and exceptional-exit blocks
//! - Single-successor, conditional and exception blocks with predecessor bookkeeping
//! - Flow rules that route then/else stores across an edge
//! - A worklist fixpoint solver for forward analyses

mod block;
mod graph;
mod solver;
mod store;

pub use block::{Block, BlockId, BlockKind, Successors};
pub use graph::ControlFlowGraph;
pub use solver::{AnalysisResult, FixpointSolver, ForwardAnalysis};
pub use store::{FlowRule, Store, StoreKind, TransferInput};
