//! Error types for lattice setup, checking passes, configuration and CFG construction
//!
//! None of these represent effect violations. Violations are diagnostics and
//! flow into a [`DiagnosticSink`](crate::diagnostics::DiagnosticSink); the
//! errors below abort setup or the current pass.

use crate::dataflow::{BlockId, BlockKind};
use crate::tree::{MethodId, NodeId, TypeId};
use thiserror::Error;

/// Faults in the definition of an effect lattice
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LatticeError {
    #[error("effect lattice declares no effects")]
    Empty,

    #[error("effect `{0}` is declared more than once")]
    DuplicateEffect(String),

    #[error("effects {0:?} form a cycle, so the ordering is not anti-symmetric")]
    Cycle(Vec<String>),

    #[error("no effect lies below every other effect")]
    NoBottom,

    #[error("unknown effect `{0}`")]
    UnknownEffect(String),

    #[error("effect tag #{0} does not belong to this lattice")]
    ForeignTag(u32),
}

/// Faults that abort a checking pass
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EffectError {
    #[error(transparent)]
    Lattice(#[from] LatticeError),

    #[error("method {method:?} resolved to effect tag #{tag}, which is outside the lattice")]
    InvalidMethodEffect { method: MethodId, tag: u32 },

    #[error("type {ty:?} has default effect tag #{tag}, which is outside the lattice")]
    InvalidTypeEffect { ty: TypeId, tag: u32 },

    #[error("construct {node:?} requires effect tag #{tag}, which is outside the lattice")]
    InvalidConstructEffect { node: NodeId, tag: u32 },

    #[error("construct {0:?} is not enclosed by any type")]
    DetachedConstruct(NodeId),
}

/// Faults in host-supplied option strings
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown checker option `{0}`")]
    UnknownOption(String),

    #[error("option `{0}` does not take a value")]
    UnexpectedValue(String),

    #[error("unknown lint `{0}`")]
    UnknownLint(String),
}

/// Faults raised while wiring a control-flow graph
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CfgError {
    #[error("block {0:?} does not exist")]
    UnknownBlock(BlockId),

    #[error("block {block:?} is a {kind:?} block and has no single successor edge")]
    NotSingleSuccessor { block: BlockId, kind: BlockKind },

    #[error("block {block:?} is a {kind:?} block, not a conditional block")]
    NotConditional { block: BlockId, kind: BlockKind },

    #[error("block {block:?} is a {kind:?} block and cannot raise exceptions")]
    NotExceptional { block: BlockId, kind: BlockKind },
}
