//! Effect lattice
//!
//! Implements the partial order over effect tags that every check compares
//! against:
//! - Tags are interned small integers handed out by [`EffectLatticeBuilder`]
//! - The order is the reflexive-transitive closure of the declared edges,
//!   precomputed into a dense table so `le` is a single lookup
//! - Construction rejects cycles and lattices without a unique bottom

use crate::error::LatticeError;
use indexmap::IndexMap;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use serde::{Deserialize, Serialize};

/// One element of an effect lattice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectTag(u32);

impl EffectTag {
    /// Position of the tag in its lattice's registration order
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw id, as carried by error values
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Collects effect names and ordering edges before validation
#[derive(Debug, Default, Clone)]
pub struct EffectLatticeBuilder {
    effects: IndexMap<String, EffectTag>,
    orderings: Vec<(EffectTag, EffectTag)>,
    duplicates: Vec<String>,
}

impl EffectLatticeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an effect and return its tag
    ///
    /// Registering a name twice hands back the first tag but makes
    /// [`build`](Self::build) fail with [`LatticeError::DuplicateEffect`].
    pub fn effect(&mut self, name: impl Into<String>) -> EffectTag {
        let name = name.into();
        if let Some(&tag) = self.effects.get(&name) {
            self.duplicates.push(name);
            return tag;
        }
        let tag = EffectTag(self.effects.len() as u32);
        self.effects.insert(name, tag);
        tag
    }

    /// Declare `lower ≤ upper`
    pub fn below(&mut self, lower: EffectTag, upper: EffectTag) -> &mut Self {
        self.orderings.push((lower, upper));
        self
    }

    /// Validate the declared order and precompute its closure
    pub fn build(&self) -> Result<EffectLattice, LatticeError> {
        let n = self.effects.len();
        if n == 0 {
            return Err(LatticeError::Empty);
        }
        if let Some(name) = self.duplicates.first() {
            return Err(LatticeError::DuplicateEffect(name.clone()));
        }

        let mut graph: DiGraph<EffectTag, ()> = DiGraph::with_capacity(n, self.orderings.len());
        let nodes: Vec<NodeIndex> = self.effects.values().map(|&tag| graph.add_node(tag)).collect();

        for &(lower, upper) in &self.orderings {
            let from = *nodes.get(lower.index()).ok_or(LatticeError::ForeignTag(lower.raw()))?;
            let to = *nodes.get(upper.index()).ok_or(LatticeError::ForeignTag(upper.raw()))?;
            if from != to {
                graph.update_edge(from, to, ());
            }
        }

        // Any strongly connected component larger than one node breaks anti-symmetry
        if let Some(component) = tarjan_scc(&graph).into_iter().find(|scc| scc.len() > 1) {
            let mut names: Vec<String> = component
                .iter()
                .filter_map(|&ix| self.effects.get_index(graph[ix].index()))
                .map(|(name, _)| name.clone())
                .collect();
            names.sort();
            return Err(LatticeError::Cycle(names));
        }

        let mut order = vec![false; n * n];
        for (row, &start) in nodes.iter().enumerate() {
            let mut dfs = Dfs::new(&graph, start);
            while let Some(reached) = dfs.next(&graph) {
                order[row * n + reached.index()] = true;
            }
        }

        let mut bottoms = (0..n).filter(|&row| order[row * n..(row + 1) * n].iter().all(|&le| le));
        let bottom = match (bottoms.next(), bottoms.next()) {
            (Some(row), None) => EffectTag(row as u32),
            _ => return Err(LatticeError::NoBottom),
        };

        Ok(EffectLattice {
            names: self.effects.keys().cloned().collect(),
            effects: self.effects.clone(),
            tags: self.effects.values().copied().collect(),
            bottom,
            order,
        })
    }
}

/// A validated partial order over effect tags with a unique bottom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectLattice {
    names: Vec<String>,
    effects: IndexMap<String, EffectTag>,
    tags: Vec<EffectTag>,
    bottom: EffectTag,
    order: Vec<bool>,
}

impl EffectLattice {
    pub fn builder() -> EffectLatticeBuilder {
        EffectLatticeBuilder::new()
    }

    /// Build a totally ordered lattice, bottom first
    pub fn chain<I, S>(names: I) -> Result<Self, LatticeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut builder = EffectLatticeBuilder::new();
        let mut previous: Option<EffectTag> = None;
        for name in names {
            let tag = builder.effect(name);
            if let Some(lower) = previous {
                builder.below(lower, tag);
            }
            previous = Some(tag);
        }
        builder.build()
    }

    /// Whether `target` is permitted under `ambient`
    ///
    /// Tags from another lattice are never permitted.
    pub fn le(&self, target: EffectTag, ambient: EffectTag) -> bool {
        let n = self.tags.len();
        if target.index() >= n || ambient.index() >= n {
            return false;
        }
        self.order[target.index() * n + ambient.index()]
    }

    pub fn bottom_most_effect(&self) -> EffectTag {
        self.bottom
    }

    /// Every tag this lattice recognizes, in registration order
    pub fn valid_effects(&self) -> &[EffectTag] {
        &self.tags
    }

    pub fn contains(&self, tag: EffectTag) -> bool {
        tag.index() < self.tags.len()
    }

    /// Reject tags that do not belong to this lattice
    pub fn check(&self, tag: EffectTag) -> Result<EffectTag, LatticeError> {
        if self.contains(tag) {
            Ok(tag)
        } else {
            Err(LatticeError::ForeignTag(tag.raw()))
        }
    }

    pub fn name(&self, tag: EffectTag) -> Option<&str> {
        self.names.get(tag.index()).map(String::as_str)
    }

    /// Resolve an effect by name
    pub fn lookup(&self, name: &str) -> Result<EffectTag, LatticeError> {
        self.effects
            .get(name)
            .copied()
            .ok_or_else(|| LatticeError::UnknownEffect(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
