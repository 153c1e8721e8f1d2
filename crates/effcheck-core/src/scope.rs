//! Effect context stack and its scoped guard
//!
//! The effect stack and the enclosing-method stack always have the same
//! length. Frames are only pushed through [`ScopeGuard::enter`], which pops
//! them again when the guard drops, whether the nested traversal returned
//! normally, returned an error or unwound.

use crate::lattice::EffectTag;
use crate::tree::{MethodId, TypeId};
use std::ops::{Deref, DerefMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScopeFrame {
    /// Static context of a type: most restrictive effect, no method
    Type { ty: TypeId, bottom: EffectTag },
    Method { method: MethodId, effect: EffectTag },
}

#[derive(Debug, Default)]
pub(crate) struct ScopeStack {
    effects: Vec<EffectTag>,
    methods: Vec<Option<MethodId>>,
    types: Vec<TypeId>,
    max_depth: usize,
}

impl ScopeStack {
    fn push(&mut self, frame: ScopeFrame) {
        match frame {
            ScopeFrame::Type { ty, bottom } => {
                self.types.push(ty);
                self.effects.push(bottom);
                self.methods.push(None);
            }
            ScopeFrame::Method { method, effect } => {
                self.effects.push(effect);
                self.methods.push(Some(method));
            }
        }
        self.max_depth = self.max_depth.max(self.effects.len());
        debug_assert!(self.is_balanced());
    }

    fn pop(&mut self) {
        self.effects.pop();
        if let Some(None) = self.methods.pop() {
            self.types.pop();
        }
        debug_assert!(self.is_balanced());
    }

    pub(crate) fn is_balanced(&self) -> bool {
        self.effects.len() == self.methods.len()
    }

    pub(crate) fn depth(&self) -> usize {
        self.effects.len()
    }

    pub(crate) fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub(crate) fn top_effect(&self) -> Option<EffectTag> {
        self.effects.last().copied()
    }

    /// Method of the innermost frame; `None` in a type's static context
    pub(crate) fn enclosing_method(&self) -> Option<MethodId> {
        self.methods.last().copied().flatten()
    }

    pub(crate) fn enclosing_type(&self) -> Option<TypeId> {
        self.types.last().copied()
    }
}

/// Holds one pushed frame for as long as it lives
pub(crate) struct ScopeGuard<'g, T: AsMut<ScopeStack>> {
    owner: &'g mut T,
}

impl<'g, T: AsMut<ScopeStack>> ScopeGuard<'g, T> {
    pub(crate) fn enter(owner: &'g mut T, frame: ScopeFrame) -> Self {
        owner.as_mut().push(frame);
        Self { owner }
    }
}

impl<T: AsMut<ScopeStack>> Deref for ScopeGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.owner
    }
}

impl<T: AsMut<ScopeStack>> DerefMut for ScopeGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.owner
    }
}

impl<T: AsMut<ScopeStack>> Drop for ScopeGuard<'_, T> {
    fn drop(&mut self) {
        self.owner.as_mut().pop();
    }
}
