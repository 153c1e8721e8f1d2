//! Declaration-level effect lookups supplied by the host
//!
//! The checker never inspects annotations itself. It asks a [`SymbolResolver`]
//! for the explicit effect of a method, the default it should fall back to,
//! the default effect of a type, and the methods a method overrides.

use crate::lattice::EffectTag;
use crate::tree::{MethodId, TypeId};
use std::collections::HashMap;

/// Host-side symbol and annotation resolution
pub trait SymbolResolver {
    /// Effect written on the method's declaration, if any
    fn explicit_effect(&self, method: MethodId) -> Option<EffectTag>;

    /// Effect a method gets when nothing is written on it
    fn default_method_effect(&self, method: MethodId) -> EffectTag;

    /// Effect permitted for code in a type that runs outside every method
    fn type_default_effect(&self, ty: TypeId) -> EffectTag;

    /// Supertype methods that `method` overrides
    fn overridden_methods(&self, _method: MethodId) -> Vec<MethodId> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Copy)]
struct MethodEntry {
    owner: Option<TypeId>,
    explicit: Option<EffectTag>,
}

/// In-memory resolver for hosts that precompute their annotations
///
/// A method without an explicit effect takes its owner type's default, and
/// falls back to the table-wide default when the owner has none.
#[derive(Debug, Clone)]
pub struct DeclarationTable {
    fallback: EffectTag,
    types: HashMap<TypeId, Option<EffectTag>>,
    methods: HashMap<MethodId, MethodEntry>,
    overrides: HashMap<MethodId, Vec<MethodId>>,
}

impl DeclarationTable {
    pub fn new(fallback: EffectTag) -> Self {
        Self {
            fallback,
            types: HashMap::new(),
            methods: HashMap::new(),
            overrides: HashMap::new(),
        }
    }

    pub fn declare_type(&mut self, ty: TypeId, default: Option<EffectTag>) -> &mut Self {
        self.types.insert(ty, default);
        self
    }

    pub fn declare_method(
        &mut self,
        method: MethodId,
        owner: TypeId,
        explicit: Option<EffectTag>,
    ) -> &mut Self {
        self.methods.insert(method, MethodEntry { owner: Some(owner), explicit });
        self
    }

    /// Declare a method the host only knows by signature, such as a library callee
    pub fn declare_external(&mut self, method: MethodId, explicit: Option<EffectTag>) -> &mut Self {
        self.methods.insert(method, MethodEntry { owner: None, explicit });
        self
    }

    pub fn declare_override(&mut self, method: MethodId, overridden: MethodId) -> &mut Self {
        self.overrides.entry(method).or_default().push(overridden);
        self
    }

    pub fn owner(&self, method: MethodId) -> Option<TypeId> {
        self.methods.get(&method).and_then(|entry| entry.owner)
    }
}

impl SymbolResolver for DeclarationTable {
    fn explicit_effect(&self, method: MethodId) -> Option<EffectTag> {
        self.methods.get(&method).and_then(|entry| entry.explicit)
    }

    fn default_method_effect(&self, method: MethodId) -> EffectTag {
        self.owner(method)
            .and_then(|ty| self.types.get(&ty).copied().flatten())
            .unwrap_or(self.fallback)
    }

    fn type_default_effect(&self, ty: TypeId) -> EffectTag {
        self.types.get(&ty).copied().flatten().unwrap_or(self.fallback)
    }

    fn overridden_methods(&self, method: MethodId) -> Vec<MethodId> {
        self.overrides.get(&method).cloned().unwrap_or_default()
    }
}
