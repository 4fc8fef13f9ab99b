//! # Convene: Capability Registry
//!
//! Replaces attribute reflection with an explicit registry: every candidate
//! type declares its tags, its parent, and its methods up front, and the
//! engine answers "does this type/method carry tag T, directly or inherited"
//! by walking the ancestry chain once and caching the result.
//!
//! Registry Invariant: the registry is a single source of truth. It is
//! populated once at startup and passed by reference to discovery and
//! execution code. Never construct a second, partial registry mid-run.

use std::collections::BTreeSet;

use once_cell::sync::OnceCell;

use crate::params::ArgTuple;

/// A named marker attached to a type or method. Tags classify; they carry no
/// behavior of their own.
pub type Tag = &'static str;

/// The tag vocabulary understood by the standard convention.
pub mod tags {
    use super::Tag;

    pub const FIXTURE: Tag = "fixture";
    pub const CASE: Tag = "case";
    pub const CASE_PARAMS: Tag = "case-params";
    pub const SKIP: Tag = "skip";
    pub const FIXTURE_SET_UP: Tag = "fixture-setup";
    pub const FIXTURE_TEAR_DOWN: Tag = "fixture-teardown";
    pub const SET_UP: Tag = "setup";
    pub const TEAR_DOWN: Tag = "teardown";
}

// ============================================================================
// METHOD METADATA
// ============================================================================

/// A declared method: its name, its direct tags, and the literal argument
/// tuples of its data-driven case declarations, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct MethodMeta {
    name: String,
    tags: BTreeSet<Tag>,
    /// Tags contributed by same-named methods up the ancestry chain.
    /// Populated only on resolved (effective) methods.
    inherited: BTreeSet<Tag>,
    case_tuples: Vec<ArgTuple>,
}

impl MethodMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a direct tag.
    pub fn tag(mut self, tag: Tag) -> Self {
        self.tags.insert(tag);
        self
    }

    /// Declares one data-driven case tuple. Declaration order is preserved.
    pub fn case(mut self, args: ArgTuple) -> Self {
        self.case_tuples.push(args);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if the tag is declared directly on this method.
    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(tag)
    }

    /// True if the tag is declared directly or inherited from an overridden
    /// method in an ancestor type. Meaningful on methods obtained from
    /// [`Registry::effective_methods`]; on a raw declaration it degrades to
    /// [`MethodMeta::has_tag`].
    pub fn has_or_inherits(&self, tag: Tag) -> bool {
        self.tags.contains(tag) || self.inherited.contains(tag)
    }

    /// The declared case tuples, in declaration order.
    pub fn case_tuples(&self) -> &[ArgTuple] {
        &self.case_tuples
    }

    fn absorb_inherited(&mut self, ancestor: &MethodMeta) {
        self.inherited.extend(ancestor.tags.iter().copied());
    }
}

// ============================================================================
// TYPE METADATA
// ============================================================================

/// A candidate type: name, optional parent, direct tags, and declared
/// methods in declaration order.
#[derive(Debug, Clone, Default)]
pub struct TypeMeta {
    name: String,
    parent: Option<String>,
    tags: BTreeSet<Tag>,
    methods: Vec<MethodMeta>,
    // Resolved lazily against the registry, once per type.
    resolved_tags: OnceCell<BTreeSet<Tag>>,
    effective: OnceCell<Vec<MethodMeta>>,
}

impl TypeMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Names this type's parent. The parent is resolved by name through the
    /// registry; an unregistered parent simply ends the chain.
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Adds a direct tag.
    pub fn tag(mut self, tag: Tag) -> Self {
        self.tags.insert(tag);
        self
    }

    /// Appends a declared method. Declaration order is preserved.
    pub fn method(mut self, method: MethodMeta) -> Self {
        self.methods.push(method);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent_name(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// True if the tag is declared directly on this type.
    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(tag)
    }

    /// The methods declared on this type itself, in declaration order.
    pub fn declared_methods(&self) -> &[MethodMeta] {
        &self.methods
    }

    fn declared_method(&self, name: &str) -> Option<&MethodMeta> {
        self.methods.iter().find(|m| m.name == name)
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// The capability registry: all candidate types, in registration order.
#[derive(Debug, Default)]
pub struct Registry {
    types: Vec<TypeMeta>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, ty: TypeMeta) -> &mut Self {
        self.types.push(ty);
        self
    }

    /// All registered types, in registration order.
    pub fn types(&self) -> impl Iterator<Item = &TypeMeta> {
        self.types.iter()
    }

    pub fn get(&self, name: &str) -> Option<&TypeMeta> {
        self.types.iter().find(|t| t.name == name)
    }

    /// True if the type carries the tag directly or anywhere up its ancestry
    /// chain. Unknown types carry nothing.
    pub fn has_or_inherits(&self, type_name: &str, tag: Tag) -> bool {
        self.get(type_name)
            .is_some_and(|ty| self.resolved_tags(ty).contains(tag))
    }

    /// The union of the type's tags over its whole ancestry chain, resolved
    /// once and cached on the type.
    pub fn resolved_tags<'r>(&'r self, ty: &'r TypeMeta) -> &'r BTreeSet<Tag> {
        ty.resolved_tags.get_or_init(|| {
            self.ancestry(ty)
                .iter()
                .flat_map(|t| t.tags.iter().copied())
                .collect()
        })
    }

    /// The type's effective methods: its own declarations first, in
    /// declaration order, then unshadowed ancestor methods in ancestry
    /// order. Each effective method carries the tag union of its whole
    /// override chain. Resolved once and cached on the type.
    pub fn effective_methods(&self, type_name: &str) -> &[MethodMeta] {
        match self.get(type_name) {
            Some(ty) => ty.effective.get_or_init(|| self.build_effective(ty)),
            None => &[],
        }
    }

    /// The effective methods carrying `tag` directly or inherited, in
    /// enumeration order. This is the invoke-all enumeration.
    pub fn methods_with_tag(&self, type_name: &str, tag: Tag) -> Vec<&MethodMeta> {
        self.effective_methods(type_name)
            .iter()
            .filter(|m| m.has_or_inherits(tag))
            .collect()
    }

    fn build_effective(&self, ty: &TypeMeta) -> Vec<MethodMeta> {
        let chain = self.ancestry(ty);
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut effective = Vec::new();
        for (depth, owner) in chain.iter().enumerate() {
            for method in owner.declared_methods() {
                if !seen.insert(method.name()) {
                    continue;
                }
                let mut resolved = method.clone();
                for ancestor in &chain[depth + 1..] {
                    if let Some(overridden) = ancestor.declared_method(method.name()) {
                        resolved.absorb_inherited(overridden);
                    }
                }
                effective.push(resolved);
            }
        }
        effective
    }

    /// The type followed by its ancestors, nearest first. Bounded by a
    /// visited set so a cyclic parent declaration cannot hang the walk.
    fn ancestry<'r>(&'r self, ty: &'r TypeMeta) -> Vec<&'r TypeMeta> {
        let mut chain = vec![ty];
        let mut visited: BTreeSet<&str> = BTreeSet::new();
        visited.insert(ty.name());
        let mut current = ty;
        while let Some(parent) = current.parent_name().and_then(|p| self.get(p)) {
            if !visited.insert(parent.name()) {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }
}
