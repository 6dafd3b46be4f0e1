//! Context tree - arena of derivation state
//!
//! Contexts form a tree accessed by walking parent links only; no node ever
//! enumerates or owns its children. That maps onto an arena: nodes live in a
//! single vector, a [`ContextHandle`] is an index into it, and each node
//! stores its parent's handle.
//!
//! # Concurrency
//!
//! Worker threads may derive sibling subtrees from a shared parent
//! concurrently. Derivation reads only the parent's immutable
//! post-construction state (seed, remaining chain) and writes only the new
//! node, so the single write lock is held briefly and the publish step is
//! compute-if-absent: two threads deriving the same `(parent, id)` always
//! observe one child with one seed.

use crate::rng::exclusive::ExclusiveRandom;
use crate::rng::RandomFactory;
use crate::seed::hashing::{long_hash, mix64};
use crate::seed::{Seed, SeedChain};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

/// Errors that can occur while deriving a child context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DerivationError {
    /// The id is already open on the path from the root to the parent.
    #[error("scope \"{id}\" is already open on the context path and cannot be re-entered")]
    Cycle { id: String },

    /// An explicit per-scope override contained an unspecified component.
    #[error("explicit seed override for scope \"{id}\" must contain only concrete seeds: {chain}")]
    UnspecifiedOverride { id: String, chain: SeedChain },
}

/// Opaque handle to one context in a [`ContextTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextHandle(usize);

/// One level of the execution hierarchy.
struct Node {
    /// Opaque unique scope id, supplied by the caller
    id: String,
    /// Parent handle; `None` only for the root
    parent: Option<usize>,
    /// Resolved seed; always concrete once the node exists
    seed: u64,
    /// Unconsumed seed-chain suffix available to this node's children
    remaining: SeedChain,
    /// Whether the scope has ended; a closed node never hands out a live
    /// generator, even one constructed after closure
    closed: bool,
    /// Lazily constructed generator, bound to the first accessing thread
    random: OnceLock<Arc<ExclusiveRandom>>,
}

struct TreeInner {
    nodes: Vec<Node>,
    /// Open children, keyed by (parent index, child id). Publish-once cache:
    /// repeated derivation of an open scope is idempotent.
    derived: HashMap<(usize, String), usize>,
}

/// Arena of randomized contexts for one run.
///
/// # Example
/// ```
/// use randomized_testing_core_rs::{ContextTree, FactoryKind, Seed, SeedChain};
///
/// let chain = SeedChain::parse("dead:beef").unwrap();
/// let tree = ContextTree::new("suite", &chain, FactoryKind::default().factory(), true);
///
/// let class = tree.derive_child(tree.root(), "classA", None).unwrap();
/// assert_eq!(tree.seed(class), Seed::Concrete(0xBEEF));
/// assert_eq!(tree.seed_chain(class).to_string(), "[DEAD:BEEF]");
/// ```
pub struct ContextTree {
    factory: RandomFactory,
    /// Whether generators enforce thread ownership and scope liveness
    guarded: bool,
    inner: RwLock<TreeInner>,
}

impl ContextTree {
    /// Build a tree from the externally supplied root chain.
    ///
    /// The root seed is the head of `root_chain` if concrete; otherwise it is
    /// drawn from ambient entropy here, exactly once per run. Everything
    /// below the root is deterministic in the root seed and the visited
    /// scope ids.
    pub fn new(root_id: &str, root_chain: &SeedChain, factory: RandomFactory, guarded: bool) -> Self {
        let (first, rest) = root_chain.pop();
        let root_seed = match first {
            Seed::Concrete(value) => value,
            Seed::Unspecified => rand::random::<u64>(),
        };

        let root = Node {
            id: root_id.to_string(),
            parent: None,
            seed: root_seed,
            remaining: rest,
            closed: false,
            random: OnceLock::new(),
        };

        Self {
            factory,
            guarded,
            inner: RwLock::new(TreeInner {
                nodes: vec![root],
                derived: HashMap::new(),
            }),
        }
    }

    /// Handle of the root context.
    pub fn root(&self) -> ContextHandle {
        ContextHandle(0)
    }

    /// Derive the context for a nested scope.
    ///
    /// If `override_chain` is present (a parsed chain attached to the scope's
    /// declaration), it wholesale replaces the parent's remaining chain and
    /// every element must be concrete. Otherwise the parent's remaining chain
    /// is popped: a concrete head becomes the child seed, an unspecified (or
    /// exhausted) head synthesizes `parent_seed ^ mix64(long_hash(child_id))`.
    ///
    /// Deriving an id that is still open under the same parent returns the
    /// existing handle; deriving an id that is open on the ancestor path
    /// fails with [`DerivationError::Cycle`].
    pub fn derive_child(
        &self,
        parent: ContextHandle,
        child_id: &str,
        override_chain: Option<&SeedChain>,
    ) -> Result<ContextHandle, DerivationError> {
        let mut inner = self.write();

        // Publish-once: a repeated derivation of an open scope must observe
        // the seed assigned by the first one.
        if let Some(&existing) = inner.derived.get(&(parent.0, child_id.to_string())) {
            return Ok(ContextHandle(existing));
        }

        // Cycle guard: the parent chain (parent included) must not already
        // contain this id.
        let mut cursor = Some(parent.0);
        while let Some(index) = cursor {
            if inner.nodes[index].id == child_id {
                return Err(DerivationError::Cycle {
                    id: child_id.to_string(),
                });
            }
            cursor = inner.nodes[index].parent;
        }

        let source_chain = match override_chain {
            Some(chain) => {
                if chain.seeds().iter().any(Seed::is_unspecified) {
                    return Err(DerivationError::UnspecifiedOverride {
                        id: child_id.to_string(),
                        chain: chain.clone(),
                    });
                }
                chain.clone()
            }
            None => inner.nodes[parent.0].remaining.clone(),
        };

        let (first, rest) = source_chain.pop();
        let seed = match first {
            Seed::Concrete(value) => value,
            Seed::Unspecified => inner.nodes[parent.0].seed ^ mix64(long_hash(child_id)),
        };

        let index = inner.nodes.len();
        inner.nodes.push(Node {
            id: child_id.to_string(),
            parent: Some(parent.0),
            seed,
            remaining: rest,
            closed: false,
            random: OnceLock::new(),
        });
        inner.derived.insert((parent.0, child_id.to_string()), index);
        Ok(ContextHandle(index))
    }

    /// The context's resolved seed (always concrete).
    pub fn seed(&self, context: ContextHandle) -> Seed {
        Seed::Concrete(self.read().nodes[context.0].seed)
    }

    /// The context's unconsumed seed-chain suffix.
    pub fn remaining_chain(&self, context: ContextHandle) -> SeedChain {
        self.read().nodes[context.0].remaining.clone()
    }

    /// The scope id this context was derived for.
    pub fn context_id(&self, context: ContextHandle) -> String {
        self.read().nodes[context.0].id.clone()
    }

    /// The full seed chain from the root to this context, root first.
    ///
    /// This is the text to log on failure: re-supplying it reproduces the
    /// exact run. Cost is proportional to nesting depth.
    pub fn seed_chain(&self, context: ContextHandle) -> SeedChain {
        let inner = self.read();
        let mut seeds = Vec::new();
        let mut cursor = Some(context.0);
        while let Some(index) = cursor {
            seeds.push(Seed::Concrete(inner.nodes[index].seed));
            cursor = inner.nodes[index].parent;
        }
        seeds.reverse();
        SeedChain::new(seeds)
    }

    /// The root seed of the run (first element of any context's chain).
    pub fn root_seed(&self) -> Seed {
        Seed::Concrete(self.read().nodes[0].seed)
    }

    /// The context's generator, constructed on first access.
    ///
    /// Construction binds the generator to the calling thread; in guarded
    /// mode every later operation from another thread is rejected.
    pub fn random(&self, context: ContextHandle) -> Arc<ExclusiveRandom> {
        let inner = self.read();
        let node = &inner.nodes[context.0];
        let random = node
            .random
            .get_or_init(|| {
                let delegate = (self.factory.as_ref())(node.seed);
                Arc::new(ExclusiveRandom::new(delegate, self.guarded))
            })
            .clone();
        // A generator first constructed after its scope ended is born dead:
        // access must fail exactly as if it had been invalidated in place.
        if node.closed {
            random.invalidate();
        }
        random
    }

    /// End the context's scope.
    ///
    /// Invalidates the owned generator (idempotently) and releases the scope
    /// id, so a later re-entry of the same id derives a fresh context. A
    /// generator nobody touched while the scope was open stays unusable too:
    /// lazy construction after this point yields it already invalidated.
    pub fn invalidate(&self, context: ContextHandle) {
        let mut inner = self.write();
        let (parent, id) = {
            let node = &mut inner.nodes[context.0];
            node.closed = true;
            if let Some(random) = node.random.get() {
                random.invalidate();
            }
            (node.parent, node.id.clone())
        };
        if let Some(parent) = parent {
            inner.derived.remove(&(parent, id));
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, TreeInner> {
        // Critical sections never panic between invariant updates; recover
        // from poisoning instead of propagating an unrelated panic.
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TreeInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
