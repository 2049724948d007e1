use rand::Rng;

use crate::avl::Avl;
use crate::depth::Depth;
use crate::error::IndexError;
use crate::rbt::Rbt;

/// Dictionary is the contract shared by every index engine in this
/// package. Callers program against this trait and pick an engine once,
/// at construction time, via [`Index`].
pub trait Dictionary<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    /// Set value for key. If there is an existing entry for key,
    /// overwrite the old value with new value and return the old value.
    /// Overwrites never restructure the tree.
    fn set(&mut self, key: K, value: V) -> Option<V>;

    /// Delete key from the index and return its value. If key is not
    /// present, delete is effectively a no-op.
    fn delete(&mut self, key: &K) -> Option<V>;

    /// Get the value for key, or [`IndexError::KeyNotFound`] when the
    /// key is absent. Lookups bump the comparison counter but never
    /// touch structure.
    fn get(&self, key: &K) -> Result<V, IndexError<K>>;

    /// Check whether key is present in the index.
    fn contains(&self, key: &K) -> bool;

    /// Return number of entries in the index.
    fn len(&self) -> usize;

    /// Check whether the index is empty.
    fn is_empty(&self) -> bool;

    /// Return all keys in ascending order, empty when the index is empty.
    fn sorted_keys(&self) -> Vec<K>;

    /// Cumulative key comparisons across all operations so far.
    fn comparisons(&self) -> u64;

    /// Cumulative single rotations across all operations so far. A
    /// double rotation counts as two.
    fn rotations(&self) -> u64;

    /// Cumulative node recolor operations. Always zero for the AVL
    /// engine.
    fn recolors(&self) -> u64;

    /// Always zero for tree engines, present so the contract lines up
    /// with hash-table dictionaries living outside this package.
    fn collisions(&self) -> u64;

    /// Bundle the four counters into a [`Metrics`] value.
    fn metrics(&self) -> Metrics;
}

/// Operation counters reported by every engine through the
/// [`Dictionary`] contract.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Metrics {
    pub(crate) comparisons: u64,
    pub(crate) rotations: u64,
    pub(crate) recolors: u64,
    pub(crate) collisions: u64,
}

impl Metrics {
    /// Return cumulative key comparisons.
    #[inline]
    pub fn comparisons(&self) -> u64 {
        self.comparisons
    }

    /// Return cumulative single rotations.
    #[inline]
    pub fn rotations(&self) -> u64 {
        self.rotations
    }

    /// Return cumulative recolor operations.
    #[inline]
    pub fn recolors(&self) -> u64 {
        self.recolors
    }

    /// Return cumulative hash collisions, always zero here.
    #[inline]
    pub fn collisions(&self) -> u64 {
        self.collisions
    }
}

/// Index is the closed set of engines behind the [`Dictionary`]
/// contract. The engine is chosen once, by the constructor, and every
/// operation afterwards lands on that engine.
pub enum Index<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    Avl(Avl<K, V>),
    Rbt(Rbt<K, V>),
}

impl<K, V> Index<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    /// Create an empty index backed by the AVL engine, identified by
    /// `name`. Applications can choose unique names.
    pub fn avl<S>(name: S) -> Index<K, V>
    where
        S: AsRef<str>,
    {
        Index::Avl(Avl::new(name))
    }

    /// Create an empty index backed by the red-black engine, identified
    /// by `name`.
    pub fn rbt<S>(name: S) -> Index<K, V>
    where
        S: AsRef<str>,
    {
        Index::Rbt(Rbt::new(name))
    }

    /// Identify this instance.
    #[inline]
    pub fn id(&self) -> String {
        match self {
            Index::Avl(avl) => avl.id(),
            Index::Rbt(rbt) => rbt.id(),
        }
    }

    /// Drop all entries and reset every counter to zero.
    pub fn clear(&mut self) {
        match self {
            Index::Avl(avl) => avl.clear(),
            Index::Rbt(rbt) => rbt.clear(),
        }
    }

    /// Return a random entry from this index.
    pub fn random<R: Rng>(&self, rng: &mut R) -> Option<(K, V)> {
        match self {
            Index::Avl(avl) => avl.random(rng),
            Index::Rbt(rbt) => rbt.random(rng),
        }
    }

    /// Validate the selected engine's structural invariants. Refer to
    /// [`Avl::validate`] and [`Rbt::validate`].
    pub fn validate(&self) -> Result<Stats, IndexError<K>> {
        match self {
            Index::Avl(avl) => avl.validate(),
            Index::Rbt(rbt) => rbt.validate(),
        }
    }
}

impl<K, V> Dictionary<K, V> for Index<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    fn set(&mut self, key: K, value: V) -> Option<V> {
        match self {
            Index::Avl(avl) => avl.set(key, value),
            Index::Rbt(rbt) => rbt.set(key, value),
        }
    }

    fn delete(&mut self, key: &K) -> Option<V> {
        match self {
            Index::Avl(avl) => avl.delete(key),
            Index::Rbt(rbt) => rbt.delete(key),
        }
    }

    fn get(&self, key: &K) -> Result<V, IndexError<K>> {
        match self {
            Index::Avl(avl) => avl.get(key),
            Index::Rbt(rbt) => rbt.get(key),
        }
    }

    fn contains(&self, key: &K) -> bool {
        match self {
            Index::Avl(avl) => avl.contains(key),
            Index::Rbt(rbt) => rbt.contains(key),
        }
    }

    fn len(&self) -> usize {
        match self {
            Index::Avl(avl) => avl.len(),
            Index::Rbt(rbt) => rbt.len(),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Index::Avl(avl) => avl.is_empty(),
            Index::Rbt(rbt) => rbt.is_empty(),
        }
    }

    fn sorted_keys(&self) -> Vec<K> {
        match self {
            Index::Avl(avl) => avl.sorted_keys(),
            Index::Rbt(rbt) => rbt.sorted_keys(),
        }
    }

    fn comparisons(&self) -> u64 {
        match self {
            Index::Avl(avl) => avl.comparisons(),
            Index::Rbt(rbt) => rbt.comparisons(),
        }
    }

    fn rotations(&self) -> u64 {
        match self {
            Index::Avl(avl) => avl.rotations(),
            Index::Rbt(rbt) => rbt.rotations(),
        }
    }

    fn recolors(&self) -> u64 {
        match self {
            Index::Avl(avl) => avl.recolors(),
            Index::Rbt(rbt) => rbt.recolors(),
        }
    }

    fn collisions(&self) -> u64 {
        match self {
            Index::Avl(avl) => avl.collisions(),
            Index::Rbt(rbt) => rbt.collisions(),
        }
    }

    fn metrics(&self) -> Metrics {
        match self {
            Index::Avl(avl) => avl.metrics(),
            Index::Rbt(rbt) => rbt.metrics(),
        }
    }
}

/// Statistics on an engine's tree shape, returned by `validate()`.
/// Validation walks the whole tree, so treat this as a debug/test
/// surface rather than a fast path.
#[derive(Default, Debug)]
pub struct Stats {
    entries: usize, // number of entries in the tree.
    node_size: usize,
    height: Option<usize>,
    blacks: Option<usize>,
    pub(crate) depths: Option<Depth>,
}

impl Stats {
    pub(crate) fn new(entries: usize, node_size: usize) -> Stats {
        Stats {
            entries,
            node_size,
            height: Default::default(),
            blacks: Default::default(),
            depths: Default::default(),
        }
    }

    #[inline]
    pub(crate) fn set_height(&mut self, height: usize) {
        self.height = Some(height)
    }

    #[inline]
    pub(crate) fn set_blacks(&mut self, blacks: usize) {
        self.blacks = Some(blacks)
    }

    #[inline]
    pub(crate) fn set_depths(&mut self, depths: Depth) {
        self.depths = Some(depths)
    }

    /// Return number of entries in the tree.
    #[inline]
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Return node-size, including overhead, for the engine's node type.
    /// Although the node overhead is constant, the node size varies
    /// based on key and value types.
    #[inline]
    pub fn node_size(&self) -> usize {
        self.node_size
    }

    /// Return the tree height. Present for the AVL engine only.
    #[inline]
    pub fn height(&self) -> Option<usize> {
        self.height
    }

    /// Return number of BLACK nodes from root to leaf, the black-height.
    /// Present for the red-black engine only.
    #[inline]
    pub fn blacks(&self) -> Option<usize> {
        self.blacks
    }

    /// Return [`Depth`] statistics over leaf-node depths.
    pub fn depths(&self) -> Option<Depth> {
        match &self.depths {
            Some(depths) if depths.samples() > 0 => Some(depths.clone()),
            _ => None,
        }
    }
}
