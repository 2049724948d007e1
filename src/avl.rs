use std::{
    borrow::Borrow,
    cell::Cell,
    cmp::{self, Ordering},
    mem,
};

use rand::Rng;

use crate::depth::Depth;
use crate::dict::{Dictionary, Metrics, Stats};
use crate::error::IndexError;

/// Avl manage a single instance of in-memory index using an
/// [avl][avl] tree, keeping every node's subtree heights within one of
/// each other through rotations.
///
/// [avl]: https://en.wikipedia.org/wiki/AVL_tree
#[derive(Clone)]
pub struct Avl<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    name: String,
    root: Option<Box<AvlNode<K, V>>>,
    n_count: usize, // number of entries in the tree.
    comparisons: Cell<u64>,
    rotations: u64,
}

impl<K, V> Avl<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    /// Create an empty instance of Avl, identified by `name`.
    /// Applications can choose unique names.
    pub fn new<S>(name: S) -> Avl<K, V>
    where
        S: AsRef<str>,
    {
        Avl {
            name: name.as_ref().to_string(),
            root: Default::default(),
            n_count: Default::default(),
            comparisons: Default::default(),
            rotations: Default::default(),
        }
    }
}

/// Maintenance API.
impl<K, V> Avl<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    /// Identify this instance. Applications can choose unique names while
    /// creating Avl instances.
    #[inline]
    pub fn id(&self) -> String {
        self.name.clone()
    }

    /// Return number of entries in this instance.
    #[inline]
    pub fn len(&self) -> usize {
        self.n_count
    }

    /// Check whether this index is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n_count == 0
    }

    /// Drop every entry and reset all counters to zero. Children are
    /// released before their parents as the owned tree unwinds.
    pub fn clear(&mut self) {
        self.root = None;
        self.n_count = 0;
        self.comparisons.set(0);
        self.rotations = 0;
    }

    /// Cumulative key comparisons, including those made by read-only
    /// lookups.
    #[inline]
    pub fn comparisons(&self) -> u64 {
        self.comparisons.get()
    }

    /// Cumulative single rotations, a double rotation counts as two.
    #[inline]
    pub fn rotations(&self) -> u64 {
        self.rotations
    }

    /// Always zero, the AVL engine never recolors.
    #[inline]
    pub fn recolors(&self) -> u64 {
        0
    }

    /// Always zero, kept for uniformity with hash dictionaries.
    #[inline]
    pub fn collisions(&self) -> u64 {
        0
    }

    /// Bundle the four counters.
    pub fn metrics(&self) -> Metrics {
        Metrics {
            comparisons: self.comparisons(),
            rotations: self.rotations(),
            recolors: self.recolors(),
            collisions: self.collisions(),
        }
    }

    #[cfg(test)]
    pub(crate) fn root_key(&self) -> Option<K> {
        self.root.as_ref().map(|node| node.key.clone())
    }
}

type Upsert<K, V> = (Box<AvlNode<K, V>>, Option<V>);

type Remove<K, V> = (Option<Box<AvlNode<K, V>>>, Option<V>);

/// Write operations on Avl instance.
impl<K, V> Avl<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    /// Set value for key. If there is an existing entry for key,
    /// overwrite the old value with new value and return the old value.
    /// An overwrite touches no links and triggers no rebalancing.
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        let node = self.root.take();
        let (root, old_value) = self.upsert(node, key, value);
        self.root = Some(root);
        if old_value.is_none() {
            self.n_count += 1;
        }
        old_value
    }

    /// Delete key from this instance and return its value. If key is
    /// not present, then delete is effectively a no-op.
    pub fn delete<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.root.take();
        let (root, old_value) = self.remove(node, key);
        self.root = root;
        if old_value.is_some() {
            self.n_count -= 1;
        }
        old_value
    }

    /// Validate the AVL tree with following rules:
    ///
    /// * Every node's stored height equals its recomputed height.
    /// * Left and right subtree heights differ by at most one.
    /// * Make sure keys are in sorted order.
    ///
    /// Additionally return full statistics on the tree. Refer to [`Stats`]
    /// for more information.
    pub fn validate(&self) -> Result<Stats, IndexError<K>> {
        let root = self.root.as_deref();
        let mut stats = Stats::new(self.n_count, mem::size_of::<AvlNode<K, V>>());
        stats.set_depths(Depth::new());
        let height = Avl::validate_tree(root, 0, &mut stats)?;
        stats.set_height(height);
        Ok(stats)
    }
}

/// Read operations on Avl instance.
impl<K, V> Avl<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    /// Get the value for key. Landing on an absent key is the only
    /// error this index can return to a reader.
    pub fn get<Q>(&self, key: &Q) -> Result<V, IndexError<K>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut node = self.root.as_deref();
        while let Some(nref) = node {
            node = match key.cmp(nref.key.borrow()) {
                Ordering::Less => {
                    self.incr_comparisons(1);
                    nref.left.as_deref()
                }
                Ordering::Greater => {
                    self.incr_comparisons(2);
                    nref.right.as_deref()
                }
                Ordering::Equal => {
                    self.incr_comparisons(2);
                    return Ok(nref.value.clone());
                }
            };
        }
        Err(IndexError::KeyNotFound)
    }

    /// Check whether key is present in this instance.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).is_ok()
    }

    /// Return all keys in ascending order.
    pub fn sorted_keys(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.n_count);
        Avl::collect_keys(self.root.as_deref(), &mut keys);
        keys
    }

    /// Return a random entry from this index.
    pub fn random<R: Rng>(&self, rng: &mut R) -> Option<(K, V)> {
        let mut nref = self.root.as_deref()?;

        let mut at_depth = rng.gen::<u8>() % 40;
        loop {
            let next = match rng.gen::<u8>() % 2 {
                0 => nref.left.as_deref(),
                1 => nref.right.as_deref(),
                _ => unreachable!(),
            };
            if at_depth == 0 || next.is_none() {
                break Some((nref.key.clone(), nref.value.clone()));
            }
            at_depth -= 1;
            nref = next.unwrap();
        }
    }
}

impl<K, V> Avl<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    #[inline]
    fn incr_comparisons(&self, n: u64) {
        self.comparisons.set(self.comparisons.get() + n)
    }

    fn upsert(&mut self, node: Option<Box<AvlNode<K, V>>>, key: K, value: V) -> Upsert<K, V> {
        let mut node = match node {
            None => return (AvlNode::new(key, value), None),
            Some(node) => node,
        };

        // Left descent costs one comparison, right or equal costs two.
        let old_value = match key.cmp(&node.key) {
            Ordering::Less => {
                self.incr_comparisons(1);
                let (left, o) = self.upsert(node.left.take(), key, value);
                node.left = Some(left);
                o
            }
            Ordering::Greater => {
                self.incr_comparisons(2);
                let (right, o) = self.upsert(node.right.take(), key, value);
                node.right = Some(right);
                o
            }
            Ordering::Equal => {
                self.incr_comparisons(2);
                let old_value = mem::replace(&mut node.value, value);
                // overwrite in place, nothing structural changed.
                return (node, Some(old_value));
            }
        };

        (self.rebalance(node), old_value)
    }

    fn remove<Q>(&mut self, node: Option<Box<AvlNode<K, V>>>, key: &Q) -> Remove<K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut node = match node {
            None => return (None, None),
            Some(node) => node,
        };

        let old_value = match key.cmp(node.key.borrow()) {
            Ordering::Less => {
                self.incr_comparisons(1);
                let (left, o) = self.remove(node.left.take(), key);
                node.left = left;
                o
            }
            Ordering::Greater => {
                self.incr_comparisons(2);
                let (right, o) = self.remove(node.right.take(), key);
                node.right = right;
                o
            }
            Ordering::Equal => {
                self.incr_comparisons(2);
                if node.left.is_none() || node.right.is_none() {
                    // splice out, the lone child (if any) takes its place.
                    let child = node.left.take().or_else(|| node.right.take());
                    return (child, Some(node.value));
                }
                // two children: adopt the in-order successor's entry and
                // delete the successor from the right subtree instead.
                let (skey, svalue) = Avl::min_entry(node.right.as_deref().unwrap());
                let old_value = mem::replace(&mut node.value, svalue);
                node.key = skey;
                let right = node.right.take();
                let (right, _) = self.remove(right, node.key.borrow());
                node.right = right;
                Some(old_value)
            }
        };

        (Some(self.rebalance(node)), old_value)
    }

    // Recompute height bottom-up and rotate when the balance factor
    // leaves [-1, 1]. Same cases for insert and delete.
    fn rebalance(&mut self, mut node: Box<AvlNode<K, V>>) -> Box<AvlNode<K, V>> {
        node.height = 1 + cmp::max(height(&node.left), height(&node.right));

        let bal = balance(&node);
        if bal < -1 && balance_of(&node.left) <= 0 {
            self.rotate_right(node)
        } else if bal < -1 {
            // left-right: straighten the left child first.
            let left = self.rotate_left(node.left.take().unwrap());
            node.left = Some(left);
            self.rotate_right(node)
        } else if bal > 1 && balance_of(&node.right) >= 0 {
            self.rotate_left(node)
        } else if bal > 1 {
            // right-left: straighten the right child first.
            let right = self.rotate_right(node.right.take().unwrap());
            node.right = Some(right);
            self.rotate_left(node)
        } else {
            node
        }
    }

    //              node                         u
    //              /  \                        / \
    //           left   u          ==>      node   ur
    //                 / \                  /  \
    //               ul   ur             left   ul
    //
    fn rotate_left(&mut self, mut node: Box<AvlNode<K, V>>) -> Box<AvlNode<K, V>> {
        self.rotations += 1;

        let mut u = match node.right.take() {
            Some(u) => u,
            None => panic!("rotate_left(): no pivot child, call the programmer"),
        };
        node.right = u.left.take();
        node.height = 1 + cmp::max(height(&node.left), height(&node.right));
        u.left = Some(node);
        u.height = 1 + cmp::max(height(&u.left), height(&u.right));
        u
    }

    //              node                     u
    //              /  \                    / \
    //             u    right   ==>      ul    node
    //            / \                          /  \
    //          ul   ur                      ur    right
    //
    fn rotate_right(&mut self, mut node: Box<AvlNode<K, V>>) -> Box<AvlNode<K, V>> {
        self.rotations += 1;

        let mut u = match node.left.take() {
            Some(u) => u,
            None => panic!("rotate_right(): no pivot child, call the programmer"),
        };
        node.left = u.right.take();
        node.height = 1 + cmp::max(height(&node.left), height(&node.right));
        u.right = Some(node);
        u.height = 1 + cmp::max(height(&u.left), height(&u.right));
        u
    }

    fn min_entry(node: &AvlNode<K, V>) -> (K, V) {
        let mut nref = node;
        while let Some(left) = nref.left.as_deref() {
            nref = left;
        }
        (nref.key.clone(), nref.value.clone())
    }

    fn collect_keys(node: Option<&AvlNode<K, V>>, keys: &mut Vec<K>) {
        if let Some(node) = node {
            Avl::collect_keys(node.left.as_deref(), keys);
            keys.push(node.key.clone());
            Avl::collect_keys(node.right.as_deref(), keys);
        }
    }

    fn validate_tree(
        node: Option<&AvlNode<K, V>>,
        depth: usize,
        stats: &mut Stats,
    ) -> Result<usize, IndexError<K>> {
        let node = match node {
            None => {
                stats.depths.as_mut().unwrap().sample(depth);
                return Ok(0);
            }
            Some(node) => node,
        };

        let lheight = Avl::validate_tree(node.left.as_deref(), depth + 1, stats)?;
        let rheight = Avl::validate_tree(node.right.as_deref(), depth + 1, stats)?;
        if lheight > rheight + 1 || rheight > lheight + 1 {
            let err = format!("left: {} right: {}", lheight, rheight);
            return Err(IndexError::UnbalancedHeights(err));
        }
        let height = 1 + cmp::max(lheight, rheight);
        if node.height != height {
            let err = format!("stored: {} actual: {}", node.height, height);
            return Err(IndexError::UnbalancedHeights(err));
        }
        if let Some(left) = node.left.as_deref() {
            if left.key.ge(&node.key) {
                let (lkey, parent) = (left.key.clone(), node.key.clone());
                return Err(IndexError::SortError(lkey, parent));
            }
        }
        if let Some(right) = node.right.as_deref() {
            if right.key.le(&node.key) {
                let (rkey, parent) = (right.key.clone(), node.key.clone());
                return Err(IndexError::SortError(rkey, parent));
            }
        }
        Ok(height)
    }
}

fn height<K, V>(node: &Option<Box<AvlNode<K, V>>>) -> usize
where
    K: Clone + Ord,
    V: Clone,
{
    node.as_ref().map_or(0, |node| node.height)
}

// balance factor, right subtree height minus left subtree height.
fn balance<K, V>(node: &AvlNode<K, V>) -> isize
where
    K: Clone + Ord,
    V: Clone,
{
    height(&node.right) as isize - height(&node.left) as isize
}

fn balance_of<K, V>(node: &Option<Box<AvlNode<K, V>>>) -> isize
where
    K: Clone + Ord,
    V: Clone,
{
    node.as_ref().map_or(0, |node| balance(node))
}

impl<K, V> Dictionary<K, V> for Avl<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    fn set(&mut self, key: K, value: V) -> Option<V> {
        Avl::set(self, key, value)
    }

    fn delete(&mut self, key: &K) -> Option<V> {
        Avl::delete(self, key)
    }

    fn get(&self, key: &K) -> Result<V, IndexError<K>> {
        Avl::get(self, key)
    }

    fn contains(&self, key: &K) -> bool {
        Avl::contains(self, key)
    }

    fn len(&self) -> usize {
        Avl::len(self)
    }

    fn is_empty(&self) -> bool {
        Avl::is_empty(self)
    }

    fn sorted_keys(&self) -> Vec<K> {
        Avl::sorted_keys(self)
    }

    fn comparisons(&self) -> u64 {
        Avl::comparisons(self)
    }

    fn rotations(&self) -> u64 {
        Avl::rotations(self)
    }

    fn recolors(&self) -> u64 {
        Avl::recolors(self)
    }

    fn collisions(&self) -> u64 {
        Avl::collisions(self)
    }

    fn metrics(&self) -> Metrics {
        Avl::metrics(self)
    }
}

/// AvlNode corresponds to a single entry in Avl instance. `height` is
/// 1-based, a leaf stores 1 and a missing subtree counts as 0.
#[derive(Clone)]
pub struct AvlNode<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    key: K,
    value: V,
    height: usize,
    left: Option<Box<AvlNode<K, V>>>,  // store: left child
    right: Option<Box<AvlNode<K, V>>>, // store: right child
}

impl<K, V> AvlNode<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    fn new(key: K, value: V) -> Box<AvlNode<K, V>> {
        Box::new(AvlNode {
            key,
            value,
            height: 1,
            left: None,
            right: None,
        })
    }
}
