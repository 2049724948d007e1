use std::{borrow::Borrow, cell::Cell, cmp::Ordering, mem};

use rand::Rng;

use crate::depth::Depth;
use crate::dict::{Dictionary, Metrics, Stats};
use crate::error::IndexError;

// Slot 0 of the arena is the shared sentinel standing in for every
// missing child. It is always BLACK and never holds an entry.
const NIL: usize = 0;

#[derive(Clone, Copy, PartialEq)]
enum Color {
    Red,
    Black,
}

/// Rbt manage a single instance of in-memory index using a
/// [red-black][rbt] tree. Nodes live in a growable arena and point at
/// each other by slot index, so the parent back-reference needed by the
/// fixup walks stays a plain non-owning index.
///
/// [rbt]: https://en.wikipedia.org/wiki/Red%E2%80%93black_tree
#[derive(Clone)]
pub struct Rbt<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    name: String,
    nodes: Vec<RbNode<K, V>>,
    free: Vec<usize>, // recycled slots, most recently freed last.
    root: usize,
    n_count: usize, // number of entries in the tree.
    comparisons: Cell<u64>,
    rotations: u64,
    recolors: u64,
}

impl<K, V> Rbt<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    /// Create an empty instance of Rbt, identified by `name`.
    /// Applications can choose unique names.
    pub fn new<S>(name: S) -> Rbt<K, V>
    where
        S: AsRef<str>,
    {
        Rbt {
            name: name.as_ref().to_string(),
            nodes: vec![RbNode::sentinel()],
            free: Default::default(),
            root: NIL,
            n_count: Default::default(),
            comparisons: Default::default(),
            rotations: Default::default(),
            recolors: Default::default(),
        }
    }
}

/// Maintenance API.
impl<K, V> Rbt<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    /// Identify this instance. Applications can choose unique names while
    /// creating Rbt instances.
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

    /// Drop every entry and reset all counters to zero. Only the
    /// sentinel slot survives.
    pub fn clear(&mut self) {
        self.nodes.truncate(1);
        self.nodes[NIL] = RbNode::sentinel();
        self.free.clear();
        self.root = NIL;
        self.n_count = 0;
        self.comparisons.set(0);
        self.rotations = 0;
        self.recolors = 0;
    }

    /// Cumulative key comparisons, including those made by read-only
    /// lookups.
    #[inline]
    pub fn comparisons(&self) -> u64 {
        self.comparisons.get()
    }

    /// Cumulative single rotations across inserts and deletes.
    #[inline]
    pub fn rotations(&self) -> u64 {
        self.rotations
    }

    /// Cumulative node recolor operations performed by the fixup walks.
    #[inline]
    pub fn recolors(&self) -> u64 {
        self.recolors
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
        if self.root == NIL {
            None
        } else {
            Some(self.key(self.root).clone())
        }
    }
}

/// Write operations on Rbt instance.
impl<K, V> Rbt<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    /// Set value for key. If there is an existing entry for key,
    /// overwrite the old value with new value and return the old value.
    /// An overwrite touches no links or colors.
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        let mut parent = NIL;
        let mut cursor = self.root;
        while cursor != NIL {
            parent = cursor;
            cursor = match key.cmp(self.key(cursor)) {
                Ordering::Less => {
                    self.incr_comparisons(1);
                    self.nodes[cursor].left
                }
                Ordering::Greater => {
                    self.incr_comparisons(2);
                    self.nodes[cursor].right
                }
                Ordering::Equal => {
                    self.incr_comparisons(2);
                    let entry = self.entry_mut(cursor);
                    return Some(mem::replace(&mut entry.1, value));
                }
            };
        }

        let node = self.alloc(key, value, parent);
        self.n_count += 1;

        if parent == NIL {
            self.root = node;
        } else if self.key(node).lt(self.key(parent)) {
            self.nodes[parent].left = node;
        } else {
            self.nodes[parent].right = node;
        }

        if self.nodes[node].parent == NIL {
            // first entry, the root must be BLACK.
            self.recolor(node, Color::Black);
            return None;
        }
        self.insert_fix(node);
        None
    }

    /// Delete key from this instance and return its value. If key is
    /// not present, then delete is effectively a no-op.
    pub fn delete<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.find(key);
        if node == NIL {
            None
        } else {
            Some(self.remove(node))
        }
    }

    /// Validate the red-black tree with following rules:
    ///
    /// * Root must be BLACK.
    /// * From root to any leaf, no consecutive REDs allowed in its path.
    /// * Number of BLACKs should be same under left child and right child.
    /// * Make sure keys are in sorted order.
    ///
    /// Additionally return full statistics on the tree. Refer to [`Stats`]
    /// for more information.
    pub fn validate(&self) -> Result<Stats, IndexError<K>> {
        if self.is_red(self.root) {
            return Err(IndexError::RedRoot);
        }
        let mut stats = Stats::new(self.n_count, mem::size_of::<RbNode<K, V>>());
        stats.set_depths(Depth::new());
        let blacks = self.validate_tree(self.root, false, 0, 0, &mut stats)?;
        stats.set_blacks(blacks);
        Ok(stats)
    }
}

/// Read operations on Rbt instance.
impl<K, V> Rbt<K, V>
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
        let node = self.find(key);
        if node == NIL {
            Err(IndexError::KeyNotFound)
        } else {
            Ok(self.entry(node).1.clone())
        }
    }

    /// Check whether key is present in this instance.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key) != NIL
    }

    /// Return all keys in ascending order.
    pub fn sorted_keys(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.n_count);
        self.collect_keys(self.root, &mut keys);
        keys
    }

    /// Return a random entry from this index.
    pub fn random<R: Rng>(&self, rng: &mut R) -> Option<(K, V)> {
        if self.root == NIL {
            return None;
        }
        let mut node = self.root;

        let mut at_depth = rng.gen::<u8>() % 40;
        loop {
            let next = match rng.gen::<u8>() % 2 {
                0 => self.nodes[node].left,
                1 => self.nodes[node].right,
                _ => unreachable!(),
            };
            if at_depth == 0 || next == NIL {
                let entry = self.entry(node);
                break Some((entry.0.clone(), entry.1.clone()));
            }
            at_depth -= 1;
            node = next;
        }
    }
}

impl<K, V> Rbt<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    #[inline]
    fn incr_comparisons(&self, n: u64) {
        self.comparisons.set(self.comparisons.get() + n)
    }

    #[inline]
    fn is_red(&self, node: usize) -> bool {
        self.nodes[node].color == Color::Red
    }

    #[inline]
    fn is_black(&self, node: usize) -> bool {
        self.nodes[node].color == Color::Black
    }

    // Counted color assignment. Plain field writes are reserved for the
    // two inherited-color cases that the recolor counter skips.
    #[inline]
    fn recolor(&mut self, node: usize, color: Color) {
        self.nodes[node].color = color;
        self.recolors += 1;
    }

    fn entry(&self, node: usize) -> &(K, V) {
        match &self.nodes[node].entry {
            Some(entry) => entry,
            None => panic!("entry(): lookup on the sentinel, call the programmer"),
        }
    }

    fn entry_mut(&mut self, node: usize) -> &mut (K, V) {
        match &mut self.nodes[node].entry {
            Some(entry) => entry,
            None => panic!("entry_mut(): lookup on the sentinel, call the programmer"),
        }
    }

    #[inline]
    fn key(&self, node: usize) -> &K {
        &self.entry(node).0
    }

    fn alloc(&mut self, key: K, value: V, parent: usize) -> usize {
        let node = RbNode {
            entry: Some((key, value)),
            color: Color::Red,
            parent,
            left: NIL,
            right: NIL,
        };
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn find<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cursor = self.root;
        while cursor != NIL {
            cursor = match key.cmp(self.key(cursor).borrow()) {
                Ordering::Less => {
                    self.incr_comparisons(1);
                    self.nodes[cursor].left
                }
                Ordering::Greater => {
                    self.incr_comparisons(2);
                    self.nodes[cursor].right
                }
                Ordering::Equal => {
                    self.incr_comparisons(2);
                    return cursor;
                }
            };
        }
        NIL
    }

    fn minimum(&self, mut node: usize) -> usize {
        while self.nodes[node].left != NIL {
            node = self.nodes[node].left;
        }
        node
    }

    //              x                           y
    //             / \                         / \
    //            a   y          ==>          x   c
    //               / \                     / \
    //              b   c                   a   b
    //
    fn rotate_left(&mut self, x: usize) {
        self.rotations += 1;

        let y = self.nodes[x].right;
        if y == NIL {
            panic!("rotate_left(): no pivot child, call the programmer");
        }
        let b = self.nodes[y].left;
        self.nodes[x].right = b;
        if b != NIL {
            self.nodes[b].parent = x;
        }

        let xp = self.nodes[x].parent;
        self.nodes[y].parent = xp;
        if xp == NIL {
            self.root = y;
        } else if self.nodes[xp].left == x {
            self.nodes[xp].left = y;
        } else {
            self.nodes[xp].right = y;
        }

        self.nodes[y].left = x;
        self.nodes[x].parent = y;
    }

    //                x                       y
    //               / \                     / \
    //              y   c        ==>        a   x
    //             / \                         / \
    //            a   b                       b   c
    //
    fn rotate_right(&mut self, x: usize) {
        self.rotations += 1;

        let y = self.nodes[x].left;
        if y == NIL {
            panic!("rotate_right(): no pivot child, call the programmer");
        }
        let b = self.nodes[y].right;
        self.nodes[x].left = b;
        if b != NIL {
            self.nodes[b].parent = x;
        }

        let xp = self.nodes[x].parent;
        self.nodes[y].parent = xp;
        if xp == NIL {
            self.root = y;
        } else if self.nodes[xp].right == x {
            self.nodes[xp].right = y;
        } else {
            self.nodes[xp].left = y;
        }

        self.nodes[y].right = x;
        self.nodes[x].parent = y;
    }

    // Walk up from the freshly attached RED node while its parent is
    // RED, recoloring around a RED uncle or rotating at the grandparent
    // around a BLACK one.
    fn insert_fix(&mut self, mut k: usize) {
        while k != self.root && self.is_red(self.nodes[k].parent) {
            let parent = self.nodes[k].parent;
            let grand = self.nodes[parent].parent;
            if parent == self.nodes[grand].right {
                let uncle = self.nodes[grand].left;
                if self.is_red(uncle) {
                    self.recolor(uncle, Color::Black);
                    self.recolor(parent, Color::Black);
                    self.recolor(grand, Color::Red);
                    k = grand;
                } else {
                    if k == self.nodes[parent].left {
                        // zig-zag, straighten the path first.
                        k = parent;
                        self.rotate_right(k);
                    }
                    let parent = self.nodes[k].parent;
                    let grand = self.nodes[parent].parent;
                    self.recolor(parent, Color::Black);
                    self.recolor(grand, Color::Red);
                    self.rotate_left(grand);
                }
            } else {
                let uncle = self.nodes[grand].right;
                if self.is_red(uncle) {
                    self.recolor(uncle, Color::Black);
                    self.recolor(parent, Color::Black);
                    self.recolor(grand, Color::Red);
                    k = grand;
                } else {
                    if k == self.nodes[parent].right {
                        k = parent;
                        self.rotate_left(k);
                    }
                    let parent = self.nodes[k].parent;
                    let grand = self.nodes[parent].parent;
                    self.recolor(parent, Color::Black);
                    self.recolor(grand, Color::Red);
                    self.rotate_right(grand);
                }
            }
        }
        if self.is_red(self.root) {
            let root = self.root;
            self.recolor(root, Color::Black);
        }
    }

    // Replace the subtree rooted at u with the one rooted at v. Writes
    // v's parent link even when v is the sentinel, the delete fixup
    // reads it to walk back up.
    fn transplant(&mut self, u: usize, v: usize) {
        let up = self.nodes[u].parent;
        if up == NIL {
            self.root = v;
        } else if self.nodes[up].left == u {
            self.nodes[up].left = v;
        } else {
            self.nodes[up].right = v;
        }
        self.nodes[v].parent = up;
    }

    fn remove(&mut self, z: usize) -> V {
        let mut y = z;
        let mut y_original = self.nodes[y].color;
        let x;

        if self.nodes[z].left == NIL {
            x = self.nodes[z].right;
            self.transplant(z, x);
        } else if self.nodes[z].right == NIL {
            x = self.nodes[z].left;
            self.transplant(z, x);
        } else {
            // two children: the in-order successor takes z's place and
            // its own (at most one) child takes the successor's.
            y = self.minimum(self.nodes[z].right);
            y_original = self.nodes[y].color;
            x = self.nodes[y].right;
            if self.nodes[y].parent == z {
                self.nodes[x].parent = y;
            } else {
                let yr = self.nodes[y].right;
                self.transplant(y, yr);
                let zr = self.nodes[z].right;
                self.nodes[y].right = zr;
                self.nodes[zr].parent = y;
            }
            self.transplant(z, y);
            let zl = self.nodes[z].left;
            self.nodes[y].left = zl;
            self.nodes[zl].parent = y;
            // y inherits z's color, the recolor counter skips this.
            self.nodes[y].color = self.nodes[z].color;
        }

        let (_, value) = match self.nodes[z].entry.take() {
            Some(entry) => entry,
            None => panic!("remove(): freeing the sentinel, call the programmer"),
        };
        self.free_slot(z);
        self.n_count -= 1;

        if y_original == Color::Black {
            self.delete_fix(x);
        }
        value
    }

    // Removing a BLACK node leaves one path a BLACK short. Walk up from
    // the node that took its place, borrowing from or rotating around
    // the sibling until the deficiency is absorbed.
    fn delete_fix(&mut self, mut x: usize) {
        while x != self.root && self.is_black(x) {
            let parent = self.nodes[x].parent;
            if x == self.nodes[parent].left {
                let mut s = self.nodes[parent].right;
                if self.is_red(s) {
                    self.recolor(s, Color::Black);
                    self.recolor(parent, Color::Red);
                    self.rotate_left(parent);
                    s = self.nodes[self.nodes[x].parent].right;
                }

                let (sl, sr) = (self.nodes[s].left, self.nodes[s].right);
                if self.is_black(sl) && self.is_black(sr) {
                    // push the deficiency up to the parent.
                    self.recolor(s, Color::Red);
                    x = self.nodes[x].parent;
                } else {
                    if self.is_black(sr) {
                        self.recolor(sl, Color::Black);
                        self.recolor(s, Color::Red);
                        self.rotate_right(s);
                        s = self.nodes[self.nodes[x].parent].right;
                    }
                    let parent = self.nodes[x].parent;
                    // sibling inherits the parent's color, not counted.
                    self.nodes[s].color = self.nodes[parent].color;
                    self.recolor(parent, Color::Black);
                    let sr = self.nodes[s].right;
                    self.recolor(sr, Color::Black);
                    self.rotate_left(parent);
                    x = self.root;
                }
            } else {
                let mut s = self.nodes[parent].left;
                if self.is_red(s) {
                    self.recolor(s, Color::Black);
                    self.recolor(parent, Color::Red);
                    self.rotate_right(parent);
                    s = self.nodes[self.nodes[x].parent].left;
                }

                let (sl, sr) = (self.nodes[s].left, self.nodes[s].right);
                if self.is_black(sl) && self.is_black(sr) {
                    self.recolor(s, Color::Red);
                    x = self.nodes[x].parent;
                } else {
                    if self.is_black(sl) {
                        self.recolor(sr, Color::Black);
                        self.recolor(s, Color::Red);
                        self.rotate_left(s);
                        s = self.nodes[self.nodes[x].parent].left;
                    }
                    let parent = self.nodes[x].parent;
                    self.nodes[s].color = self.nodes[parent].color;
                    self.recolor(parent, Color::Black);
                    let sl = self.nodes[s].left;
                    self.recolor(sl, Color::Black);
                    self.rotate_right(parent);
                    x = self.root;
                }
            }
        }
        if self.is_red(x) {
            self.recolor(x, Color::Black);
        }
    }

    fn free_slot(&mut self, node: usize) {
        self.nodes[node] = RbNode::sentinel();
        self.free.push(node);
    }

    fn collect_keys(&self, node: usize, keys: &mut Vec<K>) {
        if node != NIL {
            self.collect_keys(self.nodes[node].left, keys);
            keys.push(self.key(node).clone());
            self.collect_keys(self.nodes[node].right, keys);
        }
    }

    fn validate_tree(
        &self,
        node: usize,
        fromred: bool,
        mut nb: usize,
        depth: usize,
        stats: &mut Stats,
    ) -> Result<usize, IndexError<K>> {
        if node == NIL {
            stats.depths.as_mut().unwrap().sample(depth);
            return Ok(nb);
        }

        let red = self.is_red(node);
        if fromred && red {
            return Err(IndexError::ConsecutiveReds);
        }
        if !red {
            nb += 1;
        }
        let (left, right) = (self.nodes[node].left, self.nodes[node].right);
        let lblacks = self.validate_tree(left, red, nb, depth + 1, stats)?;
        let rblacks = self.validate_tree(right, red, nb, depth + 1, stats)?;
        if lblacks != rblacks {
            let err = format!("left: {} right: {}", lblacks, rblacks);
            return Err(IndexError::UnbalancedBlacks(err));
        }
        if left != NIL && self.key(left).ge(self.key(node)) {
            let (lkey, parent) = (self.key(left).clone(), self.key(node).clone());
            return Err(IndexError::SortError(lkey, parent));
        }
        if right != NIL && self.key(right).le(self.key(node)) {
            let (rkey, parent) = (self.key(right).clone(), self.key(node).clone());
            return Err(IndexError::SortError(rkey, parent));
        }
        Ok(lblacks)
    }
}

impl<K, V> Dictionary<K, V> for Rbt<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    fn set(&mut self, key: K, value: V) -> Option<V> {
        Rbt::set(self, key, value)
    }

    fn delete(&mut self, key: &K) -> Option<V> {
        Rbt::delete(self, key)
    }

    fn get(&self, key: &K) -> Result<V, IndexError<K>> {
        Rbt::get(self, key)
    }

    fn contains(&self, key: &K) -> bool {
        Rbt::contains(self, key)
    }

    fn len(&self) -> usize {
        Rbt::len(self)
    }

    fn is_empty(&self) -> bool {
        Rbt::is_empty(self)
    }

    fn sorted_keys(&self) -> Vec<K> {
        Rbt::sorted_keys(self)
    }

    fn comparisons(&self) -> u64 {
        Rbt::comparisons(self)
    }

    fn rotations(&self) -> u64 {
        Rbt::rotations(self)
    }

    fn recolors(&self) -> u64 {
        Rbt::recolors(self)
    }

    fn collisions(&self) -> u64 {
        Rbt::collisions(self)
    }

    fn metrics(&self) -> Metrics {
        Rbt::metrics(self)
    }
}

// Arena slot. `entry` is None only for the sentinel and freed slots,
// links are slot indices and never own anything.
#[derive(Clone)]
struct RbNode<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    entry: Option<(K, V)>,
    color: Color,
    parent: usize,
    left: usize,
    right: usize,
}

impl<K, V> RbNode<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    fn sentinel() -> RbNode<K, V> {
        RbNode {
            entry: None,
            color: Color::Black,
            parent: NIL,
            left: NIL,
            right: NIL,
        }
    }
}
