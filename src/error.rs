/// IndexError enumerates over all possible errors that this package
/// shall return.
#[derive(Debug, PartialEq)]
pub enum IndexError<K>
where
    K: Clone + Ord,
{
    /// Key is not present in the index. The only error a reader of the
    /// dictionary contract needs to handle.
    KeyNotFound,
    /// Fatal case, a RED node has a RED child.
    ConsecutiveReds,
    /// Fatal case, root of the red-black tree is not BLACK.
    RedRoot,
    /// Fatal case, not all paths carry the same number of BLACK nodes.
    /// The String component of this variant can be used for debugging.
    UnbalancedBlacks(String),
    /// Fatal case, an AVL node's subtree heights differ by more than one.
    /// The String component of this variant can be used for debugging.
    UnbalancedHeights(String),
    /// Fatal case, index entries are not in sort-order.
    SortError(K, K),
}
