//! Traversal and bottom-up fold utilities.
//!
//! Anything shaped like a forest of indexed nodes can implement
//! [`Hierarchy`]: the full [`Tree`](super::Tree) does, and so does the
//! per-bucket forest built by the tiling engine. Coverage propagation and
//! level-of-detail aggregation are both expressed as [`fold_up`] over one
//! of these.
//!
//! All traversals are iterative; taxonomies have lineages thousands of
//! nodes deep.

/// A forest of nodes addressed by dense indices `0..node_count()`.
pub trait Hierarchy {
    /// Number of nodes.
    fn node_count(&self) -> usize;

    /// Roots, in traversal order.
    fn roots(&self) -> &[usize];

    /// Children of `node`, in traversal order.
    fn children_of(&self, node: usize) -> &[usize];
}

/// Depth-first pre-order: each node before its descendants, children
/// visited in stored order, roots in stored order.
pub fn pre_order<H: Hierarchy + ?Sized>(hierarchy: &H) -> Vec<usize> {
    let mut order = Vec::with_capacity(hierarchy.node_count());
    let mut stack: Vec<usize> = hierarchy.roots().iter().rev().copied().collect();

    while let Some(node) = stack.pop() {
        order.push(node);
        stack.extend(hierarchy.children_of(node).iter().rev());
    }

    order
}

/// An order in which every node comes after all of its descendants.
///
/// This is the reverse of [`pre_order`], which is sufficient for folds
/// that only need children finalized before their parent.
pub fn post_order<H: Hierarchy + ?Sized>(hierarchy: &H) -> Vec<usize> {
    let mut order = pre_order(hierarchy);
    order.reverse();
    order
}

/// Depth of every node (roots at 0), computed top-down.
pub fn depths<H: Hierarchy + ?Sized>(hierarchy: &H) -> Vec<u32> {
    let mut depth = vec![0u32; hierarchy.node_count()];
    for node in pre_order(hierarchy) {
        let child_depth = depth[node] + 1;
        for &child in hierarchy.children_of(node) {
            depth[child] = child_depth;
        }
    }
    depth
}

/// Bottom-up fold.
///
/// Every node starts from `seed(node)`; then, children before parents,
/// `combine(parent_value, child_value)` is applied once per child.
///
/// # Example
///
/// ```
/// use lifetiles::tree::{traverse, Edge, TreeBuilder};
///
/// let tree = TreeBuilder::from_edges([Edge::root(1), Edge::new(1, 2), Edge::new(1, 3)]).unwrap();
/// let sizes = traverse::fold_up(&tree, |_| 1usize, |acc, child| *acc += *child);
/// assert_eq!(sizes[tree.root()], 3);
/// ```
pub fn fold_up<H, T, S, C>(hierarchy: &H, mut seed: S, mut combine: C) -> Vec<T>
where
    H: Hierarchy + ?Sized,
    S: FnMut(usize) -> T,
    C: FnMut(&mut T, &T),
{
    let mut values: Vec<T> = (0..hierarchy.node_count()).map(&mut seed).collect();

    for node in post_order(hierarchy) {
        for &child in hierarchy.children_of(node) {
            let (parent_value, child_value) = pair_mut(&mut values, node, child);
            combine(parent_value, child_value);
        }
    }

    values
}

/// Mutable access to `values[a]` alongside shared access to `values[b]`.
fn pair_mut<T>(values: &mut [T], a: usize, b: usize) -> (&mut T, &T) {
    debug_assert_ne!(a, b);
    if a < b {
        let (left, right) = values.split_at_mut(b);
        (&mut left[a], &right[0])
    } else {
        let (left, right) = values.split_at_mut(a);
        (&mut right[0], &left[b])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hand-built forest: 0 -> [1, 2], 1 -> [3], plus a second root 4.
    struct Forest {
        roots: Vec<usize>,
        children: Vec<Vec<usize>>,
    }

    impl Hierarchy for Forest {
        fn node_count(&self) -> usize {
            self.children.len()
        }

        fn roots(&self) -> &[usize] {
            &self.roots
        }

        fn children_of(&self, node: usize) -> &[usize] {
            &self.children[node]
        }
    }

    fn forest() -> Forest {
        Forest {
            roots: vec![0, 4],
            children: vec![vec![1, 2], vec![3], vec![], vec![], vec![]],
        }
    }

    #[test]
    fn test_pre_order_visits_children_in_order() {
        assert_eq!(pre_order(&forest()), vec![0, 1, 3, 2, 4]);
    }

    #[test]
    fn test_post_order_children_first() {
        let order = post_order(&forest());
        let position = |n: usize| order.iter().position(|&x| x == n).unwrap();
        assert!(position(3) < position(1));
        assert!(position(1) < position(0));
        assert!(position(2) < position(0));
    }

    #[test]
    fn test_depths() {
        assert_eq!(depths(&forest()), vec![0, 1, 1, 2, 0]);
    }

    #[test]
    fn test_fold_up_counts_subtree_sizes() {
        let sizes = fold_up(&forest(), |_| 1usize, |acc, child| *acc += *child);
        assert_eq!(sizes, vec![4, 2, 1, 1, 1]);
    }

    #[test]
    fn test_fold_up_max() {
        let seeds = [0u8, 0, 3, 5, 1];
        let best = fold_up(&forest(), |n| seeds[n], |acc, child| *acc = (*acc).max(*child));
        assert_eq!(best, vec![5, 5, 3, 5, 1]);
    }

    #[test]
    fn test_pair_mut_both_directions() {
        let mut values = vec![1, 2, 3];
        let (a, b) = pair_mut(&mut values, 0, 2);
        *a += *b;
        let (a, b) = pair_mut(&mut values, 2, 1);
        *a += *b;
        assert_eq!(values, vec![4, 2, 5]);
    }
}
