//! Reduced transmission trees.
//!
//! A [`ReducedTree`] is the output of
//! [`LineageTree::subsample_tree`](crate::LineageTree::subsample_tree):
//! a self-contained copy of one source component restricted to the
//! sampled lineages and the ancestry connecting them.

use bdphylo_core::{Lineage, Payload, Time};

use crate::lineage::NodeIndex;

/// A node of a reduced transmission tree.
///
/// Fields mirror the source node at extraction time.
pub struct ReducedNode<L, D> {
    pub lng: L,
    pub data: D,
    /// Birth time.
    pub t: Time,
    /// Sampling time; meaningful only if `sampled`.
    pub t_sample: Time,
    /// Time at which the lineage branched off the chain leading to
    /// its current parent.
    pub t_branch_parent: Time,
    pub loc_sample: String,
    pub parent: Option<NodeIndex>,
    pub children: Vec<NodeIndex>,
    pub extant: bool,
    pub sampled: bool,
}

/// A minimal subtree connecting the sampled lineages of one source
/// component.
pub struct ReducedTree<L, D> {
    nodes: Vec<Option<ReducedNode<L, D>>>,
    root: NodeIndex,
}

impl<L, D> ReducedTree<L, D>
where
    L: Lineage,
    D: Payload,
{
    pub(crate) fn from_parts(nodes: Vec<Option<ReducedNode<L, D>>>, root: NodeIndex) -> Self {
        Self { nodes, root }
    }

    /// The root of the tree.
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// Access a node.
    ///
    /// # Panics
    ///
    /// Panics if `idx` does not refer to a live node.
    pub fn node(&self, idx: NodeIndex) -> &ReducedNode<L, D> {
        self.nodes[idx.0].as_ref().expect("dangling node index")
    }

    /// The number of live nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    /// Indices of all childless nodes.
    pub fn leaves(&self) -> Vec<NodeIndex> {
        (0..self.nodes.len())
            .filter(|i| {
                self.nodes[*i]
                    .as_ref()
                    .map(|n| n.children.is_empty())
                    .unwrap_or(false)
            })
            .map(NodeIndex)
            .collect()
    }

    fn node_mut(&mut self, idx: NodeIndex) -> &mut ReducedNode<L, D> {
        self.nodes[idx.0].as_mut().expect("dangling node index")
    }

    fn release(&mut self, idx: NodeIndex) {
        let slot = self.nodes[idx.0].take();
        debug_assert!(slot.is_some());
    }

    fn erase_child(&mut self, parent: NodeIndex, child: NodeIndex) {
        let children = &mut self.node_mut(parent).children;
        if let Some(pos) = children.iter().position(|c| *c == child) {
            children.swap_remove(pos);
        }
    }

    /// Collapse intermediate unsampled nodes left behind by the
    /// restricted copy.
    ///
    /// Extraction keeps every ancestor of a sampled lineage, so a
    /// node whose other subtrees carried no samples comes out with
    /// a single child.  From each leaf, walk to the root and splice
    /// out any unsampled single-child node on the way; the child
    /// inherits the branching time exactly as in the online merge
    /// move.  The pass is idempotent.
    pub(crate) fn eliminate_redundant(&mut self) {
        for leaf in self.leaves() {
            let mut cursor = self.node(leaf).parent;
            while let Some(mid) = cursor {
                let (nchildren, sampled, parent) = {
                    let m = self.node(mid);
                    (m.children.len(), m.sampled, m.parent)
                };
                if nchildren == 1 && !sampled {
                    let child = self.node(mid).children[0];
                    match parent {
                        Some(p) => {
                            let t_branch_parent = self.node(mid).t_branch_parent;
                            let node = self.node_mut(child);
                            node.parent = Some(p);
                            node.t_branch_parent = t_branch_parent;
                            self.erase_child(p, mid);
                            self.node_mut(p).children.push(child);
                            self.release(mid);
                            cursor = Some(p);
                        }
                        None => {
                            // promote the only child to root
                            let t = self.node(child).t;
                            let node = self.node_mut(child);
                            node.parent = None;
                            node.t_branch_parent = t;
                            self.release(mid);
                            self.root = child;
                            cursor = None;
                        }
                    }
                } else {
                    cursor = parent;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::lineage::LineageTree;
    use bdphylo_core::Time;

    fn t(value: f64) -> Time {
        Time::from(value)
    }

    // Root with three children, two of them sampled: the reduction
    // is exactly the root plus the two sampled children.
    #[test]
    fn test_subsample_keeps_minimal_ancestry() {
        let mut tree = LineageTree::<i32, i32>::new();
        tree.add_extant_external(t(0.0), 1, 0).unwrap();
        tree.add_extant(t(1.0), 2, 0, &1).unwrap();
        tree.add_extant(t(2.0), 3, 0, &1).unwrap();
        tree.add_extant(t(3.0), 4, 0, &1).unwrap();
        tree.sample(&3, t(2.5), None).unwrap();
        tree.sample(&4, t(3.5), None).unwrap();

        let reduced = tree.subsample_tree();
        assert_eq!(reduced.len(), 1);
        let rt = &reduced[0];
        assert_eq!(rt.num_nodes(), 3);

        let root = rt.node(rt.root());
        assert_eq!(root.lng, 1);
        assert_eq!(root.children.len(), 2);
        let lngs: Vec<i32> = root.children.iter().map(|c| rt.node(*c).lng).collect();
        assert!(lngs.contains(&3));
        assert!(lngs.contains(&4));
        assert!(!lngs.contains(&2));

        // the source tree is unaffected
        assert_eq!(tree.num_nodes(), 4);
        tree.check_integrity().unwrap();
    }

    // A chain root -> mid -> sampled leaf collapses to the leaf
    // alone; re-running the elimination changes nothing.
    #[test]
    fn test_elimination_collapses_chains_and_is_idempotent() {
        let mut tree = LineageTree::<i32, i32>::new();
        tree.add_extant_external(t(0.0), 1, 0).unwrap();
        tree.add_extant(t(1.0), 2, 0, &1).unwrap();
        tree.add_extant(t(2.0), 3, 0, &2).unwrap();
        tree.sample(&3, t(2.5), None).unwrap();

        let mut reduced = tree.subsample_tree();
        assert_eq!(reduced.len(), 1);
        let rt = &mut reduced[0];
        assert_eq!(rt.num_nodes(), 1);
        let root = rt.node(rt.root());
        assert_eq!(root.lng, 3);
        assert!(root.sampled);
        assert!(root.parent.is_none());
        assert_eq!(root.t_branch_parent, root.t);

        rt.eliminate_redundant();
        assert_eq!(rt.num_nodes(), 1);
        assert_eq!(rt.node(rt.root()).lng, 3);
    }

    // An unsampled ancestor whose second subtree carried no samples
    // comes out of extraction with one child and must be spliced
    // away, its branching time flowing to the child.
    #[test]
    fn test_elimination_inherits_branching_time() {
        let mut tree = LineageTree::<i32, i32>::new();
        tree.add_extant_external(t(0.0), 1, 0).unwrap();
        tree.add_extant(t(1.0), 2, 0, &1).unwrap();
        tree.add_extant(t(2.0), 3, 0, &1).unwrap();
        tree.add_extant(t(3.0), 4, 0, &2).unwrap();
        tree.add_extant(t(4.0), 5, 0, &2).unwrap();
        tree.sample(&4, t(3.5), None).unwrap();
        tree.sample(&5, t(4.5), None).unwrap();

        // 3 is extant but unsampled, so only the subtree through 2
        // is needed; the copied root 1 has a single child 2.
        let reduced = tree.subsample_tree();
        assert_eq!(reduced.len(), 1);
        let rt = &reduced[0];
        assert_eq!(rt.num_nodes(), 3);
        let root = rt.node(rt.root());
        assert_eq!(root.lng, 2);
        assert!(root.parent.is_none());
        // promoted to root: branching time resets to birth time
        assert_eq!(root.t_branch_parent, root.t);
        assert_eq!(root.children.len(), 2);
        for c in &root.children {
            assert!(rt.node(*c).sampled);
        }
    }

    #[test]
    fn test_roots_without_samples_are_skipped() {
        let mut tree = LineageTree::<i32, i32>::new();
        tree.add_extant_external(t(0.0), 1, 0).unwrap();
        tree.add_extant_external(t(0.0), 100, 0).unwrap();
        tree.add_extant(t(1.0), 2, 0, &1).unwrap();
        tree.sample(&2, t(1.5), None).unwrap();

        let reduced = tree.subsample_tree();
        assert_eq!(reduced.len(), 1);
        assert_eq!(reduced[0].node(reduced[0].root()).lng, 2);
    }
}
