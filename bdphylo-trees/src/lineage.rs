//! The online transmission-tree manager.
//!
//! A [`LineageTree`] records every infection event of a running
//! simulation and eagerly prunes branches that can no longer
//! contribute to a sampled phylogeny: an extinct, unsampled node is
//! kept only while it has at least two surviving children.
//!
//! Nodes live in an arena and refer to each other by [`NodeIndex`],
//! so parent back-references never fight the ownership of the
//! child vectors.

use std::collections::HashMap;
use std::collections::HashSet;

use bdphylo_core::{Lineage, Payload, Time};
use thiserror::Error;

use crate::reduced::{ReducedNode, ReducedTree};

/// Error type related to [`LineageTree`].
#[derive(Error, Debug, PartialEq)]
pub enum LineageTreeError {
    /// Returned when an operation names a lineage that is not extant.
    #[error("lineage is not extant")]
    UnknownLineage,
    /// Returned when inserting a lineage that is already extant.
    #[error("lineage is already extant")]
    DuplicateLineage,
    #[error("allocated node count does not match the arena")]
    /// Can be returned by [`LineageTree::check_integrity`]
    NodeCountMismatch,
    #[error("extant map does not match the extant nodes")]
    /// Can be returned by [`LineageTree::check_integrity`]
    ExtantMapMismatch,
    #[error("sampled set does not match the sampled nodes")]
    /// Can be returned by [`LineageTree::check_integrity`]
    SampledSetMismatch,
    #[error("root set does not match the parent-less nodes")]
    /// Can be returned by [`LineageTree::check_integrity`]
    RootSetMismatch,
    #[error("parent/child links are inconsistent")]
    /// Can be returned by [`LineageTree::check_integrity`]
    ChildParentLinkBroken,
    #[error("extinct unsampled node with fewer than two children")]
    /// Can be returned by [`LineageTree::check_integrity`]
    UnprunedInternalNode,
    #[error("branching time outside the parent/child interval")]
    /// Can be returned by [`LineageTree::check_integrity`]
    BranchTimeOrderViolation,
}

/// Result type for operations on lineage trees.
pub type LineageTreeResult<T> = std::result::Result<T, LineageTreeError>;

/// Index of a node slot in a tree arena.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, std::hash::Hash)]
pub struct NodeIndex(pub(crate) usize);

/// A node of a transmission tree.
///
/// `t` is the birth time.  `t_branch_parent` is the time at which
/// the lineage branched off the chain leading to its current
/// parent; merge moves make it differ from `t`.
pub(crate) struct LineageNode<L, D> {
    pub(crate) lng: L,
    pub(crate) data: D,
    pub(crate) t: Time,
    pub(crate) t_sample: Time,
    pub(crate) t_branch_parent: Time,
    pub(crate) loc_sample: String,
    pub(crate) parent: Option<NodeIndex>,
    pub(crate) children: Vec<NodeIndex>,
    pub(crate) extant: bool,
    pub(crate) sampled: bool,
    pub(crate) needed: bool,
}

impl<L, D> LineageNode<L, D> {
    fn new(lng: L, data: D, t: Time, extant: bool, parent: Option<NodeIndex>) -> Self {
        Self {
            lng,
            data,
            t,
            t_sample: Time::from(0.0),
            t_branch_parent: t,
            loc_sample: String::from("NA"),
            parent,
            children: vec![],
            extant,
            sampled: false,
            needed: false,
        }
    }
}

/// An incrementally pruned forest of transmission-tree nodes.
///
/// The tree owns all node storage.  Extant lineages are indexed by
/// key; sampled lineages are never deleted until [`reset`](Self::reset).
pub struct LineageTree<L, D> {
    nodes: Vec<Option<LineageNode<L, D>>>,
    free: Vec<NodeIndex>,
    extant: HashMap<L, NodeIndex>,
    roots: Vec<NodeIndex>,
    sampled: HashSet<L>,
    nnodes: usize,
}

impl<L, D> Default for LineageTree<L, D>
where
    L: Lineage,
    D: Payload,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<L, D> LineageTree<L, D>
where
    L: Lineage,
    D: Payload,
{
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: vec![],
            free: vec![],
            extant: HashMap::new(),
            roots: vec![],
            sampled: HashSet::new(),
            nnodes: 0,
        }
    }

    /// Add a lineage `lng` born at time `t` with no parent.
    ///
    /// Use for external introductions.
    pub fn add_extant_external(&mut self, t: Time, lng: L, data: D) -> LineageTreeResult<()> {
        if self.extant.contains_key(&lng) {
            return Err(LineageTreeError::DuplicateLineage);
        }
        let idx = self.alloc(LineageNode::new(lng.clone(), data, t, true, None));
        self.extant.insert(lng, idx);
        self.roots.push(idx);
        Ok(())
    }

    /// Add a lineage `lng` born at time `t` from parent `parent_lng`.
    ///
    /// Use after a transmission event.
    pub fn add_extant(&mut self, t: Time, lng: L, data: D, parent_lng: &L) -> LineageTreeResult<()> {
        if self.extant.contains_key(&lng) {
            return Err(LineageTreeError::DuplicateLineage);
        }
        let parent = *self
            .extant
            .get(parent_lng)
            .ok_or(LineageTreeError::UnknownLineage)?;
        let idx = self.alloc(LineageNode::new(lng.clone(), data, t, true, Some(parent)));
        self.node_mut(parent).children.push(idx);
        self.extant.insert(lng, idx);
        Ok(())
    }

    /// Mark lineage `lng` as sampled at time `t`.
    ///
    /// Returns `Ok(false)` if the lineage had been sampled already;
    /// a lineage is never sampled twice.  `loc` defaults to `"@"`.
    pub fn sample(&mut self, lng: &L, t: Time, loc: Option<&str>) -> LineageTreeResult<bool> {
        let idx = *self
            .extant
            .get(lng)
            .ok_or(LineageTreeError::UnknownLineage)?;
        if self.node(idx).sampled {
            return Ok(false);
        }
        let node = self.node_mut(idx);
        node.sampled = true;
        node.t_sample = t;
        node.loc_sample = String::from(loc.unwrap_or("@"));
        self.sampled.insert(lng.clone());
        Ok(true)
    }

    /// Remove lineage `lng` from the extant pool.
    ///
    /// A sampled node is kept in place.  An unsampled node is
    /// deleted, merged away, or retained as an internal skeleton
    /// depending on its child count, and the removal is broadcast
    /// up the tree.
    pub fn remove_extant(&mut self, lng: &L) -> LineageTreeResult<()> {
        let idx = self
            .extant
            .remove(lng)
            .ok_or(LineageTreeError::UnknownLineage)?;
        let (sampled, nchildren, parent) = {
            let node = self.node_mut(idx);
            node.extant = false;
            (node.sampled, node.children.len(), node.parent)
        };
        if sampled {
            return Ok(());
        }
        match nchildren {
            0 => match parent {
                Some(p) => {
                    self.notify_parent(p, idx, false);
                    self.release(idx);
                }
                None => {
                    self.remove_root(idx);
                    self.release(idx);
                }
            },
            1 => self.merge_parent_child(idx),
            _ => (),
        }
        Ok(())
    }

    /// Has `lng` been sampled?
    pub fn is_sampled(&self, lng: &L) -> bool {
        self.sampled.contains(lng)
    }

    /// Is `lng` currently extant?
    pub fn contains_extant(&self, lng: &L) -> bool {
        self.extant.contains_key(lng)
    }

    /// The number of extant lineages.
    pub fn num_extant(&self) -> usize {
        self.extant.len()
    }

    /// The number of allocated tree nodes.
    pub fn num_nodes(&self) -> usize {
        self.nnodes
    }

    /// The number of sampled lineages.
    pub fn num_sampled(&self) -> usize {
        self.sampled.len()
    }

    /// Extract the reduced transmission forest.
    ///
    /// For each root with at least one sampled descendant, returns a
    /// freshly allocated minimal subtree containing the sampled
    /// lineages and the ancestors required to connect them.  The
    /// source tree is unaffected apart from scratch flags.
    pub fn subsample_tree(&mut self) -> Vec<ReducedTree<L, D>> {
        let roots = self.roots.clone();
        let mut res = vec![];
        for root in roots {
            if !self.mark_needed(root) {
                continue;
            }
            let mut tree = self.extract_subtree(root);
            tree.eliminate_redundant();
            res.push(tree);
        }
        res
    }

    /// Delete every node and clear all bookkeeping.
    ///
    /// Use when the same tree instance is re-used across
    /// independent simulations.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.extant.clear();
        self.roots.clear();
        self.sampled.clear();
        self.nnodes = 0;
    }

    /// Validate the structural invariants of the tree.
    ///
    /// Intended for stochastic test suites; every public operation
    /// must leave the tree in a state that passes this check.
    pub fn check_integrity(&self) -> LineageTreeResult<()> {
        let live: Vec<usize> = (0..self.nodes.len())
            .filter(|i| self.nodes[*i].is_some())
            .collect();
        if live.len() != self.nnodes {
            return Err(LineageTreeError::NodeCountMismatch);
        }

        let num_extant_nodes = live
            .iter()
            .filter(|i| self.nodes[**i].as_ref().unwrap().extant)
            .count();
        if num_extant_nodes != self.extant.len() {
            return Err(LineageTreeError::ExtantMapMismatch);
        }
        for (lng, idx) in &self.extant {
            match self.nodes.get(idx.0).and_then(|slot| slot.as_ref()) {
                Some(node) if node.extant && node.lng == *lng => (),
                _ => return Err(LineageTreeError::ExtantMapMismatch),
            }
        }

        let num_sampled_nodes = live
            .iter()
            .filter(|i| self.nodes[**i].as_ref().unwrap().sampled)
            .count();
        if num_sampled_nodes != self.sampled.len() {
            return Err(LineageTreeError::SampledSetMismatch);
        }

        for i in &live {
            let node = self.nodes[*i].as_ref().unwrap();
            if node.sampled && !self.sampled.contains(&node.lng) {
                return Err(LineageTreeError::SampledSetMismatch);
            }
            match node.parent {
                None => {
                    if !self.roots.contains(&NodeIndex(*i)) {
                        return Err(LineageTreeError::RootSetMismatch);
                    }
                }
                Some(p) => {
                    let parent = match self.nodes.get(p.0).and_then(|slot| slot.as_ref()) {
                        Some(parent) => parent,
                        None => return Err(LineageTreeError::ChildParentLinkBroken),
                    };
                    let occurrences = parent
                        .children
                        .iter()
                        .filter(|c| **c == NodeIndex(*i))
                        .count();
                    if occurrences != 1 {
                        return Err(LineageTreeError::ChildParentLinkBroken);
                    }
                    if node.t_branch_parent < parent.t || node.t < node.t_branch_parent {
                        return Err(LineageTreeError::BranchTimeOrderViolation);
                    }
                }
            }
            for c in &node.children {
                match self.nodes.get(c.0).and_then(|slot| slot.as_ref()) {
                    Some(child) if child.parent == Some(NodeIndex(*i)) => (),
                    _ => return Err(LineageTreeError::ChildParentLinkBroken),
                }
            }
            if !node.extant && !node.sampled && node.children.len() < 2 {
                return Err(LineageTreeError::UnprunedInternalNode);
            }
        }

        for r in &self.roots {
            match self.nodes.get(r.0).and_then(|slot| slot.as_ref()) {
                Some(node) if node.parent.is_none() => (),
                _ => return Err(LineageTreeError::RootSetMismatch),
            }
        }

        Ok(())
    }

    fn node(&self, idx: NodeIndex) -> &LineageNode<L, D> {
        self.nodes[idx.0].as_ref().expect("dangling node index")
    }

    fn node_mut(&mut self, idx: NodeIndex) -> &mut LineageNode<L, D> {
        self.nodes[idx.0].as_mut().expect("dangling node index")
    }

    fn alloc(&mut self, node: LineageNode<L, D>) -> NodeIndex {
        self.nnodes += 1;
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx.0] = Some(node);
                idx
            }
            None => {
                self.nodes.push(Some(node));
                NodeIndex(self.nodes.len() - 1)
            }
        }
    }

    fn release(&mut self, idx: NodeIndex) {
        let slot = self.nodes[idx.0].take();
        debug_assert!(slot.is_some());
        self.free.push(idx);
        self.nnodes -= 1;
    }

    fn remove_root(&mut self, idx: NodeIndex) {
        if let Some(pos) = self.roots.iter().position(|r| *r == idx) {
            self.roots.swap_remove(pos);
        }
    }

    fn erase_child(&mut self, parent: NodeIndex, child: NodeIndex) {
        let children = &mut self.node_mut(parent).children;
        if let Some(pos) = children.iter().position(|c| *c == child) {
            children.swap_remove(pos);
        }
    }

    /// Broadcast the removal of `child` upward from `parent`.
    ///
    /// Walks the ancestor chain, deleting extinct unsampled nodes
    /// that drop to zero children and merging away those that drop
    /// to one.  Stops at the first extant or sampled ancestor, or
    /// at one that still branches.
    fn notify_parent(&mut self, parent: NodeIndex, child: NodeIndex, child_sampled: bool) {
        let mut parent = parent;
        let mut child = child;
        let mut child_sampled = child_sampled;
        loop {
            if !child_sampled {
                self.erase_child(parent, child);
            }
            let (extant, sampled, nchildren, grandparent) = {
                let p = self.node(parent);
                (p.extant, p.sampled, p.children.len(), p.parent)
            };
            if extant || sampled {
                return;
            }
            match nchildren {
                0 => match grandparent {
                    Some(g) => {
                        self.release(parent);
                        child = parent;
                        child_sampled = false;
                        parent = g;
                    }
                    None => {
                        self.remove_root(parent);
                        self.release(parent);
                        return;
                    }
                },
                1 => {
                    self.merge_parent_child(parent);
                    return;
                }
                _ => return,
            }
        }
    }

    /// Splice out `mid`, attaching its only child to `mid`'s parent.
    ///
    /// `mid` must be extinct, unsampled, and have exactly one child.
    /// The child inherits `mid`'s branching time; a promoted root
    /// resets its branching time to its own birth time.
    fn merge_parent_child(&mut self, mid: NodeIndex) {
        let (child, parent, t_branch_parent) = {
            let m = self.node(mid);
            debug_assert_eq!(m.children.len(), 1);
            debug_assert!(!m.extant);
            debug_assert!(!m.sampled);
            (m.children[0], m.parent, m.t_branch_parent)
        };
        match parent {
            Some(p) => {
                self.node_mut(child).parent = Some(p);
                self.node_mut(child).t_branch_parent = t_branch_parent;
                self.erase_child(p, mid);
                self.node_mut(p).children.push(child);
            }
            None => {
                // branching times are irrelevant for roots
                let t = self.node(child).t;
                let node = self.node_mut(child);
                node.parent = None;
                node.t_branch_parent = t;
                self.remove_root(mid);
                self.roots.push(child);
            }
        }
        self.release(mid);
    }

    /// Flag every node under `root` that is sampled or has a
    /// sampled descendant.  Returns whether `root` itself is
    /// flagged.  The flags are scratch state for
    /// [`subsample_tree`](Self::subsample_tree).
    fn mark_needed(&mut self, root: NodeIndex) -> bool {
        let mut stack = vec![(root, false)];
        while let Some((idx, children_done)) = stack.pop() {
            if children_done {
                let any_child_needed = self
                    .node(idx)
                    .children
                    .iter()
                    .any(|c| self.node(*c).needed);
                let node = self.node_mut(idx);
                node.needed = node.sampled || any_child_needed;
            } else {
                stack.push((idx, true));
                for &c in &self.node(idx).children {
                    stack.push((c, false));
                }
            }
        }
        self.node(root).needed
    }

    /// Deep-copy the subtree under `root` restricted to flagged
    /// children.
    fn extract_subtree(&self, root: NodeIndex) -> ReducedTree<L, D> {
        let mut nodes: Vec<Option<ReducedNode<L, D>>> = vec![];
        let mut stack = vec![(root, None::<NodeIndex>)];
        while let Some((src, copied_parent)) = stack.pop() {
            let node = self.node(src);
            let ridx = NodeIndex(nodes.len());
            nodes.push(Some(ReducedNode {
                lng: node.lng.clone(),
                data: node.data.clone(),
                t: node.t,
                t_sample: node.t_sample,
                t_branch_parent: node.t_branch_parent,
                loc_sample: node.loc_sample.clone(),
                parent: copied_parent,
                children: vec![],
                extant: node.extant,
                sampled: node.sampled,
            }));
            if let Some(rp) = copied_parent {
                nodes[rp.0]
                    .as_mut()
                    .expect("dangling node index")
                    .children
                    .push(ridx);
            }
            // reversed so the copy preserves child order
            for &c in node.children.iter().rev() {
                if self.node(c).needed {
                    stack.push((c, Some(ridx)));
                }
            }
        }
        ReducedTree::from_parts(nodes, NodeIndex(0))
    }
}
