//! Ancestral (phylogenetic) trees.
//!
//! [`build_ancestral_tree`] converts a reduced transmission tree
//! into a strictly binary, time-stamped phylogeny.  A transmission
//! node with `k` children becomes a right-leaning chain of binary
//! nodes, one per branching event in chronological order.  A
//! sampled lineage that also has children (a sampled ancestor)
//! additionally contributes a zero-length leaf spliced into the
//! chain at its sampling time.

use bdphylo_core::{Lineage, Payload, Time};
use thiserror::Error;

use crate::lineage::NodeIndex;
use crate::reduced::{ReducedNode, ReducedTree};

/// Error type related to phylogeny construction.
///
/// Every variant other than [`PhylogenyError::EmptyReduction`]
/// indicates a bug in the pruning pipeline rather than bad input.
#[derive(Error, Debug, PartialEq)]
pub enum PhylogenyError {
    /// Returned when a reduction yielded no trees to build from.
    #[error("reduction produced no trees")]
    EmptyReduction,
    /// Returned when an unsampled node has fewer than two children.
    #[error("unsampled node with fewer than two children survived pruning")]
    UnprunedDegreeOneNode,
    /// Returned when a childless node is not sampled.
    #[error("leaf node is not sampled")]
    UnsampledLeaf,
    /// Returned when a child's event time precedes its parent's.
    #[error("child time precedes parent time")]
    NonMonotonicTimes,
}

/// Result type for phylogeny construction.
pub type PhylogenyResult<T> = std::result::Result<T, PhylogenyError>;

/// A node of a strictly binary phylogenetic tree.
///
/// Internal nodes carry the branching instant in `t`; leaves carry
/// the sampling instant.  `dt` is the branch length to the parent
/// (0 for the root).  `depth` is the position of an internal node
/// within its multifurcation chain.
pub struct PhyloNode<L, D> {
    pub lng: L,
    pub data: D,
    pub loc_sample: String,
    pub t: Time,
    pub dt: f64,
    pub depth: u32,
    pub left: Option<Box<PhyloNode<L, D>>>,
    pub right: Option<Box<PhyloNode<L, D>>>,
}

impl<L, D> PhyloNode<L, D> {
    /// Is this node a leaf?
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// The number of leaves below (and including) this node.
    pub fn num_leaves(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            let left = self.left.as_ref().map(|c| c.num_leaves()).unwrap_or(0);
            let right = self.right.as_ref().map(|c| c.num_leaves()).unwrap_or(0);
            left + right
        }
    }
}

/// Build the phylogeny of a reduced transmission tree.
///
/// Sampled lineages appear as leaves; internal nodes correspond to
/// past branching events.  A sampled ancestor appears both as
/// internal chain nodes and as one zero-length leaf.
pub fn build_ancestral_tree<L, D>(
    tree: &ReducedTree<L, D>,
) -> PhylogenyResult<Box<PhyloNode<L, D>>>
where
    L: Lineage,
    D: Payload,
{
    enter(tree, tree.root(), None)
}

fn branch_length(t: Time, parent_t: Option<Time>) -> PhylogenyResult<f64> {
    match parent_t {
        None => Ok(0.0),
        Some(pt) => {
            let dt = t - pt;
            if dt < 0.0 {
                Err(PhylogenyError::NonMonotonicTimes)
            } else {
                Ok(dt)
            }
        }
    }
}

fn internal_node<L, D>(node: &ReducedNode<L, D>, t: Time, depth: u32, dt: f64) -> PhyloNode<L, D>
where
    L: Lineage,
    D: Payload,
{
    PhyloNode {
        lng: node.lng.clone(),
        data: node.data.clone(),
        loc_sample: String::from("NA"),
        t,
        dt,
        depth,
        left: None,
        right: None,
    }
}

fn sampled_leaf<L, D>(node: &ReducedNode<L, D>, depth: u32, dt: f64) -> PhyloNode<L, D>
where
    L: Lineage,
    D: Payload,
{
    PhyloNode {
        lng: node.lng.clone(),
        data: node.data.clone(),
        loc_sample: node.loc_sample.clone(),
        t: node.t_sample,
        dt,
        depth,
        left: None,
        right: None,
    }
}

/// First visit of a transmission node: emit its leaf, or sort the
/// multifurcation and start its chain.
fn enter<L, D>(
    tree: &ReducedTree<L, D>,
    idx: NodeIndex,
    parent_t: Option<Time>,
) -> PhylogenyResult<Box<PhyloNode<L, D>>>
where
    L: Lineage,
    D: Payload,
{
    let node = tree.node(idx);
    let k = node.children.len();

    if k == 0 {
        if !node.sampled {
            return Err(PhylogenyError::UnsampledLeaf);
        }
        let t = node.t_sample;
        let leaf = sampled_leaf(node, 0, branch_length(t, parent_t)?);
        return Ok(Box::new(leaf));
    }

    // sort children chronologically; ties keep insertion order
    let mut sorted = node.children.clone();
    sorted.sort_by(|a, b| {
        f64::from(tree.node(*a).t_branch_parent).total_cmp(&f64::from(tree.node(*b).t_branch_parent))
    });

    let attach = if node.sampled {
        // position of the sampling event within the chain; an
        // equal-time child counts as later, so the sampled leaf
        // attaches before it
        let t_sample = f64::from(node.t_sample);
        Some(
            sorted
                .iter()
                .filter(|c| f64::from(tree.node(**c).t_branch_parent) < t_sample)
                .count(),
        )
    } else {
        if k < 2 {
            return Err(PhylogenyError::UnprunedDegreeOneNode);
        }
        None
    };

    chain(tree, idx, &sorted, 0, 0, attach, parent_t)
}

/// Emit one link of the chain expanding the multifurcation at
/// `idx`.
///
/// `depth` is the link position, `depth_child` the cursor into the
/// sorted children, and `attach` the chain position of the sampling
/// event for a sampled ancestor.
fn chain<L, D>(
    tree: &ReducedTree<L, D>,
    idx: NodeIndex,
    sorted: &[NodeIndex],
    depth: u32,
    depth_child: usize,
    attach: Option<usize>,
    parent_t: Option<Time>,
) -> PhylogenyResult<Box<PhyloNode<L, D>>>
where
    L: Lineage,
    D: Payload,
{
    let node = tree.node(idx);
    let k = sorted.len();
    let d = depth as usize;

    match attach {
        None => {
            // plain multifurcation: one link per branching event
            let t = tree.node(sorted[d]).t_branch_parent;
            let mut link = internal_node(node, t, depth, branch_length(t, parent_t)?);
            if d < k - 2 {
                link.left = Some(enter(tree, sorted[d], Some(t))?);
                link.right = Some(chain(tree, idx, sorted, depth + 1, depth_child, attach, Some(t))?);
            } else {
                // last cherry
                link.left = Some(enter(tree, sorted[k - 2], Some(t))?);
                link.right = Some(enter(tree, sorted[k - 1], Some(t))?);
            }
            Ok(Box::new(link))
        }
        Some(a) if a < k => {
            if d == a {
                // the sampling event: a degenerate split whose right
                // side is the zero-length sampled-ancestor leaf
                let t = node.t_sample;
                let mut link = internal_node(node, t, depth, branch_length(t, parent_t)?);
                link.right = Some(Box::new(sampled_leaf(node, depth + 1, 0.0)));
                if depth_child == k - 1 {
                    link.left = Some(enter(tree, sorted[depth_child], Some(t))?);
                } else {
                    link.left =
                        Some(chain(tree, idx, sorted, depth + 1, depth_child, attach, Some(t))?);
                }
                Ok(Box::new(link))
            } else {
                let t = tree.node(sorted[depth_child]).t_branch_parent;
                let mut link = internal_node(node, t, depth, branch_length(t, parent_t)?);
                link.left = Some(enter(tree, sorted[depth_child], Some(t))?);
                if d == k - 1 {
                    link.right = Some(enter(tree, sorted[depth_child + 1], Some(t))?);
                } else {
                    link.right = Some(chain(
                        tree,
                        idx,
                        sorted,
                        depth + 1,
                        depth_child + 1,
                        attach,
                        Some(t),
                    )?);
                }
                Ok(Box::new(link))
            }
        }
        Some(_) => {
            // sampled after every branching event: the chain walks
            // the children in order and ends with the sampled leaf
            let t = tree.node(sorted[d]).t_branch_parent;
            let mut link = internal_node(node, t, depth, branch_length(t, parent_t)?);
            link.left = Some(enter(tree, sorted[d], Some(t))?);
            if d < k - 1 {
                link.right = Some(chain(tree, idx, sorted, depth + 1, depth_child, attach, Some(t))?);
            } else {
                let dt = node.t_sample - t;
                link.right = Some(Box::new(sampled_leaf(node, depth + 1, dt)));
            }
            Ok(Box::new(link))
        }
    }
}
