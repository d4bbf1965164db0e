//! Transmission trees and sampled phylogenies.
//!
//! # Overview
//!
//! This crate provides the tree machinery behind a birth-death
//! epidemic simulation:
//!
//! 1. [`LineageTree`]: an online transmission tree that records
//!    every infection and eagerly prunes extinct, unsampled
//!    branches, so memory scales with the extant population plus
//!    the ancestry of sampled lineages rather than with cumulative
//!    cases.
//! 2. [`ReducedTree`]: the minimal subtree connecting the sampled
//!    lineages of one component, produced by
//!    [`LineageTree::subsample_tree`].
//! 3. [`PhyloNode`] / [`build_ancestral_tree`]: the strictly
//!    binary, time-stamped phylogeny of a reduced tree, with
//!    sampled ancestors appearing as zero-length leaves.
//! 4. [`write_newick`]: Newick/NHX serialization.
//!
//! Trees are arenas of index-linked nodes; parents hold child
//! indices and children hold a parent index, so no reference
//! cycles arise.

mod lineage;
mod newick;
mod phylogeny;
mod reduced;

pub use lineage::{LineageTree, LineageTreeError, LineageTreeResult, NodeIndex};
pub use newick::{write_newick, NewickFlags};
pub use phylogeny::{build_ancestral_tree, PhyloNode, PhylogenyError, PhylogenyResult};
pub use reduced::{ReducedNode, ReducedTree};

/// Get the bdphylo-trees version number.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
