//! Newick serialization of phylogenetic trees.

use std::fmt::Display;
use std::fmt::Write as _;

use bitflags::bitflags;

use crate::phylogeny::PhyloNode;

bitflags! {
    /// Modify the output of [`write_newick`].
    #[derive(Default)]
    pub struct NewickFlags: u32 {
        /// Append `[&&NHX:<data>:<time>]` metadata after every
        /// branch-length field.
        const NHX_ANNOTATIONS = 1 << 0;
    }
}

/// Render a phylogeny as a Newick string, terminated by `;`.
///
/// Leaves render as `lng:dt`; internal nodes as
/// `(left,right)lng-depth:dt`.  Branch lengths and times use fixed
/// 6-decimal notation.
pub fn write_newick<L, D>(root: &PhyloNode<L, D>, flags: NewickFlags) -> String
where
    L: Display,
    D: Display,
{
    let mut out = String::new();
    write_node(&mut out, root, flags);
    out.push(';');
    out
}

fn write_node<L, D>(out: &mut String, node: &PhyloNode<L, D>, flags: NewickFlags)
where
    L: Display,
    D: Display,
{
    if node.is_leaf() {
        write!(out, "{}:{:.6}", node.lng, node.dt).unwrap();
    } else {
        out.push('(');
        write_node(
            out,
            node.left.as_deref().expect("binary node missing left child"),
            flags,
        );
        out.push(',');
        write_node(
            out,
            node.right
                .as_deref()
                .expect("binary node missing right child"),
            flags,
        );
        out.push(')');
        write!(out, "{}-{}:{:.6}", node.lng, node.depth, node.dt).unwrap();
    }
    if flags.contains(NewickFlags::NHX_ANNOTATIONS) {
        write!(out, "[&&NHX:{}:{:.6}]", node.data, f64::from(node.t)).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bdphylo_core::Time;

    fn leaf(lng: i32, t: f64, dt: f64) -> PhyloNode<i32, i32> {
        PhyloNode {
            lng,
            data: 0,
            loc_sample: String::from("NA"),
            t: Time::from(t),
            dt,
            depth: 0,
            left: None,
            right: None,
        }
    }

    #[test]
    fn test_single_leaf() {
        let node = leaf(1, 0.75, 0.0);
        assert_eq!(write_newick(&node, NewickFlags::empty()), "1:0.000000;");
    }

    #[test]
    fn test_cherry() {
        let root = PhyloNode {
            lng: 1,
            data: 0,
            loc_sample: String::from("NA"),
            t: Time::from(2.0),
            dt: 0.0,
            depth: 0,
            left: Some(Box::new(leaf(3, 2.5, 0.5))),
            right: Some(Box::new(leaf(4, 3.5, 1.5))),
        };
        assert_eq!(
            write_newick(&root, NewickFlags::empty()),
            "(3:0.500000,4:1.500000)1-0:0.000000;"
        );
    }

    #[test]
    fn test_nhx_annotations() {
        let root = PhyloNode {
            lng: 1,
            data: 7,
            loc_sample: String::from("NA"),
            t: Time::from(2.0),
            dt: 0.0,
            depth: 0,
            left: Some(Box::new(leaf(3, 2.5, 0.5))),
            right: Some(Box::new(leaf(4, 3.5, 1.5))),
        };
        let nhx = write_newick(&root, NewickFlags::NHX_ANNOTATIONS);
        assert_eq!(
            nhx,
            "(3:0.500000[&&NHX:0:2.500000],4:1.500000[&&NHX:0:3.500000])1-0:0.000000[&&NHX:7:2.000000];"
        );
    }
}
