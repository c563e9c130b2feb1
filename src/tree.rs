//! Band tree: the depth-3 binary tree rooted at an 80 MHz DFS center
//! that tracks CAC/NOL state for every 20/40/80 MHz aggregate within it.
//!
//! Geometry (resolved from the worked example in the data model and the
//! end-to-end scenarios, which pin down real 802.11 sub-channel spacing):
//! given root center `C`, the two 40 MHz children sit at `C-20`/`C+20`, and
//! each 40 MHz node's two 20 MHz leaves sit at `parent-10`/`parent+10`. That
//! yields leaves at `C-30, C-10, C+10, C+30`, matching `{5260,5280,5300,5320}`
//! for root `5290` exactly as the worked example gives it.

use log::error;

use crate::channel::{subchannel_centers, Bandwidth};
use crate::node::{NodeSnapshot, TreeNode};
use crate::regulatory::DfsBand;

/// A single band tree: one 80 MHz root, its two 40 MHz children, and their
/// four 20 MHz grandchildren.
pub struct BandTree {
    root: Option<Box<TreeNode>>,
}

impl BandTree {
    /// Builds the fixed-shape tree for `band`'s 80 MHz center. Sub-channels
    /// not present in `band.valid_subchannels` are still inserted, but as
    /// invalid (`n_valid = 0`) leaves, so non-contiguous DFS bands are
    /// represented uniformly.
    pub fn new(band: &DfsBand) -> Self {
        BandTree {
            root: Some(Self::build_node(band.center_freq, Bandwidth::Mhz80, band)),
        }
    }

    fn build_node(center: u16, bandwidth: Bandwidth, band: &DfsBand) -> Box<TreeNode> {
        match bandwidth {
            Bandwidth::Mhz20 => {
                let n_valid = if band.is_subchannel_valid(center) { 1 } else { 0 };
                Box::new(TreeNode::new(center, bandwidth, n_valid))
            }
            Bandwidth::Mhz40 => {
                let left = Self::build_node(center - 10, Bandwidth::Mhz20, band);
                let right = Self::build_node(center + 10, Bandwidth::Mhz20, band);
                let mut node = TreeNode::new(center, bandwidth, left.n_valid + right.n_valid);
                node.left = Some(left);
                node.right = Some(right);
                Box::new(node)
            }
            Bandwidth::Mhz80 => {
                let left = Self::build_node(center - 20, Bandwidth::Mhz40, band);
                let right = Self::build_node(center + 20, Bandwidth::Mhz40, band);
                let mut node = TreeNode::new(center, bandwidth, left.n_valid + right.n_valid);
                node.left = Some(left);
                node.right = Some(right);
                Box::new(node)
            }
        }
    }

    pub fn root_center(&self) -> u16 {
        self.root.as_ref().map_or(0, |r| r.center_freq)
    }

    pub fn root_snapshot(&self) -> Option<NodeSnapshot> {
        self.root.as_ref().map(|r| r.snapshot())
    }

    /// True if `freq` falls within this band's 80 MHz span, regardless of
    /// whether it names a node exactly (used to locate the tree that
    /// "contains" a channel for rotation and exclusion lookups).
    pub fn covers(&self, freq: u16) -> bool {
        let root = self.root_center();
        freq >= root.saturating_sub(30) && freq <= root + 30
    }

    fn find(&self, freq: u16) -> Option<&TreeNode> {
        fn descend(node: &Option<Box<TreeNode>>, freq: u16) -> Option<&TreeNode> {
            let n = node.as_deref()?;
            if n.center_freq == freq {
                Some(n)
            } else if freq < n.center_freq {
                descend(&n.left, freq)
            } else {
                descend(&n.right, freq)
            }
        }
        descend(&self.root, freq)
    }

    pub fn find_snapshot(&self, freq: u16) -> Option<NodeSnapshot> {
        self.find(freq).map(|n| n.snapshot())
    }

    /// is-CAC-done-for(f): false if no node has this exact center.
    pub fn is_cac_done_for(&self, freq: u16) -> bool {
        self.find(freq).is_some_and(|n| n.is_cac_done())
    }

    /// is-pcac-required-for(f).
    pub fn is_pcac_required_for(&self, freq: u16) -> bool {
        self.find(freq).is_some_and(|n| n.needs_cac())
    }

    /// Every node at the given bandwidth level, left to right (ascending by
    /// center frequency, since the tree's fixed shape makes preorder and
    /// level order coincide at any single depth).
    pub fn nodes_at_bandwidth(&self, bandwidth: Bandwidth) -> Vec<NodeSnapshot> {
        fn walk(node: &Option<Box<TreeNode>>, bandwidth: Bandwidth, out: &mut Vec<NodeSnapshot>) {
            if let Some(n) = node.as_deref() {
                if n.bandwidth == bandwidth {
                    out.push(n.snapshot());
                }
                walk(&n.left, bandwidth, out);
                walk(&n.right, bandwidth, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.root, bandwidth, &mut out);
        out
    }

    /// Visits every node on the root-to-leaf path toward `leaf_freq`,
    /// calling `f` at each ("bump on the way down"). `leaf_freq` must name
    /// an actual 20 MHz leaf; the path always terminates there by
    /// construction.
    fn walk_path_mut(
        node: &mut Option<Box<TreeNode>>,
        leaf_freq: u16,
        f: &mut impl FnMut(&mut TreeNode),
    ) {
        if let Some(n) = node.as_deref_mut() {
            f(n);
            if leaf_freq < n.center_freq {
                Self::walk_path_mut(&mut n.left, leaf_freq, f);
            } else if leaf_freq > n.center_freq {
                Self::walk_path_mut(&mut n.right, leaf_freq, f);
            }
        }
    }

    fn mark_cac_done_leaf(&mut self, leaf_freq: u16) {
        // Idempotence guard: replaying CAC on an already-done leaf (e.g. a
        // bandwidth-mode change from 20 to 40 MHz) must not double-count.
        if self.is_cac_done_for(leaf_freq) {
            return;
        }
        let root_center = self.root_center();
        Self::walk_path_mut(&mut self.root, leaf_freq, &mut |n| {
            if n.bump_cac_done() {
                error!(
                    "precac: n_cac_done clamp at {} MHz in band {}",
                    n.center_freq, root_center
                );
            }
        });
    }

    fn unmark_cac_done_leaf(&mut self, leaf_freq: u16) {
        let root_center = self.root_center();
        Self::walk_path_mut(&mut self.root, leaf_freq, &mut |n| {
            if n.unbump_cac_done() {
                error!(
                    "precac: n_cac_done underflow at {} MHz in band {}",
                    n.center_freq, root_center
                );
            }
        });
    }

    fn mark_nol_leaf(&mut self, leaf_freq: u16) {
        let root_center = self.root_center();
        let mut needs_unmark_done = false;
        Self::walk_path_mut(&mut self.root, leaf_freq, &mut |n| {
            if n.bump_nol() {
                error!(
                    "precac: n_nol clamp at {} MHz in band {}",
                    n.center_freq, root_center
                );
            }
            if n.center_freq == leaf_freq && n.n_cac_done > 0 {
                needs_unmark_done = true;
            }
        });
        if needs_unmark_done {
            self.unmark_cac_done_leaf(leaf_freq);
        }
    }

    fn unmark_nol_leaf(&mut self, leaf_freq: u16) {
        let root_center = self.root_center();
        Self::walk_path_mut(&mut self.root, leaf_freq, &mut |n| {
            if n.unbump_nol() {
                error!(
                    "precac: n_nol underflow at {} MHz in band {}",
                    n.center_freq, root_center
                );
            }
        });
    }

    /// mark-CAC-done over every 20 MHz sub-channel of the `(center,
    /// bandwidth)` aggregate.
    pub fn mark_cac_done(&mut self, center: u16, bandwidth: Bandwidth) {
        for leaf in subchannel_centers(center, bandwidth) {
            self.mark_cac_done_leaf(leaf);
        }
    }

    pub fn unmark_cac_done(&mut self, center: u16, bandwidth: Bandwidth) {
        for leaf in subchannel_centers(center, bandwidth) {
            self.unmark_cac_done_leaf(leaf);
        }
    }

    /// mark-NOL over every 20 MHz sub-channel of the `(center, bandwidth)`
    /// aggregate (radar hits are reported per sub-channel, but a hit on a
    /// wider aggregate marks all of its sub-channels).
    pub fn mark_nol(&mut self, center: u16, bandwidth: Bandwidth) {
        for leaf in subchannel_centers(center, bandwidth) {
            self.mark_nol_leaf(leaf);
        }
    }

    pub fn unmark_nol(&mut self, center: u16, bandwidth: Bandwidth) {
        for leaf in subchannel_centers(center, bandwidth) {
            self.unmark_nol_leaf(leaf);
        }
    }

    /// In-order traversal of centers, for the BST property test.
    pub fn in_order_centers(&self) -> Vec<u16> {
        fn walk(node: &Option<Box<TreeNode>>, out: &mut Vec<u16>) {
            if let Some(n) = node.as_deref() {
                walk(&n.left, out);
                out.push(n.center_freq);
                walk(&n.right, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.root, &mut out);
        out
    }

    /// Preorder dump for `print_precaclists`, using an explicit stack
    /// bounded by the tree's fixed depth of 3 rather than unbounded
    /// recursion or pointer-rethreading (see the design notes on why a
    /// literal Morris thread isn't used over an owned-`Box` tree).
    pub fn preorder_dump(&self) -> Vec<NodeSnapshot> {
        let mut out = Vec::new();
        let mut stack: Vec<&TreeNode> = Vec::with_capacity(3);
        if let Some(r) = self.root.as_deref() {
            stack.push(r);
        }
        while let Some(n) = stack.pop() {
            out.push(n.snapshot());
            if let Some(r) = n.right.as_deref() {
                stack.push(r);
            }
            if let Some(l) = n.left.as_deref() {
                stack.push(l);
            }
        }
        out
    }

    /// O(n), non-recursive teardown: repeatedly re-attach the
    /// current root's right subtree as the left child of its own leftmost
    /// leaf, then free the current root and descend into its (possibly
    /// just-extended) left child. Used for both `Drop` and operator reset.
    pub fn destroy(&mut self) {
        let mut current = self.root.take();
        while let Some(mut boxed) = current {
            if let Some(right) = boxed.right.take() {
                let mut leftmost: &mut TreeNode = boxed.as_mut();
                while leftmost.left.is_some() {
                    leftmost = leftmost.left.as_deref_mut().expect("checked is_some above");
                }
                leftmost.left = Some(right);
            }
            current = boxed.left.take();
            // `boxed` is freed here: its right subtree was already moved
            // out (to the leftmost leaf or nowhere) and its left subtree
            // was already moved into `current`.
        }
    }
}

impl Drop for BandTree {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regulatory::DfsBand;

    fn full_band() -> DfsBand {
        DfsBand {
            center_freq: 5290,
            valid_subchannels: vec![5260, 5280, 5300, 5320],
        }
    }

    #[test]
    fn bst_property_ascending_inorder() {
        let tree = BandTree::new(&full_band());
        assert_eq!(
            tree.in_order_centers(),
            vec![5260, 5270, 5280, 5290, 5300, 5310, 5320]
        );
    }

    #[test]
    fn sum_rule_holds_after_build() {
        let tree = BandTree::new(&full_band());
        let root = tree.root_snapshot().unwrap();
        assert_eq!(root.n_valid, 4);
        assert_eq!(root.n_cac_done, 0);
    }

    #[test]
    fn mark_done_at_80mhz_propagates_to_ancestors() {
        let mut tree = BandTree::new(&full_band());
        tree.mark_cac_done(5290, Bandwidth::Mhz80);
        assert!(tree.is_cac_done_for(5290));
        assert!(tree.is_cac_done_for(5270));
        assert!(tree.is_cac_done_for(5310));
        assert!(tree.is_cac_done_for(5260));
        assert!(tree.is_cac_done_for(5320));
    }

    #[test]
    fn mark_done_is_idempotent() {
        let mut tree = BandTree::new(&full_band());
        tree.mark_cac_done(5290, Bandwidth::Mhz80);
        tree.mark_cac_done(5290, Bandwidth::Mhz80);
        let root = tree.root_snapshot().unwrap();
        assert_eq!(root.n_cac_done, 4);
    }

    #[test]
    fn radar_on_leaf_unmarks_done_up_the_chain() {
        let mut tree = BandTree::new(&full_band());
        tree.mark_cac_done(5290, Bandwidth::Mhz80);
        tree.mark_nol(5280, Bandwidth::Mhz20);
        assert!(!tree.is_cac_done_for(5290));
        assert!(tree.is_cac_done_for(5300));
        let leaf = tree.find_snapshot(5280).unwrap();
        assert_eq!(leaf.n_nol, 1);
        assert_eq!(leaf.n_cac_done, 0);
    }

    #[test]
    fn nol_round_trip_restores_counters() {
        let mut tree = BandTree::new(&full_band());
        tree.mark_nol(5280, Bandwidth::Mhz20);
        tree.unmark_nol(5280, Bandwidth::Mhz20);
        let root = tree.root_snapshot().unwrap();
        assert_eq!(root.n_nol, 0);
        let leaf = tree.find_snapshot(5280).unwrap();
        assert_eq!(leaf.n_nol, 0);
    }

    #[test]
    fn unknown_frequency_status_queries_return_false() {
        let tree = BandTree::new(&full_band());
        assert!(!tree.is_cac_done_for(1234));
        assert!(!tree.is_pcac_required_for(1234));
    }

    #[test]
    fn invalid_subchannel_has_zero_span() {
        let band = DfsBand {
            center_freq: 5290,
            valid_subchannels: vec![5260, 5300, 5320], // 5280 not permitted
        };
        let tree = BandTree::new(&band);
        let leaf = tree.find_snapshot(5280).unwrap();
        assert_eq!(leaf.n_valid, 0);
        let root = tree.root_snapshot().unwrap();
        assert_eq!(root.n_valid, 3);
    }

    #[test]
    fn aggregate_with_invalid_leaf_never_reports_done() {
        let band = DfsBand {
            center_freq: 5290,
            valid_subchannels: vec![5260, 5300, 5320], // 5280 not permitted
        };
        let mut tree = BandTree::new(&band);
        tree.mark_cac_done(5290, Bandwidth::Mhz80);
        // All three permitted leaves are done (n_cac_done=3), but the
        // aggregate's span is still 4: an invalid leaf can never
        // accumulate a CAC count, so the 80 MHz center can never report
        // fully done even though every usable sub-channel is.
        assert!(!tree.is_cac_done_for(5290));
        assert!(tree.is_pcac_required_for(5290));
    }

    #[test]
    fn preorder_dump_visits_all_seven_nodes() {
        let tree = BandTree::new(&full_band());
        let dump = tree.preorder_dump();
        assert_eq!(dump.len(), 7);
        assert_eq!(dump[0].center_freq, 5290);
    }

    #[test]
    fn destroy_leaves_tree_empty() {
        let mut tree = BandTree::new(&full_band());
        tree.destroy();
        assert_eq!(tree.preorder_dump().len(), 0);
        assert_eq!(tree.root_center(), 0);
    }
}
