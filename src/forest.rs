//! PreCAC forest: an ordered sequence of band trees, one per 80 MHz DFS
//! center advertised by the regulatory collaborator. Mutation locking
//! lives one level up, in `crate::engine`, since the same lock must also
//! protect the timer machine's round-robin index.

use log::{debug, warn};

use crate::channel::{Bandwidth, OperatingChannel};
use crate::regulatory::RegulatoryDomain;
use crate::selection::{self, Exclusion};
use crate::tree::BandTree;

pub struct PreCacForest {
    trees: Vec<BandTree>,
}

impl PreCacForest {
    /// Builds one band tree per DFS band the regulatory collaborator
    /// advertises. Empty if the domain isn't ETSI.
    pub fn build(regulatory: &dyn RegulatoryDomain) -> Self {
        use crate::regulatory::DfsDomainKind;
        if regulatory.dfs_domain() != DfsDomainKind::Etsi {
            debug!("precac: regulatory domain is not ETSI, forest left empty");
            return PreCacForest { trees: Vec::new() };
        }
        let trees = regulatory
            .iterate_dfs_bands()
            .iter()
            .map(BandTree::new)
            .collect();
        PreCacForest { trees }
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    fn tree_index_for(&self, freq: u16) -> Option<usize> {
        self.trees.iter().position(|t| t.covers(freq))
    }

    fn tree_mut_for(&mut self, freq: u16) -> Option<&mut BandTree> {
        let idx = self.tree_index_for(freq)?;
        self.trees.get_mut(idx)
    }

    fn tree_for(&self, freq: u16) -> Option<&BandTree> {
        let idx = self.tree_index_for(freq)?;
        self.trees.get(idx)
    }

    pub fn mark_cac_done(&mut self, center: u16, bandwidth: Bandwidth) {
        match self.tree_mut_for(center) {
            Some(tree) => tree.mark_cac_done(center, bandwidth),
            None => warn!("precac: mark_cac_done for unknown frequency {center}"),
        }
    }

    pub fn unmark_cac_done(&mut self, center: u16, bandwidth: Bandwidth) {
        match self.tree_mut_for(center) {
            Some(tree) => tree.unmark_cac_done(center, bandwidth),
            None => warn!("precac: unmark_cac_done for unknown frequency {center}"),
        }
    }

    pub fn mark_nol(&mut self, center: u16, bandwidth: Bandwidth) {
        match self.tree_mut_for(center) {
            Some(tree) => tree.mark_nol(center, bandwidth),
            None => warn!("precac: mark_nol for unknown frequency {center}"),
        }
    }

    pub fn unmark_nol(&mut self, center: u16, bandwidth: Bandwidth) {
        match self.tree_mut_for(center) {
            Some(tree) => tree.unmark_nol(center, bandwidth),
            None => warn!("precac: unmark_nol for unknown frequency {center}"),
        }
    }

    pub fn is_cac_done_for(&self, freq: u16) -> bool {
        self.tree_for(freq).is_some_and(|t| t.is_cac_done_for(freq))
    }

    pub fn is_pcac_required_for(&self, freq: u16) -> bool {
        self.tree_for(freq)
            .is_some_and(|t| t.is_pcac_required_for(freq))
    }

    /// Node snapshot for `freq`, used by `get_precac_chan_state`.
    pub fn snapshot_for(&self, freq: u16) -> Option<crate::node::NodeSnapshot> {
        self.tree_for(freq)?.find_snapshot(freq)
    }

    /// is-done-for-complex-channel: ANDs `is_cac_done_for` across every
    /// 80 MHz center an 80+80/160 MHz operating channel occupies.
    pub fn is_done_for_complex_channel(&self, channel: &OperatingChannel) -> bool {
        channel
            .exclusion_centers()
            .iter()
            .all(|&c| self.is_cac_done_for(c))
    }

    /// Selection policy: first qualifying `bandwidth` node, walking trees
    /// in list order.
    pub fn select(&self, bandwidth: Bandwidth, exclusions: &[Exclusion]) -> u16 {
        selection::select_candidate(&self.trees, bandwidth, exclusions)
    }

    /// Operator-preferred-for-next: rotates the tree containing `freq` to
    /// the head of the list. For a 160 MHz request the secondary 80 MHz
    /// band tree is rotated to just behind it.
    pub fn rotate_to_head(&mut self, channel: &OperatingChannel) -> bool {
        let mut rotated = false;
        for &center in channel.exclusion_centers().iter().rev() {
            if let Some(idx) = self.tree_index_for(center) {
                let tree = self.trees.remove(idx);
                self.trees.insert(0, tree);
                rotated = true;
            }
        }
        rotated
    }

    pub fn reset(&mut self, regulatory: &dyn RegulatoryDomain) {
        *self = PreCacForest::build(regulatory);
    }

    /// Diagnostic dump for `print_precaclists`: one preorder listing per
    /// band tree, in forest order.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for tree in &self.trees {
            out.push_str(&format!("band {}:\n", tree.root_center()));
            for node in tree.preorder_dump() {
                let tag = if node.n_valid == 0 { "inv" } else { "" };
                out.push_str(&format!(
                    "  {} MHz [{}] done={} nol={} valid={} {}\n",
                    node.center_freq, node.bandwidth, node.n_cac_done, node.n_nol, node.n_valid, tag
                ));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::OperatingWidth;
    use crate::regulatory::StaticRegulatoryDomain;

    #[test]
    fn non_etsi_leaves_forest_empty() {
        use crate::regulatory::DfsDomainKind;
        let reg = StaticRegulatoryDomain::new(DfsDomainKind::Fcc, vec![], vec![]);
        let forest = PreCacForest::build(&reg);
        assert!(forest.is_empty());
        assert_eq!(
            forest.select(Bandwidth::Mhz80, &[]),
            0,
            "select must return 0 with no band trees"
        );
    }

    #[test]
    fn etsi_init_has_expected_roots() {
        let reg = StaticRegulatoryDomain::etsi_reference();
        let forest = PreCacForest::build(&reg);
        assert_eq!(forest.len(), 4);
        assert!(!forest.is_cac_done_for(5530));
    }

    #[test]
    fn mark_done_at_80mhz() {
        let reg = StaticRegulatoryDomain::etsi_reference();
        let mut forest = PreCacForest::build(&reg);
        forest.mark_cac_done(5290, Bandwidth::Mhz80);
        assert!(forest.is_cac_done_for(5290));
        assert!(forest.is_cac_done_for(5270));
        assert!(forest.is_cac_done_for(5310));
    }

    #[test]
    fn radar_after_full_done() {
        let reg = StaticRegulatoryDomain::etsi_reference();
        let mut forest = PreCacForest::build(&reg);
        forest.mark_cac_done(5290, Bandwidth::Mhz80);
        forest.mark_nol(5280, Bandwidth::Mhz20);
        assert!(!forest.is_cac_done_for(5290));
        assert!(forest.is_cac_done_for(5300));
    }

    #[test]
    fn selection_excludes_serving_80mhz() {
        let reg = StaticRegulatoryDomain::etsi_reference();
        let forest = PreCacForest::build(&reg);
        let serving = OperatingChannel::new_simple(OperatingWidth::Mhz80, 5290);
        let exclusions = selection::exclusions_for(&serving);
        let picked = forest.select(Bandwidth::Mhz80, &exclusions);
        assert_ne!(picked, 5290);
        assert_eq!(picked, 5530);
    }

    #[test]
    fn rotate_to_head_reorders_forest() {
        let reg = StaticRegulatoryDomain::etsi_reference();
        let mut forest = PreCacForest::build(&reg);
        let target = OperatingChannel::new_simple(OperatingWidth::Mhz80, 5690);
        assert!(forest.rotate_to_head(&target));
        let exclusions = vec![];
        // Head of list is now 5690's tree, so a fresh select for an
        // unrelated bandwidth still prefers it first when it qualifies.
        let picked = forest.select(Bandwidth::Mhz80, &exclusions);
        assert_eq!(picked, 5690);
    }
}
