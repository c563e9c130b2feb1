//! Selection policy: picks the next pre-CAC candidate given the channel
//! the radio is currently serving and a requested bandwidth.

use crate::channel::{subchannel_centers, Bandwidth, OperatingChannel};
use crate::tree::BandTree;

/// One currently-occupied 80 MHz center and how many of a candidate node's
/// sub-channels it would take up if it overlaps that node's span.
#[derive(Debug, Clone, Copy)]
pub struct Exclusion {
    pub center: u16,
    pub occupied_subchannels: u8,
}

/// Builds the exclusion list for the channel the radio is currently
/// serving clients on (20/40/80 give one center; 80+80 and 160 give two).
pub fn exclusions_for(serving: &OperatingChannel) -> Vec<Exclusion> {
    let occupied = serving.width.subchannels_per_segment();
    serving
        .exclusion_centers()
        .into_iter()
        .map(|center| Exclusion {
            center,
            occupied_subchannels: occupied,
        })
        .collect()
}

fn node_span(center: u16, bandwidth: Bandwidth) -> (u16, u16) {
    let leaves = subchannel_centers(center, bandwidth);
    (
        *leaves.first().expect("subchannel_centers never empty"),
        *leaves.last().expect("subchannel_centers never empty"),
    )
}

fn exclusion_overlap(center: u16, bandwidth: Bandwidth, exclusions: &[Exclusion]) -> u8 {
    let (first, last) = node_span(center, bandwidth);
    exclusions
        .iter()
        .filter(|e| e.center >= first && e.center <= last)
        .map(|e| e.occupied_subchannels)
        .fold(0u8, |acc, n| acc.saturating_add(n))
}

/// Walks each band tree in list order looking for a `bandwidth` node that
/// needs CAC and is disjoint enough from `exclusions` to still have a free
/// sub-channel. Returns 0 if nothing qualifies in any tree.
pub fn select_candidate(trees: &[BandTree], bandwidth: Bandwidth, exclusions: &[Exclusion]) -> u16 {
    for tree in trees {
        for node in tree.nodes_at_bandwidth(bandwidth) {
            let needs_cac = node.n_cac_done < node.bandwidth.n_subchannels() && node.n_nol == 0;
            if !needs_cac {
                continue;
            }
            let excluded = exclusion_overlap(node.center_freq, node.bandwidth, exclusions);
            let occupied = excluded
                .saturating_add(node.n_cac_done)
                .saturating_add(node.n_nol);
            if occupied < node.n_valid {
                return node.center_freq;
            }
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::OperatingWidth;
    use crate::regulatory::DfsBand;

    fn forest() -> Vec<BandTree> {
        vec![
            BandTree::new(&DfsBand {
                center_freq: 5290,
                valid_subchannels: vec![5260, 5280, 5300, 5320],
            }),
            BandTree::new(&DfsBand {
                center_freq: 5610,
                valid_subchannels: vec![5580, 5600, 5620, 5640],
            }),
        ]
    }

    #[test]
    fn p7_select_avoids_exclusion() {
        let trees = forest();
        let serving = OperatingChannel::new_simple(OperatingWidth::Mhz80, 5290);
        let exclusions = exclusions_for(&serving);
        let picked = select_candidate(&trees, Bandwidth::Mhz80, &exclusions);
        assert_ne!(picked, 5290);
        assert_eq!(picked, 5610);
    }

    #[test]
    fn p8_select_finds_when_disjoint_candidate_exists() {
        let trees = forest();
        let serving = OperatingChannel::new_simple(OperatingWidth::Mhz20, 5180);
        let exclusions = exclusions_for(&serving);
        let picked = select_candidate(&trees, Bandwidth::Mhz80, &exclusions);
        assert_eq!(picked, 5290);
    }

    #[test]
    fn returns_zero_when_everything_excluded_or_done() {
        let mut trees = forest();
        trees[0].mark_cac_done(5290, Bandwidth::Mhz80);
        trees[1].mark_cac_done(5610, Bandwidth::Mhz80);
        let serving = OperatingChannel::new_simple(OperatingWidth::Mhz20, 5180);
        let exclusions = exclusions_for(&serving);
        assert_eq!(select_candidate(&trees, Bandwidth::Mhz80, &exclusions), 0);
    }
}
