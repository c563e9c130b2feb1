//! The regulatory-domain collaborator: out of scope for this crate's
//! core, but the trait boundary the engine is built against. Production
//! code backs this with a real regulatory database; tests back it with
//! `StaticRegulatoryDomain`.

use crate::channel::Bandwidth;

/// DFS master region a country's regulator follows. Pre-CAC is only
/// meaningful under `Etsi`; the engine is inert in every other domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DfsDomainKind {
    #[default]
    Unset,
    Fcc,
    Etsi,
    Jp,
}

/// A single DFS-capable 80 MHz band as advertised by the regulatory
/// collaborator: its 80 MHz center and which of its four 20 MHz
/// sub-channels are actually permitted in the current country.
#[derive(Debug, Clone)]
pub struct DfsBand {
    /// 80 MHz center frequency in MHz.
    pub center_freq: u16,
    /// The 20 MHz sub-channel centers permitted by regulation. A
    /// sub-channel center absent from this set is still represented in the
    /// band tree, but as an invalid (`n_valid = 0`) leaf.
    pub valid_subchannels: Vec<u16>,
}

impl DfsBand {
    pub fn is_subchannel_valid(&self, freq: u16) -> bool {
        self.valid_subchannels.contains(&freq)
    }
}

/// A DFS sub-channel descriptor as returned by `find_dot11_chan`.
#[derive(Debug, Clone, Copy)]
pub struct ChannelDescriptor {
    pub center_freq: u16,
    pub bandwidth: Bandwidth,
    pub is_dfs: bool,
}

/// External regulatory-domain collaborator. The core never decides on
/// its own whether a channel is DFS-eligible; it only asks this trait.
pub trait RegulatoryDomain: Send + Sync {
    /// Current DFS master region for this radio's country.
    fn dfs_domain(&self) -> DfsDomainKind;

    /// Every 80 MHz DFS band this regulatory domain advertises, in the
    /// order the preCAC forest should be built.
    fn iterate_dfs_bands(&self) -> Vec<DfsBand>;

    /// Looks up a channel descriptor by center frequency, if regulation
    /// recognizes one there.
    fn find_dot11_chan(&self, freq: u16) -> Option<ChannelDescriptor>;

    /// True if `freq` is itself a non-DFS frequency, usable as an
    /// intermediate parking channel (used by `set_precac_intermediate_chan`).
    fn is_non_dfs(&self, freq: u16) -> bool;
}

/// A fixed, in-memory regulatory table. Used by tests and by deployments
/// that load their channel plan once at startup rather than querying a
/// live database.
pub struct StaticRegulatoryDomain {
    domain: DfsDomainKind,
    bands: Vec<DfsBand>,
    non_dfs: Vec<u16>,
}

impl StaticRegulatoryDomain {
    pub fn new(domain: DfsDomainKind, bands: Vec<DfsBand>, non_dfs: Vec<u16>) -> Self {
        StaticRegulatoryDomain {
            domain,
            bands,
            non_dfs,
        }
    }

    /// A representative ETSI table covering IEEE channels 52-64 and
    /// 100-140, fully valid, with a couple of typical non-DFS UNII-1
    /// parking channels.
    pub fn etsi_reference() -> Self {
        let bands = vec![
            DfsBand {
                center_freq: 5290,
                valid_subchannels: vec![5260, 5280, 5300, 5320],
            },
            DfsBand {
                center_freq: 5530,
                valid_subchannels: vec![5500, 5520, 5540, 5560],
            },
            DfsBand {
                center_freq: 5610,
                valid_subchannels: vec![5580, 5600, 5620, 5640],
            },
            DfsBand {
                center_freq: 5690,
                valid_subchannels: vec![5660, 5680, 5700, 5720],
            },
        ];
        StaticRegulatoryDomain::new(DfsDomainKind::Etsi, bands, vec![5180, 5200])
    }
}

impl RegulatoryDomain for StaticRegulatoryDomain {
    fn dfs_domain(&self) -> DfsDomainKind {
        self.domain
    }

    fn iterate_dfs_bands(&self) -> Vec<DfsBand> {
        self.bands.clone()
    }

    fn find_dot11_chan(&self, freq: u16) -> Option<ChannelDescriptor> {
        for band in &self.bands {
            if band.center_freq == freq {
                return Some(ChannelDescriptor {
                    center_freq: freq,
                    bandwidth: Bandwidth::Mhz80,
                    is_dfs: true,
                });
            }
            if band.valid_subchannels.contains(&freq) {
                return Some(ChannelDescriptor {
                    center_freq: freq,
                    bandwidth: Bandwidth::Mhz20,
                    is_dfs: true,
                });
            }
        }
        if self.non_dfs.contains(&freq) {
            return Some(ChannelDescriptor {
                center_freq: freq,
                bandwidth: Bandwidth::Mhz20,
                is_dfs: false,
            });
        }
        None
    }

    fn is_non_dfs(&self, freq: u16) -> bool {
        self.non_dfs.contains(&freq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_table_has_four_bands() {
        let reg = StaticRegulatoryDomain::etsi_reference();
        assert_eq!(reg.iterate_dfs_bands().len(), 4);
        assert_eq!(reg.dfs_domain(), DfsDomainKind::Etsi);
    }

    #[test]
    fn intermediate_channel_must_be_non_dfs() {
        let reg = StaticRegulatoryDomain::etsi_reference();
        assert!(reg.is_non_dfs(5180));
        assert!(!reg.is_non_dfs(5290));
    }
}
