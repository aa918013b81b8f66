use crate::{
    config,
    utils::bits,
};
use super::lru::{Line, Set};

/// Where a virtual page number lands in a TLB
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlbAddr {
    pub tag: u32,
    pub idx: u32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TlbLine {
    pub tag: u32,
    pub frame: u32,
    pub valid: bool,
}

impl Default for TlbLine {
    fn default() -> Self {
        TlbLine { tag: u32::MAX, frame: u32::MAX, valid: false }
    }
}

impl Line for TlbLine {
    fn tag(&self) -> u32 {
        self.tag
    }
    fn is_valid(&self) -> bool {
        self.valid
    }
    fn frame(&self) -> u32 {
        self.frame
    }
    fn invalidate(&mut self) {
        self.valid = false;
    }
}

pub struct Tlb {
    sets: Vec<Set<TlbLine>>,
    config: config::TlbConfig,
}

impl Tlb {
    pub fn new(config: config::TlbConfig) -> Self {
        let empty_set = Set::new(config.set_size as usize);
        let sets = vec![ empty_set ; config.sets as usize ];
        Tlb { sets, config }
    }

    /// Splits a virtual page number into TLB tag and set index
    pub fn locate(&self, vpn: u32) -> Option<TlbAddr> {
        let (tag, idx) = bits::split_at(vpn, self.config.idx_size);
        (idx < self.config.sets).then_some(TlbAddr { tag, idx })
    }

    /// Looks up a translation for a fast vpn -> frame lookup, touching it on a hit
    pub fn lookup(&mut self, idx: u32, tag: u32) -> Option<u32> {
        self.sets
            .get_mut(idx as usize)?
            .lookup(tag)
            .map(|line| line.frame)
    }

    /// Add a translation to the TLB, returning the entry it displaced
    pub fn insert(&mut self, idx: u32, tag: u32, frame: u32) -> TlbLine {
        let line = TlbLine { tag, frame, valid: true };
        self.sets
            .get_mut(idx as usize)
            .map(|set| set.push(line))
            .unwrap_or_default()
    }

    /// Drops every translation pointing at `frame`, returning how many there were
    pub fn invalidate(&mut self, frame: u32) -> u32 {
        self.sets
            .iter_mut()
            .map(|set| set.invalidate_frame(frame).count() as u32)
            .sum()
    }

    pub fn lines(&self) -> impl Iterator<Item = &TlbLine> {
        self.sets.iter().flat_map(|set| set.iter())
    }
}

impl std::fmt::Debug for Tlb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "TLB:")?;
        for (idx, set) in self.sets.iter().enumerate() {
            writeln!(f, "\tSet {:x}:", idx)?;
            for e in set.iter().filter(|e| e.valid) {
                writeln!(f, "\t\ttag: {:x}\n\t\tframe: {:x}", e.tag, e.frame)?;
            }
        }
        Ok(())
    }
}
