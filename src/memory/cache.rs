use crate::{config, utils::bits};
use super::lru::{Line, Set};

/// Where a physical address lands in a cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheAddr {
    pub tag: u32,
    pub idx: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheLine {
    pub tag: u32,
    pub valid: bool,
    pub dirty: bool,
    pub frame: u32,
}

impl Default for CacheLine {
    fn default() -> Self {
        CacheLine { tag: u32::MAX, valid: false, dirty: false, frame: u32::MAX }
    }
}

impl Line for CacheLine {
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
        self.dirty = false;
    }
}

pub struct Cache {
    sets: Vec<Set<CacheLine>>,
    config: config::CacheConfig,
}

impl Cache {
    pub fn new(config: config::CacheConfig) -> Self {
        let empty_set = Set::new(config.set_size as usize);
        let sets = vec![ empty_set ; config.sets as usize ];
        Cache { sets, config }
    }

    /// Carves a physical address into tag and set index. `None` if the index
    /// doesn't name one of our sets.
    pub fn locate(&self, addr: u32) -> Option<CacheAddr> {
        let (block_addr, _block_offset) = bits::split_at(addr, self.config.offset_size);
        let (tag, idx) = bits::split_at(block_addr, self.config.idx_size);
        (idx < self.config.sets).then_some(CacheAddr { tag, idx })
    }

    /// Probes set `idx` for `tag`, promoting the line on a hit
    pub fn lookup(&mut self, idx: u32, tag: u32) -> bool {
        self.set_mut(idx)
            .map_or(false, |set| set.lookup(tag).is_some())
    }

    /// Fills the LRU slot of set `idx`, returning the line that was there
    pub fn insert(&mut self, idx: u32, tag: u32, frame: u32, dirty: bool) -> CacheLine {
        let line = CacheLine { tag, valid: true, dirty, frame };
        self.set_mut(idx)
            .map(|set| set.push(line))
            .unwrap_or_default()
    }

    /// Marks a resident line dirty. No-op if the line isn't there.
    pub fn set_dirty(&mut self, idx: u32, tag: u32) {
        if let Some(line) = self.set_mut(idx).and_then(|set| set.peek_mut(tag)) {
            line.dirty = true;
        }
    }

    /// Drops every line backed by `frame`, returning how many of them were dirty.
    //
    //  Lines are keyed by tag, not frame, so this has to walk the whole cache.
    pub fn invalidate(&mut self, frame: u32) -> u32 {
        self.sets
            .iter_mut()
            .flat_map(|set| set.invalidate_frame(frame))
            .filter(|line| line.dirty)
            .count() as u32
    }

    /// Would filling set `idx` right now push out a dirty line?
    pub fn is_lru_dirty(&self, idx: u32) -> bool {
        self.sets
            .get(idx as usize)
            .and_then(|set| set.lru())
            .map_or(false, |line| line.valid && line.dirty)
    }

    pub fn lines(&self) -> impl Iterator<Item = &CacheLine> {
        self.sets.iter().flat_map(|set| set.iter())
    }

    fn set_mut(&mut self, idx: u32) -> Option<&mut Set<CacheLine>> {
        self.sets.get_mut(idx as usize)
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Cache:")?;
        for (idx, set) in self.sets.iter().enumerate() {
            writeln!(f, "\tSet {:x}:", idx)?;
            for line in set.iter().filter(|line| line.valid) {
                writeln!(f, "\t\ttag: {:x}\tframe: {:x}\tdirty: {}",
                    line.tag, line.frame, if line.dirty { "yes" } else { "no" })?;
            }
        }
        Ok(())
    }
}
