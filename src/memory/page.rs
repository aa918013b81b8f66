use crate::config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTableEntry {
    pub frame: u32,
    pub resident: bool,
    pub dirty: bool,
}

impl Default for PageTableEntry {
    fn default() -> Self {
        PageTableEntry { frame: u32::MAX, resident: false, dirty: false }
    }
}

/// A single-level page table, indexed directly by virtual page number
#[derive(Debug)]
pub struct PageTable {
    entries: Vec<PageTableEntry>,
}

impl PageTable {
    pub fn new(config: &config::PageTableConfig) -> Self {
        PageTable {
            entries: vec![PageTableEntry::default(); config.virtual_pages as usize],
        }
    }

    /// The frame `vpn` is resident in, if any
    pub fn lookup(&self, vpn: u32) -> Option<u32> {
        self.entries
            .get(vpn as usize)
            .filter(|entry| entry.resident)
            .map(|entry| entry.frame)
    }

    pub fn insert(&mut self, vpn: u32, frame: u32) {
        if let Some(entry) = self.entries.get_mut(vpn as usize) {
            *entry = PageTableEntry { frame, resident: true, dirty: false };
        }
    }

    pub fn entry(&self, vpn: u32) -> Option<&PageTableEntry> {
        self.entries.get(vpn as usize)
    }

    /// Evicts whatever page currently lives in `frame`, returning how many
    /// mappings were dropped.
    pub fn invalidate(&mut self, frame: u32) -> u32 {
        let mut count = 0;
        for entry in self.mapped_to(frame) {
            entry.resident = false;
            entry.dirty = false;
            count += 1;
        }
        count
    }

    /// Records a write to whatever page lives in `frame`
    pub fn mark_dirty(&mut self, frame: u32) {
        for entry in self.mapped_to(frame) {
            entry.dirty = true;
        }
    }

    fn mapped_to(&mut self, frame: u32) -> impl Iterator<Item = &mut PageTableEntry> {
        self.entries
            .iter_mut()
            .filter(move |entry| entry.resident && entry.frame == frame)
    }
}
