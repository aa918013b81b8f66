mod cache;
mod event;
mod frame;
mod lru;
mod page;
mod tlb;

use log::{debug, trace};

use crate::{
    config::Config,
    error::{AddressField, SimError},
    stats::Stats,
    trace::{Access, Reference, Stream},
    utils::bits,
};
pub use self::{
    cache::{Cache, CacheAddr, CacheLine},
    event::{AccessEvent, Query, TlbProbe},
    frame::{Acquired, FrameAllocator, PhysicalFrame},
    lru::{Line, Set},
    page::{PageTable, PageTableEntry},
    tlb::{Tlb, TlbAddr, TlbLine},
};

/// The whole simulated hierarchy: split TLBs, one page table, the physical frame
/// pool and split caches.
///
/// References are resolved one at a time by [`Memory::access`], each one running
/// to completion (including any eviction cascade) before the next.
pub struct Memory {
    itlb: Tlb,
    dtlb: Tlb,
    pt: PageTable,
    frames: FrameAllocator,
    ic: Cache,
    dc: Cache,
    stats: Stats,
    config: Config,
}

/// How a virtual page was turned into a frame
struct Translation {
    frame: u32,
    tlb: Option<TlbProbe>,
    page_table_res: Option<Query>,
}

impl Memory {
    pub fn new(config: Config) -> Result<Self, SimError> {
        if config.tlbs_enabled && !config.virtual_addrs_enabled {
            return Err(SimError::ConfigInconsistency(
                "TLBs cannot be enabled when virtual addresses are disabled".into(),
            ));
        }
        if config.virtual_addrs_enabled && config.pt.physical_pages == 0 {
            return Err(SimError::ConfigInconsistency(
                "virtual addresses need at least one physical page to map into".into(),
            ));
        }

        Ok(Memory {
            itlb: Tlb::new(config.itlb.clone()),
            dtlb: Tlb::new(config.dtlb.clone()),
            pt: PageTable::new(&config.pt),
            frames: FrameAllocator::new(config.pt.physical_pages),
            ic: Cache::new(config.ic.clone()),
            dc: Cache::new(config.dc.clone()),
            stats: Stats::default(),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn page_table(&self) -> &PageTable {
        &self.pt
    }

    pub fn frames(&self) -> &FrameAllocator {
        &self.frames
    }

    pub fn cache(&self, stream: Stream) -> &Cache {
        match stream {
            Stream::Instruction => &self.ic,
            Stream::Data => &self.dc,
        }
    }

    pub fn tlb(&self, stream: Stream) -> &Tlb {
        match stream {
            Stream::Instruction => &self.itlb,
            Stream::Data => &self.dtlb,
        }
    }

    /// Resolves one reference all the way down to the cache.
    pub fn access(&mut self, request: Reference) -> Result<AccessEvent, SimError> {
        let Reference { stream, access, addr } = request;

        if stream == Stream::Instruction && access == Access::Write {
            return Err(SimError::MalformedReference { addr, reason: "write to an instruction" });
        }

        let (page_num, page_offset) = bits::split_at(addr, self.config.pt.offset_size);

        // Make sure addr is a reasonable size before touching anything
        let limit = if self.config.virtual_addrs_enabled {
            (self.config.pt.virtual_pages, AddressField::VirtualPage)
        } else {
            (self.config.pt.physical_pages, AddressField::PhysicalPage)
        };
        if page_num >= limit.0 {
            return Err(SimError::AddressOutOfRange { addr, field: limit.1 });
        }

        self.stats.record_reference(stream, access);

        let (phys_addr, translation) = if self.config.virtual_addrs_enabled {
            let translation = self.translate(stream, addr, page_num)?;
            let phys_addr = bits::join(translation.frame, page_offset, self.config.pt.offset_size);
            (phys_addr, Some(translation))
        } else {
            (addr, None)
        };
        let frame = translation.as_ref().map_or(page_num, |t| t.frame);

        if access == Access::Write && self.config.virtual_addrs_enabled {
            self.frames.mark_modified(frame);
            self.pt.mark_dirty(frame);
        }

        let (at, cache_res) = self.cache_access(stream, access, addr, phys_addr, frame)?;

        let event = AccessEvent {
            addr,
            stream,
            virtual_page_num: translation.as_ref().map(|_| page_num),
            page_offset,
            tlb: translation.as_ref().and_then(|t| t.tlb),
            page_table_res: translation.as_ref().and_then(|t| t.page_table_res),
            physical_page_num: frame,
            cache_tag: at.tag,
            cache_idx: at.idx,
            cache_res,
        };
        trace!("{:?} {:?} {:08x} -> {:08x} ({})", stream, access, addr, phys_addr, cache_res.as_str());
        Ok(event)
    }

    /// TLB, then page table, then (on a fault) a fresh frame
    fn translate(&mut self, stream: Stream, addr: u32, vpn: u32) -> Result<Translation, SimError> {
        let mut tlb_probe = None;

        if self.config.tlbs_enabled {
            let tlb = match stream {
                Stream::Instruction => &mut self.itlb,
                Stream::Data => &mut self.dtlb,
            };
            let at = tlb
                .locate(vpn)
                .ok_or(SimError::AddressOutOfRange { addr, field: AddressField::TlbIndex })?;

            if let Some(frame) = tlb.lookup(at.idx, at.tag) {
                self.frames.touch(frame);
                self.stats.record_tlb(stream, Query::Hit);
                return Ok(Translation {
                    frame,
                    tlb: Some(TlbProbe { tag: at.tag, idx: at.idx, result: Query::Hit }),
                    page_table_res: None,
                });
            }

            self.stats.record_tlb(stream, Query::Miss);
            tlb_probe = Some(TlbProbe { tag: at.tag, idx: at.idx, result: Query::Miss });
        }

        // Walking the page table is itself a trip to main memory
        self.stats.memory_refs += 1;
        let (frame, page_table_res) = match self.pt.lookup(vpn) {
            Some(frame) => {
                self.frames.touch(frame);
                (frame, Query::Hit)
            }
            None => (self.page_in(vpn)?, Query::Miss),
        };
        self.stats.record_page_table(page_table_res);

        if let Some(probe) = &tlb_probe {
            let tlb = match stream {
                Stream::Instruction => &mut self.itlb,
                Stream::Data => &mut self.dtlb,
            };
            tlb.insert(probe.idx, probe.tag, frame);
        }

        Ok(Translation { frame, tlb: tlb_probe, page_table_res: Some(page_table_res) })
    }

    /// Services a page fault: grab a frame, evict whatever lived there, map `vpn`
    fn page_in(&mut self, vpn: u32) -> Result<u32, SimError> {
        self.stats.disk_refs += 1;

        let acquired = self.frames.acquire().ok_or_else(|| {
            SimError::ConfigInconsistency("no physical pages to map into".into())
        })?;
        debug!("page fault on vpn {:x}: acquired frame {:x} (warm: {}, dirty: {})",
            vpn, acquired.frame, acquired.was_warm, acquired.was_dirty);

        if acquired.was_warm {
            if acquired.was_dirty {
                self.stats.disk_refs += 1;
            }
            self.invalidate_frame(acquired.frame);
        }

        self.pt.insert(vpn, acquired.frame);
        Ok(acquired.frame)
    }

    /// Scrubs every trace of `frame` from the page table, both caches and both TLBs.
    //
    //  Both streams get scrubbed no matter which one faulted: a frame is just memory.
    fn invalidate_frame(&mut self, frame: u32) {
        let pages = self.pt.invalidate(frame);
        let dirty_lines = self.dc.invalidate(frame);
        let inst_lines = self.ic.invalidate(frame);
        if !self.config.write_through {
            self.stats.memory_refs += u64::from(dirty_lines + inst_lines);
        }

        let mut translations = 0;
        if self.config.tlbs_enabled {
            translations += self.dtlb.invalidate(frame);
            translations += self.itlb.invalidate(frame);
        }
        debug!("evicted frame {:x}: {} page(s), {} translation(s), {} dirty line(s) written back",
            frame, pages, translations, dirty_lines + inst_lines);
    }

    fn cache_access(
        &mut self,
        stream: Stream,
        access: Access,
        addr: u32,
        phys_addr: u32,
        frame: u32,
    ) -> Result<(CacheAddr, Query), SimError> {
        let write_through = self.config.write_through;
        let cache = match stream {
            Stream::Instruction => &mut self.ic,
            Stream::Data => &mut self.dc,
        };
        let at = cache
            .locate(phys_addr)
            .ok_or(SimError::AddressOutOfRange { addr, field: AddressField::CacheIndex })?;
        let res = Query::from_hit(cache.lookup(at.idx, at.tag));
        self.stats.record_cache(stream, res);

        let write = access == Access::Write;
        match (res, write_through, write) {
            (Query::Hit, true, true) => {
                // write-through: the line stays clean, the write goes straight down
                self.stats.memory_refs += 1;
            }
            (Query::Hit, false, true) => cache.set_dirty(at.idx, at.tag),
            (Query::Hit, _, false) => {}
            (Query::Miss, true, true) => {
                // no-write-allocate
                self.stats.memory_refs += 1;
            }
            (Query::Miss, true, false) => {
                self.stats.memory_refs += 1;
                cache.insert(at.idx, at.tag, frame, false);
            }
            (Query::Miss, false, _) => {
                let write_back = cache.is_lru_dirty(at.idx);
                cache.insert(at.idx, at.tag, frame, write);
                self.stats.memory_refs += 1;
                if write_back {
                    self.stats.memory_refs += 1;
                }
            }
        }

        Ok((at, res))
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "ITLB {:?}", self.itlb)?;
        writeln!(f, "DTLB {:?}", self.dtlb)?;
        writeln!(f, "I-{:?}", self.ic)?;
        writeln!(f, "D-{:?}", self.dc)?;
        writeln!(f, "{:?}", self.frames)?;
        write!(f, "{:?}", self.stats)
    }
}
