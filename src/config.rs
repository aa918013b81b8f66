use std::fs;
use std::path::Path;

use crate::error::SimError;
use crate::utils::{bits, error};

const MAX_TLB_SETS: u32 = 256;
const MAX_CACHE_SETS: u32 = 8192;
const MAX_ASSOC: u32 = 8;
const MAX_VIRT_PAGES: u32 = 8192;
const MAX_PHYS_PAGES: u32 = 1024;
const MIN_IC_LINE_SZ: u32 = 4;
const MIN_DC_LINE_SZ: u32 = 8;
const CONFIG_PARAMS: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlbConfig {
    pub sets: u32,
    pub set_size: u32,
    pub idx_size: u32,
}

impl TlbConfig {
    pub fn new(sets: u32, set_size: u32) -> Self {
        TlbConfig { sets, set_size, idx_size: bits::min_bits(sets) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTableConfig {
    pub virtual_pages: u32,
    pub physical_pages: u32,
    pub page_size: u32,
    pub idx_size: u32,
    pub offset_size: u32,
}

impl PageTableConfig {
    pub fn new(virtual_pages: u32, physical_pages: u32, page_size: u32) -> Self {
        PageTableConfig {
            virtual_pages,
            physical_pages,
            page_size,
            idx_size: bits::min_bits(virtual_pages),
            offset_size: bits::min_bits(page_size),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub sets: u32,
    pub set_size: u32,
    pub line_size: u32,
    pub idx_size: u32,
    pub offset_size: u32,
}

impl CacheConfig {
    pub fn new(sets: u32, set_size: u32, line_size: u32) -> Self {
        CacheConfig {
            sets,
            set_size,
            line_size,
            idx_size: bits::min_bits(sets),
            offset_size: bits::min_bits(line_size),
        }
    }
}

/// A validated description of the simulated hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub itlb: TlbConfig,
    pub dtlb: TlbConfig,
    pub pt: PageTableConfig,
    pub ic: CacheConfig,
    pub dc: CacheConfig,
    /// Data cache uses write-through/no-write-allocate instead of write-back/write-allocate
    pub write_through: bool,
    pub virtual_addrs_enabled: bool,
    pub tlbs_enabled: bool,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Config, SimError> {
        let text = fs::read_to_string(path)?;
        Config::parse(&text)
    }

    /// Parses a `trace.config` style document.
    ///
    /// Every line with a `:` carries exactly one value after the colon; headings
    /// and blank lines are skipped. The values are positional.
    pub fn parse(text: &str) -> Result<Config, SimError> {
        let opts: Vec<&str> = text
            .lines()
            .filter_map(|line| line.split_once(':'))
            .map(|(_, opt)| opt.trim())
            .collect();

        if opts.len() != CONFIG_PARAMS {
            error!("Expected {} configuration parameters, Found {}", CONFIG_PARAMS, opts.len());
        }

        // Assume config file is always in correct order
        let itlb = {
            let sets = number(opts[0], "instruction TLB sets")?;
            let set_size = number(opts[1], "instruction TLB set size")?;
            check_sets(sets, MAX_TLB_SETS, "instruction TLB")?;
            check_assoc(set_size, "instruction TLB")?;
            TlbConfig::new(sets, set_size)
        };

        let dtlb = {
            let sets = number(opts[2], "data TLB sets")?;
            let set_size = number(opts[3], "data TLB set size")?;
            check_sets(sets, MAX_TLB_SETS, "data TLB")?;
            check_assoc(set_size, "data TLB")?;
            TlbConfig::new(sets, set_size)
        };

        let pt = {
            let virtual_pages = number(opts[4], "virtual pages")?;
            let physical_pages = number(opts[5], "physical pages")?;
            let page_size = number(opts[6], "page size")?;
            if virtual_pages == 0 || virtual_pages > MAX_VIRT_PAGES {
                error!("the number of virtual pages must be between 1 and {}, inclusive", MAX_VIRT_PAGES);
            }
            if !bits::is_pow2(virtual_pages) {
                error!("the number of virtual pages must be a power of two");
            }
            if physical_pages > MAX_PHYS_PAGES {
                error!("the number of physical pages cannot be greater than {}", MAX_PHYS_PAGES);
            }
            if !bits::is_pow2(page_size) {
                error!("the page size must be a power of two");
            }
            let pt = PageTableConfig::new(virtual_pages, physical_pages, page_size);
            if pt.idx_size + pt.offset_size > bits::bit_size::<u32>() {
                error!("{} virtual pages of {} bytes do not fit in a 32-bit address", virtual_pages, page_size);
            }
            pt
        };

        let ic = {
            let sets = number(opts[7], "instruction cache sets")?;
            let set_size = number(opts[8], "instruction cache set size")?;
            let line_size = number(opts[9], "instruction cache line size")?;
            check_sets(sets, MAX_CACHE_SETS, "instruction cache")?;
            check_assoc(set_size, "instruction cache")?;
            check_line(line_size, MIN_IC_LINE_SZ, "instruction cache")?;
            CacheConfig::new(sets, set_size, line_size)
        };

        let dc = {
            let sets = number(opts[10], "data cache sets")?;
            let set_size = number(opts[11], "data cache set size")?;
            let line_size = number(opts[12], "data cache line size")?;
            check_sets(sets, MAX_CACHE_SETS, "data cache")?;
            check_assoc(set_size, "data cache")?;
            check_line(line_size, MIN_DC_LINE_SZ, "data cache")?;
            CacheConfig::new(sets, set_size, line_size)
        };

        let write_through = flag(opts[13], "write-through")?;
        let virtual_addrs_enabled = flag(opts[14], "virtual address")?;
        let tlbs_enabled = flag(opts[15], "TLB")?;

        Ok(Config { itlb, dtlb, pt, ic, dc, write_through, virtual_addrs_enabled, tlbs_enabled })
    }
}

fn number(opt: &str, what: &str) -> Result<u32, SimError> {
    match opt.parse::<u32>() {
        Ok(n) => Ok(n),
        Err(_) => error!("{} must be a non-negative integer, found {:?}", what, opt),
    }
}

fn flag(opt: &str, what: &str) -> Result<bool, SimError> {
    match opt {
        "y" => Ok(true),
        "n" => Ok(false),
        _ => error!("invalid value for {} configuration: {:?}", what, opt),
    }
}

fn check_sets(sets: u32, max: u32, what: &str) -> Result<(), SimError> {
    if sets == 0 || sets > max {
        error!("the number of {} sets must be between 1 and {}, inclusive", what, max);
    }
    if !bits::is_pow2(sets) {
        error!("the number of {} sets must be a power of two", what);
    }
    Ok(())
}

fn check_assoc(set_size: u32, what: &str) -> Result<(), SimError> {
    if set_size == 0 || set_size > MAX_ASSOC {
        error!("{} associativity must be between 1 and {}, inclusive", what, MAX_ASSOC);
    }
    Ok(())
}

fn check_line(line_size: u32, min: u32, what: &str) -> Result<(), SimError> {
    if line_size < min {
        error!("the {} line size must be at least {}", what, min);
    }
    if !bits::is_pow2(line_size) {
        error!("the {} line size must be a power of two", what);
    }
    Ok(())
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (name, tlb) in [("Instruction", &self.itlb), ("Data", &self.dtlb)] {
            writeln!(f, "{} TLB contains {} sets.", name, tlb.sets)?;
            writeln!(f, "Each set contains {} entries.", tlb.set_size)?;
            writeln!(f, "Number of bits used for the index is {}.", tlb.idx_size)?;
            writeln!(f)?;
        }

        writeln!(f, "Number of virtual pages is {}.", self.pt.virtual_pages)?;
        writeln!(f, "Number of physical pages is {}.", self.pt.physical_pages)?;
        writeln!(f, "Each page contains {} bytes.", self.pt.page_size)?;
        writeln!(f, "Number of bits used for the page table index is {}.", self.pt.idx_size)?;
        writeln!(f, "Number of bits used for the page offset is {}.", self.pt.offset_size)?;
        writeln!(f)?;

        writeln!(f, "I-cache contains {} sets.", self.ic.sets)?;
        writeln!(f, "Each set contains {} entries.", self.ic.set_size)?;
        writeln!(f, "Each line is {} bytes.", self.ic.line_size)?;
        writeln!(f, "Number of bits used for the index is {}.", self.ic.idx_size)?;
        writeln!(f, "Number of bits used for the offset is {}.", self.ic.offset_size)?;
        writeln!(f)?;

        writeln!(f, "D-cache contains {} sets.", self.dc.sets)?;
        writeln!(f, "Each set contains {} entries.", self.dc.set_size)?;
        writeln!(f, "Each line is {} bytes.", self.dc.line_size)?;
        writeln!(f, "The cache uses a {} policy.",
                if self.write_through { "no write-allocate and write-through" } else { "write-allocate and write-back" })?;
        writeln!(f, "Number of bits used for the index is {}.", self.dc.idx_size)?;
        writeln!(f, "Number of bits used for the offset is {}.", self.dc.offset_size)?;
        writeln!(f)?;

        writeln!(f, "The addresses read in are {} addresses.",
                if self.virtual_addrs_enabled { "virtual" } else { "physical" })?;

        if !self.tlbs_enabled {
            writeln!(f, "TLBs are disabled in this configuration.")?;
        }
        Ok(())
    }
}
