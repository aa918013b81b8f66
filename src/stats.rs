use std::fmt;

use crate::{
    config::Config,
    memory::Query,
    trace::{Access, Stream},
};

/// Running tallies for one trace replay.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Stats {
    pub itlb_hits: u64,
    pub itlb_misses: u64,
    pub dtlb_hits: u64,
    pub dtlb_misses: u64,
    pub pt_hits: u64,
    pub pt_faults: u64,
    pub ic_hits: u64,
    pub ic_misses: u64,
    pub dc_hits: u64,
    pub dc_misses: u64,
    pub reads: u64,
    pub writes: u64,
    pub inst_refs: u64,
    pub data_refs: u64,
    pub memory_refs: u64,
    pub disk_refs: u64,
}

impl Stats {
    pub fn record_reference(&mut self, stream: Stream, access: Access) {
        match access {
            Access::Read => self.reads += 1,
            Access::Write => self.writes += 1,
        }
        match stream {
            Stream::Instruction => self.inst_refs += 1,
            Stream::Data => self.data_refs += 1,
        }
    }

    pub fn record_tlb(&mut self, stream: Stream, res: Query) {
        let counter = match (stream, res) {
            (Stream::Instruction, Query::Hit) => &mut self.itlb_hits,
            (Stream::Instruction, Query::Miss) => &mut self.itlb_misses,
            (Stream::Data, Query::Hit) => &mut self.dtlb_hits,
            (Stream::Data, Query::Miss) => &mut self.dtlb_misses,
        };
        *counter += 1;
    }

    pub fn record_page_table(&mut self, res: Query) {
        match res {
            Query::Hit => self.pt_hits += 1,
            Query::Miss => self.pt_faults += 1,
        }
    }

    pub fn record_cache(&mut self, stream: Stream, res: Query) {
        let counter = match (stream, res) {
            (Stream::Instruction, Query::Hit) => &mut self.ic_hits,
            (Stream::Instruction, Query::Miss) => &mut self.ic_misses,
            (Stream::Data, Query::Hit) => &mut self.dc_hits,
            (Stream::Data, Query::Miss) => &mut self.dc_misses,
        };
        *counter += 1;
    }

    pub fn itlb_hit_ratio(&self) -> Option<f64> {
        ratio(self.itlb_hits, self.itlb_misses)
    }

    pub fn dtlb_hit_ratio(&self) -> Option<f64> {
        ratio(self.dtlb_hits, self.dtlb_misses)
    }

    pub fn pt_hit_ratio(&self) -> Option<f64> {
        ratio(self.pt_hits, self.pt_faults)
    }

    pub fn ic_hit_ratio(&self) -> Option<f64> {
        ratio(self.ic_hits, self.ic_misses)
    }

    pub fn dc_hit_ratio(&self) -> Option<f64> {
        ratio(self.dc_hits, self.dc_misses)
    }

    pub fn read_ratio(&self) -> Option<f64> {
        ratio(self.reads, self.writes)
    }

    pub fn inst_ratio(&self) -> Option<f64> {
        ratio(self.inst_refs, self.data_refs)
    }

    /// The end-of-run report. Ratios for disabled structures print as N/A.
    pub fn summary<'a>(&'a self, config: &'a Config) -> Summary<'a> {
        Summary { stats: self, config }
    }
}

/// `part / (part + rest)`, or `None` if there's nothing to divide
fn ratio(part: u64, rest: u64) -> Option<f64> {
    let total = part + rest;
    (total > 0).then(|| part as f64 / total as f64)
}

fn block(f: &mut fmt::Formatter<'_>, rows: [(&str, u64); 2], label: &str, ratio: Option<f64>) -> fmt::Result {
    for (name, n) in rows {
        writeln!(f, "{:<17}: {}", name, n)?;
    }
    match ratio {
        Some(r) => writeln!(f, "{:<17}: {:.6}", label, r)?,
        None => writeln!(f, "{:<17}: N/A", label)?,
    }
    writeln!(f)
}

pub struct Summary<'a> {
    stats: &'a Stats,
    config: &'a Config,
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.stats;
        let tlbs = self.config.tlbs_enabled;
        let pt = self.config.virtual_addrs_enabled;

        writeln!(f, "Simulation statistics")?;
        writeln!(f)?;
        block(f, [("itlb hits", s.itlb_hits), ("itlb misses", s.itlb_misses)],
            "itlb hit ratio", s.itlb_hit_ratio().filter(|_| tlbs))?;
        block(f, [("dtlb hits", s.dtlb_hits), ("dtlb misses", s.dtlb_misses)],
            "dtlb hit ratio", s.dtlb_hit_ratio().filter(|_| tlbs))?;
        block(f, [("pt hits", s.pt_hits), ("pt faults", s.pt_faults)],
            "pt hit ratio", s.pt_hit_ratio().filter(|_| pt))?;
        block(f, [("ic hits", s.ic_hits), ("ic misses", s.ic_misses)],
            "ic hit ratio", s.ic_hit_ratio())?;
        block(f, [("dc hits", s.dc_hits), ("dc misses", s.dc_misses)],
            "dc hit ratio", s.dc_hit_ratio())?;
        block(f, [("Total reads", s.reads), ("Total writes", s.writes)],
            "Ratio of reads", s.read_ratio())?;
        block(f, [("Total inst refs", s.inst_refs), ("Total data refs", s.data_refs)],
            "Ratio of insts", s.inst_ratio())?;
        writeln!(f, "{:<17}: {}", "main memory refs", s.memory_refs)?;
        writeln!(f, "{:<17}: {}", "disk refs", s.disk_refs)
    }
}
