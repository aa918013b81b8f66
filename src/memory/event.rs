use crate::trace::Stream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    Hit,
    Miss,
}

impl Query {
    pub fn from_hit(hit: bool) -> Self {
        if hit { Query::Hit } else { Query::Miss }
    }

    pub fn is_hit(&self) -> bool {
        *self == Query::Hit
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Query::Hit => "hit",
            Query::Miss => "miss",
        }
    }
}

/// A TLB probe for one reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlbProbe {
    pub tag: u32,
    pub idx: u32,
    pub result: Query,
}

/// Represents the details of a successful access of the memory simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessEvent {
    /// The address as it appeared in the trace
    pub addr: u32,
    pub stream: Stream,
    /// Only when addresses are virtual
    pub virtual_page_num: Option<u32>,
    pub page_offset: u32,
    /// Only when TLBs are enabled
    pub tlb: Option<TlbProbe>,
    /// `None` when addresses are physical or a TLB hit skipped the walk
    pub page_table_res: Option<Query>,
    pub physical_page_num: u32,
    pub cache_tag: u32,
    pub cache_idx: u32,
    pub cache_res: Query,
}

impl AccessEvent {
    /// The three header lines above the per-reference report
    pub fn header(virtual_addrs: bool) -> String {
        let row = |cols: [&str; 12]| {
            format!(
                "{:<8} {:<7} {:<6} {:<4} {:<7} {:<5} {:<4} {:<4} {:<6} {:<7} {:<5} {:<4}",
                cols[0], cols[1], cols[2], cols[3], cols[4], cols[5],
                cols[6], cols[7], cols[8], cols[9], cols[10], cols[11],
            )
        };
        [
            row([if virtual_addrs { "Virtual" } else { "Physical" },
                "Virtual", "Page", "Ref", "TLB", "TLB", "TLB", "PT", "Phys", "Cache", "Cache", "Cache"]),
            row(["Address", "Page #", "Offset", "Type", "Tag", "Index", "Ref", "Ref", "Page #", "Tag", "Index", "Ref"]),
            row(["--------", "-------", "------", "----", "-------", "-----", "----", "----", "------", "-------", "-----", "-----"]),
        ]
        .join("\n")
    }
}

impl std::fmt::Display for AccessEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        write!(f, "{:08x} ", self.addr)?;
        match self.virtual_page_num {
            Some(vpn) => write!(f, "{:7x} ", vpn)?,
            None => write!(f, "{:7} ", "")?,
        }
        write!(f, "{:6x} {:<4} ", self.page_offset, self.stream.as_str())?;
        match &self.tlb {
            Some(tlb) => write!(f, "{:7x} {:5x} {:<4} ", tlb.tag, tlb.idx, tlb.result.as_str())?,
            None => write!(f, "{:7} {:5} {:4} ", "", "", "")?,
        }
        match (self.virtual_page_num, self.page_table_res) {
            (Some(_), res) => write!(f, "{:<4} ", res.map_or("none", |q| q.as_str()))?,
            (None, _) => write!(f, "{:4} ", "")?,
        }
        write!(f, "{:6x} ", self.physical_page_num)?;
        write!(f, "{:7x} {:5x} {:<4}", self.cache_tag, self.cache_idx, self.cache_res.as_str())
    }
}
