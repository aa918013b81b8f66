use memsim::config::{CacheConfig, PageTableConfig, TlbConfig};
use memsim::error::SimError;
use memsim::{Access, Config, Memory, Query, Reference, Stream, TraceReader};

const SAMPLE_CONFIG: &str = "\
Instruction TLB configuration
Number of sets: 4
Set size: 1

Data TLB configuration
Number of sets: 4
Set size: 2

Page Table configuration
Number of virtual pages: 64
Number of physical pages: 4
Page size: 256

Instruction Cache configuration
Number of sets: 4
Set size: 1
Line size: 16

Data Cache configuration
Number of sets: 16
Set size: 1
Line size: 16
Write through/no write allocate: n

Virtual addresses: y
TLB: y
";

/// 16 virtual pages of 256 bytes, 16 byte lines, 4 cache sets each side
fn virtual_config(physical_pages: u32, write_through: bool) -> Config {
    Config {
        itlb: TlbConfig::new(2, 1),
        dtlb: TlbConfig::new(2, 1),
        pt: PageTableConfig::new(16, physical_pages, 256),
        ic: CacheConfig::new(4, 1, 16),
        dc: CacheConfig::new(4, 1, 16),
        write_through,
        virtual_addrs_enabled: true,
        tlbs_enabled: true,
    }
}

/// Physical addressing with a single one-line data cache
fn physical_config(write_through: bool) -> Config {
    Config {
        virtual_addrs_enabled: false,
        tlbs_enabled: false,
        dc: CacheConfig::new(1, 1, 16),
        ..virtual_config(4, write_through)
    }
}

fn read(stream: Stream, addr: u32) -> Reference {
    Reference::new(stream, Access::Read, addr)
}

fn write(addr: u32) -> Reference {
    Reference::new(Stream::Data, Access::Write, addr)
}

#[test]
fn single_entry_tlb_thrashes() {
    let config = Config { dtlb: TlbConfig::new(1, 1), ..virtual_config(4, false) };
    let mut mem = Memory::new(config).unwrap();

    let results: Vec<_> = [0x000, 0x100, 0x000]
        .into_iter()
        .map(|addr| mem.access(read(Stream::Data, addr)).unwrap())
        .map(|e| (e.tlb.unwrap().result, e.page_table_res))
        .collect();

    assert_eq!(results, vec![
        (Query::Miss, Some(Query::Miss)),
        (Query::Miss, Some(Query::Miss)),
        (Query::Miss, Some(Query::Hit)),
    ]);
}

#[test]
fn third_page_evicts_first_frame_everywhere() {
    let mut mem = Memory::new(virtual_config(2, false)).unwrap();

    // page A (vpn 0) through both streams, then B (vpn 1), then C (vpn 2)
    let a_inst = mem.access(read(Stream::Instruction, 0x0010)).unwrap();
    let a_data = mem.access(read(Stream::Data, 0x0020)).unwrap();
    assert_eq!((a_inst.physical_page_num, a_data.physical_page_num), (0, 0));
    let b = mem.access(read(Stream::Data, 0x0130)).unwrap();
    assert_eq!(b.physical_page_num, 1);

    let c = mem.access(read(Stream::Data, 0x0200)).unwrap();
    assert_eq!(c.physical_page_num, 0);

    assert_eq!(mem.page_table().lookup(0), None);
    assert_eq!(mem.page_table().lookup(1), Some(1));
    assert_eq!(mem.page_table().lookup(2), Some(0));

    // only C's own line and translation may still point at frame 0
    let frame0_inst_lines = mem.cache(Stream::Instruction).lines().filter(|l| l.valid && l.frame == 0).count();
    let frame0_data_lines = mem.cache(Stream::Data).lines().filter(|l| l.valid && l.frame == 0).count();
    let frame0_itlb = mem.tlb(Stream::Instruction).lines().filter(|l| l.valid && l.frame == 0).count();
    let frame0_dtlb = mem.tlb(Stream::Data).lines().filter(|l| l.valid && l.frame == 0).count();
    assert_eq!((frame0_inst_lines, frame0_data_lines, frame0_itlb, frame0_dtlb), (0, 1, 0, 1));

    // A has to fault back in
    let again = mem.access(read(Stream::Instruction, 0x0010)).unwrap();
    assert_eq!(again.tlb.unwrap().result, Query::Miss);
    assert_eq!(again.page_table_res, Some(Query::Miss));
    assert_eq!(again.cache_res, Query::Miss);
}

#[test]
fn write_through_write_miss_bypasses_cache() {
    let mut mem = Memory::new(physical_config(true)).unwrap();
    let e = mem.access(write(0x0040)).unwrap();
    assert_eq!(e.cache_res, Query::Miss);
    assert_eq!(mem.stats().memory_refs, 1);
    assert!(mem.cache(Stream::Data).lines().all(|l| !l.valid));

    // and the next read of the same line still misses
    let e = mem.access(read(Stream::Data, 0x0040)).unwrap();
    assert_eq!(e.cache_res, Query::Miss);
    assert_eq!(mem.stats().memory_refs, 2);
}

#[test]
fn tlbs_without_virtual_addresses_fail_fast() {
    let config = Config { virtual_addrs_enabled: false, ..virtual_config(4, false) };
    assert!(matches!(Memory::new(config), Err(SimError::ConfigInconsistency(_))));

    let mut config = Config::parse(SAMPLE_CONFIG).unwrap();
    config.virtual_addrs_enabled = false;
    assert!(matches!(Memory::new(config), Err(SimError::ConfigInconsistency(_))));
}

#[test]
fn cold_frames_need_no_cleanup() {
    let mut mem = Memory::new(virtual_config(4, false)).unwrap();
    mem.access(write(0x0000)).unwrap();
    mem.access(read(Stream::Instruction, 0x0010)).unwrap();

    // three more pages, each landing in a never-used frame
    for addr in [0x0120, 0x0230, 0x03a0] {
        let before = mem.stats().clone();
        mem.access(read(Stream::Data, addr)).unwrap();
        let s = mem.stats();
        // walk + line fill, nothing written back
        assert_eq!(s.memory_refs - before.memory_refs, 2);
        assert_eq!(s.disk_refs - before.disk_refs, 1);
    }

    assert_eq!(mem.page_table().lookup(0), Some(0));
    assert!(mem.cache(Stream::Data).lines().any(|l| l.valid && l.dirty && l.frame == 0));
    assert!(mem.cache(Stream::Instruction).lines().any(|l| l.valid && l.frame == 0));
}

#[test]
fn warm_frame_writes_back_every_dirty_line() {
    let mut mem = Memory::new(virtual_config(2, false)).unwrap();
    // two dirty lines in page 0, in different sets
    mem.access(write(0x0000)).unwrap();
    mem.access(write(0x0010)).unwrap();
    mem.access(read(Stream::Data, 0x0120)).unwrap();

    let before = mem.stats().clone();
    mem.access(read(Stream::Data, 0x0230)).unwrap();
    let s = mem.stats();

    // walk + 2 dirty lines + fill
    assert_eq!(s.memory_refs - before.memory_refs, 4);
    // page in + dirty page out
    assert_eq!(s.disk_refs - before.disk_refs, 2);
    assert!(mem.cache(Stream::Data).lines().all(|l| l.frame != 0 || !l.dirty));
}

#[test]
fn write_through_never_dirties() {
    let mut mem = Memory::new(virtual_config(2, true)).unwrap();
    for addr in [0x0000, 0x0010, 0x0000, 0x0130, 0x0200, 0x0010, 0x0300] {
        mem.access(read(Stream::Data, addr)).unwrap();
        mem.access(write(addr)).unwrap();
        assert!(mem.cache(Stream::Data).lines().all(|l| !l.dirty));
    }
}

#[test]
fn write_back_allocates_on_write_miss() {
    let mut mem = Memory::new(physical_config(false)).unwrap();

    let e = mem.access(write(0x0000)).unwrap();
    assert_eq!(e.cache_res, Query::Miss);
    assert_eq!(mem.stats().memory_refs, 1);
    let line = *mem.cache(Stream::Data).lines().next().unwrap();
    assert!(line.valid && line.dirty);

    // a second write to another tag pushes the dirty line out: fill + write back
    mem.access(write(0x0100)).unwrap();
    assert_eq!(mem.stats().memory_refs, 3);

    // a read miss over a dirty line also writes it back
    mem.access(read(Stream::Data, 0x0200)).unwrap();
    assert_eq!(mem.stats().memory_refs, 5);
    let line = *mem.cache(Stream::Data).lines().next().unwrap();
    assert!(line.valid && !line.dirty);
}

#[test]
fn write_back_hit_sets_dirty_without_traffic() {
    let mut mem = Memory::new(physical_config(false)).unwrap();
    mem.access(read(Stream::Data, 0x0040)).unwrap();
    let e = mem.access(write(0x0048)).unwrap();
    assert_eq!(e.cache_res, Query::Hit);
    assert_eq!(mem.stats().memory_refs, 1);
    assert!(mem.cache(Stream::Data).lines().next().unwrap().dirty);
}

#[test]
fn instruction_write_aborts() {
    let mut mem = Memory::new(virtual_config(2, false)).unwrap();
    let trace = "D:R:0010\nI:W:0020\nD:R:0030\n";
    let mut replayed = 0;
    let mut failure = None;
    for reference in TraceReader::new(trace.as_bytes()) {
        match mem.access(reference.unwrap()) {
            Ok(_) => replayed += 1,
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
    }
    assert_eq!(replayed, 1);
    assert!(matches!(failure, Some(SimError::MalformedReference { addr: 0x20, .. })));
}

#[test]
fn sample_trace_end_to_end() {
    let config = Config::parse(SAMPLE_CONFIG).unwrap();
    let mut mem = Memory::new(config).unwrap();
    let trace = "\
D:R:0c84
D:W:0c88
I:R:0c80
D:R:1000
D:R:2000
D:R:3000
D:R:0400
I:R:0c80
";

    let events = TraceReader::new(trace.as_bytes())
        .map(|r| mem.access(r?))
        .collect::<Result<Vec<_>, SimError>>()
        .unwrap();
    assert_eq!(events.len(), 8);

    assert_eq!(events[1].tlb.unwrap().result, Query::Hit);
    assert_eq!(events[1].cache_res, Query::Hit);
    assert_eq!(events[2].page_table_res, Some(Query::Hit));
    // frame 0 is recycled for vpn 4, so vpn c faults back in on frame 1
    assert_eq!(events[6].physical_page_num, 0);
    assert_eq!(events[7].page_table_res, Some(Query::Miss));
    assert_eq!(events[7].physical_page_num, 1);
    assert_eq!((events[7].cache_tag, events[7].cache_idx), (0x6, 0));

    let s = mem.stats();
    assert_eq!((s.itlb_hits, s.itlb_misses), (0, 2));
    assert_eq!((s.dtlb_hits, s.dtlb_misses), (1, 5));
    assert_eq!((s.pt_hits, s.pt_faults), (1, 6));
    assert_eq!((s.ic_hits, s.ic_misses), (0, 2));
    assert_eq!((s.dc_hits, s.dc_misses), (1, 5));
    assert_eq!((s.reads, s.writes), (7, 1));
    assert_eq!((s.inst_refs, s.data_refs), (2, 6));
    assert_eq!(s.memory_refs, 15);
    assert_eq!(s.disk_refs, 7);

    let summary = s.summary(mem.config()).to_string();
    assert!(summary.contains("pt hit ratio     : 0.142857\n"));
}
