//! Property tests for the layout and counting invariants of each component.

use ossim_common::{FitStrategy, PageId, ProcessId, ReplacementPolicy};
use ossim_core::paging::PageAccess;
use ossim_core::{ContiguousAllocator, CpuScheduler, PagingManager, SegmentationManager};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum SegOp {
    Allocate(u8, u64),
    Free(u8),
    Compact,
}

fn seg_op() -> impl Strategy<Value = SegOp> {
    prop_oneof![
        4 => (0u8..8, 1u64..300).prop_map(|(n, s)| SegOp::Allocate(n, s)),
        3 => (0u8..8).prop_map(SegOp::Free),
        1 => Just(SegOp::Compact),
    ]
}

fn strategy() -> impl Strategy<Value = FitStrategy> {
    prop::sample::select(FitStrategy::ALL.to_vec())
}

proptest! {
    #[test]
    fn contiguous_conserves_total_size(
        sizes in prop::collection::vec(1u64..500, 1..10),
        ops in prop::collection::vec((0u8..6, 1u64..500, any::<bool>(), strategy()), 0..40),
    ) {
        let mut allocator = ContiguousAllocator::with_blocks(sizes.iter().copied()).unwrap();
        let total = allocator.total_size();

        for (pid, size, free, strategy) in ops {
            let pid = ProcessId::new(format!("P{pid}"));
            if free {
                let _ = allocator.deallocate(&pid);
            } else {
                let _ = allocator.allocate(size, pid, strategy);
            }
            prop_assert_eq!(allocator.total_size(), total);
            prop_assert_eq!(allocator.blocks().len(), sizes.len());

            let mut owners: Vec<_> = allocator.blocks().iter().filter_map(|b| b.process_id()).collect();
            let owned = owners.len();
            owners.sort();
            owners.dedup();
            prop_assert_eq!(owners.len(), owned);
        }
    }

    #[test]
    fn segmentation_stays_well_formed(ops in prop::collection::vec(seg_op(), 0..60)) {
        let mut seg = SegmentationManager::new(1024).unwrap();

        for op in ops {
            match op {
                SegOp::Allocate(n, size) => {
                    let before = seg.regions().to_vec();
                    if seg.allocate(format!("s{n}"), size, None).is_err() {
                        prop_assert_eq!(seg.regions(), before.as_slice());
                    }
                }
                SegOp::Free(n) => {
                    let _ = seg.deallocate(&format!("s{n}"));
                }
                SegOp::Compact => {
                    seg.compact();
                }
            }
            prop_assert!(seg.is_well_formed(), "{:?}", seg.regions());
        }
    }

    #[test]
    fn compaction_is_idempotent(ops in prop::collection::vec(seg_op(), 0..40)) {
        let mut seg = SegmentationManager::new(1024).unwrap();
        for op in ops {
            match op {
                SegOp::Allocate(n, size) => { let _ = seg.allocate(format!("s{n}"), size, None); }
                SegOp::Free(n) => { let _ = seg.deallocate(&format!("s{n}")); }
                SegOp::Compact => {}
            }
        }

        let used = seg.used_size();
        let first = seg.compact();
        let layout = seg.regions().to_vec();
        let second = seg.compact();

        prop_assert_eq!(seg.regions(), layout.as_slice());
        prop_assert_eq!(first, second);
        prop_assert!(first.free_blocks <= 1);
        prop_assert_eq!(seg.used_size(), used);
    }

    #[test]
    fn paging_counts_every_access(
        frames in 1u64..6,
        pages in prop::collection::vec(0u32..10, 0..80),
        policy in prop::sample::select(vec![
            ReplacementPolicy::Fifo,
            ReplacementPolicy::Lru,
            ReplacementPolicy::Optimal,
            ReplacementPolicy::Clock,
        ]),
    ) {
        let mut paging = PagingManager::new(frames * 100, 100).unwrap();
        paging.create_page_table(ProcessId::new("P1"), 1000, 100).unwrap();
        paging.set_policy(policy);

        let accesses: Vec<_> = pages.iter().map(|&p| PageAccess::read(p)).collect();
        let report = paging.simulate(&accesses).unwrap();

        let stats = paging.stats();
        prop_assert_eq!(stats.page_hits + stats.page_faults, pages.len() as u64);
        prop_assert_eq!(report.summary.total_accesses, pages.len());

        let mut resident: Vec<PageId> = paging.resident_pages().collect();
        let count = resident.len();
        resident.sort();
        resident.dedup();
        prop_assert_eq!(resident.len(), count);

        for entry in paging.page_table() {
            match entry.frame_id {
                Some(frame) if entry.valid => {
                    prop_assert_eq!(paging.frames()[frame.index()].page_id, Some(entry.page_id));
                }
                _ => prop_assert!(!entry.valid),
            }
        }
    }

    #[test]
    fn optimal_never_faults_more_than_fifo_or_lru(
        pages in prop::collection::vec(0u32..8, 0..60),
        frames in 1u64..5,
    ) {
        let faults = |policy| {
            let mut paging = PagingManager::new(frames, 1).unwrap();
            paging.create_page_table(ProcessId::new("P1"), 8, 1).unwrap();
            paging.set_policy(policy);
            let accesses: Vec<_> = pages.iter().map(|&p| PageAccess::read(p)).collect();
            paging.simulate(&accesses).unwrap().summary.page_faults
        };

        let optimal = faults(ReplacementPolicy::Optimal);
        prop_assert!(optimal <= faults(ReplacementPolicy::Fifo));
        prop_assert!(optimal <= faults(ReplacementPolicy::Lru));
    }

    #[test]
    fn fifo_evicts_oldest_load(pages in prop::collection::vec(0u32..10, 1..60)) {
        let mut paging = PagingManager::new(300, 100).unwrap();
        paging.create_page_table(ProcessId::new("P1"), 1000, 100).unwrap();

        for page in pages {
            let oldest = paging
                .frames()
                .iter()
                .filter(|f| !f.is_empty())
                .min_by_key(|f| f.load_time)
                .and_then(|f| f.page_id);
            let full = paging.frames().iter().all(|f| !f.is_empty());

            let outcome = paging.access_page(PageId::new(page), false).unwrap();
            if outcome.fault && full {
                prop_assert_eq!(outcome.evicted, oldest);
            }
        }
    }

    #[test]
    fn schedules_form_contiguous_timelines(
        jobs in prop::collection::vec((1u64..10, 0u64..20), 1..8),
        quantum in 1u64..5,
    ) {
        let mut scheduler = CpuScheduler::new();
        for (i, &(burst, arrival)) in jobs.iter().enumerate() {
            scheduler.add_process(format!("P{i}"), burst, arrival).unwrap();
        }
        let total_burst: u64 = jobs.iter().map(|&(b, _)| b).sum();

        for report in scheduler.compare(quantum).unwrap() {
            prop_assert_eq!(report.gantt.first().map(|e| e.start), Some(0));
            for pair in report.gantt.windows(2) {
                prop_assert_eq!(pair[0].end, pair[1].start);
            }
            prop_assert_eq!(report.makespan() - report.idle_time(), total_burst);
            prop_assert_eq!(report.metrics.len(), jobs.len());
            for m in &report.metrics {
                prop_assert_eq!(m.tat, m.ft - m.at);
                prop_assert_eq!(m.wt, m.tat - m.bt);
            }
        }
    }
}
