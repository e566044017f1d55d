//! Simple profiling counters using thread-local storage
//!
//! Lightweight timing of the hot paths without changing function signatures.
//! Enable with environment variable: CHAIN_REACTION_PROFILE=1

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

thread_local! {
    static CASCADE_TIME: RefCell<u64> = RefCell::new(0);
    static CASCADE_COUNT: RefCell<usize> = RefCell::new(0);

    static MOVE_GEN_TIME: RefCell<u64> = RefCell::new(0);
    static MOVE_GEN_COUNT: RefCell<usize> = RefCell::new(0);

    static EVAL_TIME: RefCell<u64> = RefCell::new(0);
    static EVAL_COUNT: RefCell<usize> = RefCell::new(0);

    static SEARCH_TIME: RefCell<u64> = RefCell::new(0);
    static SEARCH_COUNT: RefCell<usize> = RefCell::new(0);
    static ALPHA_BETA_CUTOFFS: RefCell<usize> = RefCell::new(0);
}

// Global aggregators
static GLOBAL_CASCADE_TIME: AtomicU64 = AtomicU64::new(0);
static GLOBAL_CASCADE_COUNT: AtomicUsize = AtomicUsize::new(0);
static GLOBAL_MOVE_GEN_TIME: AtomicU64 = AtomicU64::new(0);
static GLOBAL_MOVE_GEN_COUNT: AtomicUsize = AtomicUsize::new(0);
static GLOBAL_EVAL_TIME: AtomicU64 = AtomicU64::new(0);
static GLOBAL_EVAL_COUNT: AtomicUsize = AtomicUsize::new(0);
static GLOBAL_SEARCH_TIME: AtomicU64 = AtomicU64::new(0);
static GLOBAL_SEARCH_COUNT: AtomicUsize = AtomicUsize::new(0);
static GLOBAL_ALPHA_BETA_CUTOFFS: AtomicUsize = AtomicUsize::new(0);

static PROFILING_ENABLED: OnceLock<bool> = OnceLock::new();

#[inline]
pub fn is_profiling_enabled() -> bool {
    *PROFILING_ENABLED.get_or_init(|| std::env::var("CHAIN_REACTION_PROFILE").is_ok())
}

pub struct ProfileGuard {
    start: Instant,
    category: &'static str,
}

impl ProfileGuard {
    pub fn new(category: &'static str) -> Option<Self> {
        if is_profiling_enabled() {
            Some(ProfileGuard {
                start: Instant::now(),
                category,
            })
        } else {
            None
        }
    }
}

impl Drop for ProfileGuard {
    fn drop(&mut self) {
        let elapsed_ns = self.start.elapsed().as_nanos() as u64;

        match self.category {
            "cascade" => {
                CASCADE_TIME.with(|t| *t.borrow_mut() += elapsed_ns);
                CASCADE_COUNT.with(|c| *c.borrow_mut() += 1);
            }
            "move_gen" => {
                MOVE_GEN_TIME.with(|t| *t.borrow_mut() += elapsed_ns);
                MOVE_GEN_COUNT.with(|c| *c.borrow_mut() += 1);
            }
            "eval" => {
                EVAL_TIME.with(|t| *t.borrow_mut() += elapsed_ns);
                EVAL_COUNT.with(|c| *c.borrow_mut() += 1);
            }
            "search" => {
                SEARCH_TIME.with(|t| *t.borrow_mut() += elapsed_ns);
                SEARCH_COUNT.with(|c| *c.borrow_mut() += 1);
            }
            _ => {}
        }
    }
}

#[inline]
pub fn record_alpha_beta_cutoff() {
    if is_profiling_enabled() {
        ALPHA_BETA_CUTOFFS.with(|c| *c.borrow_mut() += 1);
    }
}

fn drain_time(local: &'static std::thread::LocalKey<RefCell<u64>>, global: &AtomicU64) {
    local.with(|t| {
        global.fetch_add(*t.borrow(), Ordering::Relaxed);
        *t.borrow_mut() = 0;
    });
}

fn drain_count(local: &'static std::thread::LocalKey<RefCell<usize>>, global: &AtomicUsize) {
    local.with(|c| {
        global.fetch_add(*c.borrow(), Ordering::Relaxed);
        *c.borrow_mut() = 0;
    });
}

/// Folds this thread's counters into the global totals
pub fn merge_thread_local() {
    if !is_profiling_enabled() {
        return;
    }

    drain_time(&CASCADE_TIME, &GLOBAL_CASCADE_TIME);
    drain_count(&CASCADE_COUNT, &GLOBAL_CASCADE_COUNT);
    drain_time(&MOVE_GEN_TIME, &GLOBAL_MOVE_GEN_TIME);
    drain_count(&MOVE_GEN_COUNT, &GLOBAL_MOVE_GEN_COUNT);
    drain_time(&EVAL_TIME, &GLOBAL_EVAL_TIME);
    drain_count(&EVAL_COUNT, &GLOBAL_EVAL_COUNT);
    drain_time(&SEARCH_TIME, &GLOBAL_SEARCH_TIME);
    drain_count(&SEARCH_COUNT, &GLOBAL_SEARCH_COUNT);
    drain_count(&ALPHA_BETA_CUTOFFS, &GLOBAL_ALPHA_BETA_CUTOFFS);
}

fn print_line(label: &str, time_ns: u64, count: usize, total_ns: u64) {
    let ms = time_ns as f64 / 1_000_000.0;
    let pct = if total_ns > 0 { 100.0 * time_ns as f64 / total_ns as f64 } else { 0.0 };
    let avg_us = if count > 0 { time_ns as f64 / (count * 1000) as f64 } else { 0.0 };
    eprintln!("{}:", label);
    eprintln!("  Time:     {:.2}ms ({:.1}%)", ms, pct);
    eprintln!("  Calls:    {}", count);
    eprintln!("  Avg:      {:.2}µs/call\n", avg_us);
}

pub fn print_report(total_time_ms: u64) {
    if !is_profiling_enabled() {
        return;
    }

    let total_ns = total_time_ms * 1_000_000;

    eprintln!("\n═══════════════════════════════════════════════════════════");
    eprintln!("                 PERFORMANCE PROFILE");
    eprintln!("═══════════════════════════════════════════════════════════");
    eprintln!("Total Time: {}ms\n", total_time_ms);

    print_line(
        "Search",
        GLOBAL_SEARCH_TIME.load(Ordering::Relaxed),
        GLOBAL_SEARCH_COUNT.load(Ordering::Relaxed),
        total_ns,
    );
    print_line(
        "Cascade Resolution",
        GLOBAL_CASCADE_TIME.load(Ordering::Relaxed),
        GLOBAL_CASCADE_COUNT.load(Ordering::Relaxed),
        total_ns,
    );
    print_line(
        "Move Generation",
        GLOBAL_MOVE_GEN_TIME.load(Ordering::Relaxed),
        GLOBAL_MOVE_GEN_COUNT.load(Ordering::Relaxed),
        total_ns,
    );
    print_line(
        "Evaluation",
        GLOBAL_EVAL_TIME.load(Ordering::Relaxed),
        GLOBAL_EVAL_COUNT.load(Ordering::Relaxed),
        total_ns,
    );

    eprintln!(
        "Alpha-Beta Cutoffs: {}\n",
        GLOBAL_ALPHA_BETA_CUTOFFS.load(Ordering::Relaxed)
    );
    eprintln!("═══════════════════════════════════════════════════════════\n");
}

pub fn reset() {
    GLOBAL_CASCADE_TIME.store(0, Ordering::Relaxed);
    GLOBAL_CASCADE_COUNT.store(0, Ordering::Relaxed);
    GLOBAL_MOVE_GEN_TIME.store(0, Ordering::Relaxed);
    GLOBAL_MOVE_GEN_COUNT.store(0, Ordering::Relaxed);
    GLOBAL_EVAL_TIME.store(0, Ordering::Relaxed);
    GLOBAL_EVAL_COUNT.store(0, Ordering::Relaxed);
    GLOBAL_SEARCH_TIME.store(0, Ordering::Relaxed);
    GLOBAL_SEARCH_COUNT.store(0, Ordering::Relaxed);
    GLOBAL_ALPHA_BETA_CUTOFFS.store(0, Ordering::Relaxed);
}
