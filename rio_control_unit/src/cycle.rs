//! Reference host loop: update → exchange, paced at the configured cycle.
//!
//! Uses `clock_nanosleep(TIMER_ABSTIME)` with the `rt` feature and
//! `std::thread::sleep` otherwise.
//!
//! ## RT Setup Sequence
//! 1. `mlockall(MCL_CURRENT | MCL_FUTURE)`: lock all pages.
//! 2. Prefault stack pages.
//! 3. `sched_setaffinity`: pin to an isolated CPU core.
//! 4. `sched_setscheduler(SCHED_FIFO, prio)`: RT priority.

use crate::bridge::Bridge;
use crate::transfer::TransferState;
use rio_common::config::{BridgeConfig, ConfigError};
use rio_common::hal::transport::Transport;
use rio_common::pins::BridgePins;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Cycles between periodic statistics reports.
pub const REPORT_INTERVAL: u64 = 1000;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Last cycle duration [ns].
    pub last_cycle_ns: i64,
    /// Minimum cycle duration [ns].
    pub min_cycle_ns: i64,
    /// Maximum cycle duration [ns].
    pub max_cycle_ns: i64,
    sum_cycle_ns: i64,
    /// Cycles that took longer than the budget.
    pub overruns: u64,
    /// Maximum wake-up latency [ns].
    pub max_latency_ns: i64,
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
            max_latency_ns: 0,
        }
    }

    /// Record a cycle duration. O(1), no allocation.
    #[inline]
    pub fn record(&mut self, duration_ns: i64, latency_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns = self.sum_cycle_ns.saturating_add(duration_ns);
        self.max_latency_ns = self.max_latency_ns.max(latency_ns);
    }

    /// Average cycle time [ns] (returns 0 if no cycles).
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

// ─── Errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("RT setup error: {0}")]
    RtSetup(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cycle overrun: {actual_ns}ns > {budget_ns}ns budget")]
    CycleOverrun { actual_ns: i64, budget_ns: i64 },
}

// ─── RT Setup ───────────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), CycleError> {
    use nix::sys::mman::{MlockallFlags, mlockall};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| CycleError::RtSetup(format!("mlockall failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), CycleError> {
    Ok(())
}

/// Touch 256 KiB of stack so the loop never faults a stack page in.
fn prefault_stack() {
    let mut buf = [0u8; 256 * 1024];
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid, aligned, exclusive reference.
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), CycleError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| CycleError::RtSetup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| CycleError::RtSetup(format!("sched_setaffinity failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), CycleError> {
    Ok(())
}

#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), CycleError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` outlives the call; pid 0 is the calling thread.
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(CycleError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), CycleError> {
    Ok(())
}

/// Full RT setup sequence. Without the `rt` feature only the stack
/// prefault runs.
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), CycleError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    Ok(())
}

// ─── Cycle Runner ───────────────────────────────────────────────────

/// Owns a bridge, its pin surface and a transport, and drives them at the
/// configured cycle time until stopped.
pub struct CycleRunner {
    bridge: Bridge,
    pins: BridgePins,
    transport: Box<dyn Transport>,
    cycle_time_ns: i64,
    stats: CycleStats,
    running: Arc<AtomicBool>,
    last_status: bool,
}

impl CycleRunner {
    pub fn new(config: &BridgeConfig, transport: Box<dyn Transport>) -> Result<Self, CycleError> {
        let bridge = Bridge::new(config)?;
        let pins = BridgePins::from_config(config);
        info!("CycleRunner using '{}' transport", transport.name());
        Ok(Self {
            bridge,
            pins,
            transport,
            cycle_time_ns: config.cycle_time_ns(),
            stats: CycleStats::new(),
            running: Arc::new(AtomicBool::new(true)),
            last_status: false,
        })
    }

    /// Flag that stops [`Self::run`] when cleared.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn pins(&self) -> &BridgePins {
        &self.pins
    }

    pub fn pins_mut(&mut self) -> &mut BridgePins {
        &mut self.pins
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Run until the running flag is cleared, or for `max_cycles` cycles
    /// when non-zero.
    ///
    /// # Errors
    /// With the `rt` feature, `CycleError::CycleOverrun` on the first
    /// overrun.
    pub fn run(&mut self, max_cycles: u64) -> Result<(), CycleError> {
        #[cfg(feature = "rt")]
        {
            self.run_rt_loop(max_cycles)
        }

        #[cfg(not(feature = "rt"))]
        {
            self.run_sim_loop(max_cycles)
        }
    }

    fn keep_running(&self, max_cycles: u64) -> bool {
        self.running.load(Ordering::Relaxed)
            && (max_cycles == 0 || self.stats.cycle_count < max_cycles)
    }

    #[cfg(feature = "rt")]
    fn run_rt_loop(&mut self, max_cycles: u64) -> Result<(), CycleError> {
        use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

        let clock = ClockId::CLOCK_MONOTONIC;
        let now = |clock: ClockId| {
            clock_gettime(clock).map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))
        };
        let mut next_wake = now(clock)?;

        while self.keep_running(max_cycles) {
            next_wake = timespec_add_ns(next_wake, self.cycle_time_ns);

            let cycle_start = now(clock)?;
            self.run_once();
            let cycle_end = now(clock)?;

            let duration_ns = timespec_diff_ns(&cycle_end, &cycle_start);
            let wake_latency_ns = timespec_diff_ns(&cycle_start, &next_wake).abs();
            self.stats.record(duration_ns, wake_latency_ns);

            if duration_ns > self.cycle_time_ns {
                self.stats.overruns += 1;
                return Err(CycleError::CycleOverrun {
                    actual_ns: duration_ns,
                    budget_ns: self.cycle_time_ns,
                });
            }

            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
        }
        Ok(())
    }

    #[cfg(not(feature = "rt"))]
    fn run_sim_loop(&mut self, max_cycles: u64) -> Result<(), CycleError> {
        use std::time::{Duration, Instant};

        let cycle_duration = Duration::from_nanos(self.cycle_time_ns.max(0) as u64);

        while self.keep_running(max_cycles) {
            let cycle_start = Instant::now();
            self.run_once();
            let elapsed = cycle_start.elapsed();
            let duration_ns = elapsed.as_nanos().min(i64::MAX as u128) as i64;

            self.stats.record(duration_ns, 0);
            if duration_ns > self.cycle_time_ns {
                self.stats.overruns += 1;
            }

            if let Some(remaining) = cycle_duration.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }
        Ok(())
    }

    /// One update + exchange at the nominal period, with status reporting.
    pub fn run_once(&mut self) -> TransferState {
        let state = self
            .bridge
            .cycle(&mut self.pins, self.transport.as_mut(), self.cycle_time_ns);

        if self.pins.status != self.last_status {
            if self.pins.status {
                info!("Bridge synchronized with firmware");
            } else {
                warn!("Bridge lost synchronization: {state:?}");
            }
            self.last_status = self.pins.status;
        }

        let cycles = self.stats.cycle_count + 1;
        if cycles % REPORT_INTERVAL == 0 {
            let diag = self.bridge.diagnostics();
            debug!(
                cycles,
                status = self.pins.status,
                pos_fb = self.pins.joints.first().map_or(0.0, |j| j.pos_fb),
                data = diag.data_frames,
                faults = diag.malformed_frames + diag.transport_errors + diag.estop_frames,
                avg_ns = self.stats.avg_cycle_ns(),
                max_ns = self.stats.max_cycle_ns,
                "cycle report"
            );
        }
        state
    }
}

// ─── Time Helpers ───────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    use nix::sys::time::TimeSpec;
    let mut secs = ts.tv_sec();
    let mut nanos = ts.tv_nsec() + ns;
    while nanos >= 1_000_000_000 {
        secs += 1;
        nanos -= 1_000_000_000;
    }
    while nanos < 0 {
        secs -= 1;
        nanos += 1_000_000_000;
    }
    TimeSpec::new(secs, nanos)
}

/// (a - b) in nanoseconds.
#[cfg(feature = "rt")]
fn timespec_diff_ns(a: &nix::sys::time::TimeSpec, b: &nix::sys::time::TimeSpec) -> i64 {
    (a.tv_sec() - b.tv_sec()) * 1_000_000_000 + (a.tv_nsec() - b.tv_nsec())
}

// ─── Tests ──────────────────────────────────────────────────────────
