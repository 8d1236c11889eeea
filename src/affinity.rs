//! Thread-to-core pinning.
//!
//! Each pipeline stage (ingest, correlator, decision, dispatcher workers)
//! wants its own core so the kernel scheduler never migrates a hot loop
//! mid-spin. `sched_setaffinity` is Linux-only; anywhere else this is a
//! no-op so the crate still builds and runs, just without the pinning
//! guarantee.

pub trait Affinity {
    /// Pins the calling thread to `core_id`. Best-effort: failures are
    /// logged, never fatal — losing pinning degrades latency, it doesn't
    /// break correctness.
    fn pin_current(core_id: usize);
}

#[cfg(target_os = "linux")]
pub struct LinuxAffinity;

#[cfg(target_os = "linux")]
impl Affinity for LinuxAffinity {
    fn pin_current(core_id: usize) {
        unsafe {
            let mut set: libc::cpu_set_t = std::mem::zeroed();
            libc::CPU_ZERO(&mut set);
            libc::CPU_SET(core_id, &mut set);
            let rc = libc::sched_setaffinity(
                0,
                std::mem::size_of::<libc::cpu_set_t>(),
                &set,
            );
            if rc != 0 {
                log::warn!(
                    target: "antinuke_audit",
                    "sched_setaffinity(core={}) failed: errno={}",
                    core_id,
                    std::io::Error::last_os_error()
                );
            }
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub struct NoopAffinity;

#[cfg(not(target_os = "linux"))]
impl Affinity for NoopAffinity {
    fn pin_current(core_id: usize) {
        log::debug!(target: "antinuke_audit", "thread pinning unsupported on this platform, ignoring core={}", core_id);
    }
}

#[cfg(target_os = "linux")]
pub type DefaultAffinity = LinuxAffinity;

#[cfg(not(target_os = "linux"))]
pub type DefaultAffinity = NoopAffinity;
