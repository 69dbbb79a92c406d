// [apps/scanner/src/services/mod.rs]
/*!
 * Background daemons the kernel spawns alongside the HTTP surface: the scan
 * job scheduler, the feedback signal observer, and the retention cleanup
 * sweep.
 */

pub mod cleanup;
pub mod observer;
pub mod scheduler;

pub use cleanup::spawn_cleanup_service;
pub use observer::Observer;
pub use scheduler::Scheduler;
