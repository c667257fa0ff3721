//! The Audio Cue Binder and Dispatcher (C10): priority/cooldown/preemption
//! queueing with bus ducking (§4.9 of the design spec).

mod binder;
mod catalog;
mod dispatcher;
mod ledger;

pub use binder::{AudioCueBinder, AudioTrigger};
pub use catalog::{AudioBus, AudioCatalog, AudioCategory, AudioCue, DuckingRule};
pub use dispatcher::{AudioDispatcher, DEFAULT_CUE_DURATION_SECONDS, DEFAULT_MAX_LEDGER_ENTRIES};
pub use ledger::{LedgerEntry, PlaybackStatus};
