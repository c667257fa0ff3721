use super::binder::AudioTrigger;
use super::catalog::AudioCatalog;
use super::ledger::{LedgerEntry, PlaybackStatus};
use crate::logging::{MissionLogger, Severity};
use std::collections::{HashMap, VecDeque};

const MASTER_BUS_ID: &str = "master";
const PREEMPTION_EPSILON: f64 = 1e-6;

/// Default cue duration used when a cue's `length_seconds` is non-finite
/// and it is not a loop.
pub const DEFAULT_CUE_DURATION_SECONDS: f64 = 3.0;
pub const DEFAULT_MAX_LEDGER_ENTRIES: usize = 2048;

fn severity_weight(severity: Severity) -> f64 {
    match severity {
        Severity::Info => 0.0,
        Severity::Log => 1.0,
        Severity::Event => 1.0,
        Severity::Warn => 5.0,
        Severity::Error => 10.0,
    }
}

#[derive(Debug, Clone)]
struct QueuedTrigger {
    cue_id: String,
    category_id: Option<String>,
    bus_id: String,
    effective_priority: f64,
    triggered_at_seconds: f64,
    sequence: u64,
    severity: Severity,
    metadata: Option<String>,
}

#[derive(Debug, Clone)]
struct ActiveRecord {
    ledger_id: u64,
    cue_id: String,
    category_id: Option<String>,
    bus_id: String,
    severity: Severity,
    priority: f64,
    started_at_seconds: f64,
    ends_at_seconds: f64,
    metadata: Option<String>,
    ducking_applied: Vec<(String, f64)>,
}

/// Per-bus live state: pending queue plus active playback records.
#[derive(Debug, Clone, Default)]
struct BusState {
    queue: Vec<QueuedTrigger>,
    active: Vec<ActiveRecord>,
}

/// The live audio dispatcher: per-bus queues/active sets, cooldown
/// tracking, ducking, and the playback ledger (§4.9).
#[derive(Debug, Clone)]
pub struct AudioDispatcher {
    catalog: AudioCatalog,
    buses: HashMap<String, BusState>,
    cue_last_trigger: HashMap<String, f64>,
    category_last_trigger: HashMap<String, f64>,
    duck_gains: HashMap<String, f64>,
    ledger: VecDeque<LedgerEntry>,
    max_ledger_entries: usize,
    next_ledger_id: u64,
    next_sequence: u64,
    suppressed_count: u64,
}

impl AudioDispatcher {
    #[must_use]
    pub fn new(catalog: AudioCatalog) -> Self {
        let buses = catalog.buses.iter().map(|b| (b.id.clone(), BusState::default())).collect();
        Self {
            catalog,
            buses,
            cue_last_trigger: HashMap::new(),
            category_last_trigger: HashMap::new(),
            duck_gains: HashMap::new(),
            ledger: VecDeque::new(),
            max_ledger_entries: DEFAULT_MAX_LEDGER_ENTRIES,
            next_ledger_id: 0,
            next_sequence: 0,
            suppressed_count: 0,
        }
    }

    /// The number of suppressed (cooldown-blocked, then dropped) triggers
    /// observed since construction.
    #[must_use]
    pub fn suppressed_count(&self) -> u64 { self.suppressed_count }

    /// Current mixer gain for `bus_id`, the minimum of all active ducking
    /// contributions targeting it (1.0 when none).
    #[must_use]
    pub fn bus_gain(&self, bus_id: &str) -> f64 { self.duck_gains.get(bus_id).copied().unwrap_or(1.0) }

    /// The full playback ledger, oldest first.
    #[must_use]
    pub fn ledger(&self) -> &VecDeque<LedgerEntry> { &self.ledger }

    fn resolve_bus(&self, cue_id: &str) -> String {
        self.catalog
            .cue(cue_id)
            .and_then(|cue| cue.bus_id.clone().or_else(|| cue.category_id.as_deref().and_then(|c| self.catalog.category(c)).map(|c| c.bus_id.clone())))
            .unwrap_or_else(|| MASTER_BUS_ID.to_string())
    }

    fn resolve_priority(&self, cue_id: &str, severity: Severity) -> f64 {
        let cue = self.catalog.cue(cue_id);
        let base = cue
            .and_then(|c| c.priority)
            .or_else(|| cue.and_then(|c| c.category_id.as_deref()).and_then(|cat| self.catalog.category(cat)).map(|c| c.default_priority))
            .unwrap_or(0.0);
        base + severity_weight(severity)
    }

    fn cooldown_blocked(&self, cue_id: &str, category_id: Option<&str>, now: f64) -> bool {
        let cue_cooldown = self.catalog.cue(cue_id).and_then(|c| c.cooldown_seconds);
        if let Some(cd) = cue_cooldown {
            if let Some(last) = self.cue_last_trigger.get(cue_id) {
                if now - last < cd {
                    return true;
                }
            }
        }
        if let Some(cat_id) = category_id {
            if let Some(cat) = self.catalog.category(cat_id) {
                if let Some(last) = self.category_last_trigger.get(cat_id) {
                    if now - last < cat.cooldown_seconds {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Advances the dispatcher by one tick: retires expired playback,
    /// drains `pending` (binder output plus any direct triggers) into
    /// per-bus queues, and starts/pre-empts playback as capacity allows
    /// (§4.9).
    pub fn tick(&mut self, now: f64, pending: Vec<AudioTrigger>, logger: &mut MissionLogger) {
        self.retire_expired(now, logger);
        self.drain_into_queues(now, pending, logger);

        let bus_ids: Vec<String> = self.catalog.buses.iter().map(|b| b.id.clone()).collect();
        for bus_id in bus_ids {
            self.fill_bus(&bus_id, now, logger);
        }
    }

    fn retire_expired(&mut self, now: f64, logger: &mut MissionLogger) {
        for bus_id in self.catalog.buses.iter().map(|b| b.id.clone()).collect::<Vec<_>>() {
            let Some(bus) = self.buses.get_mut(&bus_id) else { continue };
            let (expired, remaining): (Vec<_>, Vec<_>) = bus.active.drain(..).partition(|r| r.ends_at_seconds.is_finite() && r.ends_at_seconds <= now);
            bus.active = remaining;
            for record in expired {
                self.finalize_record(record, now, PlaybackStatus::Completed, None, logger);
            }
        }
    }

    fn drain_into_queues(&mut self, now: f64, pending: Vec<AudioTrigger>, logger: &mut MissionLogger) {
        for trigger in pending {
            let bus_id = self.resolve_bus(&trigger.cue_id);
            let category_id = self.catalog.cue(&trigger.cue_id).and_then(|c| c.category_id.clone());
            let priority = self.resolve_priority(&trigger.cue_id, trigger.severity);
            let sequence = self.next_sequence;
            self.next_sequence += 1;
            let Some(bus) = self.buses.get_mut(&bus_id) else {
                logger.warn(now, "audio", "audio_dispatcher", format!("cue {} routed to unknown bus {bus_id}", trigger.cue_id));
                continue;
            };
            let max_pending = self.catalog.bus(&bus_id).map_or(usize::MAX, |b| b.max_pending);
            if bus.queue.len() >= max_pending {
                self.suppressed_count += 1;
                logger.warn(now, "audio", "audio_dispatcher", format!("bus {bus_id} pending queue full, dropping {}", trigger.cue_id));
                continue;
            }
            bus.queue.push(QueuedTrigger {
                cue_id: trigger.cue_id,
                category_id,
                bus_id: bus_id.clone(),
                effective_priority: priority,
                triggered_at_seconds: trigger.triggered_at_seconds,
                sequence,
                severity: trigger.severity,
                metadata: trigger.metadata,
            });
        }
        for bus in self.buses.values_mut() {
            bus.queue.sort_by(|a, b| {
                b.effective_priority
                    .partial_cmp(&a.effective_priority)
                    .unwrap()
                    .then(a.triggered_at_seconds.partial_cmp(&b.triggered_at_seconds).unwrap())
                    .then(a.sequence.cmp(&b.sequence))
            });
        }
    }

    fn fill_bus(&mut self, bus_id: &str, now: f64, logger: &mut MissionLogger) {
        let Some(max_concurrent) = self.catalog.bus(bus_id).map(|b| b.max_concurrent) else { return };
        loop {
            // Cooldown-suppressed triggers are dropped outright, not left to
            // linger in the queue until their cooldown expires (§4.9).
            loop {
                let blocked = {
                    let Some(bus) = self.buses.get(bus_id) else { return };
                    bus.queue.first().is_some_and(|q| self.cooldown_blocked(&q.cue_id, q.category_id.as_deref(), now))
                };
                if !blocked {
                    break;
                }
                let trigger = self.buses.get_mut(bus_id).unwrap().queue.remove(0);
                self.suppressed_count += 1;
                logger.note(now, "audio", "audio_dispatcher", format!("{} suppressed by cooldown", trigger.cue_id));
            }

            let Some(bus) = self.buses.get(bus_id) else { return };
            if bus.queue.is_empty() {
                break;
            }
            let has_capacity = bus.active.len() < max_concurrent;

            if has_capacity {
                let trigger = self.buses.get_mut(bus_id).unwrap().queue.remove(0);
                self.start_playback(trigger, now, logger);
                continue;
            }

            // No free slot: consider preemption.
            let queued_priority = self.buses.get(bus_id).unwrap().queue[0].effective_priority;
            let lowest_active = self
                .buses
                .get(bus_id)
                .unwrap()
                .active
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| a.priority.partial_cmp(&b.priority).unwrap());
            let Some((active_idx, active_record)) = lowest_active else { break };
            if queued_priority > active_record.priority + PREEMPTION_EPSILON {
                let record = self.buses.get_mut(bus_id).unwrap().active.remove(active_idx);
                self.finalize_record(record, now, PlaybackStatus::Preempted, Some("preempted".to_string()), logger);
                let trigger = self.buses.get_mut(bus_id).unwrap().queue.remove(0);
                self.start_playback(trigger, now, logger);
            } else {
                break;
            }
        }
    }

    fn start_playback(&mut self, trigger: QueuedTrigger, now: f64, logger: &mut MissionLogger) {
        let cue = self.catalog.cue(&trigger.cue_id).cloned();
        let (duration, is_loop) = cue.as_ref().map_or((DEFAULT_CUE_DURATION_SECONDS, false), |c| {
            if c.is_loop {
                (f64::INFINITY, true)
            } else if c.length_seconds.is_finite() {
                (c.length_seconds, false)
            } else {
                (DEFAULT_CUE_DURATION_SECONDS, false)
            }
        });
        let ends_at = if is_loop { f64::INFINITY } else { now + duration };

        self.cue_last_trigger.insert(trigger.cue_id.clone(), now);
        if let Some(cat) = &trigger.category_id {
            self.category_last_trigger.insert(cat.clone(), now);
        }

        let ledger_id = self.next_ledger_id;
        self.next_ledger_id += 1;

        let ducking_applied = self.apply_ducking(&trigger.bus_id, now, logger);

        let record = ActiveRecord {
            ledger_id,
            cue_id: trigger.cue_id.clone(),
            category_id: trigger.category_id.clone(),
            bus_id: trigger.bus_id.clone(),
            severity: trigger.severity,
            priority: trigger.effective_priority,
            started_at_seconds: now,
            ends_at_seconds: ends_at,
            metadata: trigger.metadata.clone(),
            ducking_applied: ducking_applied.clone(),
        };

        self.push_ledger(LedgerEntry {
            id: ledger_id,
            cue_id: trigger.cue_id.clone(),
            category_id: trigger.category_id,
            bus_id: trigger.bus_id.clone(),
            severity: trigger.severity,
            started_at_seconds: now,
            ended_at_seconds: None,
            stop_reason: None,
            status: PlaybackStatus::Playing,
            metadata: trigger.metadata,
            ducking: ducking_applied,
        });
        logger.note(now, "audio", "audio_dispatcher", format!("playing {} on {}", trigger.cue_id, trigger.bus_id));
        self.buses.get_mut(&trigger.bus_id).unwrap().active.push(record);
    }

    fn apply_ducking(&mut self, source_bus_id: &str, now: f64, logger: &mut MissionLogger) -> Vec<(String, f64)> {
        let Some(bus) = self.catalog.bus(source_bus_id) else { return Vec::new() };
        let rules = bus.ducking.clone();
        let mut applied = Vec::new();
        for rule in rules {
            applied.push((rule.target_bus_id.clone(), rule.gain_linear));
            self.recompute_duck_gain(&rule.target_bus_id, now, logger);
        }
        applied
    }

    fn recompute_duck_gain(&mut self, target_bus_id: &str, now: f64, logger: &mut MissionLogger) {
        let mut min_gain = 1.0_f64;
        for bus in self.catalog.buses.clone() {
            for rule in &bus.ducking {
                if rule.target_bus_id != target_bus_id {
                    continue;
                }
                if self.buses.get(&bus.id).is_some_and(|b| !b.active.is_empty()) {
                    min_gain = min_gain.min(rule.gain_linear);
                }
            }
        }
        let previous = self.duck_gains.get(target_bus_id).copied().unwrap_or(1.0);
        if (previous - min_gain).abs() > 1e-9 {
            self.duck_gains.insert(target_bus_id.to_string(), min_gain);
            logger.note(now, "audio", "audio_dispatcher", format!("bus {target_bus_id} gain -> {min_gain:.3}"));
        }
    }

    fn finalize_record(&mut self, record: ActiveRecord, now: f64, status: PlaybackStatus, stop_reason: Option<String>, logger: &mut MissionLogger) {
        if let Some(entry) = self.ledger.iter_mut().find(|e| e.id == record.ledger_id) {
            entry.ended_at_seconds = Some(now);
            entry.status = status;
            entry.stop_reason.clone_from(&stop_reason);
        }
        for (target, _) in &record.ducking_applied {
            self.recompute_duck_gain(target, now, logger);
        }
        logger.note(now, "audio", "audio_dispatcher", format!("{} on {} -> {status}", record.cue_id, record.bus_id));
    }

    fn push_ledger(&mut self, entry: LedgerEntry) {
        if self.ledger.len() >= self.max_ledger_entries {
            self.ledger.pop_front();
        }
        self.ledger.push_back(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::catalog::{AudioBus, AudioCue};

    fn catalog() -> AudioCatalog {
        AudioCatalog {
            buses: vec![AudioBus { id: "master".into(), max_concurrent: 1, max_pending: 8, ducking: vec![] }],
            categories: vec![],
            cues: vec![
                AudioCue { id: "low".into(), bus_id: Some("master".into()), category_id: None, length_seconds: 10.0, is_loop: false, cooldown_seconds: None, priority: Some(1.0) },
                AudioCue { id: "high".into(), bus_id: Some("master".into()), category_id: None, length_seconds: 10.0, is_loop: false, cooldown_seconds: None, priority: Some(10.0) },
            ],
        }
    }

    #[test]
    fn higher_priority_trigger_preempts_active_lower_priority() {
        let mut dispatcher = AudioDispatcher::new(catalog());
        let mut logger = MissionLogger::new();
        logger.set_echo_to_console(false);

        dispatcher.tick(0.0, vec![AudioTrigger { cue_id: "low".into(), triggered_at_seconds: 0.0, severity: Severity::Info, metadata: None }], &mut logger);
        assert_eq!(dispatcher.ledger().len(), 1);
        assert_eq!(dispatcher.ledger()[0].status, PlaybackStatus::Playing);

        dispatcher.tick(1.0, vec![AudioTrigger { cue_id: "high".into(), triggered_at_seconds: 1.0, severity: Severity::Info, metadata: None }], &mut logger);
        assert_eq!(dispatcher.ledger().len(), 2);
        assert_eq!(dispatcher.ledger()[0].status, PlaybackStatus::Preempted);
        assert_eq!(dispatcher.ledger()[1].status, PlaybackStatus::Playing);
    }

    #[test]
    fn cooldown_blocked_trigger_is_dropped_and_counted_not_left_queued() {
        let mut catalog = catalog();
        catalog.cues[0].cooldown_seconds = Some(100.0);
        let mut dispatcher = AudioDispatcher::new(catalog);
        let mut logger = MissionLogger::new();
        logger.set_echo_to_console(false);

        dispatcher.tick(0.0, vec![AudioTrigger { cue_id: "low".into(), triggered_at_seconds: 0.0, severity: Severity::Info, metadata: None }], &mut logger);
        assert_eq!(dispatcher.ledger().len(), 1);

        // "low" is still under cooldown; this trigger must be dropped, not
        // left in the queue to play once cooldown lapses.
        dispatcher.tick(1.0, vec![AudioTrigger { cue_id: "low".into(), triggered_at_seconds: 1.0, severity: Severity::Info, metadata: None }], &mut logger);
        assert_eq!(dispatcher.suppressed_count(), 1);
        assert_eq!(dispatcher.ledger().len(), 1);

        dispatcher.tick(200.0, vec![], &mut logger);
        assert_eq!(dispatcher.ledger().len(), 1);
        assert_eq!(dispatcher.suppressed_count(), 1);
    }

    #[test]
    fn cue_completes_naturally_and_is_retired() {
        let mut dispatcher = AudioDispatcher::new(catalog());
        let mut logger = MissionLogger::new();
        logger.set_echo_to_console(false);
        dispatcher.tick(0.0, vec![AudioTrigger { cue_id: "low".into(), triggered_at_seconds: 0.0, severity: Severity::Info, metadata: None }], &mut logger);
        dispatcher.tick(11.0, vec![], &mut logger);
        assert_eq!(dispatcher.ledger()[0].status, PlaybackStatus::Completed);
    }
}
