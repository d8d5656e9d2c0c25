//! System Scheduling
//!
//! Systems run once per tick in ascending priority order. Systems sharing a
//! priority run in registration order. The list is only re-sorted when a
//! registration or priority change has marked it dirty.
//!
//! While a system runs it is taken out of its slot so it can receive
//! `&mut World`. Other systems may add, remove, pause or resume systems
//! during the tick: additions run from the next tick, pausing or removing a
//! system that has not run yet takes effect immediately.

use crate::ecs::{System, World};
use std::collections::HashMap;

struct SystemEntry {
    name: String,
    priority: i32,
    /// Registration order, used as the tie-break between equal priorities
    sequence: u64,
    enabled: bool,
    paused: bool,
    /// `None` while the system is executing
    system: Option<Box<dyn System>>,
}

impl SystemEntry {
    fn is_runnable(&self) -> bool {
        self.enabled && !self.paused && self.system.is_some()
    }
}

/// Priority-ordered collection of systems
#[derive(Default)]
pub struct SystemScheduler {
    entries: Vec<SystemEntry>,
    index: HashMap<String, usize>,
    next_sequence: u64,
    dirty: bool,
    /// Systems removed from the schedule that still need `shutdown`
    retired: Vec<Box<dyn System>>,
}

impl SystemScheduler {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a system. Rejects duplicate names.
    pub fn add_system(&mut self, system: Box<dyn System>, priority: i32) -> bool {
        let name = system.name().to_string();
        if self.index.contains_key(&name) {
            log::warn!("[SystemScheduler] System '{name}' already registered, ignoring");
            return false;
        }

        self.index.insert(name.clone(), self.entries.len());
        self.entries.push(SystemEntry {
            name,
            priority,
            sequence: self.next_sequence,
            enabled: true,
            paused: false,
            system: Some(system),
        });
        self.next_sequence += 1;
        self.dirty = true;
        true
    }

    /// Remove a system by name.
    ///
    /// The removed system is queued for shutdown; the owning [`World`] calls
    /// its `shutdown` hook.
    pub fn remove_system(&mut self, name: &str) -> bool {
        let Some(position) = self.index.get(name).copied() else {
            log::warn!("[SystemScheduler] Cannot remove unknown system '{name}'");
            return false;
        };

        let entry = self.entries.remove(position);
        if let Some(system) = entry.system {
            self.retired.push(system);
        }
        self.rebuild_index();
        true
    }

    /// Check whether a system with this name is registered
    pub fn has_system(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of registered systems
    pub fn system_count(&self) -> usize {
        self.entries.len()
    }

    /// Pause a system. Its state and position are kept.
    pub fn pause_system(&mut self, name: &str) -> bool {
        self.with_entry(name, "pause", |entry| entry.paused = true)
    }

    /// Resume a paused system
    pub fn resume_system(&mut self, name: &str) -> bool {
        self.with_entry(name, "resume", |entry| entry.paused = false)
    }

    /// Pause every system
    pub fn pause_all_systems(&mut self) {
        for entry in &mut self.entries {
            entry.paused = true;
        }
    }

    /// Resume every system
    pub fn resume_all_systems(&mut self) {
        for entry in &mut self.entries {
            entry.paused = false;
        }
    }

    /// Enable or disable a system. Disabled systems are skipped like paused ones.
    pub fn set_system_enabled(&mut self, name: &str, enabled: bool) -> bool {
        self.with_entry(name, "enable", |entry| entry.enabled = enabled)
    }

    /// Change a system's priority; the order is rebuilt on the next tick
    pub fn set_system_priority(&mut self, name: &str, priority: i32) -> bool {
        let changed = self.with_entry(name, "reprioritize", |entry| entry.priority = priority);
        if changed {
            self.dirty = true;
        }
        changed
    }

    /// Whether the named system is paused
    pub fn is_system_paused(&self, name: &str) -> Option<bool> {
        self.entry(name).map(|entry| entry.paused)
    }

    /// Whether the named system is enabled
    pub fn is_system_enabled(&self, name: &str) -> Option<bool> {
        self.entry(name).map(|entry| entry.enabled)
    }

    /// Priority of the named system
    pub fn system_priority(&self, name: &str) -> Option<i32> {
        self.entry(name).map(|entry| entry.priority)
    }

    /// Names in the order they will execute
    pub fn execution_order(&mut self) -> Vec<String> {
        self.sort_if_dirty();
        self.entries.iter().map(|entry| entry.name.clone()).collect()
    }

    /// Take the systems waiting for their `shutdown` hook
    pub fn take_retired(&mut self) -> Vec<Box<dyn System>> {
        std::mem::take(&mut self.retired)
    }

    /// Remove every system, queueing them all for shutdown
    pub fn clear(&mut self) {
        for entry in self.entries.drain(..) {
            if let Some(system) = entry.system {
                self.retired.push(system);
            }
        }
        self.index.clear();
        self.dirty = false;
    }

    /// Run every enabled, non-paused system once in priority order
    pub(crate) fn run(world: &mut World, delta_time: f32) {
        let order = world.scheduler_mut().execution_order();

        for name in &order {
            let Some(mut system) = world.scheduler_mut().take_runnable(name) else {
                continue;
            };
            system.update(world, delta_time);
            world.scheduler_mut().restore(name, system);
        }
    }

    fn take_runnable(&mut self, name: &str) -> Option<Box<dyn System>> {
        let position = *self.index.get(name)?;
        let entry = &mut self.entries[position];
        if entry.is_runnable() {
            entry.system.take()
        } else {
            None
        }
    }

    fn restore(&mut self, name: &str, system: Box<dyn System>) {
        match self.index.get(name).map(|&position| &mut self.entries[position]) {
            Some(entry) if entry.system.is_none() => entry.system = Some(system),
            // Removed (or replaced under the same name) while it was running
            _ => self.retired.push(system),
        }
    }

    fn sort_if_dirty(&mut self) {
        if !self.dirty {
            return;
        }
        self.entries.sort_by_key(|entry| (entry.priority, entry.sequence));
        self.rebuild_index();
        self.dirty = false;
        log::debug!("[SystemScheduler] Re-sorted {} systems", self.entries.len());
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.name.clone(), position))
            .collect();
    }

    fn entry(&self, name: &str) -> Option<&SystemEntry> {
        self.index.get(name).map(|&position| &self.entries[position])
    }

    fn with_entry(&mut self, name: &str, action: &str, f: impl FnOnce(&mut SystemEntry)) -> bool {
        match self.index.get(name) {
            Some(&position) => {
                f(&mut self.entries[position]);
                true
            }
            None => {
                log::warn!("[SystemScheduler] Cannot {action} unknown system '{name}'");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::FnSystem;

    struct Noop(&'static str);

    impl System for Noop {
        fn name(&self) -> &str {
            self.0
        }

        fn update(&mut self, _world: &mut World, _delta_time: f32) {}
    }

    #[test]
    fn test_execution_order_by_priority() {
        let mut scheduler = SystemScheduler::new();
        scheduler.add_system(Box::new(Noop("render")), 30);
        scheduler.add_system(Box::new(Noop("input")), 10);
        scheduler.add_system(Box::new(Noop("physics")), 20);

        assert_eq!(scheduler.execution_order(), vec!["input", "physics", "render"]);
    }

    #[test]
    fn test_equal_priorities_keep_registration_order() {
        let mut scheduler = SystemScheduler::new();
        scheduler.add_system(Box::new(Noop("b")), 20);
        scheduler.add_system(Box::new(Noop("a")), 10);
        scheduler.add_system(Box::new(Noop("c")), 10);
        assert_eq!(scheduler.execution_order(), vec!["a", "c", "b"]);

        // Moving "b" onto priority 10 places it by registration, i.e. first
        scheduler.set_system_priority("b", 10);
        assert_eq!(scheduler.execution_order(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut scheduler = SystemScheduler::new();
        assert!(scheduler.add_system(Box::new(Noop("ai")), 1));
        assert!(!scheduler.add_system(Box::new(FnSystem::new("ai", |_: &mut World, _| {})), 5));
        assert_eq!(scheduler.system_count(), 1);
        assert_eq!(scheduler.system_priority("ai"), Some(1));
    }

    #[test]
    fn test_remove_reindexes_and_retires() {
        let mut scheduler = SystemScheduler::new();
        scheduler.add_system(Box::new(Noop("a")), 1);
        scheduler.add_system(Box::new(Noop("b")), 2);
        scheduler.add_system(Box::new(Noop("c")), 3);

        assert!(scheduler.remove_system("a"));
        assert!(!scheduler.remove_system("a"));
        assert!(scheduler.pause_system("c"));
        assert_eq!(scheduler.is_system_paused("c"), Some(true));
        assert_eq!(scheduler.is_system_paused("b"), Some(false));
        assert_eq!(scheduler.take_retired().len(), 1);
        assert!(scheduler.take_retired().is_empty());
    }

    #[test]
    fn test_flags_on_unknown_system() {
        let mut scheduler = SystemScheduler::new();
        assert!(!scheduler.pause_system("ghost"));
        assert!(!scheduler.resume_system("ghost"));
        assert!(!scheduler.set_system_priority("ghost", 3));
        assert_eq!(scheduler.is_system_paused("ghost"), None);
    }

    #[test]
    fn test_pause_all_and_resume_all() {
        let mut scheduler = SystemScheduler::new();
        scheduler.add_system(Box::new(Noop("a")), 1);
        scheduler.add_system(Box::new(Noop("b")), 2);
        scheduler.pause_all_systems();
        assert_eq!(scheduler.is_system_paused("a"), Some(true));
        assert_eq!(scheduler.is_system_paused("b"), Some(true));
        scheduler.resume_all_systems();
        assert_eq!(scheduler.is_system_paused("a"), Some(false));

        scheduler.set_system_enabled("b", false);
        assert_eq!(scheduler.is_system_enabled("b"), Some(false));
    }
}
