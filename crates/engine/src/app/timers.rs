use std::time::Duration;

const MIN_REPEAT_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct TimerEntry<A> {
    handle: TimerHandle,
    due: Duration,
    interval: Option<Duration>,
    action: A,
}

/// One-shot and repeating deferred actions keyed by handle.
///
/// The queue owns its own clock. `advance` moves the clock forward and
/// `pop_due` hands out expired actions one at a time, earliest first, so a
/// handler may cancel timers that expired in the same advance before they
/// are popped.
#[derive(Debug)]
pub struct TimerQueue<A> {
    now: Duration,
    next_handle: u64,
    entries: Vec<TimerEntry<A>>,
}

impl<A> Default for TimerQueue<A> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_handle: 0,
            entries: Vec::new(),
        }
    }
}

impl<A: Clone> TimerQueue<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule_once(&mut self, delay: Duration, action: A) -> TimerHandle {
        self.insert(delay, None, action)
    }

    pub fn schedule_repeating(&mut self, interval: Duration, action: A) -> TimerHandle {
        let interval = interval.max(MIN_REPEAT_INTERVAL);
        self.insert(interval, Some(interval), action)
    }

    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.handle != handle);
        self.entries.len() != before
    }

    pub fn is_active(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|entry| entry.handle == handle)
    }

    pub fn active_count(&self) -> usize {
        self.entries.len()
    }

    pub fn repeating_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.interval.is_some())
            .count()
    }

    pub fn pending_actions(&self) -> impl Iterator<Item = &A> {
        self.entries.iter().map(|entry| &entry.action)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }

    pub fn pop_due(&mut self) -> Option<(TimerHandle, A)> {
        let index = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.due <= self.now)
            .min_by_key(|(_, entry)| (entry.due, entry.handle))
            .map(|(index, _)| index)?;

        match self.entries[index].interval {
            Some(interval) => {
                let entry = &mut self.entries[index];
                entry.due = entry.due.saturating_add(interval);
                Some((entry.handle, entry.action.clone()))
            }
            None => {
                let entry = self.entries.swap_remove(index);
                Some((entry.handle, entry.action))
            }
        }
    }

    fn insert(&mut self, delay: Duration, interval: Option<Duration>, action: A) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle = self.next_handle.saturating_add(1);
        self.entries.push(TimerEntry {
            handle,
            due: self.now.saturating_add(delay),
            interval,
            action,
        });
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain<A: Clone>(queue: &mut TimerQueue<A>) -> Vec<A> {
        let mut fired = Vec::new();
        while let Some((_, action)) = queue.pop_due() {
            fired.push(action);
        }
        fired
    }

    #[test]
    fn one_shot_fires_once_at_its_deadline() {
        let mut queue = TimerQueue::new();
        queue.schedule_once(Duration::from_millis(100), "hop");

        queue.advance(Duration::from_millis(99));
        assert!(drain(&mut queue).is_empty());

        queue.advance(Duration::from_millis(1));
        assert_eq!(drain(&mut queue), vec!["hop"]);

        queue.advance(Duration::from_millis(500));
        assert!(drain(&mut queue).is_empty());
        assert_eq!(queue.active_count(), 0);
    }

    #[test]
    fn repeating_timer_fires_every_interval_until_cancelled() {
        let mut queue = TimerQueue::new();
        let handle = queue.schedule_repeating(Duration::from_millis(100), 'f');

        queue.advance(Duration::from_millis(350));
        assert_eq!(drain(&mut queue), vec!['f', 'f', 'f']);
        assert!(queue.is_active(handle));

        assert!(queue.cancel(handle));
        assert!(!queue.cancel(handle));
        queue.advance(Duration::from_millis(1000));
        assert!(drain(&mut queue).is_empty());
        assert_eq!(queue.repeating_count(), 0);
    }

    #[test]
    fn due_timers_pop_in_deadline_then_schedule_order() {
        let mut queue = TimerQueue::new();
        queue.schedule_once(Duration::from_millis(300), 3);
        queue.schedule_once(Duration::from_millis(100), 1);
        queue.schedule_once(Duration::from_millis(300), 4);
        queue.schedule_once(Duration::from_millis(200), 2);

        queue.advance(Duration::from_secs(1));
        assert_eq!(drain(&mut queue), vec![1, 2, 3, 4]);
    }

    #[test]
    fn cancelling_between_pops_suppresses_an_already_expired_timer() {
        let mut queue = TimerQueue::new();
        queue.schedule_once(Duration::from_millis(100), "complete");
        let later = queue.schedule_once(Duration::from_millis(100), "stale");

        queue.advance(Duration::from_millis(100));
        let (_, first) = queue.pop_due().expect("first due");
        assert_eq!(first, "complete");
        assert!(queue.cancel(later));
        assert!(queue.pop_due().is_none());
    }

    #[test]
    fn delays_are_measured_from_the_current_clock() {
        let mut queue = TimerQueue::new();
        queue.advance(Duration::from_millis(500));
        queue.schedule_once(Duration::from_millis(100), ());
        queue.advance(Duration::from_millis(99));
        assert!(queue.pop_due().is_none());
        queue.advance(Duration::from_millis(1));
        assert!(queue.pop_due().is_some());
    }

    #[test]
    fn zero_interval_repeat_is_clamped_and_terminates() {
        let mut queue = TimerQueue::new();
        queue.schedule_repeating(Duration::ZERO, ());
        queue.advance(Duration::from_millis(3));
        assert_eq!(drain(&mut queue).len(), 3);
    }

    #[test]
    fn handles_are_never_reused() {
        let mut queue = TimerQueue::new();
        let first = queue.schedule_once(Duration::ZERO, ());
        queue.clear();
        let second = queue.schedule_once(Duration::ZERO, ());
        assert_ne!(first, second);
    }
}
