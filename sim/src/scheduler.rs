//! One-shot deferred actions keyed on simulation time.
//!
//! The match registers `(deadline, action)` pairs and drains whatever has come
//! due once per frame. Cancelling removes an action before it fires.

pub type TimerId = u64;

#[derive(Debug, Clone)]
struct Timer<T> {
    id: TimerId,
    deadline: f64,
    action: T,
}

#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    timers: Vec<Timer<T>>,
    next_id: TimerId,
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            timers: Vec::new(),
            next_id: 1,
        }
    }

    /// Fire `action` once simulation time reaches `deadline` (seconds).
    pub fn schedule(&mut self, deadline: f64, action: T) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            deadline,
            action,
        });
        id
    }

    /// Remove a pending action. Returns it if it had not fired yet.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let idx = self.timers.iter().position(|t| t.id == id)?;
        Some(self.timers.remove(idx).action)
    }

    /// Drop every pending action matching `pred`.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&T) -> bool) {
        self.timers.retain(|t| !pred(&t.action));
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.iter().any(|t| t.id == id)
    }

    pub fn any(&self, mut pred: impl FnMut(&T) -> bool) -> bool {
        self.timers.iter().any(|t| pred(&t.action))
    }

    /// Remove and return every action due at `now`, earliest first. Actions
    /// sharing a deadline come out in the order they were scheduled.
    pub fn drain_due(&mut self, now: f64) -> Vec<T> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.timers.len() {
            if self.timers[i].deadline <= now {
                due.push(self.timers.swap_remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by(|a, b| a.deadline.total_cmp(&b.deadline).then(a.id.cmp(&b.id)));
        due.into_iter().map(|t| t.action).collect()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
