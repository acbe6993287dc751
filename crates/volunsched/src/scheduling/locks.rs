use std::collections::HashSet;
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use super::domain::{ShiftId, VolunteerId};

/// Keys a validate-and-persist must hold exclusively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockKey {
    Volunteer(VolunteerId),
    Shift(ShiftId),
}

/// Registry of held scheduling keys with a bounded wait on acquisition.
///
/// A scope claims all of its keys in one critical section, so two scopes can never
/// hold one key each while waiting on the other's.
#[derive(Debug)]
pub struct ScheduleLocks {
    held: Mutex<HashSet<LockKey>>,
    released: Condvar,
    timeout: Duration,
}

impl ScheduleLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            held: Mutex::new(HashSet::new()),
            released: Condvar::new(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Claim the volunteer and shift keys together.
    pub fn acquire(
        &self,
        volunteer: VolunteerId,
        shift: ShiftId,
    ) -> Result<LockScope<'_>, LockTimeout> {
        self.acquire_keys(vec![LockKey::Volunteer(volunteer), LockKey::Shift(shift)])
    }

    pub fn acquire_keys(&self, keys: Vec<LockKey>) -> Result<LockScope<'_>, LockTimeout> {
        let deadline = Instant::now() + self.timeout;
        // The set only ever holds whole scopes, so a poisoned guard is still consistent.
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);

        while keys.iter().any(|key| held.contains(key)) {
            let now = Instant::now();
            if now >= deadline {
                return Err(LockTimeout {
                    waited: self.timeout,
                });
            }
            let (guard, _) = self
                .released
                .wait_timeout(held, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            held = guard;
        }

        held.extend(keys.iter().copied());
        Ok(LockScope { locks: self, keys })
    }

    fn release(&self, keys: &[LockKey]) {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        for key in keys {
            held.remove(key);
        }
        drop(held);
        self.released.notify_all();
    }
}

/// Held keys; released on drop.
#[derive(Debug)]
pub struct LockScope<'a> {
    locks: &'a ScheduleLocks,
    keys: Vec<LockKey>,
}

impl LockScope<'_> {
    pub fn keys(&self) -> &[LockKey] {
        &self.keys
    }
}

impl Drop for LockScope<'_> {
    fn drop(&mut self) {
        self.locks.release(&self.keys);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("could not serialize schedule change within {waited:?}")]
pub struct LockTimeout {
    pub waited: Duration,
}
