//! A `Mutex` + `Condvar` event primitive: the same "wait blocks until
//! set" contract as a level-triggered event, with no busy-wait jitter.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

pub struct Event {
    flag: Mutex<bool>,
    cv: Condvar,
}

impl Event {
    #[must_use]
    pub fn new() -> Self {
        Event {
            flag: Mutex::new(false),
            cv: Condvar::new(),
        }
    }

    pub fn set(&self) {
        let mut flag = self.flag.lock().unwrap();
        *flag = true;
        self.cv.notify_all();
    }

    pub fn clear(&self) {
        *self.flag.lock().unwrap() = false;
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        *self.flag.lock().unwrap()
    }

    /// Block until `set` is called. If already set, returns immediately.
    pub fn wait(&self) {
        let mut flag = self.flag.lock().unwrap();
        while !*flag {
            flag = self.cv.wait(flag).unwrap();
        }
    }

    /// Block until `set` or `timeout` elapses, returning whether the event
    /// was observed set.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let flag = self.flag.lock().unwrap();
        if *flag {
            return true;
        }
        let (guard, result) = self.cv.wait_timeout(flag, timeout).unwrap();
        !result.timed_out() || *guard
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}
