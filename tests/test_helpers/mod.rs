//! Scoped environment overrides for integration tests.

use std::env;
use std::ffi::{OsStr, OsString};
use std::sync::{Mutex, MutexGuard, PoisonError};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Applies environment overrides until dropped, then restores the
/// previous values. Holding a guard serializes environment access.
pub struct ScopedEnv {
    previous: Vec<(OsString, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl ScopedEnv {
    /// Sets each variable to `Some(value)` or removes it for `None`.
    pub fn apply<K, V>(overrides: &[(K, Option<V>)]) -> Self
    where
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        let lock = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = overrides
            .iter()
            .map(|(key, value)| {
                let name = key.as_ref().to_os_string();
                let before = env::var_os(&name);
                write_var(&name, value.as_ref().map(|set| set.as_ref().to_os_string()));
                (name, before)
            })
            .collect();
        Self {
            previous,
            _lock: lock,
        }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (key, value) in self.previous.drain(..).rev() {
            write_var(&key, value);
        }
    }
}

fn write_var(key: &OsStr, value: Option<OsString>) {
    // SAFETY: every mutation happens while `ENV_LOCK` is held.
    unsafe {
        match value {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }
}
