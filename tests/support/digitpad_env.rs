use std::{
    path::PathBuf,
    sync::{Mutex, OnceLock},
};

use digitpad::app_dirs::CONFIG_HOME_ENV;
use digitpad::config::{BACKEND_ENV, MODEL_PATH_ENV};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Serializes tests that touch process environment and restores it on drop.
pub struct DigitpadEnvGuard {
    previous: Vec<(&'static str, Option<String>)>,
    _lock: std::sync::MutexGuard<'static, ()>,
}

impl DigitpadEnvGuard {
    pub fn set_config_home(path: PathBuf) -> Self {
        let lock = ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|err| err.into_inner());
        let mut guard = Self {
            previous: Vec::new(),
            _lock: lock,
        };
        guard.set(CONFIG_HOME_ENV, Some(path.to_string_lossy().into_owned()));
        guard.set(MODEL_PATH_ENV, None);
        guard.set(BACKEND_ENV, None);
        guard
    }

    pub fn set_var(&mut self, key: &'static str, value: &str) {
        self.set(key, Some(value.to_string()));
    }

    fn set(&mut self, key: &'static str, value: Option<String>) {
        self.previous.push((key, std::env::var(key).ok()));
        apply(key, value);
    }
}

fn apply(key: &str, value: Option<String>) {
    // SAFETY: tests run under a global lock to prevent concurrent env mutations.
    unsafe {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
}

impl Drop for DigitpadEnvGuard {
    fn drop(&mut self) {
        while let Some((key, value)) = self.previous.pop() {
            apply(key, value);
        }
    }
}
