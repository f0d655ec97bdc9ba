use std::{
    path::Path,
    sync::{Mutex, MutexGuard, OnceLock},
};

use utils_core::assets::ASSET_DIR_ENV;

use crate::deployment::ARBITER_API_KEY_ENV;

const DATABASE_URL_ENV: &str = "DATABASE_URL";

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

/// Points the asset dir and database URL at a scratch location and clears any
/// preset arbiter key, restoring the previous values on drop. Holders are
/// serialized process-wide.
pub struct TestEnvGuard {
    _lock: MutexGuard<'static, ()>,
    saved: Vec<(&'static str, Option<String>)>,
}

impl TestEnvGuard {
    pub fn new(temp_root: &Path, db_url: String) -> Self {
        let lock = env_lock().lock().unwrap_or_else(|err| err.into_inner());
        let overrides = [
            (ASSET_DIR_ENV, Some(temp_root.to_string_lossy().into_owned())),
            (DATABASE_URL_ENV, Some(db_url)),
            (ARBITER_API_KEY_ENV, None),
        ];
        let saved = overrides
            .iter()
            .map(|(name, _)| (*name, std::env::var(name).ok()))
            .collect();

        for (name, value) in overrides {
            // SAFETY: every env mutation in tests goes through env_lock.
            unsafe {
                match value {
                    Some(value) => std::env::set_var(name, value),
                    None => std::env::remove_var(name),
                }
            }
        }

        Self { _lock: lock, saved }
    }
}

impl Drop for TestEnvGuard {
    fn drop(&mut self) {
        for (name, previous) in self.saved.drain(..) {
            // SAFETY: still holding env_lock.
            unsafe {
                match previous {
                    Some(value) => std::env::set_var(name, value),
                    None => std::env::remove_var(name),
                }
            }
        }
    }
}
