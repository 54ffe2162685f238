//! Crate-level test suite
//!
//! - `fixtures`: key material and env file builders shared by tests
//! - `integration`: loading env files end to end, through to typed
//!   configuration, key material and list statements

pub mod fixtures;
pub mod integration;

/// Serializes tests that read or write process environment variables
pub mod env_guard {
    use std::sync::{Mutex, MutexGuard};

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    pub fn lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }
}
