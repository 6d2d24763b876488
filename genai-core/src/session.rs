//! Lazily-built, shared HTTP client.

use crate::error::{LlmError, Result};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Owns at most one pooled `reqwest::Client`.
///
/// `acquire` builds it on first use and hands out cheap clones afterwards.
/// `release` drops the cached client; the next `acquire` builds a fresh one.
/// Requests already holding a clone are unaffected by `release`.
#[derive(Debug)]
pub struct SessionHolder {
    timeout: Duration,
    client: Mutex<Option<reqwest::Client>>,
    created: AtomicU64,
}

impl SessionHolder {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            client: Mutex::new(None),
            created: AtomicU64::new(0),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn acquire(&self) -> Result<reqwest::Client> {
        let mut guard = self.lock();
        if let Some(client) = guard.as_ref() {
            return Ok(client.clone());
        }

        if self.timeout.is_zero() {
            return Err(LlmError::InvalidConfig(
                "request timeout must be > 0".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| LlmError::InvalidConfig(format!("http client build failed: {e}")))?;

        let n = self.created.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(
            timeout_secs = self.timeout.as_secs_f64(),
            sessions_created = n,
            "http session created"
        );
        *guard = Some(client.clone());
        Ok(client)
    }

    pub fn release(&self) {
        if self.lock().take().is_some() {
            tracing::debug!("http session released");
        }
    }

    pub fn is_active(&self) -> bool {
        self.lock().is_some()
    }

    pub fn sessions_created(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<reqwest::Client>> {
        // The guarded value is a plain Option; a poisoned lock holds no torn state.
        self.client.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_builds_once_and_reuses() {
        let holder = SessionHolder::new(Duration::from_secs(15));
        assert!(!holder.is_active());
        holder.acquire().expect("first acquire");
        holder.acquire().expect("second acquire");
        assert!(holder.is_active());
        assert_eq!(holder.sessions_created(), 1);
    }

    #[test]
    fn release_is_idempotent_and_acquire_recreates() {
        let holder = SessionHolder::new(Duration::from_secs(15));
        holder.release();
        holder.acquire().expect("acquire");
        holder.release();
        holder.release();
        assert!(!holder.is_active());
        holder.acquire().expect("acquire after release");
        assert_eq!(holder.sessions_created(), 2);
    }

    #[test]
    fn zero_timeout_is_a_configuration_error() {
        let holder = SessionHolder::new(Duration::ZERO);
        let err = holder.acquire().expect_err("zero timeout rejected");
        assert!(err.is_configuration());
        assert!(!holder.is_active());
        assert_eq!(holder.sessions_created(), 0);
    }
}
