use reqwest::Client;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::trace;

/// User agent sent with every registry and CDN request
pub const USER_AGENT: &str = concat!("mrupdate/", env!("CARGO_PKG_VERSION"));

/// Networking errors for HTTP client construction and bounded task execution
#[derive(Debug, Error)]
pub enum NetworkingError {
    #[error("HTTP client construction failed: {source}")]
    ClientBuildFailed {
        #[from]
        source: reqwest::Error,
    },

    #[error("Invalid job count: {count} (must be > 0)")]
    InvalidJobCount { count: usize },
}

/// HTTP and concurrency settings for one run
#[derive(Debug, Clone)]
pub struct NetworkingConfig {
    /// Maximum number of registry lookups in flight at once
    pub max_jobs: usize,
    /// Whole-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for NetworkingConfig {
    fn default() -> Self {
        Self {
            max_jobs: 1,
            timeout: None,
        }
    }
}

impl NetworkingConfig {
    /// Build from the CLI's seconds value, where 0 disables the timeout
    pub fn from_settings(max_jobs: usize, timeout_seconds: u64) -> Self {
        Self {
            max_jobs,
            timeout: (timeout_seconds > 0).then(|| Duration::from_secs(timeout_seconds)),
        }
    }
}

/// Shared HTTP client plus the semaphore that bounds lookup parallelism
pub struct NetworkingManager {
    client: Client,
    config: NetworkingConfig,
    semaphore: Arc<Semaphore>,
}

impl NetworkingManager {
    pub fn new(config: NetworkingConfig) -> Result<Self, NetworkingError> {
        trace!("Initializing networking manager");

        if config.max_jobs == 0 {
            return Err(NetworkingError::InvalidJobCount {
                count: config.max_jobs,
            });
        }

        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let semaphore = Arc::new(Semaphore::new(config.max_jobs));

        trace!(
            jobs = config.max_jobs,
            timeout = ?config.timeout,
            "Networking manager initialized"
        );

        Ok(Self {
            client,
            config,
            semaphore,
        })
    }

    /// Number of concurrent lookups allowed
    pub fn jobs(&self) -> usize {
        self.config.max_jobs
    }

    /// Get HTTP client for manual requests
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Spawn a task that only starts its work once a permit is free.
    ///
    /// Tasks are started eagerly but at most `max_jobs` of them run their
    /// body at the same time. Awaiting the handles in submission order gives
    /// results in submission order.
    pub fn spawn_bounded<F, T>(&self, task: F) -> JoinHandle<Option<T>>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let semaphore = self.semaphore.clone();

        tokio::spawn(async move {
            // A closed semaphore means the manager is gone; drop the work
            let _permit = semaphore.acquire_owned().await.ok()?;

            trace!("Bounded task acquired permit");

            Some(task.await)
        })
    }
}

#[cfg(test)]
mod tests {
    include!("mod.test.rs");
}
