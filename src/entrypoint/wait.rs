use crate::config::EntrypointConfig;
use crate::error::{IsRetryable, SolarError};
use crate::shutdown::requested;
use backon::{ExponentialBuilder, Retryable};
use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tracing::{debug, info};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct WaitPolicy {
    pub min_delay: Duration,
    pub max_delay: Duration,
    /// `None` waits until the port opens or the wait is cancelled.
    pub timeout: Option<Duration>,
    pub connect_timeout: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::from_config(&EntrypointConfig::default())
    }
}

impl WaitPolicy {
    pub fn from_config(cfg: &EntrypointConfig) -> Self {
        Self {
            min_delay: cfg.poll_interval(),
            max_delay: cfg.max_poll_interval(),
            timeout: cfg.wait_timeout(),
            connect_timeout: CONNECT_TIMEOUT,
        }
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .without_max_times()
            .with_jitter()
    }
}

/// Block until `host:port` accepts a TCP connection.
///
/// Returns the number of attempts it took. Fails with `WaitTimeout` once the
/// policy's deadline passes and with `WaitCancelled` as soon as `shutdown` holds `true`.
pub async fn wait_for_port(
    host: &str,
    port: u16,
    policy: &WaitPolicy,
    mut shutdown: watch::Receiver<bool>,
) -> Result<u32, SolarError> {
    let started = Instant::now();
    let counter = AtomicU32::new(0);
    let attempts = &counter;
    let connect_timeout = policy.connect_timeout;

    info!(host, port, timeout = ?policy.timeout, "waiting for database port");

    let polling = (move || async move {
        attempts.fetch_add(1, Ordering::Relaxed);
        connect_once(host, port, connect_timeout).await
    })
    .retry(policy.backoff())
    .when(|e: &SolarError| e.is_retryable())
    .notify(|err: &SolarError, dur: Duration| {
        debug!(host, port, error = %err, "database not reachable yet, retrying in {:?}", dur);
    });

    let bounded = async {
        match policy.timeout {
            Some(limit) => match tokio::time::timeout(limit, polling).await {
                Ok(result) => result,
                Err(_) => Err(SolarError::WaitTimeout {
                    host: host.to_string(),
                    port,
                    waited: started.elapsed(),
                }),
            },
            None => polling.await,
        }
    };

    tokio::select! {
        result = bounded => {
            result?;
            let attempts = counter.load(Ordering::Relaxed);
            info!(host, port, attempts, elapsed = ?started.elapsed(), "database port is open");
            Ok(attempts)
        }
        _ = requested(&mut shutdown) => Err(SolarError::WaitCancelled {
            host: host.to_string(),
            port,
        }),
    }
}

async fn connect_once(host: &str, port: u16, limit: Duration) -> Result<(), SolarError> {
    match tokio::time::timeout(limit, TcpStream::connect((host, port))).await {
        Ok(Ok(_stream)) => Ok(()),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "connect timed out").into()),
    }
}
