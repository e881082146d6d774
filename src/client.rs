use serde_json::Value;
use std::future::Future;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::TryOnConfig;
use crate::error::{Result, TryOnError};
use crate::extract::extract_image_url;
use crate::prompt::synthesize;
use crate::provider::{DirectProvider, ProviderAdapter, QueueProvider, Submission};
use crate::transport::{HttpTransport, Transport};
use crate::types::{
    GenerationRequest, GenerationResponse, GenerationResult, JobHandle, JobStatus, Provider,
};

/// How often the cancellation flag is checked while waiting between polls.
pub const CANCEL_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// Suspends the poll loop between status checks.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// [`Sleeper`] backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Runs try-on generations end to end.
///
/// Validates the request, builds the provider payload (synthesizing a
/// prompt for prompt-driven providers), submits it, and for queued jobs
/// polls until a terminal status or the attempt ceiling. The caller only
/// sees a [`GenerationResult`] tagged with the provider that produced it.
///
/// Each call to [`TryOnClient::execute`] owns its own job; concurrent calls
/// share nothing mutable.
///
/// # Example
/// ```no_run
/// use tryon_rs::{GenerationRequest, ImageSource, Provider, TryOnClient, TryOnConfig};
///
/// # async fn example() -> tryon_rs::Result<()> {
/// let client = TryOnClient::new(TryOnConfig::from_env());
/// let request = GenerationRequest::new(
///     ImageSource::url("https://example.com/me.jpg"),
///     ImageSource::url("https://example.com/shirt.jpg"),
/// )
/// .provider(Provider::Queue);
/// let result = client.execute(&request).await?;
/// println!("{}", result.image_url);
/// # Ok(())
/// # }
/// ```
pub struct TryOnClient<T = HttpTransport, S = TokioSleeper> {
    config: TryOnConfig,
    transport: T,
    sleeper: S,
    direct: DirectProvider,
    queue: QueueProvider,
    cancellation: Option<Arc<AtomicBool>>,
}

impl<T, S> std::fmt::Debug for TryOnClient<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TryOnClient")
            .field("config", &self.config)
            .field("has_cancellation", &self.cancellation.is_some())
            .finish()
    }
}

impl TryOnClient {
    /// Create a client that talks HTTP via `reqwest` and sleeps on the tokio timer.
    pub fn new(config: TryOnConfig) -> Self {
        Self {
            transport: HttpTransport::new(config.request_timeout),
            sleeper: TokioSleeper,
            direct: DirectProvider::new(config.direct_endpoint.clone()),
            queue: QueueProvider::new(config.queue_endpoint.clone()),
            cancellation: None,
            config,
        }
    }
}

impl<T: Transport, S: Sleeper> TryOnClient<T, S> {
    /// Swap the HTTP transport.
    pub fn with_transport<U: Transport>(self, transport: U) -> TryOnClient<U, S> {
        TryOnClient {
            config: self.config,
            transport,
            sleeper: self.sleeper,
            direct: self.direct,
            queue: self.queue,
            cancellation: self.cancellation,
        }
    }

    /// Swap the sleeper used between status checks.
    pub fn with_sleeper<Z: Sleeper>(self, sleeper: Z) -> TryOnClient<T, Z> {
        TryOnClient {
            config: self.config,
            transport: self.transport,
            sleeper,
            direct: self.direct,
            queue: self.queue,
            cancellation: self.cancellation,
        }
    }

    /// Stop submitting and polling once `flag` is set.
    ///
    /// The flag is also watched during the wait between status checks, so a
    /// cancelled job returns within [`CANCEL_CHECK_INTERVAL`] instead of a full
    /// poll interval. The remote job is not cancelled, only abandoned locally.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancellation = Some(flag);
        self
    }

    /// Returns the configuration this client was built with.
    pub fn config(&self) -> &TryOnConfig {
        &self.config
    }

    /// Returns the transport, e.g. to inspect a test double.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Resolves once the cancellation flag is set; never, if there is none.
    async fn cancelled(&self) {
        match self.cancellation {
            Some(ref cancel) => {
                while !cancel.load(Ordering::Relaxed) {
                    tokio::time::sleep(CANCEL_CHECK_INTERVAL).await;
                }
            }
            None => std::future::pending::<()>().await,
        }
    }

    fn check_cancelled(&self) -> Result<()> {
        if let Some(ref cancel) = self.cancellation {
            if cancel.load(Ordering::Relaxed) {
                return Err(TryOnError::Cancelled);
            }
        }
        Ok(())
    }

    /// Run one generation to completion.
    pub async fn execute(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        match request.provider {
            Provider::Direct => self.run(&self.direct, request).await,
            Provider::Queue => self.run(&self.queue, request).await,
        }
    }

    /// Run one generation and shape the outcome as the UI-facing reply.
    pub async fn generate(&self, request: &GenerationRequest) -> GenerationResponse {
        let result = self.execute(request).await;
        if let Err(ref e) = result {
            warn!(provider = %request.provider, kind = ?e.kind(), error = %e, "try-on generation failed");
        }
        GenerationResponse::from_result(request.provider, &result)
    }

    async fn run<A: ProviderAdapter>(
        &self,
        adapter: &A,
        request: &GenerationRequest,
    ) -> Result<GenerationResult> {
        let provider = adapter.provider();
        let api_key = self.config.require_api_key()?;
        if self.config.max_poll_attempts == 0 {
            return Err(TryOnError::Validation(
                "max_poll_attempts must be at least 1".into(),
            ));
        }
        let prompt = adapter.needs_prompt().then(|| {
            synthesize(
                request.gender,
                request.garment_category,
                request.fit_preference,
            )
        });
        let payload = adapter.build_payload(request, prompt.as_ref())?;
        self.check_cancelled()?;

        info!(provider = %provider, "submitting try-on request");
        let response = match adapter.submit(&self.transport, api_key, &payload).await? {
            Submission::Completed(response) => response,
            Submission::Queued(handle) => {
                info!(provider = %provider, request_id = %handle.request_id, "job queued");
                self.await_job(adapter, api_key, &handle).await?
            }
        };

        let image_url = extract_image_url(&response, provider)?;
        info!(provider = %provider, "try-on image ready");
        Ok(GenerationResult {
            image_url,
            provider_used: provider,
        })
    }

    /// Poll a queued job until it completes, fails, or runs out of attempts,
    /// then fetch its result.
    async fn await_job<A: ProviderAdapter>(
        &self,
        adapter: &A,
        api_key: &str,
        handle: &JobHandle,
    ) -> Result<Value> {
        let max_attempts = self.config.max_poll_attempts;
        let mut started = false;

        for attempt in 1..=max_attempts {
            self.check_cancelled()?;
            let status = adapter.poll_status(&self.transport, api_key, handle).await?;

            let status = match status {
                JobStatus::InQueue if started => {
                    warn!(request_id = %handle.request_id, attempt, "status went back to IN_QUEUE; treating as IN_PROGRESS");
                    JobStatus::InProgress
                }
                JobStatus::InProgress => {
                    started = true;
                    JobStatus::InProgress
                }
                other => other,
            };
            debug!(request_id = %handle.request_id, attempt, status = ?status, "polled job status");

            match status {
                JobStatus::Completed => {
                    return adapter.fetch_result(&self.transport, api_key, handle).await;
                }
                JobStatus::Failed { logs } => {
                    return Err(TryOnError::ProviderFailure {
                        message: format!("job {} failed", handle.request_id),
                        logs,
                    });
                }
                JobStatus::Unknown(raw) => {
                    debug!(request_id = %handle.request_id, status = %raw, "unrecognized status; still pending");
                }
                JobStatus::InQueue | JobStatus::InProgress => {}
            }

            if attempt < max_attempts {
                tokio::select! {
                    _ = self.sleeper.sleep(self.config.poll_interval) => {}
                    _ = self.cancelled() => {}
                }
            }
        }

        warn!(request_id = %handle.request_id, attempts = max_attempts, "job abandoned after attempt ceiling");
        Err(TryOnError::Timeout {
            attempts: max_attempts,
        })
    }
}
