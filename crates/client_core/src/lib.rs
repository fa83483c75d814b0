use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use reqwest::Client;
use shared::{
    error::ServiceErrorBody,
    protocol::{FormInput, HealthResponse, PredictionResult},
};
use tokio::{
    sync::{broadcast, RwLock},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};
use url::Url;

pub mod error;
pub mod form_state;
pub mod view;

pub use error::{FailureKind, PredictionError, SubmitRejected, FAILURE_NOTICE};
pub use form_state::{FormError, FormField, FormInputExt, FormState};
pub use view::{AssessmentView, ProportionSeries, RiskLevel};

pub const DEFAULT_PREDICT_URL: &str = "http://localhost:5001/predict";
const HEALTH_PATH: &str = "/health";
const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum PredictionOutcome {
    #[default]
    NotStarted,
    Pending,
    Succeeded(PredictionResult),
    Failed(PredictionError),
}

impl PredictionOutcome {
    pub fn is_pending(&self) -> bool {
        matches!(self, PredictionOutcome::Pending)
    }

    pub fn result(&self) -> Option<&PredictionResult> {
        match self {
            PredictionOutcome::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&PredictionError> {
        match self {
            PredictionOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ControllerEvent {
    OutcomeChanged(PredictionOutcome),
    /// User-facing notice for a failed submission. Always [`FAILURE_NOTICE`].
    FailureNotice(String),
}

#[async_trait]
pub trait PredictionTransport: Send + Sync {
    async fn predict(&self, input: &FormInput) -> Result<PredictionResult, PredictionError>;
    async fn health(&self) -> Result<String, PredictionError>;
}

pub struct MissingPredictionTransport;

#[async_trait]
impl PredictionTransport for MissingPredictionTransport {
    async fn predict(&self, _input: &FormInput) -> Result<PredictionResult, PredictionError> {
        Err(PredictionError::RequestSetup(
            "prediction transport is unavailable".to_string(),
        ))
    }

    async fn health(&self) -> Result<String, PredictionError> {
        Err(PredictionError::RequestSetup(
            "prediction transport is unavailable".to_string(),
        ))
    }
}

pub struct HttpPredictionTransport {
    http: Client,
    predict_url: String,
}

impl HttpPredictionTransport {
    pub fn new(predict_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            predict_url: predict_url.into(),
        }
    }

    pub fn with_timeout(
        predict_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PredictionError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| PredictionError::RequestSetup(err.to_string()))?;
        Ok(Self {
            http,
            predict_url: predict_url.into(),
        })
    }

    fn parsed_predict_url(&self) -> Result<Url, PredictionError> {
        Url::parse(&self.predict_url).map_err(|err| {
            PredictionError::RequestSetup(format!(
                "invalid prediction endpoint '{}': {err}",
                self.predict_url
            ))
        })
    }

    pub fn health_url(&self) -> Result<Url, PredictionError> {
        let mut url = self.parsed_predict_url()?;
        url.set_path(HEALTH_PATH);
        url.set_query(None);
        Ok(url)
    }
}

#[async_trait]
impl PredictionTransport for HttpPredictionTransport {
    async fn predict(&self, input: &FormInput) -> Result<PredictionResult, PredictionError> {
        let url = self.parsed_predict_url()?;
        let res = self
            .http
            .post(url)
            .json(input)
            .send()
            .await
            .map_err(PredictionError::from_transport)?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ServiceErrorBody>(&body)
                .map(|body| body.error)
                .unwrap_or(body);
            return Err(PredictionError::Service {
                status: status.as_u16(),
                detail,
            });
        }

        let body = res
            .bytes()
            .await
            .map_err(|err| PredictionError::NoResponse(err.to_string()))?;
        serde_json::from_slice::<PredictionResult>(&body)
            .map_err(|err| PredictionError::MalformedResponse(err.to_string()))
    }

    async fn health(&self) -> Result<String, PredictionError> {
        let res = self
            .http
            .get(self.health_url()?)
            .send()
            .await
            .map_err(PredictionError::from_transport)?;

        let status = res.status();
        if !status.is_success() {
            return Err(PredictionError::Service {
                status: status.as_u16(),
                detail: res.text().await.unwrap_or_default(),
            });
        }

        let body: HealthResponse = res
            .json()
            .await
            .map_err(|err| PredictionError::MalformedResponse(err.to_string()))?;
        Ok(body.status)
    }
}

struct ControllerState {
    outcome: PredictionOutcome,
}

/// Owns the lifecycle of prediction requests: not started, pending, then
/// succeeded or failed. Concurrent submissions are not cancelled; whichever
/// settles last decides the outcome.
pub struct PredictionController {
    transport: Arc<dyn PredictionTransport>,
    inner: RwLock<ControllerState>,
    attempts: AtomicU64,
    events: broadcast::Sender<ControllerEvent>,
}

impl PredictionController {
    pub fn new(predict_url: impl Into<String>) -> Arc<Self> {
        Self::new_with_transport(Arc::new(HttpPredictionTransport::new(predict_url)))
    }

    pub fn new_with_transport(transport: Arc<dyn PredictionTransport>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            transport,
            inner: RwLock::new(ControllerState {
                outcome: PredictionOutcome::NotStarted,
            }),
            attempts: AtomicU64::new(0),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub async fn current_outcome(&self) -> PredictionOutcome {
        self.inner.read().await.outcome.clone()
    }

    pub async fn is_in_flight(&self) -> bool {
        self.inner.read().await.outcome.is_pending()
    }

    pub async fn view(&self, form: FormInput) -> AssessmentView {
        let outcome = self.current_outcome().await;
        AssessmentView::new(form, outcome.is_pending(), outcome)
    }

    /// Submits `input` and waits for the call to settle. Does not refuse
    /// while another submission is outstanding; see [`Self::try_submit`].
    ///
    /// The call runs on its own task, so dropping the returned future does
    /// not stop the outcome from settling.
    pub async fn submit(self: &Arc<Self>, input: FormInput) -> PredictionOutcome {
        let attempt = {
            let mut guard = self.inner.write().await;
            guard.outcome = PredictionOutcome::Pending;
            self.announce_pending()
        };
        self.dispatch(attempt, input).await
    }

    /// Submits only when nothing is in flight.
    pub async fn try_submit(
        self: &Arc<Self>,
        input: FormInput,
    ) -> Result<PredictionOutcome, SubmitRejected> {
        let attempt = {
            let mut guard = self.inner.write().await;
            if guard.outcome.is_pending() {
                debug!("submission refused while a prediction is pending");
                return Err(SubmitRejected::InFlight);
            }
            guard.outcome = PredictionOutcome::Pending;
            self.announce_pending()
        };
        Ok(self.dispatch(attempt, input).await)
    }

    pub async fn check_health(&self) -> Result<String, PredictionError> {
        let status = self.transport.health().await;
        match &status {
            Ok(status) => info!(status = %status, "prediction service health"),
            Err(err) => warn!("prediction service health check failed: {err}"),
        }
        status
    }

    fn announce_pending(&self) -> u64 {
        let _ = self
            .events
            .send(ControllerEvent::OutcomeChanged(PredictionOutcome::Pending));
        self.attempts.fetch_add(1, Ordering::Relaxed) + 1
    }

    async fn dispatch(self: &Arc<Self>, attempt: u64, input: FormInput) -> PredictionOutcome {
        let controller = Arc::clone(self);
        let task: JoinHandle<PredictionOutcome> =
            tokio::spawn(async move { controller.settle(attempt, input).await });
        match task.await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(attempt, "prediction task ended without settling: {err}");
                let outcome = PredictionOutcome::Failed(PredictionError::NoResponse(format!(
                    "prediction task ended without settling: {err}"
                )));
                self.commit(outcome.clone()).await;
                outcome
            }
        }
    }

    async fn settle(&self, attempt: u64, input: FormInput) -> PredictionOutcome {
        if !input.age.value().is_finite() || !input.days_hospitalized.value().is_finite() {
            warn!(
                attempt,
                age = %input.age,
                days_hospitalized = %input.days_hospitalized,
                "submitting non-numeric field; the service receives null"
            );
        }
        info!(
            attempt,
            gender = %input.gender,
            blood_type = %input.blood_type,
            medical_condition = %input.medical_condition,
            "requesting prediction"
        );

        let outcome = match self.transport.predict(&input).await {
            Ok(result) => {
                if !(0.0..=1.0).contains(&result.probability) {
                    warn!(
                        attempt,
                        probability = result.probability,
                        "prediction probability outside [0, 1]; passing through"
                    );
                }
                info!(
                    attempt,
                    readmission_prediction = result.readmission_prediction,
                    probability = result.probability,
                    "prediction settled"
                );
                PredictionOutcome::Succeeded(result)
            }
            Err(err) => {
                error!(attempt, kind = ?err.kind(), "failed to get prediction: {err}");
                PredictionOutcome::Failed(err)
            }
        };

        self.commit(outcome.clone()).await;
        outcome
    }

    /// Stores a settled outcome. Events go out under the write guard so
    /// subscribers see them in the same order as the state writes.
    async fn commit(&self, outcome: PredictionOutcome) {
        let mut guard = self.inner.write().await;
        let failed = outcome.failure().is_some();
        guard.outcome = outcome.clone();
        let _ = self.events.send(ControllerEvent::OutcomeChanged(outcome));
        if failed {
            let _ = self
                .events
                .send(ControllerEvent::FailureNotice(FAILURE_NOTICE.to_string()));
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
