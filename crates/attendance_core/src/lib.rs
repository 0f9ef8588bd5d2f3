use std::sync::Arc;

use async_trait::async_trait;
use shared::{
    domain::{Identity, Session},
    protocol::{BackendAction, CheckinRequest, CheckoutRequest, WriteRequest},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

pub mod catalog;
pub mod error;
pub mod evidence;
pub mod forms;
pub mod presentation;
pub mod store;
pub mod transport;

pub use error::{ClientError, ClientResult, FormField, SessionAction};
pub use evidence::Attachment;
pub use forms::{CheckinForm, CheckoutForm};
pub use presentation::HomeView;
pub use store::SessionStore;
pub use transport::{AttendanceBackend, HttpBackend};

#[derive(Debug, Clone)]
pub enum ClientEvent {
    SessionChanged(Option<Session>),
    RoutesLoaded(Vec<String>),
    /// A write was delivered; the session it produced arrives via `SessionChanged`.
    Submitted(BackendAction),
    /// Reconciliation failed and the open/closed status is unknown.
    SyncDegraded(String),
    Failed(ClientError),
}

/// The two user intents plus the reads a front end needs to draw itself.
#[async_trait]
pub trait AttendanceHandle: Send + Sync {
    async fn refresh(&self) -> ClientResult<HomeView>;
    async fn load_routes(&self) -> ClientResult<Vec<String>>;
    async fn open_session(&self, form: CheckinForm) -> ClientResult<Option<Session>>;
    async fn close_session(&self, form: CheckoutForm) -> ClientResult<Option<Session>>;
    async fn view(&self) -> HomeView;
    fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent>;
}

#[derive(Debug, Default)]
struct ControllerState {
    store: SessionStore,
    routes: Vec<String>,
    degraded: Option<String>,
}

/// Session lifecycle controller for one salesperson.
///
/// Writes are fire-and-forget: after every delivered write the controller
/// re-reads the backend's current check-in and that answer, never the
/// submitted payload, becomes the local state.
pub struct AttendanceClient {
    identity: Identity,
    backend: Arc<dyn AttendanceBackend>,
    inner: Mutex<ControllerState>,
    events: broadcast::Sender<ClientEvent>,
}

impl AttendanceClient {
    pub fn new(identity: Identity, backend: Arc<dyn AttendanceBackend>) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            identity,
            backend,
            inner: Mutex::new(ControllerState::default()),
            events,
        })
    }

    pub fn with_http_backend(identity: Identity, endpoint: impl Into<String>) -> Arc<Self> {
        Self::new(identity, Arc::new(HttpBackend::new(endpoint)))
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub async fn store_snapshot(&self) -> SessionStore {
        self.inner.lock().await.store.clone()
    }

    pub async fn routes(&self) -> Vec<String> {
        self.inner.lock().await.routes.clone()
    }

    pub async fn degraded_reason(&self) -> Option<String> {
        self.inner.lock().await.degraded.clone()
    }

    /// Replaces the held session with the backend's current answer. On failure
    /// the held session is dropped rather than left stale.
    pub async fn reconcile(&self) -> ClientResult<Option<Session>> {
        let outcome = match self.backend.fetch_current_checkin(&self.identity).await {
            Ok(response) => response.into_current().map_err(|err| err.to_string()),
            Err(err) => Err(error::describe(&err)),
        };

        match outcome {
            Ok(current) => {
                {
                    let mut guard = self.inner.lock().await;
                    guard.store.set_current(current.clone());
                    guard.degraded = None;
                }
                info!(
                    salesperson = %self.identity.display_name(),
                    open = current.is_some(),
                    "reconciled current check-in"
                );
                let _ = self.events.send(ClientEvent::SessionChanged(current.clone()));
                Ok(current)
            }
            Err(reason) => {
                {
                    let mut guard = self.inner.lock().await;
                    guard.store.set_current(None);
                    guard.degraded = Some(reason.clone());
                }
                warn!(
                    salesperson = %self.identity.display_name(),
                    "reconcile failed, cleared local session: {reason}"
                );
                let err = ClientError::SyncFailed(reason.clone());
                let _ = self.events.send(ClientEvent::SessionChanged(None));
                let _ = self.events.send(ClientEvent::SyncDegraded(reason));
                let _ = self.events.send(ClientEvent::Failed(err.clone()));
                Err(err)
            }
        }
    }

    pub async fn submit_open(&self, payload: CheckinRequest) -> ClientResult<Option<Session>> {
        self.submit(WriteRequest::Checkin(payload)).await?;
        self.reconcile().await
    }

    pub async fn submit_close(&self, payload: CheckoutRequest) -> ClientResult<Option<Session>> {
        self.submit(WriteRequest::Checkout(payload)).await?;
        self.reconcile().await
    }

    /// A failed write leaves local state untouched and skips reconciliation.
    async fn submit(&self, request: WriteRequest) -> ClientResult<()> {
        let action = request.action();
        if let Err(err) = self.backend.post_write(&request).await {
            let reason = error::describe(&err);
            warn!(salesperson = %self.identity.display_name(), %action, "submission failed: {reason}");
            let err = ClientError::SubmissionFailed(reason);
            let _ = self.events.send(ClientEvent::Failed(err.clone()));
            return Err(err);
        }
        info!(salesperson = %self.identity.display_name(), %action, "submission delivered");
        let _ = self.events.send(ClientEvent::Submitted(action));
        Ok(())
    }

    fn report(&self, err: &ClientError) {
        let _ = self.events.send(ClientEvent::Failed(err.clone()));
    }
}

#[async_trait]
impl AttendanceHandle for Arc<AttendanceClient> {
    /// Startup order: routes first, then the current check-in. A missing
    /// catalog does not stop the status read.
    async fn refresh(&self) -> ClientResult<HomeView> {
        let _ = self.load_routes().await;
        self.reconcile().await?;
        Ok(self.view().await)
    }

    async fn load_routes(&self) -> ClientResult<Vec<String>> {
        let result = catalog::load_routes(self.backend.as_ref(), &self.identity).await;
        let routes = result.as_ref().cloned().unwrap_or_default();
        {
            let mut guard = self.inner.lock().await;
            guard.routes = routes.clone();
        }
        let _ = self.events.send(ClientEvent::RoutesLoaded(routes));
        if let Err(err) = &result {
            self.report(err);
        }
        result
    }

    async fn open_session(&self, form: CheckinForm) -> ClientResult<Option<Session>> {
        // An unconfirmed backend state must not be taken as "nothing open".
        if self.degraded_reason().await.is_some() {
            let err = ClientError::NotPermitted(SessionAction::Open);
            self.report(&err);
            return Err(err);
        }
        let store = self.store_snapshot().await;
        let payload = match forms::build_checkin(&self.identity, &store, &form).await {
            Ok(payload) => payload,
            Err(err) => {
                self.report(&err);
                return Err(err);
            }
        };
        self.submit_open(payload).await
    }

    async fn close_session(&self, form: CheckoutForm) -> ClientResult<Option<Session>> {
        let store = self.store_snapshot().await;
        let payload = match forms::build_checkout(&self.identity, &store, &form).await {
            Ok(payload) => payload,
            Err(err) => {
                self.report(&err);
                return Err(err);
            }
        };
        self.submit_close(payload).await
    }

    async fn view(&self) -> HomeView {
        let guard = self.inner.lock().await;
        HomeView::derive(
            &self.identity,
            &guard.store,
            &guard.routes,
            guard.degraded.as_deref(),
        )
    }

    fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
