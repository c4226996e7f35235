//! Render-tree gate.
//!
//! Withholds a protected subtree until a session check for the active route has
//! confirmed access. One resolution task runs per route; navigating or dropping
//! the gate cancels it, and any result that arrives for a superseded route is
//! discarded.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::{sync::watch, task::JoinHandle};

use super::route::ProtectedRoutes;
use crate::session::SessionProbe;

/// GatePhase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePhase {
    /// A session check is in flight. Children are not rendered.
    Checking,
    /// A session was confirmed for the active route.
    Authorized,
    /// No session (or the check failed). Navigation to login has been issued.
    Redirecting,
}

/// What the gate lets through for the current phase.
#[derive(Debug, Clone, PartialEq)]
pub enum GateView<T> {
    Loading,
    Content(T),
}

/// Performs a replacing navigation (no history entry) to `target`.
///
/// Called while the gate's state is locked; an implementation must not call back
/// into the same gate.
pub trait Navigator: Send + Sync {
    fn replace(&self, target: &str);
}

/// RecordingNavigator
///
/// Remembers where it was told to go. Used when the gate runs on the server and
/// the navigation has to be turned into a response.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    targets: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_target(&self) -> Option<String> {
        self.targets.lock().ok().and_then(|t| t.last().cloned())
    }

    pub fn count(&self) -> usize {
        self.targets.lock().map(|t| t.len()).unwrap_or_default()
    }
}

impl Navigator for RecordingNavigator {
    fn replace(&self, target: &str) {
        if let Ok(mut targets) = self.targets.lock() {
            targets.push(target.to_string());
        }
    }
}

struct Inner {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

struct Shared {
    routes: ProtectedRoutes,
    timeout: Duration,
    navigator: Arc<dyn Navigator>,
    probe: tokio::sync::Mutex<Box<dyn SessionProbe>>,
    phase: watch::Sender<GatePhase>,
    inner: Mutex<Inner>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Applies a finished check. The generation test, the navigation and the phase
    /// change happen under one lock, so a `navigate` or drop either lands before
    /// and the result is discarded, or lands after the redirect was issued.
    fn commit(&self, generation: u64, route: &str, authorized: bool) {
        let mut inner = self.lock();
        if inner.generation != generation {
            tracing::debug!(route, "render gate: discarding stale session check");
            return;
        }
        inner.task = None;
        if authorized {
            self.phase.send_replace(GatePhase::Authorized);
        } else {
            let target = self.routes.login_redirect(route);
            tracing::info!(route, %target, "render gate: no session, redirecting");
            self.navigator.replace(&target);
            self.phase.send_replace(GatePhase::Redirecting);
        }
    }
}

/// RenderGate
///
/// Owned by whatever renders the protected subtree. Must be created inside a Tokio
/// runtime; the session check runs as a spawned task.
pub struct RenderGate {
    shared: Arc<Shared>,
}

impl RenderGate {
    /// Mounts the gate on `route` and starts its first check.
    pub fn mount(
        routes: ProtectedRoutes,
        timeout: Duration,
        navigator: Arc<dyn Navigator>,
        probe: Box<dyn SessionProbe>,
        route: &str,
    ) -> Self {
        let (phase, _) = watch::channel(GatePhase::Checking);
        let gate = Self {
            shared: Arc::new(Shared {
                routes,
                timeout,
                navigator,
                probe: tokio::sync::Mutex::new(probe),
                phase,
                inner: Mutex::new(Inner {
                    generation: 0,
                    task: None,
                }),
            }),
        };
        gate.navigate(route);
        gate
    }

    /// Re-runs the check for a new active route. Any check still in flight for the
    /// previous route is cancelled and its result will not be applied.
    pub fn navigate(&self, route: &str) {
        let mut inner = self.shared.lock();
        inner.generation += 1;
        let generation = inner.generation;
        if let Some(task) = inner.task.take() {
            task.abort();
        }

        // The login route (and anything outside the protected set) renders at once.
        if !self.shared.routes.requires_session(route) {
            self.shared.phase.send_replace(GatePhase::Authorized);
            return;
        }

        self.shared.phase.send_replace(GatePhase::Checking);
        let shared = Arc::clone(&self.shared);
        let route = route.to_string();
        inner.task = Some(tokio::spawn(async move {
            let outcome = {
                let mut probe = shared.probe.lock().await;
                tokio::time::timeout(shared.timeout, probe.current_session()).await
            };
            let authorized = match outcome {
                Ok(Ok(session)) => session.is_some(),
                Ok(Err(e)) => {
                    tracing::warn!(route, error = %e, "render gate: session check failed");
                    false
                }
                Err(_) => {
                    tracing::warn!(route, "render gate: session check timed out");
                    false
                }
            };
            shared.commit(generation, &route, authorized);
        }));
    }

    pub fn phase(&self) -> GatePhase {
        *self.shared.phase.borrow()
    }

    /// Waits until the current check has finished and returns the outcome.
    pub async fn settled(&self) -> GatePhase {
        let mut rx = self.shared.phase.subscribe();
        rx.wait_for(|phase| *phase != GatePhase::Checking)
            .await
            .map(|phase| *phase)
            .unwrap_or(GatePhase::Redirecting)
    }

    /// Builds the children only when the phase is `Authorized`.
    pub fn render<T>(&self, children: impl FnOnce() -> T) -> GateView<T> {
        match self.phase() {
            GatePhase::Authorized => GateView::Content(children()),
            GatePhase::Checking | GatePhase::Redirecting => GateView::Loading,
        }
    }
}

impl Drop for RenderGate {
    fn drop(&mut self) {
        let mut inner = self.shared.lock();
        inner.generation += 1;
        if let Some(task) = inner.task.take() {
            task.abort();
        }
    }
}
