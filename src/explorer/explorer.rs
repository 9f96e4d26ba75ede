use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tokio::time::{Instant, sleep, timeout_at};
use tracing::{debug, error, info, warn};

use crate::device::source::ElementSource;
use crate::error::{ExplorationError, SourceError};
use crate::explorer::control::{ControlFlags, ExplorationHandle, ExplorationState};
use crate::explorer::nav_graph::{
    ExplorerConfig, NavigationEdge, NavigationGraph, RegisteredElement, ScreenNode,
};
use crate::explorer::scroller::collect_all;
use crate::screen::classifier::{ElementCategory, classify};
use crate::state::diff::is_similar;
use crate::state::identity::element_identity;
use crate::state::state_builder::observe;
use crate::state::state_model::Observation;
use crate::store::sink::{PersistenceSink, SinkReport};
use crate::store::store::{ExplorationStore, PersistenceRecord};

// ============================================================================
// Results
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum ExplorationStatus {
    Completed,
    Stopped,
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExplorationStats {
    pub screens: usize,
    pub revisits: usize,
    pub edges: usize,
    pub clicks: usize,
    pub no_op_clicks: usize,
    pub refused_clicks: usize,
    pub dangerous_skipped: usize,
    pub edit_texts_skipped: usize,
    pub login_screens: usize,
    pub navigation_anomalies: usize,
    pub package_exits: usize,
    pub classification_errors: usize,
    pub scrolls: usize,
    pub depth_limit_hits: usize,
    pub deepest: usize,
    pub elapsed_ms: u64,
    pub time_limit_reached: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExplorationResult {
    pub status: ExplorationStatus,
    pub graph: NavigationGraph,
    pub stats: ExplorationStats,
    pub persistence: Option<SinkReport>,
}

impl ExplorationResult {
    /// Anything short of a clean, unbounded completion.
    pub fn is_partial(&self) -> bool {
        self.status != ExplorationStatus::Completed || self.stats.time_limit_reached
    }

    pub fn final_state(&self) -> ExplorationState {
        match self.status {
            ExplorationStatus::Completed => ExplorationState::Completed,
            ExplorationStatus::Stopped => ExplorationState::Stopped,
            ExplorationStatus::Failed(_) => ExplorationState::Failed,
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Depth-first explorer over the screens of one app.
///
/// Each unique screen (by content fingerprint) is expanded once: every safe
/// clickable element is clicked, the resulting screen explored recursively,
/// then the engine presses back. Dangerous, login and text-input elements are
/// registered but never clicked.
pub struct ExplorationEngine {
    source: Arc<dyn ElementSource>,
    config: ExplorerConfig,
    store: Option<Arc<dyn ExplorationStore>>,
    lock: Arc<Mutex<()>>,
    handle: ExplorationHandle,
}

impl ExplorationEngine {
    pub fn new(source: Arc<dyn ElementSource>, config: ExplorerConfig) -> Self {
        Self {
            source,
            config,
            store: None,
            lock: Arc::new(Mutex::new(())),
            handle: ExplorationHandle::new(),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn ExplorationStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Share a session lock with other engines; only one may run at a time.
    pub fn with_lock(mut self, lock: Arc<Mutex<()>>) -> Self {
        self.lock = lock;
        self
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn handle(&self) -> ExplorationHandle {
        self.handle.clone()
    }

    pub fn state(&self) -> ExplorationState {
        self.handle.state()
    }

    /// Run one session from the screen currently showing.
    ///
    /// Failures of the element source end the session as `Failed` with the
    /// graph gathered so far; only misuse (engine reused, lock held) is an
    /// `Err`.
    pub async fn explore(&self) -> Result<ExplorationResult, ExplorationError> {
        if self.handle.state() != ExplorationState::Idle {
            return Err(ExplorationError::NotIdle);
        }
        let _guard = self
            .lock
            .clone()
            .try_lock_owned()
            .map_err(|_| ExplorationError::AlreadyRunning)?;

        self.handle.set_state(ExplorationState::Running);
        let started = Instant::now();
        let mut session = Session {
            source: self.source.as_ref(),
            config: &self.config,
            handle: &self.handle,
            flags: self.handle.flags(),
            sink: self.store.clone().map(PersistenceSink::spawn),
            graph: NavigationGraph::new(),
            stats: ExplorationStats::default(),
            started,
            deadline: started + self.config.max_exploration_time(),
            target_package: self.config.target_package.clone().unwrap_or_default(),
        };

        let outcome = session.run().await;
        let status = match outcome {
            Ok(Flow::Continue) => ExplorationStatus::Completed,
            Ok(Flow::Halt(Halt::TimeLimit)) => {
                warn!(
                    limit_ms = self.config.max_exploration_time_ms,
                    "exploration time limit reached"
                );
                session.stats.time_limit_reached = true;
                ExplorationStatus::Completed
            }
            Ok(Flow::Halt(Halt::Stopped)) => ExplorationStatus::Stopped,
            Err(e) => {
                error!("exploration failed: {}", e);
                ExplorationStatus::Failed(e.to_string())
            }
        };

        let Session {
            sink,
            graph,
            mut stats,
            ..
        } = session;
        let persistence = match sink {
            Some(sink) => Some(sink.finish().await),
            None => None,
        };
        stats.screens = graph.screen_count();
        stats.edges = graph.edge_count();
        stats.elapsed_ms = millis(started.elapsed());

        let result = ExplorationResult {
            status,
            graph,
            stats,
            persistence,
        };
        info!(
            status = ?result.status,
            screens = result.stats.screens,
            edges = result.stats.edges,
            clicks = result.stats.clicks,
            "exploration finished"
        );
        self.handle.set_state(result.final_state());
        Ok(result)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Halt {
    Stopped,
    TimeLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Halt(Halt),
}

type Step<'a> = Pin<Box<dyn Future<Output = Result<Flow, SourceError>> + Send + 'a>>;

/// State owned by one running session.
struct Session<'a> {
    source: &'a dyn ElementSource,
    config: &'a ExplorerConfig,
    handle: &'a ExplorationHandle,
    flags: watch::Receiver<ControlFlags>,
    sink: Option<PersistenceSink>,
    graph: NavigationGraph,
    stats: ExplorationStats,
    started: Instant,
    deadline: Instant,
    target_package: String,
}

impl<'a> Session<'a> {
    async fn run(&mut self) -> Result<Flow, SourceError> {
        let start = self.observe().await?;
        if self.target_package.is_empty() {
            self.target_package = start.signature.package_name.clone();
        }
        info!(package = %self.target_package, "exploration started");
        self.explore_screen(start, 0).await
    }

    fn explore_screen<'s>(&'s mut self, obs: Observation, depth: usize) -> Step<'s> {
        Box::pin(async move {
            if depth > self.config.max_depth {
                self.stats.depth_limit_hits += 1;
                debug!(depth, "depth limit reached");
                return Ok(Flow::Continue);
            }
            if self.time_up() {
                return Ok(Flow::Halt(Halt::TimeLimit));
            }

            let fp = obs.state.fingerprint.clone();
            if let Some(visits) = self.graph.record_visit(&fp) {
                self.stats.revisits += 1;
                debug!(fingerprint = %fp, visits, "screen already explored");
                self.persist(PersistenceRecord::Visit { fingerprint: fp });
                return Ok(Flow::Continue);
            }
            self.stats.deepest = self.stats.deepest.max(depth);

            let collected = collect_all(self.source, obs.elements.clone(), self.config).await?;
            self.stats.scrolls += collected.scrolls;
            let classification = classify(&collected.elements);
            let login = classification.login.is_login_screen;

            for (el, e) in &classification.skipped {
                warn!(element = %el.id, "skipping unreadable element: {}", e);
            }
            self.stats.classification_errors += classification.skipped.len();

            let node = ScreenNode {
                state: obs.state.clone(),
                depth,
                visit_count: 1,
                discovered_at_ms: self.elapsed_ms(),
                login_screen: login,
            };
            info!(
                fingerprint = %fp,
                activity = %obs.state.activity_name,
                depth,
                elements = classification.elements.len(),
                "new screen"
            );
            self.graph.add_screen(node.clone());
            self.persist(PersistenceRecord::Screen(node));

            let mut targets = Vec::new();
            for c in &classification.elements {
                match c.category {
                    ElementCategory::NonInteractive => continue,
                    ElementCategory::SafeClickable => targets.push(c.element.clone()),
                    ElementCategory::Dangerous(kind) => {
                        self.stats.dangerous_skipped += 1;
                        debug!(element = %c.element.id, ?kind, "dangerous element not clicked");
                    }
                    ElementCategory::EditText => self.stats.edit_texts_skipped += 1,
                    ElementCategory::LoginField(_) => {}
                }
                let registered = RegisteredElement {
                    identity: element_identity(&fp, &c.element),
                    screen: fp.clone(),
                    element_id: c.element.id.clone(),
                    element_type: c.element.element_type,
                    label: c.element.label().map(str::to_string),
                    category: c.category,
                };
                self.graph.register_element(registered.clone());
                self.persist(PersistenceRecord::Element(registered));
            }

            if login {
                self.stats.login_screens += 1;
                return self.pause_for_login(&fp, depth).await;
            }

            for el in targets {
                if let Some(halt) = self.checkpoint().await {
                    return Ok(Flow::Halt(halt));
                }

                self.stats.clicks += 1;
                if !self.source.click(&el.id).await? {
                    self.stats.refused_clicks += 1;
                    debug!(element = %el.id, "click refused");
                    continue;
                }
                let Some(next) = self.await_transition(&fp).await? else {
                    self.stats.no_op_clicks += 1;
                    debug!(element = %el.id, "click did not change the screen");
                    continue;
                };

                if !self.in_target(&next) {
                    self.stats.package_exits += 1;
                    warn!(
                        element = %el.id,
                        package = %next.signature.package_name,
                        "click left the target app, going back"
                    );
                    if !self.backtrack(&obs).await? {
                        return Ok(Flow::Continue);
                    }
                    continue;
                }

                let edge = NavigationEdge {
                    from: fp.clone(),
                    element: element_identity(&fp, &el),
                    to: next.state.fingerprint.clone(),
                    at_ms: self.elapsed_ms(),
                };
                self.graph.add_edge(edge.clone());
                self.persist(PersistenceRecord::Edge(edge));

                if let Flow::Halt(halt) = self.explore_screen(next, depth + 1).await? {
                    return Ok(Flow::Halt(halt));
                }
                if !self.backtrack(&obs).await? {
                    return Ok(Flow::Continue);
                }
            }

            Ok(Flow::Continue)
        })
    }

    /// Press back once and check where we landed. Returns `false` when the
    /// app is no longer in the foreground and this screen must be abandoned.
    async fn backtrack(&mut self, expected: &Observation) -> Result<bool, SourceError> {
        self.source.navigate_back().await?;
        sleep(self.config.transition_settle()).await;
        let restored = self.observe().await?;

        if !self.in_target(&restored) {
            self.stats.package_exits += 1;
            warn!(
                package = %restored.signature.package_name,
                "back navigation left the target app, abandoning screen"
            );
            return Ok(false);
        }
        if !is_similar(&expected.state, &restored.state, self.config.backtrack_similarity) {
            self.stats.navigation_anomalies += 1;
            warn!(
                expected = %expected.state.fingerprint,
                actual = %restored.state.fingerprint,
                "navigation anomaly: back did not restore the previous screen"
            );
        }
        Ok(true)
    }

    /// Settle, then poll until the fingerprint moves away from `before` or the
    /// transition timeout expires (the click was a no-op).
    async fn await_transition(&mut self, before: &str) -> Result<Option<Observation>, SourceError> {
        let clicked_at = Instant::now();
        sleep(self.config.transition_settle()).await;
        let give_up = clicked_at + self.config.transition_timeout();

        loop {
            let obs = self.observe().await?;
            if obs.state.fingerprint != before {
                return Ok(Some(obs));
            }
            if Instant::now() >= give_up {
                return Ok(None);
            }
            sleep(self.config.transition_poll()).await;
        }
    }

    async fn pause_for_login(&mut self, fp: &str, depth: usize) -> Result<Flow, SourceError> {
        info!(fingerprint = %fp, "login screen detected, waiting for user");
        self.handle.set_state(ExplorationState::PausedForLogin);

        let seen = self.flags.borrow().login_signals;
        let waited = timeout_at(
            self.deadline,
            self.flags
                .wait_for(|f| f.stopped || f.login_signals > seen),
        )
        .await
        .map(|r| r.map(|f| *f));

        match waited {
            Err(_) => return Ok(Flow::Halt(Halt::TimeLimit)),
            Ok(Err(_)) => return Ok(Flow::Halt(Halt::Stopped)),
            Ok(Ok(flags)) if flags.stopped => return Ok(Flow::Halt(Halt::Stopped)),
            Ok(Ok(_)) => {}
        }

        info!("login completed, resuming");
        self.handle.set_state(ExplorationState::Running);
        sleep(self.config.transition_settle()).await;
        let resumed = self.observe().await?;
        if !self.in_target(&resumed) {
            self.stats.package_exits += 1;
            warn!(package = %resumed.signature.package_name, "resumed outside the target app");
            return Ok(Flow::Continue);
        }
        self.explore_screen(resumed, depth).await
    }

    /// Cooperative stop, pause and time-limit check between clicks.
    async fn checkpoint(&mut self) -> Option<Halt> {
        if self.time_up() {
            return Some(Halt::TimeLimit);
        }
        let flags = *self.flags.borrow();
        if flags.stopped {
            return Some(Halt::Stopped);
        }
        if !flags.paused {
            return None;
        }

        self.handle.set_state(ExplorationState::Paused);
        let waited = timeout_at(self.deadline, self.flags.wait_for(|f| f.stopped || !f.paused))
            .await
            .map(|r| r.map(|f| *f));
        match waited {
            Err(_) => Some(Halt::TimeLimit),
            Ok(Err(_)) => Some(Halt::Stopped),
            Ok(Ok(flags)) if flags.stopped => Some(Halt::Stopped),
            Ok(Ok(_)) => {
                self.handle.set_state(ExplorationState::Running);
                None
            }
        }
    }

    async fn observe(&self) -> Result<Observation, SourceError> {
        let signature = self.source.current_screen_signature().await?;
        let elements = self.source.scrape_current_screen().await?;
        Ok(observe(signature, elements, self.config.fingerprint_element_limit))
    }

    fn in_target(&self, obs: &Observation) -> bool {
        obs.signature.package_name == self.target_package
    }

    fn persist(&self, record: PersistenceRecord) {
        if let Some(sink) = &self.sink {
            sink.send(record);
        }
    }

    fn time_up(&self) -> bool {
        Instant::now() >= self.deadline
    }

    fn elapsed_ms(&self) -> u64 {
        millis(self.started.elapsed())
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
