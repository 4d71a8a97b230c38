//! The call session state machine.
//!
//! ```text
//! Idle --start--> Connecting --joined + agent launched--> Connected <--> Talking
//! Connecting | Connected | Talking --failure--> Error --retry--> Connecting
//! Connected | Talking --hangup--> Idle          Error --reset--> Idle
//! ```
//!
//! Transitions happen only through the named methods on [`CallController`].
//! State lives behind a mutex that is never held across an `.await`; every
//! `start`/`retry` takes a new generation number and a step whose result
//! comes back after the generation moved on is discarded, releasing whatever
//! it acquired.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use voxbridge_agent::{LaunchOptions, LaunchTarget};
use voxbridge_observe::LogBuffer;
use voxbridge_types::{Platform, SessionStatus};

use crate::error::CallError;
use crate::identity::{self, DEFAULT_CHANNEL_PREFIX};
use crate::rtc::{MediaError, RtcClient, RtcEvent};
use crate::seams::{AgentControl, GrantIssuer};

const LOG_CATEGORY: &str = "session";
const TICK: Duration = Duration::from_secs(1);

/// Parameters for one call attempt. Kept for `retry`.
#[derive(Debug, Clone)]
pub struct CallRequest {
    pub platform: Platform,
    pub channel_prefix: String,
    pub options: LaunchOptions,
}

impl CallRequest {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            channel_prefix: DEFAULT_CHANNEL_PREFIX.to_string(),
            options: LaunchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: LaunchOptions) -> Self {
        self.options = options;
        self
    }
}

/// Read-only view of the controller, serialised for the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub generation: u64,
    pub channel_name: Option<String>,
    pub user_uid: Option<u32>,
    pub agent_uid: Option<u32>,
    pub platform: Option<Platform>,
    pub agent_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub duration_seconds: u64,
    /// User-facing message for the last failure.
    pub error: Option<String>,
}

/// Resources acquired by the current attempt, released on teardown.
#[derive(Debug, Clone)]
struct Session {
    channel_name: String,
    user_uid: u32,
    agent_uid: u32,
    platform: Platform,
    joined: bool,
    microphone: bool,
    agent_id: Option<String>,
    started_at: Option<DateTime<Utc>>,
    token_expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct State {
    status: SessionStatus,
    generation: u64,
    session: Option<Session>,
    last_request: Option<CallRequest>,
    last_error: Option<CallError>,
    duration_seconds: u64,
    ticker: Option<JoinHandle<()>>,
    publishers: HashSet<u32>,
}

impl State {
    fn snapshot(&self) -> SessionSnapshot {
        let session = self.session.as_ref();
        SessionSnapshot {
            status: self.status,
            generation: self.generation,
            channel_name: session.map(|s| s.channel_name.clone()),
            user_uid: session.map(|s| s.user_uid),
            agent_uid: session.map(|s| s.agent_uid),
            platform: session.map(|s| s.platform),
            agent_id: session.and_then(|s| s.agent_id.clone()),
            started_at: session.and_then(|s| s.started_at),
            duration_seconds: self.duration_seconds,
            error: self.last_error.as_ref().map(CallError::user_message),
        }
    }

    fn check(&self, generation: u64) -> Result<(), CallError> {
        if self.generation == generation && self.status == SessionStatus::Connecting {
            Ok(())
        } else {
            Err(CallError::Superseded)
        }
    }

    /// Detaches the session's resources and stops the duration counter.
    fn take_resources(&mut self) -> Option<Session> {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        self.duration_seconds = 0;
        self.publishers.clear();
        self.session.take()
    }

    /// Whether nothing is using the shared media client right now.
    fn quiescent(&self) -> bool {
        matches!(self.status, SessionStatus::Idle | SessionStatus::Error)
    }
}

/// Drives one call at a time through token issue, channel join, agent
/// launch and teardown.
///
/// Cloning yields another handle onto the same call.
#[derive(Clone)]
pub struct CallController {
    state: Arc<Mutex<State>>,
    grants: Arc<dyn GrantIssuer>,
    agents: Arc<dyn AgentControl>,
    rtc: Arc<dyn RtcClient>,
    logs: LogBuffer,
}

impl CallController {
    pub fn new(
        grants: Arc<dyn GrantIssuer>,
        agents: Arc<dyn AgentControl>,
        rtc: Arc<dyn RtcClient>,
        logs: LogBuffer,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            grants,
            agents,
            rtc,
            logs,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.lock().status
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    /// Starts a new call. Only valid while Idle.
    pub async fn start(&self, request: CallRequest) -> Result<SessionSnapshot, CallError> {
        let generation = {
            let mut state = self.lock();
            if state.status != SessionStatus::Idle {
                return Err(CallError::InvalidTransition {
                    from: state.status,
                    action: "start",
                });
            }
            state.last_request = Some(request.clone());
            begin(&mut state)
        };
        self.connect(generation, request).await
    }

    /// Runs the last request again. Only valid in Error.
    pub async fn retry(&self) -> Result<SessionSnapshot, CallError> {
        let (generation, request) = {
            let mut state = self.lock();
            let request = match (state.status, state.last_request.clone()) {
                (SessionStatus::Error, Some(request)) => request,
                (from, _) => {
                    return Err(CallError::InvalidTransition {
                        from,
                        action: "retry",
                    })
                }
            };
            (begin(&mut state), request)
        };
        self.log("retrying call");
        self.connect(generation, request).await
    }

    /// Ends a live call. Teardown always runs to completion; its failures
    /// are logged, never returned.
    pub async fn hangup(&self) -> Result<SessionSnapshot, CallError> {
        let resources = {
            let mut state = self.lock();
            if !state.status.is_active() {
                return Err(CallError::InvalidTransition {
                    from: state.status,
                    action: "hang up",
                });
            }
            state.generation += 1;
            state.status = SessionStatus::Idle;
            state.last_error = None;
            state.take_resources()
        };
        self.log("hanging up");
        if let Some(resources) = resources {
            self.teardown(resources).await;
        }
        self.log("call ended");
        Ok(self.snapshot())
    }

    /// Leaves Error for Idle.
    pub fn reset(&self) -> Result<SessionSnapshot, CallError> {
        let mut state = self.lock();
        if state.status != SessionStatus::Error {
            return Err(CallError::InvalidTransition {
                from: state.status,
                action: "reset",
            });
        }
        state.status = SessionStatus::Idle;
        state.last_error = None;
        state.take_resources();
        Ok(state.snapshot())
    }

    /// Records a runtime failure: moves a connecting or live call to Error
    /// and releases its resources. Any step still in flight is discarded.
    pub async fn fail(&self, reason: impl Into<String>) -> Result<SessionSnapshot, CallError> {
        let reason = reason.into();
        let resources = {
            let mut state = self.lock();
            if !(state.status.is_active() || state.status == SessionStatus::Connecting) {
                return Err(CallError::InvalidTransition {
                    from: state.status,
                    action: "fail",
                });
            }
            state.generation += 1;
            state.status = SessionStatus::Error;
            state.last_error = Some(CallError::Transport(reason.clone()));
            state.take_resources()
        };
        self.logs
            .push_error(LOG_CATEGORY, format!("call failed: {}", reason));
        if let Some(resources) = resources {
            self.teardown(resources).await;
        }
        Ok(self.snapshot())
    }

    /// Applies a remote event. Events for a call that is no longer running
    /// are logged and ignored.
    pub async fn handle_event(&self, event: RtcEvent) -> SessionStatus {
        if let RtcEvent::ConnectionLost(reason) = &event {
            return match self.fail(format!("connection lost: {}", reason)).await {
                Ok(snapshot) => snapshot.status,
                Err(_) => {
                    self.log(format!("ignoring connection loss while idle: {}", reason));
                    self.status()
                }
            };
        }

        let mut state = self.lock();
        let user_uid = state.session.as_ref().map(|s| s.user_uid);
        if state.session.is_none() || state.quiescent() {
            drop(state);
            self.log(format!("ignoring late event {:?}", event));
            return self.status();
        }

        let message = match event {
            RtcEvent::RemoteJoined(uid) => format!("participant {} joined", uid),
            RtcEvent::RemotePublished(uid) if Some(uid) != user_uid => {
                state.publishers.insert(uid);
                if state.status == SessionStatus::Connected {
                    state.status = SessionStatus::Talking;
                }
                format!("participant {} started publishing audio", uid)
            }
            RtcEvent::RemoteUnpublished(uid) => {
                settle_publisher(&mut state, uid);
                format!("participant {} stopped publishing audio", uid)
            }
            RtcEvent::RemoteLeft(uid) => {
                settle_publisher(&mut state, uid);
                format!("participant {} left", uid)
            }
            RtcEvent::RemotePublished(uid) => format!("ignoring own publish event for {}", uid),
            RtcEvent::ConnectionLost(reason) => format!("connection lost: {}", reason),
        };
        let status = state.status;
        drop(state);
        self.log(message);
        status
    }

    async fn connect(
        &self,
        generation: u64,
        request: CallRequest,
    ) -> Result<SessionSnapshot, CallError> {
        let platform = request.platform;
        let channel_name = identity::channel_name(&request.channel_prefix);
        let pair = identity::participant_pair(&mut rand::thread_rng());
        {
            let mut state = self.lock();
            state.check(generation)?;
            state.session = Some(Session {
                channel_name: channel_name.clone(),
                user_uid: pair.user,
                agent_uid: pair.agent,
                platform,
                joined: false,
                microphone: false,
                agent_id: None,
                started_at: None,
                token_expires_at: None,
            });
        }
        self.log(format!(
            "connecting to {} on {} as {} (agent {})",
            channel_name, platform, pair.user, pair.agent
        ));

        let user_grant = match self.grants.issue(&channel_name, pair.user, platform).await {
            Ok(grant) => grant,
            Err(err) => return self.abort(generation, err.into()).await,
        };
        if !self.mark(generation, |s| s.token_expires_at = Some(user_grant.expires_at)) {
            return Err(CallError::Superseded);
        }
        self.log(format!("user token issued, expires {}", user_grant.expires_at));

        if let Err(err) = self.rtc.join(&user_grant).await {
            return self.abort(generation, err.into()).await;
        }
        if !self.mark(generation, |s| s.joined = true) {
            self.release_stale("channel join", |rtc| async move { rtc.leave().await })
                .await;
            return Err(CallError::Superseded);
        }
        self.log(format!("joined channel {}", channel_name));

        if let Err(err) = self.rtc.publish_microphone().await {
            return self.abort(generation, err.into()).await;
        }
        if !self.mark(generation, |s| s.microphone = true) {
            self.release_stale("microphone", |rtc| async move {
                let stopped = rtc.stop_microphone().await;
                let left = rtc.leave().await;
                stopped.and(left)
            })
            .await;
            return Err(CallError::Superseded);
        }
        self.log("microphone published");

        let agent_grant = match self.grants.issue(&channel_name, pair.agent, platform).await {
            Ok(grant) => grant,
            Err(err) => return self.abort(generation, err.into()).await,
        };
        self.lock().check(generation)?;

        let target = LaunchTarget {
            channel_name: channel_name.clone(),
            agent_uid: pair.agent,
            user_uid: pair.user,
            token: agent_grant.token,
            platform,
        };
        let started = match self.agents.launch(&target, &request.options).await {
            Ok(started) => started,
            Err(err) => return self.abort(generation, err.into()).await,
        };

        let snapshot = {
            let mut state = self.lock();
            if state.check(generation).is_ok() {
                if let Some(session) = state.session.as_mut() {
                    session.agent_id = Some(started.agent_id.clone());
                    session.started_at = Some(Utc::now());
                }
                // A publish event may already have arrived while launching.
                state.status = if state.publishers.is_empty() {
                    SessionStatus::Connected
                } else {
                    SessionStatus::Talking
                };
                state.duration_seconds = 0;
                state.ticker = Some(spawn_ticker(
                    Arc::downgrade(&self.state),
                    self.logs.clone(),
                    generation,
                ));
                Some(state.snapshot())
            } else {
                None
            }
        };

        match snapshot {
            Some(snapshot) => {
                self.log(format!(
                    "agent {} running ({})",
                    started.agent_id, started.provider_status
                ));
                Ok(snapshot)
            }
            None => {
                self.logs.push_error(
                    LOG_CATEGORY,
                    format!("stopping orphaned agent {}", started.agent_id),
                );
                let outcome = self.agents.stop(&started.agent_id, platform).await;
                if let Some(err) = outcome.upstream_error {
                    self.logs.push_error(
                        LOG_CATEGORY,
                        format!("orphaned agent stop failed: {}", err),
                    );
                }
                Err(CallError::Superseded)
            }
        }
    }

    /// Moves the attempt to Error and tears down what it acquired.
    async fn abort(
        &self,
        generation: u64,
        err: CallError,
    ) -> Result<SessionSnapshot, CallError> {
        let resources = {
            let mut state = self.lock();
            if state.check(generation).is_err() {
                return Err(CallError::Superseded);
            }
            state.status = SessionStatus::Error;
            state.last_error = Some(err.clone());
            let resources = state.take_resources();
            // Keep identifiers visible in the snapshot for diagnosis.
            state.session = resources.clone().map(|mut s| {
                s.joined = false;
                s.microphone = false;
                s
            });
            resources
        };
        self.logs
            .push_error(LOG_CATEGORY, format!("call setup failed: {}", err));
        if let Some(resources) = resources {
            self.teardown(resources).await;
        }
        Err(err)
    }

    /// Releases every acquired resource. Each step runs regardless of the
    /// others' outcome.
    async fn teardown(&self, session: Session) {
        if session.microphone {
            if let Err(err) = self.rtc.stop_microphone().await {
                self.teardown_failed("stop microphone", err);
            }
        }
        if let Err(err) = self.rtc.unsubscribe_all().await {
            self.teardown_failed("unsubscribe", err);
        }
        if session.joined {
            if let Err(err) = self.rtc.leave().await {
                self.teardown_failed("leave channel", err);
            }
        }
        if let Some(agent_id) = session.agent_id.as_deref() {
            let outcome = self.agents.stop(agent_id, session.platform).await;
            match outcome.upstream_error {
                Some(err) => self.teardown_failed("stop agent", err),
                None => self.log(format!("agent {} stopped", agent_id)),
            }
        }
    }

    /// Undoes a media step that completed after its attempt was abandoned,
    /// unless a newer attempt is using the client.
    async fn release_stale<F, Fut>(&self, what: &str, release: F)
    where
        F: FnOnce(Arc<dyn RtcClient>) -> Fut,
        Fut: Future<Output = Result<(), MediaError>>,
    {
        if !self.lock().quiescent() {
            return;
        }
        self.log(format!("releasing stale {}", what));
        if let Err(err) = release(self.rtc.clone()).await {
            self.teardown_failed(what, err);
        }
    }

    fn mark(&self, generation: u64, apply: impl FnOnce(&mut Session)) -> bool {
        let mut state = self.lock();
        if state.check(generation).is_err() {
            return false;
        }
        if let Some(session) = state.session.as_mut() {
            apply(session);
        }
        true
    }

    fn teardown_failed(&self, step: &str, err: impl std::fmt::Display) {
        self.logs
            .push_error(LOG_CATEGORY, format!("teardown step '{}' failed: {}", step, err));
    }

    fn log(&self, message: impl AsRef<str>) {
        self.logs.push(LOG_CATEGORY, message);
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Drops `uid` from the publishers; Talking falls back to Connected once
/// nobody else is sending audio.
fn settle_publisher(state: &mut State, uid: u32) {
    state.publishers.remove(&uid);
    if state.status == SessionStatus::Talking && state.publishers.is_empty() {
        state.status = SessionStatus::Connected;
    }
}

fn begin(state: &mut State) -> u64 {
    state.generation += 1;
    state.status = SessionStatus::Connecting;
    state.last_error = None;
    state.duration_seconds = 0;
    state.publishers.clear();
    state.session = None;
    state.generation
}

/// Counts whole seconds while the call stays live in `generation`.
///
/// Grants are not renewed; once the user's token expires the call keeps
/// running and the expiry is logged once.
fn spawn_ticker(state: Weak<Mutex<State>>, logs: LogBuffer, generation: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticks = interval_at(Instant::now() + TICK, TICK);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut expiry_logged = false;
        loop {
            ticks.tick().await;
            let Some(shared) = state.upgrade() else { break };
            let expired = {
                let mut guard = shared.lock().unwrap_or_else(|e| e.into_inner());
                if guard.generation != generation || !guard.status.is_active() {
                    break;
                }
                guard.duration_seconds += 1;
                guard
                    .session
                    .as_ref()
                    .and_then(|s| s.token_expires_at)
                    .is_some_and(|at| at <= Utc::now())
            };
            if expired && !expiry_logged {
                expiry_logged = true;
                logs.push_error(
                    LOG_CATEGORY,
                    "access token expired during the call; media may drop",
                );
            }
        }
    })
}
