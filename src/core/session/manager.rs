use crate::core::event::{LogoutReason, SessionEvent};
use crate::core::session::state::{
    remaining_before_logout, SessionInner, SessionPhase, SessionSnapshot,
};
use crate::core::timer::{TimerHandle, TimerKind, TimerSet};
use crate::domain::config::SessionConfig;
use crate::domain::error::{SessionGuardError, SessionGuardResult};
use crate::infrastructure::api::{AuthApi, Credentials, UserProfile};
use crate::infrastructure::storage::{TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Capacity of the session event channel
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Session activity manager
///
/// Owns the authenticated-session state machine: activity-driven inactivity
/// and warning timers, the absolute session ceiling, and the silent token
/// refresh loop. At most one session exists at a time; timers only run while
/// a session exists.
///
/// The manager is constructed behind an `Arc` so timer tasks can hold weak
/// references back to it; UI collaborators read state through
/// [`SessionManager::snapshot`] and subscribe to [`SessionEvent`]s.
pub struct SessionManager {
    api: Arc<dyn AuthApi>,
    store: Arc<dyn TokenStore>,
    config: SessionConfig,
    inner: RwLock<SessionInner>,
    timers: Mutex<TimerSet>,
    /// Re-entrancy guard: set synchronously before the first await of any
    /// logout path, cleared on teardown
    auto_logging_out: AtomicBool,
    /// Bumped on every session start and teardown; timer callbacks carrying
    /// an older value are stale and must not act
    generation: AtomicU64,
    timer_seq: AtomicU64,
    events: broadcast::Sender<SessionEvent>,
    /// Handed to spawned timer tasks; upgrading fails once the manager is
    /// dropped, so orphaned timers fall through silently
    weak_self: Weak<Self>,
}

impl SessionManager {
    /// Create a new session manager in the no-session state
    pub fn new(
        api: Arc<dyn AuthApi>,
        store: Arc<dyn TokenStore>,
        config: SessionConfig,
    ) -> SessionGuardResult<Arc<Self>> {
        config.validate()?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Arc::new_cyclic(|weak| Self {
            api,
            store,
            config,
            inner: RwLock::new(SessionInner::new()),
            timers: Mutex::new(TimerSet::new()),
            auto_logging_out: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            timer_seq: AtomicU64::new(0),
            events,
            weak_self: weak.clone(),
        }))
    }

    /// Subscribe to session lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Session timing configuration in effect
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Read-only view of the current state
    pub async fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.read().await;
        SessionSnapshot {
            phase: inner.phase,
            user: inner.user.clone(),
            loading: inner.loading,
            auto_logging_out: self.is_auto_logging_out(),
        }
    }

    /// Currently authenticated user, if any
    pub async fn user(&self) -> Option<UserProfile> {
        self.inner.read().await.user.clone()
    }

    /// True while login or startup reconciliation is in flight
    pub async fn is_loading(&self) -> bool {
        self.inner.read().await.loading
    }

    /// True while an automatic logout is executing
    pub fn is_auto_logging_out(&self) -> bool {
        self.auto_logging_out.load(Ordering::SeqCst)
    }

    /// Time remaining before the inactivity logout, floored at zero
    pub async fn time_until_logout(&self) -> Duration {
        let inner = self.inner.read().await;
        match inner.phase {
            SessionPhase::Active | SessionPhase::WarningIssued => remaining_before_logout(
                inner.last_activity.elapsed(),
                self.config.inactivity_timeout(),
            ),
            _ => Duration::ZERO,
        }
    }

    /// Number of currently armed timers, for diagnostics
    pub async fn scheduled_timer_count(&self) -> usize {
        self.timers.lock().await.armed_count()
    }

    /// Authenticate and start a session
    ///
    /// Any prior session's timers are torn down before the new session
    /// starts.
    pub async fn login(&self, credentials: &Credentials) -> SessionGuardResult<UserProfile> {
        self.set_loading(true).await;
        debug!("Login attempt for '{}'", credentials.username);

        let auth = match self.api.login(credentials).await {
            Ok(auth) => auth,
            Err(e) => {
                self.set_loading(false).await;
                return Err(e);
            }
        };

        self.teardown().await;

        let stored = async {
            self.store.set(ACCESS_TOKEN_KEY, &auth.token).await?;
            self.store.set(REFRESH_TOKEN_KEY, &auth.refresh_token).await
        }
        .await;
        if let Err(e) = stored {
            self.set_loading(false).await;
            return Err(e);
        }

        let user = auth.user;
        self.enter_active(user.clone()).await;
        self.set_loading(false).await;
        Ok(user)
    }

    /// Startup reconciliation against the stored tokens
    ///
    /// With no stored access token this resolves to no session immediately
    /// and starts no timers. Otherwise the current user is fetched under a
    /// bounded timeout, with one refresh-then-retry cycle on failure; a
    /// second failure clears the stored tokens.
    pub async fn check_auth(&self) -> SessionGuardResult<Option<UserProfile>> {
        self.set_loading(true).await;

        let token = match self.store.get(ACCESS_TOKEN_KEY).await {
            Ok(token) => token,
            Err(e) => {
                self.set_loading(false).await;
                return Err(e);
            }
        };
        if token.is_none() {
            debug!("No stored access token, resolving to no session");
            self.set_loading(false).await;
            return Ok(None);
        }

        let user = match self.fetch_user_bounded().await {
            Ok(user) => Some(user),
            Err(first_err) => {
                debug!(
                    "Current-user fetch failed ({}), attempting token refresh",
                    first_err
                );
                match self.refresh_tokens().await {
                    Ok(()) => match self.fetch_user_bounded().await {
                        Ok(user) => Some(user),
                        Err(e) => {
                            warn!("Current-user fetch failed after refresh: {}", e);
                            None
                        }
                    },
                    Err(e) => {
                        warn!("Token refresh during startup failed: {}", e);
                        None
                    }
                }
            }
        };

        match user {
            Some(user) => {
                self.enter_active(user.clone()).await;
                self.set_loading(false).await;
                Ok(Some(user))
            }
            None => {
                self.teardown().await;
                self.set_loading(false).await;
                Ok(None)
            }
        }
    }

    /// Explicit logout
    ///
    /// The remote call is best-effort: local state is cleared whether or not
    /// it succeeds. A no-op when no session exists or a logout is already in
    /// flight.
    pub async fn logout(&self) -> SessionGuardResult<()> {
        if !self.inner.read().await.has_session() {
            return Ok(());
        }
        if self
            .auto_logging_out
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Logout already in progress");
            return Ok(());
        }

        self.execute_logout(LogoutReason::Manual).await;
        Ok(())
    }

    /// Record a user activity signal
    ///
    /// Resets the inactivity clock and re-arms the warning and inactivity
    /// timers, cancelling the previous ones. Ignored with no session or while
    /// a logout is in flight.
    pub async fn report_activity(&self) {
        if self.is_auto_logging_out() {
            return;
        }
        let generation = self.generation.load(Ordering::SeqCst);
        {
            let mut inner = self.inner.write().await;
            match inner.phase {
                SessionPhase::Active | SessionPhase::WarningIssued => {
                    inner.last_activity = Instant::now();
                    inner.phase = SessionPhase::Active;
                }
                _ => return,
            }
        }
        self.arm_activity_deadlines(generation).await;
    }

    /// User-facing "stay logged in" action; identical to an activity signal
    pub async fn extend_session(&self) {
        debug!("Session extended manually");
        self.report_activity().await;
    }

    /// Cancel all timers and reset to the no-session state without clearing
    /// stored tokens
    ///
    /// For process shutdown: the stored tokens survive so a restarted
    /// process can reconcile via [`SessionManager::check_auth`].
    pub async fn shutdown(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.timers.lock().await.advance_generation(generation);
        self.inner.write().await.clear();
        self.auto_logging_out.store(false, Ordering::SeqCst);
        info!("Session manager shut down");
    }

    // Session establishment

    async fn enter_active(&self, user: UserProfile) {
        let session_id = Uuid::new_v4().to_string();
        let username = user.username.clone();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.timers.lock().await.advance_generation(generation);
        {
            let mut inner = self.inner.write().await;
            inner.phase = SessionPhase::Active;
            inner.user = Some(user);
            inner.session_id = Some(session_id.clone());
            inner.last_activity = Instant::now();
        }
        self.auto_logging_out.store(false, Ordering::SeqCst);

        self.arm_activity_deadlines(generation).await;
        self.arm_deadline(
            TimerKind::Absolute,
            self.config.absolute_session(),
            generation,
        )
        .await;
        self.arm_refresh_loop(generation).await;

        info!("Session {} established for '{}'", session_id, username);
        let _ = self.events.send(SessionEvent::SessionStarted {
            session_id,
            username,
        });
    }

    // Timer scheduling

    async fn arm_activity_deadlines(&self, generation: u64) {
        self.arm_deadline(TimerKind::Warning, self.config.warning_delay(), generation)
            .await;
        self.arm_deadline(
            TimerKind::Inactivity,
            self.config.inactivity_timeout(),
            generation,
        )
        .await;
    }

    async fn arm_deadline(&self, kind: TimerKind, delay: Duration, generation: u64) {
        let seq = self.timer_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let task = self.spawn_deadline_task(kind, delay, generation, seq);
        let armed = self
            .timers
            .lock()
            .await
            .arm(kind, generation, TimerHandle::new(seq, task));
        if !armed {
            debug!("Discarded {} timer armed for a superseded session", kind);
        }
    }

    fn spawn_deadline_task(
        &self,
        kind: TimerKind,
        delay: Duration,
        generation: u64,
        seq: u64,
    ) -> JoinHandle<()> {
        let manager = self.weak_self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(manager) = manager.upgrade() else {
                return;
            };
            manager.run_deadline(kind, generation, seq).await;
        })
    }

    async fn run_deadline(&self, kind: TimerKind, generation: u64, seq: u64) {
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Ignoring stale {} timer from a superseded session", kind);
            return;
        }
        // Disarm our own slot before acting; a failed disarm means the timer
        // was rescheduled after this task was already past its sleep
        if !self.timers.lock().await.disarm(kind, seq) {
            return;
        }
        match kind {
            TimerKind::Warning => self.on_warning_deadline().await,
            TimerKind::Inactivity => self.on_inactivity_deadline(generation).await,
            TimerKind::Absolute => {
                self.auto_logout(generation, LogoutReason::SessionExpired)
                    .await
            }
            TimerKind::Refresh => {}
        }
    }

    async fn on_warning_deadline(&self) {
        if self.is_auto_logging_out() {
            return;
        }
        {
            let mut inner = self.inner.write().await;
            if inner.phase != SessionPhase::Active {
                return;
            }
            // Late activity may have slipped in after this timer disarmed
            if inner.last_activity.elapsed() < self.config.warning_delay() {
                return;
            }
            inner.phase = SessionPhase::WarningIssued;
        }
        let remaining = self.config.warning_lead();
        warn!(
            "Inactivity warning: logout in {}s unless activity is reported",
            remaining.as_secs()
        );
        let _ = self
            .events
            .send(SessionEvent::InactivityWarning { remaining });
    }

    async fn on_inactivity_deadline(&self, generation: u64) {
        {
            let inner = self.inner.read().await;
            if !matches!(
                inner.phase,
                SessionPhase::Active | SessionPhase::WarningIssued
            ) {
                return;
            }
            if inner.last_activity.elapsed() < self.config.inactivity_timeout() {
                return;
            }
        }
        self.auto_logout(generation, LogoutReason::Inactivity).await;
    }

    // Token refresh

    async fn arm_refresh_loop(&self, generation: u64) {
        let seq = self.timer_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let manager = self.weak_self.clone();
        let interval = self.config.refresh_interval();

        let task = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let Some(manager) = manager.upgrade() else {
                    return;
                };
                if manager.generation.load(Ordering::SeqCst) != generation {
                    return;
                }
                match manager.refresh_tokens().await {
                    Ok(()) => {
                        debug!("Silent token refresh succeeded");
                        let _ = manager.events.send(SessionEvent::TokensRefreshed);
                    }
                    Err(e) => {
                        // Fail fast: a rejected refresh token means the
                        // session is over regardless of activity
                        warn!("Silent token refresh failed: {}", e);
                        manager.timers.lock().await.disarm(TimerKind::Refresh, seq);
                        manager
                            .auto_logout(generation, LogoutReason::SessionExpired)
                            .await;
                        return;
                    }
                }
            }
        });

        self.timers
            .lock()
            .await
            .arm(TimerKind::Refresh, generation, TimerHandle::new(seq, task));
    }

    async fn refresh_tokens(&self) -> SessionGuardResult<()> {
        let refresh = self
            .store
            .get(REFRESH_TOKEN_KEY)
            .await?
            .ok_or(SessionGuardError::NotAuthenticated)?;

        let tokens = self.api.refresh_token(&refresh).await?;
        self.store.set(ACCESS_TOKEN_KEY, &tokens.token).await?;
        if let Some(rotated) = tokens.refresh_token {
            self.store.set(REFRESH_TOKEN_KEY, &rotated).await?;
        }
        Ok(())
    }

    // Logout paths

    async fn auto_logout(&self, generation: u64, reason: LogoutReason) {
        if self.generation.load(Ordering::SeqCst) != generation {
            return;
        }
        if self
            .auto_logging_out
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Auto-logout already in progress, ignoring {} trigger", reason);
            return;
        }
        self.execute_logout(reason).await;
    }

    async fn execute_logout(&self, reason: LogoutReason) {
        let generation = self.generation.load(Ordering::SeqCst);
        self.inner.write().await.phase = SessionPhase::LoggingOut;
        info!("Ending session: {}", reason);
        let _ = self.events.send(SessionEvent::LoggedOut { reason });

        if let Err(e) = self.api.logout().await {
            warn!("Remote logout failed, clearing local session anyway: {}", e);
        }

        // A login may have superseded this session while the remote call was
        // outstanding; its own teardown already ran
        if self.generation.load(Ordering::SeqCst) == generation {
            self.teardown().await;
        }
    }

    /// Cancel all timers, clear stored tokens and reset to no session
    async fn teardown(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.timers.lock().await.advance_generation(generation);

        if let Err(e) = self.store.remove(ACCESS_TOKEN_KEY).await {
            warn!("Failed to remove stored access token: {}", e);
        }
        if let Err(e) = self.store.remove(REFRESH_TOKEN_KEY).await {
            warn!("Failed to remove stored refresh token: {}", e);
        }

        self.inner.write().await.clear();
        self.auto_logging_out.store(false, Ordering::SeqCst);
    }

    async fn set_loading(&self, loading: bool) {
        self.inner.write().await.loading = loading;
    }

    async fn fetch_user_bounded(&self) -> SessionGuardResult<UserProfile> {
        tokio::time::timeout(self.config.auth_check_timeout(), self.api.current_user())
            .await
            .map_err(|_| SessionGuardError::Timeout)?
    }
}
