use tokio::task::JoinHandle;

/// Timer slot identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Inactivity warning deadline
    Warning,
    /// Inactivity logout deadline
    Inactivity,
    /// Absolute session expiry deadline
    Absolute,
    /// Silent token refresh loop
    Refresh,
}

impl std::fmt::Display for TimerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimerKind::Warning => write!(f, "warning"),
            TimerKind::Inactivity => write!(f, "inactivity"),
            TimerKind::Absolute => write!(f, "absolute"),
            TimerKind::Refresh => write!(f, "refresh"),
        }
    }
}

/// Handle to a scheduled timer task
///
/// Cancellation is explicit: dropping the handle does not abort the task.
/// A firing timer disarms its own slot before running its deadline handler,
/// and a dropped-but-not-cancelled handle must never kill that handler
/// mid-flight.
#[derive(Debug)]
pub struct TimerHandle {
    seq: u64,
    handle: JoinHandle<()>,
}

impl TimerHandle {
    pub fn new(seq: u64, handle: JoinHandle<()>) -> Self {
        Self { seq, handle }
    }

    /// Sequence number identifying this particular scheduling
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Abort the timer task
    pub fn cancel(&self) {
        self.handle.abort();
    }
}

/// The exclusive timer slots owned by the session manager
///
/// At most one timer of each kind exists at a time: arming a slot cancels
/// whatever was scheduled there before. The set tracks the generation of
/// the session its slots belong to; arming against any other generation is
/// refused, so a caller that observed a superseded session can never
/// displace the live session's timers.
#[derive(Debug, Default)]
pub struct TimerSet {
    generation: u64,
    warning: Option<TimerHandle>,
    inactivity: Option<TimerHandle>,
    absolute: Option<TimerHandle>,
    refresh: Option<TimerHandle>,
}

impl TimerSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, kind: TimerKind) -> &mut Option<TimerHandle> {
        match kind {
            TimerKind::Warning => &mut self.warning,
            TimerKind::Inactivity => &mut self.inactivity,
            TimerKind::Absolute => &mut self.absolute,
            TimerKind::Refresh => &mut self.refresh,
        }
    }

    /// Cancel every slot and move the set to a new session generation
    ///
    /// Must run under the same lock that guards arming, on session start
    /// and on teardown; any arm still carrying the previous generation is
    /// refused afterwards.
    pub fn advance_generation(&mut self, generation: u64) {
        self.generation = generation;
        self.cancel_all();
    }

    /// Arm a slot, cancelling any previously scheduled timer of that kind
    ///
    /// Returns false and aborts the incoming handle when `generation` is
    /// not the set's current one.
    pub fn arm(&mut self, kind: TimerKind, generation: u64, handle: TimerHandle) -> bool {
        if generation != self.generation {
            handle.cancel();
            return false;
        }
        let slot = self.slot_mut(kind);
        if let Some(previous) = slot.take() {
            previous.cancel();
        }
        *slot = Some(handle);
        true
    }

    /// Clear a slot without aborting, but only if the firing timer still
    /// owns it
    ///
    /// Returns false when the slot was rescheduled or cancelled since this
    /// timer was armed; the caller must then treat its deadline as stale.
    pub fn disarm(&mut self, kind: TimerKind, seq: u64) -> bool {
        let slot = self.slot_mut(kind);
        match slot {
            Some(handle) if handle.seq() == seq => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    /// Cancel and clear every slot
    pub fn cancel_all(&mut self) {
        for kind in [
            TimerKind::Warning,
            TimerKind::Inactivity,
            TimerKind::Absolute,
            TimerKind::Refresh,
        ] {
            if let Some(handle) = self.slot_mut(kind).take() {
                handle.cancel();
            }
        }
    }

    /// Number of currently armed slots
    pub fn armed_count(&self) -> usize {
        [
            self.warning.as_ref(),
            self.inactivity.as_ref(),
            self.absolute.as_ref(),
            self.refresh.as_ref(),
        ]
        .iter()
        .filter(|slot| slot.is_some())
        .count()
    }
}
