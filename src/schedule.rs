use std::time::Duration;

/// Where the session currently is in the work/break cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Phase {
    #[default]
    Idle,
    Working,
    Warning,
    Break,
}

impl Phase {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Working => "working",
            Phase::Warning => "warning",
            Phase::Break => "break",
        }
    }
}

/// One logical timer slot. At most one live token exists per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerRole {
    Work,
    Warning,
    Break,
}

/// Opaque handle for a scheduled one-shot firing. A token is only honored
/// while its epoch matches the schedule's; arming a timer or stopping the
/// session bumps the epoch, so every earlier token is dead before the call
/// returns — a stale firing cannot produce side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TimerToken {
    pub(crate) role: TimerRole,
    epoch: u64,
}

/// Host-facing notifications, fired exactly once per break entry/exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HostNotice {
    BreakStarted,
    BreakFinished,
}

/// What a phase change asks the window layer to do. The app applies closes
/// before opens, so the outgoing phase's window is torn down before the next
/// phase's window exists.
#[derive(Debug, Default)]
pub(crate) struct Transition {
    pub(crate) from: Phase,
    pub(crate) to: Phase,
    pub(crate) close_countdown: bool,
    pub(crate) close_warning: bool,
    pub(crate) close_overlay: bool,
    pub(crate) open_countdown: bool,
    pub(crate) open_warning: bool,
    pub(crate) open_overlay: bool,
    pub(crate) arm: Option<(TimerToken, Duration)>,
    pub(crate) notice: Option<HostNotice>,
}

/// The break state machine. Owns the phase, the timer epoch, and the session
/// durations; never touches surfaces itself. Operations return a
/// [`Transition`] diff for the app layer to apply, or `None` when the call
/// is a no-op (re-entrant start, stop while idle, stale token).
pub(crate) struct Schedule {
    phase: Phase,
    epoch: u64,
    work_minutes: u32,
    break_minutes: u32,
    warning_seconds: u32,
}

impl Schedule {
    pub(crate) fn new(work_minutes: u32, break_minutes: u32, warning_seconds: u32) -> Self {
        Self {
            phase: Phase::Idle,
            epoch: 0,
            work_minutes: work_minutes.max(1),
            break_minutes: break_minutes.max(1),
            warning_seconds,
        }
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn is_running(&self) -> bool {
        self.phase != Phase::Idle
    }

    pub(crate) fn work_minutes(&self) -> u32 {
        self.work_minutes
    }

    pub(crate) fn break_minutes(&self) -> u32 {
        self.break_minutes
    }

    pub(crate) fn warning_seconds(&self) -> u32 {
        self.warning_seconds
    }

    // Duration setters only store the value; an armed timer keeps its
    // original delay and the new value is picked up at the next arm.

    pub(crate) fn set_work_minutes(&mut self, minutes: u32) {
        self.work_minutes = minutes.max(1);
    }

    pub(crate) fn set_break_minutes(&mut self, minutes: u32) {
        self.break_minutes = minutes.max(1);
    }

    pub(crate) fn set_warning_seconds(&mut self, seconds: u32) {
        self.warning_seconds = seconds;
    }

    /// Invalidate all outstanding tokens and issue a fresh one for `role`.
    fn arm(&mut self, role: TimerRole, delay: Duration) -> (TimerToken, Duration) {
        self.epoch += 1;
        (
            TimerToken {
                role,
                epoch: self.epoch,
            },
            delay,
        )
    }

    fn work_delay(&self) -> Duration {
        Duration::from_secs(u64::from(self.work_minutes) * 60)
    }

    fn break_delay(&self) -> Duration {
        Duration::from_secs(u64::from(self.break_minutes) * 60)
    }

    fn warning_delay(&self) -> Duration {
        Duration::from_secs(u64::from(self.warning_seconds))
    }

    /// Idle -> Working. No-op while a session is already running.
    pub(crate) fn start(&mut self) -> Option<Transition> {
        if self.phase != Phase::Idle {
            return None;
        }
        self.phase = Phase::Working;
        let arm = self.arm(TimerRole::Work, self.work_delay());
        Some(Transition {
            from: Phase::Idle,
            to: Phase::Working,
            open_countdown: true,
            arm: Some(arm),
            ..Transition::default()
        })
    }

    /// Any running phase -> Idle. Cancels every live token and closes every
    /// session window; emits no notice (stop is not a break completion).
    pub(crate) fn stop(&mut self) -> Option<Transition> {
        if self.phase == Phase::Idle {
            return None;
        }
        let from = self.phase;
        self.phase = Phase::Idle;
        self.epoch += 1;
        Some(Transition {
            from,
            to: Phase::Idle,
            close_countdown: from == Phase::Working,
            close_warning: from == Phase::Warning,
            close_overlay: from == Phase::Break,
            ..Transition::default()
        })
    }

    /// Deliver a one-shot firing. Returns `None` for any token whose epoch
    /// is stale or whose role does not belong to the current phase.
    pub(crate) fn timer_fired(&mut self, token: TimerToken) -> Option<Transition> {
        if token.epoch != self.epoch {
            return None;
        }
        match (self.phase, token.role) {
            (Phase::Working, TimerRole::Work) => {
                self.phase = Phase::Warning;
                let arm = self.arm(TimerRole::Warning, self.warning_delay());
                Some(Transition {
                    from: Phase::Working,
                    to: Phase::Warning,
                    close_countdown: true,
                    open_warning: true,
                    arm: Some(arm),
                    ..Transition::default()
                })
            }
            (Phase::Warning, TimerRole::Warning) => {
                self.phase = Phase::Break;
                let arm = self.arm(TimerRole::Break, self.break_delay());
                Some(Transition {
                    from: Phase::Warning,
                    to: Phase::Break,
                    close_warning: true,
                    open_overlay: true,
                    arm: Some(arm),
                    notice: Some(HostNotice::BreakStarted),
                    ..Transition::default()
                })
            }
            (Phase::Break, TimerRole::Break) => {
                self.phase = Phase::Working;
                let arm = self.arm(TimerRole::Work, self.work_delay());
                Some(Transition {
                    from: Phase::Break,
                    to: Phase::Working,
                    close_overlay: true,
                    open_countdown: true,
                    arm: Some(arm),
                    notice: Some(HostNotice::BreakFinished),
                    ..Transition::default()
                })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advance(schedule: &mut Schedule, token: TimerToken) -> Transition {
        schedule
            .timer_fired(token)
            .expect("live token must transition")
    }

    fn armed(transition: &Transition) -> TimerToken {
        transition.arm.expect("transition must arm a timer").0
    }

    #[test]
    fn start_enters_working_and_arms_work_timer() {
        let mut schedule = Schedule::new(25, 5, 10);
        let t = schedule.start().expect("start from idle");
        assert_eq!(t.from, Phase::Idle);
        assert_eq!(t.to, Phase::Working);
        assert!(t.open_countdown);
        assert!(t.notice.is_none());
        let (token, delay) = t.arm.unwrap();
        assert_eq!(token.role, TimerRole::Work);
        assert_eq!(delay, Duration::from_secs(25 * 60));
    }

    #[test]
    fn full_cycle_is_exactly_working_warning_break_working() {
        let mut schedule = Schedule::new(25, 5, 10);
        let t = schedule.start().unwrap();

        let t = advance(&mut schedule, armed(&t));
        assert_eq!(schedule.phase(), Phase::Warning);
        assert!(t.close_countdown);
        assert!(t.open_warning);
        assert!(t.notice.is_none());
        assert_eq!(t.arm.unwrap().1, Duration::from_secs(10));

        let t = advance(&mut schedule, armed(&t));
        assert_eq!(schedule.phase(), Phase::Break);
        assert!(t.close_warning);
        assert!(t.open_overlay);
        assert_eq!(t.notice, Some(HostNotice::BreakStarted));
        assert_eq!(t.arm.unwrap().1, Duration::from_secs(5 * 60));

        let t = advance(&mut schedule, armed(&t));
        assert_eq!(schedule.phase(), Phase::Working);
        assert!(t.close_overlay);
        assert!(t.open_countdown);
        assert_eq!(t.notice, Some(HostNotice::BreakFinished));
        assert_eq!(t.arm.unwrap().1, Duration::from_secs(25 * 60));
    }

    #[test]
    fn start_while_running_is_a_noop() {
        let mut schedule = Schedule::new(25, 5, 10);
        let t = schedule.start().unwrap();
        let live = armed(&t);
        assert!(schedule.start().is_none());
        assert_eq!(schedule.phase(), Phase::Working);
        // The original token is still the live one.
        assert!(schedule.timer_fired(live).is_some());
    }

    #[test]
    fn stop_cancels_pending_timer() {
        let mut schedule = Schedule::new(25, 5, 10);
        let t = schedule.start().unwrap();
        let token = armed(&t);
        let t = schedule.stop().expect("stop while working");
        assert_eq!(t.to, Phase::Idle);
        assert!(t.close_countdown);
        assert!(t.notice.is_none());
        // The previously armed timer firing afterwards is a no-op.
        assert!(schedule.timer_fired(token).is_none());
        assert_eq!(schedule.phase(), Phase::Idle);
    }

    #[test]
    fn stop_during_break_closes_overlay_without_finish_notice() {
        let mut schedule = Schedule::new(1, 1, 0);
        let t = schedule.start().unwrap();
        let t = advance(&mut schedule, armed(&t));
        let t = advance(&mut schedule, armed(&t));
        assert_eq!(schedule.phase(), Phase::Break);
        let break_token = armed(&t);

        let t = schedule.stop().unwrap();
        assert!(t.close_overlay);
        assert!(t.notice.is_none());
        assert!(schedule.timer_fired(break_token).is_none());
    }

    #[test]
    fn stop_is_idempotent() {
        let mut schedule = Schedule::new(25, 5, 10);
        assert!(schedule.stop().is_none());
        schedule.start().unwrap();
        assert!(schedule.stop().is_some());
        assert!(schedule.stop().is_none());
    }

    #[test]
    fn wrong_role_token_is_a_noop() {
        let mut schedule = Schedule::new(25, 5, 10);
        let t = schedule.start().unwrap();
        let mut token = armed(&t);
        token.role = TimerRole::Break;
        assert!(schedule.timer_fired(token).is_none());
        assert_eq!(schedule.phase(), Phase::Working);
    }

    #[test]
    fn rearming_invalidates_the_previous_token() {
        let mut schedule = Schedule::new(25, 5, 10);
        let t = schedule.start().unwrap();
        let work_token = armed(&t);
        let t = advance(&mut schedule, work_token);
        // The consumed work token must not fire the chain a second time.
        assert!(schedule.timer_fired(work_token).is_none());
        assert_eq!(schedule.phase(), Phase::Warning);
        assert!(schedule.timer_fired(armed(&t)).is_some());
    }

    #[test]
    fn duration_setters_apply_on_next_arm_only() {
        let mut schedule = Schedule::new(25, 5, 10);
        let t = schedule.start().unwrap();
        schedule.set_work_minutes(50);
        schedule.set_break_minutes(10);
        // In-flight work timer keeps its 25 min delay; nothing re-armed yet.
        assert_eq!(t.arm.unwrap().1, Duration::from_secs(25 * 60));
        let t = advance(&mut schedule, armed(&t));
        let t = advance(&mut schedule, armed(&t));
        assert_eq!(t.arm.unwrap().1, Duration::from_secs(10 * 60));
        let t = advance(&mut schedule, armed(&t));
        assert_eq!(t.arm.unwrap().1, Duration::from_secs(50 * 60));
    }

    #[test]
    fn zero_warning_time_still_passes_through_warning_phase() {
        let mut schedule = Schedule::new(25, 5, 0);
        let t = schedule.start().unwrap();
        let t = advance(&mut schedule, armed(&t));
        assert_eq!(schedule.phase(), Phase::Warning);
        assert_eq!(t.arm.unwrap().1, Duration::ZERO);
    }

    #[test]
    fn durations_are_clamped_to_at_least_one_minute() {
        let mut schedule = Schedule::new(0, 0, 10);
        assert_eq!(schedule.work_minutes(), 1);
        assert_eq!(schedule.break_minutes(), 1);
        schedule.set_work_minutes(0);
        assert_eq!(schedule.work_minutes(), 1);
    }

    // -----------------------------------------------------------------------
    // Window ledger replay: at most one instance of each window kind alive,
    // and creation never precedes the predecessor's teardown.
    // -----------------------------------------------------------------------

    #[derive(Default)]
    struct Ledger {
        countdown: u32,
        warning: u32,
        overlay: u32,
    }

    impl Ledger {
        fn apply(&mut self, t: &Transition) {
            // Closes first, mirroring the app layer's ordering.
            if t.close_countdown {
                assert_eq!(self.countdown, 1, "closing a countdown that is not open");
                self.countdown -= 1;
            }
            if t.close_warning {
                assert_eq!(self.warning, 1, "closing a warning that is not open");
                self.warning -= 1;
            }
            if t.close_overlay {
                assert_eq!(self.overlay, 1, "closing an overlay that is not open");
                self.overlay -= 1;
            }
            if t.open_countdown {
                self.countdown += 1;
            }
            if t.open_warning {
                self.warning += 1;
            }
            if t.open_overlay {
                self.overlay += 1;
            }
            assert!(self.countdown <= 1);
            assert!(self.warning <= 1);
            assert!(self.overlay <= 1);
        }
    }

    #[test]
    fn ledger_replay_keeps_single_instances_over_many_cycles() {
        let mut schedule = Schedule::new(25, 5, 10);
        let mut ledger = Ledger::default();
        let t = schedule.start().unwrap();
        ledger.apply(&t);
        let mut token = armed(&t);
        for _ in 0..12 {
            let t = advance(&mut schedule, token);
            ledger.apply(&t);
            token = armed(&t);
        }
        let t = schedule.stop().unwrap();
        ledger.apply(&t);
        assert_eq!(ledger.countdown + ledger.warning + ledger.overlay, 0);
    }
}
