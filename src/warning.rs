use crate::surface::IcedId;

/// The small pre-break notice. Lives exactly as long as the Warning phase;
/// the shared 1 s tick drives the countdown, and the schedule's warning
/// timer tears the window down on the same boundary the counter reaches
/// zero. It never takes keyboard focus (see `surface::warning_settings`).
pub(crate) struct WarningState {
    pub(crate) surface_id: IcedId,
    remaining: u32,
}

impl WarningState {
    pub(crate) fn new(surface_id: IcedId, seconds: u32) -> Self {
        Self {
            surface_id,
            remaining: seconds,
        }
    }

    /// One display-tick. Stops at zero.
    pub(crate) fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    pub(crate) fn remaining(&self) -> u32 {
        self.remaining
    }

    pub(crate) fn finished(&self) -> bool {
        self.remaining == 0
    }

    pub(crate) fn text(&self) -> String {
        warning_text(self.remaining)
    }
}

pub(crate) fn warning_text(remaining: u32) -> String {
    format!("Break starts in {remaining} seconds...")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warning(seconds: u32) -> WarningState {
        WarningState::new(IcedId::unique(), seconds)
    }

    #[test]
    fn seeds_from_configured_seconds() {
        let state = warning(10);
        assert_eq!(state.remaining(), 10);
        assert!(!state.finished());
        assert_eq!(state.text(), "Break starts in 10 seconds...");
    }

    #[test]
    fn ticks_down_to_zero_and_stops() {
        let mut state = warning(2);
        state.tick();
        assert_eq!(state.text(), "Break starts in 1 seconds...");
        state.tick();
        assert!(state.finished());
        state.tick();
        assert_eq!(state.remaining(), 0);
    }

    #[test]
    fn zero_seed_is_immediately_finished() {
        assert!(warning(0).finished());
    }
}
