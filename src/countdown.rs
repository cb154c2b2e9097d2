use crate::surface::IcedId;
use crate::util::format_clock;

/// Transparent MM:SS readout of the remaining work stretch, shown in the
/// top-right corner while the Working phase runs. Input passes straight
/// through it. The display runs on the shared 1 s tick and is independent
/// of the schedule's own work timer.
pub(crate) struct CountdownState {
    pub(crate) surface_id: IcedId,
    remaining: u32,
}

impl CountdownState {
    pub(crate) fn new(surface_id: IcedId, minutes: u32) -> Self {
        Self {
            surface_id,
            remaining: minutes.saturating_mul(60),
        }
    }

    pub(crate) fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    pub(crate) fn clock(&self) -> String {
        format_clock(self.remaining)
    }
}
