use iced::widget::{container, text};
use iced::{Color, Element, Font, Length};

use crate::app::{App, Message};
use crate::countdown::CountdownState;
use crate::warning::WarningState;

impl App {
    /// The pre-break notice pill. The surface itself never takes focus; the
    /// pill is just a label on a dim rounded backdrop.
    pub(crate) fn view_warning<'a>(&'a self, state: &'a WarningState) -> Element<'a, Message> {
        let pill = container(
            text(state.text())
                .size(self.colors.body_size)
                .color(Color::WHITE)
                .font(Font::MONOSPACE),
        )
        .style(self.colors.pill_style())
        .padding(iced::Padding {
            top: 10.0,
            right: 20.0,
            bottom: 10.0,
            left: 20.0,
        });

        container(pill).center(Length::Fill).into()
    }

    /// The work-phase MM:SS readout.
    pub(crate) fn view_countdown<'a>(&'a self, state: &'a CountdownState) -> Element<'a, Message> {
        let pill = container(
            text(state.clock())
                .size(self.colors.clock_size)
                .color(self.colors.accent)
                .font(Font::MONOSPACE),
        )
        .style(self.colors.pill_style())
        .padding(iced::Padding {
            top: 8.0,
            right: 18.0,
            bottom: 8.0,
            left: 18.0,
        });

        container(pill).center(Length::Fill).into()
    }
}
