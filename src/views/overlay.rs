use iced::widget::{column, container, image as iced_image, space, text};
use iced::{Background, Color, ContentFit, Element, Length};

use crate::app::{App, Message};
use crate::media::OverlayMedia;
use crate::overlay::OverlayState;

fn black_backdrop(_theme: &iced::Theme) -> iced::widget::container::Style {
    iced::widget::container::Style {
        background: Some(Background::Color(Color::BLACK)),
        ..Default::default()
    }
}

impl App {
    /// Fullscreen break surface: the decoded wallpaper or the current video
    /// frame, letterboxed on black. Previews get a one-line dismissal hint.
    pub(crate) fn view_overlay<'a>(&'a self, state: &'a OverlayState) -> Element<'a, Message> {
        let media: Element<'a, Message> = match &state.media {
            OverlayMedia::Image(handle) => iced_image(handle.clone())
                .content_fit(ContentFit::Contain)
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            // Video: the latest decoded frame; black until the first one
            // lands (the start delay covers the gap).
            OverlayMedia::Video { frame: Some(handle) } => iced_image(handle.clone())
                .content_fit(ContentFit::Contain)
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            _ => space::Space::new()
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
        };

        let content: Element<'a, Message> = if state.preview {
            let hint = text("preview - press any key to close")
                .size(self.colors.body_size)
                .color(self.colors.muted);
            column![
                media,
                container(hint)
                    .width(Length::Fill)
                    .align_x(iced::alignment::Horizontal::Center)
                    .padding(12),
            ]
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
        } else {
            media
        };

        container(content)
            .style(black_backdrop)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}
