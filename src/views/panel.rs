use iced::widget::text::Shaping;
use iced::widget::{column, container, mouse_area, row, space, text};
use iced::{Element, Font, Length, mouse};

use crate::app::{App, Message};
use crate::config::MediaType;
use crate::util::truncate_str;

const MAX_MEDIA_NAME: usize = 34;

impl App {
    pub(crate) fn view_panel(&self) -> Element<'_, Message> {
        let colors = &self.colors;
        let mono = Font::MONOSPACE;
        let shaped = Shaping::Advanced;

        let header = row![
            text("restwall")
                .size(colors.title_size)
                .color(colors.text)
                .font(mono),
            space::horizontal(),
            text(self.schedule.phase().label())
                .size(colors.body_size)
                .color(colors.muted)
                .font(mono),
        ];

        // --- Duration adjusters ---

        let work_row = row![
            text("work")
                .size(colors.body_size)
                .color(colors.muted)
                .font(mono),
            space::horizontal(),
            mouse_area(
                text("[-]")
                    .size(colors.body_size)
                    .color(colors.accent)
                    .font(mono)
            )
            .on_press(Message::AdjustWork(-1))
            .interaction(mouse::Interaction::Pointer),
            text(format!(" {:>3} min ", self.config.work_duration))
                .size(colors.body_size)
                .color(colors.text)
                .font(mono),
            mouse_area(
                text("[+]")
                    .size(colors.body_size)
                    .color(colors.accent)
                    .font(mono)
            )
            .on_press(Message::AdjustWork(1))
            .interaction(mouse::Interaction::Pointer),
        ];

        let break_row = row![
            text("break")
                .size(colors.body_size)
                .color(colors.muted)
                .font(mono),
            space::horizontal(),
            mouse_area(
                text("[-]")
                    .size(colors.body_size)
                    .color(colors.accent)
                    .font(mono)
            )
            .on_press(Message::AdjustBreak(-1))
            .interaction(mouse::Interaction::Pointer),
            text(format!(" {:>3} min ", self.config.break_duration))
                .size(colors.body_size)
                .color(colors.text)
                .font(mono),
            mouse_area(
                text("[+]")
                    .size(colors.body_size)
                    .color(colors.accent)
                    .font(mono)
            )
            .on_press(Message::AdjustBreak(1))
            .interaction(mouse::Interaction::Pointer),
        ];

        // --- Media selection ---

        let other_type = match self.config.media_type {
            MediaType::Image => MediaType::Video,
            MediaType::Video => MediaType::Image,
        };
        let file_name = self
            .config
            .media_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "(none)".to_string());
        let media_row = row![
            mouse_area(
                text(format!("[{}]", self.config.media_type.label()))
                    .size(colors.body_size)
                    .color(colors.accent)
                    .font(mono)
            )
            .on_press(Message::SetMediaType(other_type))
            .interaction(mouse::Interaction::Pointer),
            text(format!(" {}", truncate_str(&file_name, MAX_MEDIA_NAME)))
                .size(colors.body_size)
                .color(colors.text)
                .font(mono)
                .shaping(shaped),
        ];

        // --- Actions ---

        let toggle_label = if self.schedule.is_running() {
            "stop focus"
        } else {
            "start focus"
        };
        let toggle_button = mouse_area(
            container(
                text(toggle_label)
                    .size(colors.body_size)
                    .color(colors.accent)
                    .font(mono),
            )
            .style(colors.hover_style())
            .padding(iced::Padding {
                top: 6.0,
                right: 14.0,
                bottom: 6.0,
                left: 14.0,
            }),
        )
        .on_press(Message::ToggleSession)
        .interaction(mouse::Interaction::Pointer);

        let preview_button = mouse_area(
            container(
                text("preview")
                    .size(colors.body_size)
                    .color(colors.muted)
                    .font(mono),
            )
            .style(colors.hover_style())
            .padding(iced::Padding {
                top: 6.0,
                right: 14.0,
                bottom: 6.0,
                left: 14.0,
            }),
        )
        .on_press(Message::OpenPreview)
        .interaction(mouse::Interaction::Pointer);

        let actions = row![toggle_button, text("  "), preview_button];

        let mut main_col = column![
            header,
            space::Space::new().height(14),
            work_row,
            break_row,
            space::Space::new().height(10),
            media_row,
        ]
        .width(Length::Fill)
        .height(Length::Fill);

        if let Some(ref notice) = self.panel_notice {
            main_col = main_col.push(
                mouse_area(
                    text(notice.as_str())
                        .size(colors.body_size * 0.9)
                        .color(colors.error)
                        .font(mono)
                        .shaping(shaped),
                )
                .on_press(Message::DismissNotice),
            );
        }

        main_col = main_col.push(space::vertical());
        main_col = main_col.push(actions);

        let info_row = row![
            space::horizontal(),
            text(format!(
                "v{} {}",
                env!("RESTWALL_VERSION"),
                env!("RESTWALL_COMMIT")
            ))
            .size(colors.info_size)
            .color(colors.muted)
            .font(mono),
        ];
        main_col = main_col.push(info_row);

        container(main_col)
            .style(colors.panel_style())
            .padding(20)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}
