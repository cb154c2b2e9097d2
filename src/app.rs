use std::path::PathBuf;
use std::time::Duration;

use iced::keyboard::{Key, Modifiers};
use iced::{Color, Element, Subscription, Task};
use iced_layershell::build_pattern::daemon;
use iced_layershell::settings::{LayerShellSettings, StartMode};
use iced_layershell::to_layer_message;

use crate::config::{Config, MediaType};
use crate::countdown::CountdownState;
use crate::ipc;
use crate::media::{self, FALLBACK_SCREEN};
use crate::overlay::{CloseRequest, OverlayState};
use crate::schedule::{HostNotice, Schedule, TimerToken, Transition};
use crate::surface::{self, IcedId, LayerShellSurface, SurfaceBinding, TopmostFocusedSurface};
use crate::theme::{self, ThemeColors, ThemeMode};
use crate::warning::WarningState;

/// Deferred hop that lets the compositor settle before takeover surfaces
/// are re-established after a focus loss.
const SETTLE_DELAY_MS: u64 = 100;

const MAX_SESSION_MINUTES: i64 = 600;

/// Which overlay instance a deferred callback was aimed at. The session
/// overlay and a preview are fully independent instances with independent
/// guard counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OverlayTarget {
    Session,
    Preview,
}

pub(crate) struct App {
    pub(crate) config: Config,
    pub(crate) schedule: Schedule,
    /// Live control-panel surface, if any.
    pub(crate) panel_id: Option<IcedId>,
    /// Whether the user wants the panel visible. Breaks and previews hide
    /// the surface regardless; this flag decides if it comes back after.
    pub(crate) panel_visible: bool,
    /// Host close flag: false while a break is enforced.
    pub(crate) can_close: bool,
    /// One-line validation feedback shown on the panel (wrong media
    /// extension etc.).
    pub(crate) panel_notice: Option<String>,
    pub(crate) countdown: Option<CountdownState>,
    pub(crate) warning: Option<WarningState>,
    pub(crate) overlay: Option<OverlayState>,
    pub(crate) preview: Option<OverlayState>,
    pub(crate) colors: ThemeColors,
    pub(crate) target_output: Option<String>,
}

#[to_layer_message(multi)]
#[derive(Debug, Clone)]
pub(crate) enum Message {
    // Session control (panel buttons and ctl socket)
    StartSession,
    StopSession,
    ToggleSession,
    PanelToggle,
    OpenPreview,
    Quit,
    ScreenCycle,
    ScreenSet(String),
    // Settings
    SetWorkMinutes(u32),
    SetBreakMinutes(u32),
    SetWarningSeconds(u32),
    AdjustWork(i64),
    AdjustBreak(i64),
    SetMediaType(MediaType),
    SetMediaPath(PathBuf),
    DismissNotice,
    // Timers
    TimerFired(TimerToken),
    SecondTick,
    FocusPoll,
    PreviewTimeout(u64),
    VideoStart(OverlayTarget, u64),
    RefocusSettled(u64),
    // Video pipe
    VideoFrame(iced::widget::image::Handle),
    VideoFailed,
    // Window events
    KeyPressed(Key, Modifiers),
    SurfaceFocused(IcedId),
    SurfaceUnfocused(IcedId),
    SurfaceCloseRequested(IcedId),
}

pub(crate) fn run() -> Result<(), iced_layershell::Error> {
    eprintln!(
        "[restwall] v{} ({}) starting",
        env!("RESTWALL_VERSION"),
        env!("RESTWALL_COMMIT")
    );

    let settings = LayerShellSettings {
        start_mode: StartMode::Background,
        ..Default::default()
    };

    daemon(App::new, App::namespace, App::update, App::view)
        .style(App::style)
        .subscription(App::subscription)
        .layer_settings(settings)
        .run()
}

fn on_key(key: Key, modifiers: Modifiers) -> Option<Message> {
    Some(Message::KeyPressed(key, modifiers))
}

fn window_event(
    event: iced::Event,
    _status: iced::event::Status,
    id: IcedId,
) -> Option<Message> {
    match event {
        iced::Event::Window(iced::window::Event::Focused) => Some(Message::SurfaceFocused(id)),
        iced::Event::Window(iced::window::Event::Unfocused) => {
            Some(Message::SurfaceUnfocused(id))
        }
        iced::Event::Window(iced::window::Event::CloseRequested) => {
            Some(Message::SurfaceCloseRequested(id))
        }
        _ => None,
    }
}

impl App {
    fn new() -> (Self, Task<Message>) {
        let config = Config::load();
        let schedule = Schedule::new(
            config.work_duration,
            config.break_duration,
            config.warning_time,
        );
        // Theme: RESTWALL_THEME env var, else follow the system.
        let theme_mode = match std::env::var("RESTWALL_THEME").as_deref() {
            Ok("dark") => ThemeMode::Dark,
            Ok("light") => ThemeMode::Light,
            _ => ThemeMode::Auto,
        };
        let colors = theme::resolve(theme_mode);
        eprintln!(
            "[restwall] theme: {}",
            if colors.is_dark { "dark" } else { "light" }
        );

        // Default output: RESTWALL_SCREEN env var, else whatever the
        // compositor picks.
        let target_output = std::env::var("RESTWALL_SCREEN")
            .ok()
            .filter(|s| !s.is_empty());
        if let Some(ref name) = target_output {
            eprintln!("[restwall] target screen: {name} (from RESTWALL_SCREEN)");
        }

        let (id, task) =
            Message::layershell_open(surface::panel_settings(target_output.as_deref()));
        eprintln!("[restwall] booting with panel (surface {id})");
        (
            Self {
                config,
                schedule,
                panel_id: Some(id),
                panel_visible: true,
                can_close: true,
                panel_notice: None,
                countdown: None,
                warning: None,
                overlay: None,
                preview: None,
                colors,
                target_output,
            },
            task,
        )
    }

    fn namespace() -> String {
        String::from("restwall")
    }

    // --- Panel surface helpers ---

    fn hide_panel(&mut self) -> Task<Message> {
        if let Some(id) = self.panel_id.take() {
            Task::done(Message::RemoveWindow(id))
        } else {
            Task::none()
        }
    }

    fn show_panel(&mut self) -> Task<Message> {
        if self.panel_id.is_some() {
            return Task::none();
        }
        let (id, task) =
            Message::layershell_open(surface::panel_settings(self.target_output.as_deref()));
        self.panel_id = Some(id);
        task
    }

    /// Restore the panel after a break or preview, if the user wants it.
    fn restore_panel(&mut self) -> Task<Message> {
        if self.panel_visible && self.overlay.is_none() && self.preview.is_none() {
            self.show_panel()
        } else {
            Task::none()
        }
    }

    // --- Overlay creation ---

    /// One fullscreen surface per output; the first binding holds the
    /// keyboard grab. Previews cover the primary output only. `refocus`
    /// marks a recreation forced by focus loss rather than a fresh open.
    fn create_overlay_surfaces(
        &self,
        preview: bool,
        refocus: bool,
    ) -> (Vec<SurfaceBinding>, Vec<Task<Message>>) {
        let provider = LayerShellSurface;
        let primary_settings = |output: Option<&str>| {
            if refocus {
                provider.force_focus(output)
            } else {
                provider.show_fullscreen_on(output, true)
            }
        };
        let outputs = surface::enumerate_outputs();
        let mut bindings = Vec::new();
        let mut tasks = Vec::new();

        if outputs.is_empty() {
            let (id, task) = Message::layershell_open(primary_settings(None));
            bindings.push(SurfaceBinding { output: None, id });
            tasks.push(task);
            return (bindings, tasks);
        }

        let primary = surface::pick_primary(&outputs, self.target_output.as_deref())
            .map(str::to_string);
        if let Some(ref name) = primary {
            let (id, task) = Message::layershell_open(primary_settings(Some(name)));
            bindings.push(SurfaceBinding {
                output: Some(name.clone()),
                id,
            });
            tasks.push(task);
        }
        if !preview {
            for name in outputs
                .iter()
                .filter(|name| Some(name.as_str()) != primary.as_deref())
            {
                // Cover surfaces: no keyboard grab, but they still swallow
                // pointer input on their screen.
                let mut settings = provider.show_fullscreen_on(Some(name), false);
                provider.set_input_passthrough(&mut settings, false);
                let (id, task) = Message::layershell_open(settings);
                bindings.push(SurfaceBinding {
                    output: Some(name.clone()),
                    id,
                });
                tasks.push(task);
            }
        }
        (bindings, tasks)
    }

    fn open_overlay(&mut self, preview: bool) -> Task<Message> {
        let loaded = media::load(&self.config, FALLBACK_SCREEN);
        let (bindings, mut tasks) = self.create_overlay_surfaces(preview, false);
        let state = OverlayState::new(&self.config, preview, bindings, loaded);
        let guard = state.guard();
        let target = if preview {
            OverlayTarget::Preview
        } else {
            OverlayTarget::Session
        };

        if state.video_playing {
            let delay = Duration::from_millis(self.config.video_start_delay);
            tasks.push(Task::perform(ipc::after(delay), move |_| {
                Message::VideoStart(target, guard)
            }));
        }
        if preview {
            let delay = Duration::from_millis(self.config.preview_duration);
            tasks.push(Task::perform(ipc::after(delay), move |_| {
                Message::PreviewTimeout(guard)
            }));
            self.preview = Some(state);
            let hide = self.hide_panel();
            tasks.push(hide);
            eprintln!("[restwall] preview open");
        } else {
            self.overlay = Some(state);
        }
        Task::batch(tasks)
    }

    /// Tear down the session overlay and emit `closed` once. Does not touch
    /// the schedule; the break keeps running against a bare screen when the
    /// hotkey dismissed the overlay early.
    fn close_overlay(&mut self) -> Task<Message> {
        let Some(mut state) = self.overlay.take() else {
            return Task::none();
        };
        if state.begin_close() {
            eprintln!("[restwall] overlay closed");
        }
        Task::batch(
            state
                .surface_ids()
                .into_iter()
                .map(|id| Task::done(Message::RemoveWindow(id))),
        )
    }

    fn close_preview(&mut self) -> Task<Message> {
        let Some(mut state) = self.preview.take() else {
            return Task::none();
        };
        if state.begin_close() {
            eprintln!("[restwall] preview closed");
        }
        let mut tasks: Vec<Task<Message>> = state
            .surface_ids()
            .into_iter()
            .map(|id| Task::done(Message::RemoveWindow(id)))
            .collect();
        let restore = self.restore_panel();
        tasks.push(restore);
        Task::batch(tasks)
    }

    // --- Schedule plumbing ---

    fn apply_transition(&mut self, transition: Transition) -> Task<Message> {
        eprintln!(
            "[restwall] {} -> {}",
            transition.from.label(),
            transition.to.label()
        );
        let mut tasks = Vec::new();

        // Teardown first: the outgoing phase's window is gone before the
        // next phase's window is created.
        if transition.close_countdown {
            if let Some(state) = self.countdown.take() {
                tasks.push(Task::done(Message::RemoveWindow(state.surface_id)));
            }
        }
        if transition.close_warning {
            if let Some(state) = self.warning.take() {
                tasks.push(Task::done(Message::RemoveWindow(state.surface_id)));
            }
        }
        if transition.close_overlay {
            tasks.push(self.close_overlay());
        }

        match transition.notice {
            Some(HostNotice::BreakStarted) => {
                self.can_close = false;
                let hide = self.hide_panel();
                tasks.push(hide);
            }
            Some(HostNotice::BreakFinished) => {
                self.can_close = true;
                let restore = self.restore_panel();
                tasks.push(restore);
            }
            None => {}
        }

        if transition.open_countdown {
            let (id, task) =
                Message::layershell_open(surface::countdown_settings(self.target_output.as_deref()));
            self.countdown = Some(CountdownState::new(id, self.schedule.work_minutes()));
            tasks.push(task);
        }
        if transition.open_warning {
            let (id, task) =
                Message::layershell_open(surface::warning_settings(self.target_output.as_deref()));
            self.warning = Some(WarningState::new(id, self.schedule.warning_seconds()));
            tasks.push(task);
        }
        if transition.open_overlay {
            tasks.push(self.open_overlay(false));
        }

        if let Some((token, delay)) = transition.arm {
            tasks.push(Task::perform(ipc::after(delay), move |_| {
                Message::TimerFired(token)
            }));
        }
        Task::batch(tasks)
    }

    fn overlay_for(&mut self, target: OverlayTarget) -> Option<&mut OverlayState> {
        match target {
            OverlayTarget::Session => self.overlay.as_mut(),
            OverlayTarget::Preview => self.preview.as_mut(),
        }
    }

    /// Queue the settle-then-refocus recovery for the session overlay.
    fn queue_refocus(&mut self) -> Task<Message> {
        let Some(overlay) = self.overlay.as_mut() else {
            return Task::none();
        };
        if !overlay.needs_refocus() {
            return Task::none();
        }
        overlay.queue_refocus();
        let guard = overlay.guard();
        Task::perform(
            ipc::after(Duration::from_millis(SETTLE_DELAY_MS)),
            move |_| Message::RefocusSettled(guard),
        )
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::StartSession => match self.schedule.start() {
                Some(transition) => self.apply_transition(transition),
                None => Task::none(), // already running
            },
            Message::StopSession => match self.schedule.stop() {
                Some(transition) => {
                    let task = self.apply_transition(transition);
                    self.can_close = true;
                    let restore = self.restore_panel();
                    Task::batch([task, restore])
                }
                None => Task::none(),
            },
            Message::ToggleSession => {
                if self.schedule.is_running() {
                    self.update(Message::StopSession)
                } else {
                    self.update(Message::StartSession)
                }
            }
            Message::TimerFired(token) => match self.schedule.timer_fired(token) {
                Some(transition) => self.apply_transition(transition),
                None => Task::none(), // stale token, canceled before firing
            },
            Message::SecondTick => {
                if let Some(warning) = &mut self.warning {
                    if !warning.finished() {
                        warning.tick();
                    }
                }
                if let Some(countdown) = &mut self.countdown {
                    countdown.tick();
                }
                Task::none()
            }
            Message::VideoStart(target, guard) => {
                if let Some(overlay) = self.overlay_for(target) {
                    overlay.start_playback(guard);
                }
                Task::none()
            }
            Message::VideoFrame(handle) => {
                if let Some(overlay) = self.overlay.as_mut().filter(|o| o.video_playing) {
                    overlay.set_frame(handle);
                } else if let Some(preview) =
                    self.preview.as_mut().filter(|p| p.video_playing)
                {
                    preview.set_frame(handle);
                }
                Task::none()
            }
            Message::VideoFailed => {
                if let Some(overlay) = self.overlay.as_mut().filter(|o| o.video_playing) {
                    overlay.video_failed(media::fallback_image(FALLBACK_SCREEN));
                } else if let Some(preview) =
                    self.preview.as_mut().filter(|p| p.video_playing)
                {
                    preview.video_failed(media::fallback_image(FALLBACK_SCREEN));
                }
                Task::none()
            }
            Message::FocusPoll => self.queue_refocus(),
            Message::SurfaceFocused(id) => {
                if let Some(overlay) = &mut self.overlay {
                    if overlay.contains(id) {
                        overlay.mark_focused();
                    }
                }
                Task::none()
            }
            Message::SurfaceUnfocused(id) => {
                let lost = self
                    .overlay
                    .as_mut()
                    .filter(|o| o.contains(id))
                    .map(|o| o.mark_unfocused())
                    .is_some();
                if lost {
                    self.queue_refocus()
                } else {
                    Task::none()
                }
            }
            Message::RefocusSettled(guard) => {
                let live = self
                    .overlay
                    .as_ref()
                    .is_some_and(|o| o.guard_live(guard));
                if !live {
                    return Task::none();
                }
                // Recreate the whole surface stack on whatever outputs exist
                // now; this both forces focus back and re-covers screens
                // that appeared since the break started.
                let old_ids = self
                    .overlay
                    .as_ref()
                    .map(OverlayState::surface_ids)
                    .unwrap_or_default();
                let (bindings, open_tasks) = self.create_overlay_surfaces(false, true);
                let mut tasks: Vec<Task<Message>> = old_ids
                    .into_iter()
                    .map(|id| Task::done(Message::RemoveWindow(id)))
                    .collect();
                let count = bindings.len();
                if let Some(overlay) = self.overlay.as_mut() {
                    overlay.rebind(bindings);
                }
                tasks.extend(open_tasks);
                eprintln!("[restwall] overlay refocus ({count} surfaces)");
                Task::batch(tasks)
            }
            Message::PreviewTimeout(guard) => {
                let live = self
                    .preview
                    .as_ref()
                    .is_some_and(|p| p.guard_live(guard));
                if live && self.preview.as_ref().is_some_and(|p| {
                    p.close_permitted(CloseRequest::PreviewTimeout)
                }) {
                    self.close_preview()
                } else {
                    Task::none()
                }
            }
            Message::KeyPressed(key, modifiers) => {
                // Preview first: any key dismisses it.
                if let Some(preview) = &self.preview {
                    let request = preview.key_request(&key, modifiers);
                    if preview.close_permitted(request) {
                        return self.close_preview();
                    }
                    return Task::none();
                }
                if let Some(overlay) = &self.overlay {
                    let request = overlay.key_request(&key, modifiers);
                    if overlay.close_permitted(request) {
                        eprintln!("[restwall] overlay dismissed by hotkey");
                        return self.close_overlay();
                    }
                }
                Task::none()
            }
            Message::SurfaceCloseRequested(id) => {
                if self
                    .overlay
                    .as_ref()
                    .is_some_and(|o| o.contains(id))
                {
                    let permitted = self
                        .overlay
                        .as_ref()
                        .is_some_and(|o| o.close_permitted(CloseRequest::WindowManager));
                    if permitted {
                        return self.close_overlay();
                    }
                    eprintln!("[restwall] overlay close rejected");
                    return Task::none();
                }
                if self
                    .preview
                    .as_ref()
                    .is_some_and(|p| p.contains(id))
                {
                    return self.close_preview();
                }
                if self.panel_id == Some(id) {
                    if self.can_close {
                        self.panel_visible = false;
                        return self.hide_panel();
                    }
                    eprintln!("[restwall] panel close rejected during break");
                }
                Task::none()
            }
            Message::PanelToggle => {
                if self.panel_id.is_some() {
                    self.panel_visible = false;
                    self.hide_panel()
                } else {
                    self.panel_visible = true;
                    self.restore_panel()
                }
            }
            Message::OpenPreview => {
                // One preview at a time, and never on top of a running break.
                if self.preview.is_some() || self.overlay.is_some() {
                    return Task::none();
                }
                self.open_overlay(true)
            }
            Message::SetWorkMinutes(minutes) => {
                let minutes = minutes.clamp(1, MAX_SESSION_MINUTES as u32);
                self.config.work_duration = minutes;
                self.schedule.set_work_minutes(minutes);
                self.config.save();
                Task::none()
            }
            Message::SetBreakMinutes(minutes) => {
                let minutes = minutes.clamp(1, MAX_SESSION_MINUTES as u32);
                self.config.break_duration = minutes;
                self.schedule.set_break_minutes(minutes);
                self.config.save();
                Task::none()
            }
            Message::SetWarningSeconds(seconds) => {
                self.config.warning_time = seconds;
                self.schedule.set_warning_seconds(seconds);
                self.config.save();
                Task::none()
            }
            Message::AdjustWork(delta) => {
                let minutes = (i64::from(self.config.work_duration) + delta)
                    .clamp(1, MAX_SESSION_MINUTES) as u32;
                self.update(Message::SetWorkMinutes(minutes))
            }
            Message::AdjustBreak(delta) => {
                let minutes = (i64::from(self.config.break_duration) + delta)
                    .clamp(1, MAX_SESSION_MINUTES) as u32;
                self.update(Message::SetBreakMinutes(minutes))
            }
            Message::SetMediaType(media_type) => {
                self.config.media_type = media_type;
                self.config.save();
                self.panel_notice = if self.config.matches_media_type(&self.config.media_path) {
                    None
                } else {
                    Some(media_mismatch_notice(media_type))
                };
                Task::none()
            }
            Message::SetMediaPath(path) => {
                if self.config.matches_media_type(&path) {
                    eprintln!("[restwall] media -> {}", path.display());
                    self.config.media_path = path;
                    self.config.save();
                    self.panel_notice = None;
                } else {
                    self.panel_notice = Some(media_mismatch_notice(self.config.media_type));
                }
                Task::none()
            }
            Message::DismissNotice => {
                self.panel_notice = None;
                Task::none()
            }
            Message::ScreenCycle => {
                let outputs = surface::enumerate_outputs();
                if outputs.is_empty() {
                    eprintln!("[restwall] screen cycle: no outputs found (is wlr-randr installed?)");
                    return Task::none();
                }
                let current_idx = self
                    .target_output
                    .as_ref()
                    .and_then(|name| outputs.iter().position(|o| o == name));
                let next_idx = match current_idx {
                    Some(idx) => (idx + 1) % outputs.len(),
                    None => 0,
                };
                let next_output = outputs[next_idx].clone();
                eprintln!(
                    "[restwall] screen -> {} ({}/{})",
                    next_output,
                    next_idx + 1,
                    outputs.len()
                );
                self.target_output = Some(next_output);
                self.recreate_panel()
            }
            Message::ScreenSet(ref name) => {
                self.target_output = Some(name.clone());
                eprintln!("[restwall] screen -> {name}");
                self.recreate_panel()
            }
            Message::Quit => {
                eprintln!("[restwall] quitting");
                std::process::exit(0);
            }
            _ => Task::none(),
        }
    }

    /// Move the panel to the current target output.
    fn recreate_panel(&mut self) -> Task<Message> {
        if self.panel_id.is_none() {
            return Task::none();
        }
        let hide = self.hide_panel();
        let show = self.show_panel();
        Task::batch([hide, show])
    }

    fn view(&self, window_id: IcedId) -> Element<'_, Message> {
        if let Some(ref overlay) = self.overlay {
            if overlay.contains(window_id) {
                return self.view_overlay(overlay);
            }
        }
        if let Some(ref preview) = self.preview {
            if preview.contains(window_id) {
                return self.view_overlay(preview);
            }
        }
        if let Some(ref warning) = self.warning {
            if warning.surface_id == window_id {
                return self.view_warning(warning);
            }
        }
        if let Some(ref countdown) = self.countdown {
            if countdown.surface_id == window_id {
                return self.view_countdown(countdown);
            }
        }
        self.view_panel()
    }

    fn subscription(state: &Self) -> Subscription<Message> {
        let mut subs = vec![Subscription::run(ipc::socket_listener)];

        if state.warning.is_some() || state.countdown.is_some() {
            subs.push(Subscription::run(ipc::second_stream));
        }
        if state.overlay.is_some() {
            // Focus-poll backstop: reasserts the takeover even when the
            // compositor never delivered an unfocus event.
            subs.push(Subscription::run(ipc::focus_poll_stream));
        }
        let video_source = state
            .overlay
            .as_ref()
            .filter(|o| o.is_playing())
            .and_then(|o| o.video_source.clone())
            .or_else(|| {
                state
                    .preview
                    .as_ref()
                    .filter(|p| p.is_playing())
                    .and_then(|p| p.video_source.clone())
            });
        if let Some(source) = video_source {
            subs.push(Subscription::run_with(source, media::video_stream));
        }
        if state.overlay.is_some() || state.preview.is_some() {
            subs.push(iced::keyboard::on_key_press(on_key));
        }
        subs.push(iced::event::listen_with(window_event));

        Subscription::batch(subs)
    }

    fn style(&self, _theme: &iced::Theme) -> iced::theme::Style {
        iced::theme::Style {
            background_color: Color::TRANSPARENT,
            text_color: self.colors.text,
        }
    }
}

fn media_mismatch_notice(media_type: MediaType) -> String {
    let expected = media_type.extensions().join(", ");
    format!(
        "file does not match {} mode (expected: {expected})",
        media_type.label()
    )
}
