use iced::keyboard::{Key, Modifiers};

use crate::config::Config;
use crate::hotkey::Hotkey;
use crate::media::{LoadedMedia, OverlayMedia};
use crate::surface::{IcedId, SurfaceBinding};

/// Why someone is asking the overlay to close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CloseRequest {
    /// Compositor / window-manager initiated.
    WindowManager,
    /// The configured chord was pressed.
    Hotkey,
    /// Some other key was pressed (honored in preview mode only).
    AnyKey,
    /// The preview auto-close timer expired.
    PreviewTimeout,
}

/// Close policy. Preview instances close for any reason; a session overlay
/// closes only for the hotkey, and only when the config allows it. Everything
/// else is rejected and the overlay stays up — a policy decision, not an
/// error.
pub(crate) fn close_permitted(preview: bool, allow_close: bool, request: CloseRequest) -> bool {
    if preview {
        return true;
    }
    matches!(request, CloseRequest::Hotkey) && allow_close
}

/// A live break overlay (or a user-triggered preview of one). Owns one
/// surface per output — the first binding holds the keyboard grab, the rest
/// cover the remaining screens — plus the decoded media and the guard
/// counter that kills deferred callbacks (settle, video start, preview
/// timeout) once teardown begins.
pub(crate) struct OverlayState {
    pub(crate) surfaces: Vec<SurfaceBinding>,
    pub(crate) preview: bool,
    allow_close: bool,
    hotkey: Hotkey,
    pub(crate) media: OverlayMedia,
    pub(crate) video_playing: bool,
    /// Path fed to the ffmpeg frame stream while the video plays.
    pub(crate) video_source: Option<String>,
    playing: bool,
    focused: bool,
    refocus_queued: bool,
    guard: u64,
    closed_emitted: bool,
}

impl OverlayState {
    pub(crate) fn new(
        config: &Config,
        preview: bool,
        surfaces: Vec<SurfaceBinding>,
        loaded: LoadedMedia,
    ) -> Self {
        Self {
            surfaces,
            preview,
            allow_close: config.allow_close,
            hotkey: Hotkey::parse(&config.hotkey),
            media: loaded.media,
            video_playing: loaded.video_playing,
            video_source: loaded.video_source,
            playing: false,
            focused: true,
            refocus_queued: false,
            guard: 0,
            closed_emitted: false,
        }
    }

    pub(crate) fn contains(&self, id: IcedId) -> bool {
        self.surfaces.iter().any(|s| s.id == id)
    }

    pub(crate) fn surface_ids(&self) -> Vec<IcedId> {
        self.surfaces.iter().map(|s| s.id).collect()
    }

    /// Swap in a freshly created surface set (refocus / output change).
    pub(crate) fn rebind(&mut self, surfaces: Vec<SurfaceBinding>) {
        self.surfaces = surfaces;
        self.focused = true;
        self.refocus_queued = false;
    }

    pub(crate) fn guard(&self) -> u64 {
        self.guard
    }

    /// Whether a deferred callback tagged with `guard` may still act.
    pub(crate) fn guard_live(&self, guard: u64) -> bool {
        !self.closed_emitted && guard == self.guard
    }

    pub(crate) fn close_permitted(&self, request: CloseRequest) -> bool {
        close_permitted(self.preview, self.allow_close, request)
    }

    /// Classify a key press against the close policy.
    pub(crate) fn key_request(&self, key: &Key, modifiers: Modifiers) -> CloseRequest {
        if self.hotkey.matches(key, modifiers) {
            CloseRequest::Hotkey
        } else {
            CloseRequest::AnyKey
        }
    }

    /// Teardown gate. Stops the internal timers (guard bump kills every
    /// deferred callback) and reports whether the `closed` signal should be
    /// emitted — true exactly once per instance.
    pub(crate) fn begin_close(&mut self) -> bool {
        self.guard += 1;
        self.playing = false;
        if self.closed_emitted {
            false
        } else {
            self.closed_emitted = true;
            true
        }
    }

    // --- Video playback ---

    /// Fires after the configured start delay; from here the frame stream
    /// subscription runs.
    pub(crate) fn start_playback(&mut self, guard: u64) {
        if self.guard_live(guard) && self.video_playing {
            self.playing = true;
        }
    }

    pub(crate) fn is_playing(&self) -> bool {
        self.playing
    }

    /// A decoded frame arrived from the pipe.
    pub(crate) fn set_frame(&mut self, handle: iced::widget::image::Handle) {
        if let OverlayMedia::Video { frame } = &mut self.media {
            *frame = Some(handle);
        }
    }

    /// The pipe died. Drop to the provided image-mode fallback; the overlay
    /// stays up either way.
    pub(crate) fn video_failed(&mut self, fallback: OverlayMedia) {
        if !self.video_playing {
            return;
        }
        self.video_playing = false;
        self.playing = false;
        self.video_source = None;
        self.media = fallback;
    }

    // --- Focus bookkeeping ---
    //
    // The event path flags focus loss as it is reported; the 500 ms focus
    // poll calls `needs_refocus` and forces the same recovery for losses the
    // compositor never reported as events.

    pub(crate) fn mark_focused(&mut self) {
        self.focused = true;
    }

    pub(crate) fn mark_unfocused(&mut self) {
        self.focused = false;
    }

    /// A refocus is wanted when a non-preview overlay lost focus and no
    /// recovery is already in flight.
    pub(crate) fn needs_refocus(&self) -> bool {
        !self.preview && !self.focused && !self.refocus_queued && !self.closed_emitted
    }

    /// Mark a recovery in flight so event and poll paths do not stack them.
    pub(crate) fn queue_refocus(&mut self) {
        self.refocus_queued = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iced::keyboard::Key;

    fn black() -> LoadedMedia {
        LoadedMedia {
            media: OverlayMedia::Black,
            video_playing: false,
            video_source: None,
        }
    }

    fn video() -> LoadedMedia {
        LoadedMedia {
            media: OverlayMedia::Video { frame: None },
            video_playing: true,
            video_source: Some("/media/rest.mp4".to_string()),
        }
    }

    fn frame_handle() -> iced::widget::image::Handle {
        iced::widget::image::Handle::from_rgba(1, 1, vec![0, 0, 0, 255])
    }

    fn overlay(preview: bool, allow_close: bool) -> OverlayState {
        let config = Config {
            allow_close,
            ..Config::default()
        };
        OverlayState::new(&config, preview, Vec::new(), black())
    }

    // -----------------------------------------------------------------------
    // close policy
    // -----------------------------------------------------------------------

    #[test]
    fn session_overlay_rejects_everything_by_default() {
        let state = overlay(false, false);
        assert!(!state.close_permitted(CloseRequest::WindowManager));
        assert!(!state.close_permitted(CloseRequest::Hotkey));
        assert!(!state.close_permitted(CloseRequest::AnyKey));
        assert!(!state.close_permitted(CloseRequest::PreviewTimeout));
    }

    #[test]
    fn allow_close_honors_only_the_hotkey() {
        let state = overlay(false, true);
        assert!(state.close_permitted(CloseRequest::Hotkey));
        assert!(!state.close_permitted(CloseRequest::WindowManager));
        assert!(!state.close_permitted(CloseRequest::AnyKey));
    }

    #[test]
    fn preview_closes_for_any_reason() {
        let state = overlay(true, false);
        assert!(state.close_permitted(CloseRequest::AnyKey));
        assert!(state.close_permitted(CloseRequest::Hotkey));
        assert!(state.close_permitted(CloseRequest::PreviewTimeout));
        assert!(state.close_permitted(CloseRequest::WindowManager));
    }

    #[test]
    fn key_press_classification_uses_the_configured_chord() {
        let state = overlay(false, true);
        assert_eq!(
            state.key_request(&Key::Character("0".into()), Modifiers::CTRL),
            CloseRequest::Hotkey
        );
        assert_eq!(
            state.key_request(&Key::Character("0".into()), Modifiers::empty()),
            CloseRequest::AnyKey
        );
    }

    // -----------------------------------------------------------------------
    // closed signal + guard
    // -----------------------------------------------------------------------

    #[test]
    fn closed_is_emitted_exactly_once() {
        let mut state = overlay(true, false);
        assert!(state.begin_close());
        assert!(!state.begin_close());
    }

    #[test]
    fn begin_close_invalidates_deferred_callbacks() {
        let mut state = overlay(true, false);
        let guard = state.guard();
        assert!(state.guard_live(guard));
        state.begin_close();
        assert!(!state.guard_live(guard));
        // A preview-timeout firing after close must find a dead guard.
        assert!(!state.guard_live(state.guard()));
    }

    #[test]
    fn begin_close_stops_playback() {
        let config = Config::default();
        let mut state = OverlayState::new(&config, false, Vec::new(), video());
        let guard = state.guard();
        state.start_playback(guard);
        assert!(state.is_playing());
        state.begin_close();
        assert!(!state.is_playing());
    }

    // -----------------------------------------------------------------------
    // video playback
    // -----------------------------------------------------------------------

    #[test]
    fn playback_starts_only_with_a_live_guard() {
        let config = Config::default();
        let mut state = OverlayState::new(&config, false, Vec::new(), video());
        state.start_playback(state.guard() + 1);
        assert!(!state.is_playing());
        state.start_playback(state.guard());
        assert!(state.is_playing());
    }

    #[test]
    fn image_overlay_never_plays() {
        let mut state = overlay(false, false);
        let guard = state.guard();
        state.start_playback(guard);
        assert!(!state.is_playing());
    }

    #[test]
    fn frames_land_in_video_media_only() {
        let config = Config::default();
        let mut state = OverlayState::new(&config, false, Vec::new(), video());
        state.set_frame(frame_handle());
        assert!(matches!(
            state.media,
            OverlayMedia::Video { frame: Some(_) }
        ));

        let mut image_state = overlay(false, false);
        image_state.set_frame(frame_handle());
        assert!(matches!(image_state.media, OverlayMedia::Black));
    }

    #[test]
    fn video_failure_drops_to_image_mode() {
        let config = Config::default();
        let mut state = OverlayState::new(&config, false, Vec::new(), video());
        state.start_playback(state.guard());
        assert!(state.is_playing());

        state.video_failed(OverlayMedia::Black);
        assert!(!state.video_playing);
        assert!(!state.is_playing());
        assert!(state.video_source.is_none());
        assert!(matches!(state.media, OverlayMedia::Black));

        // A second failure report is a no-op.
        state.video_failed(OverlayMedia::Black);
        assert!(!state.video_playing);
    }

    // -----------------------------------------------------------------------
    // focus bookkeeping
    // -----------------------------------------------------------------------

    #[test]
    fn refocus_wanted_after_focus_loss() {
        let mut state = overlay(false, false);
        assert!(!state.needs_refocus());
        state.mark_unfocused();
        assert!(state.needs_refocus());
        state.queue_refocus();
        assert!(!state.needs_refocus());
    }

    #[test]
    fn preview_never_asks_for_refocus() {
        let mut state = overlay(true, false);
        state.mark_unfocused();
        assert!(!state.needs_refocus());
    }

    #[test]
    fn rebind_clears_focus_state() {
        let mut state = overlay(false, false);
        state.mark_unfocused();
        state.queue_refocus();
        state.rebind(Vec::new());
        assert!(!state.needs_refocus());
        state.mark_unfocused();
        assert!(state.needs_refocus());
    }

    #[test]
    fn closing_overlay_stops_asking_for_refocus() {
        let mut state = overlay(false, false);
        state.mark_unfocused();
        state.begin_close();
        assert!(!state.needs_refocus());
    }
}
