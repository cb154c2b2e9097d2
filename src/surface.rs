use iced_layershell::reexport::{Anchor, KeyboardInteractivity, Layer, NewLayerShellSettings};

use crate::util;

pub(crate) type IcedId = iced_layershell::reexport::IcedId;

/// A live layer surface bound to one output (`None` = compositor's choice).
#[derive(Debug, Clone)]
pub(crate) struct SurfaceBinding {
    pub(crate) output: Option<String>,
    pub(crate) id: IcedId,
}

/// Capability for a surface that must own a whole screen and keep input
/// focus. The schedule and overlay state talk to this interface; the
/// wlr-layer-shell flag plumbing stays on this side of it.
pub(crate) trait TopmostFocusedSurface {
    /// Fullscreen takeover settings on `output`. `exclusive_keyboard` grabs
    /// the keyboard for the surface; cover surfaces on secondary outputs
    /// pass `false`.
    fn show_fullscreen_on(
        &self,
        output: Option<&str>,
        exclusive_keyboard: bool,
    ) -> NewLayerShellSettings;

    /// Settings that re-establish the takeover after focus loss. Layer-shell
    /// surfaces cannot be re-activated in place, so forcing focus means
    /// recreating the surface with the keyboard grab.
    fn force_focus(&self, output: Option<&str>) -> NewLayerShellSettings {
        self.show_fullscreen_on(output, true)
    }

    /// Flip whether pointer/keyboard events fall through to surfaces
    /// beneath this one.
    fn set_input_passthrough(&self, settings: &mut NewLayerShellSettings, enabled: bool);
}

/// The one real provider: wlr-layer-shell via iced_layershell.
pub(crate) struct LayerShellSurface;

impl TopmostFocusedSurface for LayerShellSurface {
    fn show_fullscreen_on(
        &self,
        output: Option<&str>,
        exclusive_keyboard: bool,
    ) -> NewLayerShellSettings {
        overlay_settings(output, exclusive_keyboard)
    }

    fn set_input_passthrough(&self, settings: &mut NewLayerShellSettings, enabled: bool) {
        settings.events_transparent = enabled;
    }
}

fn make_output_option(output: Option<&str>) -> iced_layershell::reexport::OutputOption {
    match output {
        Some(name) => iced_layershell::reexport::OutputOption::OutputName(name.to_string()),
        None => iced_layershell::reexport::OutputOption::None,
    }
}

/// Full-screen break overlay: topmost layer, anchored to every edge.
pub(crate) fn overlay_settings(
    output: Option<&str>,
    exclusive_keyboard: bool,
) -> NewLayerShellSettings {
    NewLayerShellSettings {
        layer: Layer::Overlay,
        anchor: Anchor::Top | Anchor::Bottom | Anchor::Left | Anchor::Right,
        keyboard_interactivity: if exclusive_keyboard {
            KeyboardInteractivity::Exclusive
        } else {
            KeyboardInteractivity::None
        },
        exclusive_zone: Some(-1),
        size: Some((0, 0)),
        events_transparent: false,
        output_option: make_output_option(output),
        ..Default::default()
    }
}

/// Pre-break warning label: bottom-right corner, never takes the keyboard,
/// never blocks input to whatever is beneath it.
pub(crate) fn warning_settings(output: Option<&str>) -> NewLayerShellSettings {
    NewLayerShellSettings {
        layer: Layer::Overlay,
        anchor: Anchor::Bottom | Anchor::Right,
        keyboard_interactivity: KeyboardInteractivity::None,
        exclusive_zone: Some(-1),
        size: Some((280, 56)),
        margin: Some((0, 40, 60, 0)),
        events_transparent: true,
        output_option: make_output_option(output),
        ..Default::default()
    }
}

/// Work-phase countdown readout: top-right corner, input-transparent.
pub(crate) fn countdown_settings(output: Option<&str>) -> NewLayerShellSettings {
    NewLayerShellSettings {
        layer: Layer::Overlay,
        anchor: Anchor::Top | Anchor::Right,
        keyboard_interactivity: KeyboardInteractivity::None,
        exclusive_zone: Some(-1),
        size: Some((220, 110)),
        margin: Some((40, 40, 0, 0)),
        events_transparent: true,
        output_option: make_output_option(output),
        ..Default::default()
    }
}

/// Control panel: centered floating surface with on-demand keyboard.
pub(crate) fn panel_settings(output: Option<&str>) -> NewLayerShellSettings {
    NewLayerShellSettings {
        layer: Layer::Top,
        anchor: Anchor::empty(),
        keyboard_interactivity: KeyboardInteractivity::OnDemand,
        size: Some((480, 420)),
        events_transparent: false,
        output_option: make_output_option(output),
        ..Default::default()
    }
}

/// Query available Wayland outputs. Tries cosmic-randr first, then wlr-randr.
pub(crate) fn enumerate_outputs() -> Vec<String> {
    let result = std::process::Command::new("cosmic-randr")
        .arg("list")
        .output()
        .ok()
        .filter(|o| o.status.success())
        .or_else(|| {
            std::process::Command::new("wlr-randr")
                .output()
                .ok()
                .filter(|o| o.status.success())
        });
    let result = match result {
        Some(o) => o,
        None => return Vec::new(),
    };
    let stdout = String::from_utf8_lossy(&result.stdout);
    stdout
        .lines()
        .map(util::strip_ansi)
        .filter(|line| !line.starts_with(' ') && !line.starts_with('\t') && !line.is_empty())
        .filter_map(|line| line.split_whitespace().next().map(String::from))
        .collect()
}

/// The output the primary (keyboard-grabbing) overlay surface should land
/// on: the requested target when it is still present, otherwise the first
/// enumerated output.
pub(crate) fn pick_primary<'a>(outputs: &'a [String], target: Option<&'a str>) -> Option<&'a str> {
    match target {
        Some(name) if outputs.iter().any(|o| o == name) => Some(name),
        _ => outputs.first().map(String::as_str),
    }
}
