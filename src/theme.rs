use iced::{Background, Color};

/// How the theme is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Dark,
    Light,
    /// Follow the desktop environment / system theme at startup.
    Auto,
}

/// Colors and font sizes shared by the panel, warning and countdown views.
pub struct ThemeColors {
    pub is_dark: bool,
    // Text
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
    pub error: Color,
    // Backgrounds
    pub panel_bg: Color,
    pub pill_bg: Color,
    pub hover: Color,
    // Font sizes (logical pixels)
    pub title_size: f32,
    pub body_size: f32,
    pub clock_size: f32,
    pub info_size: f32,
}

impl ThemeColors {
    /// Dark theme — light text on dim translucent panels.
    pub fn dark() -> Self {
        Self {
            is_dark: true,
            text: Color {
                r: 1.0,
                g: 1.0,
                b: 1.0,
                a: 0.9,
            },
            muted: Color {
                r: 1.0,
                g: 1.0,
                b: 1.0,
                a: 0.45,
            },
            accent: Color {
                r: 0.0,
                g: 0.48,
                b: 1.0,
                a: 1.0,
            },
            error: Color {
                r: 0.9,
                g: 0.2,
                b: 0.2,
                a: 1.0,
            },
            panel_bg: Color {
                r: 0.05,
                g: 0.05,
                b: 0.08,
                a: 0.92,
            },
            pill_bg: Color {
                r: 0.0,
                g: 0.0,
                b: 0.0,
                a: 0.7,
            },
            hover: Color {
                r: 0.12,
                g: 0.12,
                b: 0.18,
                a: 0.6,
            },
            title_size: 16.0,
            body_size: 13.0,
            clock_size: 42.0,
            info_size: 9.0,
        }
    }

    /// Light theme — dark text on light panels.
    pub fn light() -> Self {
        Self {
            is_dark: false,
            text: Color {
                r: 0.08,
                g: 0.08,
                b: 0.08,
                a: 0.95,
            },
            muted: Color {
                r: 0.35,
                g: 0.35,
                b: 0.35,
                a: 0.8,
            },
            accent: Color {
                r: 0.0,
                g: 0.38,
                b: 0.8,
                a: 1.0,
            },
            error: Color {
                r: 0.75,
                g: 0.1,
                b: 0.1,
                a: 1.0,
            },
            panel_bg: Color {
                r: 0.94,
                g: 0.94,
                b: 0.96,
                a: 0.95,
            },
            pill_bg: Color {
                r: 0.0,
                g: 0.0,
                b: 0.0,
                a: 0.55,
            },
            hover: Color {
                r: 0.80,
                g: 0.80,
                b: 0.88,
                a: 0.6,
            },
            title_size: 16.0,
            body_size: 13.0,
            clock_size: 42.0,
            info_size: 9.0,
        }
    }

    pub fn panel_style(&self) -> impl Fn(&iced::Theme) -> iced::widget::container::Style {
        let color = self.panel_bg;
        move |_theme: &iced::Theme| iced::widget::container::Style {
            background: Some(Background::Color(color)),
            border: iced::Border {
                radius: 10.0.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Dim rounded backdrop for the warning/countdown pills.
    pub fn pill_style(&self) -> impl Fn(&iced::Theme) -> iced::widget::container::Style {
        let color = self.pill_bg;
        move |_theme: &iced::Theme| iced::widget::container::Style {
            background: Some(Background::Color(color)),
            border: iced::Border {
                radius: 6.0.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn hover_style(&self) -> impl Fn(&iced::Theme) -> iced::widget::container::Style {
        let color = self.hover;
        move |_theme: &iced::Theme| iced::widget::container::Style {
            background: Some(Background::Color(color)),
            border: iced::Border {
                radius: 4.0.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Detect system dark mode. Spawns CLI tools synchronously; called once at
/// startup.
pub fn detect_system_dark() -> bool {
    // 1. COSMIC DE: read the is_dark file directly
    if let Some(home) = dirs::home_dir() {
        let cosmic_path = home.join(".config/cosmic/com.system76.CosmicTheme.Mode/v1/is_dark");
        if let Ok(contents) = std::fs::read_to_string(&cosmic_path) {
            let trimmed = contents.trim();
            if trimmed == "true" {
                return true;
            }
            if trimmed == "false" {
                return false;
            }
        }
    }

    // 2. XDG Desktop Portal (COSMIC, GNOME 42+, KDE 5.24+)
    //    color-scheme: 0=no preference, 1=dark, 2=light
    if let Ok(output) = std::process::Command::new("dbus-send")
        .args([
            "--session",
            "--print-reply=literal",
            "--dest=org.freedesktop.portal.Desktop",
            "/org/freedesktop/portal/desktop",
            "org.freedesktop.portal.Settings.ReadOne",
            "string:org.freedesktop.appearance",
            "string:color-scheme",
        ])
        .output()
    {
        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            if stdout.contains("uint32 1") {
                return true;
            }
            if stdout.contains("uint32 2") {
                return false;
            }
        }
    }

    // 3. gsettings color-scheme (GNOME 42+)
    if let Ok(output) = std::process::Command::new("gsettings")
        .args(["get", "org.gnome.desktop.interface", "color-scheme"])
        .output()
    {
        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.contains("prefer-dark") {
            return true;
        }
        if stdout.contains("prefer-light") || stdout.contains("default") {
            return false;
        }
    }

    // 4. GTK_THEME env var (e.g. "Adwaita:dark")
    if let Ok(val) = std::env::var("GTK_THEME") {
        return val.to_lowercase().contains("dark");
    }

    // 5. All detection failed, default to dark
    true
}

/// Resolve the initial ThemeColors for a given mode.
pub fn resolve(mode: ThemeMode) -> ThemeColors {
    match mode {
        ThemeMode::Dark => ThemeColors::dark(),
        ThemeMode::Light => ThemeColors::light(),
        ThemeMode::Auto => {
            if detect_system_dark() {
                ThemeColors::dark()
            } else {
                ThemeColors::light()
            }
        }
    }
}
