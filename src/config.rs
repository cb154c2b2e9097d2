use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub(crate) const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];
pub(crate) const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mkv"];

const DEFAULT_WALLPAPER: &str = "assets/default_wallpaper.jpg";
const MAX_SESSION_MINUTES: u32 = 600;
const MAX_WARNING_SECONDS: u32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub(crate) fn label(self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }

    pub(crate) fn extensions(self) -> &'static [&'static str] {
        match self {
            MediaType::Image => IMAGE_EXTENSIONS,
            MediaType::Video => VIDEO_EXTENSIONS,
        }
    }
}

/// On-disk settings. Unknown keys in the user file are ignored; missing keys
/// fall back to the defaults below, and out-of-range values are clamped
/// rather than rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    /// Work stretch between breaks, minutes.
    pub(crate) work_duration: u32,
    /// Break length, minutes.
    pub(crate) break_duration: u32,
    /// Pre-break warning countdown, seconds.
    pub(crate) warning_time: u32,
    pub(crate) media_type: MediaType,
    pub(crate) media_path: PathBuf,
    /// Whether the break overlay may be dismissed with the hotkey.
    pub(crate) allow_close: bool,
    pub(crate) hotkey: String,
    /// How long a user-triggered preview stays up, milliseconds.
    pub(crate) preview_duration: u64,
    /// Delay before video frames start advancing, milliseconds.
    pub(crate) video_start_delay: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_duration: 25,
            break_duration: 5,
            warning_time: 10,
            media_type: MediaType::Image,
            media_path: PathBuf::from(DEFAULT_WALLPAPER),
            allow_close: false,
            hotkey: "Ctrl+0".to_string(),
            preview_duration: 5000,
            video_start_delay: 100,
        }
    }
}

impl Config {
    /// Load the user config merged over the defaults. Any read or parse
    /// failure logs and leaves the defaults in place.
    pub(crate) fn load() -> Self {
        let path = config_file_path();
        let user = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Value>(&content) {
                Ok(value) => value,
                Err(e) => {
                    eprintln!("[restwall] invalid config {}: {e}", path.display());
                    Value::Null
                }
            },
            Err(_) => Value::Null, // first run, no file yet
        };
        Self::from_user_value(user)
    }

    fn from_user_value(user: Value) -> Self {
        let mut merged = serde_json::to_value(Config::default())
            .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));
        merge_value(&mut merged, user);
        let mut config: Config = match serde_json::from_value(merged) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("[restwall] config rejected, using defaults: {e}");
                Config::default()
            }
        };
        config.sanitize();
        config
    }

    /// Clamp out-of-range values instead of failing.
    fn sanitize(&mut self) {
        self.work_duration = self.work_duration.clamp(1, MAX_SESSION_MINUTES);
        self.break_duration = self.break_duration.clamp(1, MAX_SESSION_MINUTES);
        self.warning_time = self.warning_time.min(MAX_WARNING_SECONDS);
        if self.hotkey.trim().is_empty() {
            self.hotkey = Config::default().hotkey;
        }
    }

    /// Persist the current values. Failures are logged, never fatal.
    pub(crate) fn save(&self) {
        let path = config_file_path();
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("[restwall] cannot create {}: {e}", parent.display());
                return;
            }
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    eprintln!("[restwall] cannot write {}: {e}", path.display());
                }
            }
            Err(e) => eprintln!("[restwall] cannot serialize config: {e}"),
        }
    }

    /// Whether `path` has an extension acceptable for the selected mode.
    pub(crate) fn matches_media_type(&self, path: &Path) -> bool {
        extension_matches(path, self.media_type)
    }

    pub(crate) fn default_wallpaper() -> PathBuf {
        PathBuf::from(DEFAULT_WALLPAPER)
    }
}

pub(crate) fn extension_matches(path: &Path, media_type: MediaType) -> bool {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(e) => e.to_ascii_lowercase(),
        None => return false,
    };
    media_type.extensions().contains(&ext.as_str())
}

pub(crate) fn config_file_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".config/restwall/config.json")
}

/// Merge `user` into `base`. Objects merge key by key with the user value
/// winning; arrays and scalars replace atomically.
fn merge_value(base: &mut Value, user: Value) {
    match (base, user) {
        (Value::Object(base_map), Value::Object(user_map)) => {
            for (key, user_value) in user_map {
                match base_map.get_mut(&key) {
                    Some(base_value) => merge_value(base_value, user_value),
                    None => {
                        base_map.insert(key, user_value);
                    }
                }
            }
        }
        (_, Value::Null) => {}
        (base_slot, user_value) => *base_slot = user_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.work_duration, 25);
        assert_eq!(config.break_duration, 5);
        assert_eq!(config.warning_time, 10);
        assert!(!config.allow_close);
        assert_eq!(config.hotkey, "Ctrl+0");
        assert_eq!(config.preview_duration, 5000);
        assert_eq!(config.video_start_delay, 100);
    }

    #[test]
    fn user_values_override_defaults() {
        let config = Config::from_user_value(json!({
            "work_duration": 50,
            "media_type": "video",
            "allow_close": true
        }));
        assert_eq!(config.work_duration, 50);
        assert_eq!(config.media_type, MediaType::Video);
        assert!(config.allow_close);
        // Untouched keys keep their defaults.
        assert_eq!(config.break_duration, 5);
        assert_eq!(config.hotkey, "Ctrl+0");
    }

    #[test]
    fn null_user_value_keeps_default() {
        let config = Config::from_user_value(json!({ "hotkey": null }));
        assert_eq!(config.hotkey, "Ctrl+0");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let config = Config::from_user_value(json!({
            "work_duration": 30,
            "legacy_theme": { "accent": "#007AFF" }
        }));
        assert_eq!(config.work_duration, 30);
    }

    #[test]
    fn out_of_range_durations_are_clamped() {
        let config = Config::from_user_value(json!({
            "work_duration": 0,
            "break_duration": 100000,
            "warning_time": 100000
        }));
        assert_eq!(config.work_duration, 1);
        assert_eq!(config.break_duration, MAX_SESSION_MINUTES);
        assert_eq!(config.warning_time, MAX_WARNING_SECONDS);
    }

    #[test]
    fn blank_hotkey_falls_back_to_default() {
        let config = Config::from_user_value(json!({ "hotkey": "  " }));
        assert_eq!(config.hotkey, "Ctrl+0");
    }

    #[test]
    fn malformed_user_document_falls_back_to_defaults() {
        let config = Config::from_user_value(json!({ "work_duration": "soon" }));
        assert_eq!(config.work_duration, 25);
    }

    #[test]
    fn merge_replaces_arrays_atomically() {
        let mut base = json!({ "tags": ["a", "b", "c"], "nested": { "keep": 1 } });
        merge_value(&mut base, json!({ "tags": ["x"], "nested": { "add": 2 } }));
        assert_eq!(base["tags"], json!(["x"]));
        assert_eq!(base["nested"]["keep"], json!(1));
        assert_eq!(base["nested"]["add"], json!(2));
    }

    #[test]
    fn image_extensions_match_case_insensitively() {
        assert!(extension_matches(Path::new("pic.JPG"), MediaType::Image));
        assert!(extension_matches(Path::new("pic.jpeg"), MediaType::Image));
        assert!(extension_matches(Path::new("pic.png"), MediaType::Image));
        assert!(extension_matches(Path::new("pic.bmp"), MediaType::Image));
        assert!(!extension_matches(Path::new("pic.gif"), MediaType::Image));
        assert!(!extension_matches(Path::new("clip.mp4"), MediaType::Image));
    }

    #[test]
    fn video_extensions_match_only_video_mode() {
        assert!(extension_matches(Path::new("clip.mp4"), MediaType::Video));
        assert!(extension_matches(Path::new("clip.avi"), MediaType::Video));
        assert!(extension_matches(Path::new("clip.MKV"), MediaType::Video));
        assert!(!extension_matches(Path::new("pic.png"), MediaType::Video));
        assert!(!extension_matches(Path::new("noext"), MediaType::Video));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = Config {
            work_duration: 45,
            media_type: MediaType::Video,
            media_path: PathBuf::from("/media/rest.mp4"),
            ..Config::default()
        };
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["media_type"], json!("video"));
        let back: Config = serde_json::from_value(value).unwrap();
        assert_eq!(back.work_duration, 45);
        assert_eq!(back.media_path, PathBuf::from("/media/rest.mp4"));
    }
}
