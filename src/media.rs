use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use iced::widget::image as iced_image;

use crate::app::Message;
use crate::config::{Config, MediaType, extension_matches};

/// Frame rate video sources are resampled to.
pub(crate) const VIDEO_FPS: u64 = 12;
/// Decode size for video frames; the widget layer scales up to the screen.
/// Bounds the per-frame payload (w * h * 4 bytes) crossing the event loop.
pub(crate) const VIDEO_DECODE_SIZE: (u32, u32) = (1280, 720);
/// Screen size assumed when output enumeration gives us nothing.
pub(crate) const FALLBACK_SCREEN: (u32, u32) = (1920, 1080);

/// What the overlay displays. Loading never fails out of this module: every
/// error path degrades to image mode or solid black.
pub(crate) enum OverlayMedia {
    Image(iced_image::Handle),
    /// A live video pipe; `frame` holds the most recently decoded frame.
    Video { frame: Option<iced_image::Handle> },
    /// Nothing decodable — the overlay paints itself black.
    Black,
}

pub(crate) struct LoadedMedia {
    pub(crate) media: OverlayMedia,
    /// True only when a video source actually opened.
    pub(crate) video_playing: bool,
    /// Path fed to the frame stream while `video_playing`.
    pub(crate) video_source: Option<String>,
}

/// Load the configured media for a screen of the given size.
pub(crate) fn load(config: &Config, screen: (u32, u32)) -> LoadedMedia {
    if config.media_type == MediaType::Video {
        let path = &config.media_path;
        if extension_matches(path, MediaType::Video) && path.exists() && probe_video(path) {
            return LoadedMedia {
                media: OverlayMedia::Video { frame: None },
                video_playing: true,
                video_source: Some(path.to_string_lossy().into_owned()),
            };
        }
        eprintln!("[restwall] not a playable video: {}", path.display());
        // Video path failed — image mode on the default wallpaper.
        return LoadedMedia {
            media: fallback_image(screen),
            video_playing: false,
            video_source: None,
        };
    }
    LoadedMedia {
        media: load_image(&config.media_path, screen),
        video_playing: false,
        video_source: None,
    }
}

/// Image-mode fallback used when a video source dies, before or during
/// playback.
pub(crate) fn fallback_image(screen: (u32, u32)) -> OverlayMedia {
    load_image(&Config::default_wallpaper(), screen)
}

/// Decode an image, pre-scaling anything over twice the screen size down to
/// bound memory. Missing or undecodable files become solid black.
fn load_image(path: &Path, screen: (u32, u32)) -> OverlayMedia {
    if !path.exists() {
        eprintln!("[restwall] wallpaper missing: {}", path.display());
        return OverlayMedia::Black;
    }
    let decoded = match image::open(path) {
        Ok(img) => img,
        Err(e) => {
            eprintln!("[restwall] cannot decode {}: {e}", path.display());
            return OverlayMedia::Black;
        }
    };
    let (max_w, max_h) = (screen.0.saturating_mul(2), screen.1.saturating_mul(2));
    let decoded = if decoded.width() > max_w || decoded.height() > max_h {
        decoded.resize(max_w, max_h, image::imageops::FilterType::Triangle)
    } else {
        decoded
    };
    let rgba = decoded.to_rgba8();
    let (w, h) = (rgba.width(), rgba.height());
    OverlayMedia::Image(iced_image::Handle::from_rgba(w, h, rgba.into_raw()))
}

/// Cheap synchronous check that ffmpeg can actually open the file and find
/// a video stream. Any failure — binary missing, unreadable file, broken
/// container — reads as "not a video" and the caller falls back.
fn probe_video(path: &Path) -> bool {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=codec_name",
            "-of",
            "csv=p=0",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .output();
    match output {
        Ok(o) if o.status.success() && !o.stdout.is_empty() => true,
        Ok(o) => {
            let stderr = String::from_utf8_lossy(&o.stderr);
            eprintln!(
                "[restwall] ffprobe rejected {}: {}",
                path.display(),
                stderr.trim()
            );
            false
        }
        Err(e) => {
            eprintln!("[restwall] ffprobe unavailable: {e}");
            false
        }
    }
}

fn frame_byte_len(size: (u32, u32)) -> usize {
    size.0 as usize * size.1 as usize * 4
}

/// The frame stream for a playing video overlay. Spawns an ffmpeg child
/// decoding the file to paced rawvideo on stdout and a reader thread that
/// chops the pipe into frames; each loop iteration respawns the child so
/// the clip repeats. A decode failure surfaces once as `VideoFailed` and
/// the overlay drops to image mode.
pub(crate) fn video_stream(path: &String) -> impl futures::Stream<Item = Message> {
    let path = path.clone();
    let (tx, rx) = futures::channel::mpsc::unbounded();
    std::thread::spawn(move || {
        let (w, h) = VIDEO_DECODE_SIZE;
        let filter = format!(
            "fps={VIDEO_FPS},scale={w}:{h}:force_original_aspect_ratio=decrease,\
             pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:color=black"
        );
        loop {
            // -re paces the decode at native speed so the pipe delivers
            // frames in real time instead of as fast as possible.
            let child = Command::new("ffmpeg")
                .args(["-v", "error", "-re", "-i", &path])
                .args(["-vf", &filter])
                .args(["-f", "rawvideo", "-pix_fmt", "rgba", "-"])
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::null())
                .spawn();
            let mut child = match child {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("[restwall] ffmpeg unavailable: {e}");
                    let _ = tx.unbounded_send(Message::VideoFailed);
                    return;
                }
            };
            let Some(mut stdout) = child.stdout.take() else {
                let _ = child.kill();
                let _ = tx.unbounded_send(Message::VideoFailed);
                return;
            };

            let mut delivered = 0usize;
            let mut buf = vec![0u8; frame_byte_len(VIDEO_DECODE_SIZE)];
            loop {
                match stdout.read_exact(&mut buf) {
                    Ok(()) => {
                        let handle = iced_image::Handle::from_rgba(w, h, buf.clone());
                        if tx.unbounded_send(Message::VideoFrame(handle)).is_err() {
                            // Overlay gone; stop decoding.
                            let _ = child.kill();
                            let _ = child.wait();
                            return;
                        }
                        delivered += 1;
                    }
                    Err(_) => break, // end of stream or short read
                }
            }
            let status = child.wait();
            let clean = status.map(|s| s.success()).unwrap_or(false);
            if delivered == 0 || !clean {
                eprintln!("[restwall] video decode failed: {path}");
                let _ = tx.unbounded_send(Message::VideoFailed);
                return;
            }
            // Clean end of file: loop the clip.
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_image_degrades_to_black() {
        let media = load_image(Path::new("/nonexistent/wall.png"), FALLBACK_SCREEN);
        assert!(matches!(media, OverlayMedia::Black));
    }

    #[test]
    fn video_mode_with_image_extension_falls_back_without_playing() {
        let config = Config {
            media_type: MediaType::Video,
            media_path: PathBuf::from("/tmp/wallpaper.png"),
            ..Config::default()
        };
        let loaded = load(&config, FALLBACK_SCREEN);
        assert!(!loaded.video_playing);
        assert!(loaded.video_source.is_none());
        // Default wallpaper is absent in the test environment, so the
        // fallback chain ends at black rather than erroring.
        assert!(matches!(loaded.media, OverlayMedia::Black));
    }

    #[test]
    fn video_mode_with_missing_file_falls_back_without_playing() {
        let config = Config {
            media_type: MediaType::Video,
            media_path: PathBuf::from("/nonexistent/clip.mp4"),
            ..Config::default()
        };
        let loaded = load(&config, FALLBACK_SCREEN);
        assert!(!loaded.video_playing);
        assert!(loaded.video_source.is_none());
    }

    #[test]
    fn image_mode_never_reports_video_playing() {
        let config = Config::default();
        let loaded = load(&config, FALLBACK_SCREEN);
        assert!(!loaded.video_playing);
    }

    #[test]
    fn probe_rejects_missing_file() {
        // Works whether or not ffprobe is installed: both paths are "no".
        assert!(!probe_video(Path::new("/nonexistent/clip.mp4")));
    }

    #[test]
    fn frame_byte_len_is_rgba() {
        assert_eq!(frame_byte_len((2, 3)), 24);
        assert_eq!(
            frame_byte_len(VIDEO_DECODE_SIZE),
            1280 * 720 * 4
        );
    }
}
