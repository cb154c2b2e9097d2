use std::io::BufRead;
use std::os::unix::net::UnixListener;
use std::path::PathBuf;
use std::time::Duration;

use futures::channel::{mpsc, oneshot};

use crate::app::Message;
use crate::config::MediaType;

pub(crate) fn socket_path() -> PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(runtime_dir).join("restwall.sock")
}

/// Map one ctl line to a message. `None` logs upstream as unknown.
pub(crate) fn parse_command(line: &str) -> Option<Message> {
    match line {
        "start" => Some(Message::StartSession),
        "stop" => Some(Message::StopSession),
        "toggle" => Some(Message::ToggleSession),
        "panel-toggle" => Some(Message::PanelToggle),
        "preview" => Some(Message::OpenPreview),
        "screen" => Some(Message::ScreenCycle),
        "quit" => Some(Message::Quit),
        cmd if cmd.starts_with("screen ") => {
            Some(Message::ScreenSet(cmd[7..].trim().to_string()))
        }
        cmd if cmd.starts_with("set work ") => {
            cmd[9..].trim().parse().ok().map(Message::SetWorkMinutes)
        }
        cmd if cmd.starts_with("set break ") => {
            cmd[10..].trim().parse().ok().map(Message::SetBreakMinutes)
        }
        cmd if cmd.starts_with("set warning ") => {
            cmd[12..].trim().parse().ok().map(Message::SetWarningSeconds)
        }
        "media-type image" => Some(Message::SetMediaType(MediaType::Image)),
        "media-type video" => Some(Message::SetMediaType(MediaType::Video)),
        cmd if cmd.starts_with("media ") => {
            let path = cmd[6..].trim();
            if path.is_empty() {
                None
            } else {
                Some(Message::SetMediaPath(PathBuf::from(path)))
            }
        }
        _ => None,
    }
}

pub(crate) fn socket_listener() -> impl futures::Stream<Item = Message> {
    let (tx, rx) = mpsc::unbounded();
    std::thread::spawn(move || {
        let path = socket_path();
        let _ = std::fs::remove_file(&path);
        let listener = match UnixListener::bind(&path) {
            Ok(l) => l,
            Err(e) => {
                eprintln!("[restwall] failed to bind socket {path:?}: {e}");
                return;
            }
        };
        eprintln!("[restwall] listening on {path:?}");
        for stream in listener.incoming().flatten() {
            let mut buf = String::new();
            if std::io::BufReader::new(stream).read_line(&mut buf).is_ok() {
                let line = buf.trim();
                match parse_command(line) {
                    Some(msg) => {
                        if tx.unbounded_send(msg).is_err() {
                            break;
                        }
                    }
                    None => eprintln!("[restwall] unknown command: {line:?}"),
                }
            }
        }
    });
    rx
}

fn interval_stream(period: Duration, msg: fn() -> Message) -> mpsc::UnboundedReceiver<Message> {
    let (tx, rx) = mpsc::unbounded();
    std::thread::spawn(move || loop {
        std::thread::sleep(period);
        if tx.unbounded_send(msg()).is_err() {
            break;
        }
    });
    rx
}

/// Shared display tick: warning and countdown windows decrement on it.
pub(crate) fn second_stream() -> impl futures::Stream<Item = Message> {
    interval_stream(Duration::from_secs(1), || Message::SecondTick)
}

/// Focus-poll backstop for the break overlay. Compositors do not reliably
/// report every focus loss as an event; the poll forces a recheck either way.
pub(crate) fn focus_poll_stream() -> impl futures::Stream<Item = Message> {
    interval_stream(Duration::from_millis(500), || Message::FocusPoll)
}

/// One-shot delay backing the phase timers, settle steps, video start delay
/// and preview timeout. The sleeping thread only signals; all state changes
/// happen back on the event loop.
pub(crate) fn after(delay: Duration) -> impl std::future::Future<Output = ()> {
    let (tx, rx) = oneshot::channel::<()>();
    std::thread::spawn(move || {
        std::thread::sleep(delay);
        let _ = tx.send(());
    });
    async move {
        let _ = rx.await;
    }
}
