use std::io::Write;
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::process;

fn socket_path() -> PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(runtime_dir).join("restwall.sock")
}

fn is_known(cmd: &str) -> bool {
    match cmd {
        "start" | "stop" | "toggle" | "panel-toggle" | "preview" | "screen" | "quit"
        | "media-type image" | "media-type video" => true,
        _ => {
            cmd.strip_prefix("screen ").is_some_and(|rest| !rest.trim().is_empty())
                || cmd.strip_prefix("media ").is_some_and(|rest| !rest.trim().is_empty())
                || ["set work ", "set break ", "set warning "].iter().any(|prefix| {
                    cmd.strip_prefix(prefix)
                        .is_some_and(|rest| rest.trim().parse::<u32>().is_ok())
                })
        }
    }
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        usage();
        process::exit(1);
    }

    let cmd = args.join(" ");
    if !is_known(&cmd) {
        eprintln!("unknown command: {cmd}");
        usage();
        process::exit(1);
    }

    let path = socket_path();
    let mut stream = match UnixStream::connect(&path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("restwall not running ({path:?}): {e}");
            process::exit(1);
        }
    };

    if let Err(e) = writeln!(stream, "{cmd}") {
        eprintln!("failed to send command: {e}");
        process::exit(1);
    }
}

fn usage() {
    eprintln!("usage: restwall-ctl <command>");
    eprintln!();
    eprintln!("commands:");
    eprintln!("  start                begin a focus session");
    eprintln!("  stop                 end the session, back to idle");
    eprintln!("  toggle               start or stop depending on state");
    eprintln!("  panel-toggle         show/hide the control panel");
    eprintln!("  preview              preview the break overlay");
    eprintln!("  set work <min>       work stretch length in minutes");
    eprintln!("  set break <min>      break length in minutes");
    eprintln!("  set warning <sec>    pre-break warning in seconds");
    eprintln!("  media <path>         set the wallpaper/video file");
    eprintln!("  media-type <image|video>");
    eprintln!("  screen [name]        cycle or set the target output");
    eprintln!("  quit                 exit the daemon");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_plain_commands() {
        for cmd in ["start", "stop", "toggle", "panel-toggle", "preview", "screen", "quit"] {
            assert!(is_known(cmd), "{cmd} should be known");
        }
    }

    #[test]
    fn known_parameterized_commands() {
        assert!(is_known("set work 45"));
        assert!(is_known("set break 10"));
        assert!(is_known("set warning 0"));
        assert!(is_known("screen HDMI-A-1"));
        assert!(is_known("media /home/u/wall.png"));
        assert!(is_known("media-type video"));
    }

    #[test]
    fn rejected_commands() {
        assert!(!is_known("set work soon"));
        assert!(!is_known("media "));
        assert!(!is_known("frobnicate"));
        assert!(!is_known(""));
    }
}
