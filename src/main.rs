//! restwall — a Wayland break-reminder daemon.
//!
//! Tracks work time, warns before each break, then takes over every screen
//! with a full-screen rest overlay until the break is up. Driven over a
//! Unix socket by `restwall-ctl`.

mod app;
mod config;
mod countdown;
mod hotkey;
mod ipc;
mod media;
mod overlay;
mod schedule;
mod surface;
mod theme;
mod util;
mod views;
mod warning;

fn main() -> Result<(), iced_layershell::Error> {
    app::run()
}
