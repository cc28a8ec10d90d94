use serde::{Deserialize, Serialize};

pub mod config;
pub mod context;
pub mod directory;
pub mod launcher;
pub mod layout;
pub mod logger;
pub mod plugins;
pub mod scheduler;
#[cfg(windows)]
pub mod win32;
pub mod window_system;

pub use config::{AppConfig, LayoutMode};
pub use context::AppContext;
pub use directory::{WindowDirectory, WindowInfo};
pub use launcher::{AppCommand, Launcher};
pub use logger::Logger;
pub use scheduler::{Job, JobAction, Scheduler};

pub type Result<T> = anyhow::Result<T>;

/// Opaque OS window id. Not stable across window recreation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowHandle(pub isize);

/// Screen rectangle in device pixels. Replaced wholesale, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            x,
            y,
            w: w.max(0),
            h: h.max(0),
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}
