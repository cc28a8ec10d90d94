mod window_system;

pub use window_system::{shell_open, Win32WindowSystem};
