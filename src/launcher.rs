use crate::config::{AppConfig, LayoutMode};
use crate::context::AppContext;
use crate::directory::{WindowDirectory, WindowInfo};
use crate::layout;
use crate::logger::Logger;
use crate::plugins::{HelloPlugin, MessagesPlugin, PluginHost, UiParent};
use crate::scheduler::{ActionRunner, Job, JobAction, Scheduler};
use crate::Result;
use anyhow::{anyhow, Context};
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Duration;

/// Work marshaled onto the foreground loop. Window-system calls are only safe
/// from the thread that owns the UI, so scheduled actions and plugins send one
/// of these instead of touching windows directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    FocusWindow { window_index: usize },
    StageMessage { window_index: usize, message: String },
    Arrange,
    Quit,
}

/// Spawning seam: the platform-preferred invocation plus the direct fallback.
pub trait Spawner: Send + Sync {
    /// OS shell-open of the executable (ShellExecute on Windows).
    fn shell_open(&self, exe: &Path) -> Result<()>;

    /// Plain process spawn.
    fn spawn_direct(&self, exe: &Path) -> Result<()>;
}

pub struct ShellSpawner;

impl Spawner for ShellSpawner {
    #[cfg(windows)]
    fn shell_open(&self, exe: &Path) -> Result<()> {
        crate::win32::shell_open(exe)
    }

    #[cfg(not(windows))]
    fn shell_open(&self, _exe: &Path) -> Result<()> {
        Err(anyhow!("shell-open is only available on Windows"))
    }

    fn spawn_direct(&self, exe: &Path) -> Result<()> {
        std::process::Command::new(exe)
            .spawn()
            .map(|_| ())
            .with_context(|| format!("failed to spawn {}", exe.display()))
    }
}

/// Launch one instance: preferred shell-open first, direct spawn as fallback.
pub fn launch_once(spawner: &dyn Spawner, exe: &Path) -> Result<()> {
    if spawner.shell_open(exe).is_ok() {
        return Ok(());
    }
    spawner.spawn_direct(exe)
}

/// Launch `count` instances with a fixed delay between launches. Per-instance
/// failures are logged; returns how many launches succeeded.
pub async fn launch_instances(
    spawner: &dyn Spawner,
    exe: &Path,
    count: usize,
    delay_ms: u64,
    logger: &Logger,
) -> usize {
    let mut launched = 0;
    for i in 0..count {
        match launch_once(spawner, exe) {
            Ok(()) => launched += 1,
            Err(e) => logger.error(&format!("launch {} of {} failed: {}", i + 1, count, e)),
        }
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
    launched
}

/// Scan the application's windows and move them into the configured layout.
/// The base rect comes from config, falling back to the first window's current
/// rect. Per-window move failures are logged and skipped. Returns the number
/// of windows moved.
pub fn arrange(directory: &WindowDirectory, config: &AppConfig) -> Result<usize> {
    let windows = directory.list_numbered(&config.exe_path, &config.class_name)?;
    if windows.is_empty() {
        return Ok(0);
    }

    let work = directory.work_area()?;
    let base = match config.base_rect {
        Some(rect) => rect,
        None => directory.rect(windows[0].handle)?,
    };

    let targets = match config.layout {
        LayoutMode::Cascade => layout::cascade(
            work,
            base,
            windows.len(),
            config.cascade_dx,
            config.cascade_dy,
        ),
        LayoutMode::Tile => layout::tile(work, base, windows.len()),
    };

    let mut moved = 0;
    for (window, target) in windows.iter().zip(&targets) {
        match directory.set_rect(window.handle, *target) {
            Ok(()) => moved += 1,
            Err(e) => warn!("failed to move {}: {}", window.label, e),
        }
    }
    Ok(moved)
}

/// Scheduler-side runner: translates a due job's action into an [`AppCommand`]
/// on the foreground queue. Never calls the window system from the tick task.
pub struct CommandRunner {
    tx: mpsc::Sender<AppCommand>,
}

impl CommandRunner {
    pub fn new(tx: mpsc::Sender<AppCommand>) -> Self {
        Self { tx }
    }
}

impl ActionRunner for CommandRunner {
    fn run(&self, job: &Job) -> Result<()> {
        let command = match &job.action {
            JobAction::FocusWindow { window_index } => AppCommand::FocusWindow {
                window_index: *window_index,
            },
            JobAction::StageMessage {
                window_index,
                message,
            } => AppCommand::StageMessage {
                window_index: *window_index,
                message: message.clone(),
            },
        };
        self.tx
            .try_send(command)
            .map_err(|e| anyhow!("command queue rejected job {}: {}", job.id, e))
    }
}

/// Launch orchestrator and foreground command loop. Owns the shared
/// collaborators and the plugin host.
pub struct Launcher {
    config: AppConfig,
    directory: WindowDirectory,
    scheduler: Scheduler,
    plugins: PluginHost,
    logger: Logger,
    command_tx: mpsc::Sender<AppCommand>,
    command_rx: mpsc::Receiver<AppCommand>,
}

impl Launcher {
    pub fn new(config: AppConfig, directory: WindowDirectory, logger: Logger) -> Self {
        let (command_tx, command_rx) = mpsc::channel(64);
        let scheduler = Scheduler::new(
            Arc::new(CommandRunner::new(command_tx.clone())),
            logger.clone(),
        );
        let plugins = PluginHost::new(logger.clone());

        Self {
            config,
            directory,
            scheduler,
            plugins,
            logger,
            command_tx,
            command_rx,
        }
    }

    pub fn context(&self) -> AppContext {
        AppContext {
            config: self.config.clone(),
            logger: self.logger.clone(),
            scheduler: self.scheduler.clone(),
            directory: self.directory.clone(),
        }
    }

    pub fn command_sender(&self) -> mpsc::Sender<AppCommand> {
        self.command_tx.clone()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn plugins_mut(&mut self) -> &mut PluginHost {
        &mut self.plugins
    }

    /// Register the built-in plugins, discover external ones, initialize and
    /// start everything, then start the scheduler.
    pub fn startup(&mut self, plugins_dir: Option<&Path>) {
        if let Err(e) = self.plugins.register(Box::new(HelloPlugin::new())) {
            self.logger.error(&format!("register hello: {}", e));
        }
        if let Err(e) = self.plugins.register(Box::new(MessagesPlugin::new())) {
            self.logger.error(&format!("register messages: {}", e));
        }
        if let Some(dir) = plugins_dir {
            self.plugins.discover(dir);
        }

        let ctx = self.context();
        self.plugins.init_all(&ctx, UiParent(0));
        self.plugins.start_all();
        self.scheduler.start();
    }

    /// Launch the configured executable `count` times, wait out the launch
    /// delay, then arrange whatever windows showed up.
    pub async fn launch_and_arrange(&self, count: usize) -> Result<usize> {
        let spawner = ShellSpawner;
        let launched = launch_instances(
            &spawner,
            &self.config.exe_path,
            count,
            self.config.launch_delay_ms,
            &self.logger,
        )
        .await;
        self.logger
            .info(&format!("Launched {} of {} instances", launched, count));

        arrange(&self.directory, &self.config)
    }

    /// Foreground loop: executes marshaled commands until `Quit` or channel
    /// close. Command failures are logged, never fatal.
    pub async fn run(&mut self) -> Result<()> {
        info!("Starting foreground command loop");
        while let Some(command) = self.command_rx.recv().await {
            if command == AppCommand::Quit {
                break;
            }
            if let Err(e) = self.handle_command(command) {
                self.logger.error(&format!("command failed: {}", e));
            }
        }
        Ok(())
    }

    /// Scheduler and plugin teardown. Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.scheduler.stop();
        self.plugins.stop_all();
    }

    fn handle_command(&self, command: AppCommand) -> Result<()> {
        match command {
            AppCommand::FocusWindow { window_index } => {
                let window = self.window_at(window_index)?;
                self.directory.focus(window.handle)
            }
            AppCommand::StageMessage {
                window_index,
                message,
            } => {
                let window = self.window_at(window_index)?;
                self.directory.focus(window.handle)?;
                self.directory.stage_clipboard(&message)?;
                self.logger
                    .info("Message copied to clipboard (manual paste + send).");
                Ok(())
            }
            AppCommand::Arrange => arrange(&self.directory, &self.config).map(|_| ()),
            AppCommand::Quit => Ok(()),
        }
    }

    /// Fresh scan per command: indices are display positions, not identities,
    /// so they must be resolved against the current window set.
    fn window_at(&self, index: usize) -> Result<WindowInfo> {
        self.directory
            .list_numbered(&self.config.exe_path, &self.config.class_name)?
            .into_iter()
            .find(|w| w.index == index)
            .ok_or_else(|| anyhow!("no window at position {}", index))
    }
}
