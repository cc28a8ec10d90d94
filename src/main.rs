use clap::{Parser, Subcommand};
use fleet::window_system::WindowSystem;
use fleet::{config, launcher, AppConfig, Launcher, Logger, Result, WindowDirectory};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "fleet")]
#[command(about = "Multi-instance launcher and window arranger for desktop chat apps")]
struct Cli {
    #[arg(short, long, help = "Configuration file path")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Load plugins, start the scheduler, process commands until Ctrl+C")]
    Run {
        #[arg(long, help = "Plugins directory to scan for dynamic plugins")]
        plugins: Option<PathBuf>,
    },
    #[command(about = "Launch N instances, then arrange their windows")]
    Launch {
        #[arg(short = 'n', long, default_value_t = 2)]
        count: usize,
    },
    #[command(about = "Arrange existing windows per the saved layout")]
    Arrange,
    #[command(about = "List the application's windows")]
    List,
    #[command(about = "Save a window's current position/size as the layout base")]
    SetBase {
        #[arg(long, default_value_t = 1)]
        index: usize,
    },
    #[command(about = "Show configuration and window count")]
    Status,
}

#[cfg(windows)]
fn window_system() -> Result<Arc<dyn WindowSystem>> {
    Ok(Arc::new(fleet::win32::Win32WindowSystem::new()))
}

// Environment errors are fatal at startup: report and exit non-zero.
#[cfg(not(windows))]
fn window_system() -> Result<Arc<dyn WindowSystem>> {
    anyhow::bail!("fleet requires Windows (win32 window APIs)")
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(config::default_path);
    let mut cfg = AppConfig::load(&config_path);

    let directory = WindowDirectory::new(window_system()?);

    let command = cli.command.unwrap_or(Commands::Run { plugins: None });

    match command {
        Commands::Run { plugins } => {
            info!("Starting fleet");
            let mut launcher = Launcher::new(cfg, directory, Logger::facade());
            launcher.startup(plugins.as_deref());
            tokio::select! {
                result = launcher.run() => result?,
                _ = tokio::signal::ctrl_c() => {
                    info!("Received Ctrl+C, shutting down");
                }
            }
            launcher.shutdown();
        }
        Commands::Launch { count } => {
            let launcher = Launcher::new(cfg, directory, Logger::facade());
            let moved = launcher.launch_and_arrange(count).await?;
            info!("Arranged {} windows", moved);
        }
        Commands::Arrange => {
            let moved = launcher::arrange(&directory, &cfg)?;
            info!("Arranged {} windows", moved);
        }
        Commands::List => {
            let windows = directory.list_numbered(&cfg.exe_path, &cfg.class_name)?;
            if windows.is_empty() {
                println!("No windows found for {}", cfg.exe_path.display());
            }
            for w in windows {
                let title = if w.title.is_empty() {
                    "(untitled)"
                } else {
                    w.title.as_str()
                };
                println!("{:>3}  {}  pid={}  {}", w.index, w.label, w.pid, title);
            }
        }
        Commands::SetBase { index } => {
            let windows = directory.list_numbered(&cfg.exe_path, &cfg.class_name)?;
            let window = windows
                .iter()
                .find(|w| w.index == index)
                .ok_or_else(|| anyhow::anyhow!("no window at position {}", index))?;
            let rect = directory.rect(window.handle)?;
            cfg.base_rect = Some(rect);
            cfg.save(&config_path)?;
            println!("Saved base rect {:?} from {}", rect, window.label);
        }
        Commands::Status => {
            let windows = directory.list_numbered(&cfg.exe_path, &cfg.class_name)?;
            println!("config:  {}", config_path.display());
            println!("exe:     {}", cfg.exe_path.display());
            println!("layout:  {:?}", cfg.layout);
            println!("windows: {}", windows.len());
        }
    }

    Ok(())
}
