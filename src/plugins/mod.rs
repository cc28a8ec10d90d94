use crate::context::AppContext;
use crate::logger::Logger;
use crate::Result;
use libloading::{Library, Symbol};
use log::debug;
use std::path::Path;
use thiserror::Error;

pub mod hello;
pub mod messages;

pub use hello::HelloPlugin;
pub use messages::MessagesPlugin;

/// Opaque token for the container a plugin's UI surface is attached to. Minted
/// by the GUI shell; the host only passes it through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiParent(pub u64);

/// Opaque token for a plugin's UI surface, held by the host for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiSurfaceHandle(pub u64);

/// Capability set every plugin must satisfy. Lifecycle calls arrive in order:
/// `init`, then `ui_surface`, then `on_start`; `on_stop` once at shutdown.
pub trait Plugin: Send {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn version(&self) -> &str;
    fn init(&mut self, ctx: &AppContext) -> Result<()>;
    fn ui_surface(&mut self, parent: UiParent) -> Result<UiSurfaceHandle>;
    fn on_start(&mut self) -> Result<()>;
    fn on_stop(&mut self) -> Result<()>;
}

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("plugin id is empty")]
    EmptyId,
    #[error("plugin id already registered: {0}")]
    DuplicateId(String),
    #[error("plugin factory returned null: {0}")]
    NullFactory(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    Discovered,
    Initialized,
    Started,
    Stopped,
}

struct LoadedPlugin {
    // Declared before `library` so the instance drops before its dylib.
    plugin: Box<dyn Plugin>,
    state: PluginState,
    surface: Option<UiSurfaceHandle>,
    library: Option<Library>,
}

/// Loads optional feature modules and walks them through a bounded lifecycle:
/// Discovered -> Initialized -> Started -> Stopped. One misbehaving plugin is
/// logged and skipped; it never aborts the others.
pub struct PluginHost {
    logger: Logger,
    loaded: Vec<LoadedPlugin>,
}

impl PluginHost {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            loaded: Vec::new(),
        }
    }

    /// Register a compiled-in plugin. The capability set is validated here:
    /// an empty or duplicate id is rejected with a structured error.
    pub fn register(&mut self, plugin: Box<dyn Plugin>) -> std::result::Result<(), PluginError> {
        self.register_inner(plugin, None)
    }

    fn register_inner(
        &mut self,
        plugin: Box<dyn Plugin>,
        library: Option<Library>,
    ) -> std::result::Result<(), PluginError> {
        if plugin.id().is_empty() {
            return Err(PluginError::EmptyId);
        }
        if self.loaded.iter().any(|lp| lp.plugin.id() == plugin.id()) {
            return Err(PluginError::DuplicateId(plugin.id().to_string()));
        }
        self.loaded.push(LoadedPlugin {
            plugin,
            state: PluginState::Discovered,
            surface: None,
            library,
        });
        Ok(())
    }

    /// Scan a plugins directory: each immediate subdirectory holding a
    /// `plugin.<dylib>` entry exposing `create_plugin` is a candidate. Failed
    /// candidates are logged and skipped.
    pub fn discover(&mut self, dir: &Path) {
        if !dir.is_dir() {
            self.logger
                .warn(&format!("plugins dir not found: {}", dir.display()));
            return;
        }

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                self.logger
                    .error(&format!("cannot read plugins dir {}: {}", dir.display(), e));
                return;
            }
        };

        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            let candidate = entry.path().join(format!("plugin.{}", dylib_ext()));
            if !candidate.is_file() {
                continue;
            }
            if let Err(e) = self.load_dynamic(&name, &candidate) {
                self.logger
                    .error(&format!("Load plugin failed: {}: {}", name, e));
            }
        }
    }

    fn load_dynamic(&mut self, name: &str, path: &Path) -> Result<()> {
        debug!("Loading plugin {} from {:?}", name, path);

        unsafe {
            let lib = Library::new(path)?;

            type CreatePluginFn = unsafe fn() -> *mut dyn Plugin;
            let create_plugin: Symbol<CreatePluginFn> = lib.get(b"create_plugin")?;

            let plugin_ptr = create_plugin();
            if plugin_ptr.is_null() {
                return Err(PluginError::NullFactory(name.to_string()).into());
            }

            let plugin = Box::from_raw(plugin_ptr);
            self.register_inner(plugin, Some(lib))?;
        }
        Ok(())
    }

    /// Initialize every discovered plugin with the shared context and collect
    /// its UI surface. A plugin that fails either step is dropped from the
    /// loaded set.
    pub fn init_all(&mut self, ctx: &AppContext, parent: UiParent) {
        for lp in &mut self.loaded {
            if lp.state != PluginState::Discovered {
                continue;
            }
            let name = lp.plugin.name().to_string();
            let init_result = lp
                .plugin
                .init(ctx)
                .and_then(|_| lp.plugin.ui_surface(parent));
            match init_result {
                Ok(surface) => {
                    lp.surface = Some(surface);
                    lp.state = PluginState::Initialized;
                    self.logger.info(&format!(
                        "Loaded plugin: {} v{}",
                        name,
                        lp.plugin.version()
                    ));
                }
                Err(e) => {
                    self.logger
                        .error(&format!("Load plugin failed: {}: {}", name, e));
                }
            }
        }
        self.loaded.retain(|lp| lp.state != PluginState::Discovered);
    }

    pub fn start_all(&mut self) {
        for lp in &mut self.loaded {
            if lp.state != PluginState::Initialized {
                continue;
            }
            match lp.plugin.on_start() {
                Ok(()) => lp.state = PluginState::Started,
                Err(e) => self.logger.error(&format!(
                    "Plugin start error: {}: {}",
                    lp.plugin.name(),
                    e
                )),
            }
        }
    }

    /// Best-effort shutdown: `on_stop` once per started plugin, failures
    /// swallowed so shutdown always completes.
    pub fn stop_all(&mut self) {
        for lp in &mut self.loaded {
            if lp.state != PluginState::Started {
                continue;
            }
            if let Err(e) = lp.plugin.on_stop() {
                debug!("Plugin {} stop error (ignored): {}", lp.plugin.name(), e);
            }
            lp.state = PluginState::Stopped;
        }
    }

    /// (id, state, surface) per loaded plugin.
    pub fn loaded(&self) -> Vec<(String, PluginState, Option<UiSurfaceHandle>)> {
        self.loaded
            .iter()
            .map(|lp| (lp.plugin.id().to_string(), lp.state, lp.surface))
            .collect()
    }
}

fn dylib_ext() -> &'static str {
    if cfg!(target_os = "windows") {
        "dll"
    } else if cfg!(target_os = "macos") {
        "dylib"
    } else {
        "so"
    }
}
