use crate::config::AppConfig;
use crate::directory::WindowDirectory;
use crate::logger::Logger;
use crate::scheduler::Scheduler;

/// Shared collaborators handed to every plugin at init. Plugins receive a
/// borrow and clone the individual handles they need; they never own the
/// bundle itself.
#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub logger: Logger,
    pub scheduler: Scheduler,
    pub directory: WindowDirectory,
}
