//! Smoke-test plugin: verifies the plugin system end to end.

use super::{Plugin, UiParent, UiSurfaceHandle};
use crate::context::AppContext;
use crate::logger::Logger;
use crate::Result;

#[derive(Default)]
pub struct HelloPlugin {
    logger: Option<Logger>,
}

impl HelloPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    /// What the tab's button does.
    pub fn hello(&self) {
        if let Some(logger) = &self.logger {
            logger.info("Hello plugin clicked.");
        }
    }
}

impl Plugin for HelloPlugin {
    fn id(&self) -> &str {
        "hello"
    }

    fn name(&self) -> &str {
        "Hello"
    }

    fn version(&self) -> &str {
        "0.2.0"
    }

    fn init(&mut self, ctx: &AppContext) -> Result<()> {
        self.logger = Some(ctx.logger.clone());
        Ok(())
    }

    fn ui_surface(&mut self, parent: UiParent) -> Result<UiSurfaceHandle> {
        Ok(UiSurfaceHandle(parent.0))
    }

    fn on_start(&mut self) -> Result<()> {
        Ok(())
    }

    fn on_stop(&mut self) -> Result<()> {
        Ok(())
    }
}
