//! Scheduled-messages tab: recurring jobs that focus a target window and stage
//! a message on the clipboard for manual paste. No automated sending.

use super::{Plugin, UiParent, UiSurfaceHandle};
use crate::context::AppContext;
use crate::logger::Logger;
use crate::scheduler::{Job, JobAction, Scheduler};
use crate::Result;
use anyhow::{anyhow, bail};

const TASK_PREFIX: &str = "task-";

#[derive(Default)]
pub struct MessagesPlugin {
    scheduler: Option<Scheduler>,
    logger: Option<Logger>,
    next_task: u64,
}

impl MessagesPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    fn scheduler(&self) -> Result<&Scheduler> {
        self.scheduler
            .as_ref()
            .ok_or_else(|| anyhow!("plugin not initialized"))
    }

    /// Validate the tab's raw form inputs and upsert a job. Everything is
    /// checked before any state is committed; a rejected task leaves the
    /// scheduler untouched.
    pub fn add_task(
        &mut self,
        window_index: Option<usize>,
        interval: &str,
        message: &str,
    ) -> Result<String> {
        let scheduler = self.scheduler()?.clone();

        let Some(window_index) = window_index else {
            bail!("select a target window first");
        };
        let interval_secs: u64 = interval
            .trim()
            .parse()
            .map_err(|_| anyhow!("interval must be a whole number of seconds"))?;
        if interval_secs == 0 {
            bail!("interval must be at least 1 second");
        }
        let message = message.trim();
        if message.is_empty() {
            bail!("message must not be empty");
        }

        self.next_task += 1;
        let id = format!("{}{}", TASK_PREFIX, self.next_task);
        scheduler.add_or_update(Job {
            id: id.clone(),
            interval_secs,
            action: JobAction::StageMessage {
                window_index,
                message: message.to_string(),
            },
            enabled: true,
        });

        if let Some(logger) = &self.logger {
            logger.info(&format!(
                "Task {} scheduled every {}s for window {}",
                id, interval_secs, window_index
            ));
        }
        Ok(id)
    }

    pub fn set_enabled(&self, id: &str, enabled: bool) -> Result<()> {
        let scheduler = self.scheduler()?;
        let mut job = scheduler
            .list_jobs()
            .into_iter()
            .find(|j| j.id == id)
            .ok_or_else(|| anyhow!("no such task: {}", id))?;
        job.enabled = enabled;
        scheduler.add_or_update(job);
        Ok(())
    }

    pub fn remove_task(&self, id: &str) -> Result<()> {
        self.scheduler()?.remove(id);
        Ok(())
    }

    /// Tasks owned by this tab, in id order.
    pub fn tasks(&self) -> Vec<Job> {
        self.scheduler
            .as_ref()
            .map(|s| {
                s.list_jobs()
                    .into_iter()
                    .filter(|j| j.id.starts_with(TASK_PREFIX))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Plugin for MessagesPlugin {
    fn id(&self) -> &str {
        "messages"
    }

    fn name(&self) -> &str {
        "Scheduled Messages"
    }

    fn version(&self) -> &str {
        "0.2.0"
    }

    fn init(&mut self, ctx: &AppContext) -> Result<()> {
        self.scheduler = Some(ctx.scheduler.clone());
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
        // Jobs stay registered; the scheduler itself is stopped by the host app.
        Ok(())
    }
}
