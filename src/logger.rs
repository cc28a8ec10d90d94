use log::{error, info, warn};
use std::sync::Arc;

/// Line-oriented sink for user-visible log output. The GUI shell hands the
/// application a sink backed by its log pane; headless runs use [`Logger::facade`].
pub trait LogSink: Send + Sync {
    fn line(&self, line: &str);
}

struct FacadeSink;

impl LogSink for FacadeSink {
    fn line(&self, _line: &str) {}
}

/// Cheap-clone handle shared through the app context. Every message goes to the
/// `log` facade; the sink additionally receives the user-facing line.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn LogSink>,
}

impl Logger {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    /// Logger with no extra sink; output reaches only the `log` facade.
    pub fn facade() -> Self {
        Self::new(Arc::new(FacadeSink))
    }

    pub fn info(&self, msg: &str) {
        info!("{}", msg);
        self.sink.line(msg);
    }

    pub fn warn(&self, msg: &str) {
        warn!("{}", msg);
        self.sink.line(&format!("[WARN] {}", msg));
    }

    pub fn error(&self, msg: &str) {
        error!("{}", msg);
        self.sink.line(&format!("[ERROR] {}", msg));
    }
}
