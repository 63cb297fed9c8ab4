use crate::app::lifecycle::context::StartupContext;
use crate::app::lifecycle::startup::tasks::config_load::ConfigLoadTask;
use crate::app::lifecycle::startup::tasks::engine_build::EngineBuildTask;
use crate::app::lifecycle::startup::tasks::observability::ConfigureObservabilityTask;
use crate::app::lifecycle::startup::tasks::transport_init::TransportInitTask;
use crate::core::config_manager::ConfigManager;
use anyhow::{Context, Error};
use std::path::PathBuf;
use tracing::debug;

/// One step of process startup. Tasks run in order against a
/// shared context and any failure aborts the rest
pub trait StartupTask: Send + Sync {
    fn name(&self) -> &'static str;

    fn run(&self, context: &StartupContext) -> Result<(), Error>;
}

pub struct StartupPipeline {
    tasks: Vec<Box<dyn StartupTask>>,
}

impl StartupPipeline {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    pub fn with_task(mut self, task: Box<dyn StartupTask>) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn run(&self, context: &StartupContext) -> Result<(), Error> {
        for task in &self.tasks {
            task.run(context)
                .with_context(|| format!("Startup task {} failed", task.name()))?;

            debug!(task = task.name(), "Startup task complete");
        }

        Ok(())
    }
}

impl Default for StartupPipeline {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_start_pipeline(cfg_path: PathBuf) -> StartupPipeline {
    let cfg_manager = ConfigManager::new(cfg_path);

    StartupPipeline::new()
        .with_task(Box::new(ConfigLoadTask::new(cfg_manager)))
        .with_task(Box::new(ConfigureObservabilityTask))
        .with_task(Box::new(TransportInitTask))
        .with_task(Box::new(EngineBuildTask))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct Step {
        name: &'static str,
        fail: bool,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl StartupTask for Step {
        fn name(&self) -> &'static str {
            self.name
        }

        fn run(&self, _context: &StartupContext) -> Result<(), Error> {
            self.log.lock().push(self.name);
            if self.fail {
                anyhow::bail!("boom");
            }
            Ok(())
        }
    }

    fn step(name: &'static str, fail: bool, log: &Arc<Mutex<Vec<&'static str>>>) -> Box<dyn StartupTask> {
        Box::new(Step {
            name,
            fail,
            log: log.clone(),
        })
    }

    #[test]
    fn test_tasks_run_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = StartupPipeline::new()
            .with_task(step("a", false, &log))
            .with_task(step("b", false, &log));

        pipeline.run(&StartupContext::default()).unwrap();
        assert_eq!(*log.lock(), vec!["a", "b"]);
    }

    #[test]
    fn test_failure_stops_pipeline() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = StartupPipeline::new()
            .with_task(step("a", true, &log))
            .with_task(step("b", false, &log));

        let err = pipeline.run(&StartupContext::default()).unwrap_err();
        assert!(err.to_string().contains("Startup task a failed"));
        assert_eq!(*log.lock(), vec!["a"]);
    }
}
