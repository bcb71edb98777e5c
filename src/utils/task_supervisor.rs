use tokio::task::JoinHandle;
use std::collections::HashMap;
use crate::error::{Error, Result};
use tracing::{info, error};

/// Task Supervisor - Owns long-running background tasks
///
/// ## Purpose
/// Keeps the join handle of every spawned task so the owner can detect a
/// task that ended (returned or panicked) and abort everything on shutdown.
///
/// ## Usage
/// ```rust,ignore
/// let mut supervisor = TaskSupervisor::new();
///
/// supervisor.spawn("collector", async move {
///     collector.run().await
/// });
///
/// if let Err(e) = supervisor.check_health() {
///     error!("Task failure detected: {:?}", e);
/// }
/// ```
pub struct TaskSupervisor {
    tasks: HashMap<String, JoinHandle<()>>,
}

impl TaskSupervisor {
    pub fn new() -> Self {
        TaskSupervisor {
            tasks: HashMap::new(),
        }
    }

    /// Spawn a new background task and register it for monitoring
    pub fn spawn<F>(&mut self, name: impl Into<String>, future: F) -> &mut Self
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let handle = tokio::spawn(future);

        info!("Spawned background task: {}", name);
        if let Some(previous) = self.tasks.insert(name, handle) {
            previous.abort();
        }
        self
    }

    /// Returns an error naming every task that is no longer running.
    /// Finished tasks are dropped from tracking.
    pub fn check_health(&mut self) -> Result<()> {
        let failed_tasks: Vec<String> = self
            .tasks
            .iter()
            .filter(|(_, handle)| handle.is_finished())
            .map(|(name, _)| name.clone())
            .collect();

        if failed_tasks.is_empty() {
            return Ok(());
        }

        for name in &failed_tasks {
            self.tasks.remove(name);
        }

        let error_msg = format!("Tasks terminated unexpectedly: {:?}", failed_tasks);
        error!("{}", error_msg);
        Err(Error::TaskFailed(error_msg))
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.tasks.get(name).is_some_and(|h| !h.is_finished())
    }

    pub fn active_task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Abort every task and wait for each to unwind.
    pub async fn shutdown_all(&mut self) {
        info!("Shutting down {} background tasks", self.tasks.len());

        for (name, handle) in self.tasks.drain() {
            handle.abort();
            match handle.await {
                Err(e) if e.is_panic() => error!("Task {} panicked: {:?}", name, e),
                _ => info!("Stopped task: {}", name),
            }
        }
    }
}

impl Default for TaskSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TaskSupervisor {
    fn drop(&mut self) {
        for handle in self.tasks.values() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn reports_finished_tasks() {
        let mut supervisor = TaskSupervisor::new();
        supervisor.spawn("short", async {});
        supervisor.spawn("long", async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(supervisor.check_health().is_err());
        assert_eq!(supervisor.active_task_count(), 1);
        assert!(supervisor.is_running("long"));
        assert!(supervisor.check_health().is_ok());

        supervisor.shutdown_all().await;
        assert_eq!(supervisor.active_task_count(), 0);
    }
}
