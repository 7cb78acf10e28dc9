use admin_report_common::{habits, tasks, Habit, HabitsReport, ReportError, Task, TasksReport};
use anyhow::{Context, Result};
use thiserror::Error;
use tracing::info;

use crate::config::SourcesConfig;
use crate::source::{build_client, HttpSource, RecordSource, SourceError};

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

pub type HabitsSource = Box<dyn RecordSource<Record = Habit>>;
pub type TasksSource = Box<dyn RecordSource<Record = Task>>;

/// Fetch-then-reduce pipeline for both report kinds. Nothing is cached: every
/// call re-fetches the full collection from its provider.
pub struct ReportGenerator {
    habits: HabitsSource,
    tasks: TasksSource,
}

impl ReportGenerator {
    pub fn new(habits: HabitsSource, tasks: TasksSource) -> Self {
        Self { habits, tasks }
    }

    /// Generator talking to the configured HTTP providers.
    pub fn from_config(config: &SourcesConfig) -> Result<Self> {
        let client =
            build_client(config.request_timeout_seconds).context("Failed to build HTTP client")?;

        let habits = HttpSource::<Habit>::new(
            client.clone(),
            "habits",
            &config.habits_url,
            &config.habits_path,
        );
        let tasks = HttpSource::<Task>::new(client, "tasks", &config.tasks_url, &config.tasks_path);

        info!("Habits provider: {}", habits.url());
        info!("Tasks provider: {}", tasks.url());

        Ok(Self::new(Box::new(habits), Box::new(tasks)))
    }

    pub async fn generate_habits_report(&self) -> Result<HabitsReport, GenerateError> {
        let all_habits = self.habits.fetch_all().await?;
        Ok(habits::summarize(&all_habits)?)
    }

    pub async fn generate_tasks_report(&self) -> Result<TasksReport, GenerateError> {
        let all_tasks = self.tasks.fetch_all().await?;
        Ok(tasks::summarize(&all_tasks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StaticSource<T>(Vec<T>);

    #[async_trait]
    impl<T: Clone + Send + Sync> RecordSource for StaticSource<T> {
        type Record = T;

        async fn fetch_all(&self) -> Result<Vec<T>, SourceError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenSource;

    #[async_trait]
    impl RecordSource for BrokenSource {
        type Record = Habit;

        async fn fetch_all(&self) -> Result<Vec<Habit>, SourceError> {
            Err(SourceError::Decode { name: "habits", reason: "expected an array".to_string() })
        }
    }

    fn habit(color: &str, score: i64, user: &str) -> Habit {
        Habit { color: color.to_string(), score, user_id: user.to_string(), ..Default::default() }
    }

    #[tokio::test]
    async fn test_generate_habits_report() {
        let generator = ReportGenerator::new(
            Box::new(StaticSource(vec![
                habit("red darken-1", 1, "u1"),
                habit("blue darken-1", 9, "u2"),
            ])),
            Box::new(StaticSource(Vec::<Task>::new())),
        );

        let report = generator.generate_habits_report().await.unwrap();
        assert_eq!(report.range_count.red, 1);
        assert_eq!(report.range_count.blue, 1);
        assert_eq!(report.worst.user, "u1");
        assert_eq!(report.best.user, "u2");
        assert_eq!(report.report_id, 0);
    }

    #[tokio::test]
    async fn test_generate_tasks_report_from_empty_source() {
        let generator = ReportGenerator::new(
            Box::new(StaticSource(Vec::<Habit>::new())),
            Box::new(StaticSource(Vec::<Task>::new())),
        );

        let report = generator.generate_tasks_report().await.unwrap();
        assert_eq!(report, TasksReport::default());
    }

    #[tokio::test]
    async fn test_empty_habits_is_an_error() {
        let generator = ReportGenerator::new(
            Box::new(StaticSource(Vec::<Habit>::new())),
            Box::new(StaticSource(Vec::<Task>::new())),
        );

        let result = generator.generate_habits_report().await;
        assert!(matches!(result, Err(GenerateError::Report(ReportError::EmptyDataSet(_)))));
    }

    #[tokio::test]
    async fn test_source_errors_propagate() {
        let generator = ReportGenerator::new(
            Box::new(BrokenSource),
            Box::new(StaticSource(Vec::<Task>::new())),
        );

        let result = generator.generate_habits_report().await;
        assert!(matches!(result, Err(GenerateError::Source(SourceError::Decode { .. }))));
    }
}
