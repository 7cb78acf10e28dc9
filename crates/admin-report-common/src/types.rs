use serde::{Deserialize, Deserializer, Serialize};

/// A single habit as served by the habits provider.
///
/// Fields missing from the payload (or explicitly `null`) fall back to their
/// zero value, so partially filled records still take part in a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Habit {
    #[serde(deserialize_with = "null_as_default")]
    pub difficulty: String,
    /// Category tag, one of the [`crate::habits::HabitColor`] tags when recognized
    #[serde(deserialize_with = "null_as_default")]
    pub color: String,
    #[serde(deserialize_with = "null_as_default")]
    pub score: i64,
    #[serde(rename = "_id", alias = "habitID", deserialize_with = "null_as_default")]
    pub habit_id: String,
    #[serde(rename = "userID", alias = "userId", deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
}

/// A single task as served by the tasks provider. All dates are unix seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Task {
    /// `None` while the task is still open
    pub completed_date: Option<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub due_date: i64,
    #[serde(rename = "remind", alias = "reminder", deserialize_with = "null_as_default")]
    pub reminder: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(rename = "userId", alias = "userID", deserialize_with = "null_as_default")]
    pub user_id: String,
}

/// Number of habits per known color tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitRange {
    pub red: u32,
    pub orange: u32,
    pub yellow: u32,
    pub green: u32,
    pub blue: u32,
}

impl HabitRange {
    pub fn total(&self) -> u32 {
        self.red + self.orange + self.yellow + self.green + self.blue
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitDescription {
    pub user: String,
    pub title: String,
}

impl From<&Habit> for HabitDescription {
    fn from(habit: &Habit) -> Self {
        Self { user: habit.user_id.clone(), title: habit.title.clone() }
    }
}

/// Aggregate snapshot of all habits at the time the report was generated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitsReport {
    /// Assigned by the report store; zero until persisted
    #[serde(rename = "reportID")]
    pub report_id: i64,
    pub range_count: HabitRange,
    pub worst: HabitDescription,
    pub best: HabitDescription,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedDescription {
    pub total: u32,
    pub on_time: u32,
    pub late: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableDescription {
    pub total: u32,
    pub due_today: u32,
}

/// Aggregate snapshot of all tasks at the time the report was generated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TasksReport {
    /// Assigned by the report store; zero until persisted
    #[serde(rename = "reportID")]
    pub report_id: i64,
    pub completed: CompletedDescription,
    pub delayed: u32,
    pub available: AvailableDescription,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
