// Habits aggregation
//
// Reduces the full habit collection into a HabitsReport in a single pass:
// per-color counts plus the lowest and highest scoring habits.

use tracing::debug;

use crate::error::{ReportError, Result};
use crate::types::{Habit, HabitDescription, HabitRange, HabitsReport};

/// Color tags the habits provider attaches to each habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HabitColor {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
}

impl HabitColor {
    pub const ALL: [HabitColor; 5] = [
        HabitColor::Red,
        HabitColor::Orange,
        HabitColor::Yellow,
        HabitColor::Green,
        HabitColor::Blue,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            HabitColor::Red => "red darken-1",
            HabitColor::Orange => "orange darken-1",
            HabitColor::Yellow => "yellow darken-2",
            HabitColor::Green => "light-green darken-1",
            HabitColor::Blue => "blue darken-1",
        }
    }

    /// Unknown tags yield `None` and are left out of the range counts.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|color| color.tag() == tag)
    }
}

impl HabitRange {
    pub fn record(&mut self, color: HabitColor) {
        match color {
            HabitColor::Red => self.red += 1,
            HabitColor::Orange => self.orange += 1,
            HabitColor::Yellow => self.yellow += 1,
            HabitColor::Green => self.green += 1,
            HabitColor::Blue => self.blue += 1,
        }
    }
}

/// Build a report from every habit currently known to the provider.
///
/// Ties on score keep the earliest habit for both `worst` and `best`.
/// An empty collection has no worst or best habit and fails with
/// [`ReportError::EmptyDataSet`].
pub fn summarize(habits: &[Habit]) -> Result<HabitsReport> {
    let Some(first) = habits.first() else {
        return Err(ReportError::EmptyDataSet("habits"));
    };

    let mut range_count = HabitRange::default();
    let mut worst = first;
    let mut best = first;

    for habit in habits {
        if let Some(color) = HabitColor::from_tag(&habit.color) {
            range_count.record(color);
        }
        if habit.score < worst.score {
            worst = habit;
        }
        if habit.score > best.score {
            best = habit;
        }
    }

    debug!(
        "Summarized {} habits: {} categorized, worst score {}, best score {}",
        habits.len(),
        range_count.total(),
        worst.score,
        best.score
    );

    Ok(HabitsReport {
        report_id: 0,
        range_count,
        worst: HabitDescription::from(worst),
        best: HabitDescription::from(best),
    })
}
