use std::fmt;
use time::{Date, OffsetDateTime};

const NANOS_PER_DAY: i128 = 86_400 * 1_000_000_000;

/// Urgency bucket of a due date relative to "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueStatus {
    /// More than a full day past the deadline.
    Overdue,
    /// Deadline within the current day window (including the last 24h).
    DueToday,
    /// Deadline between one and two days out.
    DueTomorrow,
    /// Deadline within the next week.
    DueInDays(u8),
    /// Deadline further away.
    Later(Date),
}

impl DueStatus {
    /// Classify `due` using ceiling day differences from `now`.
    #[must_use]
    pub fn classify(due: OffsetDateTime, now: OffsetDateTime) -> Self {
        let nanos = (due - now).whole_nanoseconds();
        let mut days = nanos.div_euclid(NANOS_PER_DAY);
        if nanos.rem_euclid(NANOS_PER_DAY) != 0 {
            days += 1;
        }

        match days {
            d if d < 0 => Self::Overdue,
            0 => Self::DueToday,
            1 => Self::DueTomorrow,
            // 2..=7 always fits in a u8.
            d @ 2..=7 => Self::DueInDays(u8::try_from(d).unwrap_or(u8::MAX)),
            _ => Self::Later(due.date()),
        }
    }

    /// Returns true for [`DueStatus::Overdue`].
    #[must_use]
    pub const fn is_overdue(self) -> bool {
        matches!(self, Self::Overdue)
    }
}

impl fmt::Display for DueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overdue => f.write_str("Overdue"),
            Self::DueToday => f.write_str("Due today"),
            Self::DueTomorrow => f.write_str("Due tomorrow"),
            Self::DueInDays(days) => write!(f, "Due in {days} days"),
            Self::Later(date) => write!(f, "{date}"),
        }
    }
}
