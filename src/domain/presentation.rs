use crate::domain::models::ActivityType;

/// Raw value handed to [`format_time`]: absent, a number of seconds, or text
/// that may hold one.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeInput {
    Missing,
    Seconds(i64),
    Text(String),
}

impl From<i64> for TimeInput {
    fn from(value: i64) -> Self {
        Self::Seconds(value)
    }
}

impl From<&str> for TimeInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for TimeInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<TimeInput>> From<Option<T>> for TimeInput {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Missing)
    }
}

/// Formats a second count as `HH:MM:SS`. Empty, non-numeric and negative
/// input formats as an empty string.
pub fn format_time(input: impl Into<TimeInput>) -> String {
    let seconds = match input.into() {
        TimeInput::Missing => return String::new(),
        TimeInput::Seconds(value) => value,
        TimeInput::Text(raw) => match parse_seconds(&raw) {
            Some(value) => value,
            None => return String::new(),
        },
    };
    if seconds < 0 {
        return String::new();
    }

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

fn parse_seconds(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(value) = raw.parse::<i64>() {
        return Some(value);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(|value| value.floor() as i64)
}

impl ActivityType {
    pub fn label(self) -> &'static str {
        match self {
            Self::Work => "Work",
            Self::Break => "Break",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Work => "primary",
            Self::Break => "success",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectOption {
    pub title: &'static str,
    pub value: ActivityType,
}

pub fn activity_type_options() -> Vec<SelectOption> {
    ActivityType::ALL
        .into_iter()
        .map(|value| SelectOption {
            title: value.label(),
            value,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableColumn {
    pub title: &'static str,
    pub key: &'static str,
    pub sortable: bool,
}

pub const TABLE_COLUMNS: [TableColumn; 3] = [
    TableColumn {
        title: "Start (sec)",
        key: "start",
        sortable: true,
    },
    TableColumn {
        title: "End (sec)",
        key: "end",
        sortable: true,
    },
    TableColumn {
        title: "Type",
        key: "type",
        sortable: true,
    },
];
