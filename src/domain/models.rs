use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActivityType {
    Work,
    Break,
}

impl ActivityType {
    pub const ALL: [ActivityType; 2] = [Self::Work, Self::Break];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Work => "WORK",
            Self::Break => "BREAK",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "WORK" => Some(Self::Work),
            "BREAK" => Some(Self::Break),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Interval {
    pub id: String,
    pub start: i64,
    pub end: i64,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub created_at: DateTime<Utc>,
}

impl Interval {
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("interval.id must not be empty".to_string());
        }
        validate_bounds(self.start, self.end)
    }

    pub fn overlaps(&self, start: i64, end: i64) -> bool {
        self.start < end && self.end > start
    }
}

/// Body of a create request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewInterval {
    pub start: i64,
    pub end: i64,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
}

impl NewInterval {
    pub fn new(start: i64, end: i64, activity_type: ActivityType) -> Self {
        Self {
            start,
            end,
            activity_type,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_bounds(self.start, self.end)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IntervalPage {
    pub intervals: Vec<Interval>,
    pub total_elements: u64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("asc") {
            Some(Self::Asc)
        } else if value.eq_ignore_ascii_case("desc") {
            Some(Self::Desc)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortField {
    #[default]
    Start,
    End,
    Type,
    CreatedAt,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Type => "type",
            Self::CreatedAt => "createdAt",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "start" => Some(Self::Start),
            "end" => Some(Self::End),
            "type" => Some(Self::Type),
            "createdAt" => Some(Self::CreatedAt),
            _ => None,
        }
    }
}

/// Single-key ordering applied before pagination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Parses the `field,direction` query value. Anything that does not name
    /// both a known field and a known direction yields `start,asc`.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
            return Self::default();
        };
        let mut parts = raw.splitn(2, ',');
        let field = parts.next().and_then(SortField::parse);
        let direction = parts.next().and_then(SortDirection::parse);
        match (field, direction) {
            (Some(field), Some(direction)) => Self::new(field, direction),
            _ => Self::default(),
        }
    }

    pub fn to_query_value(&self) -> String {
        format!("{},{}", self.field.as_str(), self.direction.as_str())
    }
}

/// Zero-based page request as it arrives on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    pub page: u32,
    pub size: u32,
    pub sort: SortSpec,
}

impl PageQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

fn validate_bounds(start: i64, end: i64) -> Result<(), String> {
    if start < 0 {
        return Err("start must be >= 0".to_string());
    }
    if start >= end {
        return Err("start must be less than end".to_string());
    }
    Ok(())
}
