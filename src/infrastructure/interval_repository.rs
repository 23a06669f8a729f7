use crate::domain::models::{
    ActivityType, Interval, IntervalPage, PageQuery, SortDirection, SortField,
};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::storage::open_connection;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, TransactionBehavior, params};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub trait IntervalRepository: Send + Sync {
    /// Stores `interval` unless it overlaps a stored one. Returns `false`
    /// when an overlap prevented the insert.
    fn insert_non_overlapping(&self, interval: &Interval) -> Result<bool, InfraError>;
    fn page(&self, query: &PageQuery) -> Result<IntervalPage, InfraError>;
}

#[derive(Debug, Clone)]
pub struct SqliteIntervalRepository {
    db_path: PathBuf,
}

impl SqliteIntervalRepository {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    fn connect(&self) -> Result<Connection, InfraError> {
        open_connection(&self.db_path)
    }

    fn order_column(field: SortField) -> &'static str {
        match field {
            SortField::Start => "start",
            SortField::End => "\"end\"",
            SortField::Type => "type",
            SortField::CreatedAt => "created_at",
        }
    }

    fn order_direction(direction: SortDirection) -> &'static str {
        match direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

type IntervalRow = (String, i64, i64, String, String);

fn row_to_interval((id, start, end, activity_type, created_at): IntervalRow) -> Result<Interval, InfraError> {
    let activity_type = ActivityType::parse(&activity_type).ok_or_else(|| {
        InfraError::InvalidConfig(format!("invalid intervals.type '{activity_type}' for id {id}"))
    })?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|error| {
            InfraError::InvalidConfig(format!(
                "invalid intervals.created_at '{created_at}': {error}"
            ))
        })?
        .with_timezone(&Utc);

    Ok(Interval {
        id,
        start,
        end,
        activity_type,
        created_at,
    })
}

fn to_sql_int(value: u64, field: &str) -> Result<i64, InfraError> {
    i64::try_from(value).map_err(|_| InfraError::Validation(format!("{field} is out of range")))
}

impl IntervalRepository for SqliteIntervalRepository {
    fn insert_non_overlapping(&self, interval: &Interval) -> Result<bool, InfraError> {
        let mut connection = self.connect()?;
        let transaction = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let overlapping: bool = transaction.query_row(
            "SELECT EXISTS(SELECT 1 FROM intervals WHERE start < ?2 AND \"end\" > ?1)",
            params![interval.start, interval.end],
            |row| row.get(0),
        )?;
        if overlapping {
            return Ok(false);
        }

        transaction.execute(
            "INSERT INTO intervals (id, start, \"end\", type, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                interval.id,
                interval.start,
                interval.end,
                interval.activity_type.as_str(),
                interval.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            ],
        )?;
        transaction.commit()?;
        Ok(true)
    }

    fn page(&self, query: &PageQuery) -> Result<IntervalPage, InfraError> {
        let connection = self.connect()?;
        let total: i64 =
            connection.query_row("SELECT COUNT(*) FROM intervals", [], |row| row.get(0))?;

        let sql = format!(
            "SELECT id, start, \"end\", type, created_at FROM intervals
             ORDER BY {} {}, created_at ASC, id ASC
             LIMIT ?1 OFFSET ?2",
            Self::order_column(query.sort.field),
            Self::order_direction(query.sort.direction),
        );
        let mut statement = connection.prepare(&sql)?;
        let rows = statement
            .query_map(
                params![
                    i64::from(query.size),
                    to_sql_int(query.offset(), "page offset")?
                ],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )?
            .collect::<Result<Vec<IntervalRow>, _>>()?;

        let intervals = rows
            .into_iter()
            .map(row_to_interval)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(IntervalPage {
            intervals,
            total_elements: u64::try_from(total).unwrap_or_default(),
        })
    }
}

#[derive(Debug, Default)]
pub struct InMemoryIntervalRepository {
    intervals: Mutex<Vec<Interval>>,
}

impl InMemoryIntervalRepository {
    fn compare(left: &Interval, right: &Interval, query: &PageQuery) -> Ordering {
        let primary = match query.sort.field {
            SortField::Start => left.start.cmp(&right.start),
            SortField::End => left.end.cmp(&right.end),
            SortField::Type => left.activity_type.as_str().cmp(right.activity_type.as_str()),
            SortField::CreatedAt => left.created_at.cmp(&right.created_at),
        };
        let primary = match query.sort.direction {
            SortDirection::Asc => primary,
            SortDirection::Desc => primary.reverse(),
        };
        primary
            .then_with(|| left.created_at.cmp(&right.created_at))
            .then_with(|| left.id.cmp(&right.id))
    }
}

impl IntervalRepository for InMemoryIntervalRepository {
    fn insert_non_overlapping(&self, interval: &Interval) -> Result<bool, InfraError> {
        let mut intervals = self
            .intervals
            .lock()
            .map_err(|error| InfraError::InvalidConfig(format!("interval store lock poisoned: {error}")))?;
        if intervals
            .iter()
            .any(|stored| stored.overlaps(interval.start, interval.end))
        {
            return Ok(false);
        }
        intervals.push(interval.clone());
        Ok(true)
    }

    fn page(&self, query: &PageQuery) -> Result<IntervalPage, InfraError> {
        let intervals = self
            .intervals
            .lock()
            .map_err(|error| InfraError::InvalidConfig(format!("interval store lock poisoned: {error}")))?;
        let mut sorted = intervals.clone();
        sorted.sort_by(|left, right| Self::compare(left, right, query));

        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        Ok(IntervalPage {
            intervals: sorted
                .into_iter()
                .skip(offset)
                .take(query.size as usize)
                .collect(),
            total_elements: intervals.len() as u64,
        })
    }
}
