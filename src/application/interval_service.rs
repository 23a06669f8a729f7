use crate::domain::models::{Interval, IntervalPage, NewInterval, PageQuery, SortSpec};
use crate::infrastructure::config::ServerConfig;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::interval_repository::IntervalRepository;
use chrono::{DateTime, SubsecRound, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub const OVERLAP_MESSAGE: &str = "interval overlaps an existing interval";

type NowProvider = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_size: u32,
    pub max_size: u32,
}

impl From<&ServerConfig> for PageLimits {
    fn from(config: &ServerConfig) -> Self {
        Self {
            default_size: config.default_page_size,
            max_size: config.max_page_size,
        }
    }
}

impl Default for PageLimits {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

/// Validates and serves interval operations over a repository.
#[derive(Clone)]
pub struct IntervalService {
    repository: Arc<dyn IntervalRepository>,
    limits: PageLimits,
    now_provider: NowProvider,
}

impl IntervalService {
    pub fn new(repository: Arc<dyn IntervalRepository>, limits: PageLimits) -> Self {
        Self {
            repository,
            limits,
            now_provider: Arc::new(Utc::now),
        }
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    pub fn create(&self, request: NewInterval) -> Result<Interval, InfraError> {
        info!(
            start = request.start,
            end = request.end,
            activity_type = request.activity_type.as_str(),
            "creating interval"
        );

        if let Err(message) = request.validate() {
            warn!(start = request.start, end = request.end, %message, "interval rejected");
            return Err(InfraError::Validation(message));
        }

        let interval = Interval {
            id: Uuid::new_v4().to_string(),
            start: request.start,
            end: request.end,
            activity_type: request.activity_type,
            created_at: (self.now_provider)().trunc_subsecs(6),
        };

        if !self.repository.insert_non_overlapping(&interval)? {
            warn!(start = interval.start, end = interval.end, "interval overlaps an existing one");
            return Err(InfraError::Overlap(OVERLAP_MESSAGE.to_string()));
        }

        info!(
            id = %interval.id,
            start = interval.start,
            end = interval.end,
            activity_type = interval.activity_type.as_str(),
            "interval created"
        );
        Ok(interval)
    }

    /// Lists one zero-based page. Missing `page`/`size` fall back to the
    /// first page and the configured default size.
    pub fn list(
        &self,
        page: Option<i64>,
        size: Option<i64>,
        sort: Option<&str>,
    ) -> Result<IntervalPage, InfraError> {
        let query = self.page_query(page, size, sort)?;
        let page = self.repository.page(&query)?;
        info!(
            page = query.page,
            size = query.size,
            sort = %query.sort.to_query_value(),
            returned = page.intervals.len(),
            total = page.total_elements,
            "listed intervals"
        );
        Ok(page)
    }

    pub fn page_query(
        &self,
        page: Option<i64>,
        size: Option<i64>,
        sort: Option<&str>,
    ) -> Result<PageQuery, InfraError> {
        let page = page.unwrap_or(0);
        if page < 0 {
            return Err(InfraError::Validation("page must be >= 0".to_string()));
        }
        let page = u32::try_from(page)
            .map_err(|_| InfraError::Validation("page is out of range".to_string()))?;

        let size = size.unwrap_or(i64::from(self.limits.default_size));
        if size <= 0 {
            return Err(InfraError::Validation("size must be > 0".to_string()));
        }
        let size = u32::try_from(size)
            .unwrap_or(u32::MAX)
            .min(self.limits.max_size);

        Ok(PageQuery {
            page,
            size,
            sort: SortSpec::parse_or_default(sort),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ActivityType, SortDirection, SortField};
    use crate::infrastructure::interval_repository::InMemoryIntervalRepository;

    fn fixed_now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-02-16T09:00:00.123456789Z")
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    fn service() -> IntervalService {
        IntervalService::new(
            Arc::new(InMemoryIntervalRepository::default()),
            PageLimits::default(),
        )
        .with_now_provider(Arc::new(fixed_now))
    }

    #[test]
    fn create_assigns_id_and_timestamp() {
        let service = service();
        let created = service
            .create(NewInterval::new(0, 1500, ActivityType::Work))
            .expect("create interval");

        assert!(Uuid::parse_str(&created.id).is_ok());
        assert_eq!(created.start, 0);
        assert_eq!(created.end, 1500);
        assert_eq!(created.activity_type, ActivityType::Work);
        assert_eq!(created.created_at, fixed_now().trunc_subsecs(6));
    }

    #[test]
    fn create_accepts_break_and_day_boundaries() {
        let service = service();
        assert!(service.create(NewInterval::new(0, 86_400, ActivityType::Break)).is_ok());
    }

    #[test]
    fn create_rejects_invalid_bounds_without_touching_store() {
        let service = service();
        for (start, end) in [(1000, 1000), (2000, 1000), (-10, 10)] {
            match service.create(NewInterval::new(start, end, ActivityType::Work)) {
                Err(InfraError::Validation(_)) => {}
                other => panic!("expected validation error, got {other:?}"),
            }
        }
        let page = service.list(None, None, None).expect("list");
        assert_eq!(page.total_elements, 0);
    }

    #[test]
    fn create_rejects_overlap_but_accepts_touching_interval() {
        let service = service();
        service
            .create(NewInterval::new(100, 200, ActivityType::Work))
            .expect("first interval");

        match service.create(NewInterval::new(150, 250, ActivityType::Break)) {
            Err(InfraError::Overlap(message)) => assert_eq!(message, OVERLAP_MESSAGE),
            other => panic!("expected overlap error, got {other:?}"),
        }
        assert!(service.create(NewInterval::new(200, 300, ActivityType::Break)).is_ok());
    }

    #[test]
    fn list_returns_requested_page_with_total() {
        let service = service();
        for index in 0..5 {
            service
                .create(NewInterval::new(index * 100, index * 100 + 50, ActivityType::Work))
                .expect("create interval");
        }

        let page = service.list(Some(1), Some(2), Some("start,desc")).expect("list");
        assert_eq!(page.total_elements, 5);
        let starts = page.intervals.iter().map(|i| i.start).collect::<Vec<_>>();
        assert_eq!(starts, vec![200, 100]);
    }

    #[test]
    fn page_query_applies_defaults_and_limits() {
        let service = service();
        let query = service.page_query(None, None, None).expect("defaults");
        assert_eq!(query.page, 0);
        assert_eq!(query.size, 10);
        assert_eq!(query.sort, SortSpec::new(SortField::Start, SortDirection::Asc));

        let clamped = service.page_query(Some(3), Some(5_000), Some("end,desc")).expect("clamped");
        assert_eq!(clamped.page, 3);
        assert_eq!(clamped.size, 100);
        assert_eq!(clamped.sort, SortSpec::new(SortField::End, SortDirection::Desc));
    }

    #[test]
    fn page_query_rejects_negative_page_and_empty_size() {
        let service = service();
        assert!(matches!(
            service.page_query(Some(-1), None, None),
            Err(InfraError::Validation(_))
        ));
        assert!(matches!(
            service.page_query(None, Some(0), None),
            Err(InfraError::Validation(_))
        ));
    }
}
