use crate::domain::models::SortDirection;
use serde::{Deserialize, Serialize};

pub const VIEW_SETTINGS_KEY: &str = "intervals_table_settings";
pub const DEFAULT_ITEMS_PER_PAGE: u32 = 10;
const DEFAULT_SORT_KEY: &str = "start";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortItem {
    pub key: String,
    pub order: SortDirection,
}

impl SortItem {
    pub fn new(key: impl Into<String>, order: SortDirection) -> Self {
        Self {
            key: key.into(),
            order,
        }
    }
}

/// Page/size/sort triple the interval table is displayed with. `page` is
/// 1-based.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ViewSettings {
    pub page: u32,
    pub items_per_page: u32,
    pub sort_by: Vec<SortItem>,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            page: 1,
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            sort_by: vec![SortItem::new(DEFAULT_SORT_KEY, SortDirection::Asc)],
        }
    }
}

impl ViewSettings {
    pub fn new(page: u32, items_per_page: u32, sort_by: Vec<SortItem>) -> Self {
        Self {
            page,
            items_per_page,
            sort_by,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.page == 0 {
            return Err("settings.page must be >= 1".to_string());
        }
        if self.items_per_page == 0 {
            return Err("settings.itemsPerPage must be > 0".to_string());
        }
        for item in &self.sort_by {
            if item.key.trim().is_empty() {
                return Err("settings.sortBy[].key must not be empty".to_string());
            }
        }
        Ok(())
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        let settings: Self =
            serde_json::from_str(raw).map_err(|error| format!("invalid settings json: {error}"))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Zero-based page index sent to the server.
    pub fn wire_page(&self) -> u32 {
        self.page.saturating_sub(1)
    }

    /// Only the first sort key reaches the server.
    pub fn wire_sort(&self) -> String {
        match self.sort_by.first() {
            Some(item) => format!("{},{}", item.key, item.order.as_str()),
            None => format!("{DEFAULT_SORT_KEY},{}", SortDirection::Asc.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_settings_match_documented_values() {
        let settings = ViewSettings::default();
        assert_eq!(settings.page, 1);
        assert_eq!(settings.items_per_page, 10);
        assert_eq!(settings.sort_by, vec![SortItem::new("start", SortDirection::Asc)]);
    }

    #[test]
    fn parse_reads_persisted_shape() {
        let raw = r#"{"page":3,"itemsPerPage":25,"sortBy":[{"key":"end","order":"desc"}]}"#;
        let settings = ViewSettings::parse(raw).expect("parse settings");
        assert_eq!(
            settings,
            ViewSettings::new(3, 25, vec![SortItem::new("end", SortDirection::Desc)])
        );
    }

    #[test]
    fn parse_rejects_malformed_documents() {
        for raw in [
            "",
            "not json",
            r#"{"page":1}"#,
            r#"{"page":0,"itemsPerPage":10,"sortBy":[]}"#,
            r#"{"page":1,"itemsPerPage":0,"sortBy":[]}"#,
            r#"{"page":1,"itemsPerPage":10,"sortBy":[{"key":"start","order":"sideways"}]}"#,
            r#"{"page":-2,"itemsPerPage":10,"sortBy":[]}"#,
        ] {
            assert!(ViewSettings::parse(raw).is_err(), "raw={raw}");
        }
    }

    #[test]
    fn wire_values_use_first_sort_key_only() {
        let settings = ViewSettings::new(
            2,
            10,
            vec![
                SortItem::new("type", SortDirection::Desc),
                SortItem::new("start", SortDirection::Asc),
            ],
        );
        assert_eq!(settings.wire_page(), 1);
        assert_eq!(settings.wire_sort(), "type,desc");

        let unsorted = ViewSettings::new(1, 10, Vec::new());
        assert_eq!(unsorted.wire_page(), 0);
        assert_eq!(unsorted.wire_sort(), "start,asc");
    }

    proptest! {
        #[test]
        fn serialized_settings_parse_back(
            page in 1u32..10_000u32,
            items_per_page in 1u32..500u32,
            descending in any::<bool>()
        ) {
            let order = if descending { SortDirection::Desc } else { SortDirection::Asc };
            let settings = ViewSettings::new(page, items_per_page, vec![SortItem::new("end", order)]);
            let raw = serde_json::to_string(&settings).expect("serialize settings");
            prop_assert_eq!(ViewSettings::parse(&raw).expect("parse settings"), settings);
        }
    }
}
