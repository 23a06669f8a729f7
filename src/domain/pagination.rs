/// Number of pages needed for `total_elements`; never less than 1.
pub fn total_pages(total_elements: i64, items_per_page: i64) -> u64 {
    if total_elements <= 0 || items_per_page <= 0 {
        return 1;
    }
    (total_elements as u64).div_ceil(items_per_page as u64)
}

/// Human-readable `start-end` position of the current page, `0-0` when the
/// page holds nothing.
pub fn current_range(page: u32, items_per_page: u32, item_count: usize) -> String {
    if item_count == 0 {
        return "0-0".to_string();
    }
    let first = u64::from(page.saturating_sub(1)) * u64::from(items_per_page) + 1;
    let last = first + item_count as u64 - 1;
    format!("{first}-{last}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(25, 10), 3);
        assert_eq!(total_pages(30, 10), 3);
        assert_eq!(total_pages(1, 10), 1);
    }

    #[test]
    fn total_pages_is_one_for_non_positive_inputs() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(-5, 10), 1);
        assert_eq!(total_pages(42, 0), 1);
        assert_eq!(total_pages(42, -1), 1);
    }

    #[test]
    fn current_range_reports_page_window() {
        assert_eq!(current_range(2, 10, 5), "11-15");
        assert_eq!(current_range(1, 10, 10), "1-10");
        assert_eq!(current_range(3, 10, 0), "0-0");
    }

    proptest! {
        #[test]
        fn total_pages_matches_ceiling_division(
            total in 0i64..1_000_000i64,
            per_page in 1i64..1_000i64
        ) {
            let expected = if total == 0 {
                1
            } else {
                ((total as f64) / (per_page as f64)).ceil() as u64
            };
            prop_assert_eq!(total_pages(total, per_page), expected);
        }
    }

    proptest! {
        #[test]
        fn current_range_spans_item_count(
            page in 1u32..1_000u32,
            per_page in 1u32..100u32,
            count in 1usize..100usize
        ) {
            let range = current_range(page, per_page, count);
            let (first, last) = range.split_once('-').expect("dash separated");
            let first: u64 = first.parse().expect("numeric start");
            let last: u64 = last.parse().expect("numeric end");
            prop_assert_eq!(last - first + 1, count as u64);
            prop_assert_eq!(first, u64::from(page - 1) * u64::from(per_page) + 1);
        }
    }
}
