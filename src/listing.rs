//! Generic client-side table behavior: text search, single-key sort and
//! fixed-size pagination.
//!
//! Operates purely on lists already fetched by the gateway; no network
//! activity happens here. The same machinery serves the leads table and
//! the consultant-leads table, parameterized by which fields are
//! searchable and how each sort key compares.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Rows shown per page.
pub const PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Active sort key + direction for one table.
///
/// Selecting the active key again flips direction; selecting a new key
/// makes it active with a default of descending.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortState<K> {
    pub key: K,
    pub direction: SortDirection,
}

impl<K: Copy + PartialEq> SortState<K> {
    pub fn new(key: K, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    pub fn select(&mut self, key: K) {
        if self.key == key {
            self.direction = self.direction.flipped();
        } else {
            self.key = key;
            self.direction = SortDirection::Descending;
        }
    }
}

/// Full presentation state for one table: query, sort, current page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableState<K> {
    pub query: String,
    pub sort: SortState<K>,
    pub page: usize,
}

impl<K: Copy + PartialEq> TableState<K> {
    pub fn new(key: K, direction: SortDirection) -> Self {
        Self {
            query: String::new(),
            sort: SortState::new(key, direction),
            page: 1,
        }
    }

    /// A query change resets pagination to the first page.
    pub fn set_query(&mut self, query: String) {
        self.query = query;
        self.page = 1;
    }

    pub fn select_sort(&mut self, key: K) {
        self.sort.select(key);
    }

    /// Stored as requested; clamped at projection time.
    pub fn set_page(&mut self, page: usize) {
        self.page = page;
    }
}

/// One page of rows plus the numbers the pagination controls need.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePage<T> {
    pub rows: Vec<T>,
    pub page: usize,
    pub page_count: usize,
    pub total: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

/// Compare two nullable fields. A null always sorts after any non-null
/// value; direction only affects the relative order of non-null pairs.
pub fn cmp_nullable<K: Ord + ?Sized>(
    a: Option<&K>,
    b: Option<&K>,
    direction: SortDirection,
) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => match direction {
            SortDirection::Ascending => x.cmp(y),
            SortDirection::Descending => y.cmp(x),
        },
    }
}

/// Case-insensitive substring match over a row's searchable fields.
/// An empty query matches every row.
pub fn matches_query(query: &str, fields: &[Option<&str>]) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    fields
        .iter()
        .flatten()
        .any(|f| f.to_lowercase().contains(&needle))
}

/// Filter rows by query, preserving input order.
pub fn search_rows<'a, T>(
    rows: &'a [T],
    query: &str,
    fields: impl Fn(&T) -> [Option<&str>; 2],
) -> Vec<&'a T> {
    rows.iter()
        .filter(|row| matches_query(query, &fields(row)))
        .collect()
}

/// Clamp a requested page into `[1, ceil(total / PAGE_SIZE)]`. An empty
/// list still has exactly one (empty) page.
pub fn page_count(total: usize) -> usize {
    total.div_ceil(PAGE_SIZE).max(1)
}

/// Slice out one page of rows. The page index is clamped, never an error.
pub fn paginate<T: Clone>(rows: &[&T], requested_page: usize) -> TablePage<T> {
    let total = rows.len();
    let pages = page_count(total);
    let page = requested_page.clamp(1, pages);
    let start = (page - 1) * PAGE_SIZE;
    let slice: Vec<T> = rows
        .iter()
        .skip(start)
        .take(PAGE_SIZE)
        .map(|r| (*r).clone())
        .collect();

    TablePage {
        rows: slice,
        page,
        page_count: pages,
        total,
        has_prev: page > 1,
        has_next: page < pages,
    }
}

/// Search, sort and paginate in one pass. Sorting is stable, so rows that
/// compare equal keep their fetched order.
pub fn project<T: Clone>(
    rows: &[T],
    query: &str,
    fields: impl Fn(&T) -> [Option<&str>; 2],
    compare: impl Fn(&T, &T) -> Ordering,
    page: usize,
) -> TablePage<T> {
    let mut filtered = search_rows(rows, query, fields);
    filtered.sort_by(|a, b| compare(a, b));
    paginate(&filtered, page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        name: Option<String>,
        phone: Option<String>,
    }

    fn row(name: Option<&str>, phone: Option<&str>) -> Row {
        Row {
            name: name.map(String::from),
            phone: phone.map(String::from),
        }
    }

    fn fields(r: &Row) -> [Option<&str>; 2] {
        [r.name.as_deref(), r.phone.as_deref()]
    }

    #[test]
    fn empty_query_is_identity() {
        let rows = vec![row(Some("Ana"), Some("11999990000")), row(None, None)];
        let found = search_rows(&rows, "", fields);
        assert_eq!(found.len(), rows.len());
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let rows = vec![
            row(Some("Ana Souza"), Some("11999990000")),
            row(Some("Bruno"), Some("11888880000")),
        ];
        let found = search_rows(&rows, "ana", fields);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name.as_deref(), Some("Ana Souza"));
    }

    #[test]
    fn search_matches_phone_substring() {
        let rows = vec![
            row(Some("Ana"), Some("11999990000")),
            row(Some("Bruno"), Some("11888880000")),
            row(Some("Clara"), None),
        ];
        let found = search_rows(&rows, "99999", fields);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name.as_deref(), Some("Ana"));
    }

    #[test]
    fn nulls_sort_last_in_both_directions() {
        let mut values = vec![Some("b"), None, Some("a"), None, Some("c")];
        values.sort_by(|a, b| cmp_nullable(a.as_deref(), b.as_deref(), SortDirection::Ascending));
        assert_eq!(values, vec![Some("a"), Some("b"), Some("c"), None, None]);

        let mut values = vec![Some("b"), None, Some("a"), None, Some("c")];
        values.sort_by(|a, b| cmp_nullable(a.as_deref(), b.as_deref(), SortDirection::Descending));
        assert_eq!(values, vec![Some("c"), Some("b"), Some("a"), None, None]);
    }

    #[test]
    fn sort_select_flips_active_key_and_defaults_new_key_descending() {
        #[derive(Debug, Clone, Copy, PartialEq, Serialize)]
        enum Key {
            A,
            B,
        }

        let mut state = SortState::new(Key::A, SortDirection::Descending);
        state.select(Key::A);
        assert_eq!(state.direction, SortDirection::Ascending);
        state.select(Key::B);
        assert!(state.key == Key::B);
        assert_eq!(state.direction, SortDirection::Descending);
    }

    #[test]
    fn pagination_yields_ceil_pages_and_clamps() {
        let rows: Vec<Row> = (0..25)
            .map(|i| row(Some(&format!("r{i}")), None))
            .collect();
        let refs: Vec<&Row> = rows.iter().collect();

        let page = paginate(&refs, 1);
        assert_eq!(page.page_count, 3);
        assert_eq!(page.rows.len(), PAGE_SIZE);
        assert!(!page.has_prev);
        assert!(page.has_next);

        // Beyond the last page clamps to the last.
        let page = paginate(&refs, 99);
        assert_eq!(page.page, 3);
        assert_eq!(page.rows.len(), 5);
        assert!(page.has_prev);
        assert!(!page.has_next);

        // Page zero clamps up to 1.
        let page = paginate(&refs, 0);
        assert_eq!(page.page, 1);
    }

    #[test]
    fn empty_list_is_one_empty_page() {
        let refs: Vec<&Row> = Vec::new();
        let page = paginate(&refs, 1);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_count, 1);
        assert_eq!(page.total, 0);
        assert!(page.rows.is_empty());
        assert!(!page.has_prev);
        assert!(!page.has_next);
    }

    #[test]
    fn query_change_resets_to_first_page() {
        #[derive(Debug, Clone, Copy, PartialEq, Serialize)]
        enum Key {
            A,
        }

        let mut state = TableState::new(Key::A, SortDirection::Descending);
        state.set_page(4);
        state.set_query("ana".to_string());
        assert_eq!(state.page, 1);
        assert_eq!(state.query, "ana");
    }

    #[test]
    fn project_filters_sorts_and_pages() {
        let rows = vec![
            row(Some("b"), Some("1")),
            row(None, Some("2")),
            row(Some("a"), Some("3")),
        ];
        let page = project(
            &rows,
            "",
            fields,
            |a, b| cmp_nullable(a.name.as_deref(), b.name.as_deref(), SortDirection::Ascending),
            1,
        );
        assert_eq!(page.rows[0].name.as_deref(), Some("a"));
        assert_eq!(page.rows[1].name.as_deref(), Some("b"));
        assert_eq!(page.rows[2].name, None);
    }
}
