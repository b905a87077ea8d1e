//! Generic sortable / searchable / paginated table view.
//!
//! View transforms compose in a fixed order, never reordered:
//!   filter → search → sort → paginate
//!
//! RULES:
//!   - Search and filter changes always reset the current page to 1.
//!   - The page index is re-derived from the result length on every
//!     read — a stale index is clamped, never trusted.
//!   - The view never mutates its rows; collaborators get copies.

use std::cmp::Ordering;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Numbered page buttons rendered at once, centered on the current page.
const PAGE_WINDOW: usize = 5;

// ── Cell values ──────────────────────────────────────────────────────────────

/// A displayable, comparable cell. Strings order case-insensitively,
/// numbers and booleans use native ordering; mixed types tie.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Str(String),
    Num(f64),
    Bool(bool),
}

impl CellValue {
    pub fn display(&self) -> String {
        match self {
            CellValue::Str(s) => s.clone(),
            CellValue::Num(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
            CellValue::Bool(b) => b.to_string(),
        }
    }

    fn compare(&self, other: &CellValue) -> Ordering {
        match (self, other) {
            (CellValue::Str(a), CellValue::Str(b)) => {
                a.to_lowercase().cmp(&b.to_lowercase())
            }
            (CellValue::Num(a), CellValue::Num(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (CellValue::Bool(a), CellValue::Bool(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// The contract a row shape fulfills to be table-viewable. The view
/// itself stays oblivious to what the columns mean.
pub trait TableRow {
    /// Column identifiers, in display order.
    fn columns() -> &'static [&'static str];

    /// The value shown under `column` for this row.
    fn cell(&self, column: &str) -> CellValue;

    /// Lower-cased concatenation of every field's string form; the
    /// search transform matches substrings against this.
    fn search_text(&self) -> String {
        Self::columns()
            .iter()
            .map(|c| self.cell(c).display())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}

// ── Sorting ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    fn flip(self) -> Self {
        match self {
            SortDir::Asc => SortDir::Desc,
            SortDir::Desc => SortDir::Asc,
        }
    }
}

// ── Pagination controls ──────────────────────────────────────────────────────

/// What the pager renders: a capped window of numbered buttons plus
/// first/last shortcuts and ellipses when the window falls short of
/// either boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageControls {
    pub current: usize,
    pub page_count: usize,
    /// Numbered buttons, at most five, centered on `current`.
    pub pages: Vec<usize>,
    pub show_first: bool,
    pub leading_ellipsis: bool,
    pub trailing_ellipsis: bool,
    pub show_last: bool,
    pub prev_enabled: bool,
    pub next_enabled: bool,
}

// ── Table view ───────────────────────────────────────────────────────────────

pub type RowPredicate<T> = Box<dyn Fn(&T) -> bool>;

pub struct TableView<T: TableRow + Clone> {
    rows: Vec<T>,
    filter: Option<RowPredicate<T>>,
    search: String,
    sort: Option<(String, SortDir)>,
    page: usize,
    page_size: usize,
}

impl<T: TableRow + Clone> TableView<T> {
    pub fn new(page_size: usize) -> Self {
        Self {
            rows: Vec::new(),
            filter: None,
            search: String::new(),
            sort: None,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    /// Replace the backing rows wholesale (controller reload path).
    /// Sort, search and filter settings survive; the page is re-clamped.
    pub fn set_rows(&mut self, rows: Vec<T>) {
        self.rows = rows;
        self.page = self.clamped_page(self.result_len());
    }

    /// Install (or clear) the predicate gate. Resets to page 1.
    pub fn set_filter(&mut self, filter: Option<RowPredicate<T>>) {
        self.filter = filter;
        self.page = 1;
    }

    /// Case-insensitive substring search over every field. Resets to
    /// page 1 so the (possibly smaller) result stays reachable.
    pub fn set_search(&mut self, query: &str) {
        self.search = query.trim().to_lowercase();
        self.page = 1;
    }

    /// Click a column header: same column toggles direction, a new
    /// column always starts ascending.
    pub fn toggle_sort(&mut self, column: &str) {
        self.sort = match self.sort.take() {
            Some((prev, dir)) if prev == column => Some((prev, dir.flip())),
            _ => Some((column.to_string(), SortDir::Asc)),
        };
    }

    pub fn sort_state(&self) -> Option<(&str, SortDir)> {
        self.sort.as_ref().map(|(c, d)| (c.as_str(), *d))
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1).min(self.page_count().max(1));
    }

    pub fn page(&self) -> usize {
        self.clamped_page(self.result_len())
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// The full filtered/sorted result set, copied for read-only use by
    /// chart and export collaborators.
    pub fn visible(&self) -> Vec<T> {
        self.result_indices()
            .into_iter()
            .map(|i| self.rows[i].clone())
            .collect()
    }

    /// Rows on the current page, after re-clamping the page index.
    pub fn page_rows(&self) -> Vec<T> {
        let indices = self.result_indices();
        let page = self.clamped_page(indices.len());
        let start = (page - 1) * self.page_size;
        indices
            .into_iter()
            .skip(start)
            .take(self.page_size)
            .map(|i| self.rows[i].clone())
            .collect()
    }

    pub fn result_len(&self) -> usize {
        self.result_indices().len()
    }

    pub fn page_count(&self) -> usize {
        self.result_len().div_ceil(self.page_size)
    }

    /// The "{shown} of {total}" line under the table. An empty result
    /// reads "0 of 0" — that is a state, not an error.
    pub fn status_line(&self) -> String {
        format!("{} of {}", self.page_rows().len(), self.result_len())
    }

    pub fn page_controls(&self) -> PageControls {
        let count = self.page_count().max(1);
        let current = self.clamped_page(self.result_len());

        let mut start = current.saturating_sub(PAGE_WINDOW / 2).max(1);
        let mut end = start + PAGE_WINDOW - 1;
        if end > count {
            end = count;
            start = end.saturating_sub(PAGE_WINDOW - 1).max(1);
        }
        let pages: Vec<usize> = (start..=end).collect();

        PageControls {
            current,
            page_count: count,
            show_first: start > 1,
            leading_ellipsis: start > 2,
            trailing_ellipsis: end + 1 < count,
            show_last: end < count,
            prev_enabled: current > 1,
            next_enabled: current < count,
            pages,
        }
    }

    // Transform pipeline: filter → search → sort, producing indices
    // into `rows` so nothing is cloned until a caller asks for rows.
    fn result_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.rows.len())
            .filter(|&i| {
                let row = &self.rows[i];
                self.filter.as_ref().map_or(true, |f| f(row))
            })
            .filter(|&i| {
                self.search.is_empty() || self.rows[i].search_text().contains(&self.search)
            })
            .collect();

        if let Some((column, dir)) = &self.sort {
            indices.sort_by(|&a, &b| {
                let ord = self.rows[a].cell(column).compare(&self.rows[b].cell(column));
                match dir {
                    SortDir::Asc => ord,
                    SortDir::Desc => ord.reverse(),
                }
            });
        }
        indices
    }

    fn clamped_page(&self, result_len: usize) -> usize {
        let count = result_len.div_ceil(self.page_size).max(1);
        self.page.max(1).min(count)
    }
}
