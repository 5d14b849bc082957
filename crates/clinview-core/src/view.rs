// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::Arc;

use crate::{Collection, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Result-count limit. `Rows(0)` behaves like `All`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "PageSizeRepr")]
pub enum PageSize {
    Rows(usize),
    #[default]
    All,
}

impl PageSize {
    pub const fn rows(self) -> Option<usize> {
        match self {
            Self::Rows(0) | Self::All => None,
            Self::Rows(rows) => Some(rows),
        }
    }
}

impl std::fmt::Display for PageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.rows() {
            Some(rows) => write!(f, "{rows}"),
            None => f.write_str("all"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePageSizeError(String);

impl std::fmt::Display for ParsePageSizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid page size {:?}; use \"all\" or a positive row count",
            self.0
        )
    }
}

impl std::error::Error for ParsePageSizeError {}

impl FromStr for PageSize {
    type Err = ParsePageSizeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        match trimmed.parse::<usize>() {
            Ok(rows) if rows > 0 => Ok(Self::Rows(rows)),
            _ => Err(ParsePageSizeError(raw.to_owned())),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PageSizeRepr {
    Rows(i64),
    Keyword(String),
}

impl TryFrom<PageSizeRepr> for PageSize {
    type Error = ParsePageSizeError;

    fn try_from(repr: PageSizeRepr) -> Result<Self, Self::Error> {
        match repr {
            PageSizeRepr::Rows(rows) if rows > 0 => Ok(Self::Rows(rows as usize)),
            PageSizeRepr::Rows(rows) => Err(ParsePageSizeError(rows.to_string())),
            PageSizeRepr::Keyword(raw) => raw.parse(),
        }
    }
}

/// What happens to search, sort and page size when a collection is swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
    #[default]
    Reset,
    Preserve,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewState {
    search_text: String,
    sort_key: Option<String>,
    sort_direction: SortDirection,
    page_size: PageSize,
    page: usize,
}

impl ViewState {
    pub fn with_page_size(page_size: PageSize) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    pub fn sorted_by(mut self, key: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_key = Some(key.into());
        self.sort_direction = direction;
        self
    }

    pub fn paged(mut self, page_size: PageSize, page: usize) -> Self {
        self.page_size = page_size;
        self.page = page;
        self
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn sort_key(&self) -> Option<&str> {
        self.sort_key.as_deref()
    }

    pub const fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    pub const fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub const fn page(&self) -> usize {
        self.page
    }
}

/// The slice of the matched rows that `ViewResult::rows` holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: usize,
    pub len: usize,
    pub page: usize,
    pub page_count: usize,
}

impl Default for Window {
    fn default() -> Self {
        Self {
            offset: 0,
            len: 0,
            page: 0,
            page_count: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewResult {
    pub rows: Vec<Record>,
    pub matched_count: usize,
    pub total_count: usize,
    pub window: Window,
}

/// Search, then stable sort, then window. Pure.
pub fn derive_view(collection: &Collection, state: &ViewState) -> ViewResult {
    let needle = state.search_text.to_lowercase();
    let searchable = collection
        .fields()
        .iter()
        .filter(|field| field.searchable)
        .map(|field| field.key.as_str())
        .collect::<Vec<_>>();

    let mut matched = collection
        .records()
        .iter()
        .filter(|record| record_matches(record, &searchable, &needle))
        .collect::<Vec<_>>();

    if let Some(key) = active_sort_key(collection, state) {
        let mut keyed = matched
            .into_iter()
            .map(|record| (record.field_text(key).to_lowercase(), record))
            .collect::<Vec<_>>();
        let direction = state.sort_direction;
        keyed.sort_by(|(left, _), (right, _)| compare_keys(left, right, direction));
        matched = keyed.into_iter().map(|(_, record)| record).collect();
    }

    let window = window_for(matched.len(), state.page_size, state.page);
    let rows = matched[window.offset..window.offset + window.len]
        .iter()
        .map(|record| (*record).clone())
        .collect();

    ViewResult {
        rows,
        matched_count: matched.len(),
        total_count: collection.len(),
        window,
    }
}

fn record_matches(record: &Record, searchable: &[&str], needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    searchable
        .iter()
        .any(|key| record.field_text(key).to_lowercase().contains(needle))
}

fn active_sort_key<'a>(collection: &Collection, state: &'a ViewState) -> Option<&'a str> {
    let key = state.sort_key.as_deref()?;
    collection
        .field(key)
        .filter(|field| field.sortable)
        .map(|_| key)
}

// Direction flips the comparator, not the output, so ties stay in input order.
fn compare_keys(left: &str, right: &str, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => left.cmp(right),
        SortDirection::Desc => right.cmp(left),
    }
}

fn window_for(matched: usize, page_size: PageSize, page: usize) -> Window {
    let Some(rows) = page_size.rows() else {
        return Window {
            offset: 0,
            len: matched,
            page: 0,
            page_count: 1,
        };
    };
    let page_count = matched.div_ceil(rows).max(1);
    let page = page.min(page_count - 1);
    let offset = page * rows;
    Window {
        offset,
        len: rows.min(matched - offset),
        page,
        page_count,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortOutcome {
    Applied { key: String, direction: SortDirection },
    Ignored,
}

/// Holds one section's collection and view state, and keeps the derived
/// [`ViewResult`] current after every mutation.
#[derive(Debug, Clone)]
pub struct TabularViewController {
    collection: Arc<Collection>,
    default_page_size: PageSize,
    state: ViewState,
    result: ViewResult,
}

impl TabularViewController {
    pub fn new(collection: Arc<Collection>) -> Self {
        Self::with_default_page_size(collection, PageSize::All)
    }

    pub fn with_default_page_size(collection: Arc<Collection>, page_size: PageSize) -> Self {
        let state = ViewState::with_page_size(page_size);
        let result = derive_view(&collection, &state);
        Self {
            collection,
            default_page_size: page_size,
            state,
            result,
        }
    }

    pub fn collection(&self) -> &Arc<Collection> {
        &self.collection
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn view_result(&self) -> &ViewResult {
        &self.result
    }

    pub fn record(&self, id: &str) -> Option<&Record> {
        self.collection.record(id)
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.state.search_text = text.into();
        self.state.page = 0;
        self.recompute();
    }

    /// Same key toggles direction; a new key starts ascending. Keys that are
    /// unknown or not sortable change nothing.
    pub fn set_sort(&mut self, key: &str) -> SortOutcome {
        if !self
            .collection
            .field(key)
            .is_some_and(|field| field.sortable)
        {
            tracing::debug!(key, "sort ignored");
            return SortOutcome::Ignored;
        }

        if self.state.sort_key.as_deref() == Some(key) {
            self.state.sort_direction = self.state.sort_direction.toggled();
        } else {
            self.state.sort_key = Some(key.to_owned());
            self.state.sort_direction = SortDirection::Asc;
        }
        self.state.page = 0;
        self.recompute();
        tracing::debug!(key, direction = self.state.sort_direction.as_str(), "sort changed");

        SortOutcome::Applied {
            key: key.to_owned(),
            direction: self.state.sort_direction,
        }
    }

    pub fn clear_sort(&mut self) {
        self.state.sort_key = None;
        self.state.sort_direction = SortDirection::Asc;
        self.state.page = 0;
        self.recompute();
    }

    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.state.page_size = page_size;
        self.state.page = 0;
        self.recompute();
    }

    /// Returns whether the visible page changed.
    pub fn set_page(&mut self, page: usize) -> bool {
        if self.state.page_size.rows().is_none() {
            return false;
        }
        let clamped = page.min(self.result.window.page_count - 1);
        if clamped == self.result.window.page {
            return false;
        }
        self.state.page = clamped;
        self.recompute();
        true
    }

    pub fn next_page(&mut self) -> bool {
        self.set_page(self.result.window.page + 1)
    }

    pub fn prev_page(&mut self) -> bool {
        match self.result.window.page.checked_sub(1) {
            Some(page) => self.set_page(page),
            None => false,
        }
    }

    /// Swaps the backing collection. Returns whether the view state was reset.
    pub fn replace_collection(
        &mut self,
        collection: Arc<Collection>,
        policy: RefreshPolicy,
    ) -> bool {
        self.collection = collection;
        let reset = match policy {
            RefreshPolicy::Reset => {
                self.state = ViewState::with_page_size(self.default_page_size);
                true
            }
            RefreshPolicy::Preserve => {
                if let Some(key) = self.state.sort_key.as_deref()
                    && !self
                        .collection
                        .field(key)
                        .is_some_and(|field| field.sortable)
                {
                    self.state.sort_key = None;
                    self.state.sort_direction = SortDirection::Asc;
                }
                false
            }
        };
        self.recompute();
        self.state.page = self.result.window.page;
        tracing::debug!(
            records = self.collection.len(),
            reset,
            "collection replaced"
        );
        reset
    }

    fn recompute(&mut self) {
        self.result = derive_view(&self.collection, &self.state);
    }
}
