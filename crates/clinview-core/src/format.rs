// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{FieldDescriptor, FieldValue, Record, SortDirection, ViewResult, ViewState};

const SORT_ASC_MARK: &str = " ↑";
const SORT_DESC_MARK: &str = " ↓";
const ELLIPSIS: char = '…';
const COLUMN_GAP: &str = "  ";

impl FieldValue {
    /// The string form used for display, search and sort.
    pub fn display(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Text(value) => value.clone(),
            Self::Bool(true) => "yes".to_owned(),
            Self::Bool(false) => "no".to_owned(),
            Self::Integer(value) => value.to_string(),
            Self::Number(value) => format_number(*value),
        }
    }
}

impl Record {
    /// Display text for `key`; absent fields read as "".
    pub fn field_text(&self, key: &str) -> String {
        self.get(key).map(FieldValue::display).unwrap_or_default()
    }
}

fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

pub fn header_label(field: &FieldDescriptor, state: &ViewState) -> String {
    let mut label = field.label.clone();
    if state.sort_key() == Some(field.key.as_str()) {
        label.push_str(match state.sort_direction() {
            SortDirection::Asc => SORT_ASC_MARK,
            SortDirection::Desc => SORT_DESC_MARK,
        });
    }
    label
}

pub fn view_summary(result: &ViewResult, state: &ViewState) -> String {
    let mut parts = vec![format!("{}/{} rows", result.matched_count, result.total_count)];
    if let Some(key) = state.sort_key() {
        parts.push(format!("sort {key} {}", state.sort_direction().as_str()));
    }
    if !state.search_text().is_empty() {
        parts.push(format!("search {:?}", state.search_text()));
    }
    if state.page_size().rows().is_some() {
        parts.push(format!(
            "page {}/{}",
            result.window.page + 1,
            result.window.page_count
        ));
    }
    parts.join(" | ")
}

pub fn truncate_label(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_owned();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut out = value.chars().take(max_chars - 1).collect::<String>();
    out.push(ELLIPSIS);
    out
}

/// Column-aligned text rendering of a view, closed by its summary line.
pub fn render_plain_table(
    fields: &[FieldDescriptor],
    result: &ViewResult,
    state: &ViewState,
) -> String {
    let headers = fields
        .iter()
        .map(|field| header_label(field, state))
        .collect::<Vec<_>>();
    let cells = result
        .rows
        .iter()
        .map(|row| {
            fields
                .iter()
                .map(|field| row.field_text(&field.key))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let mut widths = headers
        .iter()
        .map(|header| header.chars().count())
        .collect::<Vec<_>>();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(cells.len() + 3);
    lines.push(join_padded(&headers, &widths));
    lines.push(
        widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join(COLUMN_GAP),
    );
    for row in &cells {
        lines.push(join_padded(row, &widths));
    }
    lines.push(view_summary(result, state));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn join_padded(values: &[String], widths: &[usize]) -> String {
    values
        .iter()
        .zip(widths)
        .map(|(value, width)| format!("{value:<width$}"))
        .collect::<Vec<_>>()
        .join(COLUMN_GAP)
        .trim_end()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::{header_label, render_plain_table, truncate_label, view_summary};
    use crate::{
        FieldDescriptor, FieldValue, PageSize, Record, SortDirection, ViewResult, ViewState,
        Window,
    };

    #[test]
    fn numbers_render_without_trailing_zero() {
        assert_eq!(FieldValue::from(3).display(), "3");
        assert_eq!(FieldValue::from(i64::MAX).display(), "9223372036854775807");
        assert_eq!(FieldValue::from(-12.0).display(), "-12");
        assert_eq!(FieldValue::from(98.6).display(), "98.6");
        assert_eq!(FieldValue::from(true).display(), "yes");
        assert_eq!(FieldValue::Null.display(), "");
    }

    #[test]
    fn field_text_reads_absent_as_empty() {
        let record = Record::new().with("name", "Ada");
        assert_eq!(record.field_text("name"), "Ada");
        assert_eq!(record.field_text("ward"), "");
    }

    #[test]
    fn header_label_marks_sorted_column_only() {
        let name = FieldDescriptor::new("name", "Name");
        let ward = FieldDescriptor::new("ward", "Ward");
        let state = ViewState::default().sorted_by("name", SortDirection::Desc);
        assert_eq!(header_label(&name, &state), "Name ↓");
        assert_eq!(header_label(&ward, &state), "Ward");
    }

    #[test]
    fn summary_lists_active_controls() {
        let result = ViewResult {
            matched_count: 2,
            total_count: 5,
            window: Window {
                offset: 0,
                len: 1,
                page: 0,
                page_count: 2,
            },
            ..ViewResult::default()
        };
        let state = ViewState::default()
            .search("a")
            .sorted_by("name", SortDirection::Asc)
            .paged(PageSize::Rows(1), 0);
        assert_eq!(
            view_summary(&result, &state),
            "2/5 rows | sort name asc | search \"a\" | page 1/2"
        );
        assert_eq!(view_summary(&result, &ViewState::default()), "2/5 rows");
    }

    #[test]
    fn truncate_label_counts_chars() {
        assert_eq!(truncate_label("Intake/Output", 6), "Intak…");
        assert_eq!(truncate_label("Pain", 6), "Pain");
        assert_eq!(truncate_label("Pain", 0), "");
    }

    #[test]
    fn plain_table_aligns_columns() {
        let fields = vec![
            FieldDescriptor::new("id", "ID"),
            FieldDescriptor::new("name", "Name"),
        ];
        let result = ViewResult {
            rows: vec![
                Record::new().with("id", 7).with("name", "Bob"),
                Record::new().with("id", 12).with("name", "Alexandra"),
            ],
            matched_count: 2,
            total_count: 2,
            window: Window {
                offset: 0,
                len: 2,
                page: 0,
                page_count: 1,
            },
        };
        let rendered = render_plain_table(&fields, &result, &ViewState::default());
        assert_eq!(
            rendered,
            "ID  Name\n--  ---------\n7   Bob\n12  Alexandra\n2/2 rows\n"
        );
    }
}
