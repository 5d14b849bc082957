// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use clinview_core::{
    Collection, PageSize, RefreshPolicy, SortDirection, TabularViewController, ViewState,
    WorkspaceCommand, WorkspaceOptions, derive_view,
};
use clinview_testkit::{demo_workspace, named_collection, path};
use std::sync::Arc;

fn row_ids(controller: &TabularViewController) -> Vec<String> {
    controller
        .view_result()
        .rows
        .iter()
        .map(|row| row.field_text("id"))
        .collect()
}

#[test]
fn stable_sort_scenario_ascending_then_descending() -> Result<()> {
    let mut controller = TabularViewController::new(Arc::new(named_collection(&["B", "A", "A"])?));

    controller.set_sort("name");
    assert_eq!(row_ids(&controller), vec!["2", "3", "1"]);

    controller.set_sort("name");
    assert_eq!(controller.state().sort_direction(), SortDirection::Desc);
    assert_eq!(row_ids(&controller), vec!["1", "2", "3"]);
    Ok(())
}

#[test]
fn substring_search_scenario() -> Result<()> {
    let mut controller =
        TabularViewController::new(Arc::new(named_collection(&["Apple", "Banana", "Cherry"])?));
    controller.set_search_text("a");
    assert_eq!(controller.view_result().matched_count, 2);
    assert_eq!(row_ids(&controller), vec!["1", "2"]);
    Ok(())
}

#[test]
fn page_size_one_scenario() -> Result<()> {
    let mut controller = TabularViewController::new(Arc::new(named_collection(&["c", "b", "a"])?));
    controller.set_sort("name");
    controller.set_page_size(PageSize::Rows(1));
    let result = controller.view_result();
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.matched_count, 3);
    Ok(())
}

#[test]
fn count_bounds_hold_across_demo_sections() -> Result<()> {
    let demo = demo_workspace(9)?;
    let searches = ["", "a", "walker", "ct", "zzz-no-match"];
    let page_sizes = [PageSize::All, PageSize::Rows(1), PageSize::Rows(4)];

    for (section, collection) in &demo.sections {
        let sort_key = collection
            .fields()
            .iter()
            .find(|field| field.sortable)
            .map(|field| field.key.clone());
        for search in searches {
            for page_size in page_sizes {
                let mut state = ViewState::default().search(search).paged(page_size, 0);
                if let Some(key) = &sort_key {
                    state = state.sorted_by(key.clone(), SortDirection::Desc);
                }
                let result = derive_view(collection, &state);
                assert!(result.matched_count <= result.total_count, "{section:?}");
                assert!(result.rows.len() <= result.matched_count, "{section:?}");
                if let Some(rows) = page_size.rows() {
                    assert!(result.rows.len() <= rows, "{section:?}");
                }
                assert_eq!(result.total_count, collection.len());
            }
        }
    }
    Ok(())
}

#[test]
fn empty_search_is_identity_over_sorted_rows() -> Result<()> {
    let demo = demo_workspace(4)?;
    let labs = demo.section(&["Labs"]).expect("demo has labs");

    let sorted = derive_view(labs, &ViewState::default().sorted_by("test", SortDirection::Asc));
    assert_eq!(sorted.matched_count, labs.len());

    let mut tests = sorted
        .rows
        .iter()
        .map(|row| row.field_text("test").to_lowercase())
        .collect::<Vec<_>>();
    let before = tests.clone();
    tests.sort();
    assert_eq!(tests, before);
    Ok(())
}

#[test]
fn double_toggle_restores_tie_order() -> Result<()> {
    let demo = demo_workspace(2)?;
    let orders = Arc::new(
        demo.section(&["Orders", "Active"])
            .expect("demo has active orders")
            .clone(),
    );
    let mut controller = TabularViewController::new(orders);

    controller.set_sort("priority");
    let first = row_ids(&controller);
    controller.set_sort("priority");
    controller.set_sort("priority");
    assert_eq!(controller.state().sort_direction(), SortDirection::Asc);
    assert_eq!(row_ids(&controller), first);

    let collection = Arc::clone(controller.collection());
    let position = |id: &str| {
        collection
            .ids()
            .iter()
            .position(|candidate| candidate.as_str() == id)
    };
    for pair in controller.view_result().rows.windows(2) {
        let (left, right) = (&pair[0], &pair[1]);
        if left.field_text("priority").eq_ignore_ascii_case(&right.field_text("priority")) {
            assert!(position(&left.field_text("id")) < position(&right.field_text("id")));
        }
    }
    Ok(())
}

#[test]
fn demo_workspace_prefix_sections_and_refresh() -> Result<()> {
    let mut workspace = demo_workspace(1)?.into_workspace(WorkspaceOptions {
        refresh_policy: RefreshPolicy::Reset,
        default_page_size: PageSize::Rows(10),
    })?;
    assert_eq!(workspace.active_path(), ["Patients"]);
    assert_eq!(workspace.view_result().rows.len(), 10);

    workspace.dispatch(WorkspaceCommand::Select {
        level: 0,
        name: "Nursing".to_owned(),
    })?;
    assert_eq!(workspace.active_path(), ["Nursing", "Notes"]);
    assert_eq!(workspace.active_section_path(), Some(&path(&["Nursing"])));

    workspace.dispatch(WorkspaceCommand::SetSearchText("family".to_owned()))?;
    let refreshed = demo_workspace(2)?;
    let notes = refreshed
        .section(&["Nursing"])
        .expect("demo has notes")
        .clone();
    workspace.replace_collection(path(&["Nursing"]), notes)?;

    let controller = workspace.active_controller().expect("notes are active");
    assert_eq!(controller.state(), &ViewState::with_page_size(PageSize::Rows(10)));
    Ok(())
}

#[test]
fn workspace_collections_deserialize_from_json() -> Result<()> {
    let raw = r#"{
        "id_field": "accession",
        "fields": [
            {"key": "accession", "label": "Accession"},
            {"key": "study", "label": "Study", "sortable": false},
            {"key": "reader", "label": "Reader"}
        ],
        "records": [
            {"accession": "A-2", "study": "CT Head", "urgent": true},
            {"accession": "A-1", "study": "XR Chest", "reader": null}
        ]
    }"#;
    let collection: Collection = serde_json::from_str(raw)?;
    assert_eq!(collection.id_field(), "accession");
    assert_eq!(collection.len(), 2);
    assert!(collection.schema_mismatches().is_empty());
    assert!(!collection.fields()[1].sortable);
    assert!(collection.fields()[1].searchable);

    let duplicate = r#"{"fields": [], "records": [{"id": 1}, {"id": 1}]}"#;
    let error = serde_json::from_str::<Collection>(duplicate).expect_err("duplicate id");
    assert!(error.to_string().contains("duplicate record id"));

    let nested = r#"{"fields": [], "records": [{"id": 1, "vitals": {"hr": 80}}]}"#;
    assert!(serde_json::from_str::<Collection>(nested).is_err());
    Ok(())
}
