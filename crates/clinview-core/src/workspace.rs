// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{
    Collection, CollectionResult, FieldDescriptor, NavigationError, NavigationResult,
    NavigationState, NavigationTree, PageSize, Record, RefreshPolicy, SortDirection,
    SortOutcome, TabularViewController, ViewResult,
};

pub type SectionPath = Vec<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkspaceOptions {
    pub refresh_policy: RefreshPolicy,
    pub default_page_size: PageSize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceCommand {
    Select { level: usize, name: String },
    Rotate { level: usize, delta: isize },
    SelectPath(Vec<String>),
    SetSearchText(String),
    ClearSearch,
    SetSort(String),
    ClearSort,
    SetPageSize(PageSize),
    NextPage,
    PrevPage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceEvent {
    PathChanged(Vec<String>),
    SearchChanged(String),
    SortChanged {
        key: String,
        direction: SortDirection,
    },
    SortIgnored(String),
    SortCleared,
    PageSizeChanged(PageSize),
    PageChanged {
        page: usize,
        page_count: usize,
    },
    CollectionReplaced {
        path: Vec<String>,
        reset: bool,
    },
}

impl WorkspaceEvent {
    pub fn message(&self) -> String {
        match self {
            Self::PathChanged(path) => path.join(" / "),
            Self::SearchChanged(text) if text.is_empty() => "search cleared".to_owned(),
            Self::SearchChanged(text) => format!("search {text:?}"),
            Self::SortChanged { key, direction } => format!("sort {key} {}", direction.as_str()),
            Self::SortIgnored(key) => format!("sort unavailable: {key}"),
            Self::SortCleared => "sort cleared".to_owned(),
            Self::PageSizeChanged(size) => format!("page size {size}"),
            Self::PageChanged { page, page_count } => format!("page {}/{page_count}", page + 1),
            Self::CollectionReplaced { path, reset: true } => {
                format!("refreshed {} (view reset)", path.join(" / "))
            }
            Self::CollectionReplaced { path, reset: false } => {
                format!("refreshed {}", path.join(" / "))
            }
        }
    }
}

#[derive(Debug, Clone)]
struct Section {
    collection: Arc<Collection>,
    controller: Option<TabularViewController>,
}

/// One page's navigation plus the collections behind its sections.
///
/// The active collection is the one registered at the longest prefix of the
/// active path. Each section gets its own controller the first time it is
/// shown, and that controller survives navigating away and back.
#[derive(Debug, Clone)]
pub struct Workspace {
    navigation: NavigationState,
    options: WorkspaceOptions,
    sections: BTreeMap<SectionPath, Section>,
    empty: ViewResult,
}

impl Workspace {
    pub fn new(tree: NavigationTree, options: WorkspaceOptions) -> Self {
        Self {
            navigation: NavigationState::new(tree),
            options,
            sections: BTreeMap::new(),
            empty: ViewResult::default(),
        }
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.navigation
    }

    pub fn active_path(&self) -> &[String] {
        self.navigation.active_path()
    }

    /// Registers the collection behind `path`, which must name a node of the
    /// navigation tree. An existing registration is replaced under the
    /// workspace refresh policy.
    pub fn insert_collection(
        &mut self,
        path: SectionPath,
        collection: Collection,
    ) -> NavigationResult<()> {
        if self.sections.contains_key(&path) {
            self.replace_collection(path, collection)?;
            return Ok(());
        }
        self.ensure_section(&path)?;
        self.sections.insert(
            path,
            Section {
                collection: Arc::new(collection),
                controller: None,
            },
        );
        self.activate();
        Ok(())
    }

    /// Swaps a section's collection atomically. Paths outside the navigation
    /// tree are rejected and nothing changes.
    pub fn replace_collection(
        &mut self,
        path: SectionPath,
        collection: Collection,
    ) -> NavigationResult<WorkspaceEvent> {
        self.ensure_section(&path)?;
        let collection = Arc::new(collection);
        let policy = self.options.refresh_policy;
        let reset = match self.sections.get_mut(&path) {
            Some(section) => {
                section.collection = Arc::clone(&collection);
                section
                    .controller
                    .as_mut()
                    .map(|controller| controller.replace_collection(collection, policy))
                    .unwrap_or(false)
            }
            None => {
                self.sections.insert(
                    path.clone(),
                    Section {
                        collection,
                        controller: None,
                    },
                );
                self.activate();
                false
            }
        };
        Ok(WorkspaceEvent::CollectionReplaced { path, reset })
    }

    fn ensure_section(&self, path: &[String]) -> NavigationResult<()> {
        if self.navigation.tree().contains_path(path) {
            Ok(())
        } else {
            Err(NavigationError::UnknownSection(path.to_vec()))
        }
    }

    /// Appends a record to the active collection without a refresh, keeping
    /// the view state. Returns `Ok(false)` when no collection is active.
    pub fn insert_local_record(&mut self, record: Record) -> CollectionResult<bool> {
        let Some(path) = self.active_section_path().cloned() else {
            return Ok(false);
        };
        let Some(section) = self.sections.get_mut(&path) else {
            return Ok(false);
        };
        let next = Arc::new(section.collection.with_record(record)?);
        section.collection = Arc::clone(&next);
        if let Some(controller) = section.controller.as_mut() {
            controller.replace_collection(next, RefreshPolicy::Preserve);
        }
        Ok(true)
    }

    pub fn active_section_path(&self) -> Option<&SectionPath> {
        let path = self.navigation.active_path();
        (1..=path.len())
            .rev()
            .find_map(|len| self.sections.get_key_value(&path[..len]))
            .map(|(key, _)| key)
    }

    pub fn active_controller(&self) -> Option<&TabularViewController> {
        let path = self.active_section_path()?;
        self.sections.get(path)?.controller.as_ref()
    }

    pub fn active_fields(&self) -> &[FieldDescriptor] {
        self.active_controller()
            .map(|controller| controller.collection().fields())
            .unwrap_or_default()
    }

    pub fn view_result(&self) -> &ViewResult {
        self.active_controller()
            .map(TabularViewController::view_result)
            .unwrap_or(&self.empty)
    }

    pub fn dispatch(
        &mut self,
        command: WorkspaceCommand,
    ) -> Result<Vec<WorkspaceEvent>, NavigationError> {
        let events = match command {
            WorkspaceCommand::Select { level, name } => {
                self.navigation.select(level, &name)?;
                self.activate();
                vec![WorkspaceEvent::PathChanged(self.active_path().to_vec())]
            }
            WorkspaceCommand::Rotate { level, delta } => {
                self.navigation.rotate(level, delta)?;
                self.activate();
                vec![WorkspaceEvent::PathChanged(self.active_path().to_vec())]
            }
            WorkspaceCommand::SelectPath(names) => {
                self.navigation.select_path(&names)?;
                self.activate();
                vec![WorkspaceEvent::PathChanged(self.active_path().to_vec())]
            }
            WorkspaceCommand::SetSearchText(text) => self.with_active(|controller| {
                controller.set_search_text(text);
                vec![WorkspaceEvent::SearchChanged(
                    controller.state().search_text().to_owned(),
                )]
            }),
            WorkspaceCommand::ClearSearch => self.with_active(|controller| {
                controller.set_search_text(String::new());
                vec![WorkspaceEvent::SearchChanged(String::new())]
            }),
            WorkspaceCommand::SetSort(key) => {
                let outcome = self
                    .active_controller_mut()
                    .map(|controller| controller.set_sort(&key))
                    .unwrap_or(SortOutcome::Ignored);
                match outcome {
                    SortOutcome::Applied { key, direction } => {
                        vec![WorkspaceEvent::SortChanged { key, direction }]
                    }
                    SortOutcome::Ignored => vec![WorkspaceEvent::SortIgnored(key)],
                }
            }
            WorkspaceCommand::ClearSort => self.with_active(|controller| {
                controller.clear_sort();
                vec![WorkspaceEvent::SortCleared]
            }),
            WorkspaceCommand::SetPageSize(size) => self.with_active(|controller| {
                controller.set_page_size(size);
                vec![WorkspaceEvent::PageSizeChanged(size)]
            }),
            WorkspaceCommand::NextPage => self.with_active(|controller| {
                let changed = controller.next_page();
                page_event(controller, changed)
            }),
            WorkspaceCommand::PrevPage => self.with_active(|controller| {
                let changed = controller.prev_page();
                page_event(controller, changed)
            }),
        };
        Ok(events)
    }

    fn with_active(
        &mut self,
        apply: impl FnOnce(&mut TabularViewController) -> Vec<WorkspaceEvent>,
    ) -> Vec<WorkspaceEvent> {
        self.active_controller_mut().map(apply).unwrap_or_default()
    }

    fn active_controller_mut(&mut self) -> Option<&mut TabularViewController> {
        let path = self.active_section_path()?.clone();
        self.sections.get_mut(&path)?.controller.as_mut()
    }

    fn activate(&mut self) {
        let Some(path) = self.active_section_path().cloned() else {
            return;
        };
        let page_size = self.options.default_page_size;
        if let Some(section) = self.sections.get_mut(&path)
            && section.controller.is_none()
        {
            tracing::debug!(section = ?path, "section activated");
            section.controller = Some(TabularViewController::with_default_page_size(
                Arc::clone(&section.collection),
                page_size,
            ));
        }
    }
}

fn page_event(controller: &TabularViewController, changed: bool) -> Vec<WorkspaceEvent> {
    if !changed {
        return Vec::new();
    }
    let window = controller.view_result().window;
    vec![WorkspaceEvent::PageChanged {
        page: window.page,
        page_count: window.page_count,
    }]
}
