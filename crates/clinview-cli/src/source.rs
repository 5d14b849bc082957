// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use clinview_core::{
    Collection, DEFAULT_ID_FIELD, FieldDescriptor, NavigationTree, Record, SectionPath,
    Workspace, WorkspaceOptions,
};
use clinview_tui::WorkspaceRuntime;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEMO_SEED: u64 = 2026;

/// A parsed workspace: the navigation tree plus one collection per section.
#[derive(Debug, Clone)]
pub struct WorkspaceData {
    pub tree: NavigationTree,
    pub sections: Vec<(SectionPath, Collection)>,
}

impl WorkspaceData {
    pub fn section(&self, path: &[String]) -> Option<&Collection> {
        self.sections
            .iter()
            .find(|(candidate, _)| candidate.as_slice() == path)
            .map(|(_, collection)| collection)
    }

    pub fn record_count(&self) -> usize {
        self.sections
            .iter()
            .map(|(_, collection)| collection.len())
            .sum()
    }

    pub fn into_workspace(self, options: WorkspaceOptions) -> Result<Workspace> {
        let mut workspace = Workspace::new(self.tree, options);
        for (path, collection) in self.sections {
            workspace.insert_collection(path, collection)?;
        }
        Ok(workspace)
    }
}

#[derive(Debug, Deserialize)]
struct WorkspaceFile {
    navigation: NavigationTree,
    #[serde(default)]
    sections: Vec<SectionFile>,
}

#[derive(Debug, Deserialize)]
struct SectionFile {
    path: SectionPath,
    #[serde(default = "default_id_field")]
    id_field: String,
    fields: Vec<FieldDescriptor>,
    #[serde(default)]
    records: Vec<Record>,
}

fn default_id_field() -> String {
    DEFAULT_ID_FIELD.to_owned()
}

pub fn parse_workspace(raw: &str, origin: &str) -> Result<WorkspaceData> {
    let file: WorkspaceFile =
        serde_json::from_str(raw).with_context(|| format!("parse workspace JSON {origin}"))?;

    let mut seen = BTreeSet::new();
    let mut sections = Vec::with_capacity(file.sections.len());
    for section in file.sections {
        let label = section.path.join(" / ");
        if section.path.is_empty() {
            bail!("section in {origin} has an empty path");
        }
        if !file.navigation.contains_path(&section.path) {
            bail!("section {label:?} in {origin} is not in the navigation tree");
        }
        if !seen.insert(section.path.clone()) {
            bail!("section {label:?} appears more than once in {origin}");
        }
        let collection = Collection::define(section.id_field, section.fields, section.records)
            .with_context(|| format!("define section {label:?} in {origin}"))?;
        sections.push((section.path, collection));
    }

    Ok(WorkspaceData {
        tree: file.navigation,
        sections,
    })
}

pub fn load_workspace_file(path: &Path) -> Result<WorkspaceData> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read workspace file {}", path.display()))?;
    parse_workspace(&raw, &path.display().to_string())
}

/// Re-reads the workspace file on every refresh.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Result<WorkspaceData> {
        load_workspace_file(&self.path)
    }
}

impl WorkspaceRuntime for FileSource {
    fn refresh_collection(&mut self, section: &[String]) -> Result<Option<Collection>> {
        let data = self.load()?;
        tracing::debug!(path = %self.path.display(), section = ?section, "workspace file reloaded");
        Ok(data.section(section).cloned())
    }
}

/// Seeded demo data; every refresh moves to the next seed.
#[derive(Debug, Clone)]
pub struct DemoSource {
    seed: u64,
}

impl DemoSource {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn load(&self) -> Result<WorkspaceData> {
        let demo = clinview_testkit::demo_workspace(self.seed)?;
        Ok(WorkspaceData {
            tree: demo.tree,
            sections: demo.sections,
        })
    }
}

impl WorkspaceRuntime for DemoSource {
    fn refresh_collection(&mut self, section: &[String]) -> Result<Option<Collection>> {
        self.seed = self.seed.wrapping_add(1);
        let data = self.load()?;
        Ok(data.section(section).cloned())
    }
}

#[derive(Debug, Clone)]
pub enum Source {
    File(FileSource),
    Demo(DemoSource),
}

impl Source {
    pub fn load(&self) -> Result<WorkspaceData> {
        match self {
            Self::File(source) => source.load(),
            Self::Demo(source) => source.load(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::File(source) => source.path.display().to_string(),
            Self::Demo(source) => format!("demo data (seed {})", source.seed()),
        }
    }
}

impl WorkspaceRuntime for Source {
    fn refresh_collection(&mut self, section: &[String]) -> Result<Option<Collection>> {
        match self {
            Self::File(source) => source.refresh_collection(section),
            Self::Demo(source) => source.refresh_collection(section),
        }
    }
}
