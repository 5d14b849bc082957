// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavigationNode>,
}

impl NavigationNode {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn branch(name: impl Into<String>, children: Vec<NavigationNode>) -> Self {
        Self {
            name: name.into(),
            children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationTreeError {
    Empty,
    BlankName { level: usize },
    DuplicateSibling { level: usize, name: String },
}

impl std::fmt::Display for NavigationTreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("navigation tree has no sections"),
            Self::BlankName { level } => write!(f, "blank section name at level {level}"),
            Self::DuplicateSibling { level, name } => {
                write!(f, "section {name:?} is declared twice at level {level}")
            }
        }
    }
}

impl std::error::Error for NavigationTreeError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    InvalidSelection { level: usize, name: String },
    LevelOutOfRange { level: usize, depth: usize },
    UnknownSection(Vec<String>),
}

impl std::fmt::Display for NavigationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSelection { level, name } => {
                write!(f, "no section {name:?} at level {level}")
            }
            Self::LevelOutOfRange { level, depth } => {
                write!(f, "level {level} is outside the active path (depth {depth})")
            }
            Self::UnknownSection(path) => {
                write!(f, "section {:?} is not in the navigation tree", path.join(" / "))
            }
        }
    }
}

impl std::error::Error for NavigationError {}

pub type NavigationResult<T> = std::result::Result<T, NavigationError>;

/// Validated section tree: non-empty root, unique non-blank sibling names.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<NavigationNode>")]
pub struct NavigationTree {
    roots: Vec<NavigationNode>,
}

impl TryFrom<Vec<NavigationNode>> for NavigationTree {
    type Error = NavigationTreeError;

    fn try_from(roots: Vec<NavigationNode>) -> Result<Self, Self::Error> {
        Self::new(roots)
    }
}

impl NavigationTree {
    pub fn new(roots: Vec<NavigationNode>) -> Result<Self, NavigationTreeError> {
        if roots.is_empty() {
            return Err(NavigationTreeError::Empty);
        }
        validate_level(&roots, 0)?;
        Ok(Self { roots })
    }

    pub fn roots(&self) -> &[NavigationNode] {
        &self.roots
    }

    /// Whether `path` names a node, leaf or branch, from the root down.
    pub fn contains_path<S: AsRef<str>>(&self, path: &[S]) -> bool {
        if path.is_empty() {
            return false;
        }
        let mut nodes = self.roots.as_slice();
        for name in path {
            let Some(node) = nodes.iter().find(|node| node.name == name.as_ref()) else {
                return false;
            };
            nodes = &node.children;
        }
        true
    }

    /// Every leaf path in declaration order.
    pub fn leaf_paths(&self) -> Vec<Vec<String>> {
        let mut paths = Vec::new();
        collect_leaf_paths(&self.roots, &mut Vec::new(), &mut paths);
        paths
    }
}

fn validate_level(nodes: &[NavigationNode], level: usize) -> Result<(), NavigationTreeError> {
    let mut seen = HashSet::new();
    for node in nodes {
        if node.name.trim().is_empty() {
            return Err(NavigationTreeError::BlankName { level });
        }
        if !seen.insert(node.name.as_str()) {
            return Err(NavigationTreeError::DuplicateSibling {
                level,
                name: node.name.clone(),
            });
        }
        validate_level(&node.children, level + 1)?;
    }
    Ok(())
}

fn collect_leaf_paths(
    nodes: &[NavigationNode],
    prefix: &mut Vec<String>,
    out: &mut Vec<Vec<String>>,
) {
    for node in nodes {
        prefix.push(node.name.clone());
        if node.is_leaf() {
            out.push(prefix.clone());
        } else {
            collect_leaf_paths(&node.children, prefix, out);
        }
        prefix.pop();
    }
}

/// Tracks the single active root-to-leaf path through a [`NavigationTree`].
///
/// Every successful selection at level `L` resets levels deeper than `L` to
/// their first child. Failed selections leave the path untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    tree: NavigationTree,
    indices: Vec<usize>,
    path: Vec<String>,
}

impl NavigationState {
    pub fn new(tree: NavigationTree) -> Self {
        let mut state = Self {
            tree,
            indices: Vec::new(),
            path: Vec::new(),
        };
        state.apply_selection(0, 0);
        state
    }

    pub fn tree(&self) -> &NavigationTree {
        &self.tree
    }

    pub fn active_path(&self) -> &[String] {
        &self.path
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    pub fn active_index(&self, level: usize) -> Option<usize> {
        self.indices.get(level).copied()
    }

    /// The sibling set at `level` along the active path.
    pub fn siblings(&self, level: usize) -> Option<&[NavigationNode]> {
        if level >= self.indices.len() {
            return None;
        }
        let mut nodes = self.tree.roots();
        for index in &self.indices[..level] {
            nodes = &nodes.get(*index)?.children;
        }
        Some(nodes)
    }

    pub fn select(&mut self, level: usize, name: &str) -> NavigationResult<()> {
        let index = self
            .siblings(level)
            .and_then(|nodes| nodes.iter().position(|node| node.name == name))
            .ok_or_else(|| NavigationError::InvalidSelection {
                level,
                name: name.to_owned(),
            })?;
        self.apply_selection(level, index);
        Ok(())
    }

    /// Moves `delta` siblings away at `level`, wrapping at either end.
    pub fn rotate(&mut self, level: usize, delta: isize) -> NavigationResult<()> {
        let (Some(nodes), Some(current)) = (self.siblings(level), self.active_index(level)) else {
            return Err(NavigationError::LevelOutOfRange {
                level,
                depth: self.depth(),
            });
        };
        let len = nodes.len() as isize;
        let next = (current as isize + delta.rem_euclid(len)).rem_euclid(len) as usize;
        self.apply_selection(level, next);
        Ok(())
    }

    /// Selects each name in turn from the root. All or nothing.
    pub fn select_path<S: AsRef<str>>(&mut self, names: &[S]) -> NavigationResult<()> {
        let mut next = self.clone();
        for (level, name) in names.iter().enumerate() {
            next.select(level, name.as_ref())?;
        }
        *self = next;
        Ok(())
    }

    fn apply_selection(&mut self, level: usize, index: usize) {
        self.indices.truncate(level);
        self.indices.push(index);

        let mut nodes = self.tree.roots();
        let mut path = Vec::with_capacity(self.indices.len());
        for index in &self.indices {
            let Some(node) = nodes.get(*index) else {
                break;
            };
            path.push(node.name.clone());
            nodes = &node.children;
        }
        while let Some(first) = nodes.first() {
            self.indices.push(0);
            path.push(first.name.clone());
            nodes = &first.children;
        }
        self.path = path;
        tracing::debug!(path = ?self.path, "navigation changed");
    }
}
