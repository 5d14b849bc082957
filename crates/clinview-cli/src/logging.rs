// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Subscriber setup. The filter comes from `CLINVIEW_LOG`, then `[log].level`,
//! then `warn`; an unparseable source is skipped rather than fatal.

use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::config::DEFAULT_LOG_LEVEL;

pub const LOG_ENV: &str = "CLINVIEW_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
    Off,
}

pub fn init(configured_level: &str, target: LogTarget) -> Result<()> {
    let directives = resolve_directives(env::var(LOG_ENV).ok().as_deref(), configured_level);
    let filter = EnvFilter::try_new(&directives)
        .with_context(|| format!("build log filter {directives:?}"))?;

    match target {
        LogTarget::Off => Ok(()),
        LogTarget::Stderr => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init()
            .map_err(|error| anyhow!("install log subscriber: {error}")),
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
                .map_err(|error| anyhow!("install log subscriber: {error}"))
        }
    }
}

fn resolve_directives(from_env: Option<&str>, configured: &str) -> String {
    [from_env, Some(configured)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|directives| !directives.is_empty() && EnvFilter::try_new(directives).is_ok())
        .unwrap_or(DEFAULT_LOG_LEVEL)
        .to_owned()
}
