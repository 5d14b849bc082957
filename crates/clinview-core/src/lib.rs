// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod format;
pub mod model;
pub mod navigation;
pub mod view;
pub mod workspace;

pub use format::*;
pub use model::*;
pub use navigation::*;
pub use view::*;
pub use workspace::*;
