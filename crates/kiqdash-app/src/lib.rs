// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod format;
pub mod model;
pub mod pagination;
pub mod state;

pub use model::*;
pub use pagination::*;
pub use state::*;
