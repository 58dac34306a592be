// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod assemble;
pub mod failure;
pub mod model;
pub mod payload;
pub mod state;

pub use assemble::*;
pub use failure::*;
pub use model::*;
pub use payload::*;
pub use state::*;
