// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Everything that can abort a phase transition. Each variant maps to one
/// user-visible message; none are retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum Failure {
    #[error("cannot read {path}: {reason}")]
    FileRead { path: String, reason: String },
    #[error("analysis service unavailable: {0}")]
    Network(String),
    #[error("analysis service sent an unexpected response: {0}")]
    ResponseShape(String),
    #[error("no charts could be built from the analysis for {year}")]
    EmptyResult { year: String },
}

impl Failure {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::FileRead { .. } => "file_read",
            Self::Network(_) => "network",
            Self::ResponseShape(_) => "response_shape",
            Self::EmptyResult { .. } => "empty_result",
        }
    }
}
