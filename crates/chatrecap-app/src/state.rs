// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::assemble::{assemble, has_content};
use crate::failure::Failure;
use crate::model::{ChartItem, NavigationCursor, StepDirection};
use crate::payload::{AnalysisPayload, Year};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Upload,
    Loading,
    Visualize,
    Error,
}

impl Phase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Loading => "loading",
            Self::Visualize => "visualize",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchPurpose {
    Ingest,
    YearChange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingFetch {
    pub generation: u64,
    pub purpose: FetchPurpose,
}

/// Work the front end must perform on the reducer's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchRequest {
    AvailableYears {
        generation: u64,
        transcript: String,
    },
    Analysis {
        generation: u64,
        transcript: String,
        year: Year,
    },
}

impl FetchRequest {
    pub const fn generation(&self) -> u64 {
        match self {
            Self::AvailableYears { generation, .. } | Self::Analysis { generation, .. } => {
                *generation
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub phase: Phase,
    pub source_name: Option<String>,
    pub transcript: Option<String>,
    pub years: Vec<Year>,
    pub selected_year: Option<Year>,
    pub payload: Option<AnalysisPayload>,
    pub items: Vec<ChartItem>,
    pub cursor: NavigationCursor,
    pub step_in_flight: bool,
    /// Identifies the current step lock; a settle carrying an older token is
    /// ignored.
    pub step_token: u64,
    pub generation: u64,
    pub pending: Option<PendingFetch>,
    pub upload_error: Option<String>,
    pub error_message: Option<String>,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            phase: Phase::Upload,
            source_name: None,
            transcript: None,
            years: Vec::new(),
            selected_year: None,
            payload: None,
            items: Vec::new(),
            cursor: NavigationCursor::default(),
            step_in_flight: false,
            step_token: 0,
            generation: 0,
            pending: None,
            upload_error: None,
            error_message: None,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    BeginIngest {
        source_name: String,
        transcript: String,
    },
    ReportUploadError(Failure),
    YearsFetched {
        generation: u64,
        result: Result<Vec<Year>, Failure>,
    },
    AnalysisFetched {
        generation: u64,
        year: Year,
        result: Result<AnalysisPayload, Failure>,
    },
    SelectYear(Year),
    Step(StepDirection),
    StepSettled {
        token: u64,
    },
    RestartUpload,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    PhaseChanged(Phase),
    FetchRequested(FetchRequest),
    ItemsAssembled(usize),
    CursorMoved(usize),
    StepLocked(u64),
    StaleResponseDiscarded(u64),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::BeginIngest {
                source_name,
                transcript,
            } => self.begin_ingest(source_name, transcript),
            AppCommand::ReportUploadError(failure) => {
                if self.phase != Phase::Upload {
                    return Vec::new();
                }
                warn!(kind = failure.kind(), error = %failure, "upload rejected");
                self.upload_error = Some(failure.to_string());
                vec![self.set_status(&failure.to_string())]
            }
            AppCommand::YearsFetched { generation, result } => {
                self.years_fetched(generation, result)
            }
            AppCommand::AnalysisFetched {
                generation,
                year,
                result,
            } => self.analysis_fetched(generation, &year, result),
            AppCommand::SelectYear(year) => self.select_year(year),
            AppCommand::Step(direction) => self.step(direction),
            AppCommand::StepSettled { token } => {
                if token == self.step_token {
                    self.step_in_flight = false;
                } else {
                    debug!(token, current = self.step_token, "ignoring stale step settle");
                }
                Vec::new()
            }
            AppCommand::RestartUpload => self.restart_upload(),
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    pub fn current_item(&self) -> Option<&ChartItem> {
        self.items.get(self.cursor.index())
    }

    /// The year `delta` positions away from the selected one, without wrapping.
    pub fn adjacent_year(&self, delta: isize) -> Option<&Year> {
        let selected = self.selected_year.as_ref()?;
        let current = self.years.iter().position(|year| year == selected)?;
        let next = current.checked_add_signed(delta)?;
        self.years.get(next)
    }

    fn begin_ingest(&mut self, source_name: String, transcript: String) -> Vec<AppEvent> {
        if self.phase != Phase::Upload {
            return Vec::new();
        }
        info!(source = %source_name, bytes = transcript.len(), "starting ingest");

        let generation = self.next_generation();
        self.source_name = Some(source_name);
        self.transcript = Some(transcript.clone());
        self.years.clear();
        self.selected_year = None;
        self.clear_visualization();
        self.upload_error = None;
        self.error_message = None;
        self.pending = Some(PendingFetch {
            generation,
            purpose: FetchPurpose::Ingest,
        });

        vec![
            self.set_phase(Phase::Loading),
            AppEvent::FetchRequested(FetchRequest::AvailableYears {
                generation,
                transcript,
            }),
        ]
    }

    fn years_fetched(
        &mut self,
        generation: u64,
        result: Result<Vec<Year>, Failure>,
    ) -> Vec<AppEvent> {
        if !self.is_pending(generation) {
            return self.discard(generation);
        }

        let years = match result {
            Ok(years) if years.is_empty() => {
                return self.fail(Failure::ResponseShape(
                    "available_years is empty".to_owned(),
                ));
            }
            Ok(years) => years,
            Err(failure) => return self.fail(failure),
        };
        let Some(transcript) = self.transcript.clone() else {
            return self.fail(Failure::ResponseShape(
                "transcript missing for analysis request".to_owned(),
            ));
        };

        let year = years[0].clone();
        info!(years = years.len(), first = %year, "available years loaded");
        self.years = years;
        self.selected_year = Some(year.clone());
        vec![AppEvent::FetchRequested(FetchRequest::Analysis {
            generation,
            transcript,
            year,
        })]
    }

    fn analysis_fetched(
        &mut self,
        generation: u64,
        year: &Year,
        result: Result<AnalysisPayload, Failure>,
    ) -> Vec<AppEvent> {
        if !self.is_pending(generation) {
            return self.discard(generation);
        }

        let payload = match result {
            Ok(payload) => payload,
            Err(failure) => return self.fail(failure),
        };
        let items = assemble(Some(&payload));
        if !has_content(&items) {
            return self.fail(Failure::EmptyResult {
                year: year.to_string(),
            });
        }

        info!(year = %year, items = items.len(), "analysis assembled");
        self.pending = None;
        self.payload = Some(payload);
        self.items = items;
        self.cursor.reset();
        self.step_in_flight = false;
        let count = self.items.len();
        vec![
            AppEvent::ItemsAssembled(count),
            AppEvent::CursorMoved(0),
            self.set_phase(Phase::Visualize),
        ]
    }

    fn select_year(&mut self, year: Year) -> Vec<AppEvent> {
        let superseding = self.phase == Phase::Loading
            && self
                .pending
                .as_ref()
                .is_some_and(|pending| pending.purpose == FetchPurpose::YearChange);
        if self.phase != Phase::Visualize && !superseding {
            return Vec::new();
        }
        if !self.years.contains(&year) {
            return vec![self.set_status(&format!("year {year} is not available"))];
        }
        if self.phase == Phase::Visualize && self.selected_year.as_ref() == Some(&year) {
            return Vec::new();
        }
        let Some(transcript) = self.transcript.clone() else {
            return Vec::new();
        };

        let generation = self.next_generation();
        info!(year = %year, generation, "year change requested");
        self.selected_year = Some(year.clone());
        self.pending = Some(PendingFetch {
            generation,
            purpose: FetchPurpose::YearChange,
        });

        let mut events = Vec::new();
        if self.phase != Phase::Loading {
            events.push(self.set_phase(Phase::Loading));
        }
        events.push(AppEvent::FetchRequested(FetchRequest::Analysis {
            generation,
            transcript,
            year,
        }));
        events
    }

    fn step(&mut self, direction: StepDirection) -> Vec<AppEvent> {
        if self.phase != Phase::Visualize || self.step_in_flight {
            return Vec::new();
        }
        if !self.cursor.step(direction, self.items.len()) {
            return Vec::new();
        }
        self.step_in_flight = true;
        self.step_token = self.step_token.wrapping_add(1);
        vec![
            AppEvent::CursorMoved(self.cursor.index()),
            AppEvent::StepLocked(self.step_token),
        ]
    }

    fn restart_upload(&mut self) -> Vec<AppEvent> {
        if self.phase == Phase::Upload {
            return Vec::new();
        }
        // An in-flight fetch may still answer; bumping the generation drops it.
        self.next_generation();
        self.pending = None;
        self.transcript = None;
        self.source_name = None;
        self.years.clear();
        self.selected_year = None;
        self.clear_visualization();
        self.error_message = None;
        vec![self.set_phase(Phase::Upload)]
    }

    fn fail(&mut self, failure: Failure) -> Vec<AppEvent> {
        let purpose = self
            .pending
            .take()
            .map_or(FetchPurpose::Ingest, |pending| pending.purpose);
        let message = failure.to_string();
        warn!(kind = failure.kind(), error = %failure, purpose = ?purpose, "fetch failed");

        self.clear_visualization();
        match purpose {
            FetchPurpose::Ingest => {
                self.transcript = None;
                self.years.clear();
                self.selected_year = None;
                self.upload_error = Some(message.clone());
                vec![
                    self.set_phase(Phase::Upload),
                    self.set_status(&message),
                ]
            }
            FetchPurpose::YearChange => {
                self.error_message = Some(message.clone());
                vec![self.set_phase(Phase::Error), self.set_status(&message)]
            }
        }
    }

    fn discard(&self, generation: u64) -> Vec<AppEvent> {
        warn!(
            generation,
            current = self.generation,
            "discarding stale analysis response"
        );
        vec![AppEvent::StaleResponseDiscarded(generation)]
    }

    fn is_pending(&self, generation: u64) -> bool {
        self.phase == Phase::Loading
            && self
                .pending
                .as_ref()
                .is_some_and(|pending| pending.generation == generation)
    }

    fn next_generation(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    fn clear_visualization(&mut self) {
        self.payload = None;
        self.items.clear();
        self.cursor.reset();
        self.step_in_flight = false;
    }

    fn set_phase(&mut self, phase: Phase) -> AppEvent {
        info!(from = self.phase.as_str(), to = phase.as_str(), "phase change");
        self.phase = phase;
        AppEvent::PhaseChanged(phase)
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
