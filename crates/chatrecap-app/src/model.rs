// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

pub const DAY_GRID_ID: &str = "notable_days";
pub const CLOSING_CARD_ID: &str = "closing";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartKind {
    Bar,
    Line,
}

/// One named run of values. `values[i]` belongs to the chart's `labels[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesChart {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
    pub caption: String,
}

impl SeriesChart {
    pub fn max_value(&self) -> f64 {
        self.series
            .iter()
            .flat_map(|series| series.values.iter().copied())
            .fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLine {
    pub sender: String,
    pub timestamp: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayEntry {
    pub title: String,
    pub summary: String,
    pub chat_log: Option<Vec<ChatLine>>,
}

impl DayEntry {
    pub fn has_chat_log(&self) -> bool {
        self.chat_log.as_ref().is_some_and(|lines| !lines.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayGrid {
    pub entries: Vec<DayEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextCard {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChartItem {
    Series(SeriesChart),
    DayGrid(DayGrid),
    TextCard(TextCard),
}

impl ChartItem {
    /// Stable identifier, used for export file names.
    pub fn id(&self) -> &str {
        match self {
            Self::Series(chart) => &chart.id,
            Self::DayGrid(_) => DAY_GRID_ID,
            Self::TextCard(_) => CLOSING_CARD_ID,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Series(chart) => &chart.title,
            Self::DayGrid(_) => "Notable days",
            Self::TextCard(card) => &card.title,
        }
    }

    pub const fn is_closing_card(&self) -> bool {
        matches!(self, Self::TextCard(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepDirection {
    Forward,
    Backward,
}

/// Index of the displayed item. Every mutation clamps to `0..len`; with no
/// items the index stays at 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationCursor {
    index: usize,
}

impl NavigationCursor {
    pub const fn index(self) -> usize {
        self.index
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    pub fn clamp(&mut self, len: usize) {
        self.index = self.index.min(len.saturating_sub(1));
    }

    /// Returns whether the cursor moved. A step off either end is refused.
    pub fn step(&mut self, direction: StepDirection, len: usize) -> bool {
        self.clamp(len);
        let next = match direction {
            StepDirection::Forward => self.index.checked_add(1).filter(|next| *next < len),
            StepDirection::Backward => self.index.checked_sub(1),
        };
        match next {
            Some(next) => {
                self.index = next;
                true
            }
            None => false,
        }
    }
}
