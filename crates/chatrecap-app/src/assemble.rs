// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Reshapes an [`AnalysisPayload`] into the ordered item sequence the front
//! end pages through.
//!
//! Order is fixed: every known metric in [`METRICS`] order, then the notable
//! days grid, then the closing card. A metric that is missing or unusable is
//! left out; it never turns into an empty placeholder and never stops the
//! remaining metrics from being built.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::model::{
    ChartItem, ChartKind, ChatLine, DayEntry, DayGrid, Series, SeriesChart, TextCard,
};
use crate::payload::{AnalysisPayload, MetricRecord, Row};

pub const DAY_SUMMARIES_KEY: &str = "day_summaries";
const SENDER_FIELD: &str = "sender";

const CLOSING_TITLE: &str = "That's a wrap";
const CLOSING_BODY: &str = "That is everything the analysis found for this year.\n\
Switch years to compare, or export any chart you want to keep.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetricShape {
    /// Award-style charts, sorted by value, highest first.
    Ranking {
        label: &'static str,
        value: &'static str,
    },
    /// Category or time charts that keep the service's order.
    Sequence {
        label: &'static str,
        value: &'static str,
    },
    /// One series per sender over a shared, ascending x-axis.
    PerSender {
        x: &'static str,
        value: &'static str,
    },
}

#[derive(Debug, Clone, Copy)]
struct MetricDef {
    key: &'static str,
    title: &'static str,
    kind: ChartKind,
    series_name: &'static str,
    shape: MetricShape,
}

const METRICS: [MetricDef; 8] = [
    MetricDef {
        key: "monthly_messages",
        title: "Messages per month",
        kind: ChartKind::Line,
        series_name: "messages",
        shape: MetricShape::Sequence {
            label: "month",
            value: "message_count",
        },
    },
    MetricDef {
        key: "day_of_week",
        title: "Busiest day of the week",
        kind: ChartKind::Bar,
        series_name: "average messages",
        shape: MetricShape::Ranking {
            label: "day_of_week",
            value: "avg_messages",
        },
    },
    MetricDef {
        key: "hourly_activity",
        title: "When the chat is awake",
        kind: ChartKind::Bar,
        series_name: "messages",
        shape: MetricShape::Sequence {
            label: "hour",
            value: "message_count",
        },
    },
    MetricDef {
        key: "top_ten_days",
        title: "Top ten days",
        kind: ChartKind::Bar,
        series_name: "messages",
        shape: MetricShape::Ranking {
            label: "date",
            value: "message_count",
        },
    },
    MetricDef {
        key: "quarterly_contribution",
        title: "Share of messages per quarter",
        kind: ChartKind::Line,
        series_name: "",
        shape: MetricShape::PerSender {
            x: "quarter",
            value: "percentage",
        },
    },
    MetricDef {
        key: "most_manic",
        title: "Most manic",
        kind: ChartKind::Bar,
        series_name: "manic score",
        shape: MetricShape::Ranking {
            label: SENDER_FIELD,
            value: "manic_score",
        },
    },
    MetricDef {
        key: "most_ignored",
        title: "Most ignored",
        kind: ChartKind::Bar,
        series_name: "unanswered messages",
        shape: MetricShape::Ranking {
            label: SENDER_FIELD,
            value: "ignored_count",
        },
    },
    MetricDef {
        key: "novelist_award",
        title: "Novelist award",
        kind: ChartKind::Bar,
        series_name: "words per message",
        shape: MetricShape::Ranking {
            label: SENDER_FIELD,
            value: "avg_words",
        },
    },
];

/// Metric keys the assembler understands, in display order.
pub fn known_metric_keys() -> impl Iterator<Item = &'static str> {
    METRICS.iter().map(|def| def.key)
}

pub fn assemble(payload: Option<&AnalysisPayload>) -> Vec<ChartItem> {
    let mut items = Vec::new();
    if let Some(payload) = payload {
        items.extend(
            METRICS
                .iter()
                .filter_map(|def| build_series_chart(payload, def))
                .map(ChartItem::Series),
        );
        if let Some(grid) = build_day_grid(payload) {
            items.push(ChartItem::DayGrid(grid));
        }
    }
    items.push(closing_card());
    items
}

/// True when the sequence holds anything besides the closing card.
pub fn has_content(items: &[ChartItem]) -> bool {
    items.iter().any(|item| !item.is_closing_card())
}

pub fn closing_card() -> ChartItem {
    ChartItem::TextCard(TextCard {
        title: CLOSING_TITLE.to_owned(),
        body: CLOSING_BODY.to_owned(),
    })
}

fn build_series_chart(payload: &AnalysisPayload, def: &MetricDef) -> Option<SeriesChart> {
    let Some(record) = payload.metric(def.key) else {
        if payload.keys().any(|key| key == def.key) {
            debug!(metric = def.key, "metric has no data array; skipping");
        }
        return None;
    };
    if record.is_empty() {
        return None;
    }

    let built = match def.shape {
        MetricShape::Ranking { label, value } => {
            single_series(record, label, value, def.series_name, true)
        }
        MetricShape::Sequence { label, value } => {
            single_series(record, label, value, def.series_name, false)
        }
        MetricShape::PerSender { x, value } => per_sender_series(record, x, value),
    };
    let Some((labels, series)) = built else {
        debug!(metric = def.key, "no usable rows; skipping");
        return None;
    };

    Some(SeriesChart {
        id: def.key.to_owned(),
        title: def.title.to_owned(),
        kind: def.kind,
        labels,
        series,
        caption: record.caption().unwrap_or_default().to_owned(),
    })
}

fn single_series(
    record: MetricRecord<'_>,
    label_field: &str,
    value_field: &str,
    name: &str,
    ranked: bool,
) -> Option<(Vec<String>, Vec<Series>)> {
    let mut points = record
        .rows()
        .filter_map(|row| {
            let label = row.text(label_field);
            let value = row.number(value_field);
            if label.is_none() && value.is_none() {
                return None;
            }
            Some((label.unwrap_or_default(), value.unwrap_or(0.0)))
        })
        .collect::<Vec<(String, f64)>>();
    if points.is_empty() {
        return None;
    }
    if ranked {
        // sort_by is stable, so ties keep the service's order
        points.sort_by(|left, right| right.1.total_cmp(&left.1));
    }

    let (labels, values) = points.into_iter().unzip();
    Some((
        labels,
        vec![Series {
            name: name.to_owned(),
            values,
        }],
    ))
}

fn per_sender_series(
    record: MetricRecord<'_>,
    x_field: &str,
    value_field: &str,
) -> Option<(Vec<String>, Vec<Series>)> {
    let mut groups: Vec<(String, BTreeMap<String, f64>)> = Vec::new();
    let mut axis = BTreeSet::new();

    for row in record.rows() {
        let x = row.text(x_field);
        let value = row.number(value_field);
        if x.is_none() && value.is_none() {
            continue;
        }
        let sender = row.text(SENDER_FIELD).unwrap_or_default();
        let x = x.unwrap_or_default();
        axis.insert(x.clone());

        let index = match groups.iter().position(|(name, _)| *name == sender) {
            Some(index) => index,
            None => {
                groups.push((sender, BTreeMap::new()));
                groups.len() - 1
            }
        };
        groups[index].1.insert(x, value.unwrap_or(0.0));
    }
    if groups.is_empty() {
        return None;
    }

    let labels = ordered_axis(axis);
    let series = groups
        .into_iter()
        .map(|(name, points)| Series {
            name,
            values: labels
                .iter()
                .map(|label| points.get(label).copied().unwrap_or(0.0))
                .collect(),
        })
        .collect();
    Some((labels, series))
}

/// Hours and other numeric keys sort by value ("2" before "10"); anything
/// else keeps lexical order.
fn ordered_axis(axis: BTreeSet<String>) -> Vec<String> {
    let numeric = axis
        .iter()
        .map(|label| label.trim().parse::<f64>().ok())
        .collect::<Option<Vec<f64>>>();
    match numeric {
        Some(keys) => {
            let mut pairs = keys.into_iter().zip(axis).collect::<Vec<(f64, String)>>();
            pairs.sort_by(|left, right| left.0.total_cmp(&right.0));
            pairs.into_iter().map(|(_, label)| label).collect()
        }
        None => axis.into_iter().collect(),
    }
}

fn build_day_grid(payload: &AnalysisPayload) -> Option<DayGrid> {
    let record = payload.metric(DAY_SUMMARIES_KEY)?;
    let entries = record.rows().filter_map(day_entry).collect::<Vec<DayEntry>>();
    if entries.is_empty() {
        debug!("day summaries present but unusable; skipping grid");
        return None;
    }
    Some(DayGrid { entries })
}

fn day_entry(row: Row<'_>) -> Option<DayEntry> {
    let title = row.text("date");
    let summary = row.text("summary");
    if title.is_none() && summary.is_none() {
        return None;
    }

    let chat_log = row.list("chat_log").map(|lines| {
        lines
            .iter()
            .filter(|line| line.is_object())
            .map(|line| {
                let line = Row::new(line);
                ChatLine {
                    sender: line.text("sender").unwrap_or_default(),
                    timestamp: line.text("timestamp").unwrap_or_default(),
                    message: line.text("message").unwrap_or_default(),
                }
            })
            .collect()
    });

    Some(DayEntry {
        title: title.unwrap_or_default(),
        summary: summary.unwrap_or_default(),
        chat_log,
    })
}
