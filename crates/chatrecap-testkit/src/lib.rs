// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use chatrecap_app::{AnalysisPayload, Year};
use serde_json::{Map, Value, json};
use std::path::PathBuf;

const DEMO_YEARS: [i64; 3] = [2024, 2023, 2022];
const DEMO_SEED: u64 = 2024;

const SENDERS: [&str; 4] = ["Avery", "Jordan", "Riley", "Quinn"];
const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const MESSAGES: [&str; 16] = [
    "on my way",
    "did anyone see that",
    "lol",
    "who is bringing snacks",
    "running 10 min late",
    "that's hilarious",
    "can we move it to saturday",
    "send the photos!!",
    "ok",
    "wait what",
    "I'm not reading all that",
    "happy birthday!!!",
    "same",
    "call me when you're free",
    "the group trip is ON",
    "good night everyone",
];

const DAY_SUMMARIES: [&str; 6] = [
    "Trip planning spiralled into a two-hour debate about campsites.",
    "Birthday wishes flooded in before breakfast.",
    "A single meme kept the chat busy until 2am.",
    "Everyone weighed in on the new apartment photos.",
    "Concert tickets went on sale and chaos followed.",
    "A quiet day, until someone asked about the group budget.",
];

const CAPTIONS: [&str; 6] = [
    "Someone in this chat never sleeps.",
    "Weekends are for catching up.",
    "A few days carried the whole year.",
    "Not everyone gets a reply.",
    "Some of you write essays.",
    "Peaks and valleys, like any good friendship.",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Produces plausible chat exports and analysis payloads from a seed.
#[derive(Debug, Clone)]
pub struct ChatFaker {
    rng: DeterministicRng,
    seed: u64,
}

impl ChatFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    /// A WhatsApp-style export: `DD/MM/YYYY, HH:MM - Sender: message`.
    pub fn transcript(&mut self, years: &[i64], lines_per_year: usize) -> String {
        let mut out = String::new();
        for year in years.iter().rev() {
            for _ in 0..lines_per_year {
                out.push_str(&format!(
                    "{:02}/{:02}/{year}, {:02}:{:02} - {}: {}\n",
                    1 + self.int_n(28),
                    1 + self.int_n(12),
                    self.int_n(24),
                    self.int_n(60),
                    self.pick(&SENDERS),
                    self.pick(&MESSAGES),
                ));
            }
        }
        out
    }

    pub fn payload(&mut self, year: i64) -> AnalysisPayload {
        let mut metrics = Map::new();

        let monthly = MONTHS
            .iter()
            .map(|month| json!({"month": format!("{month} {year}"), "message_count": self.count(40, 900)}))
            .collect::<Vec<Value>>();
        metrics.insert(
            "monthly_messages".to_owned(),
            self.record(monthly, CAPTIONS[5]),
        );

        let weekdays = WEEKDAYS
            .iter()
            .map(|day| json!({"day_of_week": day, "avg_messages": self.count(5, 80) as f64 / 2.0}))
            .collect::<Vec<Value>>();
        metrics.insert(
            "day_of_week".to_owned(),
            self.record(weekdays, CAPTIONS[1]),
        );

        let hours = (0..24)
            .map(|hour| json!({"hour": format!("{hour:02}:00"), "message_count": self.count(0, 300)}))
            .collect::<Vec<Value>>();
        metrics.insert("hourly_activity".to_owned(), self.record(hours, CAPTIONS[0]));

        let days = (0..10)
            .map(|_| {
                json!({
                    "date": self.date(year),
                    "message_count": self.count(150, 700),
                })
            })
            .collect::<Vec<Value>>();
        metrics.insert("top_ten_days".to_owned(), self.record(days, CAPTIONS[2]));

        let mut quarterly = Vec::new();
        for quarter in 1..=4 {
            let mut remaining = 100_i64;
            for (index, sender) in SENDERS.iter().enumerate() {
                let share = if index + 1 == SENDERS.len() {
                    remaining
                } else {
                    let share = self.count(0, (remaining / 2).max(1) as usize) as i64;
                    remaining -= share;
                    share
                };
                // leave a gap now and then so the chart has to zero-fill
                if quarter == 2 && index == 3 && self.int_n(2) == 0 {
                    continue;
                }
                quarterly.push(json!({
                    "sender": sender,
                    "quarter": format!("{year}-Q{quarter}"),
                    "percentage": share,
                }));
            }
        }
        metrics.insert(
            "quarterly_contribution".to_owned(),
            self.record(quarterly, ""),
        );

        for (key, field, caption) in [
            ("most_manic", "manic_score", ""),
            ("most_ignored", "ignored_count", CAPTIONS[3]),
            ("novelist_award", "avg_words", CAPTIONS[4]),
        ] {
            let rows = SENDERS
                .iter()
                .map(|sender| json!({"sender": sender, field: self.count(1, 60)}))
                .collect::<Vec<Value>>();
            metrics.insert(key.to_owned(), self.record(rows, caption));
        }

        let summaries = (0..6)
            .map(|index| {
                let log = (0..4 + self.int_n(5))
                    .map(|_| {
                        json!({
                            "sender": self.pick(&SENDERS),
                            "timestamp": format!("{:02}:{:02}", self.int_n(24), self.int_n(60)),
                            "message": self.pick(&MESSAGES),
                        })
                    })
                    .collect::<Vec<Value>>();
                json!({
                    "date": self.date(year),
                    "summary": DAY_SUMMARIES[index],
                    "chat_log": log,
                })
            })
            .collect::<Vec<Value>>();
        metrics.insert("day_summaries".to_owned(), json!({"data": summaries}));

        AnalysisPayload::new(metrics)
    }

    fn record(&self, rows: Vec<Value>, caption: &str) -> Value {
        if caption.is_empty() {
            json!({ "data": rows })
        } else {
            json!({ "data": rows, "caption": caption })
        }
    }

    fn date(&mut self, year: i64) -> String {
        format!("{year}-{:02}-{:02}", 1 + self.int_n(12), 1 + self.int_n(28))
    }

    fn count(&mut self, min: usize, max: usize) -> usize {
        if max <= min {
            return min;
        }
        min + self.int_n(max - min + 1)
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }
}

pub fn demo_years() -> Vec<Year> {
    DEMO_YEARS.iter().copied().map(Year::Number).collect()
}

pub fn demo_transcript() -> String {
    ChatFaker::new(DEMO_SEED).transcript(&DEMO_YEARS, 40)
}

/// Same year, same payload: the seed is derived from the year.
pub fn demo_payload(year: &Year) -> AnalysisPayload {
    let numeric = match year {
        Year::Number(value) => *value,
        Year::Text(value) => value.trim().parse().unwrap_or(DEMO_YEARS[0]),
    };
    ChatFaker::new(DEMO_SEED ^ numeric.unsigned_abs()).payload(numeric)
}

/// The two-row `day_of_week` payload used across the assembler examples.
pub fn weekday_payload() -> AnalysisPayload {
    AnalysisPayload::from_value(json!({
        "day_of_week": {"data": [
            {"day_of_week": "Mon", "avg_messages": 5},
            {"day_of_week": "Tue", "avg_messages": 10}
        ]}
    }))
    .unwrap_or_default()
}

pub fn payload_json(payload: &AnalysisPayload) -> Result<String> {
    serde_json::to_string(payload).context("encode payload")
}

pub fn temp_export_dir() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let exports = dir.path().join("exports");
    Ok((dir, exports))
}

pub fn write_transcript(dir: &tempfile::TempDir, contents: &str) -> Result<PathBuf> {
    let path = dir.path().join("chat.txt");
    std::fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::{ChatFaker, demo_payload, demo_transcript, demo_years, weekday_payload};
    use chatrecap_app::{ChartItem, Year, assemble, known_metric_keys};

    #[test]
    fn demo_payload_fills_every_chart() {
        for year in demo_years() {
            let items = assemble(Some(&demo_payload(&year)));
            // every metric, the day grid, and the closing card
            assert_eq!(items.len(), known_metric_keys().count() + 2, "year {year}");
            assert!(matches!(items[items.len() - 2], ChartItem::DayGrid(_)));
        }
    }

    #[test]
    fn demo_payload_is_stable_per_year() {
        let year = Year::Number(2023);
        assert_eq!(demo_payload(&year), demo_payload(&year));
        assert_ne!(demo_payload(&year), demo_payload(&Year::Number(2022)));
        assert_eq!(demo_payload(&Year::Text("2023".to_owned())), demo_payload(&year));
    }

    #[test]
    fn transcript_lines_look_like_an_export() {
        let transcript = demo_transcript();
        let lines = transcript.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 120);
        for line in lines {
            let (stamp, rest) = line.split_once(" - ").expect("timestamp separator");
            assert_eq!(stamp.len(), "01/02/2024, 03:04".len(), "line {line}");
            assert!(rest.contains(": "), "line {line}");
        }
    }

    #[test]
    fn variety_across_seeds() {
        let first = ChatFaker::new(1).transcript(&[2024], 5);
        let second = ChatFaker::new(2).transcript(&[2024], 5);
        assert_ne!(first, second);
        assert_eq!(ChatFaker::new(0).seed(), 1);
    }

    #[test]
    fn weekday_payload_has_one_chart() {
        assert_eq!(assemble(Some(&weekday_payload())).len(), 2);
    }

    #[test]
    fn int_n() {
        let mut faker = ChatFaker::new(42);
        for _ in 0..100 {
            assert!(faker.int_n(5) < 5);
        }
    }
}
