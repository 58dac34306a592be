// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use chatrecap_api::Client;
use chatrecap_app::{AnalysisPayload, Failure, FetchRequest, Year};
use chatrecap_tui::{AppRuntime, InternalEvent};
use std::fs;
use std::path::Path;
use std::sync::mpsc::Sender;
use std::thread;
use tracing::{debug, warn};

/// Talks to the analysis service. Fetches run on worker threads so the UI
/// keeps drawing while a request is outstanding.
pub struct ServiceRuntime {
    client: Client,
}

impl ServiceRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl AppRuntime for ServiceRuntime {
    fn read_transcript(&mut self, path: &Path) -> Result<String, Failure> {
        read_transcript_file(path)
    }

    fn fetch_available_years(&mut self, transcript: &str) -> Result<Vec<Year>, Failure> {
        self.client
            .available_years(transcript)
            .map_err(Failure::from)
    }

    fn fetch_analysis(
        &mut self,
        transcript: &str,
        year: &Year,
    ) -> Result<AnalysisPayload, Failure> {
        self.client.analyze(transcript, year).map_err(Failure::from)
    }

    fn spawn_fetch(&mut self, request: FetchRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let mut worker = Self::new(self.client.clone());
        let generation = request.generation();
        thread::Builder::new()
            .name(format!("fetch-{generation}"))
            .spawn(move || {
                let outcome = worker.run_fetch(request);
                if tx.send(InternalEvent::Fetch(outcome)).is_err() {
                    debug!(generation, "ui closed before fetch finished");
                }
            })
            .map_err(|error| anyhow!("spawn fetch worker: {error}"))?;
        Ok(())
    }
}

/// Serves seeded fixtures without a network; `--demo` uses it.
pub struct DemoRuntime {
    years: Vec<Year>,
}

impl DemoRuntime {
    pub fn new() -> Self {
        Self {
            years: chatrecap_testkit::demo_years(),
        }
    }
}

impl Default for DemoRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl AppRuntime for DemoRuntime {
    fn read_transcript(&mut self, path: &Path) -> Result<String, Failure> {
        if path.exists() {
            return read_transcript_file(path);
        }
        Ok(chatrecap_testkit::demo_transcript())
    }

    fn fetch_available_years(&mut self, _transcript: &str) -> Result<Vec<Year>, Failure> {
        Ok(self.years.clone())
    }

    fn fetch_analysis(
        &mut self,
        _transcript: &str,
        year: &Year,
    ) -> Result<AnalysisPayload, Failure> {
        if !self.years.contains(year) {
            return Err(Failure::Network(format!(
                "server error (404): no demo data for {year}"
            )));
        }
        Ok(chatrecap_testkit::demo_payload(year))
    }
}

/// Transcripts are read as UTF-8, replacing invalid sequences rather than
/// rejecting the file.
fn read_transcript_file(path: &Path) -> Result<String, Failure> {
    let bytes = fs::read(path).map_err(|error| {
        warn!(path = %path.display(), error = %error, "cannot read transcript");
        Failure::FileRead {
            path: path.display().to_string(),
            reason: error.to_string(),
        }
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::{DemoRuntime, ServiceRuntime};
    use anyhow::{Result, anyhow};
    use chatrecap_api::Client;
    use chatrecap_app::{Failure, FetchRequest, Year};
    use chatrecap_tui::{AppRuntime, FetchOutcome, InternalEvent};
    use std::path::Path;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;
    use tiny_http::{Header, Response, Server};

    fn serve_once(body: &'static str, status: u16) -> Result<(String, thread::JoinHandle<()>)> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let addr = format!("http://{}", server.server_addr());
        let handle = thread::spawn(move || {
            let request = server.recv().expect("request expected");
            let response = Response::from_string(body)
                .with_status_code(status)
                .with_header(
                    Header::from_bytes("Content-Type", "application/json")
                        .expect("valid content type header"),
                );
            request.respond(response).expect("response should succeed");
        });
        Ok((addr, handle))
    }

    #[test]
    fn read_transcript_replaces_invalid_utf8() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("chat.txt");
        std::fs::write(&path, b"01/01/2024, 10:00 - Ana: caf\xe9\n")?;

        let client = Client::new("http://127.0.0.1:1", None)?;
        let transcript = ServiceRuntime::new(client).read_transcript(&path)?;
        assert!(transcript.starts_with("01/01/2024, 10:00 - Ana: caf"));
        assert!(transcript.contains('\u{fffd}'));
        Ok(())
    }

    #[test]
    fn demo_runtime_prefers_a_real_file() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path =
            chatrecap_testkit::write_transcript(&temp, "02/03/2024, 08:15 - Bo: morning")?;

        let transcript = DemoRuntime::new().read_transcript(&path)?;
        assert_eq!(transcript, "02/03/2024, 08:15 - Bo: morning");
        Ok(())
    }

    #[test]
    fn missing_transcript_is_file_read_failure() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("nope.txt");
        let client = Client::new("http://127.0.0.1:1", None)?;

        let failure = ServiceRuntime::new(client)
            .read_transcript(&path)
            .expect_err("missing file should fail");
        assert!(matches!(failure, Failure::FileRead { .. }));
        assert!(failure.to_string().contains("nope.txt"));
        Ok(())
    }

    #[test]
    fn spawned_fetch_reports_through_channel() -> Result<()> {
        let (addr, handle) = serve_once(r#"{"available_years":[2024,2023]}"#, 200)?;
        let client = Client::new(&addr, Some(Duration::from_secs(2)))?;
        let mut runtime = ServiceRuntime::new(client);
        let (tx, rx) = mpsc::channel();

        runtime.spawn_fetch(
            FetchRequest::AvailableYears {
                generation: 7,
                transcript: "chat".to_owned(),
            },
            tx,
        )?;
        let event = rx.recv_timeout(Duration::from_secs(5))?;
        assert_eq!(
            event,
            InternalEvent::Fetch(FetchOutcome::Years {
                generation: 7,
                result: Ok(vec![Year::Number(2024), Year::Number(2023)]),
            })
        );

        handle.join().map_err(|_| anyhow!("server thread panicked"))?;
        Ok(())
    }

    #[test]
    fn analysis_failure_keeps_generation_and_year() -> Result<()> {
        let (addr, handle) = serve_once(r#"{"error":"boom"}"#, 500)?;
        let client = Client::new(&addr, Some(Duration::from_secs(2)))?;
        let mut runtime = ServiceRuntime::new(client);

        let outcome = runtime.run_fetch(FetchRequest::Analysis {
            generation: 3,
            transcript: "chat".to_owned(),
            year: Year::Number(2022),
        });
        assert_eq!(
            outcome,
            FetchOutcome::Analysis {
                generation: 3,
                year: Year::Number(2022),
                result: Err(Failure::Network("server error (500): boom".to_owned())),
            }
        );

        handle.join().map_err(|_| anyhow!("server thread panicked"))?;
        Ok(())
    }

    #[test]
    fn demo_runtime_serves_every_demo_year() -> Result<()> {
        let mut runtime = DemoRuntime::new();
        let transcript = runtime.read_transcript(Path::new("/definitely/not/here.txt"))?;
        assert!(!transcript.is_empty());

        let years = runtime.fetch_available_years(&transcript)?;
        assert_eq!(years, chatrecap_testkit::demo_years());
        for year in &years {
            let payload = runtime.fetch_analysis(&transcript, year)?;
            assert!(!payload.is_empty());
        }

        let error = runtime
            .fetch_analysis(&transcript, &Year::Number(1999))
            .expect_err("unknown year should fail");
        assert!(error.to_string().contains("1999"));
        Ok(())
    }
}
