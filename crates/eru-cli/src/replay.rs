use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::task::JoinSet;

use eru_core::{BrowserEvent, EngineConfig, EventBus, FileBackend, StatsStore, WriteQueue};

/// Outcome of replaying an event log.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub events: usize,
    pub skipped_lines: usize,
    pub applied: usize,
    pub ignored: usize,
    pub async_replies: usize,
    pub writes: usize,
    pub elapsed_ms: u64,
}

/// Parse an NDJSON event log. Blank lines and `#` comments are skipped
/// silently; lines that fail to parse are counted and logged.
pub fn parse_events(text: &str) -> (Vec<BrowserEvent>, usize) {
    let mut events = Vec::new();
    let mut skipped = 0usize;
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match serde_json::from_str::<BrowserEvent>(line) {
            Ok(event) => events.push(event),
            Err(e) => {
                log::warn!("Line {}: skipping unparseable event: {}", line_no + 1, e);
                skipped += 1;
            }
        }
    }
    (events, skipped)
}

/// Dispatch every event concurrently through one write queue, so the
/// producers race exactly as they do in the browser but never lose updates.
pub async fn run_replay(
    store: Arc<StatsStore<FileBackend>>,
    config: &EngineConfig,
    input: &Path,
) -> Result<ReplayReport, String> {
    let start = Instant::now();
    let text = tokio::fs::read_to_string(input)
        .await
        .map_err(|e| format!("Failed to read '{}': {}", input.display(), e))?;
    let (events, skipped_lines) = parse_events(&text);

    let queue = WriteQueue::spawn(Arc::clone(&store))
        .map_err(|e| format!("Failed to start writer: {}", e))?;
    let bus = Arc::new(EventBus::with_producers(
        queue.handle(),
        Arc::new(config.exclusion_set()),
        Arc::new(config.classifier()),
    ));

    let mut report = ReplayReport {
        events: events.len(),
        skipped_lines,
        ..ReplayReport::default()
    };

    let mut tasks = JoinSet::new();
    for event in events {
        let bus = Arc::clone(&bus);
        tasks.spawn_blocking(move || {
            let dispatch = bus.dispatch(&event);
            let keep_open = dispatch.keep_channel_open();
            (dispatch.wait(), keep_open)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (applied, keep_open) = joined.map_err(|e| format!("Replay task failed: {}", e))?;
        if applied {
            report.applied += 1;
        } else {
            report.ignored += 1;
        }
        if keep_open {
            report.async_replies += 1;
        }
    }

    drop(bus);
    report.writes = queue.shutdown();
    report.elapsed_ms = start.elapsed().as_millis() as u64;
    Ok(report)
}
