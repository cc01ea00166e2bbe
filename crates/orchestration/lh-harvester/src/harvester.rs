//! Main harvest loop.
//!
//! One cycle walks `Idle -> Listing -> Fetching -> Parsing -> Idle`:
//! plan prefixes from the watermark, scan candidates, then for each candidate
//! in modification-time order fetch the appended bytes, split them into lines,
//! filter and parse the lines, and push the events to the sink. Offsets and
//! fragments are committed only after every event of an object's delta has
//! been delivered.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use lh_discoverer::{ObjectScanner, PatternFilter, PrefixPlanner};
use lh_error::{ErrorCategory, HarvestError, ProcessingStage, Result, SinkError, classify_error};
use lh_reader::{IncrementalFetcher, RecordFilter, RecordParser, W3cAccessSchema, split_lines};
use lh_traits::{CheckpointStore, EventSink, ObjectStore};
use lh_types::{Event, ObjectRef, ResumeState, Watermark};
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::HarvesterConfig;
use crate::state::HarvestState;
use crate::stats::{CycleStats, RunStats};

/// Outcome of consuming one object's delta.
#[derive(Debug, Default)]
struct ObjectOutcome {
    bytes_read: u64,
    /// The read reached the listed size
    complete: bool,
    events: u64,
    malformed: u64,
    skipped: u64,
}

/// Incremental log harvester.
///
/// Owns the watermark, offsets and fragments exclusively, so a cycle runs
/// on `&mut self` and never overlaps with another.
pub struct Harvester<S: ObjectStore + ?Sized + 'static> {
    config: HarvesterConfig,
    planner: PrefixPlanner,
    scanner: ObjectScanner<S>,
    fetcher: IncrementalFetcher<S>,
    record_filter: RecordFilter,
    parser: Arc<dyn RecordParser>,
    sink: Arc<dyn EventSink>,
    checkpoint: Option<Arc<dyn CheckpointStore>>,
    state: HarvestState,
}

impl<S: ObjectStore + ?Sized + 'static> Harvester<S> {
    /// Create a harvester.
    ///
    /// The initial watermark is the configured skip-until date, or the
    /// beginning of time. A checkpoint, if one is configured and saved,
    /// replaces it when [`run`](Self::run) starts.
    ///
    /// # Arguments
    ///
    /// * `config` - Harvester configuration
    /// * `store` - Object store holding the log segments
    /// * `sink` - Destination for parsed events
    pub fn new(config: HarvesterConfig, store: Arc<S>, sink: Arc<dyn EventSink>) -> Result<Self> {
        config.validate().map_err(HarvestError::Config)?;

        let planner = PrefixPlanner::new(config.base_prefix.clone())
            .with_lookback(ChronoDuration::days(i64::from(config.lookback_days)));

        let mut scanner =
            ObjectScanner::new(store.clone()).with_request_timeout(config.request_timeout);
        if let Some(pattern) = &config.key_pattern {
            scanner = scanner.with_key_filter(PatternFilter::new(pattern)?);
        }

        let fetcher = IncrementalFetcher::new(store)
            .with_max_fetch_bytes(config.max_fetch_bytes)
            .with_request_timeout(config.request_timeout);

        let record_filter = RecordFilter::new().with_escapes(config.escapes.clone());
        let state = HarvestState::new(Watermark::from(config.skip_until));

        Ok(Self {
            config,
            planner,
            scanner,
            fetcher,
            record_filter,
            parser: Arc::new(W3cAccessSchema),
            sink,
            checkpoint: None,
            state,
        })
    }

    /// Use a different record parser.
    pub fn with_parser(mut self, parser: Arc<dyn RecordParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Load from and save to a checkpoint store.
    pub fn with_checkpoint_store(mut self, store: Arc<dyn CheckpointStore>) -> Self {
        self.checkpoint = Some(store);
        self
    }

    /// Current watermark.
    pub fn watermark(&self) -> Watermark {
        self.state.watermark()
    }

    /// Current harvest state.
    pub fn state(&self) -> &HarvestState {
        &self.state
    }

    /// Replace the in-memory position with a previously captured one.
    pub fn restore(&mut self, resume: ResumeState) {
        info!(
            watermark = %resume.watermark,
            objects = resume.offsets.len(),
            "Restoring harvest position"
        );
        self.state = HarvestState::from_resume(resume);
    }

    /// Load the checkpoint, if a store is configured and holds one.
    ///
    /// A load failure is logged and the configured start position is kept.
    pub async fn load_checkpoint(&mut self) -> bool {
        let Some(store) = self.checkpoint.clone() else {
            return false;
        };

        match store.load().await {
            Ok(Some(resume)) => {
                self.restore(resume);
                true
            }
            Ok(None) => {
                debug!(watermark = %self.state.watermark(), "No checkpoint, using configured start");
                false
            }
            Err(e) => {
                warn!(error = %e, "Failed to load checkpoint, using configured start");
                false
            }
        }
    }

    /// Run cycles until `cancel` fires.
    ///
    /// The first cycle starts immediately. Cancellation is observed only
    /// between cycles; a cycle in progress always completes. Late ticks are
    /// delayed, never burst.
    pub async fn run(&mut self, cancel: CancellationToken) -> RunStats {
        let mut totals = RunStats::new();
        self.load_checkpoint().await;

        info!(
            base_prefix = %self.config.base_prefix,
            poll_interval_secs = self.config.poll_interval.as_secs(),
            watermark = %self.state.watermark(),
            "Starting harvester"
        );

        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let cycle = self.run_cycle().await;
            totals.record_cycle(&cycle);
        }

        totals.complete();
        info!(
            cycles = totals.cycles,
            events = totals.events_emitted,
            malformed = totals.lines_malformed,
            watermark = %totals.watermark,
            "Harvester stopped"
        );
        totals
    }

    /// Run a single cycle against the current time.
    pub async fn run_cycle(&mut self) -> CycleStats {
        self.run_cycle_at(Utc::now()).await
    }

    /// Run a single cycle as if the current time were `now`.
    pub async fn run_cycle_at(&mut self, now: DateTime<Utc>) -> CycleStats {
        let mut stats = CycleStats::new();
        let watermark = self.state.watermark();

        let prefixes = self.planner.plan(watermark, now);
        stats.prefixes = prefixes.len();
        debug!(watermark = %watermark, prefixes = ?prefixes, "Planned prefixes");

        match self.scanner.scan(&prefixes, watermark).await {
            Ok(scan) => {
                stats.record_scan(&scan);
                self.process_candidates(&scan.candidates, &mut stats).await;
            }
            Err(e) => {
                warn!(
                    error = %e,
                    category = ?classify_error(&e),
                    "Scan failed, retrying next cycle"
                );
                stats.record_error(format!("{}: {e}", ProcessingStage::Listing));
            }
        }

        if stats.events_emitted > 0 {
            if let Err(e) = self.sink.flush().await {
                warn!(error = %e, "Failed to flush sink");
                stats.record_error(format!("{}: {e}", ProcessingStage::Delivery));
            }
        }

        self.save_checkpoint(&mut stats).await;
        stats.complete(self.state.watermark());

        info!(
            candidates = stats.candidates,
            processed = stats.objects_processed,
            failed = stats.objects_failed,
            dropped = stats.objects_dropped,
            events = stats.events_emitted,
            malformed = stats.lines_malformed,
            bytes = stats.bytes_read,
            watermark = %stats.watermark,
            "Cycle completed"
        );
        stats
    }

    /// Process candidates in order, advancing the watermark.
    ///
    /// The watermark moves to an object's modification time only once every
    /// candidate sharing that time has been read up to its listed size. After
    /// the first transient failure or short read it is frozen for the rest of
    /// the cycle so that object is listed again; later objects are still
    /// processed. Objects failing permanently are dropped and do not hold the
    /// watermark back.
    async fn process_candidates(&mut self, candidates: &[ObjectRef], stats: &mut CycleStats) {
        let mut pending_mark: Option<DateTime<Utc>> = None;
        let mut frozen = false;

        for obj in candidates {
            let Some(modified) = obj.last_modified else {
                continue;
            };

            if let Some(mark) = pending_mark.filter(|mark| modified > *mark) {
                self.state.advance_watermark(mark);
                pending_mark = None;
            }

            match self.process_object(obj).await {
                Ok(outcome) => {
                    stats.record_object(
                        outcome.bytes_read,
                        outcome.events,
                        outcome.malformed,
                        outcome.skipped,
                    );
                    if !outcome.complete {
                        debug!(
                            identity = %obj.identity,
                            size = obj.size,
                            "Object not read to its listed size, holding watermark"
                        );
                        frozen = true;
                        pending_mark = None;
                    } else if !frozen {
                        pending_mark = Some(modified);
                    }
                }
                Err((stage, e)) if classify_error(&e) == ErrorCategory::Permanent => {
                    warn!(
                        identity = %obj.identity,
                        stage = %stage,
                        error = %e,
                        "Dropping object, retrying will not help"
                    );
                    stats.record_object_dropped(format!("{stage} {}: {e}", obj.identity));
                    if !frozen {
                        pending_mark = Some(modified);
                    }
                }
                Err((stage, e)) => {
                    warn!(
                        identity = %obj.identity,
                        stage = %stage,
                        error = %e,
                        "Skipping object for this cycle"
                    );
                    stats.record_object_failure(format!("{stage} {}: {e}", obj.identity));
                    frozen = true;
                    pending_mark = None;
                }
            }
        }

        if let Some(mark) = pending_mark {
            self.state.advance_watermark(mark);
        }
    }

    /// Consume one object's delta. State is untouched on error.
    async fn process_object(
        &mut self,
        obj: &ObjectRef,
    ) -> std::result::Result<ObjectOutcome, (ProcessingStage, HarvestError)> {
        let from = self.state.offsets().offset_for(&obj.identity);
        let bytes = self
            .fetcher
            .fetch(obj, from)
            .await
            .map_err(|e| (ProcessingStage::Fetching, e))?;

        let mut outcome = ObjectOutcome {
            bytes_read: bytes.len() as u64,
            ..Default::default()
        };
        let end = from + outcome.bytes_read;
        outcome.complete = end >= obj.size;

        let split = split_lines(&self.state.fragment(&obj.identity), bytes);

        for line in &split.lines {
            let Some(record) = self.record_filter.filter(line) else {
                outcome.skipped += 1;
                continue;
            };

            match self.parser.parse(&record) {
                Ok(event) => {
                    self.deliver(&event)
                        .await
                        .map_err(|e| (ProcessingStage::Delivery, e))?;
                    outcome.events += 1;
                }
                Err(e) => {
                    warn!(identity = %obj.identity, error = %e, "Dropping malformed line");
                    outcome.malformed += 1;
                }
            }
        }

        debug!(
            identity = %obj.identity,
            from = from,
            to = end,
            lines = split.lines.len(),
            fragment = split.fragment.len(),
            events = outcome.events,
            "Processed object"
        );

        self.state.commit(&obj.identity, end, split.fragment);
        Ok(outcome)
    }

    async fn deliver(&self, event: &Event) -> Result<()> {
        match tokio::time::timeout(self.config.request_timeout, self.sink.push(event)).await {
            Ok(result) => result,
            Err(_) => Err(SinkError::Delivery(format!(
                "push timed out after {:?}",
                self.config.request_timeout
            ))
            .into()),
        }
    }

    async fn save_checkpoint(&self, stats: &mut CycleStats) {
        let Some(store) = &self.checkpoint else {
            return;
        };

        if let Err(e) = store.save(&self.state.resume_state()).await {
            warn!(error = %e, "Failed to save checkpoint, retrying next cycle");
            stats.record_error(format!("{}: {e}", ProcessingStage::Checkpoint));
        }
    }
}
