//! Fetch → normalize → accumulate, plus the daily backup scheduler.
//!
//! Everything here runs on one task: a report cycle and a scheduled flush
//! never overlap, and both go through `&mut self`.

use std::{path::PathBuf, time::Duration};

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{debug, error, info, warn};

use crate::{
    Config,
    backup::BackupWriter,
    collection::{FlushPolicy, ReportCollection},
    error::{FetchError, PersistenceError},
    geocode::{Geocoder, NominatimGeocoder},
    model::WeatherReport,
    normalize::normalize,
    provider::{WeatherProvider, default_provider_from_config},
    schedule::DailySchedule,
};

/// Longest single sleep of the scheduler, so wall-clock jumps are noticed.
const MAX_WAIT: Duration = Duration::from_secs(60 * 60);

/// Step of a report cycle that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStage {
    Geocoding,
    Querying,
    Normalizing,
}

/// Where the most recent report cycle is, or where it ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CycleState {
    #[default]
    Idle,
    Geocoding,
    Querying,
    Normalizing,
    Stored,
    Failed(CycleStage),
}

#[derive(Debug)]
pub struct CollectionLoop {
    geocoder: Box<dyn Geocoder>,
    provider: Box<dyn WeatherProvider>,
    collection: ReportCollection,
    backup: BackupWriter,
    policy: FlushPolicy,
    triggers: Vec<DailySchedule>,
    last_cycle: CycleState,
}

impl CollectionLoop {
    pub fn new(
        geocoder: Box<dyn Geocoder>,
        provider: Box<dyn WeatherProvider>,
        backup: BackupWriter,
    ) -> Self {
        Self {
            geocoder,
            provider,
            collection: ReportCollection::new(),
            backup,
            policy: FlushPolicy::default(),
            triggers: Vec::new(),
            last_cycle: CycleState::Idle,
        }
    }

    /// Wire up Nominatim, the configured provider and the backup directory.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider = default_provider_from_config(config)?;
        let geocoder = NominatimGeocoder::new(&config.geocoder.user_agent)?;
        let backup = BackupWriter::new(&config.backup.dir);

        Ok(Self::new(Box::new(geocoder), provider, backup).with_policy(config.backup.policy))
    }

    pub fn with_policy(mut self, policy: FlushPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn collection(&self) -> &ReportCollection {
        &self.collection
    }

    pub fn last_cycle(&self) -> CycleState {
        self.last_cycle
    }

    pub fn triggers(&self) -> &[DailySchedule] {
        &self.triggers
    }

    pub fn backup_writer(&self) -> &BackupWriter {
        &self.backup
    }

    /// One geocode → query → normalize → store cycle for `location`.
    ///
    /// A failure is logged and returned; it leaves the collection untouched
    /// and has no effect on the scheduler or later cycles.
    pub async fn run_once(&mut self, location: &str) -> Result<WeatherReport, FetchError> {
        self.enter(CycleState::Geocoding);
        let coords = match self.geocoder.geocode(location).await {
            Ok(coords) => coords,
            Err(e) => return Err(self.fail(CycleStage::Geocoding, e.into())),
        };
        info!(%location, lat = coords.latitude, lon = coords.longitude, "coordinates found");

        self.enter(CycleState::Querying);
        let payload = match self.provider.current_weather(coords).await {
            Ok(payload) => payload,
            Err(e) => return Err(self.fail(CycleStage::Querying, e.into())),
        };
        debug!(provider = %self.provider.id(), "provider response received");

        self.enter(CycleState::Normalizing);
        let report = match normalize(&payload, location, coords.latitude, coords.longitude) {
            Ok(report) => report,
            Err(e) => return Err(self.fail(CycleStage::Normalizing, e.into())),
        };

        self.collection.push(report.clone());
        self.enter(CycleState::Stored);
        info!(
            %location,
            condition = %report.condition(),
            collected = self.collection.len(),
            "weather report stored"
        );

        Ok(report)
    }

    /// Register a backup at `at` every day, starting from the next occurrence.
    pub fn schedule_daily(&mut self, at: NaiveTime) {
        self.schedule_daily_from(at, Local::now().naive_local());
    }

    pub fn schedule_daily_from(&mut self, at: NaiveTime, now: NaiveDateTime) {
        let trigger = DailySchedule::new(at, now);
        info!(at = %at, next = %trigger.next_due(), "scheduled daily backup");
        self.triggers.push(trigger);
    }

    /// Write the current collection to the backup file for `date`.
    pub fn flush(&mut self, date: NaiveDate) -> Result<PathBuf, PersistenceError> {
        let path = self.backup.write(date, self.collection.reports())?;

        if self.policy == FlushPolicy::ClearOnFlush {
            self.collection.clear();
        }
        Ok(path)
    }

    /// Fire every trigger due at `now`. Returns how many fired.
    ///
    /// Backup failures are logged; the trigger is re-armed either way.
    pub fn run_pending(&mut self, now: NaiveDateTime) -> usize {
        let mut fired = 0;

        for idx in 0..self.triggers.len() {
            if !self.triggers[idx].is_due(now) {
                continue;
            }

            let count = self.collection.len();
            match self.flush(now.date()) {
                Ok(path) => info!(path = %path.display(), reports = count, "backup saved"),
                Err(e) => error!("an error occurred while saving the backup: {e}"),
            }

            self.triggers[idx].rearm(now);
            fired += 1;
        }

        fired
    }

    /// How long the scheduler may sleep before the next trigger is due.
    pub fn time_until_next_due(&self, now: NaiveDateTime) -> Duration {
        self.triggers
            .iter()
            .map(DailySchedule::next_due)
            .min()
            .map(|due| (due - now).to_std().unwrap_or(Duration::ZERO))
            .unwrap_or(MAX_WAIT)
            .min(MAX_WAIT)
    }

    /// Run scheduled backups until the process is stopped. Never returns.
    pub async fn run_forever(&mut self) {
        info!(triggers = self.triggers.len(), "scheduler running");

        loop {
            self.run_pending(Local::now().naive_local());

            let wait = self.time_until_next_due(Local::now().naive_local());
            debug!(?wait, "scheduler sleeping");
            tokio::time::sleep(wait).await;
        }
    }

    fn enter(&mut self, state: CycleState) {
        debug!(from = ?self.last_cycle, to = ?state, "report cycle");
        self.last_cycle = state;
    }

    fn fail(&mut self, stage: CycleStage, err: FetchError) -> FetchError {
        warn!(?stage, "report cycle failed: {err}");
        self.last_cycle = CycleState::Failed(stage);
        err
    }
}
