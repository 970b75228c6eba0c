use serde::{Deserialize, Serialize};

use crate::model::WeatherReport;

/// What happens to the collection after a successful backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushPolicy {
    /// Every backup rewrites the full history gathered since startup.
    #[default]
    KeepHistory,
    /// Each backup only holds reports gathered since the previous one.
    ClearOnFlush,
}

/// Reports gathered during this process lifetime, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct ReportCollection {
    reports: Vec<WeatherReport>,
}

impl ReportCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, report: WeatherReport) {
        self.reports.push(report);
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn reports(&self) -> &[WeatherReport] {
        &self.reports
    }

    pub(crate) fn clear(&mut self) {
        self.reports.clear();
    }
}
