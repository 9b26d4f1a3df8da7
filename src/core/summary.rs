//! Per-business-name session summary.
//!
//! Aggregates parsed records into one row per business name, in order of
//! first appearance. First/last-seen times use the full
//! `yyyy-MM-dd HH:mm:ss` form because a summary can span several days.

use std::collections::HashMap;

use crate::core::log_record::{LogLevel, LogRecord};
use crate::util::time::{exec_time_seconds, normalize_full_timestamp};

/// Aggregated figures for one business name.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ServiceSummary {
    pub business_name: String,
    pub count: usize,
    pub exception_count: usize,
    /// Records whose exec time was numeric.
    pub timed_count: usize,
    pub total_exec_secs: f64,
    pub max_exec_secs: f64,
    pub first_seen: String,
    pub last_seen: String,
}

impl ServiceSummary {
    fn new(business_name: &str) -> Self {
        Self {
            business_name: business_name.to_string(),
            count: 0,
            exception_count: 0,
            timed_count: 0,
            total_exec_secs: 0.0,
            max_exec_secs: 0.0,
            first_seen: String::new(),
            last_seen: String::new(),
        }
    }

    /// Mean exec time over the timed records, if any.
    pub fn average_exec_secs(&self) -> Option<f64> {
        (self.timed_count > 0).then(|| self.total_exec_secs / self.timed_count as f64)
    }

    fn add(&mut self, record: &LogRecord) {
        self.count += 1;
        if record.log_level == LogLevel::Exception {
            self.exception_count += 1;
        }
        if let Some(secs) = exec_time_seconds(&record.exec_time) {
            self.timed_count += 1;
            self.total_exec_secs += secs;
            self.max_exec_secs = self.max_exec_secs.max(secs);
        }
        if !record.raw_timestamp.is_empty() {
            let seen = normalize_full_timestamp(&record.raw_timestamp);
            if self.first_seen.is_empty() {
                self.first_seen = seen.clone();
            }
            self.last_seen = seen;
        }
    }
}

/// Summarise records by business name. Records without a business name
/// are skipped.
pub fn summarize(records: &[LogRecord]) -> Vec<ServiceSummary> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut rows: Vec<ServiceSummary> = Vec::new();

    for record in records.iter().filter(|r| !r.business_name.is_empty()) {
        let slot = *index.entry(record.business_name.as_str()).or_insert_with(|| {
            rows.push(ServiceSummary::new(&record.business_name));
            rows.len() - 1
        });
        rows[slot].add(record);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, level: LogLevel, exec: &str, ts: &str) -> LogRecord {
        LogRecord::builder(1, level)
            .business_name(name)
            .exec_time(exec)
            .raw_timestamp(ts)
            .build()
    }

    #[test]
    fn test_summarize_groups_in_first_seen_order() {
        let records = vec![
            record("SVC_B", LogLevel::Data, "01.500", "01-06-2024 09:00:01"),
            record("SVC_A", LogLevel::Data, "0.5", "01-06-2024 09:00:02"),
            record("SVC_B", LogLevel::Exception, "", "02-06-2024 00:00:03.250"),
            record("", LogLevel::Debug, "9", "01-06-2024 09:00:04"),
        ];
        let rows = summarize(&records);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].business_name, "SVC_B");
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[0].exception_count, 1);
        assert_eq!(rows[0].timed_count, 1);
        assert_eq!(rows[0].average_exec_secs(), Some(1.5));
        assert_eq!(rows[0].first_seen, "2024-06-01 09:00:01");
        assert_eq!(rows[0].last_seen, "2024-06-02 00:00:03");
        assert_eq!(rows[1].max_exec_secs, 0.5);
    }

    #[test]
    fn test_summarize_empty() {
        assert!(summarize(&[]).is_empty());
    }
}
