// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

const ACTIVE_JOB_WRAPPERS: [&str; 2] = [
    "ActiveJob::QueueAdapters::SidekiqAdapter::JobWrapper",
    "Sidekiq::ActiveJob::Wrapper",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortedSet {
    Retry,
    Schedule,
    Dead,
}

impl SortedSet {
    pub const ALL: [Self; 3] = [Self::Retry, Self::Schedule, Self::Dead];

    pub const fn key(self) -> &'static str {
        match self {
            Self::Retry => "retry",
            Self::Schedule => "schedule",
            Self::Dead => "dead",
        }
    }

    /// Dead jobs are listed newest first; retries and scheduled jobs by
    /// earliest due time.
    pub const fn newest_first(self) -> bool {
        matches!(self, Self::Dead)
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "retry" => Some(Self::Retry),
            "schedule" => Some(Self::Schedule),
            "dead" => Some(Self::Dead),
            _ => None,
        }
    }
}

// A field of the wrong type decodes to its default instead of failing the
// whole record.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
struct RawJob {
    #[serde(default, deserialize_with = "lenient")]
    class: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    wrapped: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    queue: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    args: Vec<Value>,
    #[serde(default, deserialize_with = "lenient")]
    jid: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    error_class: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    error_message: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    retry_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    enqueued_at: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    failed_at: Option<f64>,
}

/// A job payload as stored by the job system. Decoding never fails: fields
/// missing from (or unreadable in) the payload stay empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobRecord {
    pub class: String,
    pub wrapped: Option<String>,
    pub queue: String,
    pub args: Vec<Value>,
    pub jid: String,
    pub error_class: Option<String>,
    pub error_message: Option<String>,
    pub retry_count: i64,
    pub enqueued_at: Option<f64>,
    pub failed_at: Option<f64>,
}

impl JobRecord {
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::from_value(value),
            Err(_) => Self::default(),
        }
    }

    pub fn from_value(value: Value) -> Self {
        let raw: RawJob = serde_json::from_value(value).unwrap_or_default();
        Self {
            class: raw.class.as_ref().map(value_as_name).unwrap_or_default(),
            wrapped: raw.wrapped.as_ref().map(value_as_name),
            queue: raw.queue.unwrap_or_default(),
            args: raw.args,
            jid: raw.jid.unwrap_or_default(),
            error_class: raw.error_class,
            error_message: raw.error_message,
            retry_count: raw.retry_count.unwrap_or(0),
            enqueued_at: raw.enqueued_at,
            failed_at: raw.failed_at,
        }
    }

    fn is_active_job_wrapper(&self) -> bool {
        ACTIVE_JOB_WRAPPERS.contains(&self.class.as_str())
    }

    pub fn display_class(&self) -> &str {
        match &self.wrapped {
            Some(wrapped) if self.is_active_job_wrapper() && !wrapped.is_empty() => wrapped,
            _ => &self.class,
        }
    }

    /// Arguments as the application passed them, unwrapping ActiveJob's
    /// serialized envelope when present.
    pub fn display_args(&self) -> &[Value] {
        if self.is_active_job_wrapper()
            && let Some(Value::Array(inner)) = self
                .args
                .first()
                .and_then(|envelope| envelope.get("arguments"))
        {
            return inner;
        }
        &self.args
    }

    pub fn has_error(&self) -> bool {
        self.error_class.is_some()
    }

    pub fn error_class(&self) -> &str {
        self.error_class.as_deref().unwrap_or_default()
    }

    pub fn error_message(&self) -> &str {
        self.error_message.as_deref().unwrap_or_default()
    }
}

fn value_as_name(value: &Value) -> String {
    match value {
        Value::String(name) => name.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A job from one of the time-ordered sets, scored by its Unix timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct SortedEntry {
    pub job: JobRecord,
    pub score: f64,
}

impl SortedEntry {
    pub fn new(job: JobRecord, score: f64) -> Self {
        Self { job, score }
    }

    pub fn parse(raw: &str, score: f64) -> Self {
        Self::new(JobRecord::parse(raw), score)
    }

    pub fn at(&self) -> i64 {
        self.score as i64
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPage {
    pub entries: Vec<SortedEntry>,
    pub total_size: i64,
}

impl JobPage {
    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub processed: i64,
    pub failed: i64,
    pub busy: i64,
    pub enqueued: i64,
    pub retries: i64,
    pub scheduled: i64,
    pub dead: i64,
}

impl Stats {
    /// Failure share of all finished jobs, in percent.
    pub fn failure_rate(&self) -> f64 {
        let finished = self.processed.saturating_add(self.failed);
        if finished <= 0 {
            return 0.0;
        }
        self.failed as f64 * 100.0 / finished as f64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedisInfo {
    pub version: String,
    pub uptime_seconds: i64,
    pub connected_clients: i64,
    pub used_memory: i64,
    pub used_memory_peak: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overview {
    pub stats: Stats,
    pub redis: RedisInfo,
    pub processes: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessSummary {
    pub identity: String,
    pub hostname: String,
    pub pid: i64,
    pub tag: String,
    pub concurrency: i64,
    pub busy: i64,
    pub queues: Vec<String>,
    pub started_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerEntry {
    pub process: String,
    pub thread_id: String,
    pub queue: String,
    pub job: JobRecord,
    pub run_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkerSnapshot {
    pub processes: Vec<ProcessSummary>,
    pub workers: Vec<WorkerEntry>,
}

impl WorkerSnapshot {
    pub fn thread_count(&self) -> i64 {
        self.processes.iter().map(|process| process.concurrency).sum()
    }

    pub fn busy_count(&self) -> i64 {
        self.processes.iter().map(|process| process.busy).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueSummary {
    pub name: String,
    pub size: i64,
    pub latency: f64,
}

#[cfg(test)]
mod tests {
    use super::{JobRecord, SortedEntry, SortedSet, Stats};
    use serde_json::json;

    #[test]
    fn parses_plain_job_payload() {
        let job = JobRecord::parse(
            r#"{"class":"HardWorker","queue":"default","args":[1,"two"],"jid":"abc","retry_count":3,"error_class":"RuntimeError","error_message":"boom"}"#,
        );
        assert_eq!(job.display_class(), "HardWorker");
        assert_eq!(job.queue, "default");
        assert_eq!(job.display_args(), &[json!(1), json!("two")]);
        assert_eq!(job.retry_count, 3);
        assert!(job.has_error());
        assert_eq!(job.error_class(), "RuntimeError");
        assert_eq!(job.error_message(), "boom");
    }

    #[test]
    fn unwraps_active_job_envelope() {
        let job = JobRecord::parse(
            r#"{"class":"ActiveJob::QueueAdapters::SidekiqAdapter::JobWrapper","wrapped":"SendInvoiceJob","queue":"mailers","args":[{"job_class":"SendInvoiceJob","arguments":[42,"eur"]}]}"#,
        );
        assert_eq!(job.display_class(), "SendInvoiceJob");
        assert_eq!(job.display_args(), &[json!(42), json!("eur")]);
    }

    #[test]
    fn mistyped_fields_do_not_erase_the_record() {
        let job = JobRecord::parse(
            r#"{"class":"HardJob","queue":"default","args":[1],"retry_count":"3","jid":7}"#,
        );
        assert_eq!(job.class, "HardJob");
        assert_eq!(job.queue, "default");
        assert_eq!(job.args, vec![json!(1)]);
        assert_eq!(job.retry_count, 0);
        assert_eq!(job.jid, "");

        let job = JobRecord::parse(
            r#"{"class":"HardJob","queue":"low","args":null,"error_class":"RuntimeError","error_message":["boom"]}"#,
        );
        assert_eq!(job.class, "HardJob");
        assert_eq!(job.queue, "low");
        assert!(job.args.is_empty());
        assert_eq!(job.error_class(), "RuntimeError");
        assert_eq!(job.error_message(), "");
    }

    #[test]
    fn garbage_payload_decodes_to_empty_record() {
        let job = JobRecord::parse("not json");
        assert_eq!(job, JobRecord::default());
        assert!(!job.has_error());

        let mistyped = JobRecord::parse(r#"{"class":"X","args":"oops"}"#);
        assert_eq!(mistyped, JobRecord::default());
    }

    #[test]
    fn sorted_entry_keeps_zero_score() {
        let entry = SortedEntry::parse(r#"{"class":"X"}"#, 0.0);
        assert_eq!(entry.at(), 0);

        let fractional = SortedEntry::parse(r#"{"class":"X"}"#, 1_700_000_000.75);
        assert_eq!(fractional.at(), 1_700_000_000);
    }

    #[test]
    fn sorted_set_ordering_and_keys() {
        assert!(SortedSet::Dead.newest_first());
        assert!(!SortedSet::Retry.newest_first());
        assert!(!SortedSet::Schedule.newest_first());
        for set in SortedSet::ALL {
            assert_eq!(SortedSet::parse(set.key()), Some(set));
        }
    }

    #[test]
    fn failure_rate_handles_empty_history() {
        assert_eq!(Stats::default().failure_rate(), 0.0);
        let stats = Stats {
            processed: 75,
            failed: 25,
            ..Stats::default()
        };
        assert!((stats.failure_rate() - 25.0).abs() < f64::EPSILON);
    }
}
