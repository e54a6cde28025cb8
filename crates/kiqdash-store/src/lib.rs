// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use kiqdash_app::format::unix_now;
use kiqdash_app::{
    JobPage, JobRecord, Overview, ProcessSummary, QueueSummary, RedisInfo, SortedEntry, SortedSet,
    Stats, WorkerEntry, WorkerSnapshot,
};
use redis::{Commands, Connection};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

pub const APP_NAME: &str = "kiqdash";
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/0";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const PROCESSES_KEY: &str = "processes";
const QUEUES_KEY: &str = "queues";
const URL_SCHEMES: [&str; 4] = ["redis://", "rediss://", "unix://", "redis+unix://"];

// Newer job systems store enqueue times as integer milliseconds.
const MILLISECOND_TIMESTAMP_FLOOR: f64 = 100_000_000_000.0;

pub fn validate_redis_url(url: &str) -> Result<()> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        bail!("redis url is empty; set [redis].url or REDIS_URL");
    }
    if !URL_SCHEMES.iter().any(|scheme| trimmed.starts_with(scheme)) {
        bail!(
            "redis url {trimmed:?} must start with one of {}",
            URL_SCHEMES.join(", ")
        );
    }
    Ok(())
}

/// Read-only view of a job system's Redis keyspace.
///
/// One connection is opened lazily and shared by every query; any failed
/// command drops it so the next query reconnects.
pub struct Store {
    client: redis::Client,
    timeout: Duration,
    connection: Mutex<Option<Connection>>,
}

impl Store {
    pub fn open(url: &str, timeout: Duration) -> Result<Self> {
        validate_redis_url(url)?;
        let client =
            redis::Client::open(url.trim()).with_context(|| format!("parse redis url {url:?}"))?;
        Ok(Self {
            client,
            timeout,
            connection: Mutex::new(None),
        })
    }

    pub fn ping(&self) -> Result<()> {
        self.with_connection("ping redis", |connection| {
            redis::cmd("PING").query::<String>(connection).map(|_| ())
        })
    }

    pub fn stats(&self) -> Result<Stats> {
        self.with_connection("load stats", load_stats)
    }

    pub fn overview(&self) -> Result<Overview> {
        self.with_connection("load overview", |connection| {
            let stats = load_stats(connection)?;
            let info: String = redis::cmd("INFO").query(connection)?;
            let processes: i64 = connection.scard(PROCESSES_KEY)?;
            Ok(Overview {
                stats,
                redis: parse_redis_info(&info),
                processes: usize::try_from(processes).unwrap_or_default(),
            })
        })
    }

    pub fn workers(&self) -> Result<WorkerSnapshot> {
        self.with_connection("load workers", load_workers)
    }

    pub fn queues(&self) -> Result<Vec<QueueSummary>> {
        self.with_connection("load queues", |connection| {
            load_queues(connection, unix_now() as f64)
        })
    }

    pub fn sorted_page(&self, set: SortedSet, offset: usize, limit: usize) -> Result<JobPage> {
        self.with_connection(&format!("load {} page", set.key()), |connection| {
            load_sorted_page(connection, set, offset, limit)
        })
    }

    fn connect(&self) -> Result<Connection> {
        let connection = self
            .client
            .get_connection_with_timeout(self.timeout)
            .context("connect to redis")?;
        connection
            .set_read_timeout(Some(self.timeout))
            .context("set redis read timeout")?;
        connection
            .set_write_timeout(Some(self.timeout))
            .context("set redis write timeout")?;
        debug!(timeout_ms = self.timeout.as_millis() as u64, "redis connected");
        Ok(connection)
    }

    fn lock(&self) -> MutexGuard<'_, Option<Connection>> {
        match self.connection.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn with_connection<T>(
        &self,
        action: &str,
        query: impl FnOnce(&mut Connection) -> redis::RedisResult<T>,
    ) -> Result<T> {
        let mut guard = self.lock();
        if guard.is_none() {
            *guard = Some(self.connect()?);
        }
        let connection = guard
            .as_mut()
            .ok_or_else(|| anyhow!("redis connection unavailable"))?;

        match query(connection) {
            Ok(value) => {
                debug!(action, "redis query finished");
                Ok(value)
            }
            Err(error) => {
                *guard = None;
                Err(error).context(action.to_owned())
            }
        }
    }
}

fn load_stats(connection: &mut Connection) -> redis::RedisResult<Stats> {
    let (processed, failed, retries, scheduled, dead, processes, queues): (
        Option<i64>,
        Option<i64>,
        i64,
        i64,
        i64,
        Vec<String>,
        Vec<String>,
    ) = redis::pipe()
        .get("stat:processed")
        .get("stat:failed")
        .zcard(SortedSet::Retry.key())
        .zcard(SortedSet::Schedule.key())
        .zcard(SortedSet::Dead.key())
        .smembers(PROCESSES_KEY)
        .smembers(QUEUES_KEY)
        .query(connection)?;

    let mut busy = 0;
    let mut enqueued = 0;
    if !processes.is_empty() || !queues.is_empty() {
        let mut pipe = redis::pipe();
        for identity in &processes {
            pipe.hget(identity, "busy");
        }
        for queue in &queues {
            pipe.llen(queue_key(queue));
        }
        let counts: Vec<Option<i64>> = pipe.query(connection)?;
        let (busy_counts, queue_sizes) = counts.split_at(processes.len().min(counts.len()));
        busy = busy_counts.iter().flatten().sum();
        enqueued = queue_sizes.iter().flatten().sum();
    }

    Ok(Stats {
        processed: processed.unwrap_or(0),
        failed: failed.unwrap_or(0),
        busy,
        enqueued,
        retries,
        scheduled,
        dead,
    })
}

fn load_workers(connection: &mut Connection) -> redis::RedisResult<WorkerSnapshot> {
    let mut identities: Vec<String> = connection.smembers(PROCESSES_KEY)?;
    identities.sort();

    let mut snapshot = WorkerSnapshot::default();
    for identity in identities {
        let (info, busy): (Option<String>, Option<i64>) = redis::cmd("HMGET")
            .arg(&identity)
            .arg("info")
            .arg("busy")
            .query(connection)?;
        // Identities linger in the set briefly after a process exits.
        let Some(info) = info else {
            continue;
        };
        snapshot
            .processes
            .push(parse_process_info(&identity, &info, busy.unwrap_or(0)));

        let work: HashMap<String, String> = connection.hgetall(format!("{identity}:work"))?;
        let mut threads = work.into_iter().collect::<Vec<_>>();
        threads.sort();
        snapshot.workers.extend(
            threads
                .into_iter()
                .filter_map(|(thread_id, raw)| parse_work_entry(&identity, &thread_id, &raw)),
        );
    }

    snapshot.workers.sort_by_key(|worker| worker.run_at);
    Ok(snapshot)
}

fn load_queues(connection: &mut Connection, now: f64) -> redis::RedisResult<Vec<QueueSummary>> {
    let mut names: Vec<String> = connection.smembers(QUEUES_KEY)?;
    if names.is_empty() {
        return Ok(Vec::new());
    }
    names.sort();

    let mut sizes = redis::pipe();
    let mut oldest = redis::pipe();
    for name in &names {
        sizes.llen(queue_key(name));
        oldest.lrange(queue_key(name), -1, -1);
    }
    let sizes: Vec<i64> = sizes.query(connection)?;
    let oldest: Vec<Vec<String>> = oldest.query(connection)?;

    Ok(names
        .into_iter()
        .zip(sizes)
        .zip(oldest)
        .map(|((name, size), tail)| QueueSummary {
            name,
            size,
            latency: tail
                .first()
                .map(|raw| queue_latency(raw, now))
                .unwrap_or(0.0),
        })
        .collect())
}

fn load_sorted_page(
    connection: &mut Connection,
    set: SortedSet,
    offset: usize,
    limit: usize,
) -> redis::RedisResult<JobPage> {
    let total_size: i64 = connection.zcard(set.key())?;
    if total_size == 0 {
        return Ok(JobPage::empty());
    }
    if limit == 0 {
        return Ok(JobPage {
            entries: Vec::new(),
            total_size,
        });
    }

    let start = isize::try_from(offset).unwrap_or(isize::MAX);
    let stop = isize::try_from(offset.saturating_add(limit) - 1).unwrap_or(isize::MAX);
    let members: Vec<(String, f64)> = if set.newest_first() {
        connection.zrevrange_withscores(set.key(), start, stop)?
    } else {
        connection.zrange_withscores(set.key(), start, stop)?
    };

    Ok(JobPage {
        entries: members
            .into_iter()
            .map(|(raw, score)| SortedEntry::parse(&raw, score))
            .collect(),
        total_size,
    })
}

fn queue_key(name: &str) -> String {
    format!("queue:{name}")
}

#[derive(Debug, Default, Deserialize)]
struct ProcessInfo {
    #[serde(default)]
    hostname: String,
    #[serde(default)]
    pid: i64,
    #[serde(default)]
    tag: Option<String>,
    #[serde(default)]
    concurrency: i64,
    #[serde(default)]
    queues: Vec<String>,
    #[serde(default)]
    started_at: f64,
}

pub fn parse_process_info(identity: &str, raw: &str, busy: i64) -> ProcessSummary {
    let info: ProcessInfo = serde_json::from_str(raw).unwrap_or_default();
    ProcessSummary {
        identity: identity.to_owned(),
        hostname: info.hostname,
        pid: info.pid,
        tag: info.tag.unwrap_or_default(),
        concurrency: info.concurrency,
        busy,
        queues: info.queues,
        started_at: info.started_at as i64,
    }
}

/// Decodes one `<identity>:work` hash value. The payload is either embedded
/// JSON or a JSON string holding the job, depending on the writer's version.
pub fn parse_work_entry(process: &str, thread_id: &str, raw: &str) -> Option<WorkerEntry> {
    let work: Value = serde_json::from_str(raw).ok()?;
    let job = match work.get("payload") {
        Some(Value::String(payload)) => JobRecord::parse(payload),
        Some(payload) => JobRecord::from_value(payload.clone()),
        None => JobRecord::default(),
    };
    let queue = work
        .get("queue")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| job.queue.clone());
    let run_at = work.get("run_at").and_then(Value::as_f64).unwrap_or(0.0);

    Some(WorkerEntry {
        process: process.to_owned(),
        thread_id: thread_id.to_owned(),
        queue,
        job,
        run_at: normalize_timestamp(run_at) as i64,
    })
}

pub fn queue_latency(raw_job: &str, now: f64) -> f64 {
    let job = JobRecord::parse(raw_job);
    match job.enqueued_at {
        Some(enqueued_at) => (now - normalize_timestamp(enqueued_at)).max(0.0),
        None => 0.0,
    }
}

fn normalize_timestamp(value: f64) -> f64 {
    if value > MILLISECOND_TIMESTAMP_FLOOR {
        value / 1000.0
    } else {
        value
    }
}

pub fn parse_redis_info(raw: &str) -> RedisInfo {
    let fields = raw
        .lines()
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.trim().split_once(':'))
        .collect::<HashMap<_, _>>();
    let integer = |key: &str| {
        fields
            .get(key)
            .and_then(|value| value.parse::<i64>().ok())
            .unwrap_or(0)
    };

    RedisInfo {
        version: fields
            .get("redis_version")
            .map(|value| (*value).to_owned())
            .unwrap_or_default(),
        uptime_seconds: integer("uptime_in_seconds"),
        connected_clients: integer("connected_clients"),
        used_memory: integer("used_memory"),
        used_memory_peak: integer("used_memory_peak"),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        parse_process_info, parse_redis_info, parse_work_entry, queue_latency, validate_redis_url,
    };

    #[test]
    fn redis_info_reads_known_fields() {
        let raw = "# Server\r\nredis_version:7.2.4\r\nuptime_in_seconds:90061\r\n\r\n# Clients\r\nconnected_clients:12\r\n# Memory\r\nused_memory:1048576\r\nused_memory_peak:2097152\r\nused_memory_human:1.00M\r\n";
        let info = parse_redis_info(raw);
        assert_eq!(info.version, "7.2.4");
        assert_eq!(info.uptime_seconds, 90_061);
        assert_eq!(info.connected_clients, 12);
        assert_eq!(info.used_memory, 1_048_576);
        assert_eq!(info.used_memory_peak, 2_097_152);
    }

    #[test]
    fn work_entry_accepts_string_and_object_payloads() {
        let stringly = r#"{"queue":"critical","payload":"{\"class\":\"PaymentJob\",\"args\":[7]}","run_at":1700000000}"#;
        let entry = parse_work_entry("host:1:abc", "tid-1", stringly).expect("decodes");
        assert_eq!(entry.queue, "critical");
        assert_eq!(entry.job.display_class(), "PaymentJob");
        assert_eq!(entry.run_at, 1_700_000_000);

        let embedded = r#"{"queue":"low","payload":{"class":"CleanupJob","args":[]},"run_at":1700000000123}"#;
        let entry = parse_work_entry("host:1:abc", "tid-2", embedded).expect("decodes");
        assert_eq!(entry.job.display_class(), "CleanupJob");
        assert_eq!(entry.run_at, 1_700_000_000);

        assert!(parse_work_entry("host", "tid", "garbage").is_none());
    }

    #[test]
    fn process_info_tolerates_missing_fields() {
        let summary = parse_process_info(
            "web-1:42:abc",
            r#"{"hostname":"web-1","pid":42,"concurrency":10,"queues":["default","low"],"started_at":1700000000.5}"#,
            3,
        );
        assert_eq!(summary.hostname, "web-1");
        assert_eq!(summary.pid, 42);
        assert_eq!(summary.busy, 3);
        assert_eq!(summary.queues, vec!["default", "low"]);
        assert_eq!(summary.started_at, 1_700_000_000);
        assert_eq!(summary.tag, "");

        let empty = parse_process_info("ghost", "{}", 0);
        assert_eq!(empty.identity, "ghost");
        assert_eq!(empty.concurrency, 0);
    }

    #[test]
    fn latency_handles_seconds_and_milliseconds() {
        let now = 1_700_000_100.0;
        let seconds = r#"{"class":"X","enqueued_at":1700000000.0}"#;
        assert!((queue_latency(seconds, now) - 100.0).abs() < 1e-6);

        let millis = r#"{"class":"X","enqueued_at":1700000000000}"#;
        assert!((queue_latency(millis, now) - 100.0).abs() < 1e-6);

        let future = r#"{"class":"X","enqueued_at":1800000000.0}"#;
        assert_eq!(queue_latency(future, now), 0.0);
        assert_eq!(queue_latency("{}", now), 0.0);
    }

    #[test]
    fn redis_url_requires_known_scheme() {
        assert!(validate_redis_url("redis://localhost:6379/0").is_ok());
        assert!(validate_redis_url("rediss://cache.example:6380").is_ok());
        assert!(validate_redis_url("unix:///tmp/redis.sock").is_ok());
        assert!(validate_redis_url("").is_err());
        assert!(validate_redis_url("http://localhost:6379").is_err());
    }
}
