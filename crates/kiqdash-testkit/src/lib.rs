// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use kiqdash_app::{
    JobPage, JobRecord, Overview, ProcessSummary, QueueSummary, RedisInfo, SortedEntry, SortedSet,
    Stats, WorkerEntry, WorkerSnapshot,
};
use serde_json::{Value, json};
use std::collections::BTreeMap;

pub const REFERENCE_NOW: i64 = 1_767_225_600;

const QUEUES: [&str; 5] = ["critical", "default", "mailers", "batch", "low"];

// Queue assignment of the simulated worker processes.
const PROCESS_QUEUES: [&[&str]; 4] = [
    &["default", "low"],
    &["default", "low"],
    &["critical", "mailers"],
    &["batch"],
];
const PROCESS_CONCURRENCY: i64 = 8;
const HOSTNAMES: [&str; 4] = ["worker-a", "worker-b", "worker-c", "worker-d"];

const JOB_DEFINITIONS: [(&str, &str, usize); 10] = [
    ("EmailDeliveryJob", "mailers", 15),
    ("PaymentProcessingJob", "critical", 5),
    ("ImageProcessingJob", "default", 10),
    ("ReportGenerationJob", "batch", 3),
    ("NotificationJob", "critical", 20),
    ("DataSyncJob", "batch", 5),
    ("CacheWarmupJob", "low", 8),
    ("AnalyticsJob", "low", 25),
    ("CleanupJob", "low", 4),
    ("WebhookDeliveryJob", "default", 10),
];

const ERRORS: [(&str, &str); 6] = [
    ("Net::ReadTimeout", "Net::ReadTimeout with #<TCPSocket:(closed)>"),
    ("ActiveRecord::RecordNotFound", "Couldn't find User with 'id'=4711"),
    ("Redis::CannotConnectError", "Error connecting to Redis on cache:6379"),
    ("Stripe::CardError", "Your card was declined."),
    ("RuntimeError", "simulated failure"),
    ("Faraday::ConnectionFailed", "Failed to open TCP connection to api.example.com:443"),
];

const MAX_RETRIES: i64 = 5;
const MAX_QUEUE_DEPTH: usize = 400;

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
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

    fn range_i64(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as u64;
        min + (self.next_u64() % span) as i64
    }
}

/// Deterministic generator of job payloads shaped like a typical web
/// application's background work.
#[derive(Debug, Clone)]
pub struct JobFaker {
    rng: DeterministicRng,
    weighted: Vec<usize>,
    next_jid: u64,
}

impl JobFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        let weighted = JOB_DEFINITIONS
            .iter()
            .enumerate()
            .flat_map(|(index, (_, _, weight))| std::iter::repeat_n(index, *weight))
            .collect();
        Self {
            rng: DeterministicRng::new(normalized),
            weighted,
            next_jid: normalized.wrapping_mul(1_000),
        }
    }

    pub fn job(&mut self, enqueued_at: i64) -> Value {
        let index = self.weighted[self.rng.int_n(self.weighted.len())];
        let (class, queue, _) = JOB_DEFINITIONS[index];
        self.job_for(class, queue, enqueued_at)
    }

    pub fn job_in_queue(&mut self, queue: &str, enqueued_at: i64) -> Value {
        let candidates = JOB_DEFINITIONS
            .iter()
            .filter(|(_, job_queue, _)| *job_queue == queue)
            .collect::<Vec<_>>();
        match candidates.get(self.rng.int_n(candidates.len())) {
            Some((class, job_queue, _)) => self.job_for(class, job_queue, enqueued_at),
            None => self.job_for("GenericJob", queue, enqueued_at),
        }
    }

    pub fn failed_job(&mut self, failed_at: i64, retry_count: i64) -> Value {
        let queued_for = self.rng.range_i64(1, 600);
        let mut job = self.job(failed_at - queued_for);
        let (error_class, error_message) = ERRORS[self.rng.int_n(ERRORS.len())];
        if let Value::Object(fields) = &mut job {
            fields.insert("error_class".to_owned(), json!(error_class));
            fields.insert("error_message".to_owned(), json!(error_message));
            fields.insert("retry_count".to_owned(), json!(retry_count));
            fields.insert("failed_at".to_owned(), json!(failed_at as f64));
            fields.insert("retry".to_owned(), json!(true));
        }
        job
    }

    fn job_for(&mut self, class: &str, queue: &str, enqueued_at: i64) -> Value {
        self.next_jid = self.next_jid.wrapping_add(1);
        json!({
            "class": class,
            "queue": queue,
            "args": self.args_for(class),
            "jid": format!("{:024x}", self.next_jid),
            "created_at": enqueued_at as f64,
            "enqueued_at": enqueued_at as f64,
        })
    }

    fn args_for(&mut self, class: &str) -> Value {
        let id = self.rng.range_i64(1, 100_000);
        match class {
            "EmailDeliveryJob" => json!([
                format!("user{id}@example.com"),
                self.pick(&["Welcome!", "Password reset", "Weekly digest"]),
                self.pick(&["welcome", "reset_password", "invoice"]),
            ]),
            "PaymentProcessingJob" => json!([
                self.rng.range_i64(100_000, 999_999),
                self.rng.range_i64(1_000, 50_000) as f64 / 100.0,
                self.pick(&["USD", "EUR", "GBP"]),
            ]),
            "ImageProcessingJob" => json!([id, [self.pick(&["resize", "crop", "thumbnail"])]]),
            "ReportGenerationJob" => json!([
                self.pick(&["sales", "inventory", "users", "activity"]),
                format!("{}/2025", self.rng.range_i64(1, 12)),
            ]),
            "NotificationJob" => json!([
                id,
                self.pick(&["push", "sms", "in_app"]),
                {"message": self.pick(&["Your order shipped", "Payment confirmed"])},
            ]),
            "DataSyncJob" => json!([self.pick(&["salesforce", "hubspot", "stripe"]), "local_db"]),
            "CacheWarmupJob" => json!([format!(
                "cache:{}:{}",
                self.pick(&["products", "users", "orders"]),
                id % 1_000
            )]),
            "AnalyticsJob" => json!([
                self.pick(&["page_view", "click", "purchase", "signup"]),
                {"page": format!("/page/{}", id % 100)},
            ]),
            "CleanupJob" => json!([
                self.pick(&["temp_files", "sessions", "logs"]),
                self.rng.range_i64(7, 90),
            ]),
            "WebhookDeliveryJob" => json!([
                format!("https://example.com/webhooks/{}", id % 100),
                self.pick(&["order.created", "user.updated", "payment.completed"]),
            ]),
            _ => json!([id]),
        }
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }
}

#[derive(Debug, Clone)]
struct QueuedJob {
    job: Value,
    enqueued_at: i64,
}

/// An in-memory job system: counters, worker processes, queues and the
/// retry/schedule/dead sets, advanced by simulated time.
#[derive(Debug, Clone)]
pub struct DemoCluster {
    faker: JobFaker,
    now: i64,
    processed: i64,
    failed: i64,
    processes: Vec<ProcessSummary>,
    workers: Vec<WorkerEntry>,
    queues: BTreeMap<String, Vec<QueuedJob>>,
    retry: Vec<SortedEntry>,
    schedule: Vec<SortedEntry>,
    dead: Vec<SortedEntry>,
}

impl DemoCluster {
    /// A cluster with no processes, queues or jobs.
    pub fn empty(now: i64) -> Self {
        Self {
            faker: JobFaker::new(1),
            now,
            processed: 0,
            failed: 0,
            processes: Vec::new(),
            workers: Vec::new(),
            queues: BTreeMap::new(),
            retry: Vec::new(),
            schedule: Vec::new(),
            dead: Vec::new(),
        }
    }

    pub fn generate(seed: u64, now: i64) -> Self {
        let mut cluster = Self {
            faker: JobFaker::new(seed),
            ..Self::empty(now)
        };
        cluster.processed = cluster.faker.rng.range_i64(250_000, 2_500_000);
        cluster.failed = cluster.processed / cluster.faker.rng.range_i64(40, 120);

        for (index, queues) in PROCESS_QUEUES.iter().enumerate() {
            let pid = cluster.faker.rng.range_i64(1_000, 65_000);
            cluster.processes.push(ProcessSummary {
                identity: format!("{}:{pid}:{:012x}", HOSTNAMES[index], seed + index as u64),
                hostname: HOSTNAMES[index].to_owned(),
                pid,
                tag: "demo".to_owned(),
                concurrency: PROCESS_CONCURRENCY,
                busy: 0,
                queues: queues.iter().map(|queue| (*queue).to_owned()).collect(),
                started_at: now - cluster.faker.rng.range_i64(600, 86_400 * 3),
            });
        }

        for queue in QUEUES {
            let depth = cluster.faker.rng.int_n(120);
            let jobs = (0..depth)
                .map(|_| {
                    let enqueued_at = now - cluster.faker.rng.range_i64(0, 900);
                    QueuedJob {
                        job: cluster.faker.job_in_queue(queue, enqueued_at),
                        enqueued_at,
                    }
                })
                .collect();
            cluster.queues.insert(queue.to_owned(), jobs);
        }

        for _ in 0..cluster.faker.rng.range_i64(40, 90) {
            let retry_count = cluster.faker.rng.range_i64(0, MAX_RETRIES - 1);
            let failed_at = now - cluster.faker.rng.range_i64(10, 3_600);
            let due = now + cluster.faker.rng.range_i64(-120, 7_200);
            let job = cluster.faker.failed_job(failed_at, retry_count);
            cluster
                .retry
                .push(SortedEntry::new(JobRecord::from_value(job), due as f64));
        }
        for _ in 0..cluster.faker.rng.range_i64(20, 60) {
            let at = now + cluster.faker.rng.range_i64(30, 86_400);
            let job = cluster.faker.job(now);
            cluster
                .schedule
                .push(SortedEntry::new(JobRecord::from_value(job), at as f64));
        }
        for _ in 0..cluster.faker.rng.range_i64(5, 30) {
            let failed_at = now - cluster.faker.rng.range_i64(3_600, 86_400 * 7);
            let job = cluster.faker.failed_job(failed_at, MAX_RETRIES);
            cluster
                .dead
                .push(SortedEntry::new(JobRecord::from_value(job), failed_at as f64));
        }

        cluster.sort_sets();
        cluster.assign_workers();
        cluster
    }

    pub fn now(&self) -> i64 {
        self.now
    }

    /// Simulates activity up to `now`: workers finish and pick up jobs,
    /// due scheduled jobs get enqueued, due retries run again.
    pub fn advance(&mut self, now: i64) {
        let elapsed = now.saturating_sub(self.now);
        if elapsed <= 0 {
            return;
        }
        self.now = now;

        let seconds = elapsed.min(3_600);
        for _ in 0..seconds {
            self.processed += self.faker.rng.range_i64(5, 40);
            if self.faker.rng.int_n(4) == 0 {
                self.fail_one();
            }
            self.produce_one();
        }

        self.consume_queues(seconds);
        self.promote_due_scheduled();
        self.run_due_retries();
        self.sort_sets();
        self.assign_workers();
    }

    pub fn stats(&self) -> Stats {
        Stats {
            processed: self.processed,
            failed: self.failed,
            busy: self.workers.len() as i64,
            enqueued: self.queues.values().map(|jobs| jobs.len() as i64).sum(),
            retries: self.retry.len() as i64,
            scheduled: self.schedule.len() as i64,
            dead: self.dead.len() as i64,
        }
    }

    pub fn overview(&self) -> Overview {
        Overview {
            stats: self.stats(),
            redis: RedisInfo {
                version: "7.2.4".to_owned(),
                uptime_seconds: self.now - REFERENCE_NOW + 86_400 * 12,
                connected_clients: self.processes.len() as i64 * 3 + 1,
                used_memory: 1_048_576 * 3 + self.stats().enqueued * 512,
                used_memory_peak: 1_048_576 * 9,
            },
            processes: self.processes.len(),
        }
    }

    pub fn workers(&self) -> WorkerSnapshot {
        WorkerSnapshot {
            processes: self.processes.clone(),
            workers: self.workers.clone(),
        }
    }

    pub fn queues(&self) -> Vec<QueueSummary> {
        self.queues
            .iter()
            .map(|(name, jobs)| QueueSummary {
                name: name.clone(),
                size: jobs.len() as i64,
                latency: jobs
                    .first()
                    .map(|oldest| (self.now - oldest.enqueued_at).max(0) as f64)
                    .unwrap_or(0.0),
            })
            .collect()
    }

    pub fn page(&self, set: SortedSet, offset: usize, limit: usize) -> JobPage {
        let entries = match set {
            SortedSet::Retry => &self.retry,
            SortedSet::Schedule => &self.schedule,
            SortedSet::Dead => &self.dead,
        };
        if entries.is_empty() {
            return JobPage::empty();
        }
        JobPage {
            entries: entries.iter().skip(offset).take(limit).cloned().collect(),
            total_size: entries.len() as i64,
        }
    }

    fn fail_one(&mut self) {
        self.failed += 1;
        let job = self.faker.failed_job(self.now, 0);
        let backoff = self.faker.rng.range_i64(15, 600);
        self.retry.push(SortedEntry::new(
            JobRecord::from_value(job),
            (self.now + backoff) as f64,
        ));
    }

    fn produce_one(&mut self) {
        let job = self.faker.job(self.now);
        let queue = job
            .get("queue")
            .and_then(Value::as_str)
            .unwrap_or("default")
            .to_owned();
        let jobs = self.queues.entry(queue).or_default();
        if jobs.len() < MAX_QUEUE_DEPTH {
            jobs.push(QueuedJob {
                job,
                enqueued_at: self.now,
            });
        }
    }

    fn consume_queues(&mut self, seconds: i64) {
        let throughput = usize::try_from(seconds).unwrap_or(usize::MAX);
        for jobs in self.queues.values_mut() {
            let drained = self.faker.rng.int_n(throughput.saturating_mul(2).max(2));
            jobs.drain(..drained.min(jobs.len()));
        }
    }

    fn promote_due_scheduled(&mut self) {
        let now = self.now;
        let (due, pending): (Vec<_>, Vec<_>) = self
            .schedule
            .drain(..)
            .partition(|entry| entry.at() <= now);
        self.schedule = pending;
        for entry in due {
            let jobs = self.queues.entry(entry.job.queue.clone()).or_default();
            jobs.push(QueuedJob {
                job: json!({"class": entry.job.class, "queue": entry.job.queue, "args": entry.job.args}),
                enqueued_at: now,
            });
        }
    }

    fn run_due_retries(&mut self) {
        let now = self.now;
        let (due, pending): (Vec<_>, Vec<_>) =
            self.retry.drain(..).partition(|entry| entry.at() <= now);
        self.retry = pending;
        for mut entry in due {
            if self.faker.rng.int_n(3) != 0 {
                self.processed += 1;
                continue;
            }
            entry.job.retry_count += 1;
            self.failed += 1;
            if entry.job.retry_count >= MAX_RETRIES {
                entry.score = now as f64;
                self.dead.push(entry);
            } else {
                let backoff = entry.job.retry_count.pow(4) + 15;
                entry.score = (now + backoff) as f64;
                self.retry.push(entry);
            }
        }
    }

    fn sort_sets(&mut self) {
        let by_score = |left: &SortedEntry, right: &SortedEntry| left.score.total_cmp(&right.score);
        self.retry.sort_by(by_score);
        self.schedule.sort_by(by_score);
        self.dead.sort_by(|left, right| by_score(right, left));
    }

    fn assign_workers(&mut self) {
        self.workers.clear();
        for process in &mut self.processes {
            let busy = self.faker.rng.int_n(PROCESS_CONCURRENCY as usize + 1);
            process.busy = busy as i64;
            for thread in 0..busy {
                let queue = process.queues[self.faker.rng.int_n(process.queues.len())].clone();
                let run_at = self.now - self.faker.rng.range_i64(0, 120);
                let job = JobRecord::from_value(self.faker.job_in_queue(&queue, run_at));
                self.workers.push(WorkerEntry {
                    process: process.identity.clone(),
                    thread_id: format!("tid-{:x}", (process.pid as usize) * 31 + thread),
                    queue,
                    job,
                    run_at,
                });
            }
        }
        self.workers.sort_by_key(|worker| worker.run_at);
    }
}

#[cfg(test)]
mod tests {
    use super::{DemoCluster, JobFaker, REFERENCE_NOW};
    use kiqdash_app::{JobRecord, SortedSet};

    #[test]
    fn faker_is_deterministic_per_seed() {
        let mut left = JobFaker::new(42);
        let mut right = JobFaker::new(42);
        assert_eq!(left.job(REFERENCE_NOW), right.job(REFERENCE_NOW));

        let mut other = JobFaker::new(43);
        let jobs = (0..10).map(|_| left.job(REFERENCE_NOW)).collect::<Vec<_>>();
        let others = (0..10).map(|_| other.job(REFERENCE_NOW)).collect::<Vec<_>>();
        assert_ne!(jobs, others);
    }

    #[test]
    fn failed_jobs_carry_error_details() {
        let mut faker = JobFaker::new(7);
        let job = JobRecord::from_value(faker.failed_job(REFERENCE_NOW, 2));
        assert!(job.has_error());
        assert_eq!(job.retry_count, 2);
        assert!(!job.display_class().is_empty());
        assert!(!job.queue.is_empty());
    }

    #[test]
    fn generated_cluster_is_consistent() {
        let cluster = DemoCluster::generate(9, REFERENCE_NOW);
        let stats = cluster.stats();
        let snapshot = cluster.workers();

        assert_eq!(stats.busy, snapshot.busy_count());
        assert_eq!(stats.busy, snapshot.workers.len() as i64);
        assert_eq!(
            stats.enqueued,
            cluster.queues().iter().map(|queue| queue.size).sum::<i64>()
        );
        assert_eq!(cluster.page(SortedSet::Retry, 0, 1).total_size, stats.retries);
        assert_eq!(snapshot.processes.len(), 4);
    }

    #[test]
    fn sets_follow_their_ordering() {
        let cluster = DemoCluster::generate(11, REFERENCE_NOW);
        let retry = cluster.page(SortedSet::Retry, 0, 100).entries;
        assert!(retry.windows(2).all(|pair| pair[0].score <= pair[1].score));

        let dead = cluster.page(SortedSet::Dead, 0, 100).entries;
        assert!(dead.windows(2).all(|pair| pair[0].score >= pair[1].score));
    }

    #[test]
    fn paging_past_the_end_is_empty_not_an_error() {
        let cluster = DemoCluster::generate(3, REFERENCE_NOW);
        let page = cluster.page(SortedSet::Schedule, 10_000, 25);
        assert!(page.entries.is_empty());
        assert!(page.total_size > 0);

        let empty = DemoCluster::empty(REFERENCE_NOW).page(SortedSet::Dead, 0, 25);
        assert!(empty.entries.is_empty());
        assert_eq!(empty.total_size, 0);
    }

    #[test]
    fn advancing_time_grows_processed_counter() {
        let mut cluster = DemoCluster::generate(5, REFERENCE_NOW);
        let before = cluster.stats().processed;
        cluster.advance(REFERENCE_NOW + 30);
        assert!(cluster.stats().processed > before);
        assert_eq!(cluster.now(), REFERENCE_NOW + 30);

        let frozen = cluster.stats();
        cluster.advance(REFERENCE_NOW);
        assert_eq!(cluster.stats(), frozen);
    }
}
