// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use kiqdash_app::format::unix_now;
use kiqdash_app::{JobPage, Overview, QueueSummary, SortedSet, Stats, WorkerSnapshot};
use kiqdash_store::Store;
use kiqdash_testkit::DemoCluster;
use kiqdash_tui::Gateway;
use std::sync::{Mutex, MutexGuard};

/// Live queries against Redis.
pub struct StoreGateway {
    store: Store,
}

impl StoreGateway {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

impl Gateway for StoreGateway {
    fn fetch_stats(&self) -> Result<Stats> {
        self.store.stats()
    }

    fn fetch_overview(&self) -> Result<Overview> {
        self.store.overview()
    }

    fn fetch_workers(&self) -> Result<WorkerSnapshot> {
        self.store.workers()
    }

    fn fetch_queues(&self) -> Result<Vec<QueueSummary>> {
        self.store.queues()
    }

    fn fetch_paged(&self, set: SortedSet, offset: usize, limit: usize) -> Result<JobPage> {
        self.store.sorted_page(set, offset, limit)
    }
}

/// A generated cluster that keeps moving while the dashboard watches it.
pub struct DemoGateway {
    cluster: Mutex<DemoCluster>,
    clock: fn() -> i64,
}

impl DemoGateway {
    pub fn new(seed: u64) -> Self {
        Self::with_clock(seed, unix_now)
    }

    fn with_clock(seed: u64, clock: fn() -> i64) -> Self {
        Self {
            cluster: Mutex::new(DemoCluster::generate(seed, clock())),
            clock,
        }
    }

    fn cluster(&self) -> Result<MutexGuard<'_, DemoCluster>> {
        let mut cluster = self
            .cluster
            .lock()
            .map_err(|_| anyhow!("demo cluster lock poisoned"))?;
        cluster.advance((self.clock)());
        Ok(cluster)
    }
}

impl Gateway for DemoGateway {
    fn fetch_stats(&self) -> Result<Stats> {
        Ok(self.cluster()?.stats())
    }

    fn fetch_overview(&self) -> Result<Overview> {
        Ok(self.cluster()?.overview())
    }

    fn fetch_workers(&self) -> Result<WorkerSnapshot> {
        Ok(self.cluster()?.workers())
    }

    fn fetch_queues(&self) -> Result<Vec<QueueSummary>> {
        Ok(self.cluster()?.queues())
    }

    fn fetch_paged(&self, set: SortedSet, offset: usize, limit: usize) -> Result<JobPage> {
        Ok(self.cluster()?.page(set, offset, limit))
    }
}
