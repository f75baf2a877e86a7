//! Pipeline metrics
//!
//! Prometheus counters for the ingestion path, plus an in-memory aggregate
//! that the service reports when it shuts down.

use std::collections::BTreeMap;
use std::fmt;

use metrics::{counter, histogram};

/// Count one entry that parsed and rendered successfully
pub fn record_entry_accepted() {
    counter!("logpipe_entries_accepted_total").increment(1);
}

/// Count one rejected request, labelled by rejection reason
pub fn record_entry_rejected(reason: &'static str) {
    counter!("logpipe_entries_rejected_total", "reason" => reason).increment(1);
}

/// Count one write attempt on a sink
pub fn record_sink_write(sink: &str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!(
        "logpipe_sink_writes_total",
        "sink" => sink.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Time from accepting a line to the last sink finishing it
pub fn record_fanout_latency_ms(latency_ms: f64) {
    histogram!("logpipe_fanout_latency_ms").record(latency_ms);
}

/// In-memory totals for one service run
#[derive(Debug, Clone, Default)]
pub struct IngestStats {
    pub accepted: u64,
    pub delivered: u64,
    pub failed_deliveries: u64,
    /// Rejections per reason
    pub rejected: BTreeMap<&'static str, u64>,
    pub fanout_latency_ms: RunningStats,
}

impl IngestStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&mut self) {
        self.accepted += 1;
    }

    pub fn reject(&mut self, reason: &'static str) {
        *self.rejected.entry(reason).or_insert(0) += 1;
    }

    /// Record the outcome of one fan-out
    pub fn deliver(&mut self, success: bool, latency_ms: f64) {
        if success {
            self.delivered += 1;
        } else {
            self.failed_deliveries += 1;
        }
        self.fanout_latency_ms.push(latency_ms);
    }

    pub fn total_rejected(&self) -> u64 {
        self.rejected.values().sum()
    }
}

impl fmt::Display for IngestStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "accepted={} delivered={} failed={} rejected={}",
            self.accepted,
            self.delivered,
            self.failed_deliveries,
            self.total_rejected()
        )?;
        for (reason, count) in &self.rejected {
            write!(f, " {reason}={count}")?;
        }
        write!(f, " latency_ms=[{}]", self.fanout_latency_ms)
    }
}

/// Online mean/variance (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

impl fmt::Display for RunningStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            return write!(f, "N/A");
        }
        write!(
            f,
            "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
            self.min,
            self.max,
            self.mean(),
            self.std_dev(),
            self.count
        )
    }
}
