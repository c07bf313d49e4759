//! Logical clock.
//!
//! Estimates the offset between the local clock and the server's reference
//! clock from round-trip probes. The offset is the mean of the last
//! [`DRIFT_WINDOW`] drift samples, so a single noisy round trip moves it by at
//! most 1/N of its error.

use std::{collections::VecDeque, sync::Arc};

use async_trait::async_trait;
use serde::Deserialize;

use tandem_shared::time::Clock;

use crate::error::ClockSyncError;

/// Number of drift samples averaged into the offset
pub const DRIFT_WINDOW: usize = 5;

/// Local timings and the reference time of one probe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeSample {
    /// Local time before the request was sent
    pub start: f64,
    /// Local time after the response arrived
    pub end: f64,
    /// Reference timestamp reported by the server
    pub reference: f64,
}

/// Result of recording one probe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncOutcome {
    pub latency: f64,
    pub drift: f64,
    pub offset: f64,
    /// Set only for the first successful probe
    pub first_sync: bool,
}

pub struct LogicalClock {
    local: Arc<dyn Clock>,
    drifts: VecDeque<f64>,
    offset: f64,
    synced: bool,
}

impl LogicalClock {
    pub fn new(local: Arc<dyn Clock>) -> Self {
        Self {
            local,
            drifts: VecDeque::with_capacity(DRIFT_WINDOW),
            offset: 0.0,
            synced: false,
        }
    }

    /// Drift-corrected time in seconds
    pub fn now(&self) -> f64 {
        self.local_now() + self.offset
    }

    /// Uncorrected local time in seconds
    pub fn local_now(&self) -> f64 {
        self.local.now_secs()
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Fold a completed probe into the offset
    pub fn record_probe(&mut self, sample: ProbeSample) -> SyncOutcome {
        let latency = (sample.end - sample.start) / 2.0;
        let drift = sample.reference + latency - sample.end;
        let first_sync = !self.synced;
        let offset = self.record_drift(drift);

        tracing::debug!(
            "Clock sync: latency={:.4}s drift={:.4}s offset={:.4}s",
            latency,
            drift,
            offset
        );

        SyncOutcome {
            latency,
            drift,
            offset,
            first_sync,
        }
    }

    /// Push one drift sample and return the new offset
    pub fn record_drift(&mut self, drift: f64) -> f64 {
        if self.drifts.len() == DRIFT_WINDOW {
            self.drifts.pop_front();
        }
        self.drifts.push_back(drift);
        self.offset = self.drifts.iter().sum::<f64>() / self.drifts.len() as f64;
        self.synced = true;
        self.offset
    }
}

/// Source of the reference time the room agrees on
#[async_trait]
pub trait ReferenceTimeSource: Send + Sync {
    /// Reference time in seconds since the Unix epoch
    async fn fetch(&self) -> Result<f64, ClockSyncError>;
}

#[derive(Debug, Deserialize)]
struct ClockResponse {
    timestamp: f64,
}

/// `GET /api/v1/clock` on the relay server
pub struct HttpReferenceTimeSource {
    client: reqwest::Client,
    url: String,
}

impl HttpReferenceTimeSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ReferenceTimeSource for HttpReferenceTimeSource {
    async fn fetch(&self) -> Result<f64, ClockSyncError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| ClockSyncError::Request(e.to_string()))?;
        let body: ClockResponse = response
            .json()
            .await
            .map_err(|e| ClockSyncError::InvalidResponse(e.to_string()))?;
        if !body.timestamp.is_finite() {
            return Err(ClockSyncError::InvalidResponse(format!(
                "timestamp is not finite: {}",
                body.timestamp
            )));
        }
        Ok(body.timestamp)
    }
}

/// Time one round trip to the reference source
pub async fn probe(
    local: &dyn Clock,
    source: &dyn ReferenceTimeSource,
) -> Result<ProbeSample, ClockSyncError> {
    let start = local.now_secs();
    let reference = source.fetch().await?;
    let end = local.now_secs();
    Ok(ProbeSample {
        start,
        end,
        reference,
    })
}
