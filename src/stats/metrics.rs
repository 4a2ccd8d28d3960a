//! Export GC metrics in Prometheus / JSON form for embedders that scrape
//! process metrics.

use crate::error::{GcError, Result};
use indexmap::IndexMap;
use std::sync::Mutex;

pub struct GcMetrics {
    metrics: Mutex<IndexMap<String, MetricValue>>,
}

impl GcMetrics {
    pub fn new() -> Self {
        Self {
            metrics: Mutex::new(IndexMap::new()),
        }
    }

    pub fn set(&self, name: impl Into<String>, value: MetricValue) -> Result<()> {
        self.metrics
            .lock()
            .map_err(|e| GcError::Internal(format!("metrics mutex poisoned: {e}")))?
            .insert(name.into(), value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Option<MetricValue>> {
        Ok(self
            .metrics
            .lock()
            .map_err(|e| GcError::Internal(format!("metrics mutex poisoned: {e}")))?
            .get(name)
            .copied())
    }

    pub fn to_prometheus(&self) -> Result<String> {
        let metrics = self
            .metrics
            .lock()
            .map_err(|e| GcError::Internal(format!("metrics mutex poisoned: {e}")))?;
        let mut output = String::new();
        for (name, value) in metrics.iter() {
            output.push_str(&format!("{} {}\n", name, value.as_f64()));
        }
        Ok(output)
    }

    pub fn to_json(&self) -> Result<String> {
        let metrics = self
            .metrics
            .lock()
            .map_err(|e| GcError::Internal(format!("metrics mutex poisoned: {e}")))?;
        let pairs: Vec<String> = metrics
            .iter()
            .map(|(name, value)| format!("\"{}\": {}", name, value.as_f64()))
            .collect();
        Ok(format!("{{{}}}", pairs.join(",")))
    }
}

impl Default for GcMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
pub enum MetricValue {
    Counter(u64),
    Gauge(f64),
}

impl MetricValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            MetricValue::Counter(v) => *v as f64,
            MetricValue::Gauge(v) => *v,
        }
    }
}
