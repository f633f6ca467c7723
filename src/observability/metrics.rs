use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub checkpoint_mutations_total: IntCounterVec,
    pub tracking_lookups_total: IntCounterVec,
    pub packages_total: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let checkpoint_mutations_total = IntCounterVec::new(
            Opts::new(
                "checkpoint_mutations_total",
                "Checkpoint writes by operation and outcome",
            ),
            &["operation", "outcome"],
        )
        .expect("valid checkpoint_mutations_total metric");

        let tracking_lookups_total = IntCounterVec::new(
            Opts::new("tracking_lookups_total", "Public tracking lookups by outcome"),
            &["outcome"],
        )
        .expect("valid tracking_lookups_total metric");

        let packages_total = IntGauge::new("packages_total", "Packages currently stored")
            .expect("valid packages_total metric");

        registry
            .register(Box::new(checkpoint_mutations_total.clone()))
            .expect("register checkpoint_mutations_total");
        registry
            .register(Box::new(tracking_lookups_total.clone()))
            .expect("register tracking_lookups_total");
        registry
            .register(Box::new(packages_total.clone()))
            .expect("register packages_total");

        Self {
            registry,
            checkpoint_mutations_total,
            tracking_lookups_total,
            packages_total,
        }
    }

    pub fn record_mutation<T, E>(&self, operation: &str, result: &Result<T, E>) {
        let outcome = if result.is_ok() { "success" } else { "error" };
        self.checkpoint_mutations_total
            .with_label_values(&[operation, outcome])
            .inc();
    }

    pub fn record_lookup<T, E>(&self, result: &Result<T, E>) {
        let outcome = if result.is_ok() { "found" } else { "error" };
        self.tracking_lookups_total
            .with_label_values(&[outcome])
            .inc();
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
