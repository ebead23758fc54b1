//! Metrics and tracing hooks.
//!
//! With the `metrics` feature, [`METRICS`] holds OpenTelemetry instruments
//! exported into a private `prometheus::Registry`; [`LifelineMetrics::render`]
//! returns the text exposition format for an application's `/metrics` handler.
//! With the `tracing` feature, [`tracing_helpers`] builds the spans used
//! around relation loads, mutations, statements and transactions.

#[cfg(feature = "metrics")]
pub use self::otel::{LifelineMetrics, METRICS};

#[cfg(feature = "metrics")]
mod otel {
    use crate::relation::RelationType;
    use once_cell::sync::Lazy;
    use opentelemetry::{
        metrics::{Counter, Histogram, MeterProvider as _},
        KeyValue,
    };
    use opentelemetry_sdk::metrics::SdkMeterProvider;
    use prometheus::{Registry, TextEncoder};
    use std::time::Duration;

    pub static METRICS: Lazy<LifelineMetrics> = Lazy::new(LifelineMetrics::init);

    pub struct LifelineMetrics {
        registry: Registry,
        // Owns the reader; dropping it would stop collection.
        _provider: SdkMeterProvider,
        pub queries_total: Counter<u64>,
        pub query_duration: Histogram<f64>,
        pub query_errors_total: Counter<u64>,
        pub relation_queries_total: Counter<u64>,
        pub pivot_changes_total: Counter<u64>,
    }

    impl LifelineMetrics {
        pub fn init() -> Self {
            let registry = Registry::new();
            let provider = match opentelemetry_prometheus::exporter()
                .with_registry(registry.clone())
                .build()
            {
                Ok(exporter) => SdkMeterProvider::builder().with_reader(exporter).build(),
                Err(err) => {
                    log::warn!("prometheus exporter unavailable, metrics will not be rendered: {err}");
                    SdkMeterProvider::builder().build()
                }
            };
            let meter = provider.meter("lifeline");

            let queries_total = meter
                .u64_counter("lifeline_queries_total")
                .with_description("Total statements executed")
                .build();

            let query_duration = meter
                .f64_histogram("lifeline_query_duration_seconds")
                .with_description("Duration of statements")
                .build();

            let query_errors_total = meter
                .u64_counter("lifeline_query_errors_total")
                .with_description("Statements that returned an error")
                .build();

            let relation_queries_total = meter
                .u64_counter("lifeline_relation_queries_total")
                .with_description("Batched relation SELECTs, by relation kind")
                .build();

            let pivot_changes_total = meter
                .u64_counter("lifeline_pivot_changes_total")
                .with_description("Pivot rows inserted or deleted, by operation")
                .build();

            Self {
                registry,
                _provider: provider,
                queries_total,
                query_duration,
                query_errors_total,
                relation_queries_total,
                pivot_changes_total,
            }
        }

        pub fn record_query(&self, elapsed: Duration) {
            self.queries_total.add(1, &[]);
            self.query_duration.record(elapsed.as_secs_f64(), &[]);
        }

        pub fn record_query_error(&self) {
            self.query_errors_total.add(1, &[]);
        }

        pub fn record_relation_query(&self, kind: RelationType) {
            self.relation_queries_total
                .add(1, &[KeyValue::new("kind", kind.as_str())]);
        }

        pub fn record_pivot_change(&self, op: &'static str, rows: u64) {
            self.pivot_changes_total.add(rows, &[KeyValue::new("op", op)]);
        }

        /// Prometheus text exposition of everything recorded so far.
        pub fn render(&self) -> String {
            match TextEncoder::new().encode_to_string(&self.registry.gather()) {
                Ok(text) => text,
                Err(err) => {
                    log::warn!("failed to encode metrics: {err}");
                    String::new()
                }
            }
        }
    }

}

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::{debug_span, info_span, Span};

    pub fn load_relation_span(field: &str, kind: &str, owners: usize) -> Span {
        info_span!("lifeline.load_relation", field = %field, kind = %kind, owners = owners)
    }

    pub fn mutate_relation_span(operation: &str, field: &str) -> Span {
        info_span!("lifeline.mutate_relation", operation = %operation, field = %field)
    }

    pub fn execute_query_span(sql: &str) -> Span {
        debug_span!("lifeline.execute", sql = %sql)
    }

    pub fn connect_span() -> Span {
        info_span!("lifeline.connect")
    }

    pub fn begin_transaction_span() -> Span {
        debug_span!("lifeline.transaction.begin")
    }

    pub fn commit_transaction_span() -> Span {
        debug_span!("lifeline.transaction.commit")
    }

    pub fn rollback_transaction_span() -> Span {
        debug_span!("lifeline.transaction.rollback")
    }
}
