use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram};

pub struct Metrics {
    pub request_duration: Histogram<f64>,
    pub predictions: Counter<u64>,
    pub errors: Counter<u64>,
}

impl Metrics {
    pub fn init(meter_name: &'static str) -> Self {
        let meter = global::meter(meter_name);
        let latency_buckets = [
            0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.15, 0.2, 0.3, 0.5, 0.75, 1.0, 2.0, 5.0,
        ];

        let request_duration: Histogram<f64> = meter
            .f64_histogram("prediction_duration_seconds")
            .with_description("Time to serve a prediction (decode + crop + infer)")
            .with_unit("s")
            .with_boundaries(latency_buckets.to_vec())
            .build();
        let predictions: Counter<u64> = meter
            .u64_counter("predictions_total")
            .with_description("Total predictions served")
            .build();
        let errors: Counter<u64> = meter
            .u64_counter("prediction_errors_total")
            .with_description("Total prediction requests that failed")
            .build();

        Self {
            request_duration,
            predictions,
            errors,
        }
    }
}
