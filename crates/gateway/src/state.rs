use crate::metrics::Metrics;
use inference::Classifier;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct AppState {
    /// The ort session takes `&mut self` per run, so the classifier sits
    /// behind a mutex and requests serialize through it.
    pub classifier: Arc<Mutex<Classifier>>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(classifier: Classifier) -> Self {
        Self {
            classifier: Arc::new(Mutex::new(classifier)),
            metrics: Arc::new(Metrics::init("gateway")),
        }
    }
}
