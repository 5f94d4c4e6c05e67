pub mod backend;
pub mod classifier;

// Re-export commonly used types for convenience
pub use backend::ort::{ExecutionProvider, OrtBackend};
pub use backend::{InferenceBackend, InferenceOutput};
pub use classifier::{Classifier, Label, Prediction};
