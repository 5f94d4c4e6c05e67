use ndarray::{Array, ArrayD, IxDyn};

pub mod ort;

pub trait InferenceBackend {
    fn load_model(path: &str) -> anyhow::Result<Self>
    where
        Self: Sized;

    /// Run a single forward pass over a batched input tensor.
    fn infer(&mut self, input: &Array<f32, IxDyn>) -> anyhow::Result<InferenceOutput>;
}

pub struct InferenceOutput {
    pub probabilities: ArrayD<f32>, // [1, num_classes] class probabilities
}
