pub mod crop;
pub mod tensor;

/// Spatial input shape the classification model was trained with.
pub const DEFAULT_INPUT_SIZE: (u32, u32) = (240, 240);

pub use crop::{crop_brain_region, decode_image};
pub use tensor::to_model_input;
