use crate::backend::{InferenceBackend, InferenceOutput};
use common::span;
use image::RgbImage;
use ndarray::ArrayD;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    NonTumorous,
    Tumorous,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::NonTumorous => "non-tumorous",
            Label::Tumorous => "tumorous",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Prediction {
    pub label: Label,
    pub confidence: f32,
}

impl Prediction {
    /// Interpret the raw model output.
    ///
    /// Handles the two-class softmax head (`[1, 2]`, class 0 = no tumor,
    /// class 1 = tumor) as well as a single sigmoid unit (`[1, 1]`).
    /// Confidence is the probability assigned to the winning class.
    pub fn from_probabilities(probabilities: &ArrayD<f32>) -> anyhow::Result<Self> {
        let values: Vec<f32> = probabilities.iter().copied().collect();

        match values.as_slice() {
            [p] => {
                if *p >= 0.5 {
                    Ok(Self {
                        label: Label::Tumorous,
                        confidence: *p,
                    })
                } else {
                    Ok(Self {
                        label: Label::NonTumorous,
                        confidence: 1.0 - *p,
                    })
                }
            }
            [no, yes] => {
                // Ties resolve to the lower class index, like an argmax.
                if *no >= *yes {
                    Ok(Self {
                        label: Label::NonTumorous,
                        confidence: *no,
                    })
                } else {
                    Ok(Self {
                        label: Label::Tumorous,
                        confidence: *yes,
                    })
                }
            }
            _ => anyhow::bail!(
                "unexpected model output shape {:?}, expected a binary classification head",
                probabilities.shape()
            ),
        }
    }
}

/// Ties the preprocessing pipeline to an inference backend.
pub struct Classifier {
    backend: Box<dyn InferenceBackend + Send>,
    input_size: (u32, u32),
}

impl Classifier {
    pub fn new(backend: Box<dyn InferenceBackend + Send>, input_size: (u32, u32)) -> Self {
        Self {
            backend,
            input_size,
        }
    }

    /// Crop the brain region, resize to the model input shape and run a
    /// single forward pass.
    pub fn classify(&mut self, image: &RgbImage) -> anyhow::Result<Prediction> {
        let _s = span!("classify");

        let cropped = preprocess::crop_brain_region(image);

        tracing::trace!(
            orig_width = image.width(),
            orig_height = image.height(),
            crop_width = cropped.width(),
            crop_height = cropped.height(),
            "Cropped brain region"
        );

        let input = preprocess::to_model_input(&cropped, self.input_size)?;
        let InferenceOutput { probabilities } = self.backend.infer(&input)?;

        Prediction::from_probabilities(&probabilities)
    }
}
