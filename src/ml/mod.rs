// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
//   model.rs      — shared-LSTM pair classifier
//   trainer.rs    — epoch loop: forward, loss, backward, Adam
//                   step, validation pass
//   inferencer.rs — loads a model directory and predicts

/// Shared-LSTM text pair classifier
pub mod model;

/// Training loop with validation
pub mod trainer;

/// Predictions from a trained model
pub mod inferencer;

use burn::prelude::Backend;

/// Backend used for inference and validation
#[cfg(feature = "wgpu")]
pub type InferBackend = burn::backend::Wgpu;
#[cfg(not(feature = "wgpu"))]
pub type InferBackend = burn::backend::NdArray;

/// Backend used for training
pub type TrainBackend = burn::backend::Autodiff<InferBackend>;

pub fn default_device() -> <InferBackend as Backend>::Device {
    let device: <InferBackend as Backend>::Device = Default::default();
    tracing::info!("Using device: {:?}", device);
    device
}
