use async_trait::async_trait;
use ndarray::Array4;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tch::{CModule, Device, Kind, Tensor};

use super::{Classifier, ClassifierError, check_input_shape, run_blocking};

/// TorchScript module exported from the trained classifier.
#[derive(Clone)]
pub struct TorchClassifier {
    model: Arc<Mutex<CModule>>,
    device: Device,
    output_logits: bool,
}

impl TorchClassifier {
    pub fn load(model_path: &Path, output_logits: bool) -> Result<Self, ClassifierError> {
        let device = Device::cuda_if_available();
        let model = CModule::load_on_device(model_path, device)
            .map_err(|e| ClassifierError::Unavailable(e.to_string()))?;
        log::info!("TorchScript model loaded on {:?}", device);
        Ok(Self {
            model: Arc::new(Mutex::new(model)),
            device,
            output_logits,
        })
    }

    fn run(&self, input: Array4<f32>) -> Result<Vec<f32>, ClassifierError> {
        let shape: Vec<i64> = input.shape().iter().map(|&d| d as i64).collect();
        let data: Vec<f32> = input.iter().copied().collect();
        let tensor = Tensor::from_slice(&data)
            .view(shape.as_slice())
            .to_device(self.device);

        let output = {
            let model = self
                .model
                .lock()
                .map_err(|_| ClassifierError::Model("model lock poisoned".to_string()))?;
            model
                .forward_ts(&[tensor])
                .map_err(|e| ClassifierError::Model(e.to_string()))?
        };

        let output = if self.output_logits {
            output.softmax(-1, Kind::Float)
        } else {
            output
        };
        let output_flat = output.to_kind(Kind::Float).to_device(Device::Cpu).view([-1]);
        let num_elements = output_flat.size()[0] as usize;
        let mut output_vec = vec![0.0f32; num_elements];
        output_flat.copy_data(&mut output_vec, num_elements);
        Ok(output_vec)
    }
}

#[async_trait]
impl Classifier for TorchClassifier {
    async fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>, ClassifierError> {
        check_input_shape(input)?;
        let classifier = self.clone();
        let input = input.to_owned();
        run_blocking(move || classifier.run(input)).await
    }
}
