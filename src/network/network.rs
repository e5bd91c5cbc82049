use std::path::Path;

use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::layers::dense::{Layer, LayerGradients};
use crate::math::matrix::Matrix;
use crate::network::spec::NetworkSpec;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
}

impl Network {
    pub fn from_spec<R: Rng + ?Sized>(spec: &NetworkSpec, rng: &mut R) -> Network {
        let layers = spec.layers.iter()
            .map(|l| Layer::new(l.size, l.input_size, l.activation, rng))
            .collect();
        Network { layers }
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map(|l| l.input_size()).unwrap_or(0)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map(|l| l.size).unwrap_or(0)
    }

    /// Forward pass; stores activations in each layer for backprop.
    pub fn forward(&mut self, input: &[f64]) -> Vec<f64> {
        let mut current = input.to_vec();
        for layer in &mut self.layers {
            current = layer.feed_from(&current);
        }
        current
    }

    /// Inference-only forward pass.
    pub fn predict(&self, input: &[f64]) -> Vec<f64> {
        self.layers.iter().fold(input.to_vec(), |current, layer| layer.predict(&current))
    }

    pub fn predict_batch(&self, inputs: &[Vec<f64>]) -> Vec<Vec<f64>> {
        inputs.iter().map(|x| self.predict(x)).collect()
    }

    /// Backward pass for the sample last passed to `forward`.
    ///
    /// `output_error` is ∂L/∂ŷ. Returns one gradient per layer, input → output.
    pub fn backward(&self, input: &[f64], output_error: Vec<f64>) -> Vec<LayerGradients> {
        let mut grads = Vec::with_capacity(self.layers.len());
        let mut delta = Matrix::row_vector(output_error);

        for i in (0..self.layers.len()).rev() {
            let input_for_layer = if i == 0 {
                Matrix::row_vector(input.to_vec())
            } else {
                self.layers[i - 1].neurons.clone()
            };
            let (layer_grads, input_delta) = self.layers[i].compute_gradients(&delta, &input_for_layer);
            grads.push(layer_grads);
            delta = input_delta;
        }

        grads.reverse();
        grads
    }

    /// Serializes the network weights to a pretty-printed JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a network from a JSON file previously written by `save_json`.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Network> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
