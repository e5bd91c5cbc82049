use serde::{Serialize, Deserialize};
use crate::activation::activation::ActivationFunction;

/// Hidden layer widths of the consequence regressor.
pub const HIDDEN_SIZES: [usize; 3] = [10, 10, 5];

/// Describes one layer in a network specification.
///
/// Fields:
/// - `size`      : number of neurons in this layer
/// - `input_size`: number of neurons feeding into this layer (i.e. the output
///                  size of the previous layer, or the raw input dimension for
///                  the first layer)
/// - `activation`: activation function applied after the linear transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub size: usize,
    pub input_size: usize,
    pub activation: ActivationFunction,
}

/// A serializable description of a network architecture.
///
/// Stored next to the trained weights so a model file can be checked
/// against the data it is applied to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub name: String,
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
}

impl NetworkSpec {
    /// The "Densenet" regressor: 10-10-5 ReLU hidden layers and a linear
    /// output layer of `output_size` units.
    pub fn dense_regressor(input_size: usize, output_size: usize) -> NetworkSpec {
        let mut layers = Vec::with_capacity(HIDDEN_SIZES.len() + 1);
        let mut fan_in = input_size;
        for &size in HIDDEN_SIZES.iter() {
            layers.push(LayerSpec { size, input_size: fan_in, activation: ActivationFunction::ReLU });
            fan_in = size;
        }
        layers.push(LayerSpec { size: output_size, input_size: fan_in, activation: ActivationFunction::Identity });
        NetworkSpec { name: "Densenet".to_string(), layers }
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map(|l| l.input_size).unwrap_or(0)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map(|l| l.size).unwrap_or(0)
    }
}
