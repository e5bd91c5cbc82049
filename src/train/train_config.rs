/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `epochs`    : total number of full passes over the training data
/// - `batch_size`: samples per mini-batch; use `1` for online updates
/// - `shuffle`   : reshuffle the sample order at the start of every epoch
/// - `seed`      : seed for the shuffle RNG
#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub shuffle: bool,
    pub seed: u64,
}

impl TrainConfig {
    pub fn new(epochs: usize, batch_size: usize) -> Self {
        TrainConfig {
            epochs,
            batch_size,
            shuffle: true,
            seed: 0,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
