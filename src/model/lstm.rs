//! Recurrent classifier that reads an image row by row.
//!
//! Each of the `height` rows becomes one time step whose features are the
//! row's `width * channels` values, so a 224x224 RGB scan is a sequence of
//! 224 vectors of length 672.

use burn::{
    config::Config,
    module::Module,
    nn::{Dropout, DropoutConfig, Linear, LinearConfig, Lstm, LstmConfig, Relu},
    tensor::{backend::Backend, Tensor},
};

use super::output_activation;

#[derive(Config, Debug)]
pub struct BrainLstmConfig {
    /// Square input size; fixes the per-step feature width
    #[config(default = "224")]
    pub input_size: usize,

    #[config(default = "3")]
    pub in_channels: usize,

    #[config(default = "64")]
    pub first_hidden: usize,

    #[config(default = "32")]
    pub second_hidden: usize,

    #[config(default = "64")]
    pub dense_units: usize,

    #[config(default = "0.2")]
    pub dropout_rate: f64,

    /// The recurrent model was trained with a single sigmoid unit
    #[config(default = "1")]
    pub num_outputs: usize,
}

/// LSTM(64, all steps) -> LSTM(32, last step) -> Dense(64, ReLU) -> Dropout -> Dense
#[derive(Module, Debug)]
pub struct BrainLstm<B: Backend> {
    lstm1: Lstm<B>,
    lstm2: Lstm<B>,
    dense: Linear<B>,
    dropout: Dropout,
    head: Linear<B>,
    num_outputs: usize,
}

impl<B: Backend> BrainLstm<B> {
    pub fn new(config: &BrainLstmConfig, device: &B::Device) -> Self {
        let step_features = config.input_size * config.in_channels;

        Self {
            lstm1: LstmConfig::new(step_features, config.first_hidden, true).init(device),
            lstm2: LstmConfig::new(config.first_hidden, config.second_hidden, true).init(device),
            dense: LinearConfig::new(config.second_hidden, config.dense_units).init(device),
            dropout: DropoutConfig::new(config.dropout_rate).init(),
            head: LinearConfig::new(config.dense_units, config.num_outputs).init(device),
            num_outputs: config.num_outputs,
        }
    }

    /// Raw logits for an NHWC batch
    pub fn logits(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let [batch_size, height, width, channels] = x.dims();
        let x = x.reshape([batch_size, height, width * channels]);

        let (sequence, _) = self.lstm1.forward(x, None);
        let (_, state) = self.lstm2.forward(sequence, None);

        // Final hidden state == output of the last time step
        let x = self.dense.forward(state.hidden);
        let x = Relu::new().forward(x);
        let x = self.dropout.forward(x);
        self.head.forward(x)
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        output_activation(self.logits(x), self.num_outputs)
    }

    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }
}
