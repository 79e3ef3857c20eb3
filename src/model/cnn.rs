//! CNN Model Architecture for Brain Scan Classification
//!
//! A compact convolutional classifier built with Burn. Inputs arrive in the
//! same NHWC layout the preprocessing pipeline produces and are permuted to
//! NCHW before the first convolution.

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d,
        Relu,
    },
    tensor::{backend::Backend, Tensor},
};

use super::output_activation;

/// Configuration for the BrainCnn model
#[derive(Config, Debug)]
pub struct BrainCnnConfig {
    /// Width of the output layer (1 for a sigmoid head)
    #[config(default = "2")]
    pub num_outputs: usize,

    /// Number of input channels (3 for RGB)
    #[config(default = "3")]
    pub in_channels: usize,

    /// Filters in the first block, doubled in each following block
    #[config(default = "32")]
    pub base_filters: usize,

    /// Dense layer width before the output
    #[config(default = "128")]
    pub hidden_units: usize,

    /// Dropout rate for regularization
    #[config(default = "0.3")]
    pub dropout_rate: f64,
}

/// Conv2d, BatchNorm, ReLU and a 2x2 MaxPool
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    bn: BatchNorm<B, 2>,
    relu: Relu,
    pool: MaxPool2d,
}

impl<B: Backend> ConvBlock<B> {
    pub fn new(in_channels: usize, out_channels: usize, device: &B::Device) -> Self {
        let conv = Conv2dConfig::new([in_channels, out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Same)
            .init(device);

        Self {
            conv,
            bn: BatchNormConfig::new(out_channels).init(device),
            relu: Relu::new(),
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.bn.forward(x);
        let x = self.relu.forward(x);
        self.pool.forward(x)
    }
}

/// Brain scan CNN
///
/// Architecture:
/// - 3 convolutional blocks (32 -> 64 -> 128 filters by default)
/// - Global average pooling
/// - Dense + ReLU + Dropout
/// - Output layer, sigmoid for a single unit and softmax otherwise
#[derive(Module, Debug)]
pub struct BrainCnn<B: Backend> {
    block1: ConvBlock<B>,
    block2: ConvBlock<B>,
    block3: ConvBlock<B>,
    global_pool: AdaptiveAvgPool2d,
    fc: Linear<B>,
    dropout: Dropout,
    head: Linear<B>,
    num_outputs: usize,
}

impl<B: Backend> BrainCnn<B> {
    pub fn new(config: &BrainCnnConfig, device: &B::Device) -> Self {
        let base = config.base_filters;

        Self {
            block1: ConvBlock::new(config.in_channels, base, device),
            block2: ConvBlock::new(base, base * 2, device),
            block3: ConvBlock::new(base * 2, base * 4, device),
            global_pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            fc: LinearConfig::new(base * 4, config.hidden_units).init(device),
            dropout: DropoutConfig::new(config.dropout_rate).init(),
            head: LinearConfig::new(config.hidden_units, config.num_outputs).init(device),
            num_outputs: config.num_outputs,
        }
    }

    /// Raw logits for an NHWC batch `[batch, height, width, channels]`
    pub fn logits(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        // NHWC -> NCWH -> NCHW
        let x = x.swap_dims(1, 3).swap_dims(2, 3);

        let x = self.block1.forward(x);
        let x = self.block2.forward(x);
        let x = self.block3.forward(x);

        let x = self.global_pool.forward(x);
        let [batch_size, channels, _, _] = x.dims();
        let x = x.reshape([batch_size, channels]);

        let x = self.fc.forward(x);
        let x = Relu::new().forward(x);
        let x = self.dropout.forward(x);
        self.head.forward(x)
    }

    /// Activated scores, `[batch, num_outputs]`
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        output_activation(self.logits(x), self.num_outputs)
    }

    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }
}
