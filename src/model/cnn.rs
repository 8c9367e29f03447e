//! CNN architecture for referable-disease screening on fundus images
//!
//! A compact convolutional network with two output heads sharing one
//! feature trunk: a classification head producing referability logits and a
//! single-unit head producing a capture-quality (gradability) logit. Global
//! average pooling keeps the trunk input-size agnostic.

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

/// Configuration for the FundusClassifier CNN model
#[derive(Config, Debug)]
pub struct FundusClassifierConfig {
    /// Number of output classes (default: 2, non-referable vs referable)
    #[config(default = "2")]
    pub num_classes: usize,

    /// Number of input channels (3 for RGB)
    #[config(default = "3")]
    pub in_channels: usize,

    /// Base number of convolutional filters
    #[config(default = "32")]
    pub base_filters: usize,

    /// Dropout rate for regularization
    #[config(default = "0.3")]
    pub dropout_rate: f64,
}

/// A CNN block with Conv2d, BatchNorm, ReLU, and optional MaxPool
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    pub conv: Conv2d<B>,
    pub bn: BatchNorm<B, 2>,
    pub relu: Relu,
    pub pool: Option<MaxPool2d>,
}

impl<B: Backend> ConvBlock<B> {
    /// Create a new convolutional block
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        with_pool: bool,
        device: &B::Device,
    ) -> Self {
        let conv = Conv2dConfig::new([in_channels, out_channels], [kernel_size, kernel_size])
            .with_padding(PaddingConfig2d::Same)
            .init(device);

        let bn = BatchNormConfig::new(out_channels).init(device);

        let pool = if with_pool {
            Some(MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init())
        } else {
            None
        };

        Self {
            conv,
            bn,
            relu: Relu::new(),
            pool,
        }
    }

    /// Forward pass through the block
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.bn.forward(x);
        let x = self.relu.forward(x);

        match &self.pool {
            Some(pool) => pool.forward(x),
            None => x,
        }
    }
}

/// Referable-disease screening CNN with an auxiliary capture-quality head
#[derive(Module, Debug)]
pub struct FundusClassifier<B: Backend> {
    // Convolutional trunk (public for weight export)
    pub conv1: ConvBlock<B>,
    pub conv2: ConvBlock<B>,
    pub conv3: ConvBlock<B>,

    // Global pooling
    pub global_pool: AdaptiveAvgPool2d,

    // Shared fully-connected layer
    pub fc1: Linear<B>,
    pub dropout: Dropout,

    // Output heads
    pub class_head: Linear<B>,
    pub quality_head: Linear<B>,

    num_classes: usize,
}

impl<B: Backend> FundusClassifier<B> {
    /// Create a new FundusClassifier from configuration
    pub fn new(config: &FundusClassifierConfig, device: &B::Device) -> Self {
        let base = config.base_filters;

        // Trunk: 3 -> base -> 2*base -> 4*base, halving spatial size each block
        let conv1 = ConvBlock::new(config.in_channels, base, 3, true, device);
        let conv2 = ConvBlock::new(base, base * 2, 3, true, device);
        let conv3 = ConvBlock::new(base * 2, base * 4, 3, true, device);

        let global_pool = AdaptiveAvgPool2dConfig::new([1, 1]).init();

        let fc1 = LinearConfig::new(base * 4, 128).init(device);
        let dropout = DropoutConfig::new(config.dropout_rate).init();

        let class_head = LinearConfig::new(128, config.num_classes).init(device);
        let quality_head = LinearConfig::new(128, 1).init(device);

        Self {
            conv1,
            conv2,
            conv3,
            global_pool,
            fc1,
            dropout,
            class_head,
            quality_head,
            num_classes: config.num_classes,
        }
    }

    /// Shared trunk: conv blocks, global pooling, fully-connected features
    fn features(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.conv1.forward(x);
        let x = self.conv2.forward(x);
        let x = self.conv3.forward(x);

        // Global pooling: [B, C, H, W] -> [B, C, 1, 1]
        let x = self.global_pool.forward(x);

        // Flatten: [B, C, 1, 1] -> [B, C]
        let [batch_size, channels, _, _] = x.dims();
        let x = x.reshape([batch_size, channels]);

        let x = self.fc1.forward(x);
        let x = Relu::new().forward(x);
        self.dropout.forward(x)
    }

    /// Forward pass through the network
    ///
    /// # Arguments
    /// * `x` - Input tensor of shape [batch_size, 3, height, width]
    ///
    /// # Returns
    /// * Logits tensor of shape [batch_size, num_classes]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let features = self.features(x);
        self.class_head.forward(features)
    }

    /// Forward pass producing both heads
    ///
    /// Returns `(class_logits, quality_logits)` with shapes
    /// `[batch_size, num_classes]` and `[batch_size, 1]`.
    pub fn forward_with_quality(&self, x: Tensor<B, 4>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let features = self.features(x);
        let class_logits = self.class_head.forward(features.clone());
        let quality_logits = self.quality_head.forward(features);
        (class_logits, quality_logits)
    }

    /// Forward pass with softmax for inference
    pub fn forward_softmax(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let logits = self.forward(x);
        burn::tensor::activation::softmax(logits, 1)
    }

    /// Get the number of output classes
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }
}
