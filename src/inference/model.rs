//! Residual digit network matching the layout of the classifier record.

use burn::config::Config;
use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig};
use burn::nn::{BatchNorm, BatchNormConfig, Linear, LinearConfig, PaddingConfig2d, Relu};
use burn::prelude::Backend;
use burn::Tensor;

/// Blocks per stage; four stages double the width and halve the resolution.
pub(crate) const STAGE_BLOCKS: [usize; 4] = [2, 2, 2, 2];

/// 1x1 projection used when a block changes width or resolution.
#[derive(Module, Debug)]
pub struct Downsample<B: Backend> {
    conv: Conv2d<B>,
    bn: BatchNorm<B>,
}

impl<B: Backend> Downsample<B> {
    fn new(in_channels: usize, out_channels: usize, stride: usize, device: &B::Device) -> Self {
        Self {
            conv: Conv2dConfig::new([in_channels, out_channels], [1, 1])
                .with_stride([stride, stride])
                .with_padding(PaddingConfig2d::Valid)
                .with_bias(false)
                .init(device),
            bn: BatchNormConfig::new(out_channels).init(device),
        }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.bn.forward(self.conv.forward(x))
    }
}

/// Two 3x3 convolutions with a residual connection.
#[derive(Module, Debug)]
pub struct Block<B: Backend> {
    conv1: Conv2d<B>,
    bn1: BatchNorm<B>,
    conv2: Conv2d<B>,
    bn2: BatchNorm<B>,
    downsample: Option<Downsample<B>>,
    activation: Relu,
}

impl<B: Backend> Block<B> {
    fn new(in_channels: usize, out_channels: usize, stride: usize, device: &B::Device) -> Self {
        let downsample = (in_channels != out_channels || stride != 1)
            .then(|| Downsample::new(in_channels, out_channels, stride, device));
        Self {
            conv1: conv3x3(in_channels, out_channels, stride, device),
            bn1: BatchNormConfig::new(out_channels).init(device),
            conv2: conv3x3(out_channels, out_channels, 1, device),
            bn2: BatchNormConfig::new(out_channels).init(device),
            downsample,
            activation: Relu::new(),
        }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let identity = match &self.downsample {
            Some(downsample) => downsample.forward(x.clone()),
            None => x.clone(),
        };

        let out = self.activation.forward(self.bn1.forward(self.conv1.forward(x)));
        let out = self.bn2.forward(self.conv2.forward(out));
        self.activation.forward(out + identity)
    }
}

fn conv3x3<B: Backend>(
    in_channels: usize,
    out_channels: usize,
    stride: usize,
    device: &B::Device,
) -> Conv2d<B> {
    Conv2dConfig::new([in_channels, out_channels], [3, 3])
        .with_stride([stride, stride])
        .with_padding(PaddingConfig2d::Explicit(1, 1))
        .with_bias(false)
        .init(device)
}

/// Single-channel residual classifier.
#[derive(Module, Debug)]
pub struct DigitNet<B: Backend> {
    stem: Conv2d<B>,
    stem_bn: BatchNorm<B>,
    blocks: Vec<Block<B>>,
    pool: AdaptiveAvgPool2d,
    head: Linear<B>,
    activation: Relu,
}

impl<B: Backend> DigitNet<B> {
    /// `[batch, 1, height, width]` images to `[batch, num_classes]` logits.
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.stem.forward(images);
        let mut x = self.activation.forward(self.stem_bn.forward(x));
        for block in &self.blocks {
            x = block.forward(x);
        }
        let x = self.pool.forward(x);
        self.head.forward(x.flatten::<2>(1, 3))
    }
}

#[derive(Config, Debug)]
pub struct DigitNetConfig {
    pub num_classes: usize,
    /// Width of the first stage; later stages double it.
    #[config(default = "64")]
    pub base_width: usize,
}

impl DigitNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> DigitNet<B> {
        let width = self.base_width.max(1);
        let mut blocks = Vec::new();
        let mut in_channels = width;
        for (stage, &count) in STAGE_BLOCKS.iter().enumerate() {
            let out_channels = width << stage;
            for index in 0..count {
                let stride = if stage > 0 && index == 0 { 2 } else { 1 };
                blocks.push(Block::new(in_channels, out_channels, stride, device));
                in_channels = out_channels;
            }
        }

        DigitNet {
            stem: conv3x3(1, width, 1, device),
            stem_bn: BatchNormConfig::new(width).init(device),
            blocks,
            pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            head: LinearConfig::new(in_channels, self.num_classes).init(device),
            activation: Relu::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::TensorData;

    type TestBackend = NdArray<f32>;

    #[test]
    fn forward_produces_one_logit_per_class() {
        let device = Default::default();
        let model = DigitNetConfig::new(10)
            .with_base_width(4)
            .init::<TestBackend>(&device);
        let input = Tensor::<TestBackend, 4>::from_data(
            TensorData::new(vec![0.0_f32; 2 * 28 * 28], [2, 1, 28, 28]),
            &device,
        );

        let output = model.forward(input);
        assert_eq!(output.dims(), [2, 10]);
    }

    #[test]
    fn stages_double_width() {
        let device = Default::default();
        let model = DigitNetConfig::new(3)
            .with_base_width(2)
            .init::<TestBackend>(&device);
        assert_eq!(model.blocks.len(), STAGE_BLOCKS.iter().sum::<usize>());
        assert!(model.blocks[0].downsample.is_none());
        assert!(model.blocks[2].downsample.is_some());
    }
}
