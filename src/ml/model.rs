use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig},
        Initializer, Linear, LinearConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::{relu, sigmoid},
};

use crate::domain::settings::NoiseDistribution;
use crate::ml::{
    loss::{beta_vae_loss, VaeLoss},
    sampler::{reparameterize, Sampler},
};

/// Channel depth at each resolution: image → stage 1 → stage 2 → stage 3.
pub const CHANNELS: [usize; 4] = [3, 16, 32, 64];

const KERNEL: usize = 3;
const STRIDE: usize = 2;

/// Smallest image side for which all three stride-2 stages are non-empty.
pub const MIN_IMAGE_SIZE: usize = 15;

/// Spatial side after each encoder stage, input first: 64 → [64, 31, 15, 7].
pub fn encoder_sizes(image_size: usize) -> [usize; 4] {
    let down = |s: usize| (s - KERNEL) / STRIDE + 1;
    let s1 = down(image_size);
    let s2 = down(s1);
    [image_size, s1, s2, down(s2)]
}

/// Output padding of each decoder stage (in decoder order) so that
/// stage i maps encoder size s[3-i] back onto s[2-i] exactly.
pub fn decoder_output_padding(image_size: usize) -> [usize; 3] {
    let sizes = encoder_sizes(image_size);
    let up = |s: usize| (s - 1) * STRIDE + KERNEL;
    [
        sizes[2] - up(sizes[3]),
        sizes[1] - up(sizes[2]),
        sizes[0] - up(sizes[1]),
    ]
}

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct BetaVaeConfig {
    #[config(default = 10)]
    pub latent_size: usize,
    #[config(default = 64)]
    pub image_size:  usize,
    #[config(default = "NoiseDistribution::Normal")]
    pub noise:       NoiseDistribution,
    /// Overrides every layer's weight and bias initialiser when set.
    pub initializer: Option<Initializer>,
}

impl BetaVaeConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> BetaVae<B> {
        BetaVae {
            encoder: self.init_encoder(device),
            decoder: self.init_decoder(device),
            sampler: Sampler::new(self.noise),
        }
    }

    fn init_encoder<B: Backend>(&self, device: &B::Device) -> Encoder<B> {
        let conv = |i: usize| {
            let config = Conv2dConfig::new([CHANNELS[i], CHANNELS[i + 1]], [KERNEL, KERNEL])
                .with_stride([STRIDE, STRIDE])
                .with_padding(PaddingConfig2d::Valid);
            match &self.initializer {
                Some(init) => config.with_initializer(init.clone()).init(device),
                None       => config.init(device),
            }
        };
        let flat = self.flattened_size();
        Encoder {
            conv1:     conv(0),
            conv2:     conv(1),
            conv3:     conv(2),
            fc_mu:     self.linear(flat, self.latent_size, device),
            fc_logvar: self.linear(flat, self.latent_size, device),
        }
    }

    fn init_decoder<B: Backend>(&self, device: &B::Device) -> Decoder<B> {
        let padding_out = decoder_output_padding(self.image_size);
        let deconv = |stage: usize| {
            let (from, to) = (CHANNELS[3 - stage], CHANNELS[2 - stage]);
            let config = ConvTranspose2dConfig::new([from, to], [KERNEL, KERNEL])
                .with_stride([STRIDE, STRIDE])
                .with_padding_out([padding_out[stage], padding_out[stage]]);
            match &self.initializer {
                Some(init) => config.with_initializer(init.clone()).init(device),
                None       => config.init(device),
            }
        };
        Decoder {
            fc:           self.linear(self.latent_size, self.flattened_size(), device),
            deconv1:      deconv(0),
            deconv2:      deconv(1),
            deconv3:      deconv(2),
            feature_side: encoder_sizes(self.image_size)[3],
        }
    }

    fn linear<B: Backend>(&self, d_in: usize, d_out: usize, device: &B::Device) -> Linear<B> {
        let config = LinearConfig::new(d_in, d_out);
        match &self.initializer {
            Some(init) => config.with_initializer(init.clone()).init(device),
            None       => config.init(device),
        }
    }

    /// Length of the flattened encoder feature map (64·7·7 for 64×64 input).
    pub fn flattened_size(&self) -> usize {
        let side = encoder_sizes(self.image_size)[3];
        CHANNELS[3] * side * side
    }
}

// ─── Encoder ──────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Encoder<B: Backend> {
    pub conv1:     Conv2d<B>,
    pub conv2:     Conv2d<B>,
    pub conv3:     Conv2d<B>,
    pub fc_mu:     Linear<B>,
    pub fc_logvar: Linear<B>,
}

impl<B: Backend> Encoder<B> {
    /// images: [batch, 3, S, S] → (mu, logvar): [batch, latent_size] each
    pub fn forward(&self, images: Tensor<B, 4>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let x = relu(self.conv1.forward(images));
        let x = relu(self.conv2.forward(x));
        let x = relu(self.conv3.forward(x)); // [batch, 64, 7, 7]
        let x = x.flatten::<2>(1, 3);

        let mu     = self.fc_mu.forward(x.clone());
        let logvar = self.fc_logvar.forward(x);
        (mu, logvar)
    }
}

// ─── Decoder ──────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Decoder<B: Backend> {
    pub fc:           Linear<B>,
    pub deconv1:      ConvTranspose2d<B>,
    pub deconv2:      ConvTranspose2d<B>,
    pub deconv3:      ConvTranspose2d<B>,
    pub feature_side: usize,
}

impl<B: Backend> Decoder<B> {
    /// z: [batch, latent_size] → images: [batch, 3, S, S] in [0, 1]
    pub fn forward(&self, z: Tensor<B, 2>) -> Tensor<B, 4> {
        let [batch_size, _] = z.dims();
        let x = self.fc.forward(z)
            .reshape([batch_size, CHANNELS[3], self.feature_side, self.feature_side]);

        let x = relu(self.deconv1.forward(x));
        let x = relu(self.deconv2.forward(x));
        sigmoid(self.deconv3.forward(x))
    }
}

// ─── BetaVae ──────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct BetaVae<B: Backend> {
    pub encoder: Encoder<B>,
    pub decoder: Decoder<B>,
    pub sampler: Sampler,
}

pub struct VaeOutput<B: Backend> {
    pub reconstruction: Tensor<B, 4>,
    pub mu:             Tensor<B, 2>,
    pub logvar:         Tensor<B, 2>,
}

impl<B: Backend> BetaVae<B> {
    /// decoder(sample(encoder(images)))
    pub fn forward(&self, images: Tensor<B, 4>) -> VaeOutput<B> {
        let (mu, logvar) = self.encoder.forward(images);
        let z = self.sampler.sample(mu.clone(), logvar.clone());
        VaeOutput { reconstruction: self.decoder.forward(z), mu, logvar }
    }

    /// Same as [`forward`](Self::forward) with caller-supplied noise
    /// of shape [batch, latent_size].
    pub fn forward_with_noise(&self, images: Tensor<B, 4>, eps: Tensor<B, 2>) -> VaeOutput<B> {
        let (mu, logvar) = self.encoder.forward(images);
        let z = reparameterize(mu.clone(), logvar.clone(), eps);
        VaeOutput { reconstruction: self.decoder.forward(z), mu, logvar }
    }

    pub fn forward_loss(&self, images: Tensor<B, 4>, beta: f64) -> (VaeLoss<B>, VaeOutput<B>) {
        let output = self.forward(images.clone());
        let loss = beta_vae_loss(
            output.reconstruction.clone(),
            images,
            output.mu.clone(),
            output.logvar.clone(),
            beta,
        );
        (loss, output)
    }
}
