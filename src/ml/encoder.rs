// ============================================================
// Layer 5 — Encoder and Encoder Wrapper
// ============================================================
// Two pieces live here:
//
//   TransformerEncoder - a BERT-shaped stack that returns every
//                        hidden state: the embedding output plus
//                        one tensor per block, each
//                        [batch, subwords, hidden]
//
//   TaggingEncoder     - the wrapper the tagger uses. It truncates
//                        overlong input, moves ids and mask onto
//                        the model device, averages the last K
//                        hidden states and applies dropout
//
// Encoder identifiers name one of the BERT miniature sizes.
// Parameters are freshly initialised; weights are not loaded.
//
// Reference: Burn Book §3 (Building Blocks)
//            Devlin et al. (2019) BERT
//            Turc et al. (2019) Well-Read Students Learn Better

use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
};

use crate::data::batcher::TokenizedBatch;
use crate::domain::word_spans::WordIds;
use crate::error::ConfigError;

// ─── Architecture presets ─────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderArchitecture {
    pub num_layers:              usize,
    pub hidden_size:             usize,
    pub num_heads:               usize,
    pub max_position_embeddings: usize,
}

impl EncoderArchitecture {
    pub const NAMES: [&'static str; 5] =
        ["bert-tiny", "bert-mini", "bert-small", "bert-medium", "bert-base"];

    pub fn preset(name: &str) -> Result<Self, ConfigError> {
        let (num_layers, hidden_size, num_heads) = match name {
            "bert-tiny"   => (2, 128, 2),
            "bert-mini"   => (4, 256, 4),
            "bert-small"  => (4, 512, 8),
            "bert-medium" => (8, 512, 8),
            "bert-base"   => (12, 768, 12),
            other => return Err(ConfigError::UnknownEncoder(other.to_string())),
        };
        Ok(Self { num_layers, hidden_size, num_heads, max_position_embeddings: 512 })
    }

    pub fn to_config(&self, vocab_size: usize, dropout: f64) -> TransformerEncoderConfig {
        TransformerEncoderConfig::new(
            vocab_size,
            self.max_position_embeddings,
            self.hidden_size,
            self.num_heads,
            self.num_layers,
            self.hidden_size * 4,
            dropout,
        )
    }
}

// ─── TransformerEncoder ───────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct TransformerEncoderConfig {
    pub vocab_size:              usize,
    pub max_position_embeddings: usize,
    pub d_model:                 usize,
    pub num_heads:               usize,
    pub num_layers:              usize,
    pub d_ff:                    usize,
    pub dropout:                 f64,
}

impl TransformerEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TransformerEncoder<B> {
        let token_embedding    = EmbeddingConfig::new(self.vocab_size, self.d_model).init(device);
        let position_embedding = EmbeddingConfig::new(self.max_position_embeddings, self.d_model).init(device);
        let embedding_norm     = LayerNormConfig::new(self.d_model).init(device);
        let layers: Vec<EncoderBlock<B>> = (0..self.num_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let dropout = DropoutConfig::new(self.dropout).init();
        TransformerEncoder {
            token_embedding, position_embedding, embedding_norm, layers, dropout,
            d_model: self.d_model,
            max_position_embeddings: self.max_position_embeddings,
        }
    }

    /// Attention dropout and residual dropout share the encoder rate.
    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.d_model, self.d_ff).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_ff, self.d_model).init(device);
        let norm1   = LayerNormConfig::new(self.d_model).init(device);
        let norm2   = LayerNormConfig::new(self.d_model).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }
}

/// One post-norm BERT layer: self-attention and a GELU feed-forward,
/// each followed by residual add and LayerNorm.
#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    /// `mask_pad` is true at padding positions, which attention ignores.
    pub fn forward(&self, x: Tensor<B, 3>, mask_pad: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let input = MhaInput::self_attn(x.clone()).mask_pad(mask_pad);
        let attn_output = self.self_attn.forward(input).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(
            burn::tensor::activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

#[derive(Module, Debug)]
pub struct TransformerEncoder<B: Backend> {
    pub token_embedding:         Embedding<B>,
    pub position_embedding:      Embedding<B>,
    pub embedding_norm:          LayerNorm<B>,
    pub layers:                  Vec<EncoderBlock<B>>,
    pub dropout:                 Dropout,
    pub d_model:                 usize,
    pub max_position_embeddings: usize,
}

impl<B: Backend> TransformerEncoder<B> {
    pub fn device(&self) -> B::Device {
        self.token_embedding.weight.val().device()
    }

    /// input_ids, attention_mask: [batch, seq_len]
    /// → num_layers + 1 tensors of [batch, seq_len, d_model]
    pub fn hidden_states(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
    ) -> Vec<Tensor<B, 3>> {
        let [batch_size, seq_len] = input_ids.dims();

        let tok_emb = self.token_embedding.forward(input_ids);

        // Self-attention is permutation-invariant, so position must be injected explicitly.
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &tok_emb.device())
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb = self.position_embedding.forward(positions);

        let mask_pad = attention_mask.equal_elem(0);

        let mut x = self.dropout.forward(self.embedding_norm.forward(tok_emb + pos_emb));
        let mut states = Vec::with_capacity(self.layers.len() + 1);
        states.push(x.clone());
        for layer in &self.layers {
            x = layer.forward(x, mask_pad.clone());
            states.push(x.clone());
        }
        states
    }
}

// ─── Truncation and layer pooling ─────────────────────────────────────────────

/// Keep the first `max_length` subword positions of ids and mask.
/// Returns `true` in the last slot when anything was dropped.
pub fn truncate_inputs<B: Backend>(
    input_ids:      Tensor<B, 2, Int>,
    attention_mask: Tensor<B, 2, Int>,
    max_length:     usize,
) -> (Tensor<B, 2, Int>, Tensor<B, 2, Int>, bool) {
    let [batch_size, seq_len] = input_ids.dims();
    if seq_len <= max_length {
        return (input_ids, attention_mask, false);
    }
    (
        input_ids.slice([0..batch_size, 0..max_length]),
        attention_mask.slice([0..batch_size, 0..max_length]),
        true,
    )
}

/// Average the last `pooling_layers` hidden states into one tensor.
/// Asking for more layers than exist uses all of them.
pub fn pool_layers<B: Backend>(
    hidden_states:  Vec<Tensor<B, 3>>,
    pooling_layers: usize,
) -> Tensor<B, 3> {
    let start = hidden_states.len().saturating_sub(pooling_layers.max(1));
    let selected: Vec<Tensor<B, 3>> = hidden_states.into_iter().skip(start).collect();
    let [batch_size, seq_len, hidden] = selected[0].dims();
    // [K, batch, seq, hidden] → mean over K → [1, batch, seq, hidden]
    Tensor::stack::<4>(selected, 0)
        .mean_dim(0)
        .reshape([batch_size, seq_len, hidden])
}

// ─── TaggingEncoder ───────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct TaggingEncoderConfig {
    /// One of EncoderArchitecture::NAMES.
    pub encoder: String,
    #[config(default = 0.5)]
    pub dropout: f64,
    #[config(default = 4)]
    pub pooling_layers: usize,
}

impl TaggingEncoderConfig {
    pub fn validate(&self) -> Result<EncoderArchitecture, ConfigError> {
        if self.pooling_layers == 0 {
            return Err(ConfigError::invalid("pooling_layers", "must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ConfigError::invalid("dropout", format!("{} is not in [0, 1)", self.dropout)));
        }
        EncoderArchitecture::preset(&self.encoder)
    }

    pub fn init<B: Backend>(
        &self,
        vocab_size: usize,
        device:     &B::Device,
    ) -> Result<TaggingEncoder<B>, ConfigError> {
        let arch = self.validate()?;
        tracing::info!(
            "Encoder '{}': {} layers, hidden={}, pooling last {} layer(s)",
            self.encoder, arch.num_layers, arch.hidden_size, self.pooling_layers
        );
        Ok(self.init_with(&arch.to_config(vocab_size, self.dropout), device))
    }

    /// Build around an explicit architecture instead of a named preset.
    pub fn init_with<B: Backend>(
        &self,
        encoder: &TransformerEncoderConfig,
        device:  &B::Device,
    ) -> TaggingEncoder<B> {
        TaggingEncoder {
            encoder:        encoder.init(device),
            dropout:        DropoutConfig::new(self.dropout).init(),
            pooling_layers: self.pooling_layers,
        }
    }
}

#[derive(Module, Debug)]
pub struct TaggingEncoder<B: Backend> {
    pub encoder:        TransformerEncoder<B>,
    pub dropout:        Dropout,
    pub pooling_layers: usize,
}

/// Subword-level output of the encoder wrapper.
#[derive(Debug, Clone)]
pub struct SubwordEmbeddings<B: Backend> {
    /// [batch, subwords, hidden]
    pub embeddings: Tensor<B, 3>,
    /// Word-id map per sentence, cut to the same length as `embeddings`.
    pub word_ids:   Vec<WordIds>,
}

impl<B: Backend> TaggingEncoder<B> {
    pub fn hidden_size(&self) -> usize {
        self.encoder.d_model
    }

    pub fn max_position_embeddings(&self) -> usize {
        self.encoder.max_position_embeddings
    }

    pub fn forward(&self, batch: TokenizedBatch<B>) -> SubwordEmbeddings<B> {
        let TokenizedBatch { input_ids, attention_mask, mut word_ids } = batch;

        // If something is longer than the encoder allows, trim it down.
        let actual_length = input_ids.dims()[1];
        let max_length    = self.max_position_embeddings();
        let (input_ids, attention_mask, truncated) =
            truncate_inputs(input_ids, attention_mask, max_length);
        if truncated {
            tracing::warn!("truncating sequence from {} to {}", actual_length, max_length);
            word_ids.iter_mut().for_each(|ids| ids.truncate(max_length));
        }

        // Only ids and mask go to the device; word ids stay on the host.
        let device = self.encoder.device();
        let states = self.encoder.hidden_states(
            input_ids.to_device(&device),
            attention_mask.to_device(&device),
        );

        let x = pool_layers(states, self.pooling_layers);
        let x = self.dropout.forward(x);
        SubwordEmbeddings { embeddings: x, word_ids }
    }
}
