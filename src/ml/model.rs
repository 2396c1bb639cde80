use burn::{
    nn::{
        attention::{generate_autoregressive_mask, MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
};

use anyhow::Result;

use crate::domain::sample::PAD_ID;
use crate::domain::traits::NextTokenModel;
use crate::infra::checkpoint::CheckpointManager;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct TransformerLmConfig {
    pub vocab_size:  usize,
    pub max_seq_len: usize,
    pub d_model:     usize,
    pub num_heads:   usize,
    pub num_layers:  usize,
    pub d_ff:        usize,
    pub dropout:     f64,
}

impl TransformerLmConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TransformerLmModel<B> {
        let token_embedding    = EmbeddingConfig::new(self.vocab_size, self.d_model).init(device);
        let position_embedding = EmbeddingConfig::new(self.max_seq_len, self.d_model).init(device);
        let layers: Vec<DecoderBlock<B>> = (0..self.num_layers)
            .map(|_| self.build_decoder_block(device))
            .collect();
        let final_norm = LayerNormConfig::new(self.d_model).init(device);
        let lm_head    = LinearConfig::new(self.d_model, self.vocab_size).init(device);
        let dropout    = DropoutConfig::new(self.dropout).init();
        TransformerLmModel {
            token_embedding, position_embedding, layers,
            final_norm, lm_head, dropout,
            max_seq_len: self.max_seq_len,
        }
    }

    fn build_decoder_block<B: Backend>(&self, device: &B::Device) -> DecoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.d_model, self.d_ff).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_ff, self.d_model).init(device);
        let norm1   = LayerNormConfig::new(self.d_model).init(device);
        let norm2   = LayerNormConfig::new(self.d_model).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        DecoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }
}

#[derive(Module, Debug)]
pub struct DecoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> DecoderBlock<B> {
    /// One pre-computed causal mask is shared by every block of
    /// a forward pass — position t may only attend to <= t.
    pub fn forward(&self, x: Tensor<B, 3>, mask: Tensor<B, 3, Bool>) -> Tensor<B, 3> {
        let attn_input  = MhaInput::self_attn(x.clone()).mask_attn(mask);
        let attn_output = self.self_attn.forward(attn_input).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(
            burn::tensor::activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

#[derive(Module, Debug)]
pub struct TransformerLmModel<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub layers:             Vec<DecoderBlock<B>>,
    pub final_norm:         LayerNorm<B>,
    pub lm_head:            Linear<B>,
    pub dropout:            Dropout,
    pub max_seq_len:        usize,
}

impl<B: Backend> TransformerLmModel<B> {
    /// input_ids: [batch, seq_len] → next-token logits: [batch, seq_len, vocab]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [batch_size, seq_len] = input_ids.dims();

        let tok_emb = self.token_embedding.forward(input_ids);

        // Self-attention is permutation-invariant, so position must be injected explicitly.
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &tok_emb.device())
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb = self.position_embedding.forward(positions);

        // Causal mask: keeps the model autoregressive — the
        // prediction at t never sees tokens after t.
        let mask = generate_autoregressive_mask::<B>(batch_size, seq_len, &tok_emb.device());

        let mut x = self.dropout.forward(tok_emb + pos_emb);
        for layer in &self.layers {
            x = layer.forward(x, mask.clone());
        }
        let x = self.final_norm.forward(x); // [batch, seq_len, d_model]

        self.lm_head.forward(x) // [batch, seq_len, vocab]
    }

    /// Cross-entropy between shifted targets and logits, with
    /// pad positions masked out of the loss.
    pub fn forward_loss(
        &self,
        input_ids: Tensor<B, 2, Int>,
        targets:   Tensor<B, 2, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 3>) {
        let logits = self.forward(input_ids);
        let [batch_size, seq_len, vocab] = logits.dims();

        let ce = CrossEntropyLossConfig::new()
            .with_pad_tokens(Some(vec![PAD_ID as usize]))
            .init(&logits.device());

        // Flatten positions: every (batch, position) pair is one
        // classification over the vocabulary.
        let loss = ce.forward(
            logits.clone().reshape([batch_size * seq_len, vocab]),
            targets.reshape([batch_size * seq_len]),
        );
        (loss, logits)
    }
}

// ─── LmScorer ─────────────────────────────────────────────────────────────────
/// Adapts an inference-mode model to the NextTokenModel
/// capability the decoder consumes: one forward pass over the
/// running sequence, softmax over the final position.
///
/// Constructed from `model.valid()` by callers, so dropout is
/// off and no gradients are tracked while generating.
pub struct LmScorer<B: Backend> {
    model:       TransformerLmModel<B>,
    max_seq_len: usize,
    device:      B::Device,
}

impl<B: Backend> LmScorer<B> {
    pub fn new(model: TransformerLmModel<B>, max_seq_len: usize, device: B::Device) -> Self {
        Self { model, max_seq_len, device }
    }
}

type InferBackend = burn::backend::Wgpu;

impl LmScorer<InferBackend> {
    /// Rebuild the trained model from the latest checkpoint,
    /// ready for generation: inference backend, dropout 0.
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager) -> Result<Self> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        let cfg    = ckpt_manager.load_config()?;
        let model_cfg = TransformerLmConfig::new(
            cfg.vocab_size, cfg.max_seq_len, cfg.d_model,
            cfg.num_heads, cfg.num_layers, cfg.d_ff, 0.0,
        );
        let model: TransformerLmModel<InferBackend> = model_cfg.init(&device);
        let model = ckpt_manager.load_model(model, &device)?;
        tracing::info!("Model loaded from checkpoint");
        Ok(Self::new(model, cfg.max_seq_len, device))
    }
}

impl<B: Backend> NextTokenModel for LmScorer<B> {
    fn next_token_probs(&self, ids: &[u32]) -> Result<Vec<f32>> {
        // The position table only covers max_seq_len ids; score
        // the tail window when the running sequence outgrows it.
        let start = ids.len().saturating_sub(self.max_seq_len);
        let window = &ids[start..];

        let flat: Vec<i32> = window.iter().map(|&x| x as i32).collect();
        let input = Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device)
            .unsqueeze::<2>(); // [1, seq_len]

        let logits = self.model.forward(input); // [1, seq_len, vocab]
        let [_, seq_len, vocab] = logits.dims();
        let last = logits
            .slice([0..1, seq_len - 1..seq_len, 0..vocab])
            .reshape([1, vocab]);

        let probs: Vec<f32> = burn::tensor::activation::softmax(last, 1)
            .into_data()
            .to_vec::<f32>()
            .unwrap_or_default();

        Ok(probs)
    }
}
