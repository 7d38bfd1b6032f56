//! Embedding providers.
//!
//! - `HashingEmbedder` is the default backend: a deterministic feature-hashing
//!   bag-of-words embedding. It needs no model files, so texts sharing words
//!   land close together in L2 space.
//! - `BertEmbedder` (feature `bert`) runs a sentence-transformer BERT model
//!   through candle, mean-pools the token states and L2-normalizes the result.

use crate::config::{EmbeddingBackend, EmbeddingConfig};
use crate::error::{Error, Result};
use crate::vector::normalize;

/// Maps text to a fixed-length vector.
///
/// Implementations must be deterministic and always return exactly
/// `dimension()` values.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn dimension(&self) -> usize;
}

/// Builds the embedder selected by `config`.
pub fn build_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    match config.backend {
        EmbeddingBackend::Hashing => {
            if config.dimension == 0 {
                return Err(Error::Config("embedding dimension must be at least 1".to_string()));
            }
            tracing::info!(dimension = config.dimension, "Using hashing embedder");
            Ok(Box::new(HashingEmbedder::new(config.dimension)))
        }
        #[cfg(feature = "bert")]
        EmbeddingBackend::Bert => Ok(Box::new(bert::BertEmbedder::from_hub(&config.model_id)?)),
        #[cfg(not(feature = "bert"))]
        EmbeddingBackend::Bert => Err(Error::Config(
            "the bert backend requires building with `--features bert`".to_string(),
        )),
    }
}

// ---------------------------------------------------------------------------
// HashingEmbedder
// ---------------------------------------------------------------------------

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Signed feature hashing over lower-cased alphanumeric tokens.
///
/// Each token adds ±1 to one of `dimension` buckets, chosen by its FNV-1a
/// hash; the sign comes from the hash's top bit so collisions partly cancel.
/// The accumulated vector is L2-normalized. Text without tokens embeds to
/// the zero vector.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|token| !token.is_empty())
            .map(|token| token.to_ascii_lowercase())
    }

    fn fnv1a(bytes: &[u8]) -> u64 {
        bytes.iter().fold(FNV_OFFSET, |hash, byte| {
            (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
        })
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimension];
        if self.dimension == 0 {
            return Ok(vector);
        }

        for token in Self::tokens(text) {
            let hash = Self::fnv1a(token.as_bytes());
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if hash >> 63 == 1 { -1.0 } else { 1.0 };
            vector[bucket] += sign;
        }

        normalize(&mut vector);
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

// ---------------------------------------------------------------------------
// BertEmbedder
// ---------------------------------------------------------------------------

#[cfg(feature = "bert")]
pub use bert::BertEmbedder;

#[cfg(feature = "bert")]
mod bert {
    use super::Embedder;
    use crate::error::{Error, Result};

    use candle_core::{DType, Device, Tensor};
    use candle_nn::VarBuilder;
    use candle_transformers::models::bert::{BertModel, Config};
    use hf_hub::{api::sync::Api, Repo, RepoType};
    use tokenizers::Tokenizer;

    fn model_err(err: impl std::fmt::Display) -> Error {
        Error::Embedding(err.to_string())
    }

    fn mean_pooling(
        hidden_states: &Tensor,
        attention_mask: &Tensor,
    ) -> candle_core::Result<Tensor> {
        let mask_expanded = attention_mask
            .unsqueeze(2)?
            .broadcast_as(hidden_states.shape())?
            .to_dtype(hidden_states.dtype())?;
        let sum_embeddings = (hidden_states * &mask_expanded)?.sum(1)?;
        let sum_mask = mask_expanded.sum(1)?.clamp(1e-9, f64::MAX)?;
        sum_embeddings.broadcast_div(&sum_mask)
    }

    fn l2_normalize(tensor: &Tensor) -> candle_core::Result<Tensor> {
        let norm = tensor.sqr()?.sum_keepdim(1)?.sqrt()?;
        tensor.broadcast_div(&norm.clamp(1e-12, f64::MAX)?)
    }

    /// Sentence-transformer BERT model (e.g. all-MiniLM-L6-v2) on candle.
    pub struct BertEmbedder {
        model: BertModel,
        tokenizer: Tokenizer,
        device: Device,
        dimension: usize,
    }

    impl BertEmbedder {
        /// Downloads (or reuses the cached) `model_id` from the Hugging Face hub.
        pub fn from_hub(model_id: &str) -> Result<Self> {
            let device = Device::cuda_if_available(0).map_err(model_err)?;

            let api = Api::new().map_err(model_err)?;
            let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

            let tokenizer_path = repo.get("tokenizer.json").map_err(model_err)?;
            let config_path = repo.get("config.json").map_err(model_err)?;
            let weights_path = repo.get("model.safetensors").map_err(model_err)?;

            let config: Config = serde_json::from_str(&std::fs::read_to_string(config_path)?)
                .map_err(model_err)?;
            let tokenizer = Tokenizer::from_file(tokenizer_path).map_err(model_err)?;

            // SAFETY: the safetensors file is owned by the hub cache and not
            // modified while mapped.
            let vb = unsafe {
                VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
                    .map_err(model_err)?
            };
            let model = BertModel::load(vb, &config).map_err(model_err)?;
            let dimension = config.hidden_size;

            tracing::info!(model = model_id, dimension, "Loaded BERT embedding model");

            Ok(Self { model, tokenizer, device, dimension })
        }

        fn forward(&self, text: &str) -> candle_core::Result<Vec<f32>> {
            let encoding = self.tokenizer
                .encode(text, true)
                .map_err(|e| candle_core::Error::Msg(e.to_string()))?;
            let ids = Tensor::from_vec(
                encoding.get_ids().to_vec(),
                (1, encoding.get_ids().len()),
                &self.device,
            )?;
            let mask = Tensor::from_vec(
                encoding.get_attention_mask().to_vec(),
                (1, encoding.get_attention_mask().len()),
                &self.device,
            )?;
            let type_ids = ids.zeros_like()?;
            let hidden = self.model.forward(&ids, &type_ids, Some(&mask))?;
            let pooled = mean_pooling(&hidden, &mask)?;
            let normalized = l2_normalize(&pooled)?;
            normalized.get(0)?.to_vec1()
        }
    }

    impl Embedder for BertEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.forward(text).map_err(model_err)
        }

        fn dimension(&self) -> usize {
            self.dimension
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::squared_l2;

    fn embed(text: &str) -> Vec<f32> {
        HashingEmbedder::new(384).embed(text).unwrap()
    }

    #[test]
    fn test_hashing_dimension() {
        let embedder = HashingEmbedder::new(384);
        assert_eq!(embedder.dimension(), 384);
        assert_eq!(embed("hello world").len(), 384);

        let small = HashingEmbedder::new(8);
        assert_eq!(small.embed("hello world").unwrap().len(), 8);
    }

    #[test]
    fn test_hashing_deterministic() {
        assert_eq!(embed("same text"), embed("same text"));
    }

    #[test]
    fn test_hashing_ignores_case_and_punctuation() {
        assert_eq!(embed("California!"), embed("california"));
        assert_eq!(embed("What is Civic?"), embed("what IS civic"));
    }

    #[test]
    fn test_hashing_unit_length() {
        let vector = embed("The Honda Civic is a compact car.");
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_hashing_empty_text_is_zero_vector() {
        let vector = embed("");
        assert!(vector.iter().all(|x| *x == 0.0));

        let vector = embed("?! ...");
        assert!(vector.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_hashing_shared_words_are_closer() {
        let query = embed("California");
        let state = embed("California is a US state.");
        let cities = embed("California has many cities.");
        let car = embed("The Honda Civic is a compact car.");

        let to_car = squared_l2(&query, &car).unwrap();
        assert!(squared_l2(&query, &state).unwrap() < to_car);
        assert!(squared_l2(&query, &cities).unwrap() < to_car);
    }

    #[test]
    fn test_fnv1a_known_values() {
        assert_eq!(HashingEmbedder::fnv1a(b""), FNV_OFFSET);
        assert_eq!(HashingEmbedder::fnv1a(b"a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn test_build_hashing_embedder() {
        let config = EmbeddingConfig::default();
        let embedder = build_embedder(&config).unwrap();
        assert_eq!(embedder.dimension(), 384);
    }

    #[test]
    fn test_build_rejects_zero_dimension() {
        let config = EmbeddingConfig { dimension: 0, ..EmbeddingConfig::default() };
        assert!(matches!(build_embedder(&config), Err(Error::Config(_))));
    }

    #[cfg(not(feature = "bert"))]
    #[test]
    fn test_build_bert_without_feature() {
        let config = EmbeddingConfig {
            backend: EmbeddingBackend::Bert,
            ..EmbeddingConfig::default()
        };
        assert!(matches!(build_embedder(&config), Err(Error::Config(_))));
    }
}
