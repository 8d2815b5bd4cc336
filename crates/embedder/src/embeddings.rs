use crate::error::{EmbeddingError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;

/// Dimension of vectors produced by [`StubEmbedder`] unless configured otherwise
pub const STUB_DIMENSION: usize = 64;

/// Maps tokens to fixed-dimension vectors.
///
/// Implementations must return exactly one vector per input text, in order.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifier of the model producing the vectors
    fn model_id(&self) -> &str;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| EmbeddingError::backend("Empty embedding result"))
    }
}

#[async_trait]
impl<E: Embedder + ?Sized> Embedder for Arc<E> {
    fn model_id(&self) -> &str {
        (**self).model_id()
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        (**self).embed_batch(texts).await
    }
}

/// Which backend produces embeddings
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EmbeddingMode {
    Ollama,
    Stub,
}

impl EmbeddingMode {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "stub" => Ok(Self::Stub),
            other => Err(EmbeddingError::backend(format!(
                "Unsupported embedding mode '{other}' (expected 'ollama' or 'stub')"
            ))),
        }
    }

    /// Read `SEMALIGN_EMBED_MODE`, defaulting to Ollama
    pub fn from_env() -> Result<Self> {
        env::var("SEMALIGN_EMBED_MODE").map_or(Ok(Self::Ollama), |raw| Self::parse(&raw))
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::Stub => "stub",
        }
    }
}

/// Deterministic offline embedder.
///
/// Every token hashes to a pseudo-random unit vector, so identical tokens have
/// distance 0 and distinct tokens are close to orthogonal.
#[derive(Clone, Debug)]
pub struct StubEmbedder {
    dimension: usize,
}

impl StubEmbedder {
    #[must_use]
    pub const fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }
}

impl Default for StubEmbedder {
    fn default() -> Self {
        Self::new(STUB_DIMENSION)
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    fn model_id(&self) -> &str {
        "stub"
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| stub_embed(text, self.dimension))
            .collect())
    }
}

/// Explicit token to vector table. Tokens outside the table are an error.
#[derive(Clone, Debug, Default)]
pub struct FixedEmbedder {
    vectors: HashMap<String, Vec<f32>>,
}

impl FixedEmbedder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, token: impl Into<String>, vector: Vec<f32>) -> Self {
        self.vectors.insert(token.into(), vector);
        self
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<f32>)> for FixedEmbedder {
    fn from_iter<I: IntoIterator<Item = (K, Vec<f32>)>>(iter: I) -> Self {
        Self {
            vectors: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[async_trait]
impl Embedder for FixedEmbedder {
    fn model_id(&self) -> &str {
        "fixed"
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts
            .iter()
            .map(|text| {
                self.vectors
                    .get(text)
                    .cloned()
                    .ok_or_else(|| EmbeddingError::UnknownToken(text.clone()))
            })
            .collect()
    }
}

/// `1 - cos(a, b)` with the cosine clamped to `[-1, 1]`.
///
/// Vectors of different length or with zero norm are treated as unrelated (1.0).
#[must_use]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 1.0;
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum();
    let norm_a = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    1.0 - (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

fn normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return;
    }
    for value in vec {
        *value /= norm;
    }
}

fn stub_embed(text: &str, dimension: usize) -> Vec<f32> {
    let mut state =
        fnv1a_64(text.as_bytes()) ^ (dimension as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let mut vec: Vec<f32> = (0..dimension)
        .map(|_| {
            let mantissa = ((splitmix64(&mut state) >> 32) as u32) >> 9;
            let unit = f32::from_bits(0x3f80_0000 | mantissa) - 1.0;
            unit.mul_add(2.0, -1.0)
        })
        .collect();
    normalize(&mut vec);
    vec
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

const fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
