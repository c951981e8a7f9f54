//! Deterministic RNG hierarchy.
//!
//! A master seed is expanded into independent named streams (prices, news,
//! impact). Sub-seeds are derived via BLAKE3 hashing, so drawing more numbers
//! from one stream never shifts another and a seeded simulation replays
//! identically.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Stream driving the per-tick random walk.
pub const PRICES_STREAM: &str = "prices";
/// Stream driving synthetic news generation.
pub const NEWS_STREAM: &str = "news";
/// Stream driving news-to-price multipliers.
pub const IMPACT_STREAM: &str = "impact";

#[derive(Debug, Clone)]
pub struct RngHierarchy {
    master_seed: u64,
}

impl RngHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    /// Hierarchy seeded from OS entropy; the drawn seed stays inspectable.
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Deterministic sub-seed for `(stream, index)`, independent of call order.
    pub fn sub_seed(&self, stream: &str, index: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(stream.as_bytes());
        hasher.update(&index.to_le_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    pub fn stream(&self, stream: &str) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(stream, 0))
    }
}

/// The three streams a simulation draws from.
#[derive(Debug, Clone)]
pub struct SimRngs {
    pub prices: StdRng,
    pub news: StdRng,
    pub impact: StdRng,
}

impl SimRngs {
    pub fn from_hierarchy(hierarchy: &RngHierarchy) -> Self {
        Self {
            prices: hierarchy.stream(PRICES_STREAM),
            news: hierarchy.stream(NEWS_STREAM),
            impact: hierarchy.stream(IMPACT_STREAM),
        }
    }

    pub fn seeded(master_seed: u64) -> Self {
        Self::from_hierarchy(&RngHierarchy::new(master_seed))
    }
}
