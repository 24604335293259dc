use std::collections::VecDeque;

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of upcoming pieces visible ahead of the falling one.
pub const LOOKAHEAD: usize = 5;

/// Seed for deterministic piece generation.
///
/// 128 bits initializing the piece queue's random number generator. Two
/// simulations built from the same seed and catalog draw identical piece
/// sequences, which makes replays and regression tests reproducible.
///
/// Serializes as a 32-character lowercase hex string.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use gravitris_engine::{EngineSeed, PieceCatalog, Simulation};
/// use rand::Rng as _;
///
/// let seed: EngineSeed = rand::rng().random();
/// let catalog = Arc::new(PieceCatalog::standard());
///
/// // Both simulations draw the same pieces in the same order.
/// let a = Simulation::with_seed(Arc::clone(&catalog), seed);
/// let b = Simulation::with_seed(Arc::clone(&catalog), seed);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct EngineSeed(pub(crate) [u8; 16]);

impl EngineSeed {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn to_bytes(self) -> [u8; 16] {
        self.0
    }
}

impl Serialize for EngineSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let num = u128::from_be_bytes(self.0);
        serializer.serialize_str(&format!("{num:032x}"))
    }
}

impl<'de> Deserialize<'de> for EngineSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex = String::deserialize(deserializer)?;
        if hex.len() != 32 {
            return Err(serde::de::Error::custom(format!(
                "invalid seed: expected 32 hex characters, got {}",
                hex.len()
            )));
        }
        let num = u128::from_str_radix(&hex, 16)
            .map_err(|e| serde::de::Error::custom(format!("invalid seed: {hex} ({e})")))?;
        Ok(Self(num.to_be_bytes()))
    }
}

/// Allows drawing a random `EngineSeed` with `rng.random()`.
impl Distribution<EngineSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> EngineSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        EngineSeed(seed)
    }
}

/// Look-ahead queue and hold slot over a piece catalog.
///
/// The queue always holds [`LOOKAHEAD`] upcoming type ids; popping the front
/// immediately refills the back with a fresh uniformly random draw. Every
/// catalog entry is equally likely on every draw, so droughts and repeats
/// both happen, unlike bag-based generators.
///
/// The hold slot stores at most one type id and starts empty.
#[derive(Debug, Clone)]
pub struct PieceBuffer {
    rng: Pcg32,
    queue: VecDeque<usize>,
    held: Option<usize>,
    catalog_len: usize,
}

impl PieceBuffer {
    /// Creates a buffer over `catalog_len` piece types with a random seed.
    ///
    /// # Panics
    ///
    /// Panics if `catalog_len` is zero.
    #[must_use]
    pub fn new(catalog_len: usize) -> Self {
        Self::with_seed(catalog_len, rand::rng().random())
    }

    /// Like [`Self::new`], but deterministic for a given seed.
    #[must_use]
    pub fn with_seed(catalog_len: usize, seed: EngineSeed) -> Self {
        assert!(catalog_len > 0, "piece buffer needs a non-empty catalog");
        let mut rng = Pcg32::from_seed(seed.0);
        let queue = (0..LOOKAHEAD)
            .map(|_| rng.random_range(0..catalog_len))
            .collect();
        Self {
            rng,
            queue,
            held: None,
            catalog_len,
        }
    }

    /// Draws the next type id and tops the queue back up to [`LOOKAHEAD`].
    pub fn pop_next(&mut self) -> usize {
        let next = self.queue.pop_front().expect("queue is refilled on every pop");
        self.queue.push_back(self.rng.random_range(0..self.catalog_len));
        next
    }

    /// The `n`-th upcoming type id, `0` being the next to spawn.
    ///
    /// # Panics
    ///
    /// Panics if `n >= LOOKAHEAD`.
    #[must_use]
    pub fn peek(&self, n: usize) -> usize {
        self.queue[n]
    }

    /// Stores `current` in the hold slot and returns its replacement: the
    /// previously held type id, or a fresh draw from the queue on the first
    /// hold.
    pub fn hold(&mut self, current: usize) -> usize {
        self.held.replace(current).unwrap_or_else(|| self.pop_next())
    }

    /// The held type id, `None` until the first hold.
    #[must_use]
    pub fn held(&self) -> Option<usize> {
        self.held
    }
}
