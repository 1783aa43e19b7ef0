use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::constants::SEED_MODULUS;
use crate::engine::types::CustomDataScope;

/// The four persisted seed slots (again, hard, good, easy). Whichever answer
/// the host commits, its slot becomes the stored seed the next invocation
/// reads back, so consecutive answers on the same card are decorrelated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedChain {
    pub again: u32,
    pub hard: u32,
    pub good: u32,
    pub easy: u32,
}

impl SeedChain {
    /// A chain is only usable when every slot is present and in range.
    pub fn from_scope(scope: &CustomDataScope) -> Option<Self> {
        Some(Self {
            again: valid_slot(scope.again.seed)?,
            hard: valid_slot(scope.hard.seed)?,
            good: valid_slot(scope.good.seed)?,
            easy: valid_slot(scope.easy.seed)?,
        })
    }

    /// Chain written back after a draw, derived from the draw itself.
    fn derive(fuzz: f64) -> Self {
        let s = (fuzz * f64::from(SEED_MODULUS)).round() as u32;
        Self {
            again: (s + 1) % SEED_MODULUS,
            hard: (s + 2) % SEED_MODULUS,
            good: (s + 3) % SEED_MODULUS,
            easy: (s + 4) % SEED_MODULUS,
        }
    }

    pub fn write_to(&self, scope: &mut CustomDataScope) {
        scope.again.seed = Some(self.again);
        scope.hard.seed = Some(self.hard);
        scope.good.seed = Some(self.good);
        scope.easy.seed = Some(self.easy);
    }
}

fn valid_slot(seed: Option<u32>) -> Option<u32> {
    seed.filter(|value| *value < SEED_MODULUS)
}

/// Where the fuzz draw got its seed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SeedSource {
    Chain,
    Entropy,
}

/// Result of one fuzz draw: the unit-interval value for this event and the
/// chain to persist for the next one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzDraw {
    pub value: f64,
    pub chain: SeedChain,
    pub source: SeedSource,
}

/// Draw the fuzz value for one review event.
///
/// A complete chain seeds the generator from its "good" slot, so repeated
/// invocations for the same pending answer draw the identical value.
/// Otherwise the entropy closure supplies a string — the host's per-event
/// seed when it has one, else the card's displayed text — which is hashed
/// into a seed. Reproducibility within one deployment is what matters; no
/// particular generator is prescribed across deployments.
pub fn next_fuzz(chain: Option<SeedChain>, entropy: impl FnOnce() -> String) -> FuzzDraw {
    let (mut rng, source) = match chain {
        Some(chain) => (
            ChaCha8Rng::seed_from_u64(u64::from(chain.good)),
            SeedSource::Chain,
        ),
        None => (
            ChaCha8Rng::seed_from_u64(seed_from_text(&entropy())),
            SeedSource::Entropy,
        ),
    };
    let value: f64 = rng.gen();
    FuzzDraw {
        value,
        chain: SeedChain::derive(value),
        source,
    }
}

fn seed_from_text(text: &str) -> u64 {
    let digest = Sha256::digest(text.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}
