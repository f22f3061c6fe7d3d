// =============================================================================
// RNG.RS — Deterministic pseudo-random generator
//
// Every random decision in the renderer (variant columns, packer priorities,
// pool shuffles, classification order) draws from one instance of this
// generator. Output must be bit-identical for the same seed and the same
// sequence of calls, on every platform. The derivation uses only wrapping
// 32-bit integer arithmetic; keep it that way.
//
// The call order is part of the contract: adding, removing or reordering a
// single `next` call anywhere in a pass changes every value drawn after it.
// =============================================================================

use serde::{Deserialize, Serialize};

/// Value `init` is reset to on every reseed.
pub const INIT_MASK: u32 = 0xA300_0000;

/// The renderer's single source of randomness.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterministicRng {
    seed: u32,
    init: u32,
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self { seed: 1, init: INIT_MASK }
    }
}

impl DeterministicRng {
    /// Create a generator already seeded with `seed`.
    pub fn new(seed: u32) -> Self {
        let mut rng = Self::default();
        rng.reseed(seed);
        rng
    }

    /// Reset `init` and replace the seed.
    pub fn reseed(&mut self, seed: u32) {
        self.init = INIT_MASK;
        self.seed = seed;
    }

    /// Current seed word. Changes after every [`next`](Self::next).
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Advance the generator and return the next value.
    ///
    /// With `clamp > 0` the result lies in `1..=clamp`. With `clamp <= 0` the
    /// raw derived value plus one is returned (any `i32`).
    pub fn next(&mut self, clamp: i32) -> i32 {
        if self.seed == 0 {
            self.seed = 1;
            self.init = INIT_MASK;
        }

        self.seed = if self.seed & 1 == 0 {
            self.seed >> 1
        } else {
            (self.seed >> 1) ^ self.init
        };

        let mut value = derive(self.seed.wrapping_mul(0x47));
        if clamp > 0 {
            value = (value & 0x7FFF_FFFF) % clamp;
        }
        value.wrapping_add(1)
    }

    /// Zero-based index into a collection of `len` items, drawn with
    /// `next(len) - 1`. Returns `None` for an empty collection without
    /// consuming a value.
    pub fn index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let clamp = i32::try_from(len).unwrap_or(i32::MAX);
        Some((self.next(clamp) - 1) as usize)
    }
}

/// Integer hash applied to the scrambled seed.
///
/// Signed right shifts are intentional: `(x as i32) >> 21` propagates the
/// sign bit.
fn derive(param: u32) -> i32 {
    let v1 = ((param << 13) ^ param).wrapping_sub(((param as i32) >> 21) as u32) as i32;

    let poly = v1
        .wrapping_mul(v1)
        .wrapping_mul(0x3D73)
        .wrapping_add(0xC_0AE5)
        .wrapping_mul(v1);
    let v2 = ((poly as u32).wrapping_add(0xD208_DD0D) & 0x7FFF_FFFF).wrapping_add(v1 as u32);

    ((v2 << 13) ^ v2).wrapping_sub(((v2 as i32) >> 21) as u32) as i32
}

// ── Tests ─────────────────────────────────────────────────────────────────────
