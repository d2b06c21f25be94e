//! Deterministic per-object RNG and seed-derivation helpers.
//!
//! Seeds are derived from `(event, lumi, azimuth)` so that the same physical
//! object always receives the same draw regardless of call order, thread or
//! process. The mixing follows the `std::seed_seq` generation rule and the
//! generator is a 32-bit Mersenne Twister with `TRandom3` seeding, which keeps
//! draws bit-compatible with the published smearing recipes.

use std::f64::consts::PI;

use rand::RngCore;

const STATE_SIZE: usize = 624;
const SHIFT_SIZE: usize = 397;
const MATRIX_A: u32 = 0x9908_b0df;
const UPPER_MASK: u32 = 0x8000_0000;
const LOWER_MASK: u32 = 0x7fff_ffff;
const TEMPERING_MASK_B: u32 = 0x9d2c_5680;
const TEMPERING_MASK_C: u32 = 0xefc6_0000;
const TWO_POW_MINUS_32: f64 = 2.328_306_436_538_696_3e-10;

/// Seed used when the mixed seed is zero.
pub const DEFAULT_SEED: u32 = 4357;

/// Twelve-bit component derived from an object's azimuth.
///
/// The value is `trunc(phi / pi * (2^31 - 1))` masked to its low twelve bits,
/// computed in two's complement so negative azimuths map into `0..4096`.
pub fn azimuth_seed_component(phi: f64) -> u32 {
    let scaled = (phi / PI) * ((1_i64 << 31) - 1) as f64;
    ((scaled as i64) & 0xFFF) as u32
}

/// Fills `out` following the `std::seed_seq::generate` algorithm.
pub fn seed_sequence(entropy: &[u32], out: &mut [u32]) {
    let n = out.len();
    if n == 0 {
        return;
    }
    let s = entropy.len();
    out.iter_mut().for_each(|word| *word = 0x8b8b_8b8b);

    let t = if n >= 623 {
        11
    } else if n >= 68 {
        7
    } else if n >= 39 {
        5
    } else if n >= 7 {
        3
    } else {
        (n - 1) / 2
    };
    let p = (n - t) / 2;
    let q = p + t;
    let m = (s + 1).max(n);
    let tmix = |x: u32| x ^ (x >> 27);

    for k in 0..m {
        let r1 = 1_664_525_u32
            .wrapping_mul(tmix(out[k % n] ^ out[(k + p) % n] ^ out[(k + n - 1) % n]));
        let r2 = if k == 0 {
            r1.wrapping_add(s as u32)
        } else if k <= s {
            r1.wrapping_add((k % n) as u32).wrapping_add(entropy[k - 1])
        } else {
            r1.wrapping_add((k % n) as u32)
        };
        out[(k + p) % n] = out[(k + p) % n].wrapping_add(r1);
        out[(k + q) % n] = out[(k + q) % n].wrapping_add(r2);
        out[k % n] = r2;
    }

    for k in m..m + n {
        let r3 = 1_566_083_941_u32.wrapping_mul(tmix(
            out[k % n]
                .wrapping_add(out[(k + p) % n])
                .wrapping_add(out[(k + n - 1) % n]),
        ));
        let r4 = r3.wrapping_sub((k % n) as u32);
        out[(k + p) % n] ^= r3;
        out[(k + q) % n] ^= r4;
        out[k % n] = r4;
    }
}

/// Mixes the three seed words of one object into a single 32-bit seed.
pub fn mix_seed_words(words: [u32; 3]) -> u32 {
    let mut seed = [0_u32; 1];
    seed_sequence(&words, &mut seed);
    seed[0]
}

/// Derives the deterministic seed for an object from its event coordinates.
///
/// Event and lumi identifiers are truncated to their low 32 bits before mixing.
pub fn object_seed(event: u64, lumi: u64, phi: f64) -> u32 {
    mix_seed_words([event as u32, lumi as u32, azimuth_seed_component(phi)])
}

/// Mersenne Twister handle used for per-object draws.
///
/// A fresh handle is created for every draw; nothing is carried between
/// objects or events.
#[derive(Clone)]
pub struct EventRng {
    state: [u32; STATE_SIZE],
    index: usize,
}

impl std::fmt::Debug for EventRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRng")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl EventRng {
    /// Creates a generator from a 32-bit seed. A zero seed maps to [`DEFAULT_SEED`].
    pub fn from_seed(seed: u32) -> Self {
        let seed = if seed == 0 { DEFAULT_SEED } else { seed };
        let mut state = [0_u32; STATE_SIZE];
        state[0] = seed;
        for i in 1..STATE_SIZE {
            let prev = state[i - 1];
            state[i] = 1_812_433_253_u32
                .wrapping_mul(prev ^ (prev >> 30))
                .wrapping_add(i as u32);
        }
        Self {
            state,
            index: STATE_SIZE,
        }
    }

    /// Creates a generator for one object in one event.
    pub fn for_object(event: u64, lumi: u64, phi: f64) -> Self {
        Self::from_seed(object_seed(event, lumi, phi))
    }

    fn twist(&mut self) {
        let mt = &mut self.state;
        for i in 0..STATE_SIZE {
            let y = (mt[i] & UPPER_MASK) | (mt[(i + 1) % STATE_SIZE] & LOWER_MASK);
            let mag = if y & 1 == 1 { MATRIX_A } else { 0 };
            mt[i] = mt[(i + SHIFT_SIZE) % STATE_SIZE] ^ (y >> 1) ^ mag;
        }
        self.index = 0;
    }

    /// Uniform draw in `(0, 1)`; zero outputs are skipped.
    pub fn uniform(&mut self) -> f64 {
        loop {
            let y = self.next_u32();
            if y != 0 {
                return f64::from(y) * TWO_POW_MINUS_32;
            }
        }
    }
}

impl RngCore for EventRng {
    fn next_u32(&mut self) -> u32 {
        if self.index >= STATE_SIZE {
            self.twist();
        }
        let mut y = self.state[self.index];
        self.index += 1;
        y ^= y >> 11;
        y ^= (y << 7) & TEMPERING_MASK_B;
        y ^= (y << 15) & TEMPERING_MASK_C;
        y ^= y >> 18;
        y
    }

    fn next_u64(&mut self) -> u64 {
        let low = u64::from(self.next_u32());
        let high = u64::from(self.next_u32());
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
