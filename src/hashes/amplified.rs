//! Amplified hashing.
//!
//! An [`AmplifiedHash`] combines `k` projection hashes into one bucket key
//!
//! ```text
//! g(x) = sum_i  r_i * m^i * h_i(x)   (mod M)
//! ```
//!
//! with random coefficients `r_i`, a fixed base `m` and a prime modulus `M`
//! below 2^32. The powers `m^i mod M` are precomputed once per index
//! configuration in a [`ModularPowers`] table that every table of the index
//! shares read-only.

use crate::error::{HashClustError, Result};
use crate::hashes::hash_function::{HashFunction, HashFunctionFamily};
use std::sync::Arc;

/// Largest prime below 2^32.
pub const DEFAULT_MODULUS: u64 = 4_294_967_291;

/// Base of the polynomial combination.
pub const DEFAULT_BASE: u64 = (1 << 29) - 3;

/// Precomputed `base^i mod modulus` for `i` in `0..len`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModularPowers {
    base: u64,
    modulus: u64,
    powers: Vec<u64>,
}

impl ModularPowers {
    /// Build the table. The modulus must lie in `2..=2^32` so that every
    /// product of two reduced values fits in a u64.
    pub fn new(len: usize, base: u64, modulus: u64) -> Result<Self> {
        if !(2..=(1u64 << 32)).contains(&modulus) {
            return Err(HashClustError::configuration(format!(
                "modulus must be in 2..=2^32, got {modulus}"
            )));
        }
        Ok(Self::build(len, base, modulus))
    }

    /// Build the table with [`DEFAULT_BASE`] and [`DEFAULT_MODULUS`].
    pub fn with_defaults(len: usize) -> Self {
        Self::build(len, DEFAULT_BASE, DEFAULT_MODULUS)
    }

    fn build(len: usize, base: u64, modulus: u64) -> Self {
        let base = base % modulus;
        let mut powers = Vec::with_capacity(len);
        let mut current = 1 % modulus;
        for _ in 0..len {
            powers.push(current);
            current = current * base % modulus;
        }
        Self {
            base,
            modulus,
            powers,
        }
    }

    /// Number of precomputed powers.
    pub fn len(&self) -> usize {
        self.powers.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.powers.is_empty()
    }

    /// The base `m`.
    pub fn base(&self) -> u64 {
        self.base
    }

    /// The modulus `M`.
    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    /// `base^i mod modulus`.
    #[inline]
    pub fn power(&self, i: usize) -> u64 {
        self.powers[i]
    }

    /// `a * b mod modulus`.
    #[inline]
    pub fn mul_mod(&self, a: u64, b: u64) -> u64 {
        (a % self.modulus) * (b % self.modulus) % self.modulus
    }

    /// Non-negative residue of a signed bucket number.
    #[inline]
    pub fn reduce_signed(&self, value: i64) -> u64 {
        value.rem_euclid(self.modulus as i64) as u64
    }
}

/// Composite hash of `k` projection functions for one table.
#[derive(Debug, Clone)]
pub struct AmplifiedHash {
    functions: Vec<HashFunction>,
    /// `r_i * m^i mod M`, folded once at construction.
    weights: Vec<u64>,
    powers: Arc<ModularPowers>,
}

impl AmplifiedHash {
    /// Combine `functions` with random `coefficients` over a shared power table.
    pub fn new(
        functions: Vec<HashFunction>,
        coefficients: Vec<u64>,
        powers: Arc<ModularPowers>,
    ) -> Result<Self> {
        if functions.len() != coefficients.len() {
            return Err(HashClustError::configuration(format!(
                "{} hash functions but {} coefficients",
                functions.len(),
                coefficients.len()
            )));
        }
        if functions.len() > powers.len() {
            return Err(HashClustError::configuration(format!(
                "power table holds {} entries, {} needed",
                powers.len(),
                functions.len()
            )));
        }
        let weights = coefficients
            .iter()
            .enumerate()
            .map(|(i, &r)| powers.mul_mod(r, powers.power(i)))
            .collect();
        Ok(Self {
            functions,
            weights,
            powers,
        })
    }

    /// Draw the functions and coefficients of table `table` from `family`.
    pub fn random(
        family: &HashFunctionFamily,
        k: usize,
        table: usize,
        powers: Arc<ModularPowers>,
    ) -> Result<Self> {
        let mut sampler = family.member_sampler(table as u64);
        let functions = family.build_with(k, &mut sampler);
        let modulus = powers.modulus();
        let coefficients = (0..k).map(|_| sampler.random_u64(1, modulus)).collect();
        Self::new(functions, coefficients, powers)
    }

    /// Number of combined functions (k).
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Check if no functions are combined.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// The underlying projection functions.
    pub fn functions(&self) -> &[HashFunction] {
        &self.functions
    }

    /// The shared power table.
    pub fn powers(&self) -> &Arc<ModularPowers> {
        &self.powers
    }

    /// Bucket key of `x`, always in `0..modulus`.
    #[inline]
    pub fn key(&self, x: &[f32]) -> u64 {
        let p = &*self.powers;
        let modulus = p.modulus();
        self.functions
            .iter()
            .zip(self.weights.iter())
            .fold(0u64, |acc, (h, &w)| {
                (acc + p.mul_mod(w, p.reduce_signed(h.bucket(x)))) % modulus
            })
    }
}
