//! Sink identifiers: validation, truncation, and random generation.
//!
//! Generated ids are `ID_LEN` characters drawn from [`ALPHABET`]. Custom ids
//! supplied by clients are accepted as long as they are URL-safe and no
//! longer than `ID_LEN`; uniqueness is probabilistic and never enforced.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{FailRunError, Result};

/// Length of generated ids and upper bound for custom ids (in characters).
pub const ID_LEN: usize = 32;

/// Generator alphabet. `v`/`V` appear twice and `w`/`W` never do, so `v`
/// and `V` are drawn with double weight.
pub const ALPHABET: &[u8; 62] =
    b"0123456789abcdefghijklmnopqrstuvvxyzABCDEFGHIJKLMNOPQRSTUVVXYZ";

/// A validated sink identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SinkId(String);

impl SinkId {
    /// Validate a client-supplied id. Never truncates: over-long ids are an
    /// input error (callers redirect to [`truncate`]d paths themselves).
    pub fn parse(raw: &str) -> Result<Self> {
        validate(raw)?;
        Ok(Self(raw.to_owned()))
    }

    /// Draw a fresh id from `rng`.
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let id = (0..ID_LEN)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect();
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_url_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Check length bounds and charset of a raw id.
pub fn validate(raw: &str) -> Result<()> {
    if raw.is_empty() {
        return Err(FailRunError::InvalidId("empty id".into()));
    }
    let len = raw.chars().count();
    if len > ID_LEN {
        return Err(FailRunError::InvalidId(format!(
            "id has {len} characters, max is {ID_LEN}"
        )));
    }
    if let Some(c) = raw.chars().find(|c| !is_url_safe(*c)) {
        return Err(FailRunError::InvalidId(format!("unexpected character {c:?}")));
    }
    Ok(())
}

/// Returns the first `ID_LEN` characters of `raw` when it is too long.
pub fn truncate(raw: &str) -> Option<&str> {
    raw.char_indices().nth(ID_LEN).map(|(cut, _)| &raw[..cut])
}

/// Random source shared by concurrent request handlers.
///
/// A single `StdRng` behind a mutex. The same seed yields the same id
/// sequence.
pub struct IdSource {
    seed: u64,
    rng: Mutex<StdRng>,
}

impl IdSource {
    /// Seed from `seed`, or from the thread-local OS-seeded generator.
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(rand::random);
        Self {
            seed,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Seed used for this source.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn generate(&self) -> SinkId {
        // poisoning is harmless here: the rng has no invariant to break
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        SinkId::generate(&mut *rng)
    }
}

impl fmt::Debug for IdSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdSource").field("seed", &self.seed).finish()
    }
}
