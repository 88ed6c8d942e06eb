use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier prefix shared by every glycan.
pub const GLYCAN_ID_PREFIX: &str = "LBG-";

/// Symbols drawn for the random part of an identifier.
pub const GLYCAN_ID_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const GLYCAN_ID_SUFFIX_LEN: usize = 5;

/// Upper bound on candidate draws before giving up.
pub const MAX_ID_ATTEMPTS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GlycanIdError {
    #[error("Malformed glycan identifier '{0}' (expected LBG-XXXXX)")]
    Malformed(String),
    #[error("No unused glycan identifier found after {0} attempts")]
    Exhausted(usize),
}

/// Human-readable glycan primary key of the form `LBG-XXXXX`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GlycanId(String);

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^LBG-[A-Z0-9]{5}$").expect("static pattern"))
}

impl GlycanId {
    /// Draw a fresh candidate identifier. Uniqueness is not checked here.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let mut id = String::with_capacity(GLYCAN_ID_PREFIX.len() + GLYCAN_ID_SUFFIX_LEN);
        id.push_str(GLYCAN_ID_PREFIX);
        for _ in 0..GLYCAN_ID_SUFFIX_LEN {
            let idx = rng.gen_range(0..GLYCAN_ID_ALPHABET.len());
            id.push(GLYCAN_ID_ALPHABET[idx] as char);
        }
        GlycanId(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_valid(s: &str) -> bool {
        id_pattern().is_match(s)
    }
}

impl fmt::Display for GlycanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for GlycanId {
    type Err = GlycanIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if GlycanId::is_valid(s) {
            Ok(GlycanId(s.to_string()))
        } else {
            Err(GlycanIdError::Malformed(s.to_string()))
        }
    }
}

impl TryFrom<String> for GlycanId {
    type Error = GlycanIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if GlycanId::is_valid(&value) {
            Ok(GlycanId(value))
        } else {
            Err(GlycanIdError::Malformed(value))
        }
    }
}

impl From<GlycanId> for String {
    fn from(id: GlycanId) -> Self {
        id.0
    }
}

/// A store that can answer whether an identifier is already taken.
pub trait IdRegistry {
    type Error;

    fn contains(&self, id: &GlycanId) -> Result<bool, Self::Error>;
}

impl IdRegistry for HashSet<GlycanId> {
    type Error = GlycanIdError;

    fn contains(&self, id: &GlycanId) -> Result<bool, Self::Error> {
        Ok(HashSet::contains(self, id))
    }
}

/// Draw identifiers until one is not present in `registry`.
///
/// Collisions are retried silently, up to [`MAX_ID_ATTEMPTS`] draws.
pub fn generate_unique_id<G, R>(registry: &G, rng: &mut R) -> Result<GlycanId, G::Error>
where
    G: IdRegistry + ?Sized,
    G::Error: From<GlycanIdError>,
    R: Rng,
{
    for _ in 0..MAX_ID_ATTEMPTS {
        let candidate = GlycanId::random(rng);
        if !registry.contains(&candidate)? {
            return Ok(candidate);
        }
    }
    Err(GlycanIdError::Exhausted(MAX_ID_ATTEMPTS).into())
}
