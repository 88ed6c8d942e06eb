use std::fmt;
use std::str::FromStr;

use nom::character::complete::{digit1, one_of};
use nom::combinator::{all_consuming, map_res};
use nom::multi::many0;
use nom::sequence::pair;
use nom::IResult;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Monosaccharide units tracked in a composition, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Monosaccharide {
    Hexose,
    HexNAc,
    Fucose,
    Phosphate,
    Sulphate,
    GlcA,
    Neu5Gc,
    Neu5Ac,
    Neu5AcEthylEster,
    Neu5AcMethylAmide,
}

impl Monosaccharide {
    /// Canonical encoding order: H, N, F, P, T, A, G, S, E, M.
    pub const ALL: [Monosaccharide; 10] = [
        Monosaccharide::Hexose,
        Monosaccharide::HexNAc,
        Monosaccharide::Fucose,
        Monosaccharide::Phosphate,
        Monosaccharide::Sulphate,
        Monosaccharide::GlcA,
        Monosaccharide::Neu5Gc,
        Monosaccharide::Neu5Ac,
        Monosaccharide::Neu5AcEthylEster,
        Monosaccharide::Neu5AcMethylAmide,
    ];

    pub fn letter(&self) -> char {
        match self {
            Monosaccharide::Hexose => 'H',
            Monosaccharide::HexNAc => 'N',
            Monosaccharide::Fucose => 'F',
            Monosaccharide::Phosphate => 'P',
            Monosaccharide::Sulphate => 'T',
            Monosaccharide::GlcA => 'A',
            Monosaccharide::Neu5Gc => 'G',
            Monosaccharide::Neu5Ac => 'S',
            Monosaccharide::Neu5AcEthylEster => 'E',
            Monosaccharide::Neu5AcMethylAmide => 'M',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.letter() == letter)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Monosaccharide::Hexose => "Hexose (Glc, Gal, Man)",
            Monosaccharide::HexNAc => "N-acetylhexosamine (GlcNAc, GalNAc)",
            Monosaccharide::Fucose => "Fucose",
            Monosaccharide::Phosphate => "Phosphate",
            Monosaccharide::Sulphate => "Sulphate",
            Monosaccharide::GlcA => "Glucuronic acid",
            Monosaccharide::Neu5Gc => "Neu5Gc",
            Monosaccharide::Neu5Ac => "Neu5Ac",
            Monosaccharide::Neu5AcEthylEster => "Neu5Ac (ethyl esterified)",
            Monosaccharide::Neu5AcMethylAmide => "Neu5Ac (methyl amidated)",
        }
    }

    /// Position in the canonical order.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionParseError {
    #[error("Invalid composition syntax: {0}")]
    Syntax(String),
    #[error("Unit '{0}' is repeated or out of canonical order")]
    OutOfOrder(char),
    #[error("Unit '{0}' has a zero count")]
    ZeroCount(char),
}

/// Monosaccharide unit tallies of a glycan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Composition {
    /// Hexose
    #[serde(default)]
    pub h: u32,
    /// N-acetylhexosamine
    #[serde(default)]
    pub n: u32,
    /// Fucose
    #[serde(default)]
    pub f: u32,
    /// Phosphate
    #[serde(default)]
    pub p: u32,
    /// Sulphate
    #[serde(default)]
    pub t: u32,
    /// GlcA
    #[serde(default)]
    pub a: u32,
    /// Neu5Gc
    #[serde(default)]
    pub g: u32,
    /// Neu5Ac
    #[serde(default)]
    pub s: u32,
    /// Neu5Ac, ethyl esterified
    #[serde(default)]
    pub e: u32,
    /// Neu5Ac, methyl amidated
    #[serde(default)]
    pub m: u32,
}

impl Composition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from counts given in canonical order.
    pub fn from_counts(counts: [u32; 10]) -> Self {
        let [h, n, f, p, t, a, g, s, e, m] = counts;
        Self { h, n, f, p, t, a, g, s, e, m }
    }

    pub fn counts(&self) -> [u32; 10] {
        [
            self.h, self.n, self.f, self.p, self.t, self.a, self.g, self.s, self.e, self.m,
        ]
    }

    pub fn count(&self, unit: Monosaccharide) -> u32 {
        self.counts()[unit.index()]
    }

    pub fn set(&mut self, unit: Monosaccharide, count: u32) {
        let slot = match unit {
            Monosaccharide::Hexose => &mut self.h,
            Monosaccharide::HexNAc => &mut self.n,
            Monosaccharide::Fucose => &mut self.f,
            Monosaccharide::Phosphate => &mut self.p,
            Monosaccharide::Sulphate => &mut self.t,
            Monosaccharide::GlcA => &mut self.a,
            Monosaccharide::Neu5Gc => &mut self.g,
            Monosaccharide::Neu5Ac => &mut self.s,
            Monosaccharide::Neu5AcEthylEster => &mut self.e,
            Monosaccharide::Neu5AcMethylAmide => &mut self.m,
        };
        *slot = count;
    }

    /// Builder-style variant of [`Composition::set`].
    pub fn with(mut self, unit: Monosaccharide, count: u32) -> Self {
        self.set(unit, count);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.counts().iter().all(|&c| c == 0)
    }

    pub fn total_units(&self) -> u64 {
        self.counts().iter().map(|&c| u64::from(c)).sum()
    }

    /// Encode as the canonical composition string, e.g. `H5N4F1`.
    ///
    /// Every unit with a positive count contributes `<letter><count>` in
    /// canonical order; zero counts are omitted. All-zero encodes as "".
    pub fn encode(&self) -> String {
        let mut out = String::new();
        for unit in Monosaccharide::ALL {
            let count = self.count(unit);
            if count > 0 {
                out.push(unit.letter());
                out.push_str(&count.to_string());
            }
        }
        out
    }
}

impl fmt::Display for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

fn unit_token(input: &str) -> IResult<&str, (char, u32)> {
    pair(one_of("HNFPTAGSEM"), map_res(digit1, str::parse::<u32>))(input)
}

impl FromStr for Composition {
    type Err = CompositionParseError;

    /// Parse a canonical composition string back into counts.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let (_, tokens) = all_consuming(many0(unit_token))(input)
            .map_err(|_| CompositionParseError::Syntax(input.to_string()))?;

        let mut composition = Composition::new();
        let mut next_index = 0usize;
        for (letter, count) in tokens {
            // one_of above only admits the ten unit letters
            let unit = Monosaccharide::from_letter(letter)
                .ok_or_else(|| CompositionParseError::Syntax(input.to_string()))?;
            if unit.index() < next_index {
                return Err(CompositionParseError::OutOfOrder(letter));
            }
            if count == 0 {
                return Err(CompositionParseError::ZeroCount(letter));
            }
            composition.set(unit, count);
            next_index = unit.index() + 1;
        }
        Ok(composition)
    }
}

/// A persisted composition together with its cached composition string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionRecord {
    pub id: i64,
    pub composition: Composition,
    pub composition_string: String,
}

impl CompositionRecord {
    pub fn new(id: i64, composition: Composition) -> Self {
        Self {
            id,
            composition_string: composition.encode(),
            composition,
        }
    }
}

impl fmt::Display for CompositionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.composition_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encode_known_composition() {
        let comp = Composition::new()
            .with(Monosaccharide::Hexose, 2)
            .with(Monosaccharide::Neu5Ac, 1);
        assert_eq!(comp.encode(), "H2S1");
    }

    #[test]
    fn test_encode_all_zero_is_empty() {
        assert_eq!(Composition::new().encode(), "");
        assert!(Composition::new().is_empty());
    }

    #[test]
    fn test_encode_all_units_in_canonical_order() {
        let comp = Composition::from_counts([1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        assert_eq!(comp.encode(), "H1N2F3P4T5A6G7S8E9M10");
    }

    #[test]
    fn test_encode_token_present_iff_positive() {
        // Walk every single-unit-missing variant
        for missing in Monosaccharide::ALL {
            let mut comp = Composition::from_counts([3; 10]);
            comp.set(missing, 0);
            let encoded = comp.encode();
            for unit in Monosaccharide::ALL {
                let token = format!("{}3", unit.letter());
                assert_eq!(
                    encoded.contains(&token),
                    unit != missing,
                    "token {} in {}",
                    token,
                    encoded
                );
            }
        }
    }

    #[test]
    fn test_encode_multi_digit_counts() {
        let comp = Composition::new()
            .with(Monosaccharide::Hexose, 12)
            .with(Monosaccharide::Neu5AcMethylAmide, 100);
        assert_eq!(comp.to_string(), "H12M100");
    }

    #[test]
    fn test_encode_is_stable() {
        let comp = Composition::from_counts([5, 4, 1, 0, 0, 0, 0, 2, 0, 0]);
        assert_eq!(comp.encode(), comp.encode());
        assert_eq!(comp.encode(), "H5N4F1S2");
    }

    #[test]
    fn test_parse_canonical_string() {
        let comp: Composition = "H5N4F1S2".parse().unwrap();
        assert_eq!(comp, Composition::from_counts([5, 4, 1, 0, 0, 0, 0, 2, 0, 0]));
    }

    #[test]
    fn test_parse_empty_is_all_zero() {
        let comp: Composition = "".parse().unwrap();
        assert!(comp.is_empty());
    }

    #[test]
    fn test_parse_rejects_out_of_order() {
        assert_eq!(
            "N4H5".parse::<Composition>(),
            Err(CompositionParseError::OutOfOrder('H'))
        );
        assert_eq!(
            "H1H2".parse::<Composition>(),
            Err(CompositionParseError::OutOfOrder('H'))
        );
    }

    #[test]
    fn test_parse_rejects_zero_and_garbage() {
        assert_eq!(
            "H0N2".parse::<Composition>(),
            Err(CompositionParseError::ZeroCount('H'))
        );
        assert!(matches!(
            "H2X3".parse::<Composition>(),
            Err(CompositionParseError::Syntax(_))
        ));
        assert!(matches!(
            "H".parse::<Composition>(),
            Err(CompositionParseError::Syntax(_))
        ));
    }

    #[test]
    fn test_record_caches_encoding() {
        let record = CompositionRecord::new(7, Composition::new().with(Monosaccharide::HexNAc, 3));
        assert_eq!(record.composition_string, "N3");
        assert_eq!(record.to_string(), "N3");
    }

    #[test]
    fn test_letters_round_trip() {
        for unit in Monosaccharide::ALL {
            assert_eq!(Monosaccharide::from_letter(unit.letter()), Some(unit));
        }
        assert_eq!(Monosaccharide::from_letter('X'), None);
    }
}
