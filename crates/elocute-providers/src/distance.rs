//! Articulatory-feature phonetic distance.
//!
//! Consonants are compared by place, manner and voicing; vowels by height,
//! backness and rounding. A consonant never resembles a vowel. The
//! resulting distances lie in `[0, 2]`, so with a penalty of 50 points per
//! unit a consonant/vowel swap scores 0 and a voicing slip scores 85.

use elocute_core::error::DistanceError;
use elocute_core::traits::PhoneticDistance;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Segment {
    /// place (0 bilabial .. 7 glottal), manner, voiced
    Consonant { place: u8, manner: Manner, voiced: bool },
    /// height (0 close .. 6 open), backness (0 front .. 2 back), rounded
    Vowel { height: u8, backness: u8, rounded: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Manner {
    Stop,
    Fricative,
    Affricate,
    Nasal,
    Lateral,
    Approximant,
}

use Manner::*;

const fn c(place: u8, manner: Manner, voiced: bool) -> Segment {
    Segment::Consonant { place, manner, voiced }
}

const fn v(height: u8, backness: u8, rounded: bool) -> Segment {
    Segment::Vowel { height, backness, rounded }
}

const INVENTORY: &[(&str, Segment)] = &[
    ("p", c(0, Stop, false)),
    ("b", c(0, Stop, true)),
    ("m", c(0, Nasal, true)),
    ("w", c(0, Approximant, true)),
    ("f", c(1, Fricative, false)),
    ("v", c(1, Fricative, true)),
    ("θ", c(2, Fricative, false)),
    ("ð", c(2, Fricative, true)),
    ("t", c(3, Stop, false)),
    ("d", c(3, Stop, true)),
    ("s", c(3, Fricative, false)),
    ("z", c(3, Fricative, true)),
    ("n", c(3, Nasal, true)),
    ("l", c(3, Lateral, true)),
    ("r", c(3, Approximant, true)),
    ("ʃ", c(4, Fricative, false)),
    ("ʒ", c(4, Fricative, true)),
    ("tʃ", c(4, Affricate, false)),
    ("dʒ", c(4, Affricate, true)),
    ("j", c(5, Approximant, true)),
    ("k", c(6, Stop, false)),
    ("g", c(6, Stop, true)),
    ("ŋ", c(6, Nasal, true)),
    ("h", c(7, Fricative, false)),
    ("i", v(0, 0, false)),
    ("ɪ", v(1, 0, false)),
    ("eɪ", v(2, 0, false)),
    ("ɛ", v(4, 0, false)),
    ("æ", v(5, 0, false)),
    ("aɪ", v(6, 0, false)),
    ("aʊ", v(6, 1, false)),
    ("ə", v(3, 1, false)),
    ("ɚ", v(3, 1, false)),
    ("ʌ", v(4, 1, false)),
    ("u", v(0, 2, true)),
    ("ʊ", v(1, 2, true)),
    ("oʊ", v(2, 2, true)),
    ("ɔ", v(4, 2, true)),
    ("ɔɪ", v(4, 2, true)),
    ("ɑ", v(6, 2, false)),
];

/// Distance between a consonant and a vowel.
const CLASS_DISTANCE: f64 = 2.0;

/// Weighted articulatory-feature distance over a fixed IPA inventory.
#[derive(Debug, Clone)]
pub struct FeatureDistance {
    pub place_weight: f64,
    pub manner_weight: f64,
    pub voicing_weight: f64,
    pub height_weight: f64,
    pub backness_weight: f64,
    pub rounding_weight: f64,
}

impl Default for FeatureDistance {
    fn default() -> Self {
        Self {
            place_weight: 0.6,
            manner_weight: 0.6,
            voicing_weight: 0.3,
            height_weight: 0.8,
            backness_weight: 0.6,
            rounding_weight: 0.2,
        }
    }
}

fn lookup(symbol: &str) -> Result<Segment, DistanceError> {
    INVENTORY
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, seg)| *seg)
        .ok_or_else(|| DistanceError::UnknownSegment(symbol.to_string()))
}

impl FeatureDistance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the symbol is in the inventory.
    pub fn knows(symbol: &str) -> bool {
        lookup(symbol).is_ok()
    }
}

impl PhoneticDistance for FeatureDistance {
    fn distance(&self, a: &str, b: &str) -> Result<f64, DistanceError> {
        let (sa, sb) = (lookup(a)?, lookup(b)?);
        if a == b {
            return Ok(0.0);
        }
        let d = match (sa, sb) {
            (
                Segment::Consonant { place: p1, manner: m1, voiced: v1 },
                Segment::Consonant { place: p2, manner: m2, voiced: v2 },
            ) => {
                let place = f64::from(p1.abs_diff(p2).min(4)) / 4.0;
                self.place_weight * place
                    + if m1 != m2 { self.manner_weight } else { 0.0 }
                    + if v1 != v2 { self.voicing_weight } else { 0.0 }
            }
            (
                Segment::Vowel { height: h1, backness: b1, rounded: r1 },
                Segment::Vowel { height: h2, backness: b2, rounded: r2 },
            ) => {
                self.height_weight * f64::from(h1.abs_diff(h2)) / 6.0
                    + self.backness_weight * f64::from(b1.abs_diff(b2)) / 2.0
                    + if r1 != r2 { self.rounding_weight } else { 0.0 }
            }
            _ => CLASS_DISTANCE,
        };
        // Distinct symbols with identical features still differ a little.
        Ok(d.max(0.1))
    }
}
