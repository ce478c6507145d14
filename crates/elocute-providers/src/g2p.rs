//! Rule-based English grapheme-to-phoneme conversion.
//!
//! Greedy longest-match over spelling rules, producing IPA symbols from a
//! small General American inventory. Good enough to tell "think" from
//! "tink"; no attempt is made at stress or irregular spellings.

use elocute_core::error::PhoneticConversionError;
use elocute_core::traits::G2p;

/// Multi-letter spellings, longest first within each starting letter.
const DIGRAPHS: &[(&str, &[&str])] = &[
    ("tch", &["tʃ"]),
    ("igh", &["aɪ"]),
    ("sh", &["ʃ"]),
    ("ch", &["tʃ"]),
    ("th", &["θ"]),
    ("ng", &["ŋ"]),
    ("ph", &["f"]),
    ("ck", &["k"]),
    ("qu", &["k", "w"]),
    ("wh", &["w"]),
    ("ee", &["i"]),
    ("ea", &["i"]),
    ("oo", &["u"]),
    ("ou", &["aʊ"]),
    ("ow", &["aʊ"]),
    ("oa", &["oʊ"]),
    ("ai", &["eɪ"]),
    ("ay", &["eɪ"]),
    ("oi", &["ɔɪ"]),
    ("oy", &["ɔɪ"]),
    ("au", &["ɔ"]),
    ("aw", &["ɔ"]),
    ("er", &["ɚ"]),
    ("ir", &["ɚ"]),
    ("ur", &["ɚ"]),
    ("ar", &["ɑ", "r"]),
    ("or", &["ɔ", "r"]),
];

/// Voiced "th" in these function words.
const VOICED_TH: &[&str] = &["the", "this", "that", "these", "those", "they", "them", "then", "there", "than", "with"];

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

fn single(letters: &[char], i: usize) -> &'static [&'static str] {
    let next = letters.get(i + 1).copied();
    let softens = matches!(next, Some('e' | 'i' | 'y'));
    match letters[i] {
        'a' => &["æ"],
        'b' => &["b"],
        'c' if softens => &["s"],
        'c' => &["k"],
        'd' => &["d"],
        'e' => &["ɛ"],
        'f' => &["f"],
        'g' => &["g"],
        'h' => &["h"],
        'i' => &["ɪ"],
        'j' => &["dʒ"],
        'k' => &["k"],
        'l' => &["l"],
        'm' => &["m"],
        'n' if matches!(next, Some('k' | 'g')) => &["ŋ"],
        'n' => &["n"],
        'o' => &["ɑ"],
        'p' => &["p"],
        'q' => &["k"],
        'r' => &["r"],
        's' => &["s"],
        't' => &["t"],
        'u' => &["ʌ"],
        'v' => &["v"],
        'w' => &["w"],
        'x' => &["k", "s"],
        'y' if i == 0 => &["j"],
        'y' if i + 1 == letters.len() => &["i"],
        'y' => &["ɪ"],
        'z' => &["z"],
        _ => &[],
    }
}

/// Converts English spellings with ordered rewrite rules.
#[derive(Debug, Default, Clone)]
pub struct RuleBasedG2p;

impl RuleBasedG2p {
    pub fn new() -> Self {
        Self
    }

    fn convert(&self, word: &str) -> Vec<String> {
        let letters: Vec<char> = word.chars().collect();

        // Final silent 'e' ("make", "time") when another vowel precedes it.
        let mut end = letters.len();
        if end > 2
            && letters[end - 1] == 'e'
            && !is_vowel(letters[end - 2])
            && letters[..end - 2].iter().any(|&c| is_vowel(c))
        {
            end -= 1;
        }

        let mut out: Vec<String> = Vec::new();
        let mut i = 0;
        'outer: while i < end {
            for (spelling, phonemes) in DIGRAPHS {
                let len = spelling.chars().count();
                if i + len <= end && spelling.chars().eq(letters[i..i + len].iter().copied()) {
                    let voiced = *spelling == "th" && VOICED_TH.contains(&word);
                    if voiced {
                        out.push("ð".to_string());
                    } else {
                        out.extend(phonemes.iter().map(|p| p.to_string()));
                    }
                    i += len;
                    continue 'outer;
                }
            }

            let c = letters[i];
            // Doubled consonants are one sound.
            let doubled = i + 1 < end && letters[i + 1] == c && !is_vowel(c);
            out.extend(single(&letters, i).iter().map(|p| p.to_string()));
            i += if doubled { 2 } else { 1 };
        }
        out
    }
}

impl G2p for RuleBasedG2p {
    fn name(&self) -> &str {
        "rule-based-en"
    }

    fn to_phonemes(&self, word: &str, locale: &str) -> Result<Vec<String>, PhoneticConversionError> {
        if !locale.to_ascii_lowercase().starts_with("en") {
            return Err(PhoneticConversionError::Unavailable(format!(
                "no spelling rules for locale '{locale}'"
            )));
        }
        let word = word.trim().to_lowercase();
        if !word.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(PhoneticConversionError::Untranscribable { word });
        }
        Ok(self.convert(&word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ipa(word: &str) -> Vec<String> {
        RuleBasedG2p::new().to_phonemes(word, "en-US").unwrap()
    }

    #[test]
    fn digraphs() {
        assert_eq!(ipa("think"), vec!["θ", "ɪ", "ŋ", "k"]);
        assert_eq!(ipa("ship"), vec!["ʃ", "ɪ", "p"]);
        assert_eq!(ipa("watch"), vec!["w", "æ", "tʃ"]);
        assert_eq!(ipa("queen"), vec!["k", "w", "i", "n"]);
    }

    #[test]
    fn th_substitution_changes_first_phoneme() {
        let (a, b) = (ipa("think"), ipa("tink"));
        assert_eq!(a.len(), b.len());
        assert_ne!(a[0], b[0]);
        assert_eq!(a[1..], b[1..]);
    }

    #[test]
    fn voiced_th_in_function_words() {
        assert_eq!(ipa("the"), vec!["ð", "ɛ"]);
        assert_eq!(ipa("with"), vec!["w", "ɪ", "ð"]);
    }

    #[test]
    fn silent_final_e_and_doubled_consonants() {
        assert_eq!(ipa("make"), vec!["m", "æ", "k"]);
        assert_eq!(ipa("bell"), vec!["b", "ɛ", "l"]);
        assert_eq!(ipa("city"), vec!["s", "ɪ", "t", "i"]);
    }

    #[test]
    fn uppercase_is_accepted() {
        assert_eq!(ipa("Cat"), vec!["k", "æ", "t"]);
    }

    #[test]
    fn non_letters_are_untranscribable() {
        let err = RuleBasedG2p::new().to_phonemes("r2d2", "en-US").unwrap_err();
        assert!(matches!(err, PhoneticConversionError::Untranscribable { .. }));
        assert!(!err.is_fatal_for_stage());
    }

    #[test]
    fn other_locales_are_unavailable() {
        let err = RuleBasedG2p::new().to_phonemes("gato", "es-ES").unwrap_err();
        assert!(err.is_fatal_for_stage());
    }
}
