//! Text normalization: deterministic cleanup of OCR output and LLM replies.
//!
//! OCR text arrives noisy — stray markup, bracketed artefacts, mixed
//! width forms in Japanese — and the same cleanup is applied to the LLM's
//! reply before display, so both ends of the pipeline share one function.
//!
//! ## Rule Order
//!
//! Rules must run in this specific order: the `&` substitution happens
//! before folding so the substituted word is subject to stop-word removal;
//! markup stripping runs before tokenisation so a stop-word uncovered by
//! stripping (e.g. `the[note]` → `the`) is still filtered; tokenising on
//! whitespace and rejoining collapses the gaps stripping leaves behind.
//! This ordering makes the function idempotent — normalizing
//! already-normalized text returns it unchanged.

use crate::config::Language;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<.*?>").unwrap());
static RE_BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[.*?\]").unwrap());
static RE_PARENTHESIZED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(.*?\)").unwrap());

/// Stop-words excluded from normalized text, keyed by language.
///
/// Unknown languages get an empty list: no filtering.
pub fn stop_words(language: Language) -> &'static [&'static str] {
    match language {
        Language::En => &["the", "and", "is", "in", "on", "at"],
        Language::Ja => &["の", "と", "です", "ます"],
        Language::Other => &[],
    }
}

/// Normalize raw text for the given language.
///
/// Steps, applied in sequence:
/// 1. Replace literal `&` with `and`
/// 2. Language-specific folding: lower-casing for English, NFKC
///    (full/half-width and kana canonicalization) for Japanese, no-op
///    otherwise
/// 3. Strip HTML-tag-like substrings
/// 4. Strip `[bracketed]` substrings
/// 5. Strip `(parenthesized)` substrings
/// 6. Split on whitespace, drop stop-word tokens, rejoin with single
///    spaces (this also collapses the gaps left by stripping)
///
/// Pure function: deterministic given `(text, language)`, and idempotent.
pub fn normalize(text: &str, language: Language) -> String {
    let text = text.replace('&', "and");

    let text = match language {
        Language::En => text.to_lowercase(),
        Language::Ja => text.nfkc().collect::<String>(),
        Language::Other => text,
    };

    let text = RE_TAG.replace_all(&text, "");
    let text = RE_BRACKETED.replace_all(&text, "");
    let text = RE_PARENTHESIZED.replace_all(&text, "");

    let stops = stop_words(language);
    text.split_whitespace()
        .filter(|token| !stops.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_full_pipeline() {
        assert_eq!(
            normalize("The <b>fox</b> jumps (quickly) [note]", Language::En),
            "fox jumps"
        );
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize("The <b>fox</b> jumps (quickly) [note]", Language::En);
        assert_eq!(normalize(&once, Language::En), once);

        let ja_once = normalize("ｲﾇの写真　と　ﾒﾓ", Language::Ja);
        assert_eq!(normalize(&ja_once, Language::Ja), ja_once);
    }

    #[test]
    fn stop_word_uncovered_by_stripping_is_still_filtered() {
        // Stripping runs before tokenisation, so "the[note]" reduces to a
        // bare stop-word and is removed in the same pass.
        assert_eq!(normalize("fox the[note] jumps", Language::En), "fox jumps");
    }

    #[test]
    fn ampersand_becomes_and_then_drops_as_stop_word() {
        // "&" → "and", which is an English stop-word.
        assert_eq!(normalize("salt & pepper", Language::En), "salt pepper");
    }

    #[test]
    fn ampersand_survives_in_unlisted_languages() {
        assert_eq!(normalize("Salz & Pfeffer", Language::Other), "Salz and Pfeffer");
    }

    #[test]
    fn english_stop_words_match_after_folding() {
        // "The" folds to "the" before the stop-word check.
        assert_eq!(normalize("The Quick Fox", Language::En), "quick fox");
    }

    #[test]
    fn japanese_nfkc_folds_width_and_kana() {
        // Half-width katakana and full-width digits canonicalize.
        assert_eq!(normalize("ﾃｽﾄ　１２３", Language::Ja), "テスト 123");
    }

    #[test]
    fn japanese_stop_words_removed() {
        assert_eq!(normalize("犬 の 写真", Language::Ja), "犬 写真");
    }

    #[test]
    fn unknown_language_skips_folding_and_filtering() {
        assert_eq!(normalize("The Fox", Language::Other), "The Fox");
    }

    #[test]
    fn strips_tags_brackets_and_parens() {
        assert_eq!(
            normalize("a <i>b</i> [c] (d) e", Language::Other),
            "a b e"
        );
    }

    #[test]
    fn empty_and_whitespace_only_inputs() {
        assert_eq!(normalize("", Language::En), "");
        assert_eq!(normalize("   \n\t ", Language::En), "");
        assert_eq!(normalize("the and is", Language::En), "");
    }
}
