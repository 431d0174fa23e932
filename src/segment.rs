// src/segment.rs
//! Word segmentation used by the tokenized fallback of keyword matching.
//!
//! Feed text is mixed-script (Latin words next to Han runs without spaces), so
//! whitespace splitting is not enough. [`WordSegmenter`] keeps Latin/digit words
//! whole and cuts CJK runs into overlapping character bigrams. Any other
//! segmenter can be plugged in through the [`Segmenter`] trait, including a
//! plain closure.

use once_cell::sync::Lazy;
use regex::Regex;

/// Capability: split text into word units.
pub trait Segmenter: Send + Sync {
    fn segment(&self, text: &str) -> Vec<String>;
}

impl<F> Segmenter for F
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    fn segment(&self, text: &str) -> Vec<String> {
        self(text)
    }
}

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?u)\w+").expect("word regex"));

/// Basic, Unicode-friendly tokenizer: maximal runs of word characters.
pub fn tokenize(input: &str) -> Vec<&str> {
    WORD_RE.find_iter(input).map(|m| m.as_str()).collect()
}

/// Han, kana, hangul and compatibility ideographs.
pub fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{30FF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{4E00}'..='\u{9FFF}'
        | '\u{AC00}'..='\u{D7AF}'
        | '\u{F900}'..='\u{FAFF}'
    )
}

/// Default mixed-script segmenter.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordSegmenter;

impl WordSegmenter {
    fn push_cjk_run(run: &[char], out: &mut Vec<String>) {
        match run.len() {
            0 => {}
            1 => out.push(run[0].to_string()),
            _ => out.extend(run.windows(2).map(|w| w.iter().collect::<String>())),
        }
    }
}

impl Segmenter for WordSegmenter {
    fn segment(&self, text: &str) -> Vec<String> {
        let mut out = Vec::new();
        for tok in tokenize(text) {
            if !tok.chars().any(is_cjk) {
                out.push(tok.to_string());
                continue;
            }
            // Split the word into script runs: Latin stays whole, CJK becomes bigrams.
            let mut cjk: Vec<char> = Vec::new();
            let mut other = String::new();
            for c in tok.chars() {
                if is_cjk(c) {
                    if !other.is_empty() {
                        out.push(std::mem::take(&mut other));
                    }
                    cjk.push(c);
                } else {
                    Self::push_cjk_run(&cjk, &mut out);
                    cjk.clear();
                    other.push(c);
                }
            }
            Self::push_cjk_run(&cjk, &mut out);
            if !other.is_empty() {
                out.push(other);
            }
        }
        out
    }
}

/// Whitespace splitter, for corpora that are space-delimited.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceSegmenter;

impl Segmenter for WhitespaceSegmenter {
    fn segment(&self, text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }
}
