//! `SplitterSignal`: string in, list of spans out (spec.md §4.D).

use lilac_core::Span;

use crate::signal::{InputType, SignalMeta};

/// Splits a string into a list of non-overlapping spans. Never suspends.
pub trait SplitterSignal: SignalMeta {
    fn compute(&self, batch: &[String]) -> Vec<Vec<Span>>;
}

/// Splits on sentence-ending punctuation (`.`, `?`, `!`) followed by
/// whitespace. The reference implementation's default splitter used a
/// similar punctuation-boundary heuristic rather than a full NLP sentence
/// tokenizer; kept here for parity rather than pulling in a large tokenizer
/// dependency for a default that most datasets override.
pub struct SentenceSplitterSignal;

impl SignalMeta for SentenceSplitterSignal {
    fn name(&self) -> &str {
        "sentences"
    }

    fn input_type(&self) -> InputType {
        InputType::Text
    }

    fn fields(&self) -> lilac_core::Field {
        lilac_core::Field::repeated(lilac_core::Field::leaf(lilac_core::DType::Span))
    }
}

impl SplitterSignal for SentenceSplitterSignal {
    fn compute(&self, batch: &[String]) -> Vec<Vec<Span>> {
        batch.iter().map(|text| split_sentences(text)).collect()
    }
}

fn split_sentences(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut start = 0;
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if matches!(chars[i], '.' | '?' | '!') {
            let mut end = i + 1;
            while end < chars.len() && chars[end].is_whitespace() {
                end += 1;
            }
            if start < i + 1 {
                spans.push(Span::new(start, i + 1));
            }
            start = end;
            i = end;
        } else {
            i += 1;
        }
    }
    if start < chars.len() {
        spans.push(Span::new(start, chars.len()));
    }
    if spans.is_empty() && !chars.is_empty() {
        spans.push(Span::new(0, chars.len()));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_sentence_terminators() {
        let spans = split_sentences("Hello world. How are you?");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0], Span::new(0, 12));
    }

    #[test]
    fn bare_text_without_terminator_is_one_span() {
        let spans = split_sentences("no terminator here");
        assert_eq!(spans, vec![Span::new(0, 19)]);
    }
}
