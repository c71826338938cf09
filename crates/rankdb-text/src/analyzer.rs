use serde::{Deserialize, Serialize};
use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer, TokenStream};

pub const ENGLISH_STOP_WORDS: &[&str] = &[
	"a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is",
	"it", "its", "of", "on", "that", "the", "to", "was", "will", "with", "or", "but", "not",
	"this", "these", "they", "them", "their", "there", "then", "than", "so", "if", "when",
	"where", "why", "how", "what", "which", "who", "whom", "whose", "can", "could", "should",
	"would", "may", "might", "must", "shall", "do", "does", "did", "have", "had", "having",
];

/// How raw text is cut into terms. Persisted with the vectorizer so queries
/// are analyzed exactly like the corpus was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
	pub stop_words: bool,
	/// Shorter tokens are dropped.
	pub min_token_chars: usize,
}

impl Default for AnalyzerConfig {
	fn default() -> Self {
		Self { stop_words: false, min_token_chars: 2 }
	}
}

#[derive(Clone)]
pub struct Analyzer {
	config: AnalyzerConfig,
	inner: TextAnalyzer,
}

impl Analyzer {
	pub fn new(config: AnalyzerConfig) -> Self {
		let builder = TextAnalyzer::builder(SimpleTokenizer::default()).filter(LowerCaser);
		let inner = if config.stop_words {
			let stop_words = ENGLISH_STOP_WORDS.iter().map(|s| s.to_string());
			builder.filter(StopWordFilter::remove(stop_words)).build()
		} else {
			builder.build()
		};
		Self { config, inner }
	}

	pub fn config(&self) -> AnalyzerConfig {
		self.config
	}

	/// Lowercased terms of `text` in order of appearance, repeats kept.
	pub fn tokenize(&self, text: &str) -> Vec<String> {
		let mut analyzer = self.inner.clone();
		let mut stream = analyzer.token_stream(text);
		let mut terms = Vec::new();
		while stream.advance() {
			let term = &stream.token().text;
			if term.chars().count() >= self.config.min_token_chars {
				terms.push(term.clone());
			}
		}
		terms
	}
}

impl std::fmt::Debug for Analyzer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Analyzer").field("config", &self.config).finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lowercases_and_drops_single_chars() {
		let analyzer = Analyzer::new(AnalyzerConfig::default());
		assert_eq!(
			analyzer.tokenize("A Mid-Century armchair, 2 seats"),
			vec!["mid", "century", "armchair", "seats"]
		);
	}

	#[test]
	fn stop_words_are_optional() {
		let text = "the chair and the desk";
		let plain = Analyzer::new(AnalyzerConfig::default());
		let filtered = Analyzer::new(AnalyzerConfig { stop_words: true, min_token_chars: 2 });
		assert_eq!(plain.tokenize(text).len(), 5);
		assert_eq!(filtered.tokenize(text), vec!["chair", "desk"]);
	}
}
