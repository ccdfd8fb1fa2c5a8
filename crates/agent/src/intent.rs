use regex::Regex;
use taskroute_core::{CapabilityDescriptor, ClassificationResult, Error, Result};
use tracing::debug;

use crate::preprocess::TextPreprocessor;
use crate::scoring::{Anchor, ScoringStrategy};

/// Matching patterns for one provider.
struct ToolPatterns {
    tool_name: String,
    /// Word-bounded, case-insensitive, matched against the raw query.
    regexes: Vec<Regex>,
    /// Stemmed token phrases, matched as contiguous runs of query tokens.
    phrases: Vec<Vec<String>>,
}

impl ToolPatterns {
    fn matches(&self, raw: &str, tokens: &[String]) -> bool {
        self.regexes.iter().any(|re| re.is_match(raw))
            || self.phrases.iter().any(|p| contains_run(tokens, p))
    }
}

fn contains_run(haystack: &[String], needle: &[String]) -> bool {
    !needle.is_empty()
        && needle.len() <= haystack.len()
        && haystack.windows(needle.len()).any(|w| w == needle)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// `\b` only where the phrase edge is a word character; a boundary next to
/// punctuation would never match.
fn phrase_regex(phrase: &str) -> Result<Regex> {
    let lead = if phrase.chars().next().is_some_and(is_word_char) { r"\b" } else { "" };
    let tail = if phrase.chars().last().is_some_and(is_word_char) { r"\b" } else { "" };
    let pattern = format!("(?i){}{}{}", lead, regex::escape(phrase), tail);
    Regex::new(&pattern)
        .map_err(|e| Error::Internal(format!("Invalid pattern for '{}': {}", phrase, e)))
}

/// Per-provider patterns, resolved once when the provider is registered and
/// tested in registration order.
#[derive(Default)]
pub struct PatternRegistry {
    entries: Vec<ToolPatterns>,
    preprocessor: TextPreprocessor,
}

impl PatternRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_descriptors(descriptors: &[CapabilityDescriptor]) -> Result<Self> {
        let mut registry = Self::new();
        for d in descriptors {
            registry.register(d)?;
        }
        Ok(registry)
    }

    /// Build patterns from the provider's name variants and aliases.
    pub fn register(&mut self, descriptor: &CapabilityDescriptor) -> Result<()> {
        let mut sources: Vec<String> = Vec::new();
        for phrase in descriptor
            .name_phrases()
            .into_iter()
            .chain(descriptor.aliases.iter().cloned())
        {
            let phrase = phrase.trim().to_lowercase();
            if !phrase.is_empty() && !sources.contains(&phrase) {
                sources.push(phrase);
            }
        }

        let mut regexes = Vec::with_capacity(sources.len());
        let mut phrases: Vec<Vec<String>> = Vec::with_capacity(sources.len());
        for source in &sources {
            regexes.push(phrase_regex(source)?);
            let stemmed = self.preprocessor.preprocess(source);
            if !stemmed.is_empty() && !phrases.contains(&stemmed) {
                phrases.push(stemmed);
            }
        }

        debug!(
            tool = %descriptor.name,
            regexes = regexes.len(),
            phrases = phrases.len(),
            "Resolved tool patterns"
        );
        self.entries.push(ToolPatterns {
            tool_name: descriptor.name.clone(),
            regexes,
            phrases,
        });
        Ok(())
    }

    /// Name of the first provider, in registration order, with a matching pattern.
    pub fn first_match(&self, raw: &str, tokens: &[String]) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.matches(raw, tokens))
            .map(|e| e.tool_name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Routes a query to a provider or to the general responder.
///
/// Pattern matches always win. When none match, the caller-supplied scoring
/// strategy gets a chance against the per-provider anchor vectors. Pure and
/// synchronous: no I/O happens here.
pub struct IntentClassifier {
    patterns: PatternRegistry,
    anchors: Vec<Anchor>,
    preprocessor: TextPreprocessor,
}

impl IntentClassifier {
    pub fn new(descriptors: &[CapabilityDescriptor]) -> Result<Self> {
        let preprocessor = TextPreprocessor::new();
        let patterns = PatternRegistry::from_descriptors(descriptors)?;
        let anchors = descriptors
            .iter()
            .map(|d| {
                let mut text = d.name.clone();
                for alias in &d.aliases {
                    text.push(' ');
                    text.push_str(alias);
                }
                text.push(' ');
                text.push_str(&d.description);
                Anchor::new(d.name.clone(), &preprocessor.content_tokens(&text))
            })
            .collect();

        Ok(Self {
            patterns,
            anchors,
            preprocessor,
        })
    }

    pub fn classify(&self, text: &str, strategy: &dyn ScoringStrategy) -> ClassificationResult {
        let tokens = self.preprocessor.preprocess(text);

        if let Some(tool) = self.patterns.first_match(text, &tokens) {
            debug!(tool = %tool, "Pattern match");
            return ClassificationResult::tool(tool, 1.0);
        }

        let content = self.preprocessor.content_tokens(text);
        if let Some((tool, score)) = strategy.best_match(&content, &self.anchors) {
            debug!(tool = %tool, score, strategy = strategy.name(), "Similarity match");
            return ClassificationResult::tool(tool, score);
        }

        ClassificationResult::general()
    }

    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{CosineSimilarity, PatternOnly};
    use taskroute_core::Intent;

    fn pokemon() -> CapabilityDescriptor {
        CapabilityDescriptor::new(
            "pokemon_info",
            "Look up Pokemon species data: types, abilities, base stats, height and weight.",
        )
        .with_aliases(["pikachu", "pokedex"])
    }

    fn weather() -> CapabilityDescriptor {
        CapabilityDescriptor::new("weather", "Current conditions and forecasts for a city.")
            .with_aliases(["forecast", "pikachu"])
    }

    #[test]
    fn test_alias_routes_to_tool() {
        let c = IntentClassifier::new(&[pokemon()]).unwrap();
        let r = c.classify("Tell me about Pikachu", &PatternOnly);
        assert_eq!(r.intent, Intent::Tool);
        assert_eq!(r.tool_name.as_deref(), Some("pokemon_info"));
        assert_eq!(r.confidence, Some(1.0));
    }

    #[test]
    fn test_general_question() {
        let c = IntentClassifier::new(&[pokemon()]).unwrap();
        let r = c.classify("What is machine learning?", &PatternOnly);
        assert_eq!(r, ClassificationResult::general());
    }

    #[test]
    fn test_name_variants_match() {
        let c = IntentClassifier::new(&[pokemon()]).unwrap();
        assert!(c.classify("use pokemon_info for bulbasaur", &PatternOnly).is_tool());
        assert!(c.classify("Pokemon info on eevee", &PatternOnly).is_tool());
    }

    #[test]
    fn test_stemmed_phrase_match() {
        let c = IntentClassifier::new(&[pokemon()]).unwrap();
        // "pokedexes" stems to the alias stem but fails the word-bounded regex.
        assert!(c.classify("compare pokedexes", &PatternOnly).is_tool());
    }

    #[test]
    fn test_alias_requires_word_boundary() {
        let c = IntentClassifier::new(&[pokemon()]).unwrap();
        assert!(!c.classify("superpikachuman", &PatternOnly).is_tool());
    }

    #[test]
    fn test_registration_order_wins() {
        let c = IntentClassifier::new(&[weather(), pokemon()]).unwrap();
        let r = c.classify("pikachu", &PatternOnly);
        assert_eq!(r.tool_name.as_deref(), Some("weather"));

        let c = IntentClassifier::new(&[pokemon(), weather()]).unwrap();
        let r = c.classify("pikachu", &PatternOnly);
        assert_eq!(r.tool_name.as_deref(), Some("pokemon_info"));
    }

    #[test]
    fn test_similarity_fallback() {
        let c = IntentClassifier::new(&[pokemon()]).unwrap();
        let query = "Which abilities and base stats does that electric creature have?";

        assert!(!c.classify(query, &PatternOnly).is_tool());

        let r = c.classify(query, &CosineSimilarity::new(0.3));
        assert_eq!(r.tool_name.as_deref(), Some("pokemon_info"));
        let confidence = r.confidence.unwrap();
        assert!(confidence > 0.3 && confidence < 1.0);
    }

    #[test]
    fn test_similarity_below_threshold_is_general() {
        let c = IntentClassifier::new(&[pokemon()]).unwrap();
        let r = c.classify("What is machine learning?", &CosineSimilarity::new(0.3));
        assert_eq!(r.intent, Intent::General);
    }

    #[test]
    fn test_no_tools_is_general() {
        let c = IntentClassifier::new(&[]).unwrap();
        assert!(c.anchors().is_empty());
        assert!(!c.classify("pikachu", &CosineSimilarity::new(0.0)).is_tool());
    }

    #[test]
    fn test_pattern_registry_skips_duplicate_phrases() {
        let d = CapabilityDescriptor::new("pokedex", "x").with_aliases(["Pokedex", "pokedex "]);
        let reg = PatternRegistry::from_descriptors(&[d]).unwrap();
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.entries[0].regexes.len(), 1);
        assert_eq!(reg.entries[0].phrases.len(), 1);
    }

    #[test]
    fn test_punctuated_alias() {
        let d = CapabilityDescriptor::new("cpp_docs", "x").with_aliases(["c++"]);
        let c = IntentClassifier::new(&[d]).unwrap();
        assert!(c.classify("how do templates work in C++?", &PatternOnly).is_tool());
    }
}
