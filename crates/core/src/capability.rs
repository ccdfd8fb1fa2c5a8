use serde::{Deserialize, Serialize};

/// Declarative metadata for a capability provider.
///
/// Classification patterns and similarity anchors are derived from this once,
/// when the provider is registered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CapabilityDescriptor {
    /// Unique provider name, e.g. `pokemon_info`.
    pub name: String,
    /// Human readable description.
    pub description: String,
    /// Domain synonyms that route a query to this provider.
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl CapabilityDescriptor {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            aliases: Vec::new(),
        }
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Name variants usable as match phrases: the raw name and, for snake/kebab
    /// names, the space-separated form.
    pub fn name_phrases(&self) -> Vec<String> {
        let mut phrases = vec![self.name.clone()];
        let spaced = self.name.replace(['_', '-'], " ");
        if spaced != self.name {
            phrases.push(spaced);
        }
        phrases
    }
}
