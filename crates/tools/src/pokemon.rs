use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;
use taskroute_core::config::PokemonToolConfig;
use taskroute_core::{CapabilityDescriptor, Error, Result};
use tracing::{debug, warn};

use crate::CapabilityProvider;

pub const TOOL_NAME: &str = "pokemon_info";

/// Well-known species, doubling as classifier aliases.
const KNOWN_POKEMON: &[&str] = &[
    "pikachu", "charizard", "charmander", "bulbasaur", "squirtle", "jigglypuff",
    "mewtwo", "mew", "eevee", "snorlax", "gengar", "lucario", "gyarados",
    "dragonite", "psyduck", "meowth", "lapras", "ditto", "magikarp", "greninja",
];

/// Words that never name a species when guessing from free text.
const FILLER_WORDS: &[&str] = &[
    "a", "an", "the", "me", "about", "tell", "what", "whats", "is", "are", "who",
    "pokemon", "pokémon", "pokedex", "pokédex", "info", "information", "on", "of",
    "for", "show", "find", "look", "up", "give", "stats", "details", "please",
    "can", "you", "i", "want", "know", "to", "do", "does", "it", "its", "type",
    "types", "ability", "abilities", "and", "with", "my", "named", "called",
];

fn subject_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:about|pok[eé]mon|named|called)\s+([a-z][a-z0-9-]*)")
            .expect("static regex")
    })
}

/// Guess which species a free-text query is asking about.
pub fn extract_pokemon_name(query: &str) -> Option<String> {
    let lower = query.to_lowercase();
    let words: Vec<&str> = lower
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '-'))
        .filter(|w| !w.is_empty())
        .collect();

    if let Some(known) = words.iter().find(|w| KNOWN_POKEMON.contains(*w)) {
        return Some(known.to_string());
    }

    for cap in subject_regex().captures_iter(&lower) {
        let candidate = cap[1].trim_matches('-');
        if !candidate.is_empty() && !FILLER_WORDS.contains(&candidate) {
            return Some(candidate.to_string());
        }
    }

    words
        .iter()
        .rev()
        .find(|w| !FILLER_WORDS.contains(*w) && w.chars().all(|c| c.is_alphabetic() || c == '-'))
        .map(|w| w.to_string())
}

#[derive(Debug, Deserialize)]
struct NamedResource {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TypeSlot {
    #[serde(rename = "type")]
    kind: NamedResource,
}

#[derive(Debug, Deserialize)]
struct AbilitySlot {
    ability: NamedResource,
    #[serde(default)]
    is_hidden: bool,
}

#[derive(Debug, Deserialize)]
struct StatSlot {
    base_stat: u32,
    stat: NamedResource,
}

#[derive(Debug, Deserialize)]
pub struct PokemonData {
    id: u32,
    name: String,
    /// Decimetres.
    height: u32,
    /// Hectograms.
    weight: u32,
    #[serde(default)]
    types: Vec<TypeSlot>,
    #[serde(default)]
    abilities: Vec<AbilitySlot>,
    #[serde(default)]
    stats: Vec<StatSlot>,
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Render species data as a short paragraph.
pub fn format_summary(data: &PokemonData) -> String {
    let types = data
        .types
        .iter()
        .map(|t| capitalize(&t.kind.name))
        .collect::<Vec<_>>()
        .join("/");
    let abilities = data
        .abilities
        .iter()
        .map(|a| {
            if a.is_hidden {
                format!("{} (hidden)", a.ability.name)
            } else {
                a.ability.name.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    let stats = data
        .stats
        .iter()
        .map(|s| format!("{} {}", s.stat.name, s.base_stat))
        .collect::<Vec<_>>()
        .join(", ");

    let types = if types.is_empty() { "Unknown".to_string() } else { types };
    let article = if types.starts_with(['A', 'E', 'I', 'O', 'U']) { "an" } else { "a" };

    let mut out = format!(
        "{} (#{}) is {} {}-type Pokémon. Height: {:.1} m, weight: {:.1} kg.",
        capitalize(&data.name),
        data.id,
        article,
        types,
        data.height as f64 / 10.0,
        data.weight as f64 / 10.0,
    );
    if !abilities.is_empty() {
        out.push_str(&format!(" Abilities: {}.", abilities));
    }
    if !stats.is_empty() {
        out.push_str(&format!(" Base stats: {}.", stats));
    }
    out
}

/// Looks species up against PokéAPI.
pub struct PokemonInfoTool {
    client: Client,
    api_base: String,
    timeout: Duration,
}

impl PokemonInfoTool {
    pub fn new(config: &PokemonToolConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs.max(1));
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("taskroute/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Http(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    async fn fetch(&self, name: &str) -> Result<PokemonData> {
        let url = format!("{}/pokemon/{}", self.api_base, name);
        debug!(url = %url, "Fetching pokemon");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::execution(TOOL_NAME, format!("PokéAPI request failed: {}", e)))?;

        match resp.status() {
            StatusCode::NOT_FOUND => Err(Error::execution(
                TOOL_NAME,
                format!("Pokemon '{}' not found", name),
            )),
            status if !status.is_success() => {
                warn!(status = %status, pokemon = name, "PokéAPI returned an error status");
                Err(Error::execution(
                    TOOL_NAME,
                    format!("PokéAPI returned HTTP {}", status.as_u16()),
                ))
            }
            _ => resp.json::<PokemonData>().await.map_err(|e| {
                Error::execution(TOOL_NAME, format!("Malformed PokéAPI response: {}", e))
            }),
        }
    }
}

#[async_trait]
impl CapabilityProvider for PokemonInfoTool {
    fn descriptor(&self) -> CapabilityDescriptor {
        CapabilityDescriptor::new(
            TOOL_NAME,
            "Look up Pokémon species data: types, abilities, base stats, height and weight.",
        )
        .with_aliases(["pokemon", "pokémon", "pokedex", "pokédex"])
        .with_aliases(KNOWN_POKEMON.iter().copied())
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn execute(&self, query: &str) -> Result<String> {
        let name = extract_pokemon_name(query).ok_or_else(|| {
            Error::execution(TOOL_NAME, "Could not tell which Pokemon the question is about")
        })?;
        let data = self.fetch(&name).await?;
        Ok(format_summary(&data))
    }
}
