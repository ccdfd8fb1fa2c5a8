use regex::Regex;
use std::sync::OnceLock;
use taskroute_core::{Error, Result, ToolInfo};

use crate::preprocess::TextPreprocessor;

/// Anything shorter is a composition bug, not an answer.
pub const MIN_RESPONSE_CHARS: usize = 20;

const GREETINGS: &[&str] = &["hi", "hello", "hey", "greetings", "howdy", "hiya", "yo"];
const GREETING_PHRASES: &[&str] = &["good morning", "good afternoon", "good evening"];
const CAPABILITY_WORDS: &[&str] = &["help", "capabilities", "capable", "abilities"];
const CAPABILITY_PHRASES: &[&str] = &[
    "what can you do",
    "what do you do",
    "who are you",
    "what are you",
    "how do you work",
];

fn definition_regexes() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        vec![
            Regex::new(r"^(?:what|who)\s+(?:is|are|was|were)\s+(?:an?\s+|the\s+)?(.+?)[\s?.!]*$").unwrap(),
            Regex::new(r"^(?:define|explain|describe)\s+(?:an?\s+|the\s+)?(.+?)[\s?.!]*$").unwrap(),
            Regex::new(r"^what\s+does\s+(?:an?\s+|the\s+)?(.+?)\s+mean[\s?.!]*$").unwrap(),
        ]
    })
}

/// Coarse topic bucket for a query no tool claimed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topic {
    Greeting,
    Capability,
    Definition { subject: String },
    Fallback,
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

/// Built-in answerer for `General` intents.
///
/// Picks a topic bucket from token presence and renders a parameterized
/// sentence, then appends elaborations while the word budget allows.
pub struct GeneralResponder {
    tools: Vec<ToolInfo>,
    preprocessor: TextPreprocessor,
}

impl GeneralResponder {
    pub fn new(tools: Vec<ToolInfo>) -> Self {
        Self {
            tools,
            preprocessor: TextPreprocessor::new(),
        }
    }

    pub fn detect_topic(&self, query: &str) -> Topic {
        let normalized = self.preprocessor.normalize(query);
        let words = self.preprocessor.tokenize(&normalized);

        let greeted = words.first().is_some_and(|w| GREETINGS.contains(&w.as_str()))
            || GREETING_PHRASES.iter().any(|p| normalized.starts_with(p));
        if greeted {
            return Topic::Greeting;
        }

        if words.iter().any(|w| CAPABILITY_WORDS.contains(&w.as_str()))
            || CAPABILITY_PHRASES.iter().any(|p| normalized.contains(p))
        {
            return Topic::Capability;
        }

        for re in definition_regexes() {
            if let Some(cap) = re.captures(&normalized) {
                let subject = cap[1].trim().to_string();
                if !subject.is_empty() {
                    return Topic::Definition { subject };
                }
            }
        }

        Topic::Fallback
    }

    fn tool_summary(&self) -> String {
        if self.tools.is_empty() {
            return "No tools are registered right now, so every answer is a general one."
                .to_string();
        }
        let listed = self
            .tools
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        format!("Available tools: {}.", listed)
    }

    fn compose(&self, topic: &Topic, query: &str) -> (String, Vec<String>) {
        match topic {
            Topic::Greeting => (
                "Hello! I can answer general questions or hand your request to a specialised tool."
                    .to_string(),
                vec![
                    self.tool_summary(),
                    "Mention what a tool covers and the request is routed to it automatically."
                        .to_string(),
                    "Anything else gets a short general answer like this one.".to_string(),
                ],
            ),
            Topic::Capability => {
                let mut more: Vec<String> = self
                    .tools
                    .iter()
                    .map(|t| format!("{}: {}", t.name, t.description))
                    .collect();
                if more.is_empty() {
                    more.push(self.tool_summary());
                }
                more.push(
                    "Performance modes trade answer depth and matching effort for speed."
                        .to_string(),
                );
                (
                    "I route each request to a matching tool, or answer it myself in general terms."
                        .to_string(),
                    more,
                )
            }
            Topic::Definition { subject } => (
                format!(
                    "{} is a topic I can only answer in general terms, since none of my tools cover it.",
                    capitalize(subject)
                ),
                vec![
                    format!(
                        "For a precise definition of {}, a reference work or domain expert is the better source.",
                        subject
                    ),
                    "Rephrase the question around one of my tools if you need specific data."
                        .to_string(),
                    self.tool_summary(),
                ],
            ),
            Topic::Fallback => {
                let mut more = Vec::new();
                let keywords = self.preprocessor.content_keywords(query, 5);
                if !keywords.is_empty() {
                    more.push(format!("Key terms I picked up: {}.", keywords.join(", ")));
                }
                more.push("Try a more specific question, or name the subject directly.".to_string());
                more.push(self.tool_summary());
                (
                    "I could not match your request to a specific tool, so here is a general answer."
                        .to_string(),
                    more,
                )
            }
        }
    }

    /// Render a response of at most `max_words` words, or of the few base
    /// words needed to reach `MIN_RESPONSE_CHARS`.
    pub fn respond(&self, query: &str, max_words: usize) -> Result<String> {
        let topic = self.detect_topic(query);
        let (base, elaborations) = self.compose(&topic, query);

        // The base sentence is cut to the budget but never below the floor.
        let mut out = String::new();
        let mut used = 0;
        for word in base.split_whitespace() {
            if used >= max_words && out.chars().count() >= MIN_RESPONSE_CHARS {
                break;
            }
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(word);
            used += 1;
        }

        for extra in elaborations {
            let n = word_count(&extra);
            if used + n > max_words {
                break;
            }
            out.push(' ');
            out.push_str(&extra);
            used += n;
        }

        if out.chars().count() < MIN_RESPONSE_CHARS {
            return Err(Error::Internal(format!(
                "general response too short ({} chars) for topic {:?}",
                out.chars().count(),
                topic
            )));
        }
        Ok(out)
    }
}
