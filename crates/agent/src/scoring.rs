use std::collections::HashMap;

/// Bag-of-tokens term counts.
pub type TermVector = HashMap<String, f64>;

pub fn term_vector(tokens: &[String]) -> TermVector {
    let mut v = TermVector::new();
    for t in tokens {
        *v.entry(t.clone()).or_insert(0.0) += 1.0;
    }
    v
}

fn norm(v: &TermVector) -> f64 {
    v.values().map(|x| x * x).sum::<f64>().sqrt()
}

/// Cosine similarity in `0.0..=1.0`; 0.0 when either vector is empty.
pub fn cosine_similarity(a: &TermVector, b: &TermVector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(term, x)| large.get(term).map(|y| x * y))
        .sum();
    let denom = norm(a) * norm(b);
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

/// Precomputed per-tool vector the query is compared against.
#[derive(Debug, Clone)]
pub struct Anchor {
    pub tool_name: String,
    pub vector: TermVector,
}

impl Anchor {
    pub fn new(tool_name: impl Into<String>, tokens: &[String]) -> Self {
        Self {
            tool_name: tool_name.into(),
            vector: term_vector(tokens),
        }
    }
}

/// Fallback scoring used when no tool pattern matched.
///
/// Selected per performance mode; returning `None` routes to the general
/// responder.
pub trait ScoringStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Best `(tool_name, score)` for the query's content tokens.
    fn best_match(&self, query_tokens: &[String], anchors: &[Anchor]) -> Option<(String, f64)>;
}

/// Pattern matching only: never routes on similarity.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternOnly;

impl ScoringStrategy for PatternOnly {
    fn name(&self) -> &'static str {
        "pattern_only"
    }

    fn best_match(&self, _query_tokens: &[String], _anchors: &[Anchor]) -> Option<(String, f64)> {
        None
    }
}

/// Cosine similarity against tool anchors with a fixed threshold.
#[derive(Debug, Clone, Copy)]
pub struct CosineSimilarity {
    threshold: f64,
}

impl CosineSimilarity {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl ScoringStrategy for CosineSimilarity {
    fn name(&self) -> &'static str {
        "cosine_similarity"
    }

    fn best_match(&self, query_tokens: &[String], anchors: &[Anchor]) -> Option<(String, f64)> {
        if query_tokens.is_empty() {
            return None;
        }
        let query = term_vector(query_tokens);

        // Strict comparison keeps the earliest-registered tool on ties.
        let mut best: Option<(&Anchor, f64)> = None;
        for anchor in anchors {
            let score = cosine_similarity(&query, &anchor.vector);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((anchor, score));
            }
        }

        best.filter(|(_, score)| *score > self.threshold)
            .map(|(anchor, score)| (anchor.tool_name.clone(), score))
    }
}
