//! Synthetic context corpus generation.
//!
//! Benchmarks at large context sizes need prompts that actually occupy the
//! context window. Each named size maps to a fixed number of synthetic
//! documents of a fixed token budget; the documents are plausible English
//! technical prose with the occasional code block, so tokenizers see
//! realistic input rather than repeated filler.

use bench_core::BenchError;
use rand::seq::SliceRandom;
use rand::Rng;

/// Approximate characters per token for English technical prose.
const CHARS_PER_TOKEN: usize = 4;

/// Named context sizes: label, document count, tokens per document.
const CONTEXT_SIZES: &[(&str, u32, u32)] = &[
    ("8K", 4, 2000),
    ("32K", 10, 3200),
    ("64K", 20, 3200),
    ("128K", 40, 3200),
    ("196K", 61, 3200),
    ("200K", 63, 3200),
    ("256K", 80, 3200),
    ("360K", 112, 3200),
];

/// How much synthetic context a batch should carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSpec {
    /// Human-readable size label (e.g. "128K").
    pub label: String,
    /// Number of synthetic documents to generate.
    pub documents: u32,
    /// Target token budget per document.
    pub tokens_per_document: u32,
}

impl ContextSpec {
    /// Look up a named context size.
    ///
    /// # Errors
    /// Returns [`BenchError::UnsupportedContextSize`] for unknown labels.
    pub fn lookup(label: &str) -> Result<Self, BenchError> {
        let wanted = label.trim().to_ascii_uppercase();
        CONTEXT_SIZES
            .iter()
            .find(|(name, _, _)| *name == wanted)
            .map(|&(name, documents, tokens_per_document)| Self {
                label: name.to_string(),
                documents,
                tokens_per_document,
            })
            .ok_or_else(|| BenchError::UnsupportedContextSize {
                label: label.to_string(),
                supported: supported_labels().join(", "),
            })
    }

    /// Build a custom spec outside the named table.
    pub fn custom(label: impl Into<String>, documents: u32, tokens_per_document: u32) -> Self {
        Self {
            label: label.into(),
            documents,
            tokens_per_document,
        }
    }

    /// Approximate total token budget across all documents.
    pub fn total_tokens(&self) -> u64 {
        u64::from(self.documents) * u64::from(self.tokens_per_document)
    }
}

/// The labels accepted by [`ContextSpec::lookup`], in ascending size order.
pub fn supported_labels() -> Vec<&'static str> {
    CONTEXT_SIZES.iter().map(|(name, _, _)| *name).collect()
}

/// Estimate the token count of generated text.
pub fn estimate_tokens(text: &str) -> usize {
    text.len() / CHARS_PER_TOKEN
}

const TOPICS: &[&str] = &[
    "distributed consensus",
    "stream processing",
    "query planning",
    "cache coherence",
    "load shedding",
    "schema migration",
    "capacity forecasting",
    "incident response",
    "request routing",
    "data replication",
    "service discovery",
    "observability pipelines",
];

const TERMS: &[&str] = &[
    "throughput",
    "latency",
    "partition",
    "quorum",
    "checkpoint",
    "backpressure",
    "idempotency",
    "sharding",
    "compaction",
    "failover",
    "saturation",
    "batching",
    "snapshot",
    "replica",
    "watermark",
];

const VERBS: &[&str] = &[
    "degrades",
    "amortizes",
    "saturates",
    "propagates",
    "converges",
    "stabilizes",
    "regresses",
    "dominates",
];

/// Generate the full synthetic corpus for a spec, documents separated by
/// a header line so boundaries survive concatenation into one prompt.
pub fn generate_context(spec: &ContextSpec) -> String {
    let mut rng = rand::thread_rng();
    let mut corpus = String::with_capacity(
        spec.total_tokens() as usize * CHARS_PER_TOKEN + spec.documents as usize * 32,
    );

    for index in 0..spec.documents {
        corpus.push_str(&format!("=== Document {} ===\n\n", index + 1));
        corpus.push_str(&generate_document(&mut rng, spec.tokens_per_document));
        corpus.push('\n');
    }

    corpus
}

fn generate_document(rng: &mut impl Rng, token_budget: u32) -> String {
    let target_chars = token_budget as usize * CHARS_PER_TOKEN;
    let mut document = String::with_capacity(target_chars + 128);
    let mut section = 1;

    while document.len() < target_chars {
        let topic = TOPICS.choose(rng).copied().unwrap_or(TOPICS[0]);
        document.push_str(&format!("## Section {section}: Notes on {topic}\n\n"));

        let paragraphs = rng.gen_range(2..=4);
        for _ in 0..paragraphs {
            let sentences = rng.gen_range(3..=6);
            for _ in 0..sentences {
                document.push_str(&generate_sentence(rng, topic));
                document.push(' ');
            }
            document.push_str("\n\n");
        }

        // Roughly one section in four carries a code block.
        if rng.gen_bool(0.25) {
            document.push_str(&generate_code_block(rng));
        }

        section += 1;
    }

    document.truncate(target_chars);
    document
}

fn generate_sentence(rng: &mut impl Rng, topic: &str) -> String {
    let a = TERMS.choose(rng).copied().unwrap_or(TERMS[0]);
    let b = TERMS.choose(rng).copied().unwrap_or(TERMS[1]);
    let verb = VERBS.choose(rng).copied().unwrap_or(VERBS[0]);
    let percent = rng.gen_range(2..=95);

    match rng.gen_range(0..4) {
        0 => format!(
            "Under sustained load the {a} of the {topic} layer {verb} once {b} crosses roughly {percent} percent of provisioned capacity."
        ),
        1 => format!(
            "Measurements from the staging cluster show that {a} {verb} whenever {b} is rebalanced during {topic} maintenance windows."
        ),
        2 => format!(
            "The {topic} design trades {a} for {b}, which holds up until tail {a} {verb} near the {percent}th percentile."
        ),
        _ => format!(
            "Operators should watch {a} alongside {b}; in past {topic} incidents the former {verb} several minutes before alarms fired."
        ),
    }
}

fn generate_code_block(rng: &mut impl Rng) -> String {
    let name = TERMS.choose(rng).copied().unwrap_or(TERMS[0]);
    let threshold = rng.gen_range(10..=500);
    format!(
        "```\nfn check_{name}(current: u64) -> bool {{\n    current < {threshold}\n}}\n```\n\n"
    )
}
