//! Shared normalization helpers.
//!
//! Every provider module exposes a pure `normalize(Value) -> Result<CatalogEntry, _>`
//! function built from these pieces. Nothing here performs I/O.

use agora_core::{epoch, CatalogEntry, NormalizationError, Timestamp, UNKNOWN};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A provider's record normalizer.
pub type NormalizeFn = fn(Value) -> Result<CatalogEntry, NormalizationError>;

/// Host prefixes stripped by [`canonical_id`].
const HOST_PREFIXES: &[&str] = &[
    "github.com/",
    "gitlab.com/",
    "huggingface.co/datasets/",
    "huggingface.co/",
    "www.kaggle.com/datasets/",
    "kaggle.com/datasets/",
    "www.kaggle.com/",
    "kaggle.com/",
    "replicate.com/",
];

/// Normalize every record, dropping (and logging) those that fail.
pub fn normalize_batch(
    provider: &str,
    records: Vec<Value>,
    normalize: NormalizeFn,
) -> Vec<CatalogEntry> {
    let total = records.len();
    let entries: Vec<CatalogEntry> = records
        .into_iter()
        .filter_map(|record| match normalize(record) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(source = provider, error = %e, "Dropping unnormalizable record");
                None
            }
        })
        .collect();

    if entries.len() < total {
        tracing::debug!(
            source = provider,
            kept = entries.len(),
            dropped = total - entries.len(),
            "Normalized batch with drops"
        );
    }
    entries
}

/// Decode one raw record into a provider's typed shape.
pub fn decode<T: DeserializeOwned>(provider: &str, record: Value) -> Result<T, NormalizationError> {
    serde_json::from_value(record).map_err(|e| NormalizationError::Malformed {
        provider: provider.to_string(),
        reason: e.to_string(),
    })
}

/// Take the records array at `pointer` (a JSON pointer, `""` for the root).
pub fn records_at(body: Value, pointer: &str) -> Option<Vec<Value>> {
    let target = if pointer.is_empty() {
        body
    } else {
        body.pointer(pointer).cloned()?
    };
    match target {
        Value::Array(items) => Some(items),
        _ => None,
    }
}

/// A required, non-blank string field.
pub fn require(
    provider: &str,
    field: &str,
    value: Option<String>,
) -> Result<String, NormalizationError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| NormalizationError::MissingField {
            provider: provider.to_string(),
            field: field.to_string(),
        })
}

/// Canonical identity for a record. Fails when nothing identifying is left
/// after canonicalization (e.g. a bare `/` or URL scheme).
pub fn identity(provider: &str, field: &str, raw: &str) -> Result<String, NormalizationError> {
    let id = canonical_id(raw);
    if id.is_empty() {
        return Err(NormalizationError::InvalidValue {
            provider: provider.to_string(),
            field: field.to_string(),
            reason: format!("{raw:?} has no identifying part"),
        });
    }
    Ok(id)
}

/// An optional display string, with [`UNKNOWN`] substituted when missing.
pub fn or_unknown(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Stable identity key shared by every provider.
///
/// Lower-cases, strips schemes and known host prefixes, trims trailing `/`
/// and `.git`, and collapses runs of whitespace, `_` and `-` into a single
/// `-`. Stripping repeats until nothing changes, so the result is a fixed
/// point: `canonical_id(&canonical_id(x)) == canonical_id(x)`.
pub fn canonical_id(raw: &str) -> String {
    let mut id = canonical_pass(raw);
    loop {
        let next = canonical_pass(&id);
        if next == id {
            return id;
        }
        id = next;
    }
}

/// One stripping and collapsing pass. Never lengthens already lower-cased input.
fn canonical_pass(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let mut rest = lowered.as_str();
    loop {
        let before = rest.len();
        for scheme in ["https://", "http://"] {
            rest = rest.strip_prefix(scheme).unwrap_or(rest);
        }
        if let Some(stripped) = HOST_PREFIXES.iter().find_map(|p| rest.strip_prefix(p)) {
            rest = stripped;
        }
        rest = rest.trim_end_matches('/');
        rest = rest.strip_suffix(".git").unwrap_or(rest);
        if rest.len() == before {
            break;
        }
    }

    let mut id = String::with_capacity(rest.len());
    let mut pending_dash = false;
    for c in rest.chars() {
        if c.is_whitespace() || c == '_' || c == '-' {
            pending_dash = true;
            continue;
        }
        if pending_dash && !id.is_empty() {
            id.push('-');
        }
        pending_dash = false;
        id.push(c);
    }
    id
}

/// Parse an upstream timestamp, substituting the epoch when missing or
/// unparseable. Accepts RFC 3339, naive date-times (assumed UTC) and dates.
pub fn parse_timestamp(raw: Option<&str>) -> Timestamp {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return epoch();
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.with_timezone(&Utc);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return naive.and_utc();
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or_else(epoch)
}

/// Render a byte count for display.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.0} {}", UNITS[unit])
    }
}

/// Split `prefix:value` tags (Hugging Face style) into their value.
pub fn tag_value<'t>(tags: &'t [String], prefix: &str) -> Option<&'t str> {
    tags.iter().find_map(|t| {
        t.strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix(':'))
            .filter(|v| !v.is_empty())
    })
}

// ============================================================================
// CATEGORY CLASSIFICATION
// ============================================================================

pub const GENERAL: &str = "general";

struct Rule {
    category: &'static str,
    /// Matched anywhere inside a label.
    phrases: &'static [&'static str],
    /// Matched against whole `-`-separated tokens.
    tokens: &'static [&'static str],
}

// Priority order: the first rule with any hit wins.
const RULES: &[Rule] = &[
    Rule {
        category: "multimodal",
        phrases: &[
            "multimodal",
            "image-to-text",
            "text-to-image",
            "image-text-to-text",
            "visual-question-answering",
            "document-question-answering",
            "video-text-to-text",
            "text-to-video",
            "any-to-any",
        ],
        tokens: &["vlm", "clip"],
    },
    Rule {
        category: "reinforcement-learning",
        phrases: &["reinforcement"],
        tokens: &["rl", "gym", "gymnasium"],
    },
    Rule {
        category: "time-series",
        phrases: &["time-series", "timeseries", "forecast"],
        tokens: &[],
    },
    Rule {
        category: "audio",
        phrases: &["audio", "speech", "sound", "music"],
        tokens: &["asr", "tts", "voice"],
    },
    Rule {
        category: "vision",
        phrases: &[
            "image",
            "vision",
            "video",
            "object-detection",
            "segmentation",
            "depth-estimation",
            "keypoint",
        ],
        tokens: &["cnn", "yolo", "ocr", "diffusion"],
    },
    Rule {
        category: "tabular",
        phrases: &["tabular"],
        tokens: &["csv", "tables", "spreadsheet", "xlsx"],
    },
    Rule {
        category: "nlp",
        phrases: &[
            "text",
            "language",
            "translation",
            "summarization",
            "question-answering",
            "fill-mask",
            "sentence",
            "token-classification",
            "conversational",
        ],
        tokens: &["nlp", "llm", "chat", "bert", "gpt"],
    },
];

/// Map provider tags or task labels onto the shared category vocabulary.
pub fn classify<'a>(labels: impl IntoIterator<Item = &'a str>) -> &'static str {
    let labels: Vec<String> = labels.into_iter().map(normalize_label).collect();
    RULES
        .iter()
        .find(|rule| labels.iter().any(|label| rule_hits(rule, label)))
        .map_or(GENERAL, |rule| rule.category)
}

fn normalize_label(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '_' || c.is_whitespace() { '-' } else { c })
        .collect()
}

fn rule_hits(rule: &Rule, label: &str) -> bool {
    rule.phrases.iter().any(|p| label.contains(p))
        || label
            .split(|c: char| !c.is_alphanumeric())
            .any(|tok| rule.tokens.contains(&tok))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[test]
    fn test_canonical_id_strips_hosts_and_suffixes() {
        assert_eq!(
            canonical_id("https://github.com/HuggingFace/Transformers.git"),
            "huggingface/transformers"
        );
        assert_eq!(canonical_id("gitlab.com/group/my_project/"), "group/my-project");
        assert_eq!(
            canonical_id("https://huggingface.co/datasets/stanfordnlp/imdb"),
            "stanfordnlp/imdb"
        );
        assert_eq!(canonical_id("  Owner/Some  Model  "), "owner/some-model");
    }

    #[test]
    fn test_canonical_id_collapses_runs() {
        assert_eq!(canonical_id("a__b _c"), "a-b-c");
        assert_eq!(canonical_id("_leading"), "leading");
    }

    #[test]
    fn test_canonical_id_strips_repeated_prefixes_and_suffixes() {
        assert_eq!(canonical_id("github.com/github.com/x"), "x");
        assert_eq!(canonical_id("http://https://x/y"), "x/y");
        assert_eq!(canonical_id("repo.git.git"), "repo");
        assert_eq!(canonical_id("https://github.com/Owner/Repo.git/"), "owner/repo");
        for raw in ["github.com/github.com/x", "http://https://x/y", "repo.git.git", "_github.com/x"] {
            let once = canonical_id(raw);
            assert_eq!(canonical_id(&once), once, "not a fixed point for {raw:?}");
        }
    }

    #[test]
    fn test_canonical_id_collapses_mixed_separators() {
        assert_eq!(canonical_id("a - b"), "a-b");
        assert_eq!(canonical_id("a--b"), "a-b");
        assert_eq!(canonical_id("-lead_ trail-"), "lead-trail");
    }

    #[test]
    fn test_identity_rejects_empty_canonical_form() {
        assert_eq!(identity("p", "id", "Owner/Repo").unwrap(), "owner/repo");
        for raw in ["/", "https://", "github.com/", "___"] {
            assert!(
                matches!(
                    identity("p", "id", raw),
                    Err(NormalizationError::InvalidValue { .. })
                ),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_cross_provider_identity_collides() {
        let from_github = canonical_id("https://github.com/openai/whisper");
        let from_gitlab = canonical_id("OpenAI/Whisper");
        assert_eq!(from_github, from_gitlab);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 4, 12, 10, 20, 30).unwrap();
        assert_eq!(parse_timestamp(Some("2024-04-12T10:20:30Z")), expected);
        assert_eq!(parse_timestamp(Some("2024-04-12T12:20:30+02:00")), expected);
        assert_eq!(parse_timestamp(Some("2024-04-12T10:20:30.000000")), expected);
        assert_eq!(
            parse_timestamp(Some("2024-04-12")),
            Utc.with_ymd_and_hms(2024, 4, 12, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_timestamp_defaults_to_epoch() {
        assert_eq!(parse_timestamp(None), epoch());
        assert_eq!(parse_timestamp(Some("")), epoch());
        assert_eq!(parse_timestamp(Some("last tuesday")), epoch());
    }

    #[test]
    fn test_or_unknown() {
        assert_eq!(or_unknown(None), UNKNOWN);
        assert_eq!(or_unknown(Some("  ".to_string())), UNKNOWN);
        assert_eq!(or_unknown(Some(" MIT ".to_string())), "MIT");
    }

    #[test]
    fn test_require_reports_field() {
        let err = require("github-search", "full_name", None).unwrap_err();
        assert_eq!(
            err,
            NormalizationError::MissingField {
                provider: "github-search".to_string(),
                field: "full_name".to_string(),
            }
        );
    }

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(84 * 1024 * 1024), "84 MB");
        assert_eq!(human_size(3 * 1024 * 1024 * 1024), "3 GB");
    }

    #[test]
    fn test_tag_value() {
        let tags = vec!["language:en".to_string(), "license:mit".to_string()];
        assert_eq!(tag_value(&tags, "license"), Some("mit"));
        assert_eq!(tag_value(&tags, "lang"), None);
    }

    #[test]
    fn test_records_at() {
        let body = serde_json::json!({"result": {"results": [1, 2]}, "items": "nope"});
        assert_eq!(records_at(body.clone(), "/result/results").map(|r| r.len()), Some(2));
        assert!(records_at(body.clone(), "/items").is_none());
        assert!(records_at(body, "/missing").is_none());
        assert_eq!(records_at(serde_json::json!([1]), "").map(|r| r.len()), Some(1));
    }

    #[test]
    fn test_classify_vocabulary() {
        assert_eq!(classify(["text-classification"]), "nlp");
        assert_eq!(classify(["image-classification"]), "vision");
        assert_eq!(classify(["automatic-speech-recognition"]), "audio");
        assert_eq!(classify(["text-to-image"]), "multimodal");
        assert_eq!(classify(["Time Series Forecasting"]), "time-series");
        assert_eq!(classify(["reinforcement-learning"]), "reinforcement-learning");
        assert_eq!(classify(["tabular-classification"]), "tabular");
        assert_eq!(classify(["deep-learning"]), GENERAL);
        assert_eq!(classify(std::iter::empty()), GENERAL);
    }

    #[test]
    fn test_classify_uses_whole_tokens_for_short_keywords() {
        assert_eq!(classify(["world-models"]), GENERAL);
        assert_eq!(classify(["stable-diffusion"]), "vision");
        assert_eq!(classify(["python", "llm"]), "nlp");
    }

    fn arb_raw_id() -> impl Strategy<Value = String> {
        let fragment = prop_oneof![
            prop::sample::select(vec![
                "https://", "http://", "github.com/", "gitlab.com/", "huggingface.co/",
                "kaggle.com/datasets/", ".git", "/", " ", "_", "-",
            ])
            .prop_map(str::to_string),
            "[A-Za-z0-9.:]{1,4}",
        ];
        prop::collection::vec(fragment, 0..8).prop_map(|parts| parts.concat())
    }

    proptest! {
        /// Property: canonical ids are a fixed point and never contain uppercase,
        /// whitespace, underscores or doubled dashes.
        #[test]
        fn prop_canonical_id_is_idempotent(raw in arb_raw_id()) {
            let once = canonical_id(&raw);
            prop_assert_eq!(canonical_id(&once), once.clone());
            prop_assert!(!once.chars().any(|c| c.is_uppercase() || c.is_whitespace() || c == '_'));
            prop_assert!(!once.contains("--"));
            prop_assert!(!once.starts_with('-') && !once.ends_with('-'));
        }
    }
}
