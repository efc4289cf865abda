//! Shelfmark and collection classification from raw identifiers/labels.
//!
//! Every source carries its own ordered rule table; the matching engine
//! here is shared. Rules are regex prefix matches, case-insensitive,
//! first match wins, and a rule's result template may reference capture
//! groups as `{1}`, `{2}`, ...

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("invalid rule pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// One `(pattern, result-template)` rule.
#[derive(Debug, Clone)]
struct Rule {
    pattern: Regex,
    template: String,
}

fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("(?i){pattern}"))
}

/// Fill `{N}` placeholders in a template from regex captures.
fn substitute(template: &str, captures: &regex::Captures) -> String {
    let mut out = template.to_string();
    for i in 1..captures.len() {
        let placeholder = format!("{{{i}}}");
        if out.contains(&placeholder) {
            let got = captures.get(i).map(|m| m.as_str()).unwrap_or("");
            out = out.replace(&placeholder, got);
        }
    }
    out.trim().to_string()
}

/// Derives a collection grouping from a shelfmark or raw label.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    strip_prefix: Option<Regex>,
    rules: Vec<Rule>,
}

impl Classifier {
    /// Build a classifier from an ordered rule table.
    ///
    /// `strip_prefix` is removed from the input before matching (e.g.
    /// the Bodleian's "MS. " prefix). Rule patterns are anchored at the
    /// start of the cleaned string.
    pub fn new(
        strip_prefix: Option<&str>,
        rules: &[(&str, &str)],
    ) -> Result<Self, ClassifyError> {
        let strip_prefix = match strip_prefix {
            Some(p) => Some(compile(&format!("^{p}"))?),
            None => None,
        };
        let rules = rules
            .iter()
            .map(|(pattern, template)| {
                Ok(Rule {
                    pattern: compile(&format!("^{pattern}"))?,
                    template: template.to_string(),
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self {
            strip_prefix,
            rules,
        })
    }

    /// Classify a raw identifier into a collection name.
    ///
    /// No rule match falls back to the first whitespace-delimited token
    /// of the cleaned string (trailing dot removed), else "Unknown".
    pub fn collection(&self, raw: &str) -> String {
        let cleaned = match &self.strip_prefix {
            Some(re) => re.replace(raw.trim(), "").to_string(),
            None => raw.trim().to_string(),
        };

        for rule in &self.rules {
            if let Some(captures) = rule.pattern.captures(&cleaned) {
                return substitute(&rule.template, &captures);
            }
        }

        cleaned
            .split_whitespace()
            .next()
            .map(|t| t.trim_end_matches('.').to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

/// Extracts a shelfmark from a raw label using ordered pattern rules.
///
/// Unlike [`Classifier`], patterns here search anywhere in the label
/// (shelfmarks are usually embedded in longer titles).
#[derive(Debug, Clone, Default)]
pub struct ShelfmarkExtractor {
    rules: Vec<Rule>,
}

impl ShelfmarkExtractor {
    pub fn new(rules: &[(&str, &str)]) -> Result<Self, ClassifyError> {
        let rules = rules
            .iter()
            .map(|(pattern, template)| {
                Ok(Rule {
                    pattern: compile(pattern)?,
                    template: template.to_string(),
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { rules })
    }

    /// First-match-wins extraction; `None` when no rule matches.
    pub fn extract(&self, label: &str) -> Option<String> {
        for rule in &self.rules {
            if let Some(captures) = rule.pattern.captures(label) {
                let result = if rule.template.is_empty() {
                    captures.get(0).map(|m| m.as_str().trim().to_string())?
                } else {
                    substitute(&rule.template, &captures)
                };
                if !result.is_empty() {
                    return Some(result);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bodleian_style() -> Classifier {
        Classifier::new(
            Some(r"MS\.?\s*"),
            &[
                (r"Bodl\.", "Bodley"),
                (r"Junius", "Junius"),
                (r"Laud Misc\.", "Laud Misc."),
                (r"Rawl\.?\s*poet", "Rawlinson Poet."),
                (r"Rawl\.?\s*([A-Z])\b", "Rawlinson {1}"),
                (r"Add\.?\s*([A-Z])\b", "Additional {1}"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_first_match_wins() {
        let c = bodleian_style();
        assert_eq!(c.collection("MS. Bodl. 196"), "Bodley");
        assert_eq!(c.collection("MS. Junius 11"), "Junius");
        assert_eq!(c.collection("MS. Laud Misc. 108"), "Laud Misc.");
        // "Rawl. poet" must hit the more specific rule listed first.
        assert_eq!(c.collection("MS. Rawl. poet. 223"), "Rawlinson Poet.");
    }

    #[test]
    fn test_capture_substitution() {
        let c = bodleian_style();
        assert_eq!(c.collection("MS. Rawl. B 214"), "Rawlinson B");
        assert_eq!(c.collection("MS. Add. C 12"), "Additional C");
    }

    #[test]
    fn test_case_insensitive() {
        let c = bodleian_style();
        assert_eq!(c.collection("ms. bodl. 196"), "Bodley");
    }

    #[test]
    fn test_fallback_first_token() {
        let c = bodleian_style();
        assert_eq!(c.collection("MS. Tanner 346"), "Tanner");
        assert_eq!(c.collection("MS. Hatton. 20"), "Hatton");
    }

    #[test]
    fn test_fallback_unknown() {
        let c = bodleian_style();
        assert_eq!(c.collection("MS. "), "Unknown");
        assert_eq!(c.collection(""), "Unknown");
    }

    #[test]
    fn test_shelfmark_extraction() {
        let e = ShelfmarkExtractor::new(&[(r"MS\.?\s*(\d+[A-Za-z]?)", "MS {1}")]).unwrap();
        assert_eq!(
            e.extract("Cambridge, Corpus Christi College, MS 286: Gospels"),
            Some("MS 286".to_string())
        );
        assert_eq!(e.extract("no shelfmark here"), None);
    }

    #[test]
    fn test_shelfmark_whole_match_template() {
        let e = ShelfmarkExtractor::new(&[(r"Cosin MS\.?\s*[\w.]+", "")]).unwrap();
        assert_eq!(
            e.extract("Psalter - Cosin MS. V.i.1"),
            Some("Cosin MS. V.i.1".to_string())
        );
    }
}
