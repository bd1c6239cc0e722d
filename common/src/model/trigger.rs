use serde::{Deserialize, Serialize};

/// A user-authored matching rule.
///
/// `terms` is the raw comma-separated search text exactly as typed into the
/// trigger form, e.g. `"займ, задолж, договор купли продажи"`. A term that is
/// a single word matches whole words in a cell (including shortened prefix
/// forms); a term containing whitespace must appear in a cell as a contiguous
/// substring. Parsing and matching are both case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    /// Human-readable label, reported back as `triggered_by` on matched rows.
    pub name: String,
    /// Raw comma-separated search terms.
    pub terms: String,
}

impl Trigger {
    /// Splits the raw search text into normalized terms: comma-separated,
    /// trimmed, lowercased, empties discarded. A trigger whose text parses to
    /// zero terms never matches anything.
    pub fn parsed_terms(&self) -> Vec<String> {
        self.terms
            .split(',')
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trigger(terms: &str) -> Trigger {
        Trigger {
            name: "t".to_string(),
            terms: terms.to_string(),
        }
    }

    #[test]
    fn terms_are_trimmed_lowercased_and_split_on_commas() {
        let parsed = trigger(" Займ , договор купли продажи ,ПЕНЯ").parsed_terms();
        assert_eq!(parsed, vec!["займ", "договор купли продажи", "пеня"]);
    }

    #[test]
    fn empty_and_whitespace_only_terms_are_discarded() {
        assert!(trigger("").parsed_terms().is_empty());
        assert!(trigger(" , ,  ").parsed_terms().is_empty());
        assert_eq!(trigger("a, ,b").parsed_terms(), vec!["a", "b"]);
    }
}
