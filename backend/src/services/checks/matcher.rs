//! The trigger matching pass.
//!
//! `evaluate` is a pure function: it reads the rows and triggers it is given
//! and produces a new annotated row per input row, in input order. It holds
//! no state across calls, performs no I/O and has no failure modes —
//! degenerate inputs (no rows, no triggers, no columns, triggers whose text
//! parses to zero terms) degrade to "not found" rather than erroring.
//!
//! Matching rules, per trigger term:
//! - a single word matches a whitespace-separated word of a cell on exact
//!   equality, or on symmetric prefix abbreviation: either string may be the
//!   shortened form of the other, provided BOTH are at least
//!   [`MIN_ABBREV_CHARS`] characters long. Below the guard only exact
//!   equality counts, so a 2-character term like "ая" cannot fire on every
//!   word that happens to start with it.
//! - a term containing whitespace is a phrase and must appear in the cell as
//!   a contiguous substring.
//!
//! All comparisons run on lowercased text; cell values are coerced to
//! strings first (blank and missing cells compare as the empty string).
//! Triggers are tried in declaration order and the first one with any
//! matching term wins the row; later triggers are not evaluated for it.

use common::model::annotated::{AnnotatedRow, MatchStatus};
use common::model::row::Row;
use common::model::trigger::Trigger;

/// Minimum length, in characters (not bytes — the domain text is Cyrillic),
/// for both sides of a prefix-abbreviation comparison.
const MIN_ABBREV_CHARS: usize = 3;

/// Annotates every row with whether any trigger fired, which one, and which
/// of its terms matched. Output length and order mirror the input rows.
pub fn evaluate(rows: &[Row], triggers: &[Trigger], columns: &[String]) -> Vec<AnnotatedRow> {
    // Parse each trigger's raw search text once, not per row.
    let parsed_terms: Vec<Vec<String>> = triggers.iter().map(Trigger::parsed_terms).collect();

    rows.iter()
        .map(|row| annotate_row(row, triggers, &parsed_terms, columns))
        .collect()
}

fn annotate_row(
    row: &Row,
    triggers: &[Trigger],
    parsed_terms: &[Vec<String>],
    columns: &[String],
) -> AnnotatedRow {
    for (trigger, terms) in triggers.iter().zip(parsed_terms) {
        // A trigger with zero parsed terms never matches.
        if terms.is_empty() {
            continue;
        }
        let matched = matched_terms(row, terms, columns);
        if !matched.is_empty() {
            // First match wins; no further triggers are evaluated for this row.
            return AnnotatedRow {
                cells: row.cells.clone(),
                status: MatchStatus::Found,
                triggered_by: trigger.name.clone(),
                matched_keywords: matched,
            };
        }
    }

    AnnotatedRow {
        cells: row.cells.clone(),
        status: MatchStatus::NotFound,
        triggered_by: String::new(),
        matched_keywords: Vec::new(),
    }
}

/// Collects the distinct terms that match anywhere in the row, in first-seen
/// order.
fn matched_terms(row: &Row, terms: &[String], columns: &[String]) -> Vec<String> {
    let mut matched: Vec<String> = Vec::new();
    for column in columns {
        let cell = row.text(column).to_lowercase();
        if cell.is_empty() {
            continue;
        }
        for term in terms {
            if matched.iter().any(|m| m == term) {
                continue;
            }
            if term_matches_cell(term, &cell) {
                matched.push(term.clone());
            }
        }
    }
    matched
}

fn term_matches_cell(term: &str, cell: &str) -> bool {
    if term.chars().any(char::is_whitespace) {
        // Multi-word phrase: contiguous substring of the whole cell value.
        cell.contains(term)
    } else {
        cell.split_whitespace().any(|word| words_match(term, word))
    }
}

/// Exact equality, or symmetric prefix abbreviation under the length guard:
/// the stored term may be a shortened form of the cell word or vice versa.
fn words_match(term: &str, word: &str) -> bool {
    if term == word {
        return true;
    }
    if term.chars().count() < MIN_ABBREV_CHARS || word.chars().count() < MIN_ABBREV_CHARS {
        return false;
    }
    word.starts_with(term) || term.starts_with(word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::row::CellValue;
    use std::collections::HashMap;

    fn row(cells: &[(&str, CellValue)]) -> Row {
        Row {
            cells: cells
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<HashMap<_, _>>(),
        }
    }

    fn text(value: &str) -> CellValue {
        CellValue::Text(value.to_string())
    }

    fn trigger(name: &str, terms: &str) -> Trigger {
        Trigger {
            name: name.to_string(),
            terms: terms.to_string(),
        }
    }

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn concrete_scenario() {
        let rows = vec![
            row(&[("A", text("Оплата займа")), ("B", CellValue::Number(1000.0))]),
            row(&[("A", text("Обычный платеж")), ("B", CellValue::Number(500.0))]),
        ];
        let triggers = vec![trigger("Займ", "займ")];
        let annotated = evaluate(&rows, &triggers, &columns(&["A", "B"]));

        assert_eq!(annotated.len(), 2);
        assert_eq!(annotated[0].status, MatchStatus::Found);
        assert_eq!(annotated[0].triggered_by, "Займ");
        assert_eq!(annotated[0].matched_keywords, vec!["займ"]);
        assert_eq!(annotated[1].status, MatchStatus::NotFound);
        assert_eq!(annotated[1].triggered_by, "");
        assert!(annotated[1].matched_keywords.is_empty());
    }

    #[test]
    fn empty_rows_yield_empty_output() {
        let annotated = evaluate(&[], &[trigger("t", "x")], &columns(&["A"]));
        assert!(annotated.is_empty());
    }

    #[test]
    fn empty_triggers_annotate_everything_not_found() {
        let rows = vec![row(&[("A", text("Депозит"))]), row(&[("A", text("Займ"))])];
        let annotated = evaluate(&rows, &[], &columns(&["A"]));
        assert_eq!(annotated.len(), 2);
        assert!(annotated
            .iter()
            .all(|r| r.status == MatchStatus::NotFound && r.triggered_by.is_empty()));
    }

    #[test]
    fn empty_column_set_never_matches() {
        let rows = vec![row(&[("A", text("займ"))])];
        let annotated = evaluate(&rows, &[trigger("t", "займ")], &[]);
        assert_eq!(annotated[0].status, MatchStatus::NotFound);
    }

    #[test]
    fn zero_term_triggers_never_match_but_later_triggers_still_can() {
        let rows = vec![row(&[("A", text("оплата займа"))])];
        let triggers = vec![trigger("Пустой", " , ,  "), trigger("Займ", "займ")];
        let annotated = evaluate(&rows, &triggers, &columns(&["A"]));
        assert_eq!(annotated[0].status, MatchStatus::Found);
        assert_eq!(annotated[0].triggered_by, "Займ");
    }

    #[test]
    fn first_declared_trigger_wins() {
        let rows = vec![row(&[("A", text("погашение займа и пеня"))])];
        let triggers = vec![trigger("T1", "займ"), trigger("T2", "пеня")];
        let annotated = evaluate(&rows, &triggers, &columns(&["A"]));
        assert_eq!(annotated[0].triggered_by, "T1");

        // Reversing the declaration order flips the reported trigger.
        let triggers = vec![trigger("T2", "пеня"), trigger("T1", "займ")];
        let annotated = evaluate(&rows, &triggers, &columns(&["A"]));
        assert_eq!(annotated[0].triggered_by, "T2");
    }

    #[test]
    fn non_matching_trigger_falls_through_to_the_next() {
        let rows = vec![row(&[("A", text("пеня по договору"))])];
        let triggers = vec![trigger("T1", "займ"), trigger("T2", "пеня")];
        let annotated = evaluate(&rows, &triggers, &columns(&["A"]));
        assert_eq!(annotated[0].status, MatchStatus::Found);
        assert_eq!(annotated[0].triggered_by, "T2");
    }

    #[test]
    fn matching_is_case_insensitive() {
        let rows = vec![row(&[("A", text("Депозит"))])];
        let annotated = evaluate(&rows, &[trigger("t", "депозит")], &columns(&["A"]));
        assert_eq!(annotated[0].status, MatchStatus::Found);

        let rows = vec![row(&[("A", text("депозит"))])];
        let annotated = evaluate(&rows, &[trigger("t", "ДЕПОЗИТ")], &columns(&["A"]));
        assert_eq!(annotated[0].status, MatchStatus::Found);
    }

    #[test]
    fn abbreviation_matching_is_symmetric() {
        // Stored term is the shortened form of the cell word.
        let rows = vec![row(&[("A", text("просроченная задолженность"))])];
        let annotated = evaluate(&rows, &[trigger("t", "задолж")], &columns(&["A"]));
        assert_eq!(annotated[0].status, MatchStatus::Found);
        assert_eq!(annotated[0].matched_keywords, vec!["задолж"]);

        // Cell word is the shortened form of the stored term.
        let rows = vec![row(&[("A", text("тек. задолж"))])];
        let annotated = evaluate(&rows, &[trigger("t", "задолженность")], &columns(&["A"]));
        assert_eq!(annotated[0].status, MatchStatus::Found);
    }

    #[test]
    fn short_terms_only_match_exactly() {
        // "ая" is two characters: no prefix matching, even though the cell
        // word starts with it.
        let rows = vec![row(&[("A", text("аякс и прочее"))])];
        let annotated = evaluate(&rows, &[trigger("t", "ая")], &columns(&["A"]));
        assert_eq!(annotated[0].status, MatchStatus::NotFound);

        // Exact equality still works below the guard.
        let rows = vec![row(&[("A", text("ая прочее"))])];
        let annotated = evaluate(&rows, &[trigger("t", "ая")], &columns(&["A"]));
        assert_eq!(annotated[0].status, MatchStatus::Found);

        // The guard applies to the cell word too: a 2-character word does
        // not abbreviation-match a longer term.
        let rows = vec![row(&[("A", text("за все"))])];
        let annotated = evaluate(&rows, &[trigger("t", "задолженность")], &columns(&["A"]));
        assert_eq!(annotated[0].status, MatchStatus::NotFound);
    }

    #[test]
    fn phrases_match_as_contiguous_substrings() {
        let rows = vec![row(&[("A", text("подписан договор купли продажи №5"))])];
        let annotated = evaluate(
            &rows,
            &[trigger("t", "договор купли продажи")],
            &columns(&["A"]),
        );
        assert_eq!(annotated[0].status, MatchStatus::Found);
        assert_eq!(annotated[0].matched_keywords, vec!["договор купли продажи"]);

        // Reordered words are not the same phrase.
        let annotated = evaluate(
            &rows,
            &[trigger("t", "договор продажи купли")],
            &columns(&["A"]),
        );
        assert_eq!(annotated[0].status, MatchStatus::NotFound);
    }

    #[test]
    fn numbers_and_booleans_are_compared_as_text() {
        let rows = vec![row(&[
            ("Сумма", CellValue::Number(1000.0)),
            ("Флаг", CellValue::Bool(true)),
        ])];
        let annotated = evaluate(&rows, &[trigger("t", "1000")], &columns(&["Сумма", "Флаг"]));
        assert_eq!(annotated[0].status, MatchStatus::Found);

        let annotated = evaluate(&rows, &[trigger("t", "true")], &columns(&["Сумма", "Флаг"]));
        assert_eq!(annotated[0].status, MatchStatus::Found);
    }

    #[test]
    fn blank_and_missing_cells_never_match() {
        let rows = vec![row(&[("A", CellValue::Blank)])];
        let annotated = evaluate(&rows, &[trigger("t", "займ")], &columns(&["A", "B"]));
        assert_eq!(annotated[0].status, MatchStatus::NotFound);
    }

    #[test]
    fn matched_keywords_are_distinct_across_columns() {
        let rows = vec![row(&[
            ("A", text("оплата займа")),
            ("B", text("возврат займа")),
        ])];
        let annotated = evaluate(&rows, &[trigger("t", "займ, возврат")], &columns(&["A", "B"]));
        assert_eq!(annotated[0].status, MatchStatus::Found);
        // "займ" matched in both columns but is recorded once.
        assert_eq!(annotated[0].matched_keywords, vec!["займ", "возврат"]);
    }

    #[test]
    fn evaluation_is_idempotent_and_preserves_order() {
        let rows = vec![
            row(&[("A", text("оплата займа"))]),
            row(&[("A", text("платеж"))]),
            row(&[("A", text("возврат займа"))]),
        ];
        let triggers = vec![trigger("Займ", "займ")];
        let cols = columns(&["A"]);

        let first = evaluate(&rows, &triggers, &cols);
        let second = evaluate(&rows, &triggers, &cols);

        assert_eq!(first.len(), rows.len());
        let statuses: Vec<_> = first.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![MatchStatus::Found, MatchStatus::NotFound, MatchStatus::Found]
        );
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.status, b.status);
            assert_eq!(a.triggered_by, b.triggered_by);
            assert_eq!(a.matched_keywords, b.matched_keywords);
        }
    }

    #[test]
    fn inputs_are_not_mutated() {
        let rows = vec![row(&[("A", text("Оплата займа"))])];
        let triggers = vec![trigger("Займ", "Займ, пеня")];
        let _ = evaluate(&rows, &triggers, &columns(&["A"]));

        assert_eq!(rows[0].text("A"), "Оплата займа");
        assert_eq!(triggers[0].terms, "Займ, пеня");
    }
}
