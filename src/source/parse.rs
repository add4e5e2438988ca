//! Spreadsheet CSV parsing
//!
//! Expects a header row with `letter`, `clue` and `answer` columns (any case,
//! any order) and an optional `rule` column.

use super::{ClueRecord, SourceError};

/// Parse a CSV export into clue records.
///
/// Letters are upper-cased, answers lower-cased, every field trimmed.
/// Blank rows and rows missing a letter, clue or answer are skipped.
pub fn parse_records(text: &str) -> Result<Vec<ClueRecord>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_lowercase())
        .collect();

    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(SourceError::MissingColumn(name))
    };
    let letter_idx = column("letter")?;
    let clue_idx = column("clue")?;
    let answer_idx = column("answer")?;
    let rule_idx = headers.iter().position(|h| h == "rule");

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let cell = |idx: usize| row.get(idx).unwrap_or("").trim();

        let record = ClueRecord {
            letter: cell(letter_idx).to_uppercase(),
            clue: cell(clue_idx).to_string(),
            answer: cell(answer_idx).to_lowercase(),
            rule: rule_idx
                .map(cell)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
        };

        if record.letter.is_empty() || record.clue.is_empty() || record.answer.is_empty() {
            continue;
        }
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_sheet() {
        let csv = "letter,clue,answer\nA,Instrumento del barco,Ancla\nb,Embarcación,barco\n";
        let records = parse_records(csv).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].letter, "A");
        assert_eq!(records[0].answer, "ancla");
        assert_eq!(records[1].letter, "B");
        assert_eq!(records[1].rule, None);
    }

    #[test]
    fn test_headers_any_case_and_order() {
        let csv = " Answer ,CLUE,Letter,Rule\ncasa,Vivienda,c,contains\n";
        let records = parse_records(csv).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].letter, "C");
        assert_eq!(records[0].clue, "Vivienda");
        assert_eq!(records[0].answer, "casa");
        assert_eq!(records[0].rule.as_deref(), Some("contains"));
    }

    #[test]
    fn test_quoted_cells_and_escaped_quotes() {
        let csv = "letter,clue,answer\r\nD,\"Reptil que \"\"vuela\"\", y escupe fuego\",Dragón\r\n";
        let records = parse_records(csv).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].clue, "Reptil que \"vuela\", y escupe fuego");
        assert_eq!(records[0].answer, "dragón");
    }

    #[test]
    fn test_multiline_quoted_cell() {
        let csv = "letter,clue,answer\nE,\"Mamífero\ncon trompa\",elefante\n";
        let records = parse_records(csv).unwrap();
        assert_eq!(records[0].clue, "Mamífero\ncon trompa");
    }

    #[test]
    fn test_skips_blank_and_incomplete_rows() {
        let csv = "letter,clue,answer\n,,\nF,,flor\nG,Felino,\nH,Agua congelada,hielo\nI,Isla\n";
        let records = parse_records(csv).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].letter, "H");
    }

    #[test]
    fn test_enye_letter_uppercased() {
        let csv = "letter,clue,answer\nñ,Ave corredora,Ñandú\n";
        let records = parse_records(csv).unwrap();
        assert_eq!(records[0].letter, "Ñ");
        assert_eq!(records[0].answer, "ñandú");
    }

    #[test]
    fn test_missing_column() {
        let err = parse_records("letter,answer\nA,ancla\n").unwrap_err();
        assert!(matches!(err, SourceError::MissingColumn("clue")));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_records("").unwrap_err().to_string().contains("letter"));
    }
}
