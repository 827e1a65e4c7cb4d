//! Generic `Date,Description,Amount` statement parser.
//!
//! The first row is a header and is discarded. Quoting is disabled on
//! purpose: rows split on every comma, so descriptions with embedded commas
//! misparse and get dropped. That matches the exported format this importer
//! accepts; it is a known limitation, not something to paper over here.

use chrono::NaiveDate;

use finsight_core::StatementRow;

/// Parse raw statement text into rows.
///
/// `today` fills in rows whose date column is empty or unreadable. Rows with
/// fewer than 3 fields or a non-numeric amount contribute nothing. The
/// returned amounts are still signed; negative means expense.
pub fn parse_statement(text: &str, today: NaiveDate) -> Vec<StatementRow> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    let mut header_seen = false;

    for result in rdr.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                log::debug!("skipping unreadable statement line: {e}");
                continue;
            }
        };
        if !header_seen {
            header_seen = true;
            continue;
        }
        if record.len() < 3 {
            log::debug!("skipping short statement line ({} fields)", record.len());
            continue;
        }

        let amount: f64 = match record.get(2).unwrap_or("").trim().parse() {
            Ok(a) => a,
            Err(_) => {
                log::debug!("skipping statement line with non-numeric amount");
                continue;
            }
        };

        let date = parse_date(record.get(0).unwrap_or("")).unwrap_or(today);

        let description = record.get(1).unwrap_or("").trim();
        let description =
            if description.is_empty() { "Unknown".to_string() } else { description.to_string() };

        rows.push(StatementRow { date, description, amount });
    }

    rows
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
    }

    #[test]
    fn test_sign_is_preserved_for_the_store() {
        let text = "Date,Description,Amount\n2026-03-01,Grocery Mart,-50\n2026-03-02,Paycheck,50\n";
        let rows = parse_statement(text, today());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].amount, -50.0);
        assert_eq!(rows[1].amount, 50.0);
    }

    #[test]
    fn test_header_row_is_discarded() {
        let text = "Date,Description,Amount\n";
        assert!(parse_statement(text, today()).is_empty());
    }

    #[test]
    fn test_short_rows_are_dropped() {
        let text = "Date,Description,Amount\n2026-03-01,OnlyTwoFields\n2026-03-02,Kept,-1.25\n";
        let rows = parse_statement(text, today());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description, "Kept");
    }

    #[test]
    fn test_non_numeric_amount_is_dropped() {
        let text = "Date,Description,Amount\n2026-03-01,Bad,forty\n2026-03-02,Good,40\n";
        let rows = parse_statement(text, today());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, 40.0);
    }

    #[test]
    fn test_missing_date_and_description_defaults() {
        let text = "Date,Description,Amount\n,,12.00\n";
        let rows = parse_statement(text, today());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, today());
        assert_eq!(rows[0].description, "Unknown");
    }

    #[test]
    fn test_unparseable_date_falls_back_to_today() {
        let text = "Date,Description,Amount\nnot-a-date,Thing,1\n";
        let rows = parse_statement(text, today());
        assert_eq!(rows[0].date, today());
    }

    #[test]
    fn test_us_date_format_accepted() {
        let text = "Date,Description,Amount\n03/01/2026,Thing,1\n";
        let rows = parse_statement(text, today());
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    }

    #[test]
    fn test_quoted_commas_are_not_handled() {
        // With quoting disabled the third field is ` Ltd"`, which is not a
        // number, so the row is dropped rather than parsed.
        let text = "Date,Description,Amount\n2026-03-01,\"Coffee, Ltd\",5.00\n";
        assert!(parse_statement(text, today()).is_empty());
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let text = "Date,Description,Amount,Memo\n2026-03-01,Thing,-2.50,something\n";
        let rows = parse_statement(text, today());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, -2.50);
    }
}
