use rust_xlsxwriter::{Workbook, Worksheet};
use serde_json::{Map, Value};
use std::error::Error;

/// One table row: column name to display value
///
/// The key set is a superset of the column list used for export; extra keys
/// are ignored and missing keys become blank cells. Values are display
/// primitives (strings or numbers); no type enforcement is applied.
pub type TableRow = Map<String, Value>;

/// File name used for the client-side demo table download
pub const EXPORT_FILE_NAME: &str = "table_export.xlsx";

/// Column order for the demo dataset
pub const DEMO_COLUMNS: [&str; 10] = [
    "id", "age", "square", "cube", "sqrt", "log", "exp", "sin", "cos", "tan",
];

/// Shape rows into a cell grid for the worksheet
///
/// This is the pure step of the export pipeline: the first returned row is the
/// header (exactly `columns`, in order) and each following row holds, per
/// column, the value of that key in the corresponding `TableRow`. A missing
/// key yields `Value::Null`, which the writer renders as a blank cell.
/// Neither `rows` nor `columns` is mutated.
///
/// # Arguments
/// * `rows` - Row-oriented dataset
/// * `columns` - Explicit column order for the sheet
///
/// # Returns
/// * `Vec<Vec<Value>>` - Header row followed by one grid row per input row
pub fn sheet_cells(rows: &[TableRow], columns: &[String]) -> Vec<Vec<Value>> {
    let mut grid = Vec::with_capacity(rows.len() + 1);
    grid.push(columns.iter().map(|c| Value::String(c.clone())).collect());

    for row in rows {
        grid.push(
            columns
                .iter()
                .map(|col| row.get(col).cloned().unwrap_or(Value::Null))
                .collect(),
        );
    }

    grid
}

/// Build an in-memory workbook from a row-oriented dataset
///
/// Produces one worksheet named `"Sheet1"` whose header row is `columns` in
/// the given order and whose data rows follow `sheet_cells`.
///
/// # Arguments
/// * `rows` - Row-oriented dataset
/// * `columns` - Explicit column order for the sheet
///
/// # Returns
/// * `Result<Workbook, Box<dyn Error>>` - Workbook ready for serialization
pub fn build_workbook(rows: &[TableRow], columns: &[String]) -> Result<Workbook, Box<dyn Error>> {
    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    worksheet.set_name("Sheet1")?;

    for (r, cells) in sheet_cells(rows, columns).iter().enumerate() {
        for (c, cell) in cells.iter().enumerate() {
            write_cell(&mut worksheet, r as u32, c as u16, cell)?;
        }
    }

    workbook.push_worksheet(worksheet);
    Ok(workbook)
}

/// Serialize a workbook to XLSX bytes
///
/// Serialization failures propagate to the caller; the invoking handler is
/// responsible for converting them into a user-visible response.
///
/// # Arguments
/// * `workbook` - The workbook to serialize
///
/// # Returns
/// * `Result<Vec<u8>, Box<dyn Error>>` - XLSX file content as bytes
pub fn workbook_to_bytes(mut workbook: Workbook) -> Result<Vec<u8>, Box<dyn Error>> {
    let buffer = workbook.save_to_buffer()?;
    Ok(buffer)
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &Value,
) -> Result<(), Box<dyn Error>> {
    match value {
        // Blank cell for a missing key
        Value::Null => {}
        Value::String(s) => {
            worksheet.write_string(row, col, s.as_str())?;
        }
        Value::Number(n) => {
            worksheet.write_number(row, col, n.as_f64().unwrap_or(0.0))?;
        }
        Value::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        other => {
            worksheet.write_string(row, col, other.to_string().as_str())?;
        }
    }
    Ok(())
}

/// Render rows as an HTML table for the demo page
///
/// Header comes from `columns` in order; each data cell holds the escaped
/// display text of the row's value for that column, or nothing when the key
/// is missing.
pub fn render_table_html(rows: &[TableRow], columns: &[String]) -> String {
    let mut html = String::from("<table class=\"data-table\">\n<thead><tr>");
    for col in columns {
        html.push_str(&format!("<th>{}</th>", escape_html(col)));
    }
    html.push_str("</tr></thead>\n<tbody>\n");

    for row in rows {
        html.push_str("<tr>");
        for col in columns {
            let text = match row.get(col) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };
            html.push_str(&format!("<td>{}</td>", escape_html(&text)));
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>");
    html
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Generate the demo dataset shown on the table export page
///
/// 100 rows of derived math columns over `age = 20 + (i % 40)`; floating
/// point columns are rounded to 4 decimal places for display parity with the
/// exported sheet.
pub fn demo_rows() -> Vec<TableRow> {
    (0..100)
        .map(|i| {
            let id = i + 1;
            let age = 20 + (i % 40);
            let a = age as f64;

            let mut row = TableRow::new();
            row.insert("id".to_string(), Value::from(id));
            row.insert("age".to_string(), Value::from(age));
            row.insert("square".to_string(), Value::from(age * age));
            row.insert("cube".to_string(), Value::from(age * age * age));
            row.insert("sqrt".to_string(), Value::from(round4(a.sqrt())));
            row.insert("log".to_string(), Value::from(round4(a.ln())));
            row.insert("exp".to_string(), Value::from(round4((a / 20.0).exp())));
            row.insert("sin".to_string(), Value::from(round4(a.sin())));
            row.insert("cos".to_string(), Value::from(round4(a.cos())));
            row.insert("tan".to_string(), Value::from(round4(a.tan())));
            row
        })
        .collect()
}

/// Column order for the demo dataset as owned strings
pub fn demo_columns() -> Vec<String> {
    DEMO_COLUMNS.iter().map(|c| c.to_string()).collect()
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> TableRow {
        let mut m = TableRow::new();
        for (k, v) in pairs {
            m.insert(k.to_string(), v.clone());
        }
        m
    }

    #[test]
    fn header_row_matches_columns_in_order() {
        let rows = vec![row(&[("id", json!(1)), ("name", json!("x"))])];
        let columns = vec!["id".to_string(), "name".to_string()];

        let grid = sheet_cells(&rows, &columns);
        assert_eq!(grid[0], vec![json!("id"), json!("name")]);
        assert_eq!(grid[1], vec![json!(1), json!("x")]);
    }

    #[test]
    fn missing_key_becomes_blank_cell() {
        let rows = vec![row(&[("id", json!(1))])];
        let columns = vec!["id".to_string(), "name".to_string()];

        let grid = sheet_cells(&rows, &columns);
        assert_eq!(grid[1], vec![json!(1), Value::Null]);
    }

    #[test]
    fn extra_keys_are_ignored() {
        let rows = vec![row(&[("id", json!(1)), ("hidden", json!("no"))])];
        let columns = vec!["id".to_string()];

        let grid = sheet_cells(&rows, &columns);
        assert_eq!(grid[1], vec![json!(1)]);
    }

    #[test]
    fn workbook_serializes_to_nonempty_buffer() {
        let rows = vec![row(&[("id", json!(1)), ("name", json!("x"))])];
        let columns = vec!["id".to_string(), "name".to_string()];

        let workbook = build_workbook(&rows, &columns).unwrap();
        let bytes = workbook_to_bytes(workbook).unwrap();
        // XLSX files are zip archives; check the magic bytes
        assert!(bytes.len() > 4);
        assert_eq!(&bytes[0..2], b"PK");
    }

    #[test]
    fn inputs_survive_export_untouched() {
        let rows = vec![row(&[("id", json!(1))])];
        let columns = vec!["id".to_string()];
        let rows_before = rows.clone();
        let columns_before = columns.clone();

        let _ = build_workbook(&rows, &columns).unwrap();
        assert_eq!(rows, rows_before);
        assert_eq!(columns, columns_before);
    }

    #[test]
    fn table_html_escapes_and_orders_cells() {
        let rows = vec![row(&[("name", json!("<b>x</b>")), ("n", json!(2))])];
        let columns = vec!["n".to_string(), "name".to_string()];

        let html = render_table_html(&rows, &columns);
        assert!(html.contains("<th>n</th><th>name</th>"));
        assert!(html.contains("<td>2</td><td>&lt;b&gt;x&lt;/b&gt;</td>"));
    }

    #[test]
    fn demo_dataset_has_expected_shape() {
        let rows = demo_rows();
        assert_eq!(rows.len(), 100);
        assert_eq!(rows[0].get("id"), Some(&json!(1)));
        assert_eq!(rows[0].get("age"), Some(&json!(20)));
        assert_eq!(rows[40].get("age"), Some(&json!(20)));
        for col in DEMO_COLUMNS {
            assert!(rows[0].contains_key(col));
        }
    }
}
