use crate::error::{Result, VizError};
use chrono::{NaiveDateTime, Timelike};
use serde_json::{Map, Value};
use std::fmt;
use std::io::Read;

/// A single cell of a normalized table.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl Scalar {
    /// Convert a JSON value into a cell. Nested arrays and objects are kept as their JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Scalar::Null,
            Value::Bool(b) => Scalar::Bool(*b),
            Value::Number(n) => n.as_f64().map(Scalar::Number).unwrap_or(Scalar::Null),
            Value::String(s) => Scalar::Text(s.clone()),
            other => Scalar::Text(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Numeric reading of the cell: numbers, booleans and numeric text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n).filter(|v| v.is_finite()),
            Scalar::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Scalar::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            Scalar::Null | Scalar::Timestamp(_) => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Scalar::Text(s) => f.write_str(s),
            Scalar::Timestamp(ts) => {
                if ts.time().num_seconds_from_midnight() == 0 && ts.time().nanosecond() == 0 {
                    write!(f, "{}", ts.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S"))
                }
            }
        }
    }
}

/// An ordered mapping from column name to cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(String, Scalar)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_object(obj: &Map<String, Value>) -> Self {
        Self {
            fields: obj
                .iter()
                .map(|(k, v)| (k.clone(), Scalar::from_json(v)))
                .collect(),
        }
    }

    /// Set a field, replacing the value in place if the column already exists.
    pub fn insert(&mut self, column: impl Into<String>, value: Scalar) {
        let column = column.into();
        match self.fields.iter_mut().find(|(k, _)| *k == column) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Scalar> {
        self.fields.iter().find(|(k, _)| k == column).map(|(_, v)| v)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, Scalar)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Scalar)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

/// Normalized tabular data: a sequence of records sharing a (loosely enforced) column set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    records: Vec<Record>,
}

impl Table {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Union of column names in order of first appearance.
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for record in &self.records {
            for col in record.columns() {
                if !columns.iter().any(|c| c == col) {
                    columns.push(col.to_string());
                }
            }
        }
        columns
    }

    /// First of `columns` that is absent from at least one record.
    pub fn first_missing<'a>(&self, columns: &[&'a str]) -> Option<&'a str> {
        columns
            .iter()
            .copied()
            .find(|col| self.records.iter().any(|r| !r.contains(col)))
    }

    /// Cells of one column in row order; absent fields read as null.
    pub fn values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Scalar> + 'a {
        self.records
            .iter()
            .map(move |r| r.get(column).unwrap_or(&Scalar::Null))
    }

    /// Load a table from CSV text with a header row.
    /// Empty cells become null, numeric cells become numbers, everything else stays text.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| VizError::DataFormat {
                preview: format!("invalid CSV header: {}", e),
            })?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut records = Vec::new();
        for (row_idx, row) in rdr.records().enumerate() {
            let row = row.map_err(|e| VizError::DataFormat {
                preview: format!("invalid CSV row {}: {}", row_idx + 1, e),
            })?;
            let record: Record = headers
                .iter()
                .zip(row.iter())
                .map(|(h, cell)| (h.clone(), parse_csv_cell(cell)))
                .collect();
            records.push(record);
        }

        Ok(Self { records })
    }
}

fn parse_csv_cell(cell: &str) -> Scalar {
    if cell.is_empty() {
        Scalar::Null
    } else if let Ok(n) = cell.parse::<f64>() {
        Scalar::Number(n)
    } else {
        Scalar::Text(cell.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_scalar_numeric_reading() {
        assert_eq!(Scalar::Number(2.5).as_f64(), Some(2.5));
        assert_eq!(Scalar::Text(" 42 ".to_string()).as_f64(), Some(42.0));
        assert_eq!(Scalar::Bool(true).as_f64(), Some(1.0));
        assert_eq!(Scalar::Text("abc".to_string()).as_f64(), None);
        assert_eq!(Scalar::Null.as_f64(), None);
        assert_eq!(Scalar::Number(f64::INFINITY).as_f64(), None);
        assert_eq!(Scalar::Number(f64::NAN).as_f64(), None);
        assert_eq!(Scalar::Text("inf".to_string()).as_f64(), None);
    }

    #[test]
    fn test_scalar_display() {
        assert_eq!(Scalar::Number(2024.0).to_string(), "2024");
        assert_eq!(Scalar::Number(1.5).to_string(), "1.5");
        let date = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(Scalar::Timestamp(date).to_string(), "2024-03-01");
    }

    #[test]
    fn test_record_preserves_order_and_replaces() {
        let mut r = Record::new();
        r.insert("b", Scalar::Number(1.0));
        r.insert("a", Scalar::Number(2.0));
        r.insert("b", Scalar::Number(3.0));
        assert_eq!(r.columns().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(r.get("b"), Some(&Scalar::Number(3.0)));
    }

    #[test]
    fn test_table_columns_union() {
        let a = json!({"x": 1, "y": 2});
        let b = json!({"x": 3, "z": 4});
        let table = Table::new(vec![
            Record::from_json_object(a.as_object().unwrap()),
            Record::from_json_object(b.as_object().unwrap()),
        ]);
        assert_eq!(table.columns(), vec!["x", "y", "z"]);
        assert_eq!(table.first_missing(&["x", "y"]), Some("y"));
        assert_eq!(table.first_missing(&["x"]), None);
    }

    #[test]
    fn test_from_csv_reader() {
        let csv = "region,sales\nNorth,10\nSouth,\n";
        let table = Table::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.records()[0].get("region"),
            Some(&Scalar::Text("North".to_string()))
        );
        assert_eq!(table.records()[0].get("sales"), Some(&Scalar::Number(10.0)));
        assert_eq!(table.records()[1].get("sales"), Some(&Scalar::Null));
    }
}
