// src/table.rs

use anyhow::{bail, Result};
use std::collections::HashSet;

/// Column holding the observation year.
pub const YEAR: &str = "Year";
/// Column holding the country name.
pub const COUNTRY: &str = "Country";

pub const TOTAL_POPULATION: &str = "Total Population";
pub const GDP_USD: &str = "GDP in USD";
pub const ELECTRIC_POWER: &str = "Electric Power Consumption(kWH per capita)";

/// Typed storage for one column. Indicator values may be missing; years and names may not.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Float(Vec<Option<f64>>),
    Int(Vec<i32>),
    Text(Vec<String>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Float(v) => v.len(),
            ColumnValues::Int(v) => v.len(),
            ColumnValues::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn missing_count(&self) -> usize {
        match self {
            ColumnValues::Float(v) => v.iter().filter(|x| x.is_none()).count(),
            _ => 0,
        }
    }

    pub fn as_floats(&self) -> Option<&[Option<f64>]> {
        match self {
            ColumnValues::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_ints(&self) -> Option<&[i32]> {
        match self {
            ColumnValues::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_texts(&self) -> Option<&[String]> {
        match self {
            ColumnValues::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Render one cell for CSV output; missing values become an empty field.
    pub fn cell(&self, row: usize) -> String {
        match self {
            ColumnValues::Float(v) => v[row].map(|x| x.to_string()).unwrap_or_default(),
            ColumnValues::Int(v) => v[row].to_string(),
            ColumnValues::Text(v) => v[row].clone(),
        }
    }

    fn take(&self, rows: &[usize]) -> Self {
        match self {
            ColumnValues::Float(v) => ColumnValues::Float(rows.iter().map(|&i| v[i]).collect()),
            ColumnValues::Int(v) => ColumnValues::Int(rows.iter().map(|&i| v[i]).collect()),
            ColumnValues::Text(v) => {
                ColumnValues::Text(rows.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }

    fn empty_like(&self) -> Self {
        match self {
            ColumnValues::Float(_) => ColumnValues::Float(Vec::new()),
            ColumnValues::Int(_) => ColumnValues::Int(Vec::new()),
            ColumnValues::Text(_) => ColumnValues::Text(Vec::new()),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ColumnValues::Float(_) => "float",
            ColumnValues::Int(_) => "int",
            ColumnValues::Text(_) => "text",
        }
    }

    /// Append `other`, or `n` missing values when `other` is `None`.
    fn extend_from(&mut self, other: Option<&ColumnValues>, n: usize, name: &str) -> Result<()> {
        match (self, other) {
            (ColumnValues::Float(a), Some(ColumnValues::Float(b))) => a.extend_from_slice(b),
            (ColumnValues::Int(a), Some(ColumnValues::Int(b))) => a.extend_from_slice(b),
            (ColumnValues::Text(a), Some(ColumnValues::Text(b))) => a.extend(b.iter().cloned()),
            (ColumnValues::Float(a), None) => a.extend(std::iter::repeat(None).take(n)),
            (ColumnValues::Text(a), None) => a.extend(std::iter::repeat(String::new()).take(n)),
            (ColumnValues::Int(_), None) => {
                bail!("column {} cannot be filled: integer columns have no missing value", name)
            }
            (a, Some(b)) => bail!(
                "column {} has kind {} in one table and {} in another",
                name,
                a.kind(),
                b.kind()
            ),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

impl Column {
    pub fn new(name: impl Into<String>, values: ColumnValues) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Share of missing cells, in percent. Columns without a missing representation report 0.
    pub fn missing_percentage(&self) -> f64 {
        let n = self.values.len();
        if n == 0 {
            return 0.0;
        }
        self.values.missing_count() as f64 / n as f64 * 100.0
    }
}

/// An immutable, column-oriented table. Every column has the same length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut names = HashSet::new();
        for col in &columns {
            if !names.insert(col.name.as_str()) {
                bail!("duplicate column {}", col.name);
            }
        }
        if let Some(first) = columns.first() {
            let n = first.values.len();
            if let Some(bad) = columns.iter().find(|c| c.values.len() != n) {
                bail!(
                    "column {} has {} rows, expected {}",
                    bad.name,
                    bad.values.len(),
                    n
                );
            }
        }
        Ok(Self { columns })
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// New table holding only `rows`, in the given order.
    pub fn take_rows(&self, rows: &[usize]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), c.values.take(rows)))
                .collect(),
        }
    }

    /// New table holding exactly `names`, in that order.
    pub fn project<S: AsRef<str>>(&self, names: &[S]) -> Result<Table> {
        let mut out = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            match self.column(name) {
                Some(c) => out.push(c.clone()),
                None => bail!("unknown column {}", name),
            }
        }
        Table::new(out)
    }

    /// New table without the named columns.
    pub fn drop_columns<S: AsRef<str>>(&self, names: &[S]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .filter(|c| !names.iter().any(|n| n.as_ref() == c.name))
                .cloned()
                .collect(),
        }
    }

    /// Row-wise union of `tables`. Columns are matched by name in first-seen order;
    /// a table lacking a column contributes missing values for it.
    pub fn concat(tables: &[Table]) -> Result<Table> {
        let mut columns: Vec<Column> = Vec::new();
        for table in tables {
            for col in &table.columns {
                if !columns.iter().any(|c| c.name == col.name) {
                    columns.push(Column::new(col.name.clone(), col.values.empty_like()));
                }
            }
        }
        for table in tables {
            let n = table.num_rows();
            for out in columns.iter_mut() {
                let src = table.column(&out.name).map(|c| &c.values);
                out.values.extend_from(src, n, &out.name)?;
            }
        }
        Table::new(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(country: &str, gdp: Vec<Option<f64>>) -> Table {
        let n = gdp.len();
        Table::new(vec![
            Column::new("GDP in USD", ColumnValues::Float(gdp)),
            Column::new(YEAR, ColumnValues::Int((0..n as i32).map(|i| 2018 - i).collect())),
            Column::new(COUNTRY, ColumnValues::Text(vec![country.to_string(); n])),
        ])
        .unwrap()
    }

    #[test]
    fn rejects_ragged_columns() {
        let res = Table::new(vec![
            Column::new("a", ColumnValues::Int(vec![1, 2])),
            Column::new("b", ColumnValues::Int(vec![1])),
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn project_and_take() {
        let t = sample("USA", vec![Some(1.0), None, Some(3.0)]);
        let p = t.project(&[COUNTRY, "GDP in USD"]).unwrap();
        assert_eq!(p.column_names(), vec![COUNTRY, "GDP in USD"]);
        let r = p.take_rows(&[2, 0]);
        assert_eq!(
            r.column("GDP in USD").unwrap().values,
            ColumnValues::Float(vec![Some(3.0), Some(1.0)])
        );
        assert!(t.project(&["nope"]).is_err());
    }

    #[test]
    fn concat_fills_absent_columns() {
        let a = sample("USA", vec![Some(1.0), Some(2.0)]);
        let b = sample("Japan", vec![Some(5.0)]).drop_columns(&["GDP in USD"]);
        let c = Table::concat(&[a, b]).unwrap();
        assert_eq!(c.num_rows(), 3);
        assert_eq!(
            c.column("GDP in USD").unwrap().values,
            ColumnValues::Float(vec![Some(1.0), Some(2.0), None])
        );
        assert_eq!(c.column(YEAR).unwrap().values.as_ints().unwrap(), &[2018, 2017, 2018]);
    }

    #[test]
    fn missing_percentage() {
        let c = Column::new("x", ColumnValues::Float(vec![None, None, None, Some(1.0)]));
        assert_eq!(c.missing_percentage(), 75.0);
        let y = Column::new(YEAR, ColumnValues::Int(vec![1, 2]));
        assert_eq!(y.missing_percentage(), 0.0);
    }
}
