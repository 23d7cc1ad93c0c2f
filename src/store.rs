// src/store.rs

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use std::{
    fs::File,
    io::{Read, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

use crate::config::Country;
use crate::locale::Translate;
use crate::table::{Column, ColumnValues, Table, COUNTRY, YEAR};

/// `<dir>/<Country Name>.csv`
pub fn data_file(dir: &Path, country: &Country) -> PathBuf {
    dir.join(format!("{}.csv", country.name))
}

/// An open file that logs its release however the enclosing scope exits.
struct ScopedFile {
    file: File,
    path: PathBuf,
}

impl Drop for ScopedFile {
    fn drop(&mut self) {
        debug!(path = ?self.path, "closing the file");
    }
}

/// Create `path`, hand the file to `f`, and close it on return or error.
pub fn with_file<T>(path: &Path, f: impl FnOnce(&mut File) -> Result<T>) -> Result<T> {
    debug!(?path, "opening the file");
    let mut scoped = ScopedFile {
        file: File::create(path).with_context(|| format!("creating {:?}", path))?,
        path: path.to_path_buf(),
    };
    f(&mut scoped.file)
}

/// Serialize `table` as CSV: header row, no index, missing values as empty fields.
pub fn write_table<W: Write>(w: W, table: &Table) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(w);
    wtr.write_record(table.column_names())?;
    for row in 0..table.num_rows() {
        wtr.write_record(table.columns().iter().map(|c| c.values.cell(row)))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write each table to its country's file, in the order given.
///
/// Files already written stay on disk if a later one fails.
pub fn write_data(dir: &Path, tables: &[(Country, Table)]) -> Result<()> {
    for (country, table) in tables {
        info!(country = %country.name, "writing data");
        let path = data_file(dir, country);
        with_file(&path, |file| write_table(file, table))
            .with_context(|| format!("writing data for {}", country.name))?;
        info!(path = %path.display(), rows = table.num_rows(), "successfully created");
    }
    Ok(())
}

/// Parse a CSV written by [`write_table`]. `Year` is read as integers, `Country`
/// as text, and every other column as optional floats.
pub fn read_table<R: Read>(r: R) -> Result<Table> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(r);
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();

    let mut columns: Vec<Column> = headers
        .iter()
        .map(|h| {
            let values = match h.as_str() {
                YEAR => ColumnValues::Int(Vec::new()),
                COUNTRY => ColumnValues::Text(Vec::new()),
                _ => ColumnValues::Float(Vec::new()),
            };
            Column::new(h.clone(), values)
        })
        .collect();

    for (idx, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error at record {}", idx))?;
        for (col, field) in columns.iter_mut().zip(record.iter()) {
            let field = field.trim();
            match &mut col.values {
                ColumnValues::Int(v) => v.push(parse_year(field).with_context(|| {
                    format!("bad {} value {:?} at record {}", col.name, field, idx)
                })?),
                ColumnValues::Text(v) => v.push(field.to_string()),
                ColumnValues::Float(v) if field.is_empty() => v.push(None),
                ColumnValues::Float(v) => v.push(Some(field.parse::<f64>().with_context(
                    || format!("bad {} value {:?} at record {}", col.name, field, idx),
                )?)),
            }
        }
    }

    Table::new(columns)
}

fn parse_year(field: &str) -> Result<i32> {
    if let Ok(y) = field.parse::<i32>() {
        return Ok(y);
    }
    let f: f64 = field.parse()?;
    if f.fract() != 0.0 {
        bail!("year {} is not a whole number", field);
    }
    Ok(f as i32)
}

/// Read one country file and translate its `Country` column.
#[instrument(level = "info", skip(path, translator), fields(path = %path.display()))]
pub fn load_country_file<T: Translate + ?Sized>(path: &Path, translator: &T) -> Result<Table> {
    let file = File::open(path).with_context(|| format!("opening {:?}", path))?;
    let table = read_table(file).with_context(|| format!("reading {:?}", path))?;
    translate_countries(table, translator)
}

/// Replace every `Country` cell with its `country.<name>` translation.
pub fn translate_countries<T: Translate + ?Sized>(table: Table, translator: &T) -> Result<Table> {
    let columns = table
        .into_columns()
        .into_iter()
        .map(|col| match col.values {
            ColumnValues::Text(names) if col.name == COUNTRY => Column::new(
                col.name,
                ColumnValues::Text(names.iter().map(|n| translator.country(n)).collect()),
            ),
            _ => col,
        })
        .collect();
    Table::new(columns)
}

/// Read every country's file, in catalog order, into one combined table.
pub fn load_data<T: Translate + ?Sized>(
    dir: &Path,
    countries: &[Country],
    translator: &T,
) -> Result<Table> {
    let mut tables = Vec::with_capacity(countries.len());
    for country in countries {
        tables.push(load_country_file(&data_file(dir, country), translator)?);
    }
    info!(files = tables.len(), "successfully read all the files");
    Table::concat(&tables)
}
