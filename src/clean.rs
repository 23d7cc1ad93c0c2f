// src/clean.rs

use tracing::{info, warn};

use crate::table::{Column, ColumnValues, Table, COUNTRY};

/// Columns with strictly more missing values than this percentage are dropped.
pub const MISSING_THRESHOLD_PCT: f64 = 75.0;

fn label(table: &Table) -> String {
    table
        .column(COUNTRY)
        .and_then(|c| c.values.as_texts())
        .and_then(|v| v.first().cloned())
        .unwrap_or_else(|| "<unknown>".to_string())
}

/// Drop every column whose missing percentage is above `threshold_pct`.
///
/// Returns `None` for a table with no rows. Year and country columns have no
/// missing representation and are never dropped.
pub fn drop_sparse_columns(table: &Table, threshold_pct: f64) -> Option<Table> {
    if table.num_rows() == 0 {
        info!("no table received");
        return None;
    }
    let country = label(table);
    info!(%country, "removing missing features");

    let to_drop: Vec<&str> = table
        .columns()
        .iter()
        .filter(|c| c.missing_percentage() > threshold_pct)
        .map(|c| c.name.as_str())
        .collect();

    if to_drop.is_empty() {
        info!(%country, "no columns dropped");
    } else {
        info!(%country, dropped = ?to_drop, "dropped columns");
    }
    Some(table.drop_columns(&to_drop[..]))
}

/// Replace missing values in every indicator column with that column's mean.
///
/// Returns `None` for a table with no rows. A column with no values at all has no
/// mean and is left untouched.
pub fn fill_missing_values(table: &Table) -> Option<Table> {
    if table.num_rows() == 0 {
        info!("no table received");
        return None;
    }
    let country = label(table);
    info!(%country, "filling missing features");

    let columns = table
        .columns()
        .iter()
        .map(|col| match &col.values {
            ColumnValues::Float(values) => {
                Column::new(col.name.clone(), ColumnValues::Float(impute_mean(&col.name, values)))
            }
            _ => col.clone(),
        })
        .collect();

    info!(%country, "filling missing values completed");
    Table::new(columns).ok()
}

fn impute_mean(name: &str, values: &[Option<f64>]) -> Vec<Option<f64>> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.len() == values.len() {
        return values.to_vec();
    }
    if present.is_empty() {
        warn!(column = %name, "column has no values; mean undefined, left missing");
        return values.to_vec();
    }
    let mean = present.iter().sum::<f64>() / present.len() as f64;
    values.iter().map(|v| Some(v.unwrap_or(mean))).collect()
}

/// Both cleaning stages, in order.
pub fn clean(table: &Table) -> Option<Table> {
    let trimmed = drop_sparse_columns(table, MISSING_THRESHOLD_PCT)?;
    fill_missing_values(&trimmed)
}
