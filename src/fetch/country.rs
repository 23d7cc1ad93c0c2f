// src/fetch/country.rs

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::task;
use tracing::{info, instrument, warn};
use url::Url;

use super::indicator::fetch_indicator;
use crate::config::{Catalog, Country, FetchParams};
use crate::table::{Column, ColumnValues, Table, COUNTRY, YEAR};

/// Fetch every catalog indicator for `country` concurrently and stack the results
/// into one table: indicator columns in catalog order, then `Year`, then `Country`.
///
/// Omitted indicators leave no column behind; the remaining columns keep their
/// pairing with the indicator that produced them.
#[instrument(level = "info", skip_all, fields(country = %country.code))]
pub async fn fetch_country(
    client: &Client,
    base: &Url,
    catalog: &Catalog,
    country: &Country,
    params: &FetchParams,
) -> Result<Table> {
    info!(name = %country.name, "loading data");

    let mut handles = Vec::with_capacity(catalog.indicators.len());
    for indicator in &catalog.indicators {
        let client = client.clone();
        let base = base.clone();
        let code = country.code.clone();
        let ind_code = indicator.code.clone();
        let params = params.clone();
        handles.push((
            indicator,
            task::spawn(async move {
                fetch_indicator(&client, &base, &code, &ind_code, &params).await
            }),
        ));
    }

    let years = params.years_descending();
    let mut columns = Vec::with_capacity(handles.len() + 2);
    for (indicator, handle) in handles {
        let fetched = handle
            .await
            .context("indicator fetch task panicked")?
            .with_context(|| format!("fetching {} for {}", indicator.code, country.code))?;
        if let Some(values) = fetched {
            let values = align_to_years(values, years.len(), &indicator.name);
            columns.push(Column::new(indicator.name.clone(), ColumnValues::Float(values)));
        }
    }

    if columns.len() < catalog.indicators.len() {
        warn!(
            fetched = columns.len(),
            expected = catalog.indicators.len(),
            "some indicators were omitted"
        );
    }

    columns.push(Column::new(YEAR, ColumnValues::Int(years.clone())));
    columns.push(Column::new(
        COUNTRY,
        ColumnValues::Text(vec![country.name.clone(); years.len()]),
    ));

    Table::new(columns).with_context(|| format!("assembling table for {}", country.name))
}

/// Pad with missing values or truncate so the column matches the year column.
fn align_to_years(mut values: Vec<Option<f64>>, n_years: usize, name: &str) -> Vec<Option<f64>> {
    if values.len() != n_years {
        warn!(
            column = %name,
            got = values.len(),
            expected = n_years,
            "indicator length does not match year range"
        );
        values.resize(n_years, None);
    }
    values
}
