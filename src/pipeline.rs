// src/pipeline.rs

use anyhow::{anyhow, Context, Result};
use futures::future::join_all;
use reqwest::Client;
use std::{collections::HashSet, fs, path::Path, sync::Arc};
use tokio::{task, time::Instant};
use tracing::{info, warn};
use url::Url;

use crate::clean;
use crate::config::{Catalog, Country, FetchParams};
use crate::fetch::country::fetch_country;
use crate::store;
use crate::table::{Table, COUNTRY, YEAR};

/// True when `dir` is missing or holds no entries.
pub fn needs_acquisition(dir: &Path) -> Result<bool> {
    match fs::read_dir(dir) {
        Ok(mut entries) => Ok(entries.next().is_none()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(e).with_context(|| format!("listing {:?}", dir)),
    }
}

/// Fetch every catalog country concurrently and return the raw tables in catalog order.
///
/// Waits for every country before returning; the first failure in catalog order is
/// reported once all have finished.
pub async fn fetch_all_countries(
    client: &Client,
    base: &Url,
    catalog: Arc<Catalog>,
    params: &FetchParams,
) -> Result<Vec<(Country, Table)>> {
    let mut handles = Vec::with_capacity(catalog.countries.len());
    for country in &catalog.countries {
        let client = client.clone();
        let base = base.clone();
        let catalog = Arc::clone(&catalog);
        let params = params.clone();
        let c = country.clone();
        handles.push(task::spawn(async move {
            fetch_country(&client, &base, &catalog, &c, &params).await
        }));
    }

    let results = join_all(handles).await;

    let mut out = Vec::with_capacity(results.len());
    for (country, joined) in catalog.countries.iter().zip(results) {
        let table = joined
            .map_err(|e| anyhow!("fetch task for {} panicked: {}", country.code, e))?
            .with_context(|| format!("fetching {}", country.name))?;
        out.push((country.clone(), table));
    }
    info!(countries = out.len(), "data loading completed");
    Ok(out)
}

/// Clean each table; an empty table aborts the batch.
pub fn clean_all(tables: Vec<(Country, Table)>) -> Result<Vec<(Country, Table)>> {
    tables
        .into_iter()
        .map(|(country, table)| {
            let cleaned = clean::clean(&table)
                .ok_or_else(|| anyhow!("no data to clean for {}", country.name))?;
            Ok((country, cleaned))
        })
        .collect()
}

/// Keep only the indicator columns every table still has, so the tables share one schema.
pub fn harmonize(tables: Vec<(Country, Table)>) -> Vec<(Country, Table)> {
    let mut common: Option<HashSet<String>> = None;
    for (_, table) in &tables {
        let names: HashSet<String> = table
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        common = Some(match common {
            None => names,
            Some(prev) => prev.intersection(&names).cloned().collect(),
        });
    }
    let Some(common) = common else {
        return tables;
    };

    tables
        .into_iter()
        .map(|(country, table)| {
            let extra: Vec<String> = table
                .column_names()
                .into_iter()
                .filter(|n| *n != YEAR && *n != COUNTRY && !common.contains(*n))
                .map(str::to_string)
                .collect();
            if extra.is_empty() {
                (country, table)
            } else {
                warn!(country = %country.name, dropped = ?extra, "dropping columns missing from other countries");
                let trimmed = table.drop_columns(&extra[..]);
                (country, trimmed)
            }
        })
        .collect()
}

/// Full acquisition path: fetch, clean, align schemas, write one file per country.
pub async fn acquire(
    client: &Client,
    base: &Url,
    catalog: Arc<Catalog>,
    params: &FetchParams,
    data_dir: &Path,
) -> Result<()> {
    let start = Instant::now();
    let raw = fetch_all_countries(client, base, catalog, params).await?;
    let cleaned = harmonize(clean_all(raw)?);

    fs::create_dir_all(data_dir).with_context(|| format!("creating {:?}", data_dir))?;
    store::write_data(data_dir, &cleaned)?;
    info!(elapsed = ?start.elapsed(), dir = %data_dir.display(), "acquisition finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Indicator;
    use crate::locale::Locale;
    use crate::table::{Column, ColumnValues};
    use serde_json::json;
    use tempfile::tempdir;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,worlddash=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    fn tiny_catalog() -> Catalog {
        Catalog {
            indicators: vec![
                Indicator {
                    code: "SP.POP.TOTL".into(),
                    name: "Total Population".into(),
                },
                Indicator {
                    code: "NY.GDP.MKTP.CD".into(),
                    name: "GDP in USD".into(),
                },
            ],
            countries: vec![
                Country {
                    code: "US".into(),
                    name: "USA".into(),
                },
                Country {
                    code: "JP".into(),
                    name: "Japan".into(),
                },
            ],
        }
    }

    fn four_years() -> FetchParams {
        FetchParams {
            first_year: 2015,
            last_year: 2018,
            ..FetchParams::default()
        }
    }

    fn table(cols: &[&str]) -> Table {
        let mut columns: Vec<Column> = cols
            .iter()
            .map(|n| Column::new(*n, ColumnValues::Float(vec![Some(1.0)])))
            .collect();
        columns.push(Column::new(YEAR, ColumnValues::Int(vec![2018])));
        columns.push(Column::new(COUNTRY, ColumnValues::Text(vec!["X".into()])));
        Table::new(columns).unwrap()
    }

    #[test]
    fn acquisition_trigger() -> Result<()> {
        let dir = tempdir()?;
        assert!(needs_acquisition(&dir.path().join("missing"))?);
        assert!(needs_acquisition(dir.path())?);
        fs::write(dir.path().join("USA.csv"), "x")?;
        assert!(!needs_acquisition(dir.path())?);
        Ok(())
    }

    #[test]
    fn harmonize_intersects_indicators() {
        let us = Country {
            code: "US".into(),
            name: "USA".into(),
        };
        let out = harmonize(vec![
            (us.clone(), table(&["A", "B", "C"])),
            (us.clone(), table(&["A", "C"])),
            (us, table(&["C", "A", "D"])),
        ]);
        for (_, t) in &out {
            let mut names = t.column_names();
            names.sort();
            assert_eq!(names, vec!["A", "C", COUNTRY, YEAR]);
        }
    }

    #[tokio::test]
    async fn acquire_writes_aligned_files() -> Result<()> {
        init_test_logging();
        let server = MockServer::start().await;
        // population is shared; GDP is empty for Japan, so it is dropped everywhere
        Mock::given(method("GET"))
            .and(path_regex(r"^/countries/(us|jp)/indicators/SP\.POP\.TOTL$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"page": 1},
                [{"value": "4"}, {"value": null}, {"value": "2"}, {"value": "1"}]
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/countries/us/indicators/NY.GDP.MKTP.CD"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"page": 1},
                [{"value": 10.0}, {"value": 20.0}, {"value": null}, {"value": 40.0}]
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/countries/jp/indicators/NY.GDP.MKTP.CD"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"page": 1},
                [{"value": null}, {"value": null}, {"value": null}, {"value": ""}]
            ])))
            .mount(&server)
            .await;

        let dir = tempdir()?;
        let data_dir = dir.path().join("data");
        let catalog = Arc::new(tiny_catalog());
        acquire(
            &Client::new(),
            &Url::parse(&server.uri())?,
            Arc::clone(&catalog),
            &four_years(),
            &data_dir,
        )
        .await?;

        assert!(!needs_acquisition(&data_dir)?);
        let all = store::load_data(&data_dir, &catalog.countries, &Locale::default())?;
        assert_eq!(all.num_rows(), 8);
        assert_eq!(
            all.column_names(),
            vec!["Total Population", YEAR, COUNTRY]
        );
        let pop = all.column("Total Population").unwrap().values.as_floats().unwrap();
        assert_eq!(pop[1], Some(7.0 / 3.0));
        assert_eq!(pop.iter().filter(|v| v.is_none()).count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn transport_failure_aborts_batch() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        // nothing listens on port 9 on the loopback interface
        let base = Url::parse("http://127.0.0.1:9/")?;
        let res = acquire(
            &Client::new(),
            &base,
            Arc::new(tiny_catalog()),
            &four_years(),
            dir.path(),
        )
        .await;
        assert!(res.is_err());
        assert!(needs_acquisition(dir.path())?);
        Ok(())
    }
}
