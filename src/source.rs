// src/source.rs

use anyhow::{bail, Result};
use std::collections::{BTreeSet, HashSet};

use crate::table::{Table, COUNTRY, GDP_USD, TOTAL_POPULATION, YEAR};

/// Read-only view over the combined table that the dashboard queries.
#[derive(Debug, Clone)]
pub struct DataSource {
    data: Table,
}

impl DataSource {
    pub fn new(data: Table) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &Table {
        &self.data
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.data.column(name).is_some()
    }

    /// Rows whose country is in `countries` and whose year is in `years`, projected
    /// onto `columns` in the order given. Row order is preserved; empty selections
    /// give an empty table.
    pub fn filter<S: AsRef<str>>(
        &self,
        countries: &[String],
        years: &[i32],
        columns: &[S],
    ) -> Result<Table> {
        let (Some(country_col), Some(year_col)) = (
            self.data.column(COUNTRY).and_then(|c| c.values.as_texts()),
            self.data.column(YEAR).and_then(|c| c.values.as_ints()),
        ) else {
            bail!("table has no {} / {} columns to filter on", COUNTRY, YEAR);
        };

        let countries: HashSet<&str> = countries.iter().map(String::as_str).collect();
        let years: HashSet<i32> = years.iter().copied().collect();

        let rows: Vec<usize> = country_col
            .iter()
            .zip(year_col)
            .enumerate()
            .filter(|(_, (c, y))| countries.contains(c.as_str()) && years.contains(*y))
            .map(|(i, _)| i)
            .collect();

        self.data.project(columns).map(|t| t.take_rows(&rows))
    }

    pub fn all_years(&self) -> Vec<i32> {
        self.data
            .column(YEAR)
            .and_then(|c| c.values.as_ints())
            .map(<[i32]>::to_vec)
            .unwrap_or_default()
    }

    /// Distinct years, ascending.
    pub fn unique_years(&self) -> Vec<i32> {
        self.all_years()
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// The first ten distinct years in table order.
    pub fn last_10_years(&self) -> Vec<i32> {
        let mut seen = HashSet::new();
        self.all_years()
            .into_iter()
            .filter(|y| seen.insert(*y))
            .take(10)
            .collect()
    }

    /// The latest fifteen distinct years, ascending; the initial year selection.
    pub fn default_years(&self) -> Vec<i32> {
        let years = self.unique_years();
        let skip = years.len().saturating_sub(15);
        years[skip..].to_vec()
    }

    pub fn all_countries(&self) -> Vec<String> {
        self.data
            .column(COUNTRY)
            .and_then(|c| c.values.as_texts())
            .map(<[String]>::to_vec)
            .unwrap_or_default()
    }

    /// Distinct countries, sorted lexicographically.
    pub fn unique_countries(&self) -> Vec<String> {
        self.all_countries()
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn all_population(&self) -> Vec<Option<f64>> {
        self.floats(TOTAL_POPULATION)
    }

    pub fn all_gdp(&self) -> Vec<Option<f64>> {
        self.floats(GDP_USD)
    }

    fn floats(&self, name: &str) -> Vec<Option<f64>> {
        self.data
            .column(name)
            .and_then(|c| c.values.as_floats())
            .map(<[Option<f64>]>::to_vec)
            .unwrap_or_default()
    }
}
