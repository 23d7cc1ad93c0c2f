// src/config.rs

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fs, path::Path};

pub const DEFAULT_BASE_URL: &str = "http://api.worldbank.org/v2/";

/// One socio-economic metric: the API code and the column name it gets in a table.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Eq, Hash)]
pub struct Indicator {
    pub code: String,
    pub name: String,
}

/// One country: the code used in request paths and the name used for files and rows.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Eq, Hash)]
pub struct Country {
    pub code: String,
    pub name: String,
}

/// The fixed set of indicators and countries the dashboard covers.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Catalog {
    pub indicators: Vec<Indicator>,
    pub countries: Vec<Country>,
}

static WORLD_BANK_INDICATORS: &[(&str, &str)] = &[
    ("SP.POP.TOTL", "Total Population"),
    ("SP.POP.TOTL.FE.IN", "Female Population"),
    ("SP.POP.TOTL.MA.IN", "Male Population"),
    ("SL.IND.EMPL.ZS", "Employment in Industry(%)"),
    ("SL.AGR.EMPL.ZS", "Employment in Agriculture(%)"),
    ("SL.UEM.TOTL.ZS", "Unemployment(%)"),
    ("NY.GDP.MKTP.CD", "GDP in USD"),
    ("NY.ADJ.NNTY.PC.KD.ZG", "National Income per Capita"),
    ("NY.GSR.NFCY.CD", "Net income from Abroad"),
    ("EG.USE.ELEC.KH.PC", "Electric Power Consumption(kWH per capita)"),
    ("EG.FEC.RNEW.ZS", "Renewable Energy Consumption (%)"),
    ("EG.USE.COMM.FO.ZS", "Fossil Fuel Consumption (%)"),
];

static WORLD_BANK_COUNTRIES: &[(&str, &str)] = &[
    ("US", "USA"),
    ("IN", "India"),
    ("CN", "China"),
    ("JP", "Japan"),
    ("CA", "Canada"),
    ("GB", "Great Britain"),
    ("ZA", "South Africa"),
];

impl Catalog {
    /// The built-in catalog: twelve indicators, seven countries.
    pub fn world_bank() -> Self {
        Self {
            indicators: WORLD_BANK_INDICATORS
                .iter()
                .map(|&(code, name)| Indicator {
                    code: code.to_string(),
                    name: name.to_string(),
                })
                .collect(),
            countries: WORLD_BANK_COUNTRIES
                .iter()
                .map(|&(code, name)| Country {
                    code: code.to_string(),
                    name: name.to_string(),
                })
                .collect(),
        }
    }

    /// Load a catalog from a YAML file with the same shape as the built-in one.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).with_context(|| format!("reading catalog {:?}", path))?;
        let catalog: Catalog = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing catalog {:?}", path))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Reject empty catalogs and duplicate codes or names.
    pub fn validate(&self) -> Result<()> {
        if self.indicators.is_empty() || self.countries.is_empty() {
            bail!("catalog needs at least one indicator and one country");
        }
        let mut seen = HashSet::new();
        for ind in &self.indicators {
            if !seen.insert(("indicator", ind.code.as_str()))
                || !seen.insert(("column", ind.name.as_str()))
            {
                bail!("duplicate indicator {} ({})", ind.code, ind.name);
            }
        }
        for c in &self.countries {
            if !seen.insert(("country", c.code.as_str()))
                || !seen.insert(("file", c.name.as_str()))
            {
                bail!("duplicate country {} ({})", c.code, c.name);
            }
        }
        Ok(())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::world_bank()
    }
}

/// Query parameters sent with every indicator request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchParams {
    pub format: String,
    pub per_page: u32,
    pub first_year: i32,
    pub last_year: i32,
}

impl Default for FetchParams {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            per_page: 100,
            first_year: 1960,
            last_year: 2018,
        }
    }
}

impl FetchParams {
    pub fn date_range(&self) -> String {
        format!("{}:{}", self.first_year, self.last_year)
    }

    pub fn as_query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("format", self.format.clone()),
            ("per_page", self.per_page.to_string()),
            ("date", self.date_range()),
        ]
    }

    /// Years covered by a table, newest first, matching the API's ordering.
    pub fn years_descending(&self) -> Vec<i32> {
        (self.first_year..=self.last_year).rev().collect()
    }
}
