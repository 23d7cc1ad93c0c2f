// src/views.rs
//
// Chart-ready data for the three dashboard charts. Drawing is left to the front end.

use anyhow::Result;
use serde::Serialize;
use tracing::warn;

use crate::locale::Translate;
use crate::source::DataSource;
use crate::table::{Table, COUNTRY, ELECTRIC_POWER, GDP_USD, TOTAL_POPULATION, YEAR};

#[derive(Debug, Serialize, PartialEq)]
pub struct Bar {
    pub country: String,
    pub year: i32,
    pub value: f64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// One line or one colour group: all points for a single country.
#[derive(Debug, Serialize, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<Point>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartView {
    NoData {
        message: String,
    },
    Bar {
        x_label: String,
        y_label: String,
        color_label: String,
        bars: Vec<Bar>,
    },
    Line {
        x_label: String,
        y_label: String,
        series: Vec<Series>,
    },
    Scatter {
        x_label: String,
        y_label: String,
        series: Vec<Series>,
    },
}

impl ChartView {
    pub fn is_empty(&self) -> bool {
        matches!(self, ChartView::NoData { .. })
    }
}

/// Filter for `columns`, or `None` when the selection is empty or a column was
/// dropped during cleaning.
fn select(
    source: &DataSource,
    countries: &[String],
    years: &[i32],
    columns: &[&str],
) -> Result<Option<Table>> {
    if let Some(missing) = columns.iter().find(|c| !source.has_column(c)) {
        warn!(column = %missing, "chart column not in data");
        return Ok(None);
    }
    let table = source.filter(countries, years, columns)?;
    Ok((table.num_rows() > 0).then_some(table))
}

fn no_data<T: Translate + ?Sized>(tr: &T) -> ChartView {
    ChartView::NoData {
        message: tr.general("no_data"),
    }
}

/// Rows of `(country, x, y)` with both values present.
fn triples<'a>(table: &'a Table, x: &[f64], y: &'a [Option<f64>]) -> Vec<(&'a str, f64, f64)> {
    let names = table
        .column(COUNTRY)
        .and_then(|c| c.values.as_texts())
        .unwrap_or_default();
    names
        .iter()
        .zip(x.iter().copied())
        .zip(y.iter())
        .filter_map(|((n, x), y)| y.map(|y| (n.as_str(), x, y)))
        .collect()
}

/// Group points by country, keeping countries in first-seen order.
fn group(rows: Vec<(&str, f64, f64)>) -> Vec<Series> {
    let mut out: Vec<Series> = Vec::new();
    for (name, x, y) in rows {
        match out.iter_mut().find(|s| s.name == name) {
            Some(s) => s.points.push(Point { x, y }),
            None => out.push(Series {
                name: name.to_string(),
                points: vec![Point { x, y }],
            }),
        }
    }
    out
}

/// Total population per country, one bar per selected year.
pub fn bar_chart<T: Translate + ?Sized>(
    source: &DataSource,
    countries: &[String],
    years: &[i32],
    tr: &T,
) -> Result<ChartView> {
    let Some(table) = select(source, countries, years, &[TOTAL_POPULATION, COUNTRY, YEAR])? else {
        return Ok(no_data(tr));
    };
    let pop = table
        .column(TOTAL_POPULATION)
        .and_then(|c| c.values.as_floats())
        .unwrap_or_default();
    let yrs = table
        .column(YEAR)
        .and_then(|c| c.values.as_ints())
        .unwrap_or_default();
    let names = table
        .column(COUNTRY)
        .and_then(|c| c.values.as_texts())
        .unwrap_or_default();

    let bars = names
        .iter()
        .zip(yrs)
        .zip(pop)
        .filter_map(|((country, &year), value)| {
            value.map(|value| Bar {
                country: country.clone(),
                year,
                value,
            })
        })
        .collect();

    Ok(ChartView::Bar {
        x_label: tr.general("country"),
        y_label: tr.general("population"),
        color_label: tr.general("years"),
        bars,
    })
}

/// GDP over time, one line per country, years ascending.
pub fn line_chart<T: Translate + ?Sized>(
    source: &DataSource,
    countries: &[String],
    years: &[i32],
    tr: &T,
) -> Result<ChartView> {
    let Some(table) = select(source, countries, years, &[COUNTRY, YEAR, GDP_USD])? else {
        return Ok(no_data(tr));
    };
    let x: Vec<f64> = table
        .column(YEAR)
        .and_then(|c| c.values.as_ints())
        .unwrap_or_default()
        .iter()
        .map(|&y| f64::from(y))
        .collect();
    let gdp = table
        .column(GDP_USD)
        .and_then(|c| c.values.as_floats())
        .unwrap_or_default();

    let mut series = group(triples(&table, &x, gdp));
    for s in &mut series {
        s.points.sort_by(|a, b| a.x.total_cmp(&b.x));
    }

    Ok(ChartView::Line {
        x_label: tr.general("years"),
        y_label: tr.general("gdp"),
        series,
    })
}

/// Electric power consumption against population, one colour per country.
pub fn scatter_chart<T: Translate + ?Sized>(
    source: &DataSource,
    countries: &[String],
    years: &[i32],
    tr: &T,
) -> Result<ChartView> {
    let Some(table) = select(
        source,
        countries,
        years,
        &[TOTAL_POPULATION, ELECTRIC_POWER, COUNTRY],
    )?
    else {
        return Ok(no_data(tr));
    };
    let pop = table
        .column(TOTAL_POPULATION)
        .and_then(|c| c.values.as_floats())
        .unwrap_or_default();
    let elec = table
        .column(ELECTRIC_POWER)
        .and_then(|c| c.values.as_floats())
        .unwrap_or_default();

    let rows: Vec<(usize, f64)> = pop
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.map(|p| (i, p)))
        .collect();
    let x: Vec<f64> = rows.iter().map(|&(_, p)| p).collect();
    let y: Vec<Option<f64>> = rows.iter().map(|&(i, _)| elec[i]).collect();
    let kept = table.take_rows(&rows.iter().map(|&(i, _)| i).collect::<Vec<_>>());

    Ok(ChartView::Scatter {
        x_label: tr.general("population"),
        y_label: tr.general("electric"),
        series: group(triples(&kept, &x, &y)),
    })
}
