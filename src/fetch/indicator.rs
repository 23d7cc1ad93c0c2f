// src/fetch/indicator.rs

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::FetchParams;

/// Build `{base}/countries/{country}/indicators/{indicator}`.
pub fn indicator_url(base: &Url, country_code: &str, indicator_code: &str) -> Result<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    let rel = format!(
        "countries/{}/indicators/{}",
        country_code.to_lowercase(),
        indicator_code
    );
    base.join(&rel)
        .with_context(|| format!("joining {} onto {}", rel, base))
}

/// GET one indicator series for one country.
///
/// `Ok(None)` means the indicator is omitted: the server answered with a non-200
/// status, an error envelope, or a body that is not the expected two-element array.
/// Transport failures are returned as `Err` and abort the caller.
pub async fn fetch_indicator(
    client: &Client,
    base: &Url,
    country_code: &str,
    indicator_code: &str,
    params: &FetchParams,
) -> Result<Option<Vec<Option<f64>>>> {
    let url = indicator_url(base, country_code, indicator_code)?;
    debug!(%url, "sending request");

    let resp = client
        .get(url.clone())
        .query(&params.as_query())
        .send()
        .await
        .with_context(|| format!("GET {} failed", url))?;

    let status = resp.status();
    if status != StatusCode::OK {
        warn!(country = %country_code, indicator = %indicator_code, status = status.as_u16(), "error loading indicator");
        return Ok(None);
    }

    let body = resp
        .text()
        .await
        .with_context(|| format!("reading body from {}", url))?;
    let envelope: Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(e) => {
            warn!(country = %country_code, indicator = %indicator_code, error = %e, "response is not JSON");
            return Ok(None);
        }
    };

    let column = parse_envelope(&envelope);
    if column.is_none() {
        warn!(country = %country_code, indicator = %indicator_code, "error envelope or no data");
    }
    Ok(column)
}

/// Decode `[metadata, [{"value": ...}, ...]]` into one value per entry, newest first.
pub fn parse_envelope(envelope: &Value) -> Option<Vec<Option<f64>>> {
    let parts = envelope.as_array()?;
    let meta = parts.first()?.as_object()?;
    if meta.contains_key("message") {
        return None;
    }
    let entries = parts.get(1)?.as_array()?;
    Some(
        entries
            .iter()
            .map(|entry| parse_value(entry.get("value").unwrap_or(&Value::Null)))
            .collect(),
    )
}

fn parse_value(v: &Value) -> Option<f64> {
    match v {
        Value::Null => None,
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(x) => Some(x),
            Err(_) => {
                warn!(value = %s, "unparseable indicator value treated as missing");
                None
            }
        },
        other => {
            warn!(value = %other, "unexpected indicator value type treated as missing");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn parses_strings_and_nulls() {
        let env = json!([
            {"page": 1, "pages": 1},
            [{"value": "100"}, {"value": null}, {"value": "300"}]
        ]);
        assert_eq!(
            parse_envelope(&env),
            Some(vec![Some(100.0), None, Some(300.0)])
        );
    }

    #[test]
    fn parses_numbers_and_empty_strings() {
        let env = json!([{}, [{"value": 1.5}, {"value": ""}, {"date": "2016"}]]);
        assert_eq!(parse_envelope(&env), Some(vec![Some(1.5), None, None]));
    }

    #[test]
    fn error_envelope_is_omitted() {
        let env = json!([{"message": [{"id": "120", "value": "Invalid value"}]}]);
        assert_eq!(parse_envelope(&env), None);
    }

    #[test]
    fn short_or_null_envelope_is_omitted() {
        assert_eq!(parse_envelope(&json!([{"page": 1}])), None);
        assert_eq!(parse_envelope(&json!([{"page": 1}, null])), None);
        assert_eq!(parse_envelope(&json!({"page": 1})), None);
    }

    #[test]
    fn url_layout() -> Result<()> {
        let base = Url::parse("http://api.worldbank.org/v2")?;
        let url = indicator_url(&base, "US", "SP.POP.TOTL")?;
        assert_eq!(
            url.as_str(),
            "http://api.worldbank.org/v2/countries/us/indicators/SP.POP.TOTL"
        );
        Ok(())
    }

    #[tokio::test]
    async fn fetch_sends_query_and_parses() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/countries/jp/indicators/SP.POP.TOTL"))
            .and(query_param("format", "json"))
            .and(query_param("per_page", "100"))
            .and(query_param("date", "1960:2018"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"page": 1}, [{"value": "7"}, {"value": null}]])),
            )
            .mount(&server)
            .await;

        let base = Url::parse(&server.uri())?;
        let col = fetch_indicator(
            &Client::new(),
            &base,
            "JP",
            "SP.POP.TOTL",
            &FetchParams::default(),
        )
        .await?;
        assert_eq!(col, Some(vec![Some(7.0), None]));
        Ok(())
    }

    #[tokio::test]
    async fn non_200_is_omitted_not_raised() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let base = Url::parse(&server.uri())?;
        let col = fetch_indicator(
            &Client::new(),
            &base,
            "JP",
            "SP.POP.TOTL",
            &FetchParams::default(),
        )
        .await?;
        assert_eq!(col, None);
        Ok(())
    }
}
