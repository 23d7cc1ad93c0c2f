// src/locale.rs

use anyhow::{bail, Context, Result};
use serde_yaml::Value;
use std::{collections::HashMap, fs, path::Path};

/// Key → display string lookup (`country.USA`, `general.no_data`).
pub trait Translate {
    /// Resolve `key`; unknown keys resolve to the key itself.
    fn t(&self, key: &str) -> String;

    fn country(&self, name: &str) -> String {
        self.t(&format!("country.{}", name))
    }

    fn general(&self, key: &str) -> String {
        self.t(&format!("general.{}", key))
    }
}

/// Translations for one locale, read from `<dir>/<locale>.yml`.
#[derive(Debug, Clone, Default)]
pub struct Locale {
    pub name: String,
    entries: HashMap<String, String>,
}

impl Locale {
    pub fn load<P: AsRef<Path>>(dir: P, locale: &str) -> Result<Self> {
        let path = dir.as_ref().join(format!("{}.yml", locale));
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading locale file {:?}", path))?;
        Self::from_yaml_str(locale, &text).with_context(|| format!("parsing {:?}", path))
    }

    pub fn from_yaml_str(locale: &str, text: &str) -> Result<Self> {
        let root: Value = serde_yaml::from_str(text)?;
        let mut entries = HashMap::new();
        match root {
            Value::Mapping(_) => flatten("", &root, &mut entries),
            Value::Null => {}
            _ => bail!("locale {} must be a mapping", locale),
        }
        Ok(Self {
            name: locale.to_string(),
            entries,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn flatten(prefix: &str, v: &Value, out: &mut HashMap<String, String>) {
    match v {
        Value::Mapping(m) => {
            for (k, child) in m {
                let k = match k {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => continue,
                };
                let key = if prefix.is_empty() {
                    k
                } else {
                    format!("{}.{}", prefix, k)
                };
                flatten(&key, child, out);
            }
        }
        Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        Value::Number(n) => {
            out.insert(prefix.to_string(), n.to_string());
        }
        Value::Bool(b) => {
            out.insert(prefix.to_string(), b.to_string());
        }
        _ => {}
    }
}

impl Translate for Locale {
    fn t(&self, key: &str) -> String {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PT: &str = "
general:
  app_title: Painel
  no_data: Sem dados
country:
  USA: EUA
  Great Britain: Grã-Bretanha
";

    #[test]
    fn nested_keys_resolve() -> Result<()> {
        let loc = Locale::from_yaml_str("pt", PT)?;
        assert_eq!(loc.t("general.no_data"), "Sem dados");
        assert_eq!(loc.country("Great Britain"), "Grã-Bretanha");
        assert_eq!(loc.general("app_title"), "Painel");
        Ok(())
    }

    #[test]
    fn unknown_key_is_itself() -> Result<()> {
        let loc = Locale::from_yaml_str("pt", PT)?;
        assert_eq!(loc.t("general.gdp"), "general.gdp");
        Ok(())
    }

    #[test]
    fn loads_from_dir() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("pt.yml"), PT)?;
        let loc = Locale::load(dir.path(), "pt")?;
        assert_eq!(loc.name, "pt");
        assert_eq!(loc.len(), 4);
        assert!(Locale::load(dir.path(), "xx").is_err());
        Ok(())
    }
}
