use std::collections::HashMap;
use std::iter::FromIterator;
use std::str::FromStr;

use failure::*;
use log::*;

/// Read-only key/value settings the receiver blocks are built from.
pub trait Configuration {
    fn raw(&self, key: &str) -> Option<&str>;
}

/// Typed read of `key`, falling back to `default` when the key is absent or
/// its value does not parse as `T`.
pub fn property<T: FromStr>(cfg: &dyn Configuration, key: &str, default: T) -> T {
    match cfg.raw(key) {
        None => default,
        Some(value) => match value.trim().parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(
                    "unable to parse {} = {:?}, using the default value",
                    key, value
                );
                default
            }
        },
    }
}

#[derive(Clone, Debug, Default)]
pub struct InMemoryConfiguration {
    values: HashMap<String, String>,
}

impl InMemoryConfiguration {
    pub fn new() -> InMemoryConfiguration {
        InMemoryConfiguration {
            values: HashMap::new(),
        }
    }

    pub fn set<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.values.insert(key.into(), value.into());
    }

    /// Builds a configuration from `key=value` strings as given on the command line.
    pub fn from_overrides<I, S>(overrides: I) -> Result<InMemoryConfiguration, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cfg = InMemoryConfiguration::new();
        for item in overrides {
            let item = item.as_ref();
            match item.find('=') {
                Some(idx) if idx > 0 => {
                    cfg.set(item[..idx].trim(), item[idx + 1..].trim());
                }
                _ => return Err(format_err!("expected key=value, got {:?}", item)),
            }
        }
        Ok(cfg)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl Configuration for InMemoryConfiguration {
    fn raw(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for InMemoryConfiguration {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut cfg = InMemoryConfiguration::new();
        for (k, v) in iter {
            cfg.set(k, v);
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_yields_default() {
        let cfg = InMemoryConfiguration::new();
        assert_eq!(property(&cfg, "src.freq", 1.5f64), 1.5);
        assert_eq!(property(&cfg, "src.name", String::from("x")), "x");
    }

    #[test]
    fn present_key_is_parsed() {
        let cfg: InMemoryConfiguration = vec![("src.samples", " 5000 "), ("src.dump", "true")]
            .into_iter()
            .collect();
        assert_eq!(property(&cfg, "src.samples", 0u64), 5000);
        assert!(property(&cfg, "src.dump", false));
    }

    #[test]
    fn unparseable_value_yields_default() {
        let cfg: InMemoryConfiguration = vec![("src.samples", "-3")].into_iter().collect();
        assert_eq!(property(&cfg, "src.samples", 7u64), 7);
    }

    #[test]
    fn overrides_split_on_first_equals() {
        let cfg = InMemoryConfiguration::from_overrides(&["a.b=1", "a.path = x=y"]).unwrap();
        assert_eq!(cfg.raw("a.b"), Some("1"));
        assert_eq!(cfg.raw("a.path"), Some("x=y"));
        assert_eq!(cfg.len(), 2);
    }

    #[test]
    fn overrides_reject_missing_key() {
        assert!(InMemoryConfiguration::from_overrides(&["=1"]).is_err());
        assert!(InMemoryConfiguration::from_overrides(&["novalue"]).is_err());
    }
}
