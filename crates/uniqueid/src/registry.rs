use core::str::FromStr;

use crate::error::{Error, Result};

/// The allow-list of partition keys accepted by a
/// [`SharedCounterGenerator`](crate::SharedCounterGenerator).
///
/// Loaded once at startup and never mutated afterwards, so it can be shared
/// freely between threads without locking.
///
/// Membership is **exact and case-sensitive**. Storage keys, on the other hand,
/// are upper-cased by the generator, so `"order"` and `"ORDER"` map to the same
/// counter even though only the spelling that was registered is accepted.
///
/// ```
/// use uniqueid::KeyRegistry;
///
/// let registry: KeyRegistry = "order,user".parse()?;
/// assert!(registry.is_valid("order"));
/// assert!(!registry.is_valid("ORDER"));
/// assert!(!registry.is_valid("product"));
/// # Ok::<(), uniqueid::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyRegistry {
    prefixes: Vec<String>,
}

impl KeyRegistry {
    /// Builds a registry from an ordered list of prefixes.
    ///
    /// # Errors
    /// Returns [`Error::Configuration`] if the list is empty or any entry is
    /// empty.
    pub fn new<I, P>(prefixes: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let prefixes: Vec<String> = prefixes.into_iter().map(Into::into).collect();
        if prefixes.is_empty() {
            return Err(Error::configuration("key prefix list is empty"));
        }
        if let Some(pos) = prefixes.iter().position(String::is_empty) {
            return Err(Error::configuration(format!(
                "key prefix at position {pos} is empty"
            )));
        }
        Ok(Self { prefixes })
    }

    /// Returns `true` if `key` exactly matches one of the registered prefixes.
    pub fn is_valid(&self, key: &str) -> bool {
        self.prefixes.iter().any(|prefix| prefix == key)
    }

    /// The registered prefixes, in configuration order.
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}

impl FromStr for KeyRegistry {
    type Err = Error;

    /// Parses a comma-separated list. Whitespace around each entry is trimmed.
    fn from_str(s: &str) -> Result<Self> {
        Self::new(s.split(',').map(str::trim))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_list_in_order() {
        let registry: KeyRegistry = "order, user ,product".parse().unwrap();
        assert_eq!(registry.prefixes(), ["order", "user", "product"]);
        assert!(registry.is_valid("user"));
        assert!(!registry.is_valid(" user "));
    }

    #[test]
    fn membership_is_case_sensitive() {
        let registry = KeyRegistry::new(["order"]).unwrap();
        assert!(registry.is_valid("order"));
        assert!(!registry.is_valid("Order"));
        assert!(!registry.is_valid("ORDER"));
    }

    #[test]
    fn empty_input_is_a_configuration_error() {
        assert!(matches!(
            "".parse::<KeyRegistry>(),
            Err(Error::Configuration { .. })
        ));
        assert!(matches!(
            KeyRegistry::new(Vec::<String>::new()),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn empty_entry_is_a_configuration_error() {
        let err = "order,,user".parse::<KeyRegistry>().unwrap_err();
        assert!(err.to_string().contains("position 1"));
    }

    #[test]
    fn empty_key_is_never_valid() {
        let registry = KeyRegistry::new(["order"]).unwrap();
        assert!(!registry.is_valid(""));
    }
}
