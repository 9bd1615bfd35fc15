//! Interned element and attribute names.
//!
//! Every element tag and attribute key in a [`Document`](crate::dom::Document)
//! is stored as a [`Name`], so name comparisons during selector matching and
//! attribute lookup are symbol comparisons instead of string comparisons.

use std::{
    fmt,
    sync::{Mutex, MutexGuard, OnceLock},
};

use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner for element and attribute names.
///
/// # Thread Safety
///
/// This uses `Mutex` for thread-safe access to the string interner.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn interner() -> MutexGuard<'static, DefaultStringInterner> {
    INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .expect("Failed to acquire interner lock")
}

/// An interned element or attribute name.
///
/// # Examples
///
/// ```
/// use umbra_core::name::Name;
///
/// let tag = Name::new("use");
/// assert_eq!(tag, "use");
/// assert_eq!(tag, Name::from("use"));
/// assert_ne!(tag, Name::new("g"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Name(DefaultSymbol);

impl Name {
    /// Interns `name` and returns its handle.
    pub fn new(name: &str) -> Self {
        Self(interner().get_or_intern(name))
    }

    /// Returns an owned copy of the interned text.
    pub fn as_string(&self) -> String {
        interner()
            .resolve(self.0)
            .expect("Symbol should exist in interner")
            .to_string()
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let interner = interner();
        let str_value = interner
            .resolve(self.0)
            .expect("Symbol should exist in interner");
        f.write_str(str_value)
    }
}

impl From<&str> for Name {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<&String> for Name {
    fn from(name: &String) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        let interner = interner();
        interner
            .resolve(self.0)
            .is_some_and(|self_str| self_str == other)
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_interning_is_stable() {
        let a = Name::new("xlink:href");
        let b = Name::new("xlink:href");
        let c = Name::new("href");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, "xlink:href");
    }

    #[test]
    fn test_display_and_as_string() {
        let name = Name::new("visibility");
        assert_eq!(format!("{name}"), "visibility");
        assert_eq!(name.as_string(), "visibility");
    }

    #[test]
    fn test_partial_eq_str() {
        let name = Name::new("symbol");
        assert!(name == "symbol");
        assert!(name != "svg");
        assert!(Name::new("") == "");
    }

    #[test]
    fn test_hash_lookup() {
        let mut map = HashMap::new();
        map.insert(Name::new("width"), "50");
        assert_eq!(map.get(&Name::from("width")), Some(&"50"));
        assert_eq!(map.get(&Name::from("height")), None);
    }
}
