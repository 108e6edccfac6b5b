//! Font family resolution table.
//!
//! Maps CSS generic and common family names onto the renderer's logical
//! families. The table is built once at startup (optionally seeded from the
//! host's installed fonts and overridden from configuration) and passed to
//! whoever needs it.
//!
//! Lookup is case-sensitive, matching names exactly as written in the
//! document.

use std::collections::BTreeMap;

use resvg::usvg::fontdb;
use tracing::debug;

/// Family used when nothing in a preference list is known.
pub const DEFAULT_FALLBACK_FAMILY: &str = "SansSerif";

/// Built-in generic mappings.
pub const GENERIC_FAMILIES: &[(&str, &str)] = &[
    ("serif", "Serif"),
    ("Times", "Serif"),
    ("Times New Roman", "Serif"),
    ("sans-serif", "SansSerif"),
    ("cursive", "Dialog"),
    ("fantasy", "Symbol"),
    ("monospace", "Monospaced"),
    ("monospaced", "Monospaced"),
    ("Courier", "Monospaced"),
];

/// Explicit family-name table with a documented fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFamilyMap {
    entries: BTreeMap<String, String>,
    fallback: String,
}

impl Default for FontFamilyMap {
    fn default() -> Self {
        Self::generic()
    }
}

impl FontFamilyMap {
    /// Table holding only the built-in generic mappings.
    pub fn generic() -> Self {
        let mut map = Self::empty(DEFAULT_FALLBACK_FAMILY);
        for (name, family) in GENERIC_FAMILIES {
            map.insert(*name, *family);
        }
        map
    }

    /// Table with no entries at all.
    pub fn empty(fallback: impl Into<String>) -> Self {
        Self {
            entries: BTreeMap::new(),
            fallback: fallback.into(),
        }
    }

    /// Map `name` to `family`, replacing any previous mapping.
    pub fn insert(&mut self, name: impl Into<String>, family: impl Into<String>) {
        self.entries.insert(name.into(), family.into());
    }

    /// Register installed families as identity mappings.
    ///
    /// A host family with the same name as a generic key takes precedence.
    pub fn register_host_families<I, S>(&mut self, families: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for family in families {
            let family = family.into();
            self.entries.insert(family.clone(), family);
        }
    }

    /// Register every family found in the system font directories.
    pub fn with_system_fonts(mut self) -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        let families: Vec<String> = db
            .faces()
            .flat_map(|face| face.families.iter().map(|(name, _)| name.clone()))
            .collect();
        debug!(faces = db.len(), families = families.len(), "Loaded host font families");
        self.register_host_families(families);
        self
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn set_fallback(&mut self, family: impl Into<String>) {
        self.fallback = family.into();
    }

    /// The family `name` maps to, if known.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// First known family in preference order, else the fallback.
    pub fn resolve<'a, I>(&self, preferences: I) -> &str
    where
        I: IntoIterator<Item = &'a str>,
    {
        preferences
            .into_iter()
            .find_map(|name| self.get(name))
            .unwrap_or(&self.fallback)
    }

    /// Resolve a CSS `font-family` value such as `"'Times New Roman', serif"`.
    pub fn resolve_css(&self, value: &str) -> &str {
        let families = parse_family_list(value);
        self.resolve(families.iter().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All mappings, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Split a CSS family list on commas, trimming whitespace and quotes.
pub fn parse_family_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|part| part.trim().trim_matches(|c| c == '"' || c == '\''))
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}
