//! Supported call languages.
//!
//! The catalogue is a fixed set of two-letter codes. Codes outside the set are
//! never rejected; they resolve to the default pair (`es` → `en`) one side at a
//! time, matching what callers of the setup webhook expect.

use std::fmt;

use phf::phf_map;

/// Two-letter code → display name used in the backend instruction.
static SUPPORTED_LANGUAGES: phf::Map<&'static str, &'static str> = phf_map! {
    "es" => "Spanish",
    "en" => "English",
    "zh" => "Mandarin Chinese",
    "fr" => "French",
    "de" => "German",
    "it" => "Italian",
    "pt" => "Portuguese",
    "ja" => "Japanese",
    "ko" => "Korean",
    "ar" => "Arabic",
    "hi" => "Hindi",
    "nl" => "Dutch",
    "ru" => "Russian",
};

/// Default language the caller speaks when nothing else is known.
pub const DEFAULT_SOURCE_LANGUAGE: &str = "es";

/// Default language the callee hears when nothing else is known.
pub const DEFAULT_TARGET_LANGUAGE: &str = "en";

/// A language from the supported catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    code: &'static str,
    name: &'static str,
}

impl Language {
    /// Look up a language by code (case-insensitive, surrounding whitespace ignored).
    pub fn from_code(code: &str) -> Option<Self> {
        let normalized = code.trim().to_ascii_lowercase();
        SUPPORTED_LANGUAGES
            .get_entry(normalized.as_str())
            .map(|(code, name)| Self {
                code: *code,
                name: *name,
            })
    }

    #[inline]
    pub fn code(&self) -> &'static str {
        self.code
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    fn from_known(code: &'static str) -> Self {
        // Both defaults are catalogue members, so the lookup cannot miss.
        let name = SUPPORTED_LANGUAGES.get(code).copied().unwrap_or(code);
        Self { code, name }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}

/// All supported language codes, sorted.
pub fn supported_language_codes() -> Vec<&'static str> {
    let mut codes: Vec<_> = SUPPORTED_LANGUAGES.keys().copied().collect();
    codes.sort_unstable();
    codes
}

/// Negotiated source/target pair for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguagePair {
    pub source: Language,
    pub target: Language,
}

impl LanguagePair {
    pub fn new(source: Language, target: Language) -> Self {
        Self { source, target }
    }

    /// Resolve raw codes from the setup request. Each side falls back to its
    /// default independently when missing or unrecognized.
    pub fn resolve(source: Option<&str>, target: Option<&str>) -> Self {
        let source = source
            .and_then(Language::from_code)
            .unwrap_or_else(|| Language::from_known(DEFAULT_SOURCE_LANGUAGE));
        let target = target
            .and_then(Language::from_code)
            .unwrap_or_else(|| Language::from_known(DEFAULT_TARGET_LANGUAGE));
        Self::new(source, target)
    }
}

impl Default for LanguagePair {
    fn default() -> Self {
        Self::resolve(None, None)
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.target)
    }
}
