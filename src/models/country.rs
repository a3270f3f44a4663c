//! Supported countries.
//!
//! The allow-list drives query validation, the primary adapter's
//! country-name retry and local country filtering of listings whose
//! location is free text.

/// A supported country with the names it goes by in listing locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Country {
    /// Lowercase ISO 3166-1 alpha-2 code
    pub code: &'static str,
    /// Display name, used in free-text query variants
    pub name: &'static str,
    /// Lowercase alternative spellings found in location strings
    pub aliases: &'static [&'static str],
}

const COUNTRIES: &[Country] = &[
    Country {
        code: "us",
        name: "United States",
        aliases: &["usa", "us", "u.s."],
    },
    Country {
        code: "gb",
        name: "United Kingdom",
        aliases: &["uk", "gb", "great britain", "england", "scotland", "wales"],
    },
    Country {
        code: "ca",
        name: "Canada",
        aliases: &[],
    },
    Country {
        code: "au",
        name: "Australia",
        aliases: &["au"],
    },
    Country {
        code: "nz",
        name: "New Zealand",
        aliases: &["nz"],
    },
    Country {
        code: "ie",
        name: "Ireland",
        aliases: &["ie"],
    },
    Country {
        code: "de",
        name: "Germany",
        aliases: &["de", "deutschland"],
    },
    Country {
        code: "fr",
        name: "France",
        aliases: &["fr"],
    },
    Country {
        code: "nl",
        name: "Netherlands",
        aliases: &["nl", "the netherlands", "holland"],
    },
    Country {
        code: "es",
        name: "Spain",
        aliases: &["es", "españa"],
    },
    Country {
        code: "it",
        name: "Italy",
        aliases: &["italia"],
    },
    Country {
        code: "pl",
        name: "Poland",
        aliases: &["pl", "polska"],
    },
    Country {
        code: "se",
        name: "Sweden",
        aliases: &["se"],
    },
    Country {
        code: "ch",
        name: "Switzerland",
        aliases: &["ch"],
    },
    Country {
        code: "in",
        name: "India",
        aliases: &[],
    },
    Country {
        code: "sg",
        name: "Singapore",
        aliases: &["sg"],
    },
    Country {
        code: "ae",
        name: "United Arab Emirates",
        aliases: &["ae", "uae", "dubai"],
    },
    Country {
        code: "za",
        name: "South Africa",
        aliases: &["za"],
    },
    Country {
        code: "br",
        name: "Brazil",
        aliases: &["br", "brasil"],
    },
    Country {
        code: "mx",
        name: "Mexico",
        aliases: &["mx", "méxico"],
    },
    Country {
        code: "jp",
        name: "Japan",
        aliases: &["jp"],
    },
];

/// Location strings that match every country.
const WORLDWIDE_MARKERS: &[&str] = &["worldwide", "anywhere", "global"];

impl Country {
    /// All supported countries, in display order.
    pub fn all() -> &'static [Country] {
        COUNTRIES
    }

    /// Look up a country by code, ignoring case and padding.
    pub fn from_code(code: &str) -> Option<&'static Country> {
        let code = code.trim().to_lowercase();
        COUNTRIES.iter().find(|c| c.code == code)
    }

    /// Whether a free-text location refers to this country.
    ///
    /// The name and every alias must match whole tokens, so "de" does not
    /// match "Madeira" and "India" does not match "Indiana".
    pub fn matches_location(&self, location: &str) -> bool {
        let location = location.trim().to_lowercase();
        let tokens = location_tokens(&location);
        if tokens.is_empty() {
            return false;
        }
        std::iter::once(self.name)
            .chain(self.aliases.iter().copied())
            .any(|phrase| {
                let phrase = phrase.to_lowercase();
                let words = location_tokens(&phrase);
                !words.is_empty()
                    && tokens
                        .windows(words.len())
                        .any(|window| window == words.as_slice())
            })
    }
}

fn location_tokens(text: &str) -> Vec<&str> {
    text.split(|c: char| {
        c.is_whitespace() || matches!(c, ',' | '/' | '(' | ')' | ';' | '-' | '|')
    })
    .filter(|t| !t.is_empty())
    .collect()
}

/// Whether a location string means "open to every country".
pub fn is_worldwide_location(location: &str) -> bool {
    let location = location.trim().to_lowercase();
    WORLDWIDE_MARKERS.iter().any(|m| location.contains(m))
}
