//! The `Peak` catalog record.
//!
//! Catalog documents in the wild are loose about field types: ids and
//! elevations show up as JSON numbers or strings depending on how the
//! source spreadsheet was exported. Parsing is lenient about that, but any
//! value that cannot be interpreted fails at load time rather than at use.

use serde::de::{self, Deserializer, Unexpected};
use serde::{Deserialize, Serialize};

/// A known peak, loaded once from the catalog and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    #[serde(deserialize_with = "de_id")]
    pub id: u64,
    pub name: String,
    /// WGS84 decimal degrees.
    pub latitude: f64,
    /// WGS84 decimal degrees.
    pub longitude: f64,
    /// Display-only elevation text, e.g. "14,259 ft". Not used for math.
    #[serde(deserialize_with = "de_elevation")]
    pub elevation: String,
    /// US state or region, when the catalog carries it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Accept a peak id as either a JSON integer or a decimal string.
fn de_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::invalid_value(Unexpected::Str(&s), &"an unsigned integer id")),
    }
}

/// Accept elevation as a JSON number or a string; normalize to display text.
fn de_elevation<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        // Whole-number elevations print without a trailing ".0"
        Raw::Num(n) if n.fract() == 0.0 => format!("{}", n as i64),
        Raw::Num(n) => format!("{n}"),
        Raw::Text(s) => s,
    })
}
