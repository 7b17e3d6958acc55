//! Validation and parsing of catalog response bodies.

use kitforge_core::kit::KitDefinition;

use crate::api::CatalogFetchError;

/// Maximum characters of a response body kept for diagnostics.
pub const PREVIEW_CHARS: usize = 256;

/// A validated kit list from one successful fetch.
#[derive(Debug, Clone)]
pub struct ParsedCatalog {
    pub kits: Vec<KitDefinition>,
    /// Entries dropped for being `null` or lacking a name.
    pub skipped: usize,
}

/// Truncate a body for logging.
pub fn preview(body: &str) -> String {
    let mut out: String = body.chars().take(PREVIEW_CHARS).collect();
    if body.chars().nth(PREVIEW_CHARS).is_some() {
        out.push_str("...");
    }
    out
}

/// Validate and parse a catalog body.
///
/// The body must start with `[` or `{` (after whitespace and a BOM)
/// before a full parse is attempted, which rejects HTML error and
/// challenge pages cheaply. The parse itself expects a JSON array of kit
/// objects; unnamed or `null` entries are skipped and counted.
pub fn parse_catalog_body(body: &str) -> Result<ParsedCatalog, CatalogFetchError> {
    let trimmed = body.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        return Err(CatalogFetchError::EmptyBody);
    }
    if !(trimmed.starts_with('[') || trimmed.starts_with('{')) {
        return Err(CatalogFetchError::NotJson {
            preview: preview(trimmed),
        });
    }

    let entries: Vec<Option<KitDefinition>> =
        serde_json::from_str(trimmed).map_err(|source| CatalogFetchError::Parse {
            source,
            preview: preview(trimmed),
        })?;

    let total = entries.len();
    let kits: Vec<KitDefinition> = entries
        .into_iter()
        .flatten()
        .filter(KitDefinition::has_name)
        .collect();
    let skipped = total - kits.len();

    if skipped > 0 {
        tracing::warn!(skipped, "Skipped catalog entries without a name");
    }

    Ok(ParsedCatalog { kits, skipped })
}
