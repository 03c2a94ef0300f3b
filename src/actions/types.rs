use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("identifier pattern compiles"));

/// Checks that `name` is usable both as a catalog key and as a file stem.
pub fn validate_identifier(name: &str) -> Result<()> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(Error::invalid_input(format!(
            "Action name '{}' is not valid. Use only letters, digits, '_' and '-'",
            name
        )))
    }
}

/// Display data for the editor palette. Only `name` is interpreted; every
/// other field (label, icon, category, ...) is carried through as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaletteMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub display: Map<String, Value>,
}

impl PaletteMetadata {
    fn from_block(block: &Map<String, Value>) -> Self {
        let mut display = block.clone();
        let name = match display.remove("name") {
            Some(Value::String(name)) => Some(name),
            Some(other) => {
                display.insert("name".to_string(), other);
                None
            }
            None => None,
        };
        Self { name, display }
    }
}

/// A catalog entry. The submitted document is kept verbatim (key order and
/// number text included); `palette` is a typed view of its `_palette` block.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionDefinition {
    name: String,
    palette: Option<PaletteMetadata>,
    document: Map<String, Value>,
}

impl ActionDefinition {
    fn from_document(name: String, document: Map<String, Value>) -> Result<Self> {
        let palette = match document.get("_palette") {
            None => None,
            Some(Value::Object(block)) => Some(PaletteMetadata::from_block(block)),
            Some(_) => {
                return Err(Error::invalid_input(
                    "The '_palette' field must be a JSON object",
                ));
            }
        };
        Ok(Self {
            name,
            palette,
            document,
        })
    }

    /// Validates a submitted document and keys it by `_palette.name`.
    pub fn from_payload(payload: Value) -> Result<Self> {
        let document = match payload {
            Value::Object(map) if !map.is_empty() => map,
            _ => {
                return Err(Error::invalid_input(
                    "Request body must be a non-empty JSON object",
                ));
            }
        };

        let name = document
            .get("_palette")
            .and_then(|palette| palette.get("name"))
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::invalid_input("The '_palette.name' field is required"))?
            .to_string();

        validate_identifier(&name)?;
        Self::from_document(name, document)
    }

    /// Decodes a persisted document. The storage key, not the palette, names it.
    pub fn from_stored(key: &str, bytes: &[u8]) -> Result<Self> {
        validate_identifier(key)?;
        let document: Map<String, Value> = serde_json::from_slice(bytes)?;
        Self::from_document(key.to_string(), document)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn palette(&self) -> Option<&PaletteMetadata> {
        self.palette.as_ref()
    }

    /// The document exactly as submitted or stored.
    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    /// Palette entry reported by the catalog listing, named by the catalog key.
    pub fn summary(&self) -> Option<PaletteMetadata> {
        self.palette.as_ref().map(|palette| PaletteMetadata {
            name: Some(self.name.clone()),
            display: palette.display.clone(),
        })
    }

    pub fn to_document(&self) -> Value {
        Value::Object(self.document.clone())
    }

    /// Persisted form: pretty JSON with four-space indentation.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        Ok(buf)
    }
}

impl Serialize for ActionDefinition {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.document.serialize(serializer)
    }
}
