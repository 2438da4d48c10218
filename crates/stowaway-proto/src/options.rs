//! Entry-point configuration carried in the options unit
//!
//! The options unit is plain text, one `key=<json value>` assignment per line.

use crate::ProtocolError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Logical name of the synthetic options unit
pub const OPTIONS_UNIT: &str = "stowaway.cmdline_options";

/// Configuration handed to the server driver's entry point
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerOptions {
    /// Enable latency control on the tunnel
    #[serde(default)]
    pub latency_control: bool,
    /// Register discovered hosts automatically
    #[serde(default)]
    pub auto_hosts: bool,
    /// Forward DNS to this nameserver
    #[serde(default)]
    pub to_nameserver: Option<String>,
}

impl ServerOptions {
    /// Render as the source text of the options unit
    pub fn to_source(&self) -> Result<String, ProtocolError> {
        let value = serde_json::to_value(self)?;
        let Value::Object(fields) = value else {
            return Err(ProtocolError::InvalidOptions(
                "options must serialize to a map".to_string(),
            ));
        };
        render_assignments(&fields)
    }

    /// Parse from the source text of the options unit; unknown keys are ignored
    pub fn from_source(source: &str) -> Result<Self, ProtocolError> {
        let fields = parse_assignments(source)?;
        Ok(serde_json::from_value(Value::Object(fields))?)
    }
}

/// Render a key/value map as assignment lines
pub fn render_assignments(fields: &Map<String, Value>) -> Result<String, ProtocolError> {
    let mut out = String::new();
    for (key, value) in fields {
        out.push_str(key);
        out.push('=');
        out.push_str(&serde_json::to_string(value)?);
        out.push('\n');
    }
    Ok(out)
}

/// Parse assignment lines into a key/value map
pub fn parse_assignments(source: &str) -> Result<Map<String, Value>, ProtocolError> {
    let mut fields = Map::new();
    for line in source.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (key, value) = line.split_once('=').ok_or_else(|| {
            ProtocolError::InvalidOptions(format!("expected key=value, got {:?}", line))
        })?;
        fields.insert(key.trim().to_string(), serde_json::from_str(value.trim())?);
    }
    Ok(fields)
}
