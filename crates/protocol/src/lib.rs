use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const INTAKE_SCHEMA_VERSION: u32 = 1;

/// Raw intake questionnaire as submitted by the client.
///
/// Every field is optional and numbers are kept as raw JSON values: forms post
/// `"12"` as often as `12`. The engine's normalizer is the only place that turns
/// this into a validated brief. The original Spanish form keys are accepted as
/// aliases.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntakePayload {
    #[serde(default, alias = "ancho_terreno", skip_serializing_if = "Option::is_none")]
    pub plot_width: Option<serde_json::Value>,
    #[serde(default, alias = "largo_terreno", skip_serializing_if = "Option::is_none")]
    pub plot_length: Option<serde_json::Value>,
    #[serde(default, alias = "presupuesto", skip_serializing_if = "Option::is_none")]
    pub budget: Option<serde_json::Value>,
    #[serde(default, alias = "personas", skip_serializing_if = "Option::is_none")]
    pub occupants: Option<serde_json::Value>,
    #[serde(default, alias = "plantas", skip_serializing_if = "Option::is_none")]
    pub floors: Option<serde_json::Value>,
    #[serde(default, alias = "espacios")]
    pub needed_spaces: Vec<String>,
    #[serde(default, alias = "preferencias")]
    pub preferences: Vec<String>,
    #[serde(default, alias = "necesidades")]
    pub needs: Vec<String>,
    #[serde(default, alias = "ciudad", skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, alias = "localidad", skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(default, alias = "orientacion", skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
    #[serde(default, alias = "clima", skip_serializing_if = "Option::is_none")]
    pub climate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
}

impl IntakePayload {
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).context("Intake payload is not a valid JSON object")
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            hint: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

pub fn intake_schema() -> Result<String> {
    let schema = schemars::schema_for!(IntakePayload);
    serde_json::to_string_pretty(&schema).map_err(Into::into)
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

pub fn serialize_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}
