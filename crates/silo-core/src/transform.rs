//! Transformation engine.
//!
//! Renders a stored secret's raw value into what consumers see. Rendering is
//! a chain of strategies tried in order, stopping at the first success:
//!
//! 1. Template stage — empty template passes the value through verbatim; a
//!    non-empty template is interpolated against the value parsed as a JSON
//!    object, falling back to the verbatim value when interpolation fails.
//! 2. Format stage — `raw` emits the staged string unchanged; `json` emits
//!    the staged string only if it is valid JSON, else the original value;
//!    `yaml` re-encodes to YAML only if the staged string is valid JSON
//!    (JSON is the accepted intermediate), else emits the staged string.
//!
//! A render that succeeds only via fallback is still a success: the caller
//! receives the best available string plus [`Fallback`] markers describing
//! the degradation. Only an empty value is a hard failure.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::RenderError;
use crate::secret::{SecretFormat, SecretStored};

/// Key used when a value cannot be split into a structured mapping and is
/// stored wholesale in a platform secret object.
pub const WHOLESALE_KEY: &str = "VALUE";

/// Why a rendering stage fell back to an earlier string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// The template could not be applied; the raw value was used instead.
    TemplateFailed,
    /// The staged string was not valid JSON; the original value was emitted.
    NotJson,
    /// YAML re-encoding requires a valid JSON intermediate; the staged
    /// string was emitted unchanged.
    YamlRequiresJson,
}

/// A rendered secret value.
///
/// `fallbacks` is empty for a clean render; otherwise it lists, in stage
/// order, which strategies fell back. Callers decide whether to surface
/// the degradation — the operation itself is a success.
#[derive(Debug, Clone)]
pub struct Rendered {
    /// The output string consumers see.
    pub output: String,
    /// Degradations encountered while rendering.
    pub fallbacks: Vec<Fallback>,
}

impl Rendered {
    /// Whether every stage succeeded without falling back.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.fallbacks.is_empty()
    }
}

/// Render a secret into its consumer-visible string.
///
/// # Errors
///
/// Returns [`RenderError::EmptyValue`] when the secret has no value —
/// the only hard failure. Every other degradation yields a fallback
/// string inside `Ok`.
pub fn render(secret: &SecretStored) -> Result<Rendered, RenderError> {
    if secret.value.is_empty() {
        return Err(RenderError::EmptyValue {
            name: secret.name.clone(),
        });
    }

    let mut fallbacks = Vec::new();

    let staged = match apply_template(&secret.value, &secret.meta.template) {
        Templated::Verbatim => secret.value.clone(),
        Templated::Applied(s) => s,
        Templated::Failed => {
            fallbacks.push(Fallback::TemplateFailed);
            secret.value.clone()
        }
    };

    let output = match secret.meta.format {
        SecretFormat::Raw => staged,
        SecretFormat::Json => {
            if is_valid_json(&staged) {
                staged
            } else {
                fallbacks.push(Fallback::NotJson);
                secret.value.clone()
            }
        }
        SecretFormat::Yaml => match yaml_from_json(&staged) {
            Some(yaml) => yaml,
            None => {
                fallbacks.push(Fallback::YamlRequiresJson);
                staged
            }
        },
    };

    Ok(Rendered { output, fallbacks })
}

/// Render a secret into a key→bytes mapping for orchestration-platform
/// secret objects.
///
/// With no template, the value is parsed as a structured JSON map; if that
/// fails it is stored wholesale under [`WHOLESALE_KEY`]. With a template,
/// the templated output is parsed the same way, falling back to the
/// no-template behavior when either stage fails.
#[must_use]
pub fn render_mapping(secret: &SecretStored) -> BTreeMap<String, Vec<u8>> {
    if secret.meta.template.is_empty() {
        return value_as_map(&secret.value);
    }

    if let Templated::Applied(staged) = apply_template(&secret.value, &secret.meta.template) {
        if let Some(map) = parse_string_map(&staged) {
            return map;
        }
    }

    value_as_map(&secret.value)
}

/// Result of the template stage.
enum Templated {
    /// No template configured — the value passes through verbatim.
    Verbatim,
    /// Template applied successfully.
    Applied(String),
    /// The value was not a JSON object or the template referenced a
    /// missing key.
    Failed,
}

/// Apply a `{{ .key }}` template against the value parsed as a JSON object.
fn apply_template(value: &str, template: &str) -> Templated {
    if template.is_empty() {
        return Templated::Verbatim;
    }

    let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(value) else {
        return Templated::Failed;
    };

    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            // Unterminated placeholder — the template is malformed.
            return Templated::Failed;
        };
        let token = after[..close].trim();
        let Some(key) = token.strip_prefix('.') else {
            return Templated::Failed;
        };
        let Some(field) = fields.get(key) else {
            return Templated::Failed;
        };
        out.push_str(&stringify(field));
        rest = &after[close + 2..];
    }
    out.push_str(rest);

    Templated::Applied(out)
}

/// Render a JSON value as the string a template consumer expects:
/// strings lose their quotes, everything else keeps JSON syntax.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_valid_json(s: &str) -> bool {
    serde_json::from_str::<Value>(s).is_ok()
}

/// Re-encode a JSON string as YAML. `None` when the input is not JSON.
fn yaml_from_json(s: &str) -> Option<String> {
    let value: Value = serde_json::from_str(s).ok()?;
    serde_yaml::to_string(&value).ok()
}

/// Parse a string as a JSON object of scalar-ish fields into key→bytes.
fn parse_string_map(s: &str) -> Option<BTreeMap<String, Vec<u8>>> {
    let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(s) else {
        return None;
    };
    Some(
        fields
            .into_iter()
            .map(|(k, v)| (k, stringify(&v).into_bytes()))
            .collect(),
    )
}

/// No-template mapping: structured parse first, wholesale key second.
fn value_as_map(value: &str) -> BTreeMap<String, Vec<u8>> {
    parse_string_map(value).unwrap_or_else(|| {
        let mut map = BTreeMap::new();
        map.insert(WHOLESALE_KEY.to_owned(), value.as_bytes().to_vec());
        map
    })
}
