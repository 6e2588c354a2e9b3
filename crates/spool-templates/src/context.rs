//! Render context construction
//!
//! One context is built per render and never mutated afterwards. The
//! filament's fields sit at the top level of the namespace (so templates
//! write `{{ material }}`, `{{ vendor.name }}`), the selected spool sits
//! under `spool`, and tool metadata sits under the reserved `spoolsync` key.

use chrono::{Local, Utc};
use serde_json::{Value, json};
use spool_inventory::{FilamentRecord, SpoolRecord};

use crate::{Error, Result};

/// Name of the reserved namespace key inside every render context.
pub const RESERVED_NAMESPACE: &str = "spoolsync";

/// Identity of the tool performing the render, exposed to templates.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
    pub inventory_url: String,
}

/// The full variable namespace for one template render.
#[derive(Debug, Clone)]
pub struct RenderContext {
    inner: tera::Context,
}

impl RenderContext {
    /// Build the namespace for one (filament, spool, suffix, variant) render.
    ///
    /// `spool` is `Some` only in per-spool modes; templates always see a
    /// `spool` key, empty when unvaried. `variant` is trimmed; the empty
    /// string marks the single implicit no-variant render.
    pub fn build(
        filament: &FilamentRecord,
        spool: Option<&SpoolRecord>,
        tool: &ToolInfo,
        suffix: &str,
        variant: &str,
    ) -> Result<Self> {
        let mut root = as_object(serde_json::to_value(filament), "filament")?;

        let spool_value = match spool {
            Some(spool) => {
                let value = serde_json::to_value(spool).map_err(|e| Error::Context {
                    message: e.to_string(),
                })?;
                Value::Object(as_object(Ok(value), "spool")?)
            }
            None => json!({}),
        };
        root.insert("spool".to_string(), spool_value);

        root.insert(
            RESERVED_NAMESPACE.to_string(),
            json!({
                "name": tool.name,
                "version": tool.version,
                "now": Local::now().format("%c").to_string(),
                "now_int": Utc::now().timestamp(),
                "slicer_suffix": suffix,
                "variant": variant.trim(),
                "inventory_url": tool.inventory_url,
            }),
        );

        let inner = tera::Context::from_value(Value::Object(root)).map_err(|e| Error::Context {
            message: e.to_string(),
        })?;
        Ok(Self { inner })
    }

    pub(crate) fn tera(&self) -> &tera::Context {
        &self.inner
    }
}

fn as_object(
    value: std::result::Result<Value, serde_json::Error>,
    what: &str,
) -> Result<serde_json::Map<String, Value>> {
    match value {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(Error::Context {
            message: format!("{what} did not serialize to an object"),
        }),
        Err(e) => Err(Error::Context {
            message: e.to_string(),
        }),
    }
}
