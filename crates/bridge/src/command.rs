//! Script construction for the sandboxed engine.
//!
//! The engine is driven by posting source strings in its own scripting
//! language; this module is the single place such strings are produced.
//! Anything user-supplied is routed through [`escape_script_literal`] before
//! interpolation.

use inpaint_common::ImagePayload;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr, VariantNames};

#[derive(
    Debug, Clone,
    Serialize, Deserialize, JsonSchema,
    Display, VariantNames, IntoStaticStr,
    PartialEq
)]
#[serde(tag = "type", content = "params", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EngineCommand {
    /// Serialize the active document to its native PNG export call
    ExportFull,

    /// Export only the layer currently marked selected, recording every
    /// top-level layer's visibility first and restoring it in the same
    /// script invocation
    ExportActiveLayer,

    /// Open an image payload as a new named layer in the current document,
    /// rasterizing it if it was opened as a smart object
    InsertLayer { payload: ImagePayload, name: String },
}

impl EngineCommand {
    /// Render the command as engine script source.
    pub fn to_script(&self) -> String {
        match self {
            Self::ExportFull => r#"app.activeDocument.saveToOE("png");"#.to_owned(),
            Self::ExportActiveLayer => r#"
var doc = app.activeDocument;
var state = [];
for (var i = 0; i < doc.layers.length; i++) {
    var layer = doc.layers[i];
    state.push(layer.visible);
    layer.visible = layer.selected;
}
doc.saveToOE("png");
for (var i = 0; i < doc.layers.length; i++) {
    doc.layers[i].visible = state[i];
}
"#
            .to_owned(),
            Self::InsertLayer { payload, name } => {
                // Locally-built payloads are quote-free base64, but a
                // normalized backend string passes through verbatim, so the
                // payload goes through the same escaping as the name.
                let safe_payload = escape_script_literal(payload.as_str());
                let safe_name = escape_script_literal(name);
                format!(
                    r#"
var resource = "{safe_payload}";
app.open(resource, null, true);
app.activeDocument.activeLayer.name = "{safe_name}";
if (app.activeDocument.activeLayer.kind == LayerKind.SMARTOBJECT) {{
    app.activeDocument.activeLayer.rasterize(RasterizeType.ENTIRELAYER);
}}
"#
                )
            }
        }
    }

    /// Whether the engine answers this command with a binary payload.
    /// Commands without a reply are posted fire-and-forget.
    pub fn expects_binary_reply(&self) -> bool {
        !matches!(self, Self::InsertLayer { .. })
    }
}

/// Neutralize a user-supplied string for interpolation into a
/// double-quoted engine script literal.
pub fn escape_script_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}
