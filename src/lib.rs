pub mod arm;
pub mod eer;
pub mod error;
pub mod index;
pub mod lexer;
pub mod measure;
pub mod parser;
pub mod serializer;
pub mod transform;

use wasm_bindgen::prelude::*;

pub use arm::{ArmAttribute, ArmConstraint, ArmEntity, ArmModel};
pub use eer::{EerAttribute, EerEntity, EerModel, EerRelationship, Multiplicity};
pub use error::{Diagnostic, DiagnosticKind, ModelError};
pub use parser::{Document, ParseError, parse_document};
pub use transform::{ForwardOptions, Transformed, arm_to_eer, eer_to_arm, eer_to_arm_with};

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Transform an EER document to its ARM rendering.
#[wasm_bindgen(js_name = "eerToArm")]
pub fn eer_to_arm_source(source: &str) -> Result<String, String> {
    let eer = parser::parse_document(source)
        .map_err(|e| e.to_string())?
        .into_eer()
        .map_err(|e| e.to_string())?;
    let out = eer_to_arm(&eer).map_err(|e| e.to_string())?;
    Ok(with_diagnostics(out))
}

/// Transform an ARM document to its EER rendering.
#[wasm_bindgen(js_name = "armToEer")]
pub fn arm_to_eer_source(source: &str) -> Result<String, String> {
    let arm = parser::parse_document(source)
        .map_err(|e| e.to_string())?
        .into_arm()
        .map_err(|e| e.to_string())?;
    let out = arm_to_eer(&arm).map_err(|e| e.to_string())?;
    Ok(with_diagnostics(out))
}

/// Rendered model followed by one `#` comment line per diagnostic, so the
/// output still loads as a document.
fn with_diagnostics<M: std::fmt::Display>(out: Transformed<M>) -> String {
    let mut rendered = out.model.to_string();
    for diagnostic in &out.diagnostics {
        rendered.push_str(&format!("# {diagnostic}\n"));
    }
    rendered
}
