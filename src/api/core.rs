//! WASM API for the annotation tool
//!
//! The document tree and the tool live on the WASM side. JavaScript forwards
//! user events here and applies the returned `ApiResult`: the sanitized HTML
//! and the queued host commands (listeners, overlay, observers, notices).

use super::helpers::{deserialize, deserialize_optional, lifecycle_error, not_initialized, serialize};
use super::types::ApiResult;
use crate::dom::{Document, NodeData, NodeId, Range, Selection};
use crate::models::{Field, PlacementResult, Rect, Size};
use crate::tool::{AnnotationTool, CommandQueue, LifecycleError, ToolConfig, SANITIZE_RULES};
use crate::{wasm_error, wasm_info, wasm_log, wasm_warn};
use lazy_static::lazy_static;
use std::sync::{Mutex, MutexGuard};
use wasm_bindgen::prelude::*;

/// Everything owned by one registered tool instance
struct ToolState {
    doc: Document,
    tool: AnnotationTool,
    host: CommandQueue,
}

impl ToolState {
    /// Snapshot after an operation; drains the host queue
    fn result(&mut self, accepted: bool) -> ApiResult {
        // The tool renumbers after its own edits, so their records are not replayed
        self.doc.take_mutations();
        let root = self.doc.root();
        ApiResult {
            html: self.doc.sanitized_inner_html(root, &SANITIZE_RULES),
            commands: self.host.drain(),
            overlay: self.tool.overlay_view(),
            references: self.tool.references().clone(),
            state: self.tool.state().name(),
            accepted,
        }
    }
}

// WASM-owned tool storage
lazy_static! {
    static ref TOOL: Mutex<Option<ToolState>> = Mutex::new(None);
}

fn lock_tool() -> Result<MutexGuard<'static, Option<ToolState>>, JsValue> {
    TOOL.lock().map_err(|e| {
        let msg = format!("Tool lock poisoned: {}", e);
        wasm_error!("{}", msg);
        JsValue::from_str(&msg)
    })
}

fn with_tool<T, F>(f: F) -> Result<T, JsValue>
where
    F: FnOnce(&mut ToolState) -> Result<T, JsValue>,
{
    let mut guard = lock_tool()?;
    let state = guard.as_mut().ok_or_else(not_initialized)?;
    f(state)
}

/// Run a lifecycle step, swallowing the errors the host ignores
fn step(outcome: Result<(), LifecycleError>) -> Result<bool, JsValue> {
    match outcome {
        Ok(()) => Ok(true),
        Err(LifecycleError::Validation(report)) => {
            wasm_log!("Save rejected: {:?}", report.messages());
            Ok(false)
        }
        Err(err) => match lifecycle_error(err) {
            Some(js) => Err(js),
            None => Ok(true),
        },
    }
}

/// Register the tool against a document tree
///
/// # Parameters
/// - `document_js`: root `NodeData` (element/text tree)
/// - `config_js`: `ToolConfig`, or `undefined` for defaults
#[wasm_bindgen(js_name = initTool)]
pub fn init_tool(document_js: JsValue, config_js: JsValue) -> Result<JsValue, JsValue> {
    let data: NodeData = deserialize(document_js, "Document deserialization error")?;
    let config: ToolConfig = deserialize_optional(config_js, "Config deserialization error")?.unwrap_or_default();

    let mut doc = Document::from_data(&data).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let mut host = CommandQueue::new();
    let tool = AnnotationTool::new(config, &mut doc, &mut host);

    let mut state = ToolState { doc, tool, host };
    let result = state.result(true);

    let mut guard = lock_tool()?;
    if let Some(mut previous) = guard.take() {
        wasm_warn!("initTool called twice, destroying previous instance");
        previous.tool.destroy(&mut previous.doc, &mut previous.host);
    }
    *guard = Some(state);

    wasm_info!("Annotation tool initialized ({} references)", result.references.len());
    serialize(&result, "Result serialization error")
}

/// Toolbar button description
#[wasm_bindgen(js_name = renderButton)]
pub fn render_button() -> Result<JsValue, JsValue> {
    with_tool(|state| serialize(&state.tool.render().class_list(), "Button serialization error"))
}

/// Update the toolbar active state for the current selection
#[wasm_bindgen(js_name = checkState)]
pub fn check_state(selection_js: JsValue) -> Result<bool, JsValue> {
    let selection: Selection = deserialize(selection_js, "Selection deserialization error")?;
    with_tool(|state| Ok(state.tool.check_state(&state.doc, &selection)))
}

/// Wrap the given range in a new annotation
#[wasm_bindgen(js_name = surround)]
pub fn surround(range_js: JsValue) -> Result<JsValue, JsValue> {
    let range: Option<Range> = deserialize_optional(range_js, "Range deserialization error")?;
    wasm_log!("surround called: {:?}", range);
    with_tool(|state| {
        let accepted = step(state.tool.surround(&mut state.doc, &mut state.host, range))?;
        serialize(&state.result(accepted), "Result serialization error")
    })
}

/// Click on an existing annotation
#[wasm_bindgen(js_name = clickAnnotation)]
pub fn click_annotation(node: usize) -> Result<JsValue, JsValue> {
    with_tool(|state| {
        let accepted = step(state.tool.edit_annotation(&mut state.doc, &mut state.host, NodeId(node)))?;
        serialize(&state.result(accepted), "Result serialization error")
    })
}

/// Store one overlay input; returns the inline error message or `null`
#[wasm_bindgen(js_name = updateField)]
pub fn update_field(field_js: JsValue, value: &str) -> Result<JsValue, JsValue> {
    let field: Field = deserialize(field_js, "Field deserialization error")?;
    with_tool(|state| match state.tool.update_field(field, value) {
        Ok(Some(err)) => Ok(JsValue::from_str(&err.to_string())),
        Ok(None) => Ok(JsValue::NULL),
        Err(err) => match lifecycle_error(err) {
            Some(js) => Err(js),
            None => Ok(JsValue::NULL),
        },
    })
}

/// Save button
#[wasm_bindgen(js_name = saveMetadata)]
pub fn save_metadata() -> Result<JsValue, JsValue> {
    with_tool(|state| {
        let accepted = step(state.tool.save(&mut state.doc, &mut state.host))?;
        serialize(&state.result(accepted), "Result serialization error")
    })
}

/// Close button or a click outside the overlay
#[wasm_bindgen(js_name = closeOverlay)]
pub fn close_overlay() -> Result<JsValue, JsValue> {
    with_tool(|state| {
        let accepted = match state.tool.close(&mut state.doc, &mut state.host) {
            Ok(outcome) => {
                wasm_log!("Overlay closed: {:?}", outcome);
                true
            }
            Err(err) => step(Err(err))?,
        };
        serialize(&state.result(accepted), "Result serialization error")
    })
}

/// Remove button
#[wasm_bindgen(js_name = removeAnnotation)]
pub fn remove_annotation() -> Result<JsValue, JsValue> {
    with_tool(|state| {
        let accepted = step(state.tool.remove(&mut state.doc, &mut state.host))?;
        serialize(&state.result(accepted), "Result serialization error")
    })
}

/// Resize observer callback
///
/// # Parameters
/// - `anchor_js`: anchor `Rect` relative to the viewport
/// - `overlay_js`: overlay `Size`
/// - `viewport_height`: defaults to `window.innerHeight`
/// - `custom`: optional `(request) => placement` replacing the default rule
#[wasm_bindgen(js_name = placeOverlay)]
pub fn place_overlay(
    anchor_js: JsValue,
    overlay_js: JsValue,
    viewport_height: Option<f64>,
    custom: Option<js_sys::Function>,
) -> Result<JsValue, JsValue> {
    let anchor: Rect = deserialize(anchor_js, "Rect deserialization error")?;
    let overlay: Size = deserialize(overlay_js, "Size deserialization error")?;
    let viewport_height = viewport_height
        .or_else(|| {
            web_sys::window()
                .and_then(|w| w.inner_height().ok())
                .and_then(|h| h.as_f64())
        })
        .unwrap_or(0.0);

    let Some(custom) = custom else {
        return with_tool(|state| {
            let placement = state.tool.reposition(anchor, overlay, viewport_height);
            serialize(&placement, "Placement serialization error")
        });
    };

    // The override may call back into this module, so it runs unlocked
    let request = with_tool(|state| {
        Ok(state
            .tool
            .session()
            .map(|_| state.tool.placement_request(anchor, overlay, viewport_height)))
    })?;
    let Some(request) = request else {
        return Ok(JsValue::NULL);
    };
    let answer = custom.call1(&JsValue::NULL, &serialize(&request, "Request serialization error")?)?;
    let placement: PlacementResult = deserialize(answer, "Placement deserialization error")?;
    with_tool(|state| serialize(&state.tool.apply_placement(placement), "Placement serialization error"))
}

/// Nodes deleted by the editor outside the tool
///
/// Delivered as one mutation batch; renumbers at most once.
#[wasm_bindgen(js_name = removeNodes)]
pub fn remove_nodes(ids_js: JsValue) -> Result<JsValue, JsValue> {
    let ids: Vec<NodeId> = deserialize(ids_js, "Node id deserialization error")?;
    with_tool(|state| {
        for id in &ids {
            if let Err(err) = state.doc.remove(*id) {
                wasm_warn!("removeNodes: {}", err);
            }
        }
        let batch = state.doc.take_mutations();
        let renumbered = state.tool.handle_mutations(&mut state.doc, &mut state.host, &batch);
        wasm_log!("removeNodes: {} node(s), renumbered={}", ids.len(), renumbered);
        serialize(&state.result(true), "Result serialization error")
    })
}

/// Current document tree
#[wasm_bindgen(js_name = getDocument)]
pub fn get_document() -> Result<JsValue, JsValue> {
    with_tool(|state| {
        let data = state
            .doc
            .to_data(state.doc.root())
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        serialize(&data, "Document serialization error")
    })
}

/// Attributes the editor's sanitizer must keep
#[wasm_bindgen(js_name = getSanitizeConfig)]
pub fn get_sanitize_config() -> Result<JsValue, JsValue> {
    serialize(AnnotationTool::sanitize(), "Sanitize config serialization error")
}

/// Unregister the tool; returns the final host commands
#[wasm_bindgen(js_name = destroyTool)]
pub fn destroy_tool() -> Result<JsValue, JsValue> {
    let mut guard = lock_tool()?;
    let mut state = guard.take().ok_or_else(not_initialized)?;
    state.tool.destroy(&mut state.doc, &mut state.host);
    wasm_info!("Annotation tool destroyed");
    serialize(&state.host.drain(), "Command serialization error")
}
