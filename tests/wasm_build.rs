//! WASM bridge test
//!
//! Runs in the browser through wasm-bindgen-test and drives the exported API
//! the way the editor plugin does.

#![cfg(target_arch = "wasm32")]

use annotation_wasm::api::*;
use serde_json::json;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn js(value: serde_json::Value) -> JsValue {
    serde_wasm_bindgen::to_value(&value).unwrap()
}

fn result(value: JsValue) -> serde_json::Value {
    serde_wasm_bindgen::from_value(value).unwrap()
}

fn init() {
    let doc = json!({
        "type": "element",
        "tag": "body",
        "children": [{
            "type": "element",
            "tag": "p",
            "children": [{"type": "text", "text": "Hello world"}]
        }]
    });
    init_tool(js(doc), JsValue::UNDEFINED).unwrap();
}

#[wasm_bindgen_test]
fn test_surround_and_save() {
    init();
    // body = 0, p = 1, text = 2
    let range = json!({"start": {"node": 2, "offset": 6}, "end": {"node": 2, "offset": 11}});
    let opened = result(surround(js(range)).unwrap());
    assert_eq!(opened["state"], "Editing");
    assert_eq!(opened["overlay"]["fields"][0]["value"], "world");

    update_field(js(json!("author")), "Doe J.").unwrap();
    let saved = result(save_metadata().unwrap());

    assert_eq!(saved["accepted"], true);
    assert_eq!(saved["state"], "Idle");
    assert!(saved["html"].as_str().unwrap().contains(">[1]</annotation>"));
    assert!(!saved["html"].as_str().unwrap().contains("at-has-data-listener"));
}

#[wasm_bindgen_test]
fn test_rejected_save_keeps_overlay() {
    init();
    let range = json!({"start": {"node": 2, "offset": 0}, "end": {"node": 2, "offset": 5}});
    surround(js(range)).unwrap();

    let error = update_field(js(json!("year")), "999").unwrap();
    assert!(error.as_string().is_some());

    let saved = result(save_metadata().unwrap());
    assert_eq!(saved["accepted"], false);
    assert_eq!(saved["state"], "Editing");

    let closed = result(close_overlay().unwrap());
    assert_eq!(closed["state"], "Idle");
    assert_eq!(closed["html"], "<p>Hello world</p>");
}

#[wasm_bindgen_test]
fn test_sanitize_config_lists_metadata() {
    let config = result(get_sanitize_config().unwrap());
    assert_eq!(config["annotation"]["data-publication"], true);
    assert_eq!(config["annotation"]["encoding"], true);
}

#[wasm_bindgen_test]
fn test_custom_placement_may_call_back() {
    init();
    let range = json!({"start": {"node": 2, "offset": 0}, "end": {"node": 2, "offset": 5}});
    surround(js(range)).unwrap();

    let custom = Closure::wrap(Box::new(|request: JsValue| -> JsValue {
        let request = result(request);
        // Reentrant call while the placement is being computed
        check_state(js(json!({"ranges": []}))).unwrap();
        js(json!({
            "side": "below",
            "verticalOffset": request["anchor"]["height"].as_f64().unwrap() + 1.0,
            "maxHeight": 120.0
        }))
    }) as Box<dyn FnMut(JsValue) -> JsValue>);

    let placed = place_overlay(
        js(json!({"top": 10.0, "height": 20.0})),
        js(json!({"width": 300.0, "height": 100.0})),
        Some(800.0),
        Some(custom.as_ref().unchecked_ref::<js_sys::Function>().clone()),
    )
    .unwrap();

    let placed = result(placed);
    assert_eq!(placed["side"], "below");
    assert_eq!(placed["verticalOffset"], 21.0);
    close_overlay().unwrap();
}
