//! Bindings for the WebXR Hit Test module
//!
//! web-sys does not generate these, so the few members we use are declared
//! here. `XRSession` and `XRFrame` gain their hit-test methods through local
//! views that are cast from the web-sys types.

use js_sys::{Array, Object, Promise, Reflect};
use wasm_bindgen::prelude::*;
use web_sys::{XrFrame, XrPose, XrReferenceSpace, XrSession, XrSpace};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(extends = Object, js_name = XRHitTestSource, typescript_type = "XRHitTestSource")]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub type XrHitTestSource;

    #[wasm_bindgen(method, catch)]
    pub fn cancel(this: &XrHitTestSource) -> Result<(), JsValue>;

    #[wasm_bindgen(extends = Object, js_name = XRHitTestResult, typescript_type = "XRHitTestResult")]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub type XrHitTestResult;

    #[wasm_bindgen(method, js_name = getPose)]
    pub fn get_pose(this: &XrHitTestResult, base_space: &XrSpace) -> Option<XrPose>;

    #[wasm_bindgen(extends = Object, js_name = XRSession)]
    type HitTestSession;

    #[wasm_bindgen(method, catch, js_name = requestHitTestSource)]
    fn request_hit_test_source(this: &HitTestSession, options: &Object) -> Result<Promise, JsValue>;

    #[wasm_bindgen(extends = Object, js_name = XRFrame)]
    type HitTestFrame;

    #[wasm_bindgen(method, catch, js_name = getHitTestResults)]
    fn get_hit_test_results(this: &HitTestFrame, source: &XrHitTestSource) -> Result<Array, JsValue>;
}

/// Ask the session for a hit-test source casting rays from `space`
///
/// Resolves to an `XRHitTestSource`. Throws synchronously when the
/// session was created without the `hit-test` feature.
pub fn request_source(session: &XrSession, space: &XrReferenceSpace) -> Result<Promise, JsValue> {
    let options = Object::new();
    Reflect::set(&options, &JsValue::from_str("space"), space)?;
    session
        .unchecked_ref::<HitTestSession>()
        .request_hit_test_source(&options)
}

/// This frame's hit-test results, nearest first
pub fn results(frame: &XrFrame, source: &XrHitTestSource) -> Result<Vec<XrHitTestResult>, JsValue> {
    let array = frame
        .unchecked_ref::<HitTestFrame>()
        .get_hit_test_results(source)?;
    Ok(array.iter().map(|value| value.unchecked_into()).collect())
}
