//! WebXR session negotiation and the per-frame loop
//!
//! Negotiation runs the steps in order and stops at the first failure:
//! capability probe, `immersive-ar` session with `hit-test` + `local-floor`,
//! XR-compatible WebGL layer, `local-floor` space, `viewer` space and finally
//! a hit-test source casting from the viewer. Each failure is mapped to a
//! `SessionError` naming the step.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Promise, Reflect};
use tracing::{debug, info, warn};
use verdant_core::{
    place, HitObservation, NegotiationStep, SessionError, SurfacePose, ViewerContext,
};
use verdant_scene::{CameraSettings, Scene};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    WebGl2RenderingContext, XrFrame, XrInputSourceEvent, XrReferenceSpace, XrReferenceSpaceType,
    XrRenderStateInit, XrSession, XrSessionInit, XrSessionMode, XrSystem, XrWebGlLayer,
};

use crate::dom::DomUi;
use crate::hit_test::{self, XrHitTestSource};
use crate::loader::HttpModelLoader;
use crate::renderer::Renderer;

pub type Viewer = ViewerContext<Scene, DomUi>;

const REQUIRED_FEATURES: [&str; 2] = ["hit-test", "local-floor"];

/// Everything a running session needs per frame
pub struct XrBindings {
    pub session: XrSession,
    pub layer: XrWebGlLayer,
    pub floor: XrReferenceSpace,
    pub hit_source: XrHitTestSource,
}

/// Best-effort text for a rejected promise or thrown value
fn describe(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    let field = |name: &str| {
        Reflect::get(value, &JsValue::from_str(name))
            .ok()
            .and_then(|v| v.as_string())
    };
    match (field("name"), field("message")) {
        (Some(name), Some(message)) => format!("{}: {}", name, message),
        (None, Some(message)) => message,
        (Some(name), None) => name,
        (None, None) => format!("{:?}", value),
    }
}

async fn settle(step: NegotiationStep, promise: Promise) -> Result<JsValue, SessionError> {
    JsFuture::from(promise)
        .await
        .map_err(|e| SessionError::negotiation(step, describe(&e)))
}

fn cast<T: JsCast>(step: NegotiationStep, value: JsValue) -> Result<T, SessionError> {
    value
        .dyn_into::<T>()
        .map_err(|v| SessionError::negotiation(step, format!("unexpected value {:?}", v)))
}

/// `navigator.xr`, or `Unsupported` when the browser has no WebXR at all
fn xr_system() -> Result<XrSystem, SessionError> {
    let window = web_sys::window().ok_or(SessionError::Unsupported)?;
    let navigator = window.navigator();
    let xr = Reflect::get(&navigator, &JsValue::from_str("xr")).map_err(|_| SessionError::Unsupported)?;
    if xr.is_undefined() || xr.is_null() {
        return Err(SessionError::Unsupported);
    }
    Ok(xr.unchecked_into())
}

/// Negotiate an immersive AR session rendering into `gl`
pub async fn negotiate(
    gl: &WebGl2RenderingContext,
    camera: &CameraSettings,
) -> Result<XrBindings, SessionError> {
    let xr = xr_system()?;

    let supported = settle(
        NegotiationStep::CapabilityProbe,
        xr.is_session_supported(XrSessionMode::ImmersiveAr),
    )
    .await?;
    if !supported.as_bool().unwrap_or(false) {
        return Err(SessionError::Unsupported);
    }

    let init = XrSessionInit::new();
    let features: Array = REQUIRED_FEATURES.iter().map(|f| JsValue::from_str(f)).collect();
    init.set_required_features(&features);
    let session: XrSession = cast(
        NegotiationStep::SessionRequest,
        settle(
            NegotiationStep::SessionRequest,
            xr.request_session_with_options(XrSessionMode::ImmersiveAr, &init),
        )
        .await?,
    )?;
    debug!("Immersive AR session granted");

    match configure(&session, gl, camera).await {
        Ok(bindings) => Ok(bindings),
        Err(e) => {
            // Do not leave a half-configured session presenting
            let _ = session.end();
            Err(e)
        }
    }
}

async fn configure(
    session: &XrSession,
    gl: &WebGl2RenderingContext,
    camera: &CameraSettings,
) -> Result<XrBindings, SessionError> {
    let step = NegotiationStep::GraphicsLayer;
    settle(step, gl.make_xr_compatible()).await?;
    let layer = XrWebGlLayer::new_with_web_gl2_rendering_context(session, gl)
        .map_err(|e| SessionError::negotiation(step, describe(&e)))?;
    let render_state = XrRenderStateInit::new();
    render_state.set_base_layer(Some(&layer));
    render_state.set_depth_near(camera.near as f64);
    render_state.set_depth_far(camera.far as f64);
    session.update_render_state_with_state(&render_state);

    let step = NegotiationStep::FloorSpace;
    let floor: XrReferenceSpace = cast(
        step,
        settle(step, session.request_reference_space(XrReferenceSpaceType::LocalFloor)).await?,
    )?;

    let step = NegotiationStep::ViewerSpace;
    let viewer_space: XrReferenceSpace = cast(
        step,
        settle(step, session.request_reference_space(XrReferenceSpaceType::Viewer)).await?,
    )?;

    let step = NegotiationStep::HitTestSource;
    let promise = hit_test::request_source(session, &viewer_space)
        .map_err(|e| SessionError::negotiation(step, describe(&e)))?;
    let hit_source: XrHitTestSource = settle(step, promise).await?.unchecked_into();

    Ok(XrBindings {
        session: session.clone(),
        layer,
        floor,
        hit_source,
    })
}

/// Reduce this frame's hit-test results to an observation
///
/// `None` when the query itself failed; the frame is then skipped rather
/// than treated as "no surface".
fn observe(frame: &XrFrame, bindings: &XrBindings) -> Option<HitObservation> {
    match hit_test::results(frame, &bindings.hit_source) {
        Ok(results) => Some(HitObservation::from_ranked(&results, |hit| {
            hit.get_pose(&bindings.floor)
                .and_then(|pose| SurfacePose::from_cols_slice(&pose.transform().matrix()))
        })),
        Err(e) => {
            warn!(error = %describe(&e), "Hit test query failed");
            None
        }
    }
}

type FrameCallback = Closure<dyn FnMut(f64, XrFrame)>;

/// Callbacks owned by a running session, dropped when it ends
struct SessionCallbacks {
    frame: Rc<RefCell<Option<FrameCallback>>>,
    _select: Closure<dyn FnMut(XrInputSourceEvent)>,
}

/// Start the frame loop and gesture handling for a negotiated session
pub fn run(
    bindings: XrBindings,
    viewer: Rc<RefCell<Viewer>>,
    renderer: Rc<RefCell<Renderer>>,
    loader: Rc<HttpModelLoader>,
) {
    let bindings = Rc::new(bindings);
    viewer.borrow_mut().session_started();

    // Frame loop: hit test, surface tracking, render, re-arm
    let frame_slot: Rc<RefCell<Option<FrameCallback>>> = Rc::new(RefCell::new(None));
    {
        let slot = frame_slot.clone();
        let bindings = bindings.clone();
        let viewer = viewer.clone();
        let renderer = renderer.clone();
        *frame_slot.borrow_mut() = Some(Closure::wrap(Box::new(move |_time: f64, frame: XrFrame| {
            if let Some(observation) = observe(&frame, &bindings) {
                viewer.borrow_mut().on_frame(observation);
            }

            if let Some(pose) = frame.get_viewer_pose(&bindings.floor) {
                renderer
                    .borrow_mut()
                    .render_xr(&bindings.layer, &pose, viewer.borrow().scene());
            }

            if let Some(callback) = slot.borrow().as_ref() {
                frame.session().request_animation_frame(callback.as_ref().unchecked_ref());
            }
        }) as Box<dyn FnMut(f64, XrFrame)>));
    }

    // Select gesture: place the selected plant at the current surface
    let select = {
        let viewer = viewer.clone();
        Closure::wrap(Box::new(move |_event: XrInputSourceEvent| {
            let viewer = viewer.clone();
            let loader = loader.clone();
            spawn_local(async move {
                if let Some(Err(e)) = place(&*viewer, loader.as_ref()).await {
                    warn!(error = %e, "Placement failed");
                }
            });
        }) as Box<dyn FnMut(XrInputSourceEvent)>)
    };
    bindings
        .session
        .set_onselect(Some(select.as_ref().unchecked_ref()));

    let callbacks = Rc::new(RefCell::new(Some(SessionCallbacks {
        frame: frame_slot.clone(),
        _select: select,
    })));

    // Session end: reset state and release the callbacks above
    {
        let ended = bindings.clone();
        let onend = Closure::once_into_js(move |_event: web_sys::Event| {
            info!("XR session ended by host");
            ended.session.set_onselect(None);
            let _ = ended.hit_source.cancel();
            viewer.borrow_mut().session_ended();
            if let Some(callbacks) = callbacks.borrow_mut().take() {
                callbacks.frame.borrow_mut().take();
            }
        });
        bindings.session.set_onend(Some(onend.unchecked_ref()));
    }

    let first_frame = frame_slot.borrow();
    if let Some(callback) = first_frame.as_ref() {
        bindings
            .session
            .request_animation_frame(callback.as_ref().unchecked_ref());
    }
}

