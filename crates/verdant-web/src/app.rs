//! Page wiring: catalog, selector, canvas tap and the XR session

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{error, info, warn};
use verdant_core::{SessionError, ViewerContext};
use verdant_scene::Scene;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Event, HtmlCanvasElement, HtmlSelectElement};

use crate::config::FrontendConfig;
use crate::dom::{element_by_id, populate_selector, DomUi, CANVAS_ID, SELECTOR_ID};
use crate::loader::HttpModelLoader;
use crate::network::{fetch_catalog, fetch_config};
use crate::renderer::{create_context, Renderer};
use crate::xr::{self, Viewer};

pub fn run() {
    spawn_local(async {
        if let Err(e) = start().await {
            error!(error = ?e, "Viewer failed to start");
        }
    });
}

async fn start() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;

    let catalog = fetch_catalog().await;
    let config: FrontendConfig = fetch_config().await;

    let selector: Option<HtmlSelectElement> = element_by_id(&document, SELECTOR_ID);
    if let Some(selector) = &selector {
        populate_selector(selector, &catalog)?;
    }

    let mut scene = Scene::new();
    scene.camera = config.camera.clone();
    let loader = Rc::new(HttpModelLoader::new(
        config.viewer.assets.clone(),
        config.viewer.model.canonical_size,
    ));
    let viewer: Rc<RefCell<Viewer>> = Rc::new(RefCell::new(ViewerContext::new(
        catalog,
        config.viewer.clone(),
        scene,
        DomUi::new(&document),
    )));

    match &selector {
        Some(selector) => {
            let viewer = viewer.clone();
            let onchange = Closure::wrap(Box::new(move |event: Event| {
                let Some(select) = event
                    .target()
                    .and_then(|target| target.dyn_into::<HtmlSelectElement>().ok())
                else {
                    return;
                };
                viewer.borrow_mut().select_plant(&select.value());
            }) as Box<dyn FnMut(_)>);
            selector.add_event_listener_with_callback("change", onchange.as_ref().unchecked_ref())?;
            onchange.forget();
        }
        None => warn!(id = SELECTOR_ID, "Page element missing"),
    }

    let canvas: HtmlCanvasElement = element_by_id(&document, CANVAS_ID)
        .ok_or_else(|| JsValue::from_str("missing canvas element"))?;

    let renderer = match create_context(&canvas).and_then(Renderer::new) {
        Ok(renderer) => Rc::new(RefCell::new(renderer)),
        Err(e) => {
            // Without WebGL2 there is nothing to present into
            error!(error = %e, "Renderer unavailable");
            viewer.borrow_mut().session_failed(SessionError::Unsupported);
            return Ok(());
        }
    };

    let onclick = Closure::wrap(Box::new(move |_event: Event| {
        if !viewer.borrow_mut().request_session() {
            return;
        }
        let viewer = viewer.clone();
        let renderer = renderer.clone();
        let loader = loader.clone();
        let camera = config.camera.clone();
        spawn_local(async move {
            let gl = renderer.borrow().gl().clone();
            match xr::negotiate(&gl, &camera).await {
                Ok(bindings) => xr::run(bindings, viewer, renderer, loader),
                Err(e) => viewer.borrow_mut().session_failed(e),
            }
        });
    }) as Box<dyn FnMut(_)>);
    canvas.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
    onclick.forget();

    info!("Viewer ready");
    Ok(())
}
