//! Verdant Web - WebXR frontend
//!
//! Runs in the browser: detects flat surfaces through the WebXR hit-test
//! module, draws placed plant models with WebGL2 into the XR layer and
//! reflects state in the page's debug line, status icon and info card.

mod app;
pub mod config;
mod dom;
mod hit_test;
mod loader;
mod network;
mod renderer;
mod xr;

use wasm_bindgen::prelude::*;

/// Entry point for WASM module
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();

    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(if cfg!(debug_assertions) {
                tracing::Level::DEBUG
            } else {
                tracing::Level::INFO
            })
            .build(),
    );

    app::run();
}
