#![cfg_attr(doc, doc = include_str!("../README.md"))]
#![cfg_attr(
    doc,
    doc(
        html_logo_url = "https://cdnweb.devolutions.net/images/projects/devolutions/logos/devolutions-icon-shadow.svg"
    )
)]

// Silence the unused_crate_dependencies lint.
// This crate is added just to enable additional WASM features.
extern crate time as _;

#[macro_use]
extern crate tracing;

mod client;
mod engine;
mod error;
mod form;
mod timer;

use wasm_bindgen::prelude::*;

// NOTE: #[wasm_bindgen(start)] is not used so that the host decides when logging starts.
#[wasm_bindgen]
pub fn set_log(log_level: &str) {
    ironrdp_bootstrap::init_logging(log_level);
    debug!("IronRDP bootstrap is ready");
}
