#![cfg(target_arch = "wasm32")]
//! WASM front-end: probes the device, mounts every effect found in the page
//! and remounts them when a capability media query flips.

use std::cell::RefCell;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

mod dom;
mod field_lines;
mod frame;
mod glass;
mod listener;
mod particles;
mod pointer;
mod probe;
mod scroll;
mod sequencers;
mod visibility;

/// A mounted effect. Dropping it removes its listeners and cancels its frame
/// loop.
pub(crate) trait Effect {
    fn name(&self) -> &'static str;
}

type MountFn =
    fn(&web::Document, &fx_core::CapabilitySnapshot) -> anyhow::Result<Option<Box<dyn Effect>>>;

const MOUNTS: &[(&str, MountFn)] = &[
    ("glass", glass::mount),
    ("magnetic", pointer::mount_magnetic),
    ("ambient", pointer::mount_ambient),
    ("glow-keys", pointer::mount_glow_keys),
    ("cursor", pointer::mount_cursor),
    ("parallax", scroll::mount_parallax),
    ("velocity-text", scroll::mount_velocity_text),
    ("particles", particles::mount),
    ("field-lines", field_lines::mount),
    ("sequencers", sequencers::mount),
];

thread_local! {
    static EFFECTS: RefCell<Vec<Box<dyn Effect>>> = RefCell::new(Vec::new());
    static WATCH: RefCell<Option<probe::CapabilityWatch>> = RefCell::new(None);
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("forge-fx starting");

    spawn_local(async move {
        if let Err(e) = init() {
            log::error!("init error: {:?}", e);
        }
    });
    Ok(())
}

fn init() -> anyhow::Result<()> {
    mount_all()?;
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let watch = probe::CapabilityWatch::new(&window, || {
        log::info!("[probe] capability change, remounting");
        if let Err(e) = mount_all() {
            log::error!("remount error: {:?}", e);
        }
    })?;
    WATCH.with(|w| *w.borrow_mut() = Some(watch));
    Ok(())
}

fn mount_all() -> anyhow::Result<()> {
    unmount_all();
    let document = dom::window_document().ok_or_else(|| anyhow::anyhow!("no document"))?;
    let snapshot = probe::snapshot();
    log::info!(
        "[probe] tier={} touch={} reduced={} cores={} low_end={}",
        snapshot.tier.as_str(),
        snapshot.is_touch,
        snapshot.reduced_motion,
        snapshot.core_count,
        snapshot.is_low_end
    );

    let mut mounted = Vec::with_capacity(MOUNTS.len());
    for (name, mount) in MOUNTS {
        match mount(&document, &snapshot) {
            Ok(Some(effect)) => mounted.push(effect),
            Ok(None) => log::debug!("[mount] {name}: nothing to do"),
            // One broken effect does not take the others down.
            Err(e) => log::warn!("[mount] {name} failed: {e:?}"),
        }
    }
    log::info!(
        "[mount] {} effects: {}",
        mounted.len(),
        mounted.iter().map(|e| e.name()).collect::<Vec<_>>().join(", ")
    );
    EFFECTS.with(|fx| *fx.borrow_mut() = mounted);
    Ok(())
}

fn unmount_all() {
    // Take first so effect destructors never run inside the borrow.
    let effects = EFFECTS.with(|fx| std::mem::take(&mut *fx.borrow_mut()));
    if !effects.is_empty() {
        log::info!("[mount] tearing down {} effects", effects.len());
    }
    drop(effects);
}

/// Re-probe and remount everything, e.g. after the host swapped page content.
#[wasm_bindgen]
pub fn remount() -> Result<(), JsValue> {
    mount_all().map_err(|e| JsValue::from_str(&format!("{e:?}")))
}

/// Remove every listener and cancel every loop.
#[wasm_bindgen]
pub fn teardown() {
    WATCH.with(|w| w.borrow_mut().take());
    unmount_all();
}
