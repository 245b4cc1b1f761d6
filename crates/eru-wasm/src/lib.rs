//! WebAssembly bindings for Eru
//!
//! The background service worker calls [`init`] once with the persisted
//! `{stats, protected}` object from extension storage, then forwards the
//! platform listeners (`onRuleMatchedDebug`, `runtime.onMessage`,
//! `tabs.onUpdated`) to the matching entry points. Every mutation is pushed
//! to [`subscribe`]d callbacks as `(changes, areaName)`, the same shape as
//! `storage.onChanged`; the worker mirrors `changes[key].newValue` back into
//! extension storage from one of those callbacks.

mod console;

use std::cell::{Cell, RefCell};
use std::sync::{Arc, OnceLock};

use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use eru_core::{
    bus::{BrowserEvent, EventBus},
    detect::{scan_page, ElementCounter, RESCAN_DELAY_MS},
    summary::{check_host_environment, format_count, AdminSummary, DEFAULT_TOP_LIMIT},
    types::{RuleMatchInfo, TabChangeInfo, TabInfo},
    url::{derive_domain, normalize_host},
    ChangeEvent, EngineConfig, ExclusionSet, MemoryBackend, StatsStore,
};

struct EngineState {
    store: Arc<StatsStore<MemoryBackend>>,
    bus: EventBus,
    exclusions: Arc<ExclusionSet>,
}

static ENGINE: OnceLock<EngineState> = OnceLock::new();

thread_local! {
    static LISTENERS: RefCell<Vec<(u32, js_sys::Function)>> = RefCell::new(Vec::new());
    static NEXT_LISTENER: Cell<u32> = Cell::new(1);
}

fn js_clock() -> u64 {
    js_sys::Date::now() as u64
}

fn from_js<T: DeserializeOwned>(value: &JsValue) -> Option<T> {
    if value.is_undefined() || value.is_null() {
        return None;
    }
    let text = js_sys::JSON::stringify(value).ok()?.as_string()?;
    serde_json::from_str(&text).ok()
}

fn to_js<T: Serialize>(value: &T) -> JsValue {
    serde_json::to_string(value)
        .ok()
        .and_then(|text| js_sys::JSON::parse(&text).ok())
        .unwrap_or(JsValue::NULL)
}

fn broadcast(event: &ChangeEvent) {
    let callbacks: Vec<js_sys::Function> =
        LISTENERS.with(|listeners| listeners.borrow().iter().map(|(_, f)| f.clone()).collect());
    if callbacks.is_empty() {
        return;
    }
    let changes = to_js(&event.changes);
    let area = JsValue::from_str(event.area);
    for callback in callbacks {
        if let Err(e) = callback.call2(&JsValue::NULL, &changes, &area) {
            log::warn!("Change listener threw: {:?}", e);
        }
    }
}

#[wasm_bindgen]
pub fn init(config_json: Option<String>, persisted: JsValue) -> Result<(), JsValue> {
    console::init(log::LevelFilter::Info);

    if ENGINE.get().is_some() {
        return Err(JsValue::from_str("Already initialized. Reload the extension to reinitialize."));
    }

    let config = match config_json.as_deref() {
        Some(text) => EngineConfig::from_json(text)
            .map_err(|e| JsValue::from_str(&format!("Failed to load config: {}", e)))?,
        None => EngineConfig::default(),
    };

    let snapshot: serde_json::Value = from_js(&persisted).unwrap_or(serde_json::Value::Null);
    let exclusions = Arc::new(config.exclusion_set());
    let store = Arc::new(
        StatsStore::new(MemoryBackend::from_snapshot(&snapshot), Arc::clone(&exclusions)).with_clock(js_clock),
    );
    store.subscribe(broadcast);
    let bus = EventBus::with_producers(Arc::clone(&store), Arc::clone(&exclusions), Arc::new(config.classifier()));

    ENGINE
        .set(EngineState { store, bus, exclusions })
        .map_err(|_| JsValue::from_str("Failed to set engine state"))?;

    log::info!("Stats engine ready");
    Ok(())
}

#[wasm_bindgen]
pub fn is_initialized() -> bool {
    ENGINE.get().is_some()
}

#[wasm_bindgen]
pub fn set_log_level(level: &str) {
    console::init(console::parse_level(level));
}

/// Matches that do not parse are dropped rather than counted with defaults,
/// so a malformed field can never turn an excluded initiator into a hit.
#[wasm_bindgen]
pub fn on_rule_matched(info: JsValue) {
    let Some(state) = ENGINE.get() else { return };
    let Some(info) = from_js::<RuleMatchInfo>(&info) else {
        log::debug!("Dropping unreadable rule match");
        return;
    };
    state.bus.dispatch(&BrowserEvent::RuleMatched(info));
}

/// Returns true when the listener must keep the reply channel open.
#[wasm_bindgen]
pub fn on_message(message: JsValue) -> bool {
    let Some(state) = ENGINE.get() else { return false };
    let Some(payload) = from_js::<serde_json::Value>(&message) else {
        return false;
    };
    state.bus.dispatch(&BrowserEvent::Message { payload }).keep_channel_open()
}

#[wasm_bindgen]
pub fn on_tab_updated(tab_id: i32, change_info: JsValue, tab: JsValue) {
    let Some(state) = ENGINE.get() else { return };
    let (Some(change_info), Some(tab)) = (from_js::<TabChangeInfo>(&change_info), from_js::<TabInfo>(&tab)) else {
        log::debug!("Dropping unreadable tab update for tab {}", tab_id);
        return;
    };
    state.bus.dispatch(&BrowserEvent::TabUpdated { tab_id, change_info, tab });
}

#[wasm_bindgen]
pub fn get_stats() -> JsValue {
    match ENGINE.get() {
        Some(state) => to_js(&state.store.read()),
        None => to_js(&eru_core::StatsRecord::empty(js_clock())),
    }
}

#[wasm_bindgen]
pub fn get_protected() -> JsValue {
    match ENGINE.get() {
        Some(state) => to_js(&state.store.read_protected()),
        None => js_sys::Object::new().into(),
    }
}

#[wasm_bindgen]
pub fn get_admin_summary(limit: Option<u32>) -> JsValue {
    let Some(state) = ENGINE.get() else { return JsValue::NULL };
    let summary = AdminSummary::build(
        &state.store.read(),
        &state.store.read_protected(),
        limit.map(|n| n as usize).unwrap_or(DEFAULT_TOP_LIMIT),
    );
    to_js(&summary)
}

/// Total blocked count formatted for the popup badge.
#[wasm_bindgen]
pub fn get_total_display() -> String {
    let total = ENGINE.get().map(|state| state.store.read().total_blocked).unwrap_or(0);
    format_count(total)
}

#[wasm_bindgen]
pub fn reset() -> bool {
    match ENGINE.get() {
        Some(state) => state.store.reset(),
        None => false,
    }
}

/// Register a `(changes, areaName)` listener. Listeners run while the store
/// is still applying the write, so they must not call back into `reset` or
/// the event entry points; mirroring to extension storage is fine.
#[wasm_bindgen]
pub fn subscribe(callback: js_sys::Function) -> u32 {
    let id = NEXT_LISTENER.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    });
    LISTENERS.with(|listeners| listeners.borrow_mut().push((id, callback)));
    id
}

#[wasm_bindgen]
pub fn unsubscribe(id: u32) -> bool {
    LISTENERS.with(|listeners| {
        let mut listeners = listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(listener, _)| *listener != id);
        listeners.len() != before
    })
}

/// Blocking message for the admin panel when it was opened outside the
/// extension, or None when extension storage is reachable.
#[wasm_bindgen]
pub fn check_admin_environment() -> Option<String> {
    let storage_available = lookup(&js_sys::global(), &["chrome", "storage", "local"])
        .map(|local| !local.is_undefined() && !local.is_null())
        .unwrap_or(false);
    check_host_environment(storage_available).err().map(|e| e.to_string())
}

fn lookup(root: &JsValue, path: &[&str]) -> Option<JsValue> {
    let mut current = root.clone();
    for key in path {
        if current.is_undefined() || current.is_null() {
            return None;
        }
        current = js_sys::Reflect::get(&current, &JsValue::from_str(key)).ok()?;
    }
    Some(current)
}

// =============================================================================
// Content Script
// =============================================================================

struct DocumentCounter<'a>(&'a web_sys::Document);

impl ElementCounter for DocumentCounter<'_> {
    type Error = String;

    fn count_matching(&self, selector: &str) -> Result<usize, String> {
        self.0
            .query_selector_all(selector)
            .map(|nodes| nodes.length() as usize)
            .map_err(|e| format!("{:?}", e))
    }
}

fn send_runtime_message(message: &JsValue) -> Result<(), JsValue> {
    let Some(runtime) = lookup(&js_sys::global(), &["chrome", "runtime"]) else {
        return Ok(());
    };
    let has_id = lookup(&runtime, &["id"]).is_some_and(|id| !id.is_undefined());
    if !has_id {
        return Ok(());
    }
    let send: js_sys::Function = js_sys::Reflect::get(&runtime, &"sendMessage".into())?.dyn_into()?;
    send.call1(&runtime, message)?;
    Ok(())
}

fn run_page_scan() -> Result<bool, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
    let document = window.document().ok_or_else(|| JsValue::from_str("No document"))?;
    let hostname = window.location().hostname()?;

    let default_exclusions;
    let exclusions = match ENGINE.get() {
        Some(state) => state.exclusions.as_ref(),
        None => {
            default_exclusions = ExclusionSet::default();
            &default_exclusions
        }
    };

    match scan_page(&hostname, &DocumentCounter(&document), exclusions) {
        Some(report) => {
            send_runtime_message(&to_js(&report))?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Scan the current page now and once more after a short delay. Returns
/// whether the first scan reported anything.
#[wasm_bindgen]
pub fn start_content_scan() -> Result<bool, JsValue> {
    let reported = run_page_scan()?;

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
    let rescan = Closure::once_into_js(|| {
        if let Err(e) = run_page_scan() {
            log::debug!("Delayed ad scan failed: {:?}", e);
        }
    });
    window.set_timeout_with_callback_and_timeout_and_arguments_0(rescan.unchecked_ref(), RESCAN_DELAY_MS)?;

    Ok(reported)
}

// =============================================================================
// Helpers
// =============================================================================

#[wasm_bindgen]
pub fn normalize_host_js(input: &str) -> Option<String> {
    normalize_host(input)
}

#[wasm_bindgen]
pub fn derive_domain_js(initiator: Option<String>, url: Option<String>) -> String {
    derive_domain(initiator.as_deref(), url.as_deref())
}

#[wasm_bindgen]
pub fn format_count_js(n: f64) -> String {
    format_count(n.max(0.0) as u64)
}
