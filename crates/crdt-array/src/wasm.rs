//! WebAssembly bindings for crdt-array.
//!
//! Enable with the `wasm` feature:
//!
//! ```toml
//! [dependencies]
//! crdt-array = { version = "0.1", features = ["wasm"] }
//! ```
//!
//! Payloads are strings. Updates cross the boundary as JSON in the update
//! wire format, snapshots as JSON in the snapshot format.

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use wasm_bindgen::prelude::*;

use crate::{Document, ObserverId, Update};

fn js_now() -> u64 {
    js_sys::Date::now() as u64
}

fn js_error(err: impl ToString) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// A replicated document of string arrays for use from JavaScript.
#[wasm_bindgen(js_name = Document)]
pub struct WasmDocument {
    inner: Document<String>,
    observers: Vec<ObserverId>,
}

#[wasm_bindgen(js_class = Document)]
impl WasmDocument {
    /// Create a document for the given site id, timed by `Date.now()`.
    #[wasm_bindgen(constructor)]
    pub fn new(site: &str) -> Self {
        Self {
            inner: Document::builder(site).clock(js_now).build(),
            observers: Vec::new(),
        }
    }

    /// Restore a document from a JSON snapshot.
    #[wasm_bindgen(js_name = fromJSON)]
    pub fn from_json(json: &str, site: &str) -> Result<WasmDocument, JsValue> {
        let inner = Document::<String>::from_json(json, site).map_err(js_error)?;
        Ok(Self {
            inner,
            observers: Vec::new(),
        })
    }

    /// This replica's site id.
    #[wasm_bindgen(getter)]
    pub fn site(&self) -> String {
        self.inner.site().to_string()
    }

    /// Insert `content` at `index` of `container`. Returns the new item id.
    pub fn insert(&mut self, container: &str, index: usize, content: &str) -> String {
        self.inner
            .insert(container, index, content.to_string())
            .id()
            .to_string()
    }

    /// Delete the visible item at `index`. Returns its id, if there was one.
    pub fn delete(&mut self, container: &str, index: usize) -> Option<String> {
        self.inner
            .delete(container, index)
            .map(|item| item.id().to_string())
    }

    /// Apply a JSON update from another replica.
    #[wasm_bindgen(js_name = receiveUpdate)]
    pub fn receive_update(&mut self, json: &str) -> Result<bool, JsValue> {
        let update: Update<String> = crate::state::decode_update(json).map_err(js_error)?;
        Ok(self.inner.receive_update(&update))
    }

    /// Exchange missing work with another document.
    pub fn sync(&mut self, peer: &mut WasmDocument) {
        self.inner.sync(&mut peer.inner);
    }

    /// Visible contents of `container`.
    #[wasm_bindgen(js_name = toArray)]
    pub fn to_array(&self, container: &str) -> Box<[JsValue]> {
        self.inner
            .to_vec(container)
            .iter()
            .map(|s| JsValue::from_str(s))
            .collect::<Vec<_>>()
            .into_boxed_slice()
    }

    /// Snapshot as JSON.
    #[wasm_bindgen(js_name = toJSON)]
    pub fn to_json(&self) -> Result<String, JsValue> {
        self.inner.to_json().map_err(js_error)
    }

    /// Replace the contents with a JSON snapshot.
    #[wasm_bindgen(js_name = setState)]
    pub fn set_state(&mut self, json: &str) -> Result<(), JsValue> {
        let state = crate::DocState::from_json(json).map_err(js_error)?;
        self.inner.set_state(&state).map_err(js_error)
    }

    /// The version vector as JSON.
    #[wasm_bindgen(js_name = stateVector)]
    pub fn state_vector(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.inner.version()).map_err(js_error)
    }

    /// Call `callback` with every applied update, as a JSON string.
    /// Returns a handle for [`unobserve`](Self::unobserve).
    pub fn observe(&mut self, callback: js_sys::Function) -> usize {
        let id = self.inner.observe(move |update: &Update<String>| {
            if let Ok(json) = serde_json::to_string(update) {
                let _ = callback.call1(&JsValue::NULL, &JsValue::from_str(&json));
            }
        });
        self.observers.push(id);
        self.observers.len() - 1
    }

    /// Remove an observer registered with [`observe`](Self::observe).
    pub fn unobserve(&mut self, handle: usize) -> bool {
        match self.observers.get(handle) {
            Some(&id) => self.inner.unobserve(id),
            None => false,
        }
    }

    /// Flush pending changes now. Returns the flushed batch as JSON.
    pub fn flush(&mut self) -> Result<Option<String>, JsValue> {
        self.inner
            .flush()
            .map(|batch| serde_json::to_string(&batch).map_err(js_error))
            .transpose()
    }

    /// Run due background work. Call at or after
    /// [`nextDeadline`](Self::next_deadline).
    pub fn tick(&mut self) {
        self.inner.tick();
    }

    /// Milliseconds timestamp of the next due background task.
    #[wasm_bindgen(js_name = nextDeadline)]
    pub fn next_deadline(&self) -> Option<f64> {
        self.inner.next_deadline().map(|ms| ms as f64)
    }

    /// Remove all content.
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Stop background work and drop observers.
    pub fn destroy(&mut self) {
        self.inner.destroy();
        self.observers.clear();
    }

    /// An independent copy with site id `"<site>:clone"`.
    pub fn fork(&self) -> WasmDocument {
        Self {
            inner: self.inner.fork(),
            observers: Vec::new(),
        }
    }
}
