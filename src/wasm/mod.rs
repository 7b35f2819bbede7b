//! WASM bindings for the paginator
//!
//! The host passes JavaScript callbacks for measurement and for the
//! per-page editing surface; results come back as JSON strings.

use std::cell::Cell;
use std::rc::Rc;

use js_sys::Function;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::{
    CaretPlacement, CaretPosition, EditingSurface, LayoutContext, LayoutProvider, MeasureError,
    MeasurementOracle, PageId, Paginator, ReflowOutcome, StyleContext, SurfaceEvent,
};

/// Initialize panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// `measure(content, fontSize, lineHeight, contentWidth) -> height`
struct JsOracle {
    measure: Function,
}

impl MeasurementOracle for JsOracle {
    fn measure(&self, content: &str, style: &StyleContext) -> Result<f32, MeasureError> {
        let args = js_sys::Array::of4(
            &JsValue::from_str(content),
            &JsValue::from_f64(style.font_size as f64),
            &JsValue::from_f64(style.line_height as f64),
            &JsValue::from_f64(style.content_width as f64),
        );
        let value = self
            .measure
            .apply(&JsValue::NULL, &args)
            .map_err(|err| MeasureError::Failed(describe(&err)))?;

        match value.as_f64() {
            Some(height) if height.is_finite() && height >= 0.0 => Ok(height as f32),
            // hosts return null/NaN while the page is not in the DOM
            _ => Err(MeasureError::Detached(describe(&value))),
        }
    }
}

struct JsSurface {
    set_content: Function,
    set_focus: Function,
    page_removed: Option<Function>,
}

impl EditingSurface for JsSurface {
    fn set_content(&mut self, page_id: PageId, content: &str) {
        let result = self.set_content.call2(
            &JsValue::NULL,
            &page_id_value(page_id),
            &JsValue::from_str(content),
        );
        if let Err(err) = result {
            log::warn!("setContent({}) failed: {}", page_id, describe(&err));
        }
    }

    fn set_focus(&mut self, page_id: PageId, position: CaretPosition) {
        let position = match position {
            CaretPosition::Start => JsValue::from_str("start"),
            CaretPosition::End => JsValue::from_str("end"),
            CaretPosition::Offset(offset) => JsValue::from_f64(offset as f64),
        };
        if let Err(err) = self
            .set_focus
            .call2(&JsValue::NULL, &page_id_value(page_id), &position)
        {
            log::warn!("setFocus({}) failed: {}", page_id, describe(&err));
        }
    }

    fn page_removed(&mut self, page_id: PageId) {
        if let Some(callback) = &self.page_removed {
            if let Err(err) = callback.call1(&JsValue::NULL, &page_id_value(page_id)) {
                log::warn!("pageRemoved({}) failed: {}", page_id, describe(&err));
            }
        }
    }
}

/// Geometry shared between the bindings and the paginator
#[derive(Clone)]
struct SharedLayout(Rc<Cell<LayoutContext>>);

impl LayoutProvider for SharedLayout {
    fn layout_context(&self) -> LayoutContext {
        self.0.get()
    }
}

/// WASM-exposed paginator wrapper
#[wasm_bindgen]
pub struct WasmPaginator {
    inner: Paginator<JsOracle, JsSurface>,
    layout: SharedLayout,
}

#[wasm_bindgen]
impl WasmPaginator {
    /// Create a paginator over `initial` markup on A4 pages
    #[wasm_bindgen(constructor)]
    pub fn new(
        initial: &str,
        measure: Function,
        set_content: Function,
        set_focus: Function,
    ) -> Self {
        Self::build(initial, LayoutContext::a4(), measure, set_content, set_focus)
    }

    /// Create a paginator with a (partial) JSON layout context
    #[wasm_bindgen(js_name = withLayout)]
    pub fn with_layout(
        initial: &str,
        layout_json: &str,
        measure: Function,
        set_content: Function,
        set_focus: Function,
    ) -> Result<WasmPaginator, JsValue> {
        let layout = LayoutContext::from_json(layout_json).map_err(to_js_error)?;
        Ok(Self::build(initial, layout, measure, set_content, set_focus))
    }

    /// Called with the page id whenever a page leaves the document
    #[wasm_bindgen(js_name = onPageRemoved)]
    pub fn on_page_removed(&mut self, callback: Function) {
        self.inner.surface_mut().page_removed = Some(callback);
    }

    #[wasm_bindgen(js_name = contentChanged)]
    pub fn content_changed(&mut self, page_id: u64, content: String) -> String {
        self.dispatch(SurfaceEvent::ContentChanged {
            page_id: PageId(page_id),
            content,
        })
    }

    #[wasm_bindgen(js_name = backspaceAtStart)]
    pub fn backspace_at_start(&mut self, page_id: u64) -> String {
        self.dispatch(SurfaceEvent::BackspaceAtStart {
            page_id: PageId(page_id),
        })
    }

    #[wasm_bindgen(js_name = focusAcquired)]
    pub fn focus_acquired(&mut self, page_id: u64) -> String {
        self.dispatch(SurfaceEvent::FocusAcquired {
            page_id: PageId(page_id),
        })
    }

    /// Re-read geometry; pass a (partial) JSON layout to change it first.
    /// Its `fontSize` only applies until the first `fontSizeChanged`.
    #[wasm_bindgen(js_name = containerResized)]
    pub fn container_resized(&mut self, layout_json: Option<String>) -> Result<String, JsValue> {
        if let Some(json) = layout_json {
            let layout = LayoutContext::from_json(&json).map_err(to_js_error)?;
            self.layout.0.set(layout);
        }
        Ok(self.dispatch(SurfaceEvent::ContainerResized))
    }

    /// Later resizes keep this font size
    #[wasm_bindgen(js_name = fontSizeChanged)]
    pub fn font_size_changed(&mut self, font_size: f32) -> String {
        self.dispatch(SurfaceEvent::FontSizeChanged { font_size })
    }

    /// Dispatch a JSON-encoded surface event
    #[wasm_bindgen(js_name = handleEvent)]
    pub fn handle_event(&mut self, event_json: &str) -> Result<String, JsValue> {
        let event: SurfaceEvent = serde_json::from_str(event_json).map_err(to_js_error)?;
        Ok(self.dispatch(event))
    }

    /// Call from a timer: runs deferred relayouts and drops blank pages
    pub fn poll(&mut self) -> String {
        to_json(&OutcomeJs::from(&self.inner.poll()))
    }

    #[wasm_bindgen(js_name = cleanupEmptyPages)]
    pub fn cleanup_empty_pages(&mut self) -> String {
        to_json(&OutcomeJs::from(&self.inner.cleanup_empty_pages()))
    }

    #[wasm_bindgen(js_name = insertPageAfter)]
    pub fn insert_page_after(&mut self, page_id: u64, content: &str) -> String {
        to_json(&OutcomeJs::from(
            &self.inner.insert_page_after(PageId(page_id), content),
        ))
    }

    #[wasm_bindgen(js_name = removePage)]
    pub fn remove_page(&mut self, page_id: u64) -> String {
        to_json(&OutcomeJs::from(&self.inner.remove_page(PageId(page_id))))
    }

    /// Ordered `[{id, content}]` (returns JSON)
    #[wasm_bindgen(js_name = getPages)]
    pub fn get_pages(&self) -> String {
        to_json(&self.inner.snapshot())
    }

    #[wasm_bindgen(js_name = getActivePageId)]
    pub fn get_active_page_id(&self) -> u64 {
        self.inner.active_page_id().0
    }

    #[wasm_bindgen(js_name = getPageCount)]
    pub fn get_page_count(&self) -> usize {
        self.inner.pages().len()
    }

    #[wasm_bindgen(js_name = getDocumentContent)]
    pub fn get_document_content(&self) -> String {
        self.inner.document_content()
    }

    #[wasm_bindgen(js_name = getStats)]
    pub fn get_stats(&self) -> String {
        to_json(&self.inner.stats())
    }

    #[wasm_bindgen(js_name = getMaxLines)]
    pub fn get_max_lines(&self) -> usize {
        self.inner.max_lines()
    }

    #[wasm_bindgen(js_name = getLayout)]
    pub fn get_layout(&self) -> String {
        to_json(self.inner.layout())
    }

    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        to_json(&self.inner.state())
    }
}

impl WasmPaginator {
    fn build(
        initial: &str,
        layout: LayoutContext,
        measure: Function,
        set_content: Function,
        set_focus: Function,
    ) -> Self {
        let shared = SharedLayout(Rc::new(Cell::new(layout)));
        let surface = JsSurface {
            set_content,
            set_focus,
            page_removed: None,
        };
        let inner = Paginator::new(initial, JsOracle { measure }, surface, shared.clone());
        Self {
            inner,
            layout: shared,
        }
    }

    fn dispatch(&mut self, event: SurfaceEvent) -> String {
        to_json(&OutcomeJs::from(&self.inner.handle(event)))
    }
}

/// Serializable reflow outcome for JS
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeJs {
    pub changed: Vec<u64>,
    pub created: Vec<u64>,
    pub removed: Vec<u64>,
    pub degraded: Vec<u64>,
    pub warnings: Vec<String>,
    pub caret: Option<CaretPlacement>,
    pub relayout_deferred: bool,
}

impl From<&ReflowOutcome> for OutcomeJs {
    fn from(outcome: &ReflowOutcome) -> Self {
        let ids = |ids: &[PageId]| ids.iter().map(|id| id.0).collect::<Vec<_>>();
        Self {
            changed: ids(&outcome.changed),
            created: ids(&outcome.created),
            removed: ids(&outcome.removed),
            degraded: ids(&outcome.degraded),
            warnings: outcome.warnings.iter().map(ToString::to_string).collect(),
            caret: outcome.caret,
            relayout_deferred: outcome.relayout_deferred,
        }
    }
}

fn page_id_value(page_id: PageId) -> JsValue {
    JsValue::from_f64(page_id.0 as f64)
}

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

fn to_js_error(err: serde_json::Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}
