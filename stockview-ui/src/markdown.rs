//! Markdown rendering through the page's `marked` library

use js_sys::{Function, Reflect};
use stockview::markdown::{FallbackPolicy, MarkdownRenderer};
use wasm_bindgen::{JsCast, JsValue};

/// Local storage key selecting the fallback policy
pub const FALLBACK_STORAGE_KEY: &str = "stockview_markdown_fallback";

/// Renderer backed by a global `marked.parse`, when the page loaded one
pub struct MarkedRenderer;

impl MarkdownRenderer for MarkedRenderer {
    fn render(&self, markdown: &str) -> Option<String> {
        let marked = Reflect::get(&js_sys::global(), &JsValue::from_str("marked")).ok()?;
        if marked.is_undefined() || marked.is_null() {
            return None;
        }

        let parse = Reflect::get(&marked, &JsValue::from_str("parse"))
            .ok()?
            .dyn_into::<Function>()
            .ok()?;

        match parse.call1(&marked, &JsValue::from_str(markdown)) {
            Ok(html) => html.as_string(),
            Err(e) => {
                web_sys::console::error_1(&format!("marked.parse failed: {:?}", e).into());
                None
            }
        }
    }
}

/// Fallback policy from local storage, escaping unless set to `verbatim`
pub fn fallback_policy() -> FallbackPolicy {
    web_sys::window()
        .and_then(|window| window.local_storage().ok().flatten())
        .and_then(|storage| storage.get_item(FALLBACK_STORAGE_KEY).ok().flatten())
        .and_then(|name| FallbackPolicy::from_name(&name))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn renderer_absent_without_marked() {
        let _ = Reflect::delete_property(&js_sys::global(), &"marked".into());
        assert_eq!(MarkedRenderer.render("# title"), None);
    }

    #[wasm_bindgen_test]
    fn renderer_uses_marked_parse() {
        let marked = js_sys::Object::new();
        let parse = Function::new_with_args("md", "return '<h1>' + md.slice(2) + '</h1>';");
        Reflect::set(&marked, &"parse".into(), &parse).unwrap();
        Reflect::set(&js_sys::global(), &"marked".into(), &marked).unwrap();

        assert_eq!(MarkedRenderer.render("# NVDA"), Some("<h1>NVDA</h1>".to_string()));

        Reflect::delete_property(&js_sys::global(), &"marked".into()).unwrap();
    }
}
