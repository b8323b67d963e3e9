//! Browser viewport and History API router (WASM only)

use wasm_bindgen::JsValue;

use super::router::Router;
use super::viewport::{ScrollBehavior, Viewport, ViewportMetrics};
use crate::error::{RouterError, ViewportError};
use crate::state::offset_from_f64;

/// `window` scroll position and document height
#[derive(Debug, Default, Clone, Copy)]
pub struct WebViewport;

impl Viewport for WebViewport {
    fn metrics(&self) -> Result<ViewportMetrics, ViewportError> {
        let window = web_sys::window().ok_or(ViewportError::Unavailable)?;
        let scroll_y = window.scroll_y().map_err(|_| ViewportError::InvalidMetric("scrollY"))?;
        let inner_height = window
            .inner_height()
            .ok()
            .and_then(|h| h.as_f64())
            .ok_or(ViewportError::InvalidMetric("innerHeight"))?;
        let document_height = window
            .document()
            .and_then(|d| d.document_element())
            .map(|el| el.scroll_height())
            .ok_or(ViewportError::InvalidMetric("scrollHeight"))?;

        Ok(ViewportMetrics {
            scroll_offset: offset_from_f64(scroll_y).ok_or(ViewportError::InvalidMetric("scrollY"))?,
            viewport_height: offset_from_f64(inner_height)
                .ok_or(ViewportError::InvalidMetric("innerHeight"))?,
            document_height: document_height.max(0) as u32,
        })
    }

    fn scroll_to(&mut self, offset: u32, behavior: ScrollBehavior) -> Result<(), ViewportError> {
        let window = web_sys::window().ok_or(ViewportError::Unavailable)?;
        let options = web_sys::ScrollToOptions::new();
        options.set_top(f64::from(offset));
        options.set_behavior(match behavior {
            ScrollBehavior::Instant => web_sys::ScrollBehavior::Instant,
            ScrollBehavior::Smooth => web_sys::ScrollBehavior::Smooth,
        });
        window.scroll_to_with_scroll_to_options(&options);
        Ok(())
    }
}

/// Router backed by `window.history` and `window.location`
#[derive(Debug, Default, Clone, Copy)]
pub struct WebRouter;

impl WebRouter {
    fn history() -> Result<web_sys::History, RouterError> {
        web_sys::window()
            .and_then(|w| w.history().ok())
            .ok_or(RouterError::Unavailable)
    }
}

fn nav_err(path: &str, e: JsValue) -> RouterError {
    RouterError::Navigation {
        path: path.to_string(),
        reason: format!("{:?}", e),
    }
}

impl Router for WebRouter {
    fn current_path(&self) -> String {
        web_sys::window()
            .and_then(|w| w.location().pathname().ok())
            .unwrap_or_else(|| "/".to_string())
    }

    fn history_len(&self) -> usize {
        Self::history()
            .and_then(|h| h.length().map_err(|e| nav_err("", e)))
            .map(|len| len as usize)
            .unwrap_or(0)
    }

    fn push(&mut self, path: &str) -> Result<(), RouterError> {
        Self::history()?
            .push_state_with_url(&JsValue::NULL, "", Some(path))
            .map_err(|e| nav_err(path, e))
    }

    fn replace(&mut self, path: &str) -> Result<(), RouterError> {
        Self::history()?
            .replace_state_with_url(&JsValue::NULL, "", Some(path))
            .map_err(|e| nav_err(path, e))
    }

    fn back(&mut self) -> Result<(), RouterError> {
        Self::history()?.back().map_err(|e| nav_err("..", e))
    }
}
