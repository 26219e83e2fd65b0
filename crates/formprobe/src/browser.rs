//! Browser control over the Chrome `DevTools` Protocol.
//!
//! [`BrowserConfig`] is always available so configs can be parsed without
//! a browser. The real implementation ([`Browser`], [`CdpDriver`]) needs
//! the `browser` feature, which pulls in chromiumoxide.

use serde::{Deserialize, Serialize};

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 900,
            chromium_path: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

// ============================================================================
// Real CDP Implementation (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
#[allow(clippy::significant_drop_tightening, clippy::missing_errors_doc)]
mod cdp {
    use super::BrowserConfig;
    use crate::driver::{FormDriver, HandleArena, NodeRef, Screenshot};
    use crate::result::{FormError, FormResult};
    use crate::selector::Selector;
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::page::{
        CaptureScreenshotFormat, CaptureScreenshotParams,
    };
    use chromiumoxide::cdp::js_protocol::runtime::ReleaseObjectParams;
    use chromiumoxide::element::Element;
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    const IS_VISIBLE_JS: &str = "function() { \
        const r = this.getBoundingClientRect(); \
        const s = window.getComputedStyle(this); \
        return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none'; \
    }";

    const TAG_NAME_JS: &str = "function() { return this.tagName.toLowerCase(); }";

    const SELECT_CONTENTS_JS: &str =
        "function() { this.focus(); if (typeof this.select === 'function') { this.select(); } }";

    fn page_err(e: impl std::fmt::Display) -> FormError {
        FormError::page(e.to_string())
    }

    /// Browser instance with real CDP connection
    #[derive(Debug)]
    pub struct Browser {
        config: BrowserConfig,
        inner: Arc<Mutex<CdpBrowser>>,
        #[allow(dead_code)]
        handle: tokio::task::JoinHandle<()>,
    }

    impl Browser {
        /// Launch a new browser instance
        pub async fn launch(config: BrowserConfig) -> FormResult<Self> {
            let mut builder = CdpConfig::builder()
                .window_size(config.viewport_width, config.viewport_height);

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder
                .build()
                .map_err(|e| FormError::BrowserLaunchError { message: e })?;

            let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(|e| {
                FormError::BrowserLaunchError {
                    message: e.to_string(),
                }
            })?;

            let handle = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if let Err(e) = event {
                        tracing::trace!(error = %e, "cdp handler event error");
                    }
                }
            });

            tracing::debug!(headless = config.headless, "browser launched");
            Ok(Self {
                config,
                inner: Arc::new(Mutex::new(browser)),
                handle,
            })
        }

        /// Open a blank page and wrap it in a driver
        pub async fn new_page(&self) -> FormResult<CdpDriver> {
            let browser = self.inner.lock().await;
            let page = browser.new_page("about:blank").await.map_err(page_err)?;
            Ok(CdpDriver::new(page))
        }

        /// Get the browser configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }

        /// Close the browser
        pub async fn close(self) -> FormResult<()> {
            let mut browser = self.inner.lock().await;
            browser
                .close()
                .await
                .map_err(|e| FormError::BrowserLaunchError {
                    message: e.to_string(),
                })?;
            Ok(())
        }
    }

    /// [`FormDriver`] over one CDP page
    ///
    /// Elements returned by queries are interned by backend node id for
    /// the lifetime of the current document, so polling the same element
    /// keeps one handle. Navigating clears the arena and old handles turn
    /// into [`FormError::StaleElement`].
    #[derive(Debug)]
    pub struct CdpDriver {
        page: CdpPage,
        arena: Mutex<HandleArena<i64, Element>>,
    }

    impl CdpDriver {
        /// Wrap an existing page
        #[must_use]
        pub fn new(page: CdpPage) -> Self {
            Self {
                page,
                arena: Mutex::new(HandleArena::new()),
            }
        }

        /// Underlying chromiumoxide page
        #[must_use]
        pub const fn page(&self) -> &CdpPage {
            &self.page
        }

        async fn eval_on<T: serde::de::DeserializeOwned>(
            &self,
            node: NodeRef,
            function: &str,
        ) -> FormResult<Option<T>> {
            let arena = self.arena.lock().await;
            let element = arena.get(node)?;
            let returned = element
                .call_js_fn(function, false)
                .await
                .map_err(page_err)?;
            Ok(returned
                .result
                .value
                .and_then(|v| serde_json::from_value(v).ok()))
        }

        /// Free the page-side object behind a handle we already hold
        async fn release(&self, element: Element) {
            let params = ReleaseObjectParams::new(element.remote_object_id);
            if let Err(e) = self.page.execute(params).await {
                tracing::trace!(error = %e, "release of duplicate handle failed");
            }
        }

        async fn require_visible(&self, node: NodeRef) -> FormResult<()> {
            if self.is_visible(node).await? {
                Ok(())
            } else {
                Err(FormError::not_interactable(format!(
                    "element {node} is not visible"
                )))
            }
        }
    }

    #[async_trait]
    impl FormDriver for CdpDriver {
        async fn navigate(&mut self, url: &str) -> FormResult<()> {
            self.page
                .goto(url)
                .await
                .map_err(|e| FormError::NavigationError {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            self.arena.lock().await.clear();
            Ok(())
        }

        async fn current_url(&self) -> FormResult<String> {
            Ok(self.page.url().await.map_err(page_err)?.unwrap_or_default())
        }

        async fn query_all(
            &self,
            scope: Option<NodeRef>,
            selector: &Selector,
        ) -> FormResult<Vec<NodeRef>> {
            let css = selector.to_css();
            let mut arena = self.arena.lock().await;
            let found = match scope {
                None => self.page.find_elements(css).await,
                Some(node) => {
                    arena.get(node)?.find_elements(css).await
                }
            };
            let found = found.map_err(page_err)?;
            let mut nodes = Vec::with_capacity(found.len());
            let mut redundant = Vec::new();
            for element in found {
                let key = *element.backend_node_id.inner();
                let (node, dup) = arena.intern(key, element);
                nodes.push(node);
                redundant.extend(dup);
            }
            drop(arena);
            for element in redundant {
                self.release(element).await;
            }
            Ok(nodes)
        }

        async fn attribute(&self, node: NodeRef, name: &str) -> FormResult<Option<String>> {
            let arena = self.arena.lock().await;
            let element = arena.get(node)?;
            element.attribute(name).await.map_err(page_err)
        }

        async fn tag_name(&self, node: NodeRef) -> FormResult<String> {
            Ok(self
                .eval_on::<String>(node, TAG_NAME_JS)
                .await?
                .unwrap_or_default())
        }

        async fn is_visible(&self, node: NodeRef) -> FormResult<bool> {
            Ok(self
                .eval_on::<bool>(node, IS_VISIBLE_JS)
                .await?
                .unwrap_or(false))
        }

        async fn has_ancestor(&self, node: NodeRef, selector: &Selector) -> FormResult<bool> {
            let quoted = serde_json::to_string(&selector.to_css())?;
            let function = format!(
                "function() {{ return !!(this.parentElement && this.parentElement.closest({quoted})); }}"
            );
            Ok(self
                .eval_on::<bool>(node, &function)
                .await?
                .unwrap_or(false))
        }

        async fn click(&self, node: NodeRef) -> FormResult<()> {
            self.require_visible(node).await?;
            let arena = self.arena.lock().await;
            let element = arena.get(node)?;
            element
                .click()
                .await
                .map_err(|e| FormError::not_interactable(e.to_string()))?;
            Ok(())
        }

        async fn fill(&self, node: NodeRef, value: &str) -> FormResult<()> {
            self.require_visible(node).await?;
            self.eval_on::<serde_json::Value>(node, SELECT_CONTENTS_JS)
                .await?;
            let arena = self.arena.lock().await;
            let element = arena.get(node)?;
            element
                .type_str(value)
                .await
                .map_err(|e| FormError::not_interactable(e.to_string()))?;
            Ok(())
        }

        async fn content(&self) -> FormResult<String> {
            self.page.content().await.map_err(page_err)
        }

        async fn visible_text(&self) -> FormResult<String> {
            self.page
                .evaluate("document.body ? document.body.innerText : ''")
                .await
                .map_err(page_err)?
                .into_value::<String>()
                .map_err(page_err)
        }

        async fn screenshot(&self) -> FormResult<Screenshot> {
            let params = CaptureScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .build();
            let screenshot =
                self.page
                    .execute(params)
                    .await
                    .map_err(|e| FormError::ScreenshotError {
                        message: e.to_string(),
                    })?;
            use base64::Engine;
            let data = base64::engine::general_purpose::STANDARD
                .decode(&screenshot.data)
                .map_err(|e| FormError::ScreenshotError {
                    message: e.to_string(),
                })?;
            Ok(Screenshot::new(data))
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::{Browser, CdpDriver};
