//! The rasterization entry point.
//!
//! An [`SvgResource`] owns one loaded document together with its override
//! tables and raster cache. Every rasterization call follows the same path:
//! validate, LOD-size, build a cache key, and either reuse a cached image
//! or resolve overrides on a scratch copy of the document and render it.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, Sender};
use image::RgbaImage;
use parking_lot::Mutex;
use serde::Serialize;

use crate::cache::{self, build_key, CacheStats, ContentId, LodPolicy, RasterCache};
use crate::detect;
use crate::document::{Document, ElementId, ParseOptions};
use crate::error::{Error, Result};
use crate::model::{Color, Shader, Size, Symbol};
use crate::overrides::{self, class_key, EffectiveStyle, OverrideStore};
use crate::render::{
    self, PostProcessor, RenderBackend, RenderTarget, ResourceOptions, ResvgBackend,
};

/// Why a [`ContentChanged`] notification was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeReason {
    /// A document was (re)loaded.
    Loaded,
    /// An override was set or cleared.
    OverridesChanged,
    /// The cache was cleared on request.
    CacheCleared,
    /// Caching was enabled or disabled.
    CacheConfigChanged,
    /// LOD was toggled or its bias changed.
    LodChanged,
}

/// Notification that previously rasterized images may be stale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentChanged {
    pub reason: ChangeReason,
    pub at: DateTime<Utc>,
}

/// An SVG document with override-aware, cached rasterization.
///
/// Rasterization takes `&self`: the cache sits behind a lock so that the
/// read-only calls can still populate it. Everything else that changes
/// state takes `&mut self`.
///
/// # Example
///
/// ```no_run
/// use svgtint::{Color, Size, SvgResource};
///
/// let mut resource = SvgResource::new();
/// resource.load_from_file("icons.svg")?;
/// resource.set_fill_by_class("accent", Color::RED);
///
/// let image = resource.rasterize_symbol("home", Size::square(64))?;
/// assert_eq!(image.dimensions(), (64, 64));
/// # Ok::<(), svgtint::Error>(())
/// ```
pub struct SvgResource {
    source: String,
    document: Option<Document>,
    symbols: BTreeMap<String, Symbol>,
    overrides: OverrideStore,
    cache: Mutex<RasterCache>,
    lod: LodPolicy,
    background: u32,
    parse_options: ParseOptions,
    backend: Box<dyn RenderBackend>,
    post_processor: Option<Box<dyn PostProcessor>>,
    subscribers: Mutex<Vec<Sender<ContentChanged>>>,
}

impl SvgResource {
    /// Create an empty resource with default options and the resvg backend.
    pub fn new() -> Self {
        Self::with_options(ResourceOptions::default())
    }

    /// Create an empty resource with custom options.
    pub fn with_options(options: ResourceOptions) -> Self {
        Self {
            source: String::new(),
            document: None,
            symbols: BTreeMap::new(),
            overrides: OverrideStore::new(),
            cache: Mutex::new(RasterCache::new(
                options.cache_enabled,
                options.max_cache_entries,
            )),
            lod: LodPolicy::new(options.lod_enabled, options.lod_bias),
            background: options.background,
            parse_options: options.parse,
            backend: Box::new(ResvgBackend::new()),
            post_processor: None,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Replace the render backend.
    pub fn with_backend(mut self, backend: impl RenderBackend + 'static) -> Self {
        self.backend = Box::new(backend);
        self
    }

    /// Install the post-processor used by
    /// [`rasterize_element_with_shader`](Self::rasterize_element_with_shader).
    pub fn with_post_processor(mut self, processor: impl PostProcessor + 'static) -> Self {
        self.post_processor = Some(Box::new(processor));
        self
    }

    // ---------------------------------------------------------------------
    // Loading
    // ---------------------------------------------------------------------

    /// Load a document from SVG source text.
    ///
    /// On failure the previously loaded document, symbols and cache stay
    /// exactly as they were. Overrides survive reloads.
    pub fn load_from_str(&mut self, text: &str) -> Result<()> {
        let document = Document::parse_with_options(text, &self.parse_options)?;
        let symbols = self.extract_symbols(&document);

        log::info!(
            "Loaded SVG document: {} elements, {} symbols",
            document.element_count(),
            symbols.len()
        );

        self.source = text.to_string();
        self.document = Some(document);
        self.symbols = symbols;
        self.cache.get_mut().clear();
        self.notify(ChangeReason::Loaded);
        Ok(())
    }

    /// Load a document from raw bytes (plain SVG or gzip-compressed SVGZ).
    pub fn load_from_bytes(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Err(Error::Parse("SVG source is empty".to_string()));
        }
        let text = detect::decode_source(data, self.parse_options.decompress)?;
        self.load_from_str(&text)
    }

    /// Load a document from a file.
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        log::debug!("Loading SVG from {}", path.display());
        let data = std::fs::read(path)?;
        self.load_from_bytes(&data)
    }

    fn extract_symbols(&self, doc: &Document) -> BTreeMap<String, Symbol> {
        let mut symbols = BTreeMap::new();
        for el in doc.query_elements("symbol") {
            let Some(id) = doc.id(el) else {
                log::debug!("Skipping <symbol> without id");
                continue;
            };
            if symbols.contains_key(id) {
                log::warn!("Duplicate symbol id '{}', keeping the first", id);
                continue;
            }

            let bounds = match self.backend.bounding_box(doc, el) {
                Ok(bounds) => bounds.unwrap_or_default(),
                Err(e) => {
                    log::warn!("Could not measure symbol '{}': {}", id, e);
                    Default::default()
                }
            };
            let view_box = doc.get_attribute(el, "viewBox").map(str::to_string);
            symbols.insert(id.to_string(), Symbol::new(id, view_box, bounds));
        }
        symbols
    }

    /// Whether a document is loaded.
    pub fn is_loaded(&self) -> bool {
        self.document.is_some()
    }

    /// The loaded document, without overrides applied.
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Source text of the loaded document (empty before the first load).
    pub fn source(&self) -> &str {
        &self.source
    }

    // ---------------------------------------------------------------------
    // Symbols
    // ---------------------------------------------------------------------

    /// Ids of all symbols in the loaded document, sorted.
    pub fn symbol_ids(&self) -> Vec<&str> {
        self.symbols.keys().map(String::as_str).collect()
    }

    pub fn has_symbol(&self, id: &str) -> bool {
        self.symbols.contains_key(id)
    }

    pub fn symbol(&self, id: &str) -> Option<&Symbol> {
        self.symbols.get(id)
    }

    /// All symbols, sorted by id.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    // ---------------------------------------------------------------------
    // Overrides
    // ---------------------------------------------------------------------

    /// Read access to the override tables.
    pub fn overrides(&self) -> &OverrideStore {
        &self.overrides
    }

    /// Replace every override at once (e.g. from a JSON snapshot).
    pub fn set_overrides(&mut self, overrides: OverrideStore) {
        self.overrides = overrides;
        self.overrides_changed();
    }

    /// Override the fill of the element or class named by `selector`.
    pub fn set_fill(&mut self, selector: &str, color: Color) {
        self.overrides.set_fill(selector, color);
        self.overrides_changed();
    }

    pub fn clear_fill(&mut self, selector: &str) {
        self.overrides.clear_fill(selector);
        self.overrides_changed();
    }

    /// Override the fill of every element carrying `class`.
    pub fn set_fill_by_class(&mut self, class: &str, color: Color) {
        self.set_fill(&class_key(class), color);
    }

    pub fn clear_fill_by_class(&mut self, class: &str) {
        self.clear_fill(&class_key(class));
    }

    /// Override the stroke of the element or class named by `selector`.
    pub fn set_stroke(&mut self, selector: &str, color: Color) {
        self.overrides.set_stroke(selector, color);
        self.overrides_changed();
    }

    pub fn clear_stroke(&mut self, selector: &str) {
        self.overrides.clear_stroke(selector);
        self.overrides_changed();
    }

    /// Override the stroke of every element carrying `class`.
    pub fn set_stroke_by_class(&mut self, class: &str, color: Color) {
        self.set_stroke(&class_key(class), color);
    }

    pub fn clear_stroke_by_class(&mut self, class: &str) {
        self.clear_stroke(&class_key(class));
    }

    /// Assign attribute `name` on the element with `element_id` at render
    /// time.
    pub fn set_property(&mut self, element_id: &str, name: &str, value: &str) {
        self.overrides.set_property(element_id, name, value);
        self.overrides_changed();
    }

    /// Set several properties on one element with a single invalidation.
    pub fn set_properties<I, K, V>(&mut self, element_id: &str, properties: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in properties {
            self.overrides
                .set_property(element_id, name.as_ref(), value.as_ref());
        }
        self.overrides_changed();
    }

    pub fn clear_property(&mut self, element_id: &str, name: &str) {
        self.overrides.clear_property(element_id, name);
        self.overrides_changed();
    }

    pub fn clear_properties(&mut self, element_id: &str) {
        self.overrides.clear_properties(element_id);
        self.overrides_changed();
    }

    /// Attach a shader to an element. It is recorded and fingerprinted but
    /// only run by [`rasterize_element_with_shader`](Self::rasterize_element_with_shader).
    pub fn set_shader(&mut self, element_id: &str, shader: Shader) {
        self.overrides.set_shader(element_id, shader);
        self.overrides_changed();
    }

    pub fn clear_shader(&mut self, element_id: &str) {
        self.overrides.clear_shader(element_id);
        self.overrides_changed();
    }

    /// Remove every override.
    pub fn clear_all_overrides(&mut self) {
        self.overrides.clear_all();
        self.overrides_changed();
    }

    fn overrides_changed(&mut self) {
        self.cache.get_mut().clear();
        self.notify(ChangeReason::OverridesChanged);
    }

    /// Overrides that currently apply to the element with `element_id`.
    pub fn resolve_element(&self, element_id: &str) -> Result<EffectiveStyle> {
        let doc = self.loaded()?;
        let el = doc
            .find_element_by_id(element_id)
            .ok_or_else(|| Error::ElementNotFound(element_id.to_string()))?;
        Ok(overrides::effective_style(doc, el, &self.overrides))
    }

    // ---------------------------------------------------------------------
    // Rasterization
    // ---------------------------------------------------------------------

    /// Rasterize the whole document at `size`.
    pub fn rasterize_full(&self, size: Size) -> Result<RgbaImage> {
        let doc = self.loaded()?;
        check_size(size)?;
        self.rasterize(doc, ContentId::Document, RenderTarget::Document, size)
    }

    /// Rasterize one symbol, framed by its `viewBox` (or bounding box).
    pub fn rasterize_symbol(&self, symbol_id: &str, size: Size) -> Result<RgbaImage> {
        let doc = self.loaded()?;
        check_size(size)?;
        let not_found = || Error::SymbolNotFound(symbol_id.to_string());
        if !self.symbols.contains_key(symbol_id) {
            return Err(not_found());
        }
        let el = doc
            .query_elements("symbol")
            .into_iter()
            .find(|&el| doc.id(el) == Some(symbol_id))
            .ok_or_else(not_found)?;

        self.rasterize(
            doc,
            ContentId::Symbol(symbol_id.to_string()),
            RenderTarget::Element(el),
            size,
        )
    }

    /// Rasterize one element, framed by its bounding box.
    pub fn rasterize_element(&self, element_id: &str, size: Size) -> Result<RgbaImage> {
        let doc = self.loaded()?;
        check_size(size)?;
        let el = self.find_element(doc, element_id)?;
        self.rasterize_element_at(doc, element_id, el, size)
    }

    /// Rasterize one element and run `shader` over the result.
    ///
    /// A missing or invalid shader is an error. A post-process failure, or
    /// the absence of a post-processor, is not: the unshaded image is
    /// returned and a warning is logged. Only the unshaded image is cached.
    pub fn rasterize_element_with_shader(
        &self,
        element_id: &str,
        size: Size,
        shader: Option<&Shader>,
    ) -> Result<RgbaImage> {
        let doc = self.loaded()?;
        check_size(size)?;
        let el = self.find_element(doc, element_id)?;

        let shader = shader.ok_or_else(|| Error::InvalidShader("no shader given".to_string()))?;
        let accepted = match &self.post_processor {
            Some(processor) => processor.validate(shader),
            None => shader.is_valid(),
        };
        if !accepted {
            return Err(Error::InvalidShader(shader.name.clone()));
        }

        let base = self.rasterize_element_at(doc, element_id, el, size)?;

        let Some(processor) = &self.post_processor else {
            log::warn!(
                "No post-processor configured, returning '{}' without shader '{}'",
                element_id,
                shader.name
            );
            return Ok(base);
        };

        match processor.apply(&base, shader, size) {
            Ok(shaded) => Ok(shaded),
            Err(e) => {
                log::warn!(
                    "Shader '{}' failed on '{}', returning unshaded image: {}",
                    shader.name,
                    element_id,
                    e
                );
                Ok(base)
            }
        }
    }

    fn rasterize_element_at(
        &self,
        doc: &Document,
        element_id: &str,
        el: ElementId,
        size: Size,
    ) -> Result<RgbaImage> {
        self.rasterize(
            doc,
            ContentId::Element(element_id.to_string()),
            RenderTarget::Element(el),
            size,
        )
    }

    fn rasterize(
        &self,
        doc: &Document,
        content: ContentId,
        target: RenderTarget,
        requested: Size,
    ) -> Result<RgbaImage> {
        let actual = cache::compute_render_size(requested, &self.lod);
        let key = build_key(&content, actual, &self.overrides.fingerprint());

        let cached = self.cache.lock().lookup(&key, actual);
        let image = match cached {
            Some(image) => image,
            None => {
                let image = Arc::new(self.render_fresh(doc, target, actual)?);
                self.cache.lock().store(key, actual, Arc::clone(&image));
                image
            }
        };

        if actual == requested {
            return Ok(Arc::try_unwrap(image).unwrap_or_else(|shared| (*shared).clone()));
        }
        let (width, height) = requested
            .to_unsigned()
            .ok_or(Error::InvalidSize {
                width: requested.width,
                height: requested.height,
            })?;
        log::debug!("Rescaling {} from {} to {}", content, actual, requested);
        Ok(render::rescale(&image, width, height))
    }

    fn render_fresh(&self, doc: &Document, target: RenderTarget, size: Size) -> Result<RgbaImage> {
        let (width, height) = size.to_unsigned().ok_or(Error::InvalidSize {
            width: size.width,
            height: size.height,
        })?;

        let mut scratch = doc.clone();
        let resolution = match target {
            RenderTarget::Document => {
                let root = scratch.root();
                overrides::resolve_subtree(&mut scratch, root, &self.overrides)
            }
            RenderTarget::Element(el) => {
                let mut resolution = overrides::resolve_subtree(&mut scratch, el, &self.overrides);
                for def in scratch.definition_roots(el) {
                    let extra = overrides::resolve_subtree(&mut scratch, def, &self.overrides);
                    resolution.shaders.extend(extra.shaders);
                }
                resolution
            }
        };
        if !resolution.shaders.is_empty() {
            log::debug!(
                "{} shader override(s) recorded; they run only through shader rasterization",
                resolution.shaders.len()
            );
        }

        let bitmap = self
            .backend
            .render(&scratch, target, width, height, self.background)?;
        if bitmap.width != width || bitmap.height != height {
            return Err(Error::Render(format!(
                "backend returned {}x{} for a {} request",
                bitmap.width, bitmap.height, size
            )));
        }
        render::to_straight_rgba(&bitmap)
    }

    fn loaded(&self) -> Result<&Document> {
        self.document.as_ref().ok_or(Error::DocumentNotLoaded)
    }

    fn find_element(&self, doc: &Document, element_id: &str) -> Result<ElementId> {
        doc.find_element_by_id(element_id)
            .ok_or_else(|| Error::ElementNotFound(element_id.to_string()))
    }

    // ---------------------------------------------------------------------
    // Cache controls
    // ---------------------------------------------------------------------

    /// Drop every cached image.
    pub fn clear_cache(&self) {
        self.cache.lock().clear();
        self.notify(ChangeReason::CacheCleared);
    }

    /// Number of cached images.
    pub fn cache_size(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().stats()
    }

    /// Enable or disable caching. Disabling drops every cached image.
    pub fn set_cache_enabled(&mut self, enabled: bool) {
        let cache = self.cache.get_mut();
        if cache.is_enabled() == enabled {
            return;
        }
        cache.set_enabled(enabled);
        self.notify(ChangeReason::CacheConfigChanged);
    }

    pub fn is_cache_enabled(&self) -> bool {
        self.cache.lock().is_enabled()
    }

    // ---------------------------------------------------------------------
    // LOD controls
    // ---------------------------------------------------------------------

    /// Enable or disable LOD sizing. Any change drops the cache.
    pub fn set_lod_enabled(&mut self, enabled: bool) {
        if self.lod.enabled == enabled {
            return;
        }
        self.lod.enabled = enabled;
        self.cache.get_mut().clear();
        self.notify(ChangeReason::LodChanged);
    }

    pub fn is_lod_enabled(&self) -> bool {
        self.lod.enabled
    }

    /// Set the LOD bias (clamped to `0.1..=4.0`).
    pub fn set_lod_bias(&mut self, bias: f32) {
        let previous = self.lod.bias();
        let current = self.lod.set_bias(bias);
        if current != previous && self.lod.enabled {
            self.cache.get_mut().clear();
            self.notify(ChangeReason::LodChanged);
        }
    }

    pub fn lod_bias(&self) -> f32 {
        self.lod.bias()
    }

    /// The size a request for `requested` would actually be rendered at.
    pub fn compute_render_size(&self, requested: Size) -> Size {
        cache::compute_render_size(requested, &self.lod)
    }

    // ---------------------------------------------------------------------
    // Notifications
    // ---------------------------------------------------------------------

    /// Receive a [`ContentChanged`] after every load, override mutation and
    /// cache or LOD configuration change.
    pub fn subscribe(&self) -> Receiver<ContentChanged> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    fn notify(&self, reason: ChangeReason) {
        let event = ContentChanged {
            reason,
            at: Utc::now(),
        };
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl Default for SvgResource {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SvgResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvgResource")
            .field("loaded", &self.document.is_some())
            .field("symbols", &self.symbols.len())
            .field("overrides", &self.overrides.len())
            .field("cache", &self.cache.lock().len())
            .field("lod", &self.lod)
            .finish()
    }
}

fn check_size(size: Size) -> Result<()> {
    if size.is_positive() {
        Ok(())
    } else {
        Err(Error::InvalidSize {
            width: size.width,
            height: size.height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ICONS: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="32" height="32">
  <defs>
    <symbol id="icon" viewBox="0 0 10 10">
      <rect id="body" class="accent" width="10" height="10" fill="#000000"/>
    </symbol>
  </defs>
  <rect id="bg" width="32" height="32" fill="#ffffff"/>
</svg>"##;

    fn loaded() -> SvgResource {
        let mut resource = SvgResource::new();
        resource.load_from_str(ICONS).unwrap();
        resource
    }

    #[test]
    fn test_not_loaded() {
        let resource = SvgResource::new();
        assert!(matches!(
            resource.rasterize_full(Size::square(8)),
            Err(Error::DocumentNotLoaded)
        ));
        assert!(matches!(
            resource.resolve_element("body"),
            Err(Error::DocumentNotLoaded)
        ));
    }

    #[test]
    fn test_symbols_extracted() {
        let resource = loaded();
        assert_eq!(resource.symbol_ids(), vec!["icon"]);
        let icon = resource.symbol("icon").unwrap();
        assert_eq!(icon.view_box.as_deref(), Some("0 0 10 10"));
        assert!((icon.bounds.w - 10.0).abs() < 0.01);
    }

    #[test]
    fn test_parse_failure_keeps_state() {
        let mut resource = loaded();
        resource.rasterize_full(Size::square(8)).unwrap();
        assert_eq!(resource.cache_size(), 1);

        assert!(matches!(resource.load_from_str("<svg"), Err(Error::Parse(_))));
        assert!(matches!(resource.load_from_str(""), Err(Error::Parse(_))));
        assert!(matches!(resource.load_from_bytes(b""), Err(Error::Parse(_))));
        assert!(resource.has_symbol("icon"));
        assert_eq!(resource.cache_size(), 1);
        assert_eq!(resource.source(), ICONS);
    }

    #[test]
    fn test_override_changes_pixels() {
        let mut resource = loaded();
        let before = resource.rasterize_symbol("icon", Size::square(8)).unwrap();
        assert_eq!(before.get_pixel(4, 4).0, [0, 0, 0, 255]);

        resource.set_fill_by_class("accent", Color::RED);
        let after = resource.rasterize_symbol("icon", Size::square(8)).unwrap();
        assert_eq!(after.get_pixel(4, 4).0, [255, 0, 0, 255]);

        let style = resource.resolve_element("body").unwrap();
        assert_eq!(style.fill, Some(Color::RED));
    }

    #[test]
    fn test_cache_toggle_and_notifications() {
        let mut resource = loaded();
        let events = resource.subscribe();

        resource.rasterize_full(Size::square(8)).unwrap();
        assert_eq!(resource.cache_size(), 1);

        resource.set_cache_enabled(false);
        assert_eq!(resource.cache_size(), 0);
        resource.rasterize_full(Size::square(8)).unwrap();
        assert_eq!(resource.cache_size(), 0);

        resource.set_cache_enabled(true);
        resource.set_lod_enabled(true);
        resource.set_stroke("body", Color::BLUE);
        resource.clear_cache();

        let reasons: Vec<_> = events.try_iter().map(|e| e.reason).collect();
        assert_eq!(
            reasons,
            vec![
                ChangeReason::CacheConfigChanged,
                ChangeReason::CacheConfigChanged,
                ChangeReason::LodChanged,
                ChangeReason::OverridesChanged,
                ChangeReason::CacheCleared,
            ]
        );
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let mut resource = loaded();
        drop(resource.subscribe());
        let live = resource.subscribe();
        resource.clear_all_overrides();

        assert_eq!(resource.subscribers.lock().len(), 1);
        assert_eq!(live.try_recv().unwrap().reason, ChangeReason::OverridesChanged);
    }

    #[test]
    fn test_lod_bias_is_clamped() {
        let mut resource = SvgResource::new();
        resource.set_lod_bias(10.0);
        assert_eq!(resource.lod_bias(), 4.0);
        resource.set_lod_bias(0.0);
        assert_eq!(resource.lod_bias(), 0.1);
    }
}
