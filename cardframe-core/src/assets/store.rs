use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

use anyhow::Context;

use crate::{
    assets::decode as assets_decode,
    assets::palette::Swatch,
    foundation::core::Size,
    foundation::error::{CardError, CardResult},
    foundation::math::Fnv1a64,
};

#[derive(Clone, Debug)]
/// Prepared raster image in premultiplied RGBA8 form.
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Intrinsic size.
    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }
}

#[derive(Clone, Debug)]
/// Prepared SVG asset: parsed `usvg` tree plus its normalized palette.
pub struct PreparedSvg {
    /// Parsed SVG tree.
    pub tree: Arc<usvg::Tree>,
    /// Solid paints found in the tree, in document order.
    pub swatches: Arc<Vec<Swatch>>,
}

impl PreparedSvg {
    /// Intrinsic (viewport) size.
    pub fn size(&self) -> Size {
        let s = self.tree.size();
        Size::new(f64::from(s.width()), f64::from(s.height()))
    }
}

#[derive(Clone, Debug)]
/// Union of template asset kinds.
pub enum PreparedAsset {
    /// Raster image.
    Image(PreparedImage),
    /// Vector artwork.
    Svg(PreparedSvg),
}

impl PreparedAsset {
    /// Intrinsic size of the asset.
    pub fn size(&self) -> Size {
        match self {
            Self::Image(i) => i.size(),
            Self::Svg(s) => s.size(),
        }
    }

    /// Vector palette, empty for raster assets.
    pub fn swatches(&self) -> &[Swatch] {
        match self {
            Self::Image(_) => &[],
            Self::Svg(s) => s.swatches.as_slice(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// How asset bytes should be interpreted.
pub enum AssetKind {
    /// Encoded raster (PNG, JPEG, ...).
    Image,
    /// SVG document.
    Svg,
}

impl AssetKind {
    fn tag(self) -> u8 {
        match self {
            Self::Image => b'I',
            Self::Svg => b'S',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Stable hashed identifier of a cached asset.
pub struct AssetId(u64);

impl AssetId {
    /// Derive the id for a source-qualified key (see [`AssetSource::cache_key`]) read as `kind`.
    pub fn for_key(kind: AssetKind, key: &str) -> Self {
        let mut hasher = Fnv1a64::new_default();
        hasher.write_u8(kind.tag());
        hasher.write_bytes(key.as_bytes());
        Self(hasher.finish())
    }

    /// Id of `source` as served by `assets`.
    pub fn for_source(
        assets: &dyn AssetSource,
        kind: AssetKind,
        source: &str,
    ) -> CardResult<Self> {
        Ok(Self::for_key(kind, &assets.cache_key(source)?))
    }

    /// Access raw 64-bit identifier.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Where template asset bytes come from.
pub trait AssetSource: Send + Sync {
    /// Read the raw bytes for `source`.
    fn read(&self, source: &str) -> CardResult<Vec<u8>>;

    /// Key identifying the bytes `source` resolves to in this source.
    ///
    /// Two sources serving different bytes under the same relative name must return different
    /// keys, so one [`AssetCache`] can be shared between them.
    fn cache_key(&self, source: &str) -> CardResult<String>;

    /// Directory used to resolve resources referenced from inside an SVG.
    fn resources_dir(&self, _source: &str) -> Option<PathBuf> {
        None
    }
}

/// Reads assets relative to a filesystem root.
#[derive(Clone, Debug)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    /// Resolve sources under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory used when resolving relative asset paths.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for FsSource {
    fn read(&self, source: &str) -> CardResult<Vec<u8>> {
        let path = self.root.join(normalize_rel_path(source)?);
        std::fs::read(&path)
            .with_context(|| format!("read asset bytes from '{}'", path.display()))
            .map_err(CardError::from)
    }

    fn cache_key(&self, source: &str) -> CardResult<String> {
        let path = self.root.join(normalize_rel_path(source)?);
        Ok(format!("fs:{}", path.display()))
    }

    fn resources_dir(&self, source: &str) -> Option<PathBuf> {
        let rel = normalize_rel_path(source).ok()?;
        self.root.join(rel).parent().map(Path::to_path_buf)
    }
}

static NEXT_MEMORY_SOURCE: AtomicU64 = AtomicU64::new(1);

fn next_memory_source_id() -> u64 {
    NEXT_MEMORY_SOURCE.fetch_add(1, Ordering::Relaxed)
}

/// In-memory asset table keyed by normalized relative path.
///
/// Every table, clones included, has its own cache identity.
#[derive(Debug)]
pub struct MemorySource {
    id: u64,
    files: HashMap<String, Arc<Vec<u8>>>,
}

impl Default for MemorySource {
    fn default() -> Self {
        Self {
            id: next_memory_source_id(),
            files: HashMap::new(),
        }
    }
}

impl Clone for MemorySource {
    fn clone(&self) -> Self {
        Self {
            id: next_memory_source_id(),
            files: self.files.clone(),
        }
    }
}

impl MemorySource {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bytes` under `source`.
    pub fn insert(&mut self, source: &str, bytes: impl Into<Vec<u8>>) -> CardResult<()> {
        self.files
            .insert(normalize_rel_path(source)?, Arc::new(bytes.into()));
        Ok(())
    }

    /// Builder-style [`MemorySource::insert`].
    pub fn with(mut self, source: &str, bytes: impl Into<Vec<u8>>) -> CardResult<Self> {
        self.insert(source, bytes)?;
        Ok(self)
    }
}

impl AssetSource for MemorySource {
    fn read(&self, source: &str) -> CardResult<Vec<u8>> {
        let key = normalize_rel_path(source)?;
        self.files
            .get(&key)
            .map(|b| b.as_ref().clone())
            .ok_or_else(|| CardError::asset(format!("unknown asset '{key}'")))
    }

    fn cache_key(&self, source: &str) -> CardResult<String> {
        Ok(format!("mem:{}:{}", self.id, normalize_rel_path(source)?))
    }
}

/// Process-wide memo of parsed template assets.
///
/// Entries are keyed by kind plus the source's [`AssetSource::cache_key`], so each asset is
/// decoded at most once per successful load even when several sources share the cache. Failed
/// loads are not cached so a corrected file can be retried.
#[derive(Debug, Default)]
pub struct AssetCache {
    entries: Mutex<HashMap<AssetId, PreparedAsset>>,
}

impl AssetCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached assets.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Whether `source` from `assets` has already been parsed as `kind`.
    pub fn contains(&self, assets: &dyn AssetSource, kind: AssetKind, source: &str) -> bool {
        AssetId::for_source(assets, kind, source).is_ok_and(|id| self.lock().contains_key(&id))
    }

    /// Drop every cached asset.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Return the cached asset for `source`, parsing and caching it on first use.
    pub fn load(
        &self,
        assets: &dyn AssetSource,
        kind: AssetKind,
        source: &str,
    ) -> CardResult<PreparedAsset> {
        let id = AssetId::for_source(assets, kind, source)?;
        if let Some(hit) = self.lock().get(&id) {
            tracing::trace!(source, ?kind, "asset cache hit");
            return Ok(hit.clone());
        }

        tracing::debug!(source, ?kind, "asset cache miss");
        let bytes = assets.read(source)?;
        let prepared = match kind {
            AssetKind::Image => PreparedAsset::Image(assets_decode::decode_image(&bytes)?),
            AssetKind::Svg => PreparedAsset::Svg(assets_decode::parse_svg_in(
                &bytes,
                assets.resources_dir(source),
            )?),
        };

        // A concurrent loader may have won the race; keep the first entry.
        let mut entries = self.lock();
        Ok(entries.entry(id).or_insert(prepared).clone())
    }

    /// Load two optional assets concurrently.
    pub fn load_pair(
        &self,
        assets: &dyn AssetSource,
        a: Option<(AssetKind, &str)>,
        b: Option<(AssetKind, &str)>,
    ) -> CardResult<(Option<PreparedAsset>, Option<PreparedAsset>)> {
        let load_opt = |req: Option<(AssetKind, &str)>| {
            req.map(|(kind, source)| self.load(assets, kind, source))
                .transpose()
        };
        let (a, b) = rayon::join(|| load_opt(a), || load_opt(b));
        Ok((a?, b?))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<AssetId, PreparedAsset>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Normalize and validate template-relative asset paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> CardResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(CardError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(CardError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(CardError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(CardError::validation("asset path must contain a file name"));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
