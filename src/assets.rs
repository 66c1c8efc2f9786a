//! Remote asset resolution with per-asset failure isolation.
//!
//! An [`AssetResolver`] lives for exactly one document build. It joins relative
//! URLs onto the configured base, fetches through a [`Fetch`] implementation,
//! memoises every outcome by absolute URL and never turns a failed download
//! into an error: callers receive [`AssetState::Failed`] and draw a placeholder.

use std::collections::HashMap;
use std::fmt;
use std::io::Cursor;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{DynamicImage, GenericImageView, ImageOutputFormat, RgbImage};
use log::{debug, warn};
use rayon::prelude::*;

use crate::config::AssetConfig;
use crate::fonts::FontSet;

/// Raw bytes returned by a [`Fetch`] implementation.
#[derive(Clone, Debug, Default)]
pub struct Fetched {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Source of asset bytes. Implementations must be callable from several threads.
pub trait Fetch: Send + Sync {
    /// Retrieves `url`, which is always absolute.
    fn fetch(&self, url: &str) -> Result<Fetched, String>;
}

/// HTTP GET through a shared `ureq` agent with a per-request timeout.
#[cfg(feature = "http")]
pub struct HttpFetcher {
    agent: ureq::Agent,
    max_bytes: u64,
}

#[cfg(feature = "http")]
impl HttpFetcher {
    pub fn new(config: &AssetConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout()).build();
        Self {
            agent,
            max_bytes: config.max_bytes,
        }
    }
}

#[cfg(feature = "http")]
impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Fetched, String> {
        use std::io::Read;

        let response = self.agent.get(url).call().map_err(|err| err.to_string())?;
        let content_type = response.header("Content-Type").map(str::to_owned);
        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(self.max_bytes + 1)
            .read_to_end(&mut bytes)
            .map_err(|err| format!("reading response body failed: {}", err))?;
        if bytes.len() as u64 > self.max_bytes {
            return Err(format!("response exceeds {} bytes", self.max_bytes));
        }
        Ok(Fetched {
            bytes,
            content_type,
        })
    }
}

/// In-memory fetcher keyed by absolute URL; unknown URLs fail with a 404-like reason.
#[derive(Clone, Debug, Default)]
pub struct StaticFetcher {
    entries: HashMap<String, Result<Vec<u8>, String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.entries.insert(url.into(), Ok(bytes.into()));
        self
    }

    pub fn with_failure(mut self, url: impl Into<String>, reason: impl Into<String>) -> Self {
        self.entries.insert(url.into(), Err(reason.into()));
        self
    }
}

impl Fetch for StaticFetcher {
    fn fetch(&self, url: &str) -> Result<Fetched, String> {
        match self.entries.get(url) {
            Some(Ok(bytes)) => Ok(Fetched {
                bytes: bytes.clone(),
                content_type: None,
            }),
            Some(Err(reason)) => Err(reason.clone()),
            None => Err(format!("no asset registered for {}", url)),
        }
    }
}

/// Successfully fetched bytes with their sniffed media type.
#[derive(Clone, PartialEq, Eq)]
pub struct AssetBytes {
    bytes: Arc<Vec<u8>>,
    mime: String,
}

impl AssetBytes {
    fn new(bytes: Vec<u8>, content_type: Option<&str>) -> Self {
        let mime = sniff_mime(&bytes, content_type);
        Self {
            bytes: Arc::new(bytes),
            mime,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// `data:<mime>;base64,<payload>` suitable for HTML or SVG embedding.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(self.bytes.as_slice()))
    }
}

impl fmt::Debug for AssetBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetBytes")
            .field("len", &self.bytes.len())
            .field("mime", &self.mime)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetState {
    Pending,
    Resolved(AssetBytes),
    Failed(String),
}

/// A remote reference and what became of it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Asset {
    url: String,
    state: AssetState,
}

impl Asset {
    pub fn pending(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            state: AssetState::Pending,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> &AssetState {
        &self.state
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.state, AssetState::Resolved(_))
    }

    pub fn bytes(&self) -> Option<&AssetBytes> {
        match &self.state {
            AssetState::Resolved(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match &self.state {
            AssetState::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

/// A decoded raster ready for placement, alpha already flattened onto white.
#[derive(Clone)]
pub struct EmbeddedImage {
    image: DynamicImage,
}

impl EmbeddedImage {
    /// Decodes PNG, JPEG, GIF, BMP or WebP bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, String> {
        let decoded =
            image::load_from_memory(bytes).map_err(|err| format!("image decode failed: {}", err))?;
        Ok(Self::from_dynamic(&decoded))
    }

    pub fn from_dynamic(image: &DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut flat = RgbImage::new(width, height);
        for (x, y, pixel) in rgba.enumerate_pixels() {
            let alpha = u32::from(pixel[3]);
            let blend = |channel: u8| ((u32::from(channel) * alpha + 255 * (255 - alpha)) / 255) as u8;
            flat.put_pixel(x, y, image::Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
        }
        Self {
            image: DynamicImage::ImageRgb8(flat),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn aspect_ratio(&self) -> f64 {
        let (width, height) = self.dimensions();
        if height == 0 {
            1.0
        } else {
            f64::from(width) / f64::from(height)
        }
    }

    pub(crate) fn dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// PNG scaled down to fit `max_width` x `max_height`, with its final size.
    pub fn thumbnail_png(&self, max_width: u32, max_height: u32) -> Result<(Vec<u8>, u32, u32), String> {
        let thumbnail = self.image.thumbnail(max_width, max_height);
        let mut png = Vec::new();
        thumbnail
            .write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)
            .map_err(|err| format!("thumbnail encoding failed: {}", err))?;
        let (width, height) = thumbnail.dimensions();
        Ok((png, width, height))
    }
}

impl fmt::Debug for EmbeddedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (width, height) = self.dimensions();
        write!(f, "EmbeddedImage({}x{})", width, height)
    }
}

/// An image reference after resolution and decoding.
#[derive(Clone, Debug)]
pub enum ImageAsset {
    Ready(Arc<EmbeddedImage>),
    Unavailable { url: String, reason: String },
}

impl ImageAsset {
    pub fn is_ready(&self) -> bool {
        matches!(self, ImageAsset::Ready(_))
    }
}

/// Per-build resolver with a memo cache keyed by absolute URL.
pub struct AssetResolver {
    fetcher: Arc<dyn Fetch>,
    base_url: Option<String>,
    font_urls: (Option<String>, Option<String>),
    cache: HashMap<String, AssetState>,
}

impl AssetResolver {
    pub fn new(fetcher: Arc<dyn Fetch>, config: &AssetConfig) -> Self {
        Self {
            fetcher,
            base_url: config.base_url.clone(),
            font_urls: (config.font_regular_url.clone(), config.font_bold_url.clone()),
            cache: HashMap::new(),
        }
    }

    /// Resolver backed by [`HttpFetcher`].
    #[cfg(feature = "http")]
    pub fn http(config: &AssetConfig) -> Self {
        Self::new(Arc::new(HttpFetcher::new(config)), config)
    }

    /// Joins relative references onto the configured base URL.
    pub fn absolute_url(&self, url: &str) -> String {
        let url = url.trim();
        let is_absolute =
            url.starts_with("http://") || url.starts_with("https://") || url.starts_with("data:");
        match (&self.base_url, is_absolute) {
            (Some(base), false) => {
                format!("{}/{}", base.trim_end_matches('/'), url.trim_start_matches('/'))
            }
            _ => url.to_owned(),
        }
    }

    /// Resolves one reference, reusing an earlier outcome for the same URL.
    pub fn resolve(&mut self, url: &str) -> Asset {
        self.resolve_all(&[url]).pop().unwrap_or_else(|| Asset::pending(url))
    }

    /// Resolves a batch concurrently; results keep the input order.
    ///
    /// Each fetch is isolated: an error or even a panic in one fetch becomes
    /// that asset's [`AssetState::Failed`] without touching its siblings.
    pub fn resolve_all<S: AsRef<str>>(&mut self, urls: &[S]) -> Vec<Asset> {
        let absolute: Vec<String> = urls.iter().map(|url| self.absolute_url(url.as_ref())).collect();

        let mut missing: Vec<&String> = absolute
            .iter()
            .filter(|url| !self.cache.contains_key(url.as_str()))
            .collect();
        missing.sort();
        missing.dedup();

        let fetcher = self.fetcher.as_ref();
        let outcomes: Vec<(String, AssetState)> = missing
            .par_iter()
            .map(|url| ((*url).clone(), fetch_isolated(fetcher, url)))
            .collect();

        for (url, state) in outcomes {
            if let AssetState::Failed(reason) = &state {
                warn!("Asset {} unavailable: {}", url, reason);
            } else {
                debug!("Asset {} resolved", url);
            }
            self.cache.insert(url, state);
        }

        absolute
            .into_iter()
            .map(|url| {
                let state = self
                    .cache
                    .get(&url)
                    .cloned()
                    .unwrap_or(AssetState::Pending);
                Asset { url, state }
            })
            .collect()
    }

    /// Resolves and decodes images so their dimensions are known before layout.
    pub fn resolve_images<S: AsRef<str>>(&mut self, urls: &[S]) -> Vec<ImageAsset> {
        let assets = self.resolve_all(urls);
        let decoded: Vec<ImageAsset> = assets
            .par_iter()
            .map(|asset| match asset.state() {
                AssetState::Resolved(bytes) => match EmbeddedImage::decode(bytes.bytes()) {
                    Ok(image) => ImageAsset::Ready(Arc::new(image)),
                    Err(reason) => ImageAsset::Unavailable {
                        url: asset.url().to_owned(),
                        reason,
                    },
                },
                AssetState::Failed(reason) => ImageAsset::Unavailable {
                    url: asset.url().to_owned(),
                    reason: reason.clone(),
                },
                AssetState::Pending => ImageAsset::Unavailable {
                    url: asset.url().to_owned(),
                    reason: "asset was never resolved".to_owned(),
                },
            })
            .collect();
        for image in &decoded {
            if let ImageAsset::Unavailable { url, reason } = image {
                warn!("Image {} will render as a placeholder: {}", url, reason);
            }
        }
        decoded
    }

    /// Fetches `urls` and the configured font pair in one concurrent batch,
    /// then decodes the images. The fonts stay cached for [`Self::resolve_fonts`].
    pub fn resolve_images_and_fonts<S: AsRef<str>>(&mut self, urls: &[S]) -> Vec<ImageAsset> {
        let mut batch: Vec<String> = urls.iter().map(|url| url.as_ref().to_owned()).collect();
        if let (Some(regular), Some(bold)) = &self.font_urls {
            batch.push(regular.clone());
            batch.push(bold.clone());
        }
        self.resolve_all(&batch);
        self.resolve_images(urls)
    }

    /// Resolves the configured TrueType pair, falling back to the built-in family.
    ///
    /// Without configured font URLs the local font directory is consulted.
    pub fn resolve_fonts(&mut self) -> FontSet {
        let (Some(regular_url), Some(bold_url)) = self.font_urls.clone() else {
            return FontSet::from_env_or_builtin();
        };
        let assets = self.resolve_all(&[regular_url, bold_url]);
        match (assets[0].bytes(), assets[1].bytes()) {
            (Some(regular), Some(bold)) => {
                match FontSet::embedded(regular.bytes().to_vec(), bold.bytes().to_vec()) {
                    Ok(fonts) => fonts,
                    Err(err) => {
                        warn!("Font assets could not be parsed ({}); falling back to built-in Helvetica.", err);
                        FontSet::Builtin
                    }
                }
            }
            _ => {
                let reason = assets
                    .iter()
                    .filter_map(|asset| asset.failure().map(|reason| format!("{}: {}", asset.url(), reason)))
                    .collect::<Vec<_>>()
                    .join("; ");
                warn!("Font assets unavailable ({}); falling back to built-in Helvetica.", reason);
                FontSet::Builtin
            }
        }
    }
}

fn fetch_isolated(fetcher: &dyn Fetch, url: &str) -> AssetState {
    if let Some(payload) = url.strip_prefix("data:") {
        return decode_data_uri(payload);
    }
    match panic::catch_unwind(AssertUnwindSafe(|| fetcher.fetch(url))) {
        Ok(Ok(fetched)) if fetched.bytes.is_empty() => AssetState::Failed("empty response".to_owned()),
        Ok(Ok(fetched)) => {
            AssetState::Resolved(AssetBytes::new(fetched.bytes, fetched.content_type.as_deref()))
        }
        Ok(Err(reason)) => AssetState::Failed(reason),
        Err(_) => AssetState::Failed("fetcher panicked".to_owned()),
    }
}

fn decode_data_uri(payload: &str) -> AssetState {
    let Some((header, data)) = payload.split_once(',') else {
        return AssetState::Failed("malformed data URI".to_owned());
    };
    let Some(mime) = header.strip_suffix(";base64") else {
        return AssetState::Failed("only base64 data URIs are supported".to_owned());
    };
    match STANDARD.decode(data.trim()) {
        Ok(bytes) if !bytes.is_empty() => {
            let declared = if mime.is_empty() { None } else { Some(mime) };
            AssetState::Resolved(AssetBytes::new(bytes, declared))
        }
        Ok(_) => AssetState::Failed("empty data URI".to_owned()),
        Err(err) => AssetState::Failed(format!("invalid base64 payload: {}", err)),
    }
}

fn sniff_mime(bytes: &[u8], content_type: Option<&str>) -> String {
    let sniffed = if bytes.starts_with(b"\x89PNG") {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF8") {
        Some("image/gif")
    } else if bytes.len() > 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else if bytes.starts_with(&[0x00, 0x01, 0x00, 0x00]) || bytes.starts_with(b"true") {
        Some("font/ttf")
    } else if bytes.starts_with(b"OTTO") {
        Some("font/otf")
    } else {
        None
    };
    sniffed
        .map(str::to_owned)
        .or_else(|| {
            content_type
                .and_then(|value| value.split(';').next())
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        })
        .unwrap_or_else(|| "application/octet-stream".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFetcher {
        calls: AtomicUsize,
    }

    impl Fetch for CountingFetcher {
        fn fetch(&self, url: &str) -> Result<Fetched, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if url.ends_with("boom") {
                panic!("simulated fetcher bug");
            }
            Ok(Fetched {
                bytes: url.as_bytes().to_vec(),
                content_type: Some("text/plain; charset=utf-8".to_owned()),
            })
        }
    }

    fn config(base: Option<&str>) -> AssetConfig {
        AssetConfig {
            base_url: base.map(str::to_owned),
            ..AssetConfig::default()
        }
    }

    #[test]
    fn relative_urls_join_the_base() {
        let resolver = AssetResolver::new(Arc::new(StaticFetcher::new()), &config(Some("http://api.local/")));
        assert_eq!(resolver.absolute_url("/uploads/a.png"), "http://api.local/uploads/a.png");
        assert_eq!(resolver.absolute_url("https://cdn.example/a.png"), "https://cdn.example/a.png");
    }

    #[test]
    fn duplicate_urls_are_fetched_once() {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
        });
        let mut resolver = AssetResolver::new(fetcher.clone(), &config(None));
        let assets = resolver.resolve_all(&["http://a/x", "http://a/x", "http://a/y"]);
        assert_eq!(assets.len(), 3);
        assert!(assets.iter().all(Asset::is_resolved));
        resolver.resolve("http://a/y");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert_eq!(assets[0].bytes().unwrap().mime(), "text/plain");
    }

    #[test]
    fn panicking_fetch_only_fails_its_own_asset() {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
        });
        let mut resolver = AssetResolver::new(fetcher, &config(None));
        let assets = resolver.resolve_all(&["http://a/ok", "http://a/boom"]);
        assert!(assets[0].is_resolved());
        assert_eq!(assets[1].failure(), Some("fetcher panicked"));
    }

    #[test]
    fn data_uris_round_trip() {
        let mut resolver = AssetResolver::new(Arc::new(StaticFetcher::new()), &config(None));
        let asset = resolver.resolve("data:image/png;base64,iVBORw0KGgo=");
        let bytes = asset.bytes().unwrap();
        assert_eq!(bytes.mime(), "image/png");
        assert_eq!(bytes.data_uri(), "data:image/png;base64,iVBORw0KGgo=");
        assert!(resolver.resolve("data:text/plain,hello").failure().is_some());
    }

    #[test]
    fn undecodable_images_become_unavailable() {
        let fetcher = StaticFetcher::new().with("http://a/not-an-image.png", b"plain text".to_vec());
        let mut resolver = AssetResolver::new(Arc::new(fetcher), &config(None));
        let images = resolver.resolve_images(&["http://a/not-an-image.png", "http://a/missing.png"]);
        assert!(images.iter().all(|image| !image.is_ready()));
    }

    #[test]
    fn missing_fonts_fall_back_to_builtin() {
        let config = AssetConfig {
            font_regular_url: Some("http://fonts/regular.ttf".to_owned()),
            font_bold_url: Some("http://fonts/bold.ttf".to_owned()),
            ..AssetConfig::default()
        };
        let mut resolver = AssetResolver::new(Arc::new(StaticFetcher::new()), &config);
        assert!(!resolver.resolve_fonts().is_unicode());
    }

    #[test]
    fn images_and_fonts_share_one_batch() {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
        });
        let config = AssetConfig {
            font_regular_url: Some("http://fonts/regular.ttf".to_owned()),
            font_bold_url: Some("http://fonts/bold.ttf".to_owned()),
            ..AssetConfig::default()
        };
        let mut resolver = AssetResolver::new(fetcher.clone(), &config);
        let images = resolver.resolve_images_and_fonts(&["http://a/1.png", "http://a/2.png"]);
        assert_eq!(images.len(), 2);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 4);
        assert!(!resolver.resolve_fonts().is_unicode());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn flattening_removes_transparency() {
        let mut rgba = image::RgbaImage::new(1, 1);
        rgba.put_pixel(0, 0, image::Rgba([0, 0, 0, 0]));
        let image = EmbeddedImage::from_dynamic(&DynamicImage::ImageRgba8(rgba));
        let flat = image.dynamic().to_rgb8();
        assert_eq!(flat.get_pixel(0, 0).0, [255, 255, 255]);
    }
}
