use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::{DynamicImage, ImageOutputFormat};
use report_forge::assets::{AssetResolver, Fetch, Fetched, ImageAsset, StaticFetcher};
use report_forge::builder::DocumentBuilder;
use report_forge::config::{AssetConfig, EngineConfig};
use report_forge::model::{GridImage, ImageGrid};

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::new_rgb8(width, height)
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .unwrap();
    bytes
}

fn config() -> AssetConfig {
    AssetConfig {
        base_url: Some("http://api.local".to_owned()),
        ..AssetConfig::default()
    }
}

#[test]
fn failed_images_degrade_to_placeholders_in_place() {
    let fetcher = StaticFetcher::new()
        .with("http://api.local/uploads/1.png", png(40, 30))
        .with_failure("http://api.local/uploads/2.png", "HTTP 404")
        .with("http://api.local/uploads/3.png", png(30, 40))
        .with("http://api.local/uploads/4.png", b"not an image".to_vec())
        .with("http://api.local/uploads/5.png", png(10, 10));
    let mut resolver = AssetResolver::new(Arc::new(fetcher), &config());
    let urls: Vec<String> = (1..=5).map(|index| format!("/uploads/{}.png", index)).collect();
    let images = resolver.resolve_images(&urls);

    let ready: Vec<bool> = images.iter().map(ImageAsset::is_ready).collect();
    assert_eq!(ready, vec![true, false, true, false, true]);

    let grid = ImageGrid::new(
        images
            .into_iter()
            .enumerate()
            .map(|(index, image)| GridImage::new(image, format!("Foto {}", index + 1)))
            .collect(),
    )
    .with_placeholder_label("Foto yuklenemedi");
    let document = DocumentBuilder::new(&EngineConfig::default()).push(grid).layout().unwrap();
    assert_eq!(document.image_count(), 3);
    assert_eq!(document.count_text("Foto yuklenemedi"), 2);
    assert_eq!(document.count_text("Foto 5"), 1);
}

struct CountingFetcher {
    calls: AtomicUsize,
    bytes: Vec<u8>,
}

impl Fetch for CountingFetcher {
    fn fetch(&self, _url: &str) -> Result<Fetched, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Fetched {
            bytes: self.bytes.clone(),
            content_type: None,
        })
    }
}

#[test]
fn each_url_is_fetched_once_per_build() {
    let fetcher = Arc::new(CountingFetcher {
        calls: AtomicUsize::new(0),
        bytes: png(8, 8),
    });
    let mut resolver = AssetResolver::new(fetcher.clone(), &config());
    let first = resolver.resolve_images(&["/a.png", "/b.png", "/a.png"]);
    let second = resolver.resolve_images(&["http://api.local/a.png"]);
    assert!(first.iter().chain(second.iter()).all(ImageAsset::is_ready));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);

    let mut fresh = AssetResolver::new(fetcher.clone(), &config());
    fresh.resolve_images(&["/a.png"]);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
}

#[test]
fn unreachable_fonts_fall_back_to_the_builtin_family() {
    let config = AssetConfig {
        font_regular_url: Some("http://fonts.local/Roboto-Regular.ttf".to_owned()),
        font_bold_url: Some("http://fonts.local/Roboto-Bold.ttf".to_owned()),
        ..AssetConfig::default()
    };
    let fetcher = StaticFetcher::new().with("http://fonts.local/Roboto-Regular.ttf", b"garbage".to_vec());
    let mut resolver = AssetResolver::new(Arc::new(fetcher), &config);
    let fonts = resolver.resolve_fonts();
    assert!(!fonts.is_unicode());
    assert_eq!(fonts.prepare("Çiğ köfte"), "Cig kofte");
}
