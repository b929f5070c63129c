use std::{
    io::Cursor,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use super::*;
use crate::assets::store::{MemorySource, PreparedImage};
use crate::scene::layer::LayerSource;
use crate::scene::mount::mount_photo;

const FRAME_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="855" height="540">
    <rect x="0" y="0" width="855" height="540" fill="none" stroke="#C0A040" stroke-width="20"/>
    <circle cx="40" cy="40" r="10" fill="rgba(255,255,255,0.5)"/>
</svg>"##;

const BG_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="171" height="108">
    <rect width="171" height="108" fill="#ffffff"/>
    <rect width="50" height="50" fill="#224466"/>
</svg>"##;

struct CountingSource {
    inner: MemorySource,
    reads: AtomicUsize,
}

impl AssetSource for CountingSource {
    fn read(&self, source: &str) -> CardResult<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read(source)
    }

    fn cache_key(&self, source: &str) -> CardResult<String> {
        self.inner.cache_key(source)
    }
}

fn png(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn assets() -> MemorySource {
    MemorySource::new()
        .with("frame.svg", FRAME_SVG)
        .unwrap()
        .with("bg.svg", BG_SVG)
        .unwrap()
        .with("paper.png", png(10, 5))
        .unwrap()
}

fn photo(w: u32, h: u32) -> PreparedImage {
    PreparedImage {
        width: w,
        height: h,
        rgba8_premul: Arc::new(vec![255; (w * h * 4) as usize]),
    }
}

fn canvas() -> CardCanvas {
    mount_photo(photo(100, 100), &CardSpec::default()).unwrap()
}

fn framed(layout: Layout) -> Template {
    Template {
        name: "framed".into(),
        overlay: Some(TemplateLayer {
            source: "frame.svg".into(),
            is_svg: None,
            layer_width: 855.0,
            layer_height: 540.0,
            art_window: Some(ArtWindow {
                x: 0.1,
                y: 0.2,
                width: 0.5,
                height: 0.6,
            }),
        }),
        background: Some(TemplateLayer {
            source: "bg.svg".into(),
            is_svg: None,
            layer_width: 855.0,
            layer_height: 540.0,
            art_window: None,
        }),
        shadow: Some("rgba(0,0,0,0.5) 3px 3px 6px".into()),
        layout,
    }
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn overlay_places_photo_in_art_window() {
    let mut canvases = vec![canvas()];
    let cache = AssetCache::new();
    let colors = apply_template(
        &mut canvases,
        &framed(Layout::Horizontal),
        &cache,
        &assets(),
    )
    .unwrap();
    assert_eq!(colors, vec!["#c0a040", "#ffffff", "#224466"]);

    let c = &canvases[0];
    assert_eq!((c.width, c.height), (855, 540));

    let overlay = c.overlay.as_ref().unwrap();
    assert!(matches!(overlay.source, LayerSource::Svg(_)));
    assert!(approx(overlay.scale_x, 1.0));
    assert_eq!(overlay.center, Point::new(427.5, 270.0));

    let main = c.main_image().unwrap();
    // min(855 * 0.5 / 100, 540 * 0.6 / 100)
    assert!(approx(main.scale_x, 3.24));
    assert!(approx(main.center.x, 855.0 * 0.35));
    assert!(approx(main.center.y, 270.0));

    let shadow = main.shadow.unwrap();
    assert!(shadow.non_scaling);
    assert_eq!((shadow.offset_x, shadow.blur), (3.0, 6.0));

    let bg = c.background.as_ref().unwrap();
    assert!(matches!(bg.source, LayerSource::Svg(_)));
    assert!(approx(bg.scale_x, 5.0));
    assert_eq!(c.clip_path.as_ref().unwrap().angle_deg, 0.0);
}

#[test]
fn vertical_layout_rotates_clip_and_resizes_every_canvas() {
    let mut canvases = vec![canvas(), canvas()];
    let template = Template {
        layout: Layout::Vertical,
        ..Template::default()
    };
    let colors = apply_template(&mut canvases, &template, &AssetCache::new(), &assets()).unwrap();
    assert!(colors.is_empty());

    for c in &canvases {
        assert_eq!((c.width, c.height), (540, 855));
        assert!(c.overlay.is_none());

        let clip = c.clip_path.as_ref().unwrap();
        assert_eq!(clip.angle_deg, 90.0);
        assert_eq!(clip.center, Point::new(270.0, 427.5));
        let bounds = clip.bounding_rect();
        assert!(approx(bounds.width(), 540.0) && approx(bounds.height(), 855.0));

        let bg = c.background.as_ref().unwrap();
        assert!(matches!(bg.source, LayerSource::Rect(_)));
        assert_eq!(bg.angle_deg, 90.0);
        assert_eq!(bg.center, clip.center);

        let main = c.main_image().unwrap();
        assert!(approx(main.scale_x, 8.55));
        assert_eq!(main.center, Point::new(270.0, 427.5));
        assert!(main.shadow.is_none());
    }
}

#[test]
fn switching_back_to_horizontal_restores_geometry() {
    let mut canvases = vec![canvas()];
    let cache = AssetCache::new();
    let src = assets();
    apply_template(&mut canvases, &framed(Layout::Vertical), &cache, &src).unwrap();
    assert_eq!((canvases[0].width, canvases[0].height), (540, 855));
    assert_eq!(
        canvases[0].overlay.as_ref().unwrap().center,
        Point::new(270.0, 427.5)
    );

    apply_template(&mut canvases, &Template::default(), &cache, &src).unwrap();
    let c = &canvases[0];
    assert_eq!((c.width, c.height), (855, 540));
    assert_eq!(c.clip_path.as_ref().unwrap().angle_deg, 0.0);
    assert!(c.overlay.is_none());
    assert!(approx(c.main_image().unwrap().scale_x, 8.55));
    assert_eq!(c.main_image().unwrap().center, Point::new(427.5, 270.0));
}

#[test]
fn raster_background_scales_to_cover_its_box() {
    let template = Template {
        background: Some(TemplateLayer {
            source: "paper.png".into(),
            is_svg: None,
            layer_width: 855.0,
            layer_height: 540.0,
            art_window: None,
        }),
        ..Template::default()
    };
    let mut canvases = vec![canvas()];
    let colors = apply_template(&mut canvases, &template, &AssetCache::new(), &assets()).unwrap();
    assert!(colors.is_empty());

    let bg = canvases[0].background.as_ref().unwrap();
    assert!(bg.is_image());
    assert!(approx(bg.scale_x, 108.0));
    assert_eq!(bg.center, Point::new(427.5, 270.0));
}

#[test]
fn assets_are_loaded_once_across_applications() {
    let src = CountingSource {
        inner: assets(),
        reads: AtomicUsize::new(0),
    };
    let cache = AssetCache::new();
    let template = framed(Layout::Horizontal);
    let mut first = vec![canvas()];
    let mut second = vec![canvas(), canvas()];
    apply_template(&mut first, &template, &cache, &src).unwrap();
    let colors = apply_template(&mut second, &template, &cache, &src).unwrap();
    assert_eq!(src.reads.load(Ordering::SeqCst), 2);
    assert_eq!(colors.len(), 3);
    assert_eq!(cache.len(), 2);
}

#[test]
fn shared_cache_reads_each_source_own_overlay() {
    let gold = assets();
    let plain = MemorySource::new()
        .with("frame.svg", BG_SVG)
        .unwrap()
        .with("bg.svg", BG_SVG)
        .unwrap();
    let cache = AssetCache::new();
    let template = framed(Layout::Horizontal);

    let gold_colors = apply_template(&mut [canvas()], &template, &cache, &gold).unwrap();
    let plain_colors = apply_template(&mut [canvas()], &template, &cache, &plain).unwrap();
    assert_eq!(gold_colors[0], "#c0a040");
    assert_eq!(plain_colors, vec!["#ffffff", "#224466"]);
}

#[test]
fn canvas_without_photo_is_rejected_untouched() {
    let mut empty = canvas();
    empty.objects.clear();
    let mut canvases = vec![canvas(), empty];
    let err = apply_template(
        &mut canvases,
        &framed(Layout::Vertical),
        &AssetCache::new(),
        &assets(),
    )
    .unwrap_err();
    assert!(matches!(err, CardError::Validation(_)));
    assert_eq!((canvases[0].width, canvases[0].height), (855, 540));
    assert!(canvases[0].overlay.is_none());
}

#[test]
fn missing_asset_propagates() {
    let mut template = framed(Layout::Horizontal);
    if let Some(o) = template.overlay.as_mut() {
        o.source = "nope.svg".into();
    }
    let mut canvases = vec![canvas()];
    let err = apply_template(&mut canvases, &template, &AssetCache::new(), &assets()).unwrap_err();
    assert!(matches!(err, CardError::Asset(_)));
}

#[test]
fn rotated_photo_is_fitted_with_swapped_sides() {
    let mut overlay = Layer::image(photo(200, 100));
    overlay.center = Point::new(100.0, 50.0);

    let mut main = Layer::image(photo(40, 10));
    main.angle_deg = 90.0;
    scale_image_to_overlay_area(ArtWindow::default(), &overlay, &mut main).unwrap();
    // Fitting 10x40 into 200x100.
    assert!(approx(main.scale_x, 2.5));
    assert_eq!(main.center, Point::new(100.0, 50.0));

    main.angle_deg = 180.0;
    scale_image_to_overlay_area(ArtWindow::default(), &overlay, &mut main).unwrap();
    // Fitting 40x10 into 200x100.
    assert!(approx(main.scale_x, 5.0));
}

#[test]
fn art_window_offsets_follow_scaled_overlay() {
    let mut overlay = Layer::image(photo(100, 50));
    overlay.set_scale(2.0);
    overlay.center = Point::new(300.0, 200.0);
    let window = ArtWindow {
        x: 0.5,
        y: 0.0,
        width: 0.5,
        height: 1.0,
    };
    let mut main = Layer::image(photo(10, 10));
    scale_image_to_overlay_area(window, &overlay, &mut main).unwrap();
    // Overlay spans x in [200, 400], y in [150, 250]; window is its right half.
    assert!(approx(main.scale_x, 10.0));
    assert!(approx(main.center.x, 350.0));
    assert!(approx(main.center.y, 200.0));
}
