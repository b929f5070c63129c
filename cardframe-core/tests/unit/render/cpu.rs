use std::sync::Arc;

use super::*;
use crate::assets::store::{AssetCache, MemorySource, PreparedImage};
use crate::foundation::core::{CardSpec, Layout};
use crate::scene::mount::mount_photo;
use crate::template::apply::apply_template;
use crate::template::model::{Template, TemplateLayer};

const CORNER_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20">
    <rect width="4" height="4" fill="#0000ff"/>
</svg>"##;

fn small_card() -> CardSpec {
    CardSpec {
        width: 40.0,
        height: 20.0,
        corner_radius: 4.0,
        ..CardSpec::default()
    }
}

fn red_photo() -> PreparedImage {
    PreparedImage {
        width: 4,
        height: 4,
        rgba8_premul: Arc::new([255u8, 0, 0, 255].repeat(16)),
    }
}

fn framed(shadow: Option<&str>) -> Template {
    Template {
        overlay: Some(TemplateLayer {
            source: "corner.svg".into(),
            is_svg: None,
            layer_width: 40.0,
            layer_height: 20.0,
            art_window: None,
        }),
        shadow: shadow.map(str::to_owned),
        ..Template::default()
    }
}

fn apply(canvas: &mut CardCanvas, template: &Template) {
    let src = MemorySource::new().with("corner.svg", CORNER_SVG).unwrap();
    apply_template(
        std::slice::from_mut(canvas),
        template,
        &AssetCache::new(),
        &src,
    )
    .unwrap();
}

fn near(a: [u8; 4], b: [u8; 4], tol: i16) -> bool {
    a.iter()
        .zip(b.iter())
        .all(|(x, y)| (i16::from(*x) - i16::from(*y)).abs() <= tol)
}

#[test]
fn mounted_photo_is_clipped_to_card_corners() {
    let canvas = mount_photo(red_photo(), &small_card()).unwrap();
    let frame = render_canvas(&canvas, &RenderSettings::default()).unwrap();
    assert_eq!((frame.width, frame.height), (40, 20));
    assert!(frame.premultiplied);

    assert_eq!(frame.pixel(20, 10), Some([255, 0, 0, 255]));
    assert!(frame.pixel(0, 0).unwrap()[3] < 16);
    assert!(frame.pixel(39, 19).unwrap()[3] < 16);
    assert!(frame.pixel(40, 0).is_none());
}

#[test]
fn overlay_is_drawn_above_the_clip() {
    let mut canvas = mount_photo(red_photo(), &small_card()).unwrap();
    apply(&mut canvas, &framed(None));
    let frame = render_canvas(&canvas, &RenderSettings::default()).unwrap();

    // Corner artwork survives outside the rounded clip.
    assert_eq!(frame.pixel(0, 0), Some([0, 0, 255, 255]));
    // Photo fitted into the 40x20 window: 20x20 centred.
    assert_eq!(frame.pixel(20, 10), Some([255, 0, 0, 255]));
    // Card background shows beside the photo.
    assert_eq!(frame.pixel(35, 10), Some([255, 255, 255, 255]));
}

#[test]
fn shadow_is_offset_behind_the_photo() {
    let mut canvas = mount_photo(red_photo(), &small_card()).unwrap();
    apply(&mut canvas, &framed(Some("#000000 5px 0px 0px")));
    let frame = render_canvas(&canvas, &RenderSettings::default()).unwrap();

    assert_eq!(frame.pixel(20, 10), Some([255, 0, 0, 255]));
    assert_eq!(frame.pixel(32, 10), Some([0, 0, 0, 255]));
    assert_eq!(frame.pixel(37, 10), Some([255, 255, 255, 255]));
}

#[test]
fn blurred_shadow_fades_out() {
    let mut canvas = mount_photo(red_photo(), &small_card()).unwrap();
    apply(&mut canvas, &framed(Some("rgba(0,0,0,1) 0 0 4px")));
    let frame = render_canvas(&canvas, &RenderSettings::default()).unwrap();

    let near_edge = frame.pixel(31, 10).unwrap();
    let far = frame.pixel(38, 10).unwrap();
    assert!(near_edge[0] < far[0], "{near_edge:?} vs {far:?}");
}

#[test]
fn enormous_shadow_blur_renders() {
    let mut canvas = mount_photo(red_photo(), &small_card()).unwrap();
    apply(&mut canvas, &framed(Some("0 0 1e10px")));
    let frame = render_canvas(&canvas, &RenderSettings::default()).unwrap();
    assert_eq!((frame.width, frame.height), (40, 20));
    assert_eq!(frame.pixel(20, 10), Some([255, 0, 0, 255]));
}

#[test]
fn translucent_overlay_blends() {
    let mut canvas = mount_photo(red_photo(), &small_card()).unwrap();
    apply(&mut canvas, &framed(None));
    if let Some(o) = canvas.overlay.as_mut() {
        o.opacity = 0.5;
    }
    if let Some(main) = canvas.main_image_mut() {
        main.set_scale(10.0);
        main.center = kurbo::Point::new(20.0, 10.0);
    }
    let frame = render_canvas(&canvas, &RenderSettings::default()).unwrap();
    let px = frame.pixel(2, 2).unwrap();
    assert!(near(px, [127, 0, 128, 255], 3), "{px:?}");
}

#[test]
fn vertical_layout_renders_portrait() {
    let mut canvas = mount_photo(red_photo(), &small_card()).unwrap();
    apply(
        &mut canvas,
        &Template {
            layout: Layout::Vertical,
            ..Template::default()
        },
    );
    let frame = render_canvas(&canvas, &RenderSettings::default()).unwrap();
    assert_eq!((frame.width, frame.height), (20, 40));
    assert_eq!(frame.pixel(10, 20), Some([255, 0, 0, 255]));
    assert!(frame.pixel(0, 0).unwrap()[3] < 16);
    assert!(frame.pixel(19, 39).unwrap()[3] < 16);
}

#[test]
fn clear_colour_fills_outside_the_card() {
    let canvas = mount_photo(red_photo(), &small_card()).unwrap();
    let settings = RenderSettings {
        clear_rgba: Some([0, 255, 0, 255]),
    };
    let frame = render_canvas(&canvas, &settings).unwrap();
    let corner = frame.pixel(0, 0).unwrap();
    assert!(corner[1] > 240 && corner[3] == 255, "{corner:?}");
}

#[test]
fn frame_unpremultiplies_and_writes_png() {
    let frame = FrameRGBA {
        width: 2,
        height: 1,
        data: vec![64, 0, 0, 128, 10, 20, 30, 255],
        premultiplied: true,
    };
    assert_eq!(frame.to_straight_rgba(), vec![128, 0, 0, 128, 10, 20, 30, 255]);

    let path = std::path::PathBuf::from("target")
        .join("render_cpu")
        .join("frame.png");
    let _ = std::fs::remove_file(&path);
    frame.write_png(&path).unwrap();
    let back = image::open(&path).unwrap().to_rgba8();
    assert_eq!(back.dimensions(), (2, 1));
    assert_eq!(back.get_pixel(1, 0).0, [10, 20, 30, 255]);
}
