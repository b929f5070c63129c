use std::sync::Arc;

use super::*;

fn blank(w: u32, h: u32) -> Layer {
    Layer::image(PreparedImage {
        width: w,
        height: h,
        rgba8_premul: Arc::new(vec![0; (w * h * 4) as usize]),
    })
}

fn close(a: Point, b: Point) -> bool {
    (a - b).hypot() < 1e-9
}

#[test]
fn transformed_size_ignores_rotation() {
    let mut l = blank(100, 50);
    l.scale_x = 2.0;
    l.scale_y = 3.0;
    l.angle_deg = 90.0;
    assert_eq!(l.transformed_size(), Size::new(200.0, 150.0));
}

#[test]
fn top_left_unrotated_and_rotated() {
    let mut l = blank(100, 50);
    l.center = Point::new(200.0, 100.0);
    l.set_scale(2.0);
    assert!(close(l.top_left(), Point::new(100.0, 50.0)));

    l.angle_deg = 90.0;
    // (-100, -50) rotated clockwise by 90 degrees is (50, -100).
    assert!(close(l.top_left(), Point::new(250.0, 0.0)));
}

#[test]
fn set_position_by_origin_moves_center() {
    let mut l = blank(10, 20);
    l.set_position_by_origin(Point::new(5.0, 5.0), Origin::Center);
    assert_eq!(l.center, Point::new(5.0, 5.0));

    l.set_position_by_origin(Point::new(0.0, 0.0), Origin::TopLeft);
    assert!(close(l.center, Point::new(5.0, 10.0)));
    assert!(close(l.point_at(Origin::TopLeft), Point::ZERO));
}

#[test]
fn rotation_classification() {
    let mut l = blank(1, 1);
    for (deg, rotated) in [(0.0, false), (180.0, false), (-180.0, false), (90.0, true), (270.0, true), (45.0, true)] {
        l.angle_deg = deg;
        assert_eq!(l.is_rotated(), rotated, "angle {deg}");
    }
}

#[test]
fn bounding_rect_of_rotated_layer_swaps_extent() {
    let mut l = blank(100, 50);
    l.center = Point::new(50.0, 50.0);
    l.angle_deg = 90.0;
    let r = l.bounding_rect();
    assert!((r.width() - 50.0).abs() < 1e-9);
    assert!((r.height() - 100.0).abs() < 1e-9);
    assert!(close(r.center(), Point::new(50.0, 50.0)));
}

#[test]
fn card_rect_uses_card_geometry() {
    let card = CardSpec::default();
    let l = Layer::card_rect(&card);
    assert_eq!(l.size(), card.size());
    assert!(!l.is_image());
    match l.source {
        LayerSource::Rect(shape) => assert_eq!(shape.corner_radius, card.corner_radius),
        _ => panic!("expected rect"),
    }
}
