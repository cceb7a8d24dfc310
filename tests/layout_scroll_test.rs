use pageview::view::{
    Alignment, Axis, Command, LayoutMode, LayoutParams, PageRotation, PointF, RectF, Rotation,
    ScrollDirection, SizeF, SizingPolicy, Thickness, ViewState, ViewerEvent,
};
use pageview::{DocumentViewer, FixtureDocument, ViewerError};

fn viewer(doc: FixtureDocument, viewport: SizeF) -> DocumentViewer<FixtureDocument> {
    let params = LayoutParams {
        sizing: SizingPolicy::FixedZoom,
        zoom: 1.0,
        page_margin: Thickness::uniform(10.0),
        alignment: Alignment::TOP_LEFT,
        ..LayoutParams::default()
    };
    let mut state = ViewState::new(params);
    state.viewport = viewport;
    let mut viewer = DocumentViewer::new(state);
    viewer.open(doc);
    viewer
}

fn assert_point_near(actual: PointF, expected: PointF) {
    let close = (actual.x - expected.x).abs() < 1e-3 && (actual.y - expected.y).abs() < 1e-3;
    assert!(close, "{actual:?} != {expected:?}");
}

#[test]
fn three_pages_stack_vertically_with_margins() {
    let mut viewer = viewer(FixtureDocument::uniform(3, 100.0, 100.0), SizeF::new(120.0, 100.0));

    let ys: Vec<f32> = viewer.page_rects().iter().map(|r| r.rect.y).collect();
    assert_eq!(ys, vec![10.0, 120.0, 230.0]);
    assert_eq!(viewer.extent(), SizeF::new(120.0, 330.0));
    assert!(viewer.page_rects().iter().all(|r| r.is_computed));
    assert_eq!(viewer.visible_range(), Some(0..=0));
}

#[test]
fn scrolling_is_clamped_and_tracks_current_page() {
    let mut viewer = viewer(FixtureDocument::uniform(3, 100.0, 100.0), SizeF::new(120.0, 100.0));
    viewer.take_events();

    assert!(viewer.set_offset(Axis::Vertical, 1000.0));
    assert_eq!(viewer.offset().y, 230.0);
    assert_eq!(viewer.current_page(), 2);
    assert!(
        viewer
            .take_events()
            .contains(&ViewerEvent::CurrentPageChanged(2))
    );

    // Already at the bottom
    assert!(!viewer.scroll_by(ScrollDirection::Down, 50.0));
    assert!(viewer.scroll_by(ScrollDirection::Up, 500.0));
    assert_eq!(viewer.offset().y, 0.0);
    assert_eq!(viewer.current_page(), 0);

    // Nothing to scroll horizontally: content is exactly as wide as the view
    assert!(!viewer.set_offset(Axis::Horizontal, 40.0));
    assert_eq!(viewer.offset().x, 0.0);
}

#[test]
fn scroll_to_page_aligns_the_leading_margin() {
    let mut viewer = viewer(FixtureDocument::uniform(3, 100.0, 100.0), SizeF::new(120.0, 100.0));

    viewer.scroll_to_page(1);
    assert_eq!(viewer.offset().y, 110.0);
    assert_eq!(viewer.current_page(), 1);

    // Out-of-range pages clamp to the last one
    viewer.scroll_to_page(99);
    assert_eq!(viewer.offset().y, 220.0);
    assert_eq!(viewer.current_page(), 2);
}

#[test]
fn page_and_client_coordinates_round_trip() {
    let mut viewer = viewer(FixtureDocument::uniform(3, 100.0, 100.0), SizeF::new(120.0, 100.0));
    viewer.scroll_to_page(1);

    // Page space has its origin at the bottom-left corner
    let top_left = viewer.page_to_client(1, PointF::new(0.0, 100.0)).unwrap();
    assert_eq!(top_left, PointF::new(10.0, 10.0));

    let back = viewer.client_to_page(1, PointF::new(35.0, 60.0)).unwrap();
    assert!((back.x - 25.0).abs() < 1e-3);
    assert!((back.y - 50.0).abs() < 1e-3);

    assert_eq!(
        viewer.page_to_client(2, PointF::default()),
        Err(ViewerError::PageNotVisible { page: 2 })
    );
}

#[test]
fn coordinate_queries_without_document_fail() {
    let mut viewer: DocumentViewer<FixtureDocument> = DocumentViewer::default();
    assert_eq!(
        viewer.client_to_page(0, PointF::default()),
        Err(ViewerError::NoDocument)
    );
    assert!(!viewer.scroll_by(ScrollDirection::Down, 10.0));
    assert_eq!(viewer.visible_range(), None);
}

#[test]
fn horizontal_mode_scrolls_along_x() {
    let mut viewer = viewer(FixtureDocument::uniform(3, 100.0, 100.0), SizeF::new(100.0, 120.0));
    viewer.apply(Command::SetMode(LayoutMode::Horizontal));

    let xs: Vec<f32> = viewer.page_rects().iter().map(|r| r.rect.x).collect();
    assert_eq!(xs, vec![10.0, 120.0, 230.0]);
    assert_eq!(viewer.extent(), SizeF::new(330.0, 120.0));

    viewer.scroll_to_page(2);
    assert_eq!(viewer.offset().x, 220.0);
    assert_eq!(viewer.current_page(), 2);
}

#[test]
fn single_page_mode_shows_the_active_page_only() {
    let mut viewer = viewer(FixtureDocument::uniform(4, 100.0, 100.0), SizeF::new(200.0, 200.0));
    viewer.apply(Command::SetMode(LayoutMode::SinglePage));
    viewer.take_events();

    viewer.scroll_to_page(2);
    assert_eq!(viewer.current_page(), 2);
    assert_eq!(viewer.visible_range(), Some(2..=2));
    assert_eq!(viewer.offset(), PointF::default());
    assert!(viewer.page_rects()[2].is_computed);
    assert!(!viewer.page_rects()[0].is_computed);
    assert_eq!(
        viewer.take_events(),
        vec![ViewerEvent::CurrentPageChanged(2)]
    );
}

#[test]
fn fit_width_derives_zoom_without_feedback() {
    let mut viewer = viewer(FixtureDocument::uniform(2, 100.0, 100.0), SizeF::new(220.0, 100.0));
    viewer.apply(Command::SetSizing(SizingPolicy::FitWidth));
    viewer.take_events();

    let first = viewer.page_rects()[0].rect;
    assert_eq!(first.width, 200.0);
    assert_eq!(viewer.view_state().layout.zoom, 2.0);
    // The derived zoom is reported without switching to a fixed zoom
    assert_eq!(viewer.view_state().layout.sizing, SizingPolicy::FitWidth);
    assert_eq!(viewer.take_events(), vec![ViewerEvent::ZoomChanged(2.0)]);

    // A second pass settles on the same rectangles
    viewer.resize(SizeF::new(220.0, 100.0));
    assert_eq!(viewer.page_rects()[0].rect, first);
}

#[test]
fn explicit_zoom_switches_to_fixed_sizing() {
    let mut viewer = viewer(FixtureDocument::uniform(2, 100.0, 100.0), SizeF::new(220.0, 100.0));
    viewer.apply(Command::SetSizing(SizingPolicy::FitWidth));
    viewer.extent();

    viewer.apply(Command::SetZoom(0.5));
    assert_eq!(viewer.view_state().layout.sizing, SizingPolicy::FixedZoom);
    assert_eq!(viewer.page_rects()[0].rect.width, 50.0);
}

#[test]
fn large_documents_only_measure_pages_in_view() {
    let mut viewer = viewer(FixtureDocument::uniform(500, 100.0, 100.0), SizeF::new(120.0, 250.0));

    assert_eq!(viewer.extent().height, 500.0 * 110.0);
    let queried = viewer.engine().unwrap().size_queries();
    assert!(queried < 10, "{queried} size queries");

    viewer.scroll_to_page(400);
    assert!(viewer.page_rects()[400].is_computed);
    assert!(viewer.visible_range().is_some_and(|r| r.contains(&400)));
    assert_eq!(viewer.current_page(), 400);
    assert!(viewer.engine().unwrap().size_queries() < 20);
}

#[test]
fn scroll_to_point_puts_it_at_the_top_left() {
    let mut viewer = viewer(FixtureDocument::uniform(3, 100.0, 100.0), SizeF::new(60.0, 100.0));

    // Halfway up page 1 on its left edge
    viewer.scroll_to_point(1, PointF::new(0.0, 50.0));
    assert_eq!(viewer.offset(), PointF::new(10.0, 170.0));
    assert_point_near(
        viewer.page_to_client(1, PointF::new(0.0, 50.0)).unwrap(),
        PointF::default(),
    );
    assert_eq!(viewer.current_page(), 1);

    // Past the end of the document the offset is clamped
    viewer.scroll_to_point(2, PointF::new(0.0, 0.0));
    assert_eq!(viewer.offset().y, 230.0);
}

#[test]
fn actual_rect_follows_scroll_and_pixel_ratio() {
    let mut viewer = viewer(FixtureDocument::uniform(3, 100.0, 100.0), SizeF::new(120.0, 100.0));
    viewer.scroll_to_page(1);

    assert_eq!(viewer.actual_rect(1), Some(RectF::new(10.0, 10.0, 100.0, 100.0)));
    assert_eq!(viewer.actual_rect(0), Some(RectF::new(10.0, -100.0, 100.0, 100.0)));
    assert_eq!(viewer.actual_rect(3), None);

    viewer.apply(Command::SetPixelsPerUnit(2.0));
    assert_eq!(viewer.offset().y, 110.0);
    assert_eq!(viewer.actual_rect(1), Some(RectF::new(20.0, 20.0, 200.0, 200.0)));
}

#[test]
fn device_points_map_to_the_page_under_them() {
    let mut viewer = viewer(FixtureDocument::uniform(3, 100.0, 100.0), SizeF::new(120.0, 250.0));
    assert_eq!(viewer.visible_range(), Some(0..=2));

    let (page, point) = viewer.device_to_page(PointF::new(35.0, 160.0)).unwrap();
    assert_eq!(page, 1);
    assert_point_near(point, PointF::new(25.0, 60.0));

    // The margin between pages 0 and 1, and the left margin
    assert_eq!(viewer.device_to_page(PointF::new(35.0, 115.0)), None);
    assert_eq!(viewer.device_to_page(PointF::new(5.0, 50.0)), None);

    // Scrolling is clamped to 80, which moves page 1 up to y 40
    viewer.scroll_to_page(1);
    assert_eq!(viewer.offset().y, 80.0);
    let (page, point) = viewer.device_to_page(PointF::new(35.0, 60.0)).unwrap();
    assert_eq!(page, 1);
    assert_point_near(point, PointF::new(25.0, 80.0));
}

#[test]
fn device_to_page_needs_a_document() {
    let mut viewer: DocumentViewer<FixtureDocument> = DocumentViewer::default();
    assert_eq!(viewer.device_to_page(PointF::new(10.0, 10.0)), None);
}

#[test]
fn rotated_page_is_measured_again() {
    let mut viewer = viewer(FixtureDocument::uniform(2, 100.0, 200.0), SizeF::new(300.0, 500.0));
    assert_eq!(viewer.page_rects()[1].rect.y, 220.0);

    viewer.engine_mut().unwrap().rotate_page(
        0,
        PageRotation {
            current: Rotation::Rotate90,
            original: Rotation::None,
        },
    );

    let rects = viewer.page_rects();
    assert_eq!(rects[0].rect, RectF::new(10.0, 10.0, 200.0, 100.0));
    assert_eq!(rects[1].rect.y, 120.0);

    // The original bottom edge now runs down the left side
    assert_point_near(
        viewer.page_to_client(0, PointF::new(0.0, 0.0)).unwrap(),
        PointF::new(10.0, 10.0),
    );
    assert_point_near(
        viewer.page_to_client(0, PointF::new(100.0, 0.0)).unwrap(),
        PointF::new(10.0, 110.0),
    );
    let back = viewer.client_to_page(0, PointF::new(60.0, 35.0)).unwrap();
    assert_point_near(back, PointF::new(25.0, 50.0));
    assert_point_near(viewer.page_to_client(0, back).unwrap(), PointF::new(60.0, 35.0));
}
