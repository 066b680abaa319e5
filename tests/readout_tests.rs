use sky_align::alignment::Tool;
use sky_align::data::synthetic;
use sky_align::readout::EventKind;
use sky_align::*;

fn load_all(datasets: Vec<Dataset>) -> Workspace {
    let mut workspace = Workspace::default();
    for dataset in datasets {
        workspace.load(dataset).unwrap();
    }
    workspace
}

#[test]
fn test_wcs_link_with_pixel_fallback_readout() {
    let mut workspace = load_all(vec![
        synthetic::image_with_wcs("has_wcs"),
        synthetic::image_without_wcs("no_wcs"),
    ]);
    let links = workspace.link_data(LinkOptions::wcs()).unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links.links[0].kind, LinkKind::Identity);
    assert!(links.links[0].pixel_fallback);
    assert_eq!(
        workspace.get_alignment_method(DEFAULT_VIEWER, "no_wcs").unwrap(),
        AlignmentMethod::Pixels
    );

    let readout = workspace.read(DEFAULT_VIEWER, 0.0, 0.0).unwrap();
    assert_eq!(readout.dataset.as_deref(), Some("no_wcs"));
    assert_eq!(
        readout.as_text(),
        (
            "Pixel x=00.0 y=00.0 Value +0.00000e+00",
            "World 22h30m04.8674s -20d49m59.9990s (ICRS)",
            "337.5202808000 -20.8333330600 (deg)",
        )
    );
    assert!(!readout.row1_unreliable);
    assert!(!readout.row2_unreliable);
    assert!(!readout.row3_unreliable);
}

#[test]
fn test_pixels_mode_without_frame_has_no_world_rows() {
    let workspace = load_all(vec![
        synthetic::image_with_wcs("has_wcs"),
        synthetic::image_without_wcs("no_wcs"),
    ]);

    let readout = workspace.read(DEFAULT_VIEWER, 3.0, 4.0).unwrap();
    assert_eq!(readout.pixel_text, "Pixel x=03.0 y=04.0 Value +0.00000e+00");
    assert_eq!(readout.world_text, "");
    assert_eq!(readout.decimal_text, "");
    assert!(!readout.row1_unreliable && !readout.row2_unreliable && !readout.row3_unreliable);
    assert!(readout.world.is_none());
}

#[test]
fn test_pixels_mode_uses_top_dataset_frame() {
    let workspace = load_all(vec![
        synthetic::image_without_wcs("no_wcs"),
        synthetic::image_with_wcs("has_wcs"),
    ]);

    let readout = workspace.read(DEFAULT_VIEWER, 0.0, 0.0).unwrap();
    assert_eq!(readout.dataset.as_deref(), Some("has_wcs"));
    assert_eq!(readout.world_text, "World 22h30m04.8674s -20d49m59.9990s (ICRS)");
}

#[test]
fn test_wcs_mode_without_celestial_reference_uses_top_frame() {
    let mut workspace = load_all(vec![
        synthetic::image_without_wcs("no_wcs"),
        synthetic::image_with_wcs("has_wcs"),
    ]);
    let links = workspace.link_data(LinkOptions::wcs()).unwrap();
    assert_eq!(links.reference.as_deref(), Some("no_wcs"));
    assert!(links.get("has_wcs").unwrap().pixel_fallback);

    let readout = workspace.read(DEFAULT_VIEWER, 0.0, 0.0).unwrap();
    assert_eq!(readout.dataset.as_deref(), Some("has_wcs"));
    assert_eq!(
        readout.as_text(),
        (
            "Pixel x=00.0 y=00.0 Value +0.00000e+00",
            "World 22h30m04.8674s -20d49m59.9990s (ICRS)",
            "337.5202808000 -20.8333330600 (deg)",
        )
    );
    assert!(!readout.row1_unreliable && !readout.row2_unreliable && !readout.row3_unreliable);
}

#[test]
fn test_blink_changes_readout_not_links() {
    let mut workspace = load_all(vec![
        synthetic::image_with_wcs("has_wcs"),
        synthetic::image_with_shifted_wcs("shifted"),
    ]);
    workspace.link_data(LinkOptions::wcs()).unwrap();
    let links = workspace.links().clone();

    let top = workspace.read(DEFAULT_VIEWER, 0.0, 0.0).unwrap();
    assert_eq!(top.pixel_text, "Pixel x=01.0 y=00.0 Value +1.00000e+00");

    workspace.blink(DEFAULT_VIEWER).unwrap();
    let blinked = workspace.read(DEFAULT_VIEWER, 0.0, 0.0).unwrap();
    assert_eq!(blinked.dataset.as_deref(), Some("has_wcs"));
    assert_eq!(blinked.pixel_text, "Pixel x=00.0 y=00.0 Value +0.00000e+00");
    assert_eq!(blinked.world_text, top.world_text);
    assert_eq!(workspace.links(), &links);

    workspace.blink(DEFAULT_VIEWER).unwrap();
    let back = workspace.read(DEFAULT_VIEWER, 0.0, 0.0).unwrap();
    assert_eq!(back.dataset.as_deref(), Some("shifted"));
}

#[test]
fn test_events_drive_blinking() {
    let mut workspace = load_all(vec![
        synthetic::image_with_wcs("a"),
        synthetic::image_without_wcs("b"),
    ]);

    let moved = workspace
        .on_event(DEFAULT_VIEWER, ViewerEvent::mouse_move(1.0, 1.0))
        .unwrap();
    assert_eq!(moved.dataset.as_deref(), Some("b"));

    let keyed = workspace
        .on_event(DEFAULT_VIEWER, ViewerEvent::key_down('b', 1.0, 1.0))
        .unwrap();
    assert_eq!(keyed.dataset.as_deref(), Some("a"));

    let other_key = workspace
        .on_event(DEFAULT_VIEWER, ViewerEvent::key_down('x', 1.0, 1.0))
        .unwrap();
    assert_eq!(other_key.dataset.as_deref(), Some("a"));

    let click = ViewerEvent::click(1.0, 1.0);
    assert_eq!(click.kind, EventKind::Click);
    let clicked = workspace.on_event(DEFAULT_VIEWER, click).unwrap();
    assert_eq!(clicked.dataset.as_deref(), Some("a"));

    workspace
        .set_active_tool(DEFAULT_VIEWER, Some(Tool::BlinkOnce))
        .unwrap();
    let clicked = workspace.on_event(DEFAULT_VIEWER, click).unwrap();
    assert_eq!(clicked.dataset.as_deref(), Some("b"));
}

#[test]
fn test_outside_bounding_box_world_rows_unreliable() {
    let workspace = load_all(vec![synthetic::gwcs_image("gwcs")]);

    let inside = workspace.read(DEFAULT_VIEWER, 0.0, 0.0).unwrap();
    assert_eq!(
        inside.pixel_text,
        "Pixel x=00.0 y=00.0 Value +0.00000e+00 electron / s"
    );
    assert_eq!(
        inside.decimal_text,
        format!(
            "{:.10} {:.10} (deg)",
            synthetic::GWCS_CRVAL[0],
            synthetic::GWCS_CRVAL[1]
        )
    );
    assert!(!inside.row2_unreliable && !inside.row3_unreliable);

    let outside = workspace.read(DEFAULT_VIEWER, 10.5, 0.0).unwrap();
    assert_eq!(outside.pixel_text, "Pixel x=10.5 y=00.0");
    assert!(!outside.row1_unreliable);
    assert!(outside.row2_unreliable);
    assert!(outside.row3_unreliable);
    assert_eq!(outside.world_text, "");
    assert_eq!(outside.decimal_text, "");
}

#[test]
fn test_outside_reference_domain_in_wcs_mode() {
    let mut workspace = load_all(vec![
        synthetic::gwcs_image("gwcs"),
        synthetic::fits_image_near_gwcs("fits"),
    ]);
    workspace.link_data(LinkOptions::wcs()).unwrap();

    let readout = workspace.read(DEFAULT_VIEWER, -3.0, -3.0).unwrap();
    assert_eq!(readout.dataset.as_deref(), Some("fits"));
    assert!(readout.row2_unreliable);
    assert!(readout.row3_unreliable);
    assert_eq!(readout.world_text, "");
    assert_eq!(readout.decimal_text, "");

    let inside = workspace.read(DEFAULT_VIEWER, 4.0, 4.0).unwrap();
    assert!(!inside.row2_unreliable && !inside.row3_unreliable);
    assert!(inside.world_text.ends_with("(ICRS)"));
}

#[test]
fn test_empty_workspace_readout() {
    let workspace = Workspace::default();
    let readout = workspace.read(DEFAULT_VIEWER, 0.0, 0.0).unwrap();
    assert_eq!(readout, CursorReadout::default());
    assert!(matches!(
        workspace.read("imviz-7", 0.0, 0.0),
        Err(AlignError::NotFound(_))
    ));
}

#[test]
fn test_custom_readout_config() {
    let mut config = Config::default();
    config.readout.frame_name = "FK5".to_string();
    config.readout.decimal_decimals = 3;
    let mut workspace = Workspace::new(config);
    workspace.load(synthetic::image_with_wcs("a")).unwrap();

    let readout = workspace.read(DEFAULT_VIEWER, 0.0, 0.0).unwrap();
    assert!(readout.world_text.ends_with("(FK5)"));
    assert_eq!(readout.decimal_text, "337.520 -20.833 (deg)");
}

#[test]
fn test_unvalidated_sexagesimal_precision_is_clamped() {
    let mut config = Config::default();
    config.readout.sexagesimal_decimals = 25;
    assert!(config.validate().is_err());

    let mut workspace = Workspace::new(config);
    workspace.load(synthetic::image_with_wcs("a")).unwrap();
    let readout = workspace.read(DEFAULT_VIEWER, 0.0, 0.0).unwrap();

    let mut finest = Config::default();
    finest.readout.sexagesimal_decimals = 9;
    let mut expected = Workspace::new(finest);
    expected.load(synthetic::image_with_wcs("a")).unwrap();
    assert_eq!(
        readout.world_text,
        expected.read(DEFAULT_VIEWER, 0.0, 0.0).unwrap().world_text
    );
    assert!(readout.world_text.starts_with("World 22h30m04.867"));
}
