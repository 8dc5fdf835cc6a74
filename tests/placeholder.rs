use txt2img::{
    color, encoder, fit, FontStyle, HeadlessFontDriver, ImageFormat, Properties, RenderConfig,
    RenderRequest, Renderer, Rgb,
};

#[test_log::test]
fn hello_txt_encodes_with_both_palette_colors() {
    let renderer = Renderer::new(HeadlessFontDriver::new(), RenderConfig::default());
    let props = Properties::new()
        .text("hello-txt")
        .size(200, 200)
        .background("876")
        .foreground("754")
        .format("jpg");

    let (mut raster, format) = renderer.render_properties(&props).unwrap();
    assert_eq!(format, ImageFormat::Jpeg);

    let png = encoder::encode(&raster, ImageFormat::Png).unwrap();
    raster.release();

    let img = image::load_from_memory(&png).unwrap().to_rgb8();
    assert_eq!(img.dimensions(), (200, 200));
    let colors: std::collections::HashSet<[u8; 3]> = img.pixels().map(|p| p.0).collect();
    assert_eq!(
        colors,
        [[0x88, 0x77, 0x66], [0x77, 0x55, 0x44]].into_iter().collect()
    );
}

#[test_log::test]
fn blank_caption_on_small_canvas_is_all_background() {
    let renderer = Renderer::new(HeadlessFontDriver::new(), RenderConfig::default());
    let request = RenderRequest {
        text: String::new(),
        width: 50,
        height: 50,
        background: Rgb::new(1, 2, 3),
        foreground: Rgb::new(4, 5, 6),
        font_family: "Courier New".to_string(),
        font_style: FontStyle::NORMAL,
    };

    let fitted = fit(
        &HeadlessFontDriver::new(),
        &request.text,
        50,
        50,
        &request.font_family,
        request.font_style,
        700,
    );
    assert_eq!(fitted.font_size, 1);

    let raster = renderer.render(&request).unwrap();
    let img = encoder::to_rgb_image(&raster).unwrap();
    assert!(img.pixels().all(|p| p.0 == [1, 2, 3]));
}

#[test_log::test]
fn alternate_defaults_flow_through() {
    let config = RenderConfig {
        width: 64,
        height: 32,
        background: color::parse("000").unwrap(),
        foreground: color::parse("fff").unwrap(),
        format: ImageFormat::Gif,
        ..RenderConfig::default()
    };
    let renderer = Renderer::new(HeadlessFontDriver::new(), config);
    let (raster, format) = renderer
        .render_properties(&Properties::new().size(99_999, -4))
        .unwrap();

    assert_eq!(format, ImageFormat::Gif);
    assert_eq!((raster.width(), raster.height()), (64, 32));
    assert_eq!(raster.palette().background, Rgb::BLACK);
    assert_eq!(raster.palette().foreground, Rgb::WHITE);

    let gif = encoder::encode(&raster, format).unwrap();
    assert!(gif.starts_with(b"GIF8"));
}
