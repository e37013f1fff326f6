use super::*;
use crate::document::memory::InMemoryStore;
use crate::document::shape::Shape;
use crate::pixels::codec::decode_image;
use crate::raster::svg::SvgDecoder;

fn store() -> Arc<InMemoryStore> {
    let mut g = Shape::group("g");
    g.x = 10.0;
    g.y = 10.0;
    let mut hidden = Shape::leaf("hidden", 0.0, 0.0, 20.0, 20.0)
        .with_parent("g")
        .with_z(5.0)
        .with_fill(Rgba8::new(0, 0, 255, 255));
    hidden.meta.hidden = true;
    Arc::new(InMemoryStore::with_shapes([
        g,
        Shape::leaf("red", 0.0, 0.0, 10.0, 10.0)
            .with_parent("g")
            .with_fill(Rgba8::new(255, 0, 0, 255)),
        Shape::leaf("dot", 12.0, 0.0, 8.0, 8.0)
            .with_parent("g")
            .with_z(1.0)
            .with_geometry(Geometry::Ellipse)
            .with_fill(Rgba8::new(0, 255, 0, 255)),
        hidden,
    ]))
}

#[tokio::test]
async fn svg_export_places_leaves_in_page_space() {
    let store = store();
    let exporter = SceneExporter::new(store.clone());
    let bounds = Rect::new(10.0, 10.0, 30.0, 20.0);
    let ids = [ShapeId::from("g")];
    let svg = exporter.export_svg(&ids, bounds, 2.0).await.unwrap().unwrap();
    assert!(svg.contains(r#"width="40" height="20""#));
    assert!(!svg.contains("rgb(0,0,255)"), "hidden child must not be exported");

    let buf = SvgDecoder::new().decode(&svg, 40, 20).unwrap();
    assert_eq!(buf.sample(5, 5), [255, 0, 0, 255]);
    assert_eq!(buf.sample(32, 8), [0, 255, 0, 255]);
    assert_eq!(buf.sample(22, 18)[3], 0);
}

#[tokio::test]
async fn hidden_root_is_still_exported() {
    let store = store();
    store
        .update(&"hidden".into(), crate::document::shape::ShapeUpdate::hidden(true))
        .unwrap();
    let exporter = SceneExporter::new(store.clone());
    let ids = [ShapeId::from("hidden")];
    let svg = exporter
        .export_svg(&ids, Rect::new(10.0, 10.0, 30.0, 30.0), 1.0)
        .await
        .unwrap();
    assert!(svg.is_some_and(|s| s.contains("rgb(0,0,255)")));
}

#[tokio::test]
async fn export_of_nothing_is_none() {
    let exporter = SceneExporter::new(store());
    let ids = [ShapeId::from("missing")];
    let out = exporter
        .export_svg(&ids, Rect::new(0.0, 0.0, 1.0, 1.0), 1.0)
        .await
        .unwrap();
    assert!(out.is_none());
}

#[tokio::test]
async fn native_rasterizer_matches_vector_layout() {
    let store = store();
    let exporter = SceneExporter::new(store.clone());
    let ids = [ShapeId::from("g")];
    let png = exporter
        .rasterize(&ids, Rect::new(10.0, 10.0, 30.0, 20.0), 2.0)
        .await
        .unwrap();
    let buf = decode_image(&png).unwrap();
    assert_eq!((buf.width(), buf.height()), (40, 20));
    assert_eq!(buf.sample(5, 5), [255, 0, 0, 255]);
    assert_eq!(buf.sample(32, 8), [0, 255, 0, 255]);
    assert_eq!(buf.sample(22, 18)[3], 0);
}

#[test]
fn invalid_path_data_is_an_export_error() {
    let leaf = LeafShape {
        width: 1.0,
        height: 1.0,
        geometry: Geometry::Path {
            d: "M 0 0 Q".into(),
        },
        style: Default::default(),
    };
    assert!(matches!(outline(&leaf), Err(FxError::Export(_))));
}
