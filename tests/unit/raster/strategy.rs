use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::pixels::codec::encode_png;

struct FixedSvg(Option<String>, AtomicUsize);

impl VectorExporter for FixedSvg {
    fn export_svg<'a>(
        &'a self,
        _ids: &'a [ShapeId],
        _bounds: Rect,
        _pixel_ratio: f64,
    ) -> BoxFuture<'a, FxResult<Option<String>>> {
        self.1.fetch_add(1, Ordering::SeqCst);
        let out = self.0.clone();
        async move { Ok(out) }.boxed()
    }
}

struct FixedPng(Vec<u8>, AtomicUsize);

impl NativeRasterizer for FixedPng {
    fn rasterize<'a>(
        &'a self,
        _ids: &'a [ShapeId],
        _bounds: Rect,
        _pixel_ratio: f64,
    ) -> BoxFuture<'a, FxResult<Vec<u8>>> {
        self.1.fetch_add(1, Ordering::SeqCst);
        let out = self.0.clone();
        async move { Ok(out) }.boxed()
    }
}

const RED: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="8"><style>*{}</style><rect width="8" height="8" fill="red"/></svg>"#;

fn req(ids: &[ShapeId]) -> RasterRequest<'_> {
    RasterRequest {
        ids,
        bounds: Rect::new(0.0, 0.0, 8.0, 8.0),
        pixel_ratio: 2.0,
        width: 16,
        height: 16,
    }
}

fn green_png(w: u32, h: u32) -> Vec<u8> {
    let buf = PixelBuffer::from_premul(w, h, [0u8, 255, 0, 255].repeat((w * h) as usize)).unwrap();
    encode_png(&buf).unwrap()
}

#[tokio::test]
async fn vector_strategy_decodes_sanitized_svg() {
    let s = VectorExportStrategy::new(
        Arc::new(FixedSvg(Some(RED.to_string()), AtomicUsize::new(0))),
        SvgDecoder::new(),
        8,
    );
    let ids = [ShapeId::from("a")];
    let buf = s.rasterize(req(&ids)).await.unwrap();
    assert_eq!((buf.width(), buf.height()), (16, 16));
    assert_eq!(buf.sample(8, 8), [255, 0, 0, 255]);
}

#[tokio::test]
async fn vector_strategy_rejects_empty_export_and_blank_surface() {
    let ids = [ShapeId::from("a")];
    let none = VectorExportStrategy::new(
        Arc::new(FixedSvg(None, AtomicUsize::new(0))),
        SvgDecoder::new(),
        8,
    );
    assert!(matches!(
        none.rasterize(req(&ids)).await,
        Err(FxError::Export(_))
    ));

    let blank = VectorExportStrategy::new(
        Arc::new(FixedSvg(
            Some(r#"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="8"/>"#.into()),
            AtomicUsize::new(0),
        )),
        SvgDecoder::new(),
        8,
    );
    assert!(matches!(
        blank.rasterize(req(&ids)).await,
        Err(FxError::Decode(_))
    ));
}

#[tokio::test]
async fn native_strategy_resizes_to_request() {
    let s = NativeStrategy::new(Arc::new(FixedPng(green_png(4, 4), AtomicUsize::new(0))), 8);
    let ids = [ShapeId::from("a")];
    let buf = s.rasterize(req(&ids)).await.unwrap();
    assert_eq!((buf.width(), buf.height()), (16, 16));
    assert_eq!(buf.sample(8, 8), [0, 255, 0, 255]);
}

#[tokio::test]
async fn fallback_tries_strategies_in_order() {
    let exporter = Arc::new(FixedSvg(None, AtomicUsize::new(0)));
    let native = Arc::new(FixedPng(green_png(16, 16), AtomicUsize::new(0)));
    let strategies: Vec<Arc<dyn RasterStrategy>> = vec![
        Arc::new(VectorExportStrategy::new(exporter.clone(), SvgDecoder::new(), 8)),
        Arc::new(NativeStrategy::new(native.clone(), 8)),
    ];
    let ids = [ShapeId::from("a")];
    let buf = rasterize_with_fallback(&strategies, req(&ids)).await.unwrap();
    assert_eq!(buf.sample(0, 0), [0, 255, 0, 255]);
    assert_eq!(exporter.1.load(Ordering::SeqCst), 1);
    assert_eq!(native.1.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn fallback_returns_none_when_everything_fails() {
    let strategies: Vec<Arc<dyn RasterStrategy>> = vec![
        Arc::new(VectorExportStrategy::new(
            Arc::new(FixedSvg(None, AtomicUsize::new(0))),
            SvgDecoder::new(),
            8,
        )),
        Arc::new(NativeStrategy::new(
            Arc::new(FixedPng(Vec::new(), AtomicUsize::new(0))),
            8,
        )),
    ];
    let ids = [ShapeId::from("a")];
    assert!(rasterize_with_fallback(&strategies, req(&ids)).await.is_none());
}
