//! End-to-end capture tests against the CPU renderer.

mod common;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use common::{colored_box, front_camera, SoftwareRenderer};
use depthscope::*;
use proptest::prelude::*;

fn host_with(scene: SceneGraph, width: u32, height: u32) -> SceneHost<SoftwareRenderer> {
    let mut host = SceneHost::with_scene(SoftwareRenderer::new(width, height), scene, width, height);
    *host.camera_mut() = front_camera(10.0);
    host
}

/// A thin slab large enough to cover the whole view.
fn covering_scene() -> SceneGraph {
    SceneGraph::with_root(colored_box(
        "backdrop",
        Vec3::new(100.0, 100.0, 0.1),
        Vec3::ZERO,
        Vec3::new(0.2, 0.4, 0.6),
    ))
}

fn shadow_flags(scene: &SceneGraph) -> Vec<(bool, bool)> {
    let mut flags = Vec::new();
    scene.for_each_mesh(|_, mesh| flags.push((mesh.cast_shadow, mesh.receive_shadow)));
    flags
}

fn assert_same_bindings(before: &[MaterialRef], scene: &SceneGraph) {
    let after = scene.material_bindings();
    assert_eq!(before.len(), after.len());
    for (a, b) in before.iter().zip(&after) {
        assert!(Arc::ptr_eq(a, b), "material {} was not restored", a.name);
    }
}

/// Two meshes, one with shadow receiving turned off.
fn mixed_scene() -> SceneGraph {
    let mut lower = colored_box("lower", Vec3::ONE, Vec3::new(0.0, -2.0, 0.0), Vec3::X);
    if let NodeKind::Mesh(mesh) = &mut lower.kind {
        mesh.receive_shadow = false;
    }
    SceneGraph::with_root(
        SceneNode::group("root")
            .with_child(colored_box("upper", Vec3::ONE, Vec3::new(0.0, 2.0, 0.0), Vec3::Y))
            .with_child(lower),
    )
}

#[test]
fn test_array_length_matches_target() {
    for (w, h) in [(1, 1), (3, 5), (17, 9)] {
        let mut host = host_with(covering_scene(), w, h);
        let config = CaptureConfig::default().with_size(w, h);
        let pipeline = DepthCapturePipeline::new(host.renderer_mut(), config).unwrap();
        let frame = pipeline.capture_frame(&mut host).unwrap();
        assert_eq!(frame.values.len(), (w * h) as usize);
        assert_eq!(frame.pixels.len(), (w * h * 4) as usize);
        assert_eq!(frame.raster.dimensions(), (w, h));
    }
}

#[test]
fn test_doubled_resolution_preset() {
    let mut host = host_with(covering_scene(), 8, 8);
    let config = CapturePreset::BinaryMaskDoubled.config(3, 4);
    let pipeline = DepthCapturePipeline::new(host.renderer_mut(), config).unwrap();
    let capture = pipeline.capture(&mut host, &mut MemorySink::new()).unwrap();
    assert_eq!((capture.width, capture.height), (6, 8));
    assert_eq!(capture.values.len(), 48);
}

#[test]
fn test_uniform_gray_raw_luma_4x4() {
    let mut host = host_with(SceneGraph::new(), 4, 4);
    let config = CapturePreset::RawLuma
        .config(4, 4)
        .with_gray_background(128);
    let pipeline = DepthCapturePipeline::new(host.renderer_mut(), config).unwrap();
    let mut sink = MemorySink::new();

    let capture = pipeline.capture(&mut host, &mut sink).unwrap();
    assert_eq!(capture.values.len(), 16);
    for v in &capture.values {
        assert!((v - 128.0 / 255.0).abs() < 1e-6, "unexpected value {v}");
    }

    let array = sink.get(DEFAULT_ARRAY_FILENAME).unwrap();
    assert_eq!(array.format, ArtifactFormat::NumericArray);
    let decoded = decode_numeric_array(&array.payload).unwrap();
    assert_eq!(decoded, capture.values);

    let raster = sink.get(DEFAULT_RASTER_FILENAME).unwrap();
    assert_eq!(raster.format, ArtifactFormat::RasterImage);
    let image = image::load_from_memory(&raster.payload).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (4, 4));
    assert!(image.pixels().all(|p| p.0 == [128, 128, 128, 255]));
}

#[test]
fn test_binary_mask_full_coverage() {
    let mut host = host_with(covering_scene(), 4, 4);
    let config = CapturePreset::BinaryMask.config(4, 4);
    let pipeline = DepthCapturePipeline::new(host.renderer_mut(), config).unwrap();
    let frame = pipeline.capture_frame(&mut host).unwrap();

    assert!(frame.values.iter().all(|v| *v == 1.0));
    assert!(frame.raster.pixels().all(|p| p.0 == [255, 255, 255, 255]));
}

#[test]
fn test_binary_mask_background_is_zero() {
    let mut host = host_with(SceneGraph::new(), 4, 4);
    let pipeline =
        DepthCapturePipeline::new(host.renderer_mut(), CaptureConfig::default().with_size(4, 4))
            .unwrap();
    let frame = pipeline.capture_frame(&mut host).unwrap();
    assert!(frame.values.iter().all(|v| *v == 0.0));
    assert!(frame.raster.pixels().all(|p| p.0 == [0, 0, 0, 255]));
}

#[test]
fn test_marker_near_top_lands_in_first_row() {
    let (w, h) = (16u32, 16u32);
    // Spans the top scan-line at the horizontal center
    let marker = colored_box("marker", Vec3::new(2.0, 2.0, 0.1), Vec3::new(0.0, 6.5, 0.0), Vec3::ONE);
    let mut host = host_with(SceneGraph::with_root(marker), w, h);
    let pipeline =
        DepthCapturePipeline::new(host.renderer_mut(), CaptureConfig::default().with_size(w, h))
            .unwrap();
    let frame = pipeline.capture_frame(&mut host).unwrap();

    let w = w as usize;
    let first_row = &frame.values[..w];
    let last_row = &frame.values[frame.values.len() - w..];
    assert!(first_row.iter().any(|v| *v > 0.0), "marker missing from first row");
    assert!(last_row.iter().all(|v| *v == 0.0), "marker leaked into last row");
    assert_eq!(first_row[w / 2], 1.0);

    // The renderer stores bottom-up: the marker sits at the end of memory
    let raw_last_row = &frame.pixels[frame.pixels.len() - w * 4..];
    assert!(raw_last_row.chunks(4).any(|px| px[0] > 0));

    // Raster agrees with the array
    assert_eq!(frame.raster.get_pixel(8, 0).0, [255, 255, 255, 255]);
    assert_eq!(frame.raster.get_pixel(8, 15).0, [0, 0, 0, 255]);
}

#[test]
fn test_raw_luma_nearer_is_brighter() {
    let scene = SceneGraph::with_root(
        SceneNode::group("pair")
            .with_child(colored_box("near", Vec3::new(2.0, 2.0, 0.1), Vec3::new(-2.5, 0.0, 4.0), Vec3::X))
            .with_child(colored_box("far", Vec3::new(2.0, 2.0, 0.1), Vec3::new(2.5, 0.0, -4.0), Vec3::X)),
    );
    let mut host = host_with(scene, 32, 32);
    let pipeline =
        DepthCapturePipeline::new(host.renderer_mut(), CapturePreset::RawLuma.config(32, 32))
            .unwrap();
    let frame = pipeline.capture_frame(&mut host).unwrap();

    let row = 16 * 32;
    let near = frame.values[row + 8];
    let far = frame.values[row + 20];
    let background = frame.values[0];
    assert_eq!(background, 1.0);
    assert!(near > far, "near {near} should be brighter than far {far}");
    assert!(far < background);
}

#[test]
fn test_repeated_captures_are_identical() {
    let mut host = host_with(mixed_scene(), 12, 12);
    let pipeline =
        DepthCapturePipeline::new(host.renderer_mut(), CapturePreset::RawLuma.config(12, 12))
            .unwrap();
    let mut sink = MemorySink::new();

    let first = pipeline.capture(&mut host, &mut sink).unwrap();
    let second = pipeline.capture(&mut host, &mut sink).unwrap();
    assert_eq!(first.values, second.values);
    assert_eq!(first.artifacts, second.artifacts);
}

#[test]
fn test_one_offscreen_render_per_capture() {
    let mut host = host_with(mixed_scene(), 4, 4);
    let pipeline =
        DepthCapturePipeline::new(host.renderer_mut(), CaptureConfig::default().with_size(4, 4))
            .unwrap();
    pipeline.capture(&mut host, &mut MemorySink::new()).unwrap();
    assert_eq!(host.renderer().render_calls, 1);
    assert_eq!(host.renderer().offscreen_renders, 1);
}

#[test]
fn test_materials_restored_after_success() {
    let mut host = host_with(mixed_scene(), 8, 8);
    let before = host.scene().material_bindings();
    let flags = shadow_flags(host.scene());
    assert_eq!(flags, vec![(true, true), (true, false)]);

    let pipeline =
        DepthCapturePipeline::new(host.renderer_mut(), CaptureConfig::default().with_size(8, 8))
            .unwrap();
    pipeline.capture(&mut host, &mut MemorySink::new()).unwrap();

    // During the pass every mesh carried the substitute, shadows off
    assert_eq!(host.renderer().last_materials, vec!["depth-mask", "depth-mask"]);
    assert_eq!(host.renderer().last_shadow_flags, vec![(false, false); 2]);

    assert_same_bindings(&before, host.scene());
    assert_eq!(shadow_flags(host.scene()), flags);

    host.render_frame().unwrap();
    assert_eq!(host.renderer().last_materials, vec!["upper", "lower"]);
}

#[test]
fn test_render_failure_restores_everything() {
    let mut host = host_with(mixed_scene(), 8, 8);
    let original_clear = Vec4::new(0.1, 0.2, 0.3, 1.0);
    host.renderer_mut().set_clear_color(original_clear);
    let before = host.scene().material_bindings();
    let flags = shadow_flags(host.scene());

    let pipeline =
        DepthCapturePipeline::new(host.renderer_mut(), CaptureConfig::default().with_size(8, 8))
            .unwrap();
    host.renderer_mut().fail_render = true;
    let mut sink = MemorySink::new();

    let err = pipeline.capture(&mut host, &mut sink).unwrap_err();
    assert!(matches!(err, DepthscopeError::RenderFailure(_)));
    assert!(err.is_retryable());
    assert!(sink.artifacts.is_empty());

    assert_same_bindings(&before, host.scene());
    assert_eq!(shadow_flags(host.scene()), flags);
    assert_eq!(host.renderer().clear_color(), original_clear);
    assert_eq!(host.renderer().bound_target(), None);
    assert_eq!(pipeline.state(), CaptureState::Idle);

    // A manual retry succeeds once the fault is gone
    host.renderer_mut().fail_render = false;
    assert!(pipeline.capture(&mut host, &mut sink).is_ok());
}

#[test]
fn test_short_readback_is_size_mismatch() {
    let mut host = host_with(mixed_scene(), 4, 4);
    let before = host.scene().material_bindings();
    let pipeline =
        DepthCapturePipeline::new(host.renderer_mut(), CaptureConfig::default().with_size(4, 4))
            .unwrap();
    host.renderer_mut().short_readback = true;

    let err = pipeline.capture_frame(&mut host).unwrap_err();
    assert!(matches!(
        err,
        DepthscopeError::ReadbackSizeMismatch {
            expected: 64,
            actual: 60
        }
    ));
    assert!(!err.is_retryable());
    assert_same_bindings(&before, host.scene());
    assert_eq!(pipeline.state(), CaptureState::Idle);
}

#[test]
fn test_reentrant_capture_is_busy() {
    let mut host = host_with(mixed_scene(), 8, 8);
    let pipeline = Rc::new(
        DepthCapturePipeline::new(host.renderer_mut(), CaptureConfig::default().with_size(8, 8))
            .unwrap(),
    );
    let mut sink = MemorySink::new();
    let expected = pipeline.capture(&mut host, &mut sink).unwrap();

    let observed: Rc<RefCell<Option<(bool, CaptureState)>>> = Rc::new(RefCell::new(None));
    let hook_pipeline = Rc::clone(&pipeline);
    let hook_observed = Rc::clone(&observed);
    let mut other = host_with(SceneGraph::new(), 8, 8);
    host.renderer_mut().on_render = Some(Box::new(move || {
        let state = hook_pipeline.state();
        let result = hook_pipeline.capture(&mut other, &mut MemorySink::new());
        let busy = matches!(result, Err(DepthscopeError::Busy));
        *hook_observed.borrow_mut() = Some((busy, state));
        // Resizing mid-capture is rejected the same way
        assert!(matches!(
            hook_pipeline.resize(other.renderer_mut(), 2, 2),
            Err(DepthscopeError::Busy)
        ));
    }));

    let outer = pipeline.capture(&mut host, &mut sink).unwrap();
    assert_eq!(*observed.borrow(), Some((true, CaptureState::Rendering)));
    assert_eq!(outer.values, expected.values);
    assert_eq!(pipeline.state(), CaptureState::Idle);
    assert_eq!(pipeline.target_size(), Some((8, 8)));
}

#[test]
fn test_not_ready_without_target() {
    let mut host = host_with(mixed_scene(), 4, 4);
    let pipeline =
        DepthCapturePipeline::new(host.renderer_mut(), CaptureConfig::default().with_size(0, 0))
            .unwrap();
    let err = pipeline.capture(&mut host, &mut MemorySink::new()).unwrap_err();
    assert!(matches!(err, DepthscopeError::NotReady));
    assert!(!err.is_retryable());
    assert_eq!(host.renderer().render_calls, 0);

    pipeline.resize(host.renderer_mut(), 4, 4).unwrap();
    assert!(pipeline.capture_frame(&mut host).is_ok());

    pipeline.teardown(host.renderer_mut()).unwrap();
    assert_eq!(host.renderer().live_targets(), 0);
    assert!(matches!(
        pipeline.capture_frame(&mut host),
        Err(DepthscopeError::NotReady)
    ));
}

struct RejectPng;

impl ExportSink for RejectPng {
    fn save(&mut self, artifact: &ExportArtifact) -> Result<()> {
        if artifact.format == ArtifactFormat::RasterImage {
            return Err(DepthscopeError::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )));
        }
        Ok(())
    }
}

#[test]
fn test_export_failure_keeps_artifacts() {
    let mut host = host_with(covering_scene(), 4, 4);
    let pipeline =
        DepthCapturePipeline::new(host.renderer_mut(), CaptureConfig::default().with_size(4, 4))
            .unwrap();

    let err = pipeline.capture(&mut host, &mut RejectPng).unwrap_err();
    assert!(err.is_retryable());
    match err {
        DepthscopeError::ExportFailure {
            filename,
            reason,
            artifacts,
        } => {
            assert_eq!(filename, DEFAULT_RASTER_FILENAME);
            assert!(reason.contains("disk full"));
            assert_eq!(artifacts.len(), 2);
            let values = decode_numeric_array(&artifacts[0].payload).unwrap();
            assert_eq!(values, vec![1.0; 16]);
        }
        other => panic!("expected ExportFailure, got {other:?}"),
    }
    assert_eq!(pipeline.state(), CaptureState::Idle);
}

#[test]
fn test_file_sink_writes_both_artifacts() {
    let dir = std::env::temp_dir().join(format!("depthscope-capture-{}", std::process::id()));
    let mut host = host_with(covering_scene(), 4, 4);
    let pipeline =
        DepthCapturePipeline::new(host.renderer_mut(), CaptureConfig::default().with_size(4, 4))
            .unwrap();
    let mut sink = FileSink::new(&dir);

    pipeline.capture(&mut host, &mut sink).unwrap();
    let json = std::fs::read(dir.join("depth-map.json")).unwrap();
    assert_eq!(decode_numeric_array(&json).unwrap().len(), 16);
    let png = std::fs::read(dir.join("depth-map.png")).unwrap();
    assert_eq!(&png[1..4], b"PNG");

    let _ = std::fs::remove_dir_all(&dir);
}

/// Lets a test keep reading a sink owned by the inspector.
#[derive(Clone, Default)]
struct SharedSink(Rc<RefCell<MemorySink>>);

impl ExportSink for SharedSink {
    fn save(&mut self, artifact: &ExportArtifact) -> Result<()> {
        self.0.borrow_mut().save(artifact)
    }
}

#[test]
fn test_inspector_selection_and_capture() {
    let sink = SharedSink::default();
    let mut inspector = Inspector::new(
        SoftwareRenderer::new(16, 16),
        Box::new(ProceduralModels::new()),
        default_catalog(),
        CaptureConfig::default().with_size(16, 16),
        Box::new(sink.clone()),
        (16, 16),
    )
    .unwrap();

    // Placeholder until the first tick
    assert_eq!(inspector.host().active_model(), None);
    assert_eq!(inspector.host().scene().mesh_count(), 1);
    inspector.tick().unwrap();
    assert_eq!(inspector.host().active_model(), Some("/low-poly_test_dummy.glb"));

    // Selection is not committed before the next tick
    assert!(inspector.select_model("Tunnergp").unwrap());
    assert!(!inspector.select_model("/tunnergp.glb").unwrap());
    let capture = inspector.capture().unwrap();
    assert_eq!(inspector.host().active_model(), Some("/low-poly_test_dummy.glb"));
    assert!(capture.values.iter().any(|v| *v == 1.0));
    assert_eq!(sink.0.borrow().artifacts.len(), 2);

    inspector.tick().unwrap();
    assert_eq!(inspector.host().active_model(), Some("/tunnergp.glb"));

    assert!(!inspector.drop_payload(&DragPayload::default()).unwrap());
    let payload = inspector.begin_drag("/medieval_combat_dummy.glb").unwrap();
    assert!(inspector.drop_payload(&payload).unwrap());
    inspector.tick().unwrap();
    assert_eq!(
        inspector.host().active_model(),
        Some("/medieval_combat_dummy.glb")
    );

    assert!(matches!(
        inspector.select_model("Unknown"),
        Err(DepthscopeError::ModelNotFound(_))
    ));

    inspector.shutdown().unwrap();
    assert_eq!(inspector.host().renderer().live_targets(), 0);
}

#[test]
fn test_raw_luma_contrast_at_default_camera() {
    let mut inspector = Inspector::new(
        SoftwareRenderer::new(128, 128),
        Box::new(ProceduralModels::new()),
        default_catalog(),
        CapturePreset::RawLuma.config(128, 128),
        Box::new(MemorySink::new()),
        (128, 128),
    )
    .unwrap();
    assert_eq!(inspector.host().camera(), &Camera::new(1.0));

    for (name, id) in DEFAULT_MODELS {
        inspector.select_model(id).unwrap();
        inspector.tick().unwrap();
        assert_eq!(inspector.host().active_model(), Some(id));

        let capture = inspector.capture().unwrap();
        let mut levels: Vec<u8> = capture
            .values
            .iter()
            .filter(|v| **v < 1.0)
            .map(|v| depthscope_render::value_to_byte(*v))
            .collect();
        levels.sort_unstable();
        levels.dedup();

        assert!(levels.len() >= 3, "{name}: depth levels {levels:?}");
        let spread = levels[levels.len() - 1] - levels[0];
        assert!(spread >= 64, "{name}: depth levels {levels:?}");
    }
}

/// Fails the first load of `flaky_id`, then defers to the procedural models.
struct FailOnceModels {
    flaky_id: &'static str,
    failed: bool,
    inner: ProceduralModels,
}

impl ModelSource for FailOnceModels {
    fn load(&mut self, model_id: &str) -> Result<SceneGraph> {
        if model_id == self.flaky_id && !self.failed {
            self.failed = true;
            return Err(DepthscopeError::ModelLoadFailed {
                model_id: model_id.to_string(),
                reason: "transient read error".into(),
            });
        }
        self.inner.load(model_id)
    }
}

#[test]
fn test_reselect_after_failed_load_retries() {
    let mut inspector = Inspector::new(
        SoftwareRenderer::new(8, 8),
        Box::new(FailOnceModels {
            flaky_id: "/tunnergp.glb",
            failed: false,
            inner: ProceduralModels::new(),
        }),
        default_catalog(),
        CaptureConfig::default().with_size(8, 8),
        Box::new(MemorySink::new()),
        (8, 8),
    )
    .unwrap();
    inspector.tick().unwrap();
    assert_eq!(inspector.host().active_model(), Some("/low-poly_test_dummy.glb"));

    assert!(inspector.select_model("Tunnergp").unwrap());
    assert!(inspector.tick().is_err());
    assert_eq!(inspector.host().active_model(), Some("/low-poly_test_dummy.glb"));
    assert_eq!(inspector.host().pending_model(), None);
    assert_eq!(inspector.selector().current(), Some("/tunnergp.glb"));

    // Same selection again queues another load
    assert!(inspector.select_model("Tunnergp").unwrap());
    assert_eq!(inspector.host().pending_model(), Some("/tunnergp.glb"));
    inspector.tick().unwrap();
    assert_eq!(inspector.host().active_model(), Some("/tunnergp.glb"));

    assert!(!inspector.select_model("Tunnergp").unwrap());
    let payload = inspector.begin_drag("/tunnergp.glb").unwrap();
    assert!(!inspector.drop_payload(&payload).unwrap());
}

proptest! {
    #[test]
    fn test_capture_length_and_raster_agree(w in 1u32..20, h in 1u32..20, gray in any::<u8>()) {
        let mut host = host_with(SceneGraph::new(), w, h);
        let config = CapturePreset::RawLuma.config(w, h).with_gray_background(gray);
        let pipeline = DepthCapturePipeline::new(host.renderer_mut(), config).unwrap();
        let frame = pipeline.capture_frame(&mut host).unwrap();

        prop_assert_eq!(frame.values.len(), (w * h) as usize);
        for (value, pixel) in frame.values.iter().zip(frame.raster.pixels()) {
            let byte = depthscope_render::value_to_byte(*value);
            prop_assert_eq!(byte, gray);
            prop_assert_eq!(pixel.0, [byte, byte, byte, 255]);
        }
    }
}
