extern crate yolo_detect;

use std::sync::Arc;
use approx::assert_relative_eq;
use yolo_detect::common::{BBox, Frame, Prediction};
use yolo_detect::data::{DetectionRequest, DetectorConfig, LetterboxPolicy};
use yolo_detect::detection_runners::YoloDetector;
use yolo_detect::DetectError;


use mock_engine::{cat_dog, detector, MockEngine};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn assert_box(actual: &BBox, expected: (f32, f32, f32, f32)) {
    assert_relative_eq!(actual.x1, expected.0, epsilon = 1e-3);
    assert_relative_eq!(actual.y1, expected.1, epsilon = 1e-3);
    assert_relative_eq!(actual.x2, expected.2, epsilon = 1e-3);
    assert_relative_eq!(actual.y2, expected.3, epsilon = 1e-3);
}

#[test]
fn detection() {
    init_logger();
    let engine = MockEngine::fixed(vec![vec![100., 100., 50., 50., 0.9, 0.1, 0.8]]);
    let seen = engine.seen();
    let yolo = detector(engine);

    let result = yolo.detect(&Frame::filled(1280, 720, [40, 80, 120]), 0.5).unwrap();

    assert_eq!(result.len(), 1);
    let p: &Prediction = &result[0];
    assert_eq!(p.label(), "dog");
    assert_eq!(p.class_id(), 1);
    assert_relative_eq!(p.confidence(), 0.72, epsilon = 1e-6);
    // letterbox box (75, 75, 125, 125), 12 px of padding above and below
    assert_box(p.bbox(), (150., 126., 250., 226.));

    assert_eq!(*seen.lock(), vec![vec![1, 3, 384, 640]]);
}

#[test]
fn fixed_engine_never_gets_stride_padding() {
    let engine = MockEngine::fixed(vec![]);
    let seen = engine.seen();
    let yolo = YoloDetector::with_engine(engine, cat_dog().with_letterbox(LetterboxPolicy::Auto)).unwrap();

    for (w, h) in [(1280, 720), (800, 600), (300, 300), (641, 1000)] {
        assert!(yolo.detect(&Frame::filled(w, h, [0, 0, 0]), 0.4).unwrap().is_empty());
    }
    assert!(seen.lock().iter().all(|s| s == &vec![1, 3, 384, 640]));
}

#[test]
fn dynamic_engine_gets_stride_padding() {
    let engine = MockEngine::dynamic(vec![]);
    let seen = engine.seen();
    let config = cat_dog().with_model_width(640).with_model_height(640);
    let yolo = YoloDetector::with_engine(engine, config).unwrap();

    yolo.detect(&Frame::filled(1280, 960, [0, 0, 0]), 0.4).unwrap();
    yolo.detect(&Frame::filled(320, 200, [0, 0, 0]), 0.4).unwrap();

    // the larger frame is auto padded, the smaller one stretched to fill
    assert_eq!(*seen.lock(), vec![vec![1, 3, 480, 640], vec![1, 3, 640, 640]]);
}

#[test]
fn stretched_frame_maps_back_per_axis() {
    let engine = MockEngine::fixed(vec![vec![320., 192., 64., 38.4, 0.95, 0.9, 0.05]]);
    let yolo = detector(engine);

    // smaller than the target: stretched to 640x384 without padding
    let result = yolo.detect_default(&Frame::filled(320, 240, [9, 9, 9])).unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].label(), "cat");
    assert_box(result[0].bbox(), (144., 108., 176., 132.));
}

#[test]
fn class_aware_suppression() {
    let engine = MockEngine::fixed(vec![
        vec![200., 200., 80., 80., 0.9, 0.9, 0.0],
        vec![200., 200., 80., 80., 0.9, 0.0, 0.8],
        vec![204., 202., 80., 80., 0.8, 0.9, 0.0],
        vec![500., 300., 40., 40., 0.7, 0.9, 0.0],
    ]);
    let yolo = detector(engine);

    let result = yolo.detect(&Frame::filled(640, 384, [0, 0, 0]), 0.4).unwrap();

    let labels: Vec<&str> = result.iter().map(|p| p.label()).collect();
    assert_eq!(labels, vec!["cat", "dog", "cat"]);
    assert!(result.windows(2).all(|w| w[0].confidence() >= w[1].confidence()));
    assert_box(result[0].bbox(), (160., 160., 240., 240.));
    assert_box(result[2].bbox(), (480., 280., 520., 320.));
}

#[test]
fn confidence_gates_objectness_and_class_score() {
    let engine = MockEngine::fixed(vec![
        vec![100., 100., 20., 20., 0.45, 1.0, 0.0],
        vec![300., 100., 20., 20., 0.9, 0.55, 0.0],
        vec![500., 100., 20., 20., 0.9, 0.9, 0.0],
    ]);
    let yolo = detector(engine);
    let frame = Frame::filled(640, 384, [0, 0, 0]);

    assert_eq!(yolo.detect(&frame, 0.4).unwrap().len(), 3);
    // 0.9 * 0.55 falls below 0.5, objectness 0.45 as well
    assert_eq!(yolo.detect(&frame, 0.5).unwrap().len(), 1);
    assert_eq!(yolo.detect(&frame, 0.95).unwrap().len(), 0);
}

#[test]
fn labels_from_model_metadata() {
    let engine = MockEngine::fixed(vec![vec![10., 10., 4., 4., 0.9, 0.0, 0.0, 0.9]]).with_names(&["a", "b", "c"]);
    let yolo = YoloDetector::with_engine(engine, DetectorConfig::new()).unwrap();

    assert_eq!(yolo.labels().names(), &["a", "b", "c"]);
    let result = yolo.detect(&Frame::filled(640, 384, [0, 0, 0]), 0.4).unwrap();
    assert_eq!(result[0].label(), "c");
}

#[test]
fn labels_default_to_coco() {
    let yolo = YoloDetector::with_engine(MockEngine::fixed(vec![]), DetectorConfig::new()).unwrap();
    assert_eq!(yolo.labels().len(), 80);
    assert_eq!(yolo.labels().get(0).unwrap(), "person");
}

#[test]
fn labels_from_file() {
    let path = std::env::temp_dir().join(format!("yolo_detect_labels_{}.txt", std::process::id()));
    std::fs::write(&path, "fox\n\nbadger\n").unwrap();

    let config = DetectorConfig::new().with_labels_path(path.to_str().unwrap());
    let yolo = YoloDetector::with_engine(MockEngine::fixed(vec![]), config).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(yolo.labels().names(), &["fox", "badger"]);
}

#[test]
fn user_labels_must_match_model_metadata() {
    let engine = MockEngine::fixed(vec![]).with_names(&["a", "b", "c"]);
    let result = YoloDetector::with_engine(engine, cat_dog());
    assert!(matches!(result, Err(DetectError::Config(_))));
}

#[test]
fn shared_between_threads() {
    let engine = MockEngine::fixed(vec![
        vec![100., 100., 50., 50., 0.9, 0.1, 0.8],
        vec![400., 200., 60., 30., 0.8, 0.7, 0.2],
    ]);
    let seen = engine.seen();
    let yolo = Arc::new(detector(engine));
    let frame = Frame::filled(1280, 720, [1, 2, 3]);
    let expected = yolo.detect(&frame, 0.4).unwrap();

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..5 {
                    assert_eq!(yolo.detect(&frame, 0.4).unwrap(), expected);
                }
            });
        }
    });
    assert_eq!(seen.lock().len(), 21);
}

#[test]
fn detection_worker() {
    init_logger();
    let yolo = Arc::new(detector(MockEngine::fixed(vec![vec![100., 100., 50., 50., 0.9, 0.1, 0.8]])));
    let (send_state, handle) = yolo_detect::spawn_detector_worker(Arc::clone(&yolo), 4).unwrap();

    let frame = Frame::filled(1280, 720, [0, 0, 0]);
    let result = send_state.detect(DetectionRequest::new(frame.clone())).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].label(), "dog");

    let result = send_state.detect(DetectionRequest::new(frame).with_confidence(0.8)).unwrap();
    assert!(result.is_empty());

    drop(send_state);
    handle.join().unwrap();
}

#[test]
fn warm_up_runs_dry_detections() {
    let engine = MockEngine::fixed(vec![]);
    let seen = engine.seen();
    let yolo = YoloDetector::with_engine(engine, cat_dog().with_dry_run(3)).unwrap();

    yolo_detect::warm_up(&yolo).unwrap();
    assert_eq!(seen.lock().len(), 3);
}

#[test]
fn predictions_serialize_to_json() {
    let yolo = detector(MockEngine::fixed(vec![vec![100., 100., 50., 50., 0.9, 0.1, 0.8]]));
    let result = yolo_detect::run_detection(&yolo, &Frame::filled(640, 384, [0, 0, 0]), 0.4).unwrap();

    let json = serde_json::to_string(&result).unwrap();
    let back: Vec<Prediction> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result);
    assert!(json.contains("\"label\":\"dog\""));
}
