use glam::DVec3;
use skinweights_core::editor::{mirror, transfer, MirrorOptions, MirrorSide};
use skinweights_core::scene::{MemoryBinding, MemoryScene};
use skinweights_core::serializer::{self, ImportMode};
use skinweights_core::{session, Silent, SkinError, SkinHost, SkinRecord, SkinScene};

fn grid() -> Vec<DVec3> {
    let mut points = Vec::new();
    for x in [-1.5, -0.5, 0.0, 0.5, 1.5] {
        for y in [0.0, 1.25] {
            points.push(DVec3::new(x, y, 0.25));
        }
    }
    points
}

fn influences() -> Vec<String> {
    ["rig:L_arm", "rig:R_arm", "rig:spine"].iter().map(|s| s.to_string()).collect()
}

fn skinned() -> MemoryBinding {
    let rows = grid()
        .iter()
        .map(|p| {
            let l = if p.x > 0.0 { 0.6 } else { 0.1 };
            let r = if p.x < 0.0 { 0.6 } else { 0.1 };
            vec![l, r, 1.0 - l - r]
        })
        .collect();
    let mut b =
        MemoryBinding::new("skinCluster1", grid(), influences()).with_weights(rows).unwrap();
    for v in 0..b.vertex_count() {
        b.set_blend_weight(v, v as f64 / 10.0);
    }
    b
}

/// Deterministic full-precision values in `[0, 1)`.
fn noise(seed: u64) -> impl FnMut() -> f64 {
    let mut state = seed;
    move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state >> 11) as f64 / (1u64 << 53) as f64
    }
}

#[test]
fn file_round_trip_restores_weights_and_blend_weights() {
    let mut next = noise(0x9e37_79b9_7f4a_7c15);
    let points: Vec<DVec3> = (0..500).map(|i| DVec3::new(i as f64 * 0.01, next(), 0.0)).collect();
    let rows = (0..points.len())
        .map(|_| {
            let a = next();
            let b = (1.0 - a) * next();
            vec![a, b, 1.0 - a - b]
        })
        .collect();
    let mut original = MemoryBinding::new("skinCluster1", points.clone(), influences())
        .with_weights(rows)
        .unwrap();
    for v in 0..original.vertex_count() {
        original.set_blend_weight(v, next());
    }

    let dir = tempfile::tempdir().unwrap();
    let path = serializer::export_to_path(&original, dir.path().join("body")).unwrap();
    assert!(path.to_string_lossy().ends_with("body.skinData"));

    let mut scene = MemoryScene::new();
    scene.add_mesh("body", points);
    let report = session::load_and_import(
        &mut scene,
        "body",
        &path,
        ImportMode::Indexed,
        Some("rig"),
        &mut Silent,
    )
    .unwrap();
    assert!(report.is_complete());

    let restored = scene.binding("body").unwrap();
    assert_eq!(restored.influences(), original.influences());
    for v in 0..original.vertex_count() {
        assert_eq!(restored.weights(v), original.weights(v), "vertex {}", v);
        assert_eq!(restored.blend_weight(v), original.blend_weight(v), "vertex {}", v);
    }
}

#[test]
fn vertex_count_mismatch_writes_nothing() {
    let record = serializer::export(&skinned());
    let mut small = MemoryBinding::new("skin", grid()[..4].to_vec(), influences());
    let before = small.clone();
    let err =
        serializer::import(&mut small, &record, ImportMode::Indexed, &mut Silent).unwrap_err();
    assert!(matches!(err, SkinError::VertCountMismatch { expected: 4, found: 10 }));
    assert_eq!(small, before);
}

#[test]
fn zero_threshold_matches_exact_keys_only() {
    let record = serializer::export(&skinned());
    let mut points = grid();
    points[8].x += 0.0004; // same truncated key
    points[9].x += 0.01; // different key
    let mut target = MemoryBinding::new("skin", points, influences());

    let mode = ImportMode::WorldSpace { threshold: 0.0 };
    let report = serializer::import(&mut target, &record, mode, &mut Silent).unwrap();
    assert_eq!(report.unmatched_vertices, vec![9]);
    assert_eq!(report.written, 9);
    for (a, b) in target.weights(8).iter().zip(skinned().weights(8)) {
        assert!((a - b).abs() < 1e-12);
    }
}

#[test]
fn transfer_preserves_row_sums() {
    for percent in [0.0, 12.5, 50.0, 99.0, 100.0] {
        let mut b = skinned();
        let sums: Vec<f64> = (0..b.vertex_count()).map(|v| b.weights(v).iter().sum()).collect();
        transfer(&mut b, "L_arm", "spine", percent, None).unwrap();
        for (v, sum) in sums.iter().enumerate() {
            let after: f64 = b.weights(v).iter().sum();
            assert!((after - sum).abs() < 1e-9, "percent {} vertex {}", percent, v);
        }
    }
}

#[test]
fn mirror_swaps_left_and_right_columns() {
    let mut b = skinned();
    let options = MirrorOptions { side: MirrorSide::Both, ..Default::default() };
    let report = mirror(&mut b, &options, &mut Silent).unwrap();
    assert!(report.is_complete());

    let original = skinned();
    let points = grid();
    for (v, p) in points.iter().enumerate() {
        let row = b.weights(v);
        if p.x == 0.0 {
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);
            continue;
        }
        let twin = points.iter().position(|q| q.x == -p.x && q.y == p.y).unwrap();
        let src = original.weights(twin);
        // spine has no side marker and keeps its column
        assert_eq!(row, vec![src[1], src[0], src[2]]);
    }
}

#[test]
fn legacy_record_file_imports() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.skinData");
    std::fs::write(
        &path,
        r#"{
            "name": "skinCluster7",
            "weights": {"L_arm": [1.0, 0.25], "R_arm": [0.0, 0.75]},
            "blendWeights": [0.0, 0.0],
            "worldSpace": {"[0.0, 0.0, 0.0]": "[1.0, 0.0]", "[1.0, 0.0, 0.0]": "[0.25, 0.75]"},
            "worldSpaceJoints": "['L_arm', 'R_arm']",
            "skinningMethod": 0,
            "normalizeWeights": true
        }"#,
    )
    .unwrap();
    let record = SkinRecord::load(&path).unwrap();

    let mut scene = MemoryScene::new();
    scene.add_mesh("prop", vec![DVec3::new(1.0, 0.0, 0.0), DVec3::ZERO]);
    let report = session::import_node(
        &mut scene,
        "prop",
        &record,
        ImportMode::WorldSpace { threshold: 0.0 },
        None,
        &mut Silent,
    )
    .unwrap();
    assert!(report.is_complete());
    let b = scene.binding("prop").unwrap();
    assert_eq!(b.name(), "skinCluster7");
    assert_eq!(b.weights(0), vec![0.25, 0.75]);
    assert_eq!(b.weights(1), vec![1.0, 0.0]);
}
