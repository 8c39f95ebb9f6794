//! Integration tests for routing-state persistence.
//!
//! Exercises full session save/restore against a live router, preset files
//! on disk via tempfile, and rejection of corrupt stored data.

use tempfile::tempdir;

use matriz_config::{RoutingPreset, StoredBank, factory_presets, load_state, save_state};
use matriz_core::{ChannelBuffer, MatrixState, RouterNode};

fn state_with(pairs: &[(usize, usize)]) -> MatrixState {
    let mut state = MatrixState::new(4, 4);
    for &(s, d) in pairs {
        state.connect(s, d).unwrap();
    }
    state
}

/// Renders until the router settles, so staged state becomes active.
fn settle(router: &mut RouterNode) {
    let input = ChannelBuffer::new(router.sources(), 64);
    let mut output = ChannelBuffer::new(router.destinations(), 64);
    let mut midi_out = Vec::new();
    for _ in 0..(router.fade_length_samples() as usize / 64 + 2) {
        midi_out.clear();
        router.render(&input, &mut output, &[], &mut midi_out);
    }
    assert!(!router.is_transitioning());
}

#[test]
fn session_roundtrip_preserves_everything() {
    let mut router = RouterNode::new(4, 4);
    router.set_sample_rate(48000.0);

    router.set_matrix(&state_with(&[(0, 0), (1, 1)])).unwrap();
    settle(&mut router);
    router.add_program("straight", Some(20));

    router.set_matrix(&state_with(&[(0, 3), (3, 0)])).unwrap();
    settle(&mut router);
    router.add_program("corners", None);
    router.set_current_program(1).unwrap();
    settle(&mut router);

    let bytes = save_state(&router).unwrap();

    let mut restored = RouterNode::new(4, 4);
    restored.set_sample_rate(48000.0);
    load_state(&mut restored, &bytes).unwrap();
    settle(&mut restored);

    assert_eq!(restored.bank().len(), 2);
    assert_eq!(restored.current_program(), 1);
    assert_eq!(restored.program_name(0), "straight");
    assert_eq!(restored.bank().get(0).unwrap().midi_program, Some(20));
    assert_eq!(restored.matrix_state(), router.matrix_state());

    // The restored router actually routes: program 0 recalls the straight
    // matrix.
    assert!(restored.handle_program_change(20));
    settle(&mut restored);
    assert_eq!(restored.matrix_state(), &state_with(&[(0, 0), (1, 1)]));
}

#[test]
fn restore_stages_through_the_crossfade_path() {
    let mut router = RouterNode::new(4, 4);
    router.set_sample_rate(48000.0);

    let mut source = RouterNode::new(4, 4);
    source.set_matrix(&state_with(&[(2, 2)])).unwrap();
    source.reset();
    let bytes = save_state(&source).unwrap();

    load_state(&mut router, &bytes).unwrap();
    // The restored matrix arrives as a pending transition, not a snap.
    assert!(router.is_transitioning());
    settle(&mut router);
    assert!(router.matrix_state().is_connected(2, 2));
}

#[test]
fn mismatched_session_is_rejected_and_router_untouched() {
    let mut small = RouterNode::new(2, 2);
    small.set_matrix(&{
        let mut s = MatrixState::new(2, 2);
        s.connect(0, 0).unwrap();
        s
    })
    .unwrap();
    small.reset();

    let mut big = RouterNode::new(4, 4);
    big.set_matrix(&state_with(&[(3, 3)])).unwrap();
    big.reset();
    let bytes = save_state(&big).unwrap();

    assert!(load_state(&mut small, &bytes).is_err());
    assert!(small.matrix_state().is_connected(0, 0));
    assert_eq!(small.bank().len(), 0);
}

#[test]
fn corrupt_byte_block_is_rejected() {
    let mut router = RouterNode::new(4, 4);
    assert!(load_state(&mut router, b"{\"programs\": 12}").is_err());
    assert!(load_state(&mut router, &[0xFF, 0x00, 0x13]).is_err());
}

#[test]
fn tampered_cells_are_rejected() {
    let mut source = RouterNode::new(4, 4);
    source.set_matrix(&state_with(&[(1, 1)])).unwrap();
    source.reset();

    let mut stored = StoredBank::capture(&source);
    stored.active.cells.push((9, 9));
    let bytes = stored.to_bytes().unwrap();

    let mut router = RouterNode::new(4, 4);
    assert!(load_state(&mut router, &bytes).is_err());
    assert!(router.matrix_state().is_empty());
}

#[test]
fn preset_files_roundtrip_on_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("presets").join("corners.toml");

    let preset = RoutingPreset::new("Corners", &state_with(&[(0, 3), (3, 0)]))
        .with_description("Outer corners crossed");
    preset.save(&path).unwrap();

    let loaded = RoutingPreset::load(&path).unwrap();
    assert_eq!(loaded, preset);

    // A loaded preset activates on a router of matching dimensions.
    let mut router = RouterNode::new(4, 4);
    router.set_matrix(&loaded.to_state().unwrap()).unwrap();
    router.reset();
    assert!(router.matrix_state().is_connected(0, 3));
    assert!(router.matrix_state().is_connected(3, 0));
}

#[test]
fn missing_preset_file_reports_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nope.toml");
    let err = RoutingPreset::load(&path).unwrap_err();
    assert!(err.to_string().contains("nope.toml"));
}

#[test]
fn factory_presets_activate_on_matching_router() {
    let mut router = RouterNode::new(4, 4);
    for preset in factory_presets(4, 4) {
        router.set_matrix(&preset.to_state().unwrap()).unwrap();
        router.reset();
    }
    // Last one applied is Mono Sum.
    for s in 0..4 {
        assert!(router.matrix_state().is_connected(s, 0));
    }
}
