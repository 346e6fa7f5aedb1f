//! Loading configuration files from disk.

use satsim_common::{ChannelType, LinkKey, MacAddress, SimTime};
use satsim_fading::{FaderFamily, FadingInputs, FadingMode, ParameterProvider};
use satsim_model::{ModelError, SimConfig};
use satsim_trace::TraceKind;
use std::fs;

const DOC_EXAMPLE: &str = r#"
seed: 42
fading:
  mode: markov
  initial_state: 0
  min_dwell_s: 0.01
  velocity:
    reference_velocity_mps: 10.0
    min_velocity_mps: 1.0
  buckets:
    - elevation_deg: 30
      transitions: [[0.9, 0.1], [0.2, 0.8]]
      mean_dwell_s: [2.0, 0.5]
    - elevation_deg: 70
      transitions: [[0.95, 0.05], [0.3, 0.7]]
      mean_dwell_s: [3.0, 0.4]
  fader:
    family: rayleigh
    parameters:
      - [[10, 30], [10, 60]]
      - [[12, 30], [12, 60]]
frame:
  symbol_rate_baud: 25.0e6
  pilots: true
trace:
  root: sim_root
  wrap_around: false
"#;

#[test]
fn test_documented_example_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sim.yaml");
    fs::write(&path, DOC_EXAMPLE).unwrap();

    let model = SimConfig::from_file(&path).unwrap().build().unwrap();
    assert_eq!(model.seed, 42);
    assert_eq!(model.markov.state_count(), 2);
    assert_eq!(model.markov.fader().family(), FaderFamily::Rayleigh);
    assert_eq!(model.interference_cache().unwrap().kind(), TraceKind::Interference);

    let mut fading = model.fading_container(FadingInputs::constant(50.0, 3.0)).unwrap();
    assert_eq!(fading.mode(), FadingMode::Markov);
    let key = LinkKey::new(MacAddress::from_index(1), ChannelType::ReturnUser);
    assert!(fading.get_fading(&key, SimTime::from_millis(5)).is_ok());
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        SimConfig::from_file(dir.path().join("absent.yaml")),
        Err(ModelError::Io { .. })
    ));
}

#[test]
fn test_bucket_shape_mismatch_rejected() {
    // Two buckets against the built-in four-bucket fader table.
    let yaml = r#"
fading:
  buckets:
    - elevation_deg: 30
      transitions: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
      mean_dwell_s: [1.0, 1.0, 1.0]
    - elevation_deg: 60
      transitions: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
      mean_dwell_s: [1.0, 1.0, 1.0]
"#;
    let config = SimConfig::from_yaml_str(yaml).unwrap();
    let err = config.build().unwrap_err();
    assert!(matches!(err, ModelError::Fading(ref e) if e.is_configuration()));
}

#[test]
fn test_trace_mode_builds_trace_container() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = format!(
        "fading:\n  mode: trace\ntrace:\n  root: {}\n  wrap_around: true\n",
        dir.path().display()
    );
    let model = SimConfig::from_yaml_str(&yaml).unwrap().build().unwrap();

    let key = LinkKey::new(MacAddress::from_index(2), ChannelType::ForwardUser);
    let path = TraceKind::Fading.file_path(dir.path(), &key);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "0 -4.0\n").unwrap();

    let mut fading = model.fading_container(FadingInputs::constant(0.0, 0.0)).unwrap();
    assert_eq!(fading.mode(), FadingMode::Trace);
    // Wrap-around keeps a one-row trace alive.
    for _ in 0..3 {
        assert_eq!(fading.get_fading(&key, SimTime::ZERO).unwrap(), -4.0);
    }
}
