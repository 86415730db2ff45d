//! End to end runs through the library entry point and the binary.

use hydrocouple_core::errors::CouplingError;
use hydrocouple_core::scheduler::ConfigPaths;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::{tempdir, TempDir};

const HEADER: &str = "time,APCP_surface,DLWRF_surface,DSWRF_surface,PRES_surface,\
                      SPFH_2maboveground,TMP_2maboveground,UGRD_10maboveground,\
                      VGRD_10maboveground,precip_rate,TMP_ground_surface";

/// Configuration files for the reference models reading the given forcing rows
fn setup(ground_rows: &[&str]) -> (TempDir, ConfigPaths) {
    let dir = tempdir().unwrap();
    let root = dir.path();

    let csv = root.join("forcing.csv");
    fs::write(&csv, format!("{}\n{}\n", HEADER, ground_rows.join("\n"))).unwrap();

    let paths = ConfigPaths {
        runoff: root.join("runoff.config"),
        forcing: root.join("forcing.config"),
        evapotranspiration: root.join("pet.config"),
        freeze_thaw: root.join("sft.config"),
        soil_moisture_profile: root.join("smp.config"),
    };
    fs::write(&paths.runoff, "surface_partitioning_scheme=Schaake\n").unwrap();
    fs::write(&paths.forcing, format!("forcing_file={}\n", csv.display())).unwrap();
    fs::write(&paths.evapotranspiration, "# defaults\n").unwrap();
    fs::write(
        &paths.freeze_thaw,
        format!(
            "forcing_file={}\nend_time=7200[s]\ntime_step=3600[s]\n",
            csv.display()
        ),
    )
    .unwrap();
    fs::write(&paths.soil_moisture_profile, "soil_storage_model=constant\n").unwrap();

    (dir, paths)
}

/// Two hours of forcing with ground temperatures of -5.0 C and -3.2 C
const TWO_HOURS: [&str; 2] = [
    "2015-12-01 00:00:00,0.0,280.0,0.0,101000.0,0.002,268.0,1.0,0.0,0.0,268.15",
    "2015-12-01 01:00:00,1.8,280.0,0.0,101000.0,0.002,268.5,1.0,0.0,0.0005,269.95",
];

fn paths_as_args(paths: &ConfigPaths) -> Vec<&Path> {
    vec![
        paths.runoff.as_path(),
        paths.forcing.as_path(),
        paths.evapotranspiration.as_path(),
        paths.freeze_thaw.as_path(),
        paths.soil_moisture_profile.as_path(),
    ]
}

#[test]
fn two_step_run() {
    let (_dir, paths) = setup(&TWO_HOURS);
    let config = hydrocouple::load_config(None).unwrap();
    let summary = hydrocouple::run(&paths, config).unwrap();

    assert_eq!(summary.steps, 2);
    assert_eq!(summary.consistency.len(), 2);
    assert_eq!(summary.consistency[1].step, 1);
    assert!(summary.mass_balance.is_balanced());
    assert!(summary.mass_balance.volume_in > 0.0);
}

#[test]
fn single_value_series_aborts() {
    let (_dir, paths) = setup(&TWO_HOURS[..1]);
    let err = hydrocouple::run(&paths, hydrocouple::load_config(None).unwrap()).unwrap_err();
    assert!(matches!(
        err,
        CouplingError::InsufficientForcing {
            available: 1,
            required: 2
        }
    ));
}

#[test]
fn missing_configuration_file() {
    let (dir, mut paths) = setup(&TWO_HOURS);
    paths.runoff = dir.path().join("missing.config");
    let err = hydrocouple::run(&paths, hydrocouple::load_config(None).unwrap()).unwrap_err();
    assert!(matches!(err, CouplingError::Io { .. }));
}

#[test]
fn coupling_config_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("coupling.toml");
    fs::write(
        &path,
        "frozen_fraction = false\n[consistency]\npolicy = \"halt\"\n",
    )
    .unwrap();

    let config = hydrocouple::load_config(Some(path.as_path())).unwrap();
    assert!(!config.frozen_fraction);

    fs::write(&path, "frozen_fraction = \"yes\"\n").unwrap();
    assert!(hydrocouple::load_config(Some(path.as_path())).is_err());
}

#[test]
fn binary_runs_to_completion() {
    let (dir, paths) = setup(&TWO_HOURS);
    let coupling = dir.path().join("coupling.toml");
    fs::write(&coupling, "verbosity = 1\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_hydrocouple"))
        .args(paths_as_args(&paths))
        .arg("--coupling-config")
        .arg(&coupling)
        .env_remove("RUST_LOG")
        .output()
        .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{}", stdout);
    assert!(stdout.contains("Mass balance closed"), "{}", stdout);
    assert!(stdout.contains("Runoff storage"), "{}", stdout);
}

#[test]
fn binary_usage_error() {
    let (_dir, paths) = setup(&TWO_HOURS);

    let output = Command::new(env!("CARGO_BIN_EXE_hydrocouple"))
        .args(&paths_as_args(&paths)[..2])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"), "{}", stdout);
}

#[test]
fn binary_reports_failure() {
    let (_dir, paths) = setup(&TWO_HOURS[..1]);

    let output = Command::new(env!("CARGO_BIN_EXE_hydrocouple"))
        .args(paths_as_args(&paths))
        .env_remove("RUST_LOG")
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Forcing series has 1 values"), "{}", stdout);
}
