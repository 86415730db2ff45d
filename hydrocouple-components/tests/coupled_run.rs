//! Coupled runs of the reference components.
//!
//! These tests drive all five components through the scheduler using configuration
//! and forcing files written to a temporary directory.

use approx::assert_relative_eq;
use hydrocouple_components::reference_models;
use hydrocouple_core::config::CouplingConfig;
use hydrocouple_core::errors::CouplingError;
use hydrocouple_core::handle::ModelKind;
use hydrocouple_core::scheduler::{ConfigPaths, Scheduler, SchedulerState};
use hydrocouple_core::standard_variables::*;
use hydrocouple_core::value::VariableValue;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

const HEADER: &str = "time,APCP_surface,DLWRF_surface,DSWRF_surface,PRES_surface,\
                      SPFH_2maboveground,TMP_2maboveground,UGRD_10maboveground,\
                      VGRD_10maboveground,precip_rate,TMP_ground_surface";

/// Options that differ between scenarios
struct Scenario {
    hours: usize,
    forcing_rows: usize,
    runoff_scheme: &'static str,
    soil_storage_model: &'static str,
    profile_soil_z: &'static str,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            hours: 24,
            forcing_rows: 24,
            runoff_scheme: "Schaake",
            soil_storage_model: "constant",
            profile_soil_z: "0.1,0.3,1.0,2.0",
        }
    }
}

/// A day of cold, occasionally wet weather over freezing ground
fn write_forcing(path: &Path, rows: usize) {
    let lines: Vec<String> = (0..rows)
        .map(|hour| {
            let rain = if hour % 6 == 0 { 0.002 } else { 0.0 };
            let sun = if (8..16).contains(&hour) { 250.0 } else { 0.0 };
            format!(
                "2015-12-01 {:02}:00:00,{},290.0,{},100500.0,0.003,276.0,1.5,-0.5,{},263.15",
                hour % 24,
                rain * 3600.0,
                sun,
                rain
            )
        })
        .collect();
    fs::write(path, format!("{}\n{}\n", HEADER, lines.join("\n"))).unwrap();
}

fn setup(scenario: &Scenario) -> (TempDir, ConfigPaths) {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let forcing_csv = root.join("forcing.csv");
    write_forcing(&forcing_csv, scenario.forcing_rows);

    let paths = ConfigPaths {
        runoff: root.join("runoff.config"),
        forcing: root.join("forcing.config"),
        evapotranspiration: root.join("pet.config"),
        freeze_thaw: root.join("sft.config"),
        soil_moisture_profile: root.join("smp.config"),
    };

    fs::write(
        &paths.runoff,
        format!(
            "max_storage=0.5[m]\n\
             initial_storage_fraction=0.4\n\
             surface_partitioning_scheme={}\n\
             time_step=1[h]\n",
            scenario.runoff_scheme
        ),
    )
    .unwrap();
    fs::write(
        &paths.forcing,
        format!("forcing_file={}\ntime_step=3600[s]\n", forcing_csv.display()),
    )
    .unwrap();
    fs::write(&paths.evapotranspiration, "priestley_taylor_alpha=1.26\n").unwrap();
    fs::write(
        &paths.freeze_thaw,
        format!(
            "forcing_file={}\n\
             end_time={}[h]\n\
             time_step=1[h]\n\
             soil_z=0.1,0.3,1.0,2.0\n\
             soil_temperature=273.0\n",
            forcing_csv.display(),
            scenario.hours
        ),
    )
    .unwrap();
    fs::write(
        &paths.soil_moisture_profile,
        format!(
            "soil_z={}\n\
             soil_storage_model={}\n\
             soil_storage_depth=0.5[m]\n",
            scenario.profile_soil_z, scenario.soil_storage_model
        ),
    )
    .unwrap();

    (dir, paths)
}

fn scalar(scheduler: &Scheduler, kind: ModelKind, key: &str) -> f64 {
    scheduler
        .models()
        .get_value(kind, key)
        .unwrap()
        .as_scalar()
        .unwrap()
}

#[test]
fn schaake_run_closes_water_balance() {
    let (_dir, paths) = setup(&Scenario::default());
    let mut scheduler = Scheduler::new(reference_models(), CouplingConfig::default());
    scheduler.initialize(&paths).unwrap();
    let summary = scheduler.run().unwrap();

    assert_eq!(summary.steps, 24);
    assert_eq!(scheduler.state(), SchedulerState::Finalized);
    assert!(summary.consistency.iter().all(|r| r.is_consistent()));

    let balance = &summary.mass_balance;
    assert_relative_eq!(balance.volume_in, 4.0 * 0.002 * 3.6, epsilon = 1e-12);
    assert!(balance.volume_runoff > 0.0);
    assert!(balance.is_balanced(), "residual {}", balance.residual());

    // Frozen ground reached the runoff model only in the Schaake form
    assert!(scalar(&scheduler, ModelKind::Runoff, VAR_ICE_FRACTION_SCHAAKE.name) > 0.0);
    assert_eq!(
        scalar(&scheduler, ModelKind::Runoff, VAR_ICE_FRACTION_XINANJIANG.name),
        0.0
    );
    assert_eq!(
        scheduler
            .models()
            .get_value(ModelKind::FreezeThaw, VAR_ICE_FRACTION_SCHEME.name)
            .unwrap(),
        VariableValue::Integer(1)
    );

    // Every model ran the full day
    for kind in ModelKind::INITIALIZATION_ORDER {
        assert_eq!(scheduler.models().get(kind).current_time(), 86400.0);
    }
}

#[test]
fn xinanjiang_run_with_layered_profile() {
    let (_dir, paths) = setup(&Scenario {
        runoff_scheme: "Xinanjiang",
        soil_storage_model: "layered",
        ..Scenario::default()
    });
    let mut scheduler = Scheduler::new(reference_models(), CouplingConfig::default());
    scheduler.initialize(&paths).unwrap();
    let summary = scheduler.run().unwrap();

    assert_eq!(summary.steps, 24);
    assert!(summary.mass_balance.is_balanced());

    assert!(scalar(&scheduler, ModelKind::Runoff, VAR_ICE_FRACTION_XINANJIANG.name) > 0.0);
    assert_eq!(
        scalar(&scheduler, ModelKind::Runoff, VAR_ICE_FRACTION_SCHAAKE.name),
        0.0
    );

    // The freeze-thaw model holds the profile built from the layered fractions
    let profile = scheduler
        .models()
        .get_value(ModelKind::FreezeThaw, VAR_SOIL_MOISTURE_PROFILE.name)
        .unwrap();
    assert_eq!(
        profile,
        scheduler
            .models()
            .get_value(ModelKind::SoilMoistureProfile, VAR_SOIL_MOISTURE_PROFILE.name)
            .unwrap()
    );
    assert_relative_eq!(profile.as_vector().unwrap()[0], 0.25);
}

#[test]
fn frozen_fraction_switched_off() {
    let (_dir, paths) = setup(&Scenario::default());
    let config = CouplingConfig {
        frozen_fraction: false,
        ..CouplingConfig::default()
    };
    let mut scheduler = Scheduler::new(reference_models(), config);
    scheduler.initialize(&paths).unwrap();
    scheduler.run().unwrap();

    assert_eq!(
        scalar(&scheduler, ModelKind::Runoff, VAR_ICE_FRACTION_SCHAAKE.name),
        0.0
    );
    assert!(scalar(&scheduler, ModelKind::FreezeThaw, VAR_ICE_FRACTION_SCHAAKE.name) > 0.0);
}

#[test]
fn short_ground_temperature_series() {
    let (_dir, paths) = setup(&Scenario {
        hours: 48,
        ..Scenario::default()
    });
    let mut scheduler = Scheduler::new(reference_models(), CouplingConfig::default());
    let err = scheduler.initialize(&paths).unwrap_err();

    assert!(matches!(
        err,
        CouplingError::InsufficientForcing {
            available: 24,
            required: 48
        }
    ));
    assert_eq!(scheduler.state(), SchedulerState::Uninitialized);
    assert_eq!(
        scheduler.models().get(ModelKind::Forcing).current_time(),
        0.0
    );
}

#[test]
fn profile_cells_must_match_freeze_thaw_cells() {
    let (_dir, paths) = setup(&Scenario {
        profile_soil_z: "0.1,0.3,1.0",
        ..Scenario::default()
    });
    let mut scheduler = Scheduler::new(reference_models(), CouplingConfig::default());
    scheduler.initialize(&paths).unwrap();
    let err = scheduler.step().unwrap_err();

    assert!(matches!(
        err,
        CouplingError::LengthMismatch {
            expected: 4,
            found: 3,
            ..
        }
    ));
}
