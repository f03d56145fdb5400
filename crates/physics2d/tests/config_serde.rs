#![cfg(feature = "serde")]

use physics2d::{Vec2, WorldConfig};

#[test]
fn config_round_trips_through_json() -> anyhow::Result<()> {
    let config = WorldConfig::new(Vec2::new(0.0, -3.7), 1.0 / 120.0)
        .with_iterations(12, 4)
        .without_sleeping();
    let json = serde_json::to_string(&config)?;
    let back: WorldConfig = serde_json::from_str(&json)?;
    assert_eq!(back, config);
    back.validate()?;
    Ok(())
}

#[test]
fn missing_fields_take_defaults() -> anyhow::Result<()> {
    let config: WorldConfig = serde_json::from_str(r#"{ "timestep": 0.01 }"#)?;
    assert!((config.timestep - 0.01).abs() < 1e-15);
    assert_eq!(config.gravity, WorldConfig::default().gravity);
    assert_eq!(config.solver, WorldConfig::default().solver);
    assert!(config.sleep.enabled);
    Ok(())
}

#[test]
fn invalid_values_survive_parsing_but_fail_validation() -> anyhow::Result<()> {
    let config: WorldConfig = serde_json::from_str(r#"{ "solver_iterations": 0 }"#)?;
    assert!(config.validate().is_err());
    Ok(())
}
