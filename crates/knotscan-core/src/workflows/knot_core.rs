use crate::core::io::Structure;
use crate::core::models::core_range::KnotCore;
use crate::core::oracle::traits::InvariantOracle;
use crate::engine::config::KnotCoreConfig;
use crate::engine::error::EngineError;
use crate::engine::tasks::knot_core;
use tracing::{info, instrument};

/// Knot core of a single structure, in the structure's own residue numbering.
///
/// Returns `Ok(None)` when the structure is unknotted or its knot is not confirmed
/// with the configured cutoff.
#[instrument(skip_all, name = "knot_core_workflow")]
pub fn run(
    structure: &Structure,
    oracle: &dyn InvariantOracle,
    config: &KnotCoreConfig,
) -> Result<Option<KnotCore>, EngineError> {
    config.validate()?;
    let core = knot_core::locate(
        oracle,
        &structure.segment(),
        &config.closure,
        &config.localizer,
    )?;
    match &core {
        Some(core) => info!(core = %core, "Knot core found."),
        None => info!("Structure carries no knot."),
    }
    Ok(core)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::knot::KnotType;
    use crate::engine::config::ConfigError;
    use crate::engine::testing::{SyntheticOracle, synthetic_trajectory};

    fn structure(first_index: usize) -> Structure {
        let trajectory = synthetic_trajectory(1, 150);
        Structure {
            points: trajectory.frames()[0].points().to_vec(),
            first_index,
        }
    }

    #[test]
    fn finds_the_core_of_a_knotted_structure() {
        let oracle = SyntheticOracle::new(KnotType::Trefoil, 0..1, (30, 100));
        let core = run(&structure(0), &oracle, &KnotCoreConfig::default()).unwrap();
        assert_eq!(core, Some(KnotCore::new(30, 100)));
    }

    #[test]
    fn result_follows_the_file_numbering() {
        // The oracle sees coordinates only, so shifting the numbering shifts the core.
        let oracle = SyntheticOracle::new(KnotType::Trefoil, 0..1, (30, 100));
        let core = run(&structure(5), &oracle, &KnotCoreConfig::default()).unwrap();
        assert_eq!(core, Some(KnotCore::new(35, 105)));
    }

    #[test]
    fn unknotted_structure_has_no_core() {
        let oracle = SyntheticOracle::new(KnotType::Trefoil, 0..0, (30, 100));
        assert_eq!(run(&structure(0), &oracle, &KnotCoreConfig::default()).unwrap(), None);
    }

    #[test]
    fn invalid_cutoff_is_rejected() {
        let oracle = SyntheticOracle::new(KnotType::Trefoil, 0..1, (30, 100));
        let mut config = KnotCoreConfig::default();
        config.localizer.cutoff = 0.0;
        assert!(matches!(
            run(&structure(0), &oracle, &config),
            Err(EngineError::Config(ConfigError::InvalidParameter { name: "cutoff", .. }))
        ));
    }
}
