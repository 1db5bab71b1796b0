//! Farm configuration loading for the demo session.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use furrow_core::{CropConfig, CropKind, HarvestEffect, StageVisual, WorldConfig};
use serde::Deserialize;

/// Complete farm setup: world parameters plus the plantable crop kinds.
#[derive(Debug, Deserialize)]
pub(crate) struct FarmConfig {
    /// Grid dimensions, cell geometry, and starting balance.
    pub(crate) world: WorldConfig,
    /// Per-kind crop constants.
    pub(crate) crops: Vec<CropConfig>,
}

impl FarmConfig {
    /// Loads a farm configuration from a JSON file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading farm config at {}", path.display()))?;
        let config: FarmConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing farm config at {}", path.display()))?;
        if config.crops.is_empty() {
            anyhow::bail!("farm config at {} defines no crops", path.display());
        }
        if config.world.cell_count() == 0 {
            anyhow::bail!("farm config at {} defines an empty grid", path.display());
        }
        Ok(config)
    }

    /// Built-in farm used when no configuration file is provided: an
    /// 8 by 6 grid, 100 starting money, corn and tomato.
    pub(crate) fn default_farm() -> Self {
        Self {
            world: WorldConfig::new(8, 6, 1.0, 100, HarvestEffect::new("harvest_burst")),
            crops: vec![
                CropConfig::new(
                    CropKind::Corn,
                    10,
                    25,
                    3,
                    2,
                    [
                        StageVisual::new("corn_seed"),
                        StageVisual::new("corn_sprout"),
                        StageVisual::new("corn_ripe"),
                    ],
                ),
                CropConfig::new(
                    CropKind::Tomato,
                    25,
                    60,
                    5,
                    4,
                    [
                        StageVisual::new("tomato_seed"),
                        StageVisual::new("tomato_sprout"),
                        StageVisual::new("tomato_ripe"),
                    ],
                ),
            ],
        }
    }
}
