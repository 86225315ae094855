use meadow_core::geometry::TileSize;

use crate::error::{SimError, SimResult};

/// Configuration for a simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// RNG seed for deterministic world generation.
    pub seed: u64,
    /// Grid cell width in world units.
    pub tile_width: f32,
    /// Grid cell height in world units.
    pub tile_height: f32,
    /// In-world seconds per real second.
    pub speed: f32,
    /// Generated world width in tiles.
    pub world_width: u32,
    /// Generated world height in tiles.
    pub world_height: u32,
    /// Chance that a generated cell gets a plant.
    pub plant_density: f64,
    /// Resource type ground objects are drawn from.
    pub ground_type: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            tile_width: 32.0,
            tile_height: 32.0,
            speed: 1.0,
            world_width: 16,
            world_height: 16,
            plant_density: 0.2,
            ground_type: "ground".to_string(),
        }
    }
}

impl SimConfig {
    /// Set the RNG seed for deterministic generation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the grid cell size.
    pub fn with_tile_size(mut self, width: f32, height: f32) -> Self {
        self.tile_width = width;
        self.tile_height = height;
        self
    }

    /// Set the initial time speed.
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Set the generated world size in tiles.
    pub fn with_world_size(mut self, width: u32, height: u32) -> Self {
        self.world_width = width;
        self.world_height = height;
        self
    }

    /// Set the chance that a generated cell gets a plant.
    pub fn with_plant_density(mut self, density: f64) -> Self {
        self.plant_density = density;
        self
    }

    /// Set the resource type ground objects are drawn from.
    pub fn with_ground_type(mut self, ground_type: impl Into<String>) -> Self {
        self.ground_type = ground_type.into();
        self
    }

    /// Grid cell size as a [`TileSize`].
    pub fn tile_size(&self) -> TileSize {
        TileSize {
            width: self.tile_width,
            height: self.tile_height,
        }
    }

    /// Check every value is in range.
    pub fn validate(&self) -> SimResult<()> {
        if !(self.speed.is_finite() && self.speed >= 0.0) {
            return Err(SimError::InvalidSpeed(self.speed));
        }
        if !(self.tile_width.is_finite() && self.tile_width > 0.0)
            || !(self.tile_height.is_finite() && self.tile_height > 0.0)
        {
            return Err(SimError::InvalidConfig(format!(
                "tile size {}x{} must be positive",
                self.tile_width, self.tile_height
            )));
        }
        if !(0.0..=1.0).contains(&self.plant_density) {
            return Err(SimError::InvalidConfig(format!(
                "plant density {} must be within 0..=1",
                self.plant_density
            )));
        }
        Ok(())
    }
}
