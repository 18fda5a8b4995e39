use crate::error::{StageError, StageResult};

/// Stage construction parameters. Every field defaults independently, so a
/// JSON config may name only the fields it cares about.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub title: String,
    /// Physical presentation width in pixels.
    pub width: u32,
    /// Physical presentation height in pixels.
    pub height: u32,
    /// log2 of the integer upscale factor. Bit 1 draws every logical pixel
    /// as a 2x2 block.
    pub resolution_bit: u8,
    /// Buffer chain depth: 2 = double buffering, 3 = triple.
    pub buffer_count: usize,
    pub image_capacity: usize,
    pub picture_capacity: usize,
    pub surface_capacity: usize,
    pub static_animation_capacity: usize,
    pub dynamic_animation_capacity: usize,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            title: "pixelstage".to_string(),
            width: 1024,
            height: 576,
            resolution_bit: 0,
            buffer_count: 2,
            image_capacity: 128,
            picture_capacity: 512,
            surface_capacity: 16,
            static_animation_capacity: 128,
            dynamic_animation_capacity: 512,
        }
    }
}

impl StageConfig {
    pub fn from_json_str(s: &str) -> StageResult<Self> {
        let config: Self = serde_json::from_str(s)
            .map_err(|e| StageError::validation(format!("parse stage config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> StageResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(StageError::validation("width/height must be > 0"));
        }
        if self.buffer_count < 2 {
            return Err(StageError::validation("buffer_count must be >= 2"));
        }
        if self.resolution_bit > 4 {
            return Err(StageError::validation("resolution_bit must be <= 4"));
        }
        if self.width >> self.resolution_bit == 0 || self.height >> self.resolution_bit == 0 {
            return Err(StageError::validation(
                "resolution_bit leaves no logical pixels",
            ));
        }

        let capacities = [
            self.image_capacity,
            self.picture_capacity,
            self.surface_capacity,
            self.static_animation_capacity,
            self.dynamic_animation_capacity,
        ];
        if capacities.contains(&0) {
            return Err(StageError::validation("pool capacities must be > 0"));
        }

        Ok(())
    }
}
