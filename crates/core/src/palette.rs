//! Item provider - where new normal colors and bonus sprites come from
//!
//! The engine never picks colors itself; refills and the initial fill ask the
//! provider. Tests swap in scripted providers to make cascades predictable.

use crate::rng::SimpleRng;
use crate::types::{BonusDirection, Color, SpriteId};

/// Configuration/asset collaborator consulted by the engine
pub trait ItemProvider {
    /// Color for a newly spawned normal item, uniform over `0..variety`
    fn random_color(&mut self, variety: u8) -> Color;

    /// Sprite handle for a bonus item of the given direction
    fn bonus_sprite(&self, direction: BonusDirection) -> SpriteId;
}

/// Default provider: uniform colors from a seeded [`SimpleRng`].
///
/// Sprite ids follow the normal palette: colors occupy `0..variety`, the two
/// bonus sprites come right after.
#[derive(Debug, Clone)]
pub struct SeededPalette {
    rng: SimpleRng,
    variety: u8,
}

impl SeededPalette {
    pub fn new(seed: u32, variety: u8) -> Self {
        Self {
            rng: SimpleRng::new(seed),
            variety,
        }
    }

    pub fn seed(&self) -> u32 {
        self.rng.state()
    }
}

impl ItemProvider for SeededPalette {
    fn random_color(&mut self, variety: u8) -> Color {
        Color(self.rng.next_range(variety.max(1) as u32) as u8)
    }

    fn bonus_sprite(&self, direction: BonusDirection) -> SpriteId {
        SpriteId(self.variety as u16 + direction.index())
    }
}

impl<P: ItemProvider + ?Sized> ItemProvider for &mut P {
    fn random_color(&mut self, variety: u8) -> Color {
        (**self).random_color(variety)
    }

    fn bonus_sprite(&self, direction: BonusDirection) -> SpriteId {
        (**self).bonus_sprite(direction)
    }
}
