use crate::constants::{
    ENERGY_REGEN_PER_SEC, FALL_DAMAGE_OFFSET, FALL_DAMAGE_SCALE, FALL_DAMAGE_THRESHOLD,
    JUMP_ENERGY_COST, MAX_ENERGY, MAX_HEALTH, SPRINT_DRAIN_PER_SEC,
};

/// Damage for landing at vertical velocity `vy`, if any.
pub fn fall_damage(vy: f32) -> Option<f32> {
    (vy < -FALL_DAMAGE_THRESHOLD).then(|| (vy.abs() - FALL_DAMAGE_OFFSET) * FALL_DAMAGE_SCALE)
}

/// Health and stamina.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vitals {
    pub health: f32,
    pub energy: f32,
    pub dead: bool,
}

impl Default for Vitals {
    fn default() -> Self {
        Self {
            health: MAX_HEALTH,
            energy: MAX_ENERGY,
            dead: false,
        }
    }
}

impl Vitals {
    pub fn can_sprint(&self, infinite: bool) -> bool {
        infinite || self.energy > 0.0
    }

    pub fn drain_sprint(&mut self, dt: f32) {
        self.energy = (self.energy - SPRINT_DRAIN_PER_SEC * dt).clamp(0.0, MAX_ENERGY);
    }

    pub fn regenerate(&mut self, dt: f32) {
        self.energy = (self.energy + ENERGY_REGEN_PER_SEC * dt).clamp(0.0, MAX_ENERGY);
    }

    /// Pay for a jump. Returns false if there is not enough energy.
    pub fn try_jump(&mut self, infinite: bool) -> bool {
        if infinite {
            return true;
        }
        if self.energy < JUMP_ENERGY_COST {
            return false;
        }
        self.energy -= JUMP_ENERGY_COST;
        true
    }

    pub fn damage(&mut self, amount: f32) {
        self.health = (self.health - amount).max(0.0);
    }

    pub fn is_depleted(&self) -> bool {
        self.health <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fall_damage_starts_past_threshold() {
        assert_eq!(fall_damage(-20.0), None);
        assert_eq!(fall_damage(-24.0), None);
        assert_eq!(fall_damage(-30.0), Some(30.0));
    }

    #[test]
    fn jumping_costs_energy_unless_infinite() {
        let mut v = Vitals {
            energy: 20.0,
            ..Default::default()
        };
        assert!(v.try_jump(false));
        assert_eq!(v.energy, 5.0);
        assert!(!v.try_jump(false));
        assert!(v.try_jump(true));
        assert_eq!(v.energy, 5.0);
    }

    #[test]
    fn energy_and_health_stay_in_range() {
        let mut v = Vitals::default();
        v.regenerate(10.0);
        assert_eq!(v.energy, MAX_ENERGY);
        v.drain_sprint(100.0);
        assert_eq!(v.energy, 0.0);
        assert!(!v.can_sprint(false));
        v.damage(250.0);
        assert_eq!(v.health, 0.0);
        assert!(v.is_depleted());
    }
}
