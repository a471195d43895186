//! Enemy and hazard classification from the actor plane.

use crate::level::Level;
use crate::plane::MAP_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnemyCategory {
    LowGuard,
    SneakyLowGuard,
    HighGuard,
    OverpatrolGuard,
    StrikeGuard,
    TriadEnforcer,
    LightningGuard,
    Monk,
    FireMonk,
    RoboGuard,
    Ballistikraft,
    GunEmplacement,
    FourWayGun,
}

impl EnemyCategory {
    pub fn name(&self) -> &'static str {
        use EnemyCategory::*;
        match self {
            LowGuard => "low_guard",
            SneakyLowGuard => "sneaky_low_guard",
            HighGuard => "high_guard",
            OverpatrolGuard => "overpatrol_guard",
            StrikeGuard => "strike_guard",
            TriadEnforcer => "triad_enforcer",
            LightningGuard => "lightning_guard",
            Monk => "monk",
            FireMonk => "fire_monk",
            RoboGuard => "robo_guard",
            Ballistikraft => "ballistikraft",
            GunEmplacement => "gun_emplacement",
            FourWayGun => "4_way_gun",
        }
    }

    pub fn quake_pool(&self) -> &'static [&'static str] {
        use EnemyCategory::*;
        match self {
            LowGuard => &["monster_army"],
            SneakyLowGuard => &["monster_ogre"],
            HighGuard => &["monster_ogre_marksman"],
            OverpatrolGuard => &["monster_wizard"],
            TriadEnforcer => &["monster_shambler"],
            LightningGuard => &["monster_demon1"],
            Monk => &["monster_knight"],
            FireMonk => &["monster_hellknight"],
            RoboGuard | Ballistikraft => &["monster_enforcer"],
            GunEmplacement | FourWayGun => &["monster_dog"],
            StrikeGuard => &[],
        }
    }

    pub fn dusk_pool(&self) -> &'static [&'static str] {
        match self {
            EnemyCategory::StrikeGuard => &[],
            _ => &["monster_leatherneck"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Hard,
}

/// Which entity table a conversion draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetGame {
    #[default]
    Quake,
    Dusk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnemyClass {
    pub category: EnemyCategory,
    pub difficulty: Difficulty,
    /// Facing as an index into east, north, west, south.
    pub facing: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorRecord {
    pub x: usize,
    pub y: usize,
    pub class: EnemyClass,
}

impl ActorRecord {
    /// Picks from the target's pool by position, so the choice is stable.
    pub fn entity_name(&self, target: TargetGame) -> Option<&'static str> {
        let pool = match target {
            TargetGame::Quake => self.class.category.quake_pool(),
            TargetGame::Dusk => self.class.category.dusk_pool(),
        };
        if pool.is_empty() {
            return None;
        }
        Some(pool[(self.x + self.y) % pool.len()])
    }
}

/// Maps an actor code to an enemy, or `None` for anything else.
pub fn classify_actor(code: u16) -> Option<EnemyClass> {
    use Difficulty::*;
    use EnemyCategory::*;

    let (category, difficulty, base) = match code {
        108..=119 => (LowGuard, Easy, Some(108)),
        126..=137 => (LowGuard, Hard, Some(126)),
        120 => (SneakyLowGuard, Easy, None),
        138 => (SneakyLowGuard, Hard, None),
        144..=155 => (HighGuard, Easy, Some(144)),
        162..=173 => (HighGuard, Hard, Some(162)),
        216..=227 => (OverpatrolGuard, Easy, Some(216)),
        234..=245 => (OverpatrolGuard, Hard, Some(234)),
        180..=191 => (StrikeGuard, Easy, Some(180)),
        198..=204 => (StrikeGuard, Hard, None),
        288..=299 => (TriadEnforcer, Easy, Some(288)),
        306..=317 => (TriadEnforcer, Hard, Some(306)),
        324..=335 => (LightningGuard, Easy, Some(324)),
        342..=353 => (LightningGuard, Hard, Some(342)),
        360..=371 => (Monk, Easy, Some(360)),
        378..=389 => (Monk, Hard, Some(378)),
        396..=407 => (FireMonk, Easy, Some(396)),
        414..=425 => (FireMonk, Hard, Some(414)),
        158..=161 => (RoboGuard, Easy, None),
        176..=179 => (RoboGuard, Hard, None),
        408..=411 => (Ballistikraft, Easy, None),
        426..=429 => (Ballistikraft, Hard, None),
        194..=197 => (GunEmplacement, Easy, None),
        212..=215 => (GunEmplacement, Hard, None),
        89 => (FourWayGun, Easy, None),
        211 => (FourWayGun, Hard, None),
        _ => return None,
    };

    let facing = base.map(|base| (code - base) % 4).unwrap_or(0);
    Some(EnemyClass { category, difficulty, facing })
}

pub fn extract_actors(level: &Level) -> Vec<ActorRecord> {
    let mut actors = Vec::new();
    for y in 0..MAP_SIZE {
        for x in 0..MAP_SIZE {
            if let Some(class) = classify_actor(level.actor.get(x, y)) {
                actors.push(ActorRecord { x, y, class });
            }
        }
    }
    actors
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hazard {
    Trampoline,
    SpinningBlades,
    Flamethrower,
}

impl Hazard {
    pub fn from_code(code: u16) -> Option<Hazard> {
        match code {
            0xc1 => Some(Hazard::Trampoline),
            0xae => Some(Hazard::SpinningBlades),
            0x186 => Some(Hazard::Flamethrower),
            _ => None,
        }
    }

    /// Only Dusk has entities for these.
    pub fn dusk_entity(&self) -> &'static str {
        match self {
            Hazard::Trampoline => "object_jump_pad",
            Hazard::SpinningBlades => "object_blades",
            Hazard::Flamethrower => "object_anomaly_fire",
        }
    }
}

pub fn extract_hazards(level: &Level) -> Vec<(usize, usize, Hazard)> {
    let mut hazards = Vec::new();
    for y in 0..MAP_SIZE {
        for x in 0..MAP_SIZE {
            if let Some(hazard) = Hazard::from_code(level.actor.get(x, y)) {
                hazards.push((x, y, hazard));
            }
        }
    }
    hazards
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plane::Plane;

    #[test]
    fn classifies_ranges_and_facing() {
        let guard = classify_actor(113).unwrap();
        assert_eq!(guard.category, EnemyCategory::LowGuard);
        assert_eq!(guard.difficulty, Difficulty::Easy);
        assert_eq!(guard.facing, 1);

        let monk = classify_actor(389).unwrap();
        assert_eq!(monk.category, EnemyCategory::Monk);
        assert_eq!(monk.difficulty, Difficulty::Hard);
        assert_eq!(monk.facing, 3);

        assert_eq!(classify_actor(211).unwrap().category, EnemyCategory::FourWayGun);
        assert!(classify_actor(19).is_none());
        assert!(classify_actor(300).is_none());
    }

    #[test]
    fn entity_pick_is_deterministic() {
        let record = ActorRecord { x: 3, y: 4, class: classify_actor(290).unwrap() };
        assert_eq!(record.entity_name(TargetGame::Quake), Some("monster_shambler"));
        assert_eq!(record.entity_name(TargetGame::Dusk), Some("monster_leatherneck"));

        let strike = ActorRecord { x: 0, y: 0, class: classify_actor(181).unwrap() };
        assert_eq!(strike.entity_name(TargetGame::Quake), None);
    }

    #[test]
    fn extraction_is_row_major() {
        let mut actor = Plane::empty();
        actor.set(50, 2, 126);
        actor.set(3, 9, 414);
        actor.set(4, 9, 0xc1);
        let level = Level::new(0, "actors", Plane::empty(), actor, Plane::empty());
        let actors = extract_actors(&level);
        assert_eq!(actors.len(), 2);
        assert_eq!((actors[0].x, actors[0].y), (50, 2));
        assert_eq!(actors[1].class.category, EnemyCategory::FireMonk);
        assert_eq!(extract_hazards(&level), vec![(4, 9, Hazard::Trampoline)]);
    }
}
