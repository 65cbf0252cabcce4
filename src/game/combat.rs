//! Combat system - weapon table, hitscan resolution, damage and kills

use rand::Rng;
use tracing::{debug, info};

use super::arena::StaticArena;
use super::events::GameEvent;
use super::progression::{Promotion, Tier};
use super::raycast::cast_ray;
use super::state::{PlayerId, PlayerState, MAX_COMBATANTS};

/// Distance from a pellet ray within which a player is hit (tiles)
pub const HIT_RADIUS: f64 = 0.4;

/// Weapon stats per tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponStats {
    /// Damage per pellet hit
    pub damage: u32,
    /// Shots per second
    pub fire_rate: f64,
    /// Half-width of the uniform spread cone (radians)
    pub spread: f64,
    /// Rays per shot
    pub pellets: u32,
    /// Reach in tiles
    pub max_range: f64,
}

impl WeaponStats {
    pub fn for_tier(tier: Tier) -> Self {
        match tier {
            Tier::PISTOL => Self {
                damage: 10,
                fire_rate: 3.0,
                spread: 0.0,
                pellets: 1,
                max_range: 32.0,
            },
            Tier::SHOTGUN => Self {
                damage: 8,
                fire_rate: 1.2,
                spread: 0.15,
                pellets: 5,
                max_range: 32.0,
            },
            Tier::MACHINE_GUN => Self {
                damage: 8,
                fire_rate: 10.0,
                spread: 0.03,
                pellets: 1,
                max_range: 32.0,
            },
            Tier::SNIPER => Self {
                damage: 100,
                fire_rate: 0.8,
                spread: 0.0,
                pellets: 1,
                max_range: 32.0,
            },
            // Knife
            _ => Self {
                damage: 200,
                fire_rate: 2.0,
                spread: 0.0,
                pellets: 1,
                max_range: 1.2,
            },
        }
    }

    /// Cooldown to set after firing
    pub fn cooldown(&self) -> f64 {
        1.0 / self.fire_rate
    }
}

/// Damage gathered from every pellet of one shot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShotDamage {
    /// Slot of the last player a pellet hit
    pub target: usize,
    /// Accumulated damage across all pellet hits
    pub damage: u32,
    /// Number of pellet hits
    pub hits: u32,
}

/// What a resolved shot led to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    Miss,
    Hit,
    Kill,
    Victory(PlayerId),
}

/// Hitscan resolution for a shooter against the other combatants
pub struct HitscanResolver;

impl HitscanResolver {
    /// Check if a player can fire (cooldown check)
    pub fn can_fire(fire_cooldown: f64) -> bool {
        fire_cooldown <= 0.0
    }

    /// Trace every pellet of one shot.
    ///
    /// All pellet damage is summed into a single total and attributed to
    /// whichever player the last hitting pellet struck.
    pub fn trace<R: Rng>(
        shooter: usize,
        players: &[PlayerState],
        stats: &WeaponStats,
        arena: &StaticArena,
        rng: &mut R,
    ) -> Option<ShotDamage> {
        let origin = players[shooter].position();
        let facing = players[shooter].angle;

        let mut result: Option<ShotDamage> = None;
        for _ in 0..stats.pellets {
            let offset = if stats.spread > 0.0 {
                rng.gen_range(-stats.spread..=stats.spread)
            } else {
                0.0
            };
            let angle = facing + offset;
            let dir = (angle.cos(), angle.sin());
            let reach = cast_ray(arena, origin, dir).min(stats.max_range);

            for (slot, target) in players.iter().enumerate() {
                if slot == shooter || !target.alive {
                    continue;
                }
                if !Self::ray_hits(origin, dir, reach, target.position()) {
                    continue;
                }
                let total = result.map_or(0, |r| r.damage) + stats.damage;
                let hits = result.map_or(0, |r| r.hits) + 1;
                result = Some(ShotDamage {
                    target: slot,
                    damage: total,
                    hits,
                });
            }
        }
        result
    }

    /// Whether a unit ray of length `reach` passes within [`HIT_RADIUS`]
    /// of a point
    pub fn ray_hits(origin: (f64, f64), dir: (f64, f64), reach: f64, point: (f64, f64)) -> bool {
        let to_x = point.0 - origin.0;
        let to_y = point.1 - origin.1;
        let along = to_x * dir.0 + to_y * dir.1;
        if along < 0.0 || along > reach {
            return false;
        }
        let perp_x = to_x - dir.0 * along;
        let perp_y = to_y - dir.1 * along;
        (perp_x * perp_x + perp_y * perp_y).sqrt() < HIT_RADIUS
    }

    /// Resolve one fire event from `shooter`, appending hit/kill/victory
    /// events.
    pub fn fire<R: Rng>(
        players: &mut [PlayerState; MAX_COMBATANTS],
        shooter: usize,
        arena: &StaticArena,
        rng: &mut R,
        tick: u64,
        events: &mut Vec<GameEvent>,
    ) -> FireOutcome {
        let tier = players[shooter].tier;
        let stats = WeaponStats::for_tier(tier);

        // Cooldown starts whether or not anything is hit
        players[shooter].fire_cooldown = stats.cooldown();
        players[shooter].shots_fired += 1;

        let Some(shot) = Self::trace(shooter, players.as_slice(), &stats, arena, rng) else {
            return FireOutcome::Miss;
        };

        let shooter_id = players[shooter].id;
        let target = &mut players[shot.target];
        let target_id = target.id;
        let applied = target.take_damage(shot.damage);
        let killed = target.health == 0;
        let target_health = target.health;
        if killed {
            target.die(tick);
        }

        let shooter_state = &mut players[shooter];
        shooter_state.shots_hit += 1;
        shooter_state.damage_dealt += applied;

        debug!(
            tick,
            shooter_id,
            target_id,
            pellets = shot.hits,
            damage = shot.damage,
            "Shot landed"
        );
        events.push(GameEvent::Hit {
            shooter_id,
            target_id,
            damage: shot.damage,
            target_health,
        });

        if !killed {
            return FireOutcome::Hit;
        }

        shooter_state.kills += 1;
        let promotion = tier.promote();
        if let Promotion::Advanced(next) = promotion {
            shooter_state.tier = next;
        }

        events.push(GameEvent::Kill {
            killer_id: shooter_id,
            victim_id: target_id,
            weapon: tier.name().to_string(),
            killer_new_tier: shooter_state.tier.index(),
        });

        info!(
            tick,
            killer_id = shooter_id,
            victim_id = target_id,
            weapon = tier.name(),
            "Player killed"
        );

        match promotion {
            Promotion::Advanced(_) => FireOutcome::Kill,
            Promotion::Victory => {
                events.push(GameEvent::Victory {
                    winner_id: shooter_id,
                });
                FireOutcome::Victory(shooter_id)
            }
        }
    }
}
