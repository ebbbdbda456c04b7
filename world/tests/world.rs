use std::time::Duration;

use glam::Vec2;
use reef_defence_core::{
    Arena, AttackStyle, Category, Collider, ColliderId, Command, EnemyId, EnemyTemplate,
    EnemyTemplateId, Event, FirePattern, Path, PlacementError, ProjectileId, ProjectileOutcome,
    ProjectileSpec, Shape, TowerId, TowerRecord, TowerTemplate, TowerTemplateId, Wallet,
    WaveNumber, Waypoint,
};
use reef_defence_world::{self as world, query, World};

const HARPOON: TowerTemplateId = TowerTemplateId::new(0);
const LANTERN: TowerTemplateId = TowerTemplateId::new(1);
const DRIFTER: EnemyTemplateId = EnemyTemplateId::new(0);
const DARTER: EnemyTemplateId = EnemyTemplateId::new(1);

fn tower(name: &str, pattern: FirePattern, speed: f32) -> TowerTemplate {
    TowerTemplate {
        name: name.into(),
        damage: 10.0,
        range: 4.0,
        attack_speed: 2.0,
        cost: 300,
        unit_cap: 3,
        upgrade_cost: 100,
        max_level: 5,
        placement_radius: 0.5,
        attack: AttackStyle::Projectile {
            pattern,
            projectile: ProjectileSpec {
                speed,
                ..ProjectileSpec::default()
            },
        },
    }
}

fn arena() -> Arena {
    Arena {
        path: Path::new(vec![
            Waypoint {
                name: "Mouth".into(),
                position: Vec2::new(0.0, 0.0),
            },
            Waypoint {
                name: "Lagoon".into(),
                position: Vec2::new(10.0, 0.0),
            },
        ]),
        spawn_points: vec![Vec2::new(0.0, 0.0)],
        colliders: vec![
            Collider::new(
                ColliderId::new(0),
                Category::Placable,
                Shape::Rect {
                    min: Vec2::new(-5.0, -5.0),
                    max: Vec2::new(5.0, 5.0),
                },
            ),
            Collider::new(
                ColliderId::new(1),
                Category::Obstacle,
                Shape::Circle {
                    center: Vec2::new(3.0, 3.0),
                    radius: 0.5,
                },
            ),
            Collider::new(
                ColliderId::new(2),
                Category::Leak,
                Shape::Circle {
                    center: Vec2::new(10.0, 0.0),
                    radius: 0.5,
                },
            ),
        ],
        enemies: vec![
            EnemyTemplate {
                name: "Drifter".into(),
                speed: 0.0,
                health: 10.0,
                reward: 25,
                leak_damage: 10,
                radius: 0.25,
            },
            EnemyTemplate {
                name: "Darter".into(),
                speed: 20.0,
                health: 10.0,
                reward: 25,
                leak_damage: 10,
                radius: 0.25,
            },
        ],
        towers: vec![
            tower("Harpoon", FirePattern::Single, 0.0),
            tower("Lantern", FirePattern::Quad, 10.0),
        ],
        player_health: 15,
    }
}

fn world_with_coins(coins: u32) -> World {
    World::with_arena(arena(), Box::new(Wallet::with_balance(coins)))
}

fn run(world: &mut World, commands: impl IntoIterator<Item = Command>) -> Vec<Event> {
    let mut events = Vec::new();
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

fn tick(millis: u64) -> Command {
    Command::Tick {
        dt: Duration::from_millis(millis),
    }
}

fn spawn(template: EnemyTemplateId) -> Command {
    Command::SpawnEnemy {
        template,
        spawn_point: 0,
        wave: WaveNumber::new(1),
    }
}

fn place(template: TowerTemplateId, x: f32, y: f32) -> Command {
    Command::PlaceTower {
        template,
        position: Vec2::new(x, y),
    }
}

#[test]
fn placement_then_upgrade_charges_the_coin_ledger() {
    let mut world = world_with_coins(1000);

    let events = run(&mut world, [place(HARPOON, 0.0, 2.0)]);
    assert_eq!(
        events,
        vec![Event::TowerPlaced {
            tower: TowerId::new(0),
            template: HARPOON,
            position: Vec2::new(0.0, 2.0),
        }]
    );
    assert_eq!(query::coins(&world), 700);

    let events = run(
        &mut world,
        [Command::UpgradeTower {
            tower: TowerId::new(0),
        }],
    );
    assert!(matches!(
        events.as_slice(),
        [Event::TowerUpgraded {
            level: 2,
            next_cost: Some(180),
            ..
        }]
    ));
    assert_eq!(query::coins(&world), 600);

    let progression = query::tower_progression(&world, TowerId::new(0)).expect("tower exists");
    assert_eq!(progression.level(), 2);
    assert!((progression.stats().damage - 13.5).abs() < 1e-4);
    assert_eq!(progression.upgrade_cost(), Some(180));
}

#[test]
fn refused_placements_leave_the_balance_untouched() {
    let mut world = world_with_coins(1000);

    let events = run(
        &mut world,
        [
            place(HARPOON, 3.2, 3.0),
            place(HARPOON, 8.0, 0.0),
            place(TowerTemplateId::new(9), 0.0, 2.0),
        ],
    );
    let reasons: Vec<PlacementError> = events
        .iter()
        .filter_map(|event| match event {
            Event::TowerPlacementRejected { reason, .. } => Some(*reason),
            _ => None,
        })
        .collect();
    assert_eq!(
        reasons,
        vec![
            PlacementError::NearObstacle,
            PlacementError::NotPlacable,
            PlacementError::UnknownTemplate,
        ]
    );
    assert_eq!(query::coins(&world), 1000);

    let mut poor = world_with_coins(299);
    let events = run(&mut poor, [place(HARPOON, 0.0, 2.0)]);
    assert!(matches!(
        events.as_slice(),
        [Event::TowerPlacementRejected {
            reason: PlacementError::InsufficientFunds,
            ..
        }]
    ));
    assert_eq!(query::coins(&poor), 299);
}

#[test]
fn unit_cap_is_checked_before_funds() {
    let mut world = world_with_coins(900);
    let _ = run(
        &mut world,
        [
            place(HARPOON, 0.0, 1.0),
            place(HARPOON, 0.0, 2.0),
            place(HARPOON, 0.0, 3.0),
        ],
    );
    assert_eq!(query::coins(&world), 0);
    assert_eq!(query::remaining_units(&world, HARPOON), Some(0));

    let events = run(&mut world, [place(HARPOON, 0.0, 4.0)]);
    assert!(matches!(
        events.as_slice(),
        [Event::TowerPlacementRejected {
            reason: PlacementError::UnitCapReached,
            ..
        }]
    ));
}

#[test]
fn simultaneous_hits_kill_and_reward_exactly_once() {
    let mut world = world_with_coins(600);
    let _ = run(
        &mut world,
        [
            place(HARPOON, 0.0, 2.0),
            place(HARPOON, 0.0, -2.0),
            spawn(DRIFTER),
        ],
    );
    let target = EnemyId::new(0);

    let events = run(
        &mut world,
        [
            Command::FireVolley {
                tower: TowerId::new(0),
                target,
                directions: vec![Vec2::new(0.0, -1.0)],
            },
            Command::FireVolley {
                tower: TowerId::new(1),
                target,
                directions: vec![Vec2::new(0.0, 1.0)],
            },
            tick(16),
        ],
    );

    let deaths = events
        .iter()
        .filter(|event| matches!(event, Event::EnemyDied { .. }))
        .count();
    assert_eq!(deaths, 1);
    assert_eq!(query::coins(&world), 25);
    assert_eq!(query::enemy_population(&world), 0);

    let resolved: Vec<(u32, ProjectileOutcome)> = events
        .iter()
        .filter_map(|event| match event {
            Event::ProjectileResolved {
                projectile,
                outcome,
            } => Some((projectile.get(), *outcome)),
            _ => None,
        })
        .collect();
    assert_eq!(
        resolved,
        vec![
            (
                0,
                ProjectileOutcome::Enemy {
                    enemy: target,
                    damage: 10.0
                }
            ),
            (1, ProjectileOutcome::Expired),
        ]
    );
    assert!(query::projectile_view(&world).is_empty());
}

#[test]
fn missed_instant_ray_does_not_wait_for_later_enemies() {
    let mut world = world_with_coins(300);
    let _ = run(&mut world, [place(HARPOON, 0.0, 2.0), spawn(DRIFTER)]);

    // Both rays cross the spawn point; the first one kills the drifter.
    let events = run(
        &mut world,
        [
            Command::FireVolley {
                tower: TowerId::new(0),
                target: EnemyId::new(0),
                directions: vec![Vec2::new(0.0, -1.0), Vec2::new(0.0, -1.0)],
            },
            tick(16),
        ],
    );
    assert!(events.contains(&Event::ProjectileResolved {
        projectile: ProjectileId::new(1),
        outcome: ProjectileOutcome::Expired,
    }));
    assert!(query::projectile_view(&world).is_empty());

    let events = run(&mut world, [spawn(DRIFTER), tick(16)]);
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::EnemyDamaged { .. } | Event::EnemyDied { .. })));
    assert_eq!(query::enemy_population(&world), 1);
}

#[test]
fn leaks_damage_the_player_and_defeat_fires_once() {
    let mut world = world_with_coins(0);

    // The first tick lands on the spawn waypoint, the second reaches the lagoon.
    let events = run(
        &mut world,
        [spawn(DARTER), spawn(DARTER), tick(1000), tick(1000)],
    );

    let leaks = events
        .iter()
        .filter(|event| matches!(event, Event::EnemyLeaked { damage: 10, .. }))
        .count();
    assert_eq!(leaks, 2);
    assert_eq!(query::player_health(&world), 0);
    assert!(query::is_defeated(&world));
    assert_eq!(query::coins(&world), 0);
    assert_eq!(query::enemy_population(&world), 0);

    let events = run(&mut world, [spawn(DARTER), tick(1000), tick(1000)]);
    assert!(events.contains(&Event::PlayerDamaged { health: 0 }));
    assert!(!events.contains(&Event::PlayerDefeated));
}

#[test]
fn victory_banks_every_pending_pearl_once() {
    let mut world = world_with_coins(0);

    let events = run(
        &mut world,
        [
            Command::GrantWaveReward {
                wave: WaveNumber::new(1),
                coins: 350,
                pearls: 50,
            },
            Command::GrantWaveReward {
                wave: WaveNumber::new(2),
                coins: 450,
                pearls: 50,
            },
            Command::DeclareVictory { bonus_pearls: 100 },
            Command::DeclareVictory { bonus_pearls: 100 },
        ],
    );

    assert_eq!(query::coins(&world), 800);
    assert_eq!(query::pending_pearls(&world), 0);
    assert_eq!(query::banked_pearls(&world), 200);
    assert!(query::is_victorious(&world));
    let victories = events
        .iter()
        .filter(|event| matches!(event, Event::Victory { .. }))
        .count();
    assert_eq!(victories, 1);
}

#[test]
fn restored_towers_keep_their_level_without_charging() {
    let mut world = world_with_coins(0);

    let _ = run(
        &mut world,
        [Command::RestoreTower {
            template: HARPOON,
            position: Vec2::new(1.0, 1.0),
            level: 3,
        }],
    );

    assert_eq!(query::coins(&world), 0);
    assert_eq!(
        query::tower_records(&world),
        vec![TowerRecord {
            template: HARPOON,
            position: Vec2::new(1.0, 1.0),
            level: 3,
        }]
    );
    let progression = query::tower_progression(&world, TowerId::new(0)).expect("tower exists");
    assert_eq!(progression.upgrade_cost(), Some(324));
}

#[test]
fn quad_volley_spawns_four_projectiles_and_reloads() {
    let mut world = world_with_coins(300);
    let _ = run(&mut world, [place(LANTERN, 0.0, 2.0), spawn(DRIFTER)]);
    let volley = Command::FireVolley {
        tower: TowerId::new(0),
        target: EnemyId::new(0),
        directions: FirePattern::Quad.directions(Vec2::new(0.0, -1.0)),
    };

    let events = run(&mut world, [volley.clone(), volley]);

    let fired = events
        .iter()
        .filter(|event| matches!(event, Event::ProjectileFired { .. }))
        .count();
    assert_eq!(fired, 4);
    assert_eq!(query::projectile_view(&world).len(), 4);
    let cooldowns = query::tower_cooldowns(&world).into_vec();
    assert_eq!(cooldowns[0].ready_in, Duration::from_millis(500));
}

#[test]
fn travelling_projectile_hits_after_covering_the_distance() {
    let mut world = world_with_coins(300);
    let _ = run(&mut world, [place(LANTERN, 0.0, 3.0), spawn(DRIFTER)]);

    let events = run(
        &mut world,
        [
            Command::FireVolley {
                tower: TowerId::new(0),
                target: EnemyId::new(0),
                directions: vec![Vec2::new(0.0, -1.0)],
            },
            tick(100),
        ],
    );
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::ProjectileResolved { .. })));
    let projectiles = query::projectile_view(&world);
    let in_flight = projectiles
        .iter()
        .find(|projectile| projectile.id.get() == 0)
        .expect("first projectile in flight");
    assert!((in_flight.position - Vec2::new(0.0, 2.0)).length() < 1e-4);
    assert!(in_flight.newly_spawned);

    let events = run(&mut world, [tick(100), tick(100)]);
    assert!(events.contains(&Event::ProjectileResolved {
        projectile: ProjectileId::new(0),
        outcome: ProjectileOutcome::Enemy {
            enemy: EnemyId::new(0),
            damage: 10.0,
        },
    }));
    assert!(events.contains(&Event::EnemyDied {
        enemy: EnemyId::new(0),
        position: Vec2::new(0.0, 0.0),
        reward: 25,
    }));
}
