// Host-side tests for the particle field.

use fx_core::constants::PARTICLE_COUNT_MAX;
use fx_core::particles::{Palette, ParticleConfig, ParticleField};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn field(count: usize) -> ParticleField {
    let mut rng = StdRng::seed_from_u64(42);
    let config = ParticleConfig {
        count,
        ..ParticleConfig::default()
    };
    ParticleField::new(config, 800.0, 600.0, &mut rng).unwrap()
}

#[test]
fn particles_start_inside_bounds() {
    let f = field(80);
    assert_eq!(f.particles().len(), 80);
    for p in f.particles() {
        assert!((0.0..=800.0).contains(&p.position.x));
        assert!((0.0..=600.0).contains(&p.position.y));
        assert!((1.0..=4.0).contains(&p.size));
        assert!((0.2..=0.7).contains(&p.opacity));
    }
}

#[test]
fn leaving_the_right_edge_wraps_to_zero() {
    let mut f = field(1);
    let p = &mut f.particles_mut()[0];
    p.position = Vec2::new(801.0, 10.0);
    p.velocity = Vec2::ZERO;
    f.step();
    assert_eq!(f.particles()[0].position.x, 0.0);
}

#[test]
fn leaving_the_top_wraps_to_bottom() {
    let mut f = field(1);
    let p = &mut f.particles_mut()[0];
    p.position = Vec2::new(400.0, 0.5);
    p.velocity = Vec2::new(0.0, -3.0);
    f.step();
    assert_eq!(f.particles()[0].position.y, 600.0);
}

#[test]
fn pool_size_is_capped() {
    let mut rng = StdRng::seed_from_u64(0);
    let config = ParticleConfig {
        count: PARTICLE_COUNT_MAX + 1,
        ..ParticleConfig::default()
    };
    assert!(ParticleField::new(config, 100.0, 100.0, &mut rng).is_err());
}

#[test]
fn oversized_page_count_is_clamped_not_rejected() {
    let mut rng = StdRng::seed_from_u64(0);
    let config = ParticleConfig {
        count: 200,
        speed: f32::INFINITY,
        ..ParticleConfig::default()
    }
    .clamped();
    assert_eq!(config.count, PARTICLE_COUNT_MAX);
    assert_eq!(config.speed, ParticleConfig::default().speed);
    let f = ParticleField::new(config, 100.0, 100.0, &mut rng).unwrap();
    assert_eq!(f.particles().len(), PARTICLE_COUNT_MAX);
}

#[test]
fn in_range_config_survives_clamping() {
    let config = ParticleConfig {
        count: 40,
        speed: 0.8,
        palette: Palette::Cyan,
    };
    let clamped = config.clamped();
    assert_eq!(clamped.count, 40);
    assert_eq!(clamped.speed, 0.8);
    assert_eq!(clamped.palette, Palette::Cyan);
}

#[test]
fn scroll_bias_decays() {
    let mut f = field(10);
    f.sync_scroll(1_000.0);
    f.on_scroll(1_200.0);
    let v0 = f.scroll_velocity();
    assert!((v0 - 20.0).abs() < 1e-4);
    for _ in 0..10 {
        f.step();
    }
    assert!(f.scroll_velocity() < v0 * 0.61);
}

#[test]
fn links_are_symmetric_once() {
    let mut f = field(3);
    let ps = f.particles_mut();
    ps[0].position = Vec2::new(100.0, 100.0);
    ps[1].position = Vec2::new(150.0, 100.0);
    ps[2].position = Vec2::new(500.0, 500.0);
    let mut links = Vec::new();
    f.links(&mut links);
    assert_eq!(links.len(), 1);
    assert_eq!((links[0].a, links[0].b), (0, 1));
    assert!((links[0].alpha - 0.075).abs() < 1e-6);
}

#[test]
fn palette_names() {
    assert_eq!(Palette::parse("blue"), Some(Palette::Blue));
    assert_eq!(Palette::parse("cyan"), Some(Palette::Cyan));
    assert_eq!(Palette::parse("mixed"), Some(Palette::Mixed));
    assert_eq!(Palette::parse("plaid"), None);
}
