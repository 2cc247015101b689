use std::f32::consts::{FRAC_PI_4, FRAC_PI_8};

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Deserialize;
use tracing::{debug, info, trace};

use crate::{
    config,
    error::AppError,
    render::Surface,
    types::{Rgb, Vec2, Vec3},
};

const BACKDROP: Rgb = Rgb {
    r: 0.0,
    g: 2.0,
    b: 10.0,
};

const STAR_POINTS: usize = 8;
/// Largest star radius accepted from a config file, in logical units.
const MAX_BASE_RADIUS: f32 = 100.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StarShape {
    #[default]
    Disc,
    /// Eight outer points alternating with eight inner ones.
    Star,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StarfieldConfig {
    pub particle_count: usize,
    pub depth_max: f32,
    /// Half-width of the square x/y spawn area.
    pub spread: f32,
    pub focal: f32,
    pub base_radius: f32,
    pub min_radius: f32,
    pub size_scale_min: f32,
    pub size_scale_max: f32,
    pub cruise_speed: f32,
    pub jump_speed: f32,
    pub smoothing: f32,
    pub trail_threshold: f32,
    pub fade_alpha: f32,
    pub shape: StarShape,
    pub shimmer: bool,
}

impl StarfieldConfig {
    /// Plain discs with a cool blue tint.
    pub fn classic() -> Self {
        Self {
            particle_count: config::CLASSIC_PARTICLES,
            depth_max: config::DEPTH_MAX,
            spread: config::FIELD_SPREAD,
            focal: config::FOCAL,
            base_radius: config::BASE_RADIUS,
            min_radius: config::MIN_RADIUS,
            size_scale_min: config::SIZE_SCALE_MIN,
            size_scale_max: config::SIZE_SCALE_MAX,
            cruise_speed: config::CRUISE_SPEED,
            jump_speed: config::JUMP_SPEED,
            smoothing: config::SPEED_SMOOTHING,
            trail_threshold: config::TRAIL_THRESHOLD,
            fade_alpha: config::FADE_ALPHA,
            shape: StarShape::Disc,
            shimmer: false,
        }
    }

    /// Eight-point stars with a per-channel colour shimmer.
    pub fn prismatic() -> Self {
        Self {
            particle_count: config::PRISMATIC_PARTICLES,
            shape: StarShape::Star,
            shimmer: true,
            ..Self::classic()
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let fail = |msg: &str| Err(AppError::InvalidConfig(msg.to_string()));
        if self.particle_count == 0 {
            return fail("starfield.particle_count must be positive");
        }
        if !(self.depth_max.is_finite() && self.depth_max > 0.0) {
            return fail("starfield.depth_max must be positive");
        }
        if !(self.spread.is_finite() && self.spread > 0.0) {
            return fail("starfield.spread must be positive");
        }
        if !(self.focal.is_finite() && self.focal > 0.0) {
            return fail("starfield.focal must be positive");
        }
        if !(self.smoothing > 0.0 && self.smoothing <= 1.0) {
            return fail("starfield.smoothing must be in (0, 1]");
        }
        if !(self.cruise_speed >= 0.0 && self.jump_speed >= 0.0) {
            return fail("starfield speeds must not be negative");
        }
        if !(self.size_scale_min > 0.0 && self.size_scale_min < self.size_scale_max) {
            return fail("starfield size scale range is empty");
        }
        if !(self.base_radius > 0.0 && self.base_radius <= MAX_BASE_RADIUS) {
            return fail("starfield.base_radius must be in (0, 100]");
        }
        if !(self.min_radius.is_finite() && self.min_radius >= 0.0) {
            return fail("starfield.min_radius must not be negative");
        }
        if !self.trail_threshold.is_finite() {
            return fail("starfield.trail_threshold must be finite");
        }
        if !(0.0..=1.0).contains(&self.fade_alpha) {
            return fail("starfield.fade_alpha must be in [0, 1]");
        }
        Ok(())
    }
}

impl Default for StarfieldConfig {
    fn default() -> Self {
        Self::prismatic()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Particle {
    pub pos: Vec3,
    /// Projection from the last frame, relative to the surface centre.
    pub prev: Option<Vec2>,
    size_scale: f32,
}

impl Particle {
    pub fn size_scale(&self) -> f32 {
        self.size_scale
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    Stopped,
    /// The surface was not available; nothing advanced.
    Skipped,
    Drawn { visible: usize, trails: usize },
}

/// Perspective starfield whose speed follows a single urgency signal.
pub struct StarfieldEngine {
    config: StarfieldConfig,
    particles: Vec<Particle>,
    speed: f32,
    target_speed: f32,
    urgent: bool,
    running: bool,
    rng: StdRng,
    outline: Vec<Vec2>,
}

impl StarfieldEngine {
    pub fn new(config: StarfieldConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut engine = Self {
            target_speed: config.cruise_speed,
            config,
            particles: Vec::new(),
            speed: 0.0,
            urgent: false,
            running: false,
            rng,
            outline: Vec::with_capacity(STAR_POINTS * 2),
        };
        engine.spawn_pool();
        engine
    }

    pub fn start(&mut self) {
        if !self.running {
            info!(particles = self.particles.len(), "starfield started");
        }
        self.running = true;
    }

    pub fn stop(&mut self) {
        if self.running {
            info!("starfield stopped");
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_urgent(&mut self, urgent: bool) {
        if urgent != self.urgent {
            debug!(urgent, "starfield urgency changed");
        }
        self.urgent = urgent;
        self.target_speed = if urgent {
            self.config.jump_speed
        } else {
            self.config.cruise_speed
        };
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn target_speed(&self) -> f32 {
        self.target_speed
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Advances and draws one frame. `time_secs` only drives the shimmer.
    pub fn tick<S: Surface + ?Sized>(
        &mut self,
        surface: Option<&mut S>,
        time_secs: f32,
    ) -> FrameOutcome {
        if !self.running {
            return FrameOutcome::Stopped;
        }
        let Some(surface) = surface else {
            trace!("surface unavailable, frame skipped");
            return FrameOutcome::Skipped;
        };

        surface.fade(BACKDROP, self.config.fade_alpha);
        self.speed += (self.target_speed - self.speed) * self.config.smoothing;

        let width = surface.width();
        let height = surface.height();
        let center = Vec2::new(width / 2.0, height / 2.0);
        let trailing = self.speed > self.config.trail_threshold;
        let mut visible = 0;
        let mut trails = 0;

        for i in 0..self.particles.len() {
            self.advance(i);
            let particle = self.particles[i];
            let projected = self.project(particle.pos);
            self.particles[i].prev = Some(projected);
            if projected.x.abs() > center.x || projected.y.abs() > center.y {
                continue;
            }

            let proximity = 1.0 - particle.pos.z / self.config.depth_max;
            let radius = (proximity * self.config.base_radius * particle.size_scale())
                .max(self.config.min_radius);
            let color = self.color(&particle, proximity, time_secs);
            let screen = projected + center;

            match self.config.shape {
                StarShape::Disc => surface.fill_disc(screen, radius, color),
                StarShape::Star => {
                    star_outline(screen, radius, &mut self.outline);
                    surface.fill_polygon(&self.outline, color);
                }
            }

            if trailing {
                if let Some(prev) = particle.prev {
                    surface.stroke_line(
                        prev + center,
                        screen,
                        radius * config::TRAIL_WIDTH_SCALE,
                        color,
                        proximity * config::TRAIL_ALPHA_SCALE,
                    );
                    trails += 1;
                }
            }
            visible += 1;
        }

        FrameOutcome::Drawn { visible, trails }
    }

    fn spawn_pool(&mut self) {
        let count = self.config.particle_count;
        self.particles.clear();
        self.particles.reserve_exact(count);
        for _ in 0..count {
            let x = self.rng.gen_range(-self.config.spread..self.config.spread);
            let y = self.rng.gen_range(-self.config.spread..self.config.spread);
            // gen_range is half-open, flip it so depth lands in (0, max].
            let z = self.config.depth_max - self.rng.gen_range(0.0..self.config.depth_max);
            let size_scale = self
                .rng
                .gen_range(self.config.size_scale_min..self.config.size_scale_max);
            self.particles.push(Particle {
                pos: Vec3::new(x, y, z),
                prev: None,
                size_scale,
            });
        }
    }

    fn advance(&mut self, i: usize) {
        let spread = self.config.spread;
        let depth_max = self.config.depth_max;
        let speed = self.speed;
        let particle = &mut self.particles[i];
        particle.pos.z -= speed;
        if particle.pos.z <= 0.0 {
            particle.pos = Vec3::new(
                self.rng.gen_range(-spread..spread),
                self.rng.gen_range(-spread..spread),
                depth_max,
            );
            particle.prev = None;
        }
    }

    fn project(&self, pos: Vec3) -> Vec2 {
        let w = pos.z * self.config.focal;
        Vec2::new(pos.x / w, pos.y / w)
    }

    fn color(&self, particle: &Particle, proximity: f32, time_secs: f32) -> Rgb {
        let b = (proximity * 255.0).floor();
        let Vec3 { x, y, .. } = particle.pos;
        if self.config.shimmer {
            Rgb::new(
                b + (time_secs + x).sin() * 8.0,
                b + (time_secs + y + 2.0).sin() * 8.0,
                b + (time_secs + x + 4.0).sin() * 12.0,
            )
            .clamped()
        } else {
            Rgb::new(b, b + 15.0, b + 30.0).clamped()
        }
    }
}

fn star_outline(center: Vec2, radius: f32, out: &mut Vec<Vec2>) {
    out.clear();
    let inner = radius * config::STAR_INNER_RATIO;
    for i in 0..STAR_POINTS {
        let angle = i as f32 * FRAC_PI_4;
        out.push(center + Vec2::new(angle.cos(), angle.sin()) * radius);
        let half = angle + FRAC_PI_8;
        out.push(center + Vec2::new(half.cos(), half.sin()) * inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::FrameBuffer;
    use proptest::prelude::*;

    /// Records draw calls instead of rasterising them.
    #[derive(Default)]
    struct RecordingSurface {
        width: f32,
        height: f32,
        fades: usize,
        discs: Vec<(Vec2, f32)>,
        polygons: Vec<usize>,
        lines: Vec<(Vec2, Vec2, f32)>,
    }

    impl RecordingSurface {
        fn new(width: f32, height: f32) -> Self {
            Self {
                width,
                height,
                ..Self::default()
            }
        }
    }

    impl Surface for RecordingSurface {
        fn width(&self) -> f32 {
            self.width
        }

        fn height(&self) -> f32 {
            self.height
        }

        fn fade(&mut self, _color: Rgb, _alpha: f32) {
            self.fades += 1;
        }

        fn fill_disc(&mut self, center: Vec2, radius: f32, _color: Rgb) {
            self.discs.push((center, radius));
        }

        fn fill_polygon(&mut self, points: &[Vec2], _color: Rgb) {
            self.polygons.push(points.len());
        }

        fn stroke_line(&mut self, from: Vec2, to: Vec2, _width: f32, _color: Rgb, alpha: f32) {
            self.lines.push((from, to, alpha));
        }
    }

    fn small(count: usize) -> StarfieldConfig {
        StarfieldConfig {
            particle_count: count,
            ..StarfieldConfig::classic()
        }
    }

    fn running(config: StarfieldConfig, seed: u64) -> StarfieldEngine {
        let mut engine = StarfieldEngine::new(config, Some(seed));
        engine.start();
        engine
    }

    mod init {
        use super::*;

        #[test]
        fn allocates_configured_pool() {
            let engine = StarfieldEngine::new(small(1600), Some(1));
            assert_eq!(engine.particles().len(), 1600);
        }

        #[test]
        fn particles_start_inside_the_field() {
            let engine = StarfieldEngine::new(small(2000), Some(2));
            for p in engine.particles() {
                assert!(p.pos.x >= -1000.0 && p.pos.x < 1000.0);
                assert!(p.pos.y >= -1000.0 && p.pos.y < 1000.0);
                assert!(p.pos.z > 0.0 && p.pos.z <= 2000.0);
                assert!(p.size_scale() >= 0.07 && p.size_scale() < 1.4);
                assert!(p.prev.is_none());
            }
        }

        #[test]
        fn engine_is_idle_until_started() {
            let mut engine = StarfieldEngine::new(small(10), Some(3));
            let mut surface = RecordingSurface::new(800.0, 600.0);
            assert_eq!(engine.tick(Some(&mut surface), 0.0), FrameOutcome::Stopped);
            assert_eq!(surface.fades, 0);
            assert_eq!(engine.speed(), 0.0);
        }

        #[test]
        fn same_seed_gives_same_field() {
            let a = StarfieldEngine::new(small(50), Some(9));
            let b = StarfieldEngine::new(small(50), Some(9));
            for (pa, pb) in a.particles().iter().zip(b.particles()) {
                assert_eq!(pa.pos, pb.pos);
            }
        }
    }

    mod presets {
        use super::*;

        #[test]
        fn classic_draws_discs() {
            let c = StarfieldConfig::classic();
            assert_eq!(c.particle_count, 1620);
            assert_eq!(c.shape, StarShape::Disc);
            assert!(!c.shimmer);
            assert!(c.validate().is_ok());
        }

        #[test]
        fn prismatic_draws_shimmering_stars() {
            let c = StarfieldConfig::prismatic();
            assert_eq!(c.particle_count, 1782);
            assert_eq!(c.shape, StarShape::Star);
            assert!(c.shimmer);
            assert!(c.validate().is_ok());
        }

        #[test]
        fn cruise_sits_below_trail_threshold() {
            for c in [StarfieldConfig::classic(), StarfieldConfig::prismatic()] {
                assert!(c.cruise_speed < c.trail_threshold);
            }
        }

        #[test]
        fn rejects_empty_pool_and_bad_smoothing() {
            assert!(small(0).validate().is_err());
            let mut c = StarfieldConfig::classic();
            c.smoothing = 1.5;
            assert!(c.validate().is_err());
            c.smoothing = 0.05;
            c.focal = 0.0;
            assert!(c.validate().is_err());
        }

        #[test]
        fn rejects_oversized_radius_and_bad_fade() {
            let mut c = StarfieldConfig::classic();
            c.base_radius = 1e9;
            assert!(c.validate().is_err());
            c.base_radius = f32::NAN;
            assert!(c.validate().is_err());
            c.base_radius = 0.0;
            assert!(c.validate().is_err());

            let mut c = StarfieldConfig::classic();
            c.fade_alpha = 1.5;
            assert!(c.validate().is_err());
            c.fade_alpha = -0.1;
            assert!(c.validate().is_err());
            c.fade_alpha = f32::NAN;
            assert!(c.validate().is_err());

            let mut c = StarfieldConfig::classic();
            c.trail_threshold = f32::INFINITY;
            assert!(c.validate().is_err());
            assert!(StarfieldConfig::prismatic().validate().is_ok());
        }
    }

    mod speed {
        use super::*;

        #[test]
        fn first_jump_tick_reaches_five_percent() {
            let mut config = small(1600);
            config.cruise_speed = 0.0;
            let mut engine = running(config, 4);
            engine.set_urgent(true);
            let mut surface = RecordingSurface::new(1920.0, 1080.0);
            engine.tick(Some(&mut surface), 0.0);
            assert!((engine.speed() - 5.0).abs() < 1e-4);
        }

        #[test]
        fn urgency_switches_target() {
            let mut engine = running(small(1), 5);
            assert_eq!(engine.target_speed(), config::CRUISE_SPEED);
            engine.set_urgent(true);
            assert_eq!(engine.target_speed(), config::JUMP_SPEED);
            engine.set_urgent(false);
            assert_eq!(engine.target_speed(), config::CRUISE_SPEED);
        }

        #[test]
        fn decelerates_back_toward_cruise() {
            let mut engine = running(small(5), 6);
            let mut surface = RecordingSurface::new(400.0, 400.0);
            engine.set_urgent(true);
            for _ in 0..60 {
                engine.tick(Some(&mut surface), 0.0);
            }
            let peak = engine.speed();
            engine.set_urgent(false);
            engine.tick(Some(&mut surface), 0.0);
            assert!(engine.speed() < peak);
            assert!(engine.speed() > config::CRUISE_SPEED);
        }
    }

    mod lifecycle {
        use super::*;

        #[test]
        fn missing_surface_skips_frame_without_advancing() {
            let mut engine = running(small(20), 7);
            engine.set_urgent(true);
            let before: Vec<f32> = engine.particles().iter().map(|p| p.pos.z).collect();
            assert_eq!(
                engine.tick::<RecordingSurface>(None, 0.0),
                FrameOutcome::Skipped
            );
            let after: Vec<f32> = engine.particles().iter().map(|p| p.pos.z).collect();
            assert_eq!(before, after);
            assert_eq!(engine.speed(), 0.0);

            let mut surface = RecordingSurface::new(800.0, 600.0);
            assert!(matches!(
                engine.tick(Some(&mut surface), 0.0),
                FrameOutcome::Drawn { .. }
            ));
        }

        #[test]
        fn stop_halts_ticks() {
            let mut engine = running(small(20), 8);
            engine.stop();
            assert!(!engine.is_running());
            let mut surface = RecordingSurface::new(800.0, 600.0);
            assert_eq!(engine.tick(Some(&mut surface), 0.0), FrameOutcome::Stopped);
            assert_eq!(surface.fades, 0);
        }

        #[test]
        fn every_frame_fades_once() {
            let mut engine = running(small(20), 10);
            let mut surface = RecordingSurface::new(800.0, 600.0);
            for _ in 0..3 {
                engine.tick(Some(&mut surface), 0.0);
            }
            assert_eq!(surface.fades, 3);
        }
    }

    mod rendering {
        use super::*;

        fn single(pos: Vec3, shape: StarShape) -> StarfieldEngine {
            let mut config = small(1);
            config.shape = shape;
            config.cruise_speed = 0.0;
            let mut engine = running(config, 11);
            engine.particles[0].pos = pos;
            engine.particles[0].size_scale = 1.0;
            engine
        }

        #[test]
        fn projects_through_the_focal_constant() {
            let mut engine = single(Vec3::new(100.0, -50.0, 1000.0), StarShape::Disc);
            let mut surface = RecordingSurface::new(800.0, 600.0);
            engine.tick(Some(&mut surface), 0.0);
            let (center, radius) = surface.discs[0];
            assert!((center.x - 500.0).abs() < 1e-3);
            assert!((center.y - 250.0).abs() < 1e-3);
            assert!((radius - 1.4).abs() < 1e-4);
        }

        #[test]
        fn off_screen_particles_are_skipped_not_removed() {
            let mut engine = single(Vec3::new(900.0, 0.0, 100.0), StarShape::Disc);
            let mut surface = RecordingSurface::new(800.0, 600.0);
            let outcome = engine.tick(Some(&mut surface), 0.0);
            assert_eq!(outcome, FrameOutcome::Drawn { visible: 0, trails: 0 });
            assert!(surface.discs.is_empty());
            assert_eq!(engine.particles().len(), 1);
        }

        #[test]
        fn off_screen_particles_still_record_their_projection() {
            let mut engine = single(Vec3::new(900.0, 0.0, 100.0), StarShape::Disc);
            let mut surface = RecordingSurface::new(800.0, 600.0);
            engine.tick(Some(&mut surface), 0.0);
            let prev = engine.particles()[0].prev.expect("projection recorded");
            assert!((prev.x - 9000.0).abs() < 1e-2);
            assert!(prev.y.abs() < 1e-4);
        }

        #[test]
        fn far_particles_keep_minimum_radius() {
            let mut engine = single(Vec3::new(0.0, 0.0, 2000.0), StarShape::Disc);
            let mut surface = RecordingSurface::new(800.0, 600.0);
            engine.tick(Some(&mut surface), 0.0);
            assert_eq!(surface.discs[0].1, config::MIN_RADIUS);
        }

        #[test]
        fn star_shape_has_sixteen_vertices() {
            let mut engine = single(Vec3::new(0.0, 0.0, 500.0), StarShape::Star);
            let mut surface = RecordingSurface::new(800.0, 600.0);
            engine.tick(Some(&mut surface), 0.0);
            assert_eq!(surface.polygons, vec![16]);
            assert!(surface.discs.is_empty());
        }

        #[test]
        fn star_outline_alternates_outer_and_inner() {
            let mut out = Vec::new();
            star_outline(Vec2::ZERO, 10.0, &mut out);
            assert!((out[0].length() - 10.0).abs() < 1e-4);
            assert!((out[1].length() - 4.0).abs() < 1e-4);
        }

        #[test]
        fn classic_tint_is_blue_shifted() {
            let engine = single(Vec3::new(0.0, 0.0, 1000.0), StarShape::Disc);
            let c = engine.color(&engine.particles[0], 0.5, 0.0);
            assert_eq!(c, Rgb::new(127.0, 142.0, 157.0));
        }

        #[test]
        fn shimmer_stays_near_brightness() {
            let mut engine = single(Vec3::new(3.0, 7.0, 1000.0), StarShape::Star);
            engine.config.shimmer = true;
            let p = engine.particles[0];
            for t in [0.0, 1.3, 42.0] {
                let c = engine.color(&p, 0.5, t);
                assert!((c.r - 127.0).abs() <= 8.0);
                assert!((c.g - 127.0).abs() <= 8.0);
                assert!((c.b - 127.0).abs() <= 12.0);
            }
        }
    }

    mod trails {
        use super::*;

        #[test]
        fn no_trails_at_cruise() {
            let mut engine = running(small(400), 12);
            let mut surface = RecordingSurface::new(1600.0, 900.0);
            for _ in 0..30 {
                engine.tick(Some(&mut surface), 0.0);
            }
            assert!(surface.lines.is_empty());
        }

        #[test]
        fn trails_appear_once_jump_passes_threshold() {
            let mut engine = running(small(400), 13);
            engine.set_urgent(true);
            let mut surface = RecordingSurface::new(1600.0, 900.0);
            let mut total = 0;
            for _ in 0..10 {
                if let FrameOutcome::Drawn { trails, .. } = engine.tick(Some(&mut surface), 0.0) {
                    total += trails;
                }
            }
            assert!(engine.speed() > config::TRAIL_THRESHOLD);
            assert!(total > 0);
            assert_eq!(surface.lines.len(), total);
            for (_, _, alpha) in &surface.lines {
                assert!(*alpha >= 0.0 && *alpha <= config::TRAIL_ALPHA_SCALE);
            }
        }

        #[test]
        fn trail_starts_at_previous_projection() {
            let mut config = small(1);
            config.cruise_speed = 10.0;
            config.smoothing = 1.0;
            let mut engine = running(config, 14);
            engine.particles[0].pos = Vec3::new(100.0, 100.0, 1500.0);
            let mut surface = RecordingSurface::new(800.0, 600.0);
            engine.tick(Some(&mut surface), 0.0);
            let first = surface.discs[0].0;
            engine.tick(Some(&mut surface), 0.0);
            let (from, to, _) = surface.lines[0];
            assert_eq!(from, first);
            assert_eq!(to, surface.discs[1].0);
        }
    }

    mod respawn {
        use super::*;

        #[test]
        fn crossing_near_plane_resets_depth_and_keeps_scale() {
            let mut config = small(1);
            config.cruise_speed = 50.0;
            config.smoothing = 1.0;
            let mut engine = running(config, 15);
            engine.particles[0].pos = Vec3::new(5000.0, -5000.0, 30.0);
            engine.particles[0].prev = Some(Vec2::new(1.0, 1.0));
            let scale = engine.particles[0].size_scale();
            let mut surface = RecordingSurface::new(800.0, 600.0);
            engine.tick(Some(&mut surface), 0.0);
            let p = engine.particles()[0];
            assert_eq!(p.pos.z, 2000.0);
            assert_eq!(p.size_scale(), scale);
            assert!(surface.lines.is_empty());
        }

        #[test]
        fn respawn_scatters_across_the_field() {
            let mut config = small(1);
            config.cruise_speed = 50.0;
            config.smoothing = 1.0;
            let mut engine = running(config, 17);
            engine.particles[0].pos = Vec3::new(5000.0, -5000.0, 30.0);
            let mut surface = RecordingSurface::new(800.0, 600.0);
            engine.tick(Some(&mut surface), 0.0);
            let p = engine.particles()[0];
            assert_ne!(p.pos.x, 5000.0);
            assert_ne!(p.pos.y, -5000.0);
            assert!((-1000.0..1000.0).contains(&p.pos.x));
            assert!((-1000.0..1000.0).contains(&p.pos.y));
        }

        #[test]
        fn framebuffer_survives_a_long_jump() {
            let mut engine = running(small(300), 16);
            engine.set_urgent(true);
            let mut fb = FrameBuffer::new(200, 100);
            for frame in 0..200 {
                engine.tick(Some(&mut fb), frame as f32 / 60.0);
            }
            assert_eq!(engine.particles().len(), 300);
        }
    }

    proptest! {
        #[test]
        fn depth_stays_in_range(
            seed in any::<u64>(),
            urgency in prop::collection::vec(any::<bool>(), 1..120),
        ) {
            let mut engine = running(small(64), seed);
            let mut surface = RecordingSurface::new(640.0, 480.0);
            for urgent in urgency {
                engine.set_urgent(urgent);
                engine.tick(Some(&mut surface), 0.0);
                for p in engine.particles() {
                    prop_assert!(p.pos.z > 0.0 && p.pos.z <= 2000.0);
                    prop_assert!(p.pos.x.abs() <= 1000.0 && p.pos.y.abs() <= 1000.0);
                }
            }
        }

        #[test]
        fn size_scale_and_pool_are_fixed(
            seed in any::<u64>(),
            frames in 1usize..150,
        ) {
            let mut engine = running(small(32), seed);
            let scales: Vec<f32> = engine.particles().iter().map(|p| p.size_scale()).collect();
            engine.set_urgent(true);
            let mut surface = RecordingSurface::new(640.0, 480.0);
            for _ in 0..frames {
                engine.tick(Some(&mut surface), 0.0);
            }
            prop_assert_eq!(engine.particles().len(), 32);
            let after: Vec<f32> = engine.particles().iter().map(|p| p.size_scale()).collect();
            prop_assert_eq!(scales, after);
        }

        #[test]
        fn speed_approaches_target_without_overshoot(
            start_urgent in any::<bool>(),
            warmup in 0usize..80,
            frames in 1usize..80,
        ) {
            let mut engine = running(small(1), 0);
            let mut surface = RecordingSurface::new(100.0, 100.0);
            engine.set_urgent(start_urgent);
            for _ in 0..warmup {
                engine.tick(Some(&mut surface), 0.0);
            }
            engine.set_urgent(!start_urgent);
            let target = engine.target_speed();
            let mut gap = (target - engine.speed()).abs();
            let side = (target - engine.speed()).signum();
            for _ in 0..frames {
                engine.tick(Some(&mut surface), 0.0);
                let next_gap = (target - engine.speed()).abs();
                prop_assert!(next_gap <= gap);
                if next_gap > 0.0 {
                    prop_assert_eq!((target - engine.speed()).signum(), side);
                }
                gap = next_gap;
            }
        }
    }
}
