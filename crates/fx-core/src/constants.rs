// Shared tuning constants used by the core models and the web frontend.

// Frame timing
pub const FRAME_DT_SEC: f32 = 1.0 / 60.0; // fixed integration step
pub const FRAME_MS: f64 = 16.0; // 60 fps baseline used to normalise velocities
pub const POINTER_THROTTLE_MS: f64 = 16.0; // minimum gap between accepted pointer samples

// Spring settling thresholds (same units as the animated value)
pub const SPRING_SETTLE_EPS: f32 = 0.01;
pub const SPRING_VELOCITY_EPS: f32 = 0.01;

// Spring presets: (stiffness, damping, mass)
pub const SPRING_DEFAULT: (f32, f32, f32) = (100.0, 10.0, 1.0);
pub const SPRING_MAGNETIC: (f32, f32, f32) = (150.0, 15.0, 0.1);
pub const SPRING_STAT_CARD: (f32, f32, f32) = (80.0, 22.0, 0.5);
pub const SPRING_CURSOR_DOT: (f32, f32, f32) = (300.0, 28.0, 0.5);
pub const SPRING_CURSOR_RING: (f32, f32, f32) = (150.0, 22.0, 0.8);

// Pointer proximity
pub const MAGNETIC_STRENGTH: f32 = 0.3;
pub const GLOW_MAX_DISTANCE_PX: f32 = 250.0;
pub const FOCUS_MAX_DISTANCE_PX: f32 = 400.0;
pub const AMBIENT_GLOW_IDLE: f32 = 0.3;
pub const AMBIENT_GLOW_HOVER: f32 = 0.6;
pub const MIN_DISTANCE: f32 = 1e-4; // floor before dividing by a distance

// Field-space (percent) magnetism shared by stat cards and field lines
pub const FIELD_WARP_RADIUS: f32 = 35.0;
pub const FIELD_WARP_STRENGTH: f32 = 12.0;

// Adaptive glass scroll velocity
pub const GLASS_SMOOTH_KEEP: f32 = 0.88; // smooth = smooth*keep + raw*(1-keep)
pub const GLASS_RAW_DECAY: f32 = 0.92;
pub const GLASS_VELOCITY_NORM: f32 = 15.0; // raw px/frame mapped to 1.0
pub const GLASS_STOP_EPS: f32 = 0.01;

// Velocity text
pub const SKEW_DECAY: f32 = 0.85;
pub const SKEW_GAIN: f32 = 1.5;
pub const SKEW_MAX_DEG: f32 = 25.0;
pub const STRETCH_GAIN: f32 = 0.008;
pub const STRETCH_MAX: f32 = 1.15;
pub const SKEW_STOP_EPS: f32 = 0.01;

// Particles
pub const PARTICLE_COUNT: usize = 80;
pub const PARTICLE_COUNT_MAX: usize = 150; // O(n^2) link pass budget
pub const PARTICLE_SPEED: f32 = 0.5;
pub const PARTICLE_DRIFT_Y: f32 = 0.2;
pub const PARTICLE_ATTRACT_RADIUS: f32 = 200.0;
pub const PARTICLE_ATTRACT_GAIN: f32 = 0.02;
pub const PARTICLE_SCROLL_SAMPLE_GAIN: f32 = 0.1;
pub const PARTICLE_SCROLL_DECAY: f32 = 0.95;
pub const PARTICLE_SCROLL_BIAS: f32 = 0.05;
pub const PARTICLE_FLOW_FREQ: f32 = 0.01;
pub const PARTICLE_FLOW_GAIN: f32 = 0.01;
pub const PARTICLE_DAMPING: f32 = 0.99;
pub const PARTICLE_LINK_DISTANCE: f32 = 100.0;
pub const PARTICLE_LINK_ALPHA: f32 = 0.15;
pub const PARTICLE_TRAIL_FILL: &str = "rgba(2, 4, 8, 0.15)";

// Counters
pub const COUNTER_DURATION_MS: f64 = 2400.0;
pub const COUNTER_EASE_KNEE: f64 = 0.85;
pub const COUNTER_OVERSHOOT: f64 = 0.02;
pub const COUNTER_MAX_DECIMALS: u32 = 6;

// Activation wave
pub const WAVE_DURATION_MS: f64 = 1400.0;
pub const WAVE_SPREAD: f64 = 0.75;
pub const WAVE_BASE_DELAY_MS: f64 = 200.0;
pub const WAVE_FAILSAFE_MS: f64 = 3000.0;
pub const WAVE_LIVE_DELAY_MS: f64 = 2200.0;

// Staggered reveal
pub const REVEAL_STEP_SEC: f32 = 0.2;
pub const REVEAL_CHAOS: f32 = 1.5;
pub const REVEAL_MIN_SEC: f32 = 0.15;
