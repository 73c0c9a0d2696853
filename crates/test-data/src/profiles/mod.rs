//! Athletic performance profiles.
//!
//! A profile decides how fast the athlete moves on a given grade and how hard
//! their heart works doing it. The ground-truth generator samples both once per
//! second.

mod cyclist;
mod runner;

pub use cyclist::CyclistProfile;
pub use runner::RunnerProfile;

use rand_distr::{Distribution, Normal};

pub trait AthleteProfile: Send + Sync {
    /// Sport label written into TCX files (`Running`, `Biking`).
    fn sport(&self) -> &'static str;

    /// Base speed on flat terrain in meters per second.
    fn base_speed_mps(&self) -> f64;

    /// Speed multiplier for a grade given as a fraction (0.05 = 5%).
    fn grade_factor(&self, grade: f64) -> f64;

    /// Day-to-day performance variance as a coefficient of variation.
    fn variance(&self) -> f64;

    /// Steady-state heart rate on flat terrain at base speed.
    fn working_heart_rate(&self) -> f64;

    /// Extra bpm per unit of grade.
    fn heart_rate_grade_gain(&self) -> f64 {
        300.0
    }
}

pub fn speed_at_grade(profile: &dyn AthleteProfile, grade: f64, variance_factor: f64) -> f64 {
    let target = profile.base_speed_mps() * profile.grade_factor(grade);
    (target * variance_factor).max(0.5)
}

/// Heart rate the athlete drifts towards on the given grade.
pub fn target_heart_rate(profile: &dyn AthleteProfile, grade: f64) -> f64 {
    let working = profile.working_heart_rate();
    (working + grade * profile.heart_rate_grade_gain()).clamp(working - 40.0, working + 35.0)
}

/// Samples a "form of the day" multiplier around 1.0.
pub fn sample_variance(profile: &dyn AthleteProfile, rng: &mut impl rand::Rng) -> f64 {
    match Normal::new(1.0, profile.variance()) {
        Ok(normal) if profile.variance() > 0.0 => normal.sample(rng).clamp(0.7, 1.4),
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_heart_rate_rises_uphill() {
        let runner = RunnerProfile::default();
        let flat = target_heart_rate(&runner, 0.0);
        assert!((flat - runner.working_heart_rate()).abs() < 1e-9);
        assert!(target_heart_rate(&runner, 0.05) > flat);
        assert!(target_heart_rate(&runner, -0.05) < flat);
        assert!(target_heart_rate(&runner, 1.0) <= flat + 35.0);
    }

    #[test]
    fn test_speed_has_floor() {
        let runner = RunnerProfile::default();
        assert!(speed_at_grade(&runner, 0.9, 1.0) >= 0.5);
    }
}
