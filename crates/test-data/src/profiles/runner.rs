use super::AthleteProfile;

/// Recreational runner: about 5:00/km on the flat.
#[derive(Debug, Clone)]
pub struct RunnerProfile {
    base_speed: f64,
    variance: f64,
    working_heart_rate: f64,
}

impl Default for RunnerProfile {
    fn default() -> Self {
        Self {
            base_speed: 3.5,
            variance: 0.08,
            working_heart_rate: 152.0,
        }
    }
}

impl RunnerProfile {
    /// Runner with the given flat pace in minutes per kilometer.
    pub fn with_pace(pace_min_per_km: f64) -> Self {
        Self {
            base_speed: 1000.0 / (pace_min_per_km * 60.0),
            ..Default::default()
        }
    }
}

impl AthleteProfile for RunnerProfile {
    fn sport(&self) -> &'static str {
        "Running"
    }

    fn base_speed_mps(&self) -> f64 {
        self.base_speed
    }

    fn grade_factor(&self, grade: f64) -> f64 {
        // ~15% slower per 1% up, ~8% faster per 1% down
        if grade >= 0.0 {
            (1.0 - grade * 15.0).max(0.2)
        } else {
            (1.0 - grade * 8.0).min(1.5)
        }
    }

    fn variance(&self) -> f64 {
        self.variance
    }

    fn working_heart_rate(&self) -> f64 {
        self.working_heart_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pace() {
        let profile = RunnerProfile::with_pace(5.0);
        assert!((profile.base_speed_mps() - 3.333).abs() < 0.001);
        assert_eq!(profile.sport(), "Running");
    }

    #[test]
    fn test_grade_factors() {
        let profile = RunnerProfile::default();
        assert!((profile.grade_factor(0.0) - 1.0).abs() < 0.01);
        assert!(profile.grade_factor(0.05) < 1.0);
        assert!(profile.grade_factor(-0.05) > 1.0);
    }
}
