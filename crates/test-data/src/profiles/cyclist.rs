use super::AthleteProfile;

/// Road cyclist: about 28 km/h on the flat, strongly affected by grade.
#[derive(Debug, Clone)]
pub struct CyclistProfile {
    base_speed: f64,
    variance: f64,
    working_heart_rate: f64,
}

impl Default for CyclistProfile {
    fn default() -> Self {
        Self {
            base_speed: 8.0,
            variance: 0.10,
            working_heart_rate: 138.0,
        }
    }
}

impl CyclistProfile {
    pub fn with_speed(speed_kmh: f64) -> Self {
        Self {
            base_speed: speed_kmh / 3.6,
            ..Default::default()
        }
    }
}

impl AthleteProfile for CyclistProfile {
    fn sport(&self) -> &'static str {
        "Biking"
    }

    fn base_speed_mps(&self) -> f64 {
        self.base_speed
    }

    fn grade_factor(&self, grade: f64) -> f64 {
        if grade >= 0.0 {
            (1.0 - grade * 25.0).max(0.15)
        } else {
            (1.0 - grade * 15.0).min(2.5)
        }
    }

    fn variance(&self) -> f64 {
        self.variance
    }

    fn working_heart_rate(&self) -> f64 {
        self.working_heart_rate
    }

    fn heart_rate_grade_gain(&self) -> f64 {
        450.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile() {
        let profile = CyclistProfile::default();
        assert!((profile.base_speed_mps() - 8.0).abs() < 0.01);
        assert_eq!(profile.sport(), "Biking");
    }

    #[test]
    fn test_steep_climb_and_descent() {
        let profile = CyclistProfile::default();
        assert!(profile.grade_factor(0.10) < 0.5);
        assert!(profile.grade_factor(-0.05) > 1.5);
    }
}
