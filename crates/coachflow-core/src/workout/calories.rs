//! MET-based calorie estimate.

use crate::subject::Gender;

const MALE_FACTOR: f64 = 1.1;

/// `round(met * weight_kg * minutes / 60 * gender_factor)`.
///
/// Missing, zero, negative or non-finite inputs give 0.
pub fn estimate_calories(
    met_value: Option<f64>,
    weight_kg: Option<f64>,
    duration_minutes: Option<u32>,
    gender: Option<Gender>,
) -> u32 {
    let (Some(met), Some(weight), Some(minutes)) = (met_value, weight_kg, duration_minutes) else {
        return 0;
    };
    if !(met.is_finite() && weight.is_finite()) || met <= 0.0 || weight <= 0.0 || minutes == 0 {
        return 0;
    }

    let factor = match gender {
        Some(Gender::Male) => MALE_FACTOR,
        _ => 1.0,
    };
    let calories = met * weight * (f64::from(minutes) / 60.0) * factor;
    calories.round().min(f64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn female_one_hour_walk() {
        assert_eq!(estimate_calories(Some(3.5), Some(60.0), Some(60), Some(Gender::Female)), 210);
    }

    #[test]
    fn male_factor_applies() {
        assert_eq!(estimate_calories(Some(3.5), Some(60.0), Some(60), Some(Gender::Male)), 231);
    }

    #[test]
    fn half_hour_rounds() {
        // 8.0 * 72.5 * 0.5 = 290
        assert_eq!(estimate_calories(Some(8.0), Some(72.5), Some(30), None), 290);
    }

    #[test]
    fn missing_or_zero_inputs_yield_zero() {
        assert_eq!(estimate_calories(None, Some(70.0), Some(30), None), 0);
        assert_eq!(estimate_calories(Some(5.0), None, Some(30), None), 0);
        assert_eq!(estimate_calories(Some(5.0), Some(70.0), None, None), 0);
        assert_eq!(estimate_calories(Some(0.0), Some(70.0), Some(30), None), 0);
        assert_eq!(estimate_calories(Some(5.0), Some(0.0), Some(30), None), 0);
        assert_eq!(estimate_calories(Some(5.0), Some(70.0), Some(0), None), 0);
        assert_eq!(estimate_calories(Some(f64::NAN), Some(70.0), Some(30), None), 0);
        assert_eq!(estimate_calories(Some(-2.0), Some(70.0), Some(30), None), 0);
    }
}
