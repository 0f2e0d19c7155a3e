//! Conversions between the sensor's Kelvin readings and Celsius.

pub const CELSIUS_OFFSET: f64 = 273.15;

#[inline]
pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - CELSIUS_OFFSET
}

#[inline]
pub fn celsius_to_kelvin(celsius: f64) -> f64 {
    celsius + CELSIUS_OFFSET
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_temperature() {
        assert!((kelvin_to_celsius(310.15) - 37.).abs() < 1e-9);
        assert_eq!(kelvin_to_celsius(CELSIUS_OFFSET), 0.);
    }

    #[test]
    fn round_trip() {
        for &k in &[0., 1., 250.5, 273.15, 295.8, 305.372, 310.15, 1e4] {
            let back = celsius_to_kelvin(kelvin_to_celsius(k));
            assert!((back - k).abs() <= 1e-12 * k.abs().max(1.), "{} -> {}", k, back);
        }
    }
}
