use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Deterministic pseudo-random pair in [-1, 1] derived from an id hash.
/// Initial placement stays reproducible per dataset, which keeps layout
/// tests meaningful.
pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

/// Third deterministic component for 3D placement, decorrelated from
/// `stable_pair` by salting the hash input.
pub fn stable_depth(id: &str) -> f32 {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    0x9e37_79b9_u64.hash(&mut hasher);
    let hash = hasher.finish();

    let z = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    (z * 2.0) - 1.0
}

pub fn format_year(year: i32) -> String {
    if year < 0 {
        format!("{} BCE", -year)
    } else {
        format!("{year}")
    }
}

pub fn format_year_span(start: i32, end: i32) -> String {
    if start == end {
        format_year(start)
    } else {
        format!("{} - {}", format_year(start), format_year(end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_pair_is_deterministic_and_bounded() {
        let (x1, y1) = stable_pair("charlemagne");
        let (x2, y2) = stable_pair("charlemagne");
        assert_eq!((x1, y1), (x2, y2));
        assert!((-1.0..=1.0).contains(&x1));
        assert!((-1.0..=1.0).contains(&y1));
    }

    #[test]
    fn stable_depth_differs_from_pair_components() {
        let (x, y) = stable_pair("byzantium");
        let z = stable_depth("byzantium");
        assert!((-1.0..=1.0).contains(&z));
        assert!(z != x && z != y);
    }

    #[test]
    fn formats_negative_years_as_bce() {
        assert_eq!(format_year(-44), "44 BCE");
        assert_eq!(format_year(1453), "1453");
        assert_eq!(format_year_span(-27, 14), "27 BCE - 14");
        assert_eq!(format_year_span(800, 800), "800");
    }
}
