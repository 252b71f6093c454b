use serde::{Deserialize, Serialize};

/// An 8-bit-per-channel RGB sample.
///
/// Serialized as a three element array (`[r, g, b]`), which is how reference
/// files store their dominant colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Euclidean distance to `other` in RGB space.
    pub fn distance(self, other: Rgb) -> f64 {
        let dr = f64::from(self.r) - f64::from(other.r);
        let dg = f64::from(self.g) - f64::from(other.g);
        let db = f64::from(self.b) - f64::from(other.b);
        (dr * dr + dg * dg + db * db).sqrt()
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(c: Rgb) -> Self {
        [c.r, c.g, c.b]
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Known color names in canonical order.
///
/// The order is significant: nearest-name lookups keep the first entry on a
/// tie, so `gray` wins over `grey` and `green` over `lime`.
pub const PALETTE: &[(&str, Rgb)] = &[
    ("red", Rgb::new(255, 0, 0)),
    ("green", Rgb::new(0, 255, 0)),
    ("blue", Rgb::new(0, 0, 255)),
    ("yellow", Rgb::new(255, 255, 0)),
    ("cyan", Rgb::new(0, 255, 255)),
    ("magenta", Rgb::new(255, 0, 255)),
    ("orange", Rgb::new(255, 165, 0)),
    ("purple", Rgb::new(128, 0, 128)),
    ("pink", Rgb::new(255, 192, 203)),
    ("brown", Rgb::new(165, 42, 42)),
    ("gray", Rgb::new(128, 128, 128)),
    ("grey", Rgb::new(128, 128, 128)),
    ("black", Rgb::new(0, 0, 0)),
    ("white", Rgb::new(255, 255, 255)),
    ("lime", Rgb::new(0, 255, 0)),
    ("navy", Rgb::new(0, 0, 128)),
    ("teal", Rgb::new(0, 128, 128)),
    ("olive", Rgb::new(128, 128, 0)),
    ("maroon", Rgb::new(128, 0, 0)),
    ("silver", Rgb::new(192, 192, 192)),
    ("gold", Rgb::new(255, 215, 0)),
];

/// Distance between opposite corners of the RGB cube, `sqrt(3 * 255^2)`.
pub const MAX_DISTANCE: f64 = 441.672_955_930_063_7;

/// Case-insensitive palette lookup.
pub fn lookup(name: &str) -> Option<Rgb> {
    PALETTE
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(name))
        .map(|(_, rgb)| *rgb)
}

/// Palette lookup that treats unknown names as black.
///
/// Scores for unrecognised color strings depend on this fallback, so it must
/// stay black.
pub fn rgb_for_name(name: &str) -> Rgb {
    lookup(name).unwrap_or(Rgb::BLACK)
}

/// Name of the palette entry closest to `rgb`.
pub fn closest_color_name(rgb: Rgb) -> &'static str {
    let mut best_name = PALETTE[0].0;
    let mut best_distance = f64::INFINITY;

    for &(name, candidate) in PALETTE {
        let distance = rgb.distance(candidate);
        if distance < best_distance {
            best_name = name;
            best_distance = distance;
        }
    }

    best_name
}

/// Similarity of two color names in `[0, 1]`, where `1.0` means identical RGB.
pub fn color_similarity(a: &str, b: &str) -> f64 {
    let distance = rgb_for_name(a).distance(rgb_for_name(b));
    (1.0 - distance / MAX_DISTANCE).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_distance_matches_cube_diagonal() {
        let computed = (3.0_f64 * 255.0 * 255.0).sqrt();
        assert!((MAX_DISTANCE - computed).abs() < 1e-9);
        assert_eq!(Rgb::BLACK.distance(Rgb::new(255, 255, 255)), computed);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup("Navy"), Some(Rgb::new(0, 0, 128)));
        assert_eq!(lookup("NAVY"), Some(Rgb::new(0, 0, 128)));
        assert_eq!(lookup("chartreuse"), None);
    }

    #[test]
    fn unknown_names_fall_back_to_black() {
        assert_eq!(rgb_for_name("chartreuse"), Rgb::BLACK);
        assert_eq!(color_similarity("chartreuse", "black"), 1.0);
        assert_eq!(color_similarity("chartreuse", "white"), 0.0);
    }

    #[test]
    fn identical_names_are_fully_similar() {
        for (name, _) in PALETTE {
            assert_eq!(color_similarity(name, name), 1.0, "{name}");
            assert_eq!(color_similarity(name, &name.to_uppercase()), 1.0, "{name}");
        }
    }

    #[test]
    fn similarity_is_bounded_and_symmetric() {
        for (a, _) in PALETTE {
            for (b, _) in PALETTE {
                let ab = color_similarity(a, b);
                assert!((0.0..=1.0).contains(&ab), "{a} vs {b} = {ab}");
                assert_eq!(ab, color_similarity(b, a), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn red_versus_blue() {
        let s = color_similarity("red", "blue");
        let expected = 1.0 - (2.0_f64 * 255.0 * 255.0).sqrt() / MAX_DISTANCE;
        assert!((s - expected).abs() < 1e-12);
        assert!((s - 0.1835).abs() < 1e-3);
    }

    #[test]
    fn opposite_corners_have_zero_similarity() {
        assert_eq!(color_similarity("black", "white"), 0.0);
        assert_eq!(color_similarity("red", "cyan"), 0.0);
    }

    #[test]
    fn closest_name_prefers_first_duplicate() {
        assert_eq!(closest_color_name(Rgb::new(128, 128, 128)), "gray");
        assert_eq!(closest_color_name(Rgb::new(0, 255, 0)), "green");
    }

    #[test]
    fn closest_name_for_near_samples() {
        assert_eq!(closest_color_name(Rgb::new(250, 10, 5)), "red");
        assert_eq!(closest_color_name(Rgb::new(10, 10, 120)), "navy");
        assert_eq!(closest_color_name(Rgb::new(250, 210, 20)), "gold");
        assert_eq!(closest_color_name(Rgb::new(3, 3, 3)), "black");
    }

    #[test]
    fn rgb_serializes_as_array() {
        let json = serde_json::to_string(&Rgb::new(1, 2, 3)).unwrap();
        assert_eq!(json, "[1,2,3]");
        let back: Rgb = serde_json::from_str("[255,0,128]").unwrap();
        assert_eq!(back, Rgb::new(255, 0, 128));
    }
}
