use anyhow::Result;
use tray_icon::Icon;

const ICON_SIZE: u32 = 64;
const SUPERSAMPLE: u32 = 4;
const STAR_POINTS: usize = 5;

pub fn create_icon() -> Result<Icon> {
    Ok(Icon::from_rgba(star_rgba(ICON_SIZE), ICON_SIZE, ICON_SIZE)?)
}

/// A filled five-pointed star, black on transparent, antialiased by supersampling.
/// Only the alpha channel matters when the icon is used as a template image.
fn star_rgba(size: u32) -> Vec<u8> {
    let center = size as f32 / 2.0;
    let star = star_vertices(center, center, center * 0.95, center * 0.4);
    let samples = (SUPERSAMPLE * SUPERSAMPLE) as f32;
    let mut data = vec![0u8; (size * size * 4) as usize];

    for y in 0..size {
        for x in 0..size {
            let mut hits = 0u32;
            for sy in 0..SUPERSAMPLE {
                for sx in 0..SUPERSAMPLE {
                    let px = x as f32 + (sx as f32 + 0.5) / SUPERSAMPLE as f32;
                    let py = y as f32 + (sy as f32 + 0.5) / SUPERSAMPLE as f32;
                    if contains(&star, px, py) {
                        hits += 1;
                    }
                }
            }
            let idx = ((y * size + x) * 4) as usize;
            data[idx + 3] = (hits as f32 / samples * 255.0).round() as u8;
        }
    }
    data
}

fn star_vertices(cx: f32, cy: f32, outer: f32, inner: f32) -> Vec<(f32, f32)> {
    (0..STAR_POINTS * 2)
        .map(|i| {
            let radius = if i % 2 == 0 { outer } else { inner };
            let angle = -std::f32::consts::FRAC_PI_2 + i as f32 * std::f32::consts::PI / STAR_POINTS as f32;
            (cx + radius * angle.cos(), cy + radius * angle.sin())
        })
        .collect()
}

/// Even-odd ray cast.
fn contains(polygon: &[(f32, f32)], x: f32, y: f32) -> bool {
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (xi, yi) = polygon[i];
        let (xj, yj) = polygon[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alpha(data: &[u8], size: u32, x: u32, y: u32) -> u8 {
        data[((y * size + x) * 4 + 3) as usize]
    }

    #[test]
    fn star_is_opaque_in_the_middle_and_clear_in_the_corners() {
        let data = star_rgba(ICON_SIZE);

        assert_eq!(data.len(), (ICON_SIZE * ICON_SIZE * 4) as usize);
        assert_eq!(alpha(&data, ICON_SIZE, 32, 32), 255);
        for (x, y) in [(0, 0), (63, 0), (0, 63), (63, 63)] {
            assert_eq!(alpha(&data, ICON_SIZE, x, y), 0, "corner ({}, {})", x, y);
        }
    }

    #[test]
    fn top_point_reaches_near_the_edge() {
        let data = star_rgba(ICON_SIZE);

        assert!(alpha(&data, ICON_SIZE, 32, 4) > 0);
    }

    #[test]
    fn contains_cases() {
        let square = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        let cases = [
            (5.0, 5.0, true),
            (0.5, 9.5, true),
            (-1.0, 5.0, false),
            (5.0, 11.0, false),
        ];

        for (x, y, expected) in cases {
            assert_eq!(contains(&square, x, y), expected, "({}, {})", x, y);
        }
    }

    #[test]
    fn create_icon_accepts_the_buffer() {
        assert!(create_icon().is_ok());
    }
}
