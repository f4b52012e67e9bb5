use colorous::Color;
use eframe::egui::Color32;

/// Cluster label palette. Cluster counts are capped at its length, so a
/// label never runs off the end.
pub const CLUSTER_PALETTE: [Color; 7] = [
    // green
    Color {
        r: 102,
        g: 153,
        b: 0,
    },
    // red
    Color {
        r: 203,
        g: 11,
        b: 10,
    },
    // blue
    Color {
        r: 106,
        g: 182,
        b: 220,
    },
    // grey
    Color {
        r: 155,
        g: 156,
        b: 155,
    },
    // yellow
    Color {
        r: 255,
        g: 153,
        b: 0,
    },
    // pink
    Color {
        r: 204,
        g: 51,
        b: 153,
    },
    // purple
    Color {
        r: 58,
        g: 12,
        b: 163,
    },
];

/// Row-header tint used for chapter-total rows in the detail table.
pub const SUMMARY_ROW_FILL: Color32 = Color32::from_rgb(120, 244, 255);

pub fn cluster_color32(label: usize) -> Color32 {
    debug_assert!(label < CLUSTER_PALETTE.len(), "label {label} outside palette");
    let c = CLUSTER_PALETTE[label % CLUSTER_PALETTE.len()];
    Color32::from_rgb(c.r, c.g, c.b)
}

pub fn contrast_color(bg: Color32) -> Color32 {
    let r = bg.r() as f32 / 255.0;
    let g = bg.g() as f32 / 255.0;
    let b = bg.b() as f32 / 255.0;
    let lum = 0.2126 * r + 0.7152 * g + 0.0722 * b;
    if lum < 0.5 {
        Color32::WHITE
    } else {
        Color32::BLACK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_seven_distinct_colors() {
        for i in 0..CLUSTER_PALETTE.len() {
            for j in (i + 1)..CLUSTER_PALETTE.len() {
                let (a, b) = (CLUSTER_PALETTE[i], CLUSTER_PALETTE[j]);
                assert!(a.r != b.r || a.g != b.g || a.b != b.b);
            }
        }
    }

    #[test]
    fn label_zero_is_green() {
        assert_eq!(cluster_color32(0), Color32::from_rgb(102, 153, 0));
    }

    #[test]
    fn contrast_flips_on_luminance() {
        assert_eq!(contrast_color(Color32::BLACK), Color32::WHITE);
        assert_eq!(contrast_color(Color32::WHITE), Color32::BLACK);
    }
}
