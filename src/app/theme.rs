use crate::utils::color::ColorExt;
use eframe::egui::Color32;

const GRAY_100: &str = "#EDF2F7";
const GRAY_200: &str = "#E2E8F0";
const GRAY_300: &str = "#CBD5E0";
const GREEN_200: &str = "#9AE6B4";
const GREEN_300: &str = "#68D391";
const TEAL_500: &str = "#319795";
const RED_500: &str = "#E53E3E";

fn color(hex: &str) -> Color32 {
    Color32::from_hex(hex).unwrap_or(Color32::GRAY)
}

pub fn drop_zone_fill(has_image: bool, dragging: bool) -> Color32 {
    match (has_image, dragging) {
        (true, true) => color(GREEN_300),
        (true, false) => color(GREEN_200),
        (false, true) => color(GRAY_300),
        (false, false) => color(GRAY_200),
    }
}

pub fn gallery_fill() -> Color32 {
    color(GRAY_100)
}

pub fn accent() -> Color32 {
    color(TEAL_500)
}

pub fn error() -> Color32 {
    color(RED_500)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_zone_changes_with_image_and_drag() {
        let fills = [
            drop_zone_fill(false, false),
            drop_zone_fill(false, true),
            drop_zone_fill(true, false),
            drop_zone_fill(true, true),
        ];
        for (i, a) in fills.iter().enumerate() {
            for b in &fills[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_ne!(drop_zone_fill(false, false), Color32::GRAY);
    }
}
