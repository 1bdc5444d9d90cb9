//! Image fitting math

use crate::LayoutConfig;

/// Where an image lands on the page, in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    /// Lower-left corner
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Scale an image into a box, keeping its aspect ratio
///
/// The image is fit to the box width first; when that makes it taller than
/// the box it is fit to the height instead.
///
/// # Returns
/// `(width, height)` of the scaled image. Degenerate inputs give `(0, 0)`.
pub fn fit_image(
    image_width: f32,
    image_height: f32,
    available_width: f32,
    available_height: f32,
) -> (f32, f32) {
    if image_width <= 0.0 || image_height <= 0.0 || available_width <= 0.0 || available_height <= 0.0
    {
        return (0.0, 0.0);
    }

    let aspect_ratio = image_width / image_height;
    let height = available_width / aspect_ratio;
    if height <= available_height {
        (available_width, height)
    } else {
        (available_height * aspect_ratio, available_height)
    }
}

impl LayoutConfig {
    /// Fit and center an image inside a section's available area
    ///
    /// The available area starts at `horizontal_inset / 2` on the left and
    /// `footer_height + vertical_margin` at the bottom.
    pub fn image_placement(
        &self,
        image_width: u32,
        image_height: u32,
        section_width: f32,
        section_height: f32,
    ) -> ImagePlacement {
        let (available_width, available_height) =
            self.available_area(section_width, section_height);
        let (width, height) = fit_image(
            image_width as f32,
            image_height as f32,
            available_width,
            available_height,
        );

        ImagePlacement {
            x: self.horizontal_inset / 2.0 + (available_width - width) / 2.0,
            y: self.footer_height + self.vertical_margin + (available_height - height) / 2.0,
            width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_fit_wide_image_to_width() {
        assert_eq!(fit_image(200.0, 100.0, 150.0, 100.0), (150.0, 75.0));
    }

    #[test]
    fn test_fit_tall_image_to_height() {
        assert_eq!(fit_image(100.0, 400.0, 150.0, 100.0), (25.0, 100.0));
    }

    #[test]
    fn test_fit_exact_box() {
        assert_eq!(fit_image(300.0, 200.0, 150.0, 100.0), (150.0, 100.0));
    }

    #[test]
    fn test_fit_degenerate() {
        assert_eq!(fit_image(0.0, 100.0, 150.0, 100.0), (0.0, 0.0));
        assert_eq!(fit_image(100.0, 100.0, 0.0, 100.0), (0.0, 0.0));
    }

    #[test]
    fn test_fit_preserves_aspect_ratio() {
        let boxes = [(150.0, 100.0), (270.63, 455.28), (40.0, 500.0), (500.0, 40.0)];
        let images = [(1.0, 1.0), (1920.0, 1080.0), (1080.0, 1920.0), (3.0, 7.0), (4000.0, 10.0)];

        for (box_width, box_height) in boxes {
            for (image_width, image_height) in images {
                let ratio = image_width / image_height;
                let (width, height) = fit_image(image_width, image_height, box_width, box_height);

                assert!(width <= box_width + 1e-3 && height <= box_height + 1e-3);
                assert!(
                    ((width / height) - ratio).abs() / ratio < 1e-4,
                    "{image_width}x{image_height} in {box_width}x{box_height}"
                );
                if box_width / ratio <= box_height {
                    assert_eq!(width, box_width);
                } else {
                    assert_eq!(height, box_height);
                }
            }
        }
    }

    #[test]
    fn test_placement_margins() {
        let config = LayoutConfig::default();
        // Section chosen so the available area is 150 x 100
        let placement = config.image_placement(200, 100, 160.0, 140.0);

        assert_eq!(placement.width, 150.0);
        assert_eq!(placement.height, 75.0);
        assert_eq!(placement.x, 5.0);
        assert_eq!(placement.y, 50.0 + 20.0 + 12.5);
    }

    #[test]
    fn test_placement_is_centered() {
        let config = LayoutConfig::default();
        let section_width = config.section_width();
        let section_height = config.section_height();
        let (available_width, available_height) =
            config.available_area(section_width, section_height);
        let left = config.horizontal_inset / 2.0;
        let bottom = config.footer_height + config.vertical_margin;

        for (image_width, image_height) in [(1920, 1080), (1080, 1920), (500, 500), (10, 3000)] {
            let placement =
                config.image_placement(image_width, image_height, section_width, section_height);

            let left_margin = placement.x - left;
            let right_margin = left + available_width - (placement.x + placement.width);
            let bottom_margin = placement.y - bottom;
            let top_margin = bottom + available_height - (placement.y + placement.height);

            assert!(close(left_margin, right_margin), "{image_width}x{image_height}");
            assert!(close(bottom_margin, top_margin), "{image_width}x{image_height}");
            assert!(left_margin >= -1e-3 && bottom_margin >= -1e-3);
        }
    }
}
