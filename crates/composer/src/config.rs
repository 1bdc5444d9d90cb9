//! Layout configuration

use crate::{ComposeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Page geometry and labels for the proposal layout
///
/// Every field is optional in JSON; missing fields take the A4 landscape
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Landscape page width in points
    pub page_width: f32,
    /// Landscape page height in points
    pub page_height: f32,
    pub header_height: f32,
    pub footer_height: f32,
    /// Space kept above and below images, and under the footer text
    pub vertical_margin: f32,
    /// Stroke width for every line drawn
    pub line_width: f32,
    /// Horizontal space taken out of a section before fitting an image
    pub horizontal_inset: f32,
    /// Number of equal-width vertical sections
    pub section_count: u32,
    pub draw_section_dividers: bool,
    pub labels: Labels,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_width: 841.89,
            page_height: 595.28,
            header_height: 50.0,
            footer_height: 50.0,
            vertical_margin: 20.0,
            line_width: 1.0,
            horizontal_inset: 10.0,
            section_count: 3,
            draw_section_dividers: false,
            labels: Labels::default(),
        }
    }
}

/// Fixed strings drawn on every page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub title: String,
    /// Prefix of the page number in the header
    pub page_prefix: String,
    pub copyright: String,
    pub description_heading: String,
    pub modification_heading: String,
    /// Drawn when a page has no description
    pub no_description: String,
    /// Drawn when a page has no modification requests
    pub no_modification: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            title: "문서 제목".to_string(),
            page_prefix: "페이지 : ".to_string(),
            copyright: "Copyright © 2024 mBaaS all right reserved".to_string(),
            description_heading: "화면 및 기능 설명".to_string(),
            modification_heading: "수정 요청사항".to_string(),
            no_description: "기능 설명이 없습니다.".to_string(),
            no_modification: "수정 요청사항이 없습니다.".to_string(),
        }
    }
}

impl LayoutConfig {
    /// Parse and validate a config from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Width of one section
    pub fn section_width(&self) -> f32 {
        self.page_width / self.section_count.max(1) as f32
    }

    /// Height between header and footer
    pub fn section_height(&self) -> f32 {
        self.page_height - self.header_height - self.footer_height
    }

    /// Area an image is fit into, for a section of the given size
    pub fn available_area(&self, section_width: f32, section_height: f32) -> (f32, f32) {
        (
            section_width - self.horizontal_inset,
            section_height - 2.0 * self.vertical_margin,
        )
    }

    /// Check that the geometry leaves room to draw
    pub fn validate(&self) -> Result<()> {
        let lengths = [
            ("page_width", self.page_width),
            ("page_height", self.page_height),
            ("header_height", self.header_height),
            ("footer_height", self.footer_height),
            ("vertical_margin", self.vertical_margin),
            ("line_width", self.line_width),
            ("horizontal_inset", self.horizontal_inset),
        ];
        for (name, value) in lengths {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!("{name} must be a non-negative number, got {value}")));
            }
        }

        if self.page_width == 0.0 || self.page_height == 0.0 {
            return Err(invalid("page size must be positive".to_string()));
        }
        if self.section_count == 0 {
            return Err(invalid("section_count must be at least 1".to_string()));
        }

        let (available_width, available_height) =
            self.available_area(self.section_width(), self.section_height());
        if available_width <= 0.0 || available_height <= 0.0 {
            return Err(invalid(format!(
                "margins leave no room for images ({available_width}x{available_height})"
            )));
        }

        Ok(())
    }
}

fn invalid(message: String) -> ComposeError {
    ComposeError::InvalidConfig(message)
}
