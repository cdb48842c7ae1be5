use serde::Serialize;

use crate::ocr::{BBoxPx, OcrDetection};

pub const DEFAULT_FONT_NAME: &str = "Arial";
pub const DEFAULT_FONT_SIZE: u32 = 14;

/// One detected text box with its recognized and translated text.
///
/// `rect` and `original_text` are fixed at detection time; only the
/// translation and presentation attributes change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBlock {
    id: usize,
    rect: BBoxPx,
    original_text: String,
    pub translated_text: String,
    pub font_name: String,
    pub font_size: u32,
}

impl TextBlock {
    pub fn new(id: usize, rect: BBoxPx, original_text: impl Into<String>) -> Self {
        Self {
            id,
            rect,
            original_text: original_text.into(),
            translated_text: String::new(),
            font_name: DEFAULT_FONT_NAME.to_string(),
            font_size: DEFAULT_FONT_SIZE,
        }
    }

    pub fn with_font(mut self, font_name: impl Into<String>, font_size: u32) -> Self {
        self.font_name = font_name.into();
        self.font_size = font_size;
        self
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn rect(&self) -> &BBoxPx {
        &self.rect
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }
}

#[derive(Debug, Clone)]
pub struct BlockDefaults {
    pub font_name: String,
    pub font_size: u32,
    pub page_size: Option<(u32, u32)>,
}

impl Default for BlockDefaults {
    fn default() -> Self {
        Self {
            font_name: DEFAULT_FONT_NAME.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            page_size: None,
        }
    }
}

/// One block per detection, ids following detection order.
pub fn materialize(detections: &[OcrDetection], defaults: &BlockDefaults) -> Vec<TextBlock> {
    detections
        .iter()
        .enumerate()
        .map(|(id, detection)| {
            let mut rect = detection.bbox();
            if let Some((width, height)) = defaults.page_size {
                rect = rect.clamp_to(width, height);
            }
            TextBlock::new(id, rect, detection.text.clone())
                .with_font(defaults.font_name.clone(), defaults.font_size)
        })
        .collect()
}
