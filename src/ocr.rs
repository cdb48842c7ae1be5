use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Axis-aligned box in original-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BBoxPx {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl BBoxPx {
    pub fn top(&self) -> i64 {
        self.y as i64
    }

    /// Last pixel row covered by the box (`y + h - 1`).
    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.h as i64 - 1
    }

    /// Doubled centre, kept integral so sorting never touches floats.
    pub(crate) fn center2(&self) -> (i64, i64) {
        (
            2 * self.x as i64 + self.w as i64,
            2 * self.y as i64 + self.h as i64,
        )
    }

    pub fn clamp_to(&self, width: u32, height: u32) -> BBoxPx {
        let x = self.x.min(width);
        let y = self.y.min(height);
        BBoxPx {
            x,
            y,
            w: self.w.min(width - x),
            h: self.h.min(height - y),
        }
    }
}

/// One raw OCR record: polygon corners (clockwise from top-left), text, confidence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OcrDetection {
    pub corners: Vec<[f64; 2]>,
    pub text: String,
    pub confidence: f32,
}

impl OcrDetection {
    pub fn new(corners: Vec<[f64; 2]>, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            corners,
            text: text.into(),
            confidence,
        }
    }

    /// Reduces the polygon to a box spanning the first corner and its opposite corner.
    /// Two-point records are read as `(top_left, bottom_right)`.
    pub fn bbox(&self) -> BBoxPx {
        let Some(first) = self.corners.first() else {
            return BBoxPx {
                x: 0,
                y: 0,
                w: 0,
                h: 0,
            };
        };
        let opposite = match self.corners.len() {
            0 | 1 => first,
            2 | 3 => &self.corners[self.corners.len() - 1],
            _ => &self.corners[2],
        };
        let x1 = first[0].min(opposite[0]).max(0.0);
        let y1 = first[1].min(opposite[1]).max(0.0);
        let x2 = first[0].max(opposite[0]).max(0.0);
        let y2 = first[1].max(opposite[1]).max(0.0);
        let x = x1 as u32;
        let y = y1 as u32;
        BBoxPx {
            x,
            y,
            w: (x2 as u32).saturating_sub(x),
            h: (y2 as u32).saturating_sub(y),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DetectionRecord {
    Scored(Vec<[f64; 2]>, String, f32),
    Bare(Vec<[f64; 2]>, String),
    Object {
        #[serde(alias = "box", alias = "polygon")]
        bbox: Vec<[f64; 2]>,
        text: String,
        #[serde(default, alias = "conf", alias = "prob")]
        confidence: Option<f32>,
    },
}

impl From<DetectionRecord> for OcrDetection {
    fn from(record: DetectionRecord) -> Self {
        match record {
            DetectionRecord::Scored(corners, text, confidence) => {
                OcrDetection::new(corners, text, confidence)
            }
            DetectionRecord::Bare(corners, text) => OcrDetection::new(corners, text, 0.0),
            DetectionRecord::Object {
                bbox,
                text,
                confidence,
            } => OcrDetection::new(bbox, text, confidence.unwrap_or(0.0)),
        }
    }
}

pub fn parse_detections(raw: &str) -> Result<Vec<OcrDetection>> {
    let value: Value = serde_json::from_str(raw).with_context(|| "detections are not valid JSON")?;
    let records = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("detections") {
            Some(Value::Array(items)) => items,
            _ => return Err(anyhow!("expected a 'detections' array")),
        },
        _ => return Err(anyhow!("expected an array of detections")),
    };
    records
        .into_iter()
        .enumerate()
        .map(|(idx, record)| {
            let parsed: DetectionRecord = serde_json::from_value(record)
                .with_context(|| format!("invalid detection at index {}", idx))?;
            Ok(parsed.into())
        })
        .collect()
}

pub fn load_detections(path: &Path) -> Result<Vec<OcrDetection>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read detections: {}", path.display()))?;
    parse_detections(&raw)
        .with_context(|| format!("failed to parse detections: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_corner_polygon_uses_first_and_opposite_corner() {
        let detection = OcrDetection::new(
            vec![[10.0, 20.0], [110.0, 22.0], [112.5, 60.9], [8.0, 58.0]],
            "hello",
            0.9,
        );
        assert_eq!(
            detection.bbox(),
            BBoxPx {
                x: 10,
                y: 20,
                w: 102,
                h: 40
            }
        );
    }

    #[test]
    fn two_point_record_is_top_left_bottom_right() {
        let detection = OcrDetection::new(vec![[5.0, 5.0], [15.0, 35.0]], "x", 1.0);
        assert_eq!(
            detection.bbox(),
            BBoxPx {
                x: 5,
                y: 5,
                w: 10,
                h: 30
            }
        );
    }

    #[test]
    fn empty_polygon_is_zero_box() {
        let detection = OcrDetection::new(Vec::new(), "", 0.0);
        assert_eq!(detection.bbox().w, 0);
        assert_eq!(detection.bbox().h, 0);
    }

    #[test]
    fn parses_easyocr_tuples_and_objects() {
        let raw = r#"[
            [[[0, 0], [40, 0], [40, 10], [0, 10]], "first", 0.98],
            {"bbox": [[0, 20], [40, 20], [40, 30], [0, 30]], "text": "second", "conf": 0.5},
            [[[1, 1], [2, 2]], "third"]
        ]"#;
        let detections = parse_detections(raw).unwrap();
        assert_eq!(detections.len(), 3);
        assert_eq!(detections[0].text, "first");
        assert_eq!(detections[1].confidence, 0.5);
        assert_eq!(detections[1].bbox().y, 20);
        assert_eq!(detections[2].confidence, 0.0);
    }

    #[test]
    fn parses_wrapped_object() {
        let raw = r#"{"detections": [[[[0, 0], [1, 0], [1, 1], [0, 1]], "a", 1.0]]}"#;
        assert_eq!(parse_detections(raw).unwrap().len(), 1);
    }

    #[test]
    fn rejects_malformed_record() {
        let err = parse_detections(r#"[{"text": 3}]"#).unwrap_err();
        assert!(err.to_string().contains("index 0"));
    }

    #[test]
    fn bottom_is_last_covered_row() {
        let bbox = BBoxPx {
            x: 0,
            y: 10,
            w: 5,
            h: 50,
        };
        assert_eq!(bbox.top(), 10);
        assert_eq!(bbox.bottom(), 59);
    }

    #[test]
    fn clamp_keeps_box_inside_page() {
        let bbox = BBoxPx {
            x: 90,
            y: 10,
            w: 50,
            h: 500,
        };
        assert_eq!(
            bbox.clamp_to(100, 200),
            BBoxPx {
                x: 90,
                y: 10,
                w: 10,
                h: 190
            }
        );
    }
}
