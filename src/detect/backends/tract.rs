#![cfg(feature = "backend-tract")]

use std::cmp::Ordering;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::{DetectorOptions, FaceDetector, ModelSelection};
use crate::detect::result::{BoundingBox, Detection, DetectionResult, Landmark, LandmarkName};
use crate::frame::CameraFrame;

const SUPPRESSION_IOU: f32 = 0.3;
const SCORE_CLIP: f32 = 100.0;
const VALUES_PER_ANCHOR: usize = 16;

/// Keypoint order of the BlazeFace regressor output.
const KEYPOINTS: [LandmarkName; 6] = [
    LandmarkName::RightEye,
    LandmarkName::LeftEye,
    LandmarkName::NoseTip,
    LandmarkName::MouthCenter,
    LandmarkName::RightEarTragion,
    LandmarkName::LeftEarTragion,
];

#[derive(Clone, Copy, Debug)]
struct Anchor {
    cx: f32,
    cy: f32,
}

/// Input size and anchor layout of each model variant.
fn model_geometry(model: ModelSelection) -> (usize, &'static [(usize, usize)]) {
    match model {
        // (stride, anchors per cell)
        ModelSelection::Short => (128, &[(8, 2), (16, 6)]),
        ModelSelection::Full => (192, &[(4, 1)]),
    }
}

fn generate_anchors(input_size: usize, layout: &[(usize, usize)]) -> Vec<Anchor> {
    let mut anchors = Vec::new();
    for &(stride, per_cell) in layout {
        let cells = input_size.div_ceil(stride);
        for y in 0..cells {
            for x in 0..cells {
                let anchor = Anchor {
                    cx: (x as f32 + 0.5) / cells as f32,
                    cy: (y as f32 + 0.5) / cells as f32,
                };
                anchors.extend(std::iter::repeat(anchor).take(per_cell));
            }
        }
    }
    anchors
}

/// Tract-based BlazeFace face detector.
///
/// Loads a local ONNX export of the MediaPipe short- or full-range face
/// detector (NHWC float input in [-1, 1], regressor `[1, N, 16]` and
/// classifier `[1, N, 1]` outputs) and decodes boxes and six named
/// keypoints. No network I/O; nothing is written to disk.
pub struct TractBackend {
    model: TypedRunnableModel<TypedModel>,
    input_size: usize,
    anchors: Vec<Anchor>,
    min_confidence: f32,
}

impl TractBackend {
    pub fn new<P: AsRef<Path>>(model_path: P, options: &DetectorOptions) -> Result<Self> {
        let model_path = model_path.as_ref();
        let (input_size, layout) = model_geometry(options.model);
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, input_size, input_size, 3)),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            input_size,
            anchors: generate_anchors(input_size, layout),
            min_confidence: options.min_confidence,
        })
    }

    fn build_input(&self, frame: &CameraFrame) -> Result<Tensor> {
        let rgb = frame.to_rgb()?;
        let (src_w, src_h) = (frame.width as usize, frame.height as usize);
        if src_w == 0 || src_h == 0 {
            return Err(anyhow!("empty frame"));
        }
        let size = self.input_size;
        let input = tract_ndarray::Array4::from_shape_fn((1, size, size, 3), |(_, y, x, c)| {
            let sx = (x * src_w / size).min(src_w - 1);
            let sy = (y * src_h / size).min(src_h - 1);
            rgb[(sy * src_w + sx) * 3 + c] as f32 / 127.5 - 1.0
        });
        Ok(input.into_tensor())
    }

    fn decode(&self, outputs: TVec<TValue>) -> Result<DetectionResult> {
        let mut regressors = None;
        let mut scores = None;
        for output in outputs.iter() {
            let values: Vec<f32> = output
                .to_array_view::<f32>()
                .context("model output tensor was not f32")?
                .iter()
                .copied()
                .collect();
            match output.shape().last() {
                Some(&VALUES_PER_ANCHOR) => regressors = Some(values),
                Some(&1) => scores = Some(values),
                _ => {}
            }
        }
        let regressors = regressors.ok_or_else(|| anyhow!("model has no regressor output"))?;
        let scores = scores.ok_or_else(|| anyhow!("model has no classifier output"))?;
        if scores.len() != self.anchors.len()
            || regressors.len() != self.anchors.len() * VALUES_PER_ANCHOR
        {
            return Err(anyhow!(
                "model output does not match {} anchors",
                self.anchors.len()
            ));
        }

        let scale = self.input_size as f32;
        let mut candidates = Vec::new();
        for (i, anchor) in self.anchors.iter().enumerate() {
            let score = sigmoid(scores[i].clamp(-SCORE_CLIP, SCORE_CLIP));
            if score < self.min_confidence {
                continue;
            }
            let raw = &regressors[i * VALUES_PER_ANCHOR..(i + 1) * VALUES_PER_ANCHOR];
            let cx = raw[0] / scale + anchor.cx;
            let cy = raw[1] / scale + anchor.cy;
            let w = raw[2] / scale;
            let h = raw[3] / scale;
            let landmarks = KEYPOINTS
                .iter()
                .enumerate()
                .map(|(k, name)| {
                    Landmark::new(
                        name.clone(),
                        raw[4 + 2 * k] / scale + anchor.cx,
                        raw[5 + 2 * k] / scale + anchor.cy,
                    )
                })
                .collect();
            candidates.push(Detection {
                score,
                bbox: Some(BoundingBox {
                    x: cx - w / 2.0,
                    y: cy - h / 2.0,
                    w,
                    h,
                }),
                landmarks,
            });
        }

        Ok(DetectionResult::new(non_max_suppression(candidates)))
    }
}

impl FaceDetector for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(&mut self, frame: &CameraFrame) -> Result<DetectionResult> {
        let input = self.build_input(frame)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.decode(outputs)
    }

    fn warm_up(&mut self) -> Result<()> {
        let size = self.input_size;
        let blank = tract_ndarray::Array4::<f32>::zeros((1, size, size, 3)).into_tensor();
        self.model
            .run(tvec!(blank.into()))
            .context("ONNX warm-up failed")?;
        Ok(())
    }
}

fn sigmoid(value: f32) -> f32 {
    1.0 / (1.0 + (-value).exp())
}

fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = (a.x + a.w).min(b.x + b.w);
    let y2 = (a.y + a.h).min(b.y + b.h);
    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = a.w * a.h + b.w * b.h - intersection;
    if union <= 0.0 {
        0.0
    } else {
        intersection / union
    }
}

fn non_max_suppression(mut candidates: Vec<Detection>) -> Vec<Detection> {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    let mut kept: Vec<Detection> = Vec::new();
    for candidate in candidates {
        let overlaps = match candidate.bbox {
            Some(bbox) => kept
                .iter()
                .filter_map(|k| k.bbox.as_ref())
                .any(|k| iou(k, &bbox) > SUPPRESSION_IOU),
            None => false,
        };
        if !overlaps {
            kept.push(candidate);
        }
    }
    kept
}
