use anyhow::{anyhow, Result};
use image::{imageops::{self, FilterType}, Rgb, RgbImage};
use ndarray::{s, Array4, ArrayView2, ArrayViewD, Axis, Ix2, IxDyn};
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::Value;
use std::cmp::Ordering;
use std::fs;

use crate::domain::detection::{BoundingBox, Detection};
use crate::domain::model::{ClassNames, YoloParams};

/// Clave de metadatos donde los exports de Ultralytics guardan `{0: 'a', 1: 'b'}`.
const NAMES_METADATA_KEY: &str = "names";
/// Gris de relleno del letterbox, el mismo con el que se entrena.
const PAD_VALUE: u8 = 114;

pub struct OnnxYoloEngine {
    session: Session,
}

/// Caja candidata en píxeles de la imagen original, antes de NMS.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub score: f32,
    pub class_id: usize,
}

impl Candidate {
    fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    pub fn iou(&self, other: &Candidate) -> f32 {
        let w = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0.0);
        let h = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0.0);
        let intersection = w * h;
        let union = self.area() + other.area() - intersection;
        if union > 0.0 { intersection / union } else { 0.0 }
    }
}

impl OnnxYoloEngine {
    pub fn load(path: &str) -> Result<Self> {
        let mut builder = Session::builder()?.with_intra_threads(4)?;

        // CUDA es opcional: si está disponible se registra, si no continuamos en CPU.
        let cuda = CUDAExecutionProvider::default().build();
        if let Ok(builder_with_cuda) = builder.clone().with_execution_providers([cuda]) {
            builder = builder_with_cuda;
        }

        let model_bytes = fs::read(path)?;
        let session = builder.commit_from_memory(&model_bytes)?;

        Ok(Self { session })
    }

    /// Nombres de clase embebidos en el modelo, si el export los trae.
    pub fn embedded_class_names(&self) -> Option<ClassNames> {
        let raw = self.session.metadata().ok()?.custom(NAMES_METADATA_KEY).ok()??;
        let names = parse_names_metadata(&raw);
        if names.is_empty() { None } else { Some(ClassNames::new(names)) }
    }

    pub fn infer(&mut self, rgb: &RgbImage, params: &YoloParams, names: &ClassNames) -> Result<Vec<Detection>> {
        let imgsz = params.input_size as usize;
        let (canvas, geometry) = letterbox(rgb, params.input_size);

        let mut input = Array4::<f32>::zeros((1, 3, imgsz, imgsz));
        for (x, y, pixel) in canvas.enumerate_pixels() {
            input[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
            input[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
            input[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
        }

        let input_shape = vec![1, 3, imgsz as i64, imgsz as i64];
        let input_tensor = Value::from_array((input_shape, input.into_raw_vec()))?;

        let outputs = self.session.run(ort::inputs![input_tensor])?;
        let (shape_out, data_out) = outputs[0].try_extract_tensor::<f32>()?;

        let dims: Vec<usize> = shape_out.iter().map(|&x| x as usize).collect();
        if dims.len() != 3 || dims[1] < 5 {
            return Err(anyhow!("salida YOLO inesperada: {:?}", dims));
        }
        let array_view = ArrayViewD::from_shape(IxDyn(&dims), data_out)?;
        let view = array_view.index_axis(Axis(0), 0).into_dimensionality::<Ix2>()?;

        let candidates = decode_candidates(view, params, &geometry, rgb.width(), rgb.height());
        let kept = non_max_suppression(candidates, params.iou_threshold, params.max_detections);
        Ok(kept
            .into_iter()
            .map(|c| Detection {
                bbox: BoundingBox::from_xyxy(c.x1, c.y1, c.x2, c.y2),
                score: c.score,
                class_id: c.class_id,
                label: names.resolve(c.class_id),
            })
            .collect())
    }
}

/// Cómo se encajó la imagen original en la entrada cuadrada del modelo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: u32,
    pub pad_y: u32,
    pub new_w: u32,
    pub new_h: u32,
}

impl Letterbox {
    /// Escala uniforme `min(s/w, s/h)` y relleno centrado hasta `s x s`.
    pub fn fit(img_w: u32, img_h: u32, input_size: u32) -> Self {
        let side = input_size as f32;
        let scale = (side / img_w.max(1) as f32).min(side / img_h.max(1) as f32);
        let new_w = ((img_w as f32 * scale).round() as u32).clamp(1, input_size);
        let new_h = ((img_h as f32 * scale).round() as u32).clamp(1, input_size);
        Self {
            scale,
            pad_x: (input_size - new_w) / 2,
            pad_y: (input_size - new_h) / 2,
            new_w,
            new_h,
        }
    }

    /// Coordenadas de entrada del modelo -> píxeles de la imagen original (sin recortar).
    pub fn unmap(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pad_x as f32) / self.scale, (y - self.pad_y as f32) / self.scale)
    }
}

/// Redimensiona sin deformar y centra sobre un lienzo gris de `input_size`.
pub fn letterbox(rgb: &RgbImage, input_size: u32) -> (RgbImage, Letterbox) {
    let geometry = Letterbox::fit(rgb.width(), rgb.height(), input_size);
    let resized = imageops::resize(rgb, geometry.new_w, geometry.new_h, FilterType::Triangle);
    let mut canvas = RgbImage::from_pixel(input_size, input_size, Rgb([PAD_VALUE; 3]));
    imageops::replace(&mut canvas, &resized, geometry.pad_x as i64, geometry.pad_y as i64);
    (canvas, geometry)
}

/// Decodifica la cabeza YOLO `[4 + C, N]` (cx, cy, w, h, scores por clase).
///
/// Se queda con la clase de mayor score de cada columna si supera estrictamente
/// `conf_threshold`, deshace el letterbox y recorta al tamaño de la imagen.
pub fn decode_candidates(
    view: ArrayView2<f32>,
    params: &YoloParams,
    geometry: &Letterbox,
    img_w: u32,
    img_h: u32,
) -> Vec<Candidate> {
    let (img_w, img_h) = (img_w as f32, img_h as f32);
    let mut candidates = Vec::new();

    for i in 0..view.shape()[1] {
        let scores = view.slice(s![4.., i]);
        let Some((class_id, &max_score)) = scores
            .indexed_iter()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        else {
            continue;
        };
        if max_score <= params.conf_threshold {
            continue;
        }

        let (cx, cy, w, h) = (view[[0, i]], view[[1, i]], view[[2, i]], view[[3, i]]);
        let (x1, y1) = geometry.unmap(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = geometry.unmap(cx + w / 2.0, cy + h / 2.0);

        candidates.push(Candidate {
            x1: x1.clamp(0.0, img_w),
            y1: y1.clamp(0.0, img_h),
            x2: x2.clamp(0.0, img_w),
            y2: y2.clamp(0.0, img_h),
            score: max_score,
            class_id,
        });
    }
    candidates
}

/// NMS voraz por clase. Devuelve como mucho `max_det` cajas ordenadas por score.
pub fn non_max_suppression(mut candidates: Vec<Candidate>, iou_threshold: f32, max_det: usize) -> Vec<Candidate> {
    candidates.sort_unstable_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<Candidate> = Vec::new();
    for cand in candidates {
        if kept.len() >= max_det {
            break;
        }
        let suppressed = kept
            .iter()
            .any(|k| k.class_id == cand.class_id && k.iou(&cand) > iou_threshold);
        if !suppressed {
            kept.push(cand);
        }
    }
    kept
}

/// Interpreta `{0: 'weed_A', 1: 'weed_B'}` (repr de dict Python) como lista indexada.
/// Índices que falten quedan como `class_<i>`.
pub fn parse_names_metadata(raw: &str) -> Vec<String> {
    let body = raw.trim().trim_start_matches('{').trim_end_matches('}');
    let mut pairs: Vec<(usize, String)> = Vec::new();

    for item in body.split(',') {
        let Some((key, value)) = item.split_once(':') else { continue };
        let Ok(idx) = key.trim().trim_matches(|c| c == '\'' || c == '"').parse::<usize>() else {
            continue;
        };
        let name = value.trim().trim_matches(|c| c == '\'' || c == '"').to_string();
        pairs.push((idx, name));
    }

    let Some(max_idx) = pairs.iter().map(|(i, _)| *i).max() else {
        return Vec::new();
    };
    let mut names: Vec<String> = (0..=max_idx).map(|i| format!("class_{i}")).collect();
    for (idx, name) in pairs {
        names[idx] = name;
    }
    names
}
