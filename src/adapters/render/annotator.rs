use ab_glyph::{FontArc, PxScale};
use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::io::Cursor;
use std::path::Path;
use tracing::info;

use crate::adapters::render::decode::open_oriented_rgb;
use crate::application::ports::AnnotatorPort;
use crate::domain::{
    detection::Detection,
    errors::{DomainError, DomainResult},
};

// Estilo fijo del resultado
const BOX_COLOR: [u8; 3] = [0, 255, 0]; // verde
const TEXT_COLOR: [u8; 3] = [0, 0, 255]; // azul
const BOX_THICKNESS: i32 = 2;
const LABEL_FONT_SIZE: f32 = 22.0;
const LABEL_OFFSET_Y: i32 = 10; // separación entre texto y borde superior

/// Fuente por defecto embebida en el binario; `FONT_PATH` la sustituye.
static DEFAULT_FONT: &[u8] = include_bytes!("../../../assets/DejaVuSans.ttf");

pub struct ImageprocAnnotator {
    font: FontArc,
    font_scale: PxScale,
}

impl ImageprocAnnotator {
    pub fn new(font_path: Option<&Path>) -> Result<Self> {
        let font = match font_path {
            Some(path) => {
                let data = std::fs::read(path)
                    .with_context(|| format!("no se pudo leer la fuente {}", path.display()))?;
                info!("🔤 Fuente de etiquetas: {}", path.display());
                FontArc::try_from_vec(data).with_context(|| format!("fuente inválida {}", path.display()))?
            }
            None => FontArc::try_from_slice(DEFAULT_FONT).context("fuente embebida inválida")?,
        };
        Ok(Self { font, font_scale: PxScale::from(LABEL_FONT_SIZE) })
    }

    pub fn draw_detections(&self, image: &mut RgbImage, detections: &[Detection]) {
        let color = Rgb(BOX_COLOR);
        for detection in detections {
            let b = detection.bbox;

            for t in 0..BOX_THICKNESS {
                let w = b.width() - 2 * t;
                let h = b.height() - 2 * t;
                if w <= 0 || h <= 0 {
                    break;
                }
                // Rect::of_size exige tamaño > 0
                let rect = Rect::at(b.x1 + t, b.y1 + t).of_size(w as u32, h as u32);
                draw_hollow_rect_mut(image, rect, color);
            }

            let text_y = b.y1 - LABEL_OFFSET_Y - self.font_scale.y as i32;
            draw_text_mut(
                image,
                Rgb(TEXT_COLOR),
                b.x1,
                text_y,
                self.font_scale,
                &self.font,
                &detection.caption(),
            );
        }
    }
}

/// Formato de salida según la extensión; lo que no sea PNG se escribe como JPEG.
fn output_format(target_name: &str) -> ImageFormat {
    match ImageFormat::from_path(target_name) {
        Ok(ImageFormat::Png) => ImageFormat::Png,
        _ => ImageFormat::Jpeg,
    }
}

impl AnnotatorPort for ImageprocAnnotator {
    fn annotate(&self, source: &Path, detections: &[Detection], target_name: &str) -> DomainResult<Vec<u8>> {
        let mut image = open_oriented_rgb(source)
            .map_err(|e| DomainError::OperationFailed(format!("no se pudo decodificar {}: {e}", source.display())))?;

        self.draw_detections(&mut image, detections);

        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut buf), output_format(target_name))
            .map_err(|e| DomainError::OperationFailed(format!("no se pudo codificar {target_name}: {e}")))?;
        Ok(buf)
    }
}
