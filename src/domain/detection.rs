use serde::{Deserialize, Serialize};

/// Caja en píxeles de la imagen original (x1, y1) arriba-izquierda, (x2, y2) abajo-derecha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    /// Trunca coordenadas flotantes del modelo a píxeles enteros.
    pub fn from_xyxy(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1: x1 as i32, y1: y1 as i32, x2: x2 as i32, y2: y2 as i32 }
    }

    pub fn width(&self) -> i32 { self.x2 - self.x1 }
    pub fn height(&self) -> i32 { self.y2 - self.y1 }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub score: f32,
    pub class_id: usize,
    pub label: String,
}

impl Detection {
    /// Porcentaje redondeado a dos decimales, tal como se expone en la API.
    pub fn confidence_percent(&self) -> f64 {
        (self.score as f64 * 100.0 * 100.0).round() / 100.0
    }

    /// Texto que se dibuja sobre la caja: "weed_A 87.3%".
    pub fn caption(&self) -> String {
        format!("{} {:.1}%", self.label, self.score * 100.0)
    }
}
