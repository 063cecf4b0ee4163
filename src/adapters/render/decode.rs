use image::{DynamicImage, ImageDecoder, ImageReader, ImageResult, RgbImage};
use std::path::Path;

/// Decodifica a RGB aplicando la orientación EXIF, igual que la ve el cliente.
/// Detector y anotador la usan para trabajar sobre los mismos píxeles.
pub fn open_oriented_rgb(path: &Path) -> ImageResult<RgbImage> {
    let mut decoder = ImageReader::open(path)?.with_guessed_format()?.into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut image = DynamicImage::from_decoder(decoder)?;
    image.apply_orientation(orientation);
    Ok(image.to_rgb8())
}
