//! Nombres de fichero para imágenes subidas y resultados.

use unicode_normalization::UnicodeNormalization;

/// Prefijo de la imagen anotada: `field.jpg` -> `result_field.jpg`.
pub const RESULT_PREFIX: &str = "result_";

/// Limpia un nombre de fichero del cliente para que sea seguro en disco.
///
/// Se descompone en NFKD y se queda sólo lo ASCII (`é` -> `e`), los separadores
/// de ruta pasan a espacios, los espacios se colapsan en `_`, se descarta todo
/// lo que no sea `[A-Za-z0-9_.-]` y se recortan `.`/`_` en los extremos.
/// Puede devolver una cadena vacía.
pub fn sanitize_filename(raw: &str) -> String {
    let ascii: String = raw.nfkd().filter(char::is_ascii).collect();
    let spaced = ascii.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Nombre final para guardar la subida; si la limpieza lo deja vacío se genera uno.
pub fn stored_filename(raw: &str) -> String {
    let clean = sanitize_filename(raw);
    if clean.is_empty() {
        format!("{}.jpg", uuid::Uuid::new_v4())
    } else {
        clean
    }
}

pub fn result_filename(stored: &str) -> String {
    format!("{RESULT_PREFIX}{stored}")
}

/// Solo se sirven nombres planos, nunca rutas.
pub fn is_servable_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}
