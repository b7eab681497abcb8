//! Sanity checks for downloaded reference image bytes.
//!
//! Remote endpoints occasionally answer an image URL with an HTML error
//! page, a tracking pixel, or a truncated body; none of those may land in
//! the cache.

const MIN_IMAGE_BYTES: usize = 512;
const MIN_DIMENSION: u32 = 32;

/// True if the bytes are a decodable image of usable size.
pub fn validate_image(bytes: &[u8]) -> bool {
    if bytes.len() < MIN_IMAGE_BYTES {
        return false;
    }
    if !has_image_magic(bytes) || looks_like_html(bytes) {
        return false;
    }
    match image::load_from_memory(bytes) {
        Ok(img) => img.width() > MIN_DIMENSION && img.height() > MIN_DIMENSION,
        Err(_) => false,
    }
}

fn has_image_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0x89, b'P', b'N', b'G'])
        || bytes.starts_with(&[0xFF, 0xD8, 0xFF])
        || bytes.starts_with(b"GIF8")
        || (bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP")
        || bytes.starts_with(b"BM")
}

fn looks_like_html(bytes: &[u8]) -> bool {
    let prefix = bytes[..bytes.len().min(50)].to_ascii_lowercase();
    prefix.starts_with(b"<!doctype") || prefix.starts_with(b"<html")
}
