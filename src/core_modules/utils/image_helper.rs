pub mod image_helper {
    use crate::error::Result;
    use image::{ImageEncoder, RgbaImage};
    use std::io::Write;
    use std::path::Path;

    /// Encodes an exported bitmap as PNG into any writer.
    pub fn write_png<W: Write>(writer: W, bitmap: &RgbaImage) -> Result<()> {
        let encoder = image::codecs::png::PngEncoder::new(writer);
        encoder.write_image(
            bitmap.as_raw(),
            bitmap.width(),
            bitmap.height(),
            image::ExtendedColorType::Rgba8,
        )?;
        Ok(())
    }

    /// Encodes an exported bitmap as an in-memory PNG.
    pub fn encode_png(bitmap: &RgbaImage) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        write_png(&mut bytes, bitmap)?;
        Ok(bytes)
    }

    /// Saves an exported bitmap as a PNG file.
    pub fn save(path: impl AsRef<Path>, bitmap: &RgbaImage) -> Result<()> {
        let output = std::io::BufWriter::new(std::fs::File::create(path.as_ref())?);
        write_png(output, bitmap)?;
        log::debug!("saved {}x{} PNG to {}", bitmap.width(), bitmap.height(), path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {

    use super::image_helper::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn save_white_file() {
        let dir = tempfile::tempdir().expect("Error creating temp dir.");
        let path = dir.path().join("white_file.png");
        let bitmap = RgbaImage::from_pixel(48, 48, Rgba([255, 255, 255, 255]));

        save(&path, &bitmap).expect("Error Saving File.");

        let decoded = image::open(&path).expect("Error Reading File.").to_rgba8();
        assert_eq!(decoded, bitmap);
    }

    #[test]
    fn encode_keeps_transparency() {
        let mut bitmap = RgbaImage::from_pixel(4, 2, Rgba([0, 0, 0, 0]));
        bitmap.put_pixel(3, 1, Rgba([10, 20, 30, 128]));

        let bytes = encode_png(&bitmap).expect("Error Encoding File.");
        let decoded = image::load_from_memory(&bytes).expect("Error Decoding File.").to_rgba8();

        assert_eq!(decoded.dimensions(), (4, 2));
        assert_eq!(*decoded.get_pixel(3, 1), Rgba([10, 20, 30, 128]));
        assert_eq!(*decoded.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().expect("Error creating temp dir.");
        let path = dir.path().join("missing").join("file.png");
        let bitmap = RgbaImage::new(1, 1);
        assert!(save(&path, &bitmap).is_err());
    }
}
