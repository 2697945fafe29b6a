//! Turning a raster image into a single-page PDF.

use crate::error::{BuildError, Result};
use crate::rotation::Rotation;
use image::{imageops, RgbImage};
use lopdf::{dictionary, Document, Object, Stream};
use std::path::Path;
use tracing::debug;

/// Decode an image file and drop any alpha channel.
pub fn load_rgb<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
    let path = path.as_ref();
    let img = image::open(path).map_err(|e| BuildError::source_read(path, e))?;
    Ok(img.to_rgb8())
}

/// Pixel dimensions without decoding the whole image.
pub fn dimensions<P: AsRef<Path>>(path: P) -> Result<(u32, u32)> {
    let path = path.as_ref();
    image::image_dimensions(path).map_err(|e| BuildError::source_read(path, e))
}

/// Turn the canvas clockwise; quarter turns swap width and height.
pub fn rotate(img: RgbImage, rotation: Rotation) -> RgbImage {
    match rotation {
        Rotation::None => img,
        Rotation::Right => imageops::rotate90(&img),
        Rotation::Down => imageops::rotate180(&img),
        Rotation::Left => imageops::rotate270(&img),
    }
}

/// A one-page document showing `img` edge to edge at 72 dpi, so the page is
/// as many points wide as the image is pixels.
pub fn image_document(img: &RgbImage) -> Document {
    let (width, height) = img.dimensions();
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        img.as_raw().clone(),
    ));

    let content = format!("q\n{} 0 0 {} 0 0 cm\n/Im0 Do\nQ\n", width, height);
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), (width as i64).into(), (height as i64).into()],
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
        "Contents" => content_id,
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

/// Load, rotate, and wrap an image file as a one-page document.
pub fn image_to_document<P: AsRef<Path>>(path: P, rotation: Rotation) -> Result<Document> {
    let path = path.as_ref();
    let img = rotate(load_rgb(path)?, rotation);
    debug!(
        path = %path.display(),
        width = img.width(),
        height = img.height(),
        rotation = rotation.degrees(),
        "converted image to page"
    );
    Ok(image_document(&img))
}
