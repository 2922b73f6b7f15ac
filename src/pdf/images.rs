//! Raster image XObjects: enumeration and JPEG re-encoding

use lopdf::{Document, Object, ObjectId};

use crate::error::StageError;

use super::lopdf_backend::{inherited_attribute, resolve};

/// Image XObjects referenced from a page's (possibly inherited) resources,
/// in resource dictionary order.
pub fn page_images(doc: &Document, page_id: ObjectId) -> Result<Vec<ObjectId>, StageError> {
    let page = doc.get_dictionary(page_id)?;
    let resources = match page.get(b"Resources") {
        Ok(object) => resolve(doc, object)?.clone(),
        Err(_) => match inherited_attribute(doc, page, b"Resources") {
            Some(object) => resolve(doc, &object)?.clone(),
            None => return Ok(Vec::new()),
        },
    };
    let resources = resources
        .as_dict()
        .map_err(|_| StageError::failed("page Resources is not a dictionary"))?;
    let Ok(xobjects) = resources.get(b"XObject") else {
        return Ok(Vec::new());
    };
    let xobjects = resolve(doc, xobjects)?
        .as_dict()
        .map_err(|_| StageError::failed("XObject resource is not a dictionary"))?;

    let mut images = Vec::new();
    for (_, entry) in xobjects.iter() {
        // Inline streams cannot be shared, so only references are considered.
        let Ok(id) = entry.as_reference() else {
            continue;
        };
        let Ok(stream) = doc.get_object(id).and_then(Object::as_stream) else {
            continue;
        };
        let is_image = stream
            .dict
            .get(b"Subtype")
            .and_then(Object::as_name)
            .map(|s| s == b"Image")
            .unwrap_or(false);
        if is_image {
            images.push(id);
        }
    }
    Ok(images)
}

#[cfg(feature = "images")]
pub use jpeg::recompress;

/// Without the `images` feature every image is reported as unsupported.
#[cfg(not(feature = "images"))]
pub fn recompress(_doc: &mut Document, _id: ObjectId, _quality: u8) -> Result<(), StageError> {
    Err(StageError::unsupported("image support not compiled in"))
}

#[cfg(feature = "images")]
mod jpeg {
    use image::codecs::jpeg::JpegEncoder;
    use image::{DynamicImage, ExtendedColorType, GrayImage, ImageFormat, RgbImage};
    use lopdf::{Dictionary, Document, Object, ObjectId};

    use crate::error::StageError;
    use crate::pdf::lopdf_backend::{inflate, resolve, stream_filters};

    /// Decode an image XObject and store it back as a JPEG at `quality`.
    pub fn recompress(doc: &mut Document, id: ObjectId, quality: u8) -> Result<(), StageError> {
        let stream = doc.get_object(id)?.as_stream()?;
        let image = decode(doc, &stream.dict, &stream.content)?;

        let quality = quality.clamp(1, 100);
        let (width, height) = (image.width(), image.height());
        let (pixels, color_type, color_space) = match image {
            DynamicImage::ImageLuma8(gray) => (gray.into_raw(), ExtendedColorType::L8, "DeviceGray"),
            other => (other.to_rgb8().into_raw(), ExtendedColorType::Rgb8, "DeviceRGB"),
        };
        let mut encoded = Vec::new();
        JpegEncoder::new_with_quality(&mut encoded, quality)
            .encode(&pixels, width, height, color_type)
            .map_err(|e| StageError::failed(format!("JPEG encoding failed: {}", e)))?;

        let stream = doc.get_object_mut(id)?.as_stream_mut()?;
        log::debug!(
            "Image {:?}: {} -> {} bytes at quality {}",
            id,
            stream.content.len(),
            encoded.len(),
            quality
        );
        stream.dict.set("Filter", "DCTDecode");
        stream.dict.set("ColorSpace", color_space);
        stream.dict.set("BitsPerComponent", 8);
        stream.dict.set("Width", width as i64);
        stream.dict.set("Height", height as i64);
        stream.dict.remove(b"DecodeParms");
        stream.set_content(encoded);
        Ok(())
    }

    fn decode(doc: &Document, dict: &Dictionary, content: &[u8]) -> Result<DynamicImage, StageError> {
        let is_mask = dict
            .get(b"ImageMask")
            .and_then(Object::as_bool)
            .unwrap_or(false);
        if is_mask {
            return Err(StageError::unsupported("image mask"));
        }
        if dict.has(b"Decode") {
            return Err(StageError::unsupported("image with Decode array"));
        }

        let filters = stream_filters(dict)?;
        match filters.as_slice() {
            [only] if only.as_slice() == b"DCTDecode" => {
                image::load_from_memory_with_format(content, ImageFormat::Jpeg)
                    .map_err(|e| StageError::failed(format!("JPEG decoding failed: {}", e)))
            }
            [] => raw_image(doc, dict, content.to_vec()),
            [only] if only.as_slice() == b"FlateDecode" => {
                if dict.has(b"DecodeParms") {
                    return Err(StageError::unsupported("predictor-coded image"));
                }
                raw_image(doc, dict, inflate(content)?)
            }
            _ => Err(StageError::unsupported("image filter")),
        }
    }

    /// Samples stored 8 bits per component, gray or RGB.
    fn raw_image(doc: &Document, dict: &Dictionary, samples: Vec<u8>) -> Result<DynamicImage, StageError> {
        let bits = dict
            .get(b"BitsPerComponent")
            .and_then(Object::as_i64)
            .unwrap_or(8);
        if bits != 8 {
            return Err(StageError::unsupported(format!("{} bits per component", bits)));
        }
        let dimension = |key: &[u8]| -> Result<u32, StageError> {
            dict.get(key)
                .and_then(Object::as_i64)
                .ok()
                .and_then(|v| u32::try_from(v).ok())
                .filter(|&v| v > 0)
                .ok_or_else(|| StageError::failed("image without valid dimensions"))
        };
        let width = dimension(b"Width")?;
        let height = dimension(b"Height")?;

        let color_space = dict
            .get(b"ColorSpace")
            .map_err(|_| StageError::unsupported("image without ColorSpace"))?;
        let components = components(doc, color_space)?;
        if components != 1 && components != 3 {
            return Err(StageError::unsupported(format!(
                "{} colour components",
                components
            )));
        }
        let samples = exact_samples(samples, width, height, components as usize)?;
        let short = || StageError::failed("image data does not match its dimensions");
        if components == 1 {
            GrayImage::from_raw(width, height, samples)
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(short)
        } else {
            RgbImage::from_raw(width, height, samples)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(short)
        }
    }

    /// Drop trailing bytes (often an end-of-line) past the last sample; the
    /// JPEG encoder requires the buffer to match the dimensions exactly.
    fn exact_samples(
        mut samples: Vec<u8>,
        width: u32,
        height: u32,
        components: usize,
    ) -> Result<Vec<u8>, StageError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(components))
            .ok_or_else(|| StageError::failed("image dimensions overflow"))?;
        if samples.len() < expected {
            return Err(StageError::failed("image data shorter than its dimensions"));
        }
        samples.truncate(expected);
        Ok(samples)
    }

    fn components(doc: &Document, color_space: &Object) -> Result<i64, StageError> {
        let color_space = resolve(doc, color_space)?;
        match color_space {
            Object::Name(name) => match name.as_slice() {
                b"DeviceGray" | b"CalGray" => Ok(1),
                b"DeviceRGB" | b"CalRGB" => Ok(3),
                other => Err(StageError::unsupported(format!(
                    "colour space {}",
                    String::from_utf8_lossy(other)
                ))),
            },
            Object::Array(items) => {
                let family = items.first().and_then(|f| f.as_name().ok());
                match family {
                    Some(b"ICCBased") => {
                        let profile = items
                            .get(1)
                            .ok_or_else(|| StageError::failed("ICCBased without profile"))?;
                        let profile = resolve(doc, profile)?.as_stream()?;
                        Ok(profile.dict.get(b"N").and_then(Object::as_i64)?)
                    }
                    Some(b"CalGray") => Ok(1),
                    Some(b"CalRGB") => Ok(3),
                    _ => Err(StageError::unsupported("indexed or special colour space")),
                }
            }
            _ => Err(StageError::failed("malformed ColorSpace")),
        }
    }
}

#[cfg(all(test, feature = "images"))]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};

    fn document_with_image(image: Stream) -> (Document, ObjectId, ObjectId) {
        let mut doc = Document::with_version("1.5");
        let image_id = doc.add_object(image);
        let form_id = doc.add_object(Stream::new(
            dictionary! { "Type" => "XObject", "Subtype" => "Form" },
            Vec::new(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im1" => image_id, "Fm1" => form_id },
            },
        });
        (doc, page_id, image_id)
    }

    fn gradient_rgb(width: u32, height: u32) -> Vec<u8> {
        (0..width * height)
            .flat_map(|i| {
                let v = (i % 256) as u8;
                [v, 255 - v, v / 2]
            })
            .collect()
    }

    fn raw_rgb_image(width: u32, height: u32) -> Stream {
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            gradient_rgb(width, height),
        )
    }

    #[test]
    fn test_only_image_xobjects_listed() {
        let (doc, page_id, image_id) = document_with_image(raw_rgb_image(4, 4));
        assert_eq!(page_images(&doc, page_id).unwrap(), vec![image_id]);
    }

    #[test]
    fn test_raw_image_becomes_jpeg() {
        let (mut doc, _, image_id) = document_with_image(raw_rgb_image(64, 64));
        recompress(&mut doc, image_id, 50).unwrap();

        let stream = doc.get_object(image_id).unwrap().as_stream().unwrap();
        assert_eq!(
            stream.dict.get(b"Filter").and_then(Object::as_name).unwrap(),
            b"DCTDecode"
        );
        assert!(stream.content.starts_with(&[0xFF, 0xD8]));
        assert!(stream.content.len() < 64 * 64 * 3);
    }

    #[test]
    fn test_quality_zero_is_clamped() {
        let (mut doc, _, image_id) = document_with_image(raw_rgb_image(8, 8));
        assert!(recompress(&mut doc, image_id, 0).is_ok());
    }

    #[test]
    fn test_image_mask_unsupported() {
        let mask = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 8,
                "Height" => 8,
                "ImageMask" => true,
                "BitsPerComponent" => 1,
            },
            vec![0u8; 8],
        );
        let (mut doc, _, image_id) = document_with_image(mask);
        assert!(matches!(
            recompress(&mut doc, image_id, 50),
            Err(StageError::Unsupported(_))
        ));
    }

    fn assert_jpeg(doc: &Document, image_id: ObjectId, color_space: &[u8]) {
        let stream = doc.get_object(image_id).unwrap().as_stream().unwrap();
        assert_eq!(
            stream.dict.get(b"Filter").and_then(Object::as_name).unwrap(),
            b"DCTDecode"
        );
        assert_eq!(
            stream.dict.get(b"ColorSpace").and_then(Object::as_name).unwrap(),
            color_space
        );
    }

    #[test]
    fn test_trailing_byte_after_gray_samples() {
        let mut samples: Vec<u8> = (0..=255u8).collect();
        samples.push(b'\n');
        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 16,
                "Height" => 16,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            samples,
        );
        let (mut doc, _, image_id) = document_with_image(image);
        recompress(&mut doc, image_id, 50).unwrap();
        assert_jpeg(&doc, image_id, b"DeviceGray");
    }

    #[test]
    fn test_trailing_byte_after_rgb_samples() {
        let mut image = raw_rgb_image(16, 16);
        let mut samples = gradient_rgb(16, 16);
        samples.push(b'\n');
        image.set_content(samples);
        let (mut doc, _, image_id) = document_with_image(image);
        recompress(&mut doc, image_id, 50).unwrap();
        assert_jpeg(&doc, image_id, b"DeviceRGB");
    }

    #[test]
    fn test_truncated_samples_fail() {
        let mut image = raw_rgb_image(16, 16);
        image.set_content(vec![0u8; 10]);
        let (mut doc, _, image_id) = document_with_image(image);
        assert!(matches!(
            recompress(&mut doc, image_id, 50),
            Err(StageError::Failed(_))
        ));
    }
}
