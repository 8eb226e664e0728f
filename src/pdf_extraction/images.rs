// Embedded raster image extraction for the OCR fallback
//
// Images are returned in page order, then in resource-dictionary order within
// a page. Form XObjects are searched recursively.
use image::{DynamicImage, GrayImage, ImageBuffer, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashSet;
use std::path::Path;

use super::lopdf_helper::{
    get_dict, get_name, get_number, page_resources, resolve, resolve_with_id, stream_filters, with_pdf,
};
use crate::types::{PdfQaError, Result};

const MAX_FORM_DEPTH: usize = 8;

/// Decode every embedded raster image of the document.
pub fn extract_images(pdf_path: &Path) -> Result<Vec<DynamicImage>> {
    with_pdf(pdf_path, |document| {
        let mut images = Vec::new();
        for (page_number, page_id) in document.get_pages() {
            let before = images.len();
            let mut seen = HashSet::new();
            if let Some(resources) = page_resources(document, page_id)? {
                collect_images(document, resources, &mut seen, &mut images, 0)?;
            }
            tracing::debug!("Page {}: {} images", page_number, images.len() - before);
        }
        tracing::info!("Extracted {} images from {}", images.len(), pdf_path.display());
        Ok(images)
    })
}

fn collect_images(
    document: &Document,
    resources: &Dictionary,
    seen: &mut HashSet<ObjectId>,
    images: &mut Vec<DynamicImage>,
    depth: usize,
) -> Result<()> {
    let Some(xobjects) = get_dict(document, resources, b"XObject") else {
        return Ok(());
    };

    for (_name, entry) in xobjects.iter() {
        let (id, object) = resolve_with_id(document, entry)?;
        if let Some(id) = id {
            if !seen.insert(id) {
                continue;
            }
        }
        let Object::Stream(stream) = object else {
            continue;
        };

        match get_name(document, &stream.dict, b"Subtype") {
            Some(b"Image") => images.push(decode_image(document, stream)?),
            Some(b"Form") if depth < MAX_FORM_DEPTH => {
                if let Some(form_resources) = get_dict(document, &stream.dict, b"Resources") {
                    collect_images(document, form_resources, seen, images, depth + 1)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Colour model of the decoded samples.
#[derive(Debug, Clone, PartialEq)]
enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
    Indexed { base: Box<ColorSpace>, lookup: Vec<u8> },
}

impl ColorSpace {
    fn components(&self) -> usize {
        match self {
            ColorSpace::Gray | ColorSpace::Indexed { .. } => 1,
            ColorSpace::Rgb => 3,
            ColorSpace::Cmyk => 4,
        }
    }
}

/// Decode one image XObject into pixels.
pub fn decode_image(document: &Document, stream: &Stream) -> Result<DynamicImage> {
    let filters = stream_filters(document, &stream.dict);
    let last = filters.last().map(Vec::as_slice);

    match last {
        Some(b"DCTDecode") if filters.len() == 1 => {
            return Ok(image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)?);
        }
        Some(b"DCTDecode") | Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
            return Err(PdfQaError::ImageDecode(format!(
                "unsupported image encoding {}",
                String::from_utf8_lossy(last.unwrap_or_default())
            )));
        }
        _ => {}
    }

    let data = if filters.is_empty() {
        stream.content.clone()
    } else {
        stream.decompressed_content().map_err(PdfQaError::decode)?
    };

    let dict = &stream.dict;
    let width = dimension(document, dict, b"Width")?;
    let height = dimension(document, dict, b"Height")?;
    let is_mask = matches!(dict.get(b"ImageMask").ok(), Some(Object::Boolean(true)));
    let bits = if is_mask {
        1
    } else {
        get_number(document, dict, b"BitsPerComponent").unwrap_or(8) as u32
    };
    let color_space = match dict.get(b"ColorSpace") {
        Ok(object) if !is_mask => parse_color_space(document, object)?,
        _ => ColorSpace::Gray,
    };

    raw_to_image(&data, width, height, bits, &color_space)
}

fn dimension(document: &Document, dict: &Dictionary, key: &[u8]) -> Result<u32> {
    match get_number(document, dict, key) {
        Some(value) if value > 0 && value <= u32::MAX as i64 => Ok(value as u32),
        _ => Err(PdfQaError::ImageDecode(format!(
            "image has no valid /{}",
            String::from_utf8_lossy(key)
        ))),
    }
}

fn parse_color_space(document: &Document, object: &Object) -> Result<ColorSpace> {
    match resolve(document, object)? {
        Object::Name(name) => named_color_space(name),
        Object::Array(items) => {
            let family = items
                .first()
                .and_then(|item| resolve(document, item).ok())
                .and_then(|item| item.as_name().ok())
                .unwrap_or_default();
            match family {
                b"ICCBased" => {
                    let n = items
                        .get(1)
                        .and_then(|item| resolve(document, item).ok())
                        .and_then(|item| item.as_stream().ok())
                        .and_then(|icc| get_number(document, &icc.dict, b"N"))
                        .unwrap_or(3);
                    match n {
                        1 => Ok(ColorSpace::Gray),
                        4 => Ok(ColorSpace::Cmyk),
                        _ => Ok(ColorSpace::Rgb),
                    }
                }
                b"Indexed" | b"I" => {
                    let base = items
                        .get(1)
                        .ok_or_else(|| PdfQaError::decode("indexed colour space without base"))?;
                    let base = parse_color_space(document, base)?;
                    if matches!(base, ColorSpace::Indexed { .. }) {
                        return Err(PdfQaError::decode("nested indexed colour space"));
                    }
                    let lookup = match items.get(3).map(|item| resolve(document, item)) {
                        Some(Ok(Object::String(bytes, _))) => bytes.clone(),
                        Some(Ok(Object::Stream(table))) => table.decompressed_content().unwrap_or_else(|_| table.content.clone()),
                        _ => return Err(PdfQaError::decode("indexed colour space without lookup table")),
                    };
                    Ok(ColorSpace::Indexed { base: Box::new(base), lookup })
                }
                b"CalRGB" | b"Lab" => Ok(ColorSpace::Rgb),
                b"CalGray" => Ok(ColorSpace::Gray),
                other => named_color_space(other),
            }
        }
        _ => Err(PdfQaError::decode("malformed /ColorSpace")),
    }
}

fn named_color_space(name: &[u8]) -> Result<ColorSpace> {
    match name {
        b"DeviceGray" | b"G" | b"CalGray" => Ok(ColorSpace::Gray),
        b"DeviceRGB" | b"RGB" | b"CalRGB" => Ok(ColorSpace::Rgb),
        b"DeviceCMYK" | b"CMYK" => Ok(ColorSpace::Cmyk),
        other => Err(PdfQaError::ImageDecode(format!(
            "unsupported colour space {}",
            String::from_utf8_lossy(other)
        ))),
    }
}

/// Unpack `bits`-wide samples; rows are padded to a byte boundary.
fn unpack_samples(data: &[u8], width: u32, height: u32, components: usize, bits: u32) -> Result<Vec<u16>> {
    if !matches!(bits, 1 | 2 | 4 | 8 | 16) {
        return Err(PdfQaError::ImageDecode(format!("unsupported bits per component {}", bits)));
    }
    let overflow = || PdfQaError::decode("image dimensions overflow");
    let samples_per_row = (width as usize).checked_mul(components).ok_or_else(overflow)?;
    let row_bytes = samples_per_row
        .checked_mul(bits as usize)
        .and_then(|row_bits| row_bits.checked_add(7))
        .ok_or_else(overflow)?
        / 8;
    let needed = row_bytes.checked_mul(height as usize).ok_or_else(overflow)?;
    if data.len() < needed {
        return Err(PdfQaError::ImageDecode(format!(
            "image data truncated: {} bytes, expected {}",
            data.len(),
            needed
        )));
    }

    // Bounded by the stream length checked above.
    let mut samples = Vec::with_capacity(samples_per_row.saturating_mul(height as usize));
    for row in data[..needed].chunks_exact(row_bytes) {
        match bits {
            8 => samples.extend(row[..samples_per_row].iter().map(|&b| b as u16)),
            16 => samples.extend(
                row.chunks_exact(2)
                    .take(samples_per_row)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]])),
            ),
            _ => {
                let per_byte = 8 / bits as usize;
                let mask = (1u16 << bits) - 1;
                for i in 0..samples_per_row {
                    let byte = row[i / per_byte] as u16;
                    let shift = 8 - bits as usize * (i % per_byte + 1);
                    samples.push((byte >> shift) & mask);
                }
            }
        }
    }
    Ok(samples)
}

/// Scale a sample to the 0..=255 range.
fn to_u8(sample: u16, bits: u32) -> u8 {
    match bits {
        8 => sample as u8,
        16 => (sample >> 8) as u8,
        _ => {
            let max = (1u32 << bits) - 1;
            ((sample as u32 * 255) / max) as u8
        }
    }
}

fn cmyk_to_rgb(c: u8, m: u8, y: u8, k: u8) -> [u8; 3] {
    let scale = |v: u8| ((255 - v as u32) * (255 - k as u32) / 255) as u8;
    [scale(c), scale(m), scale(y)]
}

fn raw_to_image(data: &[u8], width: u32, height: u32, bits: u32, color_space: &ColorSpace) -> Result<DynamicImage> {
    let samples = unpack_samples(data, width, height, color_space.components(), bits)?;

    let image = match color_space {
        ColorSpace::Gray => {
            let pixels = samples.iter().map(|&s| to_u8(s, bits)).collect();
            DynamicImage::ImageLuma8(buffer(GrayImage::from_raw(width, height, pixels))?)
        }
        ColorSpace::Rgb => {
            let pixels = samples.iter().map(|&s| to_u8(s, bits)).collect();
            DynamicImage::ImageRgb8(buffer(RgbImage::from_raw(width, height, pixels))?)
        }
        ColorSpace::Cmyk => {
            let mut pixels = Vec::with_capacity(samples.len() / 4 * 3);
            for cmyk in samples.chunks_exact(4) {
                let [c, m, y, k] = [cmyk[0], cmyk[1], cmyk[2], cmyk[3]].map(|s| to_u8(s, bits));
                pixels.extend_from_slice(&cmyk_to_rgb(c, m, y, k));
            }
            DynamicImage::ImageRgb8(buffer(RgbImage::from_raw(width, height, pixels))?)
        }
        ColorSpace::Indexed { base, lookup } => {
            let stride = base.components();
            let mut pixels = Vec::with_capacity(samples.len() * 3);
            for &index in &samples {
                let start = index as usize * stride;
                let entry = lookup.get(start..start + stride).ok_or_else(|| {
                    PdfQaError::ImageDecode(format!("palette index {} out of range", index))
                })?;
                let rgb = match base.as_ref() {
                    ColorSpace::Gray => [entry[0]; 3],
                    ColorSpace::Rgb => [entry[0], entry[1], entry[2]],
                    ColorSpace::Cmyk => cmyk_to_rgb(entry[0], entry[1], entry[2], entry[3]),
                    ColorSpace::Indexed { .. } => return Err(PdfQaError::decode("nested indexed colour space")),
                };
                pixels.extend_from_slice(&rgb);
            }
            DynamicImage::ImageRgb8(buffer(RgbImage::from_raw(width, height, pixels))?)
        }
    };
    Ok(image)
}

fn buffer<P: image::Pixel>(image: Option<ImageBuffer<P, Vec<P::Subpixel>>>) -> Result<ImageBuffer<P, Vec<P::Subpixel>>> {
    image.ok_or_else(|| PdfQaError::decode("sample buffer does not match image dimensions"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf_extraction::fixtures::{self, FixtureImage};
    use image::{GenericImageView, Luma, Rgb};
    use lopdf::dictionary;

    fn solid_rgb(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb(color))
    }

    #[test]
    fn images_come_out_in_page_then_resource_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scanned.pdf");
        fixtures::image_pdf(
            &path,
            &[
                &[
                    FixtureImage::Rgb(solid_rgb(4, 3, [255, 0, 0])),
                    FixtureImage::Gray(GrayImage::from_pixel(5, 2, Luma([128]))),
                ],
                &[FixtureImage::Jpeg(solid_rgb(16, 16, [0, 0, 255]))],
            ],
        );

        let images = extract_images(&path).unwrap();
        assert_eq!(images.len(), 3);
        assert_eq!(images[0].dimensions(), (4, 3));
        assert_eq!(images[0].get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(images[1].dimensions(), (5, 2));
        assert_eq!(images[1].to_luma8().get_pixel(1, 1).0, [128]);
        assert_eq!(images[2].dimensions(), (16, 16));
    }

    #[test]
    fn document_without_images_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("text_only.pdf");
        fixtures::text_pdf(&path, &["Only text here"]);

        assert!(extract_images(&path).unwrap().is_empty());
    }

    #[test]
    fn corrupt_jpeg_is_a_decode_error() {
        let doc = Document::with_version("1.5");
        let stream = Stream::new(
            dictionary! {
                "Subtype" => "Image",
                "Width" => 8,
                "Height" => 8,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            b"definitely not a jpeg".to_vec(),
        );

        let err = decode_image(&doc, &stream).unwrap_err();
        assert!(matches!(err, PdfQaError::ImageDecode(_)));
    }

    #[test]
    fn truncated_samples_are_a_decode_error() {
        let doc = Document::with_version("1.5");
        let stream = Stream::new(
            dictionary! {
                "Subtype" => "Image",
                "Width" => 10,
                "Height" => 10,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            vec![0u8; 12],
        );

        assert!(matches!(decode_image(&doc, &stream), Err(PdfQaError::ImageDecode(_))));
    }

    #[test]
    fn jpeg2000_is_rejected() {
        let doc = Document::with_version("1.5");
        let stream = Stream::new(
            dictionary! { "Subtype" => "Image", "Width" => 1, "Height" => 1, "Filter" => "JPXDecode" },
            vec![0u8; 4],
        );

        assert!(matches!(decode_image(&doc, &stream), Err(PdfQaError::ImageDecode(_))));
    }

    #[test]
    fn one_bit_image_mask_decodes_as_gray() {
        let doc = Document::with_version("1.5");
        // 3 pixels wide: 0b101_00000, second row 0b010_00000
        let stream = Stream::new(
            dictionary! {
                "Subtype" => "Image",
                "Width" => 3,
                "Height" => 2,
                "ImageMask" => true,
            },
            vec![0b1010_0000, 0b0100_0000],
        );

        let gray = decode_image(&doc, &stream).unwrap().to_luma8();
        assert_eq!(gray.get_pixel(0, 0).0, [255]);
        assert_eq!(gray.get_pixel(1, 0).0, [0]);
        assert_eq!(gray.get_pixel(2, 0).0, [255]);
        assert_eq!(gray.get_pixel(1, 1).0, [255]);
    }

    #[test]
    fn indexed_palette_maps_to_rgb() {
        let doc = Document::with_version("1.5");
        let palette = vec![0, 0, 0, 10, 20, 30];
        let stream = Stream::new(
            dictionary! {
                "Subtype" => "Image",
                "Width" => 2,
                "Height" => 1,
                "BitsPerComponent" => 8,
                "ColorSpace" => vec![
                    Object::Name(b"Indexed".to_vec()),
                    Object::Name(b"DeviceRGB".to_vec()),
                    Object::Integer(1),
                    Object::String(palette, lopdf::StringFormat::Hexadecimal),
                ],
            },
            vec![1, 0],
        );

        let rgb = decode_image(&doc, &stream).unwrap().to_rgb8();
        assert_eq!(rgb.get_pixel(0, 0).0, [10, 20, 30]);
        assert_eq!(rgb.get_pixel(1, 0).0, [0, 0, 0]);
    }

    #[test]
    fn huge_dimensions_are_a_decode_error() {
        let doc = Document::with_version("1.5");
        let stream = Stream::new(
            dictionary! {
                "Subtype" => "Image",
                "Width" => u32::MAX as i64,
                "Height" => u32::MAX as i64,
                "ColorSpace" => "DeviceCMYK",
                "BitsPerComponent" => 16,
            },
            vec![0u8; 16],
        );

        assert!(matches!(decode_image(&doc, &stream), Err(PdfQaError::ImageDecode(_))));
    }

    #[test]
    fn indexed_over_indexed_is_a_decode_error() {
        let doc = Document::with_version("1.5");
        let inner = vec![
            Object::Name(b"Indexed".to_vec()),
            Object::Name(b"DeviceGray".to_vec()),
            Object::Integer(1),
            Object::String(vec![0x00, 0xff], lopdf::StringFormat::Hexadecimal),
        ];
        let stream = Stream::new(
            dictionary! {
                "Subtype" => "Image",
                "Width" => 1,
                "Height" => 1,
                "BitsPerComponent" => 8,
                "ColorSpace" => vec![
                    Object::Name(b"Indexed".to_vec()),
                    Object::Array(inner),
                    Object::Integer(1),
                    Object::String(vec![0x00, 0x01], lopdf::StringFormat::Hexadecimal),
                ],
            },
            vec![1],
        );

        assert!(matches!(decode_image(&doc, &stream), Err(PdfQaError::ImageDecode(_))));
    }

    #[test]
    fn cmyk_converts_to_rgb() {
        assert_eq!(cmyk_to_rgb(0, 0, 0, 0), [255, 255, 255]);
        assert_eq!(cmyk_to_rgb(0, 0, 0, 255), [0, 0, 0]);
        assert_eq!(cmyk_to_rgb(255, 0, 0, 0), [0, 255, 255]);
    }

    #[test]
    fn sub_byte_samples_scale_to_full_range() {
        assert_eq!(to_u8(1, 1), 255);
        assert_eq!(to_u8(3, 2), 255);
        assert_eq!(to_u8(0, 4), 0);
        assert_eq!(to_u8(0xFF00, 16), 0xFF);
    }
}
