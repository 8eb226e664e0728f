// Small generated PDFs shared by unit and integration tests
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::io::Cursor;
use std::path::Path;

pub enum FixtureImage {
    Rgb(RgbImage),
    Gray(GrayImage),
    Jpeg(RgbImage),
}

/// One page per entry, each showing its string in Courier.
pub fn text_pdf(path: &Path, pages: &[&str]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        kids.push(add_page(&mut doc, pages_id, content, None));
    }

    finish(doc, pages_id, kids, Some(resources_id), path);
}

/// One page per entry, each drawing its images in order and carrying no text.
pub fn image_pdf(path: &Path, pages: &[&[FixtureImage]]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for images in pages {
        let mut xobjects = Dictionary::new();
        let mut operations = Vec::new();
        for (index, image) in images.iter().enumerate() {
            let name = format!("Im{}", index);
            let image_id = doc.add_object(image_stream(image));
            xobjects.set(name.as_bytes().to_vec(), image_id);
            operations.push(Operation::new("q", vec![]));
            operations.push(Operation::new(
                "cm",
                vec![100.into(), 0.into(), 0.into(), 100.into(), 0.into(), 0.into()],
            ));
            operations.push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
            operations.push(Operation::new("Q", vec![]));
        }
        let resources = dictionary! { "XObject" => xobjects };
        kids.push(add_page(&mut doc, pages_id, Content { operations }, Some(resources)));
    }

    finish(doc, pages_id, kids, None, path);
}

pub fn image_stream(image: &FixtureImage) -> Stream {
    match image {
        FixtureImage::Rgb(rgb) => Stream::new(
            image_dict(rgb.width(), rgb.height(), "DeviceRGB"),
            rgb.as_raw().clone(),
        ),
        FixtureImage::Gray(gray) => Stream::new(
            image_dict(gray.width(), gray.height(), "DeviceGray"),
            gray.as_raw().clone(),
        ),
        FixtureImage::Jpeg(rgb) => {
            let mut bytes = Cursor::new(Vec::new());
            DynamicImage::ImageRgb8(rgb.clone())
                .write_to(&mut bytes, ImageFormat::Jpeg)
                .unwrap();
            let mut dict = image_dict(rgb.width(), rgb.height(), "DeviceRGB");
            dict.set("Filter", "DCTDecode");
            Stream::new(dict, bytes.into_inner())
        }
    }
}

fn image_dict(width: u32, height: u32, color_space: &str) -> Dictionary {
    dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => Object::Name(color_space.as_bytes().to_vec()),
        "BitsPerComponent" => 8,
    }
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    content: Content,
    resources: Option<Dictionary>,
) -> Object {
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let mut page = dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    };
    if let Some(resources) = resources {
        page.set("Resources", resources);
    }
    doc.add_object(page).into()
}

fn finish(
    mut doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    resources_id: Option<ObjectId>,
    path: &Path,
) {
    let count = kids.len() as i64;
    let mut pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    };
    if let Some(id) = resources_id {
        pages.set("Resources", id);
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}
