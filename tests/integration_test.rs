use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::ZlibDecoder;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use chem_pdf_tools::config::CompressOptions;
use chem_pdf_tools::error::PdfError;
use chem_pdf_tools::pdf::{
    compress_basic, compress_extended, LopdfBackend, SkipReason, Stage, StageOutcome,
};

fn page_text(page: usize) -> Vec<u8> {
    let mut text = String::new();
    for line in 0..40 {
        text.push_str(&format!(
            "BT /F1 11 Tf 72 {} Td (Page {} line {}) Tj ET\n",
            760 - line * 16,
            page + 1,
            line + 1
        ));
    }
    text.into_bytes()
}

fn gradient(width: usize, height: usize) -> Vec<u8> {
    (0..width * height)
        .flat_map(|i| {
            let x = (i % width) as u8;
            let y = (i / width) as u8;
            [x.wrapping_mul(4), y.wrapping_mul(4), 128]
        })
        .collect()
}

/// A PDF with a two-level page tree, one font copy per page, an image on the
/// first page, document info and an unreferenced object.
fn sample_document(pages: usize) -> Document {
    let mut doc = Document::with_version("1.5");
    let root_pages = doc.new_object_id();
    let inner_pages = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 64,
            "Height" => 64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        gradient(64, 64),
    ));

    let mut kids = Vec::new();
    for page in 0..pages {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let mut resources = dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        };
        if page == 0 {
            resources.set("XObject", dictionary! { "Im1" => image_id });
        }
        let content_id = doc.add_object(Stream::new(dictionary! {}, page_text(page)));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => inner_pages,
            "Contents" => content_id,
            "Resources" => resources,
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        inner_pages,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Parent" => root_pages,
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    doc.objects.insert(
        root_pages,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(inner_pages)],
            "Count" => pages as i64,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => root_pages,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal("Sample"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.add_object(dictionary! { "Unused" => true });
    doc
}

fn write_sample(dir: &Path, pages: usize) -> PathBuf {
    let path = dir.join("input.pdf");
    let mut doc = sample_document(pages);
    doc.save(&path).expect("Failed to write sample PDF");
    path
}

/// Decoded content of every page, in order.
fn page_contents(doc: &Document) -> Vec<Vec<u8>> {
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let mut content = Vec::new();
            for stream_id in doc.get_page_contents(page_id) {
                let stream = doc
                    .get_object(stream_id)
                    .and_then(Object::as_stream)
                    .expect("content stream");
                content.extend(decode(stream));
            }
            content
        })
        .collect()
}

fn decode(stream: &Stream) -> Vec<u8> {
    match stream.dict.get(b"Filter").and_then(Object::as_name) {
        Ok(b"FlateDecode") => {
            let mut out = Vec::new();
            ZlibDecoder::new(stream.content.as_slice())
                .read_to_end(&mut out)
                .expect("valid zlib data");
            out
        }
        _ => stream.content.clone(),
    }
}

fn objects_of_type(doc: &Document, kind: &[u8]) -> Vec<ObjectId> {
    doc.objects
        .iter()
        .filter(|(_, object)| {
            let dict = match object {
                Object::Dictionary(d) => d,
                Object::Stream(s) => &s.dict,
                _ => return false,
            };
            dict.get(b"Type")
                .and_then(Object::as_name)
                .map(|n| n == kind)
                .unwrap_or(false)
        })
        .map(|(&id, _)| id)
        .collect()
}

#[test]
fn test_basic_preserves_pages_and_content() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_sample(dir.path(), 3);
    let output = dir.path().join("output.pdf");

    let report = compress_basic(&LopdfBackend::new(), &input, &output).expect("compress");
    assert_eq!(report.pages, 3);
    assert!(matches!(
        report.outcome(Stage::ContentCompression),
        Some(StageOutcome::Applied(_))
    ));

    let source = Document::load(&input).expect("load input");
    let result = Document::load(&output).expect("load output");
    assert_eq!(result.get_pages().len(), 3);
    assert_eq!(page_contents(&result), page_contents(&source));
    assert!(fs::metadata(&output).unwrap().len() < fs::metadata(&input).unwrap().len());
}

#[test]
fn test_basic_drops_unreferenced_structure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_sample(dir.path(), 2);
    let output = dir.path().join("output.pdf");
    compress_basic(&LopdfBackend::new(), &input, &output).expect("compress");

    let result = Document::load(&output).expect("load output");
    assert_eq!(objects_of_type(&result, b"Pages").len(), 1);
    assert!(result.trailer.get(b"Info").is_err());
    assert!(!result
        .objects
        .values()
        .any(|o| o.as_dict().map(|d| d.has(b"Unused")).unwrap_or(false)));
}

#[test]
fn test_basic_overwrites_existing_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_sample(dir.path(), 1);
    let output = dir.path().join("output.pdf");
    fs::write(&output, vec![b'x'; 1_000_000]).unwrap();

    compress_basic(&LopdfBackend::new(), &input, &output).expect("compress");
    let bytes = fs::read(&output).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
    assert!(bytes.len() < 1_000_000);
}

#[test]
fn test_basic_does_not_create_directories() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_sample(dir.path(), 1);
    let output = dir.path().join("missing").join("output.pdf");

    let err = compress_basic(&LopdfBackend::new(), &input, &output).unwrap_err();
    assert!(matches!(err, PdfError::Write { .. }));
}

#[test]
fn test_unreadable_input_is_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("input.pdf");
    fs::write(&input, b"this is not a PDF").unwrap();
    let output = dir.path().join("output.pdf");

    let err = compress_basic(&LopdfBackend::new(), &input, &output).unwrap_err();
    assert!(matches!(err, PdfError::Load { .. }));
    let err = compress_extended(
        &LopdfBackend::new(),
        &input,
        &output,
        &CompressOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, PdfError::Load { .. }));
    assert!(!output.exists());
}

#[test]
fn test_compress_file_uses_lopdf_backend() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_sample(dir.path(), 2);
    let output = dir.path().join("nested").join("output.pdf");

    let report = chem_pdf_tools::compress_file(&input, &output, &CompressOptions::default())
        .expect("compress");

    assert_eq!(report.pages, 2);
    assert_eq!(report.bytes_written, fs::metadata(&output).expect("output").len());
    let result = Document::load(&output).expect("load output");
    assert_eq!(result.get_pages().len(), 2);
}

#[test]
fn test_extended_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_sample(dir.path(), 4);
    let output = dir.path().join("output.pdf");

    let report = compress_extended(
        &LopdfBackend::new(),
        &input,
        &output,
        &CompressOptions::default(),
    )
    .expect("compress");

    match report.outcome(Stage::PageCompression) {
        Some(StageOutcome::Applied(tally)) => {
            assert_eq!(tally.succeeded, 4);
            assert_eq!(tally.failed, 0);
        }
        other => panic!("unexpected lossless outcome {:?}", other),
    }
    assert_eq!(
        report.outcome(Stage::ImageRecompression),
        Some(&StageOutcome::Skipped(SkipReason::NotRequested))
    );

    let source = Document::load(&input).expect("load input");
    let result = Document::load(&output).expect("load output");
    assert_eq!(page_contents(&result), page_contents(&source));
    // four identical fonts collapse into one
    assert_eq!(objects_of_type(&source, b"Font").len(), 4);
    assert_eq!(objects_of_type(&result, b"Font").len(), 1);
    assert!(result.objects.len() < source.objects.len());
}

/// Objects other than cross-reference streams, in id order.
fn document_objects(doc: &Document) -> Vec<(ObjectId, &Object)> {
    doc.objects
        .iter()
        .filter(|(_, object)| match object {
            Object::Stream(stream) => !stream
                .dict
                .get(b"Type")
                .and_then(Object::as_name)
                .map(|name| name == b"XRef")
                .unwrap_or(false),
            _ => true,
        })
        .map(|(id, object)| (*id, object))
        .collect()
}

#[test]
fn test_extended_passthrough_is_a_no_op() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_sample(dir.path(), 2);
    let output = dir.path().join("output.pdf");

    let report = compress_extended(
        &LopdfBackend::new(),
        &input,
        &output,
        &CompressOptions::passthrough(),
    )
    .expect("compress");
    assert!(report
        .stages
        .iter()
        .all(|(_, outcome)| *outcome == StageOutcome::Skipped(SkipReason::NotRequested)));

    let source = Document::load(&input).expect("load input");
    let result = Document::load(&output).expect("load output");
    assert_eq!(result.get_pages().len(), source.get_pages().len());
    // each save writes a fresh cross-reference stream under a new id
    let source_objects = document_objects(&source);
    let result_objects = document_objects(&result);
    assert_eq!(result_objects.len(), source_objects.len());
    for (id, object) in source_objects {
        let other = result_objects
            .iter()
            .find(|(other_id, _)| *other_id == id)
            .map(|(_, object)| *object)
            .expect("same object ids");
        match (object, other) {
            (Object::Stream(a), Object::Stream(b)) => assert_eq!(a.content, b.content),
            (a, b) => assert_eq!(format!("{:?}", a), format!("{:?}", b)),
        }
    }
}

#[test]
fn test_extended_is_deterministic() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_sample(dir.path(), 3);
    let first = dir.path().join("first.pdf");
    let second = dir.path().join("second.pdf");
    let options = CompressOptions::default();

    compress_extended(&LopdfBackend::new(), &input, &first, &options).expect("first run");
    compress_extended(&LopdfBackend::new(), &input, &second, &options).expect("second run");
    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn test_extended_creates_parent_directories() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_sample(dir.path(), 1);
    let output = dir.path().join("nested").join("deeper").join("output.pdf");

    compress_extended(
        &LopdfBackend::new(),
        &input,
        &output,
        &CompressOptions::default(),
    )
    .expect("compress");
    assert!(output.is_file());
}

#[test]
fn test_corrupt_page_does_not_stop_the_others() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("input.pdf");
    let mut doc = sample_document(3);
    // Claim Flate on the second page's content without compressing it
    let second = *doc.get_pages().get(&2).expect("page 2");
    let content_id = doc.get_page_contents(second)[0];
    doc.get_object_mut(content_id)
        .and_then(Object::as_stream_mut)
        .expect("content stream")
        .dict
        .set("Filter", "FlateDecode");
    doc.save(&input).expect("write input");

    let output = dir.path().join("output.pdf");
    let options = CompressOptions {
        deduplicate: false,
        ..CompressOptions::default()
    };
    let report =
        compress_extended(&LopdfBackend::new(), &input, &output, &options).expect("compress");
    match report.outcome(Stage::PageCompression) {
        Some(StageOutcome::Applied(tally)) => {
            assert_eq!(tally.succeeded, 2);
            assert_eq!(tally.failed, 1);
        }
        other => panic!("unexpected lossless outcome {:?}", other),
    }

    let result = Document::load(&output).expect("load output");
    for (number, page_id) in result.get_pages() {
        let content_id = result.get_page_contents(page_id)[0];
        let stream = result.get_object(content_id).unwrap().as_stream().unwrap();
        if number != 2 {
            assert_eq!(decode(stream), page_text(number as usize - 1));
        }
    }
}

#[cfg(feature = "images")]
#[test]
fn test_images_recompressed_as_jpeg() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_sample(dir.path(), 2);
    let output = dir.path().join("output.pdf");
    let options = CompressOptions {
        image_quality: Some(40),
        ..CompressOptions::default()
    };

    let report =
        compress_extended(&LopdfBackend::new(), &input, &output, &options).expect("compress");
    match report.outcome(Stage::ImageRecompression) {
        Some(StageOutcome::Applied(tally)) => assert_eq!(tally.succeeded, 1),
        other => panic!("unexpected image outcome {:?}", other),
    }

    let result = Document::load(&output).expect("load output");
    let images: Vec<&Stream> = result
        .objects
        .values()
        .filter_map(|o| o.as_stream().ok())
        .filter(|s| {
            s.dict
                .get(b"Subtype")
                .and_then(Object::as_name)
                .map(|n| n == b"Image")
                .unwrap_or(false)
        })
        .collect();
    assert_eq!(images.len(), 1);
    assert_eq!(
        images[0].dict.get(b"Filter").and_then(Object::as_name).unwrap(),
        b"DCTDecode"
    );
    assert!(images[0].content.len() < 64 * 64 * 3);
}
