//! [`PdfBackend`] on top of lopdf

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::config::defaults::DEFAULT_COMPRESSION_LEVEL;
use crate::error::{PdfError, StageError};

use super::dedup::{self, DedupStats};
use super::document::{Capabilities, PdfBackend, PdfDocument};
use super::images;

/// Page attributes a page may inherit from its ancestors
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains
const MAX_TREE_DEPTH: usize = 64;

#[derive(Debug, Clone)]
pub struct LopdfBackend {
    capabilities: Capabilities,
}

impl Default for LopdfBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl LopdfBackend {
    pub fn new() -> Self {
        Self {
            capabilities: Capabilities {
                content_compression: true,
                page_compression: true,
                image_recompression: cfg!(feature = "images"),
                deduplication: true,
            },
        }
    }

    /// Restrict (or pretend to extend) what the pipelines may ask for.
    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        Self { capabilities }
    }
}

impl PdfBackend for LopdfBackend {
    type Document = LopdfDocument;

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn load_pages(&self, path: &Path) -> Result<LopdfDocument, PdfError> {
        let source = open(path)?;
        let doc = rebuild_page_tree(source).map_err(|e| PdfError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(LopdfDocument { doc })
    }

    fn clone_document(&self, path: &Path) -> Result<LopdfDocument, PdfError> {
        Ok(LopdfDocument { doc: open(path)? })
    }
}

fn open(path: &Path) -> Result<Document, PdfError> {
    let doc = Document::load(path).map_err(|e| PdfError::Load {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    log::debug!(
        "Loaded {} (PDF {}, {} objects, {} pages)",
        path.display(),
        doc.version,
        doc.objects.len(),
        doc.get_pages().len()
    );
    Ok(doc)
}

/// Copy the pages of `source`, in order, into a fresh document with a flat
/// page tree. Whatever the pages do not reference (outlines, document info,
/// the old tree) is dropped.
fn rebuild_page_tree(mut source: Document) -> Result<Document, lopdf::Error> {
    let page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();

    // Inherited attributes would be lost with the old tree.
    for &page_id in &page_ids {
        let mut inherited = Vec::new();
        {
            let page = source.get_dictionary(page_id)?;
            for key in INHERITABLE_KEYS {
                if !page.has(key) {
                    if let Some(value) = inherited_attribute(&source, page, key) {
                        inherited.push((key.to_vec(), value));
                    }
                }
            }
        }
        let page = source.get_dictionary_mut(page_id)?;
        for (key, value) in inherited {
            page.set(key, value);
        }
    }

    let mut doc = Document::with_version(source.version.clone());
    doc.objects = std::mem::take(&mut source.objects);
    doc.max_id = source.max_id;

    let pages_id = doc.new_object_id();
    for &page_id in &page_ids {
        doc.get_dictionary_mut(page_id)?.set("Parent", pages_id);
    }
    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_ids.len() as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let dropped = doc.prune_objects();
    log::debug!(
        "Rebuilt page tree: {} pages, {} objects dropped",
        page_ids.len(),
        dropped.len()
    );
    Ok(doc)
}

/// Follow a dereferenced object.
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Object, lopdf::Error> {
    match object {
        Object::Reference(id) => doc.get_object(*id),
        other => Ok(other),
    }
}

/// Look `key` up on the ancestors of a page node.
pub(crate) fn inherited_attribute(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(parent?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

/// Filter names of a stream, in application order.
pub(crate) fn stream_filters(dict: &Dictionary) -> Result<Vec<Vec<u8>>, StageError> {
    match dict.get(b"Filter") {
        Err(_) => Ok(Vec::new()),
        Ok(Object::Name(name)) => Ok(vec![name.clone()]),
        Ok(Object::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_name()
                    .map(|n| n.to_vec())
                    .map_err(|_| StageError::failed("malformed Filter array"))
            })
            .collect(),
        Ok(_) => Err(StageError::failed("malformed Filter entry")),
    }
}

pub(crate) fn inflate(data: &[u8]) -> Result<Vec<u8>, StageError> {
    let mut out = Vec::new();
    ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| StageError::failed(format!("corrupt FlateDecode data: {}", e)))?;
    Ok(out)
}

pub(crate) fn deflate(data: &[u8], level: u32) -> Result<Vec<u8>, StageError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level.min(9)));
    encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .map_err(|e| StageError::failed(format!("deflate failed: {}", e)))
}

/// Filters lopdf can undo when decoding a content stream.
const DECODABLE_FILTERS: [&[u8]; 2] = [b"FlateDecode", b"LZWDecode"];

/// Re-deflate one content stream at `level`. A stream already stored as
/// plain Flate is only replaced when the result is smaller; any other
/// encoding is always normalized to plain Flate.
fn compress_stream(stream: &mut Stream, level: u32) -> Result<(), StageError> {
    let filters = stream_filters(&stream.dict)?;
    let plain_flate = matches!(filters.as_slice(), [only] if only.as_slice() == b"FlateDecode")
        && !stream.dict.has(b"DecodeParms");
    let raw = match filters.as_slice() {
        [] => stream.content.clone(),
        _ if plain_flate => inflate(&stream.content)?,
        other => stream.decompressed_content().map_err(|e| {
            let names: Vec<String> = other
                .iter()
                .map(|n| String::from_utf8_lossy(n).into_owned())
                .collect();
            let reason = format!("content stream filter {}: {}", names.join(" "), e);
            if other.iter().all(|n| DECODABLE_FILTERS.contains(&n.as_slice())) {
                StageError::Failed(reason)
            } else {
                StageError::Unsupported(reason)
            }
        })?,
    };

    let compressed = deflate(&raw, level)?;
    if !plain_flate || compressed.len() < stream.content.len() {
        stream.dict.set("Filter", "FlateDecode");
        stream.dict.remove(b"DecodeParms");
        stream.set_content(compressed);
    }
    Ok(())
}

/// A document opened by [`LopdfBackend`].
#[derive(Debug, Clone)]
pub struct LopdfDocument {
    doc: Document,
}

impl LopdfDocument {
    pub fn new(doc: Document) -> Self {
        Self { doc }
    }

    pub fn inner(&self) -> &Document {
        &self.doc
    }

    pub fn into_inner(self) -> Document {
        self.doc
    }

    fn page_id(&self, page: usize) -> Result<ObjectId, StageError> {
        self.doc
            .get_pages()
            .into_values()
            .nth(page)
            .ok_or_else(|| StageError::failed(format!("no page {}", page)))
    }
}

impl PdfDocument for LopdfDocument {
    fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    fn compress_content_streams(&mut self) -> Result<(), StageError> {
        let pages = self.page_count();
        let mut failed = Vec::new();
        let mut unsupported = 0;
        for page in 0..pages {
            match self.compress_page(page, DEFAULT_COMPRESSION_LEVEL) {
                Ok(()) => {}
                Err(StageError::Unsupported(reason)) => {
                    log::debug!("Page {}: {}", page + 1, reason);
                    unsupported += 1;
                }
                Err(StageError::Failed(reason)) => {
                    log::debug!("Page {}: {}", page + 1, reason);
                    failed.push(page + 1);
                }
            }
        }
        if !failed.is_empty() {
            return Err(StageError::failed(format!(
                "{} of {} pages failed to compress",
                failed.len(),
                pages
            )));
        }
        if pages > 0 && unsupported == pages {
            return Err(StageError::unsupported("no page has compressible content"));
        }
        Ok(())
    }

    fn compress_page(&mut self, page: usize, level: u32) -> Result<(), StageError> {
        let page_id = self.page_id(page)?;
        let mut unsupported = None;
        for content_id in self.doc.get_page_contents(page_id) {
            let stream = self.doc.get_object_mut(content_id)?.as_stream_mut()?;
            match compress_stream(stream, level) {
                Err(StageError::Unsupported(reason)) => unsupported = Some(reason),
                other => other?,
            }
        }
        match unsupported {
            Some(reason) => Err(StageError::Unsupported(reason)),
            None => Ok(()),
        }
    }

    fn image_count(&self, page: usize) -> Result<usize, StageError> {
        let page_id = self.page_id(page)?;
        Ok(images::page_images(&self.doc, page_id)?.len())
    }

    fn recompress_image(&mut self, page: usize, image: usize, quality: u8) -> Result<(), StageError> {
        let page_id = self.page_id(page)?;
        let image_id = images::page_images(&self.doc, page_id)?
            .get(image)
            .copied()
            .ok_or_else(|| StageError::failed(format!("no image {} on page {}", image, page + 1)))?;
        images::recompress(&mut self.doc, image_id, quality)
    }

    fn remove_identical_objects(&mut self) -> Result<DedupStats, StageError> {
        Ok(dedup::remove_identical_objects(&mut self.doc))
    }

    fn save(&mut self, path: &Path) -> Result<u64, PdfError> {
        let write_error = |reason: String| PdfError::Write {
            path: path.to_path_buf(),
            reason,
        };
        let file = File::create(path).map_err(|e| write_error(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        self.doc
            .save_to(&mut writer)
            .map_err(|e| write_error(e.to_string()))?;
        writer.flush().map_err(|e| write_error(e.to_string()))?;
        drop(writer);
        let size = fs::metadata(path)
            .map_err(|e| write_error(e.to_string()))?
            .len();
        log::debug!("Wrote {} ({} bytes)", path.display(), size);
        Ok(size)
    }
}
