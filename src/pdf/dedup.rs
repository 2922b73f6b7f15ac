//! Identical object merging and orphan removal

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use lopdf::{Document, Object, ObjectId};
use sha2::{Digest, Sha256};

/// Merging one layer of duplicates can make their parents identical; stop
/// after this many passes regardless.
const MAX_ROUNDS: usize = 16;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupStats {
    /// Objects replaced by an identical one
    pub merged: usize,
    /// Objects dropped because nothing referenced them
    pub orphans_removed: usize,
}

/// Merge byte-identical indirect objects into the one with the lowest id,
/// then prune everything unreachable from the trailer.
pub fn remove_identical_objects(doc: &mut Document) -> DedupStats {
    let mut merged = 0;
    for round in 0..MAX_ROUNDS {
        let replacements = find_duplicates(doc);
        if replacements.is_empty() {
            break;
        }
        log::debug!("Dedup round {}: {} duplicates", round + 1, replacements.len());
        merged += replacements.len();

        for id in replacements.keys() {
            doc.objects.remove(id);
        }
        for object in doc.objects.values_mut() {
            redirect(object, &replacements);
        }
        for (_, value) in doc.trailer.iter_mut() {
            redirect(value, &replacements);
        }
    }

    let orphans_removed = doc.prune_objects().len();
    DedupStats {
        merged,
        orphans_removed,
    }
}

/// Duplicate id -> id of the first identical object.
fn find_duplicates(doc: &Document) -> BTreeMap<ObjectId, ObjectId> {
    let mut first_seen: BTreeMap<[u8; 32], ObjectId> = BTreeMap::new();
    let mut replacements = BTreeMap::new();
    for (&id, object) in &doc.objects {
        if is_page_tree_node(object) {
            continue;
        }
        match first_seen.entry(fingerprint(object)) {
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
            Entry::Occupied(slot) => {
                replacements.insert(id, *slot.get());
            }
        }
    }
    replacements
}

/// Catalog, page tree nodes and pages keep their identity.
fn is_page_tree_node(object: &Object) -> bool {
    let dict = match object {
        Object::Dictionary(dict) => dict,
        Object::Stream(stream) => &stream.dict,
        _ => return false,
    };
    matches!(
        dict.get(b"Type").and_then(Object::as_name),
        Ok(b"Catalog") | Ok(b"Pages") | Ok(b"Page")
    )
}

fn redirect(object: &mut Object, replacements: &BTreeMap<ObjectId, ObjectId>) {
    match object {
        Object::Reference(id) => {
            if let Some(target) = replacements.get(id) {
                *id = *target;
            }
        }
        Object::Array(items) => {
            for item in items {
                redirect(item, replacements);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter_mut() {
                redirect(value, replacements);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter_mut() {
                redirect(value, replacements);
            }
        }
        _ => {}
    }
}

/// SHA-256 over a canonical serialisation: dictionary keys sorted, lengths
/// prefixed, reals compared bit for bit.
pub fn fingerprint(object: &Object) -> [u8; 32] {
    let mut hasher = Sha256::new();
    feed(&mut hasher, object);
    hasher.finalize().into()
}

fn feed(hasher: &mut Sha256, object: &Object) {
    match object {
        Object::Null => hasher.update(b"n"),
        Object::Boolean(b) => hasher.update([b'b', *b as u8]),
        Object::Integer(i) => {
            hasher.update(b"i");
            hasher.update(i.to_be_bytes());
        }
        Object::Real(r) => {
            hasher.update(b"r");
            hasher.update(r.to_bits().to_be_bytes());
        }
        Object::Name(name) => feed_bytes(hasher, b'/', name),
        Object::String(bytes, _) => feed_bytes(hasher, b's', bytes),
        Object::Array(items) => {
            hasher.update(b"[");
            hasher.update((items.len() as u64).to_be_bytes());
            for item in items {
                feed(hasher, item);
            }
        }
        Object::Dictionary(dict) => feed_dictionary(hasher, dict),
        Object::Stream(stream) => {
            hasher.update(b"S");
            feed_dictionary(hasher, &stream.dict);
            feed_bytes(hasher, b'c', &stream.content);
        }
        Object::Reference((number, generation)) => {
            hasher.update(b"R");
            hasher.update(number.to_be_bytes());
            hasher.update(generation.to_be_bytes());
        }
    }
}

fn feed_bytes(hasher: &mut Sha256, tag: u8, bytes: &[u8]) {
    hasher.update([tag]);
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

fn feed_dictionary(hasher: &mut Sha256, dict: &lopdf::Dictionary) {
    let mut entries: Vec<(&Vec<u8>, &Object)> = dict.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    hasher.update(b"<");
    hasher.update((entries.len() as u64).to_be_bytes());
    for (key, value) in entries {
        feed_bytes(hasher, b'k', key);
        feed(hasher, value);
    }
}
