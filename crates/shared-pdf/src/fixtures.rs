//! In-memory PDF builder for tests.

use lopdf::{Dictionary, Document, Object, Stream};

/// Build a PDF where every page shows the given items, one `Tj` per item.
pub fn pdf_from_pages(pages: &[&[&str]]) -> Vec<u8> {
    let streams: Vec<String> = pages
        .iter()
        .map(|items| {
            let mut content = String::from("BT /F1 12 Tf 50 700 Td");
            for item in items.iter() {
                content.push_str(&format!(" ({}) Tj 0 -14 Td", escape(item)));
            }
            content.push_str(" ET");
            content
        })
        .collect();
    let refs: Vec<&str> = streams.iter().map(String::as_str).collect();
    pdf_from_raw_streams(&refs)
}

/// Build a PDF with one page per raw content stream.
pub fn pdf_from_raw_streams(streams: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let catalog_id = doc.new_object_id();

    let mut page_ids = Vec::new();
    for stream in streams {
        let page_id = doc.new_object_id();
        let content_id = doc.new_object_id();

        doc.objects.insert(
            content_id,
            Object::Stream(Stream::new(Dictionary::new(), stream.as_bytes().to_vec())),
        );

        let mut page_dict = Dictionary::new();
        page_dict.set("Type", Object::Name(b"Page".to_vec()));
        page_dict.set("Parent", Object::Reference(pages_id));
        page_dict.set("Contents", Object::Reference(content_id));
        page_dict.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ]),
        );

        doc.objects.insert(page_id, Object::Dictionary(page_dict));
        page_ids.push(Object::Reference(page_id));
    }

    let mut pages_dict = Dictionary::new();
    pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
    pages_dict.set("Count", Object::Integer(page_ids.len() as i64));
    pages_dict.set("Kids", Object::Array(page_ids));
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let mut catalog_dict = Dictionary::new();
    catalog_dict.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog_dict.set("Pages", Object::Reference(pages_id));
    doc.objects.insert(catalog_id, Object::Dictionary(catalog_dict));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    if let Err(e) = doc.save_to(&mut buffer) {
        panic!("in-memory PDF fixture failed to serialize: {e}");
    }
    buffer
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}
