use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use std::path::{Path, PathBuf};

use lopdf::xref::XrefEntry;
use lopdf::{Dictionary, Document, Object, ObjectId, Reader, Stream};
use tracing::debug;

use crate::error::InfoError;
use crate::types::{BoxKind, FormKind, PageGeometry, Permissions};
use crate::utils::{get_contents, get_inherited, maybe_get, maybe_get_string, pdf_to_utf8};

/// Options for opening a document.
///
/// # Examples
///
/// ```no_run
/// use pdf_info::InfoDocument;
///
/// let doc = InfoDocument::options()
///     .owner_password("secret")
///     .open("encrypted.pdf")?;
/// println!("{} pages", doc.num_pages());
/// # Ok::<(), pdf_info::InfoError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    owner_password: Option<String>,
    user_password: Option<String>,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the owner password for encrypted PDFs.
    pub fn owner_password(mut self, password: impl Into<String>) -> Self {
        self.owner_password = Some(password.into());
        self
    }

    /// Set the user password for encrypted PDFs.
    pub fn user_password(mut self, password: impl Into<String>) -> Self {
        self.user_password = Some(password.into());
        self
    }

    /// Open the PDF file at the given path.
    pub fn open<P: AsRef<Path>>(self, path: P) -> Result<InfoDocument, InfoError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        self.load(&bytes, path.to_path_buf())
    }

    /// Open a PDF held in memory. `file_name` is what gets reported as the
    /// document's source.
    pub fn open_bytes<P: AsRef<Path>>(
        self,
        bytes: &[u8],
        file_name: P,
    ) -> Result<InfoDocument, InfoError> {
        self.load(bytes, file_name.as_ref().to_path_buf())
    }

    /// Open a PDF from a reader.
    pub fn open_reader<R: Read, P: AsRef<Path>>(
        self,
        mut reader: R,
        file_name: P,
    ) -> Result<InfoDocument, InfoError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.open_bytes(&bytes, file_name)
    }

    fn load(self, bytes: &[u8], file_name: PathBuf) -> Result<InfoDocument, InfoError> {
        let mut doc = Document::load_mem(bytes)?;

        // The permission word has to be read before the document is decrypted.
        let encrypted = doc.trailer.get(b"Encrypt").is_ok();
        let permissions = if encrypted {
            maybe_get::<&Dictionary>(&doc, &doc.trailer, b"Encrypt")
                .and_then(|dict| maybe_get::<i64>(&doc, dict, b"P"))
                .map(Permissions::from_bits)
                .unwrap_or(Permissions::ALL)
        } else {
            Permissions::ALL
        };

        // lopdf has already decrypted documents whose user password is empty.
        if encrypted && doc.encryption_state.is_none() {
            doc = self.decrypt(doc, bytes)?;
        }

        let pages: Vec<ObjectId> = doc.get_pages().values().copied().collect();
        debug!("loaded {} with {} pages", file_name.display(), pages.len());

        Ok(InfoDocument {
            linearized: first_object_is_linearized(&doc),
            doc,
            file_name,
            pages,
            encrypted,
            permissions,
        })
    }

    /// Parse the objects lopdf left encrypted, then decrypt them with the
    /// user password, or with the owner password when only that one
    /// authenticates. An absent user password is the empty one.
    fn decrypt(&self, doc: Document, bytes: &[u8]) -> Result<Document, InfoError> {
        let user = self.user_password.as_deref().unwrap_or("");
        let password = match self.owner_password.as_deref() {
            Some(owner)
                if doc.authenticate_user_password(user).is_err()
                    && doc.authenticate_owner_password(owner).is_ok() =>
            {
                // lopdf keys revisions before 5 off the user password only
                let revision = maybe_get::<&Dictionary>(&doc, &doc.trailer, b"Encrypt")
                    .and_then(|dict| maybe_get::<i64>(&doc, dict, b"R"))
                    .unwrap_or(0);
                if revision < 5 {
                    return Err(InfoError::OwnerPasswordUnsupported { revision });
                }
                owner
            }
            _ => user,
        };

        let ids: Vec<ObjectId> = doc
            .reference_table
            .entries
            .iter()
            .filter_map(|(&num, entry)| match *entry {
                XrefEntry::Normal { generation, .. } => Some((num, generation)),
                _ => None,
            })
            .collect();

        // Object offsets count from the header, as lopdf's own reader does.
        let header = bytes.windows(5).position(|w| w == b"%PDF-").unwrap_or(0);
        let mut reader = Reader {
            buffer: &bytes[header..],
            document: doc,
            encryption_state: None,
            raw_objects: BTreeMap::new(),
        };
        for id in ids {
            match reader.get_object(id, &mut HashSet::new()) {
                Ok(object) => {
                    reader.document.objects.entry(id).or_insert(object);
                }
                Err(e) => debug!("skipping object {} {}: {}", id.0, id.1, e),
            }
        }

        let mut doc = reader.document;
        doc.decrypt(password).map_err(InfoError::DecryptError)?;
        doc.catalog().map_err(InfoError::DecryptError)?;
        Ok(doc)
    }
}

/// An opened PDF document and the queries the report is built from.
#[derive(Debug)]
pub struct InfoDocument {
    doc: Document,
    file_name: PathBuf,
    pages: Vec<ObjectId>,
    encrypted: bool,
    permissions: Permissions,
    linearized: bool,
}

impl InfoDocument {
    /// Create options for opening a document.
    pub fn options() -> OpenOptions {
        OpenOptions::new()
    }

    /// Open an unencrypted (or empty-password) PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<InfoDocument, InfoError> {
        OpenOptions::new().open(path)
    }

    pub fn file_name(&self) -> &Path {
        &self.file_name
    }

    pub fn num_pages(&self) -> u32 {
        self.pages.len() as u32
    }

    /// The PDF version from the file header, or from the catalog's
    /// `/Version` entry when that one is newer.
    pub fn pdf_version(&self) -> f64 {
        let header = self.doc.version.trim().parse::<f64>().unwrap_or(0.);
        let catalog = self
            .catalog()
            .and_then(|catalog| catalog.get(b"Version").ok())
            .and_then(|v| v.as_name().ok())
            .and_then(|name| std::str::from_utf8(name).ok())
            .and_then(|name| name.trim().parse::<f64>().ok());
        match catalog {
            Some(v) if v > header => v,
            _ => header,
        }
    }

    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// Permission flags of an encrypted document. Knowing the owner
    /// password does not lift them.
    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    pub fn ok_to_print(&self) -> bool {
        self.permissions.print
    }

    pub fn ok_to_copy(&self) -> bool {
        self.permissions.copy
    }

    pub fn ok_to_change(&self) -> bool {
        self.permissions.change
    }

    pub fn ok_to_add_notes(&self) -> bool {
        self.permissions.add_notes
    }

    pub fn is_linearized(&self) -> bool {
        self.linearized
    }

    /// Geometry of the 1-based page `page_num`, clamped into the document's
    /// page range.
    pub fn page(&self, page_num: i32) -> PageGeometry {
        let Some(&id) = self.clamp_page(page_num).and_then(|n| self.pages.get(n - 1)) else {
            return PageGeometry::resolve(None, None, None, None, None, 0);
        };
        let dict = match self.doc.get_dictionary(id) {
            Ok(dict) => dict,
            Err(e) => {
                debug!("page {} ({:?}) is not a dictionary: {}", page_num, id, e);
                return PageGeometry::resolve(None, None, None, None, None, 0);
            }
        };

        let doc = &self.doc;
        let rotate = get_inherited::<i64>(doc, dict, b"Rotate").unwrap_or(0);
        PageGeometry::resolve(
            get_inherited(doc, dict, BoxKind::Media.key()),
            get_inherited(doc, dict, BoxKind::Crop.key()),
            maybe_get(doc, dict, BoxKind::Bleed.key()),
            maybe_get(doc, dict, BoxKind::Trim.key()),
            maybe_get(doc, dict, BoxKind::Art.key()),
            rotate,
        )
    }

    pub fn page_crop_width(&self, page_num: i32) -> f64 {
        self.page(page_num).crop_width()
    }

    pub fn page_crop_height(&self, page_num: i32) -> f64 {
        self.page(page_num).crop_height()
    }

    pub fn page_rotate(&self, page_num: i32) -> i32 {
        self.page(page_num).rotate
    }

    /// The XMP metadata stream of the catalog, if present and non-empty.
    pub fn read_metadata(&self) -> Option<Vec<u8>> {
        let stream: &Stream = maybe_get(&self.doc, self.catalog()?, b"Metadata")?;
        let content = get_contents(stream);
        if content.is_empty() { None } else { Some(content) }
    }

    /// Raw bytes of a string entry of the document information dictionary.
    pub fn info_string(&self, key: &str) -> Option<&[u8]> {
        maybe_get_string(&self.doc, self.info()?, key.as_bytes())
    }

    /// A string entry of the document information dictionary, decoded to Unicode.
    pub fn info_text(&self, key: &str) -> Option<String> {
        self.info_string(key).map(pdf_to_utf8)
    }

    /// Whether the catalog has a structure tree.
    pub fn is_tagged(&self) -> bool {
        self.catalog()
            .and_then(|catalog| maybe_get::<&Dictionary>(&self.doc, catalog, b"StructTreeRoot"))
            .is_some()
    }

    pub fn form_kind(&self) -> FormKind {
        let Some(acro_form) = self
            .catalog()
            .and_then(|catalog| maybe_get::<&Dictionary>(&self.doc, catalog, b"AcroForm"))
        else {
            return FormKind::None;
        };
        match maybe_get::<&Object>(&self.doc, acro_form, b"XFA") {
            Some(Object::Stream(_)) | Some(Object::Array(_)) => FormKind::Xfa,
            _ => FormKind::AcroForm,
        }
    }

    fn clamp_page(&self, page_num: i32) -> Option<usize> {
        let n = self.pages.len();
        if n == 0 {
            return None;
        }
        Some((page_num.max(1) as usize).min(n))
    }

    fn catalog(&self) -> Option<&Dictionary> {
        maybe_get(&self.doc, &self.doc.trailer, b"Root")
    }

    fn info(&self) -> Option<&Dictionary> {
        maybe_get(&self.doc, &self.doc.trailer, b"Info")
    }
}

/// Whether the object stored first in the file is a linearization
/// parameter dictionary.
fn first_object_is_linearized(doc: &Document) -> bool {
    doc.reference_table
        .entries
        .iter()
        .filter_map(|(&num, entry)| match *entry {
            XrefEntry::Normal { offset, generation } => Some((offset, (num, generation))),
            _ => None,
        })
        .min_by_key(|&(offset, _)| offset)
        .and_then(|(_, id)| doc.get_dictionary(id).ok())
        .and_then(|dict| maybe_get::<f64>(doc, dict, b"Linearized"))
        .is_some_and(|v| v > 0.)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::Rect;
    use lopdf::{EncryptionState, EncryptionVersion, StringFormat, dictionary};

    /// Build a document whose pages carry the given extra page attributes.
    pub(crate) fn doc_with_pages(pages: Vec<Dictionary>) -> Document {
        let mut doc = Document::with_version("1.5");
        add_page_tree(&mut doc, pages);
        doc
    }

    fn add_page_tree(doc: &mut Document, pages: Vec<Dictionary>) {
        let pages_id = doc.new_object_id();

        let mut kids = Vec::new();
        for mut page in pages {
            page.set("Type", "Page");
            page.set("Parent", Object::Reference(pages_id));
            kids.push(Object::Reference(doc.add_object(page)));
        }
        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));
    }

    pub(crate) fn letter_page() -> Dictionary {
        dictionary! {
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }
    }

    pub(crate) fn open_doc(mut doc: Document) -> InfoDocument {
        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        InfoDocument::options().open_bytes(&buf, "test.pdf").unwrap()
    }

    /// A one-page document titled "Hello", saved with RC4 128-bit
    /// encryption.
    pub(crate) fn encrypted_bytes(owner: &str, user: &str, permissions: lopdf::Permissions) -> Vec<u8> {
        let mut doc = doc_with_pages(vec![letter_page()]);
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal("Hello"),
        });
        doc.trailer.set("Info", Object::Reference(info_id));
        doc.trailer.set(
            "ID",
            vec![
                Object::String(vec![0x2a; 16], StringFormat::Literal),
                Object::String(vec![0x2b; 16], StringFormat::Literal),
            ],
        );

        let state = EncryptionState::try_from(EncryptionVersion::V2 {
            document: &doc,
            owner_password: owner,
            user_password: user,
            key_length: 128,
            permissions,
        })
        .unwrap();
        doc.encrypt(&state).unwrap();

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    fn catalog_mut(doc: &mut Document) -> &mut Dictionary {
        let id = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
        doc.get_object_mut(id).unwrap().as_dict_mut().unwrap()
    }

    #[test]
    fn counts_pages_and_reads_version() {
        let doc = open_doc(doc_with_pages(vec![letter_page(), letter_page()]));
        assert_eq!(doc.num_pages(), 2);
        assert_eq!(doc.pdf_version(), 1.5);
        assert!(!doc.is_encrypted());
        assert!(!doc.is_linearized());
        assert_eq!(doc.file_name(), Path::new("test.pdf"));
    }

    #[test]
    fn catalog_version_raises_header_version() {
        let mut doc = doc_with_pages(vec![letter_page()]);
        catalog_mut(&mut doc).set("Version", Object::Name(b"1.7".to_vec()));
        assert_eq!(open_doc(doc).pdf_version(), 1.7);

        let mut doc = doc_with_pages(vec![letter_page()]);
        catalog_mut(&mut doc).set("Version", Object::Name(b"1.2".to_vec()));
        assert_eq!(open_doc(doc).pdf_version(), 1.5);
    }

    #[test]
    fn page_numbers_are_clamped() {
        let small = dictionary! {
            "MediaBox" => vec![0.into(), 0.into(), 100.into(), 200.into()],
        };
        let doc = open_doc(doc_with_pages(vec![small, letter_page()]));
        assert_eq!(doc.page_crop_width(0), 100.);
        assert_eq!(doc.page_crop_width(-5), 100.);
        assert_eq!(doc.page_crop_width(2), 612.);
        assert_eq!(doc.page_crop_height(99), 792.);
    }

    #[test]
    fn resolves_inherited_and_default_boxes() {
        let page = dictionary! {
            "MediaBox" => vec![0.into(), 0.into(), 600.into(), 800.into()],
            "CropBox" => vec![10.into(), 10.into(), 590.into(), 790.into()],
            "TrimBox" => vec![20.into(), 20.into(), 700.into(), 780.into()],
            "Rotate" => -90,
        };
        let doc = open_doc(doc_with_pages(vec![page]));
        let geometry = doc.page(1);

        assert_eq!(geometry.media, Rect::new(0., 0., 600., 800.));
        assert_eq!(geometry.crop, Rect::new(10., 10., 590., 790.));
        // trim box clipped to the media box
        assert_eq!(geometry.trim, Rect::new(20., 20., 600., 780.));
        // bleed and art default to the crop box
        assert_eq!(geometry.bleed, geometry.crop);
        assert_eq!(geometry.art, geometry.crop);
        assert!(geometry.has_crop && geometry.has_trim);
        assert!(!geometry.has_bleed && !geometry.has_art);
        assert_eq!(geometry.rotate, 270);
        assert_eq!(geometry.dvipdfmx_bb, Some(BoxKind::Crop));
        assert_eq!(doc.page_rotate(1), 270);
    }

    #[test]
    fn reads_info_strings() {
        let mut doc = doc_with_pages(vec![letter_page()]);
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::String(b"A \x80 title".to_vec(), StringFormat::Literal),
            "Author" => Object::String(vec![0xfe, 0xff, 0x00, 0x41], StringFormat::Hexadecimal),
            "Keywords" => 12,
        });
        doc.trailer.set("Info", Object::Reference(info_id));
        let doc = open_doc(doc);

        assert_eq!(doc.info_text("Title").as_deref(), Some("A \u{2022} title"));
        assert_eq!(doc.info_text("Author").as_deref(), Some("A"));
        assert_eq!(doc.info_text("Keywords"), None);
        assert_eq!(doc.info_text("Subject"), None);
    }

    #[test]
    fn detects_tags_and_forms() {
        let doc = open_doc(doc_with_pages(vec![letter_page()]));
        assert!(!doc.is_tagged());
        assert_eq!(doc.form_kind(), FormKind::None);

        let mut doc = doc_with_pages(vec![letter_page()]);
        let tree_id = doc.add_object(dictionary! { "Type" => "StructTreeRoot" });
        catalog_mut(&mut doc).set("StructTreeRoot", Object::Reference(tree_id));
        catalog_mut(&mut doc).set("AcroForm", dictionary! { "Fields" => Vec::<Object>::new() });
        let doc = open_doc(doc);
        assert!(doc.is_tagged());
        assert_eq!(doc.form_kind(), FormKind::AcroForm);

        let mut doc = doc_with_pages(vec![letter_page()]);
        let xfa_id = doc.add_object(Stream::new(dictionary! {}, b"<xdp/>".to_vec()));
        catalog_mut(&mut doc).set(
            "AcroForm",
            dictionary! { "XFA" => Object::Reference(xfa_id) },
        );
        assert_eq!(open_doc(doc).form_kind(), FormKind::Xfa);

        let mut doc = doc_with_pages(vec![letter_page()]);
        catalog_mut(&mut doc).set("AcroForm", dictionary! { "XFA" => 3 });
        assert_eq!(open_doc(doc).form_kind(), FormKind::AcroForm);
    }

    #[test]
    fn reads_metadata_stream() {
        let doc = open_doc(doc_with_pages(vec![letter_page()]));
        assert_eq!(doc.read_metadata(), None);

        let mut doc = doc_with_pages(vec![letter_page()]);
        let xmp = b"<x:xmpmeta xmlns:x=\"adobe:ns:meta/\"/>".to_vec();
        let meta_id = doc.add_object(Stream::new(
            dictionary! { "Type" => "Metadata", "Subtype" => "XML" },
            xmp.clone(),
        ));
        catalog_mut(&mut doc).set("Metadata", Object::Reference(meta_id));
        assert_eq!(open_doc(doc).read_metadata(), Some(xmp));
    }

    #[test]
    fn rejects_undecryptable_documents() {
        let mut doc = doc_with_pages(vec![letter_page()]);
        let encrypt_id = doc.add_object(dictionary! {
            "Filter" => "Standard",
            "V" => 1,
            "R" => 2,
            "P" => -44,
            "O" => Object::String(vec![0; 32], StringFormat::Literal),
            "U" => Object::String(vec![0; 32], StringFormat::Literal),
        });
        doc.trailer.set("Encrypt", Object::Reference(encrypt_id));
        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();

        let result = InfoDocument::options()
            .user_password("nope")
            .open_bytes(&buf, "locked.pdf");
        assert!(result.is_err());
    }

    #[test]
    fn opens_documents_with_an_empty_user_password() {
        let buf = encrypted_bytes("owner", "", lopdf::Permissions::PRINTABLE);

        for options in [
            InfoDocument::options(),
            InfoDocument::options().owner_password("owner"),
            InfoDocument::options().owner_password("wrong"),
        ] {
            let doc = options.open_bytes(&buf, "locked.pdf").unwrap();
            assert_eq!(doc.num_pages(), 1);
            assert_eq!(doc.info_text("Title").as_deref(), Some("Hello"));
            assert!(doc.is_encrypted());
            assert_eq!(
                doc.permissions().to_string(),
                "print:yes copy:no change:no addNotes:no"
            );
        }
    }

    #[test]
    fn opens_documents_with_a_user_password() {
        let buf = encrypted_bytes("owner", "user", lopdf::Permissions::all());

        for options in [
            InfoDocument::options().user_password("user"),
            InfoDocument::options().owner_password("owner").user_password("user"),
            InfoDocument::options().owner_password("wrong").user_password("user"),
        ] {
            let doc = options.open_bytes(&buf, "locked.pdf").unwrap();
            assert_eq!(doc.num_pages(), 1);
            assert_eq!(doc.info_text("Title").as_deref(), Some("Hello"));
            assert_eq!(doc.page(1).media, Rect::LETTER);
            assert!(doc.is_encrypted());
            assert_eq!(doc.permissions(), Permissions::ALL);
        }

        for options in [
            InfoDocument::options(),
            InfoDocument::options().user_password("nope"),
        ] {
            let result = options.open_bytes(&buf, "locked.pdf");
            assert!(matches!(result, Err(InfoError::DecryptError(_))));
        }

        let result = InfoDocument::options()
            .owner_password("owner")
            .open_bytes(&buf, "locked.pdf");
        assert!(matches!(
            result,
            Err(InfoError::OwnerPasswordUnsupported { revision: 3 })
        ));
    }

    #[test]
    fn detects_linearization_dictionary() {
        let with_first_object = |first: Dictionary| {
            let mut doc = Document::with_version("1.5");
            doc.add_object(first);
            add_page_tree(&mut doc, vec![letter_page()]);
            open_doc(doc)
        };

        let doc = with_first_object(dictionary! { "Linearized" => 1, "L" => 1234, "O" => 3 });
        assert!(doc.is_linearized());

        let doc = with_first_object(dictionary! { "Linearized" => 0 });
        assert!(!doc.is_linearized());

        let doc = with_first_object(dictionary! { "Type" => "Catalog" });
        assert!(!doc.is_linearized());

        // a linearization dictionary anywhere but first does not count
        let mut doc = doc_with_pages(vec![letter_page()]);
        doc.add_object(dictionary! { "Linearized" => 1 });
        assert!(!open_doc(doc).is_linearized());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = InfoDocument::open("/nonexistent/missing.pdf");
        assert!(matches!(result, Err(InfoError::IoError(_))));
    }

    #[test]
    fn opens_from_a_reader() {
        let mut doc = doc_with_pages(vec![letter_page(), letter_page()]);
        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();

        let doc = InfoDocument::options()
            .open_reader(std::io::Cursor::new(buf), "piped.pdf")
            .unwrap();
        assert_eq!(doc.num_pages(), 2);
        assert_eq!(doc.file_name(), Path::new("piped.pdf"));
    }

    #[test]
    fn unencrypted_documents_allow_everything() {
        let doc = open_doc(doc_with_pages(vec![letter_page()]));
        assert!(!doc.is_encrypted());
        assert_eq!(doc.permissions(), Permissions::ALL);
        assert!(doc.ok_to_print() && doc.ok_to_copy());
        assert!(doc.ok_to_change() && doc.ok_to_add_notes());
    }
}
