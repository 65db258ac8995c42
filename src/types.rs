use std::fmt;

/// A rectangle in PDF user space, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Rect {
    /// US Letter, the MediaBox assumed for pages that carry none.
    pub const LETTER: Rect = Rect {
        x1: 0.,
        y1: 0.,
        x2: 612.,
        y2: 792.,
    };

    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Rect {
        Rect { x1, y1, x2, y2 }
    }

    /// Reorder the corners so that `x1 <= x2` and `y1 <= y2`.
    pub fn normalized(self) -> Rect {
        Rect {
            x1: self.x1.min(self.x2),
            y1: self.y1.min(self.y2),
            x2: self.x1.max(self.x2),
            y2: self.y1.max(self.y2),
        }
    }

    /// Intersect with `bounds`.
    pub fn clip_to(self, bounds: &Rect) -> Rect {
        Rect {
            x1: self.x1.max(bounds.x1).min(bounds.x2),
            y1: self.y1.max(bounds.y1).min(bounds.y2),
            x2: self.x2.min(bounds.x2).max(bounds.x1),
            y2: self.y2.min(bounds.y2).max(bounds.y1),
        }
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }
}

/// One of the five page boundary boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxKind {
    Media,
    Crop,
    Bleed,
    Trim,
    Art,
}

impl BoxKind {
    /// Report order.
    pub const ALL: [BoxKind; 5] = [
        BoxKind::Media,
        BoxKind::Crop,
        BoxKind::Bleed,
        BoxKind::Trim,
        BoxKind::Art,
    ];

    /// Order in which dvipdfmx looks for the box it uses as the page bounding box.
    pub(crate) const DVIPDFMX_PREFERENCE: [BoxKind; 5] = [
        BoxKind::Crop,
        BoxKind::Art,
        BoxKind::Trim,
        BoxKind::Bleed,
        BoxKind::Media,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BoxKind::Media => "MediaBox",
            BoxKind::Crop => "CropBox",
            BoxKind::Bleed => "BleedBox",
            BoxKind::Trim => "TrimBox",
            BoxKind::Art => "ArtBox",
        }
    }

    pub(crate) fn key(&self) -> &'static [u8] {
        self.name().as_bytes()
    }
}

/// Resolved boundary boxes and rotation of a single page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageGeometry {
    pub media: Rect,
    pub crop: Rect,
    pub bleed: Rect,
    pub trim: Rect,
    pub art: Rect,
    pub has_crop: bool,
    pub has_bleed: bool,
    pub has_trim: bool,
    pub has_art: bool,
    /// Clockwise rotation in degrees, in `[0, 360)`.
    pub rotate: i32,
    /// The box dvipdfmx would take as the bounding box of this page.
    pub dvipdfmx_bb: Option<BoxKind>,
}

impl PageGeometry {
    /// Resolve the boxes a page records into its effective geometry.
    ///
    /// A missing MediaBox is taken to be US Letter; CropBox defaults to the
    /// MediaBox and the other three to the CropBox. Every box is clipped to
    /// the MediaBox.
    pub fn resolve(
        media: Option<Rect>,
        crop: Option<Rect>,
        bleed: Option<Rect>,
        trim: Option<Rect>,
        art: Option<Rect>,
        rotate: i64,
    ) -> PageGeometry {
        let media_box = media.unwrap_or(Rect::LETTER);
        let crop_box = crop.unwrap_or(media_box).clip_to(&media_box);
        let derived = |b: Option<Rect>| b.unwrap_or(crop_box).clip_to(&media_box);

        let mut geometry = PageGeometry {
            media: media_box,
            crop: crop_box,
            bleed: derived(bleed),
            trim: derived(trim),
            art: derived(art),
            has_crop: crop.is_some(),
            has_bleed: bleed.is_some(),
            has_trim: trim.is_some(),
            has_art: art.is_some(),
            rotate: rotate.rem_euclid(360) as i32,
            dvipdfmx_bb: None,
        };
        if media.is_some() {
            let hint = BoxKind::DVIPDFMX_PREFERENCE
                .into_iter()
                .find(|kind| geometry.is_explicit(*kind));
            geometry.dvipdfmx_bb = hint;
        }
        geometry
    }

    pub fn rect(&self, kind: BoxKind) -> &Rect {
        match kind {
            BoxKind::Media => &self.media,
            BoxKind::Crop => &self.crop,
            BoxKind::Bleed => &self.bleed,
            BoxKind::Trim => &self.trim,
            BoxKind::Art => &self.art,
        }
    }

    /// Whether the box was present in the file rather than defaulted.
    /// The MediaBox always counts as explicit.
    pub fn is_explicit(&self, kind: BoxKind) -> bool {
        match kind {
            BoxKind::Media => true,
            BoxKind::Crop => self.has_crop,
            BoxKind::Bleed => self.has_bleed,
            BoxKind::Trim => self.has_trim,
            BoxKind::Art => self.has_art,
        }
    }

    /// The rectangle of the hinted box, if the page has a hint.
    pub fn dvipdfmx_rect(&self) -> Option<&Rect> {
        self.dvipdfmx_bb.map(|kind| self.rect(kind))
    }

    pub fn crop_width(&self) -> f64 {
        self.crop.width()
    }

    pub fn crop_height(&self) -> f64 {
        self.crop.height()
    }
}

/// Document permission flags from the `/P` entry of the encryption dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permissions {
    pub print: bool,
    pub copy: bool,
    pub change: bool,
    pub add_notes: bool,
}

impl Permissions {
    pub const ALL: Permissions = Permissions {
        print: true,
        copy: true,
        change: true,
        add_notes: true,
    };

    /// Decode the `/P` permission word of the encryption dictionary.
    pub fn from_bits(p: i64) -> Permissions {
        let flags = lopdf::Permissions::from_bits_truncate(p as u64);
        Permissions {
            print: flags.contains(lopdf::Permissions::PRINTABLE),
            change: flags.contains(lopdf::Permissions::MODIFIABLE),
            copy: flags.contains(lopdf::Permissions::COPYABLE),
            add_notes: flags.contains(lopdf::Permissions::ANNOTABLE),
        }
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let yn = |b: bool| if b { "yes" } else { "no" };
        write!(
            f,
            "print:{} copy:{} change:{} addNotes:{}",
            yn(self.print),
            yn(self.copy),
            yn(self.change),
            yn(self.add_notes)
        )
    }
}

/// Kind of interactive form a document carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Xfa,
    AcroForm,
    None,
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FormKind::Xfa => "XFA",
            FormKind::AcroForm => "AcroForm",
            FormKind::None => "none",
        })
    }
}

/// Named paper size a page matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaperSize {
    Letter,
    /// ISO 216 A-series, A0 to A6.
    Iso(u8),
}

impl PaperSize {
    const LETTER_TOLERANCE: f64 = 0.1;
    const ISO_TOLERANCE: f64 = 1.0;

    /// Classify a page by its width and height in points, in either orientation.
    pub fn classify(w: f64, h: f64) -> Option<PaperSize> {
        let matches = |a: f64, b: f64, tol: f64| {
            ((w - a).abs() < tol && (h - b).abs() < tol)
                || ((w - b).abs() < tol && (h - a).abs() < tol)
        };

        if matches(612., 792., Self::LETTER_TOLERANCE) {
            return Some(PaperSize::Letter);
        }

        // A0 has an area of one square metre and sides in the ratio 1:sqrt(2).
        let mut long = 2f64.sqrt().sqrt() * 7200. / 2.54;
        let mut short = long / 2f64.sqrt();
        for n in 0..=6 {
            if matches(short, long, Self::ISO_TOLERANCE) {
                return Some(PaperSize::Iso(n));
            }
            long = short;
            short /= 2f64.sqrt();
        }
        None
    }
}

impl fmt::Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaperSize::Letter => f.write_str("letter"),
            PaperSize::Iso(n) => write!(f, "A{}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letter_in_both_orientations() {
        assert_eq!(PaperSize::classify(612., 792.), Some(PaperSize::Letter));
        assert_eq!(PaperSize::classify(792., 612.), Some(PaperSize::Letter));
        assert_eq!(PaperSize::classify(612.2, 792.), None);
    }

    #[test]
    fn iso_sizes() {
        assert_eq!(PaperSize::classify(595., 842.), Some(PaperSize::Iso(4)));
        assert_eq!(PaperSize::classify(842., 595.), Some(PaperSize::Iso(4)));
        assert_eq!(PaperSize::classify(595.28, 841.89), Some(PaperSize::Iso(4)));
        assert_eq!(PaperSize::classify(842., 1191.), Some(PaperSize::Iso(3)));
        assert_eq!(PaperSize::classify(2384., 3371.), Some(PaperSize::Iso(0)));
        assert_eq!(PaperSize::classify(298., 421.), Some(PaperSize::Iso(6)));
        assert_eq!(PaperSize::classify(100., 100.), None);
    }

    #[test]
    fn permission_bits() {
        let p = Permissions::from_bits(-4);
        assert_eq!(p, Permissions::ALL);

        // print and add notes only
        let p = Permissions::from_bits(0b10_0100);
        assert!(p.print);
        assert!(!p.change);
        assert!(!p.copy);
        assert!(p.add_notes);
        assert_eq!(p.to_string(), "print:yes copy:no change:no addNotes:yes");

        // reserved bits set, as writers store a print-only document
        let p = Permissions::from_bits(-3900);
        assert_eq!(p.to_string(), "print:yes copy:no change:no addNotes:no");
    }

    #[test]
    fn dvipdfmx_hint_follows_recorded_boxes() {
        let media = Some(Rect::LETTER);
        let inner = Some(Rect::new(10., 10., 600., 780.));

        let g = PageGeometry::resolve(media, None, None, None, None, 0);
        assert_eq!(g.dvipdfmx_bb, Some(BoxKind::Media));

        let g = PageGeometry::resolve(media, None, inner, inner, None, 0);
        assert_eq!(g.dvipdfmx_bb, Some(BoxKind::Trim));
        assert_eq!(g.dvipdfmx_rect(), inner.as_ref());

        let g = PageGeometry::resolve(media, None, inner, inner, inner, 0);
        assert_eq!(g.dvipdfmx_bb, Some(BoxKind::Art));

        let g = PageGeometry::resolve(media, inner, None, None, inner, 0);
        assert_eq!(g.dvipdfmx_bb, Some(BoxKind::Crop));

        // no MediaBox anywhere in the page tree
        let g = PageGeometry::resolve(None, inner, None, None, None, 0);
        assert_eq!(g.dvipdfmx_bb, None);
        assert_eq!(g.media, Rect::LETTER);
        assert_eq!(g.dvipdfmx_rect(), None);
    }

    #[test]
    fn implicit_boxes_default_to_crop_box() {
        let crop = Rect::new(50., 50., 400., 400.);
        let g = PageGeometry::resolve(Some(Rect::LETTER), Some(crop), None, None, None, 450);
        assert_eq!(g.bleed, crop);
        assert_eq!(g.trim, crop);
        assert_eq!(g.art, crop);
        assert!(g.is_explicit(BoxKind::Media));
        assert!(g.is_explicit(BoxKind::Crop));
        assert!(!g.is_explicit(BoxKind::Art));
        assert_eq!(g.rotate, 90);
        assert_eq!(g.crop_width(), 350.);
    }

    #[test]
    fn rect_normalize_and_clip() {
        let r = Rect::new(100., 200., 10., 20.).normalized();
        assert_eq!(r, Rect::new(10., 20., 100., 200.));

        let clipped = Rect::new(-10., -10., 700., 500.).clip_to(&Rect::LETTER);
        assert_eq!(clipped, Rect::new(0., 0., 612., 500.));
        assert_eq!(clipped.width(), 612.);
        assert_eq!(clipped.height(), 500.);
    }
}
