//! Content sniffing by magic signature
//!
//! Rules are evaluated in table order against a bounded prefix of the input
//! and the first full match wins. Fixed-offset signatures come first; the
//! generic ISO-BMFF `ftyp` marker, which may appear anywhere in the window,
//! comes last so that image and QuickTime brands are not swallowed by it.
//!
//! ISO-BMFF image brands:
//! ```text
//! 0      4      8        12       16
//! [size ][ftyp ][major  ][minor  ][compatible brands ...]  up to `size`
//! ```
//! `avif`/`avis` majors are AVIF. The generic `mif1`/`msf1` majors are AVIF
//! when `avif`/`avis` is listed as compatible and HEIC otherwise.

use lsa_core::config::DEFAULT_SNIFF_WINDOW;
use lsa_core::MediaFormat;
use memchr::memmem;

/// One byte-pattern test within the sniff window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    /// `magic` must start exactly at `offset`
    At { offset: usize, magic: &'static [u8] },
    /// `magic` may start anywhere in the window
    Within { magic: &'static [u8] },
    /// `brand` is listed among the compatible brands of an `ftyp` box at offset 0
    Compatible { brand: &'static [u8] },
}

impl Matcher {
    pub fn matches(&self, window: &[u8]) -> bool {
        match *self {
            Matcher::At { offset, magic } => window
                .get(offset..offset + magic.len())
                .is_some_and(|slice| slice == magic),
            Matcher::Within { magic } => memmem::find(window, magic).is_some(),
            Matcher::Compatible { brand } => compatible_brands(window).any(|b| b == brand),
        }
    }
}

/// Compatible brands of a leading `ftyp` box, clamped to the window.
fn compatible_brands(window: &[u8]) -> impl Iterator<Item = &[u8]> {
    let declared = match window.get(0..4) {
        Some(&[a, b, c, d]) => u32::from_be_bytes([a, b, c, d]) as usize,
        _ => 0,
    };
    let brands: &[u8] = if window.get(4..8) == Some(b"ftyp".as_slice()) {
        window.get(16..declared.min(window.len())).unwrap_or(&[])
    } else {
        &[]
    };
    brands.chunks_exact(4)
}

/// A signature: every matcher must hold for the rule to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureRule {
    pub matchers: &'static [Matcher],
    pub format: MediaFormat,
}

impl SignatureRule {
    pub fn matches(&self, window: &[u8]) -> bool {
        self.matchers.iter().all(|m| m.matches(window))
    }
}

const fn at(offset: usize, magic: &'static [u8]) -> Matcher {
    Matcher::At { offset, magic }
}

const fn compatible(brand: &'static [u8]) -> Matcher {
    Matcher::Compatible { brand }
}

/// Priority-ordered signature table. Read-only for the life of the process.
pub static SIGNATURES: &[SignatureRule] = &[
    SignatureRule {
        matchers: &[at(0, &[0xFF, 0xD8, 0xFF])],
        format: MediaFormat::JPEG,
    },
    SignatureRule {
        matchers: &[at(0, &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])],
        format: MediaFormat::PNG,
    },
    SignatureRule {
        matchers: &[at(0, b"GIF87a")],
        format: MediaFormat::GIF,
    },
    SignatureRule {
        matchers: &[at(0, b"GIF89a")],
        format: MediaFormat::GIF,
    },
    SignatureRule {
        matchers: &[at(0, b"RIFF"), at(8, b"WEBP")],
        format: MediaFormat::WEBP,
    },
    SignatureRule {
        matchers: &[at(0, &[0x1A, 0x45, 0xDF, 0xA3])],
        format: MediaFormat::MATROSKA,
    },
    SignatureRule {
        matchers: &[at(4, b"ftypavif")],
        format: MediaFormat::AVIF,
    },
    SignatureRule {
        matchers: &[at(4, b"ftypavis")],
        format: MediaFormat::AVIF,
    },
    SignatureRule {
        matchers: &[at(4, b"ftypmif1"), compatible(b"avif")],
        format: MediaFormat::AVIF,
    },
    SignatureRule {
        matchers: &[at(4, b"ftypmif1"), compatible(b"avis")],
        format: MediaFormat::AVIF,
    },
    SignatureRule {
        matchers: &[at(4, b"ftypmsf1"), compatible(b"avif")],
        format: MediaFormat::AVIF,
    },
    SignatureRule {
        matchers: &[at(4, b"ftypmsf1"), compatible(b"avis")],
        format: MediaFormat::AVIF,
    },
    SignatureRule {
        matchers: &[at(4, b"ftypheic")],
        format: MediaFormat::HEIC,
    },
    SignatureRule {
        matchers: &[at(4, b"ftypheix")],
        format: MediaFormat::HEIC,
    },
    SignatureRule {
        matchers: &[at(4, b"ftypheim")],
        format: MediaFormat::HEIC,
    },
    SignatureRule {
        matchers: &[at(4, b"ftypheis")],
        format: MediaFormat::HEIC,
    },
    SignatureRule {
        matchers: &[at(4, b"ftyphevc")],
        format: MediaFormat::HEIC,
    },
    SignatureRule {
        matchers: &[at(4, b"ftyphevx")],
        format: MediaFormat::HEIC,
    },
    SignatureRule {
        matchers: &[at(4, b"ftypmif1")],
        format: MediaFormat::HEIC,
    },
    SignatureRule {
        matchers: &[at(4, b"ftypmsf1")],
        format: MediaFormat::HEIC,
    },
    SignatureRule {
        matchers: &[at(4, b"ftypqt  ")],
        format: MediaFormat::QUICKTIME,
    },
    SignatureRule {
        matchers: &[Matcher::Within { magic: b"ftyp" }],
        format: MediaFormat::MP4,
    },
];

/// Classifies recovered bytes against [`SIGNATURES`]
#[derive(Debug, Clone, Copy)]
pub struct Sniffer {
    window: usize,
}

impl Default for Sniffer {
    fn default() -> Self {
        Self::new(DEFAULT_SNIFF_WINDOW)
    }
}

impl Sniffer {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// First matching format, or `None` when nothing in the window is recognised.
    pub fn classify(&self, data: &[u8]) -> Option<MediaFormat> {
        let window = &data[..data.len().min(self.window)];
        SIGNATURES
            .iter()
            .find(|rule| rule.matches(window))
            .map(|rule| rule.format)
    }
}
