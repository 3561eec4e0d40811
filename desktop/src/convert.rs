use std::{fmt, io::Write, path::Path};

use embedded_graphics::prelude::Size;
use image::GrayImage;
use log::{info, warn};
use oledconv_core::{
    framebuffer::{HEIGHT, WIDTH},
    listing::{self, DEFAULT_LINE_WIDTH, ListingError},
    pack::{self, LumaImage, PackError},
};

use crate::std_fs::StdFileWriter;

#[derive(Debug)]
pub enum Error {
    Decode(image::ImageError),
    Pack(PackError),
    Listing(ListingError),
    Io(std::io::Error),
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Decode(err)
    }
}

impl From<PackError> for Error {
    fn from(err: PackError) -> Self {
        Error::Pack(err)
    }
}

impl From<ListingError> for Error {
    fn from(err: ListingError) -> Self {
        Error::Listing(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Decode(err) => write!(f, "Failed to decode input image: {err}"),
            Error::Pack(PackError::DimensionMismatch { expected, actual }) => write!(
                f,
                "Input image is {}x{}, expected {}x{}",
                actual.width, actual.height, expected.width, expected.height
            ),
            Error::Pack(PackError::InvalidData) => write!(f, "Decoded pixel data is incomplete"),
            Error::Listing(ListingError::LineTooNarrow {
                line_width,
                token_width,
            }) => write!(
                f,
                "Line width {line_width} cannot hold a single byte ({token_width} characters)"
            ),
            Error::Listing(ListingError::IoError(kind)) => {
                write!(f, "Failed to write listing: {kind:?}")
            }
            Error::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Decode(err) => Some(err),
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

type Result<T> = std::result::Result<T, Error>;

/// Conversion settings resolved from the command line.
#[derive(Debug, Clone)]
pub struct Options {
    /// Size the input must have. `None` accepts any size.
    pub expected_size: Option<Size>,
    /// Emit a C array with this name instead of a bare listing.
    pub array_name: Option<String>,
    pub line_width: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            expected_size: Some(Size::new(WIDTH as u32, HEIGHT as u32)),
            array_name: None,
            line_width: DEFAULT_LINE_WIDTH,
        }
    }
}

/// Decodes `path` into 8-bit luminance.
pub fn load_luma(path: &Path) -> Result<GrayImage> {
    let image = image::open(path)?;
    info!(
        "Decoded {:?}: {}x{} {:?}",
        path,
        image.width(),
        image.height(),
        image.color()
    );
    if image.color().has_alpha() {
        warn!("Alpha channel of {:?} is ignored", path);
    }
    Ok(image.into_luma8())
}

/// Packs `image` and renders the listing. `source_name` is only used in the
/// array header.
pub fn render(image: &GrayImage, source_name: &str, options: &Options) -> Result<String> {
    let luma = LumaImage::new(
        image.width() as usize,
        image.height() as usize,
        image.as_raw(),
    )?;
    let buffer = pack::pack(&luma, options.expected_size)?;
    info!(
        "Packed into {} bytes ({} pages)",
        buffer.as_bytes().len(),
        buffer.page_count()
    );
    let bytes = buffer.into_bytes();
    let text = listing::render_listing_with_width(
        &bytes,
        source_name,
        options.array_name.as_deref(),
        options.line_width,
    )?;
    Ok(text)
}

/// Writes the listing followed by a newline. A closed pipe is reported as
/// [`Error::Io`] instead of aborting.
pub fn print_listing(out: &mut impl Write, text: &str) -> Result<()> {
    writeln!(out, "{text}")?;
    out.flush()?;
    Ok(())
}

/// Full pipeline. The listing is rendered before `output` is touched and only
/// replaces it once completely written, so a failed conversion never leaves a
/// file behind.
pub fn run(input: &Path, output: Option<&Path>, options: &Options) -> Result<()> {
    let image = load_luma(input)?;
    let source_name = input.to_string_lossy();
    let text = render(&image, &source_name, options)?;

    match output {
        Some(path) => {
            let mut out = StdFileWriter::create(path)?;
            listing::write_listing(&mut out, &text)?;
            out.commit()?;
        }
        None => print_listing(&mut std::io::stdout().lock(), &text)?,
    }
    Ok(())
}
