//! Hex listings of packed display memory, either bare or as a C array ready to
//! be pasted into firmware sources.

use alloc::{format, string::String, vec::Vec};

use log::debug;

/// Output width used by [`render_listing`].
pub const DEFAULT_LINE_WIDTH: usize = 80;

/// Characters reserved per token besides the separator.
const TOKEN_WIDTH: usize = 3;

const PLAIN_SEPARATOR: &str = " ";
const ARRAY_SEPARATOR: &str = ", ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingError {
    /// Not even one token fits on a line.
    LineTooNarrow { line_width: usize, token_width: usize },
    IoError(embedded_io::ErrorKind),
}

impl ListingError {
    pub fn from<Error: embedded_io::Error>(err: Error) -> Self {
        Self::IoError(embedded_io::Error::kind(&err))
    }
}

type Result<T> = core::result::Result<T, ListingError>;

/// Formats every byte as `0xHH`.
pub fn format_hex(bytes: &[u8]) -> Vec<String> {
    bytes.iter().map(|byte| format!("0x{:02X}", byte)).collect()
}

/// Joins `tokens` with `separator`, breaking lines so that no more than
/// `max_line_width` characters worth of tokens land on one line.
///
/// Each token is budgeted as `3 + separator.len()` characters. Every line but
/// the last ends in the separator followed by `\n`.
pub fn join_with_wrap<S: AsRef<str>>(
    tokens: &[S],
    separator: &str,
    max_line_width: usize,
) -> Result<String> {
    let token_width = TOKEN_WIDTH + separator.len();
    let per_line = max_line_width / token_width;
    if per_line == 0 {
        return Err(ListingError::LineTooNarrow {
            line_width: max_line_width,
            token_width,
        });
    }

    let mut result = String::new();
    let mut lines = tokens.chunks(per_line).peekable();
    while let Some(line) = lines.next() {
        for (idx, token) in line.iter().enumerate() {
            if idx > 0 {
                result.push_str(separator);
            }
            result.push_str(token.as_ref());
        }
        if lines.peek().is_some() {
            result.push_str(separator);
            result.push('\n');
        }
    }
    Ok(result)
}

/// Renders `bytes` at [`DEFAULT_LINE_WIDTH`]. See [`render_listing_with_width`].
pub fn render_listing(bytes: &[u8], source_name: &str, array_name: Option<&str>) -> Result<String> {
    render_listing_with_width(bytes, source_name, array_name, DEFAULT_LINE_WIDTH)
}

/// Without an array name the result is the bare space separated listing.
/// With one, the comma separated listing is wrapped in a `PROGMEM` array
/// declaration headed by a comment naming `source_name`.
pub fn render_listing_with_width(
    bytes: &[u8],
    source_name: &str,
    array_name: Option<&str>,
    line_width: usize,
) -> Result<String> {
    let tokens = format_hex(bytes);
    let Some(name) = array_name else {
        return join_with_wrap(&tokens, PLAIN_SEPARATOR, line_width);
    };

    let data = join_with_wrap(&tokens, ARRAY_SEPARATOR, line_width)?;
    debug!("Rendering {} bytes as array '{}'", bytes.len(), name);
    let mut out = String::with_capacity(data.len() + 128);
    out.push_str("/*\n");
    // a literal "*/" in the path would end the comment early
    let source_name = source_name.replace("*/", "* /");
    out.push_str(&format!(" * Image converted from '{}'\n", source_name));
    out.push_str(" */\n\n");
    out.push_str(&format!("prog_uchar {}[] PROGMEM = {{\n", name));
    out.push_str(&data);
    out.push_str("\n};\n");
    Ok(out)
}

/// Array name for an image path: the file stem with spaces turned into
/// underscores.
pub fn array_name_for(path: &str) -> String {
    let file_name = path.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(path);
    let stem = match file_name.rfind('.') {
        Some(dot) if dot > 0 => &file_name[..dot],
        _ => file_name,
    };
    stem.replace(' ', "_")
}

/// Writes a rendered listing to `out`.
pub fn write_listing(out: &mut impl embedded_io::Write, listing: &str) -> Result<()> {
    out.write_all(listing.as_bytes()).map_err(ListingError::from)?;
    out.flush().map_err(ListingError::from)
}
