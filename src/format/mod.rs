//! Document file formats
//!
//! - `text`: the current line-based format, also used for checkpoints and
//!   the clipboard
//! - `binary`: the legacy versioned binary format

pub mod binary;
pub mod colors;
pub mod layout;
pub mod reader;
pub mod text;

use std::path::Path;

/// On-disk document encodings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileFormat {
    Text,
    Binary,
}

impl FileFormat {
    /// Binary documents start with the `LeoCAD ` signature; anything else
    /// is read as text.
    pub fn detect(data: &[u8]) -> Self {
        if data.starts_with(binary::SIGNATURE) {
            FileFormat::Binary
        } else {
            FileFormat::Text
        }
    }

    /// `.lcd` files are binary, everything else is text.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("lcd") => FileFormat::Binary,
            _ => FileFormat::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(FileFormat::detect(b"LeoCAD 0.3\0"), FileFormat::Binary);
        assert_eq!(FileFormat::detect(b"0 Untitled\r\n"), FileFormat::Text);
        assert_eq!(FileFormat::detect(b""), FileFormat::Text);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(FileFormat::from_path(Path::new("castle.LCD")), FileFormat::Binary);
        assert_eq!(FileFormat::from_path(Path::new("castle.ldr")), FileFormat::Text);
        assert_eq!(FileFormat::from_path(Path::new("castle")), FileFormat::Text);
    }
}
