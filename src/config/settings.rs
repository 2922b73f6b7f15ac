use crate::cli::{ExtendedCompressArgs, RenderArgs, ServeArgs};

use super::defaults::*;

/// Runtime settings for SVG depiction
#[derive(Debug, Clone, PartialEq)]
pub struct DrawSettings {
    // Canvas (pixels)
    pub width: u32,
    pub height: u32,
    /// Fraction of the canvas kept free on every side
    pub padding: f64,

    // Geometry (pixels unless noted)
    pub max_bond_length: f64,
    pub bond_line_width: f64,
    /// Fraction of the bond length
    pub multiple_bond_offset: f64,

    // Typography
    /// Label size as a fraction of the drawn bond length
    pub font_scale: f64,
    pub font_family: String,

    pub background: String,
}

impl Default for DrawSettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            padding: DEFAULT_PADDING,
            max_bond_length: DEFAULT_MAX_BOND_LENGTH,
            bond_line_width: DEFAULT_BOND_LINE_WIDTH,
            multiple_bond_offset: DEFAULT_MULTIPLE_BOND_OFFSET,
            font_scale: DEFAULT_FONT_SCALE,
            font_family: "sans-serif".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }
}

impl DrawSettings {
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Create settings from CLI arguments
    pub fn from_args(args: &RenderArgs) -> Self {
        Self::with_size(args.width, args.height)
    }

    /// Label font size for a given drawn bond length
    pub fn font_size(&self, bond_length: f64) -> f64 {
        (bond_length * self.font_scale).clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
    }
}

/// Options of the extended compression pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressOptions {
    /// Per-page lossless content stream compression
    pub lossless: bool,
    /// JPEG quality for embedded images; `None` leaves images untouched
    pub image_quality: Option<u8>,
    /// Flate level for the lossless pass
    pub compression_level: u32,
    /// Merge identical objects and drop orphans
    pub deduplicate: bool,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            lossless: true,
            image_quality: None,
            compression_level: MAX_COMPRESSION_LEVEL,
            deduplicate: true,
        }
    }
}

impl CompressOptions {
    /// Create options from CLI arguments
    pub fn from_args(args: &ExtendedCompressArgs) -> Self {
        Self {
            lossless: !args.no_lossless,
            image_quality: args.image_quality,
            compression_level: args.level,
            deduplicate: !args.no_dedup,
        }
    }

    /// Options under which the pipeline leaves the document untouched
    pub fn passthrough() -> Self {
        Self {
            lossless: false,
            image_quality: None,
            compression_level: MAX_COMPRESSION_LEVEL,
            deduplicate: false,
        }
    }
}

/// HTTP service settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerSettings {
    pub fn from_args(args: &ServeArgs) -> Self {
        Self {
            host: args.host.clone(),
            port: args.port,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_font_size_clamped() {
        let settings = DrawSettings::default();
        assert_eq!(settings.font_size(1.0), MIN_FONT_SIZE);
        assert_eq!(settings.font_size(1000.0), MAX_FONT_SIZE);
        assert!((settings.font_size(30.0) - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_compress_options_from_args() {
        let args = ExtendedCompressArgs::try_parse_from([
            "pdf_compress",
            "a.pdf",
            "b.pdf",
            "40",
            "--no-dedup",
        ])
        .unwrap();
        let options = CompressOptions::from_args(&args);
        assert!(options.lossless);
        assert!(!options.deduplicate);
        assert_eq!(options.image_quality, Some(40));
    }

    #[test]
    fn test_bind_address() {
        let settings = ServerSettings {
            host: "0.0.0.0".to_string(),
            port: 9000,
        };
        assert_eq!(settings.bind_address(), "0.0.0.0:9000");
    }
}
