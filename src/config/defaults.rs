/// Default depiction width in pixels
pub const DEFAULT_WIDTH: u32 = 400;

/// Default depiction height in pixels
pub const DEFAULT_HEIGHT: u32 = 300;

/// Margin around the drawing as a fraction of the canvas
pub const DEFAULT_PADDING: f64 = 0.05;

/// Upper bound on the drawn bond length in pixels, so small molecules are not blown up
pub const DEFAULT_MAX_BOND_LENGTH: f64 = 50.0;

/// Bond stroke width in pixels
pub const DEFAULT_BOND_LINE_WIDTH: f64 = 2.0;

/// Atom label font size as a fraction of the drawn bond length
pub const DEFAULT_FONT_SCALE: f64 = 0.6;

/// Minimum and maximum atom label font size in pixels
pub const MIN_FONT_SIZE: f64 = 8.0;
pub const MAX_FONT_SIZE: f64 = 40.0;

/// Distance between the lines of a multiple bond, as a fraction of bond length
pub const DEFAULT_MULTIPLE_BOND_OFFSET: f64 = 0.15;

/// Flate level used by the whole-document content stream compression
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Flate level used by the per-page lossless pass
pub const MAX_COMPRESSION_LEVEL: u32 = 9;

/// Default HTTP bind address
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8000;
