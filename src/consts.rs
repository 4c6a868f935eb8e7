//! Control bytes and fixed command sequences understood by ESC/POS
//! receipt printers.

/// Lead-in byte for simple commands
pub const ESC: u8 = 0x1b;
/// Lead-in byte for extended commands
pub const GS: u8 = 0x1d;

/// GS V 0 - Full paper cut
pub const FULL_PAPER_CUT: [u8; 3] = [GS, 0x56, 0x00];

/// ESC - 0 - Underline off
pub const UNDERLINE_OFF: [u8; 3] = [ESC, 0x2d, 0x00];

/// ESC E n - Emphasized mode on/off
pub const BOLD_ON: [u8; 3] = [ESC, 0x45, 0x01];
pub const BOLD_OFF: [u8; 3] = [ESC, 0x45, 0x00];

/// ESC 2 - Reset line spacing to the firmware default (about 1/6 inch)
pub const DEFAULT_LINE_SPACING: [u8; 2] = [ESC, 0x32];

/// ESC a n - Justification
pub const LEFT_JUSTIFIED: [u8; 3] = [ESC, 0x61, 0x00];
pub const CENTER: [u8; 3] = [ESC, 0x61, 0x01];
pub const RIGHT_JUSTIFIED: [u8; 3] = [ESC, 0x61, 0x02];

// Parameterised command prefixes, the last byte is supplied by the encoder
pub const LINEFEED: [u8; 2] = [ESC, 0x64];
pub const UNDERLINE: [u8; 2] = [ESC, 0x2d];
pub const LINE_SPACING: [u8; 2] = [ESC, 0x33];
pub const TEXT_SIZE: [u8; 2] = [GS, 0x21];
pub const PRINT_SPEED: [u8; 6] = [GS, 0x28, 0x4b, 0x02, 0x00, 0x32];

/// ESC * 33 - 24 dot double density bit image, followed by nL nH
pub const BITMAP_D24: [u8; 3] = [ESC, 0x2a, 0x21];
/// ESC J 48 - Feed after each raster stripe
pub const STRIPE_FEED: [u8; 3] = [ESC, 0x4a, 0x30];

/// ESC W - Print area in page mode: x = 0, y = 0, dx = 512, followed by dyL dyH
pub const PAGE_AREA: [u8; 8] = [ESC, 0x57, 0x2e, 0x00, 0x00, 0x00, 0x00, 0x02];
/// ESC L - Select page mode
pub const PAGE_MODE: [u8; 2] = [ESC, 0x4c];
/// FF - Print the page and return to standard mode
pub const PAGE_END: u8 = 0x0c;

/// Maximum raster width in dots
pub const MAX_IMAGE_WIDTH: u32 = 512;
/// Rows per raster stripe
pub const STRIPE_HEIGHT: u32 = 24;
