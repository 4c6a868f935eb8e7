//! Pure encoders for the printer command set.
//!
//! Every function here only builds bytes. Sending them is the job of
//! [`Printer`](crate::printer::Printer), which pairs each encoder with a
//! method that writes the result, so everything in this module can be
//! checked without a device attached.

use byteorder::{LittleEndian, WriteBytesExt};

use crate::consts::*;
use crate::img::PrintableImage;
use crate::printer::Error;

/// Largest magnification index accepted by [`set_text_size`] (8x)
pub const MAX_MAGNIFICATION: i32 = 7;

fn checked(name: &'static str, value: i32, min: i32, max: i32) -> Result<u8, Error> {
    match u8::try_from(value) {
        Ok(n) if (min..=max).contains(&value) => Ok(n),
        _ => Err(Error::InvalidParameter {
            name,
            value: i64::from(value),
            min: i64::from(min),
            max: i64::from(max),
        }),
    }
}

fn byte(name: &'static str, value: i32) -> Result<u8, Error> {
    checked(name, value, 0, i32::from(u8::MAX))
}

/// ESC d n - Print the data in the buffer and feed n lines
///
/// ASCII    ESC   d  n
/// Hex      1b   64  n
/// Decimal  27  100  n
/// Range: 0 <= n <= 255
///
/// Notes:
///   - Line spacing set by ESC 2 / ESC 3 decides how far one line is.
pub fn linefeed(lines: i32) -> Result<[u8; 3], Error> {
    let n = byte("lines", lines)?;
    Ok([LINEFEED[0], LINEFEED[1], n])
}

/// ESC - n - Turn underline mode on/off
///
/// ASCII    ESC   -  n
/// Hex      1b   2d  n
/// Decimal  27   45  n
/// Range: 0 <= n <= 255
///
/// | n | Function                   |
/// |---|----------------------------|
/// | 0 | Underline off              |
/// | 1 | Underline on, 1 dot thick  |
/// | 2 | Underline on, 2 dots thick |
pub fn underline_on(weight: i32) -> Result<[u8; 3], Error> {
    let n = byte("weight", weight)?;
    Ok([UNDERLINE[0], UNDERLINE[1], n])
}

/// ESC - 0
pub fn underline_off() -> [u8; 3] {
    UNDERLINE_OFF
}

/// ESC E n - Turn emphasized mode on/off
///
/// ASCII    ESC   E  n
/// Hex      1b   45  n
/// Decimal  27   69  n
///
/// Only the lowest bit of n is used, 1 = on.
pub fn bold_on() -> [u8; 3] {
    BOLD_ON
}

pub fn bold_off() -> [u8; 3] {
    BOLD_OFF
}

/// ESC 3 n - Set line spacing
///
/// ASCII    ESC   3  n
/// Hex      1b   33  n
/// Decimal  27   51  n
/// Range: 0 <= n <= 255
///
/// n is in vertical motion units. See [`set_default_line_spacing`] to go
/// back to the power-on value.
pub fn set_line_spacing(dots: i32) -> Result<[u8; 3], Error> {
    let n = byte("dots", dots)?;
    Ok([LINE_SPACING[0], LINE_SPACING[1], n])
}

/// ESC 2 - Select default line spacing (about 1/6 inch)
///
/// ASCII    ESC   2
/// Hex      1b   32
/// Decimal  27   50
pub fn set_default_line_spacing() -> [u8; 2] {
    DEFAULT_LINE_SPACING
}

/// GS ! n - Select character size
///
/// ASCII    GS    !  n
/// Hex      1d   21  n
/// Decimal  29   33  n
///
/// | Bits | Function                              |
/// |------|---------------------------------------|
/// | 0-3  | Height magnification, 0 (1x) - 7 (8x) |
/// | 4-7  | Width magnification, 0 (1x) - 7 (8x)  |
///
/// So n is `16 * width + height`. Magnifications outside 0..=7 are rejected
/// rather than clamped.
///
/// ```
/// use mailprint::command::set_text_size;
///
/// assert_eq!(set_text_size(2, 1).unwrap(), [0x1d, 0x21, 33]);
/// assert!(set_text_size(8, 0).is_err());
/// ```
pub fn set_text_size(
    width_magnification: i32,
    height_magnification: i32,
) -> Result<[u8; 3], Error> {
    let width = checked("width_magnification", width_magnification, 0, MAX_MAGNIFICATION)?;
    let height = checked("height_magnification", height_magnification, 0, MAX_MAGNIFICATION)?;
    Ok([TEXT_SIZE[0], TEXT_SIZE[1], (width << 4) | height])
}

/// ESC a n - Select justification
///
/// ASCII    ESC   a  n
/// Hex      1b   61  n
/// Decimal  27   97  n
///
/// | n | Function       |
/// |---|----------------|
/// | 0 | Left (default) |
/// | 1 | Centered       |
/// | 2 | Right          |
///
/// Only takes effect at the beginning of a line.
pub fn center() -> [u8; 3] {
    CENTER
}

pub fn left_justified() -> [u8; 3] {
    LEFT_JUSTIFIED
}

pub fn right_justified() -> [u8; 3] {
    RIGHT_JUSTIFIED
}

/// GS ( K pL pH fn m - Select print speed
///
/// ASCII    GS    (   K  pL  pH  fn   m
/// Hex      1d   28  4b  02  00  32   m
/// Decimal  29   40  75   2   0  50   m
/// Range: 0 <= m <= 255
///
/// Notes:
///   - m = 0 selects the speed configured in the printer's memory switches,
///     higher values are model specific speed levels.
pub fn set_print_speed(speed: i32) -> Result<[u8; 7], Error> {
    let n = byte("speed", speed)?;
    let mut cmd = [0_u8; 7];
    cmd[..6].copy_from_slice(&PRINT_SPEED);
    cmd[6] = n;
    Ok(cmd)
}

/// GS V 0 - Full cut
///
/// ASCII    GS    V  0
/// Hex      1d   56  0
/// Decimal  29   86  0
pub fn full_paper_cut() -> [u8; 3] {
    FULL_PAPER_CUT
}

/// Wraps packed raster stripes into a single page mode print job
///
/// ```text
/// ESC W 0 0 0 0 0 2 dyL dyH   print area, 512 dots wide and `height` tall
/// ESC L                       enter page mode
/// <stripes>
/// FF                          print the page
/// ```
///
/// The page height is the image height attribute, already in the half-dot
/// units the page mode area expects. Heights that do not fit in dyL/dyH are
/// rejected.
pub fn print_image(image: &PrintableImage) -> Result<Vec<u8>, Error> {
    let height = u16::try_from(image.height()).map_err(|_| Error::InvalidParameter {
        name: "height",
        value: i64::from(image.height()),
        min: 0,
        max: i64::from(u16::MAX),
    })?;

    let mut cmd =
        Vec::with_capacity(PAGE_AREA.len() + 2 + PAGE_MODE.len() + image.data().len() + 1);
    cmd.extend_from_slice(&PAGE_AREA);
    cmd.write_u16::<LittleEndian>(height)?;
    cmd.extend_from_slice(&PAGE_MODE);
    cmd.extend_from_slice(image.data());
    cmd.push(PAGE_END);
    Ok(cmd)
}
