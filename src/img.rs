//! Raster conversion for bit image printing.
//!
//! A source picture goes through the same steps every time:
//!
//! 1. scale down to at most [`MAX_IMAGE_WIDTH`] dots wide, keeping the aspect ratio
//! 2. dither to 1 bit
//! 3. pad the bottom with white rows to a whole number of 24 row stripes
//! 4. pack every stripe column by column, three bytes (8 rows each) per column
//! 5. invert the packed bytes
//! 6. frame every stripe as an `ESC * 33` bit image followed by a feed
//!
//! The result is a [`PrintableImage`], ready for
//! [`command::print_image`](crate::command::print_image).

use std::borrow::Cow;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use byteorder::{LittleEndian, WriteBytesExt};
use image::error::{ParameterError, ParameterErrorKind};
use image::imageops::{self, BiLevel, FilterType};
use image::{DynamicImage, ImageError};

use crate::consts::{BITMAP_D24, MAX_IMAGE_WIDTH, STRIPE_FEED, STRIPE_HEIGHT};
use crate::printer::Error;

/// Rows packed into one byte
const BAND_HEIGHT: u32 = 8;
/// Bytes per column inside a stripe
const BANDS_PER_STRIPE: u32 = STRIPE_HEIGHT / BAND_HEIGHT;

/// Packed raster data and the page height it needs.
///
/// `height` is expressed in the half-dot units of the page mode print area,
/// which is twice the padded pixel height.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrintableImage {
    data: Vec<u8>,
    height: u32,
}

impl PrintableImage {
    pub fn new(data: Vec<u8>, height: u32) -> Self {
        PrintableImage { data, height }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Appends another image below this one so both print as a single page
    pub fn append(&mut self, other: PrintableImage) -> &mut Self {
        self.data.extend(other.data);
        self.height += other.height;
        self
    }

    /// Folds any number of images into one, `None` when there are none
    pub fn concat<I>(images: I) -> Option<PrintableImage>
    where
        I: IntoIterator<Item = PrintableImage>,
    {
        let mut images = images.into_iter();
        let mut first = images.next()?;
        for image in images {
            first.append(image);
        }
        Some(first)
    }

    pub fn from_image(image: &DynamicImage) -> Result<Self, Error> {
        if image.width() == 0 || image.height() == 0 {
            return Err(empty_image());
        }
        let scaled = fit_width(image);
        Self::from_monochrome(Monochrome::from_image(&scaled))
    }

    /// Pads and packs an already dithered bitmap
    pub fn from_monochrome(mut bitmap: Monochrome) -> Result<Self, Error> {
        if bitmap.width == 0 || bitmap.height == 0 {
            return Err(empty_image());
        }
        if bitmap.width > MAX_IMAGE_WIDTH {
            return Err(Error::InvalidParameter {
                name: "width",
                value: i64::from(bitmap.width),
                min: 1,
                max: i64::from(MAX_IMAGE_WIDTH),
            });
        }

        let extra_rows = bitmap.pad_to_stripes();
        log::trace!(
            "Raster {}x{} ({} padding rows)",
            bitmap.width,
            bitmap.height,
            extra_rows
        );

        let data = encode_stripes(&bitmap)?;
        Ok(PrintableImage {
            data,
            height: bitmap.height * 2,
        })
    }

    /// Loads a picture from disk, the format is sniffed from its content
    pub fn from_path<P: AsRef<Path>>(path: P, rotate: bool) -> Result<Self, Error> {
        let image = image::io::Reader::open(path)?
            .with_guessed_format()?
            .decode()?;
        Self::from_image(&rotated(image, rotate))
    }

    /// Decodes a base64 encoded picture. Whitespace, such as the line breaks
    /// of a MIME body, is ignored.
    pub fn from_base64<B: AsRef<[u8]>>(data: B, rotate: bool) -> Result<Self, Error> {
        let compact: Vec<u8> = data
            .as_ref()
            .iter()
            .copied()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        let bytes = STANDARD.decode(compact)?;
        let image = image::load_from_memory(&bytes)?;
        Self::from_image(&rotated(image, rotate))
    }
}

fn rotated(image: DynamicImage, rotate: bool) -> DynamicImage {
    if rotate {
        image.rotate180()
    } else {
        image
    }
}

fn empty_image() -> Error {
    Error::UnsupportedImage(ImageError::Parameter(ParameterError::from_kind(
        ParameterErrorKind::DimensionMismatch,
    )))
}

/// Size after fitting to the printable width. Narrower images are never
/// enlarged; wider ones keep their aspect ratio with the height rounded down.
pub fn scaled_size(width: u32, height: u32) -> (u32, u32) {
    if width <= MAX_IMAGE_WIDTH {
        return (width, height);
    }
    let scaled = u64::from(height) * u64::from(MAX_IMAGE_WIDTH) / u64::from(width);
    // Bounded by `height`, and a sliver of an image still needs one row
    (MAX_IMAGE_WIDTH, (scaled as u32).max(1))
}

pub fn fit_width(image: &DynamicImage) -> Cow<'_, DynamicImage> {
    let (width, height) = scaled_size(image.width(), image.height());
    if width == image.width() {
        return Cow::Borrowed(image);
    }
    log::debug!(
        "Scaling image from {}x{} to {}x{}",
        image.width(),
        image.height(),
        width,
        height
    );
    Cow::Owned(image.resize_exact(width, height, FilterType::Lanczos3))
}

/// A 1 bit bitmap, stored row by row.
///
/// Like the 1 bit image it comes from, a set pixel is white paper and a
/// clear pixel is a printed dot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Monochrome {
    width: u32,
    height: u32,
    white: Vec<bool>,
}

impl Monochrome {
    pub fn from_fn<F>(width: u32, height: u32, mut is_white: F) -> Self
    where
        F: FnMut(u32, u32) -> bool,
    {
        let mut white = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                white.push(is_white(x, y));
            }
        }
        Monochrome {
            width,
            height,
            white,
        }
    }

    /// Converts to luma and applies Floyd-Steinberg dithering
    pub fn from_image(image: &DynamicImage) -> Self {
        let mut gray = image.to_luma8();
        imageops::dither(&mut gray, &BiLevel);
        let (width, height) = gray.dimensions();
        let white = gray.pixels().map(|p| p.0[0] >= 0x80).collect();
        Monochrome {
            width,
            height,
            white,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_white(&self, x: u32, y: u32) -> bool {
        self.white[(y * self.width + x) as usize]
    }

    /// Appends white rows until the height is a multiple of the stripe
    /// height. Returns the number of rows added.
    pub fn pad_to_stripes(&mut self) -> u32 {
        let padded = (self.height + STRIPE_HEIGHT - 1) / STRIPE_HEIGHT * STRIPE_HEIGHT;
        let extra = padded - self.height;
        self.white.resize((self.width * padded) as usize, true);
        self.height = padded;
        extra
    }

    pub fn stripes(&self) -> u32 {
        self.height / STRIPE_HEIGHT
    }
}

/// Packs one 24 row stripe.
///
/// Columns go left to right; each column yields three bytes, top band
/// first, with the topmost row of a band in the most significant bit. A set
/// bit is a white pixel. The stripe must be fully inside the bitmap, see
/// [`Monochrome::pad_to_stripes`].
pub fn pack_stripe(bitmap: &Monochrome, stripe: u32) -> Vec<u8> {
    let top = stripe * STRIPE_HEIGHT;
    let mut packed = Vec::with_capacity((bitmap.width * BANDS_PER_STRIPE) as usize);
    for x in 0..bitmap.width {
        for band in 0..BANDS_PER_STRIPE {
            let mut byte = 0_u8;
            for bit in 0..BAND_HEIGHT {
                byte <<= 1;
                if bitmap.is_white(x, top + band * BAND_HEIGHT + bit) {
                    byte |= 1;
                }
            }
            packed.push(byte);
        }
    }
    packed
}

/// Flips packed bits to the printer's convention, 1 = print a dot
pub fn invert(packed: &mut [u8]) {
    for byte in packed.iter_mut() {
        *byte = !*byte;
    }
}

/// Frames every stripe of a padded bitmap:
/// `ESC * 33 nL nH <3 * width bytes> ESC J 48`
pub fn encode_stripes(bitmap: &Monochrome) -> Result<Vec<u8>, Error> {
    let width = u16::try_from(bitmap.width).map_err(|_| Error::InvalidParameter {
        name: "width",
        value: i64::from(bitmap.width),
        min: 1,
        max: i64::from(MAX_IMAGE_WIDTH),
    })?;
    let unit = stripe_len(bitmap.width);
    let mut data = Vec::with_capacity(unit * bitmap.stripes() as usize);

    for stripe in 0..bitmap.stripes() {
        let mut packed = pack_stripe(bitmap, stripe);
        invert(&mut packed);

        data.extend_from_slice(&BITMAP_D24);
        data.write_u16::<LittleEndian>(width)?;
        data.extend(packed);
        data.extend_from_slice(&STRIPE_FEED);
    }
    Ok(data)
}

/// Bytes taken by one framed stripe of the given width
pub fn stripe_len(width: u32) -> usize {
    BITMAP_D24.len() + 2 + (width * BANDS_PER_STRIPE) as usize + STRIPE_FEED.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, RgbImage};

    fn unpack_stripe(packed: &[u8], width: u32) -> Monochrome {
        Monochrome::from_fn(width, STRIPE_HEIGHT, |x, y| {
            let byte = packed[(x * BANDS_PER_STRIPE + y / BAND_HEIGHT) as usize];
            // packed bytes have been inverted, a clear bit is white
            (byte >> (7 - y % BAND_HEIGHT)) & 1 == 0
        })
    }

    #[test]
    fn scaled_size_tests() {
        assert_eq!(scaled_size(600, 300), (512, 256));
        assert_eq!(scaled_size(1024, 100), (512, 50));
        assert_eq!(scaled_size(700, 333), (512, 243));
        assert_eq!(scaled_size(512, 100), (512, 100));
        assert_eq!(scaled_size(300, 200), (300, 200));
        assert_eq!(scaled_size(1, 1), (1, 1));
        assert_eq!(scaled_size(10_000, 5), (512, 1));
    }

    #[test]
    fn narrow_images_are_not_rescaled() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(200, 30));
        assert!(matches!(fit_width(&image), Cow::Borrowed(_)));

        let image = DynamicImage::ImageRgb8(RgbImage::new(513, 30));
        let scaled = fit_width(&image);
        assert_eq!((scaled.width(), scaled.height()), (512, 29));
    }

    #[test]
    fn dithering_keeps_solid_colours() {
        let mut gray = GrayImage::from_pixel(4, 2, Luma([255]));
        gray.put_pixel(1, 0, Luma([0]));
        let bitmap = Monochrome::from_image(&DynamicImage::ImageLuma8(gray));
        assert_eq!((bitmap.width(), bitmap.height()), (4, 2));
        assert!(!bitmap.is_white(1, 0));
        assert!(bitmap.is_white(0, 0));
        assert!(bitmap.is_white(3, 1));
    }

    #[test]
    fn padding_tests() {
        let mut bitmap = Monochrome::from_fn(3, 10, |_, _| false);
        assert_eq!(bitmap.pad_to_stripes(), 14);
        assert_eq!(bitmap.height(), 24);
        assert!(!bitmap.is_white(2, 9));
        assert!(bitmap.is_white(0, 10));
        assert!(bitmap.is_white(2, 23));

        let mut bitmap = Monochrome::from_fn(3, 48, |_, _| false);
        assert_eq!(bitmap.pad_to_stripes(), 0);
        assert_eq!(bitmap.height(), 48);
        assert_eq!(bitmap.pad_to_stripes(), 0);
    }

    #[test]
    fn stripe_byte_order() {
        // A single dot in column 1, row 9 (second band, second bit)
        let bitmap = Monochrome::from_fn(3, 24, |x, y| !(x == 1 && y == 9));
        let mut packed = pack_stripe(&bitmap, 0);
        assert_eq!(packed, vec![0xff, 0xff, 0xff, 0xff, 0xbf, 0xff, 0xff, 0xff, 0xff]);
        invert(&mut packed);
        assert_eq!(packed, vec![0x00, 0x00, 0x00, 0x00, 0x40, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn pack_then_unpack_restores_bitmap() {
        let bitmap = Monochrome::from_fn(7, 24, |x, y| (x * 7 + y * 3) % 5 < 2);
        let mut packed = pack_stripe(&bitmap, 0);
        invert(&mut packed);
        assert_eq!(unpack_stripe(&packed, 7), bitmap);
    }

    #[test]
    fn second_stripe_starts_at_row_24() {
        let bitmap = Monochrome::from_fn(2, 48, |_, y| y != 24);
        assert_eq!(pack_stripe(&bitmap, 0), vec![0xff; 6]);
        assert_eq!(
            pack_stripe(&bitmap, 1),
            vec![0x7f, 0xff, 0xff, 0x7f, 0xff, 0xff]
        );
    }

    #[test]
    fn stripes_are_framed() {
        let bitmap = Monochrome::from_fn(300, 48, |_, _| true);
        let data = encode_stripes(&bitmap).unwrap();
        let unit = stripe_len(300);
        assert_eq!(unit, 5 + 900 + 3);
        assert_eq!(data.len(), 2 * unit);
        for stripe in data.chunks(unit) {
            assert_eq!(stripe[..5], [27, 42, 33, 44, 1]);
            assert!(stripe[5..unit - 3].iter().all(|&b| b == 0x00));
            assert_eq!(stripe[unit - 3..], [27, 74, 48]);
        }
    }

    #[test]
    fn wide_black_image() {
        let image = DynamicImage::ImageLuma8(GrayImage::new(600, 300));
        let printable = PrintableImage::from_image(&image).unwrap();

        // 600x300 scales to 512x256, padded to 264 rows
        assert_eq!(printable.height(), 264 * 2);
        let unit = stripe_len(512);
        assert_eq!(printable.data().len(), 11 * unit);
        assert_eq!(printable.data().len() % unit, 0);

        let stripes: Vec<&[u8]> = printable.data().chunks(unit).collect();
        for stripe in &stripes[..10] {
            assert_eq!(stripe[..5], [27, 42, 33, 0, 2]);
            assert!(stripe[5..unit - 3].iter().all(|&b| b == 0xff));
        }
        // Rows 240..256 are image, 256..264 are padding
        let last = &stripes[10][5..unit - 3];
        for column in last.chunks(3) {
            assert_eq!(column, [0xff, 0xff, 0x00]);
        }
    }

    #[test]
    fn height_is_doubled() {
        let bitmap = Monochrome::from_fn(8, 30, |_, _| true);
        let printable = PrintableImage::from_monochrome(bitmap).unwrap();
        assert_eq!(printable.height(), 96);
        assert_eq!(printable.data().len(), 2 * stripe_len(8));
    }

    #[test]
    fn rejects_unprintable_bitmaps() {
        let bitmap = Monochrome::from_fn(513, 24, |_, _| true);
        assert!(matches!(
            PrintableImage::from_monochrome(bitmap),
            Err(Error::InvalidParameter { name: "width", .. })
        ));
        let image = DynamicImage::ImageLuma8(GrayImage::new(0, 10));
        assert!(matches!(
            PrintableImage::from_image(&image),
            Err(Error::UnsupportedImage(_))
        ));
    }

    #[test]
    fn append_tests() {
        let mut a = PrintableImage::new(vec![1, 2, 3], 48);
        let b = PrintableImage::new(vec![4, 5], 96);
        a.append(b);
        assert_eq!(a.data(), &[1, 2, 3, 4, 5]);
        assert_eq!(a.height(), 144);
        assert_eq!(a.into_data(), vec![1, 2, 3, 4, 5]);

        let joined = PrintableImage::concat(vec![
            PrintableImage::new(vec![1], 2),
            PrintableImage::new(vec![2], 4),
            PrintableImage::new(vec![3], 6),
        ])
        .unwrap();
        assert_eq!(joined, PrintableImage::new(vec![1, 2, 3], 12));
        assert_eq!(PrintableImage::concat(Vec::new()), None);
    }

    #[test]
    fn rotation_flips_the_bitmap() {
        let mut gray = GrayImage::from_pixel(4, 24, Luma([255]));
        gray.put_pixel(0, 0, Luma([0]));
        let mut png = Vec::new();
        DynamicImage::ImageLuma8(gray)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageOutputFormat::Png)
            .unwrap();
        let encoded = STANDARD.encode(&png);

        let upright = PrintableImage::from_base64(&encoded, false).unwrap();
        let rotated = PrintableImage::from_base64(&encoded, true).unwrap();
        // Column 0 top band versus column 3 bottom band
        assert_eq!(upright.data()[5], 0x80);
        assert_eq!(rotated.data()[5 + 9 + 2], 0x01);
        assert_eq!(rotated.data()[5], 0x00);
    }

    #[test]
    fn bad_sources() {
        assert!(matches!(
            PrintableImage::from_base64("not base64!", false),
            Err(Error::InvalidBase64(_))
        ));
        let garbage = STANDARD.encode(b"definitely not a picture");
        assert!(matches!(
            PrintableImage::from_base64(garbage, false),
            Err(Error::UnsupportedImage(_))
        ));
    }
}
