use std::io;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use encoding::all::UTF_8;
use encoding::types::{EncoderTrap, EncodingRef};

use crate::command;
use crate::img::PrintableImage;
use crate::usb::{Transport, UsbTransport};

/// Timeout for sending USB messages, in milliseconds
pub const TIMEOUT: u64 = 20_000;

/// Bulk out endpoint used when none is configured
pub const DEFAULT_OUT_ENDPOINT: u8 = 0x01;

/// Interface claimed when none is configured
pub const DEFAULT_INTERFACE: u8 = 0;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Printer {vendor_id:04x}:{product_id:04x} not found")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    #[error("Invalid {name}: {value} is outside {min}..={max}")]
    InvalidParameter {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("Write timeout")]
    WriteTimeout,

    #[error("Unsupported image: {0}")]
    UnsupportedImage(image::ImageError),

    #[error("Invalid base64 image data: {0}")]
    InvalidBase64(base64::DecodeError),

    #[error("Invalid device id {0:?}, expected VID:PID in hex")]
    InvalidDeviceId(String),

    #[error("No images to print")]
    NoImages,

    #[error("USB error: {0}")]
    Usb(rusb::Error),

    #[error("IO error: {0}")]
    Io(std::io::Error),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<rusb::Error> for Error {
    fn from(e: rusb::Error) -> Self {
        Error::Usb(e)
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::UnsupportedImage(e)
    }
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Self {
        Error::InvalidBase64(e)
    }
}

/// Where to find the printer and how to talk to it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrinterConfig {
    /// USB Vendor ID
    pub vendor_id: u16,
    /// USB Product ID
    pub product_id: u16,
    /// USB Command Endpoint (output)
    pub out_endpoint: u8,
    pub interface: u8,
    /// Deadline for every write
    pub timeout: Duration,
}

impl PrinterConfig {
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        PrinterConfig {
            vendor_id,
            product_id,
            out_endpoint: DEFAULT_OUT_ENDPOINT,
            interface: DEFAULT_INTERFACE,
            timeout: Duration::from_millis(TIMEOUT),
        }
    }

    pub fn with_out_endpoint(mut self, endpoint: u8) -> Self {
        self.out_endpoint = endpoint;
        self
    }

    pub fn with_interface(mut self, interface: u8) -> Self {
        self.interface = interface;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Parses `VID:PID` in hex, as `lsusb` prints it (e.g. `04b8:0202`)
impl FromStr for PrinterConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidDeviceId(s.to_string());
        let (vid, pid) = s.trim().split_once(':').ok_or_else(invalid)?;
        let vid = u16::from_str_radix(vid, 16).map_err(|_| invalid())?;
        let pid = u16::from_str_radix(pid, 16).map_err(|_| invalid())?;
        Ok(PrinterConfig::new(vid, pid))
    }
}

/// A printer session.
///
/// Every method builds its bytes with [`command`] (or [`crate::img`]) first
/// and then sends them with a single write, so a parameter that fails
/// validation never reaches the device. Each method also has a `chain_`
/// form returning the printer for fluent use.
pub struct Printer<T: Transport = UsbTransport> {
    transport: T,
    codec: EncodingRef,
    trap: EncoderTrap,
}

impl Printer<UsbTransport> {
    /// Opens the USB printer described by `config`
    pub fn new(config: &PrinterConfig) -> Result<Self, Error> {
        Ok(Printer::with_transport(UsbTransport::open(config)?))
    }
}

impl<T: Transport> Printer<T> {
    pub fn with_transport(transport: T) -> Self {
        Printer {
            transport,
            codec: UTF_8 as EncodingRef,
            trap: EncoderTrap::Replace,
        }
    }

    /// Changes how text is turned into bytes, UTF-8 by default
    pub fn set_codec(&mut self, codec: EncodingRef, trap: EncoderTrap) {
        self.codec = codec;
        self.trap = trap;
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    // --------------------------------------------------

    fn encode(&self, content: &str) -> io::Result<Vec<u8>> {
        self.codec
            .encode(content, self.trap)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))
    }

    pub fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        self.transport.write(buf)
    }

    /// Sends text as is, without any formatting commands
    pub fn print_text(&mut self, content: &str) -> Result<usize, Error> {
        if content.is_empty() {
            return Ok(0);
        }
        let rv = self.encode(content)?;
        self.write(rv.as_slice())
    }
    pub fn chain_print_text(&mut self, content: &str) -> Result<&mut Self, Error> {
        self.print_text(content).map(|_| self)
    }

    pub fn linefeed(&mut self, lines: i32) -> Result<usize, Error> {
        let cmd = command::linefeed(lines)?;
        self.write(&cmd)
    }
    pub fn chain_linefeed(&mut self, lines: i32) -> Result<&mut Self, Error> {
        self.linefeed(lines).map(|_| self)
    }

    pub fn cut(&mut self) -> Result<usize, Error> {
        self.write(&command::full_paper_cut())
    }
    pub fn chain_cut(&mut self) -> Result<&mut Self, Error> {
        self.cut().map(|_| self)
    }

    pub fn underline_on(&mut self, weight: i32) -> Result<usize, Error> {
        let cmd = command::underline_on(weight)?;
        self.write(&cmd)
    }
    pub fn chain_underline_on(&mut self, weight: i32) -> Result<&mut Self, Error> {
        self.underline_on(weight).map(|_| self)
    }

    pub fn underline_off(&mut self) -> Result<usize, Error> {
        self.write(&command::underline_off())
    }
    pub fn chain_underline_off(&mut self) -> Result<&mut Self, Error> {
        self.underline_off().map(|_| self)
    }

    pub fn bold_on(&mut self) -> Result<usize, Error> {
        self.write(&command::bold_on())
    }
    pub fn chain_bold_on(&mut self) -> Result<&mut Self, Error> {
        self.bold_on().map(|_| self)
    }

    pub fn bold_off(&mut self) -> Result<usize, Error> {
        self.write(&command::bold_off())
    }
    pub fn chain_bold_off(&mut self) -> Result<&mut Self, Error> {
        self.bold_off().map(|_| self)
    }

    pub fn set_line_spacing(&mut self, dots: i32) -> Result<usize, Error> {
        let cmd = command::set_line_spacing(dots)?;
        self.write(&cmd)
    }
    pub fn chain_set_line_spacing(&mut self, dots: i32) -> Result<&mut Self, Error> {
        self.set_line_spacing(dots).map(|_| self)
    }

    pub fn set_default_line_spacing(&mut self) -> Result<usize, Error> {
        self.write(&command::set_default_line_spacing())
    }
    pub fn chain_set_default_line_spacing(&mut self) -> Result<&mut Self, Error> {
        self.set_default_line_spacing().map(|_| self)
    }

    pub fn set_text_size(
        &mut self,
        width_magnification: i32,
        height_magnification: i32,
    ) -> Result<usize, Error> {
        let cmd = command::set_text_size(width_magnification, height_magnification)?;
        self.write(&cmd)
    }
    pub fn chain_set_text_size(
        &mut self,
        width_magnification: i32,
        height_magnification: i32,
    ) -> Result<&mut Self, Error> {
        self.set_text_size(width_magnification, height_magnification)
            .map(|_| self)
    }

    pub fn center(&mut self) -> Result<usize, Error> {
        self.write(&command::center())
    }
    pub fn chain_center(&mut self) -> Result<&mut Self, Error> {
        self.center().map(|_| self)
    }

    pub fn left_justified(&mut self) -> Result<usize, Error> {
        self.write(&command::left_justified())
    }
    pub fn chain_left_justified(&mut self) -> Result<&mut Self, Error> {
        self.left_justified().map(|_| self)
    }

    pub fn right_justified(&mut self) -> Result<usize, Error> {
        self.write(&command::right_justified())
    }
    pub fn chain_right_justified(&mut self) -> Result<&mut Self, Error> {
        self.right_justified().map(|_| self)
    }

    pub fn set_print_speed(&mut self, speed: i32) -> Result<usize, Error> {
        let cmd = command::set_print_speed(speed)?;
        self.write(&cmd)
    }
    pub fn chain_set_print_speed(&mut self, speed: i32) -> Result<&mut Self, Error> {
        self.set_print_speed(speed).map(|_| self)
    }

    pub fn print_image(&mut self, image: &PrintableImage) -> Result<usize, Error> {
        let cmd = command::print_image(image)?;
        log::debug!(
            "Printing {} bytes of raster data, page height {}",
            image.data().len(),
            image.height()
        );
        self.write(&cmd)
    }
    pub fn chain_print_image(&mut self, image: &PrintableImage) -> Result<&mut Self, Error> {
        self.print_image(image).map(|_| self)
    }

    /// Prints several images as one unbroken page, without feeds in between
    pub fn print_images<I>(&mut self, images: I) -> Result<usize, Error>
    where
        I: IntoIterator<Item = PrintableImage>,
    {
        let image = PrintableImage::concat(images).ok_or(Error::NoImages)?;
        self.print_image(&image)
    }
    pub fn chain_print_images<I>(&mut self, images: I) -> Result<&mut Self, Error>
    where
        I: IntoIterator<Item = PrintableImage>,
    {
        self.print_images(images).map(|_| self)
    }

    /// Converts and prints a picture file, optionally turned upside down
    pub fn print_image_from_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        rotate: bool,
    ) -> Result<usize, Error> {
        let image = PrintableImage::from_path(path, rotate)?;
        self.print_image(&image)
    }
    pub fn chain_print_image_from_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        rotate: bool,
    ) -> Result<&mut Self, Error> {
        self.print_image_from_file(path, rotate).map(|_| self)
    }

    /// Converts and prints a base64 encoded picture
    pub fn print_image_from_buffer<B: AsRef<[u8]>>(
        &mut self,
        data: B,
        rotate: bool,
    ) -> Result<usize, Error> {
        let image = PrintableImage::from_base64(data, rotate)?;
        self.print_image(&image)
    }
    pub fn chain_print_image_from_buffer<B: AsRef<[u8]>>(
        &mut self,
        data: B,
        rotate: bool,
    ) -> Result<&mut Self, Error> {
        self.print_image_from_buffer(data, rotate).map(|_| self)
    }
}
