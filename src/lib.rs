//! Print mail on an ESC/POS thermal receipt printer over USB.
//!
//! ```no_run
//! use mailprint::printer::{Printer, PrinterConfig};
//!
//! fn main() -> Result<(), mailprint::printer::Error> {
//!     let mut printer = Printer::new(&PrinterConfig::new(1208, 514))?;
//!     printer
//!         .chain_center()?
//!         .chain_set_text_size(1, 1)?
//!         .chain_print_text("Hello")?
//!         .chain_linefeed(5)?
//!         .chain_cut()?;
//!     Ok(())
//! }
//! ```

pub mod command;
pub mod consts;
pub mod img;
pub mod printer;
pub mod receipt;
pub mod usb;

pub use img::PrintableImage;
pub use printer::{Error, Printer, PrinterConfig};
pub use receipt::Message;
pub use usb::{Transport, UsbTransport};
