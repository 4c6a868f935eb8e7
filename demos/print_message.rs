use mailprint::printer::{self, Printer, PrinterConfig};
use mailprint::receipt::{self, Message};
use mailprint::PrintableImage;

/// Prints a message the way the mail poller does:
///
///     cargo run --example print_message -- [--device 04b8:0202] "Subject" "Body" [picture.png]
fn main() -> Result<(), printer::Error> {
    env_logger::init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    // Vendor and product id of the printer
    let config: PrinterConfig = if args.len() > 1 && args[0] == "--device" {
        let device = args.remove(1);
        args.remove(0);
        device.parse()?
    } else {
        PrinterConfig::new(1208, 514)
    };

    let mut args = args.into_iter();
    let subject = args.next().unwrap_or_else(|| "Hello".to_string());
    let body = args
        .next()
        .unwrap_or_else(|| "The quick brown fox jumps over the lazy dog".to_string());

    let mut message = Message::new(subject, body);
    if let Some(path) = args.next() {
        message = message.with_image(PrintableImage::from_path(path, false)?);
    }
    receipt::render_text(std::io::stdout(), &message)?;

    let mut printer = Printer::new(&config)?;
    printer.print_message(&message)?;

    Ok(())
}
