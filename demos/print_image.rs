use mailprint::printer::{self, Printer, PrinterConfig};
use mailprint::PrintableImage;

/// Prints every picture given on the command line as one continuous page:
///
///     cargo run --example print_image -- [--device 04b8:0202] [--rotate] a.png b.jpg
fn main() -> Result<(), printer::Error> {
    env_logger::init();

    let mut config = PrinterConfig::new(0x04b8, 0x0202);
    let mut rotate = false;
    let mut paths = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--device" => {
                let device = args.next().unwrap_or_default();
                config = device.parse()?;
            }
            "--rotate" => rotate = true,
            _ => paths.push(arg),
        }
    }

    let images = paths
        .iter()
        .map(|path| PrintableImage::from_path(path, rotate))
        .collect::<Result<Vec<_>, _>>()?;

    let mut printer = Printer::new(&config)?;

    let _ = printer
        .chain_center()?
        .chain_print_images(images)?
        .chain_left_justified()?
        .chain_linefeed(10)?
        .chain_cut()?;
    Ok(())
}
