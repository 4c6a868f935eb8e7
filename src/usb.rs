use std::time::Duration;

use crate::printer::{Error, PrinterConfig};

/// Write-only channel to a printer.
///
/// Printers are driven fire-and-forget: one blocking write per command and
/// nothing is read back.
pub trait Transport {
    /// Sends `buf` in a single blocking transfer and returns the number of
    /// bytes written. A transfer that stalls past its deadline or comes up
    /// short is reported as [`Error::WriteTimeout`].
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error>;
}

/// Collects everything in memory, handy for dumping a job to a file
impl Transport for Vec<u8> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        self.extend_from_slice(buf);
        Ok(buf.len())
    }
}

/// A claimed printer interface with its bulk out endpoint.
///
/// The interface is released, and a kernel driver we detached is
/// reattached, when this is dropped.
pub struct UsbTransport {
    handle: rusb::DeviceHandle<rusb::GlobalContext>,
    /// USB Command Endpoint (output)
    endpoint: u8,
    interface: u8,
    timeout: Duration,
    kernel_driver_detached: bool,
}

impl UsbTransport {
    pub fn open(config: &PrinterConfig) -> Result<Self, Error> {
        let vid = config.vendor_id;
        let pid = config.product_id;

        // Iterate over the devices to find the printer
        let device = rusb::devices()?
            .iter()
            .find(|d| match d.device_descriptor() {
                Ok(desc) => desc.vendor_id() == vid && desc.product_id() == pid,
                Err(_) => false,
            })
            .ok_or(Error::DeviceNotFound {
                vendor_id: vid,
                product_id: pid,
            })?;
        log::debug!(
            "Found printer {:04x}:{:04x} on bus {:03} device {:03}",
            vid,
            pid,
            device.bus_number(),
            device.address()
        );

        let mut handle = device.open()?;
        let interface = config.interface;

        // Not every platform can tell or detach, the write may work regardless
        let kernel_driver_detached = match handle.kernel_driver_active(interface) {
            Ok(true) => match handle.detach_kernel_driver(interface) {
                Ok(()) => {
                    log::debug!("Detached kernel driver from interface {}", interface);
                    true
                }
                Err(e) => {
                    log::warn!("Could not detach kernel driver: {}", e);
                    false
                }
            },
            Ok(false) => {
                log::trace!("Kernel driver inactive");
                false
            }
            Err(e) => {
                log::trace!("Kernel driver state unknown: {}", e);
                false
            }
        };

        let configuration = device
            .config_descriptor(0)
            .map(|c| c.number())
            .unwrap_or(1);
        let configured = handle
            .set_active_configuration(configuration)
            .and_then(|()| handle.reset());
        if let Err(e) = configured {
            log::warn!("Could not set configuration: {}", e);
        }

        handle.claim_interface(interface)?;

        Ok(UsbTransport {
            handle,
            endpoint: config.out_endpoint,
            interface,
            timeout: config.timeout,
            kernel_driver_detached,
        })
    }
}

impl Transport for UsbTransport {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        let result = self.handle.write_bulk(self.endpoint, buf, self.timeout);
        let n_bytes = written(result, buf.len())?;
        log::trace!("Wrote {} bytes to endpoint {:#04x}", n_bytes, self.endpoint);
        Ok(n_bytes)
    }
}

/// Maps the outcome of a bulk transfer of `len` bytes. Stalls and short
/// writes both mean the printer did not take the whole command in time.
fn written(result: rusb::Result<usize>, len: usize) -> Result<usize, Error> {
    match result {
        Ok(n_bytes) if n_bytes == len => Ok(n_bytes),
        Ok(n_bytes) => {
            log::debug!("Short write, {} of {} bytes", n_bytes, len);
            Err(Error::WriteTimeout)
        }
        Err(rusb::Error::Timeout) => Err(Error::WriteTimeout),
        Err(e) => Err(e.into()),
    }
}

impl Drop for UsbTransport {
    fn drop(&mut self) {
        let _ = self.handle.release_interface(self.interface);
        if self.kernel_driver_detached {
            if let Err(e) = self.handle.attach_kernel_driver(self.interface) {
                log::debug!("Could not reattach kernel driver: {}", e);
            }
        }
    }
}
