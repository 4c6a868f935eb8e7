//! Receipt layout for an incoming mail message.
//!
//! ```text
//! 2024-05-01 09:30:00
//! Subject: <subject>
//! Message: <body>
//! <5 lines>
//! <image, if any>
//! <10 lines>
//! <cut>
//! ```

use std::io;

use chrono::{Local, NaiveDateTime};

use crate::img::PrintableImage;
use crate::printer::{Error, Printer};
use crate::usb::Transport;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Lines fed after the body, before any image
const BODY_FEED: i32 = 5;
/// Lines fed before cutting, so the text clears the cutter
const TAIL_FEED: i32 = 10;

const RULE_WIDTH: usize = 50;

/// A message handed over by whatever polls the mailbox
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub subject: String,
    pub body: String,
    pub image: Option<PrintableImage>,
}

impl Message {
    pub fn new<S: Into<String>, B: Into<String>>(subject: S, body: B) -> Self {
        Message {
            subject: subject.into(),
            body: body.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: PrintableImage) -> Self {
        self.image = Some(image);
        self
    }
}

impl<T: Transport> Printer<T> {
    /// Prints `message` stamped with the current local time
    pub fn print_message(&mut self, message: &Message) -> Result<usize, Error> {
        self.print_message_at(message, Local::now().naive_local())
    }

    pub fn print_message_at(
        &mut self,
        message: &Message,
        received: NaiveDateTime,
    ) -> Result<usize, Error> {
        let timestamp = received.format(TIMESTAMP_FORMAT).to_string();
        log::info!("Printing \"{}\" ({})", message.subject, timestamp);

        let mut n = 0;
        n += self.print_text(&timestamp)?;
        n += self.linefeed(1)?;
        n += self.print_text("Subject: ")?;
        n += self.print_text(&message.subject)?;
        n += self.linefeed(1)?;
        n += self.print_text("Message: ")?;
        n += self.print_text(&message.body)?;
        n += self.linefeed(BODY_FEED)?;
        if let Some(image) = &message.image {
            n += self.print_image(image)?;
        }
        n += self.linefeed(TAIL_FEED)?;
        n += self.cut()?;
        Ok(n)
    }
}

/// Writes the screen version of a message
pub fn render_text<W: io::Write>(mut out: W, message: &Message) -> io::Result<()> {
    let rule = "=".repeat(RULE_WIDTH);
    writeln!(out, "{}", rule)?;
    writeln!(out, "Subject: {}", message.subject)?;
    writeln!(out, "Body: {}", message.body)?;
    if let Some(image) = &message.image {
        writeln!(out, "Image: {} rows", image.height() / 2)?;
    }
    writeln!(out, "{}", rule)?;
    out.flush()
}
