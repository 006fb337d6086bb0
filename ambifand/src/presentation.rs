//! Presentation sinks
//!
//! A sink receives one [`DisplayFrame`] per frame plus status messages. It
//! never feeds anything back into acquisition.

use std::io::Write;

use ambifan_core::config::DisplayFormat;
use ambifan_core::{DisplayFrame, Result, SensorField};
use ambifan_hardware::PortInfo;
use colored::*;
use serde::Serialize;

/// Width of the text slider bars
const SLIDER_WIDTH: usize = 10;

/// Receives readings and status for display
pub trait PresentationSink {
    /// Render one frame
    fn present(&mut self, frame: &DisplayFrame) -> Result<()>;

    /// Show a status message (connection changes, command replies)
    fn status(&mut self, message: &str) -> Result<()>;
}

/// Build the sink for the configured format. `Headless` yields no sink.
pub fn sink_for(format: DisplayFormat) -> Option<Box<dyn PresentationSink>> {
    match format {
        DisplayFormat::Terminal => Some(Box::new(TerminalSink::new(std::io::stdout()))),
        DisplayFormat::Json => Some(Box::new(JsonSink::new(std::io::stdout()))),
        DisplayFormat::Headless => None,
    }
}

/// Text slider for a `[0, 1]` fraction, e.g. `[####------]`
pub fn slider_bar(fraction: f32, width: usize) -> String {
    let filled = (fraction.clamp(0.0, 1.0) * width as f32).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// Plain text value with unit, e.g. `27.9°C`
pub fn format_value(field: SensorField, value: f32) -> String {
    match field {
        SensorField::Gas => format!("{:.0} {}", value, field.unit()),
        SensorField::Humidity => format!("{:.1}{}", value, field.unit()),
        SensorField::Temperature => format!("{:.1}{}", value, field.unit()),
    }
}

/// One status line for the terminal
pub fn format_frame(frame: &DisplayFrame) -> String {
    let mut output = String::new();

    for field in [
        SensorField::Temperature,
        SensorField::Humidity,
        SensorField::Gas,
    ] {
        output.push_str(&format!(
            "{} {} {}  ",
            field.prefix().bold(),
            format_value(field, frame.reading.get(field)).cyan(),
            slider_bar(frame.sliders.get(field), SLIDER_WIDTH),
        ));
    }

    output.push_str(&format!(
        "Fan {} ({:>5.1}° about {})  ",
        format!("{:>6.1}", frame.fan_speed).yellow(),
        frame.fan_angle,
        frame.fan_axis
    ));

    if frame.connected {
        output.push_str(&frame.status.green().to_string());
    } else {
        output.push_str(&frame.status.red().to_string());
    }

    output
}

/// Listing printed by `ambifand ports`
pub fn format_port_list(ports: &[PortInfo]) -> String {
    if ports.is_empty() {
        return "No serial ports found".red().to_string();
    }

    let mut output = String::new();
    output.push_str(&"Available serial ports".bold().to_string());
    for port in ports {
        output.push('\n');
        output.push_str(&format!("  {}  {}", port.name.cyan(), port.description));
    }
    output
}

/// Redraws a single status line in place
pub struct TerminalSink<W: Write> {
    out: W,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> PresentationSink for TerminalSink<W> {
    fn present(&mut self, frame: &DisplayFrame) -> Result<()> {
        write!(self.out, "\r\x1b[2K{}", format_frame(frame))?;
        self.out.flush()?;
        Ok(())
    }

    fn status(&mut self, message: &str) -> Result<()> {
        writeln!(self.out, "\r\x1b[2K{}", message.bold())?;
        self.out.flush()?;
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum JsonRecord<'a> {
    Frame(&'a DisplayFrame),
    Status { message: &'a str },
}

/// Writes one JSON object per line
pub struct JsonSink<W: Write> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_record(&mut self, record: &JsonRecord<'_>) -> Result<()> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> PresentationSink for JsonSink<W> {
    fn present(&mut self, frame: &DisplayFrame) -> Result<()> {
        self.write_record(&JsonRecord::Frame(frame))
    }

    fn status(&mut self, message: &str) -> Result<()> {
        self.write_record(&JsonRecord::Status { message })
    }
}
