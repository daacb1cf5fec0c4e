extern crate image;
extern crate rppal;
extern crate std;

use rppal::gpio::{Gpio, InputPin, Level, OutputPin};
use rppal::spi::Spi;

use crate::result;
use crate::result::PanelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn luma(self) -> image::Luma<u8> {
        match self {
            Color::White => return image::Luma([255u8]),
            Color::Black => return image::Luma([0u8]),
        }
    }
}

// What the renderer needs from an e-paper panel. `fill` and `image` only
// stage content; nothing reaches the glass until `display`.
pub trait Panel {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn fill(&mut self, color: Color) -> result::MetroResult<()>;
    fn image(&mut self, frame: &image::GrayImage) -> result::MetroResult<()>;
    fn display(&mut self) -> result::MetroResult<()>;
}

impl<P: Panel + ?Sized> Panel for Box<P> {
    fn width(&self) -> u32 {
        return (**self).width();
    }

    fn height(&self) -> u32 {
        return (**self).height();
    }

    fn fill(&mut self, color: Color) -> result::MetroResult<()> {
        return (**self).fill(color);
    }

    fn image(&mut self, frame: &image::GrayImage) -> result::MetroResult<()> {
        return (**self).image(frame);
    }

    fn display(&mut self) -> result::MetroResult<()> {
        return (**self).display();
    }
}

fn check_frame_size(frame: &image::GrayImage, width: u32, height: u32) -> result::MetroResult<()> {
    if frame.width() != width || frame.height() != height {
        return Err(PanelError::Rejected(format!(
            "frame is {}x{}, panel is {}x{}",
            frame.width(), frame.height(), width, height)).into());
    }
    return Ok(());
}

// Writes every committed frame to a PNG file instead of a panel.
pub struct PngPanel {
    path: String,
    staged: image::GrayImage,
}

impl PngPanel {
    pub fn new(path: &str, width: u32, height: u32) -> PngPanel {
        return PngPanel {
            path: path.to_string(),
            staged: image::GrayImage::from_pixel(width, height, Color::White.luma()),
        };
    }
}

impl Panel for PngPanel {
    fn width(&self) -> u32 {
        return self.staged.width();
    }

    fn height(&self) -> u32 {
        return self.staged.height();
    }

    fn fill(&mut self, color: Color) -> result::MetroResult<()> {
        for pixel in self.staged.pixels_mut() {
            *pixel = color.luma();
        }
        return Ok(());
    }

    fn image(&mut self, frame: &image::GrayImage) -> result::MetroResult<()> {
        check_frame_size(frame, self.width(), self.height())?;
        self.staged.clone_from(frame);
        return Ok(());
    }

    fn display(&mut self) -> result::MetroResult<()> {
        self.staged.save(&self.path).map_err(PanelError::from)?;
        debug!("Wrote frame to {}", self.path);
        return Ok(());
    }
}

// Mirrors every call onto two panels, e.g. the e-paper and a debug PNG.
pub struct Tee<A: Panel, B: Panel> {
    pub first: A,
    pub second: B,
}

impl<A: Panel, B: Panel> Panel for Tee<A, B> {
    fn width(&self) -> u32 {
        return self.first.width();
    }

    fn height(&self) -> u32 {
        return self.first.height();
    }

    fn fill(&mut self, color: Color) -> result::MetroResult<()> {
        self.first.fill(color)?;
        return self.second.fill(color);
    }

    fn image(&mut self, frame: &image::GrayImage) -> result::MetroResult<()> {
        self.first.image(frame)?;
        return self.second.image(frame);
    }

    fn display(&mut self) -> result::MetroResult<()> {
        self.first.display()?;
        return self.second.display();
    }
}

// Adafruit 2.13" monochrome bonnet: SSD1680, 122x250 native, mounted so the
// board reads 250x122 landscape.
const RST_PIN : u8 = 27;
const DC_PIN : u8 = 22;
const BUSY_PIN : u8 = 17;

const NATIVE_WIDTH : u32 = 122;
const NATIVE_HEIGHT : u32 = 250;
const ROW_BYTES : usize = ((NATIVE_WIDTH + 7) / 8) as usize;

const DRIVER_OUTPUT_CONTROL : u8 = 0x01;
const DATA_ENTRY_MODE : u8 = 0x11;
const SW_RESET : u8 = 0x12;
const TEMPERATURE_SENSOR : u8 = 0x18;
const MASTER_ACTIVATION : u8 = 0x20;
const DISPLAY_UPDATE_CONTROL_2 : u8 = 0x22;
const WRITE_BW_RAM : u8 = 0x24;
const BORDER_WAVEFORM : u8 = 0x3C;
const RAM_X_RANGE : u8 = 0x44;
const RAM_Y_RANGE : u8 = 0x45;
const RAM_X_COUNTER : u8 = 0x4E;
const RAM_Y_COUNTER : u8 = 0x4F;

const BUSY_TIMEOUT : std::time::Duration = std::time::Duration::from_secs(10);

pub struct Ssd1680Panel {
    spi: Spi,
    dc_pin: OutputPin,
    rst_pin: OutputPin,
    busy_pin: InputPin,
    ram: Vec<u8>,
}

impl Ssd1680Panel {
    pub fn new() -> result::MetroResult<Ssd1680Panel> {
        let gpio = Gpio::new().map_err(PanelError::from)?;
        let dc_pin = gpio.get(DC_PIN).map_err(PanelError::from)?.into_output();
        let rst_pin = gpio.get(RST_PIN).map_err(PanelError::from)?.into_output();
        let busy_pin = gpio.get(BUSY_PIN).map_err(PanelError::from)?.into_input();

        // Don't forget to enable SPI with sudo raspi-config
        let spi = Spi::new(
            rppal::spi::Bus::Spi0,
            rppal::spi::SlaveSelect::Ss0,
            4_000_000,
            rppal::spi::Mode::Mode0).map_err(PanelError::from)?;

        let mut panel = Ssd1680Panel {
            spi: spi,
            dc_pin: dc_pin,
            rst_pin: rst_pin,
            busy_pin: busy_pin,
            ram: vec![0xFF; ROW_BYTES * NATIVE_HEIGHT as usize],
        };
        panel.init()?;
        return Ok(panel);
    }

    fn init(&mut self) -> result::MetroResult<()> {
        self.rst_pin.set_low();
        std::thread::sleep(std::time::Duration::from_millis(20));
        self.rst_pin.set_high();
        std::thread::sleep(std::time::Duration::from_millis(20));

        self.send_command(SW_RESET)?;
        self.wait_until_idle()?;

        let gates = NATIVE_HEIGHT - 1;
        self.send_command(DRIVER_OUTPUT_CONTROL)?;
        self.send_data(&[(gates & 0xFF) as u8, (gates >> 8) as u8, 0x00])?;

        // x increments, then y
        self.send_command(DATA_ENTRY_MODE)?;
        self.send_data(&[0x03])?;

        self.send_command(RAM_X_RANGE)?;
        self.send_data(&[0x00, (ROW_BYTES - 1) as u8])?;

        self.send_command(RAM_Y_RANGE)?;
        self.send_data(&[0x00, 0x00, (gates & 0xFF) as u8, (gates >> 8) as u8])?;

        self.send_command(BORDER_WAVEFORM)?;
        self.send_data(&[0x05])?;

        // internal temperature sensor
        self.send_command(TEMPERATURE_SENSOR)?;
        self.send_data(&[0x80])?;

        return self.wait_until_idle();
    }

    fn send_command(&mut self, command: u8) -> result::MetroResult<()> {
        self.dc_pin.set_low();
        return self.write(&[command]);
    }

    fn send_data(&mut self, data: &[u8]) -> result::MetroResult<()> {
        self.dc_pin.set_high();
        return self.write(data);
    }

    fn write(&mut self, bytes: &[u8]) -> result::MetroResult<()> {
        // spidev caps a single transfer at 4096 bytes by default.
        for chunk in bytes.chunks(4096) {
            let written = self.spi.write(chunk).map_err(PanelError::from)?;
            if written != chunk.len() {
                return Err(PanelError::ShortWrite { expected: chunk.len(), written: written }.into());
            }
        }
        return Ok(());
    }

    fn wait_until_idle(&self) -> result::MetroResult<()> {
        let start = std::time::Instant::now();
        loop {
            if self.busy_pin.read() == Level::Low {
                return Ok(());
            }
            if start.elapsed() > BUSY_TIMEOUT {
                return Err(PanelError::BusyTimeout(start.elapsed()).into());
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
    }
}

// Landscape (x, y) -> (byte, bit) in the portrait RAM layout. White is 1.
fn ram_position(x: u32, y: u32) -> (usize, u8) {
    let native_x = NATIVE_WIDTH - 1 - y;
    let native_y = x;
    let index = native_y as usize * ROW_BYTES + (native_x / 8) as usize;
    return (index, 0x80 >> (native_x % 8));
}

fn pack_frame(frame: &image::GrayImage, ram: &mut Vec<u8>) {
    for byte in ram.iter_mut() {
        *byte = 0xFF;
    }
    for (x, y, pixel) in frame.enumerate_pixels() {
        if pixel[0] < 128 {
            let (index, mask) = ram_position(x, y);
            ram[index] &= !mask;
        }
    }
}

impl Panel for Ssd1680Panel {
    fn width(&self) -> u32 {
        return NATIVE_HEIGHT;
    }

    fn height(&self) -> u32 {
        return NATIVE_WIDTH;
    }

    fn fill(&mut self, color: Color) -> result::MetroResult<()> {
        let value = match color {
            Color::White => 0xFF,
            Color::Black => 0x00,
        };
        for byte in self.ram.iter_mut() {
            *byte = value;
        }
        return Ok(());
    }

    fn image(&mut self, frame: &image::GrayImage) -> result::MetroResult<()> {
        check_frame_size(frame, self.width(), self.height())?;
        pack_frame(frame, &mut self.ram);
        return Ok(());
    }

    fn display(&mut self) -> result::MetroResult<()> {
        self.send_command(RAM_X_COUNTER)?;
        self.send_data(&[0x00])?;
        self.send_command(RAM_Y_COUNTER)?;
        self.send_data(&[0x00, 0x00])?;

        self.send_command(WRITE_BW_RAM)?;
        let ram = std::mem::replace(&mut self.ram, vec![]);
        let sent = self.send_data(&ram);
        self.ram = ram;
        sent?;

        self.send_command(DISPLAY_UPDATE_CONTROL_2)?;
        self.send_data(&[0xF7])?;
        self.send_command(MASTER_ACTIVATION)?;
        std::thread::sleep(std::time::Duration::from_millis(100));
        return self.wait_until_idle();
    }
}

#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelCall {
    FillWhite,
    FillBlack,
    Image,
    Display,
}

// Records the call sequence and the last staged frame.
#[cfg(test)]
pub struct RecordingPanel {
    pub width: u32,
    pub height: u32,
    pub calls: Vec<PanelCall>,
    pub frames: Vec<image::GrayImage>,
    pub fail_on_display: bool,
}

#[cfg(test)]
impl RecordingPanel {
    pub fn new(width: u32, height: u32) -> RecordingPanel {
        return RecordingPanel {
            width: width,
            height: height,
            calls: vec![],
            frames: vec![],
            fail_on_display: false,
        };
    }
}

#[cfg(test)]
impl Panel for RecordingPanel {
    fn width(&self) -> u32 {
        return self.width;
    }

    fn height(&self) -> u32 {
        return self.height;
    }

    fn fill(&mut self, color: Color) -> result::MetroResult<()> {
        self.calls.push(match color {
            Color::White => PanelCall::FillWhite,
            Color::Black => PanelCall::FillBlack,
        });
        return Ok(());
    }

    fn image(&mut self, frame: &image::GrayImage) -> result::MetroResult<()> {
        self.calls.push(PanelCall::Image);
        self.frames.push(frame.clone());
        return Ok(());
    }

    fn display(&mut self) -> result::MetroResult<()> {
        self.calls.push(PanelCall::Display);
        if self.fail_on_display {
            return Err(PanelError::BusyTimeout(std::time::Duration::from_secs(10)).into());
        }
        return Ok(());
    }
}

#[cfg(test)]
mod tests {
    use super::{Color, Panel, PanelCall, RecordingPanel, Tee};

    #[test]
    fn ram_layout_rotates_landscape() {
        // top-left of the landscape frame is the last column of native row 0
        assert_eq!((15, 0x80 >> 1), super::ram_position(0, 0));
        assert_eq!((0, 0x80), super::ram_position(0, 121));
        assert_eq!((249 * 16 + 15, 0x80 >> 1), super::ram_position(249, 0));
    }

    #[test]
    fn pack_marks_dark_pixels() {
        let mut frame = image::GrayImage::from_pixel(250, 122, Color::White.luma());
        frame.put_pixel(0, 121, Color::Black.luma());
        let mut ram = vec![0u8; super::ROW_BYTES * 250];

        super::pack_frame(&frame, &mut ram);

        assert_eq!(0x7F, ram[0]);
        assert!(ram[1..].iter().all(|b| *b == 0xFF));
    }

    #[test]
    fn png_panel_rejects_wrong_size() {
        let mut panel = super::PngPanel::new("/tmp/metrodash-test.png", 250, 122);
        let err = panel.image(&image::GrayImage::new(10, 10)).expect_err("wrong size");
        assert!(format!("{}", err).contains("10x10"));
    }

    #[test]
    fn tee_forwards_to_both() {
        let mut tee = Tee {
            first: RecordingPanel::new(8, 4),
            second: RecordingPanel::new(8, 4),
        };
        tee.fill(Color::White).expect("fill");
        tee.image(&image::GrayImage::new(8, 4)).expect("image");
        tee.display().expect("display");

        let expected = vec![PanelCall::FillWhite, PanelCall::Image, PanelCall::Display];
        assert_eq!(expected, tee.first.calls);
        assert_eq!(expected, tee.second.calls);
        assert_eq!(8, tee.width());
    }
}
