// RM67162 AMOLED controller over QSPI, 536x240 landscape.
//
// Register writes go out single-line as cmd 0x02 + 24-bit address
// (register << 8) + data. Pixel data goes out as cmd 0x32 + address
// 0x003C00 followed by quad-line RGB565, big-endian. A pixel stream is
// split into DMA-sized chunks under one CS assertion; only the first
// chunk carries the command and address.
//
// Brightness is register 0x51, there is no backlight. The init sequence
// leaves it at a fixed level; the power controller sets the real one.
// Orientation is set once in MADCTL so the strip buffer can draw in
// panel coordinates.

use core::fmt;

use esp_hal::{
    delay::Delay,
    spi::{
        Error as SpiError,
        master::{Address, Command, DataMode},
    },
};
use log::{debug, info};
use tint_kernel::drivers::strip::{self, StripBuffer};
use tint_kernel::ui::Region;

use crate::board::{DMA_CHUNK_BYTES, DisplayHw, HEIGHT, WIDTH};

mod cmd {
    pub const SLPIN: u8 = 0x10;
    pub const SLPOUT: u8 = 0x11;
    pub const INVON: u8 = 0x21;
    pub const DISPOFF: u8 = 0x28;
    pub const DISPON: u8 = 0x29;
    pub const CASET: u8 = 0x2A;
    pub const PASET: u8 = 0x2B;
    pub const RAMWR: u8 = 0x2C;
    pub const MADCTL: u8 = 0x36;
    pub const COLMOD: u8 = 0x3A;
    pub const BRIGHTNESS: u8 = 0x51;
}

// MADCTL bits
const MADCTL_MY: u8 = 0x80;
const MADCTL_MV: u8 = 0x20;
const MADCTL_RGB: u8 = 0x00;

const COLMOD_RGB565: u8 = 0x55;

// QSPI opcodes
const OP_WRITE_REG: u16 = 0x02;
const OP_WRITE_PIXELS_QUAD: u16 = 0x32;
const PIXEL_ADDR: u32 = 0x00_3C_00;

const INIT_BRIGHTNESS: u8 = 0xD0;
const SLEEP_OUT_MS: u32 = 120;
const RESET_LOW_MS: u32 = 20;
const RESET_HIGH_MS: u32 = 150;

const CHUNK_PIXELS: usize = DMA_CHUNK_BYTES / 2;

#[derive(Debug)]
pub enum DisplayError {
    Spi(SpiError),
}

impl From<SpiError> for DisplayError {
    fn from(e: SpiError) -> Self {
        DisplayError::Spi(e)
    }
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::Spi(e) => write!(f, "spi: {:?}", e),
        }
    }
}

pub struct Rm67162 {
    hw: DisplayHw,
    delay: Delay,
    asleep: bool,
}

impl Rm67162 {
    pub fn new(hw: DisplayHw) -> Self {
        Self {
            hw,
            delay: Delay::new(),
            asleep: false,
        }
    }

    pub fn reset(&mut self) {
        self.hw.rst.set_low();
        self.delay.delay_millis(RESET_LOW_MS);
        self.hw.rst.set_high();
        self.delay.delay_millis(RESET_HIGH_MS);
    }

    pub fn begin(&mut self) -> Result<(), DisplayError> {
        self.hw.cs.set_high();
        self.reset();

        self.write_command(cmd::SLPOUT)?;
        self.delay.delay_millis(SLEEP_OUT_MS);

        self.write_reg(cmd::COLMOD, &[COLMOD_RGB565])?;
        // landscape, rotated
        self.write_reg(cmd::MADCTL, &[MADCTL_MY | MADCTL_MV | MADCTL_RGB])?;
        self.write_reg(cmd::BRIGHTNESS, &[INIT_BRIGHTNESS])?;

        self.write_command(cmd::DISPON)?;
        // true black on this panel needs inversion
        self.write_command(cmd::INVON)?;
        self.delay.delay_millis(20);

        self.asleep = false;
        info!("display: {}x{} initialized", WIDTH, HEIGHT);
        Ok(())
    }

    pub fn set_brightness(&mut self, level: u8) -> Result<(), DisplayError> {
        self.write_reg(cmd::BRIGHTNESS, &[level])
    }

    pub fn set_sleep(&mut self, sleep: bool) -> Result<(), DisplayError> {
        if sleep == self.asleep {
            return Ok(());
        }
        if sleep {
            self.write_command(cmd::DISPOFF)?;
            self.write_command(cmd::SLPIN)?;
        } else {
            self.write_command(cmd::SLPOUT)?;
            self.delay.delay_millis(SLEEP_OUT_MS);
            self.write_command(cmd::DISPON)?;
        }
        self.asleep = sleep;
        debug!("display: sleep={}", sleep);
        Ok(())
    }

    pub fn set_window(&mut self, x: u16, y: u16, w: u16, h: u16) -> Result<(), DisplayError> {
        let x1 = x + w - 1;
        let y1 = y + h - 1;

        let [xh, xl] = x.to_be_bytes();
        let [x1h, x1l] = x1.to_be_bytes();
        self.write_reg(cmd::CASET, &[xh, xl, x1h, x1l])?;

        let [yh, yl] = y.to_be_bytes();
        let [y1h, y1l] = y1.to_be_bytes();
        self.write_reg(cmd::PASET, &[yh, yl, y1h, y1l])?;

        self.write_command(cmd::RAMWR)
    }

    /// Stream RGB565 pixels into the current window.
    pub fn push_pixels(&mut self, pixels: &[u16]) -> Result<(), DisplayError> {
        self.hw.cs.set_low();
        let res = self.stream_pixels(pixels);
        self.hw.cs.set_high();
        res
    }

    // caller holds CS low for the whole stream
    fn stream_pixels(&mut self, pixels: &[u16]) -> Result<(), DisplayError> {
        let mut staging = [0u8; DMA_CHUNK_BYTES];

        for (i, chunk) in pixels.chunks(CHUNK_PIXELS).enumerate() {
            for (dst, px) in staging.chunks_exact_mut(2).zip(chunk) {
                dst.copy_from_slice(&px.to_be_bytes());
            }
            let bytes = &staging[..chunk.len() * 2];

            let (command, address) = if i == 0 {
                (
                    Command::_8Bit(OP_WRITE_PIXELS_QUAD, DataMode::SingleTwoDataLines),
                    Address::_24Bit(PIXEL_ADDR, DataMode::SingleTwoDataLines),
                )
            } else {
                (Command::None, Address::None)
            };
            self.hw
                .bus
                .half_duplex_write(DataMode::Quad, command, address, 0, bytes)?;
        }
        Ok(())
    }

    pub fn render_full<F>(&mut self, strip: &mut StripBuffer, draw: F) -> Result<(), DisplayError>
    where
        F: Fn(&mut StripBuffer),
    {
        strip::render_full(
            strip,
            |x, y, w, h, px| {
                self.set_window(x, y, w, h)?;
                self.push_pixels(px)
            },
            draw,
        )
    }

    pub fn render_region<F>(
        &mut self,
        strip: &mut StripBuffer,
        region: Region,
        draw: F,
    ) -> Result<(), DisplayError>
    where
        F: Fn(&mut StripBuffer),
    {
        strip::render_region(
            strip,
            region,
            |x, y, w, h, px| {
                self.set_window(x, y, w, h)?;
                self.push_pixels(px)
            },
            draw,
        )
    }

    fn write_command(&mut self, reg: u8) -> Result<(), DisplayError> {
        self.write_reg(reg, &[])
    }

    fn write_reg(&mut self, reg: u8, data: &[u8]) -> Result<(), DisplayError> {
        self.hw.cs.set_low();
        let res = self.hw.bus.half_duplex_write(
            DataMode::SingleTwoDataLines,
            Command::_8Bit(OP_WRITE_REG, DataMode::SingleTwoDataLines),
            Address::_24Bit(u32::from(reg) << 8, DataMode::SingleTwoDataLines),
            0,
            data,
        );
        self.hw.cs.set_high();
        res.map_err(DisplayError::from)
    }
}
