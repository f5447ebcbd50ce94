//! Waveshare ESP32-S3 AMOLED 1.91 Board Support Package (BSP)
//!
//! Maps the physical hardware to named subsystems so the rest of the
//! firmware never needs GPIO numbers or bus settings. Pin map in [`pins`].

pub mod pins;

use core::fmt;

use esp_hal::{
    Blocking,
    dma::{DmaBufError, DmaRxBuf, DmaTxBuf},
    dma_buffers,
    gpio::{Level, Output, OutputConfig},
    i2c::master::{self as i2c, I2c},
    peripherals::Peripherals,
    rtc_cntl::Rtc,
    spi::{
        self,
        master::{Spi, SpiDmaBus},
    },
    time::{Instant, Rate},
};
use log::info;

pub use tint_kernel::drivers::strip::{HEIGHT, WIDTH};

pub const QSPI_FREQ_MHZ: u32 = 80;
pub const I2C_FREQ_KHZ: u32 = 400;

/// Bytes per DMA transfer; pixel streams are split into chunks of this.
pub const DMA_CHUNK_BYTES: usize = 4096;

// Type Aliases
pub type LcdBus = SpiDmaBus<'static, Blocking>;
pub type TrackballBus = I2c<'static, Blocking>;

#[derive(Debug)]
pub enum BoardError {
    Spi(spi::master::ConfigError),
    I2c(i2c::ConfigError),
    Dma(DmaBufError),
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::Spi(e) => write!(f, "qspi config: {:?}", e),
            BoardError::I2c(e) => write!(f, "i2c config: {:?}", e),
            BoardError::Dma(e) => write!(f, "dma buffers: {:?}", e),
        }
    }
}

// Hardware Bundles
/// Display subsystem hardware: QSPI bus plus the manually driven lines.
pub struct DisplayHw {
    pub bus: LcdBus,
    pub cs: Output<'static>,
    pub rst: Output<'static>,
}

/// Complete board hardware, ready for driver initialization.
pub struct Board {
    pub display: DisplayHw,
    pub i2c: TrackballBus,
    pub rtc: Rtc<'static>,
}

impl Board {
    pub fn init(p: Peripherals) -> Result<Self, BoardError> {
        info!(
            "board: lcd cs={} rst={} sck={} sio={}/{}/{}/{}, i2c sda={} scl={}",
            pins::LCD_CS,
            pins::LCD_RST,
            pins::LCD_SCK,
            pins::LCD_D0,
            pins::LCD_D1,
            pins::LCD_D2,
            pins::LCD_D3,
            pins::I2C_SDA,
            pins::I2C_SCL
        );

        let i2c = I2c::new(p.I2C0, i2c_config())
            .map_err(BoardError::I2c)?
            .with_sda(p.GPIO40)
            .with_scl(p.GPIO39);

        // CS idles high, the driver pulls it low per transaction
        let cs = Output::new(p.GPIO6, Level::High, OutputConfig::default());
        let rst = Output::new(p.GPIO17, Level::High, OutputConfig::default());

        let (rx_buffer, rx_descriptors, tx_buffer, tx_descriptors) =
            dma_buffers!(32, DMA_CHUNK_BYTES);
        let dma_rx = DmaRxBuf::new(rx_descriptors, rx_buffer).map_err(BoardError::Dma)?;
        let dma_tx = DmaTxBuf::new(tx_descriptors, tx_buffer).map_err(BoardError::Dma)?;

        let spi_cfg = spi::master::Config::default()
            .with_frequency(Rate::from_mhz(QSPI_FREQ_MHZ))
            .with_mode(spi::Mode::_0);
        let bus = Spi::new(p.SPI2, spi_cfg)
            .map_err(BoardError::Spi)?
            .with_sck(p.GPIO47)
            .with_sio0(p.GPIO18)
            .with_sio1(p.GPIO7)
            .with_sio2(p.GPIO48)
            .with_sio3(p.GPIO5)
            .with_dma(p.DMA_CH0)
            .with_buffers(dma_rx, dma_tx);

        let rtc = Rtc::new(p.LPWR);

        Ok(Board {
            display: DisplayHw { bus, cs, rst },
            i2c,
            rtc,
        })
    }
}

/// Trackball bus settings, re-applied after light sleep.
pub fn i2c_config() -> i2c::Config {
    i2c::Config::default().with_frequency(Rate::from_khz(I2C_FREQ_KHZ))
}

/// Milliseconds since boot.
#[inline]
pub fn uptime_ms() -> u64 {
    Instant::now().duration_since_epoch().as_millis()
}
