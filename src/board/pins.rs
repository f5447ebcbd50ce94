//! GPIO |     Function    |      Notes
//! -----+-----------------+----------------------------------
//!  5   | QSPI SIO3       | HD
//!  6   | LCD CS          | Manual chip select, held across a pixel stream
//!  7   | QSPI SIO1       | MISO when single-line
//! 17   | LCD RST         | Reset (active low)
//! 18   | QSPI SIO0       | MOSI when single-line
//! 39   | I2C SCL         | Trackball
//! 40   | I2C SDA         | Trackball
//! 47   | QSPI SCK        |
//! 48   | QSPI SIO2       | WP

// ----- AMOLED (RM67162, QSPI) -----
pub const LCD_CS: u8 = 6;
pub const LCD_RST: u8 = 17;
pub const LCD_SCK: u8 = 47;
pub const LCD_D0: u8 = 18;
pub const LCD_D1: u8 = 7;
pub const LCD_D2: u8 = 48;
pub const LCD_D3: u8 = 5;

// ----- Trackball (I2C0) -----
pub const I2C_SDA: u8 = 40;
pub const I2C_SCL: u8 = 39;
