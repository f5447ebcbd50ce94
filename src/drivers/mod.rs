// Chip-level drivers that need esp-hal.
//
// Board-independent drivers (trackball, strip buffer, input translation)
// live in tint-kernel so they can be tested on the host.

pub mod rm67162;
