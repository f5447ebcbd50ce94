// tint-os entry point and main loop
//
// Boot sequence: logger -> hardware -> display -> trackball -> first frame
// Main loop (every 5ms): sample trackball once -> keypad poll when the
// 20ms input period is due -> grid -> power tick -> redraw -> delay
//
// The trackball is read exactly once per iteration. Reads between input
// ticks are merged by the keypad poller, so counts cleared by a read are
// never dropped. Light sleep happens inside the power tick and blocks the
// loop until the trackball moves.

#![no_std]
#![no_main]

use esp_backtrace as _;
use esp_hal::clock::CpuClock;
use esp_hal::delay::Delay;
use log::{error, info, warn};
use static_cell::StaticCell;

use tint_kernel::ui::color_grid;
use tint_kernel::{
    AppContext, ColorGrid, GridAction, InputConfig, KeypadIndev, KeypadPoller, PowerConfig,
    PowerController, Redraw, Rgbw, StripBuffer, Trackball,
};
use tint_os::board::{self, Board, TrackballBus};
use tint_os::drivers::rm67162::{DisplayError, Rm67162};
use tint_os::platform::EspPlatform;

esp_bootloader_esp_idf::esp_app_desc!();

const LOOP_DELAY_MS: u32 = 5;

static STRIP: StaticCell<StripBuffer> = StaticCell::new();

fn halt() -> ! {
    let delay = Delay::new();
    loop {
        delay.delay_millis(100);
    }
}

fn push_led(trackball: &mut Trackball<TrackballBus>, color: Rgbw) {
    if !trackball.is_present() {
        return;
    }
    if let Err(e) = trackball.set_rgbw(color) {
        warn!("trackball: LED write failed: {}", e);
    }
}

fn draw_ui(grid: &ColorGrid, strip: &mut StripBuffer) {
    let Ok(()) = grid.draw(strip);
}

fn report(res: Result<(), DisplayError>) {
    if let Err(e) = res {
        warn!("display: flush failed: {}", e);
    }
}

#[esp_hal::main]
fn main() -> ! {
    esp_println::logger::init_logger_from_env();
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    info!("booting...");

    let Board { display, i2c, mut rtc } = match Board::init(peripherals) {
        Ok(board) => board,
        Err(e) => {
            error!("board init failed: {}", e);
            halt();
        }
    };
    let delay = Delay::new();

    let mut display = Rm67162::new(display);
    if let Err(e) = display.begin() {
        error!("display init failed: {}", e);
        halt();
    }
    info!("hardware initialized.");

    let mut ctx = AppContext::new();
    let mut trackball = Trackball::new(i2c);
    match trackball.probe() {
        Ok(()) => {
            push_led(&mut trackball, ctx.saved_led());
            info!("trackball ready");
        }
        Err(e) => warn!("trackball not found ({}), running without input", e),
    }

    let strip = STRIP.init_with(StripBuffer::new);

    let mut grid = ColorGrid::new();
    let mut keypad = KeypadIndev::new();
    let mut poller = KeypadPoller::new(InputConfig::DEFAULT);
    let mut power = PowerController::new(PowerConfig::DEFAULT, board::uptime_ms());
    power.apply_brightness(&mut EspPlatform::new(&mut display, &mut trackball, &mut rtc));

    report(display.render_full(strip, |s| draw_ui(&grid, s)));
    info!("ui ready.");

    loop {
        let now = board::uptime_ms();
        let sample = trackball.sample();

        if let Some(event) = poller.feed(now, &sample, &mut ctx.activity)
            && let Some(edge) = keypad.feed(event)
            && let Some(GridAction::Clicked(idx)) = grid.on_edge(edge, &mut ctx)
            && let Some(color) = color_grid::color_for(idx)
        {
            ctx.set_led_color(color);
            push_led(&mut trackball, color);
            if color.is_off() {
                info!("trackball: OFF");
            } else {
                info!("trackball: {}", color);
            }
        }

        // without a trackball nothing can wake the panel again
        if trackball.is_present() {
            let mut platform = EspPlatform::new(&mut display, &mut trackball, &mut rtc);
            power.tick(board::uptime_ms(), &mut ctx, &mut platform);
        }

        match ctx.take_redraw() {
            Redraw::None => {}
            Redraw::Full => report(display.render_full(strip, |s| draw_ui(&grid, s))),
            Redraw::Partial(region) => {
                report(display.render_region(strip, region, |s| draw_ui(&grid, s)))
            }
        }

        delay.delay_millis(LOOP_DELAY_MS);
    }
}
