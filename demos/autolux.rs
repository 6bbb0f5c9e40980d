// Prints auto-ranged lux readings from a VEML7700 on a Linux I2C bus.
use std::time::Instant;

use linux_embedded_hal as hal;

use hal::{Delay, I2cdev};
use veml7700::Veml7700;

fn main() {
    let dev = I2cdev::new("/dev/i2c-1").unwrap();
    let start = Instant::now();
    let mut veml7700 = Veml7700::new(dev, Delay, move || start.elapsed()).unwrap();

    loop {
        match veml7700.autolux() {
            Ok(lux) => println!(
                "Ambient light: {lux:.2} lx ({:?}, {:?})",
                veml7700.gain(),
                veml7700.integration_time()
            ),
            Err(e) => println!("Error reading sensor: {e:?}"),
        }

        veml7700.wait_autolux(1.0);
    }
}
