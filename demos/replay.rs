//! Feed a captured CP Plus session into an `InetBox` and print what it answers.
//!
//! Reads one command per line from stdin:
//!
//! ```text
//! BB.00.1F.00.1E...   a frame from the panel, as dotted hex
//! poll                the panel polls the iNet Box PID
//! wait <seconds>      advance the clock
//! room <celsius>      set the heater room temperature
//! water <celsius>     set the heater water temperature
//! status              print the decoded state
//! ```
//!
//! Run with `RUST_LOG=debug` to see the node's diagnostics.

use anyhow::{bail, Context, Result};
use std::io::BufRead;
use std::time::Duration;

use truma_inetbox::{Config, InetBox, Instant, LinNode, LIN_PID_TRUMA_INET_BOX};

fn parse_hex(line: &str) -> Result<Vec<u8>> {
    line.split('.')
        .map(|b| u8::from_str_radix(b, 16).with_context(|| format!("Invalid byte {:?}", b)))
        .collect()
}

fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(".")
}

fn arg<T: std::str::FromStr>(args: &mut std::str::SplitWhitespace) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(args.next().context("Missing argument")?.parse()?)
}

fn print_status(node: &InetBox) {
    let (heater, valid) = node.heater().status();
    if valid {
        println!(
            "heater: room {:?} (target {:?}) water {:?} (target {:?}) {:?}",
            heater.current_temp_room.to_celsius(),
            heater.targets.target_temp_room.to_celsius(),
            heater.current_temp_water.to_celsius(),
            heater.targets.target_temp_water.to_celsius(),
            heater.targets.heating_mode,
        );
    }
    let (timer, valid) = node.timer().status();
    if valid {
        println!("timer: {:?}", timer.schedule);
    }
    let (clock, valid) = node.clock().status();
    if valid {
        println!("clock: {:02}:{:02}:{:02}", clock.hour, clock.minute, clock.second);
    }
    let registry = node.registry();
    println!(
        "devices: {} heater {:?} panel {:?} aircon {}",
        registry.devices().len(),
        registry.heater(),
        registry.panel(),
        registry.has_aircon()
    );
}

fn run_command(node: &mut InetBox, now: &mut Instant, line: &str) -> Result<()> {
    let mut args = line.split_whitespace();
    match args.next() {
        None => {}
        Some("poll") => {
            let answer = node
                .handle_poll(LIN_PID_TRUMA_INET_BOX, *now)
                .context("No poll answer")?;
            println!("<- {}", to_hex(&answer));
        }
        Some("wait") => {
            *now = *now + Duration::from_secs_f32(arg(&mut args)?);
        }
        Some("room") => node.heater_room(arg(&mut args)?, None)?,
        Some("water") => node.heater_water(arg(&mut args)?)?,
        Some("status") => print_status(node),
        Some(frame) if frame.contains('.') => {
            match node.handle_message(&parse_hex(frame)?, *now) {
                Some(response) => println!("<- {}", to_hex(&response)),
                None => println!("<- (no response)"),
            }
        }
        Some(other) => bail!("Unknown command {:?}", other),
    }
    node.tick(*now);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let mut node = InetBox::new(Config::default());
    let mut now = Instant::from_millis(0);

    for line in std::io::stdin().lock().lines() {
        let line = line?;
        if let Err(e) = run_command(&mut node, &mut now, line.trim()) {
            eprintln!("{}: {:#}", line, e);
        }
    }
    Ok(())
}
