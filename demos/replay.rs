//! Example: replay a host command script against virtual steppers.
//!
//! This example demonstrates how to:
//! - Configure steppers and run init commands from TOML
//! - Feed wire-format command lines through the dispatcher
//! - Drive step events with the delay-based software timer
//!
//! Run with: `cargo run --example replay --features std [config.toml] [script.txt]`
//!
//! Script lines are wire commands. `#` starts a comment and the line `run`
//! delivers every pending step event before continuing.

use std::time::{Duration, Instant};

use virtual_stepper::{
    config::parse_config, load_config, Response, SoftTimer, StepperSystem, SystemConfig,
};

/// 20 MHz step clock.
const NS_PER_TICK: u32 = 50;

/// Upper bound on events delivered by a single `run`.
const MAX_EVENTS: usize = 100_000;

static STEPPERS: StepperSystem<8, 64> = StepperSystem::new();

/// Delay backed by the host scheduler.
struct StdDelay;

impl embedded_hal::delay::DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns as u64));
    }
}

const DEFAULT_CONFIG: &str = r#"
init = [
    "virtual_reset_step_clock oid=0 clock=0",
    "virtual_reset_step_clock oid=1 clock=0",
]

[[steppers]]
oid = 0
name = "servo_x"

[[steppers]]
oid = 1
name = "servo_y"
position = 1000
"#;

const DEFAULT_SCRIPT: &str = "\
# servo_x: accelerate, cruise, decelerate
virtual_set_next_step_dir oid=0 dir=1
virtual_queue_step oid=0 interval=40000 count=10 add=-2000
virtual_queue_step oid=0 interval=20000 count=20 add=0
virtual_queue_step oid=0 interval=20000 count=10 add=2000
# servo_y: back off 25 steps
virtual_set_next_step_dir oid=1 dir=0
virtual_queue_step oid=1 interval=30000 count=25 add=0
run
virtual_stepper_get_position oid=0
virtual_stepper_get_position oid=1
# unknown oid: shuts everything down
virtual_stepper_stop oid=5
virtual_stepper_get_position oid=0
clear_shutdown
virtual_stepper_get_position oid=0
";

fn print_reply(reply: Option<Response>) {
    if let Some(reply) = reply {
        println!("  <- {}", reply);
    }
}

fn print_steppers(config: &SystemConfig) {
    println!("Steppers ({} configured):", STEPPERS.stepper_count());
    for oid in config.oids() {
        let name = config.stepper(oid).map(|s| s.name.as_str()).unwrap_or("");
        let status = STEPPERS.inspect(oid, |s| (s.state().name(), s.position().reported()));
        if let Some((state, pos)) = status {
            println!("  - oid {} \"{}\" {} at {}", oid, name, state, pos);
        }
    }
}

fn main() -> virtual_stepper::Result<()> {
    println!("=== Virtual Stepper Replay ===\n");

    let mut args = std::env::args().skip(1);
    let config: SystemConfig = match args.next() {
        Some(path) => load_config(path)?,
        None => parse_config(DEFAULT_CONFIG)?,
    };
    let script = match args.next() {
        Some(path) => std::fs::read_to_string(&path).unwrap_or_else(|e| {
            eprintln!("cannot read {}: {}", path, e);
            std::process::exit(1);
        }),
        None => DEFAULT_SCRIPT.to_owned(),
    };

    let mut timer: SoftTimer<_, 8> = SoftTimer::new(StdDelay, NS_PER_TICK);
    STEPPERS.configure(&mut timer, &config)?;

    print_steppers(&config);

    for line in script.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        if line == "run" {
            let started = Instant::now();
            let start_tick = timer.now();
            let delivered = timer.run_until_idle(&STEPPERS, MAX_EVENTS);
            println!(
                "  .. {} step events over {} ticks ({:?} wall clock)",
                delivered,
                timer.now().wrapping_sub(start_tick),
                started.elapsed()
            );
            continue;
        }

        println!("  -> {}", line);
        match STEPPERS.dispatch_line(&mut timer, line) {
            Ok(reply) => print_reply(reply),
            Err(e) => {
                println!("  !! {}", e);
                print_reply(Response::for_error(&e));
            }
        }
    }

    println!();
    print_steppers(&config);
    Ok(())
}
