//! Integration tests for virtual-stepper.
//!
//! These drive the stepper system through its command handlers and deliver timer
//! events with the software timer, as the firmware scheduler would.

use embedded_hal::delay::DelayNs;
use embedded_hal_mock::eh1::delay::NoopDelay;

use virtual_stepper::config::parse_config;
use virtual_stepper::timer::SoftTimer;
use virtual_stepper::{
    Command, Direction, Error, Position, Response, ShutdownReason, StepperState, StepperSystem,
    TimerAction,
};

type System = StepperSystem<4, 16>;
type Timer = SoftTimer<NoopDelay, 4>;

fn setup(oids: &[u8]) -> (System, Timer) {
    let system = System::new();
    let mut timer = SoftTimer::new(NoopDelay::new(), 0);
    for &oid in oids {
        system.config_stepper(&mut timer, oid).expect("configure stepper");
    }
    (system, timer)
}

/// Deliver every pending event, returning (oid, waketime, position after step).
fn run(system: &System, timer: &mut Timer) -> Vec<(u8, u32, i32)> {
    let mut events = Vec::new();
    while let Some(event) = timer.run_once(system) {
        let pos = system.inspect(event.oid, |s| s.position().reported()).unwrap();
        events.push((event.oid, event.waketime, pos));
        assert!(events.len() < 100_000, "runaway timer");
    }
    events
}

fn assert_idle(system: &System, timer: &Timer, oid: u8) {
    assert_eq!(system.inspect(oid, |s| s.state()), Some(StepperState::Idle));
    assert_eq!(system.queued_moves(oid), Some(0));
    assert_eq!(timer.alarm(oid), None);
}

// =============================================================================
// Reference scenarios
// =============================================================================

#[test]
fn scenario_a_single_constant_move() {
    let (system, mut timer) = setup(&[0]);
    system.set_next_direction(&mut timer, 0, Direction::Forward).unwrap();
    system.queue_move(&mut timer, 0, 1000, 5, 0).unwrap();
    assert_eq!(timer.alarm(0), Some(1000));

    let events = run(&system, &mut timer);
    let times: Vec<u32> = events.iter().map(|e| e.1).collect();
    assert_eq!(times, vec![1000, 2000, 3000, 4000, 5000]);
    assert_eq!(events.last().unwrap().2, 5);

    assert_idle(&system, &timer, 0);
    assert_eq!(system.pool_available(), 16);
}

#[test]
fn scenario_b_reload_with_ramp_and_direction_change() {
    let (system, mut timer) = setup(&[0]);
    system.set_next_direction(&mut timer, 0, Direction::Reverse).unwrap();
    system.queue_move(&mut timer, 0, 1000, 1, 0).unwrap();
    system.set_next_direction(&mut timer, 0, Direction::Forward).unwrap();
    system.queue_move(&mut timer, 0, 2000, 3, 100).unwrap();
    assert_eq!(system.queued_moves(0), Some(1));

    let events = run(&system, &mut timer);
    assert_eq!(
        events,
        vec![(0, 1000, -1), (0, 3000, 0), (0, 5100, 1), (0, 7300, 2)]
    );

    let gaps: Vec<u32> = events.windows(2).map(|w| w[1].1 - w[0].1).collect();
    assert_eq!(gaps, vec![2000, 2100, 2200]);
    assert_idle(&system, &timer, 0);
}

#[test]
fn scenario_c_zero_count_faults_without_touching_queue() {
    let (system, mut timer) = setup(&[0]);
    system.reset_clock(&mut timer, 0, 250).unwrap();

    let result = system.queue_move(&mut timer, 0, 500, 0, 0);
    assert_eq!(result, Err(Error::Shutdown(ShutdownReason::InvalidCount)));

    assert_eq!(system.inspect(0, |s| s.position()), Some(Position::ZERO));
    assert_eq!(system.queued_moves(0), Some(0));
    assert_eq!(system.pool_available(), 16);
    assert!(timer.is_idle());
    assert_eq!(system.shutdown_reason(), Some(ShutdownReason::InvalidCount));
}

// =============================================================================
// Handler contracts
// =============================================================================

#[test]
fn direction_change_only_affects_later_moves() {
    let (system, mut timer) = setup(&[0]);
    system.set_next_direction(&mut timer, 0, Direction::Forward).unwrap();
    system.queue_move(&mut timer, 0, 100, 4, 0).unwrap();

    // Two steps into the active move, flip direction and queue another move
    timer.run_once(&system).unwrap();
    timer.run_once(&system).unwrap();
    system.set_next_direction(&mut timer, 0, Direction::Reverse).unwrap();
    system.queue_move(&mut timer, 0, 100, 3, 0).unwrap();

    let events = run(&system, &mut timer);
    let positions: Vec<i32> = events.iter().map(|e| e.2).collect();
    assert_eq!(positions, vec![3, 4, 3, 2, 1]);
}

#[test]
fn reset_clock_only_while_idle() {
    let (system, mut timer) = setup(&[0]);
    system.reset_clock(&mut timer, 0, 10_000).unwrap();
    assert_eq!(system.inspect(0, |s| s.wake_time()), Some(10_000));

    system.queue_move(&mut timer, 0, 500, 2, 0).unwrap();
    assert_eq!(timer.alarm(0), Some(10_500));

    timer.run_once(&system).unwrap();
    let result = system.reset_clock(&mut timer, 0, 0);
    assert_eq!(result, Err(Error::Shutdown(ShutdownReason::ResetWhileActive)));

    // Shutdown stopped the stepper but kept the step already taken
    assert!(timer.is_idle());
    assert_eq!(system.inspect(0, |s| s.position().reported()), Some(-1));
}

#[test]
fn stop_is_idempotent() {
    let (system, mut timer) = setup(&[1]);
    system.queue_move(&mut timer, 1, 100, 10, 0).unwrap();
    system.queue_move(&mut timer, 1, 100, 10, 0).unwrap();
    system.queue_move(&mut timer, 1, 100, 10, 0).unwrap();
    timer.run_once(&system).unwrap();

    system.stop(&mut timer, 1).unwrap();
    assert_idle(&system, &timer, 1);
    assert_eq!(system.pool_available(), 16);
    assert_eq!(system.inspect(1, |s| s.position().reported()), Some(-1));

    system.stop(&mut timer, 1).unwrap();
    assert_idle(&system, &timer, 1);
    assert_eq!(system.inspect(1, |s| s.wake_time()), Some(0));
    assert_eq!(system.shutdown_reason(), None);
}

#[test]
fn stopped_stepper_accepts_new_moves() {
    let (system, mut timer) = setup(&[0]);
    system.queue_move(&mut timer, 0, 100, 10, 0).unwrap();
    system.stop(&mut timer, 0).unwrap();

    system.queue_move(&mut timer, 0, 300, 2, 0).unwrap();
    // Stop zeroed the wake time, so the new move is timed from tick 0
    assert_eq!(timer.alarm(0), Some(300));
}

#[test]
fn pool_overflow_shuts_down() {
    let system: StepperSystem<1, 2> = StepperSystem::new();
    let mut timer: SoftTimer<NoopDelay, 1> = SoftTimer::new(NoopDelay::new(), 0);
    system.config_stepper(&mut timer, 0).unwrap();

    // One loaded plus two queued fills a two-slot pool
    for _ in 0..3 {
        system.queue_move(&mut timer, 0, 100, 1, 0).unwrap();
    }
    assert_eq!(
        system.queue_move(&mut timer, 0, 100, 1, 0),
        Err(Error::Shutdown(ShutdownReason::MoveQueueOverflow))
    );
    assert_eq!(system.pool_available(), 2);
    assert!(timer.is_idle());
}

#[test]
fn zero_count_on_unknown_oid_reports_oid() {
    let (system, mut timer) = setup(&[0]);
    let result = system.dispatch_line(&mut timer, "virtual_queue_step oid=3 interval=500 count=0 add=0");
    assert_eq!(result, Err(Error::Shutdown(ShutdownReason::InvalidOid)));
    assert_eq!(system.shutdown_reason(), Some(ShutdownReason::InvalidOid));
}

#[test]
fn config_twice_is_fatal() {
    let (system, mut timer) = setup(&[2]);
    assert_eq!(
        system.config_stepper(&mut timer, 2),
        Err(Error::Shutdown(ShutdownReason::OidAssign))
    );
    assert!(system.verify(2));
    assert!(!system.verify(0));
}

// =============================================================================
// Shutdown
// =============================================================================

#[test]
fn shutdown_stops_every_axis() {
    let (system, mut timer) = setup(&[0, 1, 3]);
    system.queue_move(&mut timer, 0, 100, 50, 0).unwrap();
    system.queue_move(&mut timer, 1, 150, 50, 0).unwrap();
    system.queue_move(&mut timer, 1, 150, 50, 0).unwrap();
    system.queue_move(&mut timer, 3, 200, 50, 0).unwrap();
    timer.run_until_idle(&system, 5);

    // A bad command on one axis halts all of them
    let result = system.get_position(&mut timer, 2);
    assert_eq!(result, Err(Error::Shutdown(ShutdownReason::InvalidOid)));

    assert!(timer.is_idle());
    for oid in [0, 1, 3] {
        assert_idle(&system, &timer, oid);
    }
    assert_eq!(system.pool_available(), 16);
    assert_eq!(timer.run_once(&system), None);

    assert_eq!(
        system.get_position(&mut timer, 0),
        Err(Error::IsShutdown(ShutdownReason::InvalidOid))
    );
    system.clear_shutdown();
    assert!(system.get_position(&mut timer, 0).is_ok());
}

#[test]
fn stray_event_after_shutdown_is_ignored() {
    let (system, mut timer) = setup(&[0]);
    system.queue_move(&mut timer, 0, 100, 5, 0).unwrap();
    assert_eq!(timer.alarm(0), Some(100));
    system.shutdown(&mut timer, ShutdownReason::Requested);

    // An alarm that fired anyway must not move the stepper
    let action = critical_section::with(|cs| system.on_timer(cs, 0));
    assert_eq!(action, TimerAction::Done);
    assert_eq!(system.inspect(0, |s| s.position()), Some(Position::ZERO));
}

// =============================================================================
// Wire commands
// =============================================================================

#[test]
fn dispatch_wire_lines() {
    let (system, mut timer) = setup(&[]);
    let script = [
        "config_virtual_stepper oid=1",
        "virtual_reset_step_clock oid=1 clock=0",
        "virtual_set_next_step_dir oid=1 dir=0",
        "virtual_queue_step oid=1 interval=1000 count=3 add=0",
    ];
    for line in script {
        assert_eq!(system.dispatch_line(&mut timer, line).unwrap(), None);
    }
    run(&system, &mut timer);

    let reply = system
        .dispatch_line(&mut timer, "virtual_stepper_get_position oid=1")
        .unwrap()
        .unwrap();
    assert_eq!(reply.to_string(), "stepper_position oid=1 pos=-3");
}

#[test]
fn dispatch_emergency_stop_and_recover() {
    let (system, mut timer) = setup(&[0]);
    system
        .dispatch(&mut timer, Command::QueueStep { oid: 0, interval: 10, count: 100, add: 0 })
        .unwrap();

    let reply = system.dispatch(&mut timer, Command::EmergencyStop).unwrap();
    assert_eq!(reply, Some(Response::Shutdown(ShutdownReason::Requested)));
    assert!(timer.is_idle());

    let err = system
        .dispatch(&mut timer, Command::Stop { oid: 0 })
        .unwrap_err();
    assert_eq!(
        Response::for_error(&err),
        Some(Response::Shutdown(ShutdownReason::Requested))
    );

    system.dispatch(&mut timer, Command::ClearShutdown).unwrap();
    system.dispatch(&mut timer, Command::Stop { oid: 0 }).unwrap();
}

#[test]
fn parse_error_is_not_fatal() {
    let (system, mut timer) = setup(&[0]);
    let result = system.dispatch_line(&mut timer, "virtual_queue_step oid=0 interval=10 count=1");
    assert!(matches!(result, Err(Error::Parse(_))));
    assert_eq!(system.shutdown_reason(), None);
}

// =============================================================================
// Configuration
// =============================================================================

const CONFIG: &str = r#"
init = [
    "virtual_reset_step_clock oid=0 clock=0",
    "virtual_set_next_step_dir oid=3 dir=1",
]

[[steppers]]
oid = 0
name = "servo_x"

[[steppers]]
oid = 3
name = "servo_y"
position = 4294967290
"#;

#[test]
fn configure_from_toml() {
    let config = parse_config(CONFIG).expect("config should parse");
    let system = System::new();
    let mut timer: Timer = SoftTimer::new(NoopDelay::new(), 0);
    system.configure(&mut timer, &config).unwrap();

    assert!(system.verify(0));
    assert!(system.verify(3));
    assert!(!system.verify(1));
    assert_eq!(system.stepper_count(), 2);
    assert_eq!(config.oids().collect::<Vec<_>>(), vec![0, 3]);
    assert_eq!(system.inspect(3, |s| s.state().name()), Some("Idle"));

    // Init commands ran: oid 3 now steps forward, through the wrap point
    system.queue_move(&mut timer, 3, 100, 8, 0).unwrap();
    run(&system, &mut timer);
    let report = system.get_position(&mut timer, 3).unwrap();
    assert_eq!(report.position.raw(), 2);
    assert_eq!(report.pos(), 2);
}

#[test]
fn configure_rejects_oid_past_capacity() {
    let config = parse_config("[[steppers]]\noid = 9\n").unwrap();
    let system = System::new();
    let mut timer: Timer = SoftTimer::new(NoopDelay::new(), 0);
    let result = system.configure(&mut timer, &config);
    assert!(matches!(result, Err(Error::Config(_))));
    assert!(!system.verify(9));
    assert_eq!(system.shutdown_reason(), None);
}

// =============================================================================
// Software timer timing
// =============================================================================

struct TickDelay {
    total_ns: u64,
}

impl DelayNs for TickDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }
}

#[test]
fn soft_timer_sleeps_until_each_wake_time() {
    let system = System::new();
    let mut timer: SoftTimer<TickDelay, 4> = SoftTimer::new(TickDelay { total_ns: 0 }, 50);
    system.config_stepper(&mut timer, 0).unwrap();
    system.queue_move(&mut timer, 0, 1000, 5, 0).unwrap();

    assert_eq!(timer.run_until_idle(&system, 100), 5);
    assert_eq!(timer.now(), 5000);
    assert_eq!(timer.release().total_ns, 5000 * 50);
}

#[test]
fn soft_timer_interleaves_axes_by_wake_time() {
    let (system, mut timer) = setup(&[0, 1]);
    system.queue_move(&mut timer, 0, 300, 3, 0).unwrap();
    system.queue_move(&mut timer, 1, 200, 3, 0).unwrap();

    let order: Vec<(u8, u32)> = run(&system, &mut timer)
        .into_iter()
        .map(|(oid, t, _)| (oid, t))
        .collect();
    assert_eq!(
        order,
        vec![(1, 200), (0, 300), (1, 400), (0, 600), (1, 600), (0, 900)]
    );
}
