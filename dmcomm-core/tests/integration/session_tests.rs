//! Command-line sessions through the front-end and controller

use dmcomm_core::codec::Codec;
use dmcomm_core::frontend::{Activity, BUILD_INFO};
use dmcomm_core::timing::{TIMING_COLOR, TIMING_V, TIMING_Y};
use dmcomm_core::{Controller, ControllerError, DigiRom};
use dmcomm_protocol::{parse_command, Command, Dialect};

use crate::mock_line::{toy_classic, toy_color, MockLine, SimController, SimFrontEnd, WaveBuilder};

/// Poll until the program runs, letting time pass while it waits
fn run_until_executed(line: &MockLine, fe: &mut SimFrontEnd, ctrl: &mut SimController) -> Activity {
    for _ in 0..10_000 {
        match fe.poll(ctrl).expect("sim serial never fails") {
            Activity::Waiting | Activity::Idle => line.advance_ms(10),
            Activity::Command { .. } => {}
            executed @ Activity::Executed { .. } => return executed,
        }
    }
    panic!("program never executed");
}

fn rom_text(fe: &SimFrontEnd) -> Option<String> {
    fe.rom().map(|r| r.to_string())
}

#[test]
fn initiator_exchange_prints_sent_and_received_words() {
    let line = MockLine::new();
    let mut ctrl = line.controller();
    let mut fe = line.frontend();
    line.queue_reply(toy_classic(&TIMING_V, 0xF30C));
    line.queue_reply(toy_classic(&TIMING_V, 0xEE11));

    line.type_line("V1-FC03-ED12\n");
    assert_eq!(fe.poll(&mut ctrl), Ok(Activity::Command { accepted: true }));
    assert_eq!(
        line.take_output(),
        "got 12 bytes: V1-FC03-ED12 -> V1-FC03-ED12 (new DigiROM)\n"
    );

    // Go-first delay holds the first run back
    assert_eq!(fe.poll(&mut ctrl), Ok(Activity::Waiting));

    let start = line.now_us();
    assert_eq!(
        run_until_executed(&line, &mut fe, &mut ctrl),
        Activity::Executed { received: true }
    );
    assert!(line.now_us() - start >= 1_000_000);
    assert_eq!(line.take_output(), "s:FC03 r:F30C s:ED12 r:EE11\n");

    // Next run waits for the repeat delay; with no toy left it times out
    assert_eq!(fe.poll(&mut ctrl), Ok(Activity::Waiting));
    let start = line.now_us();
    run_until_executed(&line, &mut fe, &mut ctrl);
    assert!(line.now_us() - start >= 5_000_000);
    assert_eq!(line.take_output(), "s:FC03 t\n");
    assert_eq!(rom_text(&fe).as_deref(), Some("V1-FC03-ED12"));
}

#[test]
fn listen_with_no_signal_pauses() {
    let line = MockLine::new();
    let mut ctrl = line.controller();
    let mut fe = line.frontend();

    line.type_line("X0\n");
    assert_eq!(fe.poll(&mut ctrl), Ok(Activity::Command { accepted: true }));
    line.take_output();

    let start = line.now_us();
    assert_eq!(
        fe.poll(&mut ctrl),
        Ok(Activity::Executed { received: false })
    );
    assert!(line.now_us() - start >= 5_000_000);
    assert_eq!(line.take_output(), "(paused)\n");
    assert!(fe.rom().is_none());
    assert_eq!(fe.poll(&mut ctrl), Ok(Activity::Idle));
}

#[test]
fn listen_keeps_words_when_y_goes_quiet() {
    let line = MockLine::new();
    let mut ctrl = line.controller();
    let mut fe = line.frontend();

    line.type_line("Y0\n");
    fe.poll(&mut ctrl).unwrap();
    line.take_output();
    line.schedule_in(20_000, toy_classic(&TIMING_Y, 0x1234));

    assert_eq!(
        fe.poll(&mut ctrl),
        Ok(Activity::Executed { received: true })
    );
    assert_eq!(line.take_output(), "r:1234 t\n");
    assert!(fe.rom().is_some());
}

#[test]
fn malformed_line_leaves_program_alone() {
    let line = MockLine::new();
    let mut ctrl = line.controller();
    let mut fe = line.frontend();

    line.type_line("V2-1234\n");
    fe.poll(&mut ctrl).unwrap();
    line.take_output();

    line.type_line("Q9-ZZZZ\n");
    assert_eq!(fe.poll(&mut ctrl), Ok(Activity::Command { accepted: false }));
    assert_eq!(
        line.take_output(),
        "got 7 bytes: Q9-ZZZZ -> unknown op 'Q' (paused)\n"
    );
    assert_eq!(rom_text(&fe).as_deref(), Some("V2-1234"));

    line.type_line("V3\n");
    fe.poll(&mut ctrl).unwrap();
    assert!(line.take_output().ends_with("bad turn '3' (paused)\n"));
    assert_eq!(rom_text(&fe).as_deref(), Some("V2-1234"));
}

#[test]
fn responder_answers_then_times_out() {
    let line = MockLine::new();
    let mut ctrl = line.controller();
    let mut fe = line.frontend();

    line.type_line("v2-1234\n");
    fe.poll(&mut ctrl).unwrap();
    line.take_output();
    line.schedule_in(30_000, toy_classic(&TIMING_V, 0xABCD));

    assert_eq!(
        fe.poll(&mut ctrl),
        Ok(Activity::Executed { received: true })
    );
    assert_eq!(line.take_output(), "r:ABCD s:1234 t\n");
}

#[test]
fn responder_stays_quiet_after_last_word() {
    let line = MockLine::new();
    let mut ctrl = line.controller();
    let mut rom = match parse_command(b"V2-1234") {
        Ok(Command::Program(p)) => DigiRom::from_command(&p),
        _ => unreachable!(),
    };
    line.schedule_in(10_000, toy_classic(&TIMING_V, 0xAAAA));
    line.queue_reply(toy_classic(&TIMING_V, 0xBBBB));

    let start = line.now_us();
    assert_eq!(ctrl.execute(&mut rom, 5000), Ok(()));
    let mut out = String::new();
    rom.print_result(&mut out).unwrap();
    assert_eq!(out, "r:AAAA s:1234 r:BBBB");
    // Program exhausted after a receive: post-receive delay before returning
    assert!(line.now_us() - start >= 300_000);
}

#[test]
fn color_exchange() {
    let line = MockLine::new();
    let mut ctrl = line.controller();
    let mut fe = line.frontend();
    line.queue_reply(toy_color(&TIMING_COLOR, &[0xAAAA, 0x5555]));

    line.type_line("C1-0001-0002\n");
    fe.poll(&mut ctrl).unwrap();
    line.take_output();

    assert_eq!(
        run_until_executed(&line, &mut fe, &mut ctrl),
        Activity::Executed { received: true }
    );
    assert_eq!(line.take_output(), "s:0001-0002 r:AAAA-5555\n");
}

#[test]
fn busy_line_defers_execution() {
    let line = MockLine::new();
    let mut ctrl = line.controller();
    let mut fe = line.frontend();

    line.type_line("V2-1234\n");
    fe.poll(&mut ctrl).unwrap();
    line.take_output();

    // Prong shorted to ground reads as V active
    line.force(Some(false));
    assert_eq!(fe.poll(&mut ctrl), Ok(Activity::Waiting));
    assert_eq!(line.take_output(), "");
    assert!(fe.rom().is_some());
    // Retried only after the inactive delay
    assert_eq!(fe.poll(&mut ctrl), Ok(Activity::Waiting));

    line.force(None);
    line.schedule_in(300_000, toy_classic(&TIMING_V, 0x0F0F));
    assert_eq!(
        run_until_executed(&line, &mut fe, &mut ctrl),
        Activity::Executed { received: true }
    );
    assert_eq!(line.take_output(), "r:0F0F s:1234 t\n");
}

#[test]
fn unsupported_dialect_is_reported() {
    let line = MockLine::new();
    let mut ctrl: SimController = Controller::new(line.link(), 300);
    ctrl.add(Codec::classic());
    assert!(ctrl.supports(Dialect::Y));
    assert!(!ctrl.supports(Dialect::Color));
    let mut fe = line.frontend();

    line.type_line("C1-0001\n");
    fe.poll(&mut ctrl).unwrap();
    line.take_output();
    line.advance_ms(1000);

    assert_eq!(fe.poll(&mut ctrl), Ok(Activity::Idle));
    assert_eq!(line.take_output(), "dialect C not supported (paused)\n");
    assert!(fe.rom().is_none());

    let mut rom = match parse_command(b"C0") {
        Ok(Command::Program(p)) => DigiRom::from_command(&p),
        _ => unreachable!(),
    };
    assert_eq!(
        ctrl.execute(&mut rom, 5000),
        Err(ControllerError::UnsupportedDialect(Dialect::Color))
    );
}

#[test]
#[should_panic(expected = "codec family registered twice")]
fn duplicate_codec_family_panics() {
    let line = MockLine::new();
    let mut ctrl = line.controller();
    ctrl.add(Codec::classic());
}

#[test]
fn new_line_supersedes_waiting_program() {
    let line = MockLine::new();
    let mut ctrl = line.controller();
    let mut fe = line.frontend();

    line.type_line("V1-1111\n");
    fe.poll(&mut ctrl).unwrap();
    line.advance_ms(500);
    line.type_line("X1-2222\n");
    fe.poll(&mut ctrl).unwrap();
    line.take_output();

    assert_eq!(rom_text(&fe).as_deref(), Some("X1-2222"));
    // The new program gets its own go-first delay
    line.advance_ms(600);
    assert_eq!(fe.poll(&mut ctrl), Ok(Activity::Waiting));
    run_until_executed(&line, &mut fe, &mut ctrl);
    assert_eq!(line.take_output(), "s:2222 t\n");
}

#[test]
fn info_commands() {
    let line = MockLine::new();
    let mut ctrl = line.controller();
    let mut fe = line.frontend();

    line.type_line("i\r\n");
    assert_eq!(fe.poll(&mut ctrl), Ok(Activity::Command { accepted: true }));
    assert_eq!(
        line.take_output(),
        format!("got 1 bytes: i -> {}\n", BUILD_INFO)
    );

    line.type_line("YI\n");
    fe.poll(&mut ctrl).unwrap();
    let out = line.take_output();
    assert!(out.contains(BUILD_INFO));
    assert!(out.contains("timing Y: active=H threshold=1300mV inverted"));
    assert!(fe.rom().is_none());
}

#[test]
fn prong_test_reports_each_state() {
    let line = MockLine::new();
    let mut ctrl = line.controller();
    let mut fe = line.frontend();

    line.type_line("T\n");
    fe.poll(&mut ctrl).unwrap();
    assert_eq!(
        line.take_output(),
        "got 1 bytes: T -> [prong test V] idle=0 active=1 release=0 (paused)\n"
    );

    // Shorted prong fails the test
    line.force(Some(true));
    line.type_line("XT\n");
    fe.poll(&mut ctrl).unwrap();
    assert!(line.take_output().ends_with("idle=0 active=0 release=0 FAIL (paused)\n"));
}

#[test]
fn analog_prong_test_reports_millivolts() {
    let line = MockLine::new();
    let mut ctrl = Controller::with_all_codecs(line.analog_link(), 300);
    let report = ctrl.prong_test(Dialect::Y);
    assert!(report.is_ok());
    assert_eq!(
        report.to_string(),
        "[prong test Y] idle=0/0mV active=1/3300mV release=0/0mV"
    );
}

#[test]
fn overlong_line_is_dropped() {
    let line = MockLine::new();
    let mut ctrl = line.controller();
    let mut fe = line.frontend();

    line.type_line(&"A".repeat(80));
    line.type_line("\nV2-1234\n");
    assert_eq!(fe.poll(&mut ctrl), Ok(Activity::Command { accepted: true }));
    let out = line.take_output();
    assert!(out.starts_with("too long\n"));
    assert!(out.ends_with("V2-1234 (new DigiROM)\n"));
}

#[test]
fn stale_partial_line_is_dropped() {
    let line = MockLine::new();
    let mut ctrl = line.controller();
    let mut fe = line.frontend();

    line.type_line("X1-12");
    assert_eq!(fe.poll(&mut ctrl), Ok(Activity::Idle));
    line.advance_ms(3000);
    assert_eq!(fe.poll(&mut ctrl), Ok(Activity::Idle));
    assert_eq!(line.take_output(), "");

    line.advance_ms(3001);
    assert_eq!(fe.poll(&mut ctrl), Ok(Activity::Idle));
    assert_eq!(line.take_output(), "too late\n");

    // The tail arrives as a line of its own
    line.type_line("34\n");
    fe.poll(&mut ctrl).unwrap();
    assert_eq!(line.take_output(), "got 2 bytes: 34 -> unknown op '3' (paused)\n");
    assert!(fe.rom().is_none());
}

fn load(line: &MockLine, fe: &mut SimFrontEnd, ctrl: &mut SimController, program: &str) {
    line.type_line(program);
    assert_eq!(fe.poll(ctrl), Ok(Activity::Command { accepted: true }));
    line.take_output();
    assert!(fe.rom().is_some());
}

#[test]
fn info_and_prong_test_drop_the_program() {
    let line = MockLine::new();
    let mut ctrl = line.controller();
    let mut fe = line.frontend();

    load(&line, &mut fe, &mut ctrl, "V2-1234\n");
    line.type_line("I\n");
    assert_eq!(fe.poll(&mut ctrl), Ok(Activity::Command { accepted: true }));
    assert_eq!(
        line.take_output(),
        format!("got 1 bytes: I -> {}\n", BUILD_INFO)
    );
    assert!(fe.rom().is_none());
    assert_eq!(fe.poll(&mut ctrl), Ok(Activity::Idle));

    load(&line, &mut fe, &mut ctrl, "V2-1234\n");
    line.type_line("T\n");
    fe.poll(&mut ctrl).unwrap();
    assert!(line.take_output().ends_with("(paused)\n"));
    assert!(fe.rom().is_none());
    assert_eq!(fe.poll(&mut ctrl), Ok(Activity::Idle));
}

#[test]
fn go_first_delay_across_counter_wrap() {
    let line = MockLine::new();
    let mut ctrl = line.controller();
    let mut fe = line.frontend();
    // The go-first deadline lies just past the microsecond counter wrap,
    // where micros / 1000 would have wrapped back to zero
    line.set_now_us(4_294_000_000);
    line.queue_reply(toy_classic(&TIMING_V, 0xF30C));

    load(&line, &mut fe, &mut ctrl, "V1-1234\n");
    let start = line.now_us();
    assert_eq!(
        run_until_executed(&line, &mut fe, &mut ctrl),
        Activity::Executed { received: true }
    );
    assert!(line.now_us() - start >= 1_000_000);
    assert!(line.now_us() > 1 << 32);
    assert_eq!(line.take_output(), "s:1234 r:F30C\n");
}

fn responder_rom() -> DigiRom {
    match parse_command(b"V2-1234") {
        Ok(Command::Program(p)) => DigiRom::from_command(&p),
        _ => unreachable!(),
    }
}

#[test]
fn failed_receive_reports_where_it_stopped() {
    let t = &TIMING_V;

    // Five bits of 0x1B, then the toy lets go
    let mut w = WaveBuilder::new(false);
    w.idle(t.pre_idle_send)
        .active(t.pre_active.send)
        .idle(t.start_idle.send)
        .active(t.start_active.send);
    for i in 0..5 {
        let bit = (0x1Bu16 >> i) & 1 != 0;
        w.idle(t.bit_idle.send(bit)).active(t.bit_active.send(bit));
    }
    let line = MockLine::new();
    let mut ctrl = line.controller();
    line.schedule_in(10_000, w.finish());
    let mut rom = responder_rom();
    assert_eq!(ctrl.execute(&mut rom, 5000), Ok(()));
    let mut out = String::new();
    rom.print_result(&mut out).unwrap();
    assert_eq!(out, "t:5:001B");

    // Go pulse held past its maximum
    let mut w = WaveBuilder::new(false);
    w.idle(1000).active(100_000);
    let line = MockLine::new();
    let mut ctrl = line.controller();
    line.schedule_in(10_000, w.finish());
    let mut rom = responder_rom();
    assert_eq!(ctrl.execute(&mut rom, 5000), Ok(()));
    let mut out = String::new();
    rom.print_result(&mut out).unwrap();
    assert_eq!(out, "t:-3");
}

#[test]
fn debug_capture_follows_each_run() {
    let line = MockLine::new();
    let mut ctrl = line.controller();
    let mut fe = line.frontend();

    load(&line, &mut fe, &mut ctrl, "V2-1234\n");
    line.type_line("D1\n");
    assert_eq!(fe.poll(&mut ctrl), Ok(Activity::Command { accepted: true }));
    assert_eq!(
        line.take_output(),
        "got 2 bytes: D1 -> debug digital trigger=0 (paused)\n"
    );
    assert!(fe.rom().is_none());

    line.queue_reply(toy_classic(&TIMING_V, 0xF30C));
    load(&line, &mut fe, &mut ctrl, "V1-1234\n");
    run_until_executed(&line, &mut fe, &mut ctrl);
    let out = line.take_output();
    assert!(out.starts_with(
        "s:1234 r:F30C\np:timing=V threshold=1900 trigger=0\nd:i3000 a59000 i2083 a917 i1000 a3167 "
    ));
    assert!(out.ends_with("\n"));
    assert_eq!(out.lines().count(), 3);

    // Capture from the toy's reply on
    line.type_line("d1-1b\n");
    fe.poll(&mut ctrl).unwrap();
    assert!(line.take_output().ends_with("-> debug digital trigger=1B (paused)\n"));
    line.queue_reply(toy_classic(&TIMING_V, 0xF30C));
    load(&line, &mut fe, &mut ctrl, "V1-1234\n");
    run_until_executed(&line, &mut fe, &mut ctrl);
    let out = line.take_output();
    let log = out.lines().nth(2).unwrap_or_default();
    assert!(out.contains("p:timing=V threshold=1900 trigger=1B\n"));
    assert!(log.starts_with("d:A"));
    assert!(!log.contains('a'));

    line.type_line("D0\n");
    fe.poll(&mut ctrl).unwrap();
    assert!(line.take_output().ends_with("-> debug off (paused)\n"));
    line.queue_reply(toy_classic(&TIMING_V, 0xF30C));
    load(&line, &mut fe, &mut ctrl, "V1-1234\n");
    run_until_executed(&line, &mut fe, &mut ctrl);
    assert_eq!(line.take_output(), "s:1234 r:F30C\n");
}
