//! Codec behavior on the simulated line

use dmcomm_core::codec::{Codec, RECEIVE_CAPACITY};
use dmcomm_core::outcome::{ReceiveStatus, PHASE_GO, PHASE_INITIAL, TIMED_OUT};
use dmcomm_core::timing::{self, TIMING_COLOR, TIMING_V, TIMING_X, TIMING_Y};
use dmcomm_protocol::Dialect;
use proptest::prelude::*;

use crate::mock_line::{toy_classic, toy_color, MockLine, SimLink, WaveBuilder, Waveform, REPLY_GAP_US};

fn prepared(line: &MockLine, codec: &mut Codec, dialect: Dialect, listen_ms: u32) -> SimLink {
    let mut link = line.link();
    codec.prepare(&mut link, dialect, listen_ms);
    link.release();
    link
}

/// Send with our codec and capture what went on the wire
fn capture_send(line: &MockLine, codec: &mut Codec, link: &mut SimLink, words: &[u16]) -> Waveform {
    line.start_recording();
    codec.send(link, words);
    line.take_recording()
}

// ── Classic ───────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// What we send decodes back to the same word for every classic dialect
    #[test]
    fn classic_round_trip(word in any::<u16>(), which in 0usize..3) {
        let dialect = [Dialect::V, Dialect::X, Dialect::Y][which];
        let line = MockLine::new();
        let mut codec = Codec::classic();
        let mut link = prepared(&line, &mut codec, dialect, 5000);

        let wave = capture_send(&line, &mut codec, &mut link, &[word]);
        line.schedule_in(REPLY_GAP_US, wave);

        let mut buffer = [0u16; RECEIVE_CAPACITY];
        let outcome = codec.receive(&mut link, &mut buffer[..1]);
        prop_assert_eq!(outcome.status, ReceiveStatus::Received);
        prop_assert_eq!(outcome.result_length, 1);
        prop_assert_eq!(buffer[0], word);
    }
}

#[test]
fn classic_receives_toy_word() {
    for t in [&TIMING_V, &TIMING_X, &TIMING_Y] {
        let line = MockLine::new();
        let mut codec = Codec::classic();
        let mut link = prepared(&line, &mut codec, t.dialect, 5000);
        line.schedule_in(50_000, toy_classic(t, 0x8E4D));

        let mut buffer = [0u16; 1];
        let outcome = codec.receive(&mut link, &mut buffer);
        assert_eq!(outcome.status, ReceiveStatus::Received, "{:?}", t.dialect);
        assert_eq!(buffer[0], 0x8E4D, "{:?}", t.dialect);
        assert_eq!(outcome.current_bit, 15);
    }
}

#[test]
fn first_receive_with_no_signal_is_nothing() {
    for dialect in [Dialect::V, Dialect::X, Dialect::Y] {
        let line = MockLine::new();
        let mut codec = Codec::classic();
        let mut link = prepared(&line, &mut codec, dialect, 50);

        let mut buffer = [0u16; 1];
        let outcome = codec.receive(&mut link, &mut buffer);
        assert_eq!(outcome.status, ReceiveStatus::Nothing);
        assert_eq!(outcome.result_length, 0);
        assert_eq!(outcome.current_bit, PHASE_INITIAL);
        assert_eq!(outcome.last_duration, TIMED_OUT);
    }
}

#[test]
fn later_receive_with_no_signal_is_timeout_except_y() {
    for (dialect, expected) in [
        (Dialect::V, ReceiveStatus::Timeout),
        (Dialect::X, ReceiveStatus::Timeout),
        (Dialect::Y, ReceiveStatus::Nothing),
    ] {
        let line = MockLine::new();
        let t = timing::classic(dialect);
        let mut codec = Codec::classic();
        let mut link = prepared(&line, &mut codec, dialect, 5000);
        line.schedule_in(10_000, toy_classic(t, 0x1234));

        let mut buffer = [0u16; 1];
        assert!(codec.receive(&mut link, &mut buffer).is_received());
        let outcome = codec.receive(&mut link, &mut buffer);
        assert_eq!(outcome.status, expected, "{:?}", dialect);
        // The word already received stays in the buffer
        assert_eq!(buffer[0], 0x1234);
    }
}

#[test]
fn short_go_pulse_is_too_short() {
    let line = MockLine::new();
    let mut codec = Codec::classic();
    let mut link = prepared(&line, &mut codec, Dialect::V, 5000);
    let wave = WaveBuilder::new(false).idle(1000).active(10_000).idle(5000).finish();
    line.schedule_in(1000, wave);

    let mut buffer = [0u16; 1];
    let outcome = codec.receive(&mut link, &mut buffer);
    assert_eq!(outcome.status, ReceiveStatus::TooShort);
    assert_eq!(outcome.result_length, 0);
    assert_eq!(outcome.current_bit, PHASE_GO);
    assert!(outcome.current_bit_active);
    assert!(outcome.last_duration < TIMING_V.pre_active.min);
}

/// Classic frame whose last active half is held for `last_active_us`
fn held_last_bit(t: &timing::ClassicTiming, word: u16, last_active_us: u32) -> Waveform {
    let mut w = WaveBuilder::new(t.active_level.is_high());
    w.idle(t.pre_idle_send)
        .active(t.pre_active.send)
        .idle(t.start_idle.send)
        .active(t.start_active.send);
    for i in 0..16 {
        let bit = (word >> i) & 1 != 0;
        let active = if i == 15 { last_active_us } else { t.bit_active.send(bit) };
        w.idle(t.bit_idle.send(bit)).active(active);
    }
    w.idle(t.cooldown_send);
    w.finish()
}

#[test]
fn x_tolerates_held_last_bit() {
    let line = MockLine::new();
    let mut codec = Codec::classic();
    let mut link = prepared(&line, &mut codec, Dialect::X, 5000);
    line.schedule_in(1000, held_last_bit(&TIMING_X, 0xC0DE, 9000));

    let mut buffer = [0u16; 1];
    let outcome = codec.receive(&mut link, &mut buffer);
    assert_eq!(outcome.status, ReceiveStatus::Received);
    assert_eq!(buffer[0], 0xC0DE);
    assert_eq!(outcome.last_duration, TIMED_OUT);
}

#[test]
fn v_rejects_held_last_bit() {
    let line = MockLine::new();
    let mut codec = Codec::classic();
    let mut link = prepared(&line, &mut codec, Dialect::V, 5000);
    line.schedule_in(1000, held_last_bit(&TIMING_V, 0xC0DE, 9000));

    let mut buffer = [0u16; 1];
    let outcome = codec.receive(&mut link, &mut buffer);
    assert_eq!(outcome.status, ReceiveStatus::Timeout);
    assert_eq!(outcome.result_length, 0);
    assert_eq!(outcome.current_bit, 15);
    assert!(outcome.current_bit_active);
}

// ── Color ─────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    /// N words sent come back as N words, ended by the idle timeout
    #[test]
    fn color_round_trip(words in proptest::collection::vec(any::<u16>(), 1..=RECEIVE_CAPACITY)) {
        let line = MockLine::new();
        let mut codec = Codec::color();
        let mut link = prepared(&line, &mut codec, Dialect::Color, 5000);

        let wave = capture_send(&line, &mut codec, &mut link, &words);
        line.schedule_in(REPLY_GAP_US, wave);

        let mut buffer = [0u16; RECEIVE_CAPACITY];
        let outcome = codec.receive(&mut link, &mut buffer);
        prop_assert_eq!(outcome.status, ReceiveStatus::Received);
        prop_assert_eq!(outcome.result_length as usize, words.len());
        prop_assert_eq!(&buffer[..words.len()], &words[..]);
    }
}

#[test]
fn color_overlong_message_is_buffer_full() {
    let line = MockLine::new();
    let mut codec = Codec::color();
    let mut link = prepared(&line, &mut codec, Dialect::Color, 5000);
    let words: Vec<u16> = (1..=9).map(|i| i * 0x1111).collect();
    line.schedule_in(1000, toy_color(&TIMING_COLOR, &words));

    let mut buffer = [0u16; RECEIVE_CAPACITY];
    let outcome = codec.receive(&mut link, &mut buffer);
    assert_eq!(outcome.status, ReceiveStatus::BufferFull);
    assert_eq!(outcome.result_length as usize, RECEIVE_CAPACITY);
    assert_eq!(&buffer[..], &words[..RECEIVE_CAPACITY]);
}

#[test]
fn color_cut_mid_word_is_timeout() {
    let line = MockLine::new();
    let mut codec = Codec::color();
    let mut link = prepared(&line, &mut codec, Dialect::Color, 5000);
    let t = &TIMING_COLOR;
    let mut w = WaveBuilder::new(false);
    w.idle(t.pre_idle_send).active(t.pre_active.send);
    for _ in 0..20 {
        w.idle(t.bit_idle.send).active(t.bit_active.bit1_send);
    }
    w.idle(t.cooldown_send);
    line.schedule_in(1000, w.finish());

    let mut buffer = [0u16; RECEIVE_CAPACITY];
    let outcome = codec.receive(&mut link, &mut buffer);
    assert_eq!(outcome.status, ReceiveStatus::Timeout);
    assert_eq!(outcome.result_length, 1);
    assert_eq!(outcome.current_bit, 20);
    assert_eq!(buffer[0], 0xFFFF);
}
