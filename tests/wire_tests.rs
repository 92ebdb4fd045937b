//! Output framing tests over longer streams

use proptest::collection::vec as pvec;
use proptest::prelude::*;
use test_strategy::proptest;

use rust_uart_bandpass::wire::{END_DELIMITER, START_DELIMITER};
use rust_uart_bandpass::{encode_frame, Frame, FrameDecoder, FRAME_LEN, WIRE_FRAME_BYTES};

fn framed(frame: &Frame) -> [u8; WIRE_FRAME_BYTES] {
    let mut wire = [0u8; WIRE_FRAME_BYTES];
    encode_frame(frame, &mut wire);
    wire
}

fn ramp(seed: i16) -> Frame {
    let mut samples = [0i16; FRAME_LEN];
    for (n, s) in samples.iter_mut().enumerate() {
        *s = seed.wrapping_mul(97).wrapping_add(n as i16 * 13);
    }
    Frame::from_samples(samples)
}

#[test]
fn test_back_to_back_frames() {
    let frames: Vec<Frame> = (0..10).map(ramp).collect();
    let mut stream = Vec::new();
    for frame in &frames {
        stream.extend_from_slice(&framed(frame));
    }

    let mut decoder = FrameDecoder::new();
    let mut decoded = Vec::new();
    decoder.push_slice(&stream, |f| decoded.push(f));

    assert_eq!(decoded, frames);
    assert_eq!(decoder.resyncs(), 0);
    assert!(decoder.is_idle());
}

#[test]
fn test_garbage_between_frames_is_skipped() {
    let a = ramp(1);
    let b = ramp(2);

    let mut stream = vec![0x00, 0x11, END_DELIMITER];
    stream.extend_from_slice(&framed(&a));
    stream.extend_from_slice(&[0x42, 0x43, END_DELIMITER, 0x00]);
    stream.extend_from_slice(&framed(&b));

    let mut decoder = FrameDecoder::new();
    let mut decoded = Vec::new();
    decoder.push_slice(&stream, |f| decoded.push(f));

    assert_eq!(decoded, vec![a, b]);
    assert_eq!(decoder.resyncs(), 0);
}

/// Payload bytes stay below 0x40, clear of both delimiter values.
fn quiet(seed: i16) -> Frame {
    let mut samples = [0i16; FRAME_LEN];
    for (n, s) in samples.iter_mut().enumerate() {
        *s = seed * 256 + (n % 64) as i16;
    }
    Frame::from_samples(samples)
}

#[test]
fn test_truncated_frame_costs_one_resync() {
    let a = quiet(3);
    let b = quiet(4);

    // Link drops the tail of `a`. The decoder counts a full payload into
    // `b` before the end byte mismatches, so `b` is lost too.
    let mut stream = Vec::new();
    stream.extend_from_slice(&framed(&a)[..200]);
    stream.extend_from_slice(&framed(&b));
    for seed in 5..8 {
        stream.extend_from_slice(&framed(&quiet(seed)));
    }

    let mut decoder = FrameDecoder::new();
    let mut decoded = Vec::new();
    decoder.push_slice(&stream, |f| decoded.push(f));

    assert_eq!(decoder.resyncs(), 1);
    assert_eq!(decoded, vec![quiet(5), quiet(6), quiet(7)]);
}

#[test]
fn test_split_delivery() {
    let frame = ramp(9);
    let wire = framed(&frame);

    let mut decoder = FrameDecoder::new();
    let mut decoded = Vec::new();
    for chunk in wire.chunks(7) {
        decoder.push_slice(chunk, |f| decoded.push(f));
        if decoded.is_empty() {
            assert!(!decoder.is_idle());
        }
    }
    assert_eq!(decoded, vec![frame]);
}

#[test]
fn test_delimiters_frame_payload() {
    let wire = framed(&Frame::SILENT);
    assert_eq!(wire[0], START_DELIMITER);
    assert_eq!(wire[WIRE_FRAME_BYTES - 1], END_DELIMITER);
    assert!(wire[1..WIRE_FRAME_BYTES - 1].iter().all(|&b| b == 0));
}

#[proptest]
fn arbitrary_payload_decodes(#[strategy(pvec(any::<i16>(), FRAME_LEN))] samples: Vec<i16>) {
    let mut block = [0i16; FRAME_LEN];
    block.copy_from_slice(&samples);
    let frame = Frame::from_samples(block);

    let mut decoder = FrameDecoder::new();
    let mut decoded = Vec::new();
    decoder.push_slice(&framed(&frame), |f| decoded.push(f));

    prop_assert_eq!(decoded, vec![frame]);
    prop_assert_eq!(decoder.resyncs(), 0);
}
