//! # Decoder Usage Example
//!
//! Opens an MP3 file, prints its stream parameters and decodes every frame.
//!
//! Run with: `cargo run --example decode_demo --package core-decoding -- song.mp3`

use core_decoding::{Decoder, DecoderBuilder, DecoderConfig};
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    let logging = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug);
    if let Err(e) = init_logging(logging) {
        eprintln!("Failed to initialise logging: {}", e);
    }

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: decode_demo <file.mp3> [--low-memory]");
        return ExitCode::FAILURE;
    };
    let low_memory = std::env::args().any(|arg| arg == "--low-memory");

    match run(&path, low_memory) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", path, e);
            ExitCode::FAILURE
        }
    }
}

fn run(path: &str, low_memory: bool) -> core_decoding::Result<()> {
    let mut decoder: Decoder = if low_memory {
        DecoderBuilder::new()
            .config(DecoderConfig::low_memory())
            .open(path)?
    } else {
        Decoder::open(path)?
    };

    // ========================================================================
    // Stream Parameters
    // ========================================================================
    let data = decoder.mp3_data().clone();
    println!("File:         {}", decoder.mp3_file().display());
    println!("Leading tag:  {} bytes", decoder.leading_tag().len());
    println!("Format:       {:?} {:?}", data.version, data.layer);
    println!("Channels:     {:?} ({})", decoder.channel_mode(), data.channels());
    println!("Sample rate:  {} Hz", decoder.sample_rate());
    println!("Bitrate:      {} kbps", data.bitrate_kbps);
    if let Some(vbr) = data.vbr {
        println!("VBR header:   {:?}", vbr.kind);
    }
    if let Some(duration) = data.duration() {
        println!("Duration:     ~{:.1}s", duration.as_secs_f64());
    }

    // ========================================================================
    // Decode
    // ========================================================================
    let mut frames = 0u64;
    let mut samples = 0u64;
    let mut peak = 0i16;

    for frame in decoder.each_decoded_frame()? {
        let frame = frame?;
        frames += 1;
        samples += frame.samples() as u64;
        peak = frame
            .interleaved()
            .iter()
            .map(|s| s.saturating_abs())
            .fold(peak, i16::max);
    }

    println!("Decoded:      {} frames, {} samples per channel", frames, samples);
    println!(
        "Played:       {:.2}s, peak {}",
        samples as f64 / data.sample_rate as f64,
        peak
    );

    Ok(())
}
