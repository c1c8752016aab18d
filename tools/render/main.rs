use anyhow::{Context, Result};
use fir_filter::dsp::response::{crossing_hz, gain_at, gain_to_db};
use fir_filter::dsp::{BlockOutcome, FirProcessor};
use fir_filter::settings::FilterSettings;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::PathBuf;

const BLOCK_SIZE: usize = 512;
const RESPONSE_FFT_SIZE: usize = 8192;

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let input = args
        .next()
        .map(PathBuf::from)
        .context("usage: fir_render <input.wav> <output.wav> [settings.json]")?;
    let output = args
        .next()
        .map(PathBuf::from)
        .context("usage: fir_render <input.wav> <output.wav> [settings.json]")?;
    let settings = match args.next().map(PathBuf::from) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings '{}'", path.display()))?;
            FilterSettings::from_json(&json)
                .with_context(|| format!("invalid settings in '{}'", path.display()))?
        }
        None => FilterSettings::default(),
    };

    let reader = WavReader::open(&input)
        .with_context(|| format!("failed to open input WAV '{}'", input.display()))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    let interleaved = read_normalized(reader)?;

    let mut processor = FirProcessor::new();
    processor.prepare(spec.sample_rate as f64, BLOCK_SIZE, channels)?;
    processor.restore(&settings);

    let mut planar = vec![vec![0.0f32; BLOCK_SIZE]; channels];
    let mut rendered = Vec::with_capacity(interleaved.len());
    let mut gated_blocks = 0usize;

    for frame_block in interleaved.chunks(BLOCK_SIZE * channels) {
        let frames = frame_block.len() / channels;
        for (i, frame) in frame_block.chunks_exact(channels).enumerate() {
            for (ch, &s) in frame.iter().enumerate() {
                planar[ch][i] = s;
            }
        }

        let mut io: Vec<&mut [f32]> = planar.iter_mut().map(|ch| &mut ch[..frames]).collect();
        if processor.process(&mut io, &settings) == BlockOutcome::Gated {
            gated_blocks += 1;
        }

        for i in 0..frames {
            for ch in &planar {
                rendered.push(ch[i]);
            }
        }
    }

    let out_spec = WavSpec {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(&output, out_spec)
        .with_context(|| format!("failed to create output WAV '{}'", output.display()))?;
    for s in &rendered {
        writer.write_sample(*s)?;
    }
    writer.finalize()?;

    let sr = spec.sample_rate as f64;
    let nyquist = sr / 2.0;
    let kernels = processor.kernels();
    println!("Render summary for '{}':", input.display());
    println!("  frames processed : {}", rendered.len() / channels.max(1));
    println!("  gated blocks     : {}", gated_blocks);
    println!(
        "  kernel           : {} taps, {} window",
        settings.order + 1,
        settings.window.name()
    );
    println!(
        "  high-pass gain   : DC {:.1} dB, Nyquist {:.1} dB",
        gain_to_db(gain_at(kernels.high_pass().coeffs(), 0.0, sr)),
        gain_to_db(gain_at(kernels.high_pass().coeffs(), nyquist, sr))
    );
    println!(
        "  low-pass gain    : DC {:.1} dB, Nyquist {:.1} dB",
        gain_to_db(gain_at(kernels.low_pass().coeffs(), 0.0, sr)),
        gain_to_db(gain_at(kernels.low_pass().coeffs(), nyquist, sr))
    );
    println!(
        "  -6 dB points     : high-pass {}, low-pass {}",
        format_edge(crossing_hz(kernels.high_pass().coeffs(), sr, RESPONSE_FFT_SIZE, -6.0)),
        format_edge(crossing_hz(kernels.low_pass().coeffs(), sr, RESPONSE_FFT_SIZE, -6.0))
    );
    Ok(())
}

fn format_edge(edge: Option<f64>) -> String {
    match edge {
        Some(hz) => format!("{:.0} Hz", hz),
        None => "none".to_string(),
    }
}

fn read_normalized<R: std::io::Read>(reader: WavReader<R>) -> Result<Vec<f32>> {
    let spec = reader.spec();
    match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .context("failed to decode float samples"),
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<Vec<_>, _>>()
                .context("failed to decode integer samples")
        }
    }
}
