// pluck-synth -- plucked string synthesis from chord charts
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Writing rendered audio to disk.

use std::path::{Path, PathBuf};

use log::info;
use snafu::{ResultExt, Snafu};

#[derive(Debug, Snafu)]
pub enum OutputError {
    #[snafu(display("Could not write {}: {}", path.display(), source))]
    Wav { path: PathBuf, source: hound::Error },
}

/// Store mono samples as a 32 bit float WAV file.
pub fn write_wav(path: &Path, sample_rate: u32, samples: &[f64]) -> Result<(), OutputError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(path, spec).context(Wav { path })?;
    for &sample in samples {
        writer.write_sample(sample as f32).context(Wav { path })?;
    }
    writer.finalize().context(Wav { path })?;

    info!(
        "wrote {} samples ({:.2} seconds) to {}",
        samples.len(),
        samples.len() as f64 / f64::from(sample_rate),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn written_samples_read_back() {
        let path = std::env::temp_dir().join(format!("pluck-synth-{}.wav", std::process::id()));
        let samples = vec![0.0, 0.5, -0.25, 1.0, -1.0];
        write_wav(&path, 8000, &samples).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 8000);
        assert_eq!(spec.sample_format, hound::SampleFormat::Float);
        let read: Vec<f32> = reader.samples::<f32>().map(Result::unwrap).collect();
        assert_eq!(read, vec![0.0, 0.5, -0.25, 1.0, -1.0]);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn unwritable_path() {
        let path = Path::new("/nonexistent-directory/out.wav");
        assert!(matches!(
            write_wav(path, 44100, &[0.0]),
            Err(OutputError::Wav { .. })
        ));
    }
}
