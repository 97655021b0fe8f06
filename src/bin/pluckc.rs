// pluck-synth -- plucked string synthesis from chord charts
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! `pluckc` renders tablature songs to wav files.

use std::error::Error;
use std::path::PathBuf;

use log::{error, info};
use structopt::StructOpt;

use pluck_synth::output;
use pluck_synth::synth::AUDIO_CD_SAMPLING_RATE;
use pluck_synth::tablature::{self, Song};

#[derive(Debug, StructOpt)]
#[structopt(name = "pluckc", about = "Strumming tablature into music")]
struct Opt {
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: usize,

    /// The song, as a JSON tablature.
    #[structopt(parse(from_os_str))]
    song: PathBuf,

    /// Output wav file. Defaults to the name of the song in the current directory.
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,

    /// Seed for the noise that plucks the strings, for reproducible renders.
    #[structopt(long)]
    seed: Option<u64>,

    #[structopt(long, default_value = "44100")]
    sample_rate: u32,
}

fn main() -> Result<(), Box<dyn Error>> {
    let opt = Opt::from_args();

    let level = match opt.verbose {
        0 => log::Level::Info,
        1 => log::Level::Debug,
        _ => log::Level::Trace,
    };
    simple_logger::init_with_level(level)?;

    if let Err(err) = run(&opt) {
        error!("{}", err);
        std::process::exit(1);
    }
    Ok(())
}

fn run(opt: &Opt) -> Result<(), Box<dyn Error>> {
    if opt.sample_rate == 0 {
        return Err(format!(
            "sample rate must be positive, e.g. {}",
            AUDIO_CD_SAMPLING_RATE
        )
        .into());
    }

    let song = Song::load(&opt.song)?;
    info!(
        "rendering {} by {} ({} tracks)",
        song.title.as_deref().unwrap_or("untitled song"),
        song.artist.as_deref().unwrap_or("unknown artist"),
        song.tracks.len()
    );
    let samples = tablature::render_song(&song, opt.sample_rate, opt.seed)?;

    let outfile = match &opt.output {
        Some(path) => path.clone(),
        None => {
            let stem = opt.song.file_stem().unwrap_or_else(|| "song".as_ref());
            PathBuf::from(stem).with_extension("wav")
        }
    };
    output::write_wav(&outfile, opt.sample_rate, &samples)?;
    Ok(())
}
