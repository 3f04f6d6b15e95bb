use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
struct Args {
    /// `.osu` file, or a `.json` produced from one.
    path: PathBuf,
    /// Print the whole beatmap as JSON instead of a summary.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let beatmap = beatmap_runner::load_any(&args.path)?;
    if args.json {
        println!("{}", beatmap_runner::to_json_pretty(&beatmap)?);
        return Ok(());
    }
    println!("format={}", beatmap.file_format.as_deref().unwrap_or("-"));
    println!("title={}", beatmap.meta("Title").unwrap_or("-"));
    println!(
        "objects={} (circles={} sliders={} spinners={})",
        beatmap.hit_objects.len(),
        beatmap.nb_circles,
        beatmap.nb_sliders,
        beatmap.nb_spinners
    );
    println!("bpm={:?}..{:?}", beatmap.bpm_min, beatmap.bpm_max);
    println!("max_combo={:?}", beatmap.max_combo);
    println!("total_time={}s draining_time={}s", beatmap.total_time, beatmap.draining_time);
    Ok(())
}
