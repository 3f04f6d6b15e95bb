use super::*;
use approx::assert_abs_diff_eq;
use beatmap_schema::{BreakInterval, CurveType, HitObjectKind, Point, Position};
use std::{
    fs,
    io::{self, Cursor, Read},
};

fn distance_to_quadratic(p: Point, c: [(f64, f64); 3]) -> f64 {
    (0..=20_000)
        .map(|i| {
            let t = i as f64 / 20_000.0;
            let u = 1.0 - t;
            let x = u * u * c[0].0 + 2.0 * u * t * c[1].0 + t * t * c[2].0;
            let y = u * u * c[0].1 + 2.0 * u * t * c[1].1 + t * t * c[2].1;
            ((p.x - x).powi(2) + (p.y - y).powi(2)).sqrt()
        })
        .fold(f64::INFINITY, f64::min)
}

#[test]
fn single_circle_beatmap() {
    let src = r#"
[TimingPoints]
0,500,4,2,0,50,1,0

[HitObjects]
100,100,1000,1,0,0:0:0:0:
"#;

    let beatmap = parse_str(src);
    assert_eq!(beatmap.timing_points.len(), 1);
    assert_eq!(beatmap.timing_points[0].bpm, Some(120.0));
    assert_eq!(beatmap.hit_objects.len(), 1);
    assert!(beatmap.hit_objects[0].is_circle());
    assert_eq!(beatmap.hit_objects[0].start_time, 1000);
    assert_eq!(beatmap.nb_circles, 1);
    assert_eq!(beatmap.nb_sliders, 0);
    assert_eq!(beatmap.max_combo, Some(1));
    assert_eq!(beatmap.total_time, 1);
    assert_eq!(beatmap.draining_time, 0);
}

#[test]
fn bezier_slider_beatmap() {
    let src = r#"
[Difficulty]
SliderMultiplier:1.4
SliderTickRate:1

[TimingPoints]
0,500,4,2,0,50,1,0

[HitObjects]
100,100,1000,2,0,B|200:100|300:200,1,300,0|0,0:0|0:0,0:0:0:0:
"#;

    let beatmap = parse_str(src);
    let obj = &beatmap.hit_objects[0];
    let slider = obj.as_slider().unwrap();
    assert_eq!(slider.curve_type, CurveType::Bezier);
    assert_eq!(slider.repeat_count, 1);
    assert_eq!(slider.pixel_length, 300);
    assert_eq!(slider.edges.len(), 2);
    assert_eq!(slider.points[0], Position::new(100, 100));
    assert_eq!(beatmap.nb_sliders, 1);

    // 300px / 140px per beat * 500ms, rounded up.
    assert_eq!(slider.duration, Some(1072));
    assert_eq!(slider.end_time, Some(2072));

    let control = [(100.0, 100.0), (200.0, 100.0), (300.0, 200.0)];
    assert!(distance_to_quadratic(slider.end_position, control) < 0.01);
}

#[test]
fn bezier_slider_shorter_than_its_path_ends_between_control_points() {
    let src = r#"
[TimingPoints]
0,500,4,2,0,50,1,0

[HitObjects]
100,100,1000,2,0,B|200:100|300:200,1,150
"#;

    let beatmap = parse_str(src);
    let end = beatmap.hit_objects[0].as_slider().unwrap().end_position;
    let control = [(100.0, 100.0), (200.0, 100.0), (300.0, 200.0)];
    assert!(distance_to_quadratic(end, control) < 0.01);
    for (x, y) in control {
        assert!((end.x - x).abs() > 1.0 || (end.y - y).abs() > 1.0);
    }
}

#[test]
fn events_set_background_and_breaks() {
    let src = r#"
[Events]
//Background and Video events
0,0,"bg.jpg",0,0
//Break Periods
2,1000,3000

[TimingPoints]
0,500,4,2,0,50,1,0

[HitObjects]
256,192,0,1,0,0:0:0:0:
256,192,10000,1,0,0:0:0:0:
"#;

    let beatmap = parse_str(src);
    assert_eq!(beatmap.bg_filename.as_deref(), Some("bg.jpg"));
    assert_eq!(
        beatmap.breaks,
        vec![BreakInterval {
            start_time: 1000,
            end_time: 3000
        }]
    );
    assert_eq!(beatmap.total_time, 10);
    assert_eq!(beatmap.draining_time, 8);
}

#[test]
fn empty_input_yields_defaults() {
    let beatmap = parse_str("");
    assert_eq!(beatmap.file_format, None);
    assert!(beatmap.hit_objects.is_empty());
    assert_eq!(beatmap.total_time, 0);
    assert_eq!(beatmap.draining_time, 0);
    assert_eq!(beatmap.max_combo, None);
    assert_eq!(beatmap.bpm_min, None);
}

#[test]
fn objects_without_timing_points_have_no_combo() {
    let beatmap = parse_str("[HitObjects]\n0,0,500,1,0\n0,0,2500,1,0\n");
    assert_eq!(beatmap.nb_circles, 2);
    assert_eq!(beatmap.max_combo, None);
    assert_eq!(beatmap.total_time, 2);
    assert_eq!(beatmap.draining_time, 2);
}

#[test]
fn metadata_header_and_tags() {
    let src = "osu file format v14\r\n\r\n[General]\r\nAudioFilename: audio.mp3\r\n[Metadata]\r\nTitle:Song\r\nTags:one two  three\r\n";
    let beatmap = parse_str(src);
    assert_eq!(beatmap.file_format.as_deref(), Some("v14"));
    assert_eq!(beatmap.meta("AudioFilename"), Some("audio.mp3"));
    assert_eq!(beatmap.meta("Title"), Some("Song"));
    assert_eq!(beatmap.tags, vec!["one", "two", "three"]);
}

#[test]
fn unsorted_input_is_sorted_stably() {
    let src = r#"
[TimingPoints]
2000,-50,4,2,0,50,0,0
0,300,4,2,0,50,1,0
1000,600,4,2,0,50,1,0

[HitObjects]
10,10,3000,1,0
20,20,1000,1,0
30,30,1000,1,0
40,40,500,1,0
"#;

    let beatmap = parse_str(src);
    let times: Vec<_> = beatmap.hit_objects.iter().map(|o| o.start_time).collect();
    assert_eq!(times, vec![500, 1000, 1000, 3000]);
    assert_eq!(beatmap.hit_objects[1].position, Position::new(20, 20));
    assert_eq!(beatmap.hit_objects[2].position, Position::new(30, 30));

    let offsets: Vec<_> = beatmap.timing_points.iter().map(|p| p.offset).collect();
    assert_eq!(offsets, vec![0, 1000, 2000]);
    assert_eq!(beatmap.timing_points[2].bpm, Some(100.0));
    assert_eq!(beatmap.bpm_min, Some(100.0));
    assert_eq!(beatmap.bpm_max, Some(200.0));

    let mut resorted = beatmap.hit_objects.clone();
    resorted.sort_by_key(|o| o.start_time);
    assert_eq!(resorted, beatmap.hit_objects);
}

#[test]
fn every_point_after_the_first_has_a_bpm() {
    let src = r#"
[TimingPoints]
0,-100,4,2,0,50,0,0
100,500,4,2,0,50,1,0
200,-50,4,2,0,50,0,0
300,-25,4,2,0,50,0,0
400,0,4,2,0,50,0,0
"#;
    let beatmap = parse_str(src);
    let points = &beatmap.timing_points;
    assert_eq!(points[0].bpm, None);
    for pair in points[1..].windows(2) {
        assert!(pair[0].bpm.is_some());
        assert_eq!(pair[1].bpm, pair[0].bpm);
    }
}

#[test]
fn malformed_lines_are_skipped_not_fatal() {
    let src = r#"
[TimingPoints]
garbage
0,500,4,2,0,50,1,0
[HitObjects]
1,2
x,y,z,1,0
64,64,200,1,0
64,64,400,2,0,L|,1,100
"#;
    let beatmap = parse_str(src);
    assert_eq!(beatmap.timing_points.len(), 1);
    assert_eq!(beatmap.hit_objects.len(), 2);

    // A slider without curve points ends on its own head.
    let slider = beatmap.hit_objects[1].as_slider().unwrap();
    assert_eq!(slider.points, vec![Position::new(64, 64)]);
    assert_eq!(slider.end_position, Point { x: 64.0, y: 64.0 });
}

#[test]
fn missing_slider_multiplier_uses_option_default() {
    let src = "[TimingPoints]\n0,500\n[HitObjects]\n0,0,0,2,0,L|200:0,1,200\n";

    let beatmap = parse_str(src);
    // 200px / 140px per beat * 500ms.
    assert_eq!(beatmap.hit_objects[0].as_slider().unwrap().duration, Some(715));

    let beatmap = parse_str_with_options(
        src,
        ParseOptions {
            default_slider_multiplier: 2.0,
            ..ParseOptions::default()
        },
    );
    assert_eq!(beatmap.hit_objects[0].as_slider().unwrap().duration, Some(500));
}

#[test]
fn catmull_policy_is_configurable() {
    let src = "[HitObjects]\n0,0,0,2,0,C|100:0|200:0,1,150\n";

    let beatmap = parse_str(src);
    assert_eq!(
        beatmap.hit_objects[0].as_slider().unwrap().end_position,
        Point { x: 200.0, y: 0.0 }
    );

    let beatmap = parse_str_with_options(
        src,
        ParseOptions {
            catmull: CatmullPolicy::Sampled,
            ..ParseOptions::default()
        },
    );
    let end = beatmap.hit_objects[0].as_slider().unwrap().end_position;
    assert_abs_diff_eq!(end.x, 150.0, epsilon = 1e-6);
    assert_abs_diff_eq!(end.y, 0.0, epsilon = 1e-6);
}

#[test]
fn spinner_and_slider_combo_in_one_map() {
    let src = r#"
[Difficulty]
SliderMultiplier:1
SliderTickRate:1

[TimingPoints]
0,500,4,2,0,50,1,0

[HitObjects]
0,0,0,1,0
0,0,500,2,0,L|300:0,2,300
256,192,2000,12,0,3000
"#;
    let beatmap = parse_str(src);
    assert_eq!(beatmap.nb_circles, 1);
    assert_eq!(beatmap.nb_sliders, 1);
    assert_eq!(beatmap.nb_spinners, 1);
    // circle + slider (2 ticks, 3 edges) + spinner
    assert_eq!(beatmap.max_combo, Some(1 + 7 + 1));
    assert!(matches!(
        beatmap.hit_objects[2].kind,
        HitObjectKind::Spinner { end_time: 3000 }
    ));
}

#[test]
fn reader_and_lines_match_str() {
    let src = "osu file format v14\n[TimingPoints]\n0,500,4,2,0,50,1,0\n[HitObjects]\n100,100,1000,1,0,0:0:0:0:\n";
    let from_str = parse_str(src);
    let from_reader = parse_reader(Cursor::new(src.as_bytes())).unwrap();
    let from_lines = parse_lines(src.lines());
    assert_eq!(from_str, from_reader);
    assert_eq!(from_str, from_lines);
}

struct FailingRead;

impl Read for FailingRead {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Other, "disk went away"))
    }
}

#[test]
fn read_error_is_terminal() {
    let reader = io::BufReader::new(Cursor::new("osu file format v14\n[General]\n").chain(FailingRead));
    let err = parse_reader(reader).unwrap_err();
    assert_eq!(err.code, "E2002");
    assert_eq!(err.line, 2);
    assert!(err.to_string().contains("disk went away"));
}

#[test]
fn missing_file_is_e2001() {
    let missing = std::env::temp_dir().join(format!(
        "beatmap_parser_missing_{}.osu",
        std::process::id()
    ));
    let _ = fs::remove_file(&missing);

    let err = parse_file(&missing).unwrap_err();
    assert!(err.is_open_failure());
    assert_eq!(err.file.as_deref(), Some(missing.display().to_string().as_str()));
    assert!(err.to_string().starts_with("E2001: failed to open input .osu"));
}

#[test]
fn parse_file_reads_from_disk() {
    let path = std::env::temp_dir().join(format!(
        "beatmap_parser_parse_file_{}.osu",
        std::process::id()
    ));
    fs::write(
        &path,
        "osu file format v14\r\n[TimingPoints]\r\n0,500,4,2,0,50,1,0\r\n[HitObjects]\r\n100,100,1000,1,0,0:0:0:0:\r\n",
    )
    .unwrap();

    let beatmap = parse_file(&path).unwrap();
    assert_eq!(beatmap.file_format.as_deref(), Some("v14"));
    assert_eq!(beatmap.nb_circles, 1);
    let _ = fs::remove_file(&path);
}
