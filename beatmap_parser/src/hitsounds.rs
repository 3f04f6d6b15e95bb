use beatmap_schema::{Additions, SampleSet, SoundType};

use crate::fields;

const SOUND_WHISTLE: i64 = 1 << 1;
const SOUND_FINISH: i64 = 1 << 2;
const SOUND_CLAP: i64 = 1 << 3;

/// Additive sound bitmask. Never empty: no flag (or an unreadable field)
/// means `normal`.
pub(crate) fn parse_sound_types(field: Option<&str>) -> Vec<SoundType> {
    let bits = field.and_then(fields::int).unwrap_or(0);
    let mut out = Vec::new();
    for (flag, sound) in [
        (SOUND_WHISTLE, SoundType::Whistle),
        (SOUND_FINISH, SoundType::Finish),
        (SOUND_CLAP, SoundType::Clap),
    ] {
        if bits & flag == flag {
            out.push(sound);
        }
    }
    if out.is_empty() {
        out.push(SoundType::Normal);
    }
    out
}

/// `sample:additionalSample:customSampleIndex:volume:hitsound`. Zero means
/// "unset" for every numeric field.
pub(crate) fn parse_additions(field: Option<&str>) -> Additions {
    let Some(field) = field.filter(|s| !s.is_empty()) else {
        return Additions::default();
    };
    let adds: Vec<&str> = field.split(':').collect();
    let nonzero = |idx: usize| {
        fields::nth(&adds, idx)
            .and_then(fields::int32)
            .filter(|v| *v != 0)
    };

    Additions {
        sample: fields::nth(&adds, 0).and_then(SampleSet::from_code),
        additional_sample: fields::nth(&adds, 1).and_then(SampleSet::from_code),
        custom_sample_index: nonzero(2),
        hitsound_volume: nonzero(3),
        hitsound: fields::nth(&adds, 4).map(str::to_string),
    }
}
