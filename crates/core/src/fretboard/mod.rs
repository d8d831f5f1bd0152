//! Guitar neck geometry and pitch helpers used to voice scheduled notes and
//! place finger overlays.

/// Open-string frequencies in Hz for standard tuning, low E first.
pub const STRING_FREQUENCIES: [f32; 6] = [82.41, 110.0, 146.83, 196.0, 246.94, 329.63];

/// Scale length in millimetres.
pub const SCALE_LENGTH_MM: f32 = 650.0;

/// Fretboard width at the nut in millimetres.
pub const NUT_WIDTH_MM: f32 = 43.0;

pub const STRING_COUNT: usize = STRING_FREQUENCIES.len();

/// Pitch of `fret` on `string`, or `None` for strings the guitar doesn't have.
pub fn note_frequency(string: u8, fret: u8) -> Option<f32> {
    STRING_FREQUENCIES
        .get(usize::from(string))
        .map(|open| open * 2f32.powf(f32::from(fret) / 12.0))
}

/// Distance of a fret from the nut along the overlay, in millimetres.
pub fn fret_position_mm(fret: u8) -> f32 {
    SCALE_LENGTH_MM * (1.0 - 2f32.powf(-f32::from(fret) / 12.0)) / 2.0
}

/// Horizontal offset of a string from the neck centre line, in millimetres.
pub fn string_offset_mm(string: u8) -> Option<f32> {
    let index = usize::from(string);
    if index >= STRING_COUNT {
        return None;
    }
    let spacing = NUT_WIDTH_MM / (STRING_COUNT - 1) as f32;
    Some((index as f32 - (STRING_COUNT - 1) as f32 / 2.0) * spacing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twelfth_fret_doubles_the_pitch() {
        let open = note_frequency(5, 0).unwrap();
        let octave = note_frequency(5, 12).unwrap();
        assert!((octave - 2.0 * open).abs() < 1e-3);
        assert!((note_frequency(1, 0).unwrap() - 110.0).abs() <= f32::EPSILON);
    }

    #[test]
    fn unknown_string_has_no_pitch() {
        assert!(note_frequency(6, 0).is_none());
        assert!(string_offset_mm(6).is_none());
    }

    #[test]
    fn fret_positions_grow_towards_the_body() {
        assert_eq!(fret_position_mm(0), 0.0);
        assert!((fret_position_mm(12) - SCALE_LENGTH_MM / 4.0).abs() < 1e-3);
        assert!(fret_position_mm(5) < fret_position_mm(7));
    }

    #[test]
    fn strings_are_centred_on_the_neck() {
        let low = string_offset_mm(0).unwrap();
        let high = string_offset_mm(5).unwrap();
        assert!((low + high).abs() < 1e-4);
        assert!((high - low - NUT_WIDTH_MM).abs() < 1e-4);
    }
}
