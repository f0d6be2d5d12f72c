//! Coil-Pair State Index
//!
//! Encodes an unordered pair of coil identifiers into a dense integer label
//! used as the measurement-state column of the output table.

/// Number of coils in the array; raw identifier 0 aliases coil 16
pub const COIL_COUNT: i32 = 16;

/// Compute the state index for a sensing/excitation coil pair.
///
/// Coils are numbered 1..16 with a raw 0 standing in for 16. Equal coils map
/// to 0; the unordered pairs pack into 1..=120, the same value regardless of
/// which coil sensed and which excited.
pub fn pair_state_index(sensing: i32, excitation: i32) -> i32 {
    let s = if sensing == 0 { COIL_COUNT } else { sensing };
    let e = if excitation == 0 { COIL_COUNT } else { excitation };

    if s == e {
        0
    } else if s < e {
        (e - 1) + COIL_COUNT * (s - 1) - (s * (s + 1) / 2 - 1)
    } else {
        COIL_COUNT * (e - 1) - ((e - 1) * e / 2 - 1) + (s - e - 1)
    }
}
