//! Small math helpers shared by the clipmap modules. Toroidal addressing
//! needs a modulo that is always in `[0, b)`, also for negative operands.

pub fn modulo(a: i32, b: i32) -> i32 {
    a.rem_euclid(b)
}

pub fn modulo_i64(a: i64, b: i64) -> i64 {
    a.rem_euclid(b)
}

pub fn modulo_f32(a: f32, b: f32) -> f32 {
    a - b * (a / b).floor()
}

/// Smallest power of two that is >= `v`.
pub fn round_up_pow2(v: usize) -> usize {
    v.max(1).next_power_of_two()
}
