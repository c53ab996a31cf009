
/// Reference model double.
pub mod reference;
