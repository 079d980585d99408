// Domain layer: booking models, the time boundary and the store port.
// Nothing here performs I/O.

pub mod model;
pub mod ports;
pub mod time;
