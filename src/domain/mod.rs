// Domain layer: core models and ports (interfaces). No network or config code here.

pub mod model;
pub mod ports;
