// Domain layer: form, stage records and ports (interfaces).

pub mod model;
pub mod ports;
