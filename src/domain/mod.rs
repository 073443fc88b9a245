// Domain layer: core models and ports (interfaces). No external collaborators here.

pub mod model;
pub mod ports;
pub mod table;
