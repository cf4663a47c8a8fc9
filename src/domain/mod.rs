// Domain layer: catalog records and the ports the loader depends on.

pub mod model;
pub mod ports;
