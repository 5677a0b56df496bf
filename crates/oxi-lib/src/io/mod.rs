pub mod reference;
pub mod sensor;
