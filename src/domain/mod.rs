// Domain layer - Setpoint model, normalization and validation rules
pub mod form;
pub mod numeric;
pub mod setpoint;
pub mod validity;
