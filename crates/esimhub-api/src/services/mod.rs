pub mod audit;
pub mod email;
pub mod fulfillment;
pub mod password_reset;
