pub mod admin_actions;
pub mod auth;
pub mod esims;
pub mod favorites;
pub mod health;
pub mod orders;
pub mod plans;
pub mod providers;
pub mod users;
