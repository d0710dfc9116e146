pub mod health;
pub mod interest_rate;
pub mod limits;
pub mod simulator;
pub mod validator;
