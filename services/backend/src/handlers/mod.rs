pub mod bets;
pub mod health;
pub mod metrics;
pub mod reports;
pub mod rounds;
pub mod transfers;
pub mod users;
