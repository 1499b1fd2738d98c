pub mod booking;
pub mod car;
pub mod review;
pub mod user;
