use mongodb::{Client, Collection};

use crate::models::booking::Booking;
use crate::models::car::Car;
use crate::models::review::Review;
use crate::models::user::User;

const DEFAULT_DB_NAME: &str = "rentora";

pub const USERS: &str = "users";
pub const CARS: &str = "cars";
pub const BOOKINGS: &str = "bookings";
pub const REVIEWS: &str = "reviews";

pub fn database_name() -> String {
    std::env::var("MONGODB_DB").unwrap_or_else(|_| DEFAULT_DB_NAME.to_string())
}

pub fn users(client: &Client) -> Collection<User> {
    client.database(&database_name()).collection(USERS)
}

pub fn cars(client: &Client) -> Collection<Car> {
    client.database(&database_name()).collection(CARS)
}

pub fn bookings(client: &Client) -> Collection<Booking> {
    client.database(&database_name()).collection(BOOKINGS)
}

pub fn reviews(client: &Client) -> Collection<Review> {
    client.database(&database_name()).collection(REVIEWS)
}
