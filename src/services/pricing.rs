use crate::models::booking::RentalType;
use crate::models::car::Car;

pub struct PricingService;

impl PricingService {
    /// Price quoted at booking creation: duration times the car's rate
    /// for the chosen rental type. The result is stored on the booking
    /// and never recomputed, even if the car's rates change later.
    pub fn quote(rental_type: RentalType, duration: i32, car: &Car) -> f64 {
        let rate = match rental_type {
            RentalType::Hours => car.price_per_hour,
            RentalType::Days => car.price_per_day,
        };
        f64::from(duration) * rate
    }
}
