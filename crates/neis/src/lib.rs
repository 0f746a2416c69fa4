// ABOUTME: Typed client for the NEIS open-data API (meal service, school schedule).
// ABOUTME: Wraps the quirky [head, row] JSON envelope and normalizes dish/allergen text.

pub mod client;
pub mod error;
pub mod meal;
pub mod schedule;

pub use client::{NeisClient, NeisClientBuilder, NEIS_BASE_URL};
pub use error::NeisError;
pub use meal::{Dish, MealDay};
pub use schedule::{month_range, ScheduleEvent};
